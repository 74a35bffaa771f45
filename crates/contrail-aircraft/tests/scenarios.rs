//! End-to-end tracking scenarios through the public API.

use contrail_aircraft::{
    AircraftIdentity, AircraftUpdate, AircraftVisualState, FlightModelTable, FrameTick,
    NetworkAircraft, PositionReport, RenderableAircraft, ReportedVelocities, SurfaceReport,
    aircraft_channel, extrapolate, velocities_between,
};
use contrail_config::{Config, ExtrapolationConfig};
use contrail_math::meters_to_feet;
use contrail_terrain::FixedTerrainProbe;

fn unknown_type() -> AircraftIdentity {
    AircraftIdentity {
        callsign: "N123AB".to_string(),
        icao_type: "ZZZZ".to_string(),
        mode_s_id: 0x00A0B1,
        ..Default::default()
    }
}

fn track(initial: AircraftVisualState, config: &Config) -> NetworkAircraft {
    NetworkAircraft::new(
        unknown_type(),
        initial,
        0,
        FlightModelTable::builtin(),
        config,
    )
}

fn at(latitude: f64, altitude_true: f64, heading: f64) -> AircraftVisualState {
    AircraftVisualState {
        latitude,
        longitude: -75.0,
        altitude_true,
        heading,
        ..Default::default()
    }
}

#[test]
fn climbing_report_extrapolates_half_a_second() {
    let config = Config::default();
    let mut aircraft = track(at(40.0, 1_000.0, 0.0), &config);
    let mut probe = FixedTerrainProbe::unavailable();
    aircraft.update(&FrameTick::new(0, 0.0, 60.0), &mut probe);

    assert!(aircraft.apply_position_report(PositionReport::slow(1_000, at(40.0001, 1_010.0, 0.0))));
    let before = *aircraft.predicted_visual_state();
    let velocities = ReportedVelocities {
        linear: aircraft.extrapolator().positional_velocities(),
        angular: aircraft.extrapolator().rotational_velocities(),
    };
    assert!((velocities.linear.z - 10.0).abs() < 1e-9);

    // Without error correction the prediction would sit at 1005 ft.
    let plain = extrapolate(&before, &velocities, 0.5);
    assert!((plain.altitude_true - 1_005.0).abs() < 1e-9);

    // The 10 ft gap closes over the 5 s slow window; after 0.5 s,
    // 1 - (4.5 / 5)² = 19% of it is in.
    aircraft.update(&FrameTick::new(1_500, 0.5, 60.0), &mut probe);
    let altitude = aircraft.predicted_visual_state().altitude_true;
    assert!((altitude - (1_005.0 + 10.0 * 0.19)).abs() < 1e-6, "altitude {altitude}");
    assert_eq!(aircraft.render_pose().altitude, altitude);
}

#[test]
fn heading_rate_wraps_through_north() {
    let v = velocities_between(
        &at(40.0, 1_000.0, 350.0),
        &at(40.0, 1_000.0, 10.0),
        1_000,
        &ExtrapolationConfig::default(),
    );
    assert!((v.angular.y - 20.0).abs() < 1e-9);

    let config = Config::default();
    let mut aircraft = track(at(40.0, 1_000.0, 350.0), &config);
    let mut probe = FixedTerrainProbe::unavailable();
    aircraft.update(&FrameTick::new(0, 0.0, 60.0), &mut probe);
    aircraft.apply_position_report(PositionReport::slow(1_000, at(40.0, 1_000.0, 10.0)));
    assert!((aircraft.extrapolator().rotational_velocities().y - 20.0).abs() < 1e-9);

    let mut now = 1_000;
    for _ in 0..20 {
        now += 100;
        aircraft.update(&FrameTick::new(now, 0.1, 60.0), &mut probe);
        let heading = aircraft.predicted_visual_state().heading;
        assert!((0.0..360.0).contains(&heading), "heading {heading}");
    }
}

#[test]
fn gear_takes_ten_seconds_on_unknown_type() {
    let config = Config::default();
    let mut aircraft = track(at(40.0, 1_000.0, 0.0), &config);
    assert_eq!(aircraft.flight_model().gear_duration_ms, 10_000.0);

    let mut probe = FixedTerrainProbe::unavailable();
    aircraft.update(&FrameTick::new(0, 0.0, 60.0), &mut probe);
    aircraft.apply_surface_report(SurfaceReport {
        gear_down: true,
        ..Default::default()
    });

    let mut now = 0;
    for _ in 0..50 {
        now += 100;
        aircraft.update(&FrameTick::new(now, 0.1, 60.0), &mut probe);
    }
    assert!((aircraft.surface_fractions().gear - 0.5).abs() < 1e-6);
    assert!(!aircraft.surfaces().is_gear_down());

    for _ in 0..50 {
        now += 100;
        aircraft.update(&FrameTick::new(now, 0.1, 60.0), &mut probe);
    }
    assert_eq!(aircraft.surface_fractions().gear, 1.0);
    assert!(aircraft.surfaces().is_gear_down());
    assert!(aircraft.bulk_data().gear_down);
}

#[test]
fn matching_terrain_is_usable_and_offset_settles_near_zero() {
    let mut config = Config::default();
    config.terrain.probe_interval_ms = 750;

    // 50 m above remote ground at 100 m; local scenery agrees within 5 cm.
    let initial = AircraftVisualState {
        altitude_true: meters_to_feet(150.0),
        altitude_agl: Some(meters_to_feet(50.0)),
        ..at(40.0, 0.0, 90.0)
    };
    let mut aircraft = track(initial, &config);
    let mut probe = FixedTerrainProbe::new(100.05);

    aircraft.update(&FrameTick::new(0, 0.0, 60.0), &mut probe);
    let mut now = 0;
    while now < 1_500 {
        now += 50;
        aircraft.update(&FrameTick::new(now, 0.05, 60.0), &mut probe);
    }

    assert_eq!(probe.calls(), 3);
    assert_eq!(aircraft.ground_clamp().history().len(), 3);
    assert!(aircraft.ground_clamp().has_usable_terrain_elevation_data());
    assert!(aircraft.ground_clamp().terrain_offset().abs() < 0.1);
    let adjusted = aircraft.adjusted_altitude().unwrap();
    assert!((adjusted - meters_to_feet(150.0)).abs() < meters_to_feet(0.1));
    assert_eq!(aircraft.render_pose().altitude, adjusted);
}

#[test]
fn zero_elapsed_frame_is_idempotent() {
    let config = Config::default();
    let initial = AircraftVisualState {
        altitude_true: meters_to_feet(130.0),
        altitude_agl: Some(meters_to_feet(30.0)),
        ..at(40.0, 0.0, 45.0)
    };
    let mut aircraft = track(initial, &config);
    let mut probe = FixedTerrainProbe::new(104.0);
    aircraft.update(&FrameTick::new(0, 0.0, 60.0), &mut probe);

    let mut climbing = initial;
    climbing.altitude_true += 20.0;
    aircraft.apply_position_report(PositionReport::slow(1_000, climbing));
    aircraft.apply_surface_report(SurfaceReport {
        gear_down: true,
        flaps: 0.5,
        ..Default::default()
    });
    aircraft.update(&FrameTick::new(1_100, 0.1, 60.0), &mut probe);

    let pose = aircraft.render_pose();
    let fractions = aircraft.surface_fractions();
    let offset = aircraft.ground_clamp().terrain_offset();
    for _ in 0..5 {
        aircraft.update(&FrameTick::new(1_100, 0.0, 60.0), &mut probe);
    }
    assert_eq!(aircraft.render_pose(), pose);
    assert_eq!(aircraft.surface_fractions(), fractions);
    assert_eq!(aircraft.ground_clamp().terrain_offset(), offset);
}

#[test]
fn error_velocity_decays_monotonically_to_zero() {
    let config = Config::default();
    let mut aircraft = track(at(40.0, 3_000.0, 0.0), &config);
    let mut probe = FixedTerrainProbe::unavailable();
    aircraft.update(&FrameTick::new(0, 0.0, 60.0), &mut probe);

    aircraft.apply_position_report(PositionReport::fast(
        500,
        at(40.001, 3_080.0, 12.0),
        ReportedVelocities::default(),
    ));
    let until = aircraft.extrapolator().apply_error_velocities_until();
    assert_eq!(until, Some(2_500));

    let magnitude = |a: &NetworkAircraft| {
        a.extrapolator().positional_error_velocities().magnitude()
            + a.extrapolator().rotational_error_velocities().magnitude()
    };
    let mut previous = magnitude(&aircraft);
    let mut now = 500;
    while now < 2_500 {
        now += 16;
        aircraft.update(&FrameTick::new(now, 0.016, 60.0), &mut probe);
        let current = magnitude(&aircraft);
        assert!(current <= previous, "error velocity grew at {now}");
        previous = current;
    }
    assert_eq!(magnitude(&aircraft), 0.0);

    let settled = aircraft.predicted_visual_state();
    assert!((settled.altitude_true - 3_080.0).abs() < 1e-6);
    assert!((settled.heading - 12.0).abs() < 1e-6);
}

#[test]
fn updates_from_network_thread_apply_in_order() {
    let config = Config::default();
    let mut aircraft = track(at(40.0, 2_000.0, 0.0), &config);
    let (tx, mut rx) = aircraft_channel();

    let feeder = std::thread::spawn(move || {
        for step in 1..=5u64 {
            let state = at(40.0 + step as f64 * 0.0001, 2_000.0 + step as f64 * 5.0, 0.0);
            tx.send(AircraftUpdate::Position(PositionReport::slow(step * 200, state)))
                .unwrap();
        }
        tx.send(AircraftUpdate::Info {
            origin: "KPHL".to_string(),
            destination: "KBOS".to_string(),
        })
        .unwrap();
    });
    feeder.join().unwrap();

    assert_eq!(aircraft.drain(&mut rx), 6);
    assert!(rx.is_closed());
    assert_eq!(aircraft.visual_state().altitude_true, 2_025.0);
    assert_eq!(aircraft.extrapolator().reports_received(), 6);
    assert_eq!(aircraft.destination(), "KBOS");
}
