use contrail_aircraft::*;
use contrail_config::Config;
use contrail_terrain::{HeightmapParams, HeightmapTerrainProbe};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn approach() -> AircraftVisualState {
    AircraftVisualState {
        latitude: 47.45,
        longitude: -122.31,
        altitude_true: 600.0,
        altitude_agl: Some(150.0),
        heading: 163.0,
        pitch: 2.5,
        ..Default::default()
    }
}

fn tracked() -> NetworkAircraft {
    let identity = AircraftIdentity {
        callsign: "ASA1".to_string(),
        icao_type: "B738".to_string(),
        classification: "L2J".to_string(),
        wtc: "M".to_string(),
        ..Default::default()
    };
    NetworkAircraft::new(
        identity,
        approach(),
        0,
        FlightModelTable::builtin(),
        &Config::default(),
    )
}

fn bench_frame_update(c: &mut Criterion) {
    let mut aircraft = tracked();
    let mut probe = HeightmapTerrainProbe::new(HeightmapParams::default());
    let mut now = 0u64;
    c.bench_function("network_aircraft_update", |bencher| {
        bencher.iter(|| {
            now += 16;
            black_box(aircraft.update(&FrameTick::new(now, 0.016, 60.0), &mut probe))
        })
    });
}

fn bench_apply_report(c: &mut Criterion) {
    let mut aircraft = tracked();
    let mut now = 0u64;
    c.bench_function("apply_position_report", |bencher| {
        bencher.iter(|| {
            now += 200;
            let mut state = approach();
            state.altitude_true -= now as f64 * 0.001;
            black_box(aircraft.apply_position_report(PositionReport::slow(now, state)))
        })
    });
}

fn bench_flight_model_resolve(c: &mut Criterion) {
    let table = FlightModelTable::builtin();
    let key = ModelKey::new("L2T", "M", "DH8D");
    c.bench_function("flight_model_resolve", |bencher| {
        bencher.iter(|| black_box(table.resolve(black_box(&key))))
    });
}

criterion_group!(
    benches,
    bench_frame_update,
    bench_apply_report,
    bench_flight_model_resolve
);
criterion_main!(benches);
