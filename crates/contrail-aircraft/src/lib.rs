//! Visual tracking of remote aircraft for a pilot client: dead reckoning
//! between network reports, ground clamping against local scenery, timed
//! surface animation, and bulk state export.

pub mod aircraft;
pub mod export;
pub mod extrapolation;
pub mod flight_model;
pub mod inbox;
pub mod surfaces;
pub mod visual_state;

pub use aircraft::{
    AircraftIdentity, FrameEvents, NetworkAircraft, RenderPose, RenderableAircraft,
    SoundChannelId,
};
pub use export::{
    BULK_FORMAT_VERSION, BulkData, BulkInfoTexts, BulkSnapshot, ExportError, SharedBulkData,
    decode, encode,
};
pub use extrapolation::{Extrapolator, extrapolate, sanitize_velocities, velocities_between};
pub use flight_model::{EngineClass, FlightModel, FlightModelError, FlightModelTable, ModelKey};
pub use inbox::{AircraftUpdate, InboxClosed, UpdateReceiver, UpdateSender, aircraft_channel};
pub use surfaces::{EngineTransition, SurfaceChannel, SurfaceFractions, SurfaceReport, Surfaces};
pub use visual_state::{AircraftVisualState, FrameTick, PositionReport, ReportedVelocities};
