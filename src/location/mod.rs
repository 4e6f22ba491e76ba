pub mod commands;
pub mod controller;
pub mod state;

pub use controller::{LocationController, LocationSnapshot};
pub use state::{
    Coordinate, LocationEvent, LocationPhase, LocationReading, LocationSource, LocationState,
    Transition,
};
