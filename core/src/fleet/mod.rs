//! Fleet directory and driver records.

mod directory;
mod driver;

pub use directory::FleetDirectory;
pub use driver::{DriverRecord, DriverState};
