//! Session error taxonomy

use thiserror::Error;

use crate::driver::DriverError;
use crate::profiles::ProfileError;
use crate::session::behavior::SimulationError;

/// A failure inside one session's lifecycle
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("instance {0} is already active")]
    AlreadyActive(u32),

    #[error("session is closed")]
    Closed,

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

/// A session failure, tagged with the instance it belongs to so callers
/// can report per-instance errors without affecting the others.
#[derive(Error, Debug)]
#[error("instance {instance_id}: {source}")]
pub struct LaunchError {
    pub instance_id: u32,
    #[source]
    pub source: SessionError,
}

impl LaunchError {
    pub fn new(instance_id: u32, source: impl Into<SessionError>) -> Self {
        Self { instance_id, source: source.into() }
    }
}
