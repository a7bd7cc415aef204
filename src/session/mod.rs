//! Browser session management
//!
//! Orchestrates concurrent anti-detect browser sessions: fingerprint
//! rotation, human-behavior simulation, and the session pool itself.

mod behavior;
mod errors;
mod fingerprint;
mod orchestrator;

pub use behavior::{HumanBehavior, ScrollDirection, SimulationError};
pub use errors::{LaunchError, SessionError};
pub use fingerprint::{rotate_user_agent, stealth_launch_args};
pub use orchestrator::{
    LogCallback, OrchestratorConfig, Session, SessionOrchestrator, SessionStatus,
};
