mod controller;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use controller::{AdvanceOutcome, Progress, SessionController};
pub use workflow::{PersistenceStatus, SubmitResult, WorkshopService};
