#![forbid(unsafe_code)]
//! Domain model for the accessibility workshop: sections and their gate,
//! the distraction state machine, static content pools and persisted records.

pub mod distraction;
pub mod error;
pub mod gate;
pub mod model;
pub mod pools;
pub mod time;

pub use error::Error;
pub use time::Clock;
