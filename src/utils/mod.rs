//! General-purpose utility modules.

pub mod error;
pub mod progress;

// Re-export commonly used items
pub use error::{Result, SpihtError};
pub use progress::StepReport;
