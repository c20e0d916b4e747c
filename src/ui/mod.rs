//! Terminal output helpers: tracing setup and progress bars

pub mod logging;
pub mod progress;
