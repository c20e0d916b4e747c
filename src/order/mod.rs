//! Publish ordering
//!
//! - **degree**: longest-path degrees over product dependencies
//! - **plan**: degree groups plus a content-hash plan id

pub mod degree;
pub mod plan;

pub use plan::PublishPlan;
