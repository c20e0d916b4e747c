//! Feed publishing
//!
//! - **feed**: the `PackageFeed` trait with HTTP and folder implementations
//! - **retry**: generic bounded retry with cancellation
//! - **publisher**: degree-ordered, bounded-concurrency push of a plan

pub mod feed;
pub mod publisher;
pub mod retry;

pub use feed::open_feed;
pub use publisher::{FeedPublisher, PublishOptions};
