//! Collaborator contracts.
//!
//! The pipeline only talks to the outside world through these traits so
//! that queue, alert and storage backends can be swapped (Postgres and
//! webhooks in production, in-memory fakes in tests).

pub mod alerts;
pub mod feed;
pub mod queue;
pub mod results;

pub use alerts::AlertPublisher;
pub use feed::{FeedObject, NeoFeed};
pub use queue::{MessageQueue, QueueMessage, ReceiptHandle, ReceiveRequest};
pub use results::ResultStore;
