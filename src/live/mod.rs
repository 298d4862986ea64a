//! Live visitor list: backend subscriptions and their per-screen owner

pub mod channel;
pub mod feed;

pub use channel::{LiveResultChannel, SnapshotStream, SubscriptionGuard};
pub use feed::{FeedState, VisitorFeed};
