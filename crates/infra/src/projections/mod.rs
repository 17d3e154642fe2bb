//! Read-side projections fed from the event bus.

pub mod activity;

pub use activity::ActivityFeed;
