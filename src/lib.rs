//! Reliable publish/subscribe over Redis-style key-value stores.
//!
//! See [`pubsub`] for the protocol and [`store`] for the store adapter.

pub mod core;
pub mod pubsub;
pub mod store;
