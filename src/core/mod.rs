//! Core utilities shared by the store and pub/sub layers

pub mod logging;
pub mod validation;
pub mod version;
