//! Core trait abstractions.

pub mod store;
pub mod vision;
