//! Data Transfer Objects
//!
//! Request and response bodies of the Launchpad HTTP API. DTOs are thin
//! wrappers around domain types shaped for the wire.

pub mod catalog;
pub mod submission;
pub mod task;
