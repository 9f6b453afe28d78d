//! Launchpad Core
//!
//! Core types and abstractions for the Launchpad training-run submission service.
//!
//! This crate contains:
//! - Domain types: Workflow templates, executions, annotation tasks, dump formats
//! - DTOs: Data transfer objects for the service's HTTP surface

pub mod domain;
pub mod dto;
