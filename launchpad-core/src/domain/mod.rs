//! Core domain types
//!
//! This module contains the domain structures shared between the Launchpad
//! service (which composes the remote systems) and its clients. They mirror
//! what the remote catalog, orchestrator and annotation store hand back.

pub mod execution;
pub mod task;
pub mod template;
