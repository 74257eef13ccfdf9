//! Workload simulator service
//!
//! HTTP surface and process configuration around `simulator_lib`.

pub mod api;
pub mod config;
