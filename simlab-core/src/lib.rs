//! Simlab Core
//!
//! Core types for the simlab job client.
//!
//! This crate contains:
//! - Domain types: jobs, status snapshots, log batches, upload hand-off
//! - DTOs: request and response payloads of the remote API

pub mod domain;
pub mod dto;
