//! Data Transfer Objects for the remote API
//!
//! Request payloads sent by the client and the typed parts of the responses
//! it reads back. Response structs tolerate unknown fields so the server can
//! grow its payloads without breaking the client.

pub mod graph;
pub mod report;
pub mod simulation;
