//! # ik-protocol
//!
//! Core protocol definitions and data models for insight-kit.
//!
//! This crate defines all shared data structures used for:
//! - REST API payloads exchanged with the analytics backend
//! - Client-side prompt lifecycle state
//! - Event-channel communication between the core and its consumers
//!
//! ## Modules
//!
//! - [`prompt_models`]: Prompt lifecycle states, settings and history records
//! - [`result_models`]: Execution results returned by the backend
//! - [`api_models`]: Request/response bodies for the REST endpoints
//! - [`events`]: Events emitted by the core while a prompt runs
//!
//! ## Design Principles
//!
//! - Minimal dependencies: Only serde, ts-rs, and chrono
//! - TypeScript generation: All types derive `TS` for client compatibility
//! - Independent compilation: No dependencies on other insight-kit crates

pub mod api_models;
pub mod events;
pub mod prompt_models;
pub mod result_models;

// Re-export all public types for convenience
pub use api_models::*;
pub use events::*;
pub use prompt_models::*;
pub use result_models::*;
