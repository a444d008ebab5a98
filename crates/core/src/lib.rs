//! # ik-core
//!
//! Core orchestration engine for insight-kit.
//!
//! This crate provides:
//! - Configuration loading from the `.insight-kit/` directory
//! - An HTTP client for the analytics backend, behind a mockable trait
//! - A generic fixed-interval polling engine
//! - The prompt execution controller and its event stream
//! - A locked-down Luau sandbox for generated dashboard code
//! - An in-memory prompt history store
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and management
//! - [`api`]: Backend client trait and implementations
//! - [`poll`]: Fixed-interval polling with attempt budgets
//! - [`controller`]: Prompt lifecycle orchestration
//! - [`sandbox`]: Generated-code execution and static fallback
//! - [`store`]: Prompt history projection

pub mod api;
pub mod config;
pub mod controller;
pub mod poll;
pub mod sandbox;
pub mod store;
