//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate scenes, histories, persistence and rendering behind one
//!   facade the UI shell calls.
//! - Keep shell layers decoupled from storage and pixel details.

pub mod session;
