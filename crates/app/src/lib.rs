//! `clinic-app`
//!
//! **Responsibility:** the application shell around the patient records.
//!
//! This crate provides:
//! - Startup configuration (`AppConfig`)
//! - Route parsing and session guards
//! - A navigator with delayed navigation
//! - UI-agnostic view models with a text rendering
//! - The `Shell` that mounts views and dispatches user commands
//!
//! The terminal binary (`src/main.rs`) is a thin loop around [`Shell`].

pub mod commands;
pub mod config;
pub mod navigator;
pub mod router;
pub mod shell;
pub mod views;

pub use commands::{Command, CommandError, Field};
pub use config::{AppConfig, ConfigError};
pub use navigator::Navigator;
pub use router::{Outcome, Resolution, Route};
pub use shell::{Flow, Shell};
