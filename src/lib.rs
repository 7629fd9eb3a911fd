//! Renders cookie compliance scan reports as JSON, HTML, PDF and email text.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod exit;
pub mod platform;
pub mod render;
pub mod task;
pub mod ui;

pub use crate::core::{CookieFinding, ExpiryView, FindingGroup, Report};
pub use crate::error::RenderError;
pub use crate::task::Task;
