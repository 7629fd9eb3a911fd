//! Output renderers for a [`Report`].
//!
//! The markup renderer, message formatter and fixed-layout engine are
//! capability traits so the pipeline never depends on a concrete template or
//! conversion backend. Closures with the matching signature implement them.

use std::path::Path;

use anyhow::Result;

use crate::core::Report;

pub mod html;
pub mod json;
pub mod message;
pub mod pdf;

pub use html::HtmlRenderer;
pub use message::{EmailFormatter, MessageStyle};
pub use pdf::{PdfRenderer, ScratchSpace, TempScratch};

/// Report -> document markup. Must be deterministic for a given report.
pub trait MarkupRenderer: Send + Sync {
    fn render_markup(&self, report: &Report) -> Result<String>;
}

/// Report -> outbound message body.
pub trait MessageFormatter: Send + Sync {
    fn render_message(&self, report: &Report) -> Result<String>;
}

/// Converts a markup file into a fixed-layout document.
pub trait FixedLayoutEngine: Send + Sync {
    fn render_fixed_layout(&self, endpoint: &str, markup_path: &Path) -> Result<Vec<u8>>;
}

impl<F> MarkupRenderer for F
where
    F: Fn(&Report) -> Result<String> + Send + Sync,
{
    fn render_markup(&self, report: &Report) -> Result<String> {
        self(report)
    }
}

impl<F> MessageFormatter for F
where
    F: Fn(&Report) -> Result<String> + Send + Sync,
{
    fn render_message(&self, report: &Report) -> Result<String> {
        self(report)
    }
}

impl<F> FixedLayoutEngine for F
where
    F: Fn(&str, &Path) -> Result<Vec<u8>> + Send + Sync,
{
    fn render_fixed_layout(&self, endpoint: &str, markup_path: &Path) -> Result<Vec<u8>> {
        self(endpoint, markup_path)
    }
}
