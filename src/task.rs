use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::EffectiveConfig;
use crate::core::Report;
use crate::error::RenderError;
use crate::platform::CommandEngine;
use crate::render::{
    EmailFormatter, FixedLayoutEngine, HtmlRenderer, MarkupRenderer, MessageFormatter, PdfRenderer,
    ScratchSpace, TempScratch,
};

/// One scan's report together with everything needed to render it.
///
/// Every rendering method takes `&self`; a `Task` can be shared between
/// threads and rendered concurrently.
pub struct Task {
    report: Report,
    markup: Arc<dyn MarkupRenderer>,
    message: Arc<dyn MessageFormatter>,
    pdf: PdfRenderer,
}

impl Task {
    /// Uses the built-in HTML renderer, text email formatter and a
    /// command-line converter named by `endpoint`.
    pub fn new(report: Report, endpoint: impl Into<String>) -> Self {
        Self {
            report,
            markup: Arc::new(HtmlRenderer::default()),
            message: Arc::new(EmailFormatter::default()),
            pdf: PdfRenderer::new(endpoint, Arc::new(CommandEngine::default())),
        }
    }

    pub fn from_config(report: Report, cfg: &EffectiveConfig) -> Self {
        let timeout = (cfg.converter.timeout_secs > 0).then(|| Duration::from_secs(cfg.converter.timeout_secs));
        let engine = CommandEngine::new(cfg.converter.args.clone(), timeout);
        let scratch = match &cfg.render.scratch_dir {
            Some(dir) => TempScratch::in_dir(dir),
            None => TempScratch::default(),
        };

        Self::new(report, cfg.converter.endpoint.clone())
            .with_markup_renderer(Arc::new(HtmlRenderer::new(cfg.render.title.clone())))
            .with_message_formatter(Arc::new(EmailFormatter::new(cfg.message.style)))
            .with_engine(Arc::new(engine))
            .with_scratch(Arc::new(scratch))
    }

    pub fn with_markup_renderer(mut self, markup: Arc<dyn MarkupRenderer>) -> Self {
        self.markup = markup;
        self
    }

    pub fn with_message_formatter(mut self, message: Arc<dyn MessageFormatter>) -> Self {
        self.message = message;
        self
    }

    pub fn with_engine(mut self, engine: Arc<dyn FixedLayoutEngine>) -> Self {
        self.pdf = self.pdf.with_engine(engine);
        self
    }

    pub fn with_scratch(mut self, scratch: Arc<dyn ScratchSpace>) -> Self {
        self.pdf = self.pdf.with_scratch(scratch);
        self
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn endpoint(&self) -> &str {
        self.pdf.endpoint()
    }

    pub fn to_json(&self, pretty: bool) -> Result<Vec<u8>, RenderError> {
        crate::render::json::encode(&self.report, pretty)
    }

    pub fn to_html(&self) -> Result<String, RenderError> {
        self.markup.render_markup(&self.report).map_err(RenderError::Markup)
    }

    pub fn to_pdf(&self) -> Result<Vec<u8>, RenderError> {
        self.pdf.render_bytes(&self.report, self.markup.as_ref())
    }

    pub fn write_pdf(&self, filename: impl AsRef<Path>) -> Result<(), RenderError> {
        self.pdf
            .render_to_file(&self.report, self.markup.as_ref(), filename.as_ref())
    }

    pub fn format_email(&self) -> Result<String, RenderError> {
        self.message.render_message(&self.report).map_err(RenderError::Message)
    }
}
