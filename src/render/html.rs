use std::fmt::Write as _;

use anyhow::Result;
use time::format_description::well_known::Rfc3339;

use crate::core::{CookieFinding, FindingGroup, Report};
use crate::render::MarkupRenderer;

pub const DEFAULT_TITLE: &str = "Cookie Compliance Report";

const CSS: &str = r#"body { font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif; color: #222; margin: 2em; }
header { border-bottom: 2px solid #444; margin-bottom: 1.5em; }
h1 { margin-bottom: 0.2em; }
.meta { color: #666; margin-top: 0; }
.screenshot img { max-width: 100%; border: 1px solid #ccc; }
section.category { page-break-inside: avoid; margin-bottom: 2em; }
table { border-collapse: collapse; width: 100%; font-size: 0.85em; }
th, td { border: 1px solid #ccc; padding: 4px 6px; text-align: left; vertical-align: top; }
th { background: #f0f0f0; }
td.flag { text-align: center; }
.empty { color: #888; font-style: italic; }"#;

/// Single-file HTML document with embedded styles, suitable as input for
/// print-to-PDF converters.
#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    title: String,
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE)
    }
}

impl HtmlRenderer {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    pub fn render(&self, report: &Report) -> Result<String> {
        let mut out = String::with_capacity(16 * 1024);
        let title = escape_html(&self.title);
        let scan_time = report.scan_time.format(&Rfc3339)?;

        let _ = writeln!(out, "<!DOCTYPE html>");
        let _ = writeln!(out, "<html lang=\"en\">");
        let _ = writeln!(out, "<head>");
        let _ = writeln!(out, "<meta charset=\"UTF-8\">");
        let _ = writeln!(out, "<title>{title}</title>");
        let _ = writeln!(out, "<style>\n{CSS}\n</style>");
        let _ = writeln!(out, "</head>");
        let _ = writeln!(out, "<body>");

        let _ = writeln!(out, "<header>");
        let _ = writeln!(out, "<h1>{title}</h1>");
        let _ = writeln!(
            out,
            "<p class=\"meta\">Site: <strong>{}</strong> | Scanned: {} | Cookies: {}</p>",
            escape_html(&report.scan_url),
            escape_html(&scan_time),
            report.cookie_count
        );
        let _ = writeln!(out, "</header>");

        if report.has_screenshot() {
            if let Some(image) = report.screenshot_image.as_deref() {
                let _ = writeln!(out, "<section class=\"screenshot\">");
                let _ = writeln!(
                    out,
                    "<img alt=\"Screenshot of {}\" src=\"data:image/png;base64,{}\">",
                    escape_html(&report.scan_url),
                    escape_html(image.trim())
                );
                let _ = writeln!(out, "</section>");
            }
        }

        if report.records.is_empty() {
            let _ = writeln!(out, "<p class=\"empty\">No cookies were found.</p>");
        }
        for group in &report.records {
            write_group(&mut out, group);
        }

        let _ = writeln!(out, "</body>");
        let _ = writeln!(out, "</html>");
        Ok(out)
    }
}

impl MarkupRenderer for HtmlRenderer {
    fn render_markup(&self, report: &Report) -> Result<String> {
        self.render(report)
    }
}

fn write_group(out: &mut String, group: &FindingGroup) {
    let _ = writeln!(out, "<section class=\"category\">");
    let _ = writeln!(
        out,
        "<h2>{} ({})</h2>",
        escape_html(&group.category),
        group.cookies.len()
    );
    if !group.description.trim().is_empty() {
        let _ = writeln!(out, "<p>{}</p>", escape_html(group.description.trim()));
    }

    if group.cookies.is_empty() {
        let _ = writeln!(out, "<p class=\"empty\">No cookies in this category.</p>");
        let _ = writeln!(out, "</section>");
        return;
    }

    let _ = writeln!(out, "<table>");
    let _ = writeln!(
        out,
        "<thead><tr><th>Name</th><th>Domain</th><th>Path</th><th>Expiry</th><th>Secure</th><th>HttpOnly</th><th>SameSite</th><th>Requests</th><th>Description</th><th>Set by</th></tr></thead>"
    );
    let _ = writeln!(out, "<tbody>");
    for cookie in &group.cookies {
        write_cookie_row(out, cookie);
    }
    let _ = writeln!(out, "</tbody>");
    let _ = writeln!(out, "</table>");
    let _ = writeln!(out, "</section>");
}

fn write_cookie_row(out: &mut String, c: &CookieFinding) {
    let set_by = if c.initiator.is_empty() {
        c.origin()
    } else if c.source.is_empty() {
        c.initiator.clone()
    } else {
        format!("{} ({})", c.initiator, c.origin())
    };

    let _ = writeln!(
        out,
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class=\"flag\">{}</td><td class=\"flag\">{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
        escape_html(&c.name),
        escape_html(&c.domain),
        escape_html(&c.path),
        escape_html(&c.expiry_view().to_string()),
        flag(c.secure),
        flag(c.http_only),
        escape_html(&c.same_site),
        c.used_requests,
        escape_html(&c.description),
        escape_html(&set_by),
    );
}

fn flag(on: bool) -> &'static str {
    if on { "yes" } else { "no" }
}

pub(crate) fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
