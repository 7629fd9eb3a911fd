use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use unicode_width::UnicodeWidthStr;

use crate::core::Report;
use crate::render::MessageFormatter;
use crate::render::html::escape_html;

const NAME_COL_MAX: usize = 32;
const DOMAIN_COL_MAX: usize = 32;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStyle {
    #[default]
    Text,
    Html,
}

impl MessageStyle {
    pub const fn as_str(self) -> &'static str {
        match self {
            MessageStyle::Text => "text",
            MessageStyle::Html => "html",
        }
    }
}

impl fmt::Display for MessageStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "plain" => Ok(MessageStyle::Text),
            "html" => Ok(MessageStyle::Html),
            other => Err(format!("invalid message style: {other} (expected text|html)")),
        }
    }
}

/// Summary of a report sized for an email body.
#[derive(Debug, Clone, Default)]
pub struct EmailFormatter {
    style: MessageStyle,
}

impl EmailFormatter {
    pub fn new(style: MessageStyle) -> Self {
        Self { style }
    }

    pub fn format(&self, report: &Report) -> Result<String> {
        match self.style {
            MessageStyle::Text => format_text(report),
            MessageStyle::Html => format_html(report),
        }
    }
}

impl MessageFormatter for EmailFormatter {
    fn render_message(&self, report: &Report) -> Result<String> {
        self.format(report)
    }
}

fn format_text(report: &Report) -> Result<String> {
    let mut out = String::new();
    let scan_time = report.scan_time.format(&Rfc3339)?;

    let _ = writeln!(out, "Cookie compliance scan for {}", report.scan_url);
    let _ = writeln!(out);
    let _ = writeln!(out, "Scanned at: {scan_time}");
    let _ = writeln!(out, "Cookies found: {}", report.cookie_count);

    if report.records.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "No cookies were found.");
        return Ok(out);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "By category:");
    let label_width = report
        .records
        .iter()
        .map(|g| UnicodeWidthStr::width(g.category.as_str()))
        .max()
        .unwrap_or(0);
    for group in &report.records {
        let _ = writeln!(
            out,
            "  {}  {}",
            pad_end_display(&group.category, label_width),
            group.cookies.len()
        );
    }

    for group in &report.records {
        if group.cookies.is_empty() {
            continue;
        }
        let _ = writeln!(out);
        let description = group.description.trim();
        if description.is_empty() {
            let _ = writeln!(out, "[{}]", group.category);
        } else {
            let _ = writeln!(out, "[{}] {description}", group.category);
        }

        let names: Vec<String> = group
            .cookies
            .iter()
            .map(|c| truncate_middle(&c.name, NAME_COL_MAX))
            .collect();
        let domains: Vec<String> = group
            .cookies
            .iter()
            .map(|c| truncate_middle(&c.domain, DOMAIN_COL_MAX))
            .collect();
        let name_width = names.iter().map(|s| UnicodeWidthStr::width(s.as_str())).max().unwrap_or(0);
        let domain_width = domains.iter().map(|s| UnicodeWidthStr::width(s.as_str())).max().unwrap_or(0);

        for ((cookie, name), domain) in group.cookies.iter().zip(&names).zip(&domains) {
            let _ = writeln!(
                out,
                "  - {}  {}  {}",
                pad_end_display(name, name_width),
                pad_end_display(domain, domain_width),
                cookie.expiry_view()
            );
        }
    }

    Ok(out)
}

fn format_html(report: &Report) -> Result<String> {
    let mut out = String::new();
    let scan_time = report.scan_time.format(&Rfc3339)?;

    let _ = writeln!(
        out,
        "<p>Cookie compliance scan for <strong>{}</strong></p>",
        escape_html(&report.scan_url)
    );
    let _ = writeln!(
        out,
        "<p>Scanned at: {}<br>Cookies found: {}</p>",
        escape_html(&scan_time),
        report.cookie_count
    );

    if report.records.is_empty() {
        let _ = writeln!(out, "<p>No cookies were found.</p>");
        return Ok(out);
    }

    for group in &report.records {
        let _ = writeln!(
            out,
            "<h3>{} ({})</h3>",
            escape_html(&group.category),
            group.cookies.len()
        );
        if group.cookies.is_empty() {
            continue;
        }
        let _ = writeln!(out, "<ul>");
        for cookie in &group.cookies {
            let _ = writeln!(
                out,
                "<li><code>{}</code> on {} (expires: {})</li>",
                escape_html(&cookie.name),
                escape_html(&cookie.domain),
                escape_html(&cookie.expiry_view().to_string())
            );
        }
        let _ = writeln!(out, "</ul>");
    }

    Ok(out)
}

fn truncate_middle(s: &str, max_chars: usize) -> String {
    let len = s.chars().count();
    if len <= max_chars {
        return s.to_string();
    }

    let keep = max_chars.saturating_sub(3);
    let left = keep / 2;
    let right = keep.saturating_sub(left);

    let prefix: String = s.chars().take(left).collect();
    let suffix: String = s.chars().skip(len - right).collect();

    format!("{prefix}...{suffix}")
}

fn pad_end_display(s: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(s);
    if w >= width {
        return s.to_string();
    }
    format!("{s}{}", " ".repeat(width - w))
}
