use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::platform::default_converter_args;
use crate::render::MessageStyle;
use crate::render::html::DEFAULT_TITLE;

#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    pub converter: ConverterConfig,
    pub render: RenderConfig,
    pub message: MessageConfig,
    pub output: OutputConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConverterConfig {
    pub endpoint: String,
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderConfig {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageConfig {
    pub style: MessageStyle,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputConfig {
    pub pretty_json: bool,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self {
            converter: ConverterConfig {
                endpoint: "wkhtmltopdf".to_string(),
                args: default_converter_args(),
                timeout_secs: 120,
            },
            render: RenderConfig {
                title: DEFAULT_TITLE.to_string(),
                scratch_dir: None,
            },
            message: MessageConfig {
                style: MessageStyle::Text,
            },
            output: OutputConfig { pretty_json: true },
            config_path: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    converter: Option<RawConverterConfig>,
    render: Option<RawRenderConfig>,
    message: Option<RawMessageConfig>,
    output: Option<RawOutputConfig>,
}

#[derive(Debug, Deserialize)]
struct RawConverterConfig {
    endpoint: Option<String>,
    args: Option<Vec<String>>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawRenderConfig {
    title: Option<String>,
    scratch_dir: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMessageConfig {
    style: Option<MessageStyle>,
}

#[derive(Debug, Deserialize)]
struct RawOutputConfig {
    pretty_json: Option<bool>,
}

pub fn default_config_path(home_dir: &Path) -> PathBuf {
    home_dir.join(".config/cookiereport/config.toml")
}

pub fn load(config_path: Option<&Path>, home_dir: &Path) -> Result<EffectiveConfig> {
    let mut cfg = EffectiveConfig::default();

    let path = config_path
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| default_config_path(home_dir));

    if path.exists() {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let raw: RawConfig = toml::from_str(&s).context("failed to parse config file (TOML)")?;
        apply_raw_config(&mut cfg, raw);
        cfg.config_path = Some(path.display().to_string());
    } else if config_path.is_some() {
        anyhow::bail!("config file not found: {}", path.display());
    }

    apply_env_overrides(&mut cfg)?;

    Ok(cfg)
}

fn apply_raw_config(cfg: &mut EffectiveConfig, raw: RawConfig) {
    if let Some(converter) = raw.converter {
        if let Some(endpoint) = converter.endpoint {
            cfg.converter.endpoint = endpoint;
        }
        if let Some(args) = converter.args {
            cfg.converter.args = args;
        }
        if let Some(timeout_secs) = converter.timeout_secs {
            cfg.converter.timeout_secs = timeout_secs;
        }
    }

    if let Some(render) = raw.render {
        if let Some(title) = render.title {
            cfg.render.title = title;
        }
        if let Some(scratch_dir) = render.scratch_dir {
            cfg.render.scratch_dir = non_empty(&scratch_dir);
        }
    }

    if let Some(message) = raw.message {
        if let Some(style) = message.style {
            cfg.message.style = style;
        }
    }

    if let Some(output) = raw.output {
        if let Some(pretty_json) = output.pretty_json {
            cfg.output.pretty_json = pretty_json;
        }
    }
}

fn apply_env_overrides(cfg: &mut EffectiveConfig) -> Result<()> {
    if let Ok(v) = std::env::var("COOKIEREPORT_CONVERTER_ENDPOINT") {
        if let Some(v) = non_empty(&v) {
            cfg.converter.endpoint = v;
        }
    }
    if let Ok(v) = std::env::var("COOKIEREPORT_CONVERTER_ARGS") {
        let parts: Vec<String> = v
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();
        if !parts.is_empty() {
            cfg.converter.args = parts;
        }
    }
    if let Ok(v) = std::env::var("COOKIEREPORT_CONVERTER_TIMEOUT_SECS") {
        cfg.converter.timeout_secs = v
            .trim()
            .parse::<u64>()
            .with_context(|| "COOKIEREPORT_CONVERTER_TIMEOUT_SECS")?;
    }
    if let Ok(v) = std::env::var("COOKIEREPORT_RENDER_TITLE") {
        if let Some(v) = non_empty(&v) {
            cfg.render.title = v;
        }
    }
    if let Ok(v) = std::env::var("COOKIEREPORT_SCRATCH_DIR") {
        cfg.render.scratch_dir = non_empty(&v);
    }
    if let Ok(v) = std::env::var("COOKIEREPORT_MESSAGE_STYLE") {
        cfg.message.style = v
            .parse::<MessageStyle>()
            .map_err(anyhow::Error::msg)
            .with_context(|| "COOKIEREPORT_MESSAGE_STYLE")?;
    }
    if let Ok(v) = std::env::var("COOKIEREPORT_OUTPUT_PRETTY_JSON") {
        cfg.output.pretty_json =
            parse_bool(&v).with_context(|| "COOKIEREPORT_OUTPUT_PRETTY_JSON")?;
    }

    Ok(())
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn parse_bool(s: &str) -> Result<bool> {
    let s = s.trim().to_ascii_lowercase();
    match s.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow::anyhow!(
            "invalid boolean: {s} (expected true|false|1|0|yes|no|on|off)"
        )),
    }
}
