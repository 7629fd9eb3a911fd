use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::EffectiveConfig;
use crate::render::MessageStyle;
use crate::task::Task;

#[derive(Debug, Parser)]
#[command(
    name = "cookiereport",
    version,
    about = "Render cookie compliance scan reports as JSON, HTML, PDF or email text"
)]
pub struct Cli {
    #[arg(long, global = true)]
    pub verbose: bool,
    #[arg(long, global = true)]
    pub quiet: bool,
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Converter program used for PDF output.
    #[arg(long, global = true)]
    pub converter: Option<String>,
    /// Converter timeout in seconds, 0 disables it.
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Json(JsonArgs),
    Html(HtmlArgs),
    Pdf(PdfArgs),
    Email(EmailArgs),
    Completion(CompletionArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct JsonArgs {
    /// Saved report JSON, `-` for stdin.
    #[arg(long)]
    pub input: PathBuf,
    #[arg(long)]
    pub compact: bool,
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct HtmlArgs {
    #[arg(long)]
    pub input: PathBuf,
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct PdfArgs {
    #[arg(long)]
    pub input: PathBuf,
    #[arg(long)]
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct EmailArgs {
    #[arg(long)]
    pub input: PathBuf,
    #[arg(long)]
    pub style: Option<MessageStyle>,
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CompletionArgs {
    pub shell: String,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[arg(long)]
    pub show: bool,
    /// Print the effective config as JSON instead of TOML.
    #[arg(long, requires = "show")]
    pub json: bool,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let env_config_path = std::env::var_os("COOKIEREPORT_CONFIG").map(PathBuf::from);
    let config_path = cli.config.as_deref().or(env_config_path.as_deref());
    let home_dir = match config_path {
        Some(_) => crate::platform::effective_home_dir().unwrap_or_default(),
        None => crate::platform::effective_home_dir().map_err(crate::exit::invalid_args_err)?,
    };
    let mut cfg = crate::config::load(config_path, &home_dir).map_err(crate::exit::invalid_args_err)?;
    if let Some(endpoint) = cli.converter {
        cfg.converter.endpoint = endpoint;
    }
    if let Some(timeout) = cli.timeout {
        cfg.converter.timeout_secs = timeout;
    }

    let show_progress = io::stderr().is_terminal() && !cli.quiet;

    match cli.command {
        Commands::Json(args) => {
            let task = load_task(&args.input, &cfg)?;
            let pretty = !args.compact && cfg.output.pretty_json;
            let mut buf = task.to_json(pretty)?;
            buf.push(b'\n');
            write_output(args.output.as_deref(), &buf)?;
        }
        Commands::Html(args) => {
            let task = load_task(&args.input, &cfg)?;
            let html = task.to_html()?;
            write_output(args.output.as_deref(), html.as_bytes())?;
        }
        Commands::Pdf(args) => {
            let task = load_task(&args.input, &cfg)?;

            let pb = if show_progress {
                let pb = indicatif::ProgressBar::new_spinner();
                pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
                pb.set_message(format!("converting with {}...", task.endpoint()));
                pb.enable_steady_tick(Duration::from_millis(120));
                Some(pb)
            } else {
                None
            };
            let res = task.write_pdf(&args.output);
            if let Some(pb) = pb {
                pb.finish_and_clear();
            }
            res?;

            if !cli.quiet {
                let size = std::fs::metadata(&args.output).map(|m| m.len()).unwrap_or(0);
                eprintln!(
                    "wrote {} ({})",
                    args.output.display(),
                    crate::ui::format_bytes(size)
                );
            }
        }
        Commands::Email(args) => {
            if let Some(style) = args.style {
                cfg.message.style = style;
            }
            let task = load_task(&args.input, &cfg)?;
            let body = task.format_email()?;
            write_output(args.output.as_deref(), body.as_bytes())?;
        }
        Commands::Completion(args) => {
            let shell = parse_shell(&args.shell)?;
            let mut cmd = Cli::command();
            let mut out = std::io::stdout().lock();
            clap_complete::generate(shell, &mut cmd, "cookiereport", &mut out);
        }
        Commands::Config(args) => {
            if args.show {
                if args.json {
                    let stdout = std::io::stdout();
                    serde_json::to_writer_pretty(stdout.lock(), &cfg)?;
                } else {
                    println!("{}", toml::to_string_pretty(&cfg)?);
                }
            } else if !cli.quiet {
                eprintln!("config: use `cookiereport config --show`");
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        Level::DEBUG
    } else if quiet {
        Level::ERROR
    } else {
        Level::WARN
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .with_env_var("COOKIEREPORT_LOG")
        .from_env_lossy();
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();
}

fn load_task(input: &Path, cfg: &EffectiveConfig) -> Result<Task> {
    let bytes = if input == Path::new("-") {
        let mut buf = Vec::new();
        io::stdin()
            .lock()
            .read_to_end(&mut buf)
            .context("failed to read report from stdin")?;
        buf
    } else {
        std::fs::read(input)
            .with_context(|| format!("failed to read report: {}", input.display()))
            .map_err(crate::exit::invalid_args_err)?
    };

    let report = crate::render::json::decode(&bytes)
        .with_context(|| format!("not a valid report: {}", input.display()))
        .map_err(crate::exit::invalid_args_err)?;
    tracing::debug!(
        scan_url = %report.scan_url,
        groups = report.records.len(),
        cookies = report.cookie_count,
        "report loaded"
    );

    Ok(Task::from_config(report, cfg))
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<()> {
    use std::io::Write;

    if let Some(path) = path {
        return std::fs::write(path, bytes)
            .with_context(|| format!("failed to write {}", path.display()));
    }

    let mut stdout = std::io::stdout().lock();
    match stdout.write_all(bytes) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn parse_shell(s: &str) -> Result<clap_complete::Shell> {
    let s = s.trim().to_ascii_lowercase();
    match s.as_str() {
        "bash" => Ok(clap_complete::Shell::Bash),
        "zsh" => Ok(clap_complete::Shell::Zsh),
        "fish" => Ok(clap_complete::Shell::Fish),
        other => Err(crate::exit::invalid_args(format!(
            "unsupported shell: {other} (expected bash|zsh|fish)"
        ))),
    }
}
