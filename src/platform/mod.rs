use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use wait_timeout::ChildExt;

use crate::render::FixedLayoutEngine;

pub const INPUT_PLACEHOLDER: &str = "{input}";
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

const MAX_STDERR_IN_ERROR: usize = 2 * 1024;

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: String,
}

/// Runs `cmd` to completion, draining stdout and stderr while it runs so
/// large outputs cannot fill the pipe. With a timeout the child is killed
/// once it expires.
pub fn run_command(cmd: &str, args: &[String], timeout: Option<Duration>) -> Result<CommandOutput> {
    let mut child = Command::new(cmd)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to start process: {cmd}"))?;

    let stdout_reader = child.stdout.take().map(|mut out| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = out.read_to_end(&mut buf);
            buf
        })
    });
    let stderr_reader = child.stderr.take().map(|mut err| {
        thread::spawn(move || {
            let mut buf = String::new();
            let _ = err.read_to_string(&mut buf);
            buf
        })
    });

    let status = match timeout {
        Some(timeout) => match child
            .wait_timeout(timeout)
            .with_context(|| format!("failed to wait for process: {cmd}"))?
        {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(anyhow!("timed out after {timeout:?}: {cmd}"));
            }
        },
        None => child
            .wait()
            .with_context(|| format!("failed to wait for process: {cmd}"))?,
    };

    let stdout = stdout_reader
        .and_then(|h| h.join().ok())
        .unwrap_or_default();
    let stderr = stderr_reader
        .and_then(|h| h.join().ok())
        .unwrap_or_default();

    tracing::trace!(cmd, exit_code = status.code().unwrap_or(-1), stdout_bytes = stdout.len(), "process finished");

    Ok(CommandOutput {
        exit_code: status.code().unwrap_or(-1),
        stdout,
        stderr,
    })
}

pub fn effective_home_dir() -> Result<PathBuf> {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("HOME is not set"))
}

/// Fixed-layout engine backed by a local converter program.
///
/// The endpoint names the program. `{input}` in an argument is replaced by the
/// markup path. When an argument contains `{output}` the document is read from
/// a scoped temporary file substituted there; otherwise stdout is the document.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl Default for CommandEngine {
    fn default() -> Self {
        Self {
            args: default_converter_args(),
            timeout: Some(Duration::from_secs(120)),
        }
    }
}

pub fn default_converter_args() -> Vec<String> {
    vec!["--quiet".to_string(), INPUT_PLACEHOLDER.to_string(), "-".to_string()]
}

impl CommandEngine {
    pub fn new(args: Vec<String>, timeout: Option<Duration>) -> Self {
        Self { args, timeout }
    }

    fn convert(&self, program: &str, markup_path: &Path) -> Result<Vec<u8>> {
        let program = program.trim();
        if program.is_empty() {
            bail!("no converter configured");
        }

        let output_file = if self.args.iter().any(|a| a.contains(OUTPUT_PLACEHOLDER)) {
            let mut builder = tempfile::Builder::new();
            builder.prefix("cookiereport-").suffix(".pdf");
            let file = match markup_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                Some(dir) => builder.tempfile_in(dir),
                None => builder.tempfile(),
            }
            .context("failed to create converter output file")?;
            Some(file)
        } else {
            None
        };

        let input = markup_path.display().to_string();
        let output = output_file
            .as_ref()
            .map(|f| f.path().display().to_string())
            .unwrap_or_default();
        let args: Vec<String> = self
            .args
            .iter()
            .map(|a| a.replace(INPUT_PLACEHOLDER, &input).replace(OUTPUT_PLACEHOLDER, &output))
            .collect();

        tracing::debug!(program, ?args, "running converter");
        let out = run_command(program, &args, self.timeout)?;
        if out.exit_code != 0 {
            let stderr = out.stderr.trim();
            let stderr = match stderr.char_indices().nth(MAX_STDERR_IN_ERROR) {
                Some((idx, _)) => &stderr[..idx],
                None => stderr,
            };
            bail!("{program} exited with status {}: {stderr}", out.exit_code);
        }

        let blob = match &output_file {
            Some(file) => std::fs::read(file.path())
                .with_context(|| format!("failed to read converter output: {}", file.path().display()))?,
            None => out.stdout,
        };
        if blob.is_empty() {
            bail!("{program} produced no output");
        }
        Ok(blob)
    }
}

impl FixedLayoutEngine for CommandEngine {
    fn render_fixed_layout(&self, endpoint: &str, markup_path: &Path) -> Result<Vec<u8>> {
        self.convert(endpoint, markup_path)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).expect("write script");
        let mut perms = std::fs::metadata(&path).expect("metadata").permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).expect("chmod");
        path
    }

    #[test]
    fn run_command_collects_large_stdout() {
        let out = run_command(
            "sh",
            &["-c".to_string(), "head -c 300000 /dev/zero".to_string()],
            Some(Duration::from_secs(10)),
        )
        .expect("run");
        assert_eq!(out.exit_code, 0);
        assert_eq!(out.stdout.len(), 300_000);
    }

    #[test]
    fn run_command_kills_on_timeout() {
        let err = run_command(
            "sh",
            &["-c".to_string(), "sleep 5".to_string()],
            Some(Duration::from_millis(100)),
        )
        .expect_err("should time out");
        assert!(err.to_string().contains("timed out"), "err={err}");
    }

    #[test]
    fn engine_reads_document_from_stdout() {
        let dir = tempfile::tempdir().expect("tmp");
        let script = write_script(dir.path(), "conv", "#!/bin/sh\nprintf '%%PDF-'\ncat \"$2\"\n");
        let markup = dir.path().join("in.html");
        std::fs::write(&markup, "<p>hi</p>").expect("write markup");

        let engine = CommandEngine::default();
        let blob = engine
            .render_fixed_layout(script.to_str().expect("utf8"), &markup)
            .expect("convert");
        assert_eq!(blob, b"%PDF-<p>hi</p>");
    }

    #[test]
    fn engine_reads_document_from_output_placeholder() {
        let dir = tempfile::tempdir().expect("tmp");
        let script = write_script(dir.path(), "conv", "#!/bin/sh\ncat \"$1\" > \"${2#--out=}\"\n");
        let markup = dir.path().join("in.html");
        std::fs::write(&markup, "doc").expect("write markup");

        let engine = CommandEngine::new(
            vec![INPUT_PLACEHOLDER.to_string(), format!("--out={OUTPUT_PLACEHOLDER}")],
            None,
        );
        let blob = engine
            .render_fixed_layout(script.to_str().expect("utf8"), &markup)
            .expect("convert");
        assert_eq!(blob, b"doc");

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .expect("read dir")
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".pdf"))
            .collect();
        assert!(leftovers.is_empty(), "output file should be removed");
    }

    #[test]
    fn engine_reports_failure_status_and_stderr() {
        let dir = tempfile::tempdir().expect("tmp");
        let script = write_script(dir.path(), "conv", "#!/bin/sh\necho 'cannot load page' >&2\nexit 3\n");
        let markup = dir.path().join("in.html");
        std::fs::write(&markup, "doc").expect("write markup");

        let err = CommandEngine::default()
            .render_fixed_layout(script.to_str().expect("utf8"), &markup)
            .expect_err("should fail");
        let msg = err.to_string();
        assert!(msg.contains("status 3"), "msg={msg}");
        assert!(msg.contains("cannot load page"), "msg={msg}");
    }

    #[test]
    fn engine_rejects_empty_output_and_blank_endpoint() {
        let dir = tempfile::tempdir().expect("tmp");
        let script = write_script(dir.path(), "conv", "#!/bin/sh\nexit 0\n");
        let markup = dir.path().join("in.html");
        std::fs::write(&markup, "doc").expect("write markup");

        let err = CommandEngine::default()
            .render_fixed_layout(script.to_str().expect("utf8"), &markup)
            .expect_err("empty output");
        assert!(err.to_string().contains("produced no output"));

        let err = CommandEngine::default()
            .render_fixed_layout("  ", &markup)
            .expect_err("blank endpoint");
        assert!(err.to_string().contains("no converter configured"));
    }
}
