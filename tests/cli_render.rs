use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::atomic::{AtomicU64, Ordering};

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/report.json");

fn cookiereport_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cookiereport"));
    cmd.env("HOME", home);
    cmd.env_remove("COOKIEREPORT_CONFIG");
    cmd.env_remove("COOKIEREPORT_LOG");
    cmd.env_remove("COOKIEREPORT_CONVERTER_ENDPOINT");
    cmd.env_remove("COOKIEREPORT_CONVERTER_ARGS");
    cmd.env_remove("COOKIEREPORT_CONVERTER_TIMEOUT_SECS");
    cmd.env_remove("COOKIEREPORT_RENDER_TITLE");
    cmd.env_remove("COOKIEREPORT_SCRATCH_DIR");
    cmd.env_remove("COOKIEREPORT_MESSAGE_STYLE");
    cmd.env_remove("COOKIEREPORT_OUTPUT_PRETTY_JSON");
    cmd
}

fn run(home: &Path, args: &[&str]) -> Output {
    cookiereport_cmd(home).args(args).output().expect("run cookiereport")
}

fn make_temp_home() -> PathBuf {
    static HOME_SEQ: AtomicU64 = AtomicU64::new(0);

    let temp = std::env::temp_dir();
    let seq = HOME_SEQ.fetch_add(1, Ordering::Relaxed);
    let uniq = format!("cookiereport-cli-test-{}-{seq}", std::process::id());
    let home = temp.join(uniq);
    let _ = std::fs::remove_dir_all(&home);
    std::fs::create_dir_all(&home).expect("create home");
    home
}

#[cfg(unix)]
fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    std::fs::write(path, body).expect("write script");
    let mut perms = std::fs::metadata(path).expect("metadata").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).expect("chmod");
}

fn scratch_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).expect("read scratch").count()
}

#[test]
fn json_compact_reencodes_fixture() {
    let home = make_temp_home();

    let out = run(&home, &["json", "--input", FIXTURE, "--compact"]);
    assert!(
        out.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&out.stderr)
    );

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(stdout.trim_end().lines().count(), 1, "stdout={stdout}");
    let v: serde_json::Value = serde_json::from_str(&stdout).expect("parse json");
    assert_eq!(v["CookieCount"], serde_json::json!(3));
    assert_eq!(v["ScanURL"], serde_json::json!("https://shop.example.com"));
    assert_eq!(v["Records"][1]["Cookies"][1]["Category"], serde_json::json!("unknown"));

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn json_reads_stdin_and_writes_output_file() {
    use std::io::Write;
    use std::process::Stdio;

    let home = make_temp_home();
    let output = home.join("out.json");

    let mut child = cookiereport_cmd(&home)
        .args(["json", "--input", "-", "--output"])
        .arg(&output)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(&std::fs::read(FIXTURE).expect("fixture"))
        .expect("write stdin");
    let out = child.wait_with_output().expect("wait");
    assert!(
        out.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&out.stderr)
    );
    assert!(out.stdout.is_empty());

    let written = std::fs::read_to_string(&output).expect("read output");
    assert!(written.contains("\n  \"ScanTime\": \"2024-05-01T12:30:00+02:00\""), "written={written}");

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn html_renders_groups_and_escapes_names() {
    let home = make_temp_home();

    let out = run(&home, &["html", "--input", FIXTURE]);
    assert!(out.status.success());

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("<!DOCTYPE html>"), "stdout={stdout}");
    assert!(stdout.contains("<h2>necessary (1)</h2>"), "stdout={stdout}");
    assert!(stdout.contains("<h2>marketing (2)</h2>"), "stdout={stdout}");
    assert!(stdout.contains("ads_&lt;tracker&gt;"), "stdout={stdout}");
    assert!(stdout.contains("<td>90 days</td>"), "stdout={stdout}");
    assert!(stdout.contains("<td>1 year</td>"), "stdout={stdout}");

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn email_text_and_html_styles() {
    let home = make_temp_home();

    let out = run(&home, &["email", "--input", FIXTURE]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        stdout.starts_with("Cookie compliance scan for https://shop.example.com"),
        "stdout={stdout}"
    );
    assert!(stdout.contains("Cookies found: 3"), "stdout={stdout}");

    let out = run(&home, &["email", "--input", FIXTURE, "--style", "html"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("<h3>marketing (2)</h3>"), "stdout={stdout}");

    let _ = std::fs::remove_dir_all(&home);
}

#[cfg(unix)]
#[test]
fn pdf_runs_converter_and_cleans_scratch() {
    let home = make_temp_home();
    let scratch = home.join("scratch");
    std::fs::create_dir_all(&scratch).expect("mkdir scratch");
    let converter = home.join("fake-converter");
    write_script(
        &converter,
        "#!/bin/sh\nprintf '%%PDF-1.4\\n'\ncat \"$2\"\n",
    );
    let output = home.join("report.pdf");

    let out = cookiereport_cmd(&home)
        .env("COOKIEREPORT_SCRATCH_DIR", &scratch)
        .args(["pdf", "--input", FIXTURE, "--converter"])
        .arg(&converter)
        .arg("--output")
        .arg(&output)
        .output()
        .expect("run cookiereport");
    assert!(
        out.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&out.stderr)
    );

    let pdf = std::fs::read(&output).expect("read pdf");
    assert!(pdf.starts_with(b"%PDF-1.4\n"));
    assert!(String::from_utf8_lossy(&pdf).contains("<h2>marketing (2)</h2>"));
    assert_eq!(scratch_entries(&scratch), 0);
    assert!(String::from_utf8_lossy(&out.stderr).contains("wrote "));

    let _ = std::fs::remove_dir_all(&home);
}

#[cfg(unix)]
#[test]
fn pdf_converter_failure_exits_20_and_leaves_nothing_behind() {
    let home = make_temp_home();
    let scratch = home.join("scratch");
    std::fs::create_dir_all(&scratch).expect("mkdir scratch");
    let converter = home.join("broken-converter");
    write_script(&converter, "#!/bin/sh\necho 'network unreachable' >&2\nexit 1\n");
    let output = home.join("report.pdf");

    let out = cookiereport_cmd(&home)
        .env("COOKIEREPORT_SCRATCH_DIR", &scratch)
        .env("COOKIEREPORT_CONVERTER_ENDPOINT", &converter)
        .args(["pdf", "--input", FIXTURE, "--output"])
        .arg(&output)
        .output()
        .expect("run cookiereport");

    assert_eq!(out.status.code(), Some(20));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("fixed-layout conversion failed"), "stderr={stderr}");
    assert!(stderr.contains("network unreachable"), "stderr={stderr}");
    assert!(!output.exists());
    assert_eq!(scratch_entries(&scratch), 0);

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn missing_converter_program_exits_20() {
    let home = make_temp_home();
    let output = home.join("report.pdf");

    let out = cookiereport_cmd(&home)
        .args([
            "pdf",
            "--input",
            FIXTURE,
            "--converter",
            "/nonexistent/cookiereport-converter",
            "--output",
        ])
        .arg(&output)
        .output()
        .expect("run cookiereport");

    assert_eq!(out.status.code(), Some(20));
    assert!(!output.exists());

    let _ = std::fs::remove_dir_all(&home);
}
