use anyhow::Error;
use std::io::{self, Write};

pub fn eprintln_error(err: &Error) {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "error:");
    let _ = writeln!(stderr, "  {err}");

    let mut causes = err.chain().skip(1).peekable();
    if causes.peek().is_some() {
        let _ = writeln!(stderr, "caused by:");
        for cause in causes {
            let _ = writeln!(stderr, "  - {cause}");
        }
    }

    let _ = writeln!(stderr, "next:");
    let _ = writeln!(
        stderr,
        "  - rerun with `--verbose` (or COOKIEREPORT_LOG=debug) for details"
    );
    let _ = writeln!(
        stderr,
        "  - see `cookiereport --help` for available commands and options"
    );
}

pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let b = bytes as f64;
    if b < KB {
        return format!("{bytes} B");
    }
    if b < MB {
        return format!("{:.1} KiB", b / KB);
    }
    if b < GB {
        return format!("{:.1} MiB", b / MB);
    }
    format!("{:.1} GiB", b / GB)
}
