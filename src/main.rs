fn main() {
    if let Err(err) = cookiereport::cli::run() {
        cookiereport::ui::eprintln_error(&err);
        std::process::exit(cookiereport::exit::exit_code(&err));
    }
}
