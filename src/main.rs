fn main() {
    if let Err(err) = specroute::cli::run_cli() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
