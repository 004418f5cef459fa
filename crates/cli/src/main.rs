fn main() {
    if let Err(err) = grsd_cli::run_entry() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
