fn main() {
    if let Err(err) = umlflow_core::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
