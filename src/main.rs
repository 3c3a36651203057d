fn main() {
    if let Err(error) = agentverse::run() {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}
