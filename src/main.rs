fn main() {
    if let Err(err) = demand_pilot::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
