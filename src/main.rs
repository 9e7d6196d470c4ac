//! ploom binary entry point.
//!
//! With arguments, dispatches one command against a fresh state. Without,
//! reads token lines from stdin and dispatches each against the same
//! in-memory state (the in-process driver).

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    std::process::exit(planloom::cli::run(&args));
}
