//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = stalela_cli::run() {
        eprintln!("stalela: {err}");
        std::process::exit(1);
    }
}
