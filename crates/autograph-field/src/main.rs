//! Command line entry point.

#[cfg(feature = "native")]
fn main() -> std::process::ExitCode {
    use autograph_field::cli::{self, CliError, RenderArgs};
    use std::process::ExitCode;

    env_logger::init();

    let result = RenderArgs::parse(std::env::args().skip(1)).and_then(|args| cli::run(&args));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Usage(message)) => {
            eprintln!("{}\n{}", message, cli::USAGE);
            ExitCode::from(2)
        }
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(feature = "native"))]
fn main() {
    panic!("Native feature not enabled. Use `cargo run --features native`");
}
