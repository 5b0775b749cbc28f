//! `logspool` binary: standard input in, rotated log files out.

use {
    clap::Parser,
    logspool::{
        cli::Cli,
        error::{codes, exit_code},
        Roller,
    },
    std::{io, process::ExitCode},
    tracing_subscriber::EnvFilter,
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level());

    let result = cli
        .to_config()
        .and_then(|config| Roller::new(&config, io::stdin().lock()).run());

    match result {
        Ok(_) => ExitCode::from(codes::SUCCESS),
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(exit_code(&err))
        }
    }
}

/// Diagnostics go to stderr; stdout stays unused. `RUST_LOG` takes precedence
/// over the `-v` level.
fn init_tracing(level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
