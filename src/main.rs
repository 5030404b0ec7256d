use clap::Parser;
use taskline::cli::commands::Cli;
use taskline::cli::handlers;
use taskline::io::config_io;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let config = match config_io::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };
    install_tracing(&config.log.level);

    if let Err(e) = handlers::dispatch(cli, &config) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr so stdout stays clean for output. `TASKLINE_LOG` wins over
/// the configured level.
fn install_tracing(level: &str) {
    let filter = EnvFilter::try_from_env("TASKLINE_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
