use clap::Parser;
use tracing_subscriber::EnvFilter;

use mealtrack::cli::{self, Cli};
use mealtrack::clock::SystemClock;
use mealtrack::config;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = config::load();
    let piped = if cli.command.takes_meal() {
        cli::piped_stdin()
    } else {
        None
    };

    let mut stdout = std::io::stdout().lock();
    cli::execute(
        cli,
        &config,
        piped,
        &SystemClock,
        &mut rand::thread_rng(),
        &mut stdout,
    )
}
