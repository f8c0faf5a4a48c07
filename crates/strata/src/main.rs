mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use strata_config::LogSection;

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Config supplies logging defaults; a broken file is reported by the
    // command that needs it.
    let cfg = config::load(&cli.global);
    let log = cfg.as_ref().map(|c| c.log.clone()).unwrap_or_default();
    init_tracing(cli.global.verbose, &log);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli, cfg).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, log: &LogSection) {
    let filter = match verbosity {
        0 => log.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli, cfg: Result<Config, CliError>) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a record source
        Command::Config(ref args) => commands::config_cmd::handle(args, &cli.global, cfg),

        // Shell completions generation
        Command::Completions(ref args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "strata", &mut std::io::stdout());
            Ok(())
        }

        // Everything else loads the store first
        cmd => {
            let cfg = cfg?;
            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &cli.global, &cfg).await
        }
    }
}
