//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

/// Copy of `cfg` with secrets masked, for display.
fn redacted(cfg: &Config) -> Config {
    let mut shown = cfg.clone();
    if shown.source.api_key.is_some() {
        shown.source.api_key = Some("****".into());
    }
    shown
}

pub fn handle(
    args: &ConfigArgs,
    global: &GlobalOpts,
    cfg: Result<Config, CliError>,
) -> Result<(), CliError> {
    let path = config::config_file(global);

    match args.command {
        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }
            config::save_config_to(&path, &Config::default())?;
            if !global.quiet {
                eprintln!("Wrote default configuration to {}", path.display());
            }
            Ok(())
        }

        ConfigCommand::Show => {
            let shown = redacted(&cfg?);
            let text = toml::to_string_pretty(&shown)?;
            let out = output::render_single(
                global.output,
                &shown,
                |_| text.trim_end().to_owned(),
                |_| path.display().to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_is_masked() {
        let mut cfg = Config::default();
        cfg.source.api_key = Some("hunter2".into());
        cfg.source.api_key_env = Some("MY_KEY".into());

        let shown = redacted(&cfg);
        assert_eq!(shown.source.api_key.as_deref(), Some("****"));
        assert_eq!(shown.source.api_key_env.as_deref(), Some("MY_KEY"));
    }
}
