use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::ConfigOverrides;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tarefando",
    version,
    about = "Terminal view over a task REST API: grouped or flat, with complete/cancel"
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    /// TOML config file; defaults to $TAREFANDO_CONFIG or the user config dir.
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Base URL of the task API, e.g. https://localhost:7222/api/tasks
    #[arg(long = "api-url")]
    pub api_url: Option<String>,

    /// Start in grouped-by-day mode.
    #[arg(long = "grouped", action = ArgAction::SetTrue)]
    pub grouped: bool,

    #[arg(long = "locale")]
    pub locale: Option<String>,

    /// IANA timezone used for dates, e.g. America/Sao_Paulo
    #[arg(long = "timezone")]
    pub timezone: Option<String>,
}

impl GlobalCli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_url: self.api_url.clone(),
            locale: self.locale.clone(),
            timezone: self.timezone.clone(),
            grouped: self.grouped.then_some(true),
        }
    }
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    // Frames go to stdout, so logs stay on stderr.
    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::GlobalCli;

    #[test]
    fn flags_become_config_overrides() {
        let cli = GlobalCli::parse_from([
            "tarefando",
            "-vv",
            "--grouped",
            "--api-url",
            "http://localhost:5000/api/tasks",
            "--timezone",
            "UTC",
        ]);
        assert_eq!(cli.verbose, 2);

        let overrides = cli.overrides();
        assert_eq!(overrides.grouped, Some(true));
        assert_eq!(
            overrides.api_url.as_deref(),
            Some("http://localhost:5000/api/tasks")
        );
        assert_eq!(overrides.timezone.as_deref(), Some("UTC"));
        assert_eq!(overrides.locale, None);
    }

    #[test]
    fn grouped_flag_absent_leaves_config_alone() {
        let cli = GlobalCli::parse_from(["tarefando"]);
        assert_eq!(cli.overrides().grouped, None);
    }
}
