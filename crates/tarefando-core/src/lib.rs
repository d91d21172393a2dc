pub mod aggregate;
pub mod cli;
pub mod commands;
pub mod config;
pub mod controller;
pub mod datetime;
pub mod error;
pub mod fetcher;
pub mod mutation;
pub mod render;
pub mod task;
pub mod transport;

use std::ffi::OsString;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting tarefando"
  );

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(cli.overrides())?;
  debug!(
    api = %cfg.api_base_url,
    locale = %cfg.locale,
    timezone = %cfg.timezone.name(),
    grouped = cfg.grouped,
    files = ?cfg.loaded_files,
    "resolved configuration"
  );

  let transport = Arc::new(
    transport::HttpTransport::new(
      &cfg.api_base_url,
      cfg.accept_invalid_certs
    )?
  );
  let renderer =
    render::TextRenderer::stdout(
      cfg.date_style()
    );
  let view = Arc::new(
    controller::ViewStateController::new(
      transport,
      renderer,
      render::StderrNotifier
    )
    .with_group_by(cfg.grouped)
  );

  let runtime =
    tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .context(
        "failed to start async runtime"
      )?;

  runtime.block_on(
    commands::run_session(
      view,
      tokio::io::BufReader::new(
        tokio::io::stdin()
      )
    )
  )?;

  info!("done");
  Ok(())
}
