pub mod api;
pub mod calendar;
pub mod casing;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datastore;
pub mod datetime;
pub mod filter;
pub mod model;
pub mod render;
pub mod state;

use std::ffi::OsString;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::{debug, info};

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::GlobalCli::parse_from(raw_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        "starting postdeck CLI"
    );

    let mut cfg = config::Config::load(cli.config.as_deref())?;
    cfg.apply_overrides(
        cli.timezone.as_deref(),
        cli.backend.as_deref(),
        cli.api_base.as_deref(),
    );

    let tz = datetime::resolve_timezone(cfg.timezone.as_deref())?;

    let data_dir = cfg
        .resolve_data_dir(cli.data.as_deref())
        .context("failed to resolve data directory")?;

    let store = datastore::Store::open(&cfg, &data_dir)
        .with_context(|| format!("failed to open datastore at {}", data_dir.display()))?;

    let session_path = data_dir.join("session.json");
    let first_run = !session_path.exists();
    let session = state::Session::load(&session_path);
    let default_command = if first_run {
        cfg.default_command.clone()
    } else {
        session.view.as_key().to_string()
    };

    let inv = cli::Invocation::parse(&default_command, cli.rest)?;

    let now = Utc::now();
    let today = calendar::today_in_zone(now, tz);
    let state = state::AppState::load(&store, &session, today)?;
    debug!(reference = %state.reference_date, "session restored");

    let mut renderer = render::Renderer::new(&cfg)?;
    let (state, view) =
        commands::dispatch(&store, &cfg, &mut renderer, inv, state, session.view, now, tz)?;

    state
        .session(view)
        .save(&session_path)
        .context("failed to persist session")?;

    info!("done");
    Ok(())
}
