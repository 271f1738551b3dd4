use anyhow::{Context, Result};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use pickfinder::orchestrator::PickFinder;
use pickfinder::progress::Progress;
use pickfinder::{cli, metrics};

#[tokio::main]
async fn main() -> Result<()> {
    let config = common::config::Config::load()?;

    let dispatch =
        common::observability::build_dispatch(&config.general.log_level, config.general.log_format);
    tracing::dispatcher::set_global_default(dispatch).map_err(anyhow::Error::msg)?;

    let cmd = cli::parse_args(std::env::args()).map_err(anyhow::Error::msg)?;

    run(config, cmd)
        .instrument(common::observability::service_span("pickfinder"))
        .await
}

async fn run(config: common::config::Config, cmd: cli::Command) -> Result<()> {
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    if let Some(port) = config.observability.prometheus_port {
        metrics::install_prometheus(port).context("installing prometheus exporter")?;
        metrics::describe();
    }

    let db = common::db::AsyncDb::open(&config.database.path).await?;

    let args = match cmd {
        cli::Command::Slate => {
            let mut out = std::io::stdout().lock();
            return cli::write_slate(&db, config.store.upcoming_games_limit, &mut out).await;
        }
        cli::Command::Find(args) => args,
    };

    let (filters, models) = args.apply(&config.filters, &config.finder.model_versions);
    tracing::info!(
        stat = %String::from(filters.stat_type),
        over_under = ?filters.over_under,
        models = ?models,
        "pick search starting"
    );

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; cancelling search");
            on_interrupt.cancel();
        }
    });

    let finder = PickFinder::new(
        db,
        config.store.clone(),
        Duration::from_millis(config.finder.completion_delay_ms),
    );
    let mut on_progress = |p: Progress| {
        tracing::debug!(stage = %p.stage, percent = p.percent, "progress");
    };
    let picks = finder
        .find_picks(&filters, &models, Some(&mut on_progress), &cancel)
        .await
        .context("pick search failed")?;

    let mut out = std::io::stdout().lock();
    cli::write_picks(&mut out, &picks, &finder.diagnostics())?;
    Ok(())
}
