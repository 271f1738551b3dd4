use anyhow::Result;
use common::filters::{DirectionSelection, PickFinderFilters, StatSelection};
use serde::Serialize;
use std::io::Write;

use crate::diagnostics::RejectionCounters;
use crate::evaluator::PickResult;
use crate::runner::target_slate;
use crate::source::PickDataSource;

const USAGE: &str = "usage: pickfinder [find [stat|all] [over|under|both] [model,...]] | slate";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Find(FindArgs),
    Slate,
}

/// Positional overrides of the configured search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindArgs {
    pub stat: Option<StatSelection>,
    pub direction: Option<DirectionSelection>,
    pub models: Option<Vec<String>>,
}

impl FindArgs {
    pub fn apply(
        &self,
        filters: &PickFinderFilters,
        default_models: &[String],
    ) -> (PickFinderFilters, Vec<String>) {
        let mut filters = filters.clone();
        if let Some(stat) = self.stat {
            filters.stat_type = stat;
        }
        if let Some(direction) = self.direction {
            filters.over_under = direction;
        }
        let models = self
            .models
            .clone()
            .unwrap_or_else(|| default_models.to_vec());
        (filters, models)
    }
}

pub fn parse_args<I>(mut args: I) -> std::result::Result<Command, String>
where
    I: Iterator<Item = String>,
{
    // Drop argv[0].
    let _ = args.next();

    let Some(cmd) = args.next() else {
        return Ok(Command::Find(FindArgs::default()));
    };

    match cmd.as_str() {
        "find" => parse_find(args).map(Command::Find),
        "slate" => match args.next() {
            None => Ok(Command::Slate),
            Some(extra) => Err(format!("unexpected argument: {extra}\n{USAGE}")),
        },
        "help" | "--help" | "-h" => Err(USAGE.to_string()),
        other => Err(format!("unknown command: {other}\n{USAGE}")),
    }
}

fn parse_find<I>(args: I) -> std::result::Result<FindArgs, String>
where
    I: Iterator<Item = String>,
{
    let mut out = FindArgs::default();
    for (i, arg) in args.enumerate() {
        match i {
            0 => out.stat = Some(StatSelection::try_from(arg)?),
            1 => {
                out.direction = Some(
                    DirectionSelection::from_str_loose(&arg)
                        .ok_or_else(|| format!("unknown direction: {arg}"))?,
                );
            }
            2 => {
                let models: Vec<String> = arg
                    .split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
                    .collect();
                if models.is_empty() {
                    return Err("model list is empty".to_string());
                }
                out.models = Some(models);
            }
            _ => return Err(format!("unexpected argument: {arg}\n{USAGE}")),
        }
    }
    Ok(out)
}

#[derive(Serialize)]
struct Summary<'a> {
    picks: usize,
    diagnostics: &'a RejectionCounters,
}

#[derive(Serialize)]
struct SummaryLine<'a> {
    summary: Summary<'a>,
}

/// One JSON object per pick, then a summary line with the rejection counters.
pub fn write_picks<W: Write>(
    out: &mut W,
    picks: &[PickResult],
    diagnostics: &RejectionCounters,
) -> Result<()> {
    for pick in picks {
        serde_json::to_writer(&mut *out, pick)?;
        writeln!(out)?;
    }
    serde_json::to_writer(
        &mut *out,
        &SummaryLine {
            summary: Summary {
                picks: picks.len(),
                diagnostics,
            },
        },
    )?;
    writeln!(out)?;
    Ok(())
}

pub async fn write_slate<S, W>(source: &S, limit: u32, out: &mut W) -> Result<()>
where
    S: PickDataSource + Sync,
    W: Write,
{
    let slate = target_slate(source.fetch_upcoming_games(limit).await?);
    let Some(first) = slate.first() else {
        writeln!(out, "No upcoming games.")?;
        return Ok(());
    };
    writeln!(
        out,
        "Slate {} ({}, {} games):",
        first.game_date,
        first.game_type.as_str(),
        slate.len()
    )?;
    for g in &slate {
        writeln!(
            out,
            "{:>8}  {:>5} @ {:<5}  {}",
            g.id, g.away_team_id, g.home_team_id, g.status
        )?;
    }
    Ok(())
}
