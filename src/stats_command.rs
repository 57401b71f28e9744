use anyhow::{bail, Result};
use chrono::NaiveDate;
use log::info;

use crate::analytics::{self, CategoryShare, Statistics, TimeRange};
use crate::datetime::{self, parse_date};
use crate::ledger::LedgerRepository;
use crate::store::TimeEntryStore;

/// `stats`サブコマンドの引数を表す構造体。
#[derive(Debug, clap::Args)]
pub struct StatsArgs {
    #[clap(
        short = 'r',
        long = "range",
        help = "Sets the range: today, week, month or year",
        default_value = "month",
        parse(try_from_str = parse_range),
    )]
    range: TimeRange,

    #[clap(
        long = "from",
        help = "Sets the first day of a custom range in the format YYYY-MM-DD",
        requires = "to",
        parse(try_from_str = parse_date),
    )]
    from: Option<NaiveDate>,

    #[clap(
        long = "to",
        help = "Sets the last day of a custom range in the format YYYY-MM-DD",
        requires = "from",
        parse(try_from_str = parse_date),
    )]
    to: Option<NaiveDate>,
}

/// 集計結果。
#[derive(Debug)]
pub struct StatsReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub breakdown: Vec<CategoryShare>,
    pub statistics: Statistics,
}

pub struct StatsCommand<'a, T: LedgerRepository> {
    store: &'a TimeEntryStore<T>,
}

impl<'a, T: LedgerRepository> StatsCommand<'a, T> {
    pub fn new(store: &'a TimeEntryStore<T>) -> Self {
        Self { store }
    }

    /// `stats`サブコマンドの処理を行う。
    ///
    /// Localタイムゾーンで指定された期間のtime entryをカテゴリーごとに集計する。
    /// `--from`と`--to`が指定された場合は`--range`より優先する。
    pub fn run(&self, stats: StatsArgs) -> Result<StatsReport> {
        let range = match (stats.from, stats.to) {
            (Some(from), Some(to)) => TimeRange::Custom(from, to),
            _ => stats.range,
        };
        let (from, to) = range.bounds(datetime::today())?;
        if to < from {
            bail!("The end of the range {} is before its start {}", to, from);
        }
        info!("Start at: {}, End at: {}", from, to);

        let time_entries = self.store.entries_between(from, to);
        let categories = self.store.categories();
        info!(
            "Total duration: {} seconds",
            analytics::time_stats(&time_entries).total_duration
        );

        Ok(StatsReport {
            from,
            to,
            breakdown: analytics::category_breakdown(&time_entries, categories),
            statistics: analytics::statistics(&time_entries, categories),
        })
    }
}

/// 期間の名前をパースする。
fn parse_range(s: &str) -> Result<TimeRange> {
    let range = match s {
        "today" => TimeRange::Today,
        "week" => TimeRange::Week,
        "month" => TimeRange::Month,
        "year" => TimeRange::Year,
        _ => bail!("Unknown range: {}", s),
    };

    Ok(range)
}
