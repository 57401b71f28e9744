use anyhow::Result;
use chrono::NaiveDate;
use log::info;

use crate::datetime::{self, parse_date};
use crate::ledger::LedgerRepository;
use crate::store::TimeEntryStore;
use crate::time_entry::TimeEntry;

/// 日毎の情報を出力するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct DailyArgs {
    #[clap(
        short = 'd',
        long = "date",
        help = "Sets a custom date in the format YYYY-MM-DD",
        parse(try_from_str = parse_date),
    )]
    date: Option<NaiveDate>,
}

pub struct DailyCommand<'a, T: LedgerRepository> {
    store: &'a TimeEntryStore<T>,
}

impl<'a, T: LedgerRepository> DailyCommand<'a, T> {
    /// 新しい`DailyCommand`を返す。
    ///
    /// # Arguments
    /// * `store` - エントリーを読み込み済みのストア
    pub fn new(store: &'a TimeEntryStore<T>) -> Self {
        Self { store }
    }

    /// `day`サブコマンドの処理を行う。
    ///
    /// Localタイムゾーンで指定された日に開始したタイムエントリーを返す。
    /// 日付が指定されていない場合は、Localタイムゾーンで現在の日付を利用する。
    ///
    /// # Arguments
    ///
    /// * `daily` - `daily`サブコマンドの引数
    pub fn run(&self, daily: DailyArgs) -> Result<Vec<TimeEntry>> {
        let date = daily.date.unwrap_or_else(datetime::today);
        let time_entries = self.store.entries_for_day(date);
        info!("{} time entries on {}", time_entries.len(), date);

        Ok(time_entries)
    }
}
