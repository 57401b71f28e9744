use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;

use crate::error::StoreError;
use crate::ledger::LedgerRepository;
use crate::store::TimeEntryStore;
use crate::time_entry::TimeEntry;
use crate::timer::{format_time, ScheduledTask, Timer};

/// `timer`サブコマンドの引数。
#[derive(Debug, clap::Args)]
pub struct TimerArgs {
    #[clap(short = 't', long = "title", help = "Sets the title of the recorded entry")]
    title: String,

    #[clap(long = "description", help = "Sets an optional description")]
    description: Option<String>,

    #[clap(short = 'c', long = "category", help = "Sets the category id")]
    category_id: String,
}

pub struct TimerCommand<'a, T: LedgerRepository> {
    store: &'a mut TimeEntryStore<T>,
}

impl<'a, T: LedgerRepository> TimerCommand<'a, T> {
    pub fn new(store: &'a mut TimeEntryStore<T>) -> Self {
        Self { store }
    }

    /// `timer`サブコマンドの処理を行う。
    ///
    /// `stop`が完了するまでタイマーを動かし、計測した時間をタイムエントリーとして記録する。
    /// 計測中は1分ごとに経過時間をログに出力する。
    ///
    /// # Arguments
    ///
    /// * `args` - `timer`サブコマンドの引数
    /// * `stop` - 計測を終了するタイミングで完了するFuture
    pub async fn run<F>(&mut self, args: TimerArgs, stop: F) -> Result<TimeEntry>
    where
        F: Future<Output = ()>,
    {
        if self.store.category(&args.category_id).is_none() {
            return Err(StoreError::UnknownCategory(args.category_id).into());
        }

        let mut timer = Timer::new();
        timer.start();
        let progress = {
            let started = tokio::time::Instant::now();
            ScheduledTask::every(Duration::from_secs(60), move || {
                info!("Elapsed: {}", format_time(started.elapsed().as_secs()));
            })
        };

        stop.await;
        progress.cancel();
        info!("Timer stopped at {}", timer.formatted());

        let draft = timer.finish(&args.title, args.description, &args.category_id);
        let entry = self
            .store
            .create_entry(draft)
            .await
            .context("Failed to record timer entry")?;

        Ok(entry)
    }
}
