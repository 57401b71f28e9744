use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use log::info;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::datetime;
use crate::time_entry::TimeEntryDraft;

/// 一定間隔で繰り返し実行されるタスク。
///
/// `cancel`を呼ぶか、dropされた時点で停止する。
pub struct ScheduledTask {
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    /// `period`ごとに`callback`を実行するタスクを開始する。
    ///
    /// 最初の実行は開始から`period`経過後となる。
    pub fn every<F>(period: Duration, mut callback: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                callback();
            }
        });

        Self { handle }
    }

    /// タスクを停止する。
    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// タイマーの経過秒数と世代。
///
/// 世代は開始と停止のたびに進み、古いタスクからのカウントを無視するために使う。
#[derive(Debug, Default)]
struct Ticks {
    seconds: u64,
    generation: u64,
}

/// `generation`が現在の世代と一致する場合のみ1秒進める。
fn tick(ticks: &Mutex<Ticks>, generation: u64) {
    let mut ticks = ticks.lock().unwrap_or_else(PoisonError::into_inner);
    if ticks.generation == generation {
        ticks.seconds += 1;
    }
}

/// 経過秒数を1秒ごとに数えるタイマー。
#[derive(Default)]
pub struct Timer {
    ticks: Arc<Mutex<Ticks>>,
    task: Option<ScheduledTask>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    fn ticks(&self) -> MutexGuard<'_, Ticks> {
        self.ticks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 計測を開始する。すでに動いている場合は何もしない。
    pub fn start(&mut self) {
        if self.task.is_some() {
            return;
        }
        let generation = {
            let mut ticks = self.ticks();
            ticks.generation += 1;
            ticks.generation
        };
        let ticks = Arc::clone(&self.ticks);
        self.task = Some(ScheduledTask::every(Duration::from_secs(1), move || {
            tick(&ticks, generation);
        }));
        info!("Timer started");
    }

    /// 計測を一時停止する。経過秒数は保持される。
    ///
    /// 停止後に実行中だったコールバックが完了しても経過秒数は変わらない。
    pub fn pause(&mut self) {
        if let Some(task) = self.task.take() {
            self.ticks().generation += 1;
            task.cancel();
            info!("Timer paused at {}", self.formatted());
        }
    }

    /// 計測を停止し、経過秒数を0に戻す。
    pub fn reset(&mut self) {
        self.pause();
        self.ticks().seconds = 0;
        info!("Timer reset");
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.ticks().seconds
    }

    /// 経過時間を`HH:MM:SS`形式で返す。
    pub fn formatted(&self) -> String {
        format_time(self.elapsed_seconds())
    }

    /// 計測した時間を現在時刻で終わるタイムエントリーのドラフトにし、タイマーをリセットする。
    pub fn finish(
        &mut self,
        title: &str,
        description: Option<String>,
        category_id: &str,
    ) -> TimeEntryDraft {
        self.pause();
        let elapsed = self.elapsed_seconds();
        let end_time = datetime::now();
        let start_time = end_time - ChronoDuration::seconds(elapsed as i64);
        self.reset();

        TimeEntryDraft {
            title: title.to_string(),
            description,
            start_time,
            end_time,
            category_id: category_id.to_string(),
        }
    }
}

/// 秒数を`HH:MM:SS`形式の文字列にする。
pub fn format_time(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}
