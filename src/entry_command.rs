use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;

use crate::datetime::parse_local_datetime;
use crate::ledger::LedgerRepository;
use crate::store::TimeEntryStore;
use crate::time_entry::{TimeEntry, TimeEntryDraft};

/// タイムエントリーの内容を指定する引数。`add`と`edit`で共通。
#[derive(Debug, clap::Args)]
pub struct EntryArgs {
    #[clap(short = 't', long = "title", help = "Sets the title of the entry")]
    title: String,

    #[clap(long = "description", help = "Sets an optional description")]
    description: Option<String>,

    #[clap(
        short = 's',
        long = "start",
        help = "Sets the start time in the format \"YYYY-MM-DD HH:MM\"",
        parse(try_from_str = parse_local_datetime),
    )]
    start: DateTime<Utc>,

    #[clap(
        short = 'e',
        long = "end",
        help = "Sets the end time in the format \"YYYY-MM-DD HH:MM\"",
        parse(try_from_str = parse_local_datetime),
    )]
    end: DateTime<Utc>,

    #[clap(short = 'c', long = "category", help = "Sets the category id")]
    category_id: String,
}

impl From<EntryArgs> for TimeEntryDraft {
    fn from(args: EntryArgs) -> Self {
        Self {
            title: args.title,
            description: args.description,
            start_time: args.start,
            end_time: args.end,
            category_id: args.category_id,
        }
    }
}

/// `edit`サブコマンドの引数。
#[derive(Debug, clap::Args)]
pub struct EditArgs {
    #[clap(help = "The id of the entry to edit")]
    id: String,

    #[clap(flatten)]
    entry: EntryArgs,
}

/// `delete`サブコマンドの引数。
#[derive(Debug, clap::Args)]
pub struct DeleteArgs {
    #[clap(help = "The id of the entry to delete")]
    id: String,
}

/// タイムエントリーの作成・更新・削除を行うサブコマンド。
pub struct EntryCommand<'a, T: LedgerRepository> {
    store: &'a mut TimeEntryStore<T>,
}

impl<'a, T: LedgerRepository> EntryCommand<'a, T> {
    /// 新しい`EntryCommand`を返す。
    ///
    /// # Arguments
    /// * `store` - カテゴリーとエントリーを読み込み済みのストア
    pub fn new(store: &'a mut TimeEntryStore<T>) -> Self {
        Self { store }
    }

    pub async fn add(&mut self, args: EntryArgs) -> Result<TimeEntry> {
        let entry = self
            .store
            .create_entry(args.into())
            .await
            .context("Failed to add time entry")?;
        info!("Time entry added: {}", entry.id);

        Ok(entry)
    }

    pub async fn edit(&mut self, args: EditArgs) -> Result<TimeEntry> {
        let entry = self
            .store
            .update_entry(&args.id, args.entry.into())
            .await
            .with_context(|| format!("Failed to edit time entry: {}", args.id))?;
        info!("Time entry updated: {}", entry.id);

        Ok(entry)
    }

    pub async fn delete(&mut self, args: DeleteArgs) -> Result<()> {
        self.store
            .delete_entry(&args.id)
            .await
            .with_context(|| format!("Failed to delete time entry: {}", args.id))?;
        info!("Time entry deleted: {}", args.id);

        Ok(())
    }
}
