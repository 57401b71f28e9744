use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, error, info};
use tokio::sync::broadcast::error::RecvError;

mod analytics;
mod config;
mod console;
mod daily_command;
mod datetime;
mod entry_command;
mod error;
mod ledger;
mod logging;
mod overlap;
mod stats_command;
mod store;
mod time_entry;
mod timer;
mod timer_command;

use config::Config;
use console::{ConsoleMarkdownList, ConsolePresenter};
use daily_command::{DailyArgs, DailyCommand};
use entry_command::{DeleteArgs, EditArgs, EntryArgs, EntryCommand};
use error::StoreError;
use ledger::LedgerClient;
use stats_command::{StatsArgs, StatsCommand};
use store::TimeEntryStore;
use timer_command::{TimerArgs, TimerCommand};

/// time entryを記録・集計するためのCLIアプリケーション。
///
/// # Examples
/// ```
/// $ cargo run -- day
/// $ cargo run -- add -t "Review" -s "2024-03-01 09:00" -e "2024-03-01 10:00" -c work
/// $ cargo run -- stats --range week
/// ```
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    #[clap(long = "config", help = "Sets an additional config file")]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    subcommand: SubCommands,
}

/// サブコマンドを表す列挙型。
#[derive(Debug, Subcommand)]
enum SubCommands {
    /// Show the entries of a day
    Day(DailyArgs),
    /// Add a time entry
    Add(EntryArgs),
    /// Replace the contents of a time entry
    Edit(EditArgs),
    /// Delete a time entry
    Delete(DeleteArgs),
    /// Show the time distribution by category
    Stats(StatsArgs),
    /// Run a timer until Ctrl-C and record it as a time entry
    Timer(TimerArgs),
    /// List the categories
    Categories,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(args.config.as_deref())?;
    logging::init(&config.log_level, config.log_file.as_deref())?;
    info!("Using ledger API at {}", config.api_url);

    let result = match bootstrap(&config).await {
        Ok(mut store) => {
            let mut events = store.subscribe();
            tokio::spawn(async move {
                loop {
                    match events.recv().await {
                        Ok(event) => debug!("Store event: {:?}", event),
                        Err(RecvError::Lagged(skipped)) => {
                            debug!("Skipped {} store events", skipped)
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            });
            run(args.subcommand, &mut store).await
        }
        Err(err) => Err(err),
    };

    if let Err(err) = &result {
        if let Some(message) = report(err) {
            eprintln!("{}", message);
        }
    }

    result
}

/// 台帳クライアントを作成し、カテゴリーとタイムエントリーを読み込んだストアを返す。
async fn bootstrap(config: &Config) -> Result<TimeEntryStore<LedgerClient>> {
    let client = LedgerClient::new(&config.api_url, config.api_token.clone())
        .context("Failed to new ledger client")?;
    let mut store = TimeEntryStore::new(client);
    store
        .load_categories()
        .await
        .context("Failed to load categories")?;
    store
        .load_entries()
        .await
        .context("Failed to load time entries")?;

    Ok(store)
}

/// エラーが`StoreError`を含む場合、ユーザー向けのメッセージを返す。
fn report(err: &anyhow::Error) -> Option<&'static str> {
    let store_error = err.downcast_ref::<StoreError>()?;
    if store_error.is_validation() {
        info!("Rejected before reaching the ledger: {}", store_error);
    }

    Some(user_message(store_error))
}

/// サブコマンドを実行し、結果を標準出力に表示する。
async fn run(subcommand: SubCommands, store: &mut TimeEntryStore<LedgerClient>) -> Result<()> {
    let mut stdout = io::stdout();
    let mut presenter = ConsoleMarkdownList::new(&mut stdout);

    match subcommand {
        SubCommands::Day(day) => {
            let entries = DailyCommand::new(store).run(day)?;
            presenter.show_time_entries(&entries, store.categories())?;
        }
        SubCommands::Add(entry) => {
            let entry = EntryCommand::new(store).add(entry).await?;
            presenter.show_time_entries(&[entry], store.categories())?;
        }
        SubCommands::Edit(edit) => {
            let entry = EntryCommand::new(store).edit(edit).await?;
            presenter.show_time_entries(&[entry], store.categories())?;
        }
        SubCommands::Delete(delete) => EntryCommand::new(store).delete(delete).await?,
        SubCommands::Stats(stats) => {
            let report = StatsCommand::new(store).run(stats)?;
            println!("## {} ~ {}", report.from, report.to);
            presenter.show_category_breakdown(&report.breakdown)?;
            presenter.show_statistics(&report.statistics)?;
        }
        SubCommands::Timer(timer) => {
            let stop = async {
                if let Err(err) = tokio::signal::ctrl_c().await {
                    error!("Failed to listen for Ctrl-C: {}", err);
                }
            };
            let entry = TimerCommand::new(store).run(timer, stop).await?;
            presenter.show_time_entries(&[entry], store.categories())?;
        }
        SubCommands::Categories => presenter.show_categories(store.categories())?,
    }

    Ok(())
}

/// エラーの種類ごとにユーザー向けのメッセージを返す。
fn user_message(error: &StoreError) -> &'static str {
    match error {
        StoreError::InvalidRange { .. } => "The end time must be after the start time.",
        StoreError::UnknownCategory(_) => "The selected category does not exist.",
        StoreError::Overlap { .. } => {
            "This time slot overlaps with an existing entry. Please choose a different time."
        }
        StoreError::Fetch(_) => "Failed to load time entries.",
        StoreError::Create(_) => "Failed to create time entry.",
        StoreError::Update(_) => "Failed to update time entry.",
        StoreError::Delete(_) => "Failed to delete time entry.",
    }
}
