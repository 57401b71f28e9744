use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

/// ログの出力を初期化する。
///
/// 標準エラー出力には色付きで出力し、`log_file`が指定された場合はファイルにも追記する。
///
/// # Arguments
///
/// * `level` - `info`などのログレベル
/// * `log_file` - ログを追記するファイル
pub fn init(level: &str, log_file: Option<&Path>) -> Result<()> {
    let level = parse_level(level)?;
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::BrightBlack);

    let stderr = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                Local::now().format("%Y-%m-%dT%H:%M:%S"),
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .chain(std::io::stderr());

    let mut dispatch = fern::Dispatch::new()
        .level(LevelFilter::Warn)
        .level_for(env!("CARGO_PKG_NAME"), level)
        .chain(stderr);

    if let Some(path) = log_file {
        let file = fern::log_file(path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;
        dispatch = dispatch.chain(
            fern::Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!(
                        "[{} {} {}] {}",
                        Local::now().format("%Y-%m-%dT%H:%M:%S"),
                        record.level(),
                        record.target(),
                        message
                    ))
                })
                .chain(file),
        );
    }

    dispatch.apply().context("Failed to initialize logger")?;

    Ok(())
}

/// ログレベルをパースする。
fn parse_level(level: &str) -> Result<LevelFilter> {
    LevelFilter::from_str(level).with_context(|| format!("Invalid log level: {}", level))
}
