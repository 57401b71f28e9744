use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// 環境変数のプレフィックス。`TRACKLOG_API_URL`のように指定する。
const ENV_PREFIX: &str = "TRACKLOG_";

/// アプリケーションの設定。
///
/// 既定値、設定ファイル、環境変数の順に上書きされる。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// 台帳APIのベースURL
    pub api_url: String,
    /// 台帳APIのトークン
    pub api_token: Option<String>,
    /// `error`, `warn`, `info`, `debug`, `trace`のいずれか
    pub log_level: String,
    /// 指定された場合はログをファイルにも出力する
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000/api".to_string(),
            api_token: None,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl Config {
    /// 設定を読み込む。
    ///
    /// # Arguments
    ///
    /// * `config_path` - 既定の場所に加えて読み込む設定ファイル
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = default_config_path() {
            figment = figment.merge(Toml::file(path));
        }
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .context("Failed to load configuration")
    }
}

/// 既定の設定ファイルのパスを返す。
///
/// Linuxでは`~/.config/tracklog/config.toml`となる。
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(env!("CARGO_PKG_NAME")).join("config.toml"))
}
