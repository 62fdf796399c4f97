//! 環境変数から読む起動時設定。シェル本体はコマンドライン引数を取らない。

use std::str::FromStr;

use log::LevelFilter;

/// 診断ログのレベルを指定する環境変数。
pub const LOG_ENV: &str = "SMALLSH_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// 診断ログ（stderr）のレベル。既定は `off`。
    pub log_level: LevelFilter,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `lookup` で変数を引いて設定を組み立てる。不正な値は既定値に倒す。
    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_level = lookup(LOG_ENV)
            .and_then(|v| LevelFilter::from_str(v.trim()).ok())
            .unwrap_or(LevelFilter::Off);
        Self { log_level }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LevelFilter::Off,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_from_env() {
        let cfg = Config::from_lookup(|k| (k == LOG_ENV).then(|| "debug".to_string()));
        assert_eq!(cfg.log_level, LevelFilter::Debug);

        let cfg = Config::from_lookup(|k| (k == LOG_ENV).then(|| "TRACE".to_string()));
        assert_eq!(cfg.log_level, LevelFilter::Trace);
    }

    #[test]
    fn defaults_to_off() {
        assert_eq!(Config::from_lookup(|_| None), Config::default());
        let cfg = Config::from_lookup(|_| Some("loud".to_string()));
        assert_eq!(cfg.log_level, LevelFilter::Off);
    }
}
