//! 診断ログ用の `log::Log` 実装。stderr に `smallsh[pid]: LEVEL message` 形式で 1 行ずつ書く。
//!
//! ユーザー向けエラーは `eprintln!` で直接出すので、ここを通るのは開発用のトレースだけ。
//! シグナルハンドラと fork 後の子プロセスからは使わない。

use std::io::Write;

use log::{LevelFilter, Log, Metadata, Record};

pub struct StderrLogger<W: Send + Sync>
where
    for<'a> &'a W: Write,
{
    target: W,
    pid: u32,
}

impl<W: Send + Sync> Log for StderrLogger<W>
where
    for<'a> &'a W: Write,
{
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let _ = writeln!(&self.target, "smallsh[{}]: {} {}", self.pid, record.level(), record.args());
        }
    }

    fn flush(&self) {
        let _ = (&self.target).flush();
    }
}

impl StderrLogger<std::io::Stderr> {
    pub fn new() -> Self {
        Self {
            target: std::io::stderr(),
            pid: std::process::id(),
        }
    }
}

/// グローバルロガーを登録する。`Off` なら何もしない。
pub fn init(level: LevelFilter) {
    if level == LevelFilter::Off {
        return;
    }
    if log::set_boxed_logger(Box::new(StderrLogger::new())).is_ok() {
        log::set_max_level(level);
    }
}
