//! シェルの実行状態を保持するモジュール。
//!
//! メインループが所有し、builtins と executor に `&mut` で渡す。
//! シグナルハンドラと共有するバックグラウンド許可モードだけは [`signal`](crate::signal) のアトミック変数に置く。

use crate::job::{BackgroundRegistry, ExitStatus};

/// シェルの実行状態。REPLループ全体で共有される。
pub struct Shell {
    /// 直前のフォアグラウンドコマンドの終了ステータス。`status` ビルトインで表示する。
    pub last_status: ExitStatus,
    /// `exit` ビルトインで true にセットされ、REPLループを終了させる。
    pub should_exit: bool,
    /// バックグラウンドで起動した子プロセス。
    pub jobs: BackgroundRegistry,
    /// シェル自身の PID。`$$` 展開に使う。
    pub pid: u32,
}

impl Shell {
    pub fn new() -> Self {
        Self {
            last_status: ExitStatus::default(),
            should_exit: false,
            jobs: BackgroundRegistry::new(),
            pid: std::process::id(),
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}
