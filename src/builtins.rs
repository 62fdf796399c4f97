//! ビルトインコマンドの実装。
//!
//! ビルトインはfork/execを経由せずプロセス内で直接実行される。
//! `try_exec()` が `Some(_)` を返せばビルトインとして処理済み、
//! `None` なら外部コマンドとしてexecutorに委ねる。

use std::env;
use std::io::{self, Write};
use std::path::Path;

use crate::shell::Shell;

/// ビルトインコマンドの種類。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Cd,
    Exit,
    Status,
}

impl Builtin {
    /// コマンド名（完全一致）からビルトインを引く。
    pub fn lookup(name: &str) -> Option<Self> {
        match name {
            "cd" => Some(Self::Cd),
            "exit" => Some(Self::Exit),
            "status" => Some(Self::Status),
            _ => None,
        }
    }

    /// ビルトインを実行する。`out` には `status` の出力が書かれる。
    ///
    /// どのビルトインも `last_status` を更新しない。
    pub fn run<W: Write>(self, shell: &mut Shell, args: &[&str], out: &mut W) -> io::Result<()> {
        match self {
            Self::Cd => {
                builtin_cd(args);
                Ok(())
            }
            Self::Exit => {
                builtin_exit(shell);
                Ok(())
            }
            Self::Status => builtin_status(shell, out),
        }
    }
}

/// ビルトインコマンドの実行を試みる。
///
/// 戻り値:
/// - `Some(result)`: ビルトインとして実行済み
/// - `None`: 該当するビルトインなし（外部コマンドとして実行すべき）
pub fn try_exec<W: Write>(shell: &mut Shell, args: &[&str], out: &mut W) -> Option<io::Result<()>> {
    let builtin = Builtin::lookup(args.first()?)?;
    Some(builtin.run(shell, args, out))
}

/// `exit`: 追跡中のバックグラウンドプロセスを SIGKILL で終了させ、REPLループを止める。
fn builtin_exit(shell: &mut Shell) {
    shell.jobs.kill_all();
    shell.should_exit = true;
}

/// `cd [dir]`: カレントディレクトリを変更する。引数省略時と `~` は `$HOME` に移動。
fn builtin_cd(args: &[&str]) {
    let target = match args.get(1).copied() {
        None | Some("~") => match env::var("HOME") {
            Ok(home) => home,
            Err(_) => {
                eprintln!("smallsh: cd: HOME not set");
                return;
            }
        },
        Some(dir) => dir.to_string(),
    };

    if let Err(e) = env::set_current_dir(Path::new(&target)) {
        eprintln!("smallsh: cd: {}: {}", target, e);
    }
}

/// `status`: 直前のフォアグラウンドコマンドの終了ステータスを表示する。
fn builtin_status<W: Write>(shell: &Shell, out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", shell.last_status)?;
    out.flush()
}
