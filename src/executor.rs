//! コマンド実行: ビルトイン判定と外部コマンドの起動・待機。
//!
//! - ビルトイン: fork なしでプロセス内実行（リダイレクトと `&` は無視）
//! - 外部コマンド: [`spawn::spawn`] で fork + execvp
//!   - foreground: `waitpid(WUNTRACED)` で終了まで待機し、`last_status` を更新
//!   - background: PID を表示してレジストリに登録し、即座に返る

use std::io::{self, Write};

use crate::builtins::Builtin;
use crate::job;
use crate::parser::Command;
use crate::shell::Shell;
use crate::spawn::{self, Redirects};

/// パース済みコマンドを実行する。
///
/// `out` にはシェル自身の出力（`status`、バックグラウンド PID、シグナル終了の通知）を書く。
/// 起動や待機の失敗は stderr に報告し、ループを止めずに戻る。
pub fn execute<W: Write>(shell: &mut Shell, cmd: &Command<'_>, out: &mut W) -> io::Result<()> {
    let Some(&name) = cmd.args.first() else {
        return Ok(());
    };
    if let Some(builtin) = Builtin::lookup(name) {
        return builtin.run(shell, &cmd.args, out);
    }
    launch(shell, cmd, out)
}

/// 外部コマンドを子プロセスとして起動する。
fn launch<W: Write>(shell: &mut Shell, cmd: &Command<'_>, out: &mut W) -> io::Result<()> {
    let redirects = match Redirects::new(cmd.input, cmd.output) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("smallsh: {}", spawn::SpawnError::from(e));
            return Ok(());
        }
    };

    let pid = match spawn::spawn(&cmd.args, &redirects, cmd.background) {
        Ok(pid) => pid,
        Err(e) => {
            eprintln!("smallsh: {}", e);
            return Ok(());
        }
    };

    if cmd.background {
        writeln!(out, "background pid is {}", pid)?;
        shell.jobs.insert(pid);
        return out.flush();
    }

    match job::wait_for_fg(pid) {
        Ok(status) => {
            log::debug!("foreground pid {pid} finished: {status}");
            shell.last_status = status;
            if let job::ExitStatus::Signaled(_) = status {
                writeln!(out, "{}", status)?;
            }
        }
        Err(e) => eprintln!("smallsh: waitpid: {}", e),
    }
    out.flush()
}
