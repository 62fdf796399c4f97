//! 終了ステータスとバックグラウンドプロセスの管理。
//!
//! フォアグラウンド待機 ([`wait_for_fg`])、バックグラウンドレジストリ ([`BackgroundRegistry`])、
//! 完了通知 ([`notify`]) を提供する。executor と builtins の両方から利用する。

use std::fmt;
use std::io::{self, Write};

use libc::pid_t;

// ── 終了ステータス ───────────────────────────────────────────────────

/// 子プロセスの終了方法。`status` ビルトインと完了通知の表示に使う。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// 正常終了。引数は終了コード。
    Exited(i32),
    /// シグナルによる終了。引数はシグナル番号。
    Signaled(i32),
}

impl ExitStatus {
    /// `waitpid` の raw status を解釈する。停止・再開の通知なら `None`。
    pub fn from_raw(raw: i32) -> Option<Self> {
        if libc::WIFEXITED(raw) {
            Some(Self::Exited(libc::WEXITSTATUS(raw)))
        } else if libc::WIFSIGNALED(raw) {
            Some(Self::Signaled(libc::WTERMSIG(raw)))
        } else {
            None
        }
    }
}

impl Default for ExitStatus {
    fn default() -> Self {
        Self::Exited(0)
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited(code) => write!(f, "exit value {code}"),
            Self::Signaled(sig) => write!(f, "terminated by signal {sig}"),
        }
    }
}

// ── waitpid ラッパー ─────────────────────────────────────────────────

/// `waitpid(pid, flags)` を 1 回呼ぶ。
///
/// `WNOHANG` 指定で状態変化がなければ `Ok(None)`。EINTR は `ErrorKind::Interrupted` として返す。
fn waitpid(pid: pid_t, flags: i32) -> io::Result<Option<i32>> {
    let mut raw_status: i32 = 0;
    let ret = unsafe { libc::waitpid(pid, &mut raw_status, flags) };
    match ret {
        -1 => Err(io::Error::last_os_error()),
        0 => Ok(None),
        _ => Ok(Some(raw_status)),
    }
}

/// 終了通知が来るまで `next` を呼び続ける。
///
/// 停止通知（`WIFSTOPPED`）と EINTR ではループを抜けない。
fn settle<F>(mut next: F) -> io::Result<ExitStatus>
where
    F: FnMut() -> io::Result<i32>,
{
    loop {
        match next() {
            Ok(raw) => match ExitStatus::from_raw(raw) {
                Some(status) => return Ok(status),
                None => log::trace!("ignoring non-terminal wait status {raw:#x}"),
            },
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// フォアグラウンドの子プロセスが終了するまでブロックする。
///
/// `waitpid(pid, WUNTRACED)` をループし、正常終了またはシグナル終了のみで戻る。
/// 子が停止されても待機を続ける。
pub fn wait_for_fg(pid: pid_t) -> io::Result<ExitStatus> {
    settle(|| {
        waitpid(pid, libc::WUNTRACED)?
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "waitpid returned no child"))
    })
}

// ── バックグラウンドレジストリ ────────────────────────────────────────

/// バックグラウンドプロセスの完了報告。
#[derive(Debug, PartialEq, Eq)]
pub struct Completion {
    pub pid: pid_t,
    pub status: ExitStatus,
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "background pid {} is done: {}", self.pid, self.status)
    }
}

/// バックグラウンドで起動した子プロセスの PID 一覧（挿入順）。
///
/// [`Shell`](crate::shell::Shell) が所有する。完了を報告した PID はその時点で取り除く。
#[derive(Debug, Default)]
pub struct BackgroundRegistry {
    pids: Vec<pid_t>,
}

impl BackgroundRegistry {
    pub fn new() -> Self {
        Self { pids: Vec::new() }
    }

    /// PID を末尾に追加する。
    pub fn insert(&mut self, pid: pid_t) {
        self.pids.push(pid);
    }

    /// 追跡中の PID 数。
    pub fn len(&self) -> usize {
        self.pids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pids.is_empty()
    }

    /// 追跡中の PID を挿入順に返す。
    pub fn iter(&self) -> impl Iterator<Item = pid_t> + '_ {
        self.pids.iter().copied()
    }

    /// 各 PID に `waitpid(WNOHANG)` を発行し、終了したものを挿入順に返す。
    ///
    /// 終了を検出した PID と、`ECHILD` 等で待機できなくなった PID はレジストリから取り除く。
    pub fn reap(&mut self) -> Vec<Completion> {
        let mut done = Vec::new();
        self.pids.retain(|&pid| match waitpid(pid, libc::WNOHANG) {
            Ok(Some(raw)) => match ExitStatus::from_raw(raw) {
                Some(status) => {
                    log::debug!("reaped background pid {pid}: {status}");
                    done.push(Completion { pid, status });
                    false
                }
                None => true,
            },
            Ok(None) => true,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => true,
            Err(e) => {
                log::debug!("dropping background pid {pid}: {e}");
                false
            }
        });
        done
    }

    /// 追跡中の全プロセスに SIGKILL を送り、レジストリを空にする。終了ステータスは回収しない。
    pub fn kill_all(&mut self) {
        for pid in self.pids.drain(..) {
            log::debug!("killing background pid {pid}");
            unsafe {
                libc::kill(pid, libc::SIGKILL);
            }
        }
    }
}

/// 完了報告を 1 行ずつ出力する。
pub fn notify<W: Write>(out: &mut W, completions: &[Completion]) -> io::Result<()> {
    for c in completions {
        writeln!(out, "{c}")?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;
    use std::time::{Duration, Instant};

    // Linux の wait status エンコーディング
    fn exited(code: i32) -> i32 {
        code << 8
    }
    fn signaled(sig: i32) -> i32 {
        sig
    }
    fn stopped(sig: i32) -> i32 {
        (sig << 8) | 0x7f
    }

    fn spawn_sh(script: &str) -> pid_t {
        let child = Command::new("sh").arg("-c").arg(script).spawn().unwrap();
        child.id() as pid_t
    }

    fn reap_until(reg: &mut BackgroundRegistry, n: usize) -> Vec<Completion> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut all = Vec::new();
        while all.len() < n && Instant::now() < deadline {
            all.extend(reg.reap());
            std::thread::sleep(Duration::from_millis(10));
        }
        all
    }

    #[test]
    fn status_display() {
        assert_eq!(ExitStatus::Exited(2).to_string(), "exit value 2");
        assert_eq!(ExitStatus::Signaled(9).to_string(), "terminated by signal 9");
        assert_eq!(ExitStatus::default(), ExitStatus::Exited(0));
    }

    #[test]
    fn from_raw_decodes() {
        assert_eq!(ExitStatus::from_raw(exited(0)), Some(ExitStatus::Exited(0)));
        assert_eq!(ExitStatus::from_raw(exited(2)), Some(ExitStatus::Exited(2)));
        assert_eq!(ExitStatus::from_raw(signaled(9)), Some(ExitStatus::Signaled(9)));
        assert_eq!(ExitStatus::from_raw(stopped(libc::SIGSTOP)), None);
    }

    #[test]
    fn settle_skips_stop_events() {
        let mut events = vec![
            Ok(stopped(libc::SIGTSTP)),
            Err(io::Error::from_raw_os_error(libc::EINTR)),
            Ok(stopped(libc::SIGSTOP)),
            Ok(signaled(libc::SIGKILL)),
        ]
        .into_iter();
        let status = settle(|| events.next().unwrap()).unwrap();
        assert_eq!(status, ExitStatus::Signaled(9));
        assert!(events.next().is_none());
    }

    #[test]
    fn settle_propagates_errors() {
        let err = settle(|| Err(io::Error::from_raw_os_error(libc::ECHILD))).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::ECHILD));
    }

    #[test]
    fn wait_for_fg_exit_code() {
        let pid = spawn_sh("exit 2");
        assert_eq!(wait_for_fg(pid).unwrap(), ExitStatus::Exited(2));
    }

    #[test]
    fn wait_for_fg_survives_stop() {
        let pid = spawn_sh("sleep 30");
        unsafe {
            libc::kill(pid, libc::SIGSTOP);
            libc::kill(pid, libc::SIGKILL);
        }
        assert_eq!(wait_for_fg(pid).unwrap(), ExitStatus::Signaled(libc::SIGKILL));
    }

    #[test]
    fn reap_reports_in_insertion_order_and_removes() {
        let mut reg = BackgroundRegistry::new();
        let a = spawn_sh("exit 3");
        let b = spawn_sh("kill -9 $$");
        reg.insert(a);
        reg.insert(b);
        assert_eq!(reg.len(), 2);

        let mut done = reap_until(&mut reg, 2);
        done.sort_by_key(|c| if c.pid == a { 0 } else { 1 });
        assert_eq!(
            done,
            vec![
                Completion { pid: a, status: ExitStatus::Exited(3) },
                Completion { pid: b, status: ExitStatus::Signaled(9) },
            ]
        );
        assert!(reg.is_empty());
        assert!(reg.reap().is_empty());
    }

    #[test]
    fn running_process_stays_registered() {
        let mut reg = BackgroundRegistry::new();
        let pid = spawn_sh("sleep 30");
        reg.insert(pid);
        assert!(reg.reap().is_empty());
        assert_eq!(reg.iter().collect::<Vec<_>>(), vec![pid]);

        reg.kill_all();
        assert!(reg.is_empty());
        assert_eq!(wait_for_fg(pid).unwrap(), ExitStatus::Signaled(libc::SIGKILL));
    }

    #[test]
    fn completion_format() {
        let mut out = Vec::new();
        notify(
            &mut out,
            &[
                Completion { pid: 10, status: ExitStatus::Exited(0) },
                Completion { pid: 11, status: ExitStatus::Signaled(15) },
            ],
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "background pid 10 is done: exit value 0\n\
             background pid 11 is done: terminated by signal 15\n"
        );
    }
}
