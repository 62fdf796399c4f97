//! シグナル処理: SIGTSTP によるフォアグラウンド専用モードの切り替えと、シグナル設定。
//!
//! ハンドラはアトミック変数の更新のみを行う。モード切り替えのメッセージは
//! メインループが安全な地点（フォアグラウンド待機の後、プロンプト読み取りの中断時、プロンプト前）で
//! [`take_notices`] を呼んで出力する。
//!
//! | シグナル | シェル | フォアグラウンド子 | バックグラウンド子 |
//! |----------|--------|--------------------|--------------------|
//! | SIGINT   | 無視   | デフォルト         | 無視               |
//! | SIGTSTP  | トグル | 無視               | 無視               |
//! | SIGPIPE  | 無視   | デフォルト         | デフォルト         |

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// バックグラウンド実行（`&`）が許可されているか。初期値は許可。
static BACKGROUND_ALLOWED: AtomicBool = AtomicBool::new(true);

/// まだメッセージを出力していないトグル回数。
static PENDING_TOGGLES: AtomicUsize = AtomicUsize::new(0);

pub const ENTER_FG_ONLY: &str = "\nEntering foreground-only mode (& is now ignored)\n: ";
pub const EXIT_FG_ONLY: &str = "\nExiting foreground-only mode\n: ";

/// 現在のバックグラウンド許可モードを返す。パース直前に読む。
pub fn background_allowed() -> bool {
    BACKGROUND_ALLOWED.load(Ordering::SeqCst)
}

/// モードを反転し、未出力のトグルとして記録する。
fn toggle() {
    BACKGROUND_ALLOWED.fetch_xor(true, Ordering::SeqCst);
    PENDING_TOGGLES.fetch_add(1, Ordering::SeqCst);
}

extern "C" fn on_sigtstp(_signo: libc::c_int) {
    toggle();
}

/// 未出力のトグルに対応するメッセージを発生順に返す。
///
/// 現在のモードから逆算して各トグル直後のモードを復元する。
pub fn take_notices() -> Vec<&'static str> {
    let n = PENDING_TOGGLES.swap(0, Ordering::SeqCst);
    if n == 0 {
        return Vec::new();
    }
    // n 回反転する前のモード
    let mut allowed = background_allowed() ^ (n % 2 == 1);
    (0..n)
        .map(|_| {
            allowed = !allowed;
            if allowed {
                EXIT_FG_ONLY
            } else {
                ENTER_FG_ONLY
            }
        })
        .collect()
}

/// `sigaction` で `signo` のハンドラを設定する。
fn set_action(signo: libc::c_int, handler: libc::sighandler_t, flags: libc::c_int) -> io::Result<()> {
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = handler;
        action.sa_flags = flags;
        libc::sigfillset(&mut action.sa_mask);
        if libc::sigaction(signo, &action, std::ptr::null_mut()) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

/// シェル自身のシグナル設定。SIGINT を無視し、SIGTSTP にトグルハンドラを登録する。
///
/// `SA_RESTART` を付けないため、プロンプトでの `read(2)` は SIGTSTP で EINTR を返す。
pub fn install_shell_handlers() -> io::Result<()> {
    set_action(libc::SIGINT, libc::SIG_IGN, 0)?;
    set_action(libc::SIGTSTP, on_sigtstp as libc::sighandler_t, 0)
}

/// fork 後の子プロセスで呼ぶ。フォアグラウンドなら SIGINT をデフォルトに戻し、SIGTSTP は常に無視。
///
/// Rust ランタイムが無視に設定した SIGPIPE は exec 後も引き継がれるため、デフォルトに戻す。
/// シグナルマスクも空にする。
/// async-signal-safe な操作のみ。失敗は無視する（exec 前の子プロセスに報告手段がないため）。
pub fn set_child_dispositions(background: bool) {
    let sigint = if background { libc::SIG_IGN } else { libc::SIG_DFL };
    let _ = set_action(libc::SIGINT, sigint, 0);
    let _ = set_action(libc::SIGTSTP, libc::SIG_IGN, 0);
    let _ = set_action(libc::SIGPIPE, libc::SIG_DFL, 0);
    unsafe {
        let mut empty: libc::sigset_t = std::mem::zeroed();
        libc::sigemptyset(&mut empty);
        libc::pthread_sigmask(libc::SIG_SETMASK, &empty, std::ptr::null_mut());
    }
}

// ── SIGTSTP ブロック ─────────────────────────────────────────────────

/// 生存中は呼び出しスレッドで SIGTSTP をブロックする RAII ガード。Drop で元のマスクを復元する。
///
/// 通知の確認から入力待ちまでの間にトグルが割り込まないようにする。
/// 入力待ちでは [`wait_mask`](Self::wait_mask) を `pselect` に渡し、待機中だけブロックを解く。
/// 子プロセスの起動前に drop すること。
pub struct ToggleBlock {
    saved: libc::sigset_t,
}

impl ToggleBlock {
    pub fn new() -> io::Result<Self> {
        unsafe {
            let mut set: libc::sigset_t = std::mem::zeroed();
            libc::sigemptyset(&mut set);
            libc::sigaddset(&mut set, libc::SIGTSTP);
            let mut saved: libc::sigset_t = std::mem::zeroed();
            let ret = libc::pthread_sigmask(libc::SIG_BLOCK, &set, &mut saved);
            if ret != 0 {
                return Err(io::Error::from_raw_os_error(ret));
            }
            Ok(Self { saved })
        }
    }

    /// ガード作成前のマスク。入力待ちの間だけ適用する。
    pub fn wait_mask(&self) -> &libc::sigset_t {
        &self.saved
    }
}

impl Drop for ToggleBlock {
    fn drop(&mut self) {
        unsafe {
            libc::pthread_sigmask(libc::SIG_SETMASK, &self.saved, std::ptr::null_mut());
        }
    }
}

/// 呼び出しスレッドで `signo` がブロックされているか。
pub fn is_blocked(signo: libc::c_int) -> bool {
    unsafe {
        let mut current: libc::sigset_t = std::mem::zeroed();
        libc::pthread_sigmask(libc::SIG_BLOCK, std::ptr::null(), &mut current);
        libc::sigismember(&current, signo) == 1
    }
}
