//! `fork()` + `execvp()` による外部コマンド起動。
//!
//! 子プロセス側ではシグナル設定とリダイレクトを適用してから `execvp` する。
//! fork 後の子ではアロケーションを避けるため、argv とファイルパスの C 文字列は fork 前に用意する。
//!
//! ## 構成
//!
//! | 型 | 役割 |
//! |-----|------|
//! | [`CStringVec`] | argv 用の NULL 終端ポインタ配列 |
//! | [`Redirects`] | 子プロセスで開くファイルのパス（C 文字列） |
//! | [`spawn`] | 上記を組み合わせて fork し、子 PID を返す公開関数 |

use std::ffi::{CStr, CString, NulError};
use std::fmt;
use std::io::{self, Write};

use crate::signal;

// ── エラー型 ──────────────────────────────────────────────────────

/// 子プロセスを作れなかったことを表すエラー。exec 失敗は子プロセス側で報告される。
#[derive(Debug)]
pub enum SpawnError {
    /// `fork()` が失敗した。
    Fork(io::Error),
    /// 引数またはファイル名に NUL バイトが含まれていた。
    Nul(NulError),
}

impl fmt::Display for SpawnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fork(e) => write!(f, "fork: {e}"),
            Self::Nul(_) => write!(f, "argument contains a NUL byte"),
        }
    }
}

impl From<NulError> for SpawnError {
    fn from(e: NulError) -> Self {
        Self::Nul(e)
    }
}

// ── CStringVec ────────────────────────────────────────────────────

/// argv 用の CString ベクタ。NULL 終端のポインタ配列を構築する。
pub struct CStringVec {
    strings: Vec<CString>,
    ptrs: Vec<*const libc::c_char>,
}

impl CStringVec {
    /// 引数リストから構築する。NUL バイトを含む引数があればエラー。
    pub fn from_args(args: &[&str]) -> Result<Self, NulError> {
        let strings = args
            .iter()
            .map(|s| CString::new(*s))
            .collect::<Result<Vec<_>, _>>()?;
        let mut ptrs: Vec<*const libc::c_char> = strings.iter().map(|s| s.as_ptr()).collect();
        ptrs.push(std::ptr::null()); // NULL 終端
        Ok(Self { strings, ptrs })
    }

    /// `args[0]`（コマンド名）。
    fn program(&self) -> Option<&CStr> {
        self.strings.first().map(|s| s.as_c_str())
    }

    /// NULL 終端ポインタ配列を返す。
    fn as_ptr(&self) -> *const *const libc::c_char {
        self.ptrs.as_ptr()
    }
}

// ── Redirects ─────────────────────────────────────────────────────

/// 子プロセスで適用するリダイレクト。`None` ならその方向は継承（バックグラウンドでは `/dev/null`）。
pub struct Redirects {
    input: Option<CString>,
    output: Option<CString>,
}

impl Redirects {
    pub fn new(input: Option<&str>, output: Option<&str>) -> Result<Self, NulError> {
        Ok(Self {
            input: input.map(CString::new).transpose()?,
            output: output.map(CString::new).transpose()?,
        })
    }
}

/// 出力リダイレクトで作成するファイルのパーミッション（rw-r--r--）。
const OUTPUT_MODE: libc::c_uint = 0o644;

const DEV_NULL: &CStr = c"/dev/null";

// ── 子プロセス側 ──────────────────────────────────────────────────

/// `path` を開いて `target_fd` に dup2 する。
fn redirect(path: &CStr, flags: libc::c_int, target_fd: libc::c_int) -> io::Result<()> {
    let fd = unsafe { libc::open(path.as_ptr(), flags, OUTPUT_MODE) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    let ret = unsafe { libc::dup2(fd, target_fd) };
    let err = io::Error::last_os_error();
    unsafe {
        libc::close(fd);
    }
    if ret < 0 {
        return Err(err);
    }
    Ok(())
}

/// 子プロセスを終了させる。atexit ハンドラや stdio バッファは親のものなので実行しない。
fn child_exit(code: libc::c_int) -> ! {
    unsafe { libc::_exit(code) }
}

/// 子プロセスのエラーを stderr に書いて終了する。
fn child_fail(what: &CStr, err: io::Error) -> ! {
    eprintln!("smallsh: {}: {}", what.to_string_lossy(), err);
    child_exit(1)
}

/// fork 後の子プロセスで実行する。戻らない。
fn exec_child(argv: &CStringVec, redirects: &Redirects, background: bool) -> ! {
    signal::set_child_dispositions(background);

    let read_only = libc::O_RDONLY;
    let write_trunc = libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC;

    if let Some(path) = &redirects.input {
        if let Err(e) = redirect(path, read_only, libc::STDIN_FILENO) {
            child_fail(path, e);
        }
    }
    if let Some(path) = &redirects.output {
        if let Err(e) = redirect(path, write_trunc, libc::STDOUT_FILENO) {
            child_fail(path, e);
        }
    }
    if background && redirects.input.is_none() {
        if let Err(e) = redirect(DEV_NULL, read_only, libc::STDIN_FILENO) {
            child_fail(DEV_NULL, e);
        }
    }
    if background && redirects.output.is_none() {
        if let Err(e) = redirect(DEV_NULL, libc::O_WRONLY, libc::STDOUT_FILENO) {
            child_fail(DEV_NULL, e);
        }
    }

    let Some(program) = argv.program() else {
        child_exit(1);
    };
    unsafe {
        libc::execvp(program.as_ptr(), argv.as_ptr());
    }
    // execvp が戻った = 起動失敗
    child_fail(program, io::Error::last_os_error())
}

// ── spawn 関数 ────────────────────────────────────────────────────

/// 子プロセスを fork して `args[0]` を PATH 検索付きで実行する。成功時は子 PID を返す。
///
/// - `args`: コマンドと引数（1 要素以上）
/// - `redirects`: 子プロセスで開く入出力ファイル
/// - `background`: `true` なら SIGINT を無視し、未指定の stdin/stdout を `/dev/null` に向ける
///
/// 親プロセスはファイルを開かないため、後始末すべき fd はない。
pub fn spawn(args: &[&str], redirects: &Redirects, background: bool) -> Result<libc::pid_t, SpawnError> {
    let argv = CStringVec::from_args(args)?;

    // 子プロセスと stdout バッファを共有しないよう fork 前に吐き出す
    let _ = io::stdout().flush();

    let pid = unsafe { libc::fork() };
    match pid {
        -1 => Err(SpawnError::Fork(io::Error::last_os_error())),
        0 => exec_child(&argv, redirects, background),
        child => {
            log::debug!("forked pid {child} for {:?} (background: {background})", args[0]);
            Ok(child)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argv_is_null_terminated() {
        let argv = CStringVec::from_args(&["ls", "-l"]).unwrap();
        assert_eq!(argv.ptrs.len(), 3);
        assert!(argv.ptrs[2].is_null());
        assert_eq!(argv.program().unwrap().to_str().unwrap(), "ls");
    }

    #[test]
    fn nul_byte_is_rejected() {
        assert!(CStringVec::from_args(&["a\0b"]).is_err());
        assert!(Redirects::new(Some("in\0"), None).is_err());
        assert!(Redirects::new(Some("in.txt"), Some("out.txt")).is_ok());
    }
}
