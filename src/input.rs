//! プロンプト表示と 1 行読み取り。
//!
//! `libc::read` で stdin を直接読む。`std::io::Stdin` は EINTR を内部で再試行してしまうため、
//! SIGTSTP で読み取りが中断されたことをメインループに伝えられない。
//! 改行までに読んだバイトは [`LineReader`] 内に保持し、中断後の再開で失われないようにする。
//!
//! 呼び出し側は SIGTSTP をブロックしたまま読み取りを始める。待機は `pselect(2)` で行い、
//! 待機中だけ `wait_mask` を適用してシグナルを受け付ける。これで通知の確認と待機開始の間に
//! 届いたシグナルも待機を中断させ、取りこぼさない。

use std::io::{self, Write};

/// プロンプト文字列。
pub const PROMPT: &str = ": ";

/// [`LineReader::read_line`] の結果。
#[derive(Debug, PartialEq, Eq)]
pub enum ReadEvent {
    /// 1 行（改行は含まない）。
    Line(String),
    /// シグナルで `read(2)` が中断された。行の途中までの入力は保持されている。
    Interrupted,
    /// 入力の終端。
    Eof,
}

/// fd から改行区切りで読み取るバッファ付きリーダー。
pub struct LineReader {
    fd: libc::c_int,
    buf: Vec<u8>,
    eof: bool,
}

impl LineReader {
    pub fn new(fd: libc::c_int) -> Self {
        Self {
            fd,
            buf: Vec::new(),
            eof: false,
        }
    }

    pub fn stdin() -> Self {
        Self::new(libc::STDIN_FILENO)
    }

    /// バッファから 1 行取り出す。
    fn take_line(&mut self) -> Option<String> {
        let nl = self.buf.iter().position(|&b| b == b'\n')?;
        let rest = self.buf.split_off(nl + 1);
        let mut line = std::mem::replace(&mut self.buf, rest);
        line.pop(); // '\n'
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// `wait_mask` を適用した状態で fd が読み取り可能になるまで待つ。
    fn wait_readable(&self, wait_mask: &libc::sigset_t) -> io::Result<()> {
        unsafe {
            let mut readfds: libc::fd_set = std::mem::zeroed();
            libc::FD_ZERO(&mut readfds);
            libc::FD_SET(self.fd, &mut readfds);
            let ret = libc::pselect(
                self.fd + 1,
                &mut readfds,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                std::ptr::null(),
                wait_mask,
            );
            if ret < 0 {
                return Err(io::Error::last_os_error());
            }
        }
        Ok(())
    }

    /// 改行まで読み取る。終端に改行のない最終行もそのまま返す。
    ///
    /// `wait_mask` は入力待ちの間に適用するシグナルマスク。
    pub fn read_line(&mut self, wait_mask: &libc::sigset_t) -> io::Result<ReadEvent> {
        loop {
            if let Some(line) = self.take_line() {
                return Ok(ReadEvent::Line(line));
            }
            if self.eof {
                if self.buf.is_empty() {
                    return Ok(ReadEvent::Eof);
                }
                let line = String::from_utf8_lossy(&self.buf).into_owned();
                self.buf.clear();
                return Ok(ReadEvent::Line(line));
            }

            if let Err(err) = self.wait_readable(wait_mask) {
                if err.kind() == io::ErrorKind::Interrupted {
                    return Ok(ReadEvent::Interrupted);
                }
                return Err(err);
            }

            let mut chunk = [0u8; 4096];
            let n = unsafe {
                libc::read(self.fd, chunk.as_mut_ptr() as *mut libc::c_void, chunk.len())
            };
            match n {
                0 => self.eof = true,
                n if n > 0 => self.buf.extend_from_slice(&chunk[..n as usize]),
                _ => {
                    let err = io::Error::last_os_error();
                    if err.kind() == io::ErrorKind::Interrupted {
                        return Ok(ReadEvent::Interrupted);
                    }
                    return Err(err);
                }
            }
        }
    }
}

/// プロンプトを表示する。
pub fn prompt<W: Write>(out: &mut W) -> io::Result<()> {
    out.write_all(PROMPT.as_bytes())?;
    out.flush()
}
