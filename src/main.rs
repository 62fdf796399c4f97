//! smallsh: 小さな対話シェル
//!
//! REPLループ: バックグラウンド reap → モード切替通知 → プロンプト → 読み取り → `$$` 展開 → パース → 実行 → ループ
//!
//! モジュール構成は [`smallsh`] クレートのドキュメントを参照。

use std::io::{self, Write};

use smallsh::config::Config;
use smallsh::expand::expand_pid;
use smallsh::input::{self, LineReader, ReadEvent};
use smallsh::shell::Shell;
use smallsh::signal::ToggleBlock;
use smallsh::{executor, job, logger, parser, signal};

/// 未出力のモード切替メッセージを出す。何か出したら `true`（メッセージ自体がプロンプトで終わる）。
fn flush_notices<W: Write>(out: &mut W) -> io::Result<bool> {
    let notices = signal::take_notices();
    for msg in &notices {
        out.write_all(msg.as_bytes())?;
    }
    out.flush()?;
    Ok(!notices.is_empty())
}

/// 1 行読み取る。SIGTSTP で中断されたら通知を出して読み取りを再開する。
fn read_command(
    reader: &mut LineReader,
    block: &ToggleBlock,
    out: &mut impl Write,
) -> io::Result<Option<String>> {
    loop {
        match reader.read_line(block.wait_mask())? {
            ReadEvent::Line(line) => return Ok(Some(line)),
            ReadEvent::Interrupted => {
                flush_notices(out)?;
            }
            ReadEvent::Eof => return Ok(None),
        }
    }
}

fn run(shell: &mut Shell) -> io::Result<()> {
    let mut reader = LineReader::stdin();
    let mut stdout = io::stdout();

    loop {
        // プロンプト前にバックグラウンドプロセスを reap し、完了通知を出力
        let done = shell.jobs.reap();
        job::notify(&mut stdout, &done)?;

        // 通知の確認から入力待ちまで SIGTSTP を保留する。子プロセスに継承させないよう実行前に解除
        let block = ToggleBlock::new()?;

        // 切替メッセージは ": " で終わるのでプロンプトを兼ねる
        if !flush_notices(&mut stdout)? {
            input::prompt(&mut stdout)?;
        }

        let line = read_command(&mut reader, &block, &mut stdout)?;
        drop(block);

        let line = match line {
            Some(line) => line,
            None => {
                // EOF: exit と同様にバックグラウンドプロセスを片付けて終了
                println!();
                shell.jobs.kill_all();
                break;
            }
        };

        let expanded = expand_pid(&line, shell.pid);
        match parser::parse(&expanded, signal::background_allowed()) {
            Ok(Some(cmd)) => executor::execute(shell, &cmd, &mut stdout)?,
            Ok(None) => {} // 空行・コメント
            Err(e) => eprintln!("smallsh: {}", e),
        }

        if shell.should_exit {
            break;
        }
    }
    Ok(())
}

fn main() {
    let config = Config::from_env();
    logger::init(config.log_level);

    // シェル自体は SIGINT を無視し、SIGTSTP でフォアグラウンド専用モードを切り替える
    if let Err(e) = signal::install_shell_handlers() {
        eprintln!("smallsh: sigaction: {}", e);
        std::process::exit(1);
    }

    let mut shell = Shell::new();
    if let Err(e) = run(&mut shell) {
        eprintln!("smallsh: {}", e);
        shell.jobs.kill_all();
        std::process::exit(1);
    }
}
