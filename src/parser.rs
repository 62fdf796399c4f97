//! トークナイザ + パーサー: 展開済みの入力行から 1 コマンド分の [`Command`] を構築する。
//!
//! 空白（スペース、タブ、CR、LF、BEL）で分割するだけの単純な字句規則で、
//! クォートやエスケープは扱わない。トークンは入力行からのゼロコピー借用 (`&str`)。
//!
//! ## 対応構文
//!
//! - 入力リダイレクト: `< file`
//! - 出力リダイレクト: `> file`（切り詰め・新規作成）
//! - バックグラウンド実行: 引数列の末尾の `&`
//! - コメント: 先頭トークンが `#` で始まる行
//!
//! `&` が末尾以外にあれば通常の引数として扱う。
//! バックグラウンド許可モードが無効のときは末尾の `&` を取り除くだけでフォアグラウンド実行になる。

use std::fmt;

// ── AST ─────────────────────────────────────────────────────────────

/// 単一コマンド。引数リスト、リダイレクト指定、バックグラウンドフラグを持つ。
///
/// 1 行ごとに新しい値が作られるため、リダイレクト指定が次のコマンドに持ち越されることはない。
#[derive(Debug, PartialEq, Eq)]
pub struct Command<'a> {
    /// `args[0]` がコマンド名。リダイレクトと `&` は含まない。常に 1 要素以上。
    pub args: Vec<&'a str>,
    /// `< file` で指定された入力ファイル。
    pub input: Option<&'a str>,
    /// `> file` で指定された出力ファイル。
    pub output: Option<&'a str>,
    /// 末尾 `&` があり、かつ解析時点でバックグラウンド実行が許可されていた場合に `true`。
    pub background: bool,
}

// ── Error ───────────────────────────────────────────────────────────

/// パース時に発生しうるエラー。
#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    /// リダイレクト演算子の後にターゲットファイル名がない。引数は演算子（`'<'` or `'>'`）。
    MissingRedirectTarget(char),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRedirectTarget(op) => {
                write!(f, "syntax error: missing file name after `{op}`")
            }
        }
    }
}

// ── Tokenizer ───────────────────────────────────────────────────────

/// トークン区切り文字。
const DELIMITERS: [char; 5] = [' ', '\t', '\r', '\n', '\x07'];

/// 入力行を区切り文字の連続で分割する。空トークンは生成しない。
fn tokens(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c: char| DELIMITERS.contains(&c))
        .filter(|t| !t.is_empty())
}

// ── Parser ──────────────────────────────────────────────────────────

/// 入力行をパースする。
///
/// 戻り値:
/// - `Ok(Some(cmd))`: 実行すべきコマンド
/// - `Ok(None)`: 空行・コメント行・`&` のみの行（何もしない）
/// - `Err(e)`: 構文エラー
///
/// `background_allowed` は呼び出し時点のバックグラウンド許可モード。
pub fn parse(line: &str, background_allowed: bool) -> Result<Option<Command<'_>>, ParseError> {
    let mut iter = tokens(line).peekable();

    match iter.peek() {
        None => return Ok(None),
        Some(first) if first.starts_with('#') => return Ok(None),
        Some(_) => {}
    }

    let mut args = Vec::new();
    let mut input = None;
    let mut output = None;

    while let Some(tok) = iter.next() {
        match tok {
            ">" => {
                output = Some(iter.next().ok_or(ParseError::MissingRedirectTarget('>'))?);
            }
            "<" => {
                input = Some(iter.next().ok_or(ParseError::MissingRedirectTarget('<'))?);
            }
            _ => args.push(tok),
        }
    }

    // 末尾の `&` はリダイレクトを除いた引数列の最後で判定する
    let mut background = false;
    if args.last() == Some(&"&") {
        args.pop();
        background = background_allowed;
    }

    if args.is_empty() {
        return Ok(None);
    }

    Ok(Some(Command {
        args,
        input,
        output,
        background,
    }))
}
