//! `$$` 展開: 入力行中の `$$` をシェル自身の PID に置換する。
//!
//! トークナイズより前に行全体へ適用する。左から走査し、置換直後の位置から再開するため
//! `$$$` は `<pid>$`、`$$$$` は `<pid><pid>` になる。

use std::borrow::Cow;

/// PID に置換されるマーカー。
pub const PID_MARKER: &str = "$$";

/// 行中のすべての `$$` を `pid` の 10 進表記に置換する。
///
/// `$$` を含まない行はゼロコピーの [`Cow::Borrowed`] を返す。
pub fn expand_pid(line: &str, pid: u32) -> Cow<'_, str> {
    if !line.contains(PID_MARKER) {
        return Cow::Borrowed(line);
    }
    Cow::Owned(line.replace(PID_MARKER, &pid.to_string()))
}
