//! smallsh ライブラリ: ベンチマーク・テスト用にモジュールを公開する。
//!
//! バイナリ本体は `main.rs` の REPL ループ。
//! この `lib.rs` は `benches/bench_main.rs` や `tests/` から
//! パーサー・ビルトイン・spawn 機能に直接アクセスするために存在する。
//!
//! ## モジュール構成
//!
//! | モジュール | 役割 |
//! |-----------|------|
//! | [`expand`] | `$$` をシェルの PID に置換 |
//! | [`parser`] | 空白区切りのトークナイズ、`<` / `>` リダイレクト、末尾 `&`、コメント行 |
//! | [`builtins`] | ビルトイン（`cd`, `exit`, `status`） |
//! | [`executor`] | ビルトイン判定、外部コマンドの起動とフォアグラウンド待機 |
//! | [`spawn`] | `fork` + `execvp` ラッパー（子プロセスのシグナル設定とリダイレクト） |
//! | [`job`] | 終了ステータス、フォアグラウンド待機、バックグラウンドレジストリと reap |
//! | [`signal`] | SIGTSTP によるフォアグラウンド専用モード切替、シグナル設定 |
//! | [`shell`] | シェルの状態（終了ステータス、バックグラウンドレジストリ） |
//! | [`input`] | プロンプト表示と EINTR を区別する行読み取り |
//! | [`config`] | 環境変数からの起動時設定 |
//! | [`logger`] | `log` クレート用の stderr ロガー |

pub mod builtins;
pub mod config;
pub mod executor;
pub mod expand;
pub mod input;
pub mod job;
pub mod logger;
pub mod parser;
pub mod shell;
pub mod signal;
pub mod spawn;
