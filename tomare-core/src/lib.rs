//! tomare デバッガのコア機能
//!
//! ブレークポイントとキャッチポイントの管理、条件式の検証、セッション状態と設定、
//! コマンドの解釈、停止中プログラムの情報表示（`info`）を提供します。
//! 実行エンジンとのやり取りは`tomare_target`のトレイトを通して行います。

pub mod breakpoint;
pub mod command;
pub mod debugger;
pub mod errors;
pub mod expr;
pub mod format;
pub mod info;
pub mod line_cache;
pub mod parse;
pub mod session;
pub mod settings;
pub mod subcommand;

pub use breakpoint::{Breakpoint, BreakpointId, BreakpointPosition, BreakpointRegistry, Catchpoints};
pub use command::{Command, CommandKind, CommandParser};
pub use debugger::Debugger;
pub use errors::{CommandResult, DebugError};
pub use line_cache::{FileCache, LineCache};
pub use session::{Display, DisplayState, SessionState};
pub use settings::{Setting, SettingValue, Settings};

// 他のクレートから使用するために再エクスポート
pub use tomare_target::{Evaluator, ExecutionContext, Frame, Snapshot, StopReason, Value};

/// デバッガの結果型
pub type Result<T> = anyhow::Result<T>;
