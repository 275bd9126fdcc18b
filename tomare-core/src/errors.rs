//! エラー定義
//!
//! コマンド実行中のエラーはすべてここで定義されます。
//! どのエラーもプロセスを終了させず、1行のメッセージとしてREPLに返されます。

use crate::BreakpointId;
use thiserror::Error;

/// デバッガコマンドのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DebugError {
    // ---- 入力エラー ----
    #[error("\"{command}\" argument \"{arg}\" needs to be a number.")]
    NotANumber { command: String, arg: String },

    #[error("\"{command}\" argument \"{arg}\" needs to be at least {min}.")]
    TooSmall { command: String, arg: String, min: i64 },

    #[error("\"{command}\" argument \"{arg}\" needs to be at most {max}.")]
    TooLarge { command: String, arg: String, max: i64 },

    #[error("Unknown {command} command {name}")]
    UnknownSubcommand { command: &'static str, name: String },

    #[error("Invalid parameter {0}")]
    InvalidAttribute(String),

    #[error("Incorrect expression \"{0}\", breakpoint not changed")]
    InvalidExpression(String),

    #[error("Incorrect expression \"{0}\", display not added")]
    InvalidDisplayExpression(String),

    #[error("No breakpoints found with number {0}")]
    BreakpointNotFound(BreakpointId),

    #[error("Invalid breakpoint location \"{0}\"")]
    InvalidLocation(String),

    #[error("Unknown command: {0}. Try \"help\".")]
    UnknownCommand(String),

    #[error("Unknown setting \"{0}\"")]
    UnknownSetting(String),

    #[error("Invalid value \"{value}\" for setting \"{setting}\"")]
    InvalidSettingValue { setting: String, value: String },

    // ---- 停止中のフレームが必要なコマンド ----
    #[error("{0} not available here.")]
    NotAvailable(&'static str),

    #[error("No frame selected.")]
    NoFrameSelected,

    #[error("Command unavailable in post-mortem mode.")]
    PostMortem,

    // ---- 空のコレクション ----
    #[error("No breakpoints have been set")]
    NoBreakpoints,

    #[error("No breakpoints found among list given.")]
    NoMatchingBreakpoints,

    #[error("Display expression {0} is not defined")]
    DisplayNotFound(usize),

    #[error("There are no auto-display expressions now.")]
    NoDisplays,
}

/// コマンドの結果型
pub type CommandResult<T = String> = std::result::Result<T, DebugError>;
