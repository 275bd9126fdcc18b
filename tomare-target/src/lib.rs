//! Tomare ターゲットプログラムのインターフェース
//!
//! このクレートは、デバッグ対象プログラムの実行コンテキスト（停止位置・スタック・変数）と
//! 式評価器へのインターフェースを提供します。
//! 実際の停止・再開はこのクレートの外側で行われ、ここでは停止中の状態を問い合わせるだけです。

pub mod context;
pub mod frame;
pub mod snapshot;
pub mod value;

pub use context::{Evaluator, ExecutionContext, StopReason};
pub use frame::Frame;
pub use snapshot::Snapshot;
pub use value::Value;

/// ターゲット操作の結果型
pub type Result<T> = anyhow::Result<T>;
