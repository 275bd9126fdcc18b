//! 実行コンテキストと式評価器のインターフェース

use crate::{Frame, Result, Value};
use std::fmt;

/// 直近の停止理由
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// step/next または起動直後
    Step,
    /// ブレークポイント
    Breakpoint,
    /// キャッチポイント
    Catchpoint,
    /// 上記以外（実行エンジンが報告した文字列をそのまま保持する）
    Other(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Step => f.write_str("step"),
            StopReason::Breakpoint => f.write_str("breakpoint"),
            StopReason::Catchpoint => f.write_str("catchpoint"),
            StopReason::Other(reason) => f.write_str(reason),
        }
    }
}

/// 停止中プログラムの実行コンテキスト
///
/// 実行エンジンが停止時に提供します。フレーム番号は0が最も内側です。
pub trait ExecutionContext {
    /// フレームが選択されているか（プログラムが停止中か）
    fn frame_selected(&self) -> bool;

    /// フレーム数
    fn frame_count(&self) -> usize;

    /// フレームを取得する
    fn frame(&self, index: usize) -> Option<&Frame>;

    /// ローカル変数（名前→値）
    fn frame_locals(&self, index: usize) -> Vec<(String, Value)> {
        self.frame(index).map(|f| f.locals.clone()).unwrap_or_default()
    }

    /// 引数名
    fn frame_args(&self, index: usize) -> Vec<String> {
        self.frame(index).map(|f| f.args.clone()).unwrap_or_default()
    }

    /// フレームの`self`
    fn frame_self(&self, index: usize) -> Option<Value> {
        self.frame(index).map(|f| f.self_value.clone())
    }

    /// グローバル変数
    fn globals(&self) -> Vec<(String, Value)>;

    /// プロセスが終了しているか（ポストモーテム状態）
    fn is_dead(&self) -> bool;

    /// 最後に捕捉された例外
    fn last_failure(&self) -> Option<Value>;

    /// 直近の停止理由
    fn stop_reason(&self) -> StopReason;
}

/// 式評価器
///
/// 任意の式を停止中プログラムのフレーム上で評価します。
pub trait Evaluator {
    fn evaluate(&self, expression: &str, frame: usize) -> Result<Value>;
}
