//! 停止中プログラムのスナップショット
//!
//! 実行エンジンが停止時点の状態を書き出したものです。
//! `ExecutionContext` と単純な名前解決だけを行う `Evaluator` を実装します。

use crate::{Evaluator, ExecutionContext, Frame, Result, StopReason, Value};

/// 停止中プログラムのスナップショット
#[derive(Debug, Clone)]
pub struct Snapshot {
    frames: Vec<Frame>,
    globals: Vec<(String, Value)>,
    stop_reason: StopReason,
    dead: bool,
    last_failure: Option<Value>,
}

impl Snapshot {
    /// フレームを持たないスナップショットを作成する
    pub fn new() -> Self {
        Self {
            frames: Vec::new(),
            globals: Vec::new(),
            stop_reason: StopReason::Step,
            dead: false,
            last_failure: None,
        }
    }

    /// 外側のフレームを追加する（最初に追加したものがフレーム0）
    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frames.push(frame);
        self
    }

    /// グローバル変数を追加する
    pub fn with_global(mut self, name: impl Into<String>, value: Value) -> Self {
        self.globals.push((name.into(), value));
        self
    }

    /// 停止理由を設定する
    pub fn with_stop_reason(mut self, reason: StopReason) -> Self {
        self.stop_reason = reason;
        self
    }

    /// プロセスを終了状態にする
    ///
    /// 終了したプロセスにはフレームが残りません。
    pub fn crashed(mut self, failure: Option<Value>) -> Self {
        self.dead = true;
        self.frames.clear();
        self.last_failure = failure;
        self
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionContext for Snapshot {
    fn frame_selected(&self) -> bool {
        !self.dead && !self.frames.is_empty()
    }

    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    fn globals(&self) -> Vec<(String, Value)> {
        self.globals.clone()
    }

    fn is_dead(&self) -> bool {
        self.dead
    }

    fn last_failure(&self) -> Option<Value> {
        self.last_failure.clone()
    }

    fn stop_reason(&self) -> StopReason {
        self.stop_reason.clone()
    }
}

impl Evaluator for Snapshot {
    fn evaluate(&self, expression: &str, frame: usize) -> Result<Value> {
        let expression = expression.trim();
        let frame = self
            .frames
            .get(frame)
            .ok_or_else(|| anyhow::anyhow!("No frame {}", frame))?;

        if expression == "self" {
            return Ok(frame.self_value.clone());
        }

        let found = if expression.starts_with('$') {
            self.globals
                .iter()
                .find(|(name, _)| name == expression)
                .map(|(_, v)| v)
        } else if expression.starts_with('@') {
            frame.self_value.instance_variable(expression)
        } else {
            frame.local(expression)
        };

        found.cloned().ok_or_else(|| {
            anyhow::anyhow!("undefined local variable or method `{}'", expression)
        })
    }
}
