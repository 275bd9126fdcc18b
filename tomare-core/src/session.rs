//! セッション状態
//!
//! 「いまどこで止まっているか」のスナップショットです。
//! 位置の変化はすべて実行コンテキストから来るため、ここでは同期と問い合わせだけを行います。

use crate::errors::{CommandResult, DebugError};
use tomare_target::{ExecutionContext, StopReason};
use tracing::debug;

/// 自動表示スロットの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    Enabled,
    Disabled,
    /// 削除済み（スロット番号は詰めない）
    Empty,
}

/// 自動表示式
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Display {
    pub state: DisplayState,
    pub expression: String,
}

/// セッション状態
#[derive(Debug)]
pub struct SessionState {
    frame_pos: Option<usize>,
    file: Option<String>,
    line: Option<u32>,
    stop_reason: Option<StopReason>,
    displays: Vec<Display>,
}

impl SessionState {
    /// 停止していない状態のセッションを作成する
    pub fn new() -> Self {
        Self {
            frame_pos: None,
            file: None,
            line: None,
            stop_reason: None,
            displays: Vec::new(),
        }
    }

    /// 実行コンテキストが報告する停止位置に同期する
    ///
    /// 選択中のフレームが無効になった場合（プロセス終了など）はクリアします。
    pub fn sync(&mut self, context: &dyn ExecutionContext) {
        self.stop_reason = Some(context.stop_reason());

        if !context.frame_selected() {
            self.clear_position();
            return;
        }

        let pos = match self.frame_pos {
            Some(pos) if pos < context.frame_count() => pos,
            _ => 0,
        };
        self.select(context, pos);
    }

    /// フレームを選択する
    ///
    /// 範囲外のフレーム番号は選択状態を変えずにエラーにします。
    pub fn select_frame(&mut self, context: &dyn ExecutionContext, pos: usize) -> CommandResult<()> {
        if !context.frame_selected() {
            return Err(DebugError::NoFrameSelected);
        }
        let count = context.frame_count();
        if pos >= count {
            return Err(DebugError::TooLarge {
                command: "frame".to_string(),
                arg: pos.to_string(),
                max: count as i64 - 1,
            });
        }
        self.select(context, pos);
        Ok(())
    }

    fn select(&mut self, context: &dyn ExecutionContext, pos: usize) {
        self.frame_pos = Some(pos);
        match context.frame(pos) {
            Some(frame) => {
                self.file = Some(frame.file.clone());
                self.line = Some(frame.line);
            }
            None => {
                self.file = None;
                self.line = None;
            }
        }
        debug!("frame {} selected ({:?}:{:?})", pos, self.file, self.line);
    }

    /// プログラムが実行中・終了した場合に停止位置をクリアする
    pub fn clear_position(&mut self) {
        self.frame_pos = None;
        self.file = None;
        self.line = None;
    }

    /// 停止位置と停止理由をすべてクリアする
    pub fn reset(&mut self) {
        self.clear_position();
        self.stop_reason = None;
    }

    /// 選択中のフレーム番号
    pub fn frame_pos(&self) -> Option<usize> {
        self.frame_pos
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn line(&self) -> Option<u32> {
        self.line
    }

    pub fn stop_reason(&self) -> Option<&StopReason> {
        self.stop_reason.as_ref()
    }

    /// 自動表示スロット一覧（番号は1始まり）
    pub fn displays(&self) -> &[Display] {
        &self.displays
    }

    /// 自動表示式を追加し、スロット番号を返す
    pub fn add_display(&mut self, expression: impl Into<String>) -> usize {
        self.displays.push(Display {
            state: DisplayState::Enabled,
            expression: expression.into(),
        });
        self.displays.len()
    }

    /// 自動表示スロットの状態を変更する
    pub fn set_display_state(&mut self, slot: usize, state: DisplayState) -> CommandResult<()> {
        let display = slot
            .checked_sub(1)
            .and_then(|i| self.displays.get_mut(i))
            .filter(|d| d.state != DisplayState::Empty)
            .ok_or(DebugError::DisplayNotFound(slot))?;
        display.state = state;
        Ok(())
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
