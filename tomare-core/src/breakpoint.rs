//! ブレークポイント管理

use crate::errors::{CommandResult, DebugError};
use crate::expr;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

/// ブレークポイントID
///
/// 1から単調に割り当てられ、セッション中に再利用されることはありません。
pub type BreakpointId = usize;

/// ブレークポイントの位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakpointPosition {
    /// ソースファイルの行
    Line(u32),
    /// メソッド名などのシンボル
    Symbol(String),
}

impl fmt::Display for BreakpointPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakpointPosition::Line(line) => write!(f, "{}", line),
            BreakpointPosition::Symbol(name) => f.write_str(name),
        }
    }
}

/// ブレークポイント
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    pub id: BreakpointId,
    pub source: String,
    pub pos: BreakpointPosition,
    pub enabled: bool,
    /// 条件式（`None`なら常に停止）
    pub expr: Option<String>,
    pub hit_count: u64,
}

/// ブレークポイントレジストリ
///
/// セッションが所有し、自らブレークポイントを作成・削除することはありません。
#[derive(Debug)]
pub struct BreakpointRegistry {
    breakpoints: BTreeMap<BreakpointId, Breakpoint>,
    next_id: BreakpointId,
}

impl BreakpointRegistry {
    /// 新しいレジストリを作成する
    pub fn new() -> Self {
        Self {
            breakpoints: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// ブレークポイントを登録する
    ///
    /// 条件式が与えられた場合は検証に通ったときのみ登録します。
    pub fn add(
        &mut self,
        source: impl Into<String>,
        pos: BreakpointPosition,
        condition: Option<&str>,
    ) -> CommandResult<BreakpointId> {
        if let Some(cond) = condition {
            if !expr::validate(cond) {
                return Err(DebugError::InvalidExpression(cond.to_string()));
            }
        }

        let id = self.next_id;
        self.next_id += 1;

        let bp = Breakpoint {
            id,
            source: source.into(),
            pos,
            enabled: true,
            expr: condition.map(str::to_string),
            hit_count: 0,
        };
        info!("breakpoint {} set at {}:{}", id, bp.source, bp.pos);

        self.breakpoints.insert(id, bp);
        Ok(id)
    }

    /// ブレークポイントを削除する
    pub fn remove(&mut self, id: BreakpointId) -> CommandResult<Breakpoint> {
        let bp = self
            .breakpoints
            .remove(&id)
            .ok_or(DebugError::BreakpointNotFound(id))?;
        info!("breakpoint {} deleted", id);
        Ok(bp)
    }

    /// ID順に並んだブレークポイント一覧
    pub fn list(&self) -> impl Iterator<Item = &Breakpoint> {
        self.breakpoints.values()
    }

    /// ブレークポイントをIDで検索する
    pub fn find_by_id(&self, id: BreakpointId) -> CommandResult<&Breakpoint> {
        self.breakpoints
            .get(&id)
            .ok_or(DebugError::BreakpointNotFound(id))
    }

    /// 現存するブレークポイントの最大ID（空なら0）
    pub fn largest_id(&self) -> BreakpointId {
        self.breakpoints.keys().next_back().copied().unwrap_or(0)
    }

    /// ブレークポイントが1つもないか
    pub fn is_empty(&self) -> bool {
        self.breakpoints.is_empty()
    }

    /// ブレークポイントの数を取得する
    pub fn count(&self) -> usize {
        self.breakpoints.len()
    }

    /// 条件式を設定またはクリアする
    ///
    /// 検証に失敗した場合、ブレークポイントは変更されません。
    pub fn set_condition(&mut self, id: BreakpointId, condition: Option<&str>) -> CommandResult<()> {
        let bp = self
            .breakpoints
            .get_mut(&id)
            .ok_or(DebugError::BreakpointNotFound(id))?;

        match condition {
            None => {
                bp.expr = None;
                debug!("breakpoint {} condition cleared", id);
            }
            Some(cond) if expr::validate(cond) => {
                bp.expr = Some(cond.to_string());
                debug!("breakpoint {} condition set to {:?}", id, cond);
            }
            Some(cond) => return Err(DebugError::InvalidExpression(cond.to_string())),
        }
        Ok(())
    }

    /// 有効・無効を切り替える
    pub fn set_enabled(&mut self, id: BreakpointId, enabled: bool) -> CommandResult<()> {
        let bp = self
            .breakpoints
            .get_mut(&id)
            .ok_or(DebugError::BreakpointNotFound(id))?;
        bp.enabled = enabled;
        debug!("breakpoint {} enabled={}", id, enabled);
        Ok(())
    }

    /// ヒット回数を1増やす
    ///
    /// 実行エンジンが、このブレークポイントに到達し条件が真になったときに1回ずつ呼び出します。
    pub fn record_hit(&mut self, id: BreakpointId) -> CommandResult<u64> {
        let bp = self
            .breakpoints
            .get_mut(&id)
            .ok_or(DebugError::BreakpointNotFound(id))?;
        bp.hit_count += 1;
        debug!("breakpoint {} hit ({} times)", id, bp.hit_count);
        Ok(bp.hit_count)
    }
}

impl Default for BreakpointRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// キャッチポイント（例外クラス名→ヒット回数）
#[derive(Debug, Default)]
pub struct Catchpoints {
    entries: BTreeMap<String, u64>,
}

impl Catchpoints {
    /// 新しいキャッチポイント表を作成する
    pub fn new() -> Self {
        Self::default()
    }

    /// キャッチポイントを登録する（登録済みなら何もしない）
    ///
    /// 新規に登録した場合はtrueを返します。
    pub fn add(&mut self, exception: impl Into<String>) -> bool {
        let exception = exception.into();
        if self.entries.contains_key(&exception) {
            return false;
        }
        info!("catchpoint set for {}", exception);
        self.entries.insert(exception, 0);
        true
    }

    /// キャッチポイントを削除する
    pub fn remove(&mut self, exception: &str) -> bool {
        self.entries.remove(exception).is_some()
    }

    /// ヒット回数を1増やす
    pub fn record_hit(&mut self, exception: &str) -> Option<u64> {
        let hits = self.entries.get_mut(exception)?;
        *hits += 1;
        Some(*hits)
    }

    /// 登録されたキャッチポイントとヒット回数
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(name, hits)| (name.as_str(), *hits))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
