//! デバッグセッション
//!
//! ブレークポイント、キャッチポイント、セッション状態、設定、ファイルキャッシュを所有し、
//! コマンド行を解釈して各コンポーネントに振り分けます。

use crate::breakpoint::{BreakpointId, BreakpointPosition, BreakpointRegistry, Catchpoints};
use crate::command::{Command, CommandKind, CommandParser};
use crate::errors::{CommandResult, DebugError};
use crate::info::{self, Repr};
use crate::line_cache::{FileCache, LineCache};
use crate::parse::{parse_int, split_args};
use crate::session::{DisplayState, SessionState};
use crate::settings::{SettingValue, Settings};
use crate::{expr, Result};
use tomare_target::{Evaluator, ExecutionContext, Value};
use tracing::{debug, info};

/// デバッグセッション
pub struct Debugger {
    breakpoints: BreakpointRegistry,
    catchpoints: Catchpoints,
    state: SessionState,
    settings: Settings,
    context: Option<Box<dyn ExecutionContext>>,
    evaluator: Option<Box<dyn Evaluator>>,
    files: Box<dyn FileCache>,
    parser: CommandParser,
}

impl Debugger {
    /// 新しいセッションを作成する
    pub fn new(files: Box<dyn FileCache>) -> Result<Self> {
        Ok(Self {
            breakpoints: BreakpointRegistry::new(),
            catchpoints: Catchpoints::new(),
            state: SessionState::new(),
            settings: Settings::new(),
            context: None,
            evaluator: None,
            files,
            parser: CommandParser::new()?,
        })
    }

    /// ファイルシステム上のソースを読むセッションを作成する
    pub fn with_line_cache() -> Result<Self> {
        Self::new(Box::new(LineCache::new()))
    }

    /// プログラムの停止を通知する
    ///
    /// 以前のコンテキストは破棄され、停止位置は新しいコンテキストに同期されます。
    pub fn attach(&mut self, context: Box<dyn ExecutionContext>) {
        self.state.sync(context.as_ref());
        info!(
            "program paused ({}) at {:?}:{:?}",
            context.stop_reason(),
            self.state.file(),
            self.state.line()
        );
        self.context = Some(context);
    }

    /// 式評価器を設定する
    pub fn set_evaluator(&mut self, evaluator: Box<dyn Evaluator>) {
        self.evaluator = Some(evaluator);
    }

    /// プログラムの再開を通知する
    ///
    /// 停止位置をクリアします。次の`attach`まで停止中のフレームはありません。
    pub fn detach(&mut self) -> Option<Box<dyn ExecutionContext>> {
        info!("program resumed");
        self.state.reset();
        self.context.take()
    }

    /// フレームを選択する
    pub fn select_frame(&mut self, pos: usize) -> CommandResult<()> {
        let context = self.context.as_deref().ok_or(DebugError::NoFrameSelected)?;
        self.state.select_frame(context, pos)
    }

    /// ブレークポイントへの到達を記録する
    pub fn record_breakpoint_hit(&mut self, id: BreakpointId) -> CommandResult<u64> {
        self.breakpoints.record_hit(id)
    }

    /// キャッチポイントへの到達を記録する
    pub fn record_catchpoint_hit(&mut self, exception: &str) -> Option<u64> {
        self.catchpoints.record_hit(exception)
    }

    pub fn breakpoints(&self) -> &BreakpointRegistry {
        &self.breakpoints
    }

    pub fn catchpoints(&self) -> &Catchpoints {
        &self.catchpoints
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// 現在の実行コンテキスト
    pub fn context(&self) -> Option<&dyn ExecutionContext> {
        self.context.as_deref()
    }

    pub fn files(&self) -> &dyn FileCache {
        self.files.as_ref()
    }

    /// 停止中のコンテキストと選択中のフレーム番号
    pub(crate) fn paused(&self) -> Option<(&dyn ExecutionContext, usize)> {
        let context = self.context.as_deref()?;
        if !context.frame_selected() {
            return None;
        }
        Some((context, self.state.frame_pos()?))
    }

    /// 選択中のフレームで式を評価する
    pub(crate) fn evaluate(&self, expression: &str) -> Result<Value> {
        let evaluator = self
            .evaluator
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("no evaluator attached"))?;
        let pos = self.state.frame_pos().unwrap_or(0);
        evaluator.evaluate(expression, pos)
    }

    /// `autoreload`設定に従ってファイルをキャッシュする
    pub(crate) fn cache_file(&mut self, name: &str) -> Result<()> {
        let reload = self.settings.flag("autoreload");
        self.files.cache(name, reload)
    }

    /// ファイルを読み込む（起動時のプリロード用）
    pub fn preload(&mut self, name: &str) -> Result<()> {
        self.cache_file(name)
    }

    /// コマンド行をパースする
    pub fn parse(&self, line: &str) -> CommandResult<Command> {
        self.parser.parse(line).ok_or_else(|| {
            let name = split_args(line).first().copied().unwrap_or_default();
            DebugError::UnknownCommand(name.to_string())
        })
    }

    /// コマンド行を実行する
    pub fn execute(&mut self, line: &str) -> CommandResult {
        let command = self.parse(line)?;
        self.run(command)
    }

    /// パース済みのコマンドを実行する
    pub fn run(&mut self, command: Command) -> CommandResult {
        debug!("execute {:?}", command);
        match command {
            Command::Break {
                location,
                condition,
            } => self.cmd_break(location.as_deref(), condition.as_deref()),
            Command::Catch(exception) => self.cmd_catch(exception.as_deref()),
            Command::Condition { id, expr } => self.cmd_condition(id.as_deref(), expr.as_deref()),
            Command::Delete(id) => self.cmd_delete(id.as_deref()),
            Command::Disable(id) => self.cmd_set_enabled(CommandKind::Disable, id.as_deref(), false),
            Command::Display(expr) => self.cmd_display(expr.as_deref()),
            Command::Enable(id) => self.cmd_set_enabled(CommandKind::Enable, id.as_deref(), true),
            Command::Help(args) => self.cmd_help(args.as_deref()),
            Command::Info(args) => info::execute(self, args.as_deref()),
            Command::Quit => Ok(String::new()),
            Command::Set(args) => self.cmd_set(args.as_deref()),
            Command::Show(name) => self.cmd_show(name.as_deref()),
            Command::Undisplay(slot) => self.cmd_undisplay(slot.as_deref()),
        }
    }

    /// ブレークポイント番号の引数を`[1, largest_id]`の範囲でパースする
    fn breakpoint_arg(&self, kind: CommandKind, arg: &str) -> CommandResult<BreakpointId> {
        let largest = self.breakpoints.largest_id();
        if largest == 0 {
            return Err(DebugError::NoBreakpoints);
        }
        let id = parse_int(arg, &capitalize(kind.name()), 1, largest as i64)?;
        Ok(id as BreakpointId)
    }

    fn cmd_break(&mut self, location: Option<&str>, condition: Option<&str>) -> CommandResult {
        let Some(location) = location else {
            return Ok(CommandKind::Break.description().to_string());
        };

        let (source, pos) = parse_location(location)?;
        let id = self.breakpoints.add(source, pos, condition)?;
        let bp = self.breakpoints.find_by_id(id)?;
        Ok(format!("Created breakpoint {} at {}:{}\n", id, bp.source, bp.pos))
    }

    fn cmd_catch(&mut self, exception: Option<&str>) -> CommandResult {
        let Some(exception) = exception else {
            return Ok(info::catchpoint_report(self));
        };
        self.catchpoints.add(exception);
        Ok(format!("Catching exception {}.\n", exception))
    }

    fn cmd_condition(&mut self, id: Option<&str>, expr: Option<&str>) -> CommandResult {
        let Some(id) = id else {
            return Ok(CommandKind::Condition.description().to_string());
        };

        if self.context.as_deref().is_some_and(|c| c.is_dead()) {
            return Err(DebugError::PostMortem);
        }

        let id = self.breakpoint_arg(CommandKind::Condition, id)?;
        self.breakpoints.set_condition(id, expr)?;
        Ok(String::new())
    }

    fn cmd_delete(&mut self, id: Option<&str>) -> CommandResult {
        let Some(id) = id else {
            return Ok(CommandKind::Delete.description().to_string());
        };
        let id = self.breakpoint_arg(CommandKind::Delete, id)?;
        self.breakpoints.remove(id)?;
        Ok(String::new())
    }

    fn cmd_set_enabled(&mut self, kind: CommandKind, args: Option<&str>, enabled: bool) -> CommandResult {
        let Some(args) = args else {
            return Ok(kind.description().to_string());
        };

        // `enable display N` / `disable display N`
        if let [target, rest @ ..] = split_args(args).as_slice() {
            if target.eq_ignore_ascii_case("display") {
                let Some(slot) = rest.first() else {
                    return Ok(kind.description().to_string());
                };
                return self.set_display_enabled(kind, slot, enabled);
            }
        }

        let id = self.breakpoint_arg(kind, args)?;
        self.breakpoints.set_enabled(id, enabled)?;
        Ok(String::new())
    }

    fn set_display_enabled(&mut self, kind: CommandKind, slot: &str, enabled: bool) -> CommandResult {
        let count = self.state.displays().len();
        if count == 0 {
            return Err(DebugError::NoDisplays);
        }
        let slot = parse_int(slot, &capitalize(kind.name()), 1, count as i64)? as usize;
        let state = if enabled {
            DisplayState::Enabled
        } else {
            DisplayState::Disabled
        };
        self.state.set_display_state(slot, state)?;
        debug!("display {} is now {:?}", slot, state);
        Ok(String::new())
    }

    /// 有効な自動表示式を評価して表示する
    pub fn display_all(&self) -> String {
        if self.paused().is_none() {
            return String::new();
        }
        self.state
            .displays()
            .iter()
            .enumerate()
            .filter(|(_, d)| d.state == DisplayState::Enabled)
            .map(|(i, d)| self.display_line(i + 1, &d.expression))
            .collect()
    }

    fn display_line(&self, slot: usize, expression: &str) -> String {
        let repr = match self.evaluate(expression) {
            Ok(value) => Repr::of(&value),
            Err(e) => {
                debug!("display {} failed: {}", slot, e);
                Repr::Failed
            }
        };
        format!("{}: {} = {}\n", slot, expression, repr)
    }

    fn cmd_display(&mut self, expression: Option<&str>) -> CommandResult {
        let Some(expression) = expression else {
            return Ok(self.display_all());
        };

        if !expr::validate(expression) {
            return Err(DebugError::InvalidDisplayExpression(expression.to_string()));
        }
        let slot = self.state.add_display(expression);
        info!("display {} added: {}", slot, expression);

        if self.paused().is_some() {
            Ok(self.display_line(slot, expression))
        } else {
            Ok(String::new())
        }
    }

    fn cmd_undisplay(&mut self, slot: Option<&str>) -> CommandResult {
        let Some(slot) = slot else {
            return Ok(CommandKind::Undisplay.description().to_string());
        };

        let count = self.state.displays().len();
        if count == 0 {
            return Err(DebugError::NoDisplays);
        }
        let slot = parse_int(slot, "Undisplay", 1, count as i64)? as usize;
        self.state.set_display_state(slot, DisplayState::Empty)?;
        Ok(String::new())
    }

    fn cmd_help(&self, args: Option<&str>) -> CommandResult {
        let args = args.map(split_args).unwrap_or_default();
        let Some((name, rest)) = args.split_first() else {
            let mut out = String::from("Available commands:\n");
            for kind in CommandKind::ALL {
                out.push_str(&format!("  {:<10} -- {}\n", kind.name(), kind.summary()));
            }
            return Ok(out);
        };

        let kind = self
            .parser
            .lookup(name)
            .ok_or_else(|| DebugError::UnknownCommand(name.to_string()))?;
        match kind {
            CommandKind::Info => Ok(info::help(rest)),
            kind => Ok(kind.description().to_string()),
        }
    }

    fn cmd_set(&mut self, args: Option<&str>) -> CommandResult {
        let args = args.map(split_args).unwrap_or_default();
        let Some((name, rest)) = args.split_first() else {
            return Ok(CommandKind::Set.description().to_string());
        };
        let name = name.to_ascii_lowercase();
        let value = rest.first().copied();

        // `set noautoreload` は真偽値の設定をoffにする
        if self.settings.get(&name).is_err() {
            if let Some(base) = name.strip_prefix("no") {
                if let Ok(setting) = self.settings.get(base) {
                    if matches!(setting.value, SettingValue::Bool(_)) && value.is_none() {
                        let setting = self.settings.set(base, Some("off"))?;
                        return Ok(setting.print() + "\n");
                    }
                }
            }
        }

        let setting = self.settings.set(&name, value)?;
        Ok(setting.print() + "\n")
    }

    fn cmd_show(&self, name: Option<&str>) -> CommandResult {
        match name {
            Some(name) => {
                let setting = self.settings.get(&name.to_ascii_lowercase())?;
                Ok(setting.print() + "\n")
            }
            None => Ok(self
                .settings
                .iter()
                .map(|s| s.print() + "\n")
                .collect()),
        }
    }
}

/// コマンド名の先頭を大文字にする（引数エラーのメッセージ用）
fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// ブレークポイントの位置をパースする
///
/// `file:line` または `Class#method` / `Class.method` を受け付けます。
fn parse_location(location: &str) -> CommandResult<(String, BreakpointPosition)> {
    let invalid = || DebugError::InvalidLocation(location.to_string());

    if let Some((file, line)) = location.rsplit_once(':') {
        if let Ok(line) = line.parse::<u32>() {
            if file.is_empty() || line == 0 {
                return Err(invalid());
            }
            return Ok((file.to_string(), BreakpointPosition::Line(line)));
        }
    }

    let (class, method) = location.rsplit_once(['#', '.']).ok_or_else(invalid)?;
    let is_ident = |s: &str| {
        !s.is_empty()
            && s.chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '_' | '?' | '!' | '='))
    };
    if class.is_empty() || !is_ident(method) {
        return Err(invalid());
    }
    Ok((class.to_string(), BreakpointPosition::Symbol(method.to_string())))
}
