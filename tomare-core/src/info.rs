//! `info` コマンド
//!
//! ブレークポイント一覧、スタック、変数、ファイル情報などのレポートを組み立てます。
//! レポートはセッションの状態を変更しません（`info file`によるキャッシュの読み込みを除く）。

use crate::errors::{CommandResult, DebugError};
use crate::format::{columnize, format_subcmds, pad_with_dots, times};
use crate::parse::split_args;
use crate::subcommand::{find, Subcommand};
use crate::{Breakpoint, CommandKind, Debugger, DisplayState};
use std::fmt;
use tomare_target::{StopReason, Value};
use tracing::warn;

/// デバッガ内部の変数名の接頭辞（`info variables`では表示しない）
pub const INTERNAL_PREFIX: &str = "__dbg_";

/// 評価に失敗した値の表示
pub const EVALUATION_ERROR: &str = "*Error in evaluation*";

/// `info` サブコマンドのハンドラ
pub type InfoHandler = fn(&mut Debugger, &[&str]) -> CommandResult;

/// `info` のサブコマンド表
pub static INFO_SUBCOMMANDS: &[Subcommand<InfoHandler>] = &[
    Subcommand {
        name: "args",
        min: 1,
        short_help: "Argument variables of current stack frame",
        long_help: None,
        handler: info_args,
    },
    Subcommand {
        name: "breakpoints",
        min: 1,
        short_help: "Status of user-settable breakpoints",
        long_help: Some(
            "Without argument, list info about all breakpoints. With an integer \
             argument, list info on that breakpoint.",
        ),
        handler: info_breakpoints,
    },
    Subcommand {
        name: "catch",
        min: 3,
        short_help: "Exceptions that can be caught in the current stack frame",
        long_help: None,
        handler: info_catch,
    },
    Subcommand {
        name: "display",
        min: 2,
        short_help: "Expressions to display when program stops",
        long_help: None,
        handler: info_display,
    },
    Subcommand {
        name: "file",
        min: 4,
        short_help: "Info about a particular file read in",
        long_help: Some(
            "After the file name is supplied, you can list file attributes that \
             you wish to see. Attributes include: \"all\", \"basic\", \"breakpoints\", \
             \"lines\", \"mtime\", \"path\" and \"sha1\".",
        ),
        handler: info_file,
    },
    Subcommand {
        name: "files",
        min: 5,
        short_help: "File names and timestamps of files read in",
        long_help: None,
        handler: info_files,
    },
    Subcommand {
        name: "global_variables",
        min: 2,
        short_help: "Global variables",
        long_help: None,
        handler: info_global_variables,
    },
    Subcommand {
        name: "instance_variables",
        min: 2,
        short_help: "Instance variables of the current stack frame",
        long_help: None,
        handler: info_instance_variables,
    },
    Subcommand {
        name: "line",
        min: 2,
        short_help: "Line number and file name of current position in source file",
        long_help: None,
        handler: info_line,
    },
    Subcommand {
        name: "locals",
        min: 2,
        short_help: "Local variables of the current stack frame",
        long_help: None,
        handler: info_locals,
    },
    Subcommand {
        name: "program",
        min: 2,
        short_help: "Execution status of the program",
        long_help: None,
        handler: info_program,
    },
    Subcommand {
        name: "stack",
        min: 2,
        short_help: "Backtrace of the stack",
        long_help: None,
        handler: info_stack,
    },
    Subcommand {
        name: "variables",
        min: 1,
        short_help: "Local and instance variables of the current stack frame",
        long_help: None,
        handler: info_variables,
    },
];

/// `info file` で表示する属性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAttribute {
    All,
    Basic,
    Breakpoints,
    Lines,
    Mtime,
    Path,
    Sha1,
}

impl FileAttribute {
    /// この属性指定で`part`を表示するか
    fn includes(self, part: FileAttribute) -> bool {
        match self {
            FileAttribute::All => true,
            FileAttribute::Basic => matches!(part, FileAttribute::Path | FileAttribute::Lines),
            other => other == part,
        }
    }
}

/// `info file` の属性表
pub static FILE_SUBCOMMANDS: &[Subcommand<FileAttribute>] = &[
    Subcommand {
        name: "all",
        min: 1,
        short_help: "All file information available - breakpoints, lines, mtime, path and sha1",
        long_help: None,
        handler: FileAttribute::All,
    },
    Subcommand {
        name: "basic",
        min: 2,
        short_help: "basic information - path, number of lines",
        long_help: None,
        handler: FileAttribute::Basic,
    },
    Subcommand {
        name: "breakpoints",
        min: 2,
        short_help: "Show trace line numbers",
        long_help: Some("These are the line number where a breakpoint can be set."),
        handler: FileAttribute::Breakpoints,
    },
    Subcommand {
        name: "lines",
        min: 1,
        short_help: "Show number of lines in the file",
        long_help: None,
        handler: FileAttribute::Lines,
    },
    Subcommand {
        name: "mtime",
        min: 1,
        short_help: "Show modification time of file",
        long_help: None,
        handler: FileAttribute::Mtime,
    },
    Subcommand {
        name: "path",
        min: 4,
        short_help: "Show full file path name for file",
        long_help: None,
        handler: FileAttribute::Path,
    },
    Subcommand {
        name: "sha1",
        min: 1,
        short_help: "Show SHA1 hash of contents of the file",
        long_help: None,
        handler: FileAttribute::Sha1,
    },
];

/// 値の表現
///
/// 詳細表現、素の文字列表現の順に試し、どちらも失敗したら`Failed`になります。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Repr {
    Detailed(String),
    Plain(String),
    Failed,
}

impl Repr {
    pub fn of(value: &Value) -> Self {
        if let Ok(s) = value.inspect() {
            return Repr::Detailed(s);
        }
        match value.to_plain() {
            Ok(s) => Repr::Plain(s),
            Err(_) => Repr::Failed,
        }
    }
}

impl fmt::Display for Repr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Repr::Detailed(s) | Repr::Plain(s) => f.write_str(s),
            Repr::Failed => f.write_str(EVALUATION_ERROR),
        }
    }
}

/// 変数一覧の1行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarRow {
    pub name: String,
    pub repr: Repr,
}

impl VarRow {
    pub fn new(name: impl Into<String>, value: &Value) -> Self {
        Self {
            name: name.into(),
            repr: Repr::of(value),
        }
    }

    /// `name = value` の形で、出力幅に収まるよう整形する
    pub fn render(&self, width: usize) -> String {
        pad_with_dots(&format!("{} = {}", self.name, self.repr), width)
    }
}

/// 名前順に並べて整形する
fn render_rows(mut rows: Vec<VarRow>, width: usize) -> String {
    rows.sort_by(|a, b| a.name.cmp(&b.name));
    rows.iter().map(|row| row.render(width) + "\n").collect()
}

/// `info` コマンドを実行する
pub fn execute(debugger: &mut Debugger, args: Option<&str>) -> CommandResult {
    let Some(args) = args else {
        return Ok(help(&[]));
    };

    let args = split_args(args);
    let Some((param, rest)) = args.split_first() else {
        return Ok(help(&[]));
    };

    let subcmd = find(INFO_SUBCOMMANDS, param).ok_or_else(|| DebugError::UnknownSubcommand {
        command: "info",
        name: param.to_string(),
    })?;
    (subcmd.handler)(debugger, rest)
}

/// `help info ...` の説明文
pub fn help(args: &[&str]) -> String {
    let Some(first) = args.first() else {
        return format!(
            "{}{}",
            CommandKind::Info.description(),
            format_subcmds("info", INFO_SUBCOMMANDS)
        );
    };

    let Some(subcmd) = find(INFO_SUBCOMMANDS, first) else {
        return format!("Invalid \"info\" subcommand \"{}\".\n", first);
    };

    let mut out = format!("{}.", subcmd.short_help);
    match (subcmd.name, args.get(1)) {
        ("file", Some(attr)) => match find(FILE_SUBCOMMANDS, attr) {
            Some(attr) => out.push_str(&format!("\n{}.", attr.short_help)),
            None => out.push_str(&format!("\nInvalid \"file\" attribute \"{}\".", attr)),
        },
        _ => {
            if let Some(long) = subcmd.long_help {
                out.push('\n');
                out.push_str(long);
            }
        }
    }
    out.push('\n');
    out
}

/// ブレークポイント一覧
///
/// `ids`が空でなければ、そのIDのブレークポイントだけを表示します。
pub fn breakpoint_report<'a>(
    breakpoints: impl Iterator<Item = &'a Breakpoint>,
    ids: &[usize],
) -> CommandResult {
    let mut breakpoints = breakpoints.peekable();
    if breakpoints.peek().is_none() {
        return Ok("No breakpoints.\n".to_string());
    }

    let selected: Vec<&Breakpoint> = breakpoints
        .filter(|b| ids.is_empty() || ids.contains(&b.id))
        .collect();
    if selected.is_empty() {
        return Err(DebugError::NoMatchingBreakpoints);
    }

    let mut out = String::from("Num Enb What\n");
    for b in selected {
        let cond = b
            .expr
            .as_ref()
            .map(|e| format!(" if {}", e))
            .unwrap_or_default();
        out.push_str(&format!(
            "{:<3} {:<3} at {}:{}{}\n",
            b.id,
            if b.enabled { "y" } else { "n" },
            b.source,
            b.pos,
            cond
        ));
        if b.hit_count > 0 {
            out.push_str(&format!("\tbreakpoint already hit {}\n", times(b.hit_count)));
        }
    }
    Ok(out)
}

/// キャッチポイント一覧
pub fn catchpoint_report(debugger: &Debugger) -> String {
    let catchpoints = debugger.catchpoints();
    if catchpoints.is_empty() {
        return "No exceptions set to be caught.\n".to_string();
    }

    let mut out = String::new();
    for (exception, hits) in catchpoints.iter() {
        out.push_str(&format!("{}\n", exception));
        if hits > 0 {
            out.push_str(&format!("\tcatchpoint already hit {}\n", times(hits)));
        }
    }
    out
}

/// 停止理由の説明
pub fn stop_reason_message(reason: &StopReason) -> String {
    match reason {
        StopReason::Step => "It stopped after stepping, next'ing or initial start.\n".to_string(),
        StopReason::Breakpoint => "It stopped at a breakpoint.\n".to_string(),
        StopReason::Catchpoint => "It stopped at a catchpoint.\n".to_string(),
        StopReason::Other(reason) => format!("unknown reason: {}\n", reason),
    }
}

fn info_args(debugger: &mut Debugger, _args: &[&str]) -> CommandResult {
    let (context, pos) = debugger.paused().ok_or(DebugError::NoFrameSelected)?;
    let locals = context.frame_locals(pos);
    let width = debugger.settings().width();

    let mut out = String::new();
    for name in context.frame_args(pos) {
        let value = locals
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.clone())
            .unwrap_or(Value::Nil);
        out.push_str(&VarRow::new(name, &value).render(width));
        out.push('\n');
    }
    Ok(out)
}

fn info_breakpoints(debugger: &mut Debugger, args: &[&str]) -> CommandResult {
    // 数値でない引数はどのIDにも一致しない
    let ids: Vec<usize> = args.iter().map(|a| a.parse().unwrap_or(0)).collect();
    breakpoint_report(debugger.breakpoints().list(), &ids)
}

fn info_catch(debugger: &mut Debugger, _args: &[&str]) -> CommandResult {
    if debugger.paused().is_none() {
        return Err(DebugError::NoFrameSelected);
    }
    Ok(catchpoint_report(debugger))
}

fn info_display(debugger: &mut Debugger, _args: &[&str]) -> CommandResult {
    if debugger.paused().is_none() {
        return Err(DebugError::NotAvailable("info display"));
    }

    let displays = debugger.state().displays();
    if displays.iter().all(|d| d.state == DisplayState::Empty) {
        return Ok("There are no auto-display expressions now.\n".to_string());
    }

    let mut out = String::from("Auto-display expressions now in effect:\nNum Enb Expression\n");
    for (i, d) in displays.iter().enumerate() {
        let enabled = match d.state {
            DisplayState::Enabled => "y",
            DisplayState::Disabled => "n",
            DisplayState::Empty => continue,
        };
        out.push_str(&format!("{:>3}: {}  {}\n", i + 1, enabled, d.expression));
    }
    Ok(out)
}

fn info_file(debugger: &mut Debugger, args: &[&str]) -> CommandResult {
    let Some(file) = args.first().copied() else {
        return info_files(debugger, args);
    };

    let param = args.get(1).copied().unwrap_or("basic");
    let attr = find(FILE_SUBCOMMANDS, param)
        .ok_or_else(|| DebugError::InvalidAttribute(param.to_string()))?
        .handler;

    if !debugger.files().is_cached(file) {
        if !debugger.files().is_cacheable(file) {
            return Ok(format!("File {} is not cached\n", file));
        }
        if let Err(e) = debugger.cache_file(file) {
            warn!("failed to cache {}: {}", file, e);
            return Ok(format!("File {} is not cached\n", file));
        }
    }

    let files = debugger.files();
    let mut out = format!("File {}", file);
    if attr.includes(FileAttribute::Path) {
        if let Some(path) = files.path(file).filter(|p| p != file) {
            out.push_str(&format!(" - {}", path));
        }
    }
    out.push('\n');

    if attr.includes(FileAttribute::Lines) {
        if let Some(lines) = files.size(file) {
            out.push_str(&format!("\t {} lines\n", lines));
        }
    }
    if attr.includes(FileAttribute::Breakpoints) {
        if let Some(mut lines) = files.trace_line_numbers(file) {
            lines.sort_unstable();
            let items: Vec<String> = lines.iter().map(u32::to_string).collect();
            out.push_str("\tbreakpoint line numbers:\n");
            out.push_str(&columnize(&items, debugger.settings().width()));
        }
    }
    if attr.includes(FileAttribute::Mtime) {
        if let Some(mtime) = files.mtime(file) {
            out.push_str(&format!("\t{}\n", mtime));
        }
    }
    if attr.includes(FileAttribute::Sha1) {
        if let Some(sha1) = files.sha1(file) {
            out.push_str(&format!("\t{}\n", sha1));
        }
    }
    Ok(out)
}

fn info_files(debugger: &mut Debugger, _args: &[&str]) -> CommandResult {
    let files = debugger.files();
    let mut names = files.cached_files();
    names.sort();
    names.dedup();

    let mut out = String::new();
    for name in names {
        out.push_str(&format!("File {}", name));
        match files.path(&name).filter(|p| *p != name) {
            Some(path) => out.push_str(&format!(" - {}\n", path)),
            None => out.push('\n'),
        }
        if let Some(mtime) = files.mtime(&name) {
            out.push_str(&format!("\t{}\n", mtime));
        }
    }
    Ok(out)
}

fn info_global_variables(debugger: &mut Debugger, _args: &[&str]) -> CommandResult {
    let (context, _) = debugger
        .paused()
        .ok_or(DebugError::NotAvailable("info global_variables"))?;
    let rows = context
        .globals()
        .iter()
        .map(|(name, value)| VarRow::new(name.clone(), value))
        .collect();
    Ok(render_rows(rows, debugger.settings().width()))
}

/// `self`のインスタンス変数
///
/// `self`の評価に失敗した場合は、エラー表示の行を1つ返します。
fn instance_rows(debugger: &Debugger) -> Vec<VarRow> {
    match debugger.evaluate("self") {
        Ok(this) => this
            .instance_variables()
            .iter()
            .map(|(name, value)| VarRow::new(name.clone(), value))
            .collect(),
        Err(e) => {
            warn!("cannot evaluate self: {}", e);
            vec![VarRow {
                name: "self".to_string(),
                repr: Repr::Failed,
            }]
        }
    }
}

fn info_instance_variables(debugger: &mut Debugger, _args: &[&str]) -> CommandResult {
    if debugger.paused().is_none() {
        return Err(DebugError::NotAvailable("info instance_variables"));
    }
    Ok(render_rows(instance_rows(debugger), debugger.settings().width()))
}

fn info_line(debugger: &mut Debugger, _args: &[&str]) -> CommandResult {
    if debugger.paused().is_none() {
        return Err(DebugError::NotAvailable("info line"));
    }
    let state = debugger.state();
    match (state.line(), state.file()) {
        (Some(line), Some(file)) => Ok(format!("Line {} of \"{}\"\n", line, file)),
        _ => Err(DebugError::NotAvailable("info line")),
    }
}

fn info_locals(debugger: &mut Debugger, _args: &[&str]) -> CommandResult {
    let (context, pos) = debugger
        .paused()
        .ok_or(DebugError::NotAvailable("info locals"))?;
    let rows = context
        .frame_locals(pos)
        .iter()
        .map(|(name, value)| VarRow::new(name.clone(), value))
        .collect();
    Ok(render_rows(rows, debugger.settings().width()))
}

fn info_program(debugger: &mut Debugger, _args: &[&str]) -> CommandResult {
    let Some(context) = debugger.context() else {
        return Ok("The program being debugged is not being run.\n".to_string());
    };

    if context.is_dead() {
        let mut out = String::from("The program crashed.\n");
        if let Some(failure) = context.last_failure() {
            out.push_str(&format!("Exception: {}\n", Repr::of(&failure)));
        }
        return Ok(out);
    }

    let reason = debugger
        .state()
        .stop_reason()
        .cloned()
        .unwrap_or_else(|| context.stop_reason());
    Ok(format!("Program stopped. {}", stop_reason_message(&reason)))
}

fn info_stack(debugger: &mut Debugger, _args: &[&str]) -> CommandResult {
    let (context, pos) = debugger
        .paused()
        .ok_or(DebugError::NotAvailable("info stack"))?;

    let mut out = String::new();
    for i in 0..context.frame_count() {
        let Some(frame) = context.frame(i) else {
            continue;
        };
        let marker = if i == pos { "-->" } else { "   " };
        out.push_str(&format!(
            "{} #{:<2} {} at {}:{}\n",
            marker, i, frame.call, frame.file, frame.line
        ));
    }
    Ok(out)
}

fn info_variables(debugger: &mut Debugger, _args: &[&str]) -> CommandResult {
    let (context, pos) = debugger
        .paused()
        .ok_or(DebugError::NotAvailable("info variables"))?;
    let width = debugger.settings().width();

    let mut locals: Vec<VarRow> = context
        .frame_locals(pos)
        .iter()
        .filter(|(name, _)| !name.starts_with(INTERNAL_PREFIX))
        .map(|(name, value)| VarRow::new(name.clone(), value))
        .collect();
    if let Some(this) = context.frame_self(pos) {
        locals.push(VarRow::new("self", &this));
    }

    let mut out = render_rows(locals, width);
    out.push_str(&render_rows(instance_rows(debugger), width));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BreakpointRegistry;
    use crate::BreakpointPosition;

    #[test]
    fn test_repr_fallback() {
        assert_eq!(Repr::of(&Value::Int(3)), Repr::Detailed("3".into()));

        let plain_only = Value::Opaque {
            class: "Conn".into(),
            inspect: None,
            plain: Some("conn".into()),
        };
        assert_eq!(Repr::of(&plain_only), Repr::Plain("conn".into()));

        let broken = Value::Opaque {
            class: "Broken".into(),
            inspect: None,
            plain: None,
        };
        assert_eq!(Repr::of(&broken), Repr::Failed);
        assert_eq!(VarRow::new("b", &broken).render(80), "b = *Error in evaluation*");
    }

    #[test]
    fn test_percent_is_literal() {
        let row = VarRow::new("fmt", &Value::Str("%d%%s".into()));
        assert_eq!(row.render(80), "fmt = \"%d%%s\"");
    }

    #[test]
    fn test_render_rows_sorted() {
        let rows = vec![
            VarRow::new("zeta", &Value::Int(1)),
            VarRow::new("alpha", &Value::Int(2)),
        ];
        assert_eq!(render_rows(rows, 80), "alpha = 2\nzeta = 1\n");
    }

    #[test]
    fn test_breakpoint_report() {
        let mut registry = BreakpointRegistry::new();
        registry.add("a.rb", BreakpointPosition::Line(3), None).unwrap();
        registry.add("a.rb", BreakpointPosition::Line(9), Some("x > 5")).unwrap();
        registry.set_enabled(1, false).unwrap();
        registry.record_hit(2).unwrap();

        let out = breakpoint_report(registry.list(), &[]).unwrap();
        assert_eq!(
            out,
            "Num Enb What\n\
             1   n   at a.rb:3\n\
             2   y   at a.rb:9 if x > 5\n\
             \tbreakpoint already hit 1 time\n"
        );

        registry.record_hit(2).unwrap();
        let out = breakpoint_report(registry.list(), &[2]).unwrap();
        assert!(out.ends_with("\tbreakpoint already hit 2 times\n"));
        assert!(!out.contains("a.rb:3"));
    }

    #[test]
    fn test_breakpoint_report_empty_vs_filtered() {
        let mut registry = BreakpointRegistry::new();
        assert_eq!(breakpoint_report(registry.list(), &[]).unwrap(), "No breakpoints.\n");
        assert_eq!(breakpoint_report(registry.list(), &[4]).unwrap(), "No breakpoints.\n");

        registry.add("a.rb", BreakpointPosition::Line(3), None).unwrap();
        assert_eq!(
            breakpoint_report(registry.list(), &[4]).unwrap_err(),
            DebugError::NoMatchingBreakpoints
        );
    }

    #[test]
    fn test_stop_reason_message() {
        assert_eq!(
            stop_reason_message(&StopReason::Step),
            "It stopped after stepping, next'ing or initial start.\n"
        );
        assert_eq!(
            stop_reason_message(&StopReason::Other("signal".into())),
            "unknown reason: signal\n"
        );
    }

    #[test]
    fn test_help() {
        assert!(help(&[]).contains("List of \"info\" subcommands:"));
        assert!(help(&[]).contains("info global_variables   -- Global variables\n"));
        assert_eq!(
            help(&["b"]),
            "Status of user-settable breakpoints.\n\
             Without argument, list info about all breakpoints. With an integer argument, \
             list info on that breakpoint.\n"
        );
        assert_eq!(
            help(&["file", "sha"]),
            "Info about a particular file read in.\nShow SHA1 hash of contents of the file.\n"
        );
        assert_eq!(
            help(&["file", "zzz"]),
            "Info about a particular file read in.\nInvalid \"file\" attribute \"zzz\".\n"
        );
        assert_eq!(help(&["zzz"]), "Invalid \"info\" subcommand \"zzz\".\n");
    }

    #[test]
    fn test_file_attribute_includes() {
        assert!(FileAttribute::Basic.includes(FileAttribute::Path));
        assert!(FileAttribute::Basic.includes(FileAttribute::Lines));
        assert!(!FileAttribute::Basic.includes(FileAttribute::Sha1));
        assert!(FileAttribute::All.includes(FileAttribute::Mtime));
        assert!(FileAttribute::Sha1.includes(FileAttribute::Sha1));
        assert!(!FileAttribute::Lines.includes(FileAttribute::Path));
    }
}
