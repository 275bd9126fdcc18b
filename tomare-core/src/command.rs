//! デバッガコマンド
//!
//! 入力行を各コマンドの固定の文法（正規表現）と照合し、構造化された引数を取り出します。
//! 照合は大文字小文字を区別せず、前後の空白は無視します。

use crate::Result;
use regex::{Captures, Regex};

/// コマンドの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Break,
    Catch,
    Condition,
    Delete,
    Disable,
    Display,
    Enable,
    Help,
    Info,
    Quit,
    Set,
    Show,
    Undisplay,
}

impl CommandKind {
    /// 照合順に並んだ全コマンド
    pub const ALL: [CommandKind; 13] = [
        CommandKind::Break,
        CommandKind::Catch,
        CommandKind::Condition,
        CommandKind::Delete,
        CommandKind::Disable,
        CommandKind::Display,
        CommandKind::Enable,
        CommandKind::Help,
        CommandKind::Info,
        CommandKind::Quit,
        CommandKind::Set,
        CommandKind::Show,
        CommandKind::Undisplay,
    ];

    /// 入力行の文法
    fn pattern(self) -> &'static str {
        match self {
            CommandKind::Break => r"(?i)^\s*b(?:reak)?(?:\s+(.*?))?\s*$",
            CommandKind::Catch => r"(?i)^\s*cat(?:ch)?(?:\s+(.*?))?\s*$",
            CommandKind::Condition => r"(?i)^\s*cond(?:ition)?(?:\s+(\S+)(?:\s+(.*?))?)?\s*$",
            CommandKind::Delete => r"(?i)^\s*del(?:ete)?(?:\s+(.*?))?\s*$",
            CommandKind::Disable => r"(?i)^\s*disa(?:ble)?(?:\s+(.*?))?\s*$",
            CommandKind::Display => r"(?i)^\s*disp(?:lay)?(?:\s+(.*?))?\s*$",
            CommandKind::Enable => r"(?i)^\s*en(?:able)?(?:\s+(.*?))?\s*$",
            CommandKind::Help => r"(?i)^\s*h(?:elp)?(?:\s+(.*?))?\s*$",
            CommandKind::Info => r"(?i)^\s*i(?:nfo)?(?:\s+(.*?))?\s*$",
            CommandKind::Quit => r"(?i)^\s*(?:q(?:uit)?|exit)\s*$",
            CommandKind::Set => r"(?i)^\s*set(?:\s+(.*?))?\s*$",
            CommandKind::Show => r"(?i)^\s*show(?:\s+(.*?))?\s*$",
            CommandKind::Undisplay => r"(?i)^\s*undisp(?:lay)?(?:\s+(.*?))?\s*$",
        }
    }

    /// コマンド名
    pub fn name(self) -> &'static str {
        match self {
            CommandKind::Break => "break",
            CommandKind::Catch => "catch",
            CommandKind::Condition => "condition",
            CommandKind::Delete => "delete",
            CommandKind::Disable => "disable",
            CommandKind::Display => "display",
            CommandKind::Enable => "enable",
            CommandKind::Help => "help",
            CommandKind::Info => "info",
            CommandKind::Quit => "quit",
            CommandKind::Set => "set",
            CommandKind::Show => "show",
            CommandKind::Undisplay => "undisplay",
        }
    }

    /// 一行説明
    pub fn summary(self) -> &'static str {
        match self {
            CommandKind::Break => "Set a breakpoint at a file line or method",
            CommandKind::Catch => "Stop when an exception of the given class is raised",
            CommandKind::Condition => "Set or remove the condition of a breakpoint",
            CommandKind::Delete => "Delete a breakpoint",
            CommandKind::Disable => "Disable a breakpoint",
            CommandKind::Display => "Evaluate an expression every time the program stops",
            CommandKind::Enable => "Enable a breakpoint",
            CommandKind::Help => "Show help for a command",
            CommandKind::Info => "Show things about the program being debugged",
            CommandKind::Quit => "Exit the debugger",
            CommandKind::Set => "Modify a debugger setting",
            CommandKind::Show => "Show debugger settings",
            CommandKind::Undisplay => "Remove an auto-display expression",
        }
    }

    /// `help <command>`で表示する説明
    pub fn description(self) -> &'static str {
        match self {
            CommandKind::Break => {
                "b[reak] file:line [if expr]\n\
                 b[reak] method [if expr]\n\n\
                 Set a breakpoint at a source line or at a method. With \"if expr\" the\n\
                 breakpoint only stops the program when expr is true.\n"
            }
            CommandKind::Catch => {
                "cat[ch] [exception]\n\n\
                 Stop the program when an exception of the given class is raised.\n\
                 Without an argument, list the exceptions being caught.\n"
            }
            CommandKind::Condition => {
                "cond[ition] nnn[ expr]\n\n\
                 Specify breakpoint number nnn to break only if expr is true. nnn is an\n\
                 integer and expr is an expression to be evaluated whenever breakpoint\n\
                 nnn is reached. If no expression is specified, the condition is\n\
                 removed.\n"
            }
            CommandKind::Delete => "del[ete] nnn\n\nDelete breakpoint number nnn.\n",
            CommandKind::Disable => {
                "disa[ble] nnn\n\
                 disa[ble] display nnn\n\n\
                 Disable breakpoint number nnn, or auto-display expression nnn.\n"
            }
            CommandKind::Display => {
                "disp[lay] expr\n\n\
                 Add expr to the list of expressions shown every time the program stops.\n"
            }
            CommandKind::Enable => {
                "en[able] nnn\n\
                 en[able] display nnn\n\n\
                 Enable breakpoint number nnn, or auto-display expression nnn.\n"
            }
            CommandKind::Help => {
                "h[elp] [command [subcommand]]\n\n\
                 Without an argument, list the available commands.\n"
            }
            CommandKind::Info => {
                "info[ subcommand]\n\n\
                 Generic command for showing things about the program being debugged.\n"
            }
            CommandKind::Quit => "q[uit]\n\nExit the debugger.\n",
            CommandKind::Set => {
                "set setting [value]\n\n\
                 Modify a debugger setting. Boolean settings accept on/off, and\n\
                 \"set nosetting\" turns one off.\n"
            }
            CommandKind::Show => "show [setting]\n\nShow one or all debugger settings.\n",
            CommandKind::Undisplay => {
                "undisp[lay] nnn\n\n\
                 Remove auto-display expression number nnn. Other expressions keep their numbers.\n"
            }
        }
    }
}

/// パース済みのコマンド
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 位置と任意の条件式
    Break {
        location: Option<String>,
        condition: Option<String>,
    },
    Catch(Option<String>),
    /// ブレークポイント番号（未検証の文字列）と任意の条件式
    Condition {
        id: Option<String>,
        expr: Option<String>,
    },
    Delete(Option<String>),
    Disable(Option<String>),
    Display(Option<String>),
    Enable(Option<String>),
    Help(Option<String>),
    Info(Option<String>),
    Quit,
    Set(Option<String>),
    Show(Option<String>),
    Undisplay(Option<String>),
}

/// コマンドパーサ
pub struct CommandParser {
    patterns: Vec<(CommandKind, Regex)>,
    /// `break`の引数: `location [if expr]`
    break_args: Regex,
}

impl CommandParser {
    /// 全コマンドの文法をコンパイルする
    pub fn new() -> Result<Self> {
        let patterns = CommandKind::ALL
            .into_iter()
            .map(|kind| -> Result<(CommandKind, Regex)> { Ok((kind, Regex::new(kind.pattern())?)) })
            .collect::<Result<Vec<_>>>()?;

        let break_args = Regex::new(r"(?i)^(\S+)(?:\s+if\s+(.*))?$")?;

        Ok(Self {
            patterns,
            break_args,
        })
    }

    /// コマンド名（省略形を含む）からコマンドの種類を探す
    pub fn lookup(&self, name: &str) -> Option<CommandKind> {
        let name = name.trim();
        if name.is_empty() || name.contains(char::is_whitespace) {
            return None;
        }
        self.patterns
            .iter()
            .find(|(_, re)| re.is_match(name))
            .map(|(kind, _)| *kind)
    }

    /// コマンド文字列をパースする
    ///
    /// どの文法にも一致しなければ`None`を返します。
    pub fn parse(&self, input: &str) -> Option<Command> {
        self.patterns.iter().find_map(|(kind, re)| {
            let caps = re.captures(input)?;
            Some(self.build(*kind, &caps))
        })
    }

    fn build(&self, kind: CommandKind, caps: &Captures<'_>) -> Command {
        let arg = |i: usize| {
            caps.get(i)
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty())
        };

        match kind {
            CommandKind::Break => {
                let (location, condition) = match arg(1) {
                    Some(rest) => {
                        let parsed = self.break_args.captures(&rest).map(|c| {
                            (
                                c.get(1).map(|m| m.as_str().to_string()),
                                c.get(2).map(|m| m.as_str().trim().to_string()),
                            )
                        });
                        parsed.unwrap_or((Some(rest), None))
                    }
                    None => (None, None),
                };
                Command::Break {
                    location,
                    condition,
                }
            }
            CommandKind::Catch => Command::Catch(arg(1)),
            CommandKind::Condition => Command::Condition {
                id: arg(1),
                expr: arg(2),
            },
            CommandKind::Delete => Command::Delete(arg(1)),
            CommandKind::Disable => Command::Disable(arg(1)),
            CommandKind::Display => Command::Display(arg(1)),
            CommandKind::Enable => Command::Enable(arg(1)),
            CommandKind::Help => Command::Help(arg(1)),
            CommandKind::Info => Command::Info(arg(1)),
            CommandKind::Quit => Command::Quit,
            CommandKind::Set => Command::Set(arg(1)),
            CommandKind::Show => Command::Show(arg(1)),
            CommandKind::Undisplay => Command::Undisplay(arg(1)),
        }
    }
}
