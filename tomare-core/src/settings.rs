//! デバッガの設定
//!
//! 設定はプロセスの生存期間中保持されます。各設定は型付きの値、固定のヘルプ文、
//! 表示用の関数を持ちます。

use crate::errors::{CommandResult, DebugError};
use crate::parse::parse_onoff;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// 設定値
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
}

impl SettingValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            SettingValue::Int(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            SettingValue::Int(i) => Some(*i),
            SettingValue::Bool(_) => None,
        }
    }
}

fn onoff(value: &SettingValue) -> &'static str {
    if value.as_bool().unwrap_or(false) {
        "on"
    } else {
        "off"
    }
}

/// `width` の最小値
const MIN_WIDTH: i64 = 10;

/// 設定
#[derive(Clone)]
pub struct Setting {
    pub name: &'static str,
    pub value: SettingValue,
    pub help: &'static str,
    /// 整数設定が受け付ける最小値
    min: i64,
    print: fn(&SettingValue) -> String,
}

impl fmt::Debug for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setting")
            .field("name", &self.name)
            .field("value", &self.value)
            .finish()
    }
}

impl Setting {
    /// `show`で表示する文字列
    pub fn print(&self) -> String {
        (self.print)(&self.value)
    }
}

/// 設定表
#[derive(Debug, Clone)]
pub struct Settings {
    entries: BTreeMap<&'static str, Setting>,
}

impl Settings {
    /// 既定値で設定表を作成する
    pub fn new() -> Self {
        let defaults = [
            Setting {
                name: "autoreload",
                value: SettingValue::Bool(true),
                help: "Reload source code when changed",
                min: 0,
                print: |v| format!("autoreload is {}", onoff(v)),
            },
            Setting {
                name: "forcestep",
                value: SettingValue::Bool(false),
                help: "If true, next/step commands always move to a new line",
                min: 0,
                print: |v| format!("forced-stepping is {}", onoff(v)),
            },
            Setting {
                name: "listsize",
                value: SettingValue::Int(10),
                help: "Set number of source lines to list by default",
                min: 1,
                print: |v| format!("Number of source lines to list is {}", v.as_int().unwrap_or(0)),
            },
            Setting {
                name: "width",
                value: SettingValue::Int(80),
                help: "Number of characters per line in the debugger's output",
                min: MIN_WIDTH,
                print: |v| format!("width is {}", v.as_int().unwrap_or(0)),
            },
        ];

        Self {
            entries: defaults.into_iter().map(|s| (s.name, s)).collect(),
        }
    }

    /// 設定を名前で取得する
    pub fn get(&self, name: &str) -> CommandResult<&Setting> {
        self.entries
            .get(name)
            .ok_or_else(|| DebugError::UnknownSetting(name.to_string()))
    }

    /// 全設定（名前順）
    pub fn iter(&self) -> impl Iterator<Item = &Setting> {
        self.entries.values()
    }

    /// 真偽値の設定を取得する（存在しなければfalse）
    pub fn flag(&self, name: &str) -> bool {
        self.entries
            .get(name)
            .and_then(|s| s.value.as_bool())
            .unwrap_or(false)
    }

    /// 出力幅
    pub fn width(&self) -> usize {
        self.entries
            .get("width")
            .and_then(|s| s.value.as_int())
            .map(|w| w as usize)
            .unwrap_or(80)
    }

    /// 文字列から設定値を変更する
    ///
    /// `raw`が`None`なら真偽値の設定をonにします。
    /// 不正な値の場合、設定は変更されません。
    pub fn set(&mut self, name: &str, raw: Option<&str>) -> CommandResult<&Setting> {
        let setting = self
            .entries
            .get_mut(name)
            .ok_or_else(|| DebugError::UnknownSetting(name.to_string()))?;

        let invalid = || DebugError::InvalidSettingValue {
            setting: name.to_string(),
            value: raw.unwrap_or("").to_string(),
        };

        let value = match (&setting.value, raw) {
            (SettingValue::Bool(_), None) => SettingValue::Bool(true),
            (SettingValue::Bool(_), Some(raw)) => {
                SettingValue::Bool(parse_onoff(raw).ok_or_else(invalid)?)
            }
            (SettingValue::Int(_), Some(raw)) => match raw.trim().parse::<i64>() {
                Ok(n) if n >= setting.min => SettingValue::Int(n),
                _ => return Err(invalid()),
            },
            (SettingValue::Int(_), None) => return Err(invalid()),
        };

        debug!("setting {} = {:?}", name, value);
        setting.value = value;
        Ok(setting)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::new();
        let forcestep = settings.get("forcestep").unwrap();
        assert_eq!(forcestep.value, SettingValue::Bool(false));
        assert_eq!(forcestep.help, "If true, next/step commands always move to a new line");
        assert_eq!(forcestep.print(), "forced-stepping is off");
        assert_eq!(settings.width(), 80);
        assert!(settings.flag("autoreload"));
    }

    #[test]
    fn test_set_bool() {
        let mut settings = Settings::new();
        settings.set("forcestep", Some("on")).unwrap();
        assert_eq!(settings.get("forcestep").unwrap().print(), "forced-stepping is on");
        settings.set("forcestep", Some("0")).unwrap();
        assert!(!settings.flag("forcestep"));
        settings.set("forcestep", None).unwrap();
        assert!(settings.flag("forcestep"));
    }

    #[test]
    fn test_set_invalid_keeps_value() {
        let mut settings = Settings::new();
        assert!(settings.set("width", Some("wide")).is_err());
        assert!(settings.set("width", Some("-3")).is_err());
        assert!(settings.set("autoreload", Some("maybe")).is_err());
        assert_eq!(settings.width(), 80);
        assert!(settings.flag("autoreload"));

        settings.set("width", Some("120")).unwrap();
        assert_eq!(settings.get("width").unwrap().print(), "width is 120");
    }

    #[test]
    fn test_width_below_minimum_is_rejected() {
        let mut settings = Settings::new();
        assert_eq!(
            settings.set("width", Some("5")).unwrap_err(),
            DebugError::InvalidSettingValue {
                setting: "width".into(),
                value: "5".into(),
            }
        );
        assert_eq!(settings.get("width").unwrap().print(), "width is 80");
        assert_eq!(settings.width(), 80);

        // 表示される値と実際に使われる幅は一致する
        settings.set("width", Some("10")).unwrap();
        assert_eq!(settings.get("width").unwrap().print(), "width is 10");
        assert_eq!(settings.width(), 10);

        assert!(settings.set("listsize", Some("0")).is_err());
        settings.set("listsize", Some("1")).unwrap();
    }

    #[test]
    fn test_unknown_setting() {
        let mut settings = Settings::new();
        assert_eq!(
            settings.set("colour", Some("on")).unwrap_err(),
            DebugError::UnknownSetting("colour".into())
        );
        assert!(settings.get("colour").is_err());
    }
}
