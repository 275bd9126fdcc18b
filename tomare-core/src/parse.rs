//! 引数パース関連のユーティリティ関数

use crate::errors::{CommandResult, DebugError};

/// 整数引数をパースし、閉区間 `[min, max]` に収まるか検証する
///
/// 範囲外の値は丸めずにエラーにします。
///
/// # Examples
/// ```
/// use tomare_core::parse::parse_int;
///
/// assert_eq!(parse_int("2", "Condition", 1, 3).unwrap(), 2);
/// assert!(parse_int("4", "Condition", 1, 3).is_err());
/// assert!(parse_int("x", "Condition", 1, 3).is_err());
/// ```
pub fn parse_int(token: &str, command: &str, min: i64, max: i64) -> CommandResult<i64> {
    let token = token.trim();

    let value = token.parse::<i64>().map_err(|_| DebugError::NotANumber {
        command: command.to_string(),
        arg: token.to_string(),
    })?;

    if value < min {
        return Err(DebugError::TooSmall {
            command: command.to_string(),
            arg: token.to_string(),
            min,
        });
    }
    if value > max {
        return Err(DebugError::TooLarge {
            command: command.to_string(),
            arg: token.to_string(),
            max,
        });
    }

    Ok(value)
}

/// 真偽値の設定値をパースする
pub fn parse_onoff(token: &str) -> Option<bool> {
    match token.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Some(true),
        "off" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// 入力行を空白（スペースとタブ）で分割する
pub fn split_args(input: &str) -> Vec<&str> {
    input
        .split([' ', '\t'])
        .filter(|s| !s.is_empty())
        .collect()
}
