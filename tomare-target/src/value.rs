//! ターゲットプログラムの値

use crate::Result;
use std::fmt;

/// 停止中のプログラムから取り出した値
///
/// `inspect` と `to_plain` は失敗しうる表現フックです。
/// ターゲット側のオブジェクトは独自の表現メソッドを持ち、それが例外を送出することがあります。
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Symbol(String),
    Array(Vec<Value>),
    /// インスタンス変数を持つオブジェクト
    Object {
        class: String,
        ivars: Vec<(String, Value)>,
    },
    /// 表現フックの結果だけがわかっているオブジェクト
    ///
    /// `None` のフックは呼び出すと失敗します。
    Opaque {
        class: String,
        inspect: Option<String>,
        plain: Option<String>,
    },
}

impl Value {
    /// 詳細な表現を取得する
    pub fn inspect(&self) -> Result<String> {
        match self {
            Value::Nil => Ok("nil".to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Int(i) => Ok(i.to_string()),
            Value::Float(f) => Ok(format_float(*f)),
            Value::Str(s) => Ok(format!("{:?}", s)),
            Value::Symbol(s) => Ok(format!(":{}", s)),
            Value::Array(items) => {
                let parts = items
                    .iter()
                    .map(Value::inspect)
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("[{}]", parts.join(", ")))
            }
            Value::Object { class, ivars } => {
                if ivars.is_empty() {
                    return Ok(format!("#<{}>", class));
                }
                let parts = ivars
                    .iter()
                    .map(|(name, value)| Ok(format!("{}={}", name, value.inspect()?)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("#<{} {}>", class, parts.join(", ")))
            }
            Value::Opaque { class, inspect, .. } => inspect
                .clone()
                .ok_or_else(|| anyhow::anyhow!("{}#inspect raised an exception", class)),
        }
    }

    /// 素の文字列表現を取得する
    pub fn to_plain(&self) -> Result<String> {
        match self {
            Value::Nil => Ok(String::new()),
            Value::Str(s) | Value::Symbol(s) => Ok(s.clone()),
            Value::Object { class, .. } => Ok(format!("#<{}>", class)),
            Value::Opaque { class, plain, .. } => plain
                .clone()
                .ok_or_else(|| anyhow::anyhow!("{}#to_s raised an exception", class)),
            other => other.inspect(),
        }
    }

    /// クラス名を取得する
    pub fn class_name(&self) -> &str {
        match self {
            Value::Nil => "NilClass",
            Value::Bool(true) => "TrueClass",
            Value::Bool(false) => "FalseClass",
            Value::Int(_) => "Integer",
            Value::Float(_) => "Float",
            Value::Str(_) => "String",
            Value::Symbol(_) => "Symbol",
            Value::Array(_) => "Array",
            Value::Object { class, .. } | Value::Opaque { class, .. } => class,
        }
    }

    /// インスタンス変数の一覧を取得する
    pub fn instance_variables(&self) -> &[(String, Value)] {
        match self {
            Value::Object { ivars, .. } => ivars,
            _ => &[],
        }
    }

    /// インスタンス変数を名前で取得する
    pub fn instance_variable(&self, name: &str) -> Option<&Value> {
        self.instance_variables()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.is_finite() {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inspect() {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "#<{}>", self.class_name()),
        }
    }
}
