//! スタックフレーム

use crate::Value;

/// 停止中プログラムのスタックフレーム
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// 呼び出し名（例: `Calculator#add`）
    pub call: String,
    pub file: String,
    pub line: u32,
    /// ローカル変数（引数を含む）
    pub locals: Vec<(String, Value)>,
    /// 引数名（宣言順）
    pub args: Vec<String>,
    /// フレームの`self`
    pub self_value: Value,
}

impl Frame {
    /// フレームを作成する
    pub fn new(call: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            call: call.into(),
            file: file.into(),
            line,
            locals: Vec::new(),
            args: Vec::new(),
            self_value: Value::Object {
                class: "Object".to_string(),
                ivars: Vec::new(),
            },
        }
    }

    /// ローカル変数を追加する
    pub fn with_local(mut self, name: impl Into<String>, value: Value) -> Self {
        self.locals.push((name.into(), value));
        self
    }

    /// 引数を追加する（ローカル変数としても登録される）
    pub fn with_arg(mut self, name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        self.args.push(name.clone());
        self.locals.push((name, value));
        self
    }

    /// `self`を設定する
    pub fn with_self(mut self, value: Value) -> Self {
        self.self_value = value;
        self
    }

    /// ローカル変数を名前で取得する
    pub fn local(&self, name: &str) -> Option<&Value> {
        self.locals.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}
