//! サブコマンド表
//!
//! `info X` のような複数語コマンドのサブコマンドを、最小一意接頭辞長で解決します。
//! 各エントリはハンドラを直接保持するため、名前から関数への実行時解決は行いません。

/// サブコマンド表のエントリ
#[derive(Debug)]
pub struct Subcommand<H: 'static> {
    pub name: &'static str,
    /// 曖昧さなく一致させるのに必要な最小接頭辞長
    pub min: usize,
    pub short_help: &'static str,
    pub long_help: Option<&'static str>,
    pub handler: H,
}

/// 入力トークンに一致するサブコマンドを検索する
///
/// トークンが名前の接頭辞で、長さが最小接頭辞長以上のエントリのうち最初のものを返します。
/// 大文字小文字は区別しません。
pub fn find<'a, H>(table: &'a [Subcommand<H>], token: &str) -> Option<&'a Subcommand<H>> {
    let token = token.to_ascii_lowercase();
    table
        .iter()
        .find(|sub| token.len() >= sub.min && sub.name.starts_with(token.as_str()))
}
