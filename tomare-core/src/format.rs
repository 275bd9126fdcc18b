//! 出力整形ユーティリティ

use crate::subcommand::Subcommand;

/// 回数の表示（`1 time` / `2 times`）
pub fn times(count: u64) -> String {
    if count == 1 {
        "1 time".to_string()
    } else {
        format!("{} times", count)
    }
}

/// 幅を超える行を `...` で切り詰める
pub fn pad_with_dots(line: &str, width: usize) -> String {
    if line.chars().count() <= width || width < 3 {
        return line.to_string();
    }
    let mut out: String = line.chars().take(width - 3).collect();
    out.push_str("...");
    out
}

/// 項目を縦方向に並べた複数列に整形する
///
/// 各行は`width`文字以内に収まる最小の行数で並べます。
pub fn columnize(items: &[String], width: usize) -> String {
    const SEP: &str = "  ";

    if items.is_empty() {
        return "<empty>\n".to_string();
    }

    let mut rows = items.len();
    let mut col_widths = vec![items.iter().map(|s| s.len()).max().unwrap_or(0)];

    for nrows in 1..=items.len() {
        let ncols = items.len().div_ceil(nrows);
        let widths: Vec<usize> = (0..ncols)
            .map(|c| {
                items[c * nrows..((c + 1) * nrows).min(items.len())]
                    .iter()
                    .map(|s| s.len())
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        let total = widths.iter().sum::<usize>() + SEP.len() * (ncols - 1);
        if total <= width {
            rows = nrows;
            col_widths = widths;
            break;
        }
    }

    let mut out = String::new();
    for r in 0..rows {
        let cells: Vec<String> = col_widths
            .iter()
            .enumerate()
            .filter_map(|(c, w)| items.get(c * rows + r).map(|item| format!("{:<w$}", item, w = *w)))
            .collect();
        out.push_str(cells.join(SEP).trim_end());
        out.push('\n');
    }
    out
}

/// サブコマンド一覧を整形する
pub fn format_subcmds<H>(command: &str, table: &[Subcommand<H>]) -> String {
    let width = table.iter().map(|s| s.name.len()).max().unwrap_or(0);
    let mut out = format!("\n--\nList of \"{}\" subcommands:\n--\n", command);
    for sub in table {
        out.push_str(&format!(
            "{} {:<width$} -- {}\n",
            command,
            sub.name,
            sub.short_help,
            width = width
        ));
    }
    out
}
