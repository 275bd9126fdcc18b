//! ソースファイルキャッシュ
//!
//! `info file` / `info files` が表示する行数・更新時刻・ハッシュなどを提供します。

use crate::Result;
use chrono::{DateTime, Local};
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// ファイルキャッシュのインターフェース
pub trait FileCache {
    /// キャッシュ済みか
    fn is_cached(&self, name: &str) -> bool;

    /// キャッシュ可能か（読み込めるファイルが存在するか）
    fn is_cacheable(&self, name: &str) -> bool;

    /// ファイルを読み込んでキャッシュする
    ///
    /// `reload_on_change`がtrueなら、変更されたファイルを読み直します。
    fn cache(&mut self, name: &str, reload_on_change: bool) -> Result<()>;

    /// 解決済みのフルパス
    fn path(&self, name: &str) -> Option<String>;

    /// 行数
    fn size(&self, name: &str) -> Option<usize>;

    /// ブレークポイントを設定できる行番号
    fn trace_line_numbers(&self, name: &str) -> Option<Vec<u32>>;

    /// 更新時刻（表示用）
    fn mtime(&self, name: &str) -> Option<String>;

    /// 内容のSHA1ハッシュ（16進）
    fn sha1(&self, name: &str) -> Option<String>;

    /// キャッシュ済みファイル名の一覧
    fn cached_files(&self) -> Vec<String>;
}

/// キャッシュされたファイル
#[derive(Debug, Clone)]
struct CachedFile {
    path: PathBuf,
    lines: Vec<String>,
    mtime: SystemTime,
    sha1: String,
}

impl CachedFile {
    fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let mtime = fs::metadata(path)?.modified()?;
        let sha1 = format!("{:x}", Sha1::digest(&bytes));
        let lines = String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect();
        let path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

        Ok(Self {
            path,
            lines,
            mtime,
            sha1,
        })
    }
}

/// ファイルシステム上のソースを読み込むキャッシュ
#[derive(Debug, Default)]
pub struct LineCache {
    files: HashMap<String, CachedFile>,
}

impl LineCache {
    /// 空のキャッシュを作成する
    pub fn new() -> Self {
        Self::default()
    }
}

/// 空行とコメント行以外を停止可能な行とみなす
fn is_trace_line(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && !line.starts_with('#') && !line.starts_with("//")
}

impl FileCache for LineCache {
    fn is_cached(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    fn is_cacheable(&self, name: &str) -> bool {
        Path::new(name).is_file()
    }

    fn cache(&mut self, name: &str, reload_on_change: bool) -> Result<()> {
        if let Some(cached) = self.files.get(name) {
            if !reload_on_change {
                return Ok(());
            }
            let current = fs::metadata(&cached.path).and_then(|m| m.modified());
            match current {
                Ok(mtime) if mtime == cached.mtime => return Ok(()),
                Ok(_) => debug!("{} changed on disk, reloading", name),
                Err(e) => {
                    warn!("cannot stat {}: {}", name, e);
                    return Ok(());
                }
            }
        }

        let file = CachedFile::load(Path::new(name))?;
        debug!("cached {} ({} lines)", name, file.lines.len());
        self.files.insert(name.to_string(), file);
        Ok(())
    }

    fn path(&self, name: &str) -> Option<String> {
        self.files
            .get(name)
            .map(|f| f.path.to_string_lossy().into_owned())
    }

    fn size(&self, name: &str) -> Option<usize> {
        self.files.get(name).map(|f| f.lines.len())
    }

    fn trace_line_numbers(&self, name: &str) -> Option<Vec<u32>> {
        let file = self.files.get(name)?;
        Some(
            file.lines
                .iter()
                .enumerate()
                .filter(|(_, line)| is_trace_line(line))
                .map(|(i, _)| i as u32 + 1)
                .collect(),
        )
    }

    fn mtime(&self, name: &str) -> Option<String> {
        let file = self.files.get(name)?;
        let time: DateTime<Local> = file.mtime.into();
        Some(time.format("%Y-%m-%d %H:%M:%S %z").to_string())
    }

    fn sha1(&self, name: &str) -> Option<String> {
        self.files.get(name).map(|f| f.sha1.clone())
    }

    fn cached_files(&self) -> Vec<String> {
        let mut names: Vec<String> = self.files.keys().cloned().collect();
        names.sort();
        names
    }
}
