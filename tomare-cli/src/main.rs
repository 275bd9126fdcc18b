//! tomare CLI - コマンドラインインターフェース
//!
//! ブレークポイント・設定・情報表示を操作するREPL

use anyhow::{Context, Result};
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::fs;
use std::path::{Path, PathBuf};
use tomare_core::{Command, Debugger};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// tomare - breakpoint and session inspector
#[derive(Parser)]
#[command(name = "tomare")]
#[command(version = "0.1.0")]
#[command(about = "Breakpoint, condition and program inspection console", long_about = None)]
struct Cli {
    /// Source files to read into the file cache
    files: Vec<String>,

    /// Number of characters per output line
    #[arg(long)]
    width: Option<u32>,

    /// Do not reread source files that changed on disk
    #[arg(long)]
    no_autoreload: bool,

    /// Execute debugger commands from a file before starting the REPL
    #[arg(short = 'x', long)]
    script: Option<PathBuf>,
}

/// REPLを続けるかどうか
enum Flow {
    Continue,
    Quit,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut debugger = init_debugger(&cli)?;

    if let Some(script) = &cli.script {
        if let Flow::Quit = run_script(&mut debugger, script)? {
            return Ok(());
        }
    }

    run_repl(&mut debugger)
}

/// 設定を反映し、ソースファイルを読み込む
fn init_debugger(cli: &Cli) -> Result<Debugger> {
    let mut debugger = Debugger::with_line_cache()?;

    if let Some(width) = cli.width {
        debugger
            .settings_mut()
            .set("width", Some(width.to_string().as_str()))?;
    }
    if cli.no_autoreload {
        debugger.settings_mut().set("autoreload", Some("off"))?;
    }

    for file in &cli.files {
        match debugger.preload(file) {
            Ok(()) => debug!("preloaded {}", file),
            Err(e) => warn!("cannot read {}: {}", file, e),
        }
    }

    Ok(debugger)
}

/// スクリプトファイルのコマンドを順に実行する
fn run_script(debugger: &mut Debugger, script: &Path) -> Result<Flow> {
    let contents = fs::read_to_string(script)
        .with_context(|| format!("failed to read script {}", script.display()))?;

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Flow::Quit = handle_command(debugger, line) {
            return Ok(Flow::Quit);
        }
    }
    Ok(Flow::Continue)
}

/// REPLループを実行する
fn run_repl(debugger: &mut Debugger) -> Result<()> {
    println!("Type 'help' for available commands, 'quit' to exit.");
    println!();

    let mut rl = DefaultEditor::new()?;

    loop {
        let readline = rl.readline("(tomare) ");
        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                rl.add_history_entry(line)?;

                if let Flow::Quit = handle_command(debugger, line) {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}

/// 1行のコマンドを実行し、結果を表示する
///
/// 通常の出力は標準出力、エラーは標準エラー出力に書きます。
fn handle_command(debugger: &mut Debugger, line: &str) -> Flow {
    let command = match debugger.parse(line) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("*** {}", e);
            return Flow::Continue;
        }
    };

    if let Command::Quit = command {
        return Flow::Quit;
    }

    match debugger.run(command) {
        Ok(output) => print!("{}", output),
        Err(e) => eprintln!("*** {}", e),
    }
    Flow::Continue
}
