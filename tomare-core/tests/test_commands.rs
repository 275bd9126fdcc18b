//! コマンド行からセッションを操作する結合テスト

use std::cell::RefCell;
use std::rc::Rc;
use tomare_core::{
    DebugError, Debugger, Evaluator, FileCache, Frame, Result, Snapshot, StopReason, Value,
};

/// 呼び出しを記録するだけのファイルキャッシュ
#[derive(Default)]
struct RecordingCache {
    calls: Rc<RefCell<Vec<String>>>,
}

impl RecordingCache {
    fn record(&self, call: &str, name: &str) {
        self.calls.borrow_mut().push(format!("{} {}", call, name));
    }
}

impl FileCache for RecordingCache {
    fn is_cached(&self, name: &str) -> bool {
        self.record("is_cached", name);
        false
    }

    fn is_cacheable(&self, name: &str) -> bool {
        self.record("is_cacheable", name);
        false
    }

    fn cache(&mut self, name: &str, _reload_on_change: bool) -> Result<()> {
        self.record("cache", name);
        Ok(())
    }

    fn path(&self, name: &str) -> Option<String> {
        self.record("path", name);
        None
    }

    fn size(&self, name: &str) -> Option<usize> {
        self.record("size", name);
        None
    }

    fn trace_line_numbers(&self, name: &str) -> Option<Vec<u32>> {
        self.record("trace_line_numbers", name);
        None
    }

    fn mtime(&self, name: &str) -> Option<String> {
        self.record("mtime", name);
        None
    }

    fn sha1(&self, name: &str) -> Option<String> {
        self.record("sha1", name);
        None
    }

    fn cached_files(&self) -> Vec<String> {
        Vec::new()
    }
}

/// 常に失敗する評価器
struct FailingEvaluator;

impl Evaluator for FailingEvaluator {
    fn evaluate(&self, expression: &str, _frame: usize) -> Result<Value> {
        Err(anyhow::anyhow!("cannot evaluate {}", expression))
    }
}

fn calc_snapshot() -> Snapshot {
    let this = Value::Object {
        class: "Calc".into(),
        ivars: vec![
            ("@total".into(), Value::Int(10)),
            ("@fmt".into(), Value::Str("%d".into())),
        ],
    };
    Snapshot::new()
        .with_frame(
            Frame::new("Calc#add", "calc.rb", 12)
                .with_arg("a", Value::Int(1))
                .with_arg("b", Value::Int(2))
                .with_local("sum", Value::Int(3))
                .with_local("__dbg_tmp", Value::Int(0))
                .with_self(this),
        )
        .with_frame(Frame::new("<main>", "main.rb", 3))
        .with_global("$verbose", Value::Bool(true))
        .with_stop_reason(StopReason::Breakpoint)
}

fn idle_debugger() -> Debugger {
    Debugger::new(Box::new(RecordingCache::default())).unwrap()
}

fn paused_debugger() -> Debugger {
    let snapshot = calc_snapshot();
    let mut dbg = idle_debugger();
    dbg.set_evaluator(Box::new(snapshot.clone()));
    dbg.attach(Box::new(snapshot));
    dbg
}

#[test]
fn test_condition_set_and_clear() {
    let mut dbg = idle_debugger();
    for line in ["b app.rb:3", "b app.rb:7", "b app.rb:11"] {
        dbg.execute(line).unwrap();
    }

    assert_eq!(dbg.execute("cond 2 x > 5").unwrap(), "");
    assert_eq!(
        dbg.execute("info breakpoints").unwrap(),
        "Num Enb What\n\
         1   y   at app.rb:3\n\
         2   y   at app.rb:7 if x > 5\n\
         3   y   at app.rb:11\n"
    );

    dbg.execute("cond 2").unwrap();
    assert_eq!(dbg.breakpoints().find_by_id(2).unwrap().expr, None);
    assert!(!dbg.execute("info breakpoints").unwrap().contains(" if "));
}

#[test]
fn test_condition_out_of_range() {
    let mut dbg = idle_debugger();
    for line in ["b app.rb:3", "b app.rb:7", "b app.rb:11"] {
        dbg.execute(line).unwrap();
    }

    assert_eq!(
        dbg.execute("cond 99 x>0").unwrap_err().to_string(),
        "\"Condition\" argument \"99\" needs to be at most 3."
    );
    assert_eq!(
        dbg.execute("cond zero x>0").unwrap_err().to_string(),
        "\"Condition\" argument \"zero\" needs to be a number."
    );
    assert_eq!(
        dbg.execute("cond 0 x>0").unwrap_err().to_string(),
        "\"Condition\" argument \"0\" needs to be at least 1."
    );
    assert_eq!(dbg.breakpoints().count(), 3);
    assert_eq!(dbg.breakpoints().largest_id(), 3);
}

#[test]
fn test_condition_invalid_expression_keeps_previous() {
    let mut dbg = idle_debugger();
    dbg.execute("b app.rb:3 if ready?").unwrap();

    assert_eq!(
        dbg.execute("cond 1 x >").unwrap_err().to_string(),
        "Incorrect expression \"x >\", breakpoint not changed"
    );
    assert_eq!(
        dbg.breakpoints().find_by_id(1).unwrap().expr.as_deref(),
        Some("ready?")
    );
}

#[test]
fn test_condition_rejects_deeply_nested_expression() {
    let mut dbg = idle_debugger();
    dbg.execute("b app.rb:3 if ready?").unwrap();

    let nested = format!("{}x{}", "(".repeat(10_000), ")".repeat(10_000));
    assert_eq!(
        dbg.execute(&format!("cond 1 {}", nested)).unwrap_err(),
        DebugError::InvalidExpression(nested.clone())
    );
    assert_eq!(
        dbg.breakpoints().find_by_id(1).unwrap().expr.as_deref(),
        Some("ready?")
    );
}

#[test]
fn test_condition_accepts_wide_literals_and_suffixed_methods() {
    let mut dbg = idle_debugger();
    dbg.execute("b app.rb:3").unwrap();

    dbg.execute("cond 1 total > 99999999999999999999").unwrap();
    dbg.execute("cond 1 mask == 0xFFFFFFFFFFFFFFFFFFFFFF").unwrap();
    dbg.execute("cond 1 x.nil?==false").unwrap();
    assert_eq!(
        dbg.breakpoints().find_by_id(1).unwrap().expr.as_deref(),
        Some("x.nil?==false")
    );
}

#[test]
fn test_condition_on_empty_registry() {
    let mut dbg = idle_debugger();
    assert_eq!(dbg.execute("cond 1 x").unwrap_err(), DebugError::NoBreakpoints);
}

#[test]
fn test_condition_refused_post_mortem() {
    let mut dbg = idle_debugger();
    dbg.execute("b app.rb:3").unwrap();
    dbg.attach(Box::new(Snapshot::new().crashed(None)));
    assert_eq!(dbg.execute("cond 1 x").unwrap_err(), DebugError::PostMortem);
}

#[test]
fn test_info_breakpoints_empty_and_filtered() {
    let mut dbg = idle_debugger();
    assert_eq!(dbg.execute("info breakpoints").unwrap(), "No breakpoints.\n");

    dbg.execute("b app.rb:3").unwrap();
    dbg.execute("b Calc#add").unwrap();
    assert_eq!(
        dbg.execute("info b 7 x").unwrap_err().to_string(),
        "No breakpoints found among list given."
    );
    assert_eq!(
        dbg.execute("info b 2").unwrap(),
        "Num Enb What\n2   y   at Calc:add\n"
    );
}

#[test]
fn test_info_breakpoints_hit_counts() {
    let mut dbg = idle_debugger();
    dbg.execute("b app.rb:3").unwrap();
    dbg.execute("b app.rb:4").unwrap();
    dbg.record_breakpoint_hit(1).unwrap();
    dbg.record_breakpoint_hit(2).unwrap();
    dbg.record_breakpoint_hit(2).unwrap();

    let out = dbg.execute("info breakpoints").unwrap();
    assert!(out.contains("at app.rb:3\n\tbreakpoint already hit 1 time\n"));
    assert!(out.contains("at app.rb:4\n\tbreakpoint already hit 2 times\n"));
}

#[test]
fn test_info_file_not_cached_stops_early() {
    let cache = RecordingCache::default();
    let calls = Rc::clone(&cache.calls);
    let mut dbg = Debugger::new(Box::new(cache)).unwrap();

    assert_eq!(
        dbg.execute("info file foo.rb lines").unwrap(),
        "File foo.rb is not cached\n"
    );
    assert_eq!(
        *calls.borrow(),
        vec!["is_cached foo.rb".to_string(), "is_cacheable foo.rb".to_string()]
    );
}

#[test]
fn test_info_file_invalid_attribute() {
    let mut dbg = idle_debugger();
    assert_eq!(
        dbg.execute("info file foo.rb colour").unwrap_err().to_string(),
        "Invalid parameter colour"
    );
}

#[test]
fn test_info_without_subcommand() {
    let mut dbg = idle_debugger();
    let out = dbg.execute("info").unwrap();
    assert!(out.starts_with("info[ subcommand]\n"));
    assert!(out.contains("\n--\nList of \"info\" subcommands:\n--\n"));
    assert!(out.ends_with(&format!(
        "info {:<18} -- Local and instance variables of the current stack frame\n",
        "variables"
    )));
}

#[test]
fn test_info_unknown_subcommand() {
    let mut dbg = idle_debugger();
    assert_eq!(
        dbg.execute("info zzz").unwrap_err().to_string(),
        "Unknown info command zzz"
    );
    // "f" は file の最小接頭辞長に満たない
    assert_eq!(
        dbg.execute("info f").unwrap_err().to_string(),
        "Unknown info command f"
    );
}

#[test]
fn test_info_frame_commands_need_context() {
    let mut dbg = idle_debugger();
    assert_eq!(
        dbg.execute("info line").unwrap_err().to_string(),
        "info line not available here."
    );
    assert_eq!(
        dbg.execute("info locals").unwrap_err().to_string(),
        "info locals not available here."
    );
    assert_eq!(
        dbg.execute("info args").unwrap_err().to_string(),
        "No frame selected."
    );
    assert_eq!(
        dbg.execute("info program").unwrap(),
        "The program being debugged is not being run.\n"
    );
}

#[test]
fn test_info_paused_program() {
    let mut dbg = paused_debugger();
    assert_eq!(dbg.execute("info line").unwrap(), "Line 12 of \"calc.rb\"\n");
    assert_eq!(
        dbg.execute("info program").unwrap(),
        "Program stopped. It stopped at a breakpoint.\n"
    );
    assert_eq!(
        dbg.execute("info stack").unwrap(),
        "--> #0  Calc#add at calc.rb:12\n    #1  <main> at main.rb:3\n"
    );

    dbg.select_frame(1).unwrap();
    assert_eq!(dbg.execute("info line").unwrap(), "Line 3 of \"main.rb\"\n");
    assert!(dbg.execute("info stack").unwrap().contains("--> #1  <main>"));
}

#[test]
fn test_info_crashed_program() {
    let mut dbg = idle_debugger();
    let failure = Value::Object {
        class: "ZeroDivisionError".into(),
        ivars: Vec::new(),
    };
    dbg.attach(Box::new(Snapshot::new().crashed(Some(failure))));
    assert_eq!(
        dbg.execute("info program").unwrap(),
        "The program crashed.\nException: #<ZeroDivisionError>\n"
    );

    dbg.attach(Box::new(Snapshot::new().crashed(None)));
    assert_eq!(dbg.execute("info program").unwrap(), "The program crashed.\n");
}

#[test]
fn test_info_variables() {
    let mut dbg = paused_debugger();
    assert_eq!(dbg.execute("info args").unwrap(), "a = 1\nb = 2\n");
    assert_eq!(
        dbg.execute("info locals").unwrap(),
        "__dbg_tmp = 0\na = 1\nb = 2\nsum = 3\n"
    );
    assert_eq!(
        dbg.execute("info instance_variables").unwrap(),
        "@fmt = \"%d\"\n@total = 10\n"
    );
    assert_eq!(dbg.execute("info global_variables").unwrap(), "$verbose = true\n");
    assert_eq!(
        dbg.execute("info variables").unwrap(),
        "a = 1\n\
         b = 2\n\
         self = #<Calc @total=10, @fmt=\"%d\">\n\
         sum = 3\n\
         @fmt = \"%d\"\n\
         @total = 10\n"
    );
}

#[test]
fn test_info_variables_degrade_on_failure() {
    let broken = Value::Opaque {
        class: "Socket".into(),
        inspect: None,
        plain: None,
    };
    let plain_only = Value::Opaque {
        class: "Conn".into(),
        inspect: None,
        plain: Some("conn#1".into()),
    };
    let snapshot = Snapshot::new().with_frame(
        Frame::new("run", "app.rb", 5)
            .with_local("sock", broken)
            .with_local("conn", plain_only),
    );

    let mut dbg = idle_debugger();
    dbg.set_evaluator(Box::new(FailingEvaluator));
    dbg.attach(Box::new(snapshot));

    assert_eq!(
        dbg.execute("info locals").unwrap(),
        "conn = conn#1\nsock = *Error in evaluation*\n"
    );
    assert_eq!(
        dbg.execute("info instance_variables").unwrap(),
        "self = *Error in evaluation*\n"
    );
}

#[test]
fn test_info_locals_truncated_to_width() {
    let snapshot = Snapshot::new().with_frame(
        Frame::new("run", "app.rb", 5).with_local("text", Value::Str("x".repeat(40))),
    );
    let mut dbg = idle_debugger();
    dbg.attach(Box::new(snapshot));
    dbg.execute("set width 20").unwrap();

    assert_eq!(dbg.execute("info locals").unwrap(), "text = \"xxxxxxxxx...\n");
}

#[test]
fn test_display_listing() {
    let mut dbg = paused_debugger();
    assert_eq!(
        dbg.execute("info display").unwrap(),
        "There are no auto-display expressions now.\n"
    );

    assert_eq!(dbg.execute("display sum").unwrap(), "1: sum = 3\n");
    assert_eq!(dbg.execute("display @total").unwrap(), "2: @total = 10\n");
    assert_eq!(dbg.execute("display nope").unwrap(), "3: nope = *Error in evaluation*\n");
    dbg.execute("undisplay 2").unwrap();

    assert_eq!(
        dbg.execute("info display").unwrap(),
        "Auto-display expressions now in effect:\n\
         Num Enb Expression\n\
         \x20 1: y  sum\n\
         \x20 3: y  nope\n"
    );
    assert_eq!(dbg.display_all(), "1: sum = 3\n3: nope = *Error in evaluation*\n");
}

#[test]
fn test_disabled_display_listing() {
    let mut dbg = paused_debugger();
    dbg.execute("display sum").unwrap();
    dbg.execute("display a").unwrap();
    dbg.execute("disable display 2").unwrap();

    assert_eq!(
        dbg.execute("info display").unwrap(),
        "Auto-display expressions now in effect:\n\
         Num Enb Expression\n\
         \x20 1: y  sum\n\
         \x20 2: n  a\n"
    );
    // 無効なスロットは停止時に表示されない
    assert_eq!(dbg.display_all(), "1: sum = 3\n");
    assert_eq!(dbg.execute("display").unwrap(), "1: sum = 3\n");

    dbg.execute("enable display 2").unwrap();
    assert_eq!(dbg.display_all(), "1: sum = 3\n2: a = 1\n");
}

#[test]
fn test_info_display_needs_context() {
    let mut dbg = idle_debugger();
    assert_eq!(
        dbg.execute("info display").unwrap_err().to_string(),
        "info display not available here."
    );
}

#[test]
fn test_info_catch() {
    let mut dbg = idle_debugger();
    assert_eq!(dbg.execute("info catch").unwrap_err(), DebugError::NoFrameSelected);

    let mut dbg = paused_debugger();
    assert_eq!(
        dbg.execute("info catch").unwrap(),
        "No exceptions set to be caught.\n"
    );
    dbg.execute("catch ArgumentError").unwrap();
    assert_eq!(dbg.execute("info catch").unwrap(), "ArgumentError\n");
}

#[test]
fn test_detach_clears_position() {
    let mut dbg = paused_debugger();
    assert!(dbg.state().frame_pos().is_some());

    dbg.detach();
    assert_eq!(dbg.state().frame_pos(), None);
    assert_eq!(dbg.state().file(), None);
    assert_eq!(
        dbg.execute("info program").unwrap(),
        "The program being debugged is not being run.\n"
    );
}

#[test]
fn test_info_file_with_line_cache() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("calc.rb");
    std::fs::write(&path, "a = 1\n\n# total\nb = a + 1\n").unwrap();
    let name = path.to_string_lossy().into_owned();

    let mut dbg = Debugger::with_line_cache().unwrap();
    assert_eq!(
        dbg.execute(&format!("info file {} lines", name)).unwrap(),
        format!("File {}\n\t 4 lines\n", name)
    );
    assert_eq!(
        dbg.execute(&format!("info file {} breakpoints", name)).unwrap(),
        format!("File {}\n\tbreakpoint line numbers:\n1  4\n", name)
    );

    let sha1 = dbg.execute(&format!("info file {} sha1", name)).unwrap();
    let digest = sha1.lines().nth(1).unwrap().trim();
    assert_eq!(digest.len(), 40);

    let files = dbg.execute("info files").unwrap();
    assert!(files.starts_with(&format!("File {}", name)));
    assert_eq!(dbg.execute("info file").unwrap(), files);
}
