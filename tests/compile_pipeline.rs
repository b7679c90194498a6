//! Full pipeline integration tests — PSL source → parse → codegen → HTML.
//!
//! These tests compile complete programs and check the shape of the emitted
//! document: markup, inline styles, and the behavior script.

use pretty_assertions::assert_eq;
use pslc::Compiler;

/// Helper: compile PSL source, panicking on any stage failure.
fn compile(src: &str) -> String {
    Compiler::compile(src).expect("compile failed")
}

const COUNTER_APP: &str = r#"
#title = "Counter";

count = 0;

home {
  title("Counter")
  text("Value: {count}") {
    var: "display";
  }
  row {
    gap: 8;
    button("+") { click { count = count + 1; } }
    button("-") { click { count = count - 1; } }
    button("Reset") { click { count = 0; } }
  }
}
"#;

#[test]
fn counter_app_compiles_end_to_end() {
    let html = compile(COUNTER_APP);

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>Counter</title>"));
    assert!(html.contains("<div class=\"page active\" data-page=\"home\""));
    assert!(html.contains("Value: <span data-bind=\"count\"></span>"));
    assert!(html.contains("app.state.count = 0;"));
    assert!(html.contains("app.state.count = (app.state.count + 1);"));
    assert!(html.contains("app.trigger(\"count\");"));
    assert!(html.ends_with("</body>\n</html>\n"));
}

#[test]
fn output_is_deterministic() {
    assert_eq!(compile(COUNTER_APP), compile(COUNTER_APP));
}

#[test]
fn element_ids_are_assigned_in_document_order() {
    let html = compile(COUNTER_APP);
    let positions: Vec<usize> = (0..6)
        .map(|n| {
            html.find(&format!("id=\"el{n}\""))
                .unwrap_or_else(|| panic!("missing el{n}"))
        })
        .collect();
    for pair in positions.windows(2) {
        assert!(pair[0] < pair[1]);
    }
    assert!(!html.contains("id=\"el6\""));
}

#[test]
fn multi_page_navigation() {
    let html = compile(
        r##"
home {
  button("About") { click { about.show; } }
}
about {
  padding: 32;
  bg: "#f5f5f5";
  button("Back") { click { home.show; } }
}
"##,
    );
    assert!(html.contains("data-page=\"home\""));
    assert!(html.contains("data-page=\"about\""));
    assert!(html.contains("padding: 32px; background-color: #f5f5f5;"));
    assert!(html.contains("app.setPage(\"about\");"));
    assert!(html.contains("app.setPage(\"home\");"));
    // Exactly one page starts active.
    assert_eq!(html.matches("class=\"page active\"").count(), 1);
}

#[test]
fn todo_app_with_persistence_and_loops() {
    let html = compile(
        r#"
todos = ["milk", "bread"];

home {
  title("Todos")
  for (todo in todos) {
    item { text: "{todo}"; }
  }
  button("Save") { click { save(todos); } }
}

load(todos);
"#,
    );
    assert!(html.contains("app.state.todos = [\"milk\", \"bread\"];"));
    assert!(html.contains("for (const todo of app.state.todos)"));
    assert!(html.contains("__todo__"));
    assert!(html.contains("app.save(\"todos\");"));
    assert!(html.contains("app.load(\"todos\");"));
    assert!(html.contains("localStorage"));
}

#[test]
fn watchers_timers_and_key_bindings() {
    let html = compile(
        r#"
seconds = 0;

watch(seconds) {
  if (seconds == 60) { seconds = 0; }
}

every(1s) {
  seconds = seconds + 1;
}

key(space) {
  seconds = 0;
}

home {
  text("Elapsed: {seconds}")
}
"#,
    );
    assert!(html.contains("app.watch(\"seconds\", function () {"));
    assert!(html.contains("if ((app.state.seconds === 60)) {"));
    assert!(html.contains("}, 1000);"));
    assert!(html.contains("if ((key === \"space\")) {"));
}

#[test]
fn conditional_visibility_resolved_at_load() {
    let html = compile(
        r#"
loggedIn = false;

home {
  if (loggedIn) {
    text("Welcome back")
  } else {
    button("Log in") { click { loggedIn = true; } }
  }
}
"#,
    );
    // Both branches are in the markup, hidden; a load script picks one.
    assert!(html.contains("Welcome back"));
    assert!(html.contains("Log in"));
    assert!(html.contains("if (app.state.loggedIn) {"));
    assert!(html.contains("DOMContentLoaded"));
}

#[test]
fn components_expand_at_every_reference() {
    let html = compile(
        r##"
component Badge {
  box {
    radius: 12;
    bg: "#222";
    text("new")
  }
}

home {
  Badge()
  Badge()
}
"##,
    );
    assert_eq!(html.matches("border-radius: 12px").count(), 2);
    assert_eq!(html.matches(">new</p>").count(), 2);
}

#[test]
fn async_waits_compile_to_awaited_helpers() {
    let html = compile(
        r#"
status = "idle";

flash(message) {
  status = message;
  wait(2s) {
    status = "idle";
  }
}

home {
  text("{status}")
  button("Ping") { click { flash("pinged"); } }
}
"#,
    );
    assert!(html.contains("async function flash(message) {"));
    assert!(html.contains("app.state.status = message;"));
    assert!(html.contains("await app.wait(2000);"));
    assert!(html.contains("flash(\"pinged\");"));
}

#[test]
fn parse_errors_surface_with_position() {
    let err = Compiler::compile("watch(x { log(x); }\nhome { }").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("1:"), "message: {message}");
    assert!(message.contains("expected ')'"), "message: {message}");
}

#[test]
fn unrecognized_top_level_junk_does_not_abort() {
    let html = compile("]] ;; home { title(\"Still here\") }");
    assert!(html.contains("Still here"));
}

#[test]
fn compiled_document_round_trips_through_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("app.html");
    std::fs::write(&path, compile(COUNTER_APP)).expect("write");
    let loaded = std::fs::read_to_string(&path).expect("read");
    assert_eq!(loaded, compile(COUNTER_APP));
}
