//! Behavior script compilation: expressions, actions, and the global
//! script that wires the store, watchers, timers, and input dispatchers.

use crate::ast::{Action, AssignTarget, Expr, Stmt, SwipeDirection};
use crate::error::CompileError;
use crate::js::{render_stmts, JsExpr, JsStmt};

use super::{style, Codegen};

/// Names bound by the enclosing function or loop; these compile to plain
/// identifiers instead of store reads.
#[derive(Default, Clone)]
pub(super) struct Scope {
    params: Vec<String>,
}

impl Scope {
    fn with(params: &[String]) -> Self {
        Self {
            params: params.to_vec(),
        }
    }

    fn bind(&self, name: &str) -> Self {
        let mut scope = self.clone();
        scope.params.push(name.to_string());
        scope
    }

    fn has(&self, name: &str) -> bool {
        self.params.iter().any(|p| p == name)
    }
}

/// Compile an expression with no local scope and no element registry.
/// Used for static positions (attributes, metadata) that fall back to
/// script form.
pub(super) fn expr_to_js_static(expr: &Expr) -> JsExpr {
    compile_expr(expr, &Scope::default(), &[])
}

fn compile_expr(expr: &Expr, scope: &Scope, registry: &[String]) -> JsExpr {
    match expr {
        Expr::Str(s) => JsExpr::str(s.clone()),
        Expr::Number { value, unit: None } => JsExpr::Num(*value),
        Expr::Number {
            value,
            unit: Some(unit),
        } => JsExpr::str(format!("{}{unit}", style::fmt_num(*value))),
        Expr::Bool(b) => JsExpr::Bool(*b),
        Expr::Null => JsExpr::Null,
        Expr::Var(name) => {
            if scope.has(name) {
                JsExpr::ident(name.clone())
            } else {
                JsExpr::ident("app").member("state").member(name.clone())
            }
        }
        Expr::Member { object, property } => {
            if scope.has(object) {
                JsExpr::ident(object.clone()).member(property.clone())
            } else if registry.iter().any(|n| n == object) {
                let el = JsExpr::ident("app")
                    .member("nodes")
                    .index(JsExpr::str(object.clone()));
                match property.as_str() {
                    "text" => el.member("textContent"),
                    other => el.member(other.to_string()),
                }
            } else {
                JsExpr::ident("app")
                    .member("state")
                    .member(object.clone())
                    .member(property.clone())
            }
        }
        Expr::Array(items) => JsExpr::Array(
            items
                .iter()
                .map(|item| compile_expr(item, scope, registry))
                .collect(),
        ),
        Expr::Object(entries) => JsExpr::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), compile_expr(v, scope, registry)))
                .collect(),
        ),
        Expr::Binary { op, left, right } => JsExpr::Binary(
            js_op(*op),
            Box::new(compile_expr(left, scope, registry)),
            Box::new(compile_expr(right, scope, registry)),
        ),
        Expr::Ternary { cond, then, els } => JsExpr::Ternary(
            Box::new(compile_expr(cond, scope, registry)),
            Box::new(compile_expr(then, scope, registry)),
            Box::new(compile_expr(els, scope, registry)),
        ),
    }
}

fn js_op(op: crate::ast::BinOp) -> &'static str {
    use crate::ast::BinOp;
    match op {
        // Source equality is strict in the output.
        BinOp::Eq => "===",
        BinOp::NotEq => "!==",
        other => other.as_str(),
    }
}

/// Whether an action list reaches a `wait`, which forces the enclosing
/// function async.
pub(super) fn contains_wait(actions: &[Action]) -> bool {
    actions.iter().any(|action| match action {
        Action::Wait { .. } => true,
        Action::If { then, els, .. } => contains_wait(then) || contains_wait(els),
        _ => false,
    })
}

fn stmts_contain_wait(stmts: &[Stmt]) -> bool {
    stmts.iter().any(|stmt| match stmt {
        Stmt::Action(action) => contains_wait(std::slice::from_ref(action)),
        Stmt::For { body, .. } => stmts_contain_wait(body),
    })
}

/// A `wait` duration in milliseconds. Seconds scale; a bare number is
/// already milliseconds.
fn duration_ms(expr: &Expr) -> JsExpr {
    match expr {
        Expr::Number {
            value,
            unit: Some(unit),
        } if unit == "s" => JsExpr::Num(value * 1000.0),
        Expr::Number { value, .. } => JsExpr::Num(*value),
        other => expr_to_js_static(other),
    }
}

impl<'a> Codegen<'a> {
    pub(super) fn expr_to_js(&self, expr: &Expr, scope: &Scope) -> JsExpr {
        compile_expr(expr, scope, &self.registry)
    }

    pub(super) fn actions_to_js(&self, actions: &[Action], scope: &Scope) -> Vec<JsStmt> {
        let mut out = Vec::new();
        for action in actions {
            out.extend(self.action_to_js(action, scope));
        }
        out
    }

    fn action_to_js(&self, action: &Action, scope: &Scope) -> Vec<JsStmt> {
        match action {
            Action::Assign { target, value } => self.assign_to_js(target, value, scope),
            Action::Call { name, args } => vec![self.call_to_js(name, args, scope)],
            Action::If { cond, then, els } => vec![JsStmt::If {
                cond: self.expr_to_js(cond, scope),
                then: self.actions_to_js(then, scope),
                els: self.actions_to_js(els, scope),
            }],
            Action::Wait { duration, body } => {
                let mut out = vec![JsStmt::Expr(JsExpr::Await(Box::new(
                    JsExpr::ident("app")
                        .member("wait")
                        .call(vec![duration_ms(duration)]),
                )))];
                out.extend(self.actions_to_js(body, scope));
                out
            }
        }
    }

    fn assign_to_js(&self, target: &AssignTarget, value: &Expr, scope: &Scope) -> Vec<JsStmt> {
        match target {
            AssignTarget::Var(name) => {
                if scope.has(name) {
                    return vec![JsStmt::Assign(
                        JsExpr::ident(name.clone()),
                        self.expr_to_js(value, scope),
                    )];
                }
                vec![
                    JsStmt::Assign(
                        JsExpr::ident("app").member("state").member(name.clone()),
                        self.expr_to_js(value, scope),
                    ),
                    JsStmt::Expr(
                        JsExpr::ident("app")
                            .member("trigger")
                            .call(vec![JsExpr::str(name.clone())]),
                    ),
                ]
            }
            AssignTarget::Member { object, property } => {
                if self.program.page(object).is_some() {
                    let call = match property.as_str() {
                        "hide" => "hidePage",
                        _ => "setPage",
                    };
                    return vec![JsStmt::Expr(
                        JsExpr::ident("app")
                            .member(call)
                            .call(vec![JsExpr::str(object.clone())]),
                    )];
                }
                let lookup = JsExpr::ident("app")
                    .member("node")
                    .call(vec![JsExpr::str(object.clone())]);
                vec![
                    JsStmt::If {
                        cond: lookup.clone(),
                        then: vec![self.mutation(lookup, property, value, scope)],
                        els: vec![],
                    },
                    JsStmt::Expr(
                        JsExpr::ident("app")
                            .member("trigger")
                            .call(vec![JsExpr::str(object.clone())]),
                    ),
                ]
            }
        }
    }

    /// One property write on a resolved element node.
    fn mutation(&self, el: JsExpr, property: &str, value: &Expr, scope: &Scope) -> JsStmt {
        let v = self.expr_to_js(value, scope);
        let px = |v: JsExpr| JsExpr::ident("app").member("px").call(vec![v]);
        match property {
            "text" => JsStmt::Assign(el.member("textContent"), v),
            "value" => JsStmt::Assign(el.member("value"), v),
            "src" => JsStmt::Assign(el.member("src"), v),
            "bg" => JsStmt::Assign(el.member("style").member("backgroundColor"), v),
            "color" => JsStmt::Assign(el.member("style").member("color"), v),
            "size" => JsStmt::Assign(el.member("style").member("fontSize"), px(v)),
            "hide" => {
                let display = match value {
                    Expr::Bool(b) => JsExpr::str(if *b { "none" } else { "" }),
                    _ => JsExpr::Ternary(
                        Box::new(v),
                        Box::new(JsExpr::str("none")),
                        Box::new(JsExpr::str("")),
                    ),
                };
                JsStmt::Assign(el.member("style").member("display"), display)
            }
            "show" => {
                let display = match value {
                    Expr::Bool(b) => JsExpr::str(if *b { "" } else { "none" }),
                    _ => JsExpr::Ternary(
                        Box::new(v),
                        Box::new(JsExpr::str("")),
                        Box::new(JsExpr::str("none")),
                    ),
                };
                JsStmt::Assign(el.member("style").member("display"), display)
            }
            "radius" => JsStmt::Assign(el.member("style").member("borderRadius"), px(v)),
            "border" => JsStmt::Assign(el.member("style").member("borderWidth"), px(v)),
            "padding" => JsStmt::Assign(el.member("style").member("padding"), px(v)),
            "margin" => JsStmt::Assign(el.member("style").member("margin"), px(v)),
            "width" => JsStmt::Assign(el.member("style").member("width"), px(v)),
            "height" => JsStmt::Assign(el.member("style").member("height"), px(v)),
            other => JsStmt::Expr(el.member("setAttribute").call(vec![
                JsExpr::str(format!("data-{other}")),
                v,
            ])),
        }
    }

    fn call_to_js(&self, name: &str, args: &[Expr], scope: &Scope) -> JsStmt {
        let compiled: Vec<JsExpr> = args.iter().map(|a| self.expr_to_js(a, scope)).collect();
        let expr = match name {
            "log" => JsExpr::ident("console").member("log").call(compiled),
            "alert" => JsExpr::ident("alert").call(compiled),
            "notify" => JsExpr::ident("app").member("notify").call(compiled),
            "save" | "load" => {
                // Persistence takes a store variable by name.
                let var = match args.first() {
                    Some(Expr::Var(n)) | Some(Expr::Str(n)) => n.clone(),
                    _ => String::new(),
                };
                JsExpr::ident("app")
                    .member(name.to_string())
                    .call(vec![JsExpr::str(var)])
            }
            other => JsExpr::ident(other.to_string()).call(compiled),
        };
        JsStmt::Expr(expr)
    }

    fn stmt_to_js(&self, stmt: &Stmt, scope: &Scope) -> Vec<JsStmt> {
        match stmt {
            Stmt::Action(action) => self.action_to_js(action, scope),
            Stmt::For { var, iter, body } => {
                let inner = scope.bind(var);
                let mut compiled = Vec::new();
                for stmt in body {
                    compiled.extend(self.stmt_to_js(stmt, &inner));
                }
                vec![JsStmt::ForOf {
                    var: var.clone(),
                    iter: self.expr_to_js(iter, scope),
                    body: compiled,
                }]
            }
        }
    }

    /// The program-specific script at the end of the body: store
    /// initialization, the trigger machinery, watchers, timers, user
    /// functions, top-level statements, and the input dispatchers.
    pub(super) fn global_script(&mut self) -> Result<String, CompileError> {
        let scope = Scope::default();
        let mut stmts: Vec<JsStmt> = Vec::new();

        for (name, value) in &self.program.globals {
            stmts.push(JsStmt::Assign(
                JsExpr::ident("app").member("state").member(name.clone()),
                self.expr_to_js(value, &scope),
            ));
        }

        stmts.push(JsStmt::Raw(REFRESH_AND_TRIGGER.to_string()));
        stmts.push(JsStmt::Raw(PAGE_HELPERS.to_string()));

        // Fill the reactive text placeholders with the initial values.
        for (name, _) in &self.program.globals {
            stmts.push(JsStmt::Expr(
                JsExpr::ident("app")
                    .member("refresh")
                    .call(vec![JsExpr::str(name.clone())]),
            ));
        }

        for watcher in &self.program.watchers {
            stmts.push(JsStmt::Expr(JsExpr::ident("app").member("watch").call(vec![
                JsExpr::str(watcher.variable.clone()),
                JsExpr::Func {
                    params: vec![],
                    body: self.actions_to_js(&watcher.body, &scope),
                    is_async: contains_wait(&watcher.body),
                },
            ])));
        }

        for interval in &self.program.intervals {
            stmts.push(JsStmt::Expr(JsExpr::ident("setInterval").call(vec![
                JsExpr::Func {
                    params: vec![],
                    body: self.actions_to_js(&interval.body, &scope),
                    is_async: contains_wait(&interval.body),
                },
                duration_ms(&interval.duration),
            ])));
        }

        for function in &self.program.functions {
            let inner = Scope::with(&function.params);
            stmts.push(JsStmt::Function {
                name: function.name.clone(),
                params: function.params.clone(),
                body: self.actions_to_js(&function.body, &inner),
                is_async: contains_wait(&function.body),
            });
        }

        let mut top_level: Vec<JsStmt> = Vec::new();
        for stmt in &self.program.statements {
            top_level.extend(self.stmt_to_js(stmt, &scope));
        }
        if stmts_contain_wait(&self.program.statements) {
            // An awaiting top level runs inside an async wrapper.
            let wrapper = JsExpr::Func {
                params: vec![],
                body: top_level,
                is_async: true,
            };
            stmts.push(JsStmt::Expr(
                JsExpr::raw(format!("({})", wrapper.render())).call(vec![]),
            ));
        } else {
            stmts.extend(top_level);
        }

        if !self.program.key_handlers.is_empty() {
            stmts.push(self.key_dispatcher());
        }
        if !self.program.swipe_handlers.is_empty() {
            stmts.extend(self.swipe_dispatcher());
        }

        stmts.push(JsStmt::Raw(crate::boilerplate::IMAGE_GUARD.to_string()));

        Ok(render_stmts(&stmts, 0))
    }

    /// One document-level keydown listener dispatching over the declared
    /// bindings by normalized key name.
    fn key_dispatcher(&self) -> JsStmt {
        let scope = Scope::default();
        let mut body = vec![JsStmt::Const(
            "key".to_string(),
            JsExpr::ident("app")
                .member("normalizeKey")
                .call(vec![JsExpr::ident("event").member("key")]),
        )];
        let mut is_async = false;
        for handler in &self.program.key_handlers {
            is_async |= contains_wait(&handler.body);
            body.push(JsStmt::If {
                cond: JsExpr::Binary(
                    "===",
                    Box::new(JsExpr::ident("key")),
                    Box::new(JsExpr::str(normalize_key(&handler.key))),
                ),
                then: self.actions_to_js(&handler.body, &scope),
                els: vec![],
            });
        }
        JsStmt::Expr(JsExpr::ident("document").member("addEventListener").call(vec![
            JsExpr::str("keydown"),
            JsExpr::Func {
                params: vec!["event".to_string()],
                body,
                is_async,
            },
        ]))
    }

    /// Touch tracking plus one touchend listener resolving the dominant
    /// axis and a 30px threshold into a swipe direction.
    fn swipe_dispatcher(&self) -> Vec<JsStmt> {
        let scope = Scope::default();
        let direction_body = |dir: SwipeDirection| -> Vec<JsStmt> {
            let mut out = Vec::new();
            for handler in &self.program.swipe_handlers {
                if handler.direction == dir {
                    out.extend(self.actions_to_js(&handler.body, &scope));
                }
            }
            out
        };
        let is_async = self
            .program
            .swipe_handlers
            .iter()
            .any(|h| contains_wait(&h.body));

        let axis = |delta: &str, positive: SwipeDirection, negative: SwipeDirection| JsStmt::If {
            cond: JsExpr::Binary(
                ">",
                Box::new(JsExpr::ident(delta)),
                Box::new(JsExpr::Num(30.0)),
            ),
            then: direction_body(positive),
            els: vec![JsStmt::If {
                cond: JsExpr::Binary(
                    "<",
                    Box::new(JsExpr::ident(delta)),
                    Box::new(JsExpr::Num(-30.0)),
                ),
                then: direction_body(negative),
                els: vec![],
            }],
        };

        let touch = |index: &str, axis: &str| {
            JsExpr::ident("event")
                .member(index)
                .index(JsExpr::Num(0.0))
                .member(axis)
        };

        let start = JsStmt::Expr(JsExpr::ident("document").member("addEventListener").call(vec![
            JsExpr::str("touchstart"),
            JsExpr::Func {
                params: vec!["event".to_string()],
                body: vec![
                    JsStmt::Assign(JsExpr::ident("touchX"), touch("touches", "clientX")),
                    JsStmt::Assign(JsExpr::ident("touchY"), touch("touches", "clientY")),
                ],
                is_async: false,
            },
        ]));

        let abs = |name: &str| {
            JsExpr::ident("Math")
                .member("abs")
                .call(vec![JsExpr::ident(name)])
        };
        let end = JsStmt::Expr(JsExpr::ident("document").member("addEventListener").call(vec![
            JsExpr::str("touchend"),
            JsExpr::Func {
                params: vec!["event".to_string()],
                body: vec![
                    JsStmt::Const(
                        "dx".to_string(),
                        JsExpr::Binary(
                            "-",
                            Box::new(touch("changedTouches", "clientX")),
                            Box::new(JsExpr::ident("touchX")),
                        ),
                    ),
                    JsStmt::Const(
                        "dy".to_string(),
                        JsExpr::Binary(
                            "-",
                            Box::new(touch("changedTouches", "clientY")),
                            Box::new(JsExpr::ident("touchY")),
                        ),
                    ),
                    JsStmt::If {
                        cond: JsExpr::Binary(">", Box::new(abs("dx")), Box::new(abs("dy"))),
                        then: vec![axis("dx", SwipeDirection::Right, SwipeDirection::Left)],
                        els: vec![axis("dy", SwipeDirection::Down, SwipeDirection::Up)],
                    },
                ],
                is_async,
            },
        ]));

        vec![
            JsStmt::Let("touchX".to_string(), JsExpr::Num(0.0)),
            JsStmt::Let("touchY".to_string(), JsExpr::Num(0.0)),
            start,
            end,
        ]
    }
}

/// Compile-time mirror of the runtime's key normalization.
fn normalize_key(key: &str) -> String {
    if key == " " {
        "space".to_string()
    } else {
        key.to_lowercase()
    }
}

const REFRESH_AND_TRIGGER: &str = r#"app.refresh = function (name) {
  document.querySelectorAll('[data-bind="' + name + '"]').forEach(function (span) {
    span.textContent = String(app.state[name]);
  });
};
app.trigger = function (name) {
  app.refresh(name);
  (app.watchers[name] || []).forEach(function (fn) { fn(); });
};"#;

const PAGE_HELPERS: &str = r#"app.setPage = function (name) {
  document.querySelectorAll(".page").forEach(function (page) {
    page.classList.toggle("active", page.dataset.page === name);
  });
};
app.hidePage = function (name) {
  document.querySelectorAll(".page").forEach(function (page) {
    if (page.dataset.page === name) { page.classList.remove("active"); }
  });
};"#;
