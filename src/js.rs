//! A small intermediate representation for the emitted behavior script.
//!
//! The codegen builds script fragments as [`JsStmt`]/[`JsExpr`] trees and
//! serializes them in one pass, which keeps string escaping and nesting
//! correct and lets the rendering be tested on its own.

use std::fmt::Write;

/// A JavaScript expression.
#[derive(Debug, Clone, PartialEq)]
pub enum JsExpr {
    Str(String),
    Num(f64),
    Bool(bool),
    Null,
    Ident(String),
    Member(Box<JsExpr>, String),
    Index(Box<JsExpr>, Box<JsExpr>),
    Array(Vec<JsExpr>),
    Object(Vec<(String, JsExpr)>),
    Call(Box<JsExpr>, Vec<JsExpr>),
    Binary(&'static str, Box<JsExpr>, Box<JsExpr>),
    Ternary(Box<JsExpr>, Box<JsExpr>, Box<JsExpr>),
    Not(Box<JsExpr>),
    Await(Box<JsExpr>),
    /// Anonymous `function (params) { body }`, optionally async.
    Func {
        params: Vec<String>,
        body: Vec<JsStmt>,
        is_async: bool,
    },
    /// Pre-rendered source; used for the few fixed runtime helpers.
    Raw(String),
}

impl JsExpr {
    pub fn str(s: impl Into<String>) -> Self {
        JsExpr::Str(s.into())
    }

    pub fn ident(s: impl Into<String>) -> Self {
        JsExpr::Ident(s.into())
    }

    pub fn raw(s: impl Into<String>) -> Self {
        JsExpr::Raw(s.into())
    }

    pub fn member(self, property: impl Into<String>) -> Self {
        JsExpr::Member(Box::new(self), property.into())
    }

    pub fn index(self, key: JsExpr) -> Self {
        JsExpr::Index(Box::new(self), Box::new(key))
    }

    pub fn call(self, args: Vec<JsExpr>) -> Self {
        JsExpr::Call(Box::new(self), args)
    }

    pub fn render(&self) -> String {
        match self {
            JsExpr::Str(s) => format!("\"{}\"", escape_js_string(s)),
            JsExpr::Num(n) => render_number(*n),
            JsExpr::Bool(b) => b.to_string(),
            JsExpr::Null => "null".to_string(),
            JsExpr::Ident(name) => name.clone(),
            JsExpr::Member(object, property) => format!("{}.{}", object.render(), property),
            JsExpr::Index(object, key) => format!("{}[{}]", object.render(), key.render()),
            JsExpr::Array(items) => {
                let parts: Vec<String> = items.iter().map(JsExpr::render).collect();
                format!("[{}]", parts.join(", "))
            }
            JsExpr::Object(entries) => {
                if entries.is_empty() {
                    return "{}".to_string();
                }
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("\"{}\": {}", escape_js_string(k), v.render()))
                    .collect();
                format!("{{ {} }}", parts.join(", "))
            }
            JsExpr::Call(callee, args) => {
                let parts: Vec<String> = args.iter().map(JsExpr::render).collect();
                format!("{}({})", callee.render(), parts.join(", "))
            }
            // Operands are always parenthesized; the source precedence is
            // already encoded in the tree shape.
            JsExpr::Binary(op, left, right) => {
                format!("({} {} {})", left.render(), op, right.render())
            }
            JsExpr::Ternary(cond, then, els) => {
                format!("({} ? {} : {})", cond.render(), then.render(), els.render())
            }
            JsExpr::Not(inner) => format!("!({})", inner.render()),
            JsExpr::Await(inner) => format!("await {}", inner.render()),
            JsExpr::Func {
                params,
                body,
                is_async,
            } => {
                let prefix = if *is_async { "async function" } else { "function" };
                format!(
                    "{} ({}) {{\n{}}}",
                    prefix,
                    params.join(", "),
                    render_stmts(body, 1)
                )
            }
            JsExpr::Raw(src) => src.clone(),
        }
    }
}

/// A JavaScript statement.
#[derive(Debug, Clone, PartialEq)]
pub enum JsStmt {
    Expr(JsExpr),
    Const(String, JsExpr),
    Let(String, JsExpr),
    Assign(JsExpr, JsExpr),
    If {
        cond: JsExpr,
        then: Vec<JsStmt>,
        els: Vec<JsStmt>,
    },
    ForOf {
        var: String,
        iter: JsExpr,
        body: Vec<JsStmt>,
    },
    Function {
        name: String,
        params: Vec<String>,
        body: Vec<JsStmt>,
        is_async: bool,
    },
    Return(Option<JsExpr>),
    Raw(String),
}

/// Serialize a statement list with two-space indentation per level.
pub fn render_stmts(stmts: &[JsStmt], indent: usize) -> String {
    let mut out = String::new();
    for stmt in stmts {
        render_stmt(stmt, indent, &mut out);
    }
    out
}

fn render_stmt(stmt: &JsStmt, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    match stmt {
        JsStmt::Expr(expr) => {
            let _ = writeln!(out, "{pad}{};", expr.render());
        }
        JsStmt::Const(name, value) => {
            let _ = writeln!(out, "{pad}const {name} = {};", value.render());
        }
        JsStmt::Let(name, value) => {
            let _ = writeln!(out, "{pad}let {name} = {};", value.render());
        }
        JsStmt::Assign(target, value) => {
            let _ = writeln!(out, "{pad}{} = {};", target.render(), value.render());
        }
        JsStmt::If { cond, then, els } => {
            let _ = writeln!(out, "{pad}if ({}) {{", cond.render());
            out.push_str(&render_stmts(then, indent + 1));
            if els.is_empty() {
                let _ = writeln!(out, "{pad}}}");
            } else {
                let _ = writeln!(out, "{pad}}} else {{");
                out.push_str(&render_stmts(els, indent + 1));
                let _ = writeln!(out, "{pad}}}");
            }
        }
        JsStmt::ForOf { var, iter, body } => {
            let _ = writeln!(out, "{pad}for (const {var} of {}) {{", iter.render());
            out.push_str(&render_stmts(body, indent + 1));
            let _ = writeln!(out, "{pad}}}");
        }
        JsStmt::Function {
            name,
            params,
            body,
            is_async,
        } => {
            let prefix = if *is_async { "async function" } else { "function" };
            let _ = writeln!(out, "{pad}{prefix} {name}({}) {{", params.join(", "));
            out.push_str(&render_stmts(body, indent + 1));
            let _ = writeln!(out, "{pad}}}");
        }
        JsStmt::Return(value) => match value {
            Some(expr) => {
                let _ = writeln!(out, "{pad}return {};", expr.render());
            }
            None => {
                let _ = writeln!(out, "{pad}return;");
            }
        },
        JsStmt::Raw(src) => {
            for line in src.lines() {
                let _ = writeln!(out, "{pad}{line}");
            }
        }
    }
}

/// Escape a string for inclusion in a double-quoted JS literal that itself
/// sits inside an inline `<script>` block.
pub fn escape_js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            // "</script>" inside an inline script would end the block early.
            '<' if chars.peek() == Some(&'/') => out.push_str("\\x3C"),
            _ => out.push(ch),
        }
    }
    out
}

fn render_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_literals() {
        assert_eq!(JsExpr::Num(3.0).render(), "3");
        assert_eq!(JsExpr::Num(1.5).render(), "1.5");
        assert_eq!(JsExpr::Bool(true).render(), "true");
        assert_eq!(JsExpr::Null.render(), "null");
        assert_eq!(JsExpr::str("a\"b").render(), "\"a\\\"b\"");
    }

    #[test]
    fn render_member_and_call() {
        let expr = JsExpr::ident("app")
            .member("trigger")
            .call(vec![JsExpr::str("x")]);
        assert_eq!(expr.render(), "app.trigger(\"x\")");
    }

    #[test]
    fn render_index() {
        let expr = JsExpr::ident("app")
            .member("nodes")
            .index(JsExpr::str("myBox"));
        assert_eq!(expr.render(), "app.nodes[\"myBox\"]");
    }

    #[test]
    fn render_binary_parenthesizes() {
        let expr = JsExpr::Binary(
            "+",
            Box::new(JsExpr::Num(1.0)),
            Box::new(JsExpr::Binary(
                "*",
                Box::new(JsExpr::Num(2.0)),
                Box::new(JsExpr::Num(3.0)),
            )),
        );
        assert_eq!(expr.render(), "(1 + (2 * 3))");
    }

    #[test]
    fn render_if_else() {
        let out = render_stmts(
            &[JsStmt::If {
                cond: JsExpr::ident("x"),
                then: vec![JsStmt::Expr(JsExpr::ident("a").call(vec![]))],
                els: vec![JsStmt::Expr(JsExpr::ident("b").call(vec![]))],
            }],
            0,
        );
        assert_eq!(out, "if (x) {\n  a();\n} else {\n  b();\n}\n");
    }

    #[test]
    fn render_for_of() {
        let out = render_stmts(
            &[JsStmt::ForOf {
                var: "item".to_string(),
                iter: JsExpr::ident("items"),
                body: vec![JsStmt::Expr(
                    JsExpr::ident("log").call(vec![JsExpr::ident("item")]),
                )],
            }],
            0,
        );
        assert_eq!(out, "for (const item of items) {\n  log(item);\n}\n");
    }

    #[test]
    fn render_async_function() {
        let out = render_stmts(
            &[JsStmt::Function {
                name: "go".to_string(),
                params: vec![],
                body: vec![JsStmt::Expr(JsExpr::Await(Box::new(
                    JsExpr::ident("app").member("wait").call(vec![JsExpr::Num(1000.0)]),
                )))],
                is_async: true,
            }],
            0,
        );
        assert_eq!(out, "async function go() {\n  await app.wait(1000);\n}\n");
    }

    #[test]
    fn escape_script_close() {
        assert_eq!(escape_js_string("</script>"), "\\x3C/script>");
        assert_eq!(escape_js_string("a<b"), "a<b");
    }
}
