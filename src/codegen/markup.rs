//! Markup rendering: pages, elements, conditional branches, and loop
//! templates.

use crate::ast::{Child, ElementId, Expr, PageDef};
use crate::error::CompileError;
use crate::js::{render_stmts, JsExpr, JsStmt};
use crate::parser::EVENT_NAMES;

use super::script::Scope;
use super::{escape_html, style, Codegen};

/// Fixed element-name → tag table. Unknown names render as `div`.
fn tag_for(name: &str) -> &'static str {
    match name {
        "title" => "h1",
        "subtitle" => "h2",
        "text" => "p",
        "box" | "row" | "column" => "div",
        "button" => "button",
        "input" => "input",
        "image" => "img",
        "link" => "a",
        "list" => "ul",
        "item" => "li",
        "divider" => "hr",
        _ => "div",
    }
}

fn is_void(tag: &str) -> bool {
    matches!(tag, "img" | "input" | "hr" | "br")
}

/// State threaded through one markup rendering pass.
#[derive(Clone)]
pub(super) struct RenderCtx {
    /// Resolved page padding, used for bare base-position offsets.
    pub padding: String,
    /// Loop variable whose references become template placeholder tokens.
    pub loop_var: Option<String>,
    /// Components currently being expanded; breaks reference cycles.
    components: Vec<String>,
}

impl<'a> Codegen<'a> {
    pub(super) fn render_page(
        &mut self,
        page: &PageDef,
        active: bool,
    ) -> Result<String, CompileError> {
        let padding = page
            .padding
            .as_ref()
            .map(style::length)
            .unwrap_or_else(|| "20px".to_string());
        let background = page
            .background
            .as_ref()
            .map(style::color)
            .unwrap_or_else(|| "#ffffff".to_string());

        let class = if active { "page active" } else { "page" };
        let mut out = format!(
            "<div class=\"{class}\" data-page=\"{}\" style=\"padding: {padding}; background-color: {background};\">\n",
            escape_html(&page.name)
        );

        let ctx = RenderCtx {
            padding,
            loop_var: None,
            components: Vec::new(),
        };
        for child in &page.children {
            out.push_str(&self.render_child(child, &ctx)?);
        }
        out.push_str("</div>\n");
        Ok(out)
    }

    pub(super) fn render_child(
        &mut self,
        child: &Child,
        ctx: &RenderCtx,
    ) -> Result<String, CompileError> {
        match child {
            Child::Element(id) => self.render_element(*id, ctx),
            Child::If { cond, then, els } => self.render_if(cond, then, els, ctx),
            Child::For { var, iter, body } => self.render_for(var, iter, body, ctx),
        }
    }

    fn render_element(&mut self, id: ElementId, ctx: &RenderCtx) -> Result<String, CompileError> {
        let element = self.program.arena.get(id).clone();

        // A name matching a declared component splices the component's
        // element list in place of the reference.
        if let Some(component) = self.program.component(&element.name) {
            if ctx.components.contains(&element.name) {
                return Err(CompileError::codegen(
                    format!("component '{}' expands itself", element.name),
                    0,
                    0,
                ));
            }
            let mut inner = ctx.clone();
            inner.components.push(element.name.clone());
            let children = component.children.clone();
            let mut out = String::new();
            for child in &children {
                out.push_str(&self.render_child(child, &inner)?);
            }
            return Ok(out);
        }

        let tag = tag_for(&element.name);
        let dom_id = self.fresh_id();
        let resolved = style::resolve_element(&element, &ctx.padding);

        let mut open = format!("<{tag} id=\"{dom_id}\"");
        if !resolved.styles.is_empty() {
            open.push_str(&format!(" style=\"{};\"", resolved.styles.join("; ")));
        }
        for (name, value) in &resolved.attrs {
            open.push_str(&format!(" {name}=\"{}\"", escape_html(value)));
        }
        open.push('>');

        let mut out = String::new();
        if is_void(tag) {
            out.push_str(&open);
            out.push('\n');
        } else {
            out.push_str(&open);
            if let Some(text) = &resolved.text {
                out.push_str(&self.render_text(text, ctx));
            }
            if element.children.is_empty() {
                out.push_str(&format!("</{tag}>\n"));
            } else {
                out.push('\n');
                for child in &element.children {
                    out.push_str(&self.render_child(child, ctx)?);
                }
                out.push_str(&format!("</{tag}>\n"));
            }
        }

        if let Some(wrapper) = resolved.wrapper {
            out = format!(
                "<div style=\"display: flex; justify-content: {wrapper};\">\n{out}</div>\n"
            );
        }

        // Registration and listeners attach immediately after the markup.
        let mut stmts: Vec<JsStmt> = Vec::new();
        if let Some(var_name) = &resolved.var_name {
            stmts.push(JsStmt::Assign(
                JsExpr::ident("app")
                    .member("nodes")
                    .index(JsExpr::str(var_name.clone())),
                get_element(&dom_id),
            ));
        }
        for handler in &element.handlers {
            let event = EVENT_NAMES
                .iter()
                .find(|(name, _)| *name == handler.event)
                .map(|(_, dom)| *dom)
                .unwrap_or(handler.event.as_str());
            let scope = Scope::default();
            let body = self.actions_to_js(&handler.body, &scope);
            let is_async = super::script::contains_wait(&handler.body);
            stmts.push(JsStmt::Expr(
                get_element(&dom_id).member("addEventListener").call(vec![
                    JsExpr::str(event),
                    JsExpr::Func {
                        params: vec!["event".to_string()],
                        body,
                        is_async,
                    },
                ]),
            ));
        }
        if !stmts.is_empty() {
            out.push_str(&script_block(&stmts));
        }

        Ok(out)
    }

    /// Both branches render into hidden containers; a load-time script
    /// evaluates the condition once and reveals exactly one of them.
    fn render_if(
        &mut self,
        cond: &Expr,
        then: &[Child],
        els: &[Child],
        ctx: &RenderCtx,
    ) -> Result<String, CompileError> {
        let then_id = self.fresh_id();
        let mut out = format!("<div id=\"{then_id}\" style=\"display: none;\">\n");
        for child in then {
            out.push_str(&self.render_child(child, ctx)?);
        }
        out.push_str("</div>\n");

        let else_id = self.fresh_id();
        out.push_str(&format!("<div id=\"{else_id}\" style=\"display: none;\">\n"));
        for child in els {
            out.push_str(&self.render_child(child, ctx)?);
        }
        out.push_str("</div>\n");

        let scope = Scope::default();
        let reveal = |id: &str| {
            JsStmt::Assign(
                get_element(id).member("style").member("display"),
                JsExpr::str(""),
            )
        };
        let body = vec![JsStmt::If {
            cond: self.expr_to_js(cond, &scope),
            then: vec![reveal(&then_id)],
            els: vec![reveal(&else_id)],
        }];
        out.push_str(&script_block(&[on_loaded(body)]));
        Ok(out)
    }

    /// One template instance with the loop variable replaced by a
    /// placeholder token; a load-time script evaluates the collection and
    /// inserts one textual substitution per item into the anchor.
    fn render_for(
        &mut self,
        var: &str,
        iter: &Expr,
        body: &[Child],
        ctx: &RenderCtx,
    ) -> Result<String, CompileError> {
        let anchor_id = self.fresh_id();
        let mut template = String::new();
        let mut inner = ctx.clone();
        inner.loop_var = Some(var.to_string());
        for child in body {
            template.push_str(&self.render_child(child, &inner)?);
        }

        let token = placeholder_token(var);
        let scope = Scope::default();
        let load = vec![
            JsStmt::Const("tpl".to_string(), JsExpr::str(template)),
            JsStmt::Const("anchor".to_string(), get_element(&anchor_id)),
            JsStmt::ForOf {
                var: var.to_string(),
                iter: self.expr_to_js(iter, &scope),
                body: vec![JsStmt::Expr(
                    JsExpr::ident("anchor").member("insertAdjacentHTML").call(vec![
                        JsExpr::str("beforeend"),
                        JsExpr::ident("tpl")
                            .member("split")
                            .call(vec![JsExpr::str(token)])
                            .member("join")
                            .call(vec![
                                JsExpr::ident("String").call(vec![JsExpr::ident(var)]),
                            ]),
                    ]),
                )],
            },
        ];

        let mut out = format!("<div id=\"{anchor_id}\"></div>\n");
        out.push_str(&script_block(&[on_loaded(load)]));
        Ok(out)
    }

    /// Text content with `{name}` segments replaced by reactive placeholder
    /// markers, or by the loop placeholder token inside a for template.
    fn render_text(&mut self, expr: &Expr, ctx: &RenderCtx) -> String {
        match expr {
            Expr::Str(s) => {
                let mut out = String::new();
                let mut rest = s.as_str();
                while let Some(start) = rest.find('{') {
                    out.push_str(&escape_html(&rest[..start]));
                    let after = &rest[start + 1..];
                    match after.find('}') {
                        Some(end) if is_ident(&after[..end]) => {
                            out.push_str(&self.binding(&after[..end], ctx));
                            rest = &after[end + 1..];
                        }
                        _ => {
                            out.push_str(&escape_html("{"));
                            rest = after;
                        }
                    }
                }
                out.push_str(&escape_html(rest));
                out
            }
            Expr::Var(name) => self.binding(name, ctx),
            other => escape_html(&style::static_value(other)),
        }
    }

    fn binding(&self, name: &str, ctx: &RenderCtx) -> String {
        if ctx.loop_var.as_deref() == Some(name) {
            placeholder_token(name)
        } else {
            format!("<span data-bind=\"{}\"></span>", escape_html(name))
        }
    }
}

fn placeholder_token(var: &str) -> String {
    format!("__{var}__")
}

fn is_ident(s: &str) -> bool {
    !s.is_empty()
        && s.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn get_element(id: &str) -> JsExpr {
    JsExpr::ident("document")
        .member("getElementById")
        .call(vec![JsExpr::str(id)])
}

/// Defer a script until the document has loaded; the global script (store
/// initialization included) runs first.
fn on_loaded(body: Vec<JsStmt>) -> JsStmt {
    JsStmt::Expr(
        JsExpr::ident("window").member("addEventListener").call(vec![
            JsExpr::str("DOMContentLoaded"),
            JsExpr::Func {
                params: vec![],
                body,
                is_async: false,
            },
        ]),
    )
}

fn script_block(stmts: &[JsStmt]) -> String {
    format!("<script>\n{}</script>\n", render_stmts(stmts, 0))
}
