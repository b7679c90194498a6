//! Code generation: Program AST → one self-contained HTML document.
//!
//! The document is assembled from fixed boilerplate plus four generated
//! parts: title, style rules, per-page markup, and the behavior script.
//! Element identifiers are handed out by a pre-order counter, so identical
//! input always produces byte-identical output.

mod markup;
mod script;
mod style;

use crate::ast::{Expr, Program};
use crate::boilerplate;
use crate::error::CompileError;

pub struct Codegen<'a> {
    program: &'a Program,
    next_id: usize,
    /// Element names registered via the `var` property, in parse order.
    registry: Vec<String>,
}

/// Generate the output document for a program.
pub fn generate(program: &Program) -> Result<String, CompileError> {
    Codegen::new(program).render_document()
}

impl<'a> Codegen<'a> {
    fn new(program: &'a Program) -> Self {
        let registry = collect_registry(program);
        Self {
            program,
            next_id: 0,
            registry,
        }
    }

    fn render_document(&mut self) -> Result<String, CompileError> {
        let mut out = String::from(boilerplate::DOC_OPEN);

        out.push_str(&format!("<title>{}</title>\n", escape_html(&self.title())));
        for (key, value) in &self.program.metadata {
            if key == "title" {
                continue;
            }
            out.push_str(&format!(
                "<meta name=\"{}\" content=\"{}\">\n",
                escape_html(key),
                escape_html(&style::static_value(value))
            ));
        }

        out.push_str("<style>\n");
        out.push_str(boilerplate::BASE_STYLES);
        out.push_str(&self.media_query_rules());
        out.push_str("</style>\n</head>\n<body>\n");

        out.push_str(boilerplate::RUNTIME_PRELUDE);

        for (index, page) in self.program.pages.iter().enumerate() {
            out.push_str(&self.render_page(page, index == 0)?);
        }

        out.push_str("<script>\n");
        out.push_str(&self.global_script()?);
        out.push_str("</script>\n");
        out.push_str(boilerplate::OFFLINE_CACHE);
        out.push_str("</body>\n</html>\n");
        Ok(out)
    }

    fn title(&self) -> String {
        self.program
            .metadata
            .iter()
            .find(|(key, _)| key == "title")
            .map(|(_, value)| style::static_value(value))
            .unwrap_or_else(|| "PSL App".to_string())
    }

    fn media_query_rules(&self) -> String {
        let mut out = String::new();
        for query in &self.program.media_queries {
            let condition = match query.name.as_str() {
                "mobile" => "(max-width: 767px)".to_string(),
                "tablet" => "(min-width: 768px) and (max-width: 1024px)".to_string(),
                "desktop" => "(min-width: 1025px)".to_string(),
                other => format!("({other})"),
            };
            out.push_str(&format!("@media {condition} {{\n  body {{\n"));
            for (key, value) in &query.rules {
                for decl in style::css_decls(key, value) {
                    out.push_str(&format!("    {decl};\n"));
                }
            }
            out.push_str("  }\n}\n");
        }
        out
    }

    /// Next element identifier; assigned in pre-order during rendering.
    fn fresh_id(&mut self) -> String {
        let id = format!("el{}", self.next_id);
        self.next_id += 1;
        id
    }
}

fn collect_registry(program: &Program) -> Vec<String> {
    let mut names = Vec::new();
    for index in 0..program.arena.len() {
        let element = program.arena.get(crate::ast::ElementId(index));
        if let Some(Expr::Str(name)) = element.prop("var") {
            names.push(name.clone());
        }
    }
    names
}

/// Escape text for HTML content and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn compile(src: &str) -> String {
        let tokens = Lexer::new(src).tokenize();
        let program = Parser::new(tokens).parse().expect("parse failed");
        generate(&program).expect("codegen failed")
    }

    #[test]
    fn document_skeleton() {
        let html = compile("home { title(\"Hi\") }");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.ends_with("</html>\n"));
        assert!(html.contains("<title>PSL App</title>"));
        assert!(html.contains("serviceWorker"));
    }

    #[test]
    fn metadata_title_and_meta_tags() {
        let html = compile("#title = \"Notes\";\n#author = \"ada\";\nhome { }");
        assert!(html.contains("<title>Notes</title>"));
        assert!(html.contains("<meta name=\"author\" content=\"ada\">"));
        assert!(!html.contains("<meta name=\"title\""));
    }

    #[test]
    fn title_is_html_escaped() {
        let html = compile("#title = \"a < b\";\nhome { }");
        assert!(html.contains("<title>a &lt; b</title>"));
    }

    #[test]
    fn identical_input_identical_output() {
        let src = "x = 1;\nhome { box { width: 10; } button(\"Go\") { click { x = 2; } } }";
        assert_eq!(compile(src), compile(src));
    }

    #[test]
    fn media_query_breakpoints() {
        let html = compile("@mobile { padding: 8; }\n@wide { gap: 4; }\nhome { }");
        assert!(html.contains("@media (max-width: 767px)"));
        assert!(html.contains("padding: 8px;"));
        assert!(html.contains("@media (wide)"));
    }
}
