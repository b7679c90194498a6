//! Parser for PSL.
//!
//! Recursive descent over the token stream with one token of lookahead plus
//! indexed peek-ahead. A required-token mismatch inside a mandatory structure
//! is fatal; unrecognized constructs at the top level and inside element
//! bodies are skipped so the rest of the program still parses.

use crate::ast::*;
use crate::error::CompileError;
use crate::token::{Token, TokenKind};

/// Element-body event handler names and the DOM events they bind to.
pub const EVENT_NAMES: [(&str, &str); 9] = [
    ("click", "click"),
    ("hover", "mouseenter"),
    ("change", "change"),
    ("focus", "focus"),
    ("blur", "blur"),
    ("submit", "submit"),
    ("dragstart", "dragstart"),
    ("dragend", "dragend"),
    ("drop", "drop"),
];

/// CSS color names that parse as string literals rather than variable
/// references when they appear bare in an expression.
const COLOR_NAMES: [&str; 24] = [
    "red", "green", "blue", "white", "black", "gray", "grey", "silver", "orange", "yellow",
    "purple", "pink", "brown", "cyan", "magenta", "teal", "navy", "maroon", "olive", "lime",
    "aqua", "coral", "gold", "transparent",
];

const POSITION_KEYWORDS: [&str; 5] = ["top", "bottom", "left", "right", "center"];

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(&mut self) -> Result<Program, CompileError> {
        let mut program = Program::default();

        while !self.is_at_end() {
            match self.peek().kind.clone() {
                TokenKind::Hash => self.parse_metadata(&mut program)?,
                TokenKind::At => self.parse_media_query(&mut program)?,
                TokenKind::Ident(name) => match name.as_str() {
                    "import" => self.parse_import(&mut program)?,
                    "key" if self.peek_at(1).kind == TokenKind::LParen => {
                        let handler = self.parse_key_handler()?;
                        program.key_handlers.push(handler);
                    }
                    "swipe" if self.peek_at(1).kind == TokenKind::LParen => {
                        let handler = self.parse_swipe_handler()?;
                        program.swipe_handlers.push(handler);
                    }
                    "watch" if self.peek_at(1).kind == TokenKind::LParen => {
                        let watcher = self.parse_watcher()?;
                        program.watchers.push(watcher);
                    }
                    "every" if self.peek_at(1).kind == TokenKind::LParen => {
                        let interval = self.parse_interval()?;
                        program.intervals.push(interval);
                    }
                    "component" if matches!(self.peek_at(1).kind, TokenKind::Ident(_)) => {
                        let component = self.parse_component(&mut program.arena)?;
                        program.components.push(component);
                    }
                    "state" if matches!(self.peek_at(1).kind, TokenKind::Ident(_)) => {
                        self.parse_state(&mut program)?;
                    }
                    "if" if self.peek_at(1).kind == TokenKind::LParen => {
                        let action = self.parse_if_action()?;
                        program.statements.push(Stmt::Action(action));
                    }
                    "for" if self.peek_at(1).kind == TokenKind::LParen => {
                        let stmt = self.parse_for_stmt()?;
                        program.statements.push(stmt);
                    }
                    "wait" if self.peek_at(1).kind == TokenKind::LParen => {
                        let action = self.parse_wait_action()?;
                        program.statements.push(Stmt::Action(action));
                    }
                    _ => self.parse_named_top_level(&mut program, &name)?,
                },
                TokenKind::Eof => break,
                _ => {
                    // Unrecognized top-level construct: skip and continue.
                    self.advance();
                }
            }
        }

        Ok(program)
    }

    /// `#key = expr;`
    fn parse_metadata(&mut self, program: &mut Program) -> Result<(), CompileError> {
        self.expect(TokenKind::Hash)?;
        let key = self.expect_ident()?;
        self.expect(TokenKind::Assign)?;
        let value = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;
        program.metadata.push((key, value));
        Ok(())
    }

    /// `import "path";` or `import name;`
    fn parse_import(&mut self, program: &mut Program) -> Result<(), CompileError> {
        self.advance(); // import
        let path = match self.peek().kind.clone() {
            TokenKind::Str(s) => {
                self.advance();
                s
            }
            TokenKind::Ident(s) => {
                self.advance();
                s
            }
            _ => {
                let t = self.peek();
                return Err(CompileError::parse(
                    format!("expected import path, found {}", t.kind.describe()),
                    t.line,
                    t.col,
                ));
            }
        };
        self.expect(TokenKind::Semicolon)?;
        program.imports.push(path);
        Ok(())
    }

    /// `@name { key: value; ... }`
    fn parse_media_query(&mut self, program: &mut Program) -> Result<(), CompileError> {
        self.expect(TokenKind::At)?;
        let name = self.expect_ident()?;
        self.expect(TokenKind::LBrace)?;
        let mut rules = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            let key = self.expect_ident()?;
            self.expect(TokenKind::Colon)?;
            let value = self.parse_expr()?;
            self.expect(TokenKind::Semicolon)?;
            rules.push((key, value));
        }
        self.expect(TokenKind::RBrace)?;
        program.media_queries.push(MediaQueryDef { name, rules });
        Ok(())
    }

    /// `key(name) { actions }`
    fn parse_key_handler(&mut self) -> Result<KeyHandlerDef, CompileError> {
        self.advance(); // key
        self.expect(TokenKind::LParen)?;
        let key = match self.peek().kind.clone() {
            TokenKind::Str(s) => {
                self.advance();
                s
            }
            TokenKind::Ident(s) => {
                self.advance();
                s
            }
            _ => {
                let t = self.peek();
                return Err(CompileError::parse(
                    format!("expected key name, found {}", t.kind.describe()),
                    t.line,
                    t.col,
                ));
            }
        };
        self.expect(TokenKind::RParen)?;
        let body = self.parse_action_block()?;
        Ok(KeyHandlerDef { key, body })
    }

    /// `swipe(direction) { actions }`
    fn parse_swipe_handler(&mut self) -> Result<SwipeHandlerDef, CompileError> {
        self.advance(); // swipe
        self.expect(TokenKind::LParen)?;
        let t = self.peek().clone();
        let direction = match &t.kind {
            TokenKind::Ident(s) => match s.as_str() {
                "left" => SwipeDirection::Left,
                "right" => SwipeDirection::Right,
                "up" => SwipeDirection::Up,
                "down" => SwipeDirection::Down,
                other => {
                    return Err(CompileError::parse(
                        format!("unknown swipe direction '{other}'"),
                        t.line,
                        t.col,
                    ));
                }
            },
            _ => {
                return Err(CompileError::parse(
                    format!("expected swipe direction, found {}", t.kind.describe()),
                    t.line,
                    t.col,
                ));
            }
        };
        self.advance();
        self.expect(TokenKind::RParen)?;
        let body = self.parse_action_block()?;
        Ok(SwipeHandlerDef { direction, body })
    }

    /// `watch(name) { actions }`
    fn parse_watcher(&mut self) -> Result<WatcherDef, CompileError> {
        self.advance(); // watch
        self.expect(TokenKind::LParen)?;
        let variable = self.expect_ident()?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_action_block()?;
        Ok(WatcherDef { variable, body })
    }

    /// `every(duration) { actions }`
    fn parse_interval(&mut self) -> Result<IntervalDef, CompileError> {
        self.advance(); // every
        self.expect(TokenKind::LParen)?;
        let duration = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_action_block()?;
        Ok(IntervalDef { duration, body })
    }

    /// `state name = expr;` — sugar for a global variable.
    fn parse_state(&mut self, program: &mut Program) -> Result<(), CompileError> {
        self.advance(); // state
        let name = self.expect_ident()?;
        self.expect(TokenKind::Assign)?;
        let value = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;
        program.globals.push((name, value));
        Ok(())
    }

    /// Dispatch for a top-level construct introduced by a bare identifier:
    /// function declaration, global assignment, page, component, or a
    /// top-level call statement.
    fn parse_named_top_level(
        &mut self,
        program: &mut Program,
        name: &str,
    ) -> Result<(), CompileError> {
        match self.peek_at(1).kind {
            TokenKind::LParen => {
                // A function declaration has the same shape as an element or
                // call up to the closing paren; scan past the balanced parens
                // to see whether a block follows.
                if self.block_follows_parens(self.pos + 1) {
                    let function = self.parse_function()?;
                    program.functions.push(function);
                } else {
                    let action = self.parse_call_action()?;
                    program.statements.push(Stmt::Action(action));
                }
                Ok(())
            }
            TokenKind::Assign => {
                self.advance(); // name
                self.advance(); // =
                let value = self.parse_expr()?;
                self.expect(TokenKind::Semicolon)?;
                program.globals.push((name.to_string(), value));
                Ok(())
            }
            TokenKind::LBrace => {
                let page = self.parse_page(&mut program.arena)?;
                program.pages.push(page);
                Ok(())
            }
            _ => {
                // Unrecognized: skip the identifier and continue.
                self.advance();
                Ok(())
            }
        }
    }

    /// From a `(` at `start`, scan past the balanced parens and report
    /// whether the next token is `{`.
    fn block_follows_parens(&self, start: usize) -> bool {
        let mut i = start;
        let mut depth = 0usize;
        while i < self.tokens.len() {
            match self.tokens[i].kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return matches!(
                            self.tokens.get(i + 1).map(|t| &t.kind),
                            Some(TokenKind::LBrace)
                        );
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            i += 1;
        }
        false
    }

    /// `name(params) { actions }`
    fn parse_function(&mut self) -> Result<FunctionDef, CompileError> {
        let name = self.expect_ident()?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) && !self.is_at_end() {
            params.push(self.expect_ident()?);
            if self.check(&TokenKind::Comma) {
                self.advance();
            }
        }
        self.expect(TokenKind::RParen)?;
        let body = self.parse_action_block()?;
        Ok(FunctionDef { name, params, body })
    }

    /// `name { elements }` with optional `padding:`/`bg:` page properties.
    fn parse_page(&mut self, arena: &mut ElementArena) -> Result<PageDef, CompileError> {
        let name = self.expect_ident()?;
        self.expect(TokenKind::LBrace)?;

        let mut page = PageDef {
            name,
            children: Vec::new(),
            padding: None,
            background: None,
        };

        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            match self.peek().kind.clone() {
                TokenKind::Ident(ref word)
                    if (word == "padding" || word == "bg")
                        && self.peek_at(1).kind == TokenKind::Colon =>
                {
                    self.advance();
                    self.advance();
                    let value = self.parse_expr()?;
                    self.expect(TokenKind::Semicolon)?;
                    if word == "padding" {
                        page.padding = Some(value);
                    } else {
                        page.background = Some(value);
                    }
                }
                _ => {
                    if let Some(child) = self.parse_child(arena)? {
                        page.children.push(child);
                    }
                }
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(page)
    }

    /// `component Name { elements }`
    fn parse_component(&mut self, arena: &mut ElementArena) -> Result<ComponentDef, CompileError> {
        self.advance(); // component
        let name = self.expect_ident()?;
        self.expect(TokenKind::LBrace)?;
        let mut children = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            if let Some(child) = self.parse_child(arena)? {
                children.push(child);
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(ComponentDef { name, children })
    }

    /// One child slot: an element, an `if`/`else` pair of element branches,
    /// or a `for` loop. Returns `None` when the construct was skipped.
    fn parse_child(&mut self, arena: &mut ElementArena) -> Result<Option<Child>, CompileError> {
        match self.peek().kind.clone() {
            TokenKind::Ident(name) => match name.as_str() {
                "if" if self.peek_at(1).kind == TokenKind::LParen => {
                    self.advance(); // if
                    self.expect(TokenKind::LParen)?;
                    let cond = self.parse_expr()?;
                    self.expect(TokenKind::RParen)?;
                    let then = self.parse_child_block(arena)?;
                    let els = if self.check_ident("else") {
                        self.advance();
                        self.parse_child_block(arena)?
                    } else {
                        Vec::new()
                    };
                    Ok(Some(Child::If { cond, then, els }))
                }
                "for" if self.peek_at(1).kind == TokenKind::LParen => {
                    self.advance(); // for
                    self.expect(TokenKind::LParen)?;
                    let var = self.expect_ident()?;
                    self.expect_keyword("in")?;
                    let iter = self.parse_expr()?;
                    self.expect(TokenKind::RParen)?;
                    let body = self.parse_child_block(arena)?;
                    Ok(Some(Child::For { var, iter, body }))
                }
                _ => {
                    let id = self.parse_element(arena)?;
                    Ok(Some(Child::Element(id)))
                }
            },
            _ => {
                // Not a child-shaped construct: skip one token.
                self.advance();
                Ok(None)
            }
        }
    }

    fn parse_child_block(
        &mut self,
        arena: &mut ElementArena,
    ) -> Result<Vec<Child>, CompileError> {
        self.expect(TokenKind::LBrace)?;
        let mut children = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            if let Some(child) = self.parse_child(arena)? {
                children.push(child);
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(children)
    }

    /// `name(optionalLiteral) { body }` — parens and body both optional.
    /// The direct string argument binds to `src` for `image`, `placeholder`
    /// for `input`, `text` for everything else.
    fn parse_element(&mut self, arena: &mut ElementArena) -> Result<ElementId, CompileError> {
        let name = self.expect_ident()?;
        let mut element = Element {
            name: name.clone(),
            ..Element::default()
        };

        if self.check(&TokenKind::LParen) {
            self.advance();
            if let TokenKind::Str(s) = self.peek().kind.clone() {
                self.advance();
                let key = match name.as_str() {
                    "image" => "src",
                    "input" => "placeholder",
                    _ => "text",
                };
                element.props.push(Property {
                    key: key.to_string(),
                    value: Expr::Str(s),
                });
            }
            self.expect(TokenKind::RParen)?;
        }

        if self.check(&TokenKind::LBrace) {
            self.advance();
            self.parse_element_body(arena, &mut element)?;
            self.expect(TokenKind::RBrace)?;
        }

        // A trailing semicolon after an element is allowed and ignored.
        if self.check(&TokenKind::Semicolon) {
            self.advance();
        }

        Ok(arena.alloc(element))
    }

    fn parse_element_body(
        &mut self,
        arena: &mut ElementArena,
        element: &mut Element,
    ) -> Result<(), CompileError> {
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            match self.peek().kind.clone() {
                TokenKind::Ident(word) => {
                    let next = self.peek_at(1).kind.clone();
                    let is_event = EVENT_NAMES.iter().any(|(name, _)| *name == word);
                    if is_event && next == TokenKind::LBrace {
                        self.advance();
                        let body = self.parse_action_block()?;
                        element.handlers.push(EventHandler { event: word, body });
                    } else if (word == "if" || word == "for") && next == TokenKind::LParen {
                        if let Some(child) = self.parse_child(arena)? {
                            element.children.push(child);
                        }
                    } else if next == TokenKind::Colon {
                        self.advance();
                        self.advance();
                        let value = self.parse_expr()?;
                        self.expect(TokenKind::Semicolon)?;
                        element.props.push(Property { key: word, value });
                    } else if next == TokenKind::Semicolon {
                        // Bare `key;` is a boolean-true property.
                        self.advance();
                        self.advance();
                        element.props.push(Property {
                            key: word,
                            value: Expr::Bool(true),
                        });
                    } else if next == TokenKind::LParen || next == TokenKind::LBrace {
                        let id = self.parse_element(arena)?;
                        element.children.push(Child::Element(id));
                    } else {
                        // Unrecognized element-body construct: skip it.
                        self.advance();
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
        Ok(())
    }

    // --- Actions ---

    fn parse_action_block(&mut self) -> Result<Vec<Action>, CompileError> {
        self.expect(TokenKind::LBrace)?;
        let mut actions = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            actions.push(self.parse_action()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(actions)
    }

    fn parse_action(&mut self) -> Result<Action, CompileError> {
        let t = self.peek().clone();
        let name = match &t.kind {
            TokenKind::Ident(s) => s.clone(),
            _ => {
                return Err(CompileError::parse(
                    format!("expected action, found {}", t.kind.describe()),
                    t.line,
                    t.col,
                ));
            }
        };

        match name.as_str() {
            "if" if self.peek_at(1).kind == TokenKind::LParen => self.parse_if_action(),
            "wait" if self.peek_at(1).kind == TokenKind::LParen => self.parse_wait_action(),
            _ => match self.peek_at(1).kind.clone() {
                TokenKind::LParen => self.parse_call_action(),
                TokenKind::Dot => {
                    self.advance(); // object
                    self.advance(); // .
                    let property = self.expect_ident()?;
                    let value = if self.check(&TokenKind::Colon) {
                        self.advance();
                        self.parse_expr()?
                    } else {
                        Expr::Bool(true)
                    };
                    self.expect(TokenKind::Semicolon)?;
                    Ok(Action::Assign {
                        target: AssignTarget::Member {
                            object: name,
                            property,
                        },
                        value,
                    })
                }
                TokenKind::Assign | TokenKind::Colon => {
                    self.advance(); // name
                    self.advance(); // = or :
                    let value = self.parse_expr()?;
                    self.expect(TokenKind::Semicolon)?;
                    Ok(Action::Assign {
                        target: AssignTarget::Var(name),
                        value,
                    })
                }
                TokenKind::Semicolon => {
                    self.advance();
                    self.advance();
                    Ok(Action::Assign {
                        target: AssignTarget::Var(name),
                        value: Expr::Bool(true),
                    })
                }
                _ => {
                    let t = self.peek_at(1).clone();
                    Err(CompileError::parse(
                        format!("unexpected {} after '{name}'", t.kind.describe()),
                        t.line,
                        t.col,
                    ))
                }
            },
        }
    }

    fn parse_if_action(&mut self) -> Result<Action, CompileError> {
        self.advance(); // if
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let then = self.parse_action_block()?;
        let els = if self.check_ident("else") {
            self.advance();
            self.parse_action_block()?
        } else {
            Vec::new()
        };
        Ok(Action::If { cond, then, els })
    }

    /// `wait(duration) { body }` or bare `wait(duration);`.
    fn parse_wait_action(&mut self) -> Result<Action, CompileError> {
        self.advance(); // wait
        self.expect(TokenKind::LParen)?;
        let duration = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let body = if self.check(&TokenKind::LBrace) {
            self.parse_action_block()?
        } else {
            self.expect(TokenKind::Semicolon)?;
            Vec::new()
        };
        Ok(Action::Wait { duration, body })
    }

    fn parse_call_action(&mut self) -> Result<Action, CompileError> {
        let name = self.expect_ident()?;
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        while !self.check(&TokenKind::RParen) && !self.is_at_end() {
            args.push(self.parse_expr()?);
            if self.check(&TokenKind::Comma) {
                self.advance();
            }
        }
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Action::Call { name, args })
    }

    /// Top-level `for (v in expr) { statements }`.
    fn parse_for_stmt(&mut self) -> Result<Stmt, CompileError> {
        self.advance(); // for
        self.expect(TokenKind::LParen)?;
        let var = self.expect_ident()?;
        self.expect_keyword("in")?;
        let iter = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::LBrace)?;
        let mut body = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            if self.check_ident("for") && self.peek_at(1).kind == TokenKind::LParen {
                body.push(self.parse_for_stmt()?);
            } else {
                body.push(Stmt::Action(self.parse_action()?));
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Stmt::For { var, iter, body })
    }

    // --- Expressions ---

    pub fn parse_expr(&mut self) -> Result<Expr, CompileError> {
        self.parse_ternary()
    }

    fn parse_ternary(&mut self) -> Result<Expr, CompileError> {
        let cond = self.parse_equality()?;
        if self.check(&TokenKind::Question) {
            self.advance();
            let then = self.parse_ternary()?;
            self.expect(TokenKind::Colon)?;
            let els = self.parse_ternary()?;
            return Ok(Expr::Ternary {
                cond: Box::new(cond),
                then: Box::new(then),
                els: Box::new(els),
            });
        }
        Ok(cond)
    }

    fn parse_equality(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::NotEq => BinOp::NotEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::LtEq => BinOp::LtEq,
                TokenKind::GtEq => BinOp::GtEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_primary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_primary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Expr, CompileError> {
        let t = self.peek().clone();
        match t.kind {
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Str(s))
            }
            TokenKind::Number(lit) => {
                self.advance();
                let (value, unit) = split_number_literal(&lit);
                Ok(Expr::Number { value, unit })
            }
            TokenKind::Minus => {
                // Negative literal; only numbers may follow a leading minus.
                self.advance();
                let t = self.peek().clone();
                if let TokenKind::Number(lit) = t.kind {
                    self.advance();
                    let (value, unit) = split_number_literal(&lit);
                    Ok(Expr::Number { value: -value, unit })
                } else {
                    Err(CompileError::parse(
                        format!("expected number after '-', found {}", t.kind.describe()),
                        t.line,
                        t.col,
                    ))
                }
            }
            TokenKind::LBracket => self.parse_array(),
            TokenKind::LBrace => self.parse_object(),
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Ident(name) => {
                self.advance();
                match name.as_str() {
                    "true" => Ok(Expr::Bool(true)),
                    "false" => Ok(Expr::Bool(false)),
                    "null" => Ok(Expr::Null),
                    _ => {
                        if self.check(&TokenKind::Dot)
                            && matches!(self.peek_at(1).kind, TokenKind::Ident(_))
                        {
                            self.advance();
                            let property = self.expect_ident()?;
                            Ok(Expr::Member {
                                object: name,
                                property,
                            })
                        } else if is_literal_word(&name) {
                            // A bare hex color, CSS color name, or position
                            // keyword is a string value, not a variable.
                            Ok(Expr::Str(name))
                        } else {
                            Ok(Expr::Var(name))
                        }
                    }
                }
            }
            _ => Err(CompileError::parse(
                format!("expected expression, found {}", t.kind.describe()),
                t.line,
                t.col,
            )),
        }
    }

    fn parse_array(&mut self) -> Result<Expr, CompileError> {
        self.expect(TokenKind::LBracket)?;
        let mut items = Vec::new();
        while !self.check(&TokenKind::RBracket) && !self.is_at_end() {
            items.push(self.parse_expr()?);
            if self.check(&TokenKind::Comma) {
                self.advance();
            }
        }
        self.expect(TokenKind::RBracket)?;
        Ok(Expr::Array(items))
    }

    fn parse_object(&mut self) -> Result<Expr, CompileError> {
        self.expect(TokenKind::LBrace)?;
        let mut entries = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            let key = match self.peek().kind.clone() {
                TokenKind::Ident(s) | TokenKind::Str(s) => {
                    self.advance();
                    s
                }
                _ => {
                    let t = self.peek();
                    return Err(CompileError::parse(
                        format!("expected object key, found {}", t.kind.describe()),
                        t.line,
                        t.col,
                    ));
                }
            };
            self.expect(TokenKind::Colon)?;
            let value = self.parse_expr()?;
            entries.push((key, value));
            if self.check(&TokenKind::Comma) {
                self.advance();
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Expr::Object(entries))
    }

    // --- Utility methods ---

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn advance(&mut self) -> &Token {
        let t = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len() || self.peek().kind == TokenKind::Eof
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn check_ident(&self, name: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Ident(s) if s == name)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&Token, CompileError> {
        if self.peek().kind == kind {
            Ok(self.advance())
        } else {
            let t = self.peek();
            Err(CompileError::parse(
                format!(
                    "expected {}, found {}",
                    kind.describe(),
                    t.kind.describe()
                ),
                t.line,
                t.col,
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<String, CompileError> {
        match self.peek().kind.clone() {
            TokenKind::Ident(s) => {
                self.advance();
                Ok(s)
            }
            _ => {
                let t = self.peek();
                Err(CompileError::parse(
                    format!("expected identifier, found {}", t.kind.describe()),
                    t.line,
                    t.col,
                ))
            }
        }
    }

    fn expect_keyword(&mut self, word: &str) -> Result<(), CompileError> {
        if self.check_ident(word) {
            self.advance();
            Ok(())
        } else {
            let t = self.peek();
            Err(CompileError::parse(
                format!("expected '{word}', found {}", t.kind.describe()),
                t.line,
                t.col,
            ))
        }
    }
}

/// Split a numeric literal into its value and optional unit suffix.
pub fn split_number_literal(lit: &str) -> (f64, Option<String>) {
    let idx = lit
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(lit.len());
    let value: f64 = lit[..idx].parse().unwrap_or(0.0);
    let unit = if idx < lit.len() {
        Some(lit[idx..].to_string())
    } else {
        None
    };
    (value, unit)
}

/// True when a bare identifier should be read as a literal string value: a
/// hex color, a known CSS color name, or a position keyword. `true`/`false`
/// are handled before this check.
fn is_literal_word(name: &str) -> bool {
    let is_hex = matches!(name.len(), 3 | 4 | 6 | 8)
        && name.chars().all(|c| c.is_ascii_hexdigit());
    is_hex || COLOR_NAMES.contains(&name) || POSITION_KEYWORDS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(src: &str) -> Result<Program, CompileError> {
        let tokens = Lexer::new(src).tokenize();
        Parser::new(tokens).parse()
    }

    fn parse_ok(src: &str) -> Program {
        parse(src).expect("parse failed")
    }

    #[test]
    fn parse_empty_program() {
        let prog = parse_ok("");
        assert!(prog.pages.is_empty());
        assert!(prog.globals.is_empty());
    }

    #[test]
    fn parse_is_deterministic() {
        let src = r#"
#title = "App";
x = 5;
home {
  title("Hi")
  box { width: 100; if (x > 2) { text("big") } }
}
watch(x) { log(x); }
"#;
        assert_eq!(parse_ok(src), parse_ok(src));
    }

    #[test]
    fn parse_metadata() {
        let prog = parse_ok("#title = \"My App\";\n#author = \"me\";");
        assert_eq!(prog.metadata.len(), 2);
        assert_eq!(prog.metadata[0].0, "title");
        assert_eq!(prog.metadata[0].1, Expr::Str("My App".to_string()));
    }

    #[test]
    fn parse_import() {
        let prog = parse_ok("import \"lib.psl\";\nimport widgets;");
        assert_eq!(prog.imports, vec!["lib.psl".to_string(), "widgets".to_string()]);
    }

    #[test]
    fn parse_global_variable() {
        let prog = parse_ok("count = 0;");
        assert_eq!(prog.globals.len(), 1);
        assert_eq!(prog.globals[0].0, "count");
        assert_eq!(prog.globals[0].1, Expr::number(0.0));
    }

    #[test]
    fn parse_state_is_global_sugar() {
        let a = parse_ok("state count = 0;");
        let b = parse_ok("count = 0;");
        assert_eq!(a.globals, b.globals);
    }

    #[test]
    fn parse_page_with_element() {
        let prog = parse_ok("home { title(\"Hi\") }");
        assert_eq!(prog.pages.len(), 1);
        assert_eq!(prog.pages[0].name, "home");
        assert_eq!(prog.pages[0].children.len(), 1);
        let Child::Element(id) = prog.pages[0].children[0] else {
            panic!("expected element child");
        };
        let el = prog.arena.get(id);
        assert_eq!(el.name, "title");
        assert_eq!(el.prop("text"), Some(&Expr::Str("Hi".to_string())));
    }

    #[test]
    fn parse_page_padding_and_bg() {
        let prog = parse_ok("home { padding: 32; bg: \"#eee\"; }");
        assert_eq!(prog.pages[0].padding, Some(Expr::number(32.0)));
        assert_eq!(prog.pages[0].background, Some(Expr::Str("#eee".to_string())));
    }

    #[test]
    fn parse_element_argument_binding() {
        let prog = parse_ok("home { image(\"a.png\") input(\"Name\") button(\"Go\") }");
        let els: Vec<_> = prog.pages[0]
            .children
            .iter()
            .map(|c| match c {
                Child::Element(id) => prog.arena.get(*id),
                _ => panic!("expected element"),
            })
            .collect();
        assert_eq!(els[0].prop("src"), Some(&Expr::Str("a.png".to_string())));
        assert_eq!(els[1].prop("placeholder"), Some(&Expr::Str("Name".to_string())));
        assert_eq!(els[2].prop("text"), Some(&Expr::Str("Go".to_string())));
    }

    #[test]
    fn parse_element_properties_and_flags() {
        let prog = parse_ok("home { box { width: 100; hide; var: \"b\"; } }");
        let Child::Element(id) = prog.pages[0].children[0] else {
            panic!("expected element");
        };
        let el = prog.arena.get(id);
        assert_eq!(el.prop("width"), Some(&Expr::number(100.0)));
        assert_eq!(el.prop("hide"), Some(&Expr::Bool(true)));
        assert_eq!(el.prop("var"), Some(&Expr::Str("b".to_string())));
    }

    #[test]
    fn parse_nested_elements() {
        let prog = parse_ok("home { row { box { } box { } } }");
        let Child::Element(row) = prog.pages[0].children[0] else {
            panic!("expected row");
        };
        assert_eq!(prog.arena.get(row).children.len(), 2);
    }

    #[test]
    fn parse_event_handler() {
        let prog = parse_ok("home { button(\"Go\") { click { count = 1; } } }");
        let Child::Element(id) = prog.pages[0].children[0] else {
            panic!("expected element");
        };
        let el = prog.arena.get(id);
        assert_eq!(el.handlers.len(), 1);
        assert_eq!(el.handlers[0].event, "click");
        assert_eq!(el.handlers[0].body.len(), 1);
    }

    #[test]
    fn parse_conditional_child() {
        let prog = parse_ok("home { if (flag) { title(\"Yes\") } else { title(\"No\") } }");
        let Child::If { cond, then, els } = &prog.pages[0].children[0] else {
            panic!("expected conditional child");
        };
        assert_eq!(cond, &Expr::Var("flag".to_string()));
        assert_eq!(then.len(), 1);
        assert_eq!(els.len(), 1);
    }

    #[test]
    fn parse_for_child() {
        let prog = parse_ok("home { for (item in items) { text(\"x\") } }");
        let Child::For { var, iter, body } = &prog.pages[0].children[0] else {
            panic!("expected for child");
        };
        assert_eq!(var, "item");
        assert_eq!(iter, &Expr::Var("items".to_string()));
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn parse_function_vs_call_disambiguation() {
        // A block after the balanced parens makes it a declaration.
        let prog = parse_ok("greet(name) { log(name); }");
        assert_eq!(prog.functions.len(), 1);
        assert_eq!(prog.functions[0].params, vec!["name".to_string()]);
        assert!(prog.statements.is_empty());

        // Without a block it is a top-level call statement.
        let prog = parse_ok("greet(\"hi\");");
        assert!(prog.functions.is_empty());
        assert_eq!(prog.statements.len(), 1);
        assert!(matches!(
            &prog.statements[0],
            Stmt::Action(Action::Call { name, .. }) if name == "greet"
        ));
    }

    #[test]
    fn parse_watcher() {
        let prog = parse_ok("watch(x) { log(x); }");
        assert_eq!(prog.watchers.len(), 1);
        assert_eq!(prog.watchers[0].variable, "x");
        assert_eq!(prog.watchers[0].body.len(), 1);
    }

    #[test]
    fn parse_interval() {
        let prog = parse_ok("every(2s) { tick = tick + 1; }");
        assert_eq!(prog.intervals.len(), 1);
        assert_eq!(
            prog.intervals[0].duration,
            Expr::Number {
                value: 2.0,
                unit: Some("s".to_string())
            }
        );
    }

    #[test]
    fn parse_key_handler() {
        let prog = parse_ok("key(Enter) { submitForm(); }");
        assert_eq!(prog.key_handlers.len(), 1);
        assert_eq!(prog.key_handlers[0].key, "Enter");
    }

    #[test]
    fn parse_swipe_handler() {
        let prog = parse_ok("swipe(left) { nextPage(); }");
        assert_eq!(prog.swipe_handlers.len(), 1);
        assert_eq!(prog.swipe_handlers[0].direction, SwipeDirection::Left);
    }

    #[test]
    fn parse_component() {
        let prog = parse_ok("component Card { box { text(\"hi\") } }");
        assert_eq!(prog.components.len(), 1);
        assert_eq!(prog.components[0].name, "Card");
        assert_eq!(prog.components[0].children.len(), 1);
    }

    #[test]
    fn parse_media_query() {
        let prog = parse_ok("@mobile { padding: 8; }");
        assert_eq!(prog.media_queries.len(), 1);
        assert_eq!(prog.media_queries[0].name, "mobile");
        assert_eq!(prog.media_queries[0].rules.len(), 1);
    }

    #[test]
    fn parse_dotted_assignment_action() {
        let prog = parse_ok("key(h) { myBox.hide: true; myBox.show; }");
        let body = &prog.key_handlers[0].body;
        assert_eq!(
            body[0],
            Action::Assign {
                target: AssignTarget::Member {
                    object: "myBox".to_string(),
                    property: "hide".to_string(),
                },
                value: Expr::Bool(true),
            }
        );
        assert_eq!(
            body[1],
            Action::Assign {
                target: AssignTarget::Member {
                    object: "myBox".to_string(),
                    property: "show".to_string(),
                },
                value: Expr::Bool(true),
            }
        );
    }

    #[test]
    fn parse_wait_action() {
        let prog = parse_ok("key(w) { wait(1s) { done = true; } wait(500ms); }");
        let body = &prog.key_handlers[0].body;
        assert!(matches!(&body[0], Action::Wait { body, .. } if body.len() == 1));
        assert!(matches!(&body[1], Action::Wait { body, .. } if body.is_empty()));
    }

    #[test]
    fn parse_nested_if_action() {
        let prog = parse_ok("key(a) { if (x > 1) { log(x); } else { x = 0; } }");
        let Action::If { then, els, .. } = &prog.key_handlers[0].body[0] else {
            panic!("expected if action");
        };
        assert_eq!(then.len(), 1);
        assert_eq!(els.len(), 1);
    }

    #[test]
    fn parse_expression_precedence() {
        let prog = parse_ok("x = 1 + 2 * 3;");
        let Expr::Binary { op, right, .. } = &prog.globals[0].1 else {
            panic!("expected binary expr");
        };
        assert_eq!(*op, BinOp::Add);
        assert!(matches!(**right, Expr::Binary { op: BinOp::Mul, .. }));
    }

    #[test]
    fn parse_comparison_binds_looser_than_additive() {
        let prog = parse_ok("x = a + 1 > b;");
        assert!(matches!(&prog.globals[0].1, Expr::Binary { op: BinOp::Gt, .. }));
    }

    #[test]
    fn parse_ternary_expression() {
        let prog = parse_ok("x = flag ? 1 : 2;");
        assert!(matches!(&prog.globals[0].1, Expr::Ternary { .. }));
    }

    #[test]
    fn parse_array_and_object_literals() {
        let prog = parse_ok("xs = [1, 2, 3];\nobj = { name: \"a\", n: 2 };");
        assert!(matches!(&prog.globals[0].1, Expr::Array(items) if items.len() == 3));
        assert!(matches!(&prog.globals[1].1, Expr::Object(entries) if entries.len() == 2));
    }

    #[test]
    fn parse_color_idents_become_strings() {
        let prog = parse_ok("a = red;\nb = ff0000;\nc = center;\nd = counter;");
        assert_eq!(prog.globals[0].1, Expr::Str("red".to_string()));
        assert_eq!(prog.globals[1].1, Expr::Str("ff0000".to_string()));
        assert_eq!(prog.globals[2].1, Expr::Str("center".to_string()));
        assert_eq!(prog.globals[3].1, Expr::Var("counter".to_string()));
    }

    #[test]
    fn parse_true_false_are_bools_not_strings() {
        let prog = parse_ok("a = true;\nb = false;");
        assert_eq!(prog.globals[0].1, Expr::Bool(true));
        assert_eq!(prog.globals[1].1, Expr::Bool(false));
    }

    #[test]
    fn parse_dotted_reference_expression() {
        let prog = parse_ok("x = user.name;");
        assert_eq!(
            prog.globals[0].1,
            Expr::Member {
                object: "user".to_string(),
                property: "name".to_string(),
            }
        );
    }

    #[test]
    fn parse_number_units_preserved() {
        let prog = parse_ok("a = 10px;\nb = 50%;\nc = 7;");
        assert_eq!(
            prog.globals[0].1,
            Expr::Number { value: 10.0, unit: Some("px".to_string()) }
        );
        assert_eq!(
            prog.globals[1].1,
            Expr::Number { value: 50.0, unit: Some("%".to_string()) }
        );
        assert_eq!(prog.globals[2].1, Expr::number(7.0));
    }

    #[test]
    fn parse_top_level_if_and_for() {
        let prog = parse_ok("if (x) { log(x); }\nfor (i in xs) { log(i); }");
        assert_eq!(prog.statements.len(), 2);
        assert!(matches!(&prog.statements[0], Stmt::Action(Action::If { .. })));
        assert!(matches!(&prog.statements[1], Stmt::For { .. }));
    }

    #[test]
    fn parse_top_level_wait() {
        let prog = parse_ok("wait(1s) { started = true; }");
        assert!(matches!(
            &prog.statements[0],
            Stmt::Action(Action::Wait { body, .. }) if body.len() == 1
        ));
    }

    #[test]
    fn parse_skips_unrecognized_top_level() {
        // A stray token stream before a valid page must not abort the parse.
        let prog = parse_ok("] ) ; home { title(\"Hi\") }");
        assert_eq!(prog.pages.len(), 1);
    }

    #[test]
    fn parse_skips_unrecognized_element_body_construct() {
        let prog = parse_ok("home { box { width: 10; ?? ; height: 20; } }");
        let Child::Element(id) = prog.pages[0].children[0] else {
            panic!("expected element");
        };
        let el = prog.arena.get(id);
        assert_eq!(el.prop("width"), Some(&Expr::number(10.0)));
        assert_eq!(el.prop("height"), Some(&Expr::number(20.0)));
    }

    #[test]
    fn parse_error_on_missing_required_token() {
        let err = parse("home { box { width 100; } }");
        // `width` with no `:` or `;` is skipped (tolerant), but a truncated
        // mandatory structure is fatal.
        assert!(err.is_ok());
        let err = parse("watch(x { log(x); }").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::ParseError);
        assert!(err.message.contains("expected ')'"), "message: {}", err.message);
    }

    #[test]
    fn parse_error_carries_position() {
        let err = parse("watch(\n  123) { }").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("identifier"));
    }
}
