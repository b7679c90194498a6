//! Abstract Syntax Tree for PSL.
//!
//! Elements are stored in a flat [`ElementArena`] and referenced by
//! [`ElementId`]; tree edges are carried by [`Child`]. Expressions and
//! actions are closed sum types so codegen can match exhaustively.

/// Index of an element in the [`ElementArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementId(pub usize);

/// Flat storage for every element in a program, in parse order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementArena {
    nodes: Vec<Element>,
}

impl ElementArena {
    pub fn alloc(&mut self, element: Element) -> ElementId {
        let id = ElementId(self.nodes.len());
        self.nodes.push(element);
        id
    }

    pub fn get(&self, id: ElementId) -> &Element {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A complete PSL program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub metadata: Vec<(String, Expr)>,
    pub globals: Vec<(String, Expr)>,
    pub functions: Vec<FunctionDef>,
    pub pages: Vec<PageDef>,
    pub components: Vec<ComponentDef>,
    pub media_queries: Vec<MediaQueryDef>,
    pub watchers: Vec<WatcherDef>,
    pub intervals: Vec<IntervalDef>,
    pub key_handlers: Vec<KeyHandlerDef>,
    pub swipe_handlers: Vec<SwipeHandlerDef>,
    pub statements: Vec<Stmt>,
    pub imports: Vec<String>,
    pub arena: ElementArena,
}

impl Program {
    pub fn component(&self, name: &str) -> Option<&ComponentDef> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn page(&self, name: &str) -> Option<&PageDef> {
        self.pages.iter().find(|p| p.name == name)
    }
}

/// A user function: `name(params) { actions }`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Action>,
}

/// A page: `name { elements }`. The first declared page is active at load.
#[derive(Debug, Clone, PartialEq)]
pub struct PageDef {
    pub name: String,
    pub children: Vec<Child>,
    pub padding: Option<Expr>,
    pub background: Option<Expr>,
}

/// A reusable element group: `component Name { elements }`.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDef {
    pub name: String,
    pub children: Vec<Child>,
}

/// A media-query block: `@name { key: value; ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaQueryDef {
    pub name: String,
    pub rules: Vec<(String, Expr)>,
}

/// `watch(name) { actions }` — runs when `name` is reassigned.
#[derive(Debug, Clone, PartialEq)]
pub struct WatcherDef {
    pub variable: String,
    pub body: Vec<Action>,
}

/// `every(duration) { actions }` — a fixed-period timer.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalDef {
    pub duration: Expr,
    pub body: Vec<Action>,
}

/// `key(name) { actions }` — a global keyboard binding.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyHandlerDef {
    pub key: String,
    pub body: Vec<Action>,
}

/// `swipe(direction) { actions }`.
#[derive(Debug, Clone, PartialEq)]
pub struct SwipeHandlerDef {
    pub direction: SwipeDirection,
    pub body: Vec<Action>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Left,
    Right,
    Up,
    Down,
}

impl SwipeDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SwipeDirection::Left => "left",
            SwipeDirection::Right => "right",
            SwipeDirection::Up => "up",
            SwipeDirection::Down => "down",
        }
    }
}

/// A source element. `name` resolves through a fixed tag table (or a
/// declared component) during codegen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub props: Vec<Property>,
    pub handlers: Vec<EventHandler>,
    pub children: Vec<Child>,
}

impl Element {
    pub fn prop(&self, key: &str) -> Option<&Expr> {
        self.props.iter().find(|p| p.key == key).map(|p| &p.value)
    }
}

/// One `key: expr;` entry in an element body; source order is preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: String,
    pub value: Expr,
}

/// A named event handler on an element.
#[derive(Debug, Clone, PartialEq)]
pub struct EventHandler {
    pub event: String,
    pub body: Vec<Action>,
}

/// A child slot inside a page, component, or element body.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Element(ElementId),
    If {
        cond: Expr,
        then: Vec<Child>,
        els: Vec<Child>,
    },
    For {
        var: String,
        iter: Expr,
        body: Vec<Child>,
    },
}

/// A PSL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Str(String),
    Number { value: f64, unit: Option<String> },
    Bool(bool),
    Var(String),
    Member { object: String, property: String },
    Array(Vec<Expr>),
    Object(Vec<(String, Expr)>),
    Binary { op: BinOp, left: Box<Expr>, right: Box<Expr> },
    Ternary { cond: Box<Expr>, then: Box<Expr>, els: Box<Expr> },
    Null,
}

impl Expr {
    pub fn number(value: f64) -> Self {
        Expr::Number { value, unit: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
}

impl BinOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::LtEq => "<=",
            BinOp::GtEq => ">=",
        }
    }
}

/// Where an assignment action writes.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    /// `name = expr;` — a global store variable.
    Var(String),
    /// `name.prop: expr;` — a registered element (or page) property.
    Member { object: String, property: String },
}

/// A statement inside a handler, watcher, interval, or key-handler body.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Assign {
        target: AssignTarget,
        value: Expr,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    If {
        cond: Expr,
        then: Vec<Action>,
        els: Vec<Action>,
    },
    /// `wait(duration) { body }` — a timed continuation of the enclosing
    /// handler only.
    Wait {
        duration: Expr,
        body: Vec<Action>,
    },
}

/// A top-level program statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Action(Action),
    For {
        var: String,
        iter: Expr,
        body: Vec<Stmt>,
    },
}
