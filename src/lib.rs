//! PSL compiler — declarative UI source → AST → self-contained HTML document.

pub mod ast;
pub mod boilerplate;
pub mod codegen;
pub mod error;
pub mod js;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::*;
pub use error::CompileError;

use lexer::Lexer;
use parser::Parser;

/// The PSL compiler.
///
/// Parses source text through lexer → parser → AST, then generates a single
/// HTML document carrying the markup, styles, and behavior script.
pub struct Compiler;

impl Compiler {
    /// Parse PSL source into a Program AST.
    pub fn parse(source: &str) -> Result<Program, CompileError> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize();
        let mut parser = Parser::new(tokens);
        parser.parse()
    }

    /// Parse and compile PSL source into an HTML document.
    pub fn compile(source: &str) -> Result<String, CompileError> {
        let program = Self::parse(source)?;
        codegen::generate(&program)
    }
}
