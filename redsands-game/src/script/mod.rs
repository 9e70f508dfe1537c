//! The rover control language pipeline.
//!
//! Source text flows one way: [`lexer::tokenize`] → [`validate::validate`]
//! → [`parser::generate`] → a [`Routine`] the interpreter executes against
//! the rover bridge. [`compile`] runs the whole pipeline; validation always
//! completes before generation is attempted.

pub mod ast;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod validate;

use thiserror::Error;

pub use ast::{AccessorOp, BinOp, Call, Expr, IfArm, Primitive, Routine, Stmt};
pub use interp::{RoverApi, RuntimeFault, run};
pub use lexer::{Command, Op, Token, TokenKind, tokenize};
pub use parser::{GenerateError, generate};
pub use validate::{SyntaxError, validate};

/// Any failure turning source text into a routine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompileError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
}

/// Compile script source into an executable routine.
///
/// # Errors
///
/// Returns a [`CompileError`] when the script is structurally invalid or
/// cannot be generated. Nothing partial is ever returned.
pub fn compile(source: &str) -> Result<Routine, CompileError> {
    let tokens = tokenize(source);
    validate(&tokens)?;
    Ok(generate(&tokens)?)
}
