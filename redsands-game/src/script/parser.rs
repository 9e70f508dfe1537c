//! Recursive-descent generation from tokens to a [`Routine`].
//!
//! One rule per command keyword. Generation is all-or-nothing: any error
//! aborts and no partial routine escapes. Structure (block/paren balance,
//! statement heads) is the validator's job and is not re-checked here.
//!
//! The single `=` token is context-sensitive: assignment in `Set`,
//! equality inside `If`/`ElseIf` conditions. The distinction is carried by
//! the active grammar rule, never by token lookahead across statements.

use thiserror::Error;

use crate::script::ast::{AccessorOp, BinOp, Call, Expr, IfArm, Primitive, Routine, Stmt};
use crate::script::lexer::{Command, Op, Token, TokenKind};

/// Errors that abort generation, naming the offending token.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenerateError {
    #[error("unexpected end of script")]
    UnexpectedEnd,
    #[error("unexpected `{found}` at token {index}")]
    UnexpectedToken { index: usize, found: String },
    #[error("`Do` must invoke a routine or accessor at token {index}")]
    DoWithoutCall { index: usize },
    #[error("unknown routine call `{name}` at token {index}")]
    UnknownCall { index: usize, name: String },
    #[error("unknown accessor method `%{name}` at token {index}")]
    UnknownAccessor { index: usize, name: String },
    #[error("%{name} expects {expected} argument(s), got {found} at token {index}")]
    AccessorArity {
        index: usize,
        name: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("malformed number literal `{text}` at token {index}")]
    MalformedNumber { index: usize, text: String },
    #[error("`For` step must be a positive number at token {index}")]
    NonPositiveStep { index: usize },
    #[error("unsupported member access at token {index}; only %Get and %Set are available")]
    UnsupportedMember { index: usize },
}

/// Generate an executable routine from a validated token stream.
///
/// # Errors
///
/// Returns a [`GenerateError`] naming the offending token; nothing partial
/// is ever produced.
pub fn generate(tokens: &[Token]) -> Result<Routine, GenerateError> {
    let mut parser = Parser { tokens, pos: 0 };
    parser.skip_newlines();

    let routine = if parser.at_class_method_head() {
        parser.parse_class_method()?
    } else {
        Routine {
            name: None,
            context_param: Routine::DEFAULT_CONTEXT_PARAM.to_string(),
            body: parser.parse_statements(false)?,
        }
    };

    parser.skip_newlines();
    match parser.peek_index() {
        None => Ok(routine),
        Some(index) => Err(parser.unexpected(index)),
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn peek_index(&self) -> Option<usize> {
        (self.pos < self.tokens.len()).then_some(self.pos)
    }

    fn advance(&mut self) -> Option<&'a TokenKind> {
        let kind = self.peek();
        if kind.is_some() {
            self.pos += 1;
        }
        kind
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek(), Some(TokenKind::Newline)) {
            self.pos += 1;
        }
    }

    fn unexpected(&self, index: usize) -> GenerateError {
        self.tokens.get(index).map_or(GenerateError::UnexpectedEnd, |t| {
            GenerateError::UnexpectedToken {
                index,
                found: t.kind.display_text(),
            }
        })
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), GenerateError> {
        if self.peek() == Some(kind) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(self.pos))
        }
    }

    fn expect_ident(&mut self) -> Result<String, GenerateError> {
        match self.peek() {
            Some(TokenKind::Ident(name)) => {
                self.pos += 1;
                Ok(name.clone())
            }
            _ => Err(self.unexpected(self.pos)),
        }
    }

    fn at_class_method_head(&self) -> bool {
        matches!(self.peek(), Some(TokenKind::Ident(name)) if name.eq_ignore_ascii_case("classmethod"))
    }

    /// `ClassMethod Name(param ...) { body }`: the signature is discarded
    /// except for the first parameter name, which becomes the routine's
    /// context binding.
    fn parse_class_method(&mut self) -> Result<Routine, GenerateError> {
        self.advance();
        let name = self.expect_ident()?;
        self.expect(&TokenKind::ParenStart)?;

        let mut context_param = None;
        let mut depth = 1usize;
        while depth > 0 {
            match self.advance() {
                Some(TokenKind::ParenStart) => depth += 1,
                Some(TokenKind::ParenEnd) => depth -= 1,
                Some(TokenKind::Ident(param)) => {
                    if context_param.is_none() {
                        context_param = Some(param.clone());
                    }
                }
                Some(_) => {}
                None => return Err(GenerateError::UnexpectedEnd),
            }
        }

        self.skip_newlines();
        let body = self.parse_block()?;
        Ok(Routine {
            name: Some(name),
            context_param: context_param
                .unwrap_or_else(|| Routine::DEFAULT_CONTEXT_PARAM.to_string()),
            body,
        })
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, GenerateError> {
        self.expect(&TokenKind::BlockStart)?;
        let body = self.parse_statements(true)?;
        self.expect(&TokenKind::BlockEnd)?;
        Ok(body)
    }

    fn parse_statements(&mut self, in_block: bool) -> Result<Vec<Stmt>, GenerateError> {
        let mut stmts = Vec::new();
        loop {
            self.skip_newlines();
            match self.peek() {
                None => {
                    if in_block {
                        return Err(GenerateError::UnexpectedEnd);
                    }
                    return Ok(stmts);
                }
                Some(TokenKind::BlockEnd) if in_block => return Ok(stmts),
                _ => stmts.push(self.parse_stmt()?),
            }
        }
    }

    fn parse_stmt(&mut self) -> Result<Stmt, GenerateError> {
        match self.peek() {
            Some(TokenKind::Command(Command::Set)) => self.parse_set(),
            Some(TokenKind::Command(Command::Do)) => {
                self.advance();
                let index = self.pos;
                match self.parse_postfix(false)? {
                    Expr::Call(call) => Ok(Stmt::Do(call)),
                    _ => Err(GenerateError::DoWithoutCall { index }),
                }
            }
            Some(TokenKind::Command(Command::Write)) => {
                self.advance();
                Ok(Stmt::Write(self.parse_expr(false)?))
            }
            Some(TokenKind::Command(Command::Quit | Command::Return)) => {
                self.advance();
                Ok(Stmt::Quit)
            }
            Some(TokenKind::Command(Command::If)) => self.parse_if(),
            Some(TokenKind::Command(Command::For)) => self.parse_for(),
            _ => Err(self.unexpected(self.pos)),
        }
    }

    fn parse_set(&mut self) -> Result<Stmt, GenerateError> {
        self.advance();
        let name = self.expect_ident()?;
        self.expect(&TokenKind::Op(Op::Assign))?;
        let expr = self.parse_expr(false)?;
        Ok(Stmt::Set { name, expr })
    }

    /// `If` / `ElseIf` chains become a flat arm list so each condition is
    /// evaluated at most once and in source order.
    fn parse_if(&mut self) -> Result<Stmt, GenerateError> {
        self.advance();
        let mut arms = vec![IfArm {
            cond: self.parse_expr(true)?,
            body: self.parse_block()?,
        }];
        let mut fallback = None;

        loop {
            self.skip_newlines();
            match self.peek() {
                Some(TokenKind::Command(Command::ElseIf)) => {
                    self.advance();
                    arms.push(IfArm {
                        cond: self.parse_expr(true)?,
                        body: self.parse_block()?,
                    });
                }
                Some(TokenKind::Command(Command::Else)) => {
                    self.advance();
                    self.skip_newlines();
                    fallback = Some(self.parse_block()?);
                    break;
                }
                _ => break,
            }
        }

        Ok(Stmt::If { arms, fallback })
    }

    /// `For v=start:step:end { body }`. A literal non-positive step can
    /// never terminate and is rejected outright.
    fn parse_for(&mut self) -> Result<Stmt, GenerateError> {
        self.advance();
        let var = self.expect_ident()?;
        self.expect(&TokenKind::Op(Op::Assign))?;
        let start = self.parse_expr(false)?;
        self.expect(&TokenKind::Colon)?;
        let step_index = self.pos;
        let step = self.parse_expr(false)?;
        self.expect(&TokenKind::Colon)?;
        let end = self.parse_expr(false)?;
        let body = self.parse_block()?;

        if let Expr::Num(n) = step
            && n <= 0.0
        {
            return Err(GenerateError::NonPositiveStep { index: step_index });
        }

        Ok(Stmt::For {
            var,
            start,
            step,
            end,
            body,
        })
    }

    fn parse_expr(&mut self, in_condition: bool) -> Result<Expr, GenerateError> {
        let mut lhs = self.parse_concat(in_condition)?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Op(Op::Eq)) => BinOp::Eq,
                // A bare `=` reads as equality only inside a condition.
                Some(TokenKind::Op(Op::Assign)) if in_condition => BinOp::Eq,
                Some(TokenKind::Op(Op::Ne)) => BinOp::Ne,
                Some(TokenKind::Op(Op::Lt)) => BinOp::Lt,
                Some(TokenKind::Op(Op::Le)) => BinOp::Le,
                Some(TokenKind::Op(Op::Gt)) => BinOp::Gt,
                Some(TokenKind::Op(Op::Ge)) => BinOp::Ge,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_concat(in_condition)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_concat(&mut self, in_condition: bool) -> Result<Expr, GenerateError> {
        let mut lhs = self.parse_postfix(in_condition)?;
        while matches!(self.peek(), Some(TokenKind::Op(Op::Concat))) {
            self.advance();
            let rhs = self.parse_postfix(in_condition)?;
            lhs = Expr::Binary {
                op: BinOp::Concat,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    /// Postfix chains: `target.%Get(k)` / `target.%Set(k, v)` are rewritten
    /// to the accessor's reserved operations; any other member is refused.
    fn parse_postfix(&mut self, in_condition: bool) -> Result<Expr, GenerateError> {
        let mut expr = self.parse_primary(in_condition)?;
        while matches!(self.peek(), Some(TokenKind::Op(Op::Dot))) {
            self.advance();
            let index = self.pos;
            match self.advance() {
                Some(TokenKind::Func(name)) => {
                    let (op, expected, label) = match name.to_ascii_lowercase().as_str() {
                        "get" => (AccessorOp::Get, 1, "Get"),
                        "set" => (AccessorOp::Set, 2, "Set"),
                        _ => {
                            return Err(GenerateError::UnknownAccessor {
                                index,
                                name: name.clone(),
                            });
                        }
                    };
                    self.expect(&TokenKind::ParenStart)?;
                    let args = self.parse_args()?;
                    if args.len() != expected {
                        return Err(GenerateError::AccessorArity {
                            index,
                            name: label,
                            expected,
                            found: args.len(),
                        });
                    }
                    expr = Expr::Call(Call::Accessor {
                        target: Box::new(expr),
                        op,
                        args,
                    });
                }
                Some(TokenKind::Ident(_)) => {
                    return Err(GenerateError::UnsupportedMember { index });
                }
                _ => return Err(self.unexpected(index)),
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self, in_condition: bool) -> Result<Expr, GenerateError> {
        let index = self.pos;
        match self.advance() {
            Some(TokenKind::Number(text)) => text.parse().map(Expr::Num).map_err(|_| {
                GenerateError::MalformedNumber {
                    index,
                    text: text.clone(),
                }
            }),
            Some(TokenKind::Str(text)) => Ok(Expr::Str(text.clone())),
            Some(TokenKind::Ident(name)) => {
                if matches!(self.peek(), Some(TokenKind::ParenStart)) {
                    let Some(primitive) = Primitive::from_name(name) else {
                        return Err(GenerateError::UnknownCall {
                            index,
                            name: name.clone(),
                        });
                    };
                    self.advance();
                    let args = self.parse_args()?;
                    Ok(Expr::Call(Call::Bridge { primitive, args }))
                } else {
                    Ok(Expr::Ident(name.clone()))
                }
            }
            Some(TokenKind::ParenStart) => {
                let expr = self.parse_expr(in_condition)?;
                self.expect(&TokenKind::ParenEnd)?;
                Ok(expr)
            }
            Some(_) => Err(self.unexpected(index)),
            None => Err(GenerateError::UnexpectedEnd),
        }
    }

    /// Comma-separated argument expressions; the closing paren is consumed.
    fn parse_args(&mut self) -> Result<Vec<Expr>, GenerateError> {
        let mut args = Vec::new();
        if matches!(self.peek(), Some(TokenKind::ParenEnd)) {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr(false)?);
            match self.peek() {
                Some(TokenKind::Comma) => {
                    self.advance();
                }
                Some(TokenKind::ParenEnd) => {
                    self.advance();
                    return Ok(args);
                }
                _ => return Err(self.unexpected(self.pos)),
            }
        }
    }
}
