//! Structural validation of a token stream before generation.
//!
//! One pass, no semantic knowledge. Generation assumes a stream that passed
//! here and never re-checks structure.

use thiserror::Error;

use crate::script::lexer::{Token, TokenKind};

/// Structural problems surfaced with the offending token index.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("unexpected `}}` at token {index}")]
    UnexpectedBlockEnd { index: usize },
    #[error("{count} unclosed block(s) at end of script")]
    UnclosedBlock { count: usize },
    #[error("unexpected `)` at token {index}")]
    UnexpectedParenEnd { index: usize },
    #[error("unclosed parenthesis in statement ending at token {index}")]
    UnclosedParen { index: usize },
    #[error("unknown command `{found}` at token {index}")]
    UnknownCommand { index: usize, found: String },
    #[error("statement begins with operator `{found}` at token {index}")]
    LeadingOperator { index: usize, found: String },
}

/// Reject token streams whose block or paren structure cannot generate.
///
/// # Errors
///
/// Returns the first structural violation found, carrying the token index.
pub fn validate(tokens: &[Token]) -> Result<(), SyntaxError> {
    let mut block_depth = 0usize;
    let mut paren_depth = 0usize;
    let mut at_statement_start = true;

    for (index, token) in tokens.iter().enumerate() {
        match &token.kind {
            TokenKind::Newline => {
                if paren_depth > 0 {
                    return Err(SyntaxError::UnclosedParen { index });
                }
                at_statement_start = true;
            }
            TokenKind::BlockStart => {
                block_depth += 1;
                at_statement_start = true;
            }
            TokenKind::BlockEnd => {
                if paren_depth > 0 {
                    return Err(SyntaxError::UnclosedParen { index });
                }
                if block_depth == 0 {
                    return Err(SyntaxError::UnexpectedBlockEnd { index });
                }
                block_depth -= 1;
                at_statement_start = true;
            }
            TokenKind::ParenStart => {
                leading_check(tokens, index, at_statement_start)?;
                at_statement_start = false;
                paren_depth += 1;
            }
            TokenKind::ParenEnd => {
                if paren_depth == 0 {
                    return Err(SyntaxError::UnexpectedParenEnd { index });
                }
                paren_depth -= 1;
            }
            _ => {
                leading_check(tokens, index, at_statement_start)?;
                at_statement_start = false;
            }
        }
    }

    if paren_depth > 0 {
        return Err(SyntaxError::UnclosedParen {
            index: tokens.len().saturating_sub(1),
        });
    }
    if block_depth > 0 {
        return Err(SyntaxError::UnclosedBlock { count: block_depth });
    }
    Ok(())
}

/// A statement may open with a command keyword or the `ClassMethod` wrapper
/// head; anything else is rejected here so generation never sees it.
fn leading_check(
    tokens: &[Token],
    index: usize,
    at_statement_start: bool,
) -> Result<(), SyntaxError> {
    if !at_statement_start {
        return Ok(());
    }
    match &tokens[index].kind {
        TokenKind::Command(_) => Ok(()),
        TokenKind::Ident(name) if name.eq_ignore_ascii_case("classmethod") => Ok(()),
        TokenKind::Op(op) => Err(SyntaxError::LeadingOperator {
            index,
            found: op.as_str().to_string(),
        }),
        other => Err(SyntaxError::UnknownCommand {
            index,
            found: other.display_text(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::lexer::tokenize;

    fn check(source: &str) -> Result<(), SyntaxError> {
        validate(&tokenize(source))
    }

    #[test]
    fn accepts_well_formed_programs() {
        check("For i=1:1:5 { Do Move() }").unwrap();
        check("If x=1 { Do Move() } Else { Quit }").unwrap();
        check("ClassMethod Pilot(ctx) {\n Set x = 1\n Write x\n}").unwrap();
    }

    #[test]
    fn rejects_unbalanced_blocks() {
        assert_eq!(
            check("If x=1 { Do Move()"),
            Err(SyntaxError::UnclosedBlock { count: 1 })
        );
        assert!(matches!(
            check("Do Move() }"),
            Err(SyntaxError::UnexpectedBlockEnd { .. })
        ));
    }

    #[test]
    fn rejects_parens_left_open_at_statement_end() {
        assert!(matches!(
            check("Do Move(\nQuit"),
            Err(SyntaxError::UnclosedParen { .. })
        ));
        assert!(matches!(
            check("Do Move())"),
            Err(SyntaxError::UnexpectedParenEnd { .. })
        ));
    }

    #[test]
    fn rejects_unknown_leading_commands() {
        assert_eq!(
            check("Move()"),
            Err(SyntaxError::UnknownCommand {
                index: 0,
                found: String::from("Move"),
            })
        );
        assert_eq!(
            check("Do Move()\nLaunch x"),
            Err(SyntaxError::UnknownCommand {
                index: 5,
                found: String::from("Launch"),
            })
        );
    }

    #[test]
    fn rejects_statements_opening_with_an_operator() {
        assert_eq!(
            check("= 5"),
            Err(SyntaxError::LeadingOperator {
                index: 0,
                found: String::from("="),
            })
        );
    }

    #[test]
    fn block_delimiters_reset_the_statement_boundary() {
        // `Else` right after `}` is a fresh statement head.
        check("If x=1 { Quit } ElseIf x=2 { Quit } Else { Quit }").unwrap();
    }
}
