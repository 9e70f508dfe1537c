//! Tokenizer for the rover control language.
//!
//! Single left-to-right pass with one character of lookahead and no
//! semantic knowledge. Newlines survive as statement separators; all other
//! whitespace and `//` comments are dropped. A bare `_` lexes straight to
//! the concatenation operator, and characters outside the language are
//! skipped silently — scripts in the field rely on that leniency.

use std::fmt;

/// Statement-leading keywords. Matching is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    For,
    If,
    ElseIf,
    Else,
    Set,
    Do,
    Write,
    Quit,
    Return,
}

impl Command {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::For => "For",
            Self::If => "If",
            Self::ElseIf => "ElseIf",
            Self::Else => "Else",
            Self::Set => "Set",
            Self::Do => "Do",
            Self::Write => "Write",
            Self::Quit => "Quit",
            Self::Return => "Return",
        }
    }

    #[must_use]
    pub fn from_ident(ident: &str) -> Option<Self> {
        match ident.to_ascii_lowercase().as_str() {
            "for" => Some(Self::For),
            "if" => Some(Self::If),
            "elseif" => Some(Self::ElseIf),
            "else" => Some(Self::Else),
            "set" => Some(Self::Set),
            "do" => Some(Self::Do),
            "write" => Some(Self::Write),
            "quit" => Some(Self::Quit),
            "return" => Some(Self::Return),
            _ => None,
        }
    }
}

/// Expression and statement operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Single `=`: assignment in `Set`, equality inside conditions.
    Assign,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Dot,
    /// Lexed from `_`.
    Concat,
}

impl Op {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Dot => ".",
            Self::Concat => "_",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Command(Command),
    /// Function-like identifier lexed from `%Name`; carries `Name`.
    Func(String),
    Ident(String),
    /// Raw literal text; numeric validation happens at generation.
    Number(String),
    Str(String),
    Op(Op),
    BlockStart,
    BlockEnd,
    ParenStart,
    ParenEnd,
    Comma,
    Colon,
    Newline,
}

impl TokenKind {
    /// Source-shaped text for error messages.
    #[must_use]
    pub fn display_text(&self) -> String {
        match self {
            Self::Command(c) => c.as_str().to_string(),
            Self::Func(name) => format!("%{name}"),
            Self::Ident(s) | Self::Number(s) => s.clone(),
            Self::Str(s) => format!("\"{s}\""),
            Self::Op(op) => op.as_str().to_string(),
            Self::BlockStart => String::from("{"),
            Self::BlockEnd => String::from("}"),
            Self::ParenStart => String::from("("),
            Self::ParenEnd => String::from(")"),
            Self::Comma => String::from(","),
            Self::Colon => String::from(":"),
            Self::Newline => String::from("\\n"),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub col: usize,
}

/// Tokenize a script. Never fails; unknown characters are dropped.
#[must_use]
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut line = 1;
    let mut col = 1;

    macro_rules! push {
        ($kind:expr, $col:expr) => {
            tokens.push(Token {
                kind: $kind,
                line,
                col: $col,
            })
        };
    }

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\r' => {
                chars.next();
                col += 1;
            }
            '\n' => {
                push!(TokenKind::Newline, col);
                chars.next();
                line += 1;
                col = 1;
            }
            '/' => {
                chars.next();
                col += 1;
                // Comment runs to end of line; the newline itself still
                // terminates the statement. A lone slash is not part of the
                // language and falls through the same silent-skip path.
                if chars.peek() == Some(&'/') {
                    while let Some(&cc) = chars.peek() {
                        if cc == '\n' {
                            break;
                        }
                        chars.next();
                        col += 1;
                    }
                }
            }
            '"' => {
                let start = col;
                chars.next();
                col += 1;
                let mut text = String::new();
                while let Some(&cc) = chars.peek() {
                    if cc == '"' {
                        chars.next();
                        col += 1;
                        break;
                    }
                    if cc == '\\' {
                        chars.next();
                        col += 1;
                        if chars.peek() == Some(&'"') {
                            text.push('"');
                            chars.next();
                            col += 1;
                            continue;
                        }
                        text.push('\\');
                        continue;
                    }
                    if cc == '\n' {
                        // Unterminated string; the newline stays significant.
                        break;
                    }
                    text.push(cc);
                    chars.next();
                    col += 1;
                }
                push!(TokenKind::Str(text), start);
            }
            '{' => {
                push!(TokenKind::BlockStart, col);
                chars.next();
                col += 1;
            }
            '}' => {
                push!(TokenKind::BlockEnd, col);
                chars.next();
                col += 1;
            }
            '(' => {
                push!(TokenKind::ParenStart, col);
                chars.next();
                col += 1;
            }
            ')' => {
                push!(TokenKind::ParenEnd, col);
                chars.next();
                col += 1;
            }
            ',' => {
                push!(TokenKind::Comma, col);
                chars.next();
                col += 1;
            }
            ':' => {
                push!(TokenKind::Colon, col);
                chars.next();
                col += 1;
            }
            '.' => {
                push!(TokenKind::Op(Op::Dot), col);
                chars.next();
                col += 1;
            }
            '_' => {
                push!(TokenKind::Op(Op::Concat), col);
                chars.next();
                col += 1;
            }
            '=' => {
                let start = col;
                chars.next();
                col += 1;
                if chars.peek() == Some(&'=') {
                    chars.next();
                    col += 1;
                    push!(TokenKind::Op(Op::Eq), start);
                } else {
                    push!(TokenKind::Op(Op::Assign), start);
                }
            }
            '<' => {
                let start = col;
                chars.next();
                col += 1;
                if chars.peek() == Some(&'=') {
                    chars.next();
                    col += 1;
                    push!(TokenKind::Op(Op::Le), start);
                } else {
                    push!(TokenKind::Op(Op::Lt), start);
                }
            }
            '>' => {
                let start = col;
                chars.next();
                col += 1;
                if chars.peek() == Some(&'=') {
                    chars.next();
                    col += 1;
                    push!(TokenKind::Op(Op::Ge), start);
                } else {
                    push!(TokenKind::Op(Op::Gt), start);
                }
            }
            '!' => {
                let start = col;
                chars.next();
                col += 1;
                if chars.peek() == Some(&'=') {
                    chars.next();
                    col += 1;
                    push!(TokenKind::Op(Op::Ne), start);
                }
            }
            '%' => {
                let start = col;
                chars.next();
                col += 1;
                let mut name = String::new();
                while let Some(&cc) = chars.peek() {
                    if cc.is_ascii_alphanumeric() {
                        name.push(cc);
                        chars.next();
                        col += 1;
                    } else {
                        break;
                    }
                }
                if !name.is_empty() {
                    push!(TokenKind::Func(name), start);
                }
            }
            '0'..='9' => {
                let start = col;
                let mut text = String::new();
                // Dots are consumed with the digits; malformed literals are
                // caught at generation, not here.
                while let Some(&cc) = chars.peek() {
                    if cc.is_ascii_digit() || cc == '.' {
                        text.push(cc);
                        chars.next();
                        col += 1;
                    } else {
                        break;
                    }
                }
                push!(TokenKind::Number(text), start);
            }
            c if c.is_ascii_alphabetic() => {
                let start = col;
                let mut ident = String::new();
                while let Some(&cc) = chars.peek() {
                    if cc.is_ascii_alphanumeric() {
                        ident.push(cc);
                        chars.next();
                        col += 1;
                    } else {
                        break;
                    }
                }
                let kind = Command::from_ident(&ident)
                    .map_or(TokenKind::Ident(ident), TokenKind::Command);
                push!(kind, start);
            }
            _ => {
                // Outside the language; dropped without complaint.
                chars.next();
                col += 1;
            }
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn keywords_match_case_insensitively() {
        assert_eq!(
            kinds("for FOR For doThing"),
            vec![
                TokenKind::Command(Command::For),
                TokenKind::Command(Command::For),
                TokenKind::Command(Command::For),
                TokenKind::Ident(String::from("doThing")),
            ]
        );
    }

    #[test]
    fn underscore_lexes_as_the_concat_operator() {
        assert_eq!(
            kinds(r#""fuel: "_fuel"#),
            vec![
                TokenKind::Str(String::from("fuel: ")),
                TokenKind::Op(Op::Concat),
                TokenKind::Ident(String::from("fuel")),
            ]
        );
    }

    #[test]
    fn strings_support_the_escaped_quote_only() {
        assert_eq!(
            kinds(r#""say \"hi\"" "a\b""#),
            vec![
                TokenKind::Str(String::from("say \"hi\"")),
                TokenKind::Str(String::from("a\\b")),
            ]
        );
    }

    #[test]
    fn comments_drop_but_newlines_survive() {
        assert_eq!(
            kinds("Do Move() // push on\nQuit"),
            vec![
                TokenKind::Command(Command::Do),
                TokenKind::Ident(String::from("Move")),
                TokenKind::ParenStart,
                TokenKind::ParenEnd,
                TokenKind::Newline,
                TokenKind::Command(Command::Quit),
            ]
        );
    }

    #[test]
    fn percent_names_become_function_like_tokens() {
        assert_eq!(
            kinds(r#"context.%Get("rover")"#),
            vec![
                TokenKind::Ident(String::from("context")),
                TokenKind::Op(Op::Dot),
                TokenKind::Func(String::from("Get")),
                TokenKind::ParenStart,
                TokenKind::Str(String::from("rover")),
                TokenKind::ParenEnd,
            ]
        );
    }

    #[test]
    fn two_char_operators_win_over_singles() {
        assert_eq!(
            kinds("<= >= == != < >"),
            vec![
                TokenKind::Op(Op::Le),
                TokenKind::Op(Op::Ge),
                TokenKind::Op(Op::Eq),
                TokenKind::Op(Op::Ne),
                TokenKind::Op(Op::Lt),
                TokenKind::Op(Op::Gt),
            ]
        );
    }

    #[test]
    fn number_text_is_kept_raw() {
        assert_eq!(
            kinds("1.5 10 1.2.3"),
            vec![
                TokenKind::Number(String::from("1.5")),
                TokenKind::Number(String::from("10")),
                TokenKind::Number(String::from("1.2.3")),
            ]
        );
    }

    #[test]
    fn unknown_characters_are_skipped_silently() {
        assert_eq!(
            kinds("Set x = 1 ;@#$"),
            vec![
                TokenKind::Command(Command::Set),
                TokenKind::Ident(String::from("x")),
                TokenKind::Op(Op::Assign),
                TokenKind::Number(String::from("1")),
            ]
        );
    }

    #[test]
    fn for_header_tokens_line_up() {
        assert_eq!(
            kinds("For i=1:1:5 {"),
            vec![
                TokenKind::Command(Command::For),
                TokenKind::Ident(String::from("i")),
                TokenKind::Op(Op::Assign),
                TokenKind::Number(String::from("1")),
                TokenKind::Colon,
                TokenKind::Number(String::from("1")),
                TokenKind::Colon,
                TokenKind::Number(String::from("5")),
                TokenKind::BlockStart,
            ]
        );
    }
}
