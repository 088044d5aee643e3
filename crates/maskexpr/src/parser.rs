//! Tokenizer and recursive-descent parser for flag expressions.
//!
//! Grammar, loosest-binding first:
//!
//! ```text
//! or    := and ("||" and)*
//! and   := unary ("&&" unary)*
//! unary := "!" unary | leaf
//! leaf  := identifier | "(" or ")"
//! ```
//!
//! `&&` and `||` chains are collected into single n-ary nodes as they are
//! parsed. The first error aborts; there is no recovery.

use crate::ast::AstNode;
use crate::error::{ExprError, Result};

/// Input tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Identifier(String),
    And,
    Or,
    Not,
    OpenParen,
    CloseParen,
    Eof,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Identifier(name) => write!(f, "identifier '{name}'"),
            Token::And => f.write_str("'&&'"),
            Token::Or => f.write_str("'||'"),
            Token::Not => f.write_str("'!'"),
            Token::OpenParen => f.write_str("'('"),
            Token::CloseParen => f.write_str("')'"),
            Token::Eof => f.write_str("end of input"),
        }
    }
}

/// Simple string tokenizer holding one token of lookahead.
struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    current: Token,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Result<Self> {
        let mut tokenizer = Tokenizer {
            input,
            pos: 0,
            current: Token::Eof,
        };
        tokenizer.advance()?;
        Ok(tokenizer)
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// Move to the next token.
    fn advance(&mut self) -> Result<()> {
        while let Some(c) = self.peek_char() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }

        let Some(c) = self.peek_char() else {
            self.current = Token::Eof;
            return Ok(());
        };

        if c.is_alphabetic() {
            let start = self.pos;
            while let Some(c) = self.peek_char() {
                if !c.is_alphanumeric() {
                    break;
                }
                self.pos += c.len_utf8();
            }
            self.current = Token::Identifier(self.input[start..self.pos].to_string());
            return Ok(());
        }

        let rest = &self.input[self.pos..];
        let (token, len) = if rest.starts_with("&&") {
            (Token::And, 2)
        } else if rest.starts_with("||") {
            (Token::Or, 2)
        } else {
            match c {
                '!' => (Token::Not, 1),
                '(' => (Token::OpenParen, 1),
                ')' => (Token::CloseParen, 1),
                _ => {
                    return Err(ExprError::Syntax(format!(
                        "unknown character '{c}' at offset {}",
                        self.pos
                    )))
                }
            }
        };
        self.pos += len;
        self.current = token;
        Ok(())
    }
}

/// Parse an expression string into a syntax tree.
pub fn parse(input: &str) -> Result<AstNode> {
    let mut parser = Parser {
        tokenizer: Tokenizer::new(input)?,
    };
    let node = parser.parse_or()?;
    if parser.tokenizer.current != Token::Eof {
        return Err(ExprError::Syntax(format!(
            "expected end of input, not {}",
            parser.tokenizer.current
        )));
    }
    Ok(node)
}

struct Parser<'a> {
    tokenizer: Tokenizer<'a>,
}

impl Parser<'_> {
    fn parse_or(&mut self) -> Result<AstNode> {
        let lhs = self.parse_and()?;
        if self.tokenizer.current != Token::Or {
            return Ok(lhs);
        }
        let mut operands = vec![lhs];
        while self.tokenizer.current == Token::Or {
            self.tokenizer.advance()?;
            operands.push(self.parse_and()?);
        }
        Ok(AstNode::or(operands))
    }

    fn parse_and(&mut self) -> Result<AstNode> {
        let lhs = self.parse_unary()?;
        if self.tokenizer.current != Token::And {
            return Ok(lhs);
        }
        let mut operands = vec![lhs];
        while self.tokenizer.current == Token::And {
            self.tokenizer.advance()?;
            operands.push(self.parse_unary()?);
        }
        Ok(AstNode::and(operands))
    }

    fn parse_unary(&mut self) -> Result<AstNode> {
        if self.tokenizer.current == Token::Not {
            self.tokenizer.advance()?;
            return Ok(AstNode::not(self.parse_unary()?));
        }
        self.parse_leaf()
    }

    fn parse_leaf(&mut self) -> Result<AstNode> {
        match &self.tokenizer.current {
            Token::Identifier(name) => {
                let node = AstNode::identifier(name.clone());
                self.tokenizer.advance()?;
                Ok(node)
            }
            Token::OpenParen => {
                self.tokenizer.advance()?;
                let node = self.parse_or()?;
                if self.tokenizer.current != Token::CloseParen {
                    return Err(ExprError::Syntax(format!(
                        "expected ')', not {}",
                        self.tokenizer.current
                    )));
                }
                self.tokenizer.advance()?;
                Ok(node)
            }
            other => Err(ExprError::Syntax(format!(
                "unexpected {other} in input stream"
            ))),
        }
    }
}
