//! Recursive-descent parser for expression text.
//!
//! Grammar, loosest to tightest binding:
//!
//! ```text
//! expression     := sub-expression (comparison-op sub-expression)*
//! sub-expression := term (("+" | "-") term)*
//! term           := factor (("*" | "/") factor)*
//! factor         := number | string | path | control-call
//!                 | function-call | "(" expression ")"
//! path           := identifier? (hop identifier)+  |  identifier
//! hop            := "." | "!" | ".@" | "!@"
//! ```
//!
//! A bare identifier is a path whose root variable is that identifier.
//! Control names are reserved: `if` followed by anything but `(` is a
//! parse error, not a path.

use crate::ast::{BinOp, Control, Expression, Token};
use crate::error::ParseError;
use crate::lexer::Lexer;
use crate::path::Path;

pub struct Parser {
    lexer: Lexer,
    token: Token,
    offset: usize,
}

impl Parser {
    /// Parse one complete expression; trailing input is an error.
    pub fn parse(input: &str) -> Result<Expression, ParseError> {
        let mut parser = Parser::start(input)?;
        let expr = parser.parse_expression()?;
        if parser.token != Token::Eof {
            return Err(ParseError::TrailingInput(parser.offset));
        }
        Ok(expr)
    }

    /// Parse a comma-separated list of expressions.
    pub fn parse_several(input: &str) -> Result<Vec<Expression>, ParseError> {
        let mut parser = Parser::start(input)?;
        let mut expressions = vec![parser.parse_expression()?];
        while parser.token == Token::Comma {
            parser.advance()?;
            expressions.push(parser.parse_expression()?);
        }
        if parser.token != Token::Eof {
            return Err(ParseError::TrailingInput(parser.offset));
        }
        Ok(expressions)
    }

    fn start(input: &str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(input);
        let token = lexer.next_token()?;
        let offset = lexer.offset();
        Ok(Parser {
            lexer,
            token,
            offset,
        })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.token = self.lexer.next_token()?;
        self.offset = self.lexer.offset();
        Ok(())
    }

    fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_sub_expression()?;
        while let Token::Op(op) = self.token {
            if !matches!(
                op,
                BinOp::Equal
                    | BinOp::NotEqual
                    | BinOp::LessThan
                    | BinOp::GreaterThan
                    | BinOp::LessEqual
                    | BinOp::GreaterEqual
            ) {
                break;
            }
            self.advance()?;
            let right = self.parse_sub_expression()?;
            expr = Expression::Operator {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn parse_sub_expression(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_term()?;
        while let Token::Op(op) = self.token {
            if !matches!(op, BinOp::Add | BinOp::Subtract) {
                break;
            }
            self.advance()?;
            let right = self.parse_term()?;
            expr = Expression::Operator {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn parse_term(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_factor()?;
        while let Token::Op(op) = self.token {
            if !matches!(op, BinOp::Multiply | BinOp::Divide) {
                break;
            }
            self.advance()?;
            let right = self.parse_factor()?;
            expr = Expression::Operator {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn parse_factor(&mut self) -> Result<Expression, ParseError> {
        match self.token.clone() {
            Token::Number(n) => {
                self.advance()?;
                Ok(Expression::number(n))
            }
            Token::Str(s) => {
                self.advance()?;
                Ok(Expression::text(s))
            }
            Token::Hop { .. } => {
                let path = self.parse_path(Path::new())?;
                Ok(Expression::Path(path))
            }
            Token::Identifier(name) => {
                let name_offset = self.offset;
                self.advance()?;
                if let Some(control) = Control::from_name(&name) {
                    if self.token != Token::LParen {
                        return Err(ParseError::MissingParenStart {
                            name,
                            offset: name_offset,
                        });
                    }
                    let args = self.parse_arguments(&name)?;
                    Ok(Expression::Control { control, args })
                } else if self.token == Token::LParen {
                    let args = self.parse_arguments(&name)?;
                    Ok(Expression::Function { name, args })
                } else {
                    let mut path = Path::new();
                    path.set_root_name(name);
                    let path = self.parse_path(path)?;
                    Ok(Expression::Path(path))
                }
            }
            Token::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                if self.token != Token::RParen {
                    return Err(ParseError::MissingParen {
                        name: "(".to_string(),
                        offset: self.offset,
                    });
                }
                self.advance()?;
                Ok(expr)
            }
            Token::Eof | Token::RParen | Token::Comma => {
                Err(ParseError::MissingFactor(self.offset))
            }
            other => Err(ParseError::UnexpectedSyntax {
                found: format!("{other:?}"),
                offset: self.offset,
            }),
        }
    }

    /// Parse `( expr, ..., expr )` after a control or function name.
    fn parse_arguments(&mut self, name: &str) -> Result<Vec<Expression>, ParseError> {
        self.advance()?; // consume (
        let mut args = Vec::new();
        if self.token != Token::RParen {
            args.push(self.parse_expression()?);
            while self.token == Token::Comma {
                self.advance()?;
                args.push(self.parse_expression()?);
            }
        }
        if self.token != Token::RParen {
            return Err(ParseError::MissingParen {
                name: name.to_string(),
                offset: self.offset,
            });
        }
        self.advance()?;
        Ok(args)
    }

    /// Consume `(hop identifier)*` continuing the given path.
    fn parse_path(&mut self, mut path: Path) -> Result<Path, ParseError> {
        while let Token::Hop { forward, is_array } = self.token {
            self.advance()?;
            let Token::Identifier(property) = self.token.clone() else {
                return Err(ParseError::MissingPropertyId(self.offset));
            };
            path.append_segment(property, forward, is_array);
            self.advance()?;
        }
        Ok(path)
    }
}
