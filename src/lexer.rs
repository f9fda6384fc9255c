use crate::ast::{BinOp, Token};
use crate::error::ParseError;

/// Hand-written scanner for expression text.
///
/// Identifiers are maximal runs of any characters except `( ) , . ! @`,
/// quotes, operator characters, and whitespace, so hyphenated names like
/// `date-range` scan as a single identifier.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    token_start: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            chars: input.chars().collect(),
            pos: 0,
            token_start: 0,
        }
    }

    /// Offset at which the most recently returned token started.
    pub fn offset(&self) -> usize {
        self.token_start
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    // Operator characters may appear inside an identifier once it has
    // started; only whitespace, quotes, and the structural delimiters end
    // it. That is what lets `date-range` scan as one name.
    fn is_identifier_char(c: char) -> bool {
        !c.is_whitespace() && !"(),.!@\"'".contains(c)
    }

    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
        self.token_start = self.pos;

        let Some(c) = self.bump() else {
            return Ok(Token::Eof);
        };

        match c {
            '(' => Ok(Token::LParen),
            ')' => Ok(Token::RParen),
            ',' => Ok(Token::Comma),
            '.' => Ok(Token::Hop {
                forward: true,
                is_array: self.eat('@'),
            }),
            '!' => Ok(Token::Hop {
                forward: false,
                is_array: self.eat('@'),
            }),
            '+' => Ok(Token::Op(BinOp::Add)),
            '-' => Ok(Token::Op(BinOp::Subtract)),
            '*' => Ok(Token::Op(BinOp::Multiply)),
            '/' => Ok(Token::Op(BinOp::Divide)),
            '=' => Ok(Token::Op(BinOp::Equal)),
            '<' => {
                if self.eat('=') {
                    Ok(Token::Op(BinOp::LessEqual))
                } else if self.eat('>') {
                    Ok(Token::Op(BinOp::NotEqual))
                } else {
                    Ok(Token::Op(BinOp::LessThan))
                }
            }
            '>' => {
                if self.eat('=') {
                    Ok(Token::Op(BinOp::GreaterEqual))
                } else if self.eat('<') {
                    Ok(Token::Op(BinOp::NotEqual))
                } else {
                    Ok(Token::Op(BinOp::GreaterThan))
                }
            }
            '"' | '\'' => self.scan_string(c),
            c if c.is_ascii_digit() => Ok(self.scan_number()),
            c if Self::is_identifier_char(c) => Ok(self.scan_identifier()),
            other => Err(ParseError::UnexpectedSyntax {
                found: other.to_string(),
                offset: self.token_start,
            }),
        }
    }

    fn scan_string(&mut self, quote: char) -> Result<Token, ParseError> {
        let mut s = String::new();
        loop {
            match self.bump() {
                None => return Err(ParseError::UnterminatedString(self.token_start)),
                Some(c) if c == quote => return Ok(Token::Str(s)),
                Some('\\') if self.peek() == Some(quote) => {
                    s.push(quote);
                    self.pos += 1;
                }
                Some(c) => s.push(c),
            }
        }
    }

    fn scan_number(&mut self) -> Token {
        let start = self.token_start;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        // A dot only joins the number when a digit follows; otherwise it
        // stays a hop operator.
        if self.peek() == Some('.')
            && self.chars.get(self.pos + 1).is_some_and(|c| c.is_ascii_digit())
        {
            self.pos += 1;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        Token::Number(text.parse().unwrap_or(f64::NAN))
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.token_start;
        while self.peek().is_some_and(Self::is_identifier_char) {
            self.pos += 1;
        }
        Token::Identifier(self.chars[start..self.pos].iter().collect())
    }
}
