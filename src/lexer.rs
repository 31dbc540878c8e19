use crate::error::{InterpError, Span};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    // Single-character tokens
    Plus,
    Minus,
    Star,
    Slash,
    LeftParen,
    RightParen,
    Dot,
    Semicolon,
    Comma,
    Colon,

    // Two-character tokens
    Assign,

    // Literals
    Identifier,
    Integer,
    Real,

    // Keywords
    Begin,
    End,
    Program,
    Var,
    IntegerType,
    RealType,

    // Special
    Eof,
}

impl TokenType {
    /// How the token kind is spelled in diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            TokenType::Plus => "'+'",
            TokenType::Minus => "'-'",
            TokenType::Star => "'*'",
            TokenType::Slash => "'/'",
            TokenType::LeftParen => "'('",
            TokenType::RightParen => "')'",
            TokenType::Dot => "'.'",
            TokenType::Semicolon => "';'",
            TokenType::Comma => "','",
            TokenType::Colon => "':'",
            TokenType::Assign => "':='",
            TokenType::Identifier => "identifier",
            TokenType::Integer => "integer",
            TokenType::Real => "real number",
            TokenType::Begin => "'BEGIN'",
            TokenType::End => "'END'",
            TokenType::Program => "'PROGRAM'",
            TokenType::Var => "'VAR'",
            TokenType::IntegerType => "'INTEGER'",
            TokenType::RealType => "'REAL'",
            TokenType::Eof => "end of input",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Numeric value carried by literal tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    None,
    Integer(i64),
    Real(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub literal: Literal,
    pub span: Span,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: String, span: Span) -> Self {
        Self {
            token_type,
            lexeme,
            literal: Literal::None,
            span,
        }
    }

    pub fn with_literal(mut self, literal: Literal) -> Self {
        self.literal = literal;
        self
    }

    /// The integer value of an `Integer` token.
    pub fn integer(&self) -> Option<i64> {
        match self.literal {
            Literal::Integer(value) => Some(value),
            _ => None,
        }
    }
}

fn keywords() -> HashMap<&'static str, TokenType> {
    let mut keywords = HashMap::new();
    keywords.insert("BEGIN", TokenType::Begin);
    keywords.insert("END", TokenType::End);
    keywords.insert("PROGRAM", TokenType::Program);
    keywords.insert("VAR", TokenType::Var);
    keywords.insert("INTEGER", TokenType::IntegerType);
    keywords.insert("REAL", TokenType::RealType);
    keywords
}

/// On-demand tokenizer. Each call to [`Lexer::next_token`] scans exactly one
/// token; once the input is exhausted it keeps returning `Eof`.
pub struct Lexer {
    chars: Vec<char>,
    start: usize,
    current: usize,
    keywords: HashMap<&'static str, TokenType>,
    done: bool,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            start: 0,
            current: 0,
            keywords: keywords(),
            done: false,
        }
    }

    /// Scan the whole input eagerly. The result always ends with one `Eof`.
    pub fn scan_tokens(&mut self) -> Result<Vec<Token>, InterpError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.token_type == TokenType::Eof;
            tokens.push(token);
            if is_eof {
                return Ok(tokens);
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Token, InterpError> {
        self.skip_trivia()?;
        self.start = self.current;

        let c = match self.advance() {
            Some(c) => c,
            None => {
                return Ok(Token::new(
                    TokenType::Eof,
                    String::new(),
                    Span::single(self.current),
                ))
            }
        };

        match c {
            '+' => Ok(self.make_token(TokenType::Plus)),
            '-' => Ok(self.make_token(TokenType::Minus)),
            '*' => Ok(self.make_token(TokenType::Star)),
            '/' => Ok(self.make_token(TokenType::Slash)),
            '(' => Ok(self.make_token(TokenType::LeftParen)),
            ')' => Ok(self.make_token(TokenType::RightParen)),
            '.' => Ok(self.make_token(TokenType::Dot)),
            ';' => Ok(self.make_token(TokenType::Semicolon)),
            ',' => Ok(self.make_token(TokenType::Comma)),
            ':' => {
                let token_type = if self.match_char('=') {
                    TokenType::Assign
                } else {
                    TokenType::Colon
                };
                Ok(self.make_token(token_type))
            }
            c if c.is_ascii_digit() => self.number(),
            c if c.is_alphabetic() => Ok(self.identifier()),
            _ => Err(InterpError::lex_error(
                Span::single(self.start),
                format!("Unexpected character: '{}'", c.escape_debug()),
            )),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.current).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.current + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.current += 1;
        Some(c)
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Skip whitespace and `{ ... }` comments. Comments do not nest: the first
    /// `}` closes the comment no matter how many `{` it contains.
    fn skip_trivia(&mut self) -> Result<(), InterpError> {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.current += 1;
            } else if c == '{' {
                let open = self.current;
                self.current += 1;
                loop {
                    match self.advance() {
                        Some('}') => break,
                        Some(_) => {}
                        None => {
                            return Err(InterpError::lex_error(
                                Span::new(open, self.current),
                                "Unterminated comment".to_string(),
                            )
                            .with_help("Comments opened with '{' must be closed with '}'."))
                        }
                    }
                }
            } else {
                break;
            }
        }
        Ok(())
    }

    fn number(&mut self) -> Result<Token, InterpError> {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.current += 1;
        }

        // A dot only starts a fraction when a digit follows, so `END.` and
        // `5.` stay integer-then-dot.
        let is_real = self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit());
        if is_real {
            self.current += 1;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.current += 1;
            }
        }

        let text = self.lexeme();
        let span = Span::new(self.start, self.current);
        if is_real {
            let value = text.parse::<f64>().map_err(|_| {
                InterpError::lex_error(span, format!("Invalid real number: {}", text))
            })?;
            Ok(Token::new(TokenType::Real, text, span).with_literal(Literal::Real(value)))
        } else {
            let value = text.parse::<i64>().map_err(|_| {
                InterpError::lex_error(span, format!("Integer literal out of range: {}", text))
            })?;
            Ok(Token::new(TokenType::Integer, text, span).with_literal(Literal::Integer(value)))
        }
    }

    fn identifier(&mut self) -> Token {
        while self.peek().is_some_and(|c| c.is_alphanumeric()) {
            self.current += 1;
        }

        let text = self.lexeme();
        let token_type = self
            .keywords
            .get(text.as_str())
            .copied()
            .unwrap_or(TokenType::Identifier);

        Token::new(token_type, text, Span::new(self.start, self.current))
    }

    fn lexeme(&self) -> String {
        self.chars[self.start..self.current].iter().collect()
    }

    fn make_token(&self, token_type: TokenType) -> Token {
        Token::new(token_type, self.lexeme(), Span::new(self.start, self.current))
    }
}

/// Yields tokens up to and including `Eof`, or up to the first error.
impl Iterator for Lexer {
    type Item = Result<Token, InterpError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.next_token();
        match &result {
            Ok(token) if token.token_type != TokenType::Eof => {}
            _ => self.done = true,
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(source: &str) -> Vec<TokenType> {
        Lexer::new(source)
            .scan_tokens()
            .unwrap()
            .iter()
            .map(|t| t.token_type)
            .collect()
    }

    #[test]
    fn colon_needs_lookahead_to_become_assign() {
        assert_eq!(
            types("a : b := c"),
            vec![
                TokenType::Identifier,
                TokenType::Colon,
                TokenType::Identifier,
                TokenType::Assign,
                TokenType::Identifier,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn trailing_dot_after_integer_is_not_a_fraction() {
        assert_eq!(
            types("5."),
            vec![TokenType::Integer, TokenType::Dot, TokenType::Eof]
        );
    }

    #[test]
    fn eof_repeats_after_end() {
        let mut lexer = Lexer::new("1");
        assert_eq!(lexer.next_token().unwrap().token_type, TokenType::Integer);
        assert_eq!(lexer.next_token().unwrap().token_type, TokenType::Eof);
        assert_eq!(lexer.next_token().unwrap().token_type, TokenType::Eof);
    }

    #[test]
    fn iterator_stops_after_first_error() {
        let items: Vec<_> = Lexer::new("1 ? 2").collect();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(items[1].is_err());
    }

    #[test]
    fn spans_are_character_offsets() {
        let tokens = Lexer::new("{é} ab").scan_tokens().unwrap();
        assert_eq!(tokens[0].span, Span::new(4, 6));
    }
}
