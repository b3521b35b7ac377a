//! Hand-written single-pass lexer for Cool source text.
//!
//! Keywords are case-insensitive, as in classic Cool, except `true` and
//! `false` which must begin with a lowercase letter (an uppercase first
//! letter makes them type names). Comments are `--` to end of line and
//! nested `(* ... *)` blocks.

use std::{fmt, rc::Rc};

use crate::{
    diagnostics::{DiagnosticCode, Position},
    parser::ParseError,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    IntLit(i64),
    StringLit(String),
    /// Uppercase-initial name: a class or `SELF_TYPE`.
    TypeName(Rc<str>),
    /// Lowercase-initial name, including `self`.
    Ident(Rc<str>),

    Class,
    Inherits,
    If,
    Then,
    Else,
    Fi,
    While,
    Loop,
    Pool,
    Let,
    In,
    Case,
    Of,
    Esac,
    New,
    IsVoid,
    Not,
    True,
    False,

    Plus,
    Minus,
    Star,
    Slash,
    Lt,
    Le,
    Eq,
    /// `<-`
    Assign,
    /// `=>`
    DArrow,
    At,
    Tilde,
    Dot,
    Comma,
    Semi,
    Colon,
    LParen,
    RParen,
    LBrace,
    RBrace,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IntLit(value) => write!(f, "integer literal {value}"),
            Self::StringLit(_) => f.write_str("string literal"),
            Self::TypeName(name) => write!(f, "type name {name}"),
            Self::Ident(name) => write!(f, "identifier {name}"),
            Self::Class => f.write_str("class"),
            Self::Inherits => f.write_str("inherits"),
            Self::If => f.write_str("if"),
            Self::Then => f.write_str("then"),
            Self::Else => f.write_str("else"),
            Self::Fi => f.write_str("fi"),
            Self::While => f.write_str("while"),
            Self::Loop => f.write_str("loop"),
            Self::Pool => f.write_str("pool"),
            Self::Let => f.write_str("let"),
            Self::In => f.write_str("in"),
            Self::Case => f.write_str("case"),
            Self::Of => f.write_str("of"),
            Self::Esac => f.write_str("esac"),
            Self::New => f.write_str("new"),
            Self::IsVoid => f.write_str("isvoid"),
            Self::Not => f.write_str("not"),
            Self::True => f.write_str("true"),
            Self::False => f.write_str("false"),
            Self::Plus => f.write_str("'+'"),
            Self::Minus => f.write_str("'-'"),
            Self::Star => f.write_str("'*'"),
            Self::Slash => f.write_str("'/'"),
            Self::Lt => f.write_str("'<'"),
            Self::Le => f.write_str("'<='"),
            Self::Eq => f.write_str("'='"),
            Self::Assign => f.write_str("'<-'"),
            Self::DArrow => f.write_str("'=>'"),
            Self::At => f.write_str("'@'"),
            Self::Tilde => f.write_str("'~'"),
            Self::Dot => f.write_str("'.'"),
            Self::Comma => f.write_str("','"),
            Self::Semi => f.write_str("';'"),
            Self::Colon => f.write_str("':'"),
            Self::LParen => f.write_str("'('"),
            Self::RParen => f.write_str("')'"),
            Self::LBrace => f.write_str("'{'"),
            Self::RBrace => f.write_str("'}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SpannedToken {
    pub token: Token,
    pub position: Position,
}

/// Tokenizes a whole source file, stopping at the first lexical error.
pub(crate) fn tokenize(source: &str, file: Option<&Rc<str>>) -> Result<Vec<SpannedToken>, ParseError> {
    let mut lexer = Lexer::new(source, file.cloned());
    let mut tokens = Vec::new();
    while let Some(spanned) = lexer.next_token()? {
        tokens.push(spanned);
    }
    Ok(tokens)
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    file: Option<Rc<str>>,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str, file: Option<Rc<str>>) -> Self {
        Self {
            chars: source.chars().peekable(),
            file,
            line: 1,
            column: 1,
        }
    }

    fn position(&self) -> Position {
        Position::new(self.file.clone(), self.line, self.column)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Produces the next token, or None at end of input.
    fn next_token(&mut self) -> Result<Option<SpannedToken>, ParseError> {
        loop {
            let position = self.position();
            let Some(c) = self.bump() else {
                return Ok(None);
            };
            let token = match c {
                ' ' | '\t' | '\r' | '\n' | '\x0b' | '\x0c' => continue,
                '-' if self.eat('-') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                    continue;
                }
                '(' if self.peek() == Some('*') => {
                    self.bump();
                    self.skip_block_comment(&position)?;
                    continue;
                }
                '0'..='9' => self.lex_int(c, &position)?,
                '"' => self.lex_string(&position)?,
                c if c.is_ascii_alphabetic() || c == '_' => self.lex_word(c),
                '+' => Token::Plus,
                '-' => Token::Minus,
                '*' => Token::Star,
                '/' => Token::Slash,
                '<' if self.eat('-') => Token::Assign,
                '<' if self.eat('=') => Token::Le,
                '<' => Token::Lt,
                '=' if self.eat('>') => Token::DArrow,
                '=' => Token::Eq,
                '@' => Token::At,
                '~' => Token::Tilde,
                '.' => Token::Dot,
                ',' => Token::Comma,
                ';' => Token::Semi,
                ':' => Token::Colon,
                '(' => Token::LParen,
                ')' => Token::RParen,
                '{' => Token::LBrace,
                '}' => Token::RBrace,
                other => {
                    return Err(ParseError::new(
                        DiagnosticCode::InvalidToken,
                        format!("unexpected character {other:?}"),
                        position,
                    ));
                }
            };
            return Ok(Some(SpannedToken { token, position }));
        }
    }

    /// Skips a `(* ... *)` comment, honoring nesting.
    fn skip_block_comment(&mut self, start: &Position) -> Result<(), ParseError> {
        let mut depth = 1u32;
        loop {
            match self.bump() {
                Some('(') if self.eat('*') => depth += 1,
                Some('*') if self.eat(')') => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Some(_) => {}
                None => {
                    return Err(ParseError::new(
                        DiagnosticCode::UnterminatedComment,
                        "block comment is not terminated before end of input",
                        start.clone(),
                    ));
                }
            }
        }
    }

    fn lex_int(&mut self, first: char, position: &Position) -> Result<Token, ParseError> {
        let mut digits = String::new();
        digits.push(first);
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
                self.bump();
            } else {
                break;
            }
        }
        digits.parse::<i64>().map(Token::IntLit).map_err(|_| {
            ParseError::new(
                DiagnosticCode::InvalidToken,
                format!("integer literal {digits} does not fit in 64 bits"),
                position.clone(),
            )
        })
    }

    fn lex_string(&mut self, start: &Position) -> Result<Token, ParseError> {
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(Token::StringLit(text)),
                Some('\\') => match self.bump() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some('b') => text.push('\x08'),
                    Some('f') => text.push('\x0c'),
                    // An escaped newline continues the string on the next line.
                    Some(other) => text.push(other),
                    None => {
                        return Err(ParseError::new(
                            DiagnosticCode::UnterminatedString,
                            "string literal is not terminated before end of input",
                            start.clone(),
                        ));
                    }
                },
                Some('\n') => {
                    return Err(ParseError::new(
                        DiagnosticCode::UnterminatedString,
                        "string literal contains an unescaped newline",
                        start.clone(),
                    ));
                }
                Some('\0') => {
                    return Err(ParseError::new(
                        DiagnosticCode::InvalidToken,
                        "string literal contains the NUL character",
                        start.clone(),
                    ));
                }
                Some(other) => text.push(other),
                None => {
                    return Err(ParseError::new(
                        DiagnosticCode::UnterminatedString,
                        "string literal is not terminated before end of input",
                        start.clone(),
                    ));
                }
            }
        }
    }

    fn lex_word(&mut self, first: char) -> Token {
        let mut word = String::new();
        word.push(first);
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                word.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if let Some(keyword) = keyword_token(&word, first) {
            return keyword;
        }
        if first.is_ascii_uppercase() {
            Token::TypeName(Rc::from(word.as_str()))
        } else {
            Token::Ident(Rc::from(word.as_str()))
        }
    }
}

/// Case-insensitive keyword lookup. `true`/`false` must start lowercase.
fn keyword_token(word: &str, first: char) -> Option<Token> {
    let lowered = word.to_ascii_lowercase();
    let token = match lowered.as_str() {
        "class" => Token::Class,
        "inherits" => Token::Inherits,
        "if" => Token::If,
        "then" => Token::Then,
        "else" => Token::Else,
        "fi" => Token::Fi,
        "while" => Token::While,
        "loop" => Token::Loop,
        "pool" => Token::Pool,
        "let" => Token::Let,
        "in" => Token::In,
        "case" => Token::Case,
        "of" => Token::Of,
        "esac" => Token::Esac,
        "new" => Token::New,
        "isvoid" => Token::IsVoid,
        "not" => Token::Not,
        "true" if first == 't' => Token::True,
        "false" if first == 'f' => Token::False,
        _ => return None,
    };
    Some(token)
}
