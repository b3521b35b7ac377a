//! Recursive-descent parser from tokens to the AST of [`crate::ast`].
//!
//! The grammar is classic Cool. Operator precedence, loosest first:
//! `<-`, `not`, the non-associative comparisons `< <= =`, `+ -`, `* /`,
//! the prefix operators `~` and `isvoid`, then dispatch (`.` and `@`).
//! A `let` body extends as far to the right as possible.
//!
//! Parsing stops at the first error; the façade converts the error into a
//! 00xx diagnostic.

use std::rc::Rc;

use crate::{
    ast::{
        Attribute, BinaryOp, CaseBranch, Class, Expr, ExprLoc, Feature, Formal, LetBinding, Method, Program, UnaryOp,
    },
    diagnostics::{Diagnostic, DiagnosticCode, Position},
    lexer::{self, SpannedToken, Token},
};

/// A lexical or syntactic failure with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub code: DiagnosticCode,
    pub message: String,
    pub position: Position,
}

impl ParseError {
    pub(crate) fn new(code: DiagnosticCode, message: impl Into<String>, position: Position) -> Self {
        Self {
            code,
            message: message.into(),
            position,
        }
    }

    #[must_use]
    pub fn into_diagnostic(self) -> Diagnostic {
        Diagnostic::error(self.code, self.position, self.message)
    }
}

/// Parses one compilation unit.
pub(crate) fn parse(source: &str, filename: &str) -> Result<Program, ParseError> {
    let file: Rc<str> = Rc::from(filename);
    let tokens = lexer::tokenize(source, Some(&file))?;
    Parser::new(tokens, file).parse_program()
}

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    file: Rc<str>,
}

impl Parser {
    fn new(tokens: Vec<SpannedToken>, file: Rc<str>) -> Self {
        Self { tokens, pos: 0, file }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn peek_second(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 1).map(|t| &t.token)
    }

    /// Position of the current token, or of the end of input.
    fn position(&self) -> Position {
        match self.tokens.get(self.pos) {
            Some(t) => t.position.clone(),
            None => self
                .tokens
                .last()
                .map_or_else(|| Position::new(Some(self.file.clone()), 1, 1), |t| t.position.clone()),
        }
    }

    fn advance(&mut self) -> Option<SpannedToken> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn syntax_error(&self, expected: &str) -> ParseError {
        let found = match self.peek() {
            Some(token) => format!("found {token}"),
            None => "found end of input".to_owned(),
        };
        ParseError::new(
            DiagnosticCode::SyntaxError,
            format!("expected {expected}, {found}"),
            self.position(),
        )
    }

    fn expect(&mut self, token: &Token, expected: &str) -> Result<Position, ParseError> {
        if self.peek() == Some(token) {
            Ok(self.advance().map(|t| t.position).unwrap_or_default())
        } else {
            Err(self.syntax_error(expected))
        }
    }

    fn expect_type_name(&mut self) -> Result<(Rc<str>, Position), ParseError> {
        match self.peek() {
            Some(Token::TypeName(_)) => {
                let spanned = self.advance().expect("peeked token exists");
                match spanned.token {
                    Token::TypeName(name) => Ok((name, spanned.position)),
                    _ => unreachable!("peeked a type name"),
                }
            }
            _ => Err(self.syntax_error("a type name")),
        }
    }

    fn expect_ident(&mut self) -> Result<(Rc<str>, Position), ParseError> {
        match self.peek() {
            Some(Token::Ident(_)) => {
                let spanned = self.advance().expect("peeked token exists");
                match spanned.token {
                    Token::Ident(name) => Ok((name, spanned.position)),
                    _ => unreachable!("peeked an identifier"),
                }
            }
            _ => Err(self.syntax_error("an identifier")),
        }
    }

    fn parse_program(mut self) -> Result<Program, ParseError> {
        let mut classes = Vec::new();
        if self.peek().is_none() {
            return Err(ParseError::new(
                DiagnosticCode::SyntaxError,
                "a program must contain at least one class",
                Position::new(Some(self.file.clone()), 1, 1),
            ));
        }
        while self.peek().is_some() {
            classes.push(self.parse_class()?);
            self.expect(&Token::Semi, "';' after class definition")?;
        }
        Ok(Program { classes })
    }

    fn parse_class(&mut self) -> Result<Class, ParseError> {
        let position = self.expect(&Token::Class, "class")?;
        let (name, _) = self.expect_type_name()?;
        let inherits_from = if self.peek() == Some(&Token::Inherits) {
            self.advance();
            Some(self.expect_type_name()?.0)
        } else {
            None
        };
        self.expect(&Token::LBrace, "'{' to open the class body")?;
        let mut features = Vec::new();
        let mut attr_order = 0u32;
        while self.peek() != Some(&Token::RBrace) {
            features.push(self.parse_feature(&mut attr_order)?);
            self.expect(&Token::Semi, "';' after feature")?;
        }
        self.expect(&Token::RBrace, "'}' to close the class body")?;
        Ok(Class {
            name,
            inherits_from,
            features,
            position,
        })
    }

    fn parse_feature(&mut self, attr_order: &mut u32) -> Result<Feature, ParseError> {
        let (name, position) = self.expect_ident()?;
        match self.peek() {
            Some(Token::LParen) => {
                self.advance();
                let mut formals = Vec::new();
                if self.peek() != Some(&Token::RParen) {
                    loop {
                        let (formal_name, formal_position) = self.expect_ident()?;
                        self.expect(&Token::Colon, "':' after formal name")?;
                        let (declared_type, _) = self.expect_type_name()?;
                        formals.push(Formal {
                            name: formal_name,
                            declared_type,
                            position: formal_position,
                        });
                        if self.peek() == Some(&Token::Comma) {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                self.expect(&Token::RParen, "')' after formals")?;
                self.expect(&Token::Colon, "':' before the return type")?;
                let (return_type, _) = self.expect_type_name()?;
                self.expect(&Token::LBrace, "'{' to open the method body")?;
                let body = self.parse_expr()?;
                self.expect(&Token::RBrace, "'}' to close the method body")?;
                Ok(Feature::Method(Method {
                    name,
                    formals,
                    return_type,
                    body,
                    position,
                }))
            }
            Some(Token::Colon) => {
                self.advance();
                let (declared_type, _) = self.expect_type_name()?;
                let initializer = if self.peek() == Some(&Token::Assign) {
                    self.advance();
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                let source_order = *attr_order;
                *attr_order += 1;
                Ok(Feature::Attribute(Attribute {
                    name,
                    declared_type,
                    initializer,
                    source_order,
                    position,
                }))
            }
            _ => Err(self.syntax_error("'(' or ':' after the feature name")),
        }
    }

    fn parse_expr(&mut self) -> Result<ExprLoc, ParseError> {
        self.parse_assign()
    }

    fn parse_assign(&mut self) -> Result<ExprLoc, ParseError> {
        if let (Some(Token::Ident(_)), Some(Token::Assign)) = (self.peek(), self.peek_second()) {
            let (id, position) = self.expect_ident()?;
            self.advance(); // <-
            let value = self.parse_assign()?;
            return Ok(ExprLoc::new(position, Expr::Assign {
                id,
                value: Box::new(value),
            }));
        }
        self.parse_not()
    }

    fn parse_not(&mut self) -> Result<ExprLoc, ParseError> {
        if self.peek() == Some(&Token::Not) {
            let position = self.advance().expect("peeked token exists").position;
            let operand = self.parse_not()?;
            return Ok(ExprLoc::new(position, Expr::UnaryOp {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            }));
        }
        self.parse_comparison()
    }

    /// Comparisons are non-associative: `a < b < c` is a syntax error.
    fn parse_comparison(&mut self) -> Result<ExprLoc, ParseError> {
        let left = self.parse_additive()?;
        let op = match self.peek() {
            Some(Token::Lt) => BinaryOp::Lt,
            Some(Token::Le) => BinaryOp::Le,
            Some(Token::Eq) => BinaryOp::Eq,
            _ => return Ok(left),
        };
        let position = self.advance().expect("peeked token exists").position;
        let right = self.parse_additive()?;
        Ok(ExprLoc::new(position, Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }))
    }

    fn parse_additive(&mut self) -> Result<ExprLoc, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            let position = self.advance().expect("peeked token exists").position;
            let right = self.parse_multiplicative()?;
            left = ExprLoc::new(position, Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            });
        }
    }

    fn parse_multiplicative(&mut self) -> Result<ExprLoc, ParseError> {
        let mut left = self.parse_prefix()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => return Ok(left),
            };
            let position = self.advance().expect("peeked token exists").position;
            let right = self.parse_prefix()?;
            left = ExprLoc::new(position, Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            });
        }
    }

    fn parse_prefix(&mut self) -> Result<ExprLoc, ParseError> {
        match self.peek() {
            Some(Token::Tilde) => {
                let position = self.advance().expect("peeked token exists").position;
                let operand = self.parse_prefix()?;
                Ok(ExprLoc::new(position, Expr::UnaryOp {
                    op: UnaryOp::Negate,
                    operand: Box::new(operand),
                }))
            }
            Some(Token::IsVoid) => {
                let position = self.advance().expect("peeked token exists").position;
                let operand = self.parse_prefix()?;
                Ok(ExprLoc::new(position, Expr::IsVoid {
                    operand: Box::new(operand),
                }))
            }
            _ => self.parse_postfix(),
        }
    }

    /// Dispatch chains: `e.m(..)`, `e@T.m(..)`, left-associative.
    fn parse_postfix(&mut self) -> Result<ExprLoc, ParseError> {
        let mut expr = self.parse_atom()?;
        loop {
            match self.peek() {
                Some(Token::At) => {
                    self.advance();
                    let (static_type, _) = self.expect_type_name()?;
                    self.expect(&Token::Dot, "'.' after the static dispatch type")?;
                    let (method, position) = self.expect_ident()?;
                    let args = self.parse_args()?;
                    expr = ExprLoc::new(position, Expr::Dispatch {
                        receiver: Box::new(expr),
                        static_type: Some(static_type),
                        method,
                        args,
                    });
                }
                Some(Token::Dot) => {
                    self.advance();
                    let (method, position) = self.expect_ident()?;
                    let args = self.parse_args()?;
                    expr = ExprLoc::new(position, Expr::Dispatch {
                        receiver: Box::new(expr),
                        static_type: None,
                        method,
                        args,
                    });
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_args(&mut self) -> Result<Vec<ExprLoc>, ParseError> {
        self.expect(&Token::LParen, "'(' to open the argument list")?;
        let mut args = Vec::new();
        if self.peek() != Some(&Token::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if self.peek() == Some(&Token::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(&Token::RParen, "')' to close the argument list")?;
        Ok(args)
    }

    fn parse_atom(&mut self) -> Result<ExprLoc, ParseError> {
        let position = self.position();
        match self.peek() {
            Some(Token::IntLit(_)) => {
                let spanned = self.advance().expect("peeked token exists");
                match spanned.token {
                    Token::IntLit(value) => Ok(ExprLoc::new(spanned.position, Expr::IntLit(value))),
                    _ => unreachable!("peeked an int literal"),
                }
            }
            Some(Token::StringLit(_)) => {
                let spanned = self.advance().expect("peeked token exists");
                match spanned.token {
                    Token::StringLit(value) => {
                        Ok(ExprLoc::new(spanned.position, Expr::StringLit(Rc::from(value.as_str()))))
                    }
                    _ => unreachable!("peeked a string literal"),
                }
            }
            Some(Token::True) => {
                self.advance();
                Ok(ExprLoc::new(position, Expr::BoolLit(true)))
            }
            Some(Token::False) => {
                self.advance();
                Ok(ExprLoc::new(position, Expr::BoolLit(false)))
            }
            Some(Token::Ident(_)) => {
                let (name, ident_position) = self.expect_ident()?;
                if self.peek() == Some(&Token::LParen) {
                    // Implicit-receiver dispatch: `m(args)` is `self.m(args)`.
                    let args = self.parse_args()?;
                    let receiver = ExprLoc::new(ident_position.clone(), Expr::SelfRef);
                    Ok(ExprLoc::new(ident_position, Expr::Dispatch {
                        receiver: Box::new(receiver),
                        static_type: None,
                        method: name,
                        args,
                    }))
                } else if &*name == "self" {
                    Ok(ExprLoc::new(ident_position, Expr::SelfRef))
                } else {
                    Ok(ExprLoc::new(ident_position, Expr::Identifier(name)))
                }
            }
            Some(Token::If) => {
                self.advance();
                let pred = self.parse_expr()?;
                self.expect(&Token::Then, "then")?;
                let then_branch = self.parse_expr()?;
                self.expect(&Token::Else, "else")?;
                let else_branch = self.parse_expr()?;
                self.expect(&Token::Fi, "fi")?;
                Ok(ExprLoc::new(position, Expr::If {
                    pred: Box::new(pred),
                    then_branch: Box::new(then_branch),
                    else_branch: Box::new(else_branch),
                }))
            }
            Some(Token::While) => {
                self.advance();
                let pred = self.parse_expr()?;
                self.expect(&Token::Loop, "loop")?;
                let body = self.parse_expr()?;
                self.expect(&Token::Pool, "pool")?;
                Ok(ExprLoc::new(position, Expr::While {
                    pred: Box::new(pred),
                    body: Box::new(body),
                }))
            }
            Some(Token::LBrace) => {
                self.advance();
                let mut exprs = Vec::new();
                loop {
                    exprs.push(self.parse_expr()?);
                    self.expect(&Token::Semi, "';' after block expression")?;
                    if self.peek() == Some(&Token::RBrace) {
                        break;
                    }
                }
                self.expect(&Token::RBrace, "'}' to close the block")?;
                Ok(ExprLoc::new(position, Expr::Block { exprs }))
            }
            Some(Token::Let) => {
                self.advance();
                let mut bindings = Vec::new();
                loop {
                    let (id, binding_position) = self.expect_ident()?;
                    self.expect(&Token::Colon, "':' after let binding name")?;
                    let (declared_type, _) = self.expect_type_name()?;
                    let initializer = if self.peek() == Some(&Token::Assign) {
                        self.advance();
                        Some(self.parse_expr()?)
                    } else {
                        None
                    };
                    bindings.push(LetBinding {
                        id,
                        declared_type,
                        initializer,
                        position: binding_position,
                    });
                    if self.peek() == Some(&Token::Comma) {
                        self.advance();
                    } else {
                        break;
                    }
                }
                self.expect(&Token::In, "in")?;
                let body = self.parse_expr()?;
                Ok(ExprLoc::new(position, Expr::Let {
                    bindings,
                    body: Box::new(body),
                }))
            }
            Some(Token::Case) => {
                self.advance();
                let scrutinee = self.parse_expr()?;
                self.expect(&Token::Of, "of")?;
                let mut branches = Vec::new();
                loop {
                    let (id, branch_position) = self.expect_ident()?;
                    self.expect(&Token::Colon, "':' after case branch name")?;
                    let (declared_type, _) = self.expect_type_name()?;
                    self.expect(&Token::DArrow, "'=>' in case branch")?;
                    let body = self.parse_expr()?;
                    self.expect(&Token::Semi, "';' after case branch")?;
                    branches.push(CaseBranch {
                        id,
                        declared_type,
                        body,
                        position: branch_position,
                    });
                    if self.peek() == Some(&Token::Esac) {
                        break;
                    }
                }
                self.expect(&Token::Esac, "esac")?;
                Ok(ExprLoc::new(position, Expr::Case {
                    scrutinee: Box::new(scrutinee),
                    branches,
                }))
            }
            Some(Token::New) => {
                self.advance();
                let (type_name, _) = self.expect_type_name()?;
                Ok(ExprLoc::new(position, Expr::New { type_name }))
            }
            Some(Token::LParen) => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            _ => Err(self.syntax_error("an expression")),
        }
    }
}
