//! Token stream → AST (spec §4.2).
//!
//! # Operator precedence (lowest to highest, all left-associative except `^`)
//!
//! | Level | Operators |
//! |---|---|
//! | 1 | `==`, `!=` |
//! | 2 | `<`, `<=`, `>`, `>=` |
//! | 3 | `+`, `-` |
//! | 4 | `*`, `/`, `%` |
//! | 5 | `^` (right-associative) |
//! | 6 | unary `-`, `!` |
//! | 7 | primary |
//!
//! Each level gets its own recursive-descent function rather than a
//! table-driven Pratt loop — the grammar is small and fixed, so naming the
//! levels reads closer to the precedence table above than a binding-power
//! table would.

use std::rc::Rc;

use crate::ast::{BinaryOp, Expr, LiteralText, Span, Stmt, UnaryOp};
use crate::error::{Location, ParseError};
use crate::token::{Token, TokenKind};

type ParseResult<T> = Result<T, ParseError>;

pub struct Parser<'a> {
    tokens: &'a [Token],
    position: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, position: 0 }
    }

    fn current(&self) -> &Token {
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> ParseResult<Token> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(format!("expected {what}, found {:?} '{}'", self.current().kind, self.current().text)))
        }
    }

    fn error(&self, message: String) -> ParseError {
        ParseError { message, at: Location { line: self.current().line, column: self.current().column } }
    }

    /// Parses a whole program into its root `Block` statement (spec §3:
    /// "The root is always a `Block`").
    pub fn parse_program(&mut self) -> ParseResult<Stmt> {
        let mut statements = Vec::new();
        while !self.at(TokenKind::Eof) {
            statements.push(self.parse_statement()?);
        }
        Ok(Stmt::Block(statements))
    }

    fn parse_statement(&mut self) -> ParseResult<Stmt> {
        match self.current().kind {
            TokenKind::Var => self.parse_var_decl(),
            TokenKind::Bigint => self.parse_bigint_decl(),
            TokenKind::Define => self.parse_define(),
            TokenKind::Func => self.parse_func_def(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Include => self.parse_include(),
            TokenKind::Use => self.parse_use(),
            TokenKind::Break => {
                let line = self.advance().line;
                self.expect(TokenKind::Semicolon, "';' after 'break'")?;
                Ok(Stmt::Break { line })
            }
            TokenKind::Continue => {
                let line = self.advance().line;
                self.expect(TokenKind::Semicolon, "';' after 'continue'")?;
                Ok(Stmt::Continue { line })
            }
            TokenKind::LBrace => self.parse_block(),
            TokenKind::For => Err(self.error("'for' has no statement grammar".to_owned())),
            _ => self.parse_assign_or_expr_statement(),
        }
    }

    fn parse_var_decl(&mut self) -> ParseResult<Stmt> {
        self.advance(); // 'var'
        let name = self.expect_identifier()?;
        self.expect(TokenKind::Assign, "'=' in variable declaration")?;
        let init = self.parse_expr()?;
        self.expect(TokenKind::Semicolon, "';' after variable declaration")?;
        Ok(Stmt::VarDecl { name, init })
    }

    fn parse_bigint_decl(&mut self) -> ParseResult<Stmt> {
        self.advance(); // 'bigint'
        let name = self.expect_identifier()?;
        let init = if self.at(TokenKind::Assign) {
            self.advance();
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon, "';' after bigint declaration")?;
        Ok(Stmt::BigIntDecl { name, init })
    }

    fn parse_define(&mut self) -> ParseResult<Stmt> {
        self.advance(); // 'define'
        let name = self.expect_identifier()?;
        self.expect(TokenKind::Assign, "'=' in define")?;
        let value = self.parse_expr()?;
        self.expect(TokenKind::Semicolon, "';' after define")?;
        Ok(Stmt::Define { name, value })
    }

    fn parse_func_def(&mut self) -> ParseResult<Stmt> {
        self.advance(); // 'func'
        let name = self.expect_identifier()?;
        self.expect(TokenKind::LParen, "'(' after function name")?;
        let mut params = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                params.push(self.expect_identifier()?);
                if self.at(TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')' after parameter list")?;
        let body = self.parse_block()?;
        Ok(Stmt::FuncDef { name, params, body: Rc::new(body) })
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        self.advance(); // 'if'
        self.expect(TokenKind::LParen, "'(' after 'if'")?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen, "')' after if condition")?;
        let then_block = Box::new(self.parse_block()?);
        let else_block = if self.at(TokenKind::Else) {
            self.advance();
            Some(Box::new(self.parse_block()?))
        } else {
            None
        };
        Ok(Stmt::If { cond, then_block, else_block })
    }

    fn parse_while(&mut self) -> ParseResult<Stmt> {
        self.advance(); // 'while'
        self.expect(TokenKind::LParen, "'(' after 'while'")?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen, "')' after while condition")?;
        let body = Box::new(self.parse_block()?);
        Ok(Stmt::While { cond, body })
    }

    fn parse_return(&mut self) -> ParseResult<Stmt> {
        let line = self.advance().line; // 'return'
        let value = if self.at(TokenKind::Semicolon) { None } else { Some(self.parse_expr()?) };
        self.expect(TokenKind::Semicolon, "';' after return")?;
        Ok(Stmt::Return { value, line })
    }

    fn parse_include(&mut self) -> ParseResult<Stmt> {
        let line = self.advance().line; // 'include'
        let module_tok = self.expect(TokenKind::String, "module path string after 'include'")?;
        self.expect(TokenKind::Semicolon, "';' after include")?;
        Ok(Stmt::Include { module: Rc::from(module_tok.text.as_str()), line })
    }

    fn parse_use(&mut self) -> ParseResult<Stmt> {
        let line = self.advance().line; // 'use'
        let module = self.expect_identifier()?;
        self.expect(TokenKind::Semicolon, "';' after use")?;
        Ok(Stmt::Use { module, line })
    }

    fn parse_block(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut statements = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            statements.push(self.parse_statement()?);
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(Stmt::Block(statements))
    }

    /// Disambiguates `IDENT = expr ;` (assignment) from an ordinary
    /// expression statement by looking one token ahead (spec §4.2:
    /// "Assignment is parsed by recognizing `IDENT = …` at statement
    /// position; elsewhere `=` is a parse error").
    fn parse_assign_or_expr_statement(&mut self) -> ParseResult<Stmt> {
        if self.at(TokenKind::Identifier)
            && self.tokens.get(self.position + 1).map(|t| t.kind) == Some(TokenKind::Assign)
        {
            let name_tok = self.advance();
            self.advance(); // '='
            let line = name_tok.line;
            let expr = self.parse_expr()?;
            self.expect(TokenKind::Semicolon, "';' after assignment")?;
            return Ok(Stmt::Assign { name: Rc::from(name_tok.text.as_str()), expr, line });
        }

        let expr = self.parse_expr()?;
        self.expect(TokenKind::Semicolon, "';' after expression")?;
        Ok(Stmt::ExprStmt(expr))
    }

    fn expect_identifier(&mut self) -> ParseResult<Rc<str>> {
        let token = self.expect(TokenKind::Identifier, "identifier")?;
        Ok(Rc::from(token.text.as_str()))
    }

    fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_equality()
    }

    fn parse_equality(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.current().kind {
                TokenKind::EqualEqual => BinaryOp::Eq,
                TokenKind::NotEqual => BinaryOp::NotEq,
                _ => break,
            };
            let op_tok = self.advance();
            let right = self.parse_comparison()?;
            left = self.combine_binary(op, left, right, &op_tok);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Less => BinaryOp::Lt,
                TokenKind::LessEqual => BinaryOp::LtEq,
                TokenKind::Greater => BinaryOp::Gt,
                TokenKind::GreaterEqual => BinaryOp::GtEq,
                _ => break,
            };
            let op_tok = self.advance();
            let right = self.parse_additive()?;
            left = self.combine_binary(op, left, right, &op_tok);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            let op_tok = self.advance();
            let right = self.parse_multiplicative()?;
            left = self.combine_binary(op, left, right, &op_tok);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_power()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            let op_tok = self.advance();
            let right = self.parse_power()?;
            left = self.combine_binary(op, left, right, &op_tok);
        }
        Ok(left)
    }

    /// `^` is right-associative, so the recursive call loops back to this
    /// same level rather than the level below.
    fn parse_power(&mut self) -> ParseResult<Expr> {
        let left = self.parse_unary()?;
        if self.at(TokenKind::Caret) {
            let op_tok = self.advance();
            let right = self.parse_power()?;
            return Ok(self.combine_binary(BinaryOp::Pow, left, right, &op_tok));
        }
        Ok(left)
    }

    fn combine_binary(&self, op: BinaryOp, left: Expr, right: Expr, op_tok: &Token) -> Expr {
        let span = Span::new(
            format!("{} {} {}", left.span().text, op_tok.text, right.span().text),
            left.span().line,
            left.span().column,
        );
        Expr::Binary { op, left: Box::new(left), right: Box::new(right), span }
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        match self.current().kind {
            TokenKind::Minus => {
                let op_tok = self.advance();
                let operand = self.parse_unary()?;
                let span = Span::new(format!("-{}", operand.span().text), op_tok.line, op_tok.column);
                Ok(Expr::Unary { op: UnaryOp::Neg, operand: Box::new(operand), span })
            }
            TokenKind::Bang => {
                let op_tok = self.advance();
                let operand = self.parse_unary()?;
                let span = Span::new(format!("!{}", operand.span().text), op_tok.line, op_tok.column);
                Ok(Expr::Unary { op: UnaryOp::Not, operand: Box::new(operand), span })
            }
            _ => self.parse_postfix(),
        }
    }

    /// Wraps a primary atom in zero or more trailing `[index]` subscripts
    /// (the `a[1]` syntax spec §8 scenario 4 requires; see [`Expr::Index`]).
    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;
        while self.at(TokenKind::LBracket) {
            let bracket = self.advance();
            let index = self.parse_expr()?;
            self.expect(TokenKind::RBracket, "']' after index expression")?;
            let span = Span::new(expr.span().text.clone(), bracket.line, bracket.column);
            expr = Expr::Index { array: Box::new(expr), index: Box::new(index), span };
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Number => {
                self.advance();
                Ok(Expr::Literal {
                    value: LiteralText::Number(Rc::from(token.text.as_str())),
                    span: Span::new(token.text.as_str(), token.line, token.column),
                })
            }
            TokenKind::String => {
                self.advance();
                Ok(Expr::Literal {
                    value: LiteralText::String(Rc::from(token.text.as_str())),
                    span: Span::new(token.text.as_str(), token.line, token.column),
                })
            }
            TokenKind::True | TokenKind::False => {
                self.advance();
                Ok(Expr::Literal {
                    value: LiteralText::Bool(token.kind == TokenKind::True),
                    span: Span::new(token.text.as_str(), token.line, token.column),
                })
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::Literal { value: LiteralText::Null, span: Span::new("null", token.line, token.column) })
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen, "')' after expression")?;
                Ok(inner)
            }
            TokenKind::Input => {
                self.advance();
                Ok(Expr::Input { span: Span::new("input", token.line, token.column) })
            }
            TokenKind::LBracket => self.parse_array(&token),
            TokenKind::Identifier => self.parse_identifier_led(&token),
            _ => Err(self.error(format!("unexpected token {:?} '{}'", token.kind, token.text))),
        }
    }

    fn parse_array(&mut self, start: &Token) -> ParseResult<Expr> {
        self.advance(); // '['
        let mut elements = Vec::new();
        if !self.at(TokenKind::RBracket) {
            loop {
                elements.push(self.parse_expr()?);
                if self.at(TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBracket, "']' after array literal")?;
        Ok(Expr::Array { elements, span: Span::new(start.text.as_str(), start.line, start.column) })
    }

    /// An identifier can lead into a plain variable reference, a call
    /// `ident(args)`, or a namespace call `ident.ident(args)` (spec §4.2).
    fn parse_identifier_led(&mut self, start: &Token) -> ParseResult<Expr> {
        self.advance(); // identifier
        let span = Span::new(start.text.as_str(), start.line, start.column);

        if self.at(TokenKind::Dot) {
            self.advance();
            let function = self.expect_identifier()?;
            self.expect(TokenKind::LParen, "'(' after namespace function name")?;
            let args = self.parse_args()?;
            return Ok(Expr::NamespaceCall { namespace: Rc::from(start.text.as_str()), function, args, span });
        }

        if self.at(TokenKind::LParen) {
            self.advance();
            let args = self.parse_args()?;
            return Ok(Expr::Call { callee: Rc::from(start.text.as_str()), args, span });
        }

        Ok(Expr::Identifier { name: Rc::from(start.text.as_str()), span })
    }

    fn parse_args(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if self.at(TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')' after argument list")?;
        Ok(args)
    }
}

/// Parses a complete token stream into the root `Block` (spec §4.2).
pub fn parse(tokens: &[Token]) -> ParseResult<Stmt> {
    Parser::new(tokens).parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_src(src: &str) -> Stmt {
        let (tokens, errors) = tokenize(src);
        assert!(errors.is_empty(), "{errors:?}");
        parse(&tokens).unwrap()
    }

    #[test]
    fn var_decl_roundtrip() {
        let ast = parse_src("var x = 1;");
        match ast {
            Stmt::Block(stmts) => assert!(matches!(stmts[0], Stmt::VarDecl { .. })),
            _ => panic!("expected block"),
        }
    }

    #[test]
    fn precedence_multiplication_before_addition() {
        let ast = parse_src("var x = 2 + 3 * 4;");
        let Stmt::Block(stmts) = ast else { panic!() };
        let Stmt::VarDecl { init, .. } = &stmts[0] else { panic!() };
        match init {
            Expr::Binary { op: BinaryOp::Add, right, .. } => {
                assert!(matches!(**right, Expr::Binary { op: BinaryOp::Mul, .. }));
            }
            _ => panic!("expected addition at top level"),
        }
    }

    #[test]
    fn power_is_right_associative() {
        let ast = parse_src("var x = 2 ^ 3 ^ 2;");
        let Stmt::Block(stmts) = ast else { panic!() };
        let Stmt::VarDecl { init, .. } = &stmts[0] else { panic!() };
        match init {
            Expr::Binary { op: BinaryOp::Pow, left, right, .. } => {
                assert!(matches!(**left, Expr::Literal { .. }));
                assert!(matches!(**right, Expr::Binary { op: BinaryOp::Pow, .. }));
            }
            _ => panic!("expected power at top level"),
        }
    }

    #[test]
    fn assignment_requires_statement_position() {
        let (tokens, _) = tokenize("(x = 1);");
        assert!(parse(&tokens).is_err());
    }

    #[test]
    fn namespace_call_parses() {
        let ast = parse_src("mymod.foo(1, 2);");
        let Stmt::Block(stmts) = ast else { panic!() };
        assert!(matches!(stmts[0], Stmt::ExprStmt(Expr::NamespaceCall { .. })));
    }

    #[test]
    fn for_keyword_is_rejected_at_statement_position() {
        let (tokens, _) = tokenize("for (x) {}");
        assert!(parse(&tokens).is_err());
    }
}
