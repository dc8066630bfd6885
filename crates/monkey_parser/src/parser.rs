use crate::ast::*;
use crate::error::ParseError;
use monkey_lexer::{Span, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Prec {
    Lowest = 0,
    Equals = 1,
    LessGreater = 2,
    Sum = 3,
    Product = 4,
    Prefix = 5,
    Call = 6,
    Index = 7,
}

fn infix_prec(tok: &TokenKind) -> Option<Prec> {
    match tok {
        TokenKind::Eq | TokenKind::NotEq => Some(Prec::Equals),
        TokenKind::Lt | TokenKind::Gt => Some(Prec::LessGreater),
        TokenKind::Plus | TokenKind::Minus => Some(Prec::Sum),
        TokenKind::Slash | TokenKind::Asterisk => Some(Prec::Product),
        TokenKind::LParen => Some(Prec::Call),
        TokenKind::LBracket => Some(Prec::Index),
        _ => None,
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    pub errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0, errors: Vec::new() }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn advance(&mut self) -> &Token {
        let idx = self.pos.min(self.tokens.len() - 1);
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        &self.tokens[idx]
    }

    fn current_span(&self) -> Span {
        self.peek().span
    }

    fn match_tok(&mut self, kind: &TokenKind) -> bool {
        if std::mem::discriminant(self.peek_kind()) == std::mem::discriminant(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, label: &str) -> bool {
        if std::mem::discriminant(self.peek_kind()) == std::mem::discriminant(kind) {
            self.advance();
            true
        } else {
            self.errors.push(ParseError::UnexpectedToken {
                expected: label.to_string(),
                found: self.peek_kind().clone(),
                span: self.current_span(),
            });
            false
        }
    }

    fn skip_semicolon(&mut self) {
        self.match_tok(&TokenKind::Semicolon);
    }

    pub fn parse(&mut self) -> Program {
        let mut stmts = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::Eof) {
            stmts.push(self.parse_stmt());
        }
        Program { stmts }
    }

    fn parse_stmt(&mut self) -> Stmt {
        match self.peek_kind() {
            TokenKind::Let => self.parse_let_stmt(),
            TokenKind::Return => self.parse_return_stmt(),
            _ => self.parse_expr_stmt(),
        }
    }

    fn parse_let_stmt(&mut self) -> Stmt {
        let span = self.current_span();
        self.advance();
        let name = match self.peek_kind().clone() {
            TokenKind::Identifier(s) => {
                self.advance();
                s
            }
            _ => {
                self.errors.push(ParseError::UnexpectedToken {
                    expected: "identifier".to_string(),
                    found: self.peek_kind().clone(),
                    span: self.current_span(),
                });
                return Node::new(StmtKind::Expr(Node::new(ExprKind::Error, span)), span);
            }
        };
        self.expect(&TokenKind::Assign, "'='");
        let mut value = self.parse_expr(Prec::Lowest);
        if let ExprKind::FunctionLiteral { name: fn_name, .. } = &mut value.inner {
            if fn_name.is_none() {
                *fn_name = Some(name.clone());
            }
        }
        self.skip_semicolon();
        Node::new(StmtKind::Let { name, value }, span)
    }

    fn parse_return_stmt(&mut self) -> Stmt {
        let span = self.current_span();
        self.advance();
        if matches!(self.peek_kind(), TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof) {
            self.skip_semicolon();
            return Node::new(StmtKind::Return(None), span);
        }
        let value = self.parse_expr(Prec::Lowest);
        self.skip_semicolon();
        Node::new(StmtKind::Return(Some(value)), span)
    }

    fn parse_expr_stmt(&mut self) -> Stmt {
        let span = self.current_span();
        let expr = self.parse_expr(Prec::Lowest);
        self.skip_semicolon();
        Node::new(StmtKind::Expr(expr), span)
    }

    fn parse_block(&mut self) -> BlockStmt {
        self.expect(&TokenKind::LBrace, "'{'");
        let mut stmts = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RBrace | TokenKind::Eof) {
            stmts.push(self.parse_stmt());
        }
        self.match_tok(&TokenKind::RBrace);
        BlockStmt { stmts }
    }

    fn parse_expr(&mut self, min_prec: Prec) -> Expr {
        let mut left = self.parse_prefix();
        loop {
            if matches!(self.peek_kind(), TokenKind::Semicolon) {
                break;
            }
            let Some(prec) = infix_prec(self.peek_kind()) else { break };
            if prec <= min_prec {
                break;
            }
            left = self.parse_infix(left, prec);
        }
        left
    }

    fn parse_prefix(&mut self) -> Expr {
        let span = self.current_span();
        match self.peek_kind().clone() {
            TokenKind::IntLiteral(n) => {
                self.advance();
                Node::new(ExprKind::Int(n), span)
            }
            TokenKind::StringLiteral(s) => {
                self.advance();
                Node::new(ExprKind::Str(s), span)
            }
            TokenKind::BoolLiteral(b) => {
                self.advance();
                Node::new(ExprKind::Bool(b), span)
            }
            TokenKind::Identifier(s) => {
                self.advance();
                Node::new(ExprKind::Ident(s), span)
            }
            TokenKind::Bang => {
                self.advance();
                let right = self.parse_expr(Prec::Prefix);
                Node::new(ExprKind::Prefix { op: PrefixOp::Not, right: Box::new(right) }, span)
            }
            TokenKind::Minus => {
                self.advance();
                let right = self.parse_expr(Prec::Prefix);
                Node::new(ExprKind::Prefix { op: PrefixOp::Neg, right: Box::new(right) }, span)
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr(Prec::Lowest);
                self.expect(&TokenKind::RParen, "')'");
                expr
            }
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_hash_literal(),
            TokenKind::If => self.parse_if_expr(),
            TokenKind::Function => self.parse_function_literal(),
            other => {
                self.errors.push(ParseError::NoPrefixParseFn { found: other, span });
                self.advance();
                Node::new(ExprKind::Error, span)
            }
        }
    }

    fn parse_infix(&mut self, left: Expr, prec: Prec) -> Expr {
        let span = left.span;
        match self.peek_kind().clone() {
            TokenKind::LParen => {
                self.advance();
                let args = self.parse_expr_list(&TokenKind::RParen);
                Node::new(ExprKind::Call { callee: Box::new(left), args }, span)
            }
            TokenKind::LBracket => {
                self.advance();
                let index = self.parse_expr(Prec::Lowest);
                self.expect(&TokenKind::RBracket, "']'");
                Node::new(ExprKind::Index { left: Box::new(left), index: Box::new(index) }, span)
            }
            kind => {
                let op = match kind {
                    TokenKind::Plus => InfixOp::Add,
                    TokenKind::Minus => InfixOp::Sub,
                    TokenKind::Asterisk => InfixOp::Mul,
                    TokenKind::Slash => InfixOp::Div,
                    TokenKind::Eq => InfixOp::Eq,
                    TokenKind::NotEq => InfixOp::NotEq,
                    TokenKind::Lt => InfixOp::Lt,
                    TokenKind::Gt => InfixOp::Gt,
                    _ => unreachable!("infix_prec guards this"),
                };
                self.advance();
                let right = self.parse_expr(prec);
                Node::new(ExprKind::Infix { op, left: Box::new(left), right: Box::new(right) }, span)
            }
        }
    }

    fn parse_expr_list(&mut self, end: &TokenKind) -> Vec<Expr> {
        let mut items = Vec::new();
        if self.peek_kind() == end {
            self.advance();
            return items;
        }
        items.push(self.parse_expr(Prec::Lowest));
        while matches!(self.peek_kind(), TokenKind::Comma) {
            self.advance();
            items.push(self.parse_expr(Prec::Lowest));
        }
        self.expect(end, "closing delimiter");
        items
    }

    fn parse_array_literal(&mut self) -> Expr {
        let span = self.current_span();
        self.advance();
        let items = self.parse_expr_list(&TokenKind::RBracket);
        Node::new(ExprKind::ArrayLiteral(items), span)
    }

    fn parse_hash_literal(&mut self) -> Expr {
        let span = self.current_span();
        self.advance();
        let mut pairs = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RBrace | TokenKind::Eof) {
            let key = self.parse_expr(Prec::Lowest);
            self.expect(&TokenKind::Colon, "':'");
            let value = self.parse_expr(Prec::Lowest);
            pairs.push((key, value));
            if !self.match_tok(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace, "'}'");
        Node::new(ExprKind::HashLiteral(pairs), span)
    }

    fn parse_if_expr(&mut self) -> Expr {
        let span = self.current_span();
        self.advance();
        self.expect(&TokenKind::LParen, "'('");
        let condition = self.parse_expr(Prec::Lowest);
        self.expect(&TokenKind::RParen, "')'");
        let consequence = self.parse_block();
        let alternative = if matches!(self.peek_kind(), TokenKind::Else) {
            self.advance();
            Some(self.parse_block())
        } else {
            None
        };
        Node::new(
            ExprKind::If { condition: Box::new(condition), consequence, alternative },
            span,
        )
    }

    fn parse_function_literal(&mut self) -> Expr {
        let span = self.current_span();
        self.advance();
        self.expect(&TokenKind::LParen, "'('");
        let params = self.parse_function_params();
        let body = self.parse_block();
        Node::new(ExprKind::FunctionLiteral { name: None, params, body }, span)
    }

    fn parse_function_params(&mut self) -> Vec<String> {
        let mut params = Vec::new();
        if matches!(self.peek_kind(), TokenKind::RParen) {
            self.advance();
            return params;
        }
        loop {
            match self.peek_kind().clone() {
                TokenKind::Identifier(s) => {
                    self.advance();
                    params.push(s);
                }
                _ => {
                    self.errors.push(ParseError::UnexpectedToken {
                        expected: "parameter name".to_string(),
                        found: self.peek_kind().clone(),
                        span: self.current_span(),
                    });
                    break;
                }
            }
            if !self.match_tok(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen, "')'");
        params
    }
}
