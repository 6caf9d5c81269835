/// Expression parsing, following Object Pascal's four precedence levels:
/// relational < additive < multiplicative < factor.

impl<'a> Parser<'a> {
    fn expression(&mut self) -> Spanned<Expr> {
        let mut lhs = self.simple_expression();
        while let Some(op) = self.relational_op() {
            self.pos += 1;
            let rhs = self.simple_expression();
            let span = lhs.span.merge(rhs.span);
            lhs = Spanned::new(
                Expr::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        lhs
    }

    fn relational_op(&self) -> Option<BinaryOp> {
        match self.peek().map(|t| &t.kind)? {
            TokenKind::Eq => Some(BinaryOp::Eq),
            TokenKind::NotEq => Some(BinaryOp::NotEq),
            TokenKind::Lt => Some(BinaryOp::Lt),
            TokenKind::LtEq => Some(BinaryOp::LtEq),
            TokenKind::Gt => Some(BinaryOp::Gt),
            TokenKind::GtEq => Some(BinaryOp::GtEq),
            TokenKind::Keyword(KeywordId::In) => Some(BinaryOp::In),
            TokenKind::Keyword(KeywordId::Is) => Some(BinaryOp::Is),
            _ => None,
        }
    }

    fn simple_expression(&mut self) -> Spanned<Expr> {
        let mut lhs = self.term();
        loop {
            let op = match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                Some(TokenKind::Keyword(KeywordId::Or)) => BinaryOp::Or,
                Some(TokenKind::Keyword(KeywordId::Xor)) => BinaryOp::Xor,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.term();
            let span = lhs.span.merge(rhs.span);
            lhs = Spanned::new(
                Expr::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        lhs
    }

    fn term(&mut self) -> Spanned<Expr> {
        let mut lhs = self.factor();
        loop {
            let op = match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::FDiv,
                Some(TokenKind::Keyword(KeywordId::Div)) => BinaryOp::IDiv,
                Some(TokenKind::Keyword(KeywordId::Mod)) => BinaryOp::Mod,
                Some(TokenKind::Keyword(KeywordId::And)) => BinaryOp::And,
                Some(TokenKind::Keyword(KeywordId::Shl)) => BinaryOp::Shl,
                Some(TokenKind::Keyword(KeywordId::Shr)) => BinaryOp::Shr,
                Some(TokenKind::Keyword(KeywordId::As)) => BinaryOp::As,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.factor();
            let span = lhs.span.merge(rhs.span);
            lhs = Spanned::new(
                Expr::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        lhs
    }

    fn factor(&mut self) -> Spanned<Expr> {
        let start = self.current_span();
        let unary = match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Keyword(KeywordId::Not)) => Some(UnaryOp::Not),
            Some(TokenKind::Minus) => Some(UnaryOp::Neg),
            Some(TokenKind::Plus) => Some(UnaryOp::Plus),
            Some(TokenKind::At) => Some(UnaryOp::AddressOf),
            _ => None,
        };
        if let Some(op) = unary {
            self.pos += 1;
            let operand = self.factor();
            let span = start.merge(operand.span);
            return Spanned::new(
                Expr::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            );
        }
        let primary = self.primary();
        self.postfix(primary)
    }

    fn primary(&mut self) -> Spanned<Expr> {
        let start = self.current_span();
        let Some(token) = self.peek() else {
            self.diagnostics
                .push(Diagnostic::syntax("Expected expression", start));
            return Spanned::new(Expr::Name("<error>".to_string()), start);
        };
        match &token.kind {
            TokenKind::IntLit(value) => {
                let value = *value;
                self.pos += 1;
                Spanned::new(Expr::IntLit(value), start)
            }
            TokenKind::RealLit(value) => {
                let value = *value;
                self.pos += 1;
                Spanned::new(Expr::RealLit(value), start)
            }
            TokenKind::StrLit(value) => {
                let value = value.clone();
                self.pos += 1;
                Spanned::new(Expr::StrLit(value), start)
            }
            TokenKind::Keyword(KeywordId::Nil) => {
                self.pos += 1;
                Spanned::new(Expr::Nil, start)
            }
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.pos += 1;
                Spanned::new(Expr::Name(name), start)
            }
            // Intrinsic type names in value position (`string(x)` casts).
            TokenKind::Keyword(KeywordId::StringKw) => {
                self.pos += 1;
                Spanned::new(Expr::Name("String".to_string()), start)
            }
            TokenKind::LParen => {
                self.pos += 1;
                let inner = self.expression();
                self.expect_token(&TokenKind::RParen, "')' after expression");
                Spanned::new(inner.node, start.merge(self.previous_span()))
            }
            TokenKind::LBracket => self.set_constructor(),
            TokenKind::Keyword(KeywordId::Inherited) => {
                self.pos += 1;
                // `inherited;` alone or `inherited Name(...)`.
                let inner = if self.check_ident() {
                    let primary = {
                        let span = self.current_span();
                        let name = self.expect_ident("after 'inherited'");
                        Spanned::new(Expr::Name(name.node), span)
                    };
                    Some(Box::new(self.postfix(primary)))
                } else {
                    None
                };
                Spanned::new(Expr::Inherited(inner), start.merge(self.previous_span()))
            }
            TokenKind::Keyword(KeywordId::Procedure | KeywordId::Function) => {
                self.anonymous_method()
            }
            _ => {
                self.diagnostics
                    .push(Diagnostic::syntax("Expected expression", start));
                self.pos += 1;
                Spanned::new(Expr::Name("<error>".to_string()), start)
            }
        }
    }

    /// Member access, calls, indexing, and dereference, applied left to right.
    fn postfix(&mut self, mut expr: Spanned<Expr>) -> Spanned<Expr> {
        loop {
            match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Dot) => {
                    self.pos += 1;
                    let name = self.expect_ident("after '.'");
                    let span = expr.span.merge(name.span);
                    expr = Spanned::new(
                        Expr::Member {
                            base: Box::new(expr),
                            name,
                        },
                        span,
                    );
                }
                Some(TokenKind::LParen) => {
                    self.pos += 1;
                    let mut args = Vec::new();
                    if !self.check(&TokenKind::RParen) {
                        loop {
                            args.push(self.expression());
                            if !self.match_token(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect_token(&TokenKind::RParen, "')' after arguments");
                    let span = expr.span.merge(self.previous_span());
                    expr = Spanned::new(
                        Expr::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span,
                    );
                }
                Some(TokenKind::LBracket) => {
                    self.pos += 1;
                    let mut indexes = Vec::new();
                    loop {
                        indexes.push(self.expression());
                        if !self.match_token(&TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect_token(&TokenKind::RBracket, "']' after index");
                    let span = expr.span.merge(self.previous_span());
                    expr = Spanned::new(
                        Expr::Index {
                            base: Box::new(expr),
                            indexes,
                        },
                        span,
                    );
                }
                Some(TokenKind::Caret) => {
                    self.pos += 1;
                    let span = expr.span.merge(self.previous_span());
                    expr = Spanned::new(Expr::Deref(Box::new(expr)), span);
                }
                _ => break,
            }
        }
        expr
    }

    /// `[1, 2, 5..9]` — elements may be ranges.
    fn set_constructor(&mut self) -> Spanned<Expr> {
        let start = self.current_span();
        self.pos += 1; // '['
        let mut elements = Vec::new();
        if !self.check(&TokenKind::RBracket) {
            loop {
                let low = self.expression();
                if self.match_token(&TokenKind::DotDot) {
                    let high = self.expression();
                    let span = low.span.merge(high.span);
                    elements.push(Spanned::new(
                        Expr::Range {
                            low: Box::new(low),
                            high: Box::new(high),
                        },
                        span,
                    ));
                } else {
                    elements.push(low);
                }
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect_token(&TokenKind::RBracket, "']' after set constructor");
        Spanned::new(
            Expr::SetConstructor(elements),
            start.merge(self.previous_span()),
        )
    }

    /// `procedure(...) begin ... end` / `function(...): T begin ... end`.
    fn anonymous_method(&mut self) -> Spanned<Expr> {
        let start = self.current_span();
        let kind = if self.match_keyword(KeywordId::Function) {
            RoutineKind::Function
        } else {
            self.pos += 1; // 'procedure'
            RoutineKind::Procedure
        };
        let params = self.formal_params();
        let return_type = if self.match_token(&TokenKind::Colon) {
            Some(self.type_ref())
        } else {
            None
        };
        let body = self.block();
        Spanned::new(
            Expr::AnonymousMethod {
                kind,
                params,
                return_type,
                body,
            },
            start.merge(self.previous_span()),
        )
    }
}
