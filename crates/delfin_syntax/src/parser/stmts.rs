/// Statement parsing.

impl<'a> Parser<'a> {
    fn compound_statement(&mut self) -> Spanned<Stmt> {
        let start = self.current_span();
        self.expect_keyword(KeywordId::Begin, "to open a block");
        let stmts = self.statement_list(&[KeywordId::End]);
        self.expect_keyword(KeywordId::End, "to close a block");
        Spanned::new(Stmt::Compound(stmts), start.merge(self.previous_span()))
    }

    /// Statements separated by ';' until one of `terminators` (or end of input).
    fn statement_list(&mut self, terminators: &[KeywordId]) -> Vec<Spanned<Stmt>> {
        let mut stmts = Vec::new();
        loop {
            if self.is_at_end() || terminators.iter().any(|&k| self.check_keyword(k)) {
                break;
            }
            // A bare ';' is an empty statement; skip it without recording one.
            if self.match_token(&TokenKind::Semicolon) {
                continue;
            }
            let before = self.pos;
            stmts.push(self.statement());
            if self.pos == before {
                // The statement parser made no progress; drop the token to avoid
                // spinning on malformed input.
                let span = self.current_span();
                self.diagnostics
                    .push(Diagnostic::syntax("Expected statement", span));
                self.pos += 1;
                continue;
            }
            if !self.match_token(&TokenKind::Semicolon) {
                break;
            }
        }
        stmts
    }

    fn statement(&mut self) -> Spanned<Stmt> {
        let start = self.current_span();
        let stmt = match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Keyword(KeywordId::Begin)) => return self.compound_statement(),
            Some(TokenKind::Keyword(KeywordId::If)) => self.if_statement(),
            Some(TokenKind::Keyword(KeywordId::While)) => self.while_statement(),
            Some(TokenKind::Keyword(KeywordId::Repeat)) => self.repeat_statement(),
            Some(TokenKind::Keyword(KeywordId::For)) => self.for_statement(),
            Some(TokenKind::Keyword(KeywordId::Case)) => self.case_statement(),
            Some(TokenKind::Keyword(KeywordId::Try)) => self.try_statement(),
            Some(TokenKind::Keyword(KeywordId::Raise)) => self.raise_statement(),
            Some(TokenKind::Keyword(KeywordId::With)) => self.with_statement(),
            Some(TokenKind::Keyword(KeywordId::Goto)) => {
                self.pos += 1;
                Stmt::Goto(self.expect_ident("after 'goto'"))
            }
            Some(TokenKind::Semicolon) => Stmt::Empty,
            // `Label: stmt` — an identifier directly followed by ':'.
            Some(TokenKind::Ident(_)) if self.peek_next().is_some_and(|t| t.kind == TokenKind::Colon) => {
                let label = self.expect_ident("as label");
                self.pos += 1; // ':'
                let stmt = self.statement();
                Stmt::Labeled {
                    label,
                    stmt: Box::new(stmt),
                }
            }
            _ => self.simple_statement(),
        };
        Spanned::new(stmt, start.merge(self.previous_span()))
    }

    /// Assignment or expression statement.
    fn simple_statement(&mut self) -> Stmt {
        let target = self.expression();
        if self.match_token(&TokenKind::Assign) {
            let value = self.expression();
            Stmt::Assign { target, value }
        } else {
            Stmt::Expr(target)
        }
    }

    fn if_statement(&mut self) -> Stmt {
        self.pos += 1; // 'if'
        let cond = self.expression();
        self.expect_keyword(KeywordId::Then, "after if condition");
        let then_branch = Box::new(self.statement());
        let else_branch = if self.match_keyword(KeywordId::Else) {
            Some(Box::new(self.statement()))
        } else {
            None
        };
        Stmt::If {
            cond,
            then_branch,
            else_branch,
        }
    }

    fn while_statement(&mut self) -> Stmt {
        self.pos += 1; // 'while'
        let cond = self.expression();
        self.expect_keyword(KeywordId::Do, "after while condition");
        Stmt::While {
            cond,
            body: Box::new(self.statement()),
        }
    }

    fn repeat_statement(&mut self) -> Stmt {
        self.pos += 1; // 'repeat'
        let body = self.statement_list(&[KeywordId::Until]);
        self.expect_keyword(KeywordId::Until, "after repeat body");
        let until = self.expression();
        Stmt::Repeat { body, until }
    }

    fn for_statement(&mut self) -> Stmt {
        self.pos += 1; // 'for'
        // Inline loop variable: `for var I := ...`
        self.match_keyword(KeywordId::Var);
        let var = self.expect_ident("after 'for'");
        if self.match_keyword(KeywordId::In) {
            let iterable = self.expression();
            self.expect_keyword(KeywordId::Do, "after for-in iterable");
            return Stmt::ForIn {
                var,
                iterable,
                body: Box::new(self.statement()),
            };
        }
        self.expect_token(&TokenKind::Assign, "':=' in for statement");
        let from = self.expression();
        let direction = if self.match_keyword(KeywordId::Downto) {
            ForDirection::Downto
        } else {
            self.expect_keyword(KeywordId::To, "in for statement");
            ForDirection::To
        };
        let to = self.expression();
        self.expect_keyword(KeywordId::Do, "after for bounds");
        Stmt::For {
            var,
            from,
            direction,
            to,
            body: Box::new(self.statement()),
        }
    }

    fn case_statement(&mut self) -> Stmt {
        self.pos += 1; // 'case'
        let selector = self.expression();
        self.expect_keyword(KeywordId::Of, "after case selector");
        let mut arms = Vec::new();
        let mut else_branch = None;
        loop {
            if self.is_at_end() || self.check_keyword(KeywordId::End) {
                break;
            }
            if self.match_keyword(KeywordId::Else) {
                else_branch = Some(self.statement_list(&[KeywordId::End]));
                break;
            }
            let mut labels = Vec::new();
            loop {
                let low = self.expression();
                if self.match_token(&TokenKind::DotDot) {
                    let high = self.expression();
                    let span = low.span.merge(high.span);
                    labels.push(Spanned::new(
                        Expr::Range {
                            low: Box::new(low),
                            high: Box::new(high),
                        },
                        span,
                    ));
                } else {
                    labels.push(low);
                }
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect_token(&TokenKind::Colon, "':' after case labels");
            let body = self.statement();
            arms.push(CaseArm { labels, body });
            self.match_token(&TokenKind::Semicolon);
        }
        self.expect_keyword(KeywordId::End, "after case statement");
        Stmt::Case {
            selector,
            arms,
            else_branch,
        }
    }

    fn try_statement(&mut self) -> Stmt {
        self.pos += 1; // 'try'
        let body = self.statement_list(&[KeywordId::Except, KeywordId::Finally, KeywordId::End]);
        let handler = if self.match_keyword(KeywordId::Finally) {
            TryHandler::Finally(self.statement_list(&[KeywordId::End]))
        } else {
            self.expect_keyword(KeywordId::Except, "after try body");
            self.except_clause()
        };
        self.expect_keyword(KeywordId::End, "after try statement");
        Stmt::Try { body, handler }
    }

    fn except_clause(&mut self) -> TryHandler {
        let mut handlers = Vec::new();
        let mut else_branch = None;
        if self.check_keyword(KeywordId::On) {
            while self.match_keyword(KeywordId::On) {
                // `on E: EFoo do ...` — the variable is optional.
                let (var, exception_type) = if self.check_ident()
                    && self.peek_next().is_some_and(|t| t.kind == TokenKind::Colon)
                {
                    let var = self.expect_ident("after 'on'");
                    self.pos += 1; // ':'
                    (Some(var), self.type_ref())
                } else {
                    (None, self.type_ref())
                };
                self.expect_keyword(KeywordId::Do, "after exception type");
                let body = self.statement();
                handlers.push(ExceptHandler {
                    var,
                    exception_type,
                    body,
                });
                self.match_token(&TokenKind::Semicolon);
            }
            if self.match_keyword(KeywordId::Else) {
                else_branch = Some(self.statement_list(&[KeywordId::End]));
            }
            TryHandler::Except {
                handlers,
                body: Vec::new(),
                else_branch,
            }
        } else {
            TryHandler::Except {
                handlers,
                body: self.statement_list(&[KeywordId::End]),
                else_branch,
            }
        }
    }

    fn raise_statement(&mut self) -> Stmt {
        self.pos += 1; // 'raise'
        // Bare `raise;` re-raises the active exception.
        if self.check(&TokenKind::Semicolon)
            || self.check_keyword(KeywordId::End)
            || self.check_keyword(KeywordId::Else)
            || self.is_at_end()
        {
            return Stmt::Raise(None);
        }
        Stmt::Raise(Some(self.expression()))
    }

    fn with_statement(&mut self) -> Stmt {
        self.pos += 1; // 'with'
        let mut contexts = vec![self.expression()];
        while self.match_token(&TokenKind::Comma) {
            contexts.push(self.expression());
        }
        self.expect_keyword(KeywordId::Do, "after with contexts");
        Stmt::With {
            contexts,
            body: Box::new(self.statement()),
        }
    }
}
