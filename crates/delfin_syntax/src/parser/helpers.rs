/// Low-level parser helpers: token navigation, matching, and recovery.

impl<'a> Parser<'a> {
    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn current_span(&self) -> Span {
        self.peek().map(|t| t.span).unwrap_or(self.eof_span)
    }

    fn previous_span(&self) -> Span {
        self.tokens
            .get(self.pos.saturating_sub(1))
            .map(|t| t.span)
            .unwrap_or(self.eof_span)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek().is_some_and(|t| t.kind == *kind)
    }

    fn check_keyword(&self, id: KeywordId) -> bool {
        self.peek().is_some_and(|t| t.is_keyword(id))
    }

    fn check_ident(&self) -> bool {
        self.peek().is_some_and(|t| matches!(t.kind, TokenKind::Ident(_)))
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn match_keyword(&mut self, id: KeywordId) -> bool {
        if self.check_keyword(id) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_token(&mut self, kind: &TokenKind, msg: &str) -> bool {
        if self.match_token(kind) {
            true
        } else {
            let span = self.current_span();
            self.diagnostics
                .push(Diagnostic::syntax(format!("Expected {msg}"), span));
            false
        }
    }

    fn expect_keyword(&mut self, id: KeywordId, context: &str) -> bool {
        if self.match_keyword(id) {
            true
        } else {
            let span = self.current_span();
            self.diagnostics.push(Diagnostic::syntax(
                format!("Expected '{}' {context}", keywords::as_str(id)),
                span,
            ));
            false
        }
    }

    fn expect_semicolon(&mut self, context: &str) {
        if !self.match_token(&TokenKind::Semicolon) {
            let span = self.current_span();
            self.diagnostics
                .push(Diagnostic::syntax(format!("Expected ';' {context}"), span));
        }
    }

    /// Consume an identifier, recovering with a placeholder on failure.
    fn expect_ident(&mut self, context: &str) -> Spanned<Ident> {
        let span = self.current_span();
        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Spanned::new(name, span)
            }
            _ => {
                self.diagnostics
                    .push(Diagnostic::syntax(format!("Expected identifier {context}"), span));
                Spanned::new("<error>".to_string(), span)
            }
        }
    }

    /// `A.B.C` — at least one identifier.
    fn qualified_name(&mut self) -> QualifiedName {
        let mut parts = vec![self.expect_ident("in qualified name").node];
        while self.check(&TokenKind::Dot) && self.peek_next().is_some_and(|t| matches!(t.kind, TokenKind::Ident(_))) {
            self.pos += 1; // '.'
            parts.push(self.expect_ident("after '.'").node);
        }
        QualifiedName { parts }
    }

    /// A contextual routine directive at the current position, if any.
    fn peek_routine_directive(&self) -> Option<RoutineDirectiveId> {
        self.peek()
            .and_then(|t| t.ident())
            .and_then(keywords::routine_directive_from_str)
    }

    /// Skip forward to just past the next ';', or to a safe section keyword.
    fn synchronize(&mut self) {
        while let Some(token) = self.peek() {
            match &token.kind {
                TokenKind::Semicolon => {
                    self.pos += 1;
                    return;
                }
                TokenKind::Keyword(
                    KeywordId::Type
                    | KeywordId::Const
                    | KeywordId::Var
                    | KeywordId::Procedure
                    | KeywordId::Function
                    | KeywordId::Implementation
                    | KeywordId::Begin
                    | KeywordId::End,
                ) => return,
                _ => {
                    self.pos += 1;
                }
            }
        }
    }
}
