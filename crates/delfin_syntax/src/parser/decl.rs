/// Declaration parsing: sections, uses clauses, type/const/var/label blocks,
/// routine declarations, and structured-type bodies.

impl<'a> Parser<'a> {
    /// Parse one unit section (interface or implementation).
    ///
    /// `allow_bodies` is true in the implementation section and in program files,
    /// where routines carry their blocks.
    fn section(&mut self, allow_bodies: bool) -> Section {
        let mut section = Section::default();
        if self.match_keyword(KeywordId::Uses) {
            section.uses = self.uses_clause();
        }
        loop {
            if self.is_at_end()
                || self.check_keyword(KeywordId::Implementation)
                || self.check_keyword(KeywordId::End)
            {
                break;
            }
            // A program's main block terminates the declaration list.
            if self.check_keyword(KeywordId::Begin) && allow_bodies {
                break;
            }
            // `initialization` / `finalization` are contextual; their statements are
            // represented as synthetic routines so the analyzer sees uniform shapes.
            if let Some(name) = self.peek().and_then(|t| t.ident()) {
                if name.eq_ignore_ascii_case("initialization") || name.eq_ignore_ascii_case("finalization") {
                    let decl = self.special_block();
                    section.decls.push(decl);
                    continue;
                }
            }
            let before = self.pos;
            match self.declaration(allow_bodies) {
                Some(decl) => {
                    section.decls.push(decl);
                    section.decls.append(&mut self.pending_decls);
                }
                None => {
                    let span = self.current_span();
                    self.diagnostics
                        .push(Diagnostic::syntax("Expected declaration", span));
                    self.synchronize();
                    if self.pos == before {
                        // Ensure forward progress even if synchronize stopped here.
                        self.pos += 1;
                    }
                }
            }
        }
        section
    }

    fn uses_clause(&mut self) -> Vec<Spanned<QualifiedName>> {
        let mut units = Vec::new();
        loop {
            let start = self.current_span();
            let name = self.qualified_name();
            units.push(Spanned::new(name, start.merge(self.previous_span())));
            // `UnitName in 'path.pas'` — the path matters for the host, not the tree.
            if self.match_keyword(KeywordId::In) {
                self.advance();
            }
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect_semicolon("after uses clause");
        units
    }

    /// `initialization`/`finalization` blocks, wrapped as synthetic routines.
    fn special_block(&mut self) -> Spanned<Decl> {
        let name_tok = self.expect_ident("");
        let start = name_tok.span;
        let mut stmts = Vec::new();
        while !self.is_at_end() && !self.check_keyword(KeywordId::End) {
            if let Some(name) = self.peek().and_then(|t| t.ident()) {
                if name.eq_ignore_ascii_case("finalization") {
                    break;
                }
            }
            stmts.push(self.statement());
            self.match_token(&TokenKind::Semicolon);
        }
        let span = start.merge(self.previous_span());
        let routine = RoutineDecl {
            attributes: Vec::new(),
            kind: RoutineKind::Procedure,
            name: Spanned::new(QualifiedName::simple(format!("<{}>", name_tok.node.to_ascii_lowercase())), start),
            type_params: Vec::new(),
            params: Vec::new(),
            return_type: None,
            directives: Vec::new(),
            is_class_method: false,
            body: Some(Block {
                decls: Vec::new(),
                body: stmts,
            }),
        };
        Spanned::new(Decl::Routine(routine), span)
    }

    /// One top-level (or block-local) declaration, or `None` when the current token
    /// cannot start one.
    fn declaration(&mut self, allow_bodies: bool) -> Option<Spanned<Decl>> {
        let attributes = self.attributes();
        let start = self.current_span();
        let token = self.peek()?;
        let decl = match &token.kind {
            TokenKind::Keyword(KeywordId::Type) => {
                self.pos += 1;
                return self.type_block(attributes, start);
            }
            TokenKind::Keyword(KeywordId::Const) => {
                self.pos += 1;
                return self.const_block(attributes, start);
            }
            TokenKind::Keyword(KeywordId::Var | KeywordId::Threadvar) => {
                self.pos += 1;
                return self.var_block(attributes, start);
            }
            TokenKind::Keyword(KeywordId::Label) => {
                self.pos += 1;
                let mut labels = Vec::new();
                loop {
                    labels.push(self.expect_ident("in label declaration"));
                    if !self.match_token(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect_semicolon("after label declaration");
                Decl::Label(labels)
            }
            TokenKind::Keyword(
                KeywordId::Procedure
                | KeywordId::Function
                | KeywordId::Constructor
                | KeywordId::Destructor
                | KeywordId::Operator,
            ) => {
                let mut routine = self.routine_decl(allow_bodies, false);
                routine.attributes = attributes;
                Decl::Routine(routine)
            }
            TokenKind::Keyword(KeywordId::Class)
                if self.peek_next().is_some_and(|t| {
                    matches!(
                        t.kind,
                        TokenKind::Keyword(
                            KeywordId::Procedure
                                | KeywordId::Function
                                | KeywordId::Constructor
                                | KeywordId::Destructor
                                | KeywordId::Operator
                        )
                    )
                }) =>
            {
                self.pos += 1;
                let mut routine = self.routine_decl(allow_bodies, true);
                routine.attributes = attributes;
                Decl::Routine(routine)
            }
            _ => return None,
        };
        Some(Spanned::new(decl, start.merge(self.previous_span())))
    }

    // ========================================================================
    // Attribute groups
    // ========================================================================

    /// Zero or more `[Attr, Attr(args)]` groups preceding a declaration.
    fn attributes(&mut self) -> Vec<Attribute> {
        let mut attributes = Vec::new();
        while self.check(&TokenKind::LBracket) && self.peek_next().is_some_and(|t| matches!(t.kind, TokenKind::Ident(_)))
        {
            self.pos += 1; // '['
            loop {
                let start = self.current_span();
                let name = self.qualified_name();
                let name = Spanned::new(name, start.merge(self.previous_span()));
                let mut args = Vec::new();
                if self.match_token(&TokenKind::LParen) {
                    if !self.check(&TokenKind::RParen) {
                        loop {
                            args.push(self.expression());
                            if !self.match_token(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect_token(&TokenKind::RParen, "')' after attribute arguments");
                }
                attributes.push(Attribute { name, args });
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect_token(&TokenKind::RBracket, "']' after attributes");
        }
        attributes
    }

    // ========================================================================
    // type / const / var blocks
    // ========================================================================

    /// A `type` block: a run of `Name = <type>;` declarations. Returns the first
    /// declaration and pushes the rest (blocks flatten into the section).
    fn type_block(&mut self, mut attributes: Vec<Attribute>, start: Span) -> Option<Spanned<Decl>> {
        let mut first: Option<Spanned<Decl>> = None;
        if attributes.is_empty() {
            attributes = self.attributes();
        }
        while self.check_ident() || !attributes.is_empty() {
            let decl_start = if first.is_none() { start } else { self.current_span() };
            let name = self.expect_ident("in type declaration");
            let type_params = self.type_params();
            if !self.expect_token(&TokenKind::Eq, "'=' in type declaration") {
                self.synchronize();
                attributes = self.attributes();
                continue;
            }
            let body = self.type_desc(true);
            self.match_token(&TokenKind::Semicolon);
            let decl = Spanned::new(
                Decl::Type(TypeDecl {
                    attributes: std::mem::take(&mut attributes),
                    name,
                    type_params,
                    body,
                }),
                decl_start.merge(self.previous_span()),
            );
            match first {
                None => first = Some(decl),
                Some(_) => self.pending_decls.push(decl),
            }
            attributes = self.attributes();
        }
        first
    }

    fn const_block(&mut self, mut attributes: Vec<Attribute>, start: Span) -> Option<Spanned<Decl>> {
        let mut first: Option<Spanned<Decl>> = None;
        if attributes.is_empty() {
            attributes = self.attributes();
        }
        while self.check_ident() || !attributes.is_empty() {
            let decl_start = if first.is_none() { start } else { self.current_span() };
            let name = self.expect_ident("in const declaration");
            let ty = if self.match_token(&TokenKind::Colon) {
                Some(self.type_ref())
            } else {
                None
            };
            if !self.expect_token(&TokenKind::Eq, "'=' in const declaration") {
                self.synchronize();
                attributes = self.attributes();
                continue;
            }
            let value = self.expression();
            self.match_token(&TokenKind::Semicolon);
            let decl = Spanned::new(
                Decl::Const(ConstDecl {
                    attributes: std::mem::take(&mut attributes),
                    name,
                    ty,
                    value,
                }),
                decl_start.merge(self.previous_span()),
            );
            match first {
                None => first = Some(decl),
                Some(_) => self.pending_decls.push(decl),
            }
            attributes = self.attributes();
        }
        first
    }

    fn var_block(&mut self, mut attributes: Vec<Attribute>, start: Span) -> Option<Spanned<Decl>> {
        let mut first: Option<Spanned<Decl>> = None;
        if attributes.is_empty() {
            attributes = self.attributes();
        }
        while self.check_ident() || !attributes.is_empty() {
            let decl_start = if first.is_none() { start } else { self.current_span() };
            let mut names = vec![self.expect_ident("in var declaration")];
            while self.match_token(&TokenKind::Comma) {
                names.push(self.expect_ident("after ','"));
            }
            if !self.expect_token(&TokenKind::Colon, "':' in var declaration") {
                self.synchronize();
                attributes = self.attributes();
                continue;
            }
            let ty = self.type_ref();
            let initializer = if self.match_token(&TokenKind::Eq) {
                Some(self.expression())
            } else {
                None
            };
            self.match_token(&TokenKind::Semicolon);
            let decl = Spanned::new(
                Decl::Var(VarDecl {
                    attributes: std::mem::take(&mut attributes),
                    names,
                    ty,
                    initializer,
                }),
                decl_start.merge(self.previous_span()),
            );
            match first {
                None => first = Some(decl),
                Some(_) => self.pending_decls.push(decl),
            }
            attributes = self.attributes();
        }
        first
    }

    // ========================================================================
    // Routines
    // ========================================================================

    fn routine_decl(&mut self, allow_body: bool, is_class_method: bool) -> RoutineDecl {
        let kind = match self.advance().map(|t| &t.kind) {
            Some(TokenKind::Keyword(KeywordId::Function)) => RoutineKind::Function,
            Some(TokenKind::Keyword(KeywordId::Constructor)) => RoutineKind::Constructor,
            Some(TokenKind::Keyword(KeywordId::Destructor)) => RoutineKind::Destructor,
            Some(TokenKind::Keyword(KeywordId::Operator)) => RoutineKind::Operator,
            _ => RoutineKind::Procedure,
        };
        let name_start = self.current_span();
        let name = self.qualified_name();
        let name = Spanned::new(name, name_start.merge(self.previous_span()));
        let type_params = self.type_params();
        let params = self.formal_params();
        let return_type = if self.match_token(&TokenKind::Colon) {
            Some(self.type_ref())
        } else {
            None
        };
        self.expect_semicolon("after routine heading");
        let directives = self.routine_directives();

        let has_body = allow_body
            && !directives.contains(&RoutineDirectiveId::Forward)
            && !directives.contains(&RoutineDirectiveId::External)
            && self.peek().is_some_and(|t| {
                matches!(
                    t.kind,
                    TokenKind::Keyword(
                        KeywordId::Begin
                            | KeywordId::Var
                            | KeywordId::Const
                            | KeywordId::Type
                            | KeywordId::Label
                            | KeywordId::Procedure
                            | KeywordId::Function
                    )
                )
            });
        let body = if has_body {
            let block = self.block();
            self.match_token(&TokenKind::Semicolon);
            Some(block)
        } else {
            None
        };

        RoutineDecl {
            attributes: Vec::new(),
            kind,
            name,
            type_params,
            params,
            return_type,
            directives,
            is_class_method,
            body,
        }
    }

    /// `(a, b: Integer; const s: string = '')` — or no parentheses at all.
    fn formal_params(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        if !self.match_token(&TokenKind::LParen) {
            return params;
        }
        if self.match_token(&TokenKind::RParen) {
            return params;
        }
        loop {
            let modifier = if self.match_keyword(KeywordId::Var) {
                ParamModifier::Var
            } else if self.match_keyword(KeywordId::Const) {
                ParamModifier::Const
            } else if self.match_keyword(KeywordId::Out) {
                ParamModifier::Out
            } else {
                ParamModifier::None
            };
            let mut names = vec![self.expect_ident("in parameter list")];
            while self.match_token(&TokenKind::Comma) {
                names.push(self.expect_ident("after ','"));
            }
            let ty = if self.match_token(&TokenKind::Colon) {
                Some(self.param_type_ref())
            } else {
                None // untyped var/const parameter
            };
            let default = if self.match_token(&TokenKind::Eq) {
                Some(self.expression())
            } else {
                None
            };
            params.push(Param {
                modifier,
                names,
                ty,
                default,
            });
            if !self.match_token(&TokenKind::Semicolon) {
                break;
            }
        }
        self.expect_token(&TokenKind::RParen, "')' after parameter list");
        params
    }

    /// Contextual directives after a routine heading (`overload; virtual; ...`).
    /// Unknown trailing material up to the ';' (e.g. `external 'dll' name '...'`,
    /// `message WM_USER`) is skipped.
    fn routine_directives(&mut self) -> Vec<RoutineDirectiveId> {
        let mut directives = Vec::new();
        while let Some(id) = self.peek_routine_directive() {
            directives.push(id);
            self.pos += 1;
            while !self.is_at_end() && !self.check(&TokenKind::Semicolon) {
                self.pos += 1;
            }
            self.match_token(&TokenKind::Semicolon);
        }
        directives
    }

    /// A routine body: local declaration list plus compound statement.
    fn block(&mut self) -> Block {
        let mut decls = Vec::new();
        while !self.is_at_end() && !self.check_keyword(KeywordId::Begin) {
            match self.declaration(true) {
                Some(decl) => {
                    decls.push(decl);
                    decls.append(&mut self.pending_decls);
                }
                None => {
                    let span = self.current_span();
                    self.diagnostics
                        .push(Diagnostic::syntax("Expected declaration or 'begin'", span));
                    self.synchronize();
                    if self.check_keyword(KeywordId::End) {
                        break;
                    }
                }
            }
        }
        let body = match self.compound_statement().node {
            Stmt::Compound(stmts) => stmts,
            other => vec![Spanned::new(other, self.previous_span())],
        };
        Block { decls, body }
    }

    // ========================================================================
    // Structured-type bodies
    // ========================================================================

    /// Members of a class/record/interface/helper, organized into visibility
    /// sections. Members before any visibility keyword form an implicit section.
    fn visibility_sections(&mut self, default_visibility: Visibility) -> Vec<Spanned<VisibilitySection>> {
        let mut sections: Vec<Spanned<VisibilitySection>> = Vec::new();
        let mut current = VisibilitySection {
            visibility: default_visibility,
            is_implicit: true,
            members: Vec::new(),
        };
        let mut current_start = self.current_span();

        loop {
            if self.is_at_end() || self.check_keyword(KeywordId::End) {
                break;
            }
            if let Some(visibility) = self.visibility_keyword() {
                // Close the running section. The implicit leading section is only
                // materialized when it actually has members.
                if !current.is_implicit || !current.members.is_empty() {
                    sections.push(Spanned::new(current, current_start.merge(self.previous_span())));
                }
                current_start = self.current_span();
                self.pos += if self.check_keyword(KeywordId::Strict) { 2 } else { 1 };
                current = VisibilitySection {
                    visibility,
                    is_implicit: false,
                    members: Vec::new(),
                };
                continue;
            }
            match self.struct_member() {
                Some(member) => {
                    current.members.push(member);
                    current.members.append(&mut self.pending_decls);
                }
                None => {
                    let span = self.current_span();
                    self.diagnostics
                        .push(Diagnostic::syntax("Expected member declaration", span));
                    self.synchronize();
                    if self.is_at_end() {
                        break;
                    }
                }
            }
        }

        if !current.is_implicit || !current.members.is_empty() {
            sections.push(Spanned::new(current, current_start.merge(self.previous_span())));
        }
        sections
    }

    /// The visibility keyword at the current position, without consuming it.
    fn visibility_keyword(&self) -> Option<Visibility> {
        let token = self.peek()?;
        match token.kind {
            TokenKind::Keyword(KeywordId::Published) => Some(Visibility::Published),
            TokenKind::Keyword(KeywordId::Public) => Some(Visibility::Public),
            TokenKind::Keyword(KeywordId::Protected) => Some(Visibility::Protected),
            TokenKind::Keyword(KeywordId::Private) => Some(Visibility::Private),
            TokenKind::Keyword(KeywordId::Strict) => match self.peek_next().map(|t| &t.kind) {
                Some(TokenKind::Keyword(KeywordId::Private)) => Some(Visibility::StrictPrivate),
                Some(TokenKind::Keyword(KeywordId::Protected)) => Some(Visibility::StrictProtected),
                _ => None,
            },
            _ => None,
        }
    }

    /// One member of a structured type: field, routine heading, property, or a
    /// nested const/type/var block.
    fn struct_member(&mut self) -> Option<Spanned<Decl>> {
        let attributes = self.attributes();
        let start = self.current_span();
        let token = self.peek()?;
        let decl = match &token.kind {
            TokenKind::Keyword(
                KeywordId::Procedure
                | KeywordId::Function
                | KeywordId::Constructor
                | KeywordId::Destructor
                | KeywordId::Operator,
            ) => {
                let mut routine = self.routine_decl(false, false);
                routine.attributes = attributes;
                Decl::Routine(routine)
            }
            TokenKind::Keyword(KeywordId::Class)
                if self.peek_next().is_some_and(|t| {
                    matches!(
                        t.kind,
                        TokenKind::Keyword(
                            KeywordId::Procedure
                                | KeywordId::Function
                                | KeywordId::Constructor
                                | KeywordId::Destructor
                                | KeywordId::Operator
                        )
                    )
                }) =>
            {
                self.pos += 1;
                let mut routine = self.routine_decl(false, true);
                routine.attributes = attributes;
                Decl::Routine(routine)
            }
            TokenKind::Keyword(KeywordId::Class)
                if self.peek_next().is_some_and(|t| t.is_keyword(KeywordId::Var)) =>
            {
                self.pos += 2;
                return self.var_block(attributes, start);
            }
            TokenKind::Keyword(KeywordId::Property) => {
                self.pos += 1;
                Decl::Property(self.property_decl())
            }
            TokenKind::Keyword(KeywordId::Const) => {
                self.pos += 1;
                return self.const_block(attributes, start);
            }
            TokenKind::Keyword(KeywordId::Type) => {
                self.pos += 1;
                return self.type_block(attributes, start);
            }
            TokenKind::Keyword(KeywordId::Var) => {
                self.pos += 1;
                return self.var_block(attributes, start);
            }
            TokenKind::Ident(_) => {
                // A field group: `a, b: T;`
                let mut names = vec![self.expect_ident("in field declaration")];
                while self.match_token(&TokenKind::Comma) {
                    names.push(self.expect_ident("after ','"));
                }
                if !self.expect_token(&TokenKind::Colon, "':' in field declaration") {
                    return None;
                }
                let ty = self.type_ref();
                self.match_token(&TokenKind::Semicolon);
                Decl::Var(VarDecl {
                    attributes,
                    names,
                    ty,
                    initializer: None,
                })
            }
            _ => return None,
        };
        Some(Spanned::new(decl, start.merge(self.previous_span())))
    }

    /// `property Name: TType read FName write FName;` — accessors beyond
    /// read/write are skipped up to the ';'.
    fn property_decl(&mut self) -> PropertyDecl {
        let name = self.expect_ident("after 'property'");
        // Indexed property parameters: `property Items[I: Integer]: T ...`
        if self.match_token(&TokenKind::LBracket) {
            while !self.is_at_end() && !self.match_token(&TokenKind::RBracket) {
                self.pos += 1;
            }
        }
        let ty = if self.match_token(&TokenKind::Colon) {
            Some(self.type_ref())
        } else {
            None
        };
        let mut reader = None;
        let mut writer = None;
        while !self.is_at_end() && !self.check(&TokenKind::Semicolon) {
            match self.peek().and_then(|t| t.ident()) {
                Some(s) if s.eq_ignore_ascii_case("read") => {
                    self.pos += 1;
                    reader = Some(self.expect_ident("after 'read'"));
                }
                Some(s) if s.eq_ignore_ascii_case("write") => {
                    self.pos += 1;
                    writer = Some(self.expect_ident("after 'write'"));
                }
                _ => {
                    self.pos += 1;
                }
            }
        }
        self.match_token(&TokenKind::Semicolon);
        PropertyDecl { name, ty, reader, writer }
    }
}
