/// Parser core types and entrypoint.
///
/// This chunk defines the [`Parser`] type and its top-level `parse()` entrypoint.
///
/// ## Notes
/// - This file is `include!`'d into `crate::parser` to keep all parser methods in a
///   single module while avoiding one "god file".

/// Parse a filtered token stream into a best-effort [`Module`] plus diagnostics.
pub fn parse(tokens: &[Token]) -> (Module, Vec<Diagnostic>) {
    Parser::new(tokens).parse_module()
}

/// Parser state.
///
/// ## Notes
/// - Directive tokens surviving preprocessing are annotations, not grammar; the
///   parser drops them up front so every lookahead sees real grammar tokens.
/// - The parser is single-pass and recovers from errors by synchronizing at
///   declaration/statement boundaries.
pub struct Parser<'a> {
    tokens: Vec<&'a Token>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
    /// Overflow from multi-declaration blocks (`type A = ...; B = ...;`):
    /// block parsers return the first declaration and queue the rest here.
    pending_decls: Vec<Spanned<Decl>>,
    eof_span: Span,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        let eof_span = tokens.last().map(|t| t.span).unwrap_or_default();
        let tokens: Vec<&Token> = tokens
            .iter()
            .filter(|t| !matches!(t.kind, TokenKind::Directive(_) | TokenKind::Eof))
            .collect();
        Self {
            tokens,
            pos: 0,
            diagnostics: Vec::new(),
            pending_decls: Vec::new(),
            eof_span,
        }
    }

    /// Parse the entire stream into a [`Module`].
    ///
    /// A missing or malformed header degrades to an anonymous program so that
    /// declaration parsing (and everything downstream) still runs.
    pub fn parse_module(mut self) -> (Module, Vec<Diagnostic>) {
        let (kind, name) = self.module_header();

        let mut module = Module {
            kind,
            name,
            interface: Section::default(),
            implementation: Section::default(),
        };

        match kind {
            ModuleKind::Unit => {
                if !self.match_keyword(KeywordId::Interface) {
                    self.diagnostics.push(Diagnostic::syntax(
                        "Expected 'interface' after unit header",
                        self.current_span(),
                    ));
                }
                module.interface = self.section(false);
                if self.match_keyword(KeywordId::Implementation) {
                    module.implementation = self.section(true);
                }
            }
            ModuleKind::Program | ModuleKind::Library => {
                module.interface = self.section(true);
                // Main block of a program: `begin ... end.`
                if self.check_keyword(KeywordId::Begin) {
                    let stmt = self.compound_statement();
                    module
                        .implementation
                        .decls
                        .push(Spanned::new(Decl::Routine(main_block(stmt.node)), stmt.span));
                }
            }
        }

        self.match_keyword(KeywordId::End);
        self.match_token(&TokenKind::Dot);
        if !self.is_at_end() {
            let span = self.current_span();
            self.diagnostics
                .push(Diagnostic::syntax("Unexpected tokens after final 'end.'", span));
        }

        (module, self.diagnostics)
    }

    fn module_header(&mut self) -> (ModuleKind, QualifiedName) {
        let kind = if self.match_keyword(KeywordId::Unit) {
            ModuleKind::Unit
        } else if self.match_keyword(KeywordId::Program) {
            ModuleKind::Program
        } else if self.match_keyword(KeywordId::Library) {
            ModuleKind::Library
        } else {
            self.diagnostics.push(Diagnostic::syntax(
                "Expected 'unit', 'program', or 'library'",
                self.current_span(),
            ));
            return (ModuleKind::Program, QualifiedName::simple("<anonymous>"));
        };
        let name = self.qualified_name();
        self.expect_semicolon("after module header");
        (kind, name)
    }
}

/// Wrap a program's main `begin..end` block as a parameterless routine so the
/// analyzer sees one uniform shape for executable code.
fn main_block(body: Stmt) -> RoutineDecl {
    let stmts = match body {
        Stmt::Compound(stmts) => stmts,
        other => vec![Spanned::new(other, Span::default())],
    };
    RoutineDecl {
        attributes: Vec::new(),
        kind: RoutineKind::Procedure,
        name: Spanned::new(QualifiedName::simple("<main>"), Span::default()),
        type_params: Vec::new(),
        params: Vec::new(),
        return_type: None,
        directives: Vec::new(),
        is_class_method: false,
        body: Some(Block {
            decls: Vec::new(),
            body: stmts,
        }),
    }
}
