//! Name resolution.
//!
//! Two passes over a parsed module. The first collects every declaration into the
//! symbol table, building member scopes for structured types and merging forward
//! declarations with their completions. The second walks routine bodies and
//! initializers, binding each name reference to its declaration through a
//! span-keyed side table. Resolution never fails; unresolved names become
//! diagnostics and the reference simply stays unbound.

use std::collections::HashMap;

use delfin_core::lang::{intrinsic_routines, intrinsic_types, keywords::RoutineDirectiveId};
use delfin_core::strings;
use delfin_syntax::ast::{
    Block, ConstDecl, Decl, Expr, Module, Param, RoutineDecl, RoutineKind, Section, Span, Spanned,
    Stmt, TryHandler, TypeDecl, TypeDesc, TypeRef, VarDecl,
};
use delfin_syntax::diagnostics::{Diagnostic, DiagnosticKind};

use crate::frontend::symbols::{
    ConstSymbol, DefineOutcome, PropertySymbol, RoutineSymbol, ScopeId, ScopeKind, Symbol,
    SymbolId, SymbolKind, SymbolTable, TypeSymbol, VariableSymbol,
};

/// Everything resolution produces for one module.
#[derive(Debug)]
pub struct Resolution {
    pub symbols: SymbolTable,
    /// Binding of each resolved name reference, keyed by the reference's span.
    pub name_refs: HashMap<Span, SymbolId>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Resolve all names in a module. Pure in the module: resolving the same tree
/// twice yields identical tables.
pub fn resolve(module: &Module) -> Resolution {
    let mut resolver = Resolver {
        symbols: SymbolTable::new(),
        name_refs: HashMap::new(),
        diagnostics: Vec::new(),
        suppress_depth: 0,
    };

    resolver.symbols.define(Symbol {
        name: module.name.simple_name().to_string(),
        kind: SymbolKind::UnitName,
        span: Span::default(),
        scope: 0,
    });

    resolver.collect_section(&module.interface);
    resolver.collect_section(&module.implementation);
    resolver.resolve_section(&module.interface);
    resolver.resolve_section(&module.implementation);

    Resolution {
        symbols: resolver.symbols,
        name_refs: resolver.name_refs,
        diagnostics: resolver.diagnostics,
    }
}

struct Resolver {
    symbols: SymbolTable,
    name_refs: HashMap<Span, SymbolId>,
    diagnostics: Vec<Diagnostic>,
    /// Positive inside `with` bodies and `inherited` expressions, where names
    /// legitimately bind outside the lexical scope chain.
    suppress_depth: usize,
}

impl Resolver {
    // ========================================================================
    // Pass 1: declaration collection
    // ========================================================================

    fn collect_section(&mut self, section: &Section) {
        for unit in &section.uses {
            // Used unit names resolve so `SysUtils.Format` style references work.
            // A unit listed twice is tolerated here; it is a style concern.
            self.symbols.define(Symbol {
                name: unit.node.simple_name().to_string(),
                kind: SymbolKind::UnitName,
                span: unit.span,
                scope: 0,
            });
        }
        for decl in &section.decls {
            self.collect_decl(&decl.node);
        }
    }

    fn collect_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Type(ty) => self.collect_type(ty),
            Decl::Const(c) => self.collect_const(c),
            Decl::Var(v) => self.collect_var(v),
            Decl::Routine(r) => self.collect_routine(r),
            Decl::Property(p) => {
                self.define_checked(Symbol {
                    name: p.name.node.clone(),
                    kind: SymbolKind::Property(PropertySymbol { ty: p.ty.clone() }),
                    span: p.name.span,
                    scope: 0,
                });
            }
            Decl::Label(names) => {
                for name in names {
                    self.define_checked(Symbol {
                        name: name.node.clone(),
                        kind: SymbolKind::Label,
                        span: name.span,
                        scope: 0,
                    });
                }
            }
        }
    }

    fn collect_const(&mut self, c: &ConstDecl) {
        self.define_checked(Symbol {
            name: c.name.node.clone(),
            kind: SymbolKind::Const(ConstSymbol {
                ty: c.ty.clone(),
                value: c.value.clone(),
            }),
            span: c.name.span,
            scope: 0,
        });
    }

    fn collect_var(&mut self, v: &VarDecl) {
        for name in &v.names {
            self.define_checked(Symbol {
                name: name.node.clone(),
                kind: SymbolKind::Variable(VariableSymbol { ty: v.ty.clone() }),
                span: name.span,
                scope: 0,
            });
        }
    }

    fn collect_type(&mut self, decl: &TypeDecl) {
        let (members, heritage) = match &decl.body {
            TypeDesc::Struct(s) => {
                let members = self.collect_members(&s.sections);
                let heritage = s
                    .heritage
                    .iter()
                    .filter_map(|h| match &h.node {
                        TypeRef::Named { name, .. } => Some(name.clone()),
                        TypeRef::Inline(_) => None,
                    })
                    .collect();
                (Some(members), heritage)
            }
            TypeDesc::Helper(h) => (Some(self.collect_members(&h.sections)), Vec::new()),
            _ => (None, Vec::new()),
        };

        let id = self.define_checked(Symbol {
            name: decl.name.node.clone(),
            kind: SymbolKind::Type(TypeSymbol {
                body: decl.body.clone(),
                members,
                heritage,
            }),
            span: decl.name.span,
            scope: 0,
        });

        match &decl.body {
            // Enum values are visible alongside the enum type itself.
            TypeDesc::Enum(values) => {
                for value in values {
                    self.define_checked(Symbol {
                        name: value.node.clone(),
                        kind: SymbolKind::EnumValue { owner: id },
                        span: value.span,
                        scope: 0,
                    });
                }
            }
            TypeDesc::Helper(h) => {
                if let TypeRef::Named { name, .. } = &h.extended.node {
                    self.symbols.register_helper(name.simple_name(), id);
                }
            }
            _ => {}
        }
    }

    /// Build the member scope of a structured type or helper. All visibility
    /// sections share one scope; visibility enforcement is not modeled.
    fn collect_members(&mut self, sections: &[Spanned<delfin_syntax::ast::VisibilitySection>]) -> ScopeId {
        let scope = self.symbols.enter_scope(ScopeKind::Type);
        for section in sections {
            for member in &section.node.members {
                match &member.node {
                    Decl::Var(v) => self.collect_var(v),
                    Decl::Const(c) => self.collect_const(c),
                    Decl::Type(t) => self.collect_type(t),
                    Decl::Routine(r) => {
                        self.define_checked(routine_symbol(r));
                    }
                    Decl::Property(p) => {
                        self.define_checked(Symbol {
                            name: p.name.node.clone(),
                            kind: SymbolKind::Property(PropertySymbol { ty: p.ty.clone() }),
                            span: p.name.span,
                            scope: 0,
                        });
                    }
                    Decl::Label(_) => {}
                }
            }
        }
        self.symbols.exit_scope();
        scope
    }

    fn collect_routine(&mut self, r: &RoutineDecl) {
        if r.name.node.is_qualified() {
            // Method body: merge into the owning type's member scope.
            let Some(members) = self.owner_member_scope(&r.name.node.parts) else {
                return;
            };
            let saved = self.symbols.current_scope();
            self.symbols.set_current_scope(members);
            self.symbols.define(routine_symbol(r));
            self.symbols.set_current_scope(saved);
            return;
        }
        self.define_checked(routine_symbol(r));
    }

    /// Member scope of the type a qualified method name belongs to.
    fn owner_member_scope(&self, parts: &[String]) -> Option<ScopeId> {
        let owner_name = parts.get(parts.len().checked_sub(2)?)?;
        let ids = self.symbols.lookup_from(0, owner_name)?;
        ids.iter().find_map(|&id| match &self.symbols.get(id)?.kind {
            SymbolKind::Type(ty) => ty.members,
            _ => None,
        })
    }

    /// Define with duplicate reporting; returns the surviving symbol either way.
    fn define_checked(&mut self, symbol: Symbol) -> SymbolId {
        let name = symbol.name.clone();
        let span = symbol.span;
        match self.symbols.define(symbol) {
            DefineOutcome::Defined(id) | DefineOutcome::Merged(id) => id,
            DefineOutcome::Duplicate { existing } => {
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::DuplicateIdentifier,
                    format!("Identifier '{name}' is already declared in this scope"),
                    span,
                ));
                existing
            }
        }
    }

    // ========================================================================
    // Pass 2: reference binding
    // ========================================================================

    fn resolve_section(&mut self, section: &Section) {
        for decl in &section.decls {
            match &decl.node {
                Decl::Const(c) => self.resolve_expr(&c.value),
                Decl::Var(v) => {
                    if let Some(init) = &v.initializer {
                        self.resolve_expr(init);
                    }
                }
                Decl::Routine(r) => self.resolve_routine(r),
                _ => {}
            }
        }
    }

    fn resolve_routine(&mut self, r: &RoutineDecl) {
        let saved = self.symbols.current_scope();
        let mut owner_scope = None;
        if r.name.node.is_qualified() {
            if let Some(members) = self.owner_member_scope(&r.name.node.parts) {
                owner_scope = Some(members);
                self.symbols.set_current_scope(members);
            }
        }

        if let Some(ids) = self.symbols.lookup(r.name.node.simple_name()) {
            self.name_refs.insert(r.name.span, ids[0]);
        }

        if let Some(body) = &r.body {
            self.symbols.enter_scope(ScopeKind::Routine);
            if let Some(members) = owner_scope {
                self.define_self(members, r.name.span);
            }
            self.define_params(&r.params);
            if matches!(r.kind, RoutineKind::Function | RoutineKind::Operator) {
                let ty = r
                    .return_type
                    .clone()
                    .unwrap_or_else(|| Spanned::new(TypeRef::named("<unknown>"), r.name.span));
                self.symbols.define(Symbol {
                    name: "Result".to_string(),
                    kind: SymbolKind::Variable(VariableSymbol { ty }),
                    span: r.name.span,
                    scope: 0,
                });
            }
            self.resolve_block(body);
            self.symbols.exit_scope();
        }
        self.symbols.set_current_scope(saved);
    }

    /// `Self` inside a method body, typed as the owning type.
    fn define_self(&mut self, members: ScopeId, span: Span) {
        let owner_name = self
            .symbols
            .get(self.owner_of_scope(members))
            .map(|s| s.name.clone());
        let Some(owner_name) = owner_name else { return };
        self.symbols.define(Symbol {
            name: "Self".to_string(),
            kind: SymbolKind::Variable(VariableSymbol {
                ty: Spanned::new(TypeRef::named(owner_name), span),
            }),
            span,
            scope: 0,
        });
    }

    /// The type symbol whose member scope is `members`. Linear scan; member
    /// scopes are few.
    fn owner_of_scope(&self, members: ScopeId) -> SymbolId {
        for id in 0..self.symbols.len() {
            if let Some(symbol) = self.symbols.get(id) {
                if let SymbolKind::Type(ty) = &symbol.kind {
                    if ty.members == Some(members) {
                        return id;
                    }
                }
            }
        }
        usize::MAX
    }

    fn define_params(&mut self, params: &[Param]) {
        for group in params {
            for name in &group.names {
                let ty = group
                    .ty
                    .clone()
                    .unwrap_or_else(|| Spanned::new(TypeRef::named("<untyped>"), name.span));
                self.symbols.define(Symbol {
                    name: name.node.clone(),
                    kind: SymbolKind::Variable(VariableSymbol { ty }),
                    span: name.span,
                    scope: 0,
                });
            }
        }
    }

    fn resolve_block(&mut self, block: &Block) {
        for decl in &block.decls {
            match &decl.node {
                Decl::Var(v) => {
                    self.collect_var(v);
                    if let Some(init) = &v.initializer {
                        self.resolve_expr(init);
                    }
                }
                Decl::Const(c) => {
                    self.resolve_expr(&c.value);
                    self.collect_const(c);
                }
                Decl::Type(t) => self.collect_type(t),
                Decl::Label(names) => {
                    for name in names {
                        self.define_checked(Symbol {
                            name: name.node.clone(),
                            kind: SymbolKind::Label,
                            span: name.span,
                            scope: 0,
                        });
                    }
                }
                Decl::Routine(nested) => {
                    self.collect_routine(nested);
                    self.resolve_routine(nested);
                }
                Decl::Property(_) => {}
            }
        }
        for stmt in &block.body {
            self.resolve_stmt(&stmt.node);
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Compound(stmts) => {
                for s in stmts {
                    self.resolve_stmt(&s.node);
                }
            }
            Stmt::Assign { target, value } => {
                self.resolve_expr(target);
                self.resolve_expr(value);
            }
            Stmt::Expr(e) => self.resolve_expr(e),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(cond);
                self.resolve_stmt(&then_branch.node);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(&else_branch.node);
                }
            }
            Stmt::While { cond, body } => {
                self.resolve_expr(cond);
                self.resolve_stmt(&body.node);
            }
            Stmt::Repeat { body, until } => {
                for s in body {
                    self.resolve_stmt(&s.node);
                }
                self.resolve_expr(until);
            }
            Stmt::For {
                var,
                from,
                to,
                body,
                ..
            } => {
                self.resolve_expr(from);
                self.resolve_expr(to);
                self.bind_loop_var(var, TypeRef::named("Integer"));
                self.resolve_stmt(&body.node);
            }
            Stmt::ForIn {
                var,
                iterable,
                body,
            } => {
                self.resolve_expr(iterable);
                self.bind_loop_var(var, TypeRef::named("<untyped>"));
                self.resolve_stmt(&body.node);
            }
            Stmt::Case {
                selector,
                arms,
                else_branch,
            } => {
                self.resolve_expr(selector);
                for arm in arms {
                    for label in &arm.labels {
                        self.resolve_expr(label);
                    }
                    self.resolve_stmt(&arm.body.node);
                }
                if let Some(else_branch) = else_branch {
                    for s in else_branch {
                        self.resolve_stmt(&s.node);
                    }
                }
            }
            Stmt::Try { body, handler } => {
                for s in body {
                    self.resolve_stmt(&s.node);
                }
                match handler {
                    TryHandler::Except {
                        handlers,
                        body,
                        else_branch,
                    } => {
                        for h in handlers {
                            self.symbols.enter_scope(ScopeKind::Block);
                            if let Some(var) = &h.var {
                                self.symbols.define(Symbol {
                                    name: var.node.clone(),
                                    kind: SymbolKind::Variable(VariableSymbol {
                                        ty: h.exception_type.clone(),
                                    }),
                                    span: var.span,
                                    scope: 0,
                                });
                            }
                            self.resolve_stmt(&h.body.node);
                            self.symbols.exit_scope();
                        }
                        for s in body {
                            self.resolve_stmt(&s.node);
                        }
                        if let Some(else_branch) = else_branch {
                            for s in else_branch {
                                self.resolve_stmt(&s.node);
                            }
                        }
                    }
                    TryHandler::Finally(stmts) => {
                        for s in stmts {
                            self.resolve_stmt(&s.node);
                        }
                    }
                }
            }
            Stmt::Raise(value) => {
                if let Some(value) = value {
                    self.resolve_expr(value);
                }
            }
            Stmt::With { contexts, body } => {
                for context in contexts {
                    self.resolve_expr(context);
                }
                // Names in the body may bind to context members; binding against
                // the context types is not modeled, so unresolved names inside
                // are not flagged.
                self.suppress_depth += 1;
                self.resolve_stmt(&body.node);
                self.suppress_depth -= 1;
            }
            Stmt::Goto(label) => self.resolve_name(&label.node, label.span),
            Stmt::Labeled { label, stmt } => {
                if let Some(ids) = self.symbols.lookup(&label.node) {
                    self.name_refs.insert(label.span, ids[0]);
                }
                self.resolve_stmt(&stmt.node);
            }
            Stmt::Empty => {}
        }
    }

    /// A `for` loop variable: bind if declared, otherwise declare it in place
    /// (covers inline `for var i` declarations).
    fn bind_loop_var(&mut self, var: &Spanned<String>, ty: TypeRef) {
        if let Some(ids) = self.symbols.lookup(&var.node) {
            self.name_refs.insert(var.span, ids[0]);
            return;
        }
        self.symbols.define(Symbol {
            name: var.node.clone(),
            kind: SymbolKind::Variable(VariableSymbol {
                ty: Spanned::new(ty, var.span),
            }),
            span: var.span,
            scope: 0,
        });
    }

    fn resolve_expr(&mut self, expr: &Spanned<Expr>) {
        match &expr.node {
            Expr::Name(name) => self.resolve_name(name, expr.span),
            Expr::Binary { lhs, rhs, .. } => {
                self.resolve_expr(lhs);
                self.resolve_expr(rhs);
            }
            Expr::Unary { operand, .. } => self.resolve_expr(operand),
            Expr::Call { callee, args } => {
                self.resolve_expr(callee);
                for arg in args {
                    self.resolve_expr(arg);
                }
            }
            Expr::Index { base, indexes } => {
                self.resolve_expr(base);
                for index in indexes {
                    self.resolve_expr(index);
                }
            }
            // Member names bind during typing, when the base's type is known.
            Expr::Member { base, .. } => self.resolve_expr(base),
            Expr::Deref(inner) => self.resolve_expr(inner),
            Expr::SetConstructor(elements) => {
                for element in elements {
                    self.resolve_expr(element);
                }
            }
            Expr::Range { low, high } => {
                self.resolve_expr(low);
                self.resolve_expr(high);
            }
            Expr::Inherited(inner) => {
                if let Some(inner) = inner {
                    // The named member lives in an ancestor, not this scope chain.
                    self.suppress_depth += 1;
                    self.resolve_expr(inner);
                    self.suppress_depth -= 1;
                }
            }
            Expr::AnonymousMethod {
                kind,
                params,
                return_type,
                body,
            } => {
                self.symbols.enter_scope(ScopeKind::Routine);
                self.define_params(params);
                if matches!(kind, RoutineKind::Function) {
                    let ty = return_type
                        .clone()
                        .unwrap_or_else(|| Spanned::new(TypeRef::named("<unknown>"), expr.span));
                    self.symbols.define(Symbol {
                        name: "Result".to_string(),
                        kind: SymbolKind::Variable(VariableSymbol { ty }),
                        span: expr.span,
                        scope: 0,
                    });
                }
                self.resolve_block(body);
                self.symbols.exit_scope();
            }
            Expr::IntLit(_) | Expr::RealLit(_) | Expr::StrLit(_) | Expr::Nil => {}
        }
    }

    fn resolve_name(&mut self, name: &str, span: Span) {
        if let Some(ids) = self.symbols.lookup(name) {
            self.name_refs.insert(span, ids[0]);
            return;
        }
        if self.suppress_depth > 0
            || intrinsic_types::from_str(name).is_some()
            || intrinsic_routines::is_system_routine(name)
            || strings::eq_ignore_case(name, "True")
            || strings::eq_ignore_case(name, "False")
            || strings::eq_ignore_case(name, "Self")
        {
            return;
        }
        self.diagnostics.push(Diagnostic::new(
            DiagnosticKind::UnresolvedIdentifier,
            format!("Undeclared identifier '{name}'"),
            span,
        ));
    }
}

fn routine_symbol(r: &RoutineDecl) -> Symbol {
    let has_body = r.body.is_some();
    Symbol {
        name: r.name.node.simple_name().to_string(),
        kind: SymbolKind::Routine(RoutineSymbol {
            kind: r.kind,
            params: r.params.clone(),
            return_type: r.return_type.clone(),
            is_class_method: r.is_class_method,
            has_body,
            is_forward: !has_body || r.has_directive(RoutineDirectiveId::Forward),
        }),
        span: r.name.span,
        scope: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delfin_syntax::{lexer, parser};

    fn resolve_source(source: &str) -> Resolution {
        let lexed = lexer::lex(source);
        assert!(lexed.diagnostics.is_empty(), "lexer: {:?}", lexed.diagnostics);
        let (module, diagnostics) = parser::parse(&lexed.tokens);
        assert!(diagnostics.is_empty(), "parser: {diagnostics:?}");
        resolve(&module)
    }

    #[test]
    fn binds_unit_level_names_in_routine_bodies() {
        let resolution = resolve_source(
            "unit U;\ninterface\nvar\n  Counter: Integer;\nprocedure Bump;\nimplementation\nprocedure Bump;\nbegin\n  Counter := Counter + 1;\nend;\nend.",
        );
        assert!(resolution.diagnostics.is_empty(), "{:?}", resolution.diagnostics);
        let bound = resolution
            .name_refs
            .values()
            .filter(|&&id| {
                matches!(
                    resolution.symbols.get(id).map(|s| &s.kind),
                    Some(SymbolKind::Variable(_))
                )
            })
            .count();
        assert!(bound >= 2, "expected both Counter references bound");
    }

    #[test]
    fn unresolved_identifier_is_reported() {
        let resolution = resolve_source(
            "unit U;\ninterface\nimplementation\nprocedure P;\nbegin\n  Missing := 1;\nend;\nend.",
        );
        assert_eq!(resolution.diagnostics.len(), 1);
        assert_eq!(
            resolution.diagnostics[0].kind,
            DiagnosticKind::UnresolvedIdentifier
        );
    }

    #[test]
    fn system_routines_resolve_without_declarations() {
        let resolution = resolve_source(
            "unit U;\ninterface\nimplementation\nprocedure P;\nvar\n  S: string;\nbegin\n  WriteLn(Length(S));\n  S := Copy(S, 1, 2);\nend;\nend.",
        );
        assert!(resolution.diagnostics.is_empty(), "{:?}", resolution.diagnostics);
    }

    #[test]
    fn duplicate_variable_is_reported_once() {
        let resolution = resolve_source(
            "unit U;\ninterface\nvar\n  X: Integer;\n  X: string;\nimplementation\nend.",
        );
        assert_eq!(resolution.diagnostics.len(), 1);
        assert_eq!(
            resolution.diagnostics[0].kind,
            DiagnosticKind::DuplicateIdentifier
        );
    }

    #[test]
    fn method_body_merges_into_member_scope_and_self_resolves() {
        let resolution = resolve_source(
            "unit U;\ninterface\ntype\n  TFoo = class\n  public\n    FValue: Integer;\n    procedure Bump;\n  end;\nimplementation\nprocedure TFoo.Bump;\nbegin\n  FValue := FValue + 1;\n  Self.FValue := 0;\nend;\nend.",
        );
        assert!(resolution.diagnostics.is_empty(), "{:?}", resolution.diagnostics);
        // FValue references bind to the field declared in the member scope.
        let field_refs = resolution
            .name_refs
            .values()
            .filter(|&&id| {
                resolution
                    .symbols
                    .get(id)
                    .is_some_and(|s| s.name == "FValue")
            })
            .count();
        assert!(field_refs >= 2);
    }

    #[test]
    fn enum_values_are_visible_alongside_the_type() {
        let resolution = resolve_source(
            "unit U;\ninterface\ntype\n  TColor = (Red, Green, Blue);\nimplementation\nprocedure P;\nvar\n  C: TColor;\nbegin\n  C := Green;\nend;\nend.",
        );
        assert!(resolution.diagnostics.is_empty(), "{:?}", resolution.diagnostics);
        let green = resolution
            .name_refs
            .values()
            .any(|&id| {
                matches!(
                    resolution.symbols.get(id).map(|s| &s.kind),
                    Some(SymbolKind::EnumValue { .. })
                ) && resolution.symbols.get(id).is_some_and(|s| s.name == "Green")
            });
        assert!(green, "Green should bind to its enum value symbol");
    }

    #[test]
    fn helpers_register_under_the_extended_type() {
        let resolution = resolve_source(
            "unit U;\ninterface\ntype\n  TFoo = class\n  end;\n  TFooHelper = class helper for TFoo\n  public\n    procedure Grow;\n  end;\nimplementation\nend.",
        );
        assert!(resolution.diagnostics.is_empty(), "{:?}", resolution.diagnostics);
        assert_eq!(resolution.symbols.helpers_for("TFoo").len(), 1);
    }

    #[test]
    fn with_bodies_do_not_flag_unresolved_members() {
        let resolution = resolve_source(
            "unit U;\ninterface\ntype\n  TFoo = class\n  public\n    FValue: Integer;\n  end;\nimplementation\nprocedure P;\nvar\n  Foo: TFoo;\nbegin\n  with Foo do\n    FValue := 1;\nend;\nend.",
        );
        assert!(resolution.diagnostics.is_empty(), "{:?}", resolution.diagnostics);
    }

    #[test]
    fn resolution_is_idempotent() {
        let source =
            "unit U;\ninterface\nvar\n  N: Integer;\nimplementation\nprocedure P;\nbegin\n  N := N + 1;\nend;\nend.";
        let first = resolve_source(source);
        let second = resolve_source(source);
        assert_eq!(first.symbols.len(), second.symbols.len());
        assert_eq!(first.name_refs, second.name_refs);
        assert_eq!(first.diagnostics, second.diagnostics);
    }

    #[test]
    fn interface_heading_merges_with_implementation_body() {
        let resolution = resolve_source(
            "unit U;\ninterface\nprocedure P(A: Integer);\nimplementation\nprocedure P(A: Integer);\nbegin\nend;\nend.",
        );
        assert_eq!(
            resolution.symbols.lookup_local(0, "P").map(|ids| ids.len()),
            Some(1),
            "heading and body should merge into one symbol"
        );
    }
}
