//! Expression typing.
//!
//! Runs after resolution. Every expression gets a [`TypeId`]; results are memoized
//! by span, write-once, so re-typing a subtree is free and stable. Typing never
//! fails: anything the model cannot determine becomes the unknown type, and only
//! overload resolution failures surface as diagnostics.

use std::collections::HashMap;

use delfin_core::lang::intrinsic_routines;
use delfin_core::lang::intrinsic_types::{self, IntrinsicKind, INTRINSIC_TYPES};
use delfin_core::strings;
use delfin_syntax::ast::{
    BinaryOp, Block, Decl, Expr, Module, RoutineDecl, RoutineKind, Section, Span, Spanned, Stmt,
    TryHandler, UnaryOp,
};
use delfin_syntax::diagnostics::{Diagnostic, DiagnosticKind};

use crate::frontend::symbols::{SymbolId, SymbolKind, SymbolTable};
use crate::frontend::types::overload::{resolve_overload, OverloadError};
use crate::frontend::types::{intrinsic_return, StringKind, Type, TypeArena, TypeId};

/// Types expressions against a resolved module.
pub struct ExpressionTyper<'a> {
    pub arena: TypeArena,
    symbols: &'a SymbolTable,
    name_refs: &'a HashMap<Span, SymbolId>,
    /// Memoized expression types, keyed by expression span. Write-once.
    memo: HashMap<Span, TypeId>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<'a> ExpressionTyper<'a> {
    pub fn new(symbols: &'a SymbolTable, name_refs: &'a HashMap<Span, SymbolId>) -> Self {
        Self {
            arena: TypeArena::new(),
            symbols,
            name_refs,
            memo: HashMap::new(),
            diagnostics: Vec::new(),
        }
    }

    /// The memoized type of an already-typed expression.
    pub fn type_at(&self, span: Span) -> Option<TypeId> {
        self.memo.get(&span).copied()
    }

    /// Consume the typer, yielding the arena, the per-span expression types,
    /// and the accumulated diagnostics.
    pub fn into_parts(self) -> (TypeArena, HashMap<Span, TypeId>, Vec<Diagnostic>) {
        (self.arena, self.memo, self.diagnostics)
    }

    /// Type one expression, memoizing the result.
    pub fn type_of(&mut self, expr: &Spanned<Expr>) -> TypeId {
        if let Some(&id) = self.memo.get(&expr.span) {
            return id;
        }
        let id = self.compute(expr);
        self.memo.entry(expr.span).or_insert(id);
        id
    }

    fn compute(&mut self, expr: &Spanned<Expr>) -> TypeId {
        match &expr.node {
            Expr::IntLit(_) => self.arena.intrinsic(IntrinsicKind::Integer),
            Expr::RealLit(_) => self.arena.intrinsic(IntrinsicKind::Double),
            // A one-character literal is a char; anything else is a string.
            Expr::StrLit(s) => {
                if s.chars().count() == 1 {
                    self.arena.intrinsic(IntrinsicKind::WideChar)
                } else {
                    self.arena.intrinsic(IntrinsicKind::UnicodeString)
                }
            }
            Expr::Nil => self.arena.intrinsic(IntrinsicKind::Pointer),
            Expr::Name(name) => self.type_of_name(name, expr.span),
            Expr::Binary { op, lhs, rhs } => {
                let lhs_ty = self.type_of(lhs);
                let rhs_ty = self.type_of(rhs);
                self.type_of_binary(*op, lhs_ty, rhs_ty)
            }
            Expr::Unary { op, operand } => {
                let operand_ty = self.type_of(operand);
                match op {
                    UnaryOp::Not | UnaryOp::Neg | UnaryOp::Plus => operand_ty,
                    UnaryOp::AddressOf => self.arena.alloc(Type::Pointer(operand_ty)),
                }
            }
            Expr::Call { callee, args } => self.type_of_call(callee, args, expr.span),
            Expr::Index { base, indexes } => {
                for index in indexes {
                    self.type_of(index);
                }
                let base_ty = self.type_of(base);
                self.type_of_index(base_ty)
            }
            Expr::Member { base, name } => {
                let base_ty = self.type_of(base);
                match self.member_symbol(base_ty, &name.node) {
                    Some(member) => self.member_value_type(base_ty, member),
                    None => self.arena.unknown(),
                }
            }
            Expr::Deref(inner) => {
                let inner_ty = self.type_of(inner);
                match self.arena.get(self.arena.unalias(inner_ty)) {
                    Type::Pointer(target) => *target,
                    _ => self.arena.unknown(),
                }
            }
            Expr::SetConstructor(elements) => {
                let element_types = elements.iter().map(|e| self.type_of(e)).collect();
                self.arena.alloc(Type::ArrayConstructor(element_types))
            }
            Expr::Range { low, high } => {
                self.type_of(high);
                self.type_of(low)
            }
            Expr::Inherited(inner) => match inner {
                Some(inner) => self.type_of(inner),
                None => self.arena.unknown(),
            },
            Expr::AnonymousMethod { body, .. } => {
                self.check_block(body);
                self.arena.alloc(Type::Procedural)
            }
        }
    }

    // ========================================================================
    // Names and symbols
    // ========================================================================

    fn type_of_name(&mut self, name: &str, span: Span) -> TypeId {
        if let Some(&sym) = self.name_refs.get(&span) {
            return self.type_of_symbol_value(sym);
        }
        if strings::eq_ignore_case(name, "True") || strings::eq_ignore_case(name, "False") {
            return self.arena.intrinsic(IntrinsicKind::Boolean);
        }
        if let Some(kind) = intrinsic_types::from_str(name) {
            // A bare intrinsic type name in value position, e.g. the operand of
            // `is` or a typecast callee seen outside a call.
            let ty = self.arena.intrinsic(kind);
            return self.arena.alloc(Type::ClassReference(ty));
        }
        self.arena.unknown()
    }

    /// The type a symbol has when referenced as a value. A type name yields the
    /// metaclass; a routine name yields its return type (implicit call).
    fn type_of_symbol_value(&mut self, sym: SymbolId) -> TypeId {
        let Some(symbol) = self.symbols.get(sym) else {
            return self.arena.unknown();
        };
        let scope = symbol.scope;
        match symbol.kind.clone() {
            SymbolKind::Variable(v) => self.arena.lower_type_ref(self.symbols, scope, &v.ty.node),
            SymbolKind::Const(c) => match &c.ty {
                Some(ty) => self.arena.lower_type_ref(self.symbols, scope, &ty.node),
                None => self.type_of(&c.value),
            },
            SymbolKind::Property(p) => match &p.ty {
                Some(ty) => self.arena.lower_type_ref(self.symbols, scope, &ty.node),
                None => self.arena.unknown(),
            },
            SymbolKind::EnumValue { owner } => self.arena.type_of_symbol(self.symbols, owner),
            SymbolKind::Type(_) => {
                let ty = self.arena.type_of_symbol(self.symbols, sym);
                self.arena.alloc(Type::ClassReference(ty))
            }
            SymbolKind::Routine(r) => match &r.return_type {
                Some(ty) => self.arena.lower_type_ref(self.symbols, scope, &ty.node),
                None => self.arena.unknown(),
            },
            SymbolKind::Label | SymbolKind::UnitName => self.arena.unknown(),
        }
    }

    // ========================================================================
    // Operators
    // ========================================================================

    fn type_of_binary(&mut self, op: BinaryOp, lhs: TypeId, rhs: TypeId) -> TypeId {
        match op {
            BinaryOp::Eq
            | BinaryOp::NotEq
            | BinaryOp::Lt
            | BinaryOp::LtEq
            | BinaryOp::Gt
            | BinaryOp::GtEq
            | BinaryOp::In
            | BinaryOp::Is => self.arena.intrinsic(IntrinsicKind::Boolean),
            // `x as TFoo` has the asserted type; the rhs types as a metaclass.
            BinaryOp::As => match self.arena.get(self.arena.unalias(rhs)) {
                Type::ClassReference(class) => *class,
                _ => rhs,
            },
            BinaryOp::Add => {
                if self.is_text(lhs) || self.is_text(rhs) {
                    return self.concat_type(lhs, rhs);
                }
                self.set_or_numeric(lhs, rhs)
            }
            BinaryOp::Sub | BinaryOp::Mul => self.set_or_numeric(lhs, rhs),
            BinaryOp::FDiv => self.arena.intrinsic(IntrinsicKind::Double),
            BinaryOp::IDiv | BinaryOp::Mod | BinaryOp::Shl | BinaryOp::Shr => {
                self.numeric_type(lhs, rhs)
            }
            BinaryOp::And | BinaryOp::Or | BinaryOp::Xor => {
                if self.arena.is_boolean(lhs) || self.arena.is_boolean(rhs) {
                    self.arena.intrinsic(IntrinsicKind::Boolean)
                } else {
                    self.numeric_type(lhs, rhs)
                }
            }
        }
    }

    fn is_text(&self, id: TypeId) -> bool {
        self.arena.is_string(id) || self.arena.is_char(id)
    }

    /// String concatenation widens to the widest character width involved.
    fn concat_type(&mut self, lhs: TypeId, rhs: TypeId) -> TypeId {
        let width = self
            .arena
            .char_width(lhs)
            .unwrap_or(2)
            .max(self.arena.char_width(rhs).unwrap_or(2));
        if width <= 1 {
            self.arena.string_type(StringKind::Ansi)
        } else {
            self.arena.string_type(StringKind::Unicode)
        }
    }

    /// `+`, `-`, `*` are also the set operators.
    fn set_or_numeric(&mut self, lhs: TypeId, rhs: TypeId) -> TypeId {
        let lhs_canon = self.arena.unalias(lhs);
        if matches!(
            self.arena.get(lhs_canon),
            Type::Set(_) | Type::ArrayConstructor(_)
        ) {
            return lhs;
        }
        self.numeric_type(lhs, rhs)
    }

    fn numeric_type(&mut self, lhs: TypeId, rhs: TypeId) -> TypeId {
        if self.arena.is_real(lhs) || self.arena.is_real(rhs) {
            return self.arena.intrinsic(IntrinsicKind::Double);
        }
        if self.arena.size(lhs).max(self.arena.size(rhs)) >= 8 {
            return self.arena.intrinsic(IntrinsicKind::Int64);
        }
        self.arena.intrinsic(IntrinsicKind::Integer)
    }

    // ========================================================================
    // Calls
    // ========================================================================

    fn type_of_call(&mut self, callee: &Spanned<Expr>, args: &[Spanned<Expr>], span: Span) -> TypeId {
        let arg_types: Vec<TypeId> = args.iter().map(|a| self.type_of(a)).collect();

        match &callee.node {
            Expr::Name(name) => {
                // Compiler-magic intrinsics take precedence over anything else.
                if let Some(rule) = intrinsic_routines::rule_for(name) {
                    return intrinsic_return::return_type(
                        rule,
                        name,
                        &arg_types,
                        &mut self.arena,
                        self.symbols,
                    );
                }
                if let Some(&sym) = self.name_refs.get(&callee.span) {
                    return self.call_symbol(sym, name, &arg_types, span);
                }
                if let Some(kind) = intrinsic_types::from_str(name) {
                    // `Integer(x)` style typecast.
                    return self.arena.intrinsic(kind);
                }
                self.system_call_type(name, &arg_types)
            }
            Expr::Member { base, name } => {
                let base_ty = self.type_of(base);
                self.member_call(base_ty, &name.node, &arg_types, span)
            }
            _ => {
                self.type_of(callee);
                self.arena.unknown()
            }
        }
    }

    fn call_symbol(&mut self, sym: SymbolId, name: &str, args: &[TypeId], span: Span) -> TypeId {
        let Some(symbol) = self.symbols.get(sym) else {
            return self.arena.unknown();
        };
        match &symbol.kind {
            // Calling a type name is a typecast.
            SymbolKind::Type(_) => self.arena.type_of_symbol(self.symbols, sym),
            SymbolKind::Routine(_) => {
                let set: Vec<SymbolId> = self
                    .symbols
                    .lookup_local(symbol.scope, name)
                    .map(|ids| ids.to_vec())
                    .unwrap_or_else(|| vec![sym]);
                self.call_overload_set(&set, args, span)
            }
            _ => self.arena.unknown(),
        }
    }

    fn call_overload_set(&mut self, set: &[SymbolId], args: &[TypeId], span: Span) -> TypeId {
        if set.len() == 1 {
            return self.routine_return_type(set[0]);
        }
        match resolve_overload(&mut self.arena, self.symbols, set, args) {
            Ok(winner) => self.routine_return_type(winner),
            Err(OverloadError::NoMatch) => {
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::NoMatchingOverload,
                    "No overload accepts the given arguments",
                    span,
                ));
                self.arena.unknown()
            }
            Err(OverloadError::Ambiguous) => {
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::AmbiguousOverload,
                    "Ambiguous call; two or more overloads match equally well",
                    span,
                ));
                self.arena.unknown()
            }
        }
    }

    fn routine_return_type(&mut self, sym: SymbolId) -> TypeId {
        let Some(symbol) = self.symbols.get(sym) else {
            return self.arena.unknown();
        };
        let scope = symbol.scope;
        let SymbolKind::Routine(routine) = symbol.kind.clone() else {
            return self.arena.unknown();
        };
        match &routine.return_type {
            Some(ty) => self.arena.lower_type_ref(self.symbols, scope, &ty.node),
            None => self.arena.unknown(),
        }
    }

    /// Return types of the fixed-signature System routines the model knows.
    fn system_call_type(&mut self, name: &str, args: &[TypeId]) -> TypeId {
        if ["Length", "SizeOf", "Ord"].iter().any(|r| strings::eq_ignore_case(r, name)) {
            return self.arena.intrinsic(IntrinsicKind::Integer);
        }
        if strings::eq_ignore_case(name, "Chr") {
            return self.arena.intrinsic(IntrinsicKind::WideChar);
        }
        if ["Odd", "Assigned"].iter().any(|r| strings::eq_ignore_case(r, name)) {
            return self.arena.intrinsic(IntrinsicKind::Boolean);
        }
        if ["Abs", "Sqr"].iter().any(|r| strings::eq_ignore_case(r, name)) {
            return args.first().copied().unwrap_or(self.arena.unknown());
        }
        self.arena.unknown()
    }

    // ========================================================================
    // Members
    // ========================================================================

    fn member_call(&mut self, base_ty: TypeId, name: &str, args: &[TypeId], span: Span) -> TypeId {
        let Some(member) = self.member_symbol(base_ty, name) else {
            return self.arena.unknown();
        };
        let Some(symbol) = self.symbols.get(member) else {
            return self.arena.unknown();
        };
        match &symbol.kind {
            SymbolKind::Routine(routine) => {
                if routine.kind == RoutineKind::Constructor {
                    return self.constructed_type(base_ty);
                }
                let set: Vec<SymbolId> = self
                    .symbols
                    .lookup_local(symbol.scope, name)
                    .map(|ids| ids.to_vec())
                    .unwrap_or_else(|| vec![member]);
                self.call_overload_set(&set, args, span)
            }
            _ => self.type_of_symbol_value(member),
        }
    }

    /// Value type of a bound member reference. Routines type as their return
    /// type (Delphi allows calls without parentheses); constructors yield an
    /// instance of the type they were invoked on.
    fn member_value_type(&mut self, base_ty: TypeId, member: SymbolId) -> TypeId {
        if let Some(symbol) = self.symbols.get(member) {
            if let SymbolKind::Routine(routine) = &symbol.kind {
                if routine.kind == RoutineKind::Constructor {
                    return self.constructed_type(base_ty);
                }
            }
        }
        self.type_of_symbol_value(member)
    }

    /// What `TFoo.Create` yields: the instance type behind a metaclass base.
    fn constructed_type(&mut self, base_ty: TypeId) -> TypeId {
        let base = self.arena.unalias(base_ty);
        match self.arena.get(base) {
            Type::ClassReference(class) => *class,
            _ => base_ty,
        }
    }

    /// Find the symbol a member access binds to: the type's own members first,
    /// then inherited members, then helpers in declaration order.
    fn member_symbol(&mut self, base_ty: TypeId, name: &str) -> Option<SymbolId> {
        let base = self.arena.unalias(base_ty);
        if let Some(sym) = self.arena.struct_symbol(base) {
            return self.symbols.member_lookup(sym, name);
        }
        match self.arena.get(base).clone() {
            Type::ClassReference(class) => self.member_symbol(class, name),
            Type::Intrinsic(kind) => self.helper_member(kind, name),
            Type::DelphiString(kind) => {
                let kind = match kind {
                    StringKind::Unicode => IntrinsicKind::UnicodeString,
                    StringKind::Wide => IntrinsicKind::WideString,
                    StringKind::Ansi => IntrinsicKind::AnsiString,
                    StringKind::Short => IntrinsicKind::ShortString,
                };
                self.helper_member(kind, name)
            }
            Type::Helper { symbol, extended } => self
                .symbols
                .member_lookup(symbol, name)
                .or_else(|| self.member_symbol(extended, name)),
            Type::Enum(Some(sym)) => self.symbols.member_lookup(sym, name),
            _ => None,
        }
    }

    /// Helper members of an intrinsic type. Helpers may be declared against any
    /// spelling of the type (`string` as well as `UnicodeString`), so every
    /// registered spelling is tried in declaration order.
    fn helper_member(&self, kind: IntrinsicKind, name: &str) -> Option<SymbolId> {
        let info = INTRINSIC_TYPES.iter().find(|t| t.kind == kind)?;
        for spelling in std::iter::once(info.canonical).chain(info.aliases.iter().copied()) {
            for &helper in self.symbols.helpers_for(spelling) {
                let Some(SymbolKind::Type(decl)) = self.symbols.get(helper).map(|s| &s.kind) else {
                    continue;
                };
                if let Some(members) = decl.members {
                    if let Some(ids) = self.symbols.lookup_local(members, name) {
                        return ids.first().copied();
                    }
                }
            }
        }
        None
    }

    fn type_of_index(&mut self, base_ty: TypeId) -> TypeId {
        let base = self.arena.unalias(base_ty);
        match self.arena.get(base).clone() {
            Type::Array { element, .. } => element,
            Type::DelphiString(kind) => match kind.char_width() {
                1 => self.arena.intrinsic(IntrinsicKind::AnsiChar),
                _ => self.arena.intrinsic(IntrinsicKind::WideChar),
            },
            _ => self.arena.unknown(),
        }
    }

    // ========================================================================
    // Whole-module walk
    // ========================================================================

    /// Type every expression in the module, populating the memo and collecting
    /// overload diagnostics.
    pub fn check_module(&mut self, module: &Module) {
        self.check_section(&module.interface);
        self.check_section(&module.implementation);
    }

    fn check_section(&mut self, section: &Section) {
        for decl in &section.decls {
            self.check_decl(&decl.node);
        }
    }

    fn check_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Const(c) => {
                self.type_of(&c.value);
            }
            Decl::Var(v) => {
                if let Some(init) = &v.initializer {
                    self.type_of(init);
                }
            }
            Decl::Routine(r) => self.check_routine(r),
            _ => {}
        }
    }

    fn check_routine(&mut self, r: &RoutineDecl) {
        if let Some(body) = &r.body {
            self.check_block(body);
        }
    }

    fn check_block(&mut self, block: &Block) {
        for decl in &block.decls {
            self.check_decl(&decl.node);
        }
        for stmt in &block.body {
            self.check_stmt(&stmt.node);
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Compound(stmts) => {
                for s in stmts {
                    self.check_stmt(&s.node);
                }
            }
            Stmt::Assign { target, value } => {
                self.type_of(target);
                self.type_of(value);
            }
            Stmt::Expr(e) => {
                self.type_of(e);
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.type_of(cond);
                self.check_stmt(&then_branch.node);
                if let Some(else_branch) = else_branch {
                    self.check_stmt(&else_branch.node);
                }
            }
            Stmt::While { cond, body } => {
                self.type_of(cond);
                self.check_stmt(&body.node);
            }
            Stmt::Repeat { body, until } => {
                for s in body {
                    self.check_stmt(&s.node);
                }
                self.type_of(until);
            }
            Stmt::For { from, to, body, .. } => {
                self.type_of(from);
                self.type_of(to);
                self.check_stmt(&body.node);
            }
            Stmt::ForIn { iterable, body, .. } => {
                self.type_of(iterable);
                self.check_stmt(&body.node);
            }
            Stmt::Case {
                selector,
                arms,
                else_branch,
            } => {
                self.type_of(selector);
                for arm in arms {
                    for label in &arm.labels {
                        self.type_of(label);
                    }
                    self.check_stmt(&arm.body.node);
                }
                if let Some(else_branch) = else_branch {
                    for s in else_branch {
                        self.check_stmt(&s.node);
                    }
                }
            }
            Stmt::Try { body, handler } => {
                for s in body {
                    self.check_stmt(&s.node);
                }
                match handler {
                    TryHandler::Except {
                        handlers,
                        body,
                        else_branch,
                    } => {
                        for h in handlers {
                            self.check_stmt(&h.body.node);
                        }
                        for s in body {
                            self.check_stmt(&s.node);
                        }
                        if let Some(else_branch) = else_branch {
                            for s in else_branch {
                                self.check_stmt(&s.node);
                            }
                        }
                    }
                    TryHandler::Finally(stmts) => {
                        for s in stmts {
                            self.check_stmt(&s.node);
                        }
                    }
                }
            }
            Stmt::Raise(value) => {
                if let Some(value) = value {
                    self.type_of(value);
                }
            }
            Stmt::With { contexts, body } => {
                for context in contexts {
                    self.type_of(context);
                }
                self.check_stmt(&body.node);
            }
            Stmt::Labeled { stmt, .. } => self.check_stmt(&stmt.node),
            Stmt::Goto(_) | Stmt::Empty => {}
        }
    }
}
