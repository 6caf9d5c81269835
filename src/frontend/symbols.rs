//! Symbol table and scope management.
//!
//! Tracks named entities (types, routines, variables, constants) across the
//! case-insensitive scopes of a unit. Scopes form an arena: closed scopes stay
//! readable so later passes can query members of already-processed types.

use std::collections::{HashMap, HashSet};

use delfin_core::strings;
use delfin_syntax::ast::{Expr, Param, QualifiedName, RoutineKind, Span, Spanned, TypeDesc, TypeRef};

/// Unique identifier for symbols.
pub type SymbolId = usize;
/// Index into the scope arena.
pub type ScopeId = usize;

/// Kind of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Unit,
    Type,
    Routine,
    Block,
}

/// A scope in the arena. Names are stored case-folded; each name maps to one or
/// more symbols (more than one only for routine overload sets).
#[derive(Debug)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub kind: ScopeKind,
    names: HashMap<String, Vec<SymbolId>>,
}

impl Scope {
    fn new(parent: Option<ScopeId>, kind: ScopeKind) -> Self {
        Self {
            parent,
            kind,
            names: HashMap::new(),
        }
    }
}

/// A named entity.
#[derive(Debug, Clone)]
pub struct Symbol {
    /// Original spelling from the source.
    pub name: String,
    pub kind: SymbolKind,
    pub span: Span,
    pub scope: ScopeId,
}

#[derive(Debug, Clone)]
pub enum SymbolKind {
    Type(TypeSymbol),
    Routine(RoutineSymbol),
    Variable(VariableSymbol),
    Const(ConstSymbol),
    Property(PropertySymbol),
    EnumValue { owner: SymbolId },
    Label,
    UnitName,
}

/// A declared type. The body is kept so the type lowering pass can derive the
/// structural `Type` without re-walking the AST.
#[derive(Debug, Clone)]
pub struct TypeSymbol {
    pub body: TypeDesc,
    /// Scope holding member symbols, for struct and helper bodies.
    pub members: Option<ScopeId>,
    /// Base class plus interfaces, as spelled in the heritage clause.
    pub heritage: Vec<QualifiedName>,
}

#[derive(Debug, Clone)]
pub struct RoutineSymbol {
    pub kind: RoutineKind,
    pub params: Vec<Param>,
    pub return_type: Option<Spanned<TypeRef>>,
    pub is_class_method: bool,
    pub has_body: bool,
    /// Declared `forward` or still awaiting its implementation-section body.
    pub is_forward: bool,
}

#[derive(Debug, Clone)]
pub struct VariableSymbol {
    pub ty: Spanned<TypeRef>,
}

#[derive(Debug, Clone)]
pub struct ConstSymbol {
    pub ty: Option<Spanned<TypeRef>>,
    pub value: Spanned<Expr>,
}

#[derive(Debug, Clone)]
pub struct PropertySymbol {
    pub ty: Option<Spanned<TypeRef>>,
}

/// Outcome of [`SymbolTable::define`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefineOutcome {
    /// Fresh symbol.
    Defined(SymbolId),
    /// Merged into an existing forward declaration.
    Merged(SymbolId),
    /// Name collision; the existing symbol wins and the new one is discarded.
    Duplicate { existing: SymbolId },
}

/// Symbol table managing all named entities of one compilation.
#[derive(Debug)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    scopes: Vec<Scope>,
    current_scope: ScopeId,
    /// Helper symbols keyed by the case-folded name of the extended type, in
    /// declaration order.
    helpers: HashMap<String, Vec<SymbolId>>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            symbols: Vec::new(),
            scopes: vec![Scope::new(None, ScopeKind::Unit)],
            current_scope: 0,
            helpers: HashMap::new(),
        }
    }

    // ========================================================================
    // Scope discipline
    // ========================================================================

    pub fn enter_scope(&mut self, kind: ScopeKind) -> ScopeId {
        self.scopes.push(Scope::new(Some(self.current_scope), kind));
        self.current_scope = self.scopes.len() - 1;
        self.current_scope
    }

    pub fn exit_scope(&mut self) {
        if let Some(parent) = self.scopes[self.current_scope].parent {
            self.current_scope = parent;
        }
    }

    pub fn current_scope(&self) -> ScopeId {
        self.current_scope
    }

    /// Re-enter an already-built scope (used when resolving routine bodies).
    pub fn set_current_scope(&mut self, scope: ScopeId) {
        if scope < self.scopes.len() {
            self.current_scope = scope;
        }
    }

    // ========================================================================
    // Definition
    // ========================================================================

    /// Define a symbol in the current scope.
    ///
    /// Collision rules: a name may map to several symbols only when all of them
    /// are routines (an overload set). A routine whose earlier declaration in the
    /// same scope is a forward stub (or an interface heading) merges into that
    /// symbol instead of creating a second one; a forward class merges with its
    /// full declaration the same way. Anything else is a duplicate and the first
    /// declaration wins.
    pub fn define(&mut self, mut symbol: Symbol) -> DefineOutcome {
        symbol.scope = self.current_scope;
        let key = strings::fold(&symbol.name);
        let existing = self.scopes[self.current_scope]
            .names
            .get(&key)
            .cloned()
            .unwrap_or_default();

        if !existing.is_empty() {
            match &symbol.kind {
                SymbolKind::Routine(routine) => {
                    if !existing
                        .iter()
                        .all(|&id| matches!(self.symbols[id].kind, SymbolKind::Routine(_)))
                    {
                        return DefineOutcome::Duplicate { existing: existing[0] };
                    }
                    // A completing body merges into a pending declaration with
                    // the same arity rather than growing the overload set.
                    if routine.has_body {
                        if let Some(&id) = existing.iter().find(|&&id| {
                            matches!(
                                &self.symbols[id].kind,
                                SymbolKind::Routine(r)
                                    if r.is_forward && param_count(&r.params) == param_count(&routine.params)
                            )
                        }) {
                            self.symbols[id].kind = symbol.kind;
                            return DefineOutcome::Merged(id);
                        }
                    }
                }
                SymbolKind::Type(decl) => {
                    // `class;` stub completed by the real declaration.
                    if existing.len() == 1 {
                        let id = existing[0];
                        if matches!(
                            &self.symbols[id].kind,
                            SymbolKind::Type(t) if matches!(t.body, TypeDesc::ForwardClass)
                        ) && !matches!(decl.body, TypeDesc::ForwardClass)
                        {
                            self.symbols[id].kind = symbol.kind;
                            self.symbols[id].span = symbol.span;
                            return DefineOutcome::Merged(id);
                        }
                    }
                    return DefineOutcome::Duplicate { existing: existing[0] };
                }
                _ => return DefineOutcome::Duplicate { existing: existing[0] },
            }
        }

        let id = self.symbols.len();
        self.symbols.push(symbol);
        self.scopes[self.current_scope].names.entry(key).or_default().push(id);
        DefineOutcome::Defined(id)
    }

    /// Record a helper type for its extended type, preserving declaration order.
    pub fn register_helper(&mut self, extended_name: &str, helper: SymbolId) {
        self.helpers
            .entry(strings::fold(extended_name))
            .or_default()
            .push(helper);
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Case-insensitive lookup walking outward through enclosing scopes. Returns
    /// the full overload set declared under the name in the nearest scope.
    pub fn lookup(&self, name: &str) -> Option<&[SymbolId]> {
        self.lookup_from(self.current_scope, name)
    }

    pub fn lookup_from(&self, scope: ScopeId, name: &str) -> Option<&[SymbolId]> {
        let key = strings::fold(name);
        let mut scope_idx = scope;
        loop {
            if let Some(ids) = self.scopes[scope_idx].names.get(&key) {
                return Some(ids);
            }
            scope_idx = self.scopes[scope_idx].parent?;
        }
    }

    /// Lookup restricted to one scope, no parent walk.
    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<&[SymbolId]> {
        self.scopes[scope].names.get(&strings::fold(name)).map(|v| v.as_slice())
    }

    /// Member lookup on a type: the type's own members first, then inherited
    /// members, then each in-scope helper for that type in declaration order.
    /// First match wins.
    pub fn member_lookup(&self, type_symbol: SymbolId, name: &str) -> Option<SymbolId> {
        self.member_lookup_inner(type_symbol, name, &mut HashSet::new())
    }

    /// `visited` keeps heritage cycles (possible through merged forward
    /// declarations) from recursing forever.
    fn member_lookup_inner(
        &self,
        type_symbol: SymbolId,
        name: &str,
        visited: &mut HashSet<SymbolId>,
    ) -> Option<SymbolId> {
        if !visited.insert(type_symbol) {
            return None;
        }
        let SymbolKind::Type(decl) = &self.symbols.get(type_symbol)?.kind else {
            return None;
        };
        if let Some(members) = decl.members {
            if let Some(ids) = self.lookup_local(members, name) {
                return ids.first().copied();
            }
        }
        for base in &decl.heritage {
            if let Some(&base_id) = self
                .lookup_from(self.symbols[type_symbol].scope, base.simple_name())
                .and_then(|ids| ids.first())
            {
                if let Some(found) = self.member_lookup_inner(base_id, name, visited) {
                    return Some(found);
                }
            }
        }
        for &helper in self.helpers_for(&self.symbols[type_symbol].name) {
            let SymbolKind::Type(helper_decl) = &self.symbols[helper].kind else {
                continue;
            };
            if let Some(members) = helper_decl.members {
                if let Some(ids) = self.lookup_local(members, name) {
                    return ids.first().copied();
                }
            }
        }
        None
    }

    /// Helper symbols extending the named type, in declaration order.
    pub fn helpers_for(&self, type_name: &str) -> &[SymbolId] {
        self.helpers
            .get(&strings::fold(type_name))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id)
    }

    pub fn get_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        self.symbols.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Total declared parameter names across groups (`a, b: Integer` counts as two).
fn param_count(params: &[Param]) -> usize {
    params.iter().map(|p| p.names.len()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variable(name: &str) -> Symbol {
        Symbol {
            name: name.to_string(),
            kind: SymbolKind::Variable(VariableSymbol {
                ty: Spanned::new(TypeRef::named("Integer"), Span::default()),
            }),
            span: Span::default(),
            scope: 0,
        }
    }

    fn routine(name: &str, has_body: bool, is_forward: bool) -> Symbol {
        Symbol {
            name: name.to_string(),
            kind: SymbolKind::Routine(RoutineSymbol {
                kind: RoutineKind::Procedure,
                params: Vec::new(),
                return_type: None,
                is_class_method: false,
                has_body,
                is_forward,
            }),
            span: Span::default(),
            scope: 0,
        }
    }

    #[test]
    fn lookup_is_case_insensitive_and_walks_outward() {
        let mut table = SymbolTable::new();
        table.define(variable("MyValue"));
        table.enter_scope(ScopeKind::Routine);
        assert!(table.lookup("MYVALUE").is_some());
        assert!(table.lookup("myvalue").is_some());
        table.exit_scope();
    }

    #[test]
    fn inner_scope_names_invisible_after_exit() {
        let mut table = SymbolTable::new();
        table.enter_scope(ScopeKind::Block);
        table.define(variable("Local"));
        assert!(table.lookup("Local").is_some());
        table.exit_scope();
        assert!(table.lookup("Local").is_none());
    }

    #[test]
    fn routines_form_overload_sets() {
        let mut table = SymbolTable::new();
        let first = table.define(routine("DoIt", false, true));
        let second = table.define(routine("DoIt", false, true));
        assert!(matches!(first, DefineOutcome::Defined(_)));
        assert!(matches!(second, DefineOutcome::Defined(_)));
        assert_eq!(table.lookup("doit").map(|ids| ids.len()), Some(2));
    }

    #[test]
    fn non_routine_collision_is_duplicate_first_wins() {
        let mut table = SymbolTable::new();
        let DefineOutcome::Defined(first) = table.define(variable("X")) else {
            panic!("expected fresh definition");
        };
        let outcome = table.define(variable("x"));
        assert_eq!(outcome, DefineOutcome::Duplicate { existing: first });
        assert_eq!(table.lookup("X").map(|ids| ids.len()), Some(1));
    }

    #[test]
    fn forward_routine_merges_with_its_body() {
        let mut table = SymbolTable::new();
        let DefineOutcome::Defined(id) = table.define(routine("Later", false, true)) else {
            panic!("expected fresh definition");
        };
        let outcome = table.define(routine("Later", true, false));
        assert_eq!(outcome, DefineOutcome::Merged(id));
        assert_eq!(table.lookup("Later").map(|ids| ids.len()), Some(1));
        let Some(Symbol {
            kind: SymbolKind::Routine(routine),
            ..
        }) = table.get(id)
        else {
            panic!("expected routine symbol");
        };
        assert!(routine.has_body);
    }

    #[test]
    fn forward_class_merges_with_full_declaration() {
        let mut table = SymbolTable::new();
        let DefineOutcome::Defined(id) = table.define(Symbol {
            name: "TFoo".to_string(),
            kind: SymbolKind::Type(TypeSymbol {
                body: TypeDesc::ForwardClass,
                members: None,
                heritage: Vec::new(),
            }),
            span: Span::default(),
            scope: 0,
        }) else {
            panic!("expected fresh definition");
        };
        let outcome = table.define(Symbol {
            name: "TFoo".to_string(),
            kind: SymbolKind::Type(TypeSymbol {
                body: TypeDesc::Enum(Vec::new()),
                members: None,
                heritage: Vec::new(),
            }),
            span: Span::default(),
            scope: 0,
        });
        assert_eq!(outcome, DefineOutcome::Merged(id));
    }

    fn class_with_base(table: &mut SymbolTable, name: &str, base: &str) -> SymbolId {
        let members = table.enter_scope(ScopeKind::Type);
        table.exit_scope();
        let DefineOutcome::Defined(id) = table.define(Symbol {
            name: name.to_string(),
            kind: SymbolKind::Type(TypeSymbol {
                body: TypeDesc::ForwardClass,
                members: Some(members),
                heritage: vec![QualifiedName::simple(base)],
            }),
            span: Span::default(),
            scope: 0,
        }) else {
            panic!("expected fresh definition");
        };
        id
    }

    #[test]
    fn member_lookup_terminates_on_heritage_cycles() {
        let mut table = SymbolTable::new();
        let ta = class_with_base(&mut table, "TA", "TB");
        class_with_base(&mut table, "TB", "TA");
        assert_eq!(table.member_lookup(ta, "Missing"), None);
    }

    #[test]
    fn helpers_keep_declaration_order() {
        let mut table = SymbolTable::new();
        table.register_helper("TFoo", 7);
        table.register_helper("tfoo", 9);
        assert_eq!(table.helpers_for("TFOO"), &[7, 9]);
    }
}
