//! The analyzer's type model.
//!
//! Types form a closed sum held in a per-unit [`TypeArena`]; everything refers to
//! types through [`TypeId`] indices, never shared pointers. Intrinsic types are
//! interned once per arena from the `delfin_core` registry, so identical intrinsics
//! always compare equal by id.
//!
//! ## Modules
//!
//! - `compat` - assignability between types
//! - `intrinsic_return` - argument-dependent return types of compiler-magic routines
//! - `overload` - overload resolution over routine candidate sets

pub mod compat;
pub mod intrinsic_return;
pub mod overload;

use std::collections::{HashMap, HashSet};

use delfin_core::lang::intrinsic_types::{self, IntrinsicCategory, IntrinsicKind};
use delfin_core::strings;
use delfin_syntax::ast::{ArrayKind, Decl, StructKind, TypeDesc, TypeRef};

use crate::frontend::symbols::{ScopeId, SymbolId, SymbolKind, SymbolTable};

/// Index into a [`TypeArena`].
pub type TypeId = usize;

/// Character-width family of a Delphi string type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringKind {
    /// `string` / `UnicodeString` - two-byte characters.
    Unicode,
    /// `WideString` - two-byte characters, COM-managed.
    Wide,
    /// `AnsiString` - one-byte characters.
    Ansi,
    /// `string[n]` / `ShortString` - one-byte characters, length-prefixed.
    Short,
}

impl StringKind {
    /// Width in bytes of one character of this string kind.
    pub fn char_width(self) -> usize {
        match self {
            StringKind::Unicode | StringKind::Wide => 2,
            StringKind::Ansi | StringKind::Short => 1,
        }
    }
}

/// The closed sum of analyzable types.
///
/// String intrinsics are normalized to [`Type::DelphiString`] at interning time;
/// `Intrinsic` never carries a `Text`-category kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Intrinsic(IntrinsicKind),
    DelphiString(StringKind),
    Class(SymbolId),
    Record(SymbolId),
    Interface(SymbolId),
    Enum(Option<SymbolId>),
    Set(TypeId),
    Array { kind: ArrayKind, element: TypeId },
    Pointer(TypeId),
    Procedural,
    ClassReference(TypeId),
    TypeParameter(String),
    Alias { name: String, aliased: TypeId },
    Helper { extended: TypeId, symbol: SymbolId },
    /// Synthesized type of a bracketed constructor; element types in encounter order.
    ArrayConstructor(Vec<TypeId>),
    Subrange { base: TypeId },
    Variant,
    Unknown,
}

/// Arena of all types of one analysis, with interned intrinsics.
#[derive(Debug)]
pub struct TypeArena {
    types: Vec<Type>,
    intrinsics: HashMap<IntrinsicKind, TypeId>,
    /// Lowered type for each declared type symbol.
    symbol_types: HashMap<SymbolId, TypeId>,
}

impl Default for TypeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeArena {
    pub fn new() -> Self {
        Self {
            // Id 0 is always the unknown sentinel.
            types: vec![Type::Unknown],
            intrinsics: HashMap::new(),
            symbol_types: HashMap::new(),
        }
    }

    pub fn alloc(&mut self, ty: Type) -> TypeId {
        self.types.push(ty);
        self.types.len() - 1
    }

    pub fn get(&self, id: TypeId) -> &Type {
        self.types.get(id).unwrap_or(&Type::Unknown)
    }

    pub fn unknown(&self) -> TypeId {
        0
    }

    /// The interned type for an intrinsic kind. String kinds normalize to
    /// [`Type::DelphiString`], `Variant` to [`Type::Variant`].
    pub fn intrinsic(&mut self, kind: IntrinsicKind) -> TypeId {
        if let Some(&id) = self.intrinsics.get(&kind) {
            return id;
        }
        let ty = match kind {
            IntrinsicKind::UnicodeString => Type::DelphiString(StringKind::Unicode),
            IntrinsicKind::WideString => Type::DelphiString(StringKind::Wide),
            IntrinsicKind::AnsiString => Type::DelphiString(StringKind::Ansi),
            IntrinsicKind::ShortString => Type::DelphiString(StringKind::Short),
            IntrinsicKind::Variant => Type::Variant,
            other => Type::Intrinsic(other),
        };
        let id = self.alloc(ty);
        self.intrinsics.insert(kind, id);
        id
    }

    pub fn string_type(&mut self, kind: StringKind) -> TypeId {
        self.intrinsic(match kind {
            StringKind::Unicode => IntrinsicKind::UnicodeString,
            StringKind::Wide => IntrinsicKind::WideString,
            StringKind::Ansi => IntrinsicKind::AnsiString,
            StringKind::Short => IntrinsicKind::ShortString,
        })
    }

    // ========================================================================
    // Lowering from the AST
    // ========================================================================

    /// The structural type of a declared type symbol, lowered on first request.
    ///
    /// A placeholder is cached before the body lowers so self-referential types
    /// (`TNode = ^TNode`) terminate.
    pub fn type_of_symbol(&mut self, symbols: &SymbolTable, sym: SymbolId) -> TypeId {
        if let Some(&id) = self.symbol_types.get(&sym) {
            return id;
        }
        let Some(symbol) = symbols.get(sym) else {
            return self.unknown();
        };
        let SymbolKind::Type(decl) = &symbol.kind else {
            return self.unknown();
        };
        let id = self.alloc(Type::Unknown);
        self.symbol_types.insert(sym, id);
        let scope = symbol.scope;
        let ty = self.lower_type_desc(symbols, scope, sym, &decl.body.clone());
        self.types[id] = ty;
        id
    }

    /// Lower a type reference appearing in `scope`.
    pub fn lower_type_ref(&mut self, symbols: &SymbolTable, scope: ScopeId, ty: &TypeRef) -> TypeId {
        match ty {
            TypeRef::Named { name, .. } => {
                let simple = name.simple_name();
                if let Some(&sym) = symbols
                    .lookup_from(scope, simple)
                    .and_then(|ids| ids.iter().find(|&&id| {
                        matches!(symbols.get(id).map(|s| &s.kind), Some(SymbolKind::Type(_)))
                    }))
                {
                    return self.type_of_symbol(symbols, sym);
                }
                if let Some(kind) = intrinsic_types::from_str(simple) {
                    return self.intrinsic(kind);
                }
                self.unknown()
            }
            TypeRef::Inline(desc) => {
                let ty = self.lower_anonymous_desc(symbols, scope, desc);
                self.alloc(ty)
            }
        }
    }

    /// Lower a named declaration's body.
    fn lower_type_desc(
        &mut self,
        symbols: &SymbolTable,
        scope: ScopeId,
        sym: SymbolId,
        desc: &TypeDesc,
    ) -> Type {
        match desc {
            TypeDesc::Struct(s) => match s.kind {
                StructKind::Class => Type::Class(sym),
                StructKind::Record | StructKind::Object => Type::Record(sym),
                StructKind::Interface => Type::Interface(sym),
            },
            TypeDesc::Helper(h) => Type::Helper {
                extended: self.lower_type_ref(symbols, scope, &h.extended.node),
                symbol: sym,
            },
            TypeDesc::Enum(_) => Type::Enum(Some(sym)),
            TypeDesc::ForwardClass => Type::Class(sym),
            other => self.lower_anonymous_desc(symbols, scope, other),
        }
    }

    /// Lower a structural (possibly anonymous) type body.
    fn lower_anonymous_desc(&mut self, symbols: &SymbolTable, scope: ScopeId, desc: &TypeDesc) -> Type {
        match desc {
            TypeDesc::Set(element) => {
                let element = self.lower_type_ref(symbols, scope, &element.node);
                Type::Set(element)
            }
            TypeDesc::Array(array) => {
                let element = self.lower_type_ref(symbols, scope, &array.element.node);
                Type::Array {
                    kind: array.kind,
                    element,
                }
            }
            TypeDesc::Pointer(target) => {
                let target = self.lower_type_ref(symbols, scope, &target.node);
                Type::Pointer(target)
            }
            TypeDesc::ClassRef(class) => {
                let class = self.lower_type_ref(symbols, scope, &class.node);
                Type::ClassReference(class)
            }
            TypeDesc::Procedural(_) => Type::Procedural,
            TypeDesc::Alias { target, .. } => {
                let aliased = self.lower_type_ref(symbols, scope, &target.node);
                let name = match &target.node {
                    TypeRef::Named { name, .. } => name.to_string(),
                    TypeRef::Inline(_) => String::new(),
                };
                Type::Alias { name, aliased }
            }
            TypeDesc::Subrange { .. } => Type::Subrange {
                base: self.intrinsic(IntrinsicKind::Integer),
            },
            TypeDesc::Enum(_) => Type::Enum(None),
            // Named-only bodies reaching this path lower to unknown.
            _ => Type::Unknown,
        }
    }

    // ========================================================================
    // Predicates
    // ========================================================================

    /// Strip alias layers. Bounded by a visited set so malformed alias cycles
    /// terminate.
    pub fn unalias(&self, id: TypeId) -> TypeId {
        let mut current = id;
        let mut visited = HashSet::new();
        while let Type::Alias { aliased, .. } = self.get(current) {
            if !visited.insert(current) {
                break;
            }
            current = *aliased;
        }
        current
    }

    pub fn is_unknown(&self, id: TypeId) -> bool {
        matches!(self.get(self.unalias(id)), Type::Unknown)
    }

    pub fn is_string(&self, id: TypeId) -> bool {
        matches!(self.get(self.unalias(id)), Type::DelphiString(_))
    }

    pub fn is_char(&self, id: TypeId) -> bool {
        matches!(
            self.get(self.unalias(id)),
            Type::Intrinsic(kind) if intrinsic_types::category(*kind) == IntrinsicCategory::Char
        )
    }

    /// Character width in bytes for chars and strings.
    pub fn char_width(&self, id: TypeId) -> Option<usize> {
        match self.get(self.unalias(id)) {
            Type::DelphiString(kind) => Some(kind.char_width()),
            Type::Intrinsic(kind) if intrinsic_types::category(*kind) == IntrinsicCategory::Char => {
                Some(intrinsic_types::size(*kind))
            }
            _ => None,
        }
    }

    pub fn is_integer(&self, id: TypeId) -> bool {
        self.has_category(id, IntrinsicCategory::Integer)
    }

    pub fn is_real(&self, id: TypeId) -> bool {
        self.has_category(id, IntrinsicCategory::Real)
    }

    pub fn is_boolean(&self, id: TypeId) -> bool {
        self.has_category(id, IntrinsicCategory::Boolean)
    }

    fn has_category(&self, id: TypeId, category: IntrinsicCategory) -> bool {
        matches!(
            self.get(self.unalias(id)),
            Type::Intrinsic(kind) if intrinsic_types::category(*kind) == category
        )
    }

    pub fn is_ordinal(&self, id: TypeId) -> bool {
        self.is_integer(id)
            || self.is_boolean(id)
            || self.is_char(id)
            || matches!(self.get(self.unalias(id)), Type::Enum(_) | Type::Subrange { .. })
    }

    pub fn is_array(&self, id: TypeId) -> bool {
        matches!(self.get(self.unalias(id)), Type::Array { .. })
    }

    pub fn is_dynamic_array(&self, id: TypeId) -> bool {
        matches!(
            self.get(self.unalias(id)),
            Type::Array {
                kind: ArrayKind::Dynamic,
                ..
            }
        )
    }

    pub fn is_array_constructor(&self, id: TypeId) -> bool {
        matches!(self.get(self.unalias(id)), Type::ArrayConstructor(_))
    }

    pub fn is_class(&self, id: TypeId) -> bool {
        matches!(self.get(self.unalias(id)), Type::Class(_))
    }

    pub fn is_record(&self, id: TypeId) -> bool {
        matches!(self.get(self.unalias(id)), Type::Record(_))
    }

    pub fn is_interface(&self, id: TypeId) -> bool {
        matches!(self.get(self.unalias(id)), Type::Interface(_))
    }

    pub fn is_class_reference(&self, id: TypeId) -> bool {
        matches!(self.get(self.unalias(id)), Type::ClassReference(_))
    }

    pub fn is_variant(&self, id: TypeId) -> bool {
        matches!(self.get(self.unalias(id)), Type::Variant)
    }

    pub fn is_alias(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Alias { .. })
    }

    /// Storage size in bytes where the model knows one; 0 otherwise.
    pub fn size(&self, id: TypeId) -> usize {
        match self.get(self.unalias(id)) {
            Type::Intrinsic(kind) => intrinsic_types::size(*kind),
            Type::DelphiString(StringKind::Short) => 256,
            Type::DelphiString(_) => 8,
            Type::Pointer(_) | Type::ClassReference(_) | Type::Class(_) | Type::Interface(_) => 8,
            _ => 0,
        }
    }

    /// The symbol behind a class/record/interface type, if any.
    pub fn struct_symbol(&self, id: TypeId) -> Option<SymbolId> {
        match self.get(self.unalias(id)) {
            Type::Class(sym) | Type::Record(sym) | Type::Interface(sym) => Some(*sym),
            _ => None,
        }
    }

    /// Ancestry test by name: true when the type's heritage chain reaches a type
    /// named `target` (the last segment of a dotted target is what's compared).
    /// The type itself does not count as its own ancestor. A visited set guards
    /// against heritage cycles in malformed units.
    pub fn is_sub_type_of(&self, id: TypeId, target: &str, symbols: &SymbolTable) -> bool {
        let Some(start) = self.struct_symbol(id) else {
            return false;
        };
        let target_last = target.rsplit('.').next().unwrap_or(target);

        let mut visited = HashSet::new();
        let mut stack = vec![start];
        while let Some(sym) = stack.pop() {
            if !visited.insert(sym) {
                continue;
            }
            let Some(symbol) = symbols.get(sym) else { continue };
            let SymbolKind::Type(decl) = &symbol.kind else { continue };
            for base in &decl.heritage {
                if strings::eq_ignore_case(base.simple_name(), target_last) {
                    return true;
                }
                if let Some(&base_id) = symbols
                    .lookup_from(symbol.scope, base.simple_name())
                    .and_then(|ids| ids.first())
                {
                    stack.push(base_id);
                }
            }
        }
        false
    }

    /// True when this type is a class whose ancestry reaches `TCustomAttribute`.
    /// Derived on demand; never stored on the type.
    pub fn is_attribute_class(&self, id: TypeId, symbols: &SymbolTable) -> bool {
        if !self.is_class(id) {
            return false;
        }
        if let Some(sym) = self.struct_symbol(id) {
            if let Some(symbol) = symbols.get(sym) {
                if strings::eq_ignore_case(&symbol.name, "TCustomAttribute") {
                    return true;
                }
            }
        }
        self.is_sub_type_of(id, "System.TCustomAttribute", symbols)
    }

    /// Human-readable spelling for diagnostics.
    pub fn display(&self, id: TypeId, symbols: &SymbolTable) -> String {
        match self.get(id) {
            Type::Intrinsic(kind) => intrinsic_types::as_str(*kind).to_string(),
            Type::DelphiString(StringKind::Unicode) => "string".to_string(),
            Type::DelphiString(StringKind::Wide) => "WideString".to_string(),
            Type::DelphiString(StringKind::Ansi) => "AnsiString".to_string(),
            Type::DelphiString(StringKind::Short) => "ShortString".to_string(),
            Type::Class(sym) | Type::Record(sym) | Type::Interface(sym) => symbols
                .get(*sym)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| "<type>".to_string()),
            Type::Enum(Some(sym)) => symbols
                .get(*sym)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| "<enum>".to_string()),
            Type::Enum(None) => "<enum>".to_string(),
            Type::Set(element) => format!("set of {}", self.display(*element, symbols)),
            Type::Array { element, .. } => format!("array of {}", self.display(*element, symbols)),
            Type::Pointer(target) => format!("^{}", self.display(*target, symbols)),
            Type::Procedural => "<procedural>".to_string(),
            Type::ClassReference(class) => format!("class of {}", self.display(*class, symbols)),
            Type::TypeParameter(name) => name.clone(),
            Type::Alias { name, aliased } => {
                if name.is_empty() {
                    self.display(*aliased, symbols)
                } else {
                    name.clone()
                }
            }
            Type::Helper { extended, .. } => {
                format!("helper for {}", self.display(*extended, symbols))
            }
            Type::ArrayConstructor(_) => "<array constructor>".to_string(),
            Type::Subrange { base } => format!("subrange of {}", self.display(*base, symbols)),
            Type::Variant => "Variant".to_string(),
            Type::Unknown => "<unknown>".to_string(),
        }
    }

    /// Iterate over every operator/routine member of a record type, in the order
    /// declared in source. Used by round/trunc return-type lookup.
    pub fn record_routines<'a>(
        &self,
        id: TypeId,
        symbols: &'a SymbolTable,
    ) -> Vec<&'a delfin_syntax::ast::RoutineDecl> {
        let Some(sym) = self.struct_symbol(id) else {
            return Vec::new();
        };
        let Some(symbol) = symbols.get(sym) else {
            return Vec::new();
        };
        let SymbolKind::Type(decl) = &symbol.kind else {
            return Vec::new();
        };
        let TypeDesc::Struct(body) = &decl.body else {
            return Vec::new();
        };
        let mut routines = Vec::new();
        for section in &body.sections {
            for member in &section.node.members {
                if let Decl::Routine(routine) = &member.node {
                    routines.push(routine);
                }
            }
        }
        routines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intrinsics_are_interned() {
        let mut arena = TypeArena::new();
        let a = arena.intrinsic(IntrinsicKind::Integer);
        let b = arena.intrinsic(IntrinsicKind::Integer);
        assert_eq!(a, b);
        assert_ne!(a, arena.intrinsic(IntrinsicKind::Int64));
    }

    #[test]
    fn string_intrinsics_normalize_to_delphi_string() {
        let mut arena = TypeArena::new();
        let s = arena.intrinsic(IntrinsicKind::UnicodeString);
        assert_eq!(arena.get(s), &Type::DelphiString(StringKind::Unicode));
        assert_eq!(arena.char_width(s), Some(2));
        let a = arena.intrinsic(IntrinsicKind::AnsiString);
        assert_eq!(arena.char_width(a), Some(1));
    }

    #[test]
    fn unalias_terminates_on_cycles() {
        let mut arena = TypeArena::new();
        // Two aliases pointing at each other; malformed but must not hang.
        let first = arena.alloc(Type::Unknown);
        let second = arena.alloc(Type::Alias {
            name: "A".to_string(),
            aliased: first,
        });
        arena.types[first] = Type::Alias {
            name: "B".to_string(),
            aliased: second,
        };
        let resolved = arena.unalias(first);
        assert!(matches!(arena.get(resolved), Type::Alias { .. }));
    }

    #[test]
    fn alias_transparency_reaches_the_target() {
        let mut arena = TypeArena::new();
        let int = arena.intrinsic(IntrinsicKind::Integer);
        let alias = arena.alloc(Type::Alias {
            name: "TMyInt".to_string(),
            aliased: int,
        });
        assert_eq!(arena.unalias(alias), int);
        assert!(arena.is_integer(alias));
    }

    #[test]
    fn char_predicates_track_width() {
        let mut arena = TypeArena::new();
        let ansi = arena.intrinsic(IntrinsicKind::AnsiChar);
        let wide = arena.intrinsic(IntrinsicKind::WideChar);
        assert!(arena.is_char(ansi));
        assert_eq!(arena.char_width(ansi), Some(1));
        assert_eq!(arena.char_width(wide), Some(2));
        assert_eq!(arena.size(ansi), 1);
    }
}
