//! Assignability between types.
//!
//! `is_assignable(from, to)` answers "may a value of `from` be stored into a slot
//! of `to`", kind-pairwise and asymmetric. Aliases are transparent; unknown and
//! Variant are permissive so one missing declaration does not cascade.

use std::collections::HashSet;

use delfin_core::lang::intrinsic_types::{self, IntrinsicCategory, IntrinsicKind};

use super::{Type, TypeArena, TypeId};
use crate::frontend::symbols::SymbolTable;

/// Whether a value of `from` is assignable to a slot of type `to`.
pub fn is_assignable(arena: &TypeArena, symbols: &SymbolTable, from: TypeId, to: TypeId) -> bool {
    assignable(arena, symbols, from, to, &mut HashSet::new())
}

/// The recursive worker. `seen` holds the pairs currently under consideration;
/// cyclic type graphs (`PA = ^PB; PB = ^PA;`) revisit a pair, and a revisit is
/// taken as compatible so the walk stays bounded.
fn assignable(
    arena: &TypeArena,
    symbols: &SymbolTable,
    from: TypeId,
    to: TypeId,
    seen: &mut HashSet<(TypeId, TypeId)>,
) -> bool {
    let from = arena.unalias(from);
    let to = arena.unalias(to);
    if from == to {
        return true;
    }
    if !seen.insert((from, to)) {
        return true;
    }

    match (arena.get(from), arena.get(to)) {
        // Unknown and Variant absorb everything, both directions.
        (Type::Unknown, _) | (_, Type::Unknown) => true,
        (Type::Variant, _) | (_, Type::Variant) => true,

        (Type::Intrinsic(f), Type::Intrinsic(t)) => intrinsic_assignable(*f, *t),

        // Chars widen into strings of at least their width.
        (Type::Intrinsic(f), Type::DelphiString(t))
            if intrinsic_types::category(*f) == IntrinsicCategory::Char =>
        {
            intrinsic_types::size(*f) <= t.char_width()
        }
        // Narrow strings widen into wide strings; equal widths interchange.
        (Type::DelphiString(f), Type::DelphiString(t)) => f.char_width() <= t.char_width(),

        // Ordinals into subranges and back out to the base.
        (Type::Subrange { base }, _) => assignable(arena, symbols, *base, to, seen),
        (_, Type::Subrange { base }) => assignable(arena, symbols, from, *base, seen),

        // A class value fits a slot of any ancestor class or implemented interface.
        (Type::Class(_), Type::Class(to_sym)) | (Type::Class(_), Type::Interface(to_sym)) => {
            let target = symbols.get(*to_sym).map(|s| s.name.as_str()).unwrap_or("");
            !target.is_empty() && arena.is_sub_type_of(from, target, symbols)
        }
        // An interface fits a slot of any ancestor interface.
        (Type::Interface(_), Type::Interface(to_sym)) => {
            let target = symbols.get(*to_sym).map(|s| s.name.as_str()).unwrap_or("");
            !target.is_empty() && arena.is_sub_type_of(from, target, symbols)
        }

        // Class references covary with the referenced class.
        (Type::ClassReference(f), Type::ClassReference(t)) => {
            arena.unalias(*f) == arena.unalias(*t) || assignable(arena, symbols, *f, *t, seen)
        }

        // Any class, interface, or typed pointer fits an untyped Pointer slot.
        (Type::Class(_) | Type::Interface(_) | Type::Pointer(_), Type::Intrinsic(IntrinsicKind::Pointer)) => true,
        (Type::Intrinsic(IntrinsicKind::Pointer), Type::Pointer(_) | Type::Class(_) | Type::Interface(_)) => true,
        (Type::Pointer(f), Type::Pointer(t)) => assignable(arena, symbols, *f, *t, seen),

        (Type::Enum(f), Type::Enum(t)) => f == t,

        (Type::Set(f), Type::Set(t)) => assignable(arena, symbols, *f, *t, seen),

        // Dynamic arrays are assignable by element type.
        (
            Type::Array {
                element: f_element, ..
            },
            Type::Array {
                element: t_element, ..
            },
        ) => assignable(arena, symbols, *f_element, *t_element, seen),

        // Bracketed constructors fit arrays and sets whose element type accepts
        // every constructor element.
        (Type::ArrayConstructor(elements), Type::Array { element, .. })
        | (Type::ArrayConstructor(elements), Type::Set(element)) => elements
            .iter()
            .all(|&e| assignable(arena, symbols, e, *element, seen)),

        (Type::Procedural, Type::Procedural) => true,

        // A class type used as a value fits a matching metaclass slot.
        (Type::Class(f_sym), Type::ClassReference(t)) => {
            arena.struct_symbol(*t).is_none_or(|t_sym| {
                *f_sym == t_sym || {
                    let target = symbols.get(t_sym).map(|s| s.name.as_str()).unwrap_or("");
                    !target.is_empty() && arena.is_sub_type_of(from, target, symbols)
                }
            })
        }

        _ => false,
    }
}

/// Intrinsic-to-intrinsic widening.
fn intrinsic_assignable(from: IntrinsicKind, to: IntrinsicKind) -> bool {
    use IntrinsicCategory::*;
    let from_cat = intrinsic_types::category(from);
    let to_cat = intrinsic_types::category(to);
    match (from_cat, to_cat) {
        (Integer, Integer) => true,
        (Integer, Real) => true,
        (Real, Real) => true,
        (Boolean, Boolean) => true,
        (Char, Char) => intrinsic_types::size(from) <= intrinsic_types::size(to),
        (Pointer, Pointer) => true,
        _ => false,
    }
}
