//! Return types of compiler-magic routines.
//!
//! These routines (`High`, `Round`, `Concat`, `Copy`, ...) have no fixed declared
//! signature; their result type is a pure function of their argument types. The
//! name-to-rule mapping lives in `delfin_core::lang::intrinsic_routines`; this
//! module implements the rules themselves.

use delfin_core::lang::intrinsic_routines::ReturnTypeRule;
use delfin_core::lang::intrinsic_types::IntrinsicKind;
use delfin_core::strings;
use delfin_syntax::ast::RoutineKind;

use super::{StringKind, Type, TypeArena, TypeId};
use crate::frontend::symbols::SymbolTable;

/// Compute the return type of an intrinsic routine call.
///
/// `name` is the routine name as called (needed by the round/trunc rule, which
/// searches record operators by that name).
pub fn return_type(
    rule: ReturnTypeRule,
    name: &str,
    args: &[TypeId],
    arena: &mut TypeArena,
    symbols: &SymbolTable,
) -> TypeId {
    match rule {
        ReturnTypeRule::HighLow => high_low(args, arena),
        ReturnTypeRule::RoundTrunc => round_trunc(name, args, arena, symbols),
        ReturnTypeRule::Concat => concat(args, arena),
        ReturnTypeRule::Copy => copy(args, arena),
        ReturnTypeRule::ClassReferenceValue => class_reference_value(args, arena),
        ReturnTypeRule::ArgumentByIndex(index) => args.get(index).copied().unwrap_or(arena.unknown()),
    }
}

/// `High`/`Low`: class references unwrap to their class first; arrays and strings
/// index with `Integer`; any other ordinal returns itself.
fn high_low(args: &[TypeId], arena: &mut TypeArena) -> TypeId {
    let Some(&arg) = args.first() else {
        return arena.unknown();
    };
    let mut arg = arena.unalias(arg);
    if let Type::ClassReference(class) = arena.get(arg) {
        arg = arena.unalias(*class);
    }
    if arena.is_array(arg) || arena.is_string(arg) {
        return arena.intrinsic(IntrinsicKind::Integer);
    }
    arg
}

/// `Round`/`Trunc`: `Int64`, unless the argument is a record declaring an operator
/// whose name matches the called routine. The first matching operator in
/// declaration order is authoritative, even if a later one also matches.
fn round_trunc(name: &str, args: &[TypeId], arena: &mut TypeArena, symbols: &SymbolTable) -> TypeId {
    if let Some(&arg) = args.first() {
        let arg = arena.unalias(arg);
        if arena.is_record(arg) {
            let scope = arena
                .struct_symbol(arg)
                .and_then(|sym| symbols.get(sym))
                .map(|s| s.scope)
                .unwrap_or(0);
            let matching = arena.record_routines(arg, symbols).into_iter().find(|routine| {
                routine.kind == RoutineKind::Operator
                    && strings::eq_ignore_case(routine.name.node.simple_name(), name)
            });
            if let Some(routine) = matching {
                if let Some(return_ty) = routine.return_type.clone() {
                    return arena.lower_type_ref(symbols, scope, &return_ty.node);
                }
            }
        }
    }
    arena.intrinsic(IntrinsicKind::Int64)
}

/// `Concat`: among string, dynamic-array, and Variant arguments (chars widened to
/// strings first), the widest character width wins; ties keep the first argument's
/// type. With no such argument the result is an array constructor over the union,
/// in encounter order, of the element types of array-constructor arguments.
fn concat(args: &[TypeId], arena: &mut TypeArena) -> TypeId {
    let mut best: Option<TypeId> = None;

    for &arg in args {
        let arg = arena.unalias(arg);
        let candidate = match arena.get(arg).clone() {
            Type::Intrinsic(IntrinsicKind::AnsiChar) => Some(arena.string_type(StringKind::Ansi)),
            Type::Intrinsic(IntrinsicKind::WideChar) => Some(arena.string_type(StringKind::Unicode)),
            Type::DelphiString(_) => Some(arg),
            Type::Array { .. } if arena.is_dynamic_array(arg) => Some(arg),
            Type::Variant => Some(arg),
            _ => None,
        };
        let Some(candidate) = candidate else { continue };
        best = Some(match best {
            None => candidate,
            Some(current) => {
                let current_width = arena.char_width(current).unwrap_or(0);
                let candidate_width = arena.char_width(candidate).unwrap_or(0);
                if candidate_width > current_width {
                    candidate
                } else {
                    current
                }
            }
        });
    }

    if let Some(best) = best {
        return best;
    }

    // No string-like argument: union the element types of array constructors.
    let mut elements: Vec<TypeId> = Vec::new();
    for &arg in args {
        let arg = arena.unalias(arg);
        if let Type::ArrayConstructor(parts) = arena.get(arg).clone() {
            for part in parts {
                let canonical = arena.unalias(part);
                if !elements.iter().any(|&e| arena.unalias(e) == canonical) {
                    elements.push(part);
                }
            }
        }
    }
    arena.alloc(Type::ArrayConstructor(elements))
}

/// `Copy`/`Slice`: a char first argument promotes to the string of its width;
/// everything else passes through unchanged.
fn copy(args: &[TypeId], arena: &mut TypeArena) -> TypeId {
    let Some(&arg) = args.first() else {
        return arena.unknown();
    };
    if arena.is_char(arg) {
        return if arena.size(arg) == 1 {
            arena.string_type(StringKind::Ansi)
        } else {
            arena.string_type(StringKind::Unicode)
        };
    }
    arg
}

/// `TypeOf`-style: unwrap a class reference to the class it references.
fn class_reference_value(args: &[TypeId], arena: &mut TypeArena) -> TypeId {
    let Some(&arg) = args.first() else {
        return arena.unknown();
    };
    let arg = arena.unalias(arg);
    match arena.get(arg) {
        Type::ClassReference(class) => *class,
        _ => arena.unknown(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delfin_syntax::ast::ArrayKind;

    #[test]
    fn high_low_indexes_arrays_and_strings_with_integer() {
        let mut arena = TypeArena::new();
        let symbols = SymbolTable::new();
        let int = arena.intrinsic(IntrinsicKind::Integer);
        let string_ty = arena.intrinsic(IntrinsicKind::UnicodeString);
        let array = arena.alloc(Type::Array {
            kind: ArrayKind::Dynamic,
            element: string_ty,
        });
        assert_eq!(
            return_type(ReturnTypeRule::HighLow, "High", &[array], &mut arena, &symbols),
            int
        );
        assert_eq!(
            return_type(ReturnTypeRule::HighLow, "High", &[string_ty], &mut arena, &symbols),
            int
        );
        // Ordinals return themselves.
        let byte = arena.intrinsic(IntrinsicKind::Byte);
        assert_eq!(
            return_type(ReturnTypeRule::HighLow, "Low", &[byte], &mut arena, &symbols),
            byte
        );
    }

    #[test]
    fn high_low_unwraps_class_references() {
        let mut arena = TypeArena::new();
        let symbols = SymbolTable::new();
        let int = arena.intrinsic(IntrinsicKind::Integer);
        let string_ty = arena.intrinsic(IntrinsicKind::UnicodeString);
        let class_ref = arena.alloc(Type::ClassReference(string_ty));
        assert_eq!(
            return_type(ReturnTypeRule::HighLow, "High", &[class_ref], &mut arena, &symbols),
            int
        );
    }

    #[test]
    fn round_trunc_defaults_to_int64() {
        let mut arena = TypeArena::new();
        let symbols = SymbolTable::new();
        let double = arena.intrinsic(IntrinsicKind::Double);
        let int64 = arena.intrinsic(IntrinsicKind::Int64);
        assert_eq!(
            return_type(ReturnTypeRule::RoundTrunc, "Round", &[double], &mut arena, &symbols),
            int64
        );
    }

    #[test]
    fn concat_picks_widest_string_and_widens_chars() {
        let mut arena = TypeArena::new();
        let symbols = SymbolTable::new();
        let ansi = arena.intrinsic(IntrinsicKind::AnsiString);
        let unicode = arena.intrinsic(IntrinsicKind::UnicodeString);
        let wide_char = arena.intrinsic(IntrinsicKind::WideChar);

        let result = return_type(ReturnTypeRule::Concat, "Concat", &[ansi, wide_char], &mut arena, &symbols);
        assert_eq!(arena.unalias(result), unicode);

        let ansi_char = arena.intrinsic(IntrinsicKind::AnsiChar);
        let result = return_type(ReturnTypeRule::Concat, "Concat", &[ansi_char, ansi], &mut arena, &symbols);
        assert_eq!(arena.char_width(result), Some(1));
    }

    #[test]
    fn concat_of_array_constructors_unions_element_types() {
        let mut arena = TypeArena::new();
        let symbols = SymbolTable::new();
        let int = arena.intrinsic(IntrinsicKind::Integer);
        let byte = arena.intrinsic(IntrinsicKind::Byte);
        let first = arena.alloc(Type::ArrayConstructor(vec![int, byte]));
        let second = arena.alloc(Type::ArrayConstructor(vec![byte, int]));
        let result = return_type(ReturnTypeRule::Concat, "Concat", &[first, second], &mut arena, &symbols);
        let Type::ArrayConstructor(elements) = arena.get(result) else {
            panic!("expected array constructor");
        };
        assert_eq!(elements, &vec![int, byte]);
    }

    #[test]
    fn copy_promotes_chars_by_size() {
        let mut arena = TypeArena::new();
        let symbols = SymbolTable::new();
        let ansi_char = arena.intrinsic(IntrinsicKind::AnsiChar);
        let wide_char = arena.intrinsic(IntrinsicKind::WideChar);
        let ansi = arena.intrinsic(IntrinsicKind::AnsiString);
        let unicode = arena.intrinsic(IntrinsicKind::UnicodeString);
        assert_eq!(
            return_type(ReturnTypeRule::Copy, "Copy", &[ansi_char], &mut arena, &symbols),
            ansi
        );
        assert_eq!(
            return_type(ReturnTypeRule::Copy, "Copy", &[wide_char], &mut arena, &symbols),
            unicode
        );
        // Non-chars pass through.
        let int = arena.intrinsic(IntrinsicKind::Integer);
        assert_eq!(
            return_type(ReturnTypeRule::Copy, "Copy", &[int], &mut arena, &symbols),
            int
        );
    }

    #[test]
    fn class_reference_value_unwraps_or_unknowns() {
        let mut arena = TypeArena::new();
        let symbols = SymbolTable::new();
        let int = arena.intrinsic(IntrinsicKind::Integer);
        let class_ref = arena.alloc(Type::ClassReference(int));
        assert_eq!(
            return_type(ReturnTypeRule::ClassReferenceValue, "TypeOf", &[class_ref], &mut arena, &symbols),
            int
        );
        assert_eq!(
            return_type(ReturnTypeRule::ClassReferenceValue, "TypeOf", &[int], &mut arena, &symbols),
            arena.unknown()
        );
    }

    #[test]
    fn argument_by_index_is_positional() {
        let mut arena = TypeArena::new();
        let symbols = SymbolTable::new();
        let int = arena.intrinsic(IntrinsicKind::Integer);
        assert_eq!(
            return_type(ReturnTypeRule::ArgumentByIndex(0), "Succ", &[int], &mut arena, &symbols),
            int
        );
        assert_eq!(
            return_type(ReturnTypeRule::ArgumentByIndex(2), "Succ", &[int], &mut arena, &symbols),
            arena.unknown()
        );
    }
}
