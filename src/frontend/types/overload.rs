//! Overload resolution over routine candidate sets.
//!
//! Candidates come from the symbol table as the full overload set declared under
//! one name. Exact parameter matches outrank matches that need widening; a single
//! winner at the best rank resolves, more than one is ambiguous.

use thiserror::Error;

use super::compat::is_assignable;
use super::{TypeArena, TypeId};
use crate::frontend::symbols::{SymbolId, SymbolKind, SymbolTable};

/// Why an overloaded call failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OverloadError {
    #[error("no candidate accepts the given arguments")]
    NoMatch,
    #[error("two or more candidates rank equally")]
    Ambiguous,
}

/// How well a candidate fits the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Rank {
    /// Every argument type equals its parameter type.
    Exact,
    /// Every argument is assignable; at least one needed widening.
    Widening,
}

/// Pick the routine from `candidates` that the argument types select.
///
/// Arity is checked against declared parameter names, with trailing defaulted
/// parameters optional. Parameter types lower in the scope the routine was
/// declared in, so member routines see their enclosing type's names.
pub fn resolve_overload(
    arena: &mut TypeArena,
    symbols: &SymbolTable,
    candidates: &[SymbolId],
    arg_types: &[TypeId],
) -> Result<SymbolId, OverloadError> {
    let mut best: Option<(Rank, Vec<SymbolId>)> = None;

    for &candidate in candidates {
        let Some(rank) = rank_candidate(arena, symbols, candidate, arg_types) else {
            continue;
        };
        match &mut best {
            None => best = Some((rank, vec![candidate])),
            Some((current, matched)) => {
                if rank < *current {
                    *current = rank;
                    matched.clear();
                    matched.push(candidate);
                } else if rank == *current {
                    matched.push(candidate);
                }
            }
        }
    }

    match best {
        None => Err(OverloadError::NoMatch),
        Some((_, matched)) if matched.len() == 1 => Ok(matched[0]),
        Some(_) => Err(OverloadError::Ambiguous),
    }
}

/// The candidate's rank against the arguments, or `None` when it cannot accept
/// them at all.
fn rank_candidate(
    arena: &mut TypeArena,
    symbols: &SymbolTable,
    candidate: SymbolId,
    arg_types: &[TypeId],
) -> Option<Rank> {
    let symbol = symbols.get(candidate)?;
    let SymbolKind::Routine(routine) = &symbol.kind else {
        return None;
    };
    let scope = symbol.scope;

    // One entry per declared name; `a, b: Integer` yields two.
    let mut params: Vec<(Option<TypeId>, bool)> = Vec::new();
    for group in routine.params.clone() {
        let ty = group
            .ty
            .as_ref()
            .map(|t| arena.lower_type_ref(symbols, scope, &t.node));
        let has_default = group.default.is_some();
        for _ in &group.names {
            params.push((ty, has_default));
        }
    }

    let required = params.iter().filter(|(_, has_default)| !has_default).count();
    if arg_types.len() < required || arg_types.len() > params.len() {
        return None;
    }

    let mut rank = Rank::Exact;
    for (&arg, (param, _)) in arg_types.iter().zip(&params) {
        let Some(param) = *param else {
            // Untyped parameter accepts anything but never exactly.
            rank = Rank::Widening;
            continue;
        };
        if arena.unalias(arg) == arena.unalias(param) {
            continue;
        }
        if is_assignable(arena, symbols, arg, param) {
            rank = Rank::Widening;
        } else {
            return None;
        }
    }
    Some(rank)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::symbols::{RoutineSymbol, Symbol};
    use delfin_core::lang::intrinsic_types::IntrinsicKind;
    use delfin_syntax::ast::{
        Expr, Param, ParamModifier, RoutineKind, Span, Spanned, TypeRef,
    };

    fn param(names: &[&str], ty: Option<&str>, default: bool) -> Param {
        Param {
            modifier: ParamModifier::None,
            names: names
                .iter()
                .map(|n| Spanned::new(n.to_string(), Span::default()))
                .collect(),
            ty: ty.map(|t| Spanned::new(TypeRef::named(t), Span::default())),
            default: default.then(|| Spanned::new(Expr::IntLit(0), Span::default())),
        }
    }

    fn routine(table: &mut SymbolTable, name: &str, params: Vec<Param>) -> SymbolId {
        match table.define(Symbol {
            name: name.to_string(),
            kind: SymbolKind::Routine(RoutineSymbol {
                kind: RoutineKind::Procedure,
                params,
                return_type: None,
                is_class_method: false,
                has_body: false,
                is_forward: false,
            }),
            span: Span::default(),
            scope: 0,
        }) {
            crate::frontend::symbols::DefineOutcome::Defined(id) => id,
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn exact_match_beats_widening() {
        let mut arena = TypeArena::new();
        let mut symbols = SymbolTable::new();
        let takes_int = routine(&mut symbols, "Emit", vec![param(&["Value"], Some("Integer"), false)]);
        let _takes_double = routine(&mut symbols, "Emit", vec![param(&["Value"], Some("Double"), false)]);
        let int = arena.intrinsic(IntrinsicKind::Integer);
        let candidates = symbols.lookup("Emit").unwrap_or(&[]).to_vec();
        assert_eq!(resolve_overload(&mut arena, &symbols, &candidates, &[int]), Ok(takes_int));
    }

    #[test]
    fn widening_resolves_when_unique() {
        let mut arena = TypeArena::new();
        let mut symbols = SymbolTable::new();
        let takes_double = routine(&mut symbols, "Emit", vec![param(&["Value"], Some("Double"), false)]);
        let _takes_string = routine(&mut symbols, "Emit", vec![param(&["Value"], Some("String"), false)]);
        let int = arena.intrinsic(IntrinsicKind::Integer);
        let candidates = symbols.lookup("Emit").unwrap_or(&[]).to_vec();
        assert_eq!(resolve_overload(&mut arena, &symbols, &candidates, &[int]), Ok(takes_double));
    }

    #[test]
    fn two_widening_candidates_are_ambiguous() {
        let mut arena = TypeArena::new();
        let mut symbols = SymbolTable::new();
        routine(&mut symbols, "Emit", vec![param(&["Value"], Some("Double"), false)]);
        routine(&mut symbols, "Emit", vec![param(&["Value"], Some("Single"), false)]);
        let int = arena.intrinsic(IntrinsicKind::Integer);
        let candidates = symbols.lookup("Emit").unwrap_or(&[]).to_vec();
        assert_eq!(
            resolve_overload(&mut arena, &symbols, &candidates, &[int]),
            Err(OverloadError::Ambiguous)
        );
    }

    #[test]
    fn arity_mismatch_is_no_match() {
        let mut arena = TypeArena::new();
        let mut symbols = SymbolTable::new();
        routine(&mut symbols, "Emit", vec![param(&["A", "B"], Some("Integer"), false)]);
        let int = arena.intrinsic(IntrinsicKind::Integer);
        let candidates = symbols.lookup("Emit").unwrap_or(&[]).to_vec();
        assert_eq!(
            resolve_overload(&mut arena, &symbols, &candidates, &[int]),
            Err(OverloadError::NoMatch)
        );
    }

    #[test]
    fn trailing_defaults_are_optional() {
        let mut arena = TypeArena::new();
        let mut symbols = SymbolTable::new();
        let id = routine(
            &mut symbols,
            "Emit",
            vec![
                param(&["Value"], Some("Integer"), false),
                param(&["Extra"], Some("Integer"), true),
            ],
        );
        let int = arena.intrinsic(IntrinsicKind::Integer);
        let candidates = symbols.lookup("Emit").unwrap_or(&[]).to_vec();
        assert_eq!(resolve_overload(&mut arena, &symbols, &candidates, &[int]), Ok(id));
        assert_eq!(resolve_overload(&mut arena, &symbols, &candidates, &[int, int]), Ok(id));
    }

    #[test]
    fn incompatible_arguments_are_no_match() {
        let mut arena = TypeArena::new();
        let mut symbols = SymbolTable::new();
        routine(&mut symbols, "Emit", vec![param(&["Value"], Some("Integer"), false)]);
        let string_ty = arena.intrinsic(IntrinsicKind::UnicodeString);
        let candidates = symbols.lookup("Emit").unwrap_or(&[]).to_vec();
        assert_eq!(
            resolve_overload(&mut arena, &symbols, &candidates, &[string_ty]),
            Err(OverloadError::NoMatch)
        );
    }
}
