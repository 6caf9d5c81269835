//! Intrinsic routine vocabulary.
//!
//! Intrinsic routines are the compiler-magic functions whose result type is computed
//! from their argument types rather than read off a declared signature: `High('x')`
//! is a `WideChar`, `High(SomeArray)` is an `Integer`, `Concat` widens to the widest
//! string among its arguments, and so on.
//!
//! This registry maps routine names to a [`ReturnTypeRule`]; the actual computation is
//! a pure function in the analyzer crate (`delfin::frontend::types::intrinsic_return`).

/// How an intrinsic routine's return type is derived from its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnTypeRule {
    /// `High`/`Low`: ordinal/element type of the argument; `Integer` for arrays and
    /// strings; class references unwrap to their class type first.
    HighLow,
    /// `Round`/`Trunc`: `Int64`, unless the argument is a record declaring a matching
    /// `operator` overload, in which case that overload's declared return type.
    RoundTrunc,
    /// `Concat`: widest string type among string/dynamic-array/variant arguments,
    /// chars widened to strings first; otherwise an array constructor synthesized
    /// from array-constructor arguments.
    Concat,
    /// `Copy`: first argument's type, with chars promoted to the matching string.
    Copy,
    /// `TypeOf`-style: unwrap a class-reference argument to its class type.
    ClassReferenceValue,
    /// Result is simply the type of the argument at this index.
    ArgumentByIndex(usize),
}

/// Metadata for an intrinsic routine.
#[derive(Debug, Clone, Copy)]
pub struct IntrinsicRoutineInfo {
    /// Canonical spelling as documented.
    pub canonical: &'static str,
    pub rule: ReturnTypeRule,
}

const fn info(canonical: &'static str, rule: ReturnTypeRule) -> IntrinsicRoutineInfo {
    IntrinsicRoutineInfo { canonical, rule }
}

/// Registry of intrinsic routines with argument-dependent return types.
pub const INTRINSIC_ROUTINES: &[IntrinsicRoutineInfo] = &[
    info("High", ReturnTypeRule::HighLow),
    info("Low", ReturnTypeRule::HighLow),
    info("Round", ReturnTypeRule::RoundTrunc),
    info("Trunc", ReturnTypeRule::RoundTrunc),
    info("Concat", ReturnTypeRule::Concat),
    info("Copy", ReturnTypeRule::Copy),
    info("Slice", ReturnTypeRule::Copy),
    info("TypeOf", ReturnTypeRule::ClassReferenceValue),
    info("Default", ReturnTypeRule::ClassReferenceValue),
    info("Succ", ReturnTypeRule::ArgumentByIndex(0)),
    info("Pred", ReturnTypeRule::ArgumentByIndex(0)),
    info("Swap", ReturnTypeRule::ArgumentByIndex(0)),
];

/// Look up the return-type rule for a routine name, case-insensitively.
pub fn rule_for(name: &str) -> Option<ReturnTypeRule> {
    INTRINSIC_ROUTINES
        .iter()
        .find(|r| r.canonical.eq_ignore_ascii_case(name))
        .map(|r| r.rule)
}

/// Fixed-signature System routines the compiler provides without a declaration.
/// These resolve even when no unit declares them.
const SYSTEM_ROUTINES: &[&str] = &[
    "Abs", "Assert", "Assigned", "Break", "Chr", "Continue", "Dec", "Dispose",
    "Exclude", "Exit", "FillChar", "FreeMem", "GetMem", "Halt", "Inc", "Include",
    "Length", "Move", "New", "Odd", "Ord", "Read", "ReadLn", "SetLength",
    "SetString", "SizeOf", "Sqr", "Str", "Val", "Write", "WriteLn",
];

/// Whether a name is a routine the compiler always has in scope, either a
/// fixed-signature System routine or one of the magic intrinsics above.
pub fn is_system_routine(name: &str) -> bool {
    SYSTEM_ROUTINES.iter().any(|r| r.eq_ignore_ascii_case(name)) || rule_for(name).is_some()
}
