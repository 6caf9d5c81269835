//! End-to-end tests for the analysis pipeline.
//!
//! Each test runs `analyze` on a complete unit and inspects the resulting
//! symbols, expression types, or diagnostics. Sources are inline; the tests
//! that exercise include resolution write fixture files to a temp directory.

use std::fs;
use std::path::PathBuf;

use delfin::ast::{Decl, Expr, Module, Spanned, Stmt};
use delfin::diagnostics::DiagnosticKind;
use delfin::{analyze, Analysis, AnalyzeOptions};

fn analyze_unit(source: &str) -> Analysis {
    analyze(source, "test.pas", &AnalyzeOptions::default())
}

/// Analyze and require a diagnostic-free result.
fn analyze_clean(source: &str) -> Analysis {
    let analysis = analyze_unit(source);
    assert!(
        analysis.diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        analysis.diagnostics
    );
    analysis
}

/// Every assignment right-hand side in the implementation section's routines,
/// in source order.
fn assignment_values(module: &Module) -> Vec<Spanned<Expr>> {
    let mut values = Vec::new();
    for decl in &module.implementation.decls {
        if let Decl::Routine(routine) = &decl.node {
            if let Some(block) = &routine.body {
                collect_assigns(&block.body, &mut values);
            }
        }
    }
    values
}

fn collect_assigns(stmts: &[Spanned<Stmt>], out: &mut Vec<Spanned<Expr>>) {
    for stmt in stmts {
        match &stmt.node {
            Stmt::Assign { value, .. } => out.push(value.clone()),
            Stmt::Compound(inner) => collect_assigns(inner, out),
            _ => {}
        }
    }
}

/// Display spelling of the nth assignment value's type, aliases peeled.
fn value_type(analysis: &Analysis, index: usize) -> String {
    let values = assignment_values(&analysis.module);
    let expr = values
        .get(index)
        .unwrap_or_else(|| panic!("no assignment at index {index}; found {}", values.len()));
    let id = analysis.expr_types[&expr.span];
    analysis
        .arena
        .display(analysis.arena.unalias(id), &analysis.symbols)
}

// ============================================================================
// Conditional compilation
// ============================================================================

#[test]
fn false_branch_declarations_never_reach_the_symbol_table() {
    let source = "unit U;\n\
                  interface\n\
                  {$IFDEF FEATURE}\n\
                  var\n  Hidden: Integer;\n\
                  {$ELSE}\n\
                  var\n  Fallback: Integer;\n\
                  {$ENDIF}\n\
                  implementation\nend.";

    let without = analyze_clean(source);
    assert!(without.symbols.lookup_local(0, "Hidden").is_none());
    assert!(without.symbols.lookup_local(0, "Fallback").is_some());

    let with = analyze(
        source,
        "test.pas",
        &AnalyzeOptions {
            defines: vec!["FEATURE".to_string()],
            ..Default::default()
        },
    );
    assert!(with.symbols.lookup_local(0, "Hidden").is_some());
    assert!(with.symbols.lookup_local(0, "Fallback").is_none());
}

// ============================================================================
// Intrinsic return-type rules
// ============================================================================

#[test]
fn round_takes_its_type_from_the_first_matching_record_operator() {
    let analysis = analyze_clean(
        "unit U;\n\
         interface\n\
         type\n\
         \x20 TFixed = record\n\
         \x20   class operator Round(const Value: TFixed): Int64;\n\
         \x20   class operator Round(const Value: TFixed; Digits: Integer): Integer;\n\
         \x20 end;\n\
         var\n\
         \x20 F: TFixed;\n\
         \x20 N: Int64;\n\
         implementation\n\
         procedure P;\n\
         begin\n\
         \x20 N := Round(F);\n\
         end;\n\
         end.",
    );
    assert_eq!(value_type(&analysis, 0), "Int64");
}

#[test]
fn round_on_plain_reals_yields_int64() {
    let analysis = analyze_clean(
        "unit U;\ninterface\nvar\n  N: Int64;\nimplementation\n\
         procedure P;\nbegin\n  N := Round(2.5);\nend;\nend.",
    );
    assert_eq!(value_type(&analysis, 0), "Int64");
}

#[test]
fn concat_prefers_the_widest_string_argument() {
    let analysis = analyze_clean(
        "unit U;\n\
         interface\n\
         var\n\
         \x20 A: AnsiString;\n\
         \x20 W: string;\n\
         \x20 S: string;\n\
         \x20 T: AnsiString;\n\
         implementation\n\
         procedure P;\n\
         begin\n\
         \x20 S := Concat(A, W);\n\
         \x20 T := Concat(A, A);\n\
         end;\n\
         end.",
    );
    assert_eq!(value_type(&analysis, 0), "string");
    assert_eq!(value_type(&analysis, 1), "AnsiString");
}

#[test]
fn concat_of_open_array_arguments_merges_their_elements() {
    let analysis = analyze_clean(
        "unit U;\ninterface\nvar\n  V: Variant;\nimplementation\n\
         procedure P;\nbegin\n  V := Concat([1, 2], [2.5]);\nend;\nend.",
    );
    let values = assignment_values(&analysis.module);
    let id = analysis.expr_types[&values[0].span];
    assert!(analysis.arena.is_array_constructor(id));
}

#[test]
fn copy_promotes_a_char_source_to_a_string() {
    let analysis = analyze_clean(
        "unit U;\n\
         interface\n\
         var\n\
         \x20 A: AnsiChar;\n\
         \x20 C: Char;\n\
         \x20 S: AnsiString;\n\
         \x20 W: string;\n\
         implementation\n\
         procedure P;\n\
         begin\n\
         \x20 S := Copy(A, 1, 1);\n\
         \x20 W := Copy(C, 1, 1);\n\
         end;\n\
         end.",
    );
    assert_eq!(value_type(&analysis, 0), "AnsiString");
    assert_eq!(value_type(&analysis, 1), "string");
}

// ============================================================================
// Members and helpers
// ============================================================================

#[test]
fn own_members_shadow_helper_members() {
    let analysis = analyze_clean(
        "unit U;\n\
         interface\n\
         type\n\
         \x20 TFoo = class\n\
         \x20 public\n\
         \x20   function Name: Integer;\n\
         \x20 end;\n\
         \x20 TFooHelper = class helper for TFoo\n\
         \x20   function Name: string;\n\
         \x20   function Extra: string;\n\
         \x20 end;\n\
         var\n\
         \x20 Foo: TFoo;\n\
         \x20 N: Integer;\n\
         \x20 S: string;\n\
         implementation\n\
         procedure P;\n\
         begin\n\
         \x20 N := Foo.Name;\n\
         \x20 S := Foo.Extra;\n\
         end;\n\
         end.",
    );
    // The class's own Name wins over the helper's; Extra only exists on the helper.
    assert_eq!(value_type(&analysis, 0), "Integer");
    assert_eq!(value_type(&analysis, 1), "string");
}

#[test]
fn constructor_calls_yield_the_instance_type() {
    let analysis = analyze_clean(
        "unit U;\n\
         interface\n\
         type\n\
         \x20 TFoo = class\n\
         \x20 public\n\
         \x20   constructor Create;\n\
         \x20 end;\n\
         var\n\
         \x20 Foo: TFoo;\n\
         implementation\n\
         procedure P;\n\
         begin\n\
         \x20 Foo := TFoo.Create;\n\
         end;\n\
         end.",
    );
    assert_eq!(value_type(&analysis, 0), "TFoo");
}

// ============================================================================
// Constants and typing
// ============================================================================

#[test]
fn untyped_string_constants_type_as_string() {
    let analysis = analyze_clean(
        "unit U;\ninterface\nconst\n  Greeting = 'hello';\nvar\n  S: string;\n\
         implementation\nprocedure P;\nbegin\n  S := Greeting;\nend;\nend.",
    );
    assert_eq!(value_type(&analysis, 0), "string");
}

#[test]
fn attribute_classes_are_detected_through_heritage() {
    let mut analysis = analyze_clean(
        "unit U;\n\
         interface\n\
         type\n\
         \x20 TCustomAttribute = class\n\
         \x20 end;\n\
         \x20 DeprecatedAttribute = class(TCustomAttribute)\n\
         \x20 end;\n\
         \x20 TPlain = class\n\
         \x20 end;\n\
         implementation\nend.",
    );
    let attr = analysis.symbols.lookup_local(0, "DeprecatedAttribute").unwrap()[0];
    let plain = analysis.symbols.lookup_local(0, "TPlain").unwrap()[0];
    let attr_ty = analysis.arena.type_of_symbol(&analysis.symbols, attr);
    let plain_ty = analysis.arena.type_of_symbol(&analysis.symbols, plain);
    assert!(analysis.arena.is_attribute_class(attr_ty, &analysis.symbols));
    assert!(!analysis.arena.is_attribute_class(plain_ty, &analysis.symbols));
}

// ============================================================================
// Diagnostics
// ============================================================================

#[test]
fn unresolved_identifiers_surface_with_spans() {
    let source = "unit U;\ninterface\nvar\n  S: string;\nimplementation\n\
                  procedure P;\nbegin\n  S := Mystery;\nend;\nend.";
    let analysis = analyze_unit(source);
    assert_eq!(analysis.diagnostics.len(), 1);
    let diagnostic = &analysis.diagnostics[0];
    assert_eq!(diagnostic.kind, DiagnosticKind::UnresolvedIdentifier);
    assert!(diagnostic.span.end <= source.len());
    assert_eq!(&source[diagnostic.span.start..diagnostic.span.end], "Mystery");
}

#[test]
fn calls_with_no_viable_overload_are_reported() {
    let analysis = analyze_unit(
        "unit U;\n\
         interface\n\
         procedure Take(A: Integer); overload;\n\
         procedure Take(A: Boolean; B: Boolean); overload;\n\
         implementation\n\
         procedure P;\n\
         begin\n\
         \x20 Take('st');\n\
         end;\n\
         end.",
    );
    assert!(analysis
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::NoMatchingOverload));
}

#[test]
fn equally_ranked_overloads_are_reported_as_ambiguous() {
    let analysis = analyze_unit(
        "unit U;\n\
         interface\n\
         procedure Amb(X: Double); overload;\n\
         procedure Amb(X: Single); overload;\n\
         implementation\n\
         procedure P;\n\
         begin\n\
         \x20 Amb(1);\n\
         end;\n\
         end.",
    );
    assert!(analysis
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::AmbiguousOverload));
}

// ============================================================================
// Cyclic declarations
// ============================================================================

#[test]
fn mutually_recursive_pointer_types_analyze_to_completion() {
    let analysis = analyze_clean(
        "unit U;\n\
         interface\n\
         type\n\
         \x20 PA = ^PB;\n\
         \x20 PB = ^PA;\n\
         procedure Take(Value: PA); overload;\n\
         procedure Take(Value: Integer); overload;\n\
         var\n\
         \x20 B: PB;\n\
         implementation\n\
         procedure P;\n\
         begin\n\
         \x20 Take(B);\n\
         end;\n\
         end.",
    );
    // Assignability across the pointer cycle resolves the overload uniquely.
    assert!(analysis.symbols.lookup_local(0, "PA").is_some());
    assert!(analysis.symbols.lookup_local(0, "PB").is_some());
}

#[test]
fn heritage_cycles_through_forward_classes_analyze_to_completion() {
    let source = "unit U;\n\
                  interface\n\
                  type\n\
                  \x20 TA = class;\n\
                  \x20 TB = class(TA)\n\
                  \x20 end;\n\
                  \x20 TA = class(TB)\n\
                  \x20 end;\n\
                  var\n\
                  \x20 A: TA;\n\
                  \x20 N: Integer;\n\
                  implementation\n\
                  procedure P;\n\
                  begin\n\
                  \x20 N := A.Missing;\n\
                  end;\n\
                  end.";
    // Member lookup walks the cyclic heritage without recursing forever.
    let analysis = analyze_unit(source);
    for diagnostic in &analysis.diagnostics {
        assert!(diagnostic.span.end <= source.len());
    }
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn reanalysis_is_deterministic() {
    let source = "unit U;\ninterface\nvar\n  N: Integer;\nimplementation\n\
                  procedure P;\nbegin\n  N := Missing + 1;\nend;\nend.";
    let first = analyze_unit(source);
    let second = analyze_unit(source);
    assert_eq!(first.diagnostics, second.diagnostics);
    assert_eq!(first.symbols.len(), second.symbols.len());
}

// ============================================================================
// Include resolution
// ============================================================================

/// Temp directory unique to this test process; removed by the caller.
fn fixture_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("delfin_it_{}_{tag}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn include_files_contribute_declarations() {
    let dir = fixture_dir("inc");
    fs::write(dir.join("consts.inc"), "const\n  FromInclude = 1;\n").unwrap();

    let analysis = analyze(
        "unit U;\ninterface\n{$I consts.inc}\nimplementation\nend.",
        "test.pas",
        &AnalyzeOptions {
            include_paths: vec![dir.clone()],
            ..Default::default()
        },
    );
    assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
    assert!(analysis.symbols.lookup_local(0, "FromInclude").is_some());

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn circular_includes_terminate_with_a_diagnostic() {
    let dir = fixture_dir("cycle");
    fs::write(dir.join("a.inc"), "{$I b.inc}\n").unwrap();
    fs::write(dir.join("b.inc"), "{$I a.inc}\n").unwrap();

    let analysis = analyze(
        "unit U;\ninterface\n{$I a.inc}\nimplementation\nend.",
        "test.pas",
        &AnalyzeOptions {
            include_paths: vec![dir.clone()],
            ..Default::default()
        },
    );
    assert!(analysis
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::CircularInclude));

    let _ = fs::remove_dir_all(dir);
}
