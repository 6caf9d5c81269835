#[cfg(test)]
mod tests {
    use super::*;

    fn parse_source(source: &str) -> (Module, Vec<Diagnostic>) {
        let output = crate::lexer::lex(source);
        assert!(output.diagnostics.is_empty(), "lexer diagnostics: {:?}", output.diagnostics);
        parse(&output.tokens)
    }

    fn parse_clean(source: &str) -> Module {
        let (module, diagnostics) = parse_source(source);
        assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
        module
    }

    #[test]
    fn parses_empty_unit() {
        let module = parse_clean("unit U; interface implementation end.");
        assert_eq!(module.kind, ModuleKind::Unit);
        assert_eq!(module.name.to_string(), "U");
        assert!(module.interface.decls.is_empty());
        assert!(module.implementation.decls.is_empty());
    }

    #[test]
    fn parses_dotted_unit_name_and_uses() {
        let module = parse_clean(
            "unit My.Deep.Unit2;
             interface
             uses System.SysUtils, Classes;
             implementation
             end.",
        );
        assert_eq!(module.name.parts, vec!["My", "Deep", "Unit2"]);
        assert_eq!(module.interface.uses.len(), 2);
        assert_eq!(module.interface.uses[0].node.to_string(), "System.SysUtils");
    }

    #[test]
    fn parses_class_with_implicit_and_explicit_sections() {
        let module = parse_clean(
            "unit U;
             interface
             type
               TFoo = class(TObject)
                 FValue: Integer;
               public
                 procedure Bar;
               end;
             implementation
             end.",
        );
        let Decl::Type(decl) = &module.interface.decls[0].node else {
            panic!("expected type declaration");
        };
        assert_eq!(decl.name.node, "TFoo");
        let TypeDesc::Struct(desc) = &decl.body else {
            panic!("expected struct body");
        };
        assert_eq!(desc.kind, StructKind::Class);
        assert_eq!(desc.heritage.len(), 1);
        assert_eq!(desc.sections.len(), 2);
        assert!(desc.sections[0].node.is_implicit);
        assert_eq!(desc.sections[0].node.visibility, Visibility::Published);
        assert_eq!(desc.sections[1].node.visibility, Visibility::Public);
        assert!(!desc.sections[1].node.is_implicit);
    }

    #[test]
    fn flattens_multi_declaration_blocks() {
        let module = parse_clean(
            "unit U;
             interface
             const
               A = 1;
               B = 'x';
             var
               C, D: Integer;
               E: Boolean;
             implementation
             end.",
        );
        assert_eq!(module.interface.decls.len(), 4);
        assert!(matches!(module.interface.decls[0].node, Decl::Const(_)));
        assert!(matches!(module.interface.decls[1].node, Decl::Const(_)));
        let Decl::Var(var) = &module.interface.decls[2].node else {
            panic!("expected var declaration");
        };
        assert_eq!(var.names.len(), 2);
    }

    #[test]
    fn parses_record_helper() {
        let module = parse_clean(
            "unit U;
             interface
             type
               TStringHelper = record helper for String
                 function First: Char;
               end;
             implementation
             end.",
        );
        let Decl::Type(decl) = &module.interface.decls[0].node else {
            panic!("expected type declaration");
        };
        let TypeDesc::Helper(helper) = &decl.body else {
            panic!("expected helper body");
        };
        assert_eq!(helper.kind, HelperKind::Record);
        let TypeRef::Named { name, .. } = &helper.extended.node else {
            panic!("expected named extended type");
        };
        assert_eq!(name.to_string(), "String");
    }

    #[test]
    fn parses_forward_class_and_class_reference() {
        let module = parse_clean(
            "unit U;
             interface
             type
               TFoo = class;
               TFooClass = class of TFoo;
             implementation
             end.",
        );
        let Decl::Type(forward) = &module.interface.decls[0].node else {
            panic!("expected type declaration");
        };
        assert_eq!(forward.body, TypeDesc::ForwardClass);
        let Decl::Type(class_ref) = &module.interface.decls[1].node else {
            panic!("expected type declaration");
        };
        assert!(matches!(class_ref.body, TypeDesc::ClassRef(_)));
    }

    #[test]
    fn parses_routine_directives() {
        let module = parse_clean(
            "unit U;
             interface
             procedure DoIt(A: Integer); overload; stdcall;
             implementation
             procedure DoIt(A: Integer);
             begin
             end;
             end.",
        );
        let Decl::Routine(routine) = &module.interface.decls[0].node else {
            panic!("expected routine declaration");
        };
        assert_eq!(
            routine.directives,
            vec![RoutineDirectiveId::Overload, RoutineDirectiveId::Stdcall]
        );
        assert!(routine.body.is_none());
        let Decl::Routine(implementation) = &module.implementation.decls[0].node else {
            panic!("expected routine declaration");
        };
        assert!(implementation.body.is_some());
    }

    #[test]
    fn parses_attributes_on_type_declarations() {
        let module = parse_clean(
            "unit U;
             interface
             type
               [FooBar('x')]
               TMy = class(TCustomAttribute)
               end;
             implementation
             end.",
        );
        let Decl::Type(decl) = &module.interface.decls[0].node else {
            panic!("expected type declaration");
        };
        assert_eq!(decl.attributes.len(), 1);
        assert_eq!(decl.attributes[0].name.node.to_string(), "FooBar");
        assert_eq!(decl.attributes[0].args.len(), 1);
    }

    #[test]
    fn binary_precedence_follows_pascal_levels() {
        let module = parse_clean("program P; begin X := 1 + 2 * 3; end.");
        let Decl::Routine(main) = &module.implementation.decls[0].node else {
            panic!("expected main block routine");
        };
        assert_eq!(main.name.node.to_string(), "<main>");
        let body = &main.body.as_ref().unwrap().body;
        let Stmt::Assign { value, .. } = &body[0].node else {
            panic!("expected assignment");
        };
        let Expr::Binary { op, rhs, .. } = &value.node else {
            panic!("expected binary expression");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(
            rhs.node,
            Expr::Binary {
                op: BinaryOp::Mul,
                ..
            }
        ));
    }

    #[test]
    fn parses_case_with_range_labels() {
        let module = parse_clean(
            "program P;
             begin
               case X of
                 1, 3..5: Y := 1;
               else
                 Y := 2;
               end;
             end.",
        );
        let Decl::Routine(main) = &module.implementation.decls[0].node else {
            panic!("expected main block routine");
        };
        let body = &main.body.as_ref().unwrap().body;
        let Stmt::Case { arms, else_branch, .. } = &body[0].node else {
            panic!("expected case statement");
        };
        assert_eq!(arms.len(), 1);
        assert_eq!(arms[0].labels.len(), 2);
        assert!(matches!(arms[0].labels[1].node, Expr::Range { .. }));
        assert!(else_branch.is_some());
    }

    #[test]
    fn parses_try_finally_and_for_in() {
        let module = parse_clean(
            "program P;
             begin
               try
                 for Item in Items do
                   Process(Item);
               finally
                 Cleanup;
               end;
             end.",
        );
        let Decl::Routine(main) = &module.implementation.decls[0].node else {
            panic!("expected main block routine");
        };
        let body = &main.body.as_ref().unwrap().body;
        let Stmt::Try { body: try_body, handler } = &body[0].node else {
            panic!("expected try statement");
        };
        assert!(matches!(try_body[0].node, Stmt::ForIn { .. }));
        assert!(matches!(handler, TryHandler::Finally(_)));
    }

    #[test]
    fn recovers_from_malformed_member_and_keeps_parsing() {
        let (module, diagnostics) = parse_source(
            "unit U;
             interface
             type
               TFoo = record X Integer; end;
               TBar = class end;
             implementation
             end.",
        );
        assert!(!diagnostics.is_empty());
        assert_eq!(module.interface.decls.len(), 2);
        let Decl::Type(bar) = &module.interface.decls[1].node else {
            panic!("expected type declaration");
        };
        assert_eq!(bar.name.node, "TBar");
    }

    #[test]
    fn missing_header_degrades_to_anonymous_program() {
        let (module, diagnostics) = parse_source("begin Foo; end.");
        assert!(!diagnostics.is_empty());
        assert_eq!(module.kind, ModuleKind::Program);
        assert_eq!(module.name.to_string(), "<anonymous>");
        assert_eq!(module.implementation.decls.len(), 1);
    }

    #[test]
    fn parses_subrange_and_set_types() {
        let module = parse_clean(
            "unit U;
             interface
             type
               TDigit = 0..9;
               TDigits = set of TDigit;
               TColor = (Red, Green, Blue);
             implementation
             end.",
        );
        let bodies: Vec<_> = module
            .interface
            .decls
            .iter()
            .map(|d| match &d.node {
                Decl::Type(t) => &t.body,
                other => panic!("expected type declaration, got {other:?}"),
            })
            .collect();
        assert!(matches!(bodies[0], TypeDesc::Subrange { .. }));
        assert!(matches!(bodies[1], TypeDesc::Set(_)));
        let TypeDesc::Enum(values) = bodies[2] else {
            panic!("expected enum");
        };
        assert_eq!(values.len(), 3);
    }
}
