/// Type parsing: type references, type-declaration bodies, and generics.

impl<'a> Parser<'a> {
    /// Optional `<T, U: class>` after a type or routine name.
    fn type_params(&mut self) -> Vec<TypeParam> {
        let mut params = Vec::new();
        if !self.match_token(&TokenKind::Lt) {
            return params;
        }
        loop {
            let name = self.expect_ident("in type parameter list");
            let mut constraints = Vec::new();
            if self.match_token(&TokenKind::Colon) {
                loop {
                    let start = self.current_span();
                    // `class`, `record`, and `constructor` appear as keyword constraints.
                    let constraint = if self.match_keyword(KeywordId::Class) {
                        TypeRef::named("class")
                    } else if self.match_keyword(KeywordId::Record) {
                        TypeRef::named("record")
                    } else if self.match_keyword(KeywordId::Constructor) {
                        TypeRef::named("constructor")
                    } else {
                        self.type_ref().node
                    };
                    constraints.push(Spanned::new(constraint, start.merge(self.previous_span())));
                    if !self.match_token(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            params.push(TypeParam { name, constraints });
            if !self.match_token(&TokenKind::Semicolon) && !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect_token(&TokenKind::Gt, "'>' after type parameters");
        params
    }

    /// A type in reference position: a (possibly generic) name, or an anonymous
    /// inline construct such as `set of TFoo` or `array of Integer`.
    fn type_ref(&mut self) -> Spanned<TypeRef> {
        let start = self.current_span();
        if self.starts_type_desc() {
            let desc = self.type_desc(false);
            return Spanned::new(
                TypeRef::Inline(Box::new(desc)),
                start.merge(self.previous_span()),
            );
        }
        // `string[20]` is a short string, a distinct kind from `string`.
        if self.check_keyword(KeywordId::StringKw) {
            self.pos += 1;
            if self.match_token(&TokenKind::LBracket) {
                self.expression();
                self.expect_token(&TokenKind::RBracket, "']' after string length");
                return Spanned::new(
                    TypeRef::named("ShortString"),
                    start.merge(self.previous_span()),
                );
            }
            return Spanned::new(TypeRef::named("String"), start);
        }
        if self.check_keyword(KeywordId::File) {
            self.pos += 1;
            if self.match_keyword(KeywordId::Of) {
                self.type_ref();
            }
            return Spanned::new(TypeRef::named("File"), start.merge(self.previous_span()));
        }
        let name = self.qualified_name();
        let type_args = self.type_args();
        Spanned::new(
            TypeRef::Named { name, type_args },
            start.merge(self.previous_span()),
        )
    }

    /// Explicit generic arguments: `<Integer, TList<Byte>>`. Only attempted when
    /// a '<' immediately follows a type name in type position, so there is no
    /// ambiguity with comparison expressions.
    fn type_args(&mut self) -> Vec<Spanned<TypeRef>> {
        let mut args = Vec::new();
        if !self.match_token(&TokenKind::Lt) {
            return args;
        }
        loop {
            args.push(self.type_ref());
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect_token(&TokenKind::Gt, "'>' after type arguments");
        args
    }

    /// A parameter's type: `array of T` here is an open array, not a dynamic one.
    fn param_type_ref(&mut self) -> Spanned<TypeRef> {
        let start = self.current_span();
        if self.check_keyword(KeywordId::Array) {
            self.pos += 1;
            self.expect_keyword(KeywordId::Of, "in open array parameter");
            // `array of const` — variant open array.
            let element = if self.match_keyword(KeywordId::Const) {
                Spanned::new(TypeRef::named("TVarRec"), self.previous_span())
            } else {
                self.type_ref()
            };
            let desc = TypeDesc::Array(ArrayDesc {
                kind: ArrayKind::Open,
                index: None,
                element: Box::new(element),
            });
            return Spanned::new(
                TypeRef::Inline(Box::new(desc)),
                start.merge(self.previous_span()),
            );
        }
        self.type_ref()
    }

    /// True when the current token begins an anonymous type construct rather
    /// than a type name.
    fn starts_type_desc(&self) -> bool {
        matches!(
            self.peek().map(|t| &t.kind),
            Some(TokenKind::Keyword(
                KeywordId::Array
                    | KeywordId::Set
                    | KeywordId::Packed
                    | KeywordId::Record
                    | KeywordId::Procedure
                    | KeywordId::Function
                    | KeywordId::Reference
            )) | Some(TokenKind::Caret)
        )
    }

    /// The right-hand side of a type declaration. `top_level` is true directly
    /// after `Name =`, where forward declarations and enum parentheses are legal.
    fn type_desc(&mut self, top_level: bool) -> TypeDesc {
        if self.match_keyword(KeywordId::Packed) {
            return match self.type_desc(top_level) {
                TypeDesc::Struct(mut desc) => {
                    desc.is_packed = true;
                    TypeDesc::Struct(desc)
                }
                other => other,
            };
        }

        if self.check_keyword(KeywordId::Class) {
            return self.class_desc();
        }
        if self.check_keyword(KeywordId::Interface) {
            return self.interface_desc();
        }
        if self.check_keyword(KeywordId::Record) {
            self.pos += 1;
            if self.match_keyword(KeywordId::Helper) {
                return self.helper_desc(HelperKind::Record);
            }
            return TypeDesc::Struct(self.struct_desc(StructKind::Record));
        }
        if self.match_keyword(KeywordId::Object) {
            return TypeDesc::Struct(self.struct_desc(StructKind::Object));
        }
        if self.match_keyword(KeywordId::Set) {
            self.expect_keyword(KeywordId::Of, "after 'set'");
            return TypeDesc::Set(self.type_ref());
        }
        if self.check_keyword(KeywordId::Array) {
            return self.array_desc();
        }
        if self.match_token(&TokenKind::Caret) {
            return TypeDesc::Pointer(self.type_ref());
        }
        if self.match_keyword(KeywordId::Reference) {
            self.expect_keyword(KeywordId::To, "after 'reference'");
            return self.procedural_desc(true);
        }
        if self.check_keyword(KeywordId::Procedure) || self.check_keyword(KeywordId::Function) {
            return self.procedural_desc(false);
        }
        // `type TFoo` — a distinct alias.
        if self.match_keyword(KeywordId::Type) {
            return TypeDesc::Alias {
                target: self.type_ref(),
                is_distinct: true,
            };
        }
        if top_level && self.check(&TokenKind::LParen) {
            return self.enum_desc();
        }
        self.alias_or_subrange()
    }

    /// `class`, `class;`, `class of T`, `class helper for T`, or a full class body.
    fn class_desc(&mut self) -> TypeDesc {
        self.pos += 1; // 'class'
        if self.check(&TokenKind::Semicolon) {
            return TypeDesc::ForwardClass;
        }
        if self.match_keyword(KeywordId::Of) {
            return TypeDesc::ClassRef(self.type_ref());
        }
        if self.match_keyword(KeywordId::Helper) {
            return self.helper_desc(HelperKind::Class);
        }
        // `class abstract` / `class sealed`
        while let Some(word) = self.peek().and_then(|t| t.ident()) {
            if word.eq_ignore_ascii_case("abstract") || word.eq_ignore_ascii_case("sealed") {
                self.pos += 1;
            } else {
                break;
            }
        }
        TypeDesc::Struct(self.struct_desc(StructKind::Class))
    }

    fn interface_desc(&mut self) -> TypeDesc {
        self.pos += 1; // 'interface'
        if self.check(&TokenKind::Semicolon) {
            return TypeDesc::ForwardClass;
        }
        let heritage = self.heritage();
        // Optional GUID clause: `['{...}']`.
        if self.check(&TokenKind::LBracket)
            && self.peek_next().is_some_and(|t| matches!(t.kind, TokenKind::StrLit(_)))
        {
            self.pos += 2;
            self.expect_token(&TokenKind::RBracket, "']' after interface GUID");
        }
        let sections = self.visibility_sections(Visibility::Public);
        self.expect_keyword(KeywordId::End, "after interface body");
        TypeDesc::Struct(StructDesc {
            kind: StructKind::Interface,
            is_packed: false,
            heritage,
            sections,
        })
    }

    /// Body of a class/record/object after its introducing keyword(s).
    fn struct_desc(&mut self, kind: StructKind) -> StructDesc {
        let heritage = if kind == StructKind::Class || kind == StructKind::Object {
            self.heritage()
        } else {
            Vec::new()
        };
        // `TFoo = class(TBar);` — a body-less derivation.
        if self.check(&TokenKind::Semicolon) {
            return StructDesc {
                kind,
                is_packed: false,
                heritage,
                sections: Vec::new(),
            };
        }
        let default_visibility = if kind == StructKind::Class {
            Visibility::Published
        } else {
            Visibility::Public
        };
        let sections = self.visibility_sections(default_visibility);
        self.expect_keyword(KeywordId::End, "after type body");
        StructDesc {
            kind,
            is_packed: false,
            heritage,
            sections,
        }
    }

    /// `helper for TFoo` plus the member body. The `helper` keyword itself has
    /// already been consumed.
    fn helper_desc(&mut self, kind: HelperKind) -> TypeDesc {
        self.expect_keyword(KeywordId::For, "after 'helper'");
        let extended = self.type_ref();
        let sections = self.visibility_sections(Visibility::Public);
        self.expect_keyword(KeywordId::End, "after helper body");
        TypeDesc::Helper(HelperDesc {
            kind,
            extended,
            sections,
        })
    }

    /// `(TBase, IIntf, ...)` after `class`/`object`/`interface`.
    fn heritage(&mut self) -> Vec<Spanned<TypeRef>> {
        let mut heritage = Vec::new();
        if self.match_token(&TokenKind::LParen) {
            loop {
                heritage.push(self.type_ref());
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect_token(&TokenKind::RParen, "')' after heritage list");
        }
        heritage
    }

    fn enum_desc(&mut self) -> TypeDesc {
        self.expect_token(&TokenKind::LParen, "'(' before enum values");
        let mut values = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                values.push(self.expect_ident("in enum declaration"));
                // Explicit ordinal values are legal but do not affect naming.
                if self.match_token(&TokenKind::Eq) {
                    self.expression();
                }
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect_token(&TokenKind::RParen, "')' after enum values");
        TypeDesc::Enum(values)
    }

    fn array_desc(&mut self) -> TypeDesc {
        self.pos += 1; // 'array'
        let mut index = None;
        let kind = if self.match_token(&TokenKind::LBracket) {
            // The index is itself a type: `array[0..9]`, `array[Byte]`,
            // `array[TColor]`. Multi-dimensional indexes are flattened to the
            // first dimension; the element type captures the nesting.
            let first = self.index_type();
            while self.match_token(&TokenKind::Comma) {
                self.index_type();
            }
            self.expect_token(&TokenKind::RBracket, "']' after array index");
            index = Some(Box::new(first));
            ArrayKind::Fixed
        } else {
            ArrayKind::Dynamic
        };
        self.expect_keyword(KeywordId::Of, "after 'array'");
        let element = self.type_ref();
        TypeDesc::Array(ArrayDesc {
            kind,
            index,
            element: Box::new(element),
        })
    }

    /// One array index dimension: a subrange or an ordinal type name.
    fn index_type(&mut self) -> Spanned<TypeRef> {
        let start = self.current_span();
        let checkpoint = self.pos;
        if self.check_ident() && self.peek_next().is_some_and(|t| matches!(t.kind, TokenKind::RBracket | TokenKind::Comma)) {
            let name = self.qualified_name();
            return Spanned::new(
                TypeRef::Named {
                    name,
                    type_args: Vec::new(),
                },
                start.merge(self.previous_span()),
            );
        }
        self.pos = checkpoint;
        let low = self.expression();
        if self.expect_token(&TokenKind::DotDot, "'..' in array index") {
            let high = self.expression();
            let desc = TypeDesc::Subrange { low, high };
            Spanned::new(
                TypeRef::Inline(Box::new(desc)),
                start.merge(self.previous_span()),
            )
        } else {
            Spanned::new(TypeRef::named("<error>"), start)
        }
    }

    /// `procedure(...)`, `function(...): T`, optionally `of object`.
    fn procedural_desc(&mut self, is_reference: bool) -> TypeDesc {
        let kind = if self.match_keyword(KeywordId::Function) {
            RoutineKind::Function
        } else {
            self.expect_keyword(KeywordId::Procedure, "in procedural type");
            RoutineKind::Procedure
        };
        let params = self.formal_params();
        let return_type = if self.match_token(&TokenKind::Colon) {
            Some(Box::new(self.type_ref()))
        } else {
            None
        };
        let of_object = if self.match_keyword(KeywordId::Of) {
            self.expect_keyword(KeywordId::Object, "after 'of'");
            true
        } else {
            false
        };
        TypeDesc::Procedural(ProceduralDesc {
            kind,
            params,
            return_type,
            of_object,
            is_reference,
        })
    }

    /// Distinguish `TFoo = TBar;` (alias) from `TFoo = 1..10;` (subrange).
    /// An alias is a bare type reference followed by ';'; anything else is
    /// treated as a subrange expression.
    fn alias_or_subrange(&mut self) -> TypeDesc {
        let checkpoint = self.pos;
        let diag_checkpoint = self.diagnostics.len();
        if self.check_ident() || self.check_keyword(KeywordId::StringKw) || self.check_keyword(KeywordId::File) {
            let target = self.type_ref();
            if self.check(&TokenKind::Semicolon) || self.is_at_end() {
                return TypeDesc::Alias {
                    target,
                    is_distinct: false,
                };
            }
            self.pos = checkpoint;
            self.diagnostics.truncate(diag_checkpoint);
        }
        let low = self.expression();
        self.expect_token(&TokenKind::DotDot, "'..' in subrange type");
        let high = self.expression();
        TypeDesc::Subrange { low, high }
    }
}
