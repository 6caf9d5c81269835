//! Abstract Syntax Tree definitions for Delphi source units.
//!
//! The tree is built by [`crate::parser`] from the preprocessor's filtered token
//! stream. Nodes own their children exclusively; back-references (e.g. from a name
//! reference to its declaration) are established by the analyzer through span-keyed
//! side tables, never through pointers into the tree.

use std::fmt;

use delfin_core::lang::keywords::RoutineDirectiveId;

/// Source location span (byte offsets into the owning unit's text).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A node with source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// Identifier.
pub type Ident = String;

/// A dotted name: `System.SysUtils`, `TFoo.Bar`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    pub parts: Vec<Ident>,
}

impl QualifiedName {
    pub fn simple(name: impl Into<Ident>) -> Self {
        Self {
            parts: vec![name.into()],
        }
    }

    /// The last segment: the declaration's own name.
    pub fn simple_name(&self) -> &str {
        self.parts.last().map(String::as_str).unwrap_or("")
    }

    pub fn is_qualified(&self) -> bool {
        self.parts.len() > 1
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts.join("."))
    }
}

// ============================================================================
// Module structure
// ============================================================================

/// The root of one parsed compilation unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub kind: ModuleKind,
    pub name: QualifiedName,
    /// Interface section (for `program`/`library` files, all declarations land here).
    pub interface: Section,
    pub implementation: Section,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    Unit,
    Program,
    Library,
}

/// One unit section: its uses clause plus declarations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Section {
    pub uses: Vec<Spanned<QualifiedName>>,
    pub decls: Vec<Spanned<Decl>>,
}

// ============================================================================
// Declarations
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Type(TypeDecl),
    Const(ConstDecl),
    Var(VarDecl),
    Routine(RoutineDecl),
    Property(PropertyDecl),
    Label(Vec<Spanned<Ident>>),
}

/// An attribute attached to a declaration: `[StoredProc('GetUsers')]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: Spanned<QualifiedName>,
    pub args: Vec<Spanned<Expr>>,
}

/// A generic type parameter, possibly constrained: `<T: class>`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParam {
    pub name: Spanned<Ident>,
    pub constraints: Vec<Spanned<TypeRef>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub attributes: Vec<Attribute>,
    pub name: Spanned<Ident>,
    pub type_params: Vec<TypeParam>,
    pub body: TypeDesc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstDecl {
    pub attributes: Vec<Attribute>,
    pub name: Spanned<Ident>,
    pub ty: Option<Spanned<TypeRef>>,
    pub value: Spanned<Expr>,
}

/// `var a, b: Integer;` — one declaration, several names.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub attributes: Vec<Attribute>,
    pub names: Vec<Spanned<Ident>>,
    pub ty: Spanned<TypeRef>,
    pub initializer: Option<Spanned<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDecl {
    pub name: Spanned<Ident>,
    pub ty: Option<Spanned<TypeRef>>,
    pub reader: Option<Spanned<Ident>>,
    pub writer: Option<Spanned<Ident>>,
}

// ============================================================================
// Routines
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutineKind {
    Procedure,
    Function,
    Constructor,
    Destructor,
    Operator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamModifier {
    None,
    Var,
    Const,
    Out,
}

/// One formal-parameter group: `const a, b: Integer = 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub modifier: ParamModifier,
    pub names: Vec<Spanned<Ident>>,
    /// Untyped `var`/`const` parameters have no type.
    pub ty: Option<Spanned<TypeRef>>,
    pub default: Option<Spanned<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoutineDecl {
    pub attributes: Vec<Attribute>,
    pub kind: RoutineKind,
    /// Qualified for implementation-section method bodies (`TFoo.Bar`).
    pub name: Spanned<QualifiedName>,
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    pub return_type: Option<Spanned<TypeRef>>,
    pub directives: Vec<RoutineDirectiveId>,
    /// `class procedure` / `class function` / `class operator`.
    pub is_class_method: bool,
    /// Present for implementation-section routines; absent for interface
    /// declarations, `forward` declarations, and struct member headings.
    pub body: Option<Block>,
}

impl RoutineDecl {
    pub fn has_directive(&self, id: RoutineDirectiveId) -> bool {
        self.directives.contains(&id)
    }
}

/// A routine body: local declarations plus the compound statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub decls: Vec<Spanned<Decl>>,
    pub body: Vec<Spanned<Stmt>>,
}

// ============================================================================
// Type descriptors
// ============================================================================

/// A reference to a type in type position.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    /// `TFoo`, `System.Classes.TStrings`, `TList<Integer>`.
    Named {
        name: QualifiedName,
        type_args: Vec<Spanned<TypeRef>>,
    },
    /// An anonymous type in type position: `var a: array of Integer;`.
    Inline(Box<TypeDesc>),
}

impl TypeRef {
    pub fn named(name: impl Into<Ident>) -> Self {
        TypeRef::Named {
            name: QualifiedName::simple(name),
            type_args: Vec::new(),
        }
    }
}

/// The right-hand side of a type declaration (or an anonymous inline type).
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDesc {
    Struct(StructDesc),
    Helper(HelperDesc),
    Enum(Vec<Spanned<Ident>>),
    Set(Spanned<TypeRef>),
    Array(ArrayDesc),
    Pointer(Spanned<TypeRef>),
    /// `class of TFoo` — a metaclass type.
    ClassRef(Spanned<TypeRef>),
    Procedural(ProceduralDesc),
    /// `type TAlias = TFoo` / `type TNew = type TFoo` (distinct).
    Alias {
        target: Spanned<TypeRef>,
        is_distinct: bool,
    },
    Subrange {
        low: Spanned<Expr>,
        high: Spanned<Expr>,
    },
    /// `type TFoo = class;` — forward class declaration.
    ForwardClass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructKind {
    Class,
    Record,
    Interface,
    Object,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDesc {
    pub kind: StructKind,
    pub is_packed: bool,
    /// Base class plus implemented interfaces, in source order.
    pub heritage: Vec<Spanned<TypeRef>>,
    pub sections: Vec<Spanned<VisibilitySection>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelperKind {
    Class,
    Record,
}

/// `TFooHelper = class helper for TFoo`. The helper injects its members into
/// lookup for the extended type without altering that type's declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct HelperDesc {
    pub kind: HelperKind,
    pub extended: Spanned<TypeRef>,
    pub sections: Vec<Spanned<VisibilitySection>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Published,
    Public,
    Protected,
    Private,
    StrictProtected,
    StrictPrivate,
}

/// One visibility section of a structured type.
///
/// Members before any visibility keyword sit in an implicit section
/// (`is_implicit = true`); downstream checks must not flag those as "empty" even
/// when no members follow.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilitySection {
    pub visibility: Visibility,
    pub is_implicit: bool,
    pub members: Vec<Spanned<Decl>>,
}

impl VisibilitySection {
    /// True for an explicit visibility keyword with nothing declared under it.
    pub fn is_empty_explicit(&self) -> bool {
        !self.is_implicit && self.members.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayKind {
    /// `array[0..9] of T` — bounds known at compile time.
    Fixed,
    /// `array of T` in a type declaration.
    Dynamic,
    /// `array of T` as a parameter type.
    Open,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayDesc {
    pub kind: ArrayKind,
    /// Index type or subrange for fixed arrays.
    pub index: Option<Box<Spanned<TypeRef>>>,
    pub element: Box<Spanned<TypeRef>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProceduralDesc {
    pub kind: RoutineKind,
    pub params: Vec<Param>,
    pub return_type: Option<Box<Spanned<TypeRef>>>,
    /// `procedure of object` — a method pointer.
    pub of_object: bool,
    /// `reference to procedure` — an anonymous-method reference.
    pub is_reference: bool,
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Compound(Vec<Spanned<Stmt>>),
    Assign {
        target: Spanned<Expr>,
        value: Spanned<Expr>,
    },
    Expr(Spanned<Expr>),
    If {
        cond: Spanned<Expr>,
        then_branch: Box<Spanned<Stmt>>,
        else_branch: Option<Box<Spanned<Stmt>>>,
    },
    While {
        cond: Spanned<Expr>,
        body: Box<Spanned<Stmt>>,
    },
    Repeat {
        body: Vec<Spanned<Stmt>>,
        until: Spanned<Expr>,
    },
    For {
        var: Spanned<Ident>,
        from: Spanned<Expr>,
        direction: ForDirection,
        to: Spanned<Expr>,
        body: Box<Spanned<Stmt>>,
    },
    ForIn {
        var: Spanned<Ident>,
        iterable: Spanned<Expr>,
        body: Box<Spanned<Stmt>>,
    },
    Case {
        selector: Spanned<Expr>,
        arms: Vec<CaseArm>,
        else_branch: Option<Vec<Spanned<Stmt>>>,
    },
    Try {
        body: Vec<Spanned<Stmt>>,
        handler: TryHandler,
    },
    Raise(Option<Spanned<Expr>>),
    With {
        contexts: Vec<Spanned<Expr>>,
        body: Box<Spanned<Stmt>>,
    },
    Goto(Spanned<Ident>),
    /// `SomeLabel: statement`.
    Labeled {
        label: Spanned<Ident>,
        stmt: Box<Spanned<Stmt>>,
    },
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForDirection {
    To,
    Downto,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseArm {
    /// Labels: constants or subranges (`1, 3..5:`).
    pub labels: Vec<Spanned<Expr>>,
    pub body: Spanned<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TryHandler {
    Except {
        /// `on E: EFoo do ...` handlers; empty when the except block is bare statements.
        handlers: Vec<ExceptHandler>,
        /// Bare statements of the except block (used when `handlers` is empty).
        body: Vec<Spanned<Stmt>>,
        else_branch: Option<Vec<Spanned<Stmt>>>,
    },
    Finally(Vec<Spanned<Stmt>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExceptHandler {
    pub var: Option<Spanned<Ident>>,
    pub exception_type: Spanned<TypeRef>,
    pub body: Spanned<Stmt>,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntLit(i64),
    RealLit(f64),
    /// String or character literal; single characters are distinguished during typing.
    StrLit(String),
    Nil,
    /// An identifier reference; binding is recorded in the analyzer's side table.
    Name(Ident),
    Binary {
        op: BinaryOp,
        lhs: Box<Spanned<Expr>>,
        rhs: Box<Spanned<Expr>>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Spanned<Expr>>,
    },
    Call {
        callee: Box<Spanned<Expr>>,
        args: Vec<Spanned<Expr>>,
    },
    Index {
        base: Box<Spanned<Expr>>,
        indexes: Vec<Spanned<Expr>>,
    },
    Member {
        base: Box<Spanned<Expr>>,
        name: Spanned<Ident>,
    },
    /// `p^`.
    Deref(Box<Spanned<Expr>>),
    /// `[1, 2, 3]` — a set or array constructor; which one is decided by typing.
    SetConstructor(Vec<Spanned<Expr>>),
    /// `3..5` — a range in a case label or set constructor.
    Range {
        low: Box<Spanned<Expr>>,
        high: Box<Spanned<Expr>>,
    },
    Inherited(Option<Box<Spanned<Expr>>>),
    AnonymousMethod {
        kind: RoutineKind,
        params: Vec<Param>,
        return_type: Option<Spanned<TypeRef>>,
        body: Block,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    /// `/` — real division.
    FDiv,
    /// `div` — integer division.
    IDiv,
    Mod,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    In,
    Is,
    As,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    /// `@x`.
    AddressOf,
}
