//! AST node definitions for the NTL compiler.
//!
//! One struct per node kind, grouped into `Statement` and `Expression` sum
//! types. Child nodes are arena-allocated references; lists are arena slices.

use crate::token::TemplatePart;
use ntl_core::Span;

/// A list of nodes, allocated in the arena.
pub type NodeList<'a, T> = &'a [T];

// ============================================================================
// Source file
// ============================================================================

#[derive(Debug)]
pub struct SourceFile<'a> {
    pub file_name: String,
    pub statements: NodeList<'a, Statement<'a>>,
}

// ============================================================================
// Shared pieces
// ============================================================================

/// An identifier occurrence with its source position.
#[derive(Debug, Clone)]
pub struct Identifier {
    pub span: Span,
    pub name: String,
}

/// A type annotation, retained as its printed source text. The inferer
/// normalizes the text into a structured type; nothing else interprets it.
#[derive(Debug, Clone)]
pub struct TypeExpr {
    pub span: Span,
    pub text: String,
}

/// The target of a declaration: a plain name or a destructuring pattern.
#[derive(Debug)]
pub enum BindingTarget<'a> {
    Name(Identifier),
    Pattern(&'a BindingPattern<'a>),
}

/// A destructuring pattern, on variable declarations and parameters.
#[derive(Debug)]
pub enum BindingPattern<'a> {
    Object(ObjectPattern<'a>),
    Array(ArrayPattern<'a>),
}

#[derive(Debug)]
pub struct ObjectPattern<'a> {
    pub span: Span,
    pub props: Vec<ObjectPatternProp<'a>>,
    /// `...rest` capture, at most one, last.
    pub rest: Option<Identifier>,
}

#[derive(Debug)]
pub struct ObjectPatternProp<'a> {
    pub key: Identifier,
    pub alias: Option<Identifier>,
    pub nested: Option<&'a BindingPattern<'a>>,
    pub default: Option<&'a Expression<'a>>,
}

#[derive(Debug)]
pub struct ArrayPattern<'a> {
    pub span: Span,
    /// `None` entries are explicit holes (`[a, , b]`).
    pub items: Vec<Option<ArrayPatternItem<'a>>>,
}

#[derive(Debug)]
pub struct ArrayPatternItem<'a> {
    pub target: BindingTarget<'a>,
    pub default: Option<&'a Expression<'a>>,
    pub rest: bool,
}

/// A function parameter.
#[derive(Debug)]
pub struct Param<'a> {
    pub span: Span,
    pub target: BindingTarget<'a>,
    pub ty: Option<TypeExpr>,
    pub default: Option<&'a Expression<'a>>,
    pub rest: bool,
}

/// A `@name(args)` decorator prefix.
#[derive(Debug)]
pub struct Decorator<'a> {
    pub span: Span,
    /// Dotted decorator path, e.g. `log.timed`.
    pub name: String,
    pub args: Option<NodeList<'a, Expression<'a>>>,
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub enum Statement<'a> {
    // Declarations
    Var(&'a VarDecl<'a>),
    MultiVar(&'a MultiVarDecl<'a>),
    Fn(&'a FnDecl<'a>),
    Class(&'a ClassDecl<'a>),
    Interface(&'a InterfaceDecl),
    Trait(&'a TraitDecl<'a>),
    TypeAlias(&'a TypeAliasDecl<'a>),
    Enum(&'a EnumDecl<'a>),
    Namespace(&'a NamespaceDecl<'a>),
    Macro(&'a MacroDecl<'a>),
    Using(&'a UsingDecl<'a>),
    Declare(&'a DeclareStmt<'a>),
    NtlRequire(&'a NtlRequire),
    // Statements
    Block(&'a Block<'a>),
    If(&'a IfStmt<'a>),
    Unless(&'a UnlessStmt<'a>),
    While(&'a WhileStmt<'a>),
    DoWhile(&'a DoWhileStmt<'a>),
    ForOf(&'a ForOfStmt<'a>),
    ForIn(&'a ForInStmt<'a>),
    Loop(&'a LoopStmt<'a>),
    Return(&'a ReturnStmt<'a>),
    Throw(&'a ThrowStmt<'a>),
    Try(&'a TryStmt<'a>),
    Match(&'a MatchStmt<'a>),
    Break(&'a BreakStmt),
    Continue(&'a ContinueStmt),
    Expr(&'a ExprStmt<'a>),
    IfSet(&'a IfSetStmt<'a>),
    Spawn(&'a SpawnStmt<'a>),
    Select(&'a SelectStmt<'a>),
    Import(&'a ImportDecl),
    Export(&'a ExportDecl<'a>),
}

impl<'a> Statement<'a> {
    /// The source position of the statement's leading token.
    pub fn span(&self) -> Span {
        match self {
            Statement::Var(n) => n.span,
            Statement::MultiVar(n) => n.span,
            Statement::Fn(n) => n.span,
            Statement::Class(n) => n.span,
            Statement::Interface(n) => n.span,
            Statement::Trait(n) => n.span,
            Statement::TypeAlias(n) => n.span,
            Statement::Enum(n) => n.span,
            Statement::Namespace(n) => n.span,
            Statement::Macro(n) => n.span,
            Statement::Using(n) => n.span,
            Statement::Declare(n) => n.span,
            Statement::NtlRequire(n) => n.span,
            Statement::Block(n) => n.span,
            Statement::If(n) => n.span,
            Statement::Unless(n) => n.span,
            Statement::While(n) => n.span,
            Statement::DoWhile(n) => n.span,
            Statement::ForOf(n) => n.span,
            Statement::ForIn(n) => n.span,
            Statement::Loop(n) => n.span,
            Statement::Return(n) => n.span,
            Statement::Throw(n) => n.span,
            Statement::Try(n) => n.span,
            Statement::Match(n) => n.span,
            Statement::Break(n) => n.span,
            Statement::Continue(n) => n.span,
            Statement::Expr(n) => n.span,
            Statement::IfSet(n) => n.span,
            Statement::Spawn(n) => n.span,
            Statement::Select(n) => n.span,
            Statement::Import(n) => n.span,
            Statement::Export(n) => n.span,
        }
    }
}

/// `val x = ...` / `var x = ...` / `immutable val x = ...`
#[derive(Debug)]
pub struct VarDecl<'a> {
    pub span: Span,
    pub target: BindingTarget<'a>,
    pub ty: Option<TypeExpr>,
    pub init: Option<&'a Expression<'a>>,
    /// `val`/`const` (true) vs `var`/`let` (false).
    pub constant: bool,
    /// `immutable val` deep-freezes the initializer at construction.
    pub immutable: bool,
}

/// `val a = 1, b = 2`
#[derive(Debug)]
pub struct MultiVarDecl<'a> {
    pub span: Span,
    pub decls: NodeList<'a, VarDecl<'a>>,
}

#[derive(Debug)]
pub struct FnDecl<'a> {
    pub span: Span,
    pub name: Identifier,
    /// Raw generic parameter text (`<T, U>`), erased at emission.
    pub generics: Option<String>,
    pub params: NodeList<'a, Param<'a>>,
    pub return_ty: Option<TypeExpr>,
    pub body: &'a Block<'a>,
    pub is_async: bool,
    pub is_generator: bool,
    pub decorators: NodeList<'a, Decorator<'a>>,
}

#[derive(Debug)]
pub struct ClassDecl<'a> {
    pub span: Span,
    pub name: Identifier,
    pub generics: Option<String>,
    /// Dotted superclass path from the `extends` clause.
    pub superclass: Option<String>,
    pub implements: Vec<String>,
    pub members: NodeList<'a, ClassMember<'a>>,
    pub decorators: NodeList<'a, Decorator<'a>>,
    pub is_abstract: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Method,
    Getter,
    Setter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
    Protected,
}

/// A class (or trait) member; fields carry `ty`/`init`, the rest carry
/// `params`/`body`.
#[derive(Debug)]
pub struct ClassMember<'a> {
    pub span: Span,
    pub name: Identifier,
    pub kind: MemberKind,
    pub params: NodeList<'a, Param<'a>>,
    pub return_ty: Option<TypeExpr>,
    pub ty: Option<TypeExpr>,
    pub init: Option<&'a Expression<'a>>,
    /// Absent for abstract methods and trait requirements.
    pub body: Option<&'a Block<'a>>,
    pub is_static: bool,
    pub is_async: bool,
    pub is_readonly: bool,
    pub visibility: Visibility,
}

/// Interfaces are erased at emission; members are kept as name/type text.
#[derive(Debug)]
pub struct InterfaceDecl {
    pub span: Span,
    pub name: Identifier,
    pub extends: Vec<String>,
    pub members: Vec<(Identifier, String)>,
}

#[derive(Debug)]
pub struct TraitDecl<'a> {
    pub span: Span,
    pub name: Identifier,
    pub members: NodeList<'a, ClassMember<'a>>,
}

/// `type X = ...`; the algebraic form `type R = Ok(v) | Err(e)` is detected
/// at parse time and lowered to tagged variant constructors.
#[derive(Debug)]
pub enum TypeAliasTarget<'a> {
    Plain(TypeExpr),
    Algebraic(NodeList<'a, VariantDef>),
}

#[derive(Debug)]
pub struct VariantDef {
    pub span: Span,
    pub name: Identifier,
    /// Field texts inside the parentheses; only the arity matters at runtime.
    pub fields: Vec<String>,
}

#[derive(Debug)]
pub struct TypeAliasDecl<'a> {
    pub span: Span,
    pub name: Identifier,
    pub generics: Option<String>,
    pub target: TypeAliasTarget<'a>,
}

#[derive(Debug)]
pub struct EnumDecl<'a> {
    pub span: Span,
    pub name: Identifier,
    pub members: NodeList<'a, EnumMember<'a>>,
}

#[derive(Debug)]
pub struct EnumMember<'a> {
    pub span: Span,
    pub name: Identifier,
    pub value: Option<&'a Expression<'a>>,
}

#[derive(Debug)]
pub struct NamespaceDecl<'a> {
    pub span: Span,
    pub name: Identifier,
    pub body: &'a Block<'a>,
}

#[derive(Debug)]
pub struct MacroDecl<'a> {
    pub span: Span,
    pub name: Identifier,
    pub params: NodeList<'a, Param<'a>>,
    pub body: &'a Block<'a>,
}

/// `using name = expr`
#[derive(Debug)]
pub struct UsingDecl<'a> {
    pub span: Span,
    pub name: Identifier,
    pub init: &'a Expression<'a>,
}

/// `declare <declaration>`: ambient, erased at emission.
#[derive(Debug)]
pub struct DeclareStmt<'a> {
    pub span: Span,
    pub inner: &'a Statement<'a>,
}

/// `require(ntl, http, fs, ...)`: each name resolves against the closed set
/// of bundled modules and becomes a binding.
#[derive(Debug)]
pub struct NtlRequire {
    pub span: Span,
    pub modules: Vec<Identifier>,
}

#[derive(Debug)]
pub struct Block<'a> {
    pub span: Span,
    pub statements: NodeList<'a, Statement<'a>>,
}

#[derive(Debug)]
pub struct IfStmt<'a> {
    pub span: Span,
    pub cond: &'a Expression<'a>,
    pub then_block: &'a Block<'a>,
    /// `elif`/`else if` chains link through a nested `Statement::If`;
    /// a plain `else` is a `Statement::Block`.
    pub alternate: Option<&'a Statement<'a>>,
}

#[derive(Debug)]
pub struct UnlessStmt<'a> {
    pub span: Span,
    pub cond: &'a Expression<'a>,
    pub body: &'a Block<'a>,
    pub alternate: Option<&'a Block<'a>>,
}

#[derive(Debug)]
pub struct WhileStmt<'a> {
    pub span: Span,
    pub cond: &'a Expression<'a>,
    pub body: &'a Block<'a>,
}

#[derive(Debug)]
pub struct DoWhileStmt<'a> {
    pub span: Span,
    pub body: &'a Block<'a>,
    pub cond: &'a Expression<'a>,
}

#[derive(Debug)]
pub struct ForOfStmt<'a> {
    pub span: Span,
    pub binding: BindingTarget<'a>,
    pub constant: bool,
    pub iterable: &'a Expression<'a>,
    pub body: &'a Block<'a>,
}

#[derive(Debug)]
pub struct ForInStmt<'a> {
    pub span: Span,
    pub binding: BindingTarget<'a>,
    pub constant: bool,
    pub object: &'a Expression<'a>,
    pub body: &'a Block<'a>,
}

#[derive(Debug)]
pub struct LoopStmt<'a> {
    pub span: Span,
    pub body: &'a Block<'a>,
}

#[derive(Debug)]
pub struct ReturnStmt<'a> {
    pub span: Span,
    pub value: Option<&'a Expression<'a>>,
}

#[derive(Debug)]
pub struct ThrowStmt<'a> {
    pub span: Span,
    pub value: &'a Expression<'a>,
}

#[derive(Debug)]
pub struct CatchClause<'a> {
    pub span: Span,
    pub param: Option<Identifier>,
    pub body: &'a Block<'a>,
}

#[derive(Debug)]
pub struct TryStmt<'a> {
    pub span: Span,
    pub block: &'a Block<'a>,
    pub catch: Option<CatchClause<'a>>,
    pub finally: Option<&'a Block<'a>>,
}

#[derive(Debug)]
pub struct MatchStmt<'a> {
    pub span: Span,
    pub subject: &'a Expression<'a>,
    pub cases: NodeList<'a, MatchCase<'a>>,
}

/// One `case pat | pat when guard => body` arm. The catch-all `default`/
/// `else` arm parses as a single wildcard pattern. Expression bodies are
/// normalized to one-statement blocks at parse time.
#[derive(Debug)]
pub struct MatchCase<'a> {
    pub span: Span,
    pub patterns: Vec<MatchPattern<'a>>,
    pub guard: Option<&'a Expression<'a>>,
    pub body: &'a Block<'a>,
}

#[derive(Debug)]
pub enum MatchPattern<'a> {
    /// A literal value compared with `===`.
    Literal(&'a Expression<'a>),
    /// A fresh name bound to the subject.
    Binding(Identifier),
    Wildcard,
    /// A dotted enum path compared with `===`, e.g. `Color.Red`.
    EnumVal(String),
    /// An algebraic variant: tag check plus positional field patterns.
    Variant {
        name: Identifier,
        fields: Vec<MatchPattern<'a>>,
    },
    Array(Vec<MatchPattern<'a>>),
    /// Key/pattern pairs; a bare key binds the field under its own name.
    Object(Vec<(Identifier, Option<MatchPattern<'a>>)>),
}

#[derive(Debug)]
pub struct BreakStmt {
    pub span: Span,
}

#[derive(Debug)]
pub struct ContinueStmt {
    pub span: Span,
}

#[derive(Debug)]
pub struct ExprStmt<'a> {
    pub span: Span,
    pub expr: &'a Expression<'a>,
}

/// `ifset expr as alias { ... } else { ... }`. Without `as` the body sees
/// the original expression; no rebinding happens.
#[derive(Debug)]
pub struct IfSetStmt<'a> {
    pub span: Span,
    pub subject: &'a Expression<'a>,
    pub alias: Option<Identifier>,
    pub body: &'a Block<'a>,
    pub alternate: Option<&'a Block<'a>>,
}

#[derive(Debug)]
pub struct SpawnStmt<'a> {
    pub span: Span,
    pub expr: &'a Expression<'a>,
}

#[derive(Debug)]
pub struct SelectStmt<'a> {
    pub span: Span,
    pub arms: NodeList<'a, SelectArm<'a>>,
}

/// `case v = ch.receive() => body`
#[derive(Debug)]
pub struct SelectArm<'a> {
    pub span: Span,
    pub binding: Identifier,
    pub receive: &'a Expression<'a>,
    pub body: &'a Block<'a>,
}

#[derive(Debug)]
pub struct ImportSpecifier {
    pub name: Identifier,
    pub alias: Option<Identifier>,
}

#[derive(Debug)]
pub struct ImportDecl {
    pub span: Span,
    pub default: Option<Identifier>,
    /// `* as ns`
    pub namespace: Option<Identifier>,
    pub named: Vec<ImportSpecifier>,
    pub source: String,
}

#[derive(Debug)]
pub struct ExportDecl<'a> {
    pub span: Span,
    /// `export <declaration>`
    pub decl: Option<&'a Statement<'a>>,
    /// `export { a, b as c }`
    pub names: Vec<(Identifier, Option<Identifier>)>,
    /// `export default <expr>`
    pub default: Option<&'a Expression<'a>>,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub enum Expression<'a> {
    Number(&'a NumberLit),
    String(&'a StringLit),
    Template(&'a TemplateLit<'a>),
    Bool(&'a BoolLit),
    Null(Span),
    Undefined(Span),
    This(Span),
    Super(Span),
    Ident(&'a Identifier),
    Array(&'a ArrayLit<'a>),
    Object(&'a ObjectLit<'a>),
    Function(&'a FnExpr<'a>),
    Arrow(&'a ArrowFn<'a>),
    Member(&'a MemberExpr<'a>),
    Call(&'a CallExpr<'a>),
    New(&'a NewExpr<'a>),
    Unary(&'a UnaryExpr<'a>),
    Binary(&'a BinaryExpr<'a>),
    Assign(&'a AssignExpr<'a>),
    Ternary(&'a TernaryExpr<'a>),
    Await(&'a AwaitExpr<'a>),
    Yield(&'a YieldExpr<'a>),
    Spread(&'a SpreadExpr<'a>),
    Sequence(&'a SequenceExpr<'a>),
    /// `channel()`
    Channel(Span),
    /// `obj::method`
    Bind(&'a BindExpr<'a>),
    /// `have expr`: runtime non-null/undefined check.
    Have(&'a HaveExpr<'a>),
    /// Plain `require("path")`.
    Require(&'a RequireExpr<'a>),
    /// `@dec expr`
    Decorated(&'a DecoratedExpr<'a>),
    /// `expr as T` / `expr satisfies T`; erased at emission.
    Cast(&'a CastExpr<'a>),
}

impl<'a> Expression<'a> {
    pub fn span(&self) -> Span {
        match self {
            Expression::Number(n) => n.span,
            Expression::String(n) => n.span,
            Expression::Template(n) => n.span,
            Expression::Bool(n) => n.span,
            Expression::Null(s)
            | Expression::Undefined(s)
            | Expression::This(s)
            | Expression::Super(s)
            | Expression::Channel(s) => *s,
            Expression::Ident(n) => n.span,
            Expression::Array(n) => n.span,
            Expression::Object(n) => n.span,
            Expression::Function(n) => n.span,
            Expression::Arrow(n) => n.span,
            Expression::Member(n) => n.span,
            Expression::Call(n) => n.span,
            Expression::New(n) => n.span,
            Expression::Unary(n) => n.span,
            Expression::Binary(n) => n.span,
            Expression::Assign(n) => n.span,
            Expression::Ternary(n) => n.span,
            Expression::Await(n) => n.span,
            Expression::Yield(n) => n.span,
            Expression::Spread(n) => n.span,
            Expression::Sequence(n) => n.span,
            Expression::Bind(n) => n.span,
            Expression::Have(n) => n.span,
            Expression::Require(n) => n.span,
            Expression::Decorated(n) => n.span,
            Expression::Cast(n) => n.span,
        }
    }
}

#[derive(Debug)]
pub struct NumberLit {
    pub span: Span,
    pub value: f64,
    /// `Some(digits)` for bigint literals; emitted as `<digits>n`.
    pub bigint: Option<String>,
}

#[derive(Debug)]
pub struct StringLit {
    pub span: Span,
    pub value: String,
}

/// A parsed template-literal element; the lexer's raw expression spans have
/// already been re-parsed into expressions here.
#[derive(Debug)]
pub enum TemplateElem<'a> {
    Text(String),
    Expr(&'a Expression<'a>),
}

#[derive(Debug)]
pub struct TemplateLit<'a> {
    pub span: Span,
    pub parts: NodeList<'a, TemplateElem<'a>>,
    /// Raw token parts, retained for tooling that needs the original text.
    pub raw: Vec<TemplatePart>,
}

#[derive(Debug)]
pub struct BoolLit {
    pub span: Span,
    pub value: bool,
}

#[derive(Debug)]
pub struct ArrayLit<'a> {
    pub span: Span,
    pub elements: NodeList<'a, Expression<'a>>,
}

#[derive(Debug)]
pub enum PropKey<'a> {
    Name(Identifier),
    String(StringLit),
    Computed(&'a Expression<'a>),
}

#[derive(Debug)]
pub enum ObjectProp<'a> {
    KeyValue {
        key: PropKey<'a>,
        value: &'a Expression<'a>,
    },
    Shorthand(Identifier),
    Spread(&'a Expression<'a>),
    Method {
        key: PropKey<'a>,
        kind: MemberKind,
        params: NodeList<'a, Param<'a>>,
        body: &'a Block<'a>,
        is_async: bool,
    },
}

#[derive(Debug)]
pub struct ObjectLit<'a> {
    pub span: Span,
    pub props: NodeList<'a, ObjectProp<'a>>,
}

#[derive(Debug)]
pub struct FnExpr<'a> {
    pub span: Span,
    pub name: Option<Identifier>,
    pub params: NodeList<'a, Param<'a>>,
    pub return_ty: Option<TypeExpr>,
    pub body: &'a Block<'a>,
    pub is_async: bool,
    pub is_generator: bool,
}

#[derive(Debug)]
pub enum ArrowBody<'a> {
    Block(&'a Block<'a>),
    Expr(&'a Expression<'a>),
}

#[derive(Debug)]
pub struct ArrowFn<'a> {
    pub span: Span,
    pub params: NodeList<'a, Param<'a>>,
    pub return_ty: Option<TypeExpr>,
    pub body: ArrowBody<'a>,
    pub is_async: bool,
}

#[derive(Debug)]
pub enum MemberProp<'a> {
    Name(Identifier),
    Computed(&'a Expression<'a>),
}

#[derive(Debug)]
pub struct MemberExpr<'a> {
    pub span: Span,
    pub object: &'a Expression<'a>,
    pub property: MemberProp<'a>,
    /// `?.` / `?.[...]`
    pub optional: bool,
}

#[derive(Debug)]
pub struct CallExpr<'a> {
    pub span: Span,
    pub callee: &'a Expression<'a>,
    pub args: NodeList<'a, Expression<'a>>,
    /// `?.(...)`
    pub optional: bool,
}

#[derive(Debug)]
pub struct NewExpr<'a> {
    pub span: Span,
    pub callee: &'a Expression<'a>,
    pub args: NodeList<'a, Expression<'a>>,
}

/// Prefix and postfix unary operators; `prefix` distinguishes `++x`/`x++`.
#[derive(Debug)]
pub struct UnaryExpr<'a> {
    pub span: Span,
    pub op: UnaryOp,
    pub operand: &'a Expression<'a>,
    pub prefix: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    BitNot,
    Neg,
    Pos,
    Inc,
    Dec,
    TypeOf,
    Void,
    Delete,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
            UnaryOp::Inc => "++",
            UnaryOp::Dec => "--",
            UnaryOp::TypeOf => "typeof",
            UnaryOp::Void => "void",
            UnaryOp::Delete => "delete",
        }
    }

    /// Whether the operator is spelled as a word and needs a space.
    pub fn is_word(self) -> bool {
        matches!(self, UnaryOp::TypeOf | UnaryOp::Void | UnaryOp::Delete)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Pipeline,
    Nullish,
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
    Lt,
    Gt,
    Le,
    Ge,
    InstanceOf,
    In,
    Shl,
    Shr,
    UShr,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Pipeline => "|>",
            BinaryOp::Nullish => "??",
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitAnd => "&",
            BinaryOp::EqEq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::EqEqEq => "===",
            BinaryOp::NotEqEq => "!==",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::InstanceOf => "instanceof",
            BinaryOp::In => "in",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Pow => "**",
        }
    }

    /// Binding power, higher binds tighter. Used by the parser's
    /// precedence-climbing loop and by the code generator to decide where
    /// parentheses are required.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Pipeline => 1,
            BinaryOp::Nullish => 2,
            BinaryOp::Or => 3,
            BinaryOp::And => 4,
            BinaryOp::BitOr => 5,
            BinaryOp::BitXor => 6,
            BinaryOp::BitAnd => 7,
            BinaryOp::EqEq | BinaryOp::NotEq | BinaryOp::EqEqEq | BinaryOp::NotEqEq => 8,
            BinaryOp::Lt
            | BinaryOp::Gt
            | BinaryOp::Le
            | BinaryOp::Ge
            | BinaryOp::InstanceOf
            | BinaryOp::In => 9,
            BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr => 10,
            BinaryOp::Add | BinaryOp::Sub => 11,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 12,
            BinaryOp::Pow => 13,
        }
    }

    /// `**` is right-associative; everything else here is left-associative.
    pub fn right_assoc(self) -> bool {
        matches!(self, BinaryOp::Pow)
    }

    /// Map an operator token's text to its binary operator, if it is one.
    pub fn from_str(text: &str) -> Option<Self> {
        Some(match text {
            "|>" => BinaryOp::Pipeline,
            "??" => BinaryOp::Nullish,
            "||" => BinaryOp::Or,
            "&&" => BinaryOp::And,
            "|" => BinaryOp::BitOr,
            "^" => BinaryOp::BitXor,
            "&" => BinaryOp::BitAnd,
            "==" => BinaryOp::EqEq,
            "!=" => BinaryOp::NotEq,
            "===" => BinaryOp::EqEqEq,
            "!==" => BinaryOp::NotEqEq,
            "<" => BinaryOp::Lt,
            ">" => BinaryOp::Gt,
            "<=" => BinaryOp::Le,
            ">=" => BinaryOp::Ge,
            "<<" => BinaryOp::Shl,
            ">>" => BinaryOp::Shr,
            ">>>" => BinaryOp::UShr,
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Rem,
            "**" => BinaryOp::Pow,
            _ => return None,
        })
    }
}

#[derive(Debug)]
pub struct BinaryExpr<'a> {
    pub span: Span,
    pub op: BinaryOp,
    pub left: &'a Expression<'a>,
    pub right: &'a Expression<'a>,
}

#[derive(Debug)]
pub struct AssignExpr<'a> {
    pub span: Span,
    /// `=` or a compound form (`+=`, `??=`, ...).
    pub op: String,
    pub target: &'a Expression<'a>,
    pub value: &'a Expression<'a>,
}

#[derive(Debug)]
pub struct TernaryExpr<'a> {
    pub span: Span,
    pub cond: &'a Expression<'a>,
    pub then_expr: &'a Expression<'a>,
    pub else_expr: &'a Expression<'a>,
}

#[derive(Debug)]
pub struct AwaitExpr<'a> {
    pub span: Span,
    pub operand: &'a Expression<'a>,
}

#[derive(Debug)]
pub struct YieldExpr<'a> {
    pub span: Span,
    pub operand: Option<&'a Expression<'a>>,
    /// `yield*`
    pub delegate: bool,
}

#[derive(Debug)]
pub struct SpreadExpr<'a> {
    pub span: Span,
    pub operand: &'a Expression<'a>,
}

#[derive(Debug)]
pub struct SequenceExpr<'a> {
    pub span: Span,
    pub exprs: NodeList<'a, Expression<'a>>,
}

#[derive(Debug)]
pub struct BindExpr<'a> {
    pub span: Span,
    pub object: &'a Expression<'a>,
    pub method: Identifier,
}

#[derive(Debug)]
pub struct HaveExpr<'a> {
    pub span: Span,
    pub operand: &'a Expression<'a>,
}

#[derive(Debug)]
pub struct RequireExpr<'a> {
    pub span: Span,
    pub arg: &'a Expression<'a>,
}

#[derive(Debug)]
pub struct DecoratedExpr<'a> {
    pub span: Span,
    pub decorator: Decorator<'a>,
    pub expr: &'a Expression<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastOp {
    As,
    Satisfies,
}

#[derive(Debug)]
pub struct CastExpr<'a> {
    pub span: Span,
    pub expr: &'a Expression<'a>,
    pub ty: TypeExpr,
    pub op: CastOp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_precedence_orders_the_ladder() {
        assert!(BinaryOp::Mul.precedence() > BinaryOp::Add.precedence());
        assert!(BinaryOp::Add.precedence() > BinaryOp::Shl.precedence());
        assert!(BinaryOp::EqEqEq.precedence() > BinaryOp::BitAnd.precedence());
        assert!(BinaryOp::BitAnd.precedence() > BinaryOp::BitXor.precedence());
        assert!(BinaryOp::BitXor.precedence() > BinaryOp::BitOr.precedence());
        assert!(BinaryOp::And.precedence() > BinaryOp::Or.precedence());
        assert!(BinaryOp::Nullish.precedence() > BinaryOp::Pipeline.precedence());
    }

    #[test]
    fn operator_round_trip() {
        for op in [
            BinaryOp::Pipeline,
            BinaryOp::Nullish,
            BinaryOp::UShr,
            BinaryOp::Pow,
        ] {
            assert_eq!(BinaryOp::from_str(op.as_str()), Some(op));
        }
        assert_eq!(BinaryOp::from_str("=>"), None);
    }
}
