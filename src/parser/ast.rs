//! AST node definitions.
//!
//! The tree is deliberately *layout-aware*: every node can carry leading and
//! trailing comments, a collapsed blank-line flag, and — for constructs the
//! parser does not model — a verbatim slice of the original source.  Nodes
//! borrow their tokens from the lexer's buffer; nothing in the tree owns
//! source text.

use super::token::{Token, TokenKind};

/// The kind of construct a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Program,
    Function,
    VarDecl,
    Struct,
    Union,
    Enum,
    EnumValue,
    Typedef,
    Block,
    If,
    While,
    DoWhile,
    For,
    Switch,
    Case,
    Return,
    Break,
    Continue,
    ExprStmt,
    Binary,
    Unary,
    Ternary,
    Call,
    Literal,
    Identifier,
    MemberAccess,
    ArrayAccess,
    Cast,
    Sizeof,
    InitList,
    TypeExpr,
    Param,
    FuncPtr,
    Preprocessor,
    /// A comment (or run of comments) with no following construct to attach
    /// to, e.g. on its own line directly before a closing brace.  Carries
    /// its text in `leading_comments`.
    Comment,
    Unparsed,
}

/// One declared name within a declaration, e.g. the `*head` and `*tail` of
/// `node_t *head, *tail;`.
#[derive(Debug, Clone)]
pub struct Declarator<'t> {
    /// Pointer depth for this declarator.
    pub stars: usize,
    /// Qualifiers interleaved with the stars (`const`, `volatile`).
    pub quals: Vec<&'t Token<'t>>,
    pub name: &'t Token<'t>,
    /// Raw token run of the array dimensions, brackets included.
    pub array_dims: Vec<&'t Token<'t>>,
    pub init: Option<AstNode<'t>>,
}

#[derive(Debug, Clone)]
pub struct VarDeclData<'t> {
    /// Base type tokens shared by every declarator (no stars).
    pub base_type: Vec<&'t Token<'t>>,
    pub declarators: Vec<Declarator<'t>>,
}

#[derive(Debug, Clone)]
pub struct FunctionData<'t> {
    /// Return type tokens, pointer stars included.
    pub return_type: Vec<&'t Token<'t>>,
    /// [`NodeKind::Param`] nodes.  A prototype has no `Block` child.
    pub params: Vec<AstNode<'t>>,
    /// GNU `__attribute__((...))` token run after the parameter list, kept
    /// so the annotation survives reformatting.  Usually empty.
    pub attrs: Vec<&'t Token<'t>>,
}

#[derive(Debug, Clone)]
pub struct ParamData<'t> {
    /// Type tokens, pointer stars included.
    pub type_tokens: Vec<&'t Token<'t>>,
    /// Array suffix tokens following the parameter name, e.g. `[` `]`.
    pub array_dims: Vec<&'t Token<'t>>,
}

#[derive(Debug, Clone)]
pub struct TypedefData<'t> {
    /// Base type tokens for plain aliases; empty when the aliased type is an
    /// inline struct/union/enum definition or a function pointer (the child
    /// node holds it instead).
    pub base_type: Vec<&'t Token<'t>>,
}

#[derive(Debug, Clone)]
pub struct FuncPtrData<'t> {
    pub return_type: Vec<&'t Token<'t>>,
    pub name: &'t Token<'t>,
    /// Raw token run of the parameter list, outer parentheses excluded.
    pub params: Vec<&'t Token<'t>>,
}

#[derive(Debug, Clone)]
pub struct ForData<'t> {
    /// Comma-separated init expressions, or a single declaration.
    pub init: Vec<AstNode<'t>>,
    pub cond: Option<Box<AstNode<'t>>>,
    /// Comma-separated step expressions.
    pub step: Vec<AstNode<'t>>,
}

/// A verbatim stretch of source the parser gave up on.
#[derive(Debug, Clone)]
pub struct RawSegment<'t> {
    pub text: &'t str,
    pub start_line: usize,
    pub end_line: usize,
}

/// Structured payload, keyed by node kind.
#[derive(Debug, Clone, Default)]
pub enum NodeData<'t> {
    #[default]
    None,
    Function(FunctionData<'t>),
    VarDecl(VarDeclData<'t>),
    Typedef(TypedefData<'t>),
    FuncPtr(FuncPtrData<'t>),
    Param(ParamData<'t>),
    For(ForData<'t>),
    /// `MemberAccess`: whether `->` was used rather than `.`.
    Member { arrow: bool },
    /// `Unary`: whether the operator follows its operand (`x++`).
    Unary { postfix: bool },
    /// Type token run for `Cast`, type-form `Sizeof`, and `TypeExpr`.
    TypeName(Vec<&'t Token<'t>>),
    /// `Struct`/`Union`/`Enum`: whether a `{ ... }` body was present, as
    /// opposed to a forward declaration or tag reference.
    Record { has_body: bool },
    /// `EnumValue`: token run after `=`, empty when no value was given.
    EnumValue(Vec<&'t Token<'t>>),
    Raw(RawSegment<'t>),
}

/// A node in the layout-aware AST.
#[derive(Debug, Clone)]
pub struct AstNode<'t> {
    pub kind: NodeKind,
    /// The node's defining token: the operator for `Binary`/`Unary`, the
    /// name for declarations, the keyword for `Case`, the lexeme for
    /// `Literal` and `Identifier`.
    pub token: Option<&'t Token<'t>>,
    pub children: Vec<AstNode<'t>>,
    pub leading_comments: Vec<&'t Token<'t>>,
    /// Comments on the same line after the node.
    pub trailing_comments: Vec<&'t Token<'t>>,
    /// True when one or more blank lines preceded the node (collapsed).
    pub blank_line_before: bool,
    pub data: NodeData<'t>,
}

impl<'t> AstNode<'t> {
    pub fn new(kind: NodeKind, token: Option<&'t Token<'t>>) -> Self {
        AstNode {
            kind,
            token,
            children: Vec::new(),
            leading_comments: Vec::new(),
            trailing_comments: Vec::new(),
            blank_line_before: false,
            data: NodeData::None,
        }
    }

    pub fn with_data(kind: NodeKind, token: Option<&'t Token<'t>>, data: NodeData<'t>) -> Self {
        AstNode {
            data,
            ..AstNode::new(kind, token)
        }
    }

    /// Text of the defining token, or `""` when there is none.
    pub fn token_text(&self) -> &'t str {
        self.token.map(|t| t.text).unwrap_or("")
    }

    pub fn token_kind(&self) -> Option<TokenKind> {
        self.token.map(|t| t.kind)
    }
}
