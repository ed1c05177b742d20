//! Token definitions shared by the lexer, parser, and formatter.
//!
//! Unlike a conventional compiler front end, the token stream here is
//! *lossless*: whitespace runs, newlines, comments, and preprocessor
//! directives are all real tokens.  Every byte of the input belongs to
//! exactly one token, which is what lets error recovery hand back verbatim
//! slices of the original source.

use std::fmt;

/// All token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Layout (preserved, not discarded)
    Whitespace,
    Newline,
    LineComment,
    BlockComment,
    Preprocessor,

    // Literals and names
    Identifier,
    Integer,
    Float,
    String,
    CharLit,

    // Keywords
    If,
    Else,
    While,
    For,
    Do,
    Switch,
    Case,
    Default,
    Break,
    Continue,
    Return,
    Goto,
    Typedef,
    Struct,
    Union,
    Enum,
    Sizeof,
    Void,
    CharKw,
    Short,
    Int,
    Long,
    FloatKw,
    Double,
    Signed,
    Unsigned,
    Const,
    Volatile,
    Static,
    Extern,
    Auto,
    Register,

    // Operators
    Plus,    // +
    Minus,   // -
    Star,    // *
    Slash,   // /
    Percent, // %

    Eq,        // =
    PlusEq,    // +=
    MinusEq,   // -=
    StarEq,    // *=
    SlashEq,   // /=
    PercentEq, // %=
    AmpEq,     // &=
    PipeEq,    // |=
    CaretEq,   // ^=
    LtLtEq,    // <<=
    GtGtEq,    // >>=

    EqEq,  // ==
    NotEq, // !=
    Lt,    // <
    Le,    // <=
    Gt,    // >
    Ge,    // >=

    AndAnd, // &&
    OrOr,   // ||
    Bang,   // !

    Amp,   // &
    Pipe,  // |
    Caret, // ^
    Tilde, // ~
    LtLt,  // <<
    GtGt,  // >>

    PlusPlus,   // ++
    MinusMinus, // --

    Dot,      // .
    Arrow,    // ->
    Ellipsis, // ...

    Question, // ?
    Colon,    // :

    // Punctuation
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]
    Semicolon, // ;
    Comma,     // ,

    Eof,
    Error,
}

impl TokenKind {
    /// Layout tokens the parser skips between significant tokens.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace
                | TokenKind::Newline
                | TokenKind::LineComment
                | TokenKind::BlockComment
        )
    }

    pub fn is_comment(self) -> bool {
        matches!(self, TokenKind::LineComment | TokenKind::BlockComment)
    }

    /// Keywords that can start a declaration's type.
    pub fn is_type_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::Void
                | TokenKind::CharKw
                | TokenKind::Short
                | TokenKind::Int
                | TokenKind::Long
                | TokenKind::FloatKw
                | TokenKind::Double
                | TokenKind::Signed
                | TokenKind::Unsigned
                | TokenKind::Const
                | TokenKind::Volatile
                | TokenKind::Static
                | TokenKind::Extern
                | TokenKind::Struct
                | TokenKind::Union
                | TokenKind::Enum
                | TokenKind::Typedef
        )
    }

    /// Tokens permitted inside a parenthesized type, as used by the cast and
    /// `sizeof` lookaheads.  Identifiers need a separate typedef check.
    pub fn allowed_in_type(self) -> bool {
        self.is_trivia()
            || matches!(
                self,
                TokenKind::Identifier
                    | TokenKind::Star
                    | TokenKind::Const
                    | TokenKind::Volatile
                    | TokenKind::Unsigned
                    | TokenKind::Signed
                    | TokenKind::Short
                    | TokenKind::Long
                    | TokenKind::Int
                    | TokenKind::Void
                    | TokenKind::CharKw
                    | TokenKind::FloatKw
                    | TokenKind::Double
                    | TokenKind::Struct
                    | TokenKind::Enum
                    | TokenKind::Union
                    | TokenKind::Static
                    | TokenKind::Extern
                    | TokenKind::Register
                    | TokenKind::Auto
                    | TokenKind::LBracket
                    | TokenKind::RBracket
                    | TokenKind::Integer
                    | TokenKind::Typedef
            )
    }

    /// Binary operator precedence for the climbing loop.  Zero means the
    /// token is not a binary operator.  Assignment is lowest and
    /// right-associative; multiplicative is highest.
    pub fn precedence(self) -> u8 {
        match self {
            TokenKind::Eq
            | TokenKind::PlusEq
            | TokenKind::MinusEq
            | TokenKind::StarEq
            | TokenKind::SlashEq
            | TokenKind::PercentEq
            | TokenKind::AmpEq
            | TokenKind::PipeEq
            | TokenKind::CaretEq
            | TokenKind::LtLtEq
            | TokenKind::GtGtEq => 1,
            TokenKind::OrOr => 2,
            TokenKind::AndAnd => 3,
            TokenKind::Pipe => 4,
            TokenKind::Caret => 5,
            TokenKind::Amp => 6,
            TokenKind::EqEq | TokenKind::NotEq => 7,
            TokenKind::Lt | TokenKind::Le | TokenKind::Gt | TokenKind::Ge => 8,
            TokenKind::LtLt | TokenKind::GtGt => 9,
            TokenKind::Plus | TokenKind::Minus => 10,
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => 11,
            _ => 0,
        }
    }

    /// Assignment operators bind right-to-left.
    pub fn is_assignment(self) -> bool {
        self.precedence() == 1
    }

    pub fn is_unary_op(self) -> bool {
        matches!(
            self,
            TokenKind::Bang
                | TokenKind::Tilde
                | TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Star
                | TokenKind::Amp
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
        )
    }
}

/// A single lexed token.
///
/// `text` borrows from the original source, and `offset` is the byte offset
/// of the token's first character, so any contiguous token range maps back
/// to an exact source slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl<'src> Token<'src> {
    /// Byte offset one past the token's last character.
    pub fn end_offset(&self) -> usize {
        self.offset + self.text.len()
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "end of file"),
            TokenKind::Newline => write!(f, "newline"),
            _ => write!(f, "`{}`", self.text),
        }
    }
}

/// Looks up the keyword kind for an identifier-shaped lexeme.
pub(crate) fn keyword_kind(word: &str) -> Option<TokenKind> {
    let kind = match word {
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "for" => TokenKind::For,
        "do" => TokenKind::Do,
        "switch" => TokenKind::Switch,
        "case" => TokenKind::Case,
        "default" => TokenKind::Default,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "return" => TokenKind::Return,
        "goto" => TokenKind::Goto,
        "typedef" => TokenKind::Typedef,
        "struct" => TokenKind::Struct,
        "union" => TokenKind::Union,
        "enum" => TokenKind::Enum,
        "sizeof" => TokenKind::Sizeof,
        "void" => TokenKind::Void,
        "char" => TokenKind::CharKw,
        "short" => TokenKind::Short,
        "int" => TokenKind::Int,
        "long" => TokenKind::Long,
        "float" => TokenKind::FloatKw,
        "double" => TokenKind::Double,
        "signed" => TokenKind::Signed,
        "unsigned" => TokenKind::Unsigned,
        "const" => TokenKind::Const,
        "volatile" => TokenKind::Volatile,
        "static" => TokenKind::Static,
        "extern" => TokenKind::Extern,
        "auto" => TokenKind::Auto,
        "register" => TokenKind::Register,
        _ => return None,
    };
    Some(kind)
}
