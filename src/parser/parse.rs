//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing
//! infrastructure: cursor helpers, trivia/comment bookkeeping, bounded error
//! recovery, and the top-level parse entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following
//! organization:
//! - This module: Parser struct, helper methods, recovery, and coordination
//! - `declarations`: variable/typedef/struct/enum/function declarations
//! - `statements`: statements (if, while, for, etc.)
//! - `expressions`: expressions with precedence climbing
//!
//! Parser methods are split across multiple files using `impl Parser`
//! blocks, allowing each module to extend the Parser with related
//! functionality while maintaining access to the shared parser state.
//!
//! # Totality
//!
//! [`Parser::parse`] cannot fail.  Productions return
//! `Result<AstNode, ParseError>` internally, but every failure is caught at
//! a statement, member, enumerator, or top-level boundary and converted into
//! an [`NodeKind::Unparsed`] node holding the verbatim source slice, after
//! which parsing resumes at the next safe boundary.

use crate::parser::ast::*;
use crate::parser::symbols::{SymbolKind, SymbolTable, WELL_KNOWN_TYPEDEFS};
use crate::parser::token::{Token, TokenKind};
use std::fmt;

/// Parser error type.  These never escape [`Parser::parse`]; they exist to
/// unwind a failed production to the nearest recovery point.
#[derive(Debug)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "parse error at line {}, column {}: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

/// Context-sensitive recursive descent parser over a lossless token slice.
pub struct Parser<'t> {
    pub(crate) source: &'t str,
    pub(crate) tokens: &'t [Token<'t>],
    pub(crate) pos: usize,
    /// Cursor position before the most recent trivia skip; recovery slices
    /// start here so skipped comments stay inside the verbatim text.
    pub(crate) trivia_start: usize,
    /// Line of the last significant token, for trailing-comment attachment.
    pub(crate) last_token_line: usize,
    /// Comments seen while skipping trivia, waiting to be attached as
    /// leading comments of the next parsed node.
    pub(crate) pending_comments: Vec<&'t Token<'t>>,
    pub(crate) symbols: SymbolTable,
    /// Number of productions abandoned to verbatim recovery.
    recoveries: usize,
}

impl<'t> Parser<'t> {
    /// Creates a parser over a lexed token slice.  The global scope is
    /// seeded with well-known standard typedef names so declarations using
    /// them are recognized without their headers.
    pub fn new(source: &'t str, tokens: &'t [Token<'t>]) -> Self {
        let mut symbols = SymbolTable::new();
        for name in WELL_KNOWN_TYPEDEFS {
            symbols.add(name, SymbolKind::Typedef);
        }
        Parser {
            source,
            tokens,
            pos: 0,
            trivia_start: 0,
            last_token_line: 0,
            pending_comments: Vec::new(),
            symbols,
            recoveries: 0,
        }
    }

    /// Parses the whole translation unit.  Total: always returns a
    /// [`NodeKind::Program`] node covering the entire input.
    pub fn parse(&mut self) -> AstNode<'t> {
        let mut program = AstNode::new(NodeKind::Program, None);
        loop {
            let blanks = self.skip_trivia();
            if self.is_at_end() {
                break;
            }
            let mut node = self.parse_top_level();
            node.blank_line_before = blanks > 0;
            program.children.push(node);
        }
        // Comments at the very end of the file have no following node.
        program
            .trailing_comments
            .append(&mut self.pending_comments);
        program
    }

    /// Number of verbatim recoveries performed so far.
    pub fn recoveries(&self) -> usize {
        self.recoveries
    }

    // ===== Top-level dispatch =====

    fn parse_top_level(&mut self) -> AstNode<'t> {
        let section_start = self.trivia_start;
        let comments = std::mem::take(&mut self.pending_comments);
        match self.parse_top_level_inner() {
            Ok(mut node) => {
                self.prepend_comments(&mut node, comments);
                // Comments buffered mid-construct belong to this node, not
                // the next one.
                let mut mid = std::mem::take(&mut self.pending_comments);
                node.leading_comments.append(&mut mid);
                self.collect_trailing_comments(&mut node);
                node
            }
            Err(_) => {
                self.recoveries += 1;
                // The raw slice starts before the buffered comments, so they
                // are preserved inside it.
                self.pending_comments.clear();
                self.recover_top_level(section_start)
            }
        }
    }

    fn parse_top_level_inner(&mut self) -> Result<AstNode<'t>, ParseError> {
        match self.peek_kind() {
            TokenKind::Preprocessor => {
                let token = self.advance();
                Ok(AstNode::new(NodeKind::Preprocessor, token))
            }
            TokenKind::Typedef => self.parse_typedef(),
            TokenKind::Struct | TokenKind::Union => {
                if self.record_definition_ahead() {
                    let kind = if self.peek_kind() == TokenKind::Struct {
                        NodeKind::Struct
                    } else {
                        NodeKind::Union
                    };
                    let record = self.parse_record(kind)?;
                    self.finish_record_declaration(record)
                } else {
                    self.parse_function_or_global()
                }
            }
            TokenKind::Enum => {
                let record = self.parse_enum()?;
                self.finish_record_declaration(record)
            }
            _ => self.parse_function_or_global(),
        }
    }

    /// `struct`/`union` at the top level is a definition when `{` appears
    /// one or two tokens ahead, or when it is a `struct Name;` forward
    /// declaration.  Otherwise it is a function's return type.
    fn record_definition_ahead(&self) -> bool {
        let next1 = self.peek_ahead(1).map(|t| t.kind);
        let next2 = self.peek_ahead(2).map(|t| t.kind);
        next1 == Some(TokenKind::LBrace)
            || next2 == Some(TokenKind::LBrace)
            || (next1 == Some(TokenKind::Identifier) && next2 == Some(TokenKind::Semicolon))
    }

    fn parse_function_or_global(&mut self) -> Result<AstNode<'t>, ParseError> {
        let checkpoint = self.pos;
        match self.parse_function() {
            Ok(node) => Ok(node),
            Err(err) => {
                if self.pos != checkpoint {
                    // Failed inside a body; recovery proceeds from here.
                    return Err(err);
                }
                if self.is_declaration_start() {
                    self.parse_var_declaration()
                } else {
                    Err(err)
                }
            }
        }
    }

    // ===== Cursor helpers =====

    pub(crate) fn peek(&self) -> Option<&'t Token<'t>> {
        self.tokens.get(self.pos)
    }

    pub(crate) fn peek_kind(&self) -> TokenKind {
        self.peek().map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    pub(crate) fn advance(&mut self) -> Option<&'t Token<'t>> {
        let token = self.peek()?;
        if token.kind != TokenKind::Eof {
            self.pos += 1;
            if !matches!(token.kind, TokenKind::Whitespace | TokenKind::Newline) {
                self.last_token_line = token.line;
            }
        }
        Some(token)
    }

    /// Skips trivia, then consumes the next token if it has the given kind.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> Option<&'t Token<'t>> {
        self.skip_trivia();
        if self.peek_kind() == kind {
            self.advance()
        } else {
            None
        }
    }

    /// Skips trivia, then requires the next token to have the given kind.
    pub(crate) fn expect(
        &mut self,
        kind: TokenKind,
        what: &str,
    ) -> Result<&'t Token<'t>, ParseError> {
        self.skip_trivia();
        match self.peek() {
            Some(t) if t.kind == kind => Ok(self.advance().unwrap_or(t)),
            Some(t) => Err(ParseError {
                message: format!("expected {what}, found {t}"),
                line: t.line,
                column: t.column,
            }),
            None => Err(ParseError {
                message: format!("expected {what}, found end of file"),
                line: self.last_token_line,
                column: 0,
            }),
        }
    }

    pub(crate) fn error_here(&self, message: impl Into<String>) -> ParseError {
        let (line, column) = self
            .peek()
            .map(|t| (t.line, t.column))
            .unwrap_or((self.last_token_line, 0));
        ParseError {
            message: message.into(),
            line,
            column,
        }
    }

    /// The `n`th significant (non-trivia) token at or after the cursor,
    /// without consuming anything.  `peek_ahead(0)` is the current
    /// significant token.
    pub(crate) fn peek_ahead(&self, n: usize) -> Option<&'t Token<'t>> {
        let mut remaining = n;
        let mut i = self.pos;
        while let Some(t) = self.tokens.get(i) {
            if !t.kind.is_trivia() {
                if remaining == 0 {
                    return Some(t);
                }
                if t.kind == TokenKind::Eof {
                    return None;
                }
                remaining -= 1;
            }
            i += 1;
        }
        None
    }

    // ===== Trivia, comments, blank lines =====

    /// Skips whitespace, newlines, and comments.  Comments are buffered for
    /// leading attachment; returns the collapsed blank-line count (two or
    /// more consecutive newlines count as one blank line).
    pub(crate) fn skip_trivia(&mut self) -> usize {
        self.trivia_start = self.pos;
        let mut newlines = 0;
        while let Some(t) = self.peek() {
            match t.kind {
                TokenKind::Whitespace => {
                    self.advance();
                }
                TokenKind::Newline => {
                    newlines += 1;
                    self.advance();
                }
                TokenKind::LineComment | TokenKind::BlockComment => {
                    self.pending_comments.push(t);
                    self.advance();
                }
                _ => break,
            }
        }
        if newlines > 1 {
            newlines - 1
        } else {
            0
        }
    }

    pub(crate) fn prepend_comments(
        &mut self,
        node: &mut AstNode<'t>,
        mut comments: Vec<&'t Token<'t>>,
    ) {
        comments.append(&mut node.leading_comments);
        node.leading_comments = comments;
    }

    /// Wraps comments left pending at a closing brace in a comment-only node
    /// so they stay inside the construct that contains them.
    pub(crate) fn take_dangling_comments(&mut self, blanks: usize) -> Option<AstNode<'t>> {
        if self.pending_comments.is_empty() {
            return None;
        }
        let mut node = AstNode::new(NodeKind::Comment, None);
        node.leading_comments = std::mem::take(&mut self.pending_comments);
        node.blank_line_before = blanks > 0;
        Some(node)
    }

    /// Attaches comments on the same line after the node (stops at the next
    /// newline or significant token).
    pub(crate) fn collect_trailing_comments(&mut self, node: &mut AstNode<'t>) {
        while let Some(t) = self.peek() {
            match t.kind {
                TokenKind::Whitespace => {
                    self.advance();
                }
                TokenKind::LineComment | TokenKind::BlockComment
                    if t.line == self.last_token_line =>
                {
                    node.trailing_comments.push(t);
                    self.advance();
                }
                _ => break,
            }
        }
    }

    // ===== Scopes =====

    pub(crate) fn enter_scope(&mut self) {
        let parent = std::mem::take(&mut self.symbols);
        self.symbols = SymbolTable::with_parent(parent);
    }

    pub(crate) fn exit_scope(&mut self) {
        let scope = std::mem::take(&mut self.symbols);
        self.symbols = scope.into_parent().unwrap_or_default();
    }

    // ===== Verbatim recovery =====

    pub(crate) fn bump_recoveries(&mut self) {
        self.recoveries += 1;
    }

    /// Builds an [`NodeKind::Unparsed`] node from a token index range,
    /// trimming pure whitespace at both ends (comments stay inside).
    pub(crate) fn make_unparsed(&self, start: usize, end: usize) -> AstNode<'t> {
        let mut s = start;
        let mut e = end.min(self.tokens.len());
        while s < e
            && matches!(
                self.tokens[s].kind,
                TokenKind::Whitespace | TokenKind::Newline
            )
        {
            s += 1;
        }
        while e > s
            && matches!(
                self.tokens[e - 1].kind,
                TokenKind::Whitespace | TokenKind::Newline | TokenKind::Eof
            )
        {
            e -= 1;
        }
        let segment = if s < e {
            let first = &self.tokens[s];
            let last = &self.tokens[e - 1];
            RawSegment {
                text: &self.source[first.offset..last.end_offset()],
                start_line: first.line,
                end_line: last.line,
            }
        } else {
            RawSegment {
                text: "",
                start_line: self.last_token_line,
                end_line: self.last_token_line,
            }
        };
        AstNode::with_data(NodeKind::Unparsed, None, NodeData::Raw(segment))
    }

    /// Statement-level recovery: consume to a depth-0 `;` or newline (both
    /// consumed) or an unmatched `}` (left for the enclosing block), honoring
    /// brace nesting.
    pub(crate) fn recover_statement(&mut self, start: usize) -> AstNode<'t> {
        let mut depth = 0usize;
        while let Some(t) = self.peek() {
            match t.kind {
                TokenKind::Eof => break,
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    break;
                }
                TokenKind::Newline if depth == 0 => {
                    self.advance();
                    break;
                }
                TokenKind::LBrace => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::RBrace => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    self.advance();
                    if depth == 0 {
                        break;
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
        self.make_unparsed(start, self.pos)
    }

    /// Top-level recovery: consume to a depth-0 `;`, an unmatched `}`
    /// (consumed), or the close of a balanced `{…}` group.
    pub(crate) fn recover_top_level(&mut self, start: usize) -> AstNode<'t> {
        let mut depth = 0usize;
        let mut entered = false;
        while let Some(t) = self.peek() {
            match t.kind {
                TokenKind::Eof => break,
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    break;
                }
                TokenKind::LBrace => {
                    depth += 1;
                    entered = true;
                    self.advance();
                }
                TokenKind::RBrace => {
                    self.advance();
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    if depth == 0 && entered {
                        break;
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
        if self.pos == start && !self.is_at_end() {
            self.advance();
        }
        self.make_unparsed(start, self.pos)
    }

    /// Enumerator-level recovery: consume to a depth-0 `,` or newline
    /// (consumed) or the enum's closing `}` (left in place), tracking both
    /// brace and paren nesting.
    pub(crate) fn recover_enum_entry(&mut self, start: usize) -> AstNode<'t> {
        let mut brace = 0usize;
        let mut paren = 0usize;
        while let Some(t) = self.peek() {
            match t.kind {
                TokenKind::Eof => break,
                TokenKind::Comma | TokenKind::Newline if brace == 0 && paren == 0 => {
                    self.advance();
                    break;
                }
                TokenKind::RBrace if brace == 0 => break,
                TokenKind::LBrace => {
                    brace += 1;
                    self.advance();
                }
                TokenKind::RBrace => {
                    brace -= 1;
                    self.advance();
                }
                TokenKind::LParen => {
                    paren += 1;
                    self.advance();
                }
                TokenKind::RParen => {
                    paren = paren.saturating_sub(1);
                    self.advance();
                }
                _ => {
                    self.advance();
                }
            }
        }
        self.make_unparsed(start, self.pos)
    }

    // ===== Declaration lookahead =====

    /// `IDENT * IDENT` (one or more stars) followed by `;`, `,`, `=`, or `[`
    /// is treated as a pointer declaration of an unknown type.
    pub(crate) fn looks_like_ptr_declaration(&self) -> bool {
        if self.peek_ahead(0).map(|t| t.kind) != Some(TokenKind::Identifier) {
            return false;
        }
        let mut n = 1;
        while self.peek_ahead(n).map(|t| t.kind) == Some(TokenKind::Star) {
            n += 1;
        }
        if n == 1 {
            return false;
        }
        if self.peek_ahead(n).map(|t| t.kind) != Some(TokenKind::Identifier) {
            return false;
        }
        matches!(
            self.peek_ahead(n + 1).map(|t| t.kind),
            Some(TokenKind::Semicolon | TokenKind::Comma | TokenKind::Eq | TokenKind::LBracket)
        )
    }

    /// True when the current significant token can start a declaration.
    pub(crate) fn is_declaration_start(&self) -> bool {
        let token = match self.peek_ahead(0) {
            Some(t) => t,
            None => return false,
        };
        token.kind.is_type_keyword()
            || (token.kind == TokenKind::Identifier
                && (self.symbols.is_typedef(token.text) || self.looks_like_ptr_declaration()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::Lexer;

    fn parse(source: &str) -> (AstNode<'static>, usize) {
        // Tokens must outlive the AST, so leak them for test convenience.
        let source: &'static str = Box::leak(source.to_owned().into_boxed_str());
        let (tokens, _) = Lexer::new(source).tokenize();
        let tokens: &'static [Token<'static>] = Box::leak(tokens.into_boxed_slice());
        let mut parser = Parser::new(source, tokens);
        let program = parser.parse();
        (program, parser.recoveries())
    }

    #[test]
    fn parses_simple_function() {
        let (program, recoveries) = parse("int add(int a, int b)\n{\n\treturn (a + b);\n}\n");
        assert_eq!(recoveries, 0);
        assert_eq!(program.children.len(), 1);
        let func = &program.children[0];
        assert_eq!(func.kind, NodeKind::Function);
        assert_eq!(func.token_text(), "add");
        match &func.data {
            NodeData::Function(data) => assert_eq!(data.params.len(), 2),
            other => panic!("expected function data, got {other:?}"),
        }
        assert_eq!(func.children.len(), 1);
        assert_eq!(func.children[0].kind, NodeKind::Block);
    }

    #[test]
    fn typedef_changes_later_parses() {
        let (program, recoveries) = parse("typedef int myint;\nmyint x = 5;\n");
        assert_eq!(recoveries, 0);
        assert_eq!(program.children.len(), 2);
        assert_eq!(program.children[0].kind, NodeKind::Typedef);
        let decl = &program.children[1];
        assert_eq!(decl.kind, NodeKind::VarDecl);
        match &decl.data {
            NodeData::VarDecl(data) => {
                assert_eq!(data.base_type[0].text, "myint");
                assert_eq!(data.declarators[0].name.text, "x");
                assert!(data.declarators[0].init.is_some());
            }
            other => panic!("expected var decl data, got {other:?}"),
        }
    }

    #[test]
    fn pointer_declaration_heuristic_without_typedef() {
        // `foo_t` was never declared, but the shape IDENT * IDENT ; wins.
        let (program, _) = parse("int main(void)\n{\n\tfoo_t *x;\n}\n");
        let body = &program.children[0].children[0];
        assert_eq!(body.children[0].kind, NodeKind::VarDecl);
    }

    #[test]
    fn unknown_top_level_construct_is_preserved_verbatim() {
        let source = "__asm__ {\n  mov eax, 1\n}\n";
        let (program, recoveries) = parse(source);
        assert_eq!(recoveries, 1);
        assert_eq!(program.children.len(), 1);
        let node = &program.children[0];
        assert_eq!(node.kind, NodeKind::Unparsed);
        match &node.data {
            NodeData::Raw(raw) => assert_eq!(raw.text, "__asm__ {\n  mov eax, 1\n}"),
            other => panic!("expected raw segment, got {other:?}"),
        }
    }

    #[test]
    fn parse_is_total_on_garbage() {
        let (program, recoveries) = parse("@@@ ;; int main( {{{ )\n");
        assert!(recoveries > 0);
        assert!(!program.children.is_empty());
    }

    #[test]
    fn goto_statement_recovers_inside_block() {
        let (program, recoveries) = parse("void f(void)\n{\n\tgoto done;\n\tdone: ;\n}\n");
        assert!(recoveries >= 1);
        let block = &program.children[0].children[0];
        assert!(block.children.iter().any(|n| n.kind == NodeKind::Unparsed));
        match &block.children[0].data {
            NodeData::Raw(raw) => assert_eq!(raw.text, "goto done;"),
            other => panic!("expected raw segment, got {other:?}"),
        }
    }

    #[test]
    fn blank_lines_are_flagged_and_collapsed() {
        let (program, _) = parse("int a;\n\n\n\nint b;\n");
        assert!(!program.children[0].blank_line_before);
        assert!(program.children[1].blank_line_before);
    }

    #[test]
    fn rewound_function_attempt_does_not_duplicate_comments() {
        // `size_t ... n;` is first tried as a function header; the rewind to
        // the declaration path must not re-buffer the comment.
        let (program, recoveries) = parse("size_t /* count */ n;\nint y;\n");
        assert_eq!(recoveries, 0);
        assert_eq!(program.children.len(), 2);
        let decl = &program.children[0];
        assert_eq!(decl.kind, NodeKind::VarDecl);
        assert_eq!(decl.leading_comments.len(), 1);
        assert_eq!(decl.leading_comments[0].text, "/* count */");
        assert!(program.children[1].leading_comments.is_empty());
    }

    #[test]
    fn record_definition_with_declarators() {
        let (program, recoveries) = parse("struct point { int x; int y; } origin, *cursor;\n");
        assert_eq!(recoveries, 0);
        let decl = &program.children[0];
        assert_eq!(decl.kind, NodeKind::VarDecl);
        assert_eq!(decl.children[0].kind, NodeKind::Struct);
        match &decl.data {
            NodeData::VarDecl(data) => {
                assert!(data.base_type.is_empty());
                assert_eq!(data.declarators.len(), 2);
                assert_eq!(data.declarators[0].name.text, "origin");
                assert_eq!(data.declarators[1].stars, 1);
            }
            other => panic!("expected var decl data, got {other:?}"),
        }
    }

    #[test]
    fn comments_attach_to_following_node() {
        let (program, _) = parse("/* header */\nint a;\nint b; // tail\n");
        assert_eq!(program.children[0].leading_comments.len(), 1);
        assert_eq!(program.children[0].leading_comments[0].text, "/* header */");
        assert_eq!(program.children[1].trailing_comments.len(), 1);
        assert_eq!(program.children[1].trailing_comments[0].text, "// tail");
    }
}
