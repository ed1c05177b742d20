//! Declaration parsing implementation
//!
//! This module handles parsing of C declarations:
//!
//! - Variable declarations with declarator lists: `node_t *head, *tail;`
//! - Function pointers: `int (*cmp)(const void *, const void *);`
//! - Typedefs, including inline struct/union/enum and function-pointer forms
//! - Struct/union definitions with member-level recovery
//! - Enum definitions with enumerator-level recovery
//! - Function definitions and prototypes
//!
//! # Grammar
//!
//! ```text
//! var_decl    ::= base_type declarator ("," declarator)* ";"
//! declarator  ::= ("*" | "const" | "volatile")* identifier array_dim* ("=" initializer)?
//! typedef     ::= "typedef" (record | enum | base_type) ... alias ";"
//! function    ::= modifiers base_type "*"* identifier "(" params ")" (";" | block)
//! ```
//!
//! Declaration detection is context-sensitive: an identifier only starts a
//! declaration when the symbol table knows it as a typedef, or when the
//! `IDENT * IDENT` pointer heuristic applies.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the
//! [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::parse::{ParseError, Parser};
use crate::parser::symbols::SymbolKind;
use crate::parser::token::{Token, TokenKind};

impl<'t> Parser<'t> {
    /// Parses a full variable declaration statement, `;` included.
    pub(crate) fn parse_var_declaration(&mut self) -> Result<AstNode<'t>, ParseError> {
        let base_type = self.collect_base_type()?;

        // `ret (*name)(params);` declares a function pointer.
        self.skip_trivia();
        if self.peek_kind() == TokenKind::LParen
            && self.peek_ahead(1).map(|t| t.kind) == Some(TokenKind::Star)
        {
            let node = self.parse_func_ptr(base_type)?;
            self.expect(TokenKind::Semicolon, "';' after declaration")?;
            return Ok(node);
        }

        let mut declarators = Vec::new();
        loop {
            let declarator = self.parse_declarator()?;
            self.symbols.add(declarator.name.text, SymbolKind::Variable);
            declarators.push(declarator);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::Semicolon, "';' after declaration")?;

        let name = declarators[0].name;
        Ok(AstNode::with_data(
            NodeKind::VarDecl,
            Some(name),
            NodeData::VarDecl(VarDeclData {
                base_type,
                declarators,
            }),
        ))
    }

    /// Collects the base type tokens of a declaration: a type keyword run
    /// (with struct/union/enum tags), a typedef'd identifier, or the
    /// identifier of the pointer heuristic.
    fn collect_base_type(&mut self) -> Result<Vec<&'t Token<'t>>, ParseError> {
        let mut tokens: Vec<&'t Token<'t>> = Vec::new();
        self.skip_trivia();
        let first = match self.peek() {
            Some(t) => t,
            None => return Err(self.error_here("expected declaration")),
        };

        if first.kind.is_type_keyword() {
            loop {
                let token = match self.advance() {
                    Some(t) => t,
                    None => break,
                };
                tokens.push(token);
                if matches!(
                    token.kind,
                    TokenKind::Struct | TokenKind::Union | TokenKind::Enum
                ) {
                    if let Some(tag) = self.eat(TokenKind::Identifier) {
                        tokens.push(tag);
                    }
                }
                self.skip_trivia();
                if !self.peek_kind().is_type_keyword() {
                    break;
                }
            }
            // `static node_t x;` — a typedef'd name may follow modifiers,
            // but only when no core base type was seen yet.
            let has_core_base = tokens.iter().any(|t| {
                matches!(
                    t.kind,
                    TokenKind::Void
                        | TokenKind::CharKw
                        | TokenKind::Short
                        | TokenKind::Int
                        | TokenKind::Long
                        | TokenKind::FloatKw
                        | TokenKind::Double
                        | TokenKind::Struct
                        | TokenKind::Union
                        | TokenKind::Enum
                )
            });
            if !has_core_base {
                if let Some(t) = self.peek_ahead(0) {
                    if t.kind == TokenKind::Identifier && self.symbols.is_typedef(t.text) {
                        self.skip_trivia();
                        if let Some(name) = self.advance() {
                            tokens.push(name);
                        }
                    }
                }
            }
        } else if first.kind == TokenKind::Identifier
            && (self.symbols.is_typedef(first.text) || self.looks_like_ptr_declaration())
        {
            self.advance();
            tokens.push(first);
        } else {
            return Err(self.error_here(format!("expected type, found {first}")));
        }
        Ok(tokens)
    }

    /// A struct/union/enum definition at the top level ends with `;`, or
    /// with a declarator list declaring variables of the just-defined type:
    /// `struct { int x; } origin;`.  The latter becomes a [`NodeKind::VarDecl`]
    /// whose first child is the definition.
    pub(crate) fn finish_record_declaration(
        &mut self,
        record: AstNode<'t>,
    ) -> Result<AstNode<'t>, ParseError> {
        self.skip_trivia();
        if self.peek_kind() == TokenKind::Semicolon {
            self.advance();
            return Ok(record);
        }

        let mut declarators = Vec::new();
        loop {
            let declarator = self.parse_declarator()?;
            self.symbols.add(declarator.name.text, SymbolKind::Variable);
            declarators.push(declarator);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::Semicolon, "';' after declaration")?;

        let name = declarators[0].name;
        let mut node = AstNode::with_data(
            NodeKind::VarDecl,
            Some(name),
            NodeData::VarDecl(VarDeclData {
                base_type: Vec::new(),
                declarators,
            }),
        );
        node.children.push(record);
        Ok(node)
    }

    /// One declarator: stars and qualifiers, name, array dimensions, and an
    /// optional initializer.
    pub(crate) fn parse_declarator(&mut self) -> Result<Declarator<'t>, ParseError> {
        let mut stars = 0usize;
        let mut quals = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek_kind() {
                TokenKind::Star => {
                    self.advance();
                    stars += 1;
                }
                TokenKind::Const | TokenKind::Volatile => {
                    if let Some(t) = self.advance() {
                        quals.push(t);
                    }
                }
                _ => break,
            }
        }

        let name = self.expect(TokenKind::Identifier, "declarator name")?;

        let mut array_dims = Vec::new();
        self.skip_trivia();
        while self.peek_kind() == TokenKind::LBracket {
            loop {
                self.skip_trivia();
                let token = match self.peek() {
                    Some(t) if t.kind != TokenKind::Eof => t,
                    _ => return Err(self.error_here("unclosed array dimension")),
                };
                array_dims.push(token);
                self.advance();
                if token.kind == TokenKind::RBracket {
                    break;
                }
            }
            self.skip_trivia();
        }

        let init = if self.eat(TokenKind::Eq).is_some() {
            Some(self.parse_initializer()?)
        } else {
            None
        };

        Ok(Declarator {
            stars,
            quals,
            name,
            array_dims,
            init,
        })
    }

    /// An initializer: a brace list (recursively) or a plain expression.
    fn parse_initializer(&mut self) -> Result<AstNode<'t>, ParseError> {
        self.skip_trivia();
        if self.peek_kind() != TokenKind::LBrace {
            return self.parse_expression();
        }
        let lbrace = self.expect(TokenKind::LBrace, "'{'")?;
        let mut list = AstNode::new(NodeKind::InitList, Some(lbrace));
        loop {
            // A trailing comma or an empty list both land on '}' here.
            if self.eat(TokenKind::RBrace).is_some() {
                break;
            }
            list.children.push(self.parse_initializer()?);
            if self.eat(TokenKind::Comma).is_none() {
                self.expect(TokenKind::RBrace, "'}' to close initializer")?;
                break;
            }
        }
        Ok(list)
    }

    /// `ret (*name)(params)` — the parameter list is kept as a raw token
    /// run, not modeled further.
    pub(crate) fn parse_func_ptr(
        &mut self,
        return_type: Vec<&'t Token<'t>>,
    ) -> Result<AstNode<'t>, ParseError> {
        self.expect(TokenKind::LParen, "'(' in function pointer")?;
        self.expect(TokenKind::Star, "'*' in function pointer")?;
        let name = self.expect(TokenKind::Identifier, "function pointer name")?;
        self.expect(TokenKind::RParen, "')' after function pointer name")?;
        self.expect(TokenKind::LParen, "'(' before parameter list")?;

        let mut params = Vec::new();
        let mut depth = 1usize;
        loop {
            self.skip_trivia();
            let token = match self.peek() {
                Some(t) if t.kind != TokenKind::Eof => t,
                _ => return Err(self.error_here("unclosed function pointer parameter list")),
            };
            match token.kind {
                TokenKind::LParen => {
                    depth += 1;
                    params.push(token);
                    self.advance();
                }
                TokenKind::RParen => {
                    depth -= 1;
                    self.advance();
                    if depth == 0 {
                        break;
                    }
                    params.push(token);
                }
                _ => {
                    params.push(token);
                    self.advance();
                }
            }
        }

        Ok(AstNode::with_data(
            NodeKind::FuncPtr,
            Some(name),
            NodeData::FuncPtr(FuncPtrData {
                return_type,
                name,
                params,
            }),
        ))
    }

    /// `typedef` in all its forms.  The alias lands in the symbol table, the
    /// node's token is the alias name.
    pub(crate) fn parse_typedef(&mut self) -> Result<AstNode<'t>, ParseError> {
        self.expect(TokenKind::Typedef, "'typedef'")?;
        self.skip_trivia();

        // typedef struct [tag] { ... } alias;
        if matches!(
            self.peek_kind(),
            TokenKind::Struct | TokenKind::Union | TokenKind::Enum
        ) && (self.peek_ahead(1).map(|t| t.kind) == Some(TokenKind::LBrace)
            || self.peek_ahead(2).map(|t| t.kind) == Some(TokenKind::LBrace))
        {
            let inner = match self.peek_kind() {
                TokenKind::Struct => self.parse_record(NodeKind::Struct)?,
                TokenKind::Union => self.parse_record(NodeKind::Union)?,
                _ => self.parse_enum()?,
            };
            let alias = self.expect(TokenKind::Identifier, "typedef alias")?;
            self.expect(TokenKind::Semicolon, "';' after typedef")?;
            self.symbols.add(alias.text, SymbolKind::Typedef);
            let mut node = AstNode::with_data(
                NodeKind::Typedef,
                Some(alias),
                NodeData::Typedef(TypedefData {
                    base_type: Vec::new(),
                }),
            );
            node.children.push(inner);
            return Ok(node);
        }

        // Base type keyword run, tags and stars included.
        let mut base: Vec<&'t Token<'t>> = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek_kind() {
                kind if kind.is_type_keyword() => {
                    let token = match self.advance() {
                        Some(t) => t,
                        None => break,
                    };
                    base.push(token);
                    if matches!(
                        token.kind,
                        TokenKind::Struct | TokenKind::Union | TokenKind::Enum
                    ) {
                        if let Some(tag) = self.eat(TokenKind::Identifier) {
                            base.push(tag);
                        }
                    }
                }
                TokenKind::Star => {
                    if let Some(t) = self.advance() {
                        base.push(t);
                    }
                }
                _ => break,
            }
        }

        // typedef ret (*name)(params);
        self.skip_trivia();
        if self.peek_kind() == TokenKind::LParen
            && self.peek_ahead(1).map(|t| t.kind) == Some(TokenKind::Star)
        {
            let func_ptr = self.parse_func_ptr(base)?;
            self.expect(TokenKind::Semicolon, "';' after typedef")?;
            let alias = match &func_ptr.data {
                NodeData::FuncPtr(data) => data.name,
                _ => return Err(self.error_here("malformed function pointer typedef")),
            };
            self.symbols.add(alias.text, SymbolKind::Typedef);
            let mut node = AstNode::with_data(
                NodeKind::Typedef,
                Some(alias),
                NodeData::Typedef(TypedefData {
                    base_type: Vec::new(),
                }),
            );
            node.children.push(func_ptr);
            return Ok(node);
        }

        // Plain alias: the last identifier before ';' names the new type,
        // anything before it belongs to the base.
        let mut idents: Vec<&'t Token<'t>> = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek_kind() {
                TokenKind::Identifier => {
                    if let Some(t) = self.advance() {
                        idents.push(t);
                    }
                }
                TokenKind::Star => {
                    if let Some(t) = self.advance() {
                        base.push(t);
                    }
                }
                TokenKind::Semicolon => break,
                _ => return Err(self.error_here("unexpected token in typedef")),
            }
        }
        self.expect(TokenKind::Semicolon, "';' after typedef")?;
        let alias = match idents.pop() {
            Some(t) => t,
            None => return Err(self.error_here("typedef is missing an alias name")),
        };
        base.extend(idents);
        self.symbols.add(alias.text, SymbolKind::Typedef);
        Ok(AstNode::with_data(
            NodeKind::Typedef,
            Some(alias),
            NodeData::Typedef(TypedefData { base_type: base }),
        ))
    }

    /// Struct or union definition (or forward declaration).  Members parse
    /// as variable declarations with per-member recovery, so one bad member
    /// does not discard the whole definition.
    pub(crate) fn parse_record(&mut self, kind: NodeKind) -> Result<AstNode<'t>, ParseError> {
        let keyword = if kind == NodeKind::Struct {
            TokenKind::Struct
        } else {
            TokenKind::Union
        };
        self.expect(keyword, "record keyword")?;
        let tag = self.eat(TokenKind::Identifier);
        if let Some(tag) = tag {
            let symbol_kind = if kind == NodeKind::Struct {
                SymbolKind::Struct
            } else {
                SymbolKind::Union
            };
            self.symbols.add(tag.text, symbol_kind);
        }

        let mut node = AstNode::with_data(kind, tag, NodeData::Record { has_body: false });
        self.skip_trivia();
        if self.peek_kind() != TokenKind::LBrace {
            return Ok(node);
        }
        self.advance();
        node.data = NodeData::Record { has_body: true };

        loop {
            let blanks = self.skip_trivia();
            if matches!(self.peek_kind(), TokenKind::RBrace | TokenKind::Eof) {
                if let Some(dangling) = self.take_dangling_comments(blanks) {
                    node.children.push(dangling);
                }
                break;
            }
            let member_start = self.trivia_start;
            let comments = std::mem::take(&mut self.pending_comments);
            let mut member = match self.parse_var_declaration() {
                Ok(mut member) => {
                    self.prepend_comments(&mut member, comments);
                    self.collect_trailing_comments(&mut member);
                    member
                }
                Err(_) => {
                    self.bump_recoveries();
                    self.pending_comments.clear();
                    self.recover_statement(member_start)
                }
            };
            member.blank_line_before = blanks > 0;
            node.children.push(member);
        }
        self.expect(TokenKind::RBrace, "'}' to close definition")?;
        Ok(node)
    }

    /// Enum definition.  Enumerator values are kept as raw token runs; a
    /// malformed enumerator recovers to its own boundary.
    pub(crate) fn parse_enum(&mut self) -> Result<AstNode<'t>, ParseError> {
        self.expect(TokenKind::Enum, "'enum'")?;
        let tag = self.eat(TokenKind::Identifier);
        if let Some(tag) = tag {
            self.symbols.add(tag.text, SymbolKind::Enum);
        }

        let mut node = AstNode::with_data(NodeKind::Enum, tag, NodeData::Record { has_body: false });
        self.skip_trivia();
        if self.peek_kind() != TokenKind::LBrace {
            return Ok(node);
        }
        self.advance();
        node.data = NodeData::Record { has_body: true };

        loop {
            let blanks = self.skip_trivia();
            if matches!(self.peek_kind(), TokenKind::RBrace | TokenKind::Eof) {
                if let Some(dangling) = self.take_dangling_comments(blanks) {
                    node.children.push(dangling);
                }
                break;
            }
            let entry_start = self.trivia_start;
            let comments = std::mem::take(&mut self.pending_comments);
            let mut entry = match self.parse_enum_entry() {
                Ok(mut entry) => {
                    self.prepend_comments(&mut entry, comments);
                    self.collect_trailing_comments(&mut entry);
                    entry
                }
                Err(_) => {
                    self.bump_recoveries();
                    self.pending_comments.clear();
                    self.recover_enum_entry(entry_start)
                }
            };
            entry.blank_line_before = blanks > 0;
            node.children.push(entry);

            if self.eat(TokenKind::Comma).is_some() {
                // `RED, /* comment */` — hang it off the entry just parsed.
                if let Some(last) = node.children.last_mut() {
                    self.collect_trailing_comments(last);
                }
            }
        }
        self.expect(TokenKind::RBrace, "'}' to close enum")?;
        Ok(node)
    }

    fn parse_enum_entry(&mut self) -> Result<AstNode<'t>, ParseError> {
        let name = self.expect(TokenKind::Identifier, "enumerator name")?;
        self.symbols.add(name.text, SymbolKind::Variable);
        let mut value_tokens = Vec::new();
        if self.eat(TokenKind::Eq).is_some() {
            let mut paren = 0usize;
            loop {
                self.skip_trivia();
                let token = match self.peek() {
                    Some(t) if t.kind != TokenKind::Eof => t,
                    _ => return Err(self.error_here("unterminated enumerator value")),
                };
                match token.kind {
                    TokenKind::Comma | TokenKind::RBrace if paren == 0 => break,
                    TokenKind::LParen => {
                        paren += 1;
                        value_tokens.push(token);
                        self.advance();
                    }
                    TokenKind::RParen => {
                        paren = paren.saturating_sub(1);
                        value_tokens.push(token);
                        self.advance();
                    }
                    _ => {
                        value_tokens.push(token);
                        self.advance();
                    }
                }
            }
            if value_tokens.is_empty() {
                return Err(self.error_here("expected enumerator value after '='"));
            }
        }
        Ok(AstNode::with_data(
            NodeKind::EnumValue,
            Some(name),
            NodeData::EnumValue(value_tokens),
        ))
    }

    /// Attempts a function definition or prototype.  On a header mismatch
    /// the cursor rewinds so the caller can try a global declaration; a
    /// failure inside the body leaves the cursor for top-level recovery.
    pub(crate) fn parse_function(&mut self) -> Result<AstNode<'t>, ParseError> {
        let start = self.pos;
        let trivia_start = self.trivia_start;
        let last_line = self.last_token_line;
        let comment_mark = self.pending_comments.len();
        let header = self.parse_function_header();
        let (return_type, name, params, attrs) = match header {
            Ok(parts) => parts,
            Err(err) => {
                // The header attempt buffers comments while skipping trivia;
                // the retry must not see them a second time.
                self.pos = start;
                self.trivia_start = trivia_start;
                self.last_token_line = last_line;
                self.pending_comments.truncate(comment_mark);
                return Err(err);
            }
        };

        self.symbols.add(name.text, SymbolKind::Function);
        let mut node = AstNode::with_data(
            NodeKind::Function,
            Some(name),
            NodeData::Function(FunctionData {
                return_type,
                params,
                attrs,
            }),
        );

        if self.eat(TokenKind::Semicolon).is_some() {
            return Ok(node); // prototype
        }
        let body = self.parse_block()?;
        node.children.push(body);
        Ok(node)
    }

    #[allow(clippy::type_complexity)]
    fn parse_function_header(
        &mut self,
    ) -> Result<
        (
            Vec<&'t Token<'t>>,
            &'t Token<'t>,
            Vec<AstNode<'t>>,
            Vec<&'t Token<'t>>,
        ),
        ParseError,
    > {
        let mut return_type: Vec<&'t Token<'t>> = Vec::new();

        self.skip_trivia();
        while matches!(
            self.peek_kind(),
            TokenKind::Unsigned
                | TokenKind::Signed
                | TokenKind::Static
                | TokenKind::Extern
                | TokenKind::Const
        ) {
            if let Some(t) = self.advance() {
                return_type.push(t);
            }
            self.skip_trivia();
        }

        match self.peek_kind() {
            TokenKind::Void
            | TokenKind::CharKw
            | TokenKind::Short
            | TokenKind::Int
            | TokenKind::Long
            | TokenKind::FloatKw
            | TokenKind::Double
            | TokenKind::Identifier => {
                if let Some(t) = self.advance() {
                    return_type.push(t);
                }
            }
            TokenKind::Struct | TokenKind::Union | TokenKind::Enum => {
                if let Some(t) = self.advance() {
                    return_type.push(t);
                }
                if let Some(tag) = self.eat(TokenKind::Identifier) {
                    return_type.push(tag);
                }
            }
            _ => return Err(self.error_here("expected return type")),
        }
        if return_type.is_empty() {
            return Err(self.error_here("expected return type"));
        }

        // Multi-word bases: `long long`, `long int`, `long double`, ...
        loop {
            self.skip_trivia();
            if matches!(
                self.peek_kind(),
                TokenKind::Long
                    | TokenKind::Int
                    | TokenKind::Short
                    | TokenKind::Double
                    | TokenKind::CharKw
                    | TokenKind::FloatKw
            ) {
                if let Some(t) = self.advance() {
                    return_type.push(t);
                }
            } else {
                break;
            }
        }

        loop {
            self.skip_trivia();
            if self.peek_kind() == TokenKind::Star {
                if let Some(t) = self.advance() {
                    return_type.push(t);
                }
            } else {
                break;
            }
        }

        self.skip_trivia();
        let name = match self.peek() {
            Some(t) if t.kind == TokenKind::Identifier => {
                self.advance();
                t
            }
            _ => return Err(self.error_here("expected function name")),
        };

        self.skip_trivia();
        if self.peek_kind() != TokenKind::LParen {
            return Err(self.error_here("expected '(' after function name"));
        }
        self.advance();

        let mut params = Vec::new();
        self.skip_trivia();
        if self.peek_kind() != TokenKind::RParen {
            loop {
                params.push(self.parse_parameter()?);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')' after parameters")?;
        let attrs = self.collect_gnu_attributes();

        Ok((return_type, name, params, attrs))
    }

    /// One parameter.  The identifier directly before `,`, `)`, or `[` is
    /// the parameter name; everything else belongs to its type.
    fn parse_parameter(&mut self) -> Result<AstNode<'t>, ParseError> {
        self.skip_trivia();
        if self.peek_kind() == TokenKind::Ellipsis {
            let token = self.advance();
            return Ok(AstNode::with_data(
                NodeKind::Param,
                token,
                NodeData::Param(ParamData {
                    type_tokens: Vec::new(),
                    array_dims: Vec::new(),
                }),
            ));
        }

        let mut type_tokens = Vec::new();
        let mut array_dims = Vec::new();
        let mut name: Option<&'t Token<'t>> = None;
        let mut seen_bracket = false;
        loop {
            self.skip_trivia();
            let token = match self.peek() {
                Some(t) => t,
                None => break,
            };
            match token.kind {
                TokenKind::Comma | TokenKind::RParen | TokenKind::Eof => break,
                TokenKind::LBracket => {
                    seen_bracket = true;
                    array_dims.push(token);
                    self.advance();
                }
                _ if seen_bracket => {
                    array_dims.push(token);
                    self.advance();
                }
                TokenKind::Identifier => {
                    let next = self.peek_ahead(1).map(|t| t.kind);
                    if name.is_none()
                        && matches!(
                            next,
                            Some(TokenKind::Comma | TokenKind::RParen | TokenKind::LBracket)
                        )
                    {
                        name = Some(token);
                        self.advance();
                    } else {
                        type_tokens.push(token);
                        self.advance();
                    }
                }
                _ => {
                    type_tokens.push(token);
                    self.advance();
                }
            }
        }

        if type_tokens.is_empty() && name.is_none() {
            return Err(self.error_here("expected parameter"));
        }
        Ok(AstNode::with_data(
            NodeKind::Param,
            name,
            NodeData::Param(ParamData {
                type_tokens,
                array_dims,
            }),
        ))
    }

    /// Collects GNU `__attribute__((...))` annotations after a parameter
    /// list as a raw token run, to be re-emitted after the signature.
    fn collect_gnu_attributes(&mut self) -> Vec<&'t Token<'t>> {
        let mut attrs = Vec::new();
        loop {
            let is_attr = self
                .peek_ahead(0)
                .map(|t| t.kind == TokenKind::Identifier && t.text == "__attribute__")
                .unwrap_or(false);
            if !is_attr {
                return attrs;
            }
            self.skip_trivia();
            if let Some(t) = self.advance() {
                attrs.push(t);
            }
            self.skip_trivia();
            if self.peek_kind() != TokenKind::LParen {
                return attrs;
            }
            let mut depth = 0usize;
            loop {
                self.skip_trivia();
                let token = match self.peek() {
                    Some(t) if t.kind != TokenKind::Eof => t,
                    _ => return attrs,
                };
                match token.kind {
                    TokenKind::LParen => {
                        depth += 1;
                        attrs.push(token);
                        self.advance();
                    }
                    TokenKind::RParen => {
                        depth = depth.saturating_sub(1);
                        attrs.push(token);
                        self.advance();
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {
                        attrs.push(token);
                        self.advance();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::Lexer;

    fn parse(source: &str) -> AstNode<'static> {
        let source: &'static str = Box::leak(source.to_owned().into_boxed_str());
        let (tokens, _) = Lexer::new(source).tokenize();
        let tokens: &'static [Token<'static>] = Box::leak(tokens.into_boxed_slice());
        let mut parser = Parser::new(source, tokens);
        parser.parse()
    }

    fn var_data<'a>(node: &'a AstNode<'_>) -> &'a VarDeclData<'a> {
        match &node.data {
            NodeData::VarDecl(data) => data,
            other => panic!("expected var decl data, got {other:?}"),
        }
    }

    #[test]
    fn declarator_list_shares_base_type() {
        let program = parse("int x, *p, arr[4];\n");
        let data = var_data(&program.children[0]);
        assert_eq!(data.base_type.len(), 1);
        assert_eq!(data.declarators.len(), 3);
        assert_eq!(data.declarators[0].stars, 0);
        assert_eq!(data.declarators[1].stars, 1);
        assert_eq!(data.declarators[2].array_dims.len(), 3); // [ 4 ]
    }

    #[test]
    fn initializer_lists_nest() {
        let program = parse("int grid[2][2] = {{1, 2}, {3, 4}};\n");
        let data = var_data(&program.children[0]);
        let init = data.declarators[0].init.as_ref().expect("initializer");
        assert_eq!(init.kind, NodeKind::InitList);
        assert_eq!(init.children.len(), 2);
        assert_eq!(init.children[0].kind, NodeKind::InitList);
    }

    #[test]
    fn function_pointer_declaration() {
        let program = parse("int (*cmp)(const void *, const void *);\n");
        let node = &program.children[0];
        assert_eq!(node.kind, NodeKind::FuncPtr);
        match &node.data {
            NodeData::FuncPtr(data) => {
                assert_eq!(data.name.text, "cmp");
                assert_eq!(data.return_type[0].text, "int");
                assert!(!data.params.is_empty());
            }
            other => panic!("expected func ptr data, got {other:?}"),
        }
    }

    #[test]
    fn typedef_inline_struct_registers_alias() {
        let program = parse("typedef struct node\n{\n\tint value;\n} node_t;\nnode_t *head;\n");
        let typedef = &program.children[0];
        assert_eq!(typedef.kind, NodeKind::Typedef);
        assert_eq!(typedef.token_text(), "node_t");
        assert_eq!(typedef.children[0].kind, NodeKind::Struct);
        // The alias must make the following declaration parse as one.
        assert_eq!(program.children[1].kind, NodeKind::VarDecl);
    }

    #[test]
    fn typedef_function_pointer() {
        let program = parse("typedef void (*callback_t)(int, void *);\ncallback_t on_event;\n");
        let typedef = &program.children[0];
        assert_eq!(typedef.token_text(), "callback_t");
        assert_eq!(typedef.children[0].kind, NodeKind::FuncPtr);
        assert_eq!(program.children[1].kind, NodeKind::VarDecl);
    }

    #[test]
    fn struct_member_recovery_is_local() {
        let program = parse("struct bag\n{\n\tint ok;\n\tint bad bad bad\n\tint also_ok;\n};\n");
        let record = &program.children[0];
        assert_eq!(record.kind, NodeKind::Struct);
        assert_eq!(record.children.len(), 3);
        assert_eq!(record.children[0].kind, NodeKind::VarDecl);
        assert_eq!(record.children[1].kind, NodeKind::Unparsed);
        assert_eq!(record.children[2].kind, NodeKind::VarDecl);
    }

    #[test]
    fn enum_values_keep_token_runs() {
        let program = parse("enum flags\n{\n\tF_NONE = 0,\n\tF_ALL = (1 << 4) - 1,\n\tF_LAST\n};\n");
        let record = &program.children[0];
        assert_eq!(record.kind, NodeKind::Enum);
        assert_eq!(record.children.len(), 3);
        match &record.children[1].data {
            NodeData::EnumValue(tokens) => {
                let text: Vec<&str> = tokens.iter().map(|t| t.text).collect();
                assert_eq!(text, vec!["(", "1", "<<", "4", ")", "-", "1"]);
            }
            other => panic!("expected enum value data, got {other:?}"),
        }
        match &record.children[2].data {
            NodeData::EnumValue(tokens) => assert!(tokens.is_empty()),
            other => panic!("expected enum value data, got {other:?}"),
        }
    }

    #[test]
    fn prototype_has_no_body() {
        let program = parse("char *strdup_safe(const char *s);\n");
        let func = &program.children[0];
        assert_eq!(func.kind, NodeKind::Function);
        assert!(func.children.is_empty());
        match &func.data {
            NodeData::Function(data) => {
                assert_eq!(data.return_type.last().unwrap().kind, TokenKind::Star);
                assert_eq!(data.params.len(), 1);
            }
            other => panic!("expected function data, got {other:?}"),
        }
    }

    #[test]
    fn gnu_attribute_after_params_is_captured() {
        let program = parse("void fail(const char *msg) __attribute__((noreturn));\n");
        let func = &program.children[0];
        assert_eq!(func.kind, NodeKind::Function);
        match &func.data {
            NodeData::Function(data) => {
                assert_eq!(data.attrs.first().map(|t| t.text), Some("__attribute__"));
                assert!(data.attrs.iter().any(|t| t.text == "noreturn"));
            }
            other => panic!("expected function data, got {other:?}"),
        }
    }

    #[test]
    fn comment_before_record_close_stays_in_definition() {
        let program = parse("struct s\n{\n\tint a;\n\t/* end */\n};\nint y;\n");
        let record = &program.children[0];
        assert_eq!(record.kind, NodeKind::Struct);
        assert_eq!(record.children.len(), 2);
        let tail = &record.children[1];
        assert_eq!(tail.kind, NodeKind::Comment);
        assert_eq!(tail.leading_comments[0].text, "/* end */");
        assert!(program.children[1].leading_comments.is_empty());
    }

    #[test]
    fn struct_forward_declaration() {
        let program = parse("struct opaque;\n");
        let node = &program.children[0];
        assert_eq!(node.kind, NodeKind::Struct);
        assert!(matches!(node.data, NodeData::Record { has_body: false }));
    }
}
