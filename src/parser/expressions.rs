//! Expression parsing implementation
//!
//! This module handles parsing of C expressions using precedence climbing
//! for binary operators and recursive descent for other expression forms.
//!
//! # Supported Expressions
//!
//! - Literals: integers, floats, characters, strings
//! - Identifiers and variables
//! - Binary operators: arithmetic, comparison, logical, bitwise, shifts,
//!   assignments (simple and compound)
//! - Unary operators: `!`, `~`, `+`, `-`, `*`, `&`, `++`, `--`
//! - Postfix: `[]`, `.`, `->`, `()`, `++`, `--`
//! - Ternary: `? :`
//! - Type casts: `(type)expr`, disambiguated through the symbol table
//! - `sizeof` with both type and expression operands
//! - Bare type names in argument position (`va_arg(ap, int)` and friends)
//!
//! # Precedence
//!
//! Binary operators follow C precedence rules via
//! [`TokenKind::precedence`]: assignment binds loosest (right-associative),
//! multiplicative binds tightest.  The ternary operator is spliced into the
//! climbing loop itself; its else branch re-enters at the loop's current
//! minimum precedence, which makes chained `?:` right-associative.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the
//! [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::parse::{ParseError, Parser};
use crate::parser::token::{Token, TokenKind};

impl<'t> Parser<'t> {
    /// Parse expression (top-level entry point).
    pub(crate) fn parse_expression(&mut self) -> Result<AstNode<'t>, ParseError> {
        self.parse_expression_precedence(0)
    }

    fn parse_expression_precedence(&mut self, min_precedence: u8) -> Result<AstNode<'t>, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            self.skip_trivia();
            let op = match self.peek() {
                Some(t) => t,
                None => break,
            };

            // `?:` binds looser than every binary operator except assignment,
            // so it only engages when the context accepts that level.
            if op.kind == TokenKind::Question && min_precedence <= 1 {
                self.advance();
                let then_branch = self.parse_expression()?;
                self.expect(TokenKind::Colon, "':' in conditional expression")?;
                let else_branch = self.parse_expression_precedence(min_precedence)?;
                let mut node = AstNode::new(NodeKind::Ternary, Some(op));
                node.children = vec![left, then_branch, else_branch];
                left = node;
                continue;
            }

            let prec = op.kind.precedence();
            if prec == 0 || prec < min_precedence {
                break;
            }
            self.advance();
            // Right-associativity for assignments: re-enter at the same
            // precedence instead of one above it.
            let next_min = if op.kind.is_assignment() { prec } else { prec + 1 };
            let right = self.parse_expression_precedence(next_min)?;
            let mut node = AstNode::new(NodeKind::Binary, Some(op));
            node.children = vec![left, right];
            left = node;
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<AstNode<'t>, ParseError> {
        self.skip_trivia();
        let token = match self.peek() {
            Some(t) => t,
            None => return Err(self.error_here("expected expression")),
        };
        match token.kind {
            TokenKind::Sizeof => self.parse_sizeof(),
            kind if kind.is_unary_op() => {
                self.advance();
                let operand = self.parse_unary()?;
                let mut node = AstNode::with_data(
                    NodeKind::Unary,
                    Some(token),
                    NodeData::Unary { postfix: false },
                );
                node.children.push(operand);
                Ok(node)
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_sizeof(&mut self) -> Result<AstNode<'t>, ParseError> {
        let kw = self.expect(TokenKind::Sizeof, "'sizeof'")?;
        self.skip_trivia();
        if self.peek_kind() == TokenKind::LParen {
            if self.paren_group_is_type() {
                self.advance();
                let type_tokens = self.collect_type_in_parens()?;
                return Ok(AstNode::with_data(
                    NodeKind::Sizeof,
                    Some(kw),
                    NodeData::TypeName(type_tokens),
                ));
            }
            self.advance();
            let expr = self.parse_expression()?;
            self.expect(TokenKind::RParen, "')' after sizeof operand")?;
            let mut node = AstNode::new(NodeKind::Sizeof, Some(kw));
            node.children.push(expr);
            Ok(node)
        } else {
            let operand = self.parse_unary()?;
            let mut node = AstNode::new(NodeKind::Sizeof, Some(kw));
            node.children.push(operand);
            Ok(node)
        }
    }

    fn parse_postfix(&mut self) -> Result<AstNode<'t>, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            self.skip_trivia();
            let token = match self.peek() {
                Some(t) => t,
                None => break,
            };
            match token.kind {
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::RBracket, "']' after index")?;
                    let mut node = AstNode::new(NodeKind::ArrayAccess, None);
                    node.children = vec![expr, index];
                    expr = node;
                }
                TokenKind::LParen => {
                    self.advance();
                    expr = self.parse_call(expr)?;
                }
                TokenKind::Dot | TokenKind::Arrow => {
                    self.advance();
                    let name = self.expect(TokenKind::Identifier, "member name")?;
                    let mut node = AstNode::with_data(
                        NodeKind::MemberAccess,
                        Some(name),
                        NodeData::Member {
                            arrow: token.kind == TokenKind::Arrow,
                        },
                    );
                    node.children.push(expr);
                    expr = node;
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    self.advance();
                    let mut node = AstNode::with_data(
                        NodeKind::Unary,
                        Some(token),
                        NodeData::Unary { postfix: true },
                    );
                    node.children.push(expr);
                    expr = node;
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// Parses a call's argument list; the opening `(` is already consumed.
    /// An argument that fails to parse is captured verbatim instead of
    /// dropped, so macro-heavy calls survive formatting.
    fn parse_call(&mut self, callee: AstNode<'t>) -> Result<AstNode<'t>, ParseError> {
        let mut node = AstNode::new(NodeKind::Call, callee.token);
        node.children.push(callee);
        self.skip_trivia();
        if self.peek_kind() != TokenKind::RParen {
            loop {
                self.skip_trivia();
                let arg_start = self.pos;
                match self.parse_expression() {
                    Ok(arg) => node.children.push(arg),
                    Err(_) => {
                        self.bump_recoveries();
                        self.skip_to_argument_boundary()?;
                        node.children.push(self.make_unparsed(arg_start, self.pos));
                    }
                }
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')' after arguments")?;
        Ok(node)
    }

    /// Consumes tokens up to the next depth-0 `,` or `)` after a failed
    /// argument parse.
    fn skip_to_argument_boundary(&mut self) -> Result<(), ParseError> {
        let mut depth = 0usize;
        loop {
            let token = match self.peek() {
                Some(t) if t.kind != TokenKind::Eof => t,
                _ => return Err(self.error_here("unclosed argument list")),
            };
            match token.kind {
                TokenKind::Comma | TokenKind::RParen if depth == 0 => return Ok(()),
                TokenKind::LParen => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::RParen => {
                    depth -= 1;
                    self.advance();
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn parse_primary(&mut self) -> Result<AstNode<'t>, ParseError> {
        self.skip_trivia();
        let token = match self.peek() {
            Some(t) => t,
            None => return Err(self.error_here("expected expression")),
        };
        match token.kind {
            TokenKind::Integer | TokenKind::Float | TokenKind::String | TokenKind::CharLit => {
                self.advance();
                Ok(AstNode::new(NodeKind::Literal, Some(token)))
            }
            TokenKind::Identifier => {
                self.advance();
                Ok(AstNode::new(NodeKind::Identifier, Some(token)))
            }
            kind if kind.is_type_keyword() => self.parse_type_expr(),
            TokenKind::LParen => {
                if self.paren_group_is_type() {
                    self.advance();
                    let type_tokens = self.collect_type_in_parens()?;
                    let operand = self.parse_unary()?;
                    let mut node =
                        AstNode::with_data(NodeKind::Cast, None, NodeData::TypeName(type_tokens));
                    node.children.push(operand);
                    Ok(node)
                } else {
                    self.advance();
                    let expr = self.parse_expression()?;
                    self.expect(TokenKind::RParen, "')' after expression")?;
                    // Grouping parens are dropped; the formatter re-derives
                    // them from operator precedence.
                    Ok(expr)
                }
            }
            _ => Err(self.error_here(format!("unexpected token {token}"))),
        }
    }

    /// A bare type name in expression position, e.g. the second argument of
    /// `va_arg(ap, int)`.  Collects the token run up to the enclosing `,`,
    /// `)`, or `;`.
    fn parse_type_expr(&mut self) -> Result<AstNode<'t>, ParseError> {
        let first = self.peek();
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let token = match self.peek() {
                Some(t) => t,
                None => break,
            };
            match token.kind {
                TokenKind::Comma | TokenKind::RParen | TokenKind::Semicolon | TokenKind::Eof => {
                    break
                }
                _ => {
                    tokens.push(token);
                    self.advance();
                }
            }
        }
        if tokens.is_empty() {
            return Err(self.error_here("expected type name"));
        }
        Ok(AstNode::with_data(
            NodeKind::TypeExpr,
            first,
            NodeData::TypeName(tokens),
        ))
    }

    /// Lookahead from an opening `(`: true when everything up to the
    /// matching `)` reads as a type name.  Identifiers must be known
    /// typedefs unless they follow `struct`/`enum`/`union`.
    pub(crate) fn paren_group_is_type(&self) -> bool {
        let mut i = self.pos + 1;
        let mut after_tag_keyword = false;
        let mut saw_content = false;
        while let Some(token) = self.tokens.get(i) {
            match token.kind {
                TokenKind::RParen => return saw_content,
                TokenKind::Eof => return false,
                kind if kind.is_trivia() => {}
                TokenKind::Identifier => {
                    if !after_tag_keyword && !self.symbols.is_typedef(token.text) {
                        return false;
                    }
                    after_tag_keyword = false;
                    saw_content = true;
                }
                kind if kind.allowed_in_type() => {
                    after_tag_keyword = matches!(
                        kind,
                        TokenKind::Struct | TokenKind::Enum | TokenKind::Union
                    );
                    saw_content = true;
                }
                _ => return false,
            }
            i += 1;
        }
        false
    }

    /// Collects the significant tokens of a parenthesized type; the opening
    /// `(` is already consumed, and the closing `)` is consumed here.
    pub(crate) fn collect_type_in_parens(&mut self) -> Result<Vec<&'t Token<'t>>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                Some(t) if t.kind == TokenKind::RParen => {
                    self.advance();
                    return Ok(tokens);
                }
                Some(t) if t.kind != TokenKind::Eof => {
                    tokens.push(t);
                    self.advance();
                }
                _ => return Err(self.error_here("unclosed type name")),
            }
        }
    }
}
