//! Statement parsing implementation
//!
//! This module handles parsing of all C statement forms the formatter
//! models:
//!
//! - Declarations: `int x = 42;`, `node_t *p, *q;`
//! - Control flow: `if`, `while`, `for`, `do-while`, `switch`
//! - Jump statements: `return`, `break`, `continue`
//! - Compound statements: `{ ... }`
//! - Expression statements: function calls, assignments
//!
//! Anything else (`goto`, labels, inline asm, …) fails its production and is
//! preserved verbatim by statement-level recovery — [`Parser::parse_statement`]
//! itself is total.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the
//! [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::parse::{ParseError, Parser};
use crate::parser::token::TokenKind;

impl<'t> Parser<'t> {
    /// Parses one statement, falling back to verbatim recovery on failure.
    /// The caller must have just called `skip_trivia` and passes its blank
    /// count through.
    pub(crate) fn parse_statement(&mut self, blanks: usize) -> AstNode<'t> {
        let stmt_start = self.trivia_start;
        let comments = std::mem::take(&mut self.pending_comments);
        let mut node = match self.parse_statement_inner() {
            Ok(mut node) => {
                self.prepend_comments(&mut node, comments);
                // Comments buffered mid-statement belong to this node, not
                // the next one.
                let mut mid = std::mem::take(&mut self.pending_comments);
                node.leading_comments.append(&mut mid);
                self.collect_trailing_comments(&mut node);
                node
            }
            Err(_) => {
                self.bump_recoveries();
                // The raw slice starts before the buffered comments.
                self.pending_comments.clear();
                self.recover_statement(stmt_start)
            }
        };
        node.blank_line_before = blanks > 0;
        node
    }

    fn parse_statement_inner(&mut self) -> Result<AstNode<'t>, ParseError> {
        match self.peek_kind() {
            TokenKind::Preprocessor => {
                let token = self.advance();
                Ok(AstNode::new(NodeKind::Preprocessor, token))
            }
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Do => self.parse_do_while(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Break => self.parse_jump(TokenKind::Break, NodeKind::Break),
            TokenKind::Continue => self.parse_jump(TokenKind::Continue, NodeKind::Continue),
            TokenKind::LBrace => self.parse_block(),
            TokenKind::Typedef => self.parse_typedef(),
            _ if self.is_declaration_start() => self.parse_var_declaration(),
            _ => {
                let expr = self.parse_expression()?;
                self.expect(TokenKind::Semicolon, "';' after expression")?;
                let mut node = AstNode::new(NodeKind::ExprStmt, None);
                node.children.push(expr);
                Ok(node)
            }
        }
    }

    /// Parses a braced block, opening a fresh symbol scope for its body.
    pub(crate) fn parse_block(&mut self) -> Result<AstNode<'t>, ParseError> {
        let lbrace = self.expect(TokenKind::LBrace, "'{' to open block")?;
        self.enter_scope();
        let mut block = AstNode::new(NodeKind::Block, Some(lbrace));
        loop {
            let blanks = self.skip_trivia();
            if matches!(self.peek_kind(), TokenKind::RBrace | TokenKind::Eof) {
                if let Some(dangling) = self.take_dangling_comments(blanks) {
                    block.children.push(dangling);
                }
                break;
            }
            block.children.push(self.parse_statement(blanks));
        }
        self.exit_scope();
        self.expect(TokenKind::RBrace, "'}' to close block")?;
        Ok(block)
    }

    fn parse_return(&mut self) -> Result<AstNode<'t>, ParseError> {
        let kw = self.expect(TokenKind::Return, "'return'")?;
        let mut node = AstNode::new(NodeKind::Return, Some(kw));
        self.skip_trivia();
        if self.peek_kind() != TokenKind::Semicolon {
            node.children.push(self.parse_expression()?);
        }
        self.expect(TokenKind::Semicolon, "';' after return")?;
        Ok(node)
    }

    fn parse_jump(&mut self, kw: TokenKind, kind: NodeKind) -> Result<AstNode<'t>, ParseError> {
        let token = self.expect(kw, "jump keyword")?;
        self.expect(TokenKind::Semicolon, "';' after jump statement")?;
        Ok(AstNode::new(kind, Some(token)))
    }

    fn parse_if(&mut self) -> Result<AstNode<'t>, ParseError> {
        let kw = self.expect(TokenKind::If, "'if'")?;
        self.expect(TokenKind::LParen, "'(' after 'if'")?;
        let cond = self.parse_expression()?;
        self.expect(TokenKind::RParen, "')' after condition")?;

        let mut node = AstNode::new(NodeKind::If, Some(kw));
        node.children.push(cond);
        node.children.push(self.parse_branch()?);

        if self.peek_ahead(0).map(|t| t.kind) == Some(TokenKind::Else) {
            self.expect(TokenKind::Else, "'else'")?;
            node.children.push(self.parse_branch()?);
        }
        Ok(node)
    }

    /// Parses the body of a control-flow statement: either a block or a
    /// single statement.  Recovery inside the branch stays local to it.
    fn parse_branch(&mut self) -> Result<AstNode<'t>, ParseError> {
        self.skip_trivia();
        Ok(self.parse_statement(0))
    }

    fn parse_while(&mut self) -> Result<AstNode<'t>, ParseError> {
        let kw = self.expect(TokenKind::While, "'while'")?;
        self.expect(TokenKind::LParen, "'(' after 'while'")?;
        let cond = self.parse_expression()?;
        self.expect(TokenKind::RParen, "')' after condition")?;

        let mut node = AstNode::new(NodeKind::While, Some(kw));
        node.children.push(cond);
        node.children.push(self.parse_branch()?);
        Ok(node)
    }

    fn parse_do_while(&mut self) -> Result<AstNode<'t>, ParseError> {
        let kw = self.expect(TokenKind::Do, "'do'")?;
        let body = self.parse_branch()?;
        self.expect(TokenKind::While, "'while' after do body")?;
        self.expect(TokenKind::LParen, "'(' after 'while'")?;
        let cond = self.parse_expression()?;
        self.expect(TokenKind::RParen, "')' after condition")?;
        self.expect(TokenKind::Semicolon, "';' after do-while")?;

        let mut node = AstNode::new(NodeKind::DoWhile, Some(kw));
        node.children.push(body);
        node.children.push(cond);
        Ok(node)
    }

    fn parse_for(&mut self) -> Result<AstNode<'t>, ParseError> {
        let kw = self.expect(TokenKind::For, "'for'")?;
        self.expect(TokenKind::LParen, "'(' after 'for'")?;

        let mut init = Vec::new();
        self.skip_trivia();
        if self.peek_kind() == TokenKind::Semicolon {
            self.advance();
        } else if self.is_declaration_start() {
            // The declaration consumes its own ';'.
            init.push(self.parse_var_declaration()?);
        } else {
            init.push(self.parse_expression()?);
            while self.eat(TokenKind::Comma).is_some() {
                init.push(self.parse_expression()?);
            }
            self.expect(TokenKind::Semicolon, "';' after for-init")?;
        }

        self.skip_trivia();
        let cond = if self.peek_kind() == TokenKind::Semicolon {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect(TokenKind::Semicolon, "';' after for-condition")?;

        let mut step = Vec::new();
        self.skip_trivia();
        if self.peek_kind() != TokenKind::RParen {
            step.push(self.parse_expression()?);
            while self.eat(TokenKind::Comma).is_some() {
                step.push(self.parse_expression()?);
            }
        }
        self.expect(TokenKind::RParen, "')' after for-header")?;

        let mut node = AstNode::with_data(
            NodeKind::For,
            Some(kw),
            NodeData::For(ForData { init, cond, step }),
        );
        node.children.push(self.parse_branch()?);
        Ok(node)
    }

    fn parse_switch(&mut self) -> Result<AstNode<'t>, ParseError> {
        let kw = self.expect(TokenKind::Switch, "'switch'")?;
        self.expect(TokenKind::LParen, "'(' after 'switch'")?;
        let scrutinee = self.parse_expression()?;
        self.expect(TokenKind::RParen, "')' after switch expression")?;
        self.expect(TokenKind::LBrace, "'{' to open switch body")?;

        let mut node = AstNode::new(NodeKind::Switch, Some(kw));
        node.children.push(scrutinee);

        loop {
            self.skip_trivia();
            match self.peek_kind() {
                TokenKind::RBrace | TokenKind::Eof => break,
                TokenKind::Case => {
                    let comments = std::mem::take(&mut self.pending_comments);
                    let case_kw = self.expect(TokenKind::Case, "'case'")?;
                    let value = self.parse_expression()?;
                    self.expect(TokenKind::Colon, "':' after case value")?;
                    let mut case = AstNode::new(NodeKind::Case, Some(case_kw));
                    case.leading_comments = comments;
                    case.children.push(value);
                    self.parse_case_body(&mut case);
                    node.children.push(case);
                }
                TokenKind::Default => {
                    let comments = std::mem::take(&mut self.pending_comments);
                    let default_kw = self.expect(TokenKind::Default, "'default'")?;
                    self.expect(TokenKind::Colon, "':' after 'default'")?;
                    let mut case = AstNode::new(NodeKind::Case, Some(default_kw));
                    case.leading_comments = comments;
                    self.parse_case_body(&mut case);
                    node.children.push(case);
                }
                _ => {
                    return Err(self.error_here("expected 'case', 'default', or '}' in switch"));
                }
            }
        }
        self.expect(TokenKind::RBrace, "'}' to close switch body")?;
        Ok(node)
    }

    /// Statements under a case label, up to the next label or the switch's
    /// closing brace.
    fn parse_case_body(&mut self, case: &mut AstNode<'t>) {
        loop {
            let blanks = self.skip_trivia();
            match self.peek_kind() {
                // Comments before the next label stay pending and lead it.
                TokenKind::Case | TokenKind::Default => break,
                TokenKind::RBrace | TokenKind::Eof => {
                    if let Some(dangling) = self.take_dangling_comments(blanks) {
                        case.children.push(dangling);
                    }
                    break;
                }
                _ => {}
            }
            case.children.push(self.parse_statement(blanks));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::Lexer;
    use crate::parser::token::Token;

    fn parse_body(source: &str) -> AstNode<'static> {
        let wrapped: &'static str =
            Box::leak(format!("void f(void)\n{{\n{source}\n}}\n").into_boxed_str());
        let (tokens, _) = Lexer::new(wrapped).tokenize();
        let tokens: &'static [Token<'static>] = Box::leak(tokens.into_boxed_slice());
        let mut parser = Parser::new(wrapped, tokens);
        let program = parser.parse();
        let func = program.children.into_iter().next().expect("function");
        func.children.into_iter().next().expect("body")
    }

    #[test]
    fn if_else_chain() {
        let block = parse_body("if (a)\n\tx = 1;\nelse if (b)\n\tx = 2;\nelse\n\tx = 3;");
        let stmt = &block.children[0];
        assert_eq!(stmt.kind, NodeKind::If);
        assert_eq!(stmt.children.len(), 3);
        let else_branch = &stmt.children[2];
        assert_eq!(else_branch.kind, NodeKind::If);
        assert_eq!(else_branch.children.len(), 3);
    }

    #[test]
    fn do_while_shape() {
        let block = parse_body("do {\n\ti++;\n} while (i < 10);");
        let stmt = &block.children[0];
        assert_eq!(stmt.kind, NodeKind::DoWhile);
        assert_eq!(stmt.children[0].kind, NodeKind::Block);
        assert_eq!(stmt.children[1].kind, NodeKind::Binary);
    }

    #[test]
    fn for_with_comma_lists() {
        let block = parse_body("for (i = 0, j = n; i < j; i++, j--)\n\tswap(i, j);");
        let stmt = &block.children[0];
        assert_eq!(stmt.kind, NodeKind::For);
        match &stmt.data {
            NodeData::For(data) => {
                assert_eq!(data.init.len(), 2);
                assert!(data.cond.is_some());
                assert_eq!(data.step.len(), 2);
            }
            other => panic!("expected for data, got {other:?}"),
        }
    }

    #[test]
    fn for_with_declaration_init() {
        let block = parse_body("for (int i = 0; i < n; i++)\n\tuse(i);");
        match &block.children[0].data {
            NodeData::For(data) => assert_eq!(data.init[0].kind, NodeKind::VarDecl),
            other => panic!("expected for data, got {other:?}"),
        }
    }

    #[test]
    fn switch_cases_and_default() {
        let block = parse_body(
            "switch (c)\n{\ncase 'a':\n\tx = 1;\n\tbreak;\ndefault:\n\tx = 0;\n\tbreak;\n}",
        );
        let stmt = &block.children[0];
        assert_eq!(stmt.kind, NodeKind::Switch);
        // scrutinee + two cases
        assert_eq!(stmt.children.len(), 3);
        let case = &stmt.children[1];
        assert_eq!(case.token_kind(), Some(TokenKind::Case));
        assert_eq!(case.children.len(), 3); // value + 2 statements
        let default = &stmt.children[2];
        assert_eq!(default.token_kind(), Some(TokenKind::Default));
        assert_eq!(default.children.len(), 2);
    }

    #[test]
    fn failed_statement_recovers_without_poisoning_block() {
        let block = parse_body("x = 1;\n$$$ nonsense here\ny = 2;");
        assert_eq!(block.children.len(), 3);
        assert_eq!(block.children[0].kind, NodeKind::ExprStmt);
        assert_eq!(block.children[1].kind, NodeKind::Unparsed);
        assert_eq!(block.children[2].kind, NodeKind::ExprStmt);
    }

    #[test]
    fn comment_before_closing_brace_stays_in_block() {
        let block = parse_body("x = 1;\n/* last */");
        assert_eq!(block.children.len(), 2);
        assert_eq!(block.children[0].kind, NodeKind::ExprStmt);
        let tail = &block.children[1];
        assert_eq!(tail.kind, NodeKind::Comment);
        assert_eq!(tail.leading_comments.len(), 1);
        assert_eq!(tail.leading_comments[0].text, "/* last */");
    }

    #[test]
    fn return_with_and_without_value() {
        let block = parse_body("if (err)\n\treturn;\nreturn err;");
        let ret = &block.children[1];
        assert_eq!(ret.kind, NodeKind::Return);
        assert_eq!(ret.children.len(), 1);
    }
}
