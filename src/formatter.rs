//! Betty-style output emission
//!
//! Walks the layout-aware AST and re-emits canonical text:
//!
//! - Tab indentation, one level per block depth
//! - Opening braces on their own line, except after `do`
//! - `return (value);` with the value always parenthesized
//! - Single spaces around binary operators, `, ` between list items
//! - Pointer stars attach to the declared name, not the type
//! - `//` comments rewritten to `/* ... */` form
//! - Blank-line runs collapse to one; blank separation between top-level
//!   groups of different kinds
//!
//! The formatter makes no semantic decisions: output is a pure function of
//! the tree.  `Unparsed` nodes re-emit their captured source slice verbatim,
//! and grouping parentheses are re-derived from tree shape so the emitted
//! expression re-parses to the same tree.

use crate::parser::ast::{AstNode, Declarator, NodeData, NodeKind, ParamData};
use crate::parser::token::{Token, TokenKind};

/// Precedence assigned to prefix unary operators, casts, and `sizeof`.
const PREC_UNARY: u8 = 12;
/// Precedence assigned to postfix chains (calls, indexing, member access).
const PREC_POSTFIX: u8 = 13;

/// Formats a parsed translation unit.  The entry point for the pipeline.
pub fn format_program(program: &AstNode) -> String {
    let mut f = Formatter::new();
    f.emit_program(program);
    f.out
}

struct Formatter {
    out: String,
    indent: usize,
}

impl Formatter {
    fn new() -> Self {
        Formatter {
            out: String::new(),
            indent: 0,
        }
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push('\t');
        }
    }

    // ===== Top level =====

    fn emit_program(&mut self, program: &AstNode) {
        let mut prev_group: Option<u8> = None;
        for node in &program.children {
            let group = top_level_group(node);
            if let Some(prev) = prev_group {
                let forced = node.kind == NodeKind::Function
                    || is_bodied_type(node)
                    || prev == top_level_group_id(NodeKind::Function);
                if node.blank_line_before || prev != group || forced {
                    self.out.push('\n');
                }
            }
            self.emit_leading_comments(node);
            self.emit_top_level(node);
            prev_group = Some(group);
        }
        for comment in &program.trailing_comments {
            self.write_indent();
            self.out.push_str(&convert_comment(comment.text));
            self.out.push('\n');
        }
    }

    fn emit_top_level(&mut self, node: &AstNode) {
        match node.kind {
            NodeKind::Preprocessor => {
                self.out.push_str(node.token_text());
                self.emit_trailing_comments(node);
                self.out.push('\n');
            }
            NodeKind::Function => self.emit_function(node),
            NodeKind::Typedef => self.emit_typedef(node),
            NodeKind::Struct | NodeKind::Union | NodeKind::Enum => {
                self.emit_type_definition(node);
                self.out.push(';');
                self.emit_trailing_comments(node);
                self.out.push('\n');
            }
            NodeKind::VarDecl | NodeKind::FuncPtr => {
                self.write_indent();
                // `struct { ... } name;` carries its definition as a child.
                if let Some(record) = node.children.first() {
                    self.emit_type_definition_inline(record);
                    self.out.push(' ');
                }
                let text = self.declaration_text(node);
                self.out.push_str(&text);
                self.out.push(';');
                self.emit_trailing_comments(node);
                self.out.push('\n');
            }
            NodeKind::Unparsed => self.emit_unparsed(node),
            _ => self.emit_statement_body(node),
        }
    }

    // ===== Functions =====

    fn emit_function(&mut self, node: &AstNode) {
        let data = match &node.data {
            NodeData::Function(data) => data,
            _ => return,
        };

        // Trailing stars in the return type attach to the function name.
        let stars = data
            .return_type
            .iter()
            .rev()
            .take_while(|t| t.kind == TokenKind::Star)
            .count();
        let base = &data.return_type[..data.return_type.len() - stars];
        self.out.push_str(&join_tokens(base));
        self.out.push(' ');
        for _ in 0..stars {
            self.out.push('*');
        }
        self.out.push_str(node.token_text());
        self.out.push('(');
        if data.params.is_empty() {
            self.out.push_str("void");
        } else {
            let params: Vec<String> = data.params.iter().map(param_text).collect();
            self.out.push_str(&params.join(", "));
        }
        self.out.push(')');
        if let Some(first) = data.attrs.first() {
            self.out.push(' ');
            self.out.push_str(first.text);
            self.out.push_str(&join_tokens(&data.attrs[1..]));
        }

        match node.children.first() {
            Some(body) => {
                self.out.push('\n');
                self.emit_block(body);
                // Trailing comments were collected after the closing brace.
                if !node.trailing_comments.is_empty() {
                    self.out.pop();
                    self.emit_trailing_comments(node);
                    self.out.push('\n');
                }
            }
            None => {
                self.out.push(';');
                self.emit_trailing_comments(node);
                self.out.push('\n');
            }
        }
    }

    // ===== Statements =====

    fn emit_block(&mut self, block: &AstNode) {
        self.write_indent();
        self.out.push_str("{\n");
        self.indent += 1;
        for stmt in &block.children {
            if stmt.blank_line_before {
                self.out.push('\n');
            }
            self.emit_leading_comments(stmt);
            self.emit_statement_body(stmt);
        }
        self.indent -= 1;
        self.write_indent();
        self.out.push_str("}\n");
    }

    /// Emits one statement at the current indent.  Leading comments and the
    /// blank-line flag are the caller's responsibility so that block and
    /// case bodies share this.
    fn emit_statement_body(&mut self, node: &AstNode) {
        match node.kind {
            NodeKind::Block => self.emit_block(node),
            NodeKind::If => self.emit_if(node),
            NodeKind::While => {
                self.write_indent();
                self.out.push_str("while (");
                self.out.push_str(&self.expr_text(&node.children[0], 0));
                self.out.push(')');
                self.emit_trailing_comments(node);
                self.out.push('\n');
                self.emit_branch(&node.children[1]);
            }
            NodeKind::DoWhile => self.emit_do_while(node),
            NodeKind::For => self.emit_for(node),
            NodeKind::Switch => self.emit_switch(node),
            NodeKind::Return => {
                self.write_indent();
                match node.children.first() {
                    Some(value) => {
                        self.out.push_str("return (");
                        self.out.push_str(&self.expr_text(value, 0));
                        self.out.push_str(");");
                    }
                    None => self.out.push_str("return;"),
                }
                self.emit_trailing_comments(node);
                self.out.push('\n');
            }
            NodeKind::Break | NodeKind::Continue => {
                self.write_indent();
                self.out.push_str(node.token_text());
                self.out.push(';');
                self.emit_trailing_comments(node);
                self.out.push('\n');
            }
            NodeKind::ExprStmt => {
                self.write_indent();
                self.out.push_str(&self.expr_text(&node.children[0], 0));
                self.out.push(';');
                self.emit_trailing_comments(node);
                self.out.push('\n');
            }
            NodeKind::VarDecl | NodeKind::FuncPtr => {
                self.write_indent();
                let text = self.declaration_text(node);
                self.out.push_str(&text);
                self.out.push(';');
                self.emit_trailing_comments(node);
                self.out.push('\n');
            }
            NodeKind::Typedef => self.emit_typedef(node),
            NodeKind::Preprocessor => {
                // Directives stay at column zero regardless of block depth.
                self.out.push_str(node.token_text());
                self.emit_trailing_comments(node);
                self.out.push('\n');
            }
            // The comments themselves were emitted as leading comments.
            NodeKind::Comment => {}
            NodeKind::Unparsed => self.emit_unparsed(node),
            _ => {
                // Expression used in statement position.
                self.write_indent();
                self.out.push_str(&self.expr_text(node, 0));
                self.out.push(';');
                self.emit_trailing_comments(node);
                self.out.push('\n');
            }
        }
    }

    fn emit_if(&mut self, node: &AstNode) {
        self.write_indent();
        self.out.push_str("if (");
        self.out.push_str(&self.expr_text(&node.children[0], 0));
        self.out.push(')');
        self.emit_trailing_comments(node);
        self.out.push('\n');
        self.emit_branch(&node.children[1]);
        if let Some(else_branch) = node.children.get(2) {
            self.write_indent();
            if else_branch.kind == NodeKind::If {
                // `else if` chains stay flat rather than nesting.
                self.out.push_str("else ");
                let start = self.out.len();
                self.emit_if(else_branch);
                // emit_if indents itself; splice the chain onto `else `.
                let indented: String = self.out.split_off(start);
                self.out.push_str(indented.trim_start_matches('\t'));
            } else {
                self.out.push_str("else\n");
                self.emit_branch(else_branch);
            }
        }
    }

    fn emit_branch(&mut self, node: &AstNode) {
        if node.kind == NodeKind::Block {
            self.emit_leading_comments(node);
            self.emit_block(node);
        } else {
            self.indent += 1;
            self.emit_leading_comments(node);
            self.emit_statement_body(node);
            self.indent -= 1;
        }
    }

    fn emit_do_while(&mut self, node: &AstNode) {
        let body = &node.children[0];
        let cond = &node.children[1];
        if body.kind == NodeKind::Block {
            self.emit_leading_comments(body);
        }
        self.write_indent();
        self.out.push_str("do {\n");
        self.indent += 1;
        if body.kind == NodeKind::Block {
            for stmt in &body.children {
                if stmt.blank_line_before {
                    self.out.push('\n');
                }
                self.emit_leading_comments(stmt);
                self.emit_statement_body(stmt);
            }
        } else {
            self.emit_leading_comments(body);
            self.emit_statement_body(body);
        }
        self.indent -= 1;
        self.write_indent();
        self.out.push_str("} while (");
        self.out.push_str(&self.expr_text(cond, 0));
        self.out.push_str(");");
        self.emit_trailing_comments(node);
        self.out.push('\n');
    }

    fn emit_for(&mut self, node: &AstNode) {
        let data = match &node.data {
            NodeData::For(data) => data,
            _ => return,
        };
        self.write_indent();
        self.out.push_str("for (");
        let init: Vec<String> = data
            .init
            .iter()
            .map(|n| {
                if n.kind == NodeKind::VarDecl {
                    self.declaration_text(n)
                } else {
                    self.expr_text(n, 0)
                }
            })
            .collect();
        self.out.push_str(&init.join(", "));
        self.out.push_str("; ");
        if let Some(cond) = &data.cond {
            self.out.push_str(&self.expr_text(cond, 0));
        }
        self.out.push_str("; ");
        let step: Vec<String> = data.step.iter().map(|n| self.expr_text(n, 0)).collect();
        self.out.push_str(&step.join(", "));
        self.out.push(')');
        self.emit_trailing_comments(node);
        self.out.push('\n');
        self.emit_branch(&node.children[0]);
    }

    fn emit_switch(&mut self, node: &AstNode) {
        self.write_indent();
        self.out.push_str("switch (");
        self.out.push_str(&self.expr_text(&node.children[0], 0));
        self.out.push(')');
        self.emit_trailing_comments(node);
        self.out.push('\n');
        self.write_indent();
        self.out.push_str("{\n");
        for case in &node.children[1..] {
            if case.blank_line_before {
                self.out.push('\n');
            }
            self.emit_leading_comments(case);
            self.emit_case(case);
        }
        self.write_indent();
        self.out.push_str("}\n");
    }

    /// Case labels sit at the switch's indent; their statements one deeper.
    fn emit_case(&mut self, case: &AstNode) {
        self.write_indent();
        let stmts = if case.token_kind() == Some(TokenKind::Case) {
            self.out.push_str("case ");
            let value = self.expr_text(&case.children[0], 0);
            self.out.push_str(&value);
            self.out.push(':');
            &case.children[1..]
        } else {
            self.out.push_str("default:");
            &case.children[..]
        };
        self.emit_trailing_comments(case);
        self.out.push('\n');
        self.indent += 1;
        for stmt in stmts {
            if stmt.blank_line_before {
                self.out.push('\n');
            }
            self.emit_leading_comments(stmt);
            self.emit_statement_body(stmt);
        }
        self.indent -= 1;
    }

    fn emit_unparsed(&mut self, node: &AstNode) {
        if let NodeData::Raw(raw) = &node.data {
            self.write_indent();
            self.out.push_str(raw.text);
            self.emit_trailing_comments(node);
            self.out.push('\n');
        }
    }

    // ===== Declarations =====

    /// Declaration text without the trailing `;`, shared by statement,
    /// member, top-level, and `for`-init positions.
    fn declaration_text(&self, node: &AstNode) -> String {
        match &node.data {
            NodeData::VarDecl(data) => {
                let mut s = join_tokens(&data.base_type);
                if !s.is_empty() {
                    s.push(' ');
                }
                let declarators: Vec<String> = data
                    .declarators
                    .iter()
                    .map(|d| self.declarator_text(d))
                    .collect();
                s.push_str(&declarators.join(", "));
                s
            }
            NodeData::FuncPtr(data) => {
                let mut s = join_tokens(&data.return_type);
                if !s.ends_with('*') {
                    s.push(' ');
                }
                s.push_str("(*");
                s.push_str(data.name.text);
                s.push_str(")(");
                s.push_str(&join_tokens(&data.params));
                s.push(')');
                s
            }
            _ => String::new(),
        }
    }

    fn declarator_text(&self, d: &Declarator) -> String {
        let mut s = String::new();
        for _ in 0..d.stars {
            s.push('*');
        }
        for qual in &d.quals {
            s.push_str(qual.text);
            s.push(' ');
        }
        s.push_str(d.name.text);
        s.push_str(&join_tokens(&d.array_dims));
        if let Some(init) = &d.init {
            s.push_str(" = ");
            s.push_str(&self.expr_text(init, 0));
        }
        s
    }

    fn emit_typedef(&mut self, node: &AstNode) {
        self.write_indent();
        self.out.push_str("typedef ");
        match node.children.first() {
            Some(inner) if inner.kind == NodeKind::FuncPtr => {
                let text = self.declaration_text(inner);
                self.out.push_str(&text);
                self.out.push(';');
            }
            Some(inner) => {
                // typedef struct [tag] { ... } alias;
                self.emit_type_definition_inline(inner);
                self.out.push(' ');
                self.out.push_str(node.token_text());
                self.out.push(';');
            }
            None => {
                if let NodeData::Typedef(data) = &node.data {
                    let base = join_tokens(&data.base_type);
                    self.out.push_str(&base);
                    if !base.ends_with('*') {
                        self.out.push(' ');
                    }
                }
                self.out.push_str(node.token_text());
                self.out.push(';');
            }
        }
        self.emit_trailing_comments(node);
        self.out.push('\n');
    }

    /// `struct tag { ... }` with no trailing `;`, used by both the
    /// standalone definition and the typedef'd inline form.
    fn emit_type_definition_inline(&mut self, node: &AstNode) {
        let keyword = match node.kind {
            NodeKind::Struct => "struct",
            NodeKind::Union => "union",
            _ => "enum",
        };
        self.out.push_str(keyword);
        if node.token.is_some() {
            self.out.push(' ');
            self.out.push_str(node.token_text());
        }
        if !matches!(node.data, NodeData::Record { has_body: true }) {
            return;
        }
        self.out.push('\n');
        self.write_indent();
        self.out.push_str("{\n");
        self.indent += 1;
        if node.kind == NodeKind::Enum {
            let last = node
                .children
                .iter()
                .rposition(|c| c.kind != NodeKind::Comment)
                .unwrap_or(0);
            for (i, entry) in node.children.iter().enumerate() {
                if entry.blank_line_before {
                    self.out.push('\n');
                }
                self.emit_leading_comments(entry);
                if entry.kind == NodeKind::Comment {
                    continue;
                }
                self.write_indent();
                self.out.push_str(&enum_entry_text(entry));
                if i != last {
                    self.out.push(',');
                }
                self.emit_trailing_comments(entry);
                self.out.push('\n');
            }
        } else {
            for member in &node.children {
                if member.blank_line_before {
                    self.out.push('\n');
                }
                self.emit_leading_comments(member);
                if member.kind == NodeKind::Comment {
                    continue;
                }
                if member.kind == NodeKind::Unparsed {
                    self.emit_unparsed(member);
                } else {
                    self.write_indent();
                    let text = self.declaration_text(member);
                    self.out.push_str(&text);
                    self.out.push(';');
                    self.emit_trailing_comments(member);
                    self.out.push('\n');
                }
            }
        }
        self.indent -= 1;
        self.write_indent();
        self.out.push('}');
    }

    fn emit_type_definition(&mut self, node: &AstNode) {
        self.write_indent();
        self.emit_type_definition_inline(node);
    }

    // ===== Comments =====

    fn emit_leading_comments(&mut self, node: &AstNode) {
        for comment in &node.leading_comments {
            self.write_indent();
            self.out.push_str(&convert_comment(comment.text));
            self.out.push('\n');
        }
    }

    fn emit_trailing_comments(&mut self, node: &AstNode) {
        for comment in &node.trailing_comments {
            self.out.push(' ');
            self.out.push_str(&convert_comment(comment.text));
        }
    }

    // ===== Expressions =====

    /// Renders an expression subtree.  `min_prec` is the binding strength
    /// the surrounding context requires; looser subtrees get parenthesized
    /// so the output re-parses to the same tree.
    fn expr_text(&self, node: &AstNode, min_prec: u8) -> String {
        match node.kind {
            NodeKind::Literal | NodeKind::Identifier => node.token_text().to_string(),
            NodeKind::Binary => {
                let op = node.token.map(|t| t.kind).unwrap_or(TokenKind::Error);
                let prec = op.precedence();
                let right_min = if op.is_assignment() { prec } else { prec + 1 };
                let left = self.expr_text(&node.children[0], prec);
                let right = self.expr_text(&node.children[1], right_min);
                let s = format!("{left} {} {right}", node.token_text());
                parenthesize_if(s, prec < min_prec)
            }
            NodeKind::Ternary => {
                let cond = self.expr_text(&node.children[0], 2);
                let then = self.expr_text(&node.children[1], 0);
                let other = self.expr_text(&node.children[2], 1);
                parenthesize_if(format!("{cond} ? {then} : {other}"), 1 < min_prec)
            }
            NodeKind::Unary => {
                let postfix = matches!(node.data, NodeData::Unary { postfix: true });
                let s = if postfix {
                    let base = self.expr_text(&node.children[0], PREC_POSTFIX);
                    format!("{base}{}", node.token_text())
                } else {
                    let op = node.token_text();
                    let operand = self.expr_text(&node.children[0], PREC_UNARY);
                    // Keep `- -x` from fusing into `--x`.
                    if operand.starts_with(op.chars().next().unwrap_or(' '))
                        && matches!(node.token_kind(), Some(TokenKind::Minus | TokenKind::Plus))
                    {
                        format!("{op} {operand}")
                    } else {
                        format!("{op}{operand}")
                    }
                };
                let prec = if postfix { PREC_POSTFIX } else { PREC_UNARY };
                parenthesize_if(s, prec < min_prec)
            }
            NodeKind::Cast => {
                let type_name = match &node.data {
                    NodeData::TypeName(tokens) => join_tokens(tokens),
                    _ => String::new(),
                };
                let operand = self.expr_text(&node.children[0], PREC_UNARY);
                parenthesize_if(format!("({type_name}){operand}"), PREC_UNARY < min_prec)
            }
            NodeKind::Sizeof => {
                let inner = match &node.data {
                    NodeData::TypeName(tokens) => join_tokens(tokens),
                    _ => node
                        .children
                        .first()
                        .map(|c| self.expr_text(c, 0))
                        .unwrap_or_default(),
                };
                format!("sizeof({inner})")
            }
            NodeKind::Call => {
                let callee = self.expr_text(&node.children[0], PREC_POSTFIX);
                let args: Vec<String> = node.children[1..]
                    .iter()
                    .map(|arg| self.expr_text(arg, 0))
                    .collect();
                parenthesize_if(
                    format!("{callee}({})", args.join(", ")),
                    PREC_POSTFIX < min_prec,
                )
            }
            NodeKind::ArrayAccess => {
                let base = self.expr_text(&node.children[0], PREC_POSTFIX);
                let index = self.expr_text(&node.children[1], 0);
                parenthesize_if(format!("{base}[{index}]"), PREC_POSTFIX < min_prec)
            }
            NodeKind::MemberAccess => {
                let object = self.expr_text(&node.children[0], PREC_POSTFIX);
                let op = match node.data {
                    NodeData::Member { arrow: true } => "->",
                    _ => ".",
                };
                parenthesize_if(
                    format!("{object}{op}{}", node.token_text()),
                    PREC_POSTFIX < min_prec,
                )
            }
            NodeKind::InitList => {
                let items: Vec<String> = node
                    .children
                    .iter()
                    .map(|item| self.expr_text(item, 0))
                    .collect();
                format!("{{{}}}", items.join(", "))
            }
            NodeKind::TypeExpr => match &node.data {
                NodeData::TypeName(tokens) => join_tokens(tokens),
                _ => String::new(),
            },
            NodeKind::Unparsed => match &node.data {
                NodeData::Raw(raw) => raw.text.to_string(),
                _ => String::new(),
            },
            _ => {
                debug_assert!(false, "non-expression node in expression position");
                String::new()
            }
        }
    }
}

fn parenthesize_if(s: String, needed: bool) -> String {
    if needed {
        format!("({s})")
    } else {
        s
    }
}

fn param_text(param: &AstNode) -> String {
    if param.token_kind() == Some(TokenKind::Ellipsis) {
        return "...".to_string();
    }
    let data = match &param.data {
        NodeData::Param(data) => data,
        _ => return String::new(),
    };
    render_param(param, data)
}

fn render_param(param: &AstNode, data: &ParamData) -> String {
    let mut s = join_tokens(&data.type_tokens);
    if param.token.is_some() {
        if !s.is_empty() && !s.ends_with('*') {
            s.push(' ');
        }
        s.push_str(param.token_text());
    }
    s.push_str(&join_tokens(&data.array_dims));
    s
}

fn enum_entry_text(entry: &AstNode) -> String {
    let mut s = entry.token_text().to_string();
    if let NodeData::EnumValue(tokens) = &entry.data {
        if !tokens.is_empty() {
            s.push_str(" = ");
            s.push_str(&join_tokens(tokens));
        }
    }
    s
}

/// Joins a raw token run with canonical spacing: single spaces between
/// tokens, none after `(`/`[`, none before `)`/`]`/`,`/`;`, and `*` runs
/// kept together.
fn join_tokens(tokens: &[&Token]) -> String {
    let mut s = String::new();
    let mut prev: Option<&str> = None;
    for token in tokens {
        if let Some(p) = prev {
            let no_space = matches!(token.text, ")" | "]" | "," | ";")
                || matches!(p, "(" | "[")
                || (p == "]" && token.text == "[")
                || (p == "*" && token.text == "*");
            if !no_space {
                s.push(' ');
            }
        }
        s.push_str(token.text);
        prev = Some(token.text);
    }
    s
}

fn convert_comment(text: &str) -> String {
    if let Some(rest) = text.strip_prefix("//") {
        let inner = rest.trim();
        if inner.is_empty() {
            "/* */".to_string()
        } else {
            format!("/* {inner} */")
        }
    } else {
        text.to_string()
    }
}

/// Group key for top-level blank-line separation.  Preprocessor directives
/// split further into include / define / conditional / other runs.
fn top_level_group(node: &AstNode) -> u8 {
    if node.kind == NodeKind::Preprocessor {
        let directive = node.token_text().trim_start_matches('#').trim_start();
        return if directive.starts_with("include") {
            10
        } else if directive.starts_with("define") || directive.starts_with("undef") {
            11
        } else if directive.starts_with("if")
            || directive.starts_with("el")
            || directive.starts_with("endif")
        {
            12
        } else {
            13
        };
    }
    top_level_group_id(node.kind)
}

fn top_level_group_id(kind: NodeKind) -> u8 {
    match kind {
        NodeKind::Function => 1,
        NodeKind::VarDecl | NodeKind::FuncPtr => 2,
        NodeKind::Typedef => 3,
        NodeKind::Struct | NodeKind::Union | NodeKind::Enum => 4,
        _ => 5,
    }
}

fn is_bodied_type(node: &AstNode) -> bool {
    if node.kind == NodeKind::VarDecl {
        // `struct { ... } name;` keeps the separation its definition earns.
        return node
            .children
            .first()
            .is_some_and(|c| matches!(c.data, NodeData::Record { has_body: true }));
    }
    matches!(
        node.kind,
        NodeKind::Struct | NodeKind::Union | NodeKind::Enum | NodeKind::Typedef
    ) && (matches!(node.data, NodeData::Record { has_body: true }) || !node.children.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::Lexer;
    use crate::parser::parse::Parser;

    fn fmt(source: &str) -> String {
        let (tokens, _) = Lexer::new(source).tokenize();
        let mut parser = Parser::new(source, &tokens);
        let program = parser.parse();
        format_program(&program)
    }

    #[test]
    fn canonical_function_layout() {
        let out = fmt("int add(int a,int b){return a+b;}");
        assert_eq!(out, "int add(int a, int b)\n{\n\treturn (a + b);\n}\n");
    }

    #[test]
    fn return_value_is_always_parenthesized() {
        let out = fmt("int f(void)\n{\n\treturn 0;\n}\n");
        assert!(out.contains("\treturn (0);\n"));
        let bare = fmt("void g(void)\n{\n\treturn;\n}\n");
        assert!(bare.contains("\treturn;\n"));
    }

    #[test]
    fn grouping_parens_are_rederived() {
        let out = fmt("int f(void)\n{\n\treturn (a + b) * c;\n}\n");
        assert!(out.contains("return ((a + b) * c);"));
        let flat = fmt("int f(void)\n{\n\treturn a + b * c;\n}\n");
        assert!(flat.contains("return (a + b * c);"));
    }

    #[test]
    fn line_comments_become_block_comments() {
        let out = fmt("int x; // counter\n");
        assert!(out.contains("/* counter */"));
        assert!(!out.contains("//"));
    }

    #[test]
    fn leading_comment_stays_with_its_statement() {
        let out = fmt("void f(void)\n{\n\t/* setup */\n\tint x = 0;\n\tuse(x);\n}\n");
        assert!(out.contains("\t/* setup */\n\tint x = 0;\n"));
    }

    #[test]
    fn blank_runs_collapse_to_one() {
        let out = fmt("void f(void)\n{\n\tint a;\n\n\n\n\tint b;\n}\n");
        assert!(out.contains("\tint a;\n\n\tint b;\n"));
    }

    #[test]
    fn pointer_stars_attach_to_names() {
        let out = fmt("char*strdup_safe(const char*s);\n");
        assert!(out.contains("char *strdup_safe(const char *s);"));
        let decl = fmt("int*  a,*b;\n");
        assert!(decl.contains("int *a, *b;"));
    }

    #[test]
    fn do_while_keeps_brace_on_do_line() {
        let out = fmt("void f(void)\n{\n\tdo { step(); } while (more());\n}\n");
        assert!(out.contains("\tdo {\n\t\tstep();\n\t} while (more());\n"));
    }

    #[test]
    fn switch_case_labels_align_with_switch() {
        let out = fmt(
            "void f(int x)\n{\n\tswitch (x) { case 1: one(); break; default: other(); }\n}\n",
        );
        assert!(out.contains("\tswitch (x)\n\t{\n\tcase 1:\n\t\tone();\n\t\tbreak;\n\tdefault:\n\t\tother();\n\t}\n"));
    }

    #[test]
    fn else_if_chains_stay_flat() {
        let out = fmt(
            "void f(int x)\n{\n\tif (x == 1)\n\t\ta();\n\telse if (x == 2)\n\t\tb();\n\telse\n\t\tc();\n}\n",
        );
        assert!(out.contains("\telse if (x == 2)\n"));
        assert!(!out.contains("\telse\n\t\tif"));
    }

    #[test]
    fn unparsed_text_survives_verbatim() {
        let source = "__asm__ {\n  mov eax, 1\n}\n";
        let out = fmt(source);
        assert!(out.contains("__asm__ {\n  mov eax, 1\n}"));
    }

    #[test]
    fn enum_renders_without_trailing_comma() {
        let out = fmt("enum color\n{\n\tRED,\n\tGREEN = 3,\n\tBLUE,\n};\n");
        assert!(out.contains("enum color\n{\n\tRED,\n\tGREEN = 3,\n\tBLUE\n};\n"));
    }

    #[test]
    fn typedef_inline_struct_layout() {
        let out = fmt("typedef struct node { int v; struct node *next; } node_t;\n");
        assert!(out.contains(
            "typedef struct node\n{\n\tint v;\n\tstruct node *next;\n} node_t;\n"
        ));
    }

    #[test]
    fn anonymous_struct_declares_its_variable() {
        let out = fmt("struct { int a; } s;\n");
        assert_eq!(out, "struct\n{\n\tint a;\n} s;\n");
    }

    #[test]
    fn tagged_record_keeps_its_declarator_list() {
        let out = fmt("struct point { int x; int y; } origin, *cursor;\n");
        assert!(out.contains("} origin, *cursor;\n"));
        let shade = fmt("enum color { RED, GREEN } shade;\n");
        assert!(shade.contains("} shade;\n"));
    }

    #[test]
    fn array_dimensions_stay_tight() {
        let out = fmt("int grid[2][2] = {{1, 2}, {3, 4}};\n");
        assert!(out.contains("int grid[2][2] = {{1, 2}, {3, 4}};"));
    }

    #[test]
    fn comment_before_closing_brace_stays_inside() {
        let out = fmt("void f(void)\n{\n\twork();\n\t/* last */\n}\n");
        assert!(out.contains("\twork();\n\t/* last */\n}\n"));
    }

    #[test]
    fn formatting_is_idempotent() {
        let samples = [
            "int add(int a,int b){return a+b;}",
            "typedef struct node { int v; struct node *next; } node_t;\nnode_t *head;\n",
            "#include <stdio.h>\n#include <stdlib.h>\nint main(void)\n{\n\tfor (i = 0, j = n; i < j; i++, j--)\n\t\tswap(&a[i], &a[j]);\n\treturn (0);\n}\n",
            "void f(int x)\n{\n\tif (x)\n\t\ta();\n\telse if (y)\n\t\tb();\n\tdo {\n\t\tg();\n\t} while (x--);\n}\n",
            "enum color\n{\n\tRED,\n\tGREEN = (1 << 2)\n};\n",
            "struct { int a; } s;\n",
            "int grid[2][2];\nvoid f(void)\n{\n\twork();\n\t/* last */\n}\n",
            "__asm__ {\n  mov eax, 1\n}\n",
        ];
        for source in samples {
            let once = fmt(source);
            let twice = fmt(&once);
            assert_eq!(once, twice, "not idempotent for {source:?}");
        }
    }

    #[test]
    fn precedence_groupings_round_trip() {
        let out = fmt("int f(void)\n{\n\tx = a = b;\n\ty = a ? b : c ? d : e;\n}\n");
        assert!(out.contains("x = a = b;"));
        assert!(out.contains("y = a ? b : c ? d : e;"));
    }
}
