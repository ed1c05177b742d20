//! C source code parser
//!
//! This module transforms C source text into a layout-aware Abstract Syntax
//! Tree (AST):
//! - [`lexer`]: Lossless tokenization (every input byte belongs to a token)
//! - [`parse`]: The [`parse::Parser`] coordinator, recovery, and top level
//! - [`ast`]: AST node definitions
//! - [`symbols`]: Scoped symbol table for typedef-aware parsing
//!
//! # Supported C Subset
//!
//! The parser models the constructs the formatter reshapes:
//! - Declarations: variables, typedefs, structs, unions, enums, function
//!   pointers, functions and prototypes
//! - Statements: blocks, `if`/`else`, `while`, `do`/`while`, `for`,
//!   `switch`, `return`, `break`, `continue`, expression statements
//! - Expressions: arithmetic, logical, bitwise, assignment, ternary, calls,
//!   member/array access, casts, `sizeof`
//!
//! Everything else (preprocessor bodies, `goto`, inline assembly, bit
//! fields, ...) is carried through verbatim as [`ast::NodeKind::Unparsed`]
//! or [`ast::NodeKind::Preprocessor`] nodes rather than rejected.
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with precedence climbing for binary
//! operators.  Parsing is context-sensitive: a symbol table tracks typedef
//! names so `node_t *head;` reads as a declaration, and total: any input
//! produces a tree covering the whole file.

pub mod ast;
pub mod lexer;
pub mod parse;
pub mod symbols;
pub mod token;

mod declarations;
mod expressions;
mod statements;
