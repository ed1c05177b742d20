//! # Introduction
//!
//! bettyfmt reformats C source into the Betty coding style: tab indentation,
//! braces on their own line, parenthesized return values, canonical operator
//! spacing, and `/* */` comments.  Constructs outside the modeled grammar
//! are carried through byte-for-byte instead of being rejected or dropped.
//!
//! ## Formatting pipeline
//!
//! ```text
//! Source → Lexer → Tokens → Parser (+ Symbol Table) → AST → Formatter → Source
//! ```
//!
//! 1. [`parser::lexer`] — lossless tokenisation; every input byte belongs to
//!    exactly one token, layout included.
//! 2. [`parser`] — context-sensitive recursive descent over the token
//!    buffer.  A scoped symbol table tracks `typedef` names so declarations
//!    disambiguate from expressions.  Parsing is total: anything the grammar
//!    does not model becomes a verbatim leaf.
//! 3. [`formatter`] — walks the AST and emits canonical text.
//!
//! ## Entry points
//!
//! [`format`] is the whole pipeline as a pure function.  [`format_with_report`]
//! additionally returns the lexer error and parser recovery counters, which
//! callers can surface as warnings.

pub mod formatter;
pub mod parser;

use parser::lexer::Lexer;
use parser::parse::Parser;

/// Counters from one formatting pass, for diagnostics only.  Non-zero values
/// mean parts of the input were carried through verbatim rather than
/// reformatted; the output is still complete and valid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatReport {
    /// Unrecognized characters and unterminated literals seen while lexing.
    pub lex_errors: usize,
    /// Productions the parser abandoned to verbatim recovery.
    pub parse_recoveries: usize,
}

/// Formats C source text into the Betty style.  Total: never fails, never
/// drops input text.
pub fn format(source: &str) -> String {
    format_with_report(source).0
}

/// [`format`], plus the diagnostic counters from the run.
pub fn format_with_report(source: &str) -> (String, FormatReport) {
    let (tokens, lex_errors) = Lexer::new(source).tokenize();
    let mut parser = Parser::new(source, &tokens);
    let program = parser.parse();
    let report = FormatReport {
        lex_errors,
        parse_recoveries: parser.recoveries(),
    };
    (formatter::format_program(&program), report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_is_total_and_reports_recoveries() {
        let (out, report) = format_with_report("int x;\n@@@\nint y;\n");
        assert!(report.parse_recoveries > 0);
        assert!(out.contains("int x;"));
        assert!(out.contains("@@@"));
        assert!(out.contains("int y;"));
    }

    #[test]
    fn clean_input_reports_nothing() {
        let (_, report) = format_with_report("int main(void)\n{\n\treturn (0);\n}\n");
        assert_eq!(report, FormatReport::default());
    }

    #[test]
    fn unterminated_literal_is_counted_not_fatal() {
        let (out, report) = format_with_report("char *s = \"oops\n");
        assert_eq!(report.lex_errors, 1);
        assert!(!out.is_empty());
    }
}
