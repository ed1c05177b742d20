//! Lexer (tokenizer) for C source code.
//!
//! Converts raw source text into a flat, *lossless* [`Token`] stream: layout
//! (whitespace, newlines, comments) and preprocessor directives come out as
//! tokens of their own rather than being discarded, so the formatter and the
//! parser's verbatim recovery can reconstruct any byte of the input.
//!
//! The lexer never aborts.  Unterminated string/char literals and
//! unrecognized characters become [`TokenKind::Error`] tokens, the error
//! count is bumped, and scanning continues on the next character.

use super::token::{keyword_kind, Token, TokenKind};

/// Streaming tokenizer over a borrowed source string.
pub struct Lexer<'src> {
    source: &'src str,
    pos: usize,
    line: usize,
    column: usize,
    error_count: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Lexer {
            source,
            pos: 0,
            line: 1,
            column: 1,
            error_count: 0,
        }
    }

    /// Tokenizes the entire input.  Always runs to EOF and appends a final
    /// [`TokenKind::Eof`] token; returns the tokens and the number of
    /// lexical errors encountered.
    pub fn tokenize(mut self) -> (Vec<Token<'src>>, usize) {
        let mut tokens = Vec::new();
        while self.pos < self.source.len() {
            tokens.push(self.next_token());
        }
        tokens.push(Token {
            kind: TokenKind::Eof,
            text: "",
            line: self.line,
            column: self.column,
            offset: self.pos,
        });
        (tokens, self.error_count)
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn next_token(&mut self) -> Token<'src> {
        let start = self.pos;
        let line = self.line;
        let column = self.column;

        let kind = self.scan();

        Token {
            kind,
            text: &self.source[start..self.pos],
            line,
            column,
            offset: start,
        }
    }

    fn scan(&mut self) -> TokenKind {
        let c = match self.peek() {
            Some(c) => c,
            None => return TokenKind::Eof,
        };

        match c {
            '\n' => {
                self.bump();
                TokenKind::Newline
            }
            ' ' | '\t' | '\r' => {
                while matches!(self.peek(), Some(' ' | '\t' | '\r')) {
                    self.bump();
                }
                TokenKind::Whitespace
            }
            '/' if self.peek_nth(1) == Some('/') => self.scan_line_comment(),
            '/' if self.peek_nth(1) == Some('*') => self.scan_block_comment(),
            '#' => self.scan_preprocessor(),
            '"' => self.scan_quoted('"', TokenKind::String),
            '\'' => self.scan_quoted('\'', TokenKind::CharLit),
            '0'..='9' => self.scan_number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.scan_identifier(),
            _ => self.scan_operator(),
        }
    }

    fn scan_line_comment(&mut self) -> TokenKind {
        // Up to but not including the terminating newline.
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
        TokenKind::LineComment
    }

    fn scan_block_comment(&mut self) -> TokenKind {
        self.bump(); // /
        self.bump(); // *
        while let Some(c) = self.bump() {
            if c == '*' && self.peek() == Some('/') {
                self.bump();
                break;
            }
        }
        TokenKind::BlockComment
    }

    /// One token from `#` to the first newline not preceded by a backslash.
    /// Backslash-newline continuations stay inside the token; the final
    /// newline is left for the next token.
    fn scan_preprocessor(&mut self) -> TokenKind {
        self.bump(); // #
        while let Some(c) = self.peek() {
            if c == '\\' && self.peek_nth(1) == Some('\n') {
                self.bump();
                self.bump();
                continue;
            }
            if c == '\n' {
                break;
            }
            self.bump();
        }
        TokenKind::Preprocessor
    }

    /// Scans a string or character literal.  A backslash consumes the next
    /// character unconditionally; a bare newline or EOF before the closing
    /// quote yields an error token covering what was scanned.
    fn scan_quoted(&mut self, quote: char, kind: TokenKind) -> TokenKind {
        self.bump(); // opening quote
        loop {
            match self.peek() {
                None => {
                    self.error_count += 1;
                    return TokenKind::Error;
                }
                Some('\n') => {
                    // Leave the newline for its own token.
                    self.error_count += 1;
                    return TokenKind::Error;
                }
                Some('\\') => {
                    self.bump();
                    self.bump();
                }
                Some(c) if c == quote => {
                    self.bump();
                    return kind;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    fn scan_number(&mut self) -> TokenKind {
        if self.peek() == Some('0') && matches!(self.peek_nth(1), Some('x' | 'X')) {
            self.bump();
            self.bump();
            while matches!(self.peek(), Some(c) if c.is_ascii_hexdigit()) {
                self.bump();
            }
            while matches!(self.peek(), Some('u' | 'U' | 'l' | 'L')) {
                self.bump();
            }
            return TokenKind::Integer;
        }

        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }

        let mut is_float = false;
        if self.peek() == Some('.') && matches!(self.peek_nth(1), Some(c) if c.is_ascii_digit()) {
            is_float = true;
            self.bump();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.bump();
            }
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let exponent_ok = match self.peek_nth(1) {
                Some(c) if c.is_ascii_digit() => true,
                Some('+' | '-') => matches!(self.peek_nth(2), Some(c) if c.is_ascii_digit()),
                _ => false,
            };
            if exponent_ok {
                is_float = true;
                self.bump();
                if matches!(self.peek(), Some('+' | '-')) {
                    self.bump();
                }
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.bump();
                }
            }
        }

        if is_float {
            if matches!(self.peek(), Some('f' | 'F' | 'l' | 'L')) {
                self.bump();
            }
            TokenKind::Float
        } else {
            while matches!(self.peek(), Some('u' | 'U' | 'l' | 'L')) {
                self.bump();
            }
            TokenKind::Integer
        }
    }

    fn scan_identifier(&mut self) -> TokenKind {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.bump();
        }
        keyword_kind(&self.source[start..self.pos]).unwrap_or(TokenKind::Identifier)
    }

    /// Longest-match operator and punctuation scanning.
    fn scan_operator(&mut self) -> TokenKind {
        let c = self.bump().unwrap_or('\0');
        let next = self.peek();
        match c {
            '+' => match next {
                Some('+') => self.op2(TokenKind::PlusPlus),
                Some('=') => self.op2(TokenKind::PlusEq),
                _ => TokenKind::Plus,
            },
            '-' => match next {
                Some('-') => self.op2(TokenKind::MinusMinus),
                Some('=') => self.op2(TokenKind::MinusEq),
                Some('>') => self.op2(TokenKind::Arrow),
                _ => TokenKind::Minus,
            },
            '*' => match next {
                Some('=') => self.op2(TokenKind::StarEq),
                _ => TokenKind::Star,
            },
            '/' => match next {
                Some('=') => self.op2(TokenKind::SlashEq),
                _ => TokenKind::Slash,
            },
            '%' => match next {
                Some('=') => self.op2(TokenKind::PercentEq),
                _ => TokenKind::Percent,
            },
            '=' => match next {
                Some('=') => self.op2(TokenKind::EqEq),
                _ => TokenKind::Eq,
            },
            '!' => match next {
                Some('=') => self.op2(TokenKind::NotEq),
                _ => TokenKind::Bang,
            },
            '<' => match next {
                Some('<') => {
                    self.bump();
                    if self.peek() == Some('=') {
                        self.op2(TokenKind::LtLtEq)
                    } else {
                        TokenKind::LtLt
                    }
                }
                Some('=') => self.op2(TokenKind::Le),
                _ => TokenKind::Lt,
            },
            '>' => match next {
                Some('>') => {
                    self.bump();
                    if self.peek() == Some('=') {
                        self.op2(TokenKind::GtGtEq)
                    } else {
                        TokenKind::GtGt
                    }
                }
                Some('=') => self.op2(TokenKind::Ge),
                _ => TokenKind::Gt,
            },
            '&' => match next {
                Some('&') => self.op2(TokenKind::AndAnd),
                Some('=') => self.op2(TokenKind::AmpEq),
                _ => TokenKind::Amp,
            },
            '|' => match next {
                Some('|') => self.op2(TokenKind::OrOr),
                Some('=') => self.op2(TokenKind::PipeEq),
                _ => TokenKind::Pipe,
            },
            '^' => match next {
                Some('=') => self.op2(TokenKind::CaretEq),
                _ => TokenKind::Caret,
            },
            '~' => TokenKind::Tilde,
            '.' => {
                if next == Some('.') && self.peek_nth(1) == Some('.') {
                    self.bump();
                    self.bump();
                    TokenKind::Ellipsis
                } else {
                    TokenKind::Dot
                }
            }
            '?' => TokenKind::Question,
            ':' => TokenKind::Colon,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            _ => {
                self.error_count += 1;
                TokenKind::Error
            }
        }
    }

    fn op2(&mut self, kind: TokenKind) -> TokenKind {
        self.bump();
        kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, _) = Lexer::new(source).tokenize();
        tokens.iter().map(|t| t.kind).collect()
    }

    fn significant(source: &str) -> Vec<TokenKind> {
        kinds(source)
            .into_iter()
            .filter(|k| !k.is_trivia() && *k != TokenKind::Eof)
            .collect()
    }

    #[test]
    fn layout_is_tokenized_not_discarded() {
        assert_eq!(
            kinds("int x;\n"),
            vec![
                TokenKind::Int,
                TokenKind::Whitespace,
                TokenKind::Identifier,
                TokenKind::Semicolon,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn every_byte_belongs_to_a_token() {
        let source = "int main(void)\n{\n\treturn (0); /* done */\n}\n";
        let (tokens, errors) = Lexer::new(source).tokenize();
        assert_eq!(errors, 0);
        let mut offset = 0;
        for token in &tokens {
            assert_eq!(token.offset, offset);
            offset += token.text.len();
        }
        assert_eq!(offset, source.len());
    }

    #[test]
    fn longest_match_operators() {
        assert_eq!(
            significant("a <<= b >>= c ... ->"),
            vec![
                TokenKind::Identifier,
                TokenKind::LtLtEq,
                TokenKind::Identifier,
                TokenKind::GtGtEq,
                TokenKind::Identifier,
                TokenKind::Ellipsis,
                TokenKind::Arrow,
            ]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(significant("0x1F"), vec![TokenKind::Integer]);
        assert_eq!(significant("42UL"), vec![TokenKind::Integer]);
        assert_eq!(significant("3.14"), vec![TokenKind::Float]);
        assert_eq!(significant("1.5e-3f"), vec![TokenKind::Float]);
        // A dot not followed by a digit is member access, not a float.
        assert_eq!(
            significant("a.b"),
            vec![TokenKind::Identifier, TokenKind::Dot, TokenKind::Identifier]
        );
    }

    #[test]
    fn string_escapes() {
        let (tokens, errors) = Lexer::new(r#""a\"b\\" 'x'"#).tokenize();
        assert_eq!(errors, 0);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, r#""a\"b\\""#);
        assert_eq!(tokens[2].kind, TokenKind::CharLit);
    }

    #[test]
    fn unterminated_string_is_an_error_token() {
        let (tokens, errors) = Lexer::new("\"oops\nint x;").tokenize();
        assert_eq!(errors, 1);
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert_eq!(tokens[0].text, "\"oops");
        // The newline survives as its own token and lexing continues.
        assert_eq!(tokens[1].kind, TokenKind::Newline);
        assert_eq!(tokens[2].kind, TokenKind::Int);
    }

    #[test]
    fn unterminated_string_at_eof() {
        let (tokens, errors) = Lexer::new("\"dangling").tokenize();
        assert_eq!(errors, 1);
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn unrecognized_character() {
        let (tokens, errors) = Lexer::new("int $x;").tokenize();
        assert_eq!(errors, 1);
        assert_eq!(tokens[2].kind, TokenKind::Error);
        assert_eq!(tokens[2].text, "$");
        assert_eq!(tokens[3].kind, TokenKind::Identifier);
    }

    #[test]
    fn preprocessor_with_continuation() {
        let source = "#define MAX(a, b) \\\n\t((a) > (b) ? (a) : (b))\nint x;";
        let (tokens, errors) = Lexer::new(source).tokenize();
        assert_eq!(errors, 0);
        assert_eq!(tokens[0].kind, TokenKind::Preprocessor);
        assert!(tokens[0].text.contains("\\\n"));
        assert_eq!(tokens[1].kind, TokenKind::Newline);
    }

    #[test]
    fn comments() {
        let (tokens, _) = Lexer::new("// line\n/* block\n   spans */").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::LineComment);
        assert_eq!(tokens[0].text, "// line");
        assert_eq!(tokens[2].kind, TokenKind::BlockComment);
        assert!(tokens[2].text.ends_with("*/"));
    }
}
