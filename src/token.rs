//! Token stream: a full-fidelity, append-only record of lexical analysis.
//!
//! [`TokenStream`] retains every byte of the input, including whitespace and
//! comments, so that source can be reconstructed byte-for-byte and so error
//! messages can pull exact source lines back out by line number. The
//! tokenizer that populates a stream is an external collaborator (see
//! `SPEC_FULL.md` §1); this module only specifies and implements the data
//! structure it must populate.

use crate::source::{FileId, SourceRef};
use std::collections::BTreeMap;

/// The closed set of grammar terminals, plus the four non-syntax kinds that
/// still consume source bytes (whitespace, comments, file metadata).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TokenKind {
    // Literals and names
    IntLiteral,
    FloatLiteral,
    StringLiteral,
    CharLiteral,
    BoolLiteral,
    Identifier,

    // Keywords
    KwFn,
    KwClass,
    KwEnum,
    KwTypedef,
    KwNamespace,
    KwUsing,
    KwReturn,
    KwIf,
    KwElse,
    KwWhile,
    KwBreak,
    KwContinue,
    KwGoto,
    KwLet,
    KwUnsafe,
    KwTemplate,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Colon,
    ColonColon,
    Comma,
    Arrow,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    AmpAmp,
    Pipe,
    PipePipe,
    Bang,
    EqEq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Dot,

    // Non-syntax (still occupy source bytes)
    Whitespace,
    CommentSingleLine,
    CommentMultiLine,
    FileMetadata,

    Eof,
}

impl TokenKind {
    /// Whether this kind participates in the grammar (as opposed to being
    /// whitespace, a comment, or file metadata the parser skips over).
    pub fn is_syntax(self) -> bool {
        !matches!(
            self,
            TokenKind::Whitespace
                | TokenKind::CommentSingleLine
                | TokenKind::CommentMultiLine
                | TokenKind::FileMetadata
        )
    }
}

/// A single lexical token: its kind, its verbatim source text, and where it
/// came from.
#[derive(Clone, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub src: SourceRef,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, src: SourceRef) -> Self {
        Self { kind, text: text.into(), src }
    }
}

/// Append-only stream of tokens, indexed by line for O(1) line retrieval.
///
/// Concatenating the `text` of every token in order reconstructs the
/// original input byte-for-byte — this is the round-trip property tested in
/// `format-identity`.
#[derive(Default)]
pub struct TokenStream {
    tokens: Vec<Token>,
    by_line: BTreeMap<u32, Vec<usize>>,
}

impl TokenStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new token to the stream and returns its index.
    pub fn add_token(
        &mut self,
        kind: TokenKind,
        text: impl Into<String>,
        file: FileId,
        line: u32,
        column: u32,
    ) -> usize {
        let text = text.into();
        let length = text.len() as u32;
        let idx = self.tokens.len();
        self.tokens.push(Token::new(kind, text, SourceRef::new(file, line, column, length)));
        self.by_line.entry(line).or_default().push(idx);
        idx
    }

    /// Appends text to the most recently added token. Used when the lexer
    /// emits a single logical token (e.g. a multi-line comment) across
    /// several lexical matches. A no-op on an empty stream.
    pub fn append_to_last(&mut self, text: &str) {
        if let Some(tok) = self.tokens.last_mut() {
            tok.text.push_str(text);
            tok.src.length += text.len() as u32;
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn get(&self, idx: usize) -> &Token {
        &self.tokens[idx]
    }

    /// The source reference of the most recently added token, or a zeroed
    /// reference into `file` if the stream is empty.
    pub fn current_src_ref(&self, file: FileId) -> SourceRef {
        self.tokens.last().map(|t| t.src).unwrap_or_else(|| SourceRef::zero(file))
    }

    /// Concatenates the text of every token on line `line`, in order.
    /// Returns an empty string if no token occupies that line.
    pub fn get_line(&self, line: u32) -> String {
        match self.by_line.get(&line) {
            Some(indices) => indices.iter().map(|&i| self.tokens[i].text.as_str()).collect(),
            None => String::new(),
        }
    }

    /// Returns `(line, text)` pairs for every line from `start` to `end`
    /// inclusive, skipping lines before 1.
    pub fn context(&self, start: i64, end: i64) -> Vec<(u32, String)> {
        let start = start.max(1) as u32;
        if end < start as i64 {
            return Vec::new();
        }
        let end = end as u32;
        (start..=end).map(|l| (l, self.get_line(l))).collect()
    }

    /// Reconstructs the full source text by concatenating every token's
    /// text in stream order. This is the round-trip property from
    /// `SPEC_FULL.md` §8.
    pub fn reconstruct(&self) -> String {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream_with(file: FileId, lines: &[(TokenKind, &str, u32, u32)]) -> TokenStream {
        let mut ts = TokenStream::new();
        for &(kind, text, line, col) in lines {
            ts.add_token(kind, text, file, line, col);
        }
        ts
    }

    #[test]
    fn add_token_is_append_only_in_order() {
        let mut files = crate::source::FileTable::new();
        let f = files.intern("a.gy");
        let ts = stream_with(
            f,
            &[
                (TokenKind::KwFn, "fn", 1, 0),
                (TokenKind::Whitespace, " ", 1, 2),
                (TokenKind::Identifier, "main", 1, 3),
            ],
        );
        assert_eq!(ts.tokens().len(), 3);
        assert_eq!(ts.tokens()[0].text, "fn");
        assert_eq!(ts.tokens()[2].text, "main");
    }

    #[test]
    fn append_to_last_extends_final_token() {
        let mut files = crate::source::FileTable::new();
        let f = files.intern("a.gy");
        let mut ts = TokenStream::new();
        ts.add_token(TokenKind::CommentMultiLine, "/* one", f, 1, 0);
        ts.append_to_last("\ntwo */");
        assert_eq!(ts.tokens()[0].text, "/* one\ntwo */");
    }

    #[test]
    fn append_to_last_on_empty_stream_is_noop() {
        let mut ts = TokenStream::new();
        ts.append_to_last("anything");
        assert!(ts.tokens().is_empty());
    }

    #[test]
    fn get_line_concatenates_tokens_on_that_line() {
        let mut files = crate::source::FileTable::new();
        let f = files.intern("a.gy");
        let ts = stream_with(
            f,
            &[
                (TokenKind::KwFn, "fn", 1, 0),
                (TokenKind::Whitespace, " ", 1, 2),
                (TokenKind::Identifier, "f", 1, 3),
                (TokenKind::LBrace, "{", 2, 0),
            ],
        );
        assert_eq!(ts.get_line(1), "fn f");
        assert_eq!(ts.get_line(2), "{");
        assert_eq!(ts.get_line(3), "");
    }

    #[test]
    fn context_returns_requested_range_clamped_to_one() {
        let mut files = crate::source::FileTable::new();
        let f = files.intern("a.gy");
        let ts = stream_with(
            f,
            &[
                (TokenKind::KwFn, "fn", 1, 0),
                (TokenKind::Identifier, "f", 2, 0),
                (TokenKind::LBrace, "{", 3, 0),
            ],
        );
        let ctx = ts.context(-1, 2);
        assert_eq!(ctx, vec![(1, "fn".to_string()), (2, "f".to_string())]);
    }

    #[test]
    fn reconstruct_round_trips_source_byte_for_byte() {
        let mut files = crate::source::FileTable::new();
        let f = files.intern("a.gy");
        let source = "fn main() {\n    return 0;\n}\n";
        let mut ts = TokenStream::new();
        // A hand-fed tokenization; production code would come from the
        // external lexer, but the round-trip property only depends on the
        // stream faithfully storing whatever text it's given.
        for (i, piece) in ["fn", " ", "main", "()", " ", "{\n    return 0;\n}\n"]
            .iter()
            .enumerate()
        {
            ts.add_token(TokenKind::Identifier, *piece, f, 1 + i as u32, 0);
        }
        assert_eq!(ts.reconstruct(), source);
    }
}
