//! Diagnostic sink.
//!
//! An [`Error`] is an ordered list of [`Message`]s, each pointing at a
//! [`SourceRef`] and carrying prose. Messages are enriched with ±2 lines of
//! surrounding source at the moment they're added to an `Error`, drawn from
//! the shared [`TokenStream`], the same split the original `jlang-context`
//! errors module makes between the message and its `Errors`-owned
//! `TokenStream`.
//!
//! Diagnostics are append-only and never abort the pipeline; callers check
//! [`Diagnostics::has_errors`] to decide whether to proceed towards code
//! generation.

use crate::source::{FileTable, SourceRef};
use crate::token::TokenStream;
use std::fmt::Write as _;

/// One line of prose anchored to a source location, with its surrounding
/// context already attached.
#[derive(Clone, Debug)]
pub struct Message {
    pub src: SourceRef,
    pub prose: String,
    pub context: Vec<(u32, String)>,
}

impl Message {
    /// Builds a message and immediately draws ±2 lines of context around
    /// `src` from `tokens`.
    pub fn new(src: SourceRef, prose: impl Into<String>, tokens: &TokenStream) -> Self {
        let line = src.line as i64;
        let context = tokens.context(line - 2, line + 1);
        Self { src, prose: prose.into(), context }
    }
}

/// A single diagnostic: a headline plus the ordered messages that support
/// it (e.g. "at the goto", "at the label", "at the skipped declaration").
#[derive(Clone, Debug)]
pub struct Error {
    pub headline: String,
    pub messages: Vec<Message>,
}

impl Error {
    pub fn new(headline: impl Into<String>) -> Self {
        Self { headline: headline.into(), messages: Vec::new() }
    }

    pub fn with_message(mut self, src: SourceRef, prose: impl Into<String>, tokens: &TokenStream) -> Self {
        self.messages.push(Message::new(src, prose, tokens));
        self
    }
}

/// Append-only sink of [`Error`]s, in insertion order.
#[derive(Default)]
pub struct Diagnostics {
    errors: Vec<Error>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, error: Error) {
        self.errors.push(error);
    }

    /// Convenience for the common case of a headline with a single message.
    pub fn add_simple(
        &mut self,
        src: SourceRef,
        headline: impl Into<String>,
        prose: impl Into<String>,
        tokens: &TokenStream,
    ) {
        let headline = headline.into();
        self.add(Error::new(headline).with_message(src, prose, tokens));
    }

    pub fn size(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, i: usize) -> &Error {
        &self.errors[i]
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Renders every error to a single string in the `Error: <headline>`
    /// format from `SPEC_FULL.md` §6, honoring `use_color`.
    pub fn render(&self, files: &FileTable, use_color: bool) -> String {
        let mut out = String::new();
        for error in &self.errors {
            write_error(&mut out, error, files, use_color);
        }
        out
    }

    /// Prints every error to stderr.
    pub fn print(&self, files: &FileTable) {
        let use_color = std::env::var_os("NO_COLOR").is_none();
        eprint!("{}", self.render(files, use_color));
    }
}

fn bold_red(s: &str, use_color: bool) -> String {
    if use_color {
        format!("\x1b[1;31m{s}\x1b[0m")
    } else {
        s.to_string()
    }
}

fn write_error(out: &mut String, error: &Error, files: &FileTable, use_color: bool) {
    let _ = writeln!(out, "{}: {}", bold_red("Error", use_color), error.headline);
    for message in &error.messages {
        let filename = files.resolve(message.src.file);
        let _ = writeln!(out, "    --> {filename}:{}:{}", message.src.line, message.src.column);
        let line = message.src.line;
        let column = message.src.column as usize;
        for (line_no, text) in &message.context {
            let _ = write!(out, "{line_no:4}: {text}");
            if !text.ends_with('\n') {
                let _ = writeln!(out);
            }
            if *line_no == line {
                draw_arrow(out, column + 5);
                if column < 40 {
                    let wrapped = wrap_text(80 - column, &message.prose);
                    let indented = indent_text(column + 5, &wrapped);
                    let _ = writeln!(out, "{indented}");
                } else {
                    let wrapped = wrap_text(column, &message.prose);
                    let indented = indent_text(5, &wrapped);
                    let _ = writeln!(out, "{indented}");
                }
            }
        }
    }
    let _ = writeln!(out);
}

/// Two-line `^` / `|` marker, each padded to `column` spaces.
fn draw_arrow(out: &mut String, column: usize) {
    let pad = " ".repeat(column);
    let _ = writeln!(out, "{pad}^");
    let _ = writeln!(out, "{pad}|");
}

/// Breaks `input` onto a new line at the first whitespace run past
/// `max_width` columns, rather than at a fixed column — mirrors the
/// original line-length counter exactly, including its reset on break.
fn wrap_text(max_width: usize, input: &str) -> String {
    let mut wrapped = String::new();
    let mut linelen = 0usize;
    for c in input.chars() {
        linelen += 1;
        if c.is_whitespace() {
            if linelen > max_width {
                wrapped.push('\n');
                linelen = 0;
            } else {
                wrapped.push(c);
            }
        } else {
            wrapped.push(c);
        }
    }
    wrapped
}

/// Prefixes `input` with `indent` spaces, and re-applies that prefix after
/// every newline `wrap_text` introduced.
fn indent_text(indent: usize, input: &str) -> String {
    let pad = " ".repeat(indent);
    let mut out = String::new();
    out.push_str(&pad);
    for c in input.chars() {
        out.push(c);
        if c == '\n' {
            out.push_str(&pad);
        }
    }
    out
}
