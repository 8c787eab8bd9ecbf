//! Integer literal parsing.
//!
//! Handles the `0x`/`0o`/`0b` prefixes, an optional `u`/`l`/`ul` suffix, and
//! underscore digit separators. An unsuffixed literal is typed with the
//! smallest of `i32`, `i64`, `u64` (in that order) that can hold its value;
//! a suffix pins the type outright. Overflow past `u64` is reported rather
//! than silently wrapped.

use crate::types::IntWidth;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LiteralError {
    Overflow,
    EmptyDigits,
    InvalidDigit,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct IntLiteral {
    pub value: u64,
    pub negative: bool,
    /// `None` for an unsuffixed literal whose width is inferred by the
    /// smallest-fitting rule; `Some` when an explicit suffix pinned it.
    pub suffix: Option<IntWidth>,
}

/// Parses an integer literal's text (without a leading sign; negation is a
/// unary operator applied afterward, not part of the literal grammar).
pub fn parse_int_literal(text: &str) -> Result<IntLiteral, LiteralError> {
    let (digits, radix) = strip_prefix(text);
    let (digits, suffix) = strip_suffix(digits);
    if digits.is_empty() {
        return Err(LiteralError::EmptyDigits);
    }
    let cleaned: String = digits.chars().filter(|&c| c != '_').collect();
    if cleaned.is_empty() {
        return Err(LiteralError::EmptyDigits);
    }
    let value = u64::from_str_radix(&cleaned, radix).map_err(|_| {
        if cleaned.chars().all(|c| c.is_digit(radix)) {
            LiteralError::Overflow
        } else {
            LiteralError::InvalidDigit
        }
    })?;
    Ok(IntLiteral { value, negative: false, suffix })
}

fn strip_prefix(text: &str) -> (&str, u32) {
    if let Some(rest) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        (rest, 16)
    } else if let Some(rest) = text.strip_prefix("0o").or_else(|| text.strip_prefix("0O")) {
        (rest, 8)
    } else if let Some(rest) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        (rest, 2)
    } else {
        (text, 10)
    }
}

fn strip_suffix(text: &str) -> (&str, Option<IntWidth>) {
    let lower = text.to_ascii_lowercase();
    for (suffix, width) in [("ul", IntWidth::U64), ("u", IntWidth::U32), ("l", IntWidth::I64)] {
        if lower.ends_with(suffix) && text.len() > suffix.len() {
            return (&text[..text.len() - suffix.len()], Some(width));
        }
    }
    (text, None)
}

/// Picks the smallest of i32/i64/u64 (in that order) that can represent
/// `value`. Callers apply this when `suffix` is `None`.
pub fn infer_width(value: u64) -> IntWidth {
    if value <= i32::MAX as u64 {
        IntWidth::I32
    } else if value <= i64::MAX as u64 {
        IntWidth::I64
    } else {
        IntWidth::U64
    }
}
