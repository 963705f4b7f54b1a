//! Glob Pattern Module
//!
//! Shell-style key patterns for `clear_pattern`, using the same syntax the
//! Redis `SCAN MATCH` option understands:
//!
//! - `*` matches any run of characters (including none)
//! - `?` matches exactly one character
//! - `[abc]`, `[a-z]`, `[^a]` match one character from (or outside) a class
//! - `\x` matches `x` literally
//!
//! Local matching works on characters while Redis matches bytes, so `?` and
//! classes can select different keys on the two backends when keys contain
//! non-ASCII text: locally `?` matches `é`, in Redis it needs `??`.

use regex::Regex;

use crate::error::{CacheError, Result};

// == Glob Pattern ==
/// A validated glob, compiled for local matching.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    raw: String,
    regex: Regex,
}

impl GlobPattern {
    // == Parse ==
    /// Validates and compiles a glob.
    ///
    /// Empty patterns, unterminated classes, reversed ranges and trailing
    /// escapes are rejected with [`CacheError::InvalidPattern`].
    pub fn parse(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(CacheError::invalid_pattern(pattern, "pattern is empty"));
        }

        let translated = translate(pattern)?;
        let regex = Regex::new(&translated)
            .map_err(|e| CacheError::invalid_pattern(pattern, e.to_string()))?;

        Ok(Self {
            raw: pattern.to_string(),
            regex,
        })
    }

    /// Returns true if `key` matches the whole pattern.
    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    /// The pattern as written, suitable for `SCAN MATCH`.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The pattern scoped under a literal key prefix.
    pub fn with_prefix(&self, prefix: &str) -> String {
        format!("{}{}", escape(prefix), self.raw)
    }
}

impl std::fmt::Display for GlobPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

// == Escape ==
/// Escapes glob metacharacters so `literal` only matches itself.
pub fn escape(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    for c in literal.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn translate(pattern: &str) -> Result<String> {
    let mut out = String::from("(?s)^");
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '\\' => {
                let escaped = chars
                    .next()
                    .ok_or_else(|| CacheError::invalid_pattern(pattern, "trailing escape"))?;
                push_literal(&mut out, escaped);
            }
            '[' => {
                out.push('[');
                if chars.peek() == Some(&'^') {
                    chars.next();
                    out.push('^');
                }

                let mut members = 0usize;
                let mut closed = false;
                while let Some(c) = chars.next() {
                    let low = match c {
                        ']' => {
                            closed = true;
                            break;
                        }
                        '\\' => chars.next().ok_or_else(|| {
                            CacheError::invalid_pattern(pattern, "trailing escape")
                        })?,
                        other => other,
                    };

                    let mut lookahead = chars.clone();
                    let is_range = lookahead.next() == Some('-')
                        && lookahead.next().is_some_and(|next| next != ']');
                    if is_range {
                        chars.next();
                        let high = match chars.next() {
                            Some('\\') => chars.next().ok_or_else(|| {
                                CacheError::invalid_pattern(pattern, "trailing escape")
                            })?,
                            Some(high) => high,
                            None => {
                                return Err(CacheError::invalid_pattern(
                                    pattern,
                                    "unterminated character class",
                                ))
                            }
                        };
                        if low > high {
                            return Err(CacheError::invalid_pattern(
                                pattern,
                                format!("reversed range {low}-{high}"),
                            ));
                        }
                        push_class_char(&mut out, low);
                        out.push('-');
                        push_class_char(&mut out, high);
                    } else {
                        push_class_char(&mut out, low);
                    }
                    members += 1;
                }

                if !closed {
                    return Err(CacheError::invalid_pattern(
                        pattern,
                        "unterminated character class",
                    ));
                }
                if members == 0 {
                    return Err(CacheError::invalid_pattern(
                        pattern,
                        "empty character class",
                    ));
                }
                out.push(']');
            }
            other => push_literal(&mut out, other),
        }
    }

    out.push('$');
    Ok(out)
}

fn push_literal(out: &mut String, c: char) {
    let mut buf = [0u8; 4];
    out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}

fn push_class_char(out: &mut String, c: char) {
    if matches!(c, '\\' | ']' | '[' | '^' | '-' | '&' | '~') {
        out.push('\\');
    }
    out.push(c);
}
