use crate::error::{EngineError, Result};

/// Parsed form of the `<index | index,index | ALL>` addressing grammar.
///
/// Indices are typed 1-based by the user. The first bound of a parsed value
/// is already normalized to 0-based; negative bounds stay verbatim and count
/// from the end of the sequence. A span's end bound is kept verbatim as an
/// exclusive bound, with `0` meaning "through the end".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeDirective {
    All,
    Single(i64),
    Span(i64, i64),
}

impl RangeDirective {
    /// Parses a bare range token (no surrounding brackets).
    pub fn parse(token: &str) -> Result<Self> {
        let token = token.trim();
        if token.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        let parts: Vec<&str> = token.split(',').map(str::trim).collect();
        match parts.as_slice() {
            [single] => Ok(Self::Single(first_bound(parse_bound(single, token)?)?)),
            [a, b] => Ok(Self::Span(
                first_bound(parse_bound(a, token)?)?,
                parse_bound(b, token)?,
            )),
            _ => Err(invalid(token)),
        }
    }

    /// Whether a token matches the range grammar, before value checks. Used
    /// by scanners to decide if a bracket group is a range at all; a zero
    /// first bound passes here and is rejected by [`RangeDirective::parse`].
    pub fn matches_grammar(token: &str) -> bool {
        let token = token.trim();
        if token.eq_ignore_ascii_case("all") {
            return true;
        }
        let parts: Vec<&str> = token.split(',').collect();
        (1..=2).contains(&parts.len()) && parts.iter().all(|p| is_signed_integer(p.trim()))
    }

    /// Slice of a sequence of length `len` this directive copies, as a
    /// half-open `[start, end)` pair.
    ///
    /// `Single(n >= 0)` selects the prefix `[0, n)`; `Single(n < 0)` selects
    /// the last `|n|` elements. Bounds clamp into the sequence and inverted
    /// spans come back empty.
    pub fn copy_bounds(&self, len: usize) -> (usize, usize) {
        match *self {
            Self::All => (0, len),
            Self::Single(n) if n >= 0 => (0, resolve_bound(n, len)),
            Self::Single(n) => (resolve_bound(n, len), len),
            Self::Span(a, b) => span_bounds(a, b, len),
        }
    }

    /// Slice of a sequence of length `len` this directive removes.
    ///
    /// Unlike [`RangeDirective::copy_bounds`], `Single` is a one-element
    /// selector here: the element at that index (end-relative when
    /// negative). Out-of-range indices clamp and remove nothing.
    pub fn removal_bounds(&self, len: usize) -> (usize, usize) {
        match *self {
            Self::All => (0, len),
            Self::Single(n) => {
                let idx = resolve_bound(n, len);
                (idx, (idx + 1).min(len))
            }
            Self::Span(a, b) => span_bounds(a, b, len),
        }
    }
}

fn span_bounds(a: i64, b: i64, len: usize) -> (usize, usize) {
    let start = resolve_bound(a, len);
    let end = if b == 0 { len } else { resolve_bound(b, len) };
    (start, end.max(start))
}

/// Clamps a signed 0-based bound into `[0, len]`, resolving negative values
/// from the end of the sequence.
fn resolve_bound(n: i64, len: usize) -> usize {
    if n >= 0 {
        (n as usize).min(len)
    } else {
        len.saturating_sub(n.unsigned_abs() as usize)
    }
}

/// Applies the 1-based to 0-based shift to a range's first bound. Zero is
/// rejected; negative values stay verbatim (end-relative).
fn first_bound(n: i64) -> Result<i64> {
    match n {
        0 => Err(EngineError::Validation(
            "First number in the range can not be zero!".to_string(),
        )),
        n if n > 0 => Ok(n - 1),
        n => Ok(n),
    }
}

fn parse_bound(part: &str, token: &str) -> Result<i64> {
    if !is_signed_integer(part) {
        return Err(invalid(token));
    }
    part.parse().map_err(|_| invalid(token))
}

fn is_signed_integer(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn invalid(token: &str) -> EngineError {
    EngineError::Validation(format!("`{token}` is not a valid range."))
}
