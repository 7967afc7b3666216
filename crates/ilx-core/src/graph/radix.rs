//! Radix reference codec
//!
//! Node positions are written in base 36 (`0-9a-z`), without sign or fixed
//! width. Parameter references are the same digits behind a `$`.
//!
//! Two payload layouts exist:
//! - fixed arity (branch, loop, range): tokens are concatenated with no
//!   delimiter, every digit run left-padded to the widest one in the payload.
//!   A reader recovers the width as `(len - count('$')) / arity`.
//! - variable arity (arguments, elements, pairs): tokens separated by `,`.

use super::Ref;
use crate::{IlxError, Result};

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const RADIX: usize = 36;
const PARAM_MARKER: char = '$';

/// Encode a non-negative integer as a base-36 token
pub fn encode(mut value: usize) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(DIGITS[value % RADIX]);
        value /= RADIX;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Decode a base-36 token. Leading zeros are accepted.
pub fn decode(token: &str) -> Result<usize> {
    if token.is_empty() {
        return Err(IlxError::invalid_reference(token, "empty token"));
    }
    token.chars().try_fold(0usize, |acc, c| {
        let digit = c
            .to_digit(RADIX as u32)
            .filter(|_| !c.is_ascii_uppercase())
            .ok_or_else(|| IlxError::invalid_reference(token, "not a base-36 digit"))?;
        acc.checked_mul(RADIX)
            .and_then(|acc| acc.checked_add(digit as usize))
            .ok_or_else(|| IlxError::invalid_reference(token, "value overflows"))
    })
}

/// Token for a single reference
pub fn ref_token(reference: Ref) -> String {
    match reference {
        Ref::Node(position) => encode(position),
        Ref::Param(index) => format!("{PARAM_MARKER}{}", encode(index)),
    }
}

/// Parse a single, unpadded or padded, reference token
pub fn parse_ref(token: &str) -> Result<Ref> {
    match token.strip_prefix(PARAM_MARKER) {
        Some(digits) => Ok(Ref::Param(decode(digits)?)),
        None => Ok(Ref::Node(decode(token)?)),
    }
}

/// Concatenate a fixed-arity payload
pub fn encode_fixed(refs: &[Ref]) -> String {
    let digit_runs: Vec<(bool, String)> = refs
        .iter()
        .map(|r| match *r {
            Ref::Node(position) => (false, encode(position)),
            Ref::Param(index) => (true, encode(index)),
        })
        .collect();
    let width = digit_runs
        .iter()
        .map(|(_, digits)| digits.len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for (is_param, digits) in digit_runs {
        if is_param {
            out.push(PARAM_MARKER);
        }
        out.push_str(&format!("{digits:0>width$}"));
    }
    out
}

/// Split a fixed-arity payload back into references
pub fn decode_fixed(payload: &str, arity: usize) -> Result<Vec<Ref>> {
    if !payload.is_ascii() {
        return Err(IlxError::invalid_reference(payload, "not a base-36 payload"));
    }
    let markers = payload.matches(PARAM_MARKER).count();
    let digit_count = payload.len() - markers;
    if arity == 0 || digit_count == 0 || digit_count % arity != 0 {
        return Err(IlxError::invalid_reference(
            payload,
            "payload length does not match arity",
        ));
    }
    let width = digit_count / arity;

    let mut refs = Vec::with_capacity(arity);
    let mut rest = payload;
    for _ in 0..arity {
        let (is_param, digits_start) = match rest.strip_prefix(PARAM_MARKER) {
            Some(stripped) => (true, stripped),
            None => (false, rest),
        };
        if digits_start.len() < width {
            return Err(IlxError::invalid_reference(payload, "truncated payload"));
        }
        let (digits, tail) = digits_start.split_at(width);
        let value = decode(digits)?;
        refs.push(if is_param {
            Ref::Param(value)
        } else {
            Ref::Node(value)
        });
        rest = tail;
    }
    Ok(refs)
}

/// Join a variable-arity payload
pub fn encode_list(refs: &[Ref]) -> String {
    refs.iter()
        .map(|r| ref_token(*r))
        .collect::<Vec<_>>()
        .join(",")
}

/// Split a variable-arity payload
pub fn decode_list(payload: &str) -> Result<Vec<Ref>> {
    if payload.is_empty() {
        return Ok(Vec::new());
    }
    payload.split(',').map(parse_ref).collect()
}
