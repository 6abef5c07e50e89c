//! LEB128 variable-length integers.
//!
//! Two flavours of reader are provided. [`read_uleb`] and [`read_sleb`] are
//! strict and return an error for any malformed sequence. [`scan_uleb`] and
//! [`scan_sleb`] never fail: they return the best-effort value and the
//! remaining input together with the error, so an inspector can annotate the
//! problem and keep walking.
//!
//! ## Validation
//!
//! - A sequence that runs off the end of the input is [`VarintError::Truncated`]
//!   and consumes all of it.
//! - A terminal byte that a minimal encoding would not need is
//!   [`VarintError::Overlong`] (for example `[0x80, 0x00]` for zero).
//! - More than ten groups, or a tenth group with bits above bit 63, is
//!   [`VarintError::Overflow`].

use crate::diagnostic::{Diagnostic, Field};
use crate::error::VarintError;

const CONTINUATION: u8 = 0x80;
const PAYLOAD: u8 = 0x7f;
const SIGN: u8 = 0x40;
const MAX_GROUPS: u32 = 10;

/// Outcome of a lenient varint read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scan<'a, T> {
    /// Decoded value. Zero when the input was truncated.
    pub value: T,
    /// Input following the varint.
    pub rest: &'a [u8],
    /// What was wrong with the encoding, if anything.
    pub error: Option<VarintError>,
}

impl<'a, T> Scan<'a, T> {
    /// Converts to a strict result.
    pub fn into_result(self) -> Result<(T, &'a [u8]), VarintError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok((self.value, self.rest)),
        }
    }

    /// Converts into a [`Field`] spanning the consumed prefix of `input`.
    ///
    /// `input` must be the slice the scan was performed on.
    pub fn into_field(self, input: &'a [u8], context: Option<&'static str>) -> (Field<'a, T>, &'a [u8]) {
        let consumed = &input[..input.len() - self.rest.len()];
        let mut field = Field::new(consumed, self.value);
        if let Some(err) = self.error {
            let diagnostic = Diagnostic::varint(err);
            field.push(match context {
                Some(ctx) => diagnostic.in_field(ctx),
                None => diagnostic,
            });
        }
        (field, self.rest)
    }
}

#[inline]
fn shl(value: u64, shift: u32) -> u64 {
    value.checked_shl(shift).unwrap_or(0)
}

/// Reads an unsigned LEB128 value without failing.
pub fn scan_uleb(input: &[u8]) -> Scan<'_, u64> {
    let mut value = 0u64;
    let mut groups = 0u32;

    for (i, &byte) in input.iter().enumerate() {
        value |= shl(u64::from(byte & PAYLOAD), groups.saturating_mul(7));
        groups = groups.saturating_add(1);

        if byte & CONTINUATION == 0 {
            let error = if byte == 0 && groups > 1 {
                Some(VarintError::Overlong)
            } else if groups > MAX_GROUPS || (groups == MAX_GROUPS && byte & 0x7e != 0) {
                Some(VarintError::Overflow)
            } else {
                None
            };
            return Scan {
                value,
                rest: &input[i + 1..],
                error,
            };
        }
    }

    Scan {
        value: 0,
        rest: &[],
        error: Some(VarintError::Truncated),
    }
}

/// Reads a signed LEB128 value without failing.
#[allow(clippy::cast_possible_wrap)]
pub fn scan_sleb(input: &[u8]) -> Scan<'_, i64> {
    let mut value = 0u64;
    let mut groups = 0u32;
    let mut prev = 0u8;

    for (i, &byte) in input.iter().enumerate() {
        value |= shl(u64::from(byte & PAYLOAD), groups.saturating_mul(7));
        groups = groups.saturating_add(1);

        if byte & CONTINUATION == 0 {
            if byte & SIGN != 0 {
                value |= shl(u64::MAX, groups.saturating_mul(7));
            }

            // A minimal encoding never ends in a byte that only repeats the
            // sign already carried by bit 6 of the previous group.
            let redundant = (prev & SIGN == 0 && byte == 0) || (prev & SIGN != 0 && byte == PAYLOAD);
            let error = if groups > 1 && redundant {
                Some(VarintError::Overlong)
            } else if groups > MAX_GROUPS
                || (groups == MAX_GROUPS && byte & PAYLOAD != 0 && byte & PAYLOAD != PAYLOAD)
            {
                Some(VarintError::Overflow)
            } else {
                None
            };
            return Scan {
                value: value as i64,
                rest: &input[i + 1..],
                error,
            };
        }
        prev = byte;
    }

    Scan {
        value: 0,
        rest: &[],
        error: Some(VarintError::Truncated),
    }
}

/// Reads an unsigned LEB128 value.
///
/// # Errors
///
/// Returns an error if the sequence is truncated, overlong or overflows.
pub fn read_uleb(input: &[u8]) -> Result<(u64, &[u8]), VarintError> {
    scan_uleb(input).into_result()
}

/// Reads a signed LEB128 value.
///
/// # Errors
///
/// Returns an error if the sequence is truncated, overlong or overflows.
pub fn read_sleb(input: &[u8]) -> Result<(i64, &[u8]), VarintError> {
    scan_sleb(input).into_result()
}

/// Reads an unsigned LEB128 value as a [`Field`].
pub fn uleb_field<'a>(input: &'a [u8], context: Option<&'static str>) -> (Field<'a, u64>, &'a [u8]) {
    scan_uleb(input).into_field(input, context)
}

/// Reads a signed LEB128 value as a [`Field`].
pub fn sleb_field<'a>(input: &'a [u8], context: Option<&'static str>) -> (Field<'a, i64>, &'a [u8]) {
    scan_sleb(input).into_field(input, context)
}

/// Appends the unsigned LEB128 encoding of `value` to `buf`.
#[allow(clippy::cast_possible_truncation)]
pub fn write_uleb_into(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & u64::from(PAYLOAD)) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | CONTINUATION);
    }
}

/// Appends the signed LEB128 encoding of `value` to `buf`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn write_sleb_into(buf: &mut Vec<u8>, mut value: i64) {
    loop {
        let byte = (value & i64::from(PAYLOAD)) as u8;
        value >>= 7;
        let done = (value == 0 && byte & SIGN == 0) || (value == -1 && byte & SIGN != 0);
        if done {
            buf.push(byte);
            return;
        }
        buf.push(byte | CONTINUATION);
    }
}

/// Encodes `value` as unsigned LEB128.
pub fn write_uleb(value: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(10);
    write_uleb_into(&mut buf, value);
    buf
}

/// Encodes `value` as signed LEB128.
pub fn write_sleb(value: i64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(10);
    write_sleb_into(&mut buf, value);
    buf
}
