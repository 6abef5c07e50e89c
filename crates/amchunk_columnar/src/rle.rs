//! Run-length groups.
//!
//! Every RLE column body is a sequence of groups, each introduced by a
//! signed LEB128 count:
//!
//! ```text
//! count > 0   payload            the payload repeated `count` times
//! count < 0   payload * -count   literal payloads, one per value
//! count = 0   n (ULEB128)        n nulls
//! ```
//!
//! Boolean columns are different: they hold plain ULEB128 run lengths of
//! alternating values, starting with `false`.

use amchunk_codec::leb128::{scan_sleb, scan_uleb, sleb_field, uleb_field};
use amchunk_codec::{Diagnostic, DiagnosticKind, Field};

use crate::config::DecodeConfig;

/// Decodes the payloads that follow a run header.
///
/// Repeated and literal payloads may decode to different types, which lets
/// delta columns report the span a repeated step covers.
pub trait RunPayload<'a> {
    /// Value of a repeated run.
    type Repeat;
    /// Value of one literal item.
    type Literal;

    /// Decodes the payload of a run repeated `count` times.
    fn repeated(&mut self, input: &'a [u8], count: u64) -> (Field<'a, Self::Repeat>, &'a [u8]);

    /// Decodes one literal payload.
    fn literal(&mut self, input: &'a [u8]) -> (Field<'a, Self::Literal>, &'a [u8]);
}

/// A repeated payload and its count.
#[derive(Debug, Clone, PartialEq)]
pub struct Repeated<T> {
    /// How many times the value repeats.
    pub count: u64,
    /// The repeated value.
    pub value: T,
}

/// One decoded run-length group.
#[derive(Debug, Clone, PartialEq)]
pub enum Run<'a, R, L = R> {
    /// A null run. The field spans the zero count and the null count.
    Null(Field<'a, u64>),
    /// A repeated value. The field spans the count and the payload.
    Repeat(Field<'a, Repeated<R>>),
    /// Literal values. The header spans only the count.
    Literal {
        /// Number of literals announced.
        header: Field<'a, u64>,
        /// The literals, each spanning its own payload.
        items: Vec<Field<'a, L>>,
    },
}

impl<'a, R, L> Run<'a, R, L> {
    /// Total bytes this run consumed.
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::Null(field) => field.bytes.len(),
            Self::Repeat(field) => field.bytes.len(),
            Self::Literal { header, items } => {
                header.bytes.len() + items.iter().map(|i| i.bytes.len()).sum::<usize>()
            }
        }
    }
}

/// Walks every run-length group of `input`.
pub fn decode_runs<'a, P: RunPayload<'a>>(
    input: &'a [u8],
    config: &DecodeConfig,
    payload: &mut P,
) -> Vec<Run<'a, P::Repeat, P::Literal>> {
    let mut runs = Vec::new();
    let mut rest = input;

    while !rest.is_empty() {
        let start = rest;
        let count = scan_sleb(start);
        let mut header_diags = Vec::new();
        if let Some(err) = count.error {
            header_diags.push(Diagnostic::varint(err).in_field("length"));
        }

        if count.value == 0 {
            let nulls = scan_uleb(count.rest);
            if let Some(err) = nulls.error {
                header_diags.push(Diagnostic::varint(err).in_field("null"));
            }
            let mut field = Field::new(consumed(start, nulls.rest), nulls.value);
            field.extend(header_diags);
            runs.push(Run::Null(field));
            rest = nulls.rest;
        } else if count.value > 0 {
            let n = count.value.unsigned_abs();
            let (item, after) = payload.repeated(count.rest, n);
            let mut field = Field::new(
                consumed(start, after),
                Repeated {
                    count: n,
                    value: item.value,
                },
            );
            field.extend(header_diags);
            field.extend(item.diagnostics);
            runs.push(Run::Repeat(field));
            rest = after;
        } else {
            let n = count.value.unsigned_abs();
            let mut header = Field::new(consumed(start, count.rest), n);
            header.extend(header_diags);
            rest = count.rest;

            let mut items = Vec::new();
            let mut remaining = n;
            while remaining > 0 {
                if rest.is_empty() {
                    header.push(Diagnostic::error(DiagnosticKind::MissingItems { remaining }));
                    break;
                }
                if items.len() >= config.max_expanded_values {
                    header.push(Diagnostic::error(DiagnosticKind::TooManyValues {
                        limit: config.max_expanded_values,
                    }));
                    break;
                }
                let (item, after) = payload.literal(rest);
                items.push(item);
                rest = after;
                remaining -= 1;
            }
            runs.push(Run::Literal { header, items });
        }
    }

    runs
}

fn consumed<'a>(start: &'a [u8], rest: &'a [u8]) -> &'a [u8] {
    &start[..start.len() - rest.len()]
}

/// Payload decoder for columns whose repeated and literal values share one
/// encoding.
pub struct Plain<F>(pub F);

impl<'a, T, F> RunPayload<'a> for Plain<F>
where
    F: FnMut(&'a [u8]) -> (Field<'a, T>, &'a [u8]),
{
    type Repeat = T;
    type Literal = T;

    fn repeated(&mut self, input: &'a [u8], _count: u64) -> (Field<'a, T>, &'a [u8]) {
        (self.0)(input)
    }

    fn literal(&mut self, input: &'a [u8]) -> (Field<'a, T>, &'a [u8]) {
        (self.0)(input)
    }
}

/// Decodes a ULEB128 integer column (group, actor and plain integers).
pub fn decode_uleb_runs<'a>(input: &'a [u8], config: &DecodeConfig) -> Vec<Run<'a, u64>> {
    decode_runs(input, config, &mut Plain(|b| uleb_field(b, Some("value"))))
}

/// A repeated delta step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeltaStep {
    /// The delta applied each step.
    pub delta: i64,
    /// Running value after the first step.
    pub first: i64,
    /// Running value after the last step.
    pub last: i64,
}

/// A literal delta and the running value it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeltaValue {
    /// The delta.
    pub delta: i64,
    /// Running value after applying it.
    pub value: i64,
}

/// Accumulates deltas into a running value.
#[derive(Debug, Default)]
pub struct DeltaAccumulator {
    running: i64,
}

impl DeltaAccumulator {
    /// Starts at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current running value.
    pub fn running(&self) -> i64 {
        self.running
    }

    fn check(value: Option<i64>, fallback: i64, diagnostics: &mut Vec<Diagnostic>) -> i64 {
        match value {
            Some(v) => {
                if v < 0 {
                    diagnostics.push(
                        Diagnostic::warning(DiagnosticKind::NegativeRunningValue).in_field("rle"),
                    );
                }
                v
            }
            None => {
                diagnostics
                    .push(Diagnostic::error(DiagnosticKind::RunningValueOverflow).in_field("rle"));
                fallback
            }
        }
    }
}

impl<'a> RunPayload<'a> for DeltaAccumulator {
    type Repeat = DeltaStep;
    type Literal = DeltaValue;

    fn repeated(&mut self, input: &'a [u8], count: u64) -> (Field<'a, DeltaStep>, &'a [u8]) {
        let (mut field, rest) = sleb_field(input, Some("delta"));
        let delta = field.value;
        let first = self.running.wrapping_add(delta);
        let total = i64::try_from(count)
            .ok()
            .and_then(|n| delta.checked_mul(n))
            .and_then(|span| self.running.checked_add(span));
        let fallback = self
            .running
            .wrapping_add(delta.wrapping_mul(count as i64));
        let last = Self::check(total, fallback, &mut field.diagnostics);
        self.running = last;
        (field.map(|_| DeltaStep { delta, first, last }), rest)
    }

    fn literal(&mut self, input: &'a [u8]) -> (Field<'a, DeltaValue>, &'a [u8]) {
        let (mut field, rest) = sleb_field(input, Some("value"));
        let delta = field.value;
        let value = Self::check(
            self.running.checked_add(delta),
            self.running.wrapping_add(delta),
            &mut field.diagnostics,
        );
        self.running = value;
        (field.map(|_| DeltaValue { delta, value }), rest)
    }
}

/// Decodes a delta column.
pub fn decode_delta_runs<'a>(
    input: &'a [u8],
    config: &DecodeConfig,
) -> Vec<Run<'a, DeltaStep, DeltaValue>> {
    decode_runs(input, config, &mut DeltaAccumulator::new())
}

/// A run of one boolean value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoolRun {
    /// The value of this run.
    pub value: bool,
    /// Its length.
    pub count: u64,
}

/// Decodes a boolean column: alternating run lengths starting at `false`.
pub fn decode_bool_runs(input: &[u8]) -> Vec<Field<'_, BoolRun>> {
    let mut runs = Vec::new();
    let mut current = false;
    let mut rest = input;
    while !rest.is_empty() {
        let (field, after) = uleb_field(rest, Some("length"));
        runs.push(field.map(|count| BoolRun {
            value: current,
            count,
        }));
        current = !current;
        rest = after;
    }
    runs
}

/// Expands boolean runs into individual values, up to `limit`.
pub fn expand_bools(runs: &[Field<'_, BoolRun>], limit: usize) -> Vec<bool> {
    let mut out = Vec::new();
    for run in runs {
        let room = limit.saturating_sub(out.len());
        let take = usize::try_from(run.value.count).map_or(room, |n| n.min(room));
        out.extend(std::iter::repeat(run.value.value).take(take));
    }
    out
}

/// Reads one length-prefixed string payload.
pub fn string_field(input: &[u8]) -> (Field<'_, String>, &[u8]) {
    let len = scan_uleb(input);
    let mut diagnostics = Vec::new();
    if let Some(err) = len.error {
        diagnostics.push(Diagnostic::varint(err).in_field("value"));
    }

    let available = len.rest.len();
    let take = match usize::try_from(len.value) {
        Ok(n) if n <= available => n,
        _ => {
            diagnostics.push(
                Diagnostic::error(DiagnosticKind::NotEnoughBytes {
                    needed: len.value,
                    available,
                })
                .in_field("string"),
            );
            available
        }
    };

    let (text, rest) = len.rest.split_at(take);
    let value = match std::str::from_utf8(text) {
        Ok(s) => s.to_string(),
        Err(_) => {
            diagnostics.push(Diagnostic::error(DiagnosticKind::InvalidUtf8).in_field("utf8"));
            String::from_utf8_lossy(text).into_owned()
        }
    };

    let mut field = Field::new(consumed(input, rest), value);
    field.extend(diagnostics);
    (field, rest)
}

/// Decodes a string column.
pub fn decode_string_runs<'a>(input: &'a [u8], config: &DecodeConfig) -> Vec<Run<'a, String>> {
    decode_runs(input, config, &mut Plain(string_field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use amchunk_codec::{write_sleb, VarintError};

    fn config() -> DecodeConfig {
        DecodeConfig::default()
    }

    #[test]
    fn bool_runs_alternate() {
        let runs = decode_bool_runs(&[3, 2]);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].value, BoolRun { value: false, count: 3 });
        assert_eq!(runs[1].value, BoolRun { value: true, count: 2 });
        assert_eq!(
            expand_bools(&runs, usize::MAX),
            vec![false, false, false, true, true]
        );
    }

    #[test]
    fn expand_bools_respects_limit() {
        let runs = decode_bool_runs(&[0x80, 0x80, 0x04]);
        assert_eq!(expand_bools(&runs, 10).len(), 10);
    }

    #[test]
    fn uleb_repeat_literal_and_null() {
        // 3 x 7, literals [1, 300], 2 nulls
        let input = [3, 7, 0x7e, 1, 0xac, 0x02, 0, 2];
        let runs = decode_uleb_runs(&input, &config());
        assert_eq!(runs.len(), 3);

        match &runs[0] {
            Run::Repeat(f) => {
                assert_eq!(f.value, Repeated { count: 3, value: 7 });
                assert_eq!(f.bytes, &[3, 7]);
            }
            other => panic!("unexpected {other:?}"),
        }
        match &runs[1] {
            Run::Literal { header, items } => {
                assert_eq!(header.value, 2);
                assert_eq!(header.bytes, &[0x7e]);
                let values: Vec<u64> = items.iter().map(|i| i.value).collect();
                assert_eq!(values, vec![1, 300]);
            }
            other => panic!("unexpected {other:?}"),
        }
        match &runs[2] {
            Run::Null(f) => assert_eq!(f.value, 2),
            other => panic!("unexpected {other:?}"),
        }

        let total: usize = runs.iter().map(Run::encoded_len).sum();
        assert_eq!(total, input.len());
    }

    #[test]
    fn literal_count_beyond_input() {
        let runs = decode_uleb_runs(&[0x7d, 1], &config());
        match &runs[0] {
            Run::Literal { header, items } => {
                assert_eq!(items.len(), 1);
                assert_eq!(
                    header.diagnostics[0].kind,
                    DiagnosticKind::MissingItems { remaining: 2 }
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn literal_count_capped() {
        let mut input = write_sleb(-5);
        input.extend([1, 2, 3, 4, 5]);
        let limited = DecodeConfig::new().with_max_expanded_values(2);
        let runs = decode_uleb_runs(&input, &limited);
        assert!(matches!(
            &runs[0],
            Run::Literal { header, items }
                if items.len() == 2
                    && header.diagnostics[0].kind == DiagnosticKind::TooManyValues { limit: 2 }
        ));
    }

    #[test]
    fn truncated_header_reports_both_parts() {
        let runs = decode_uleb_runs(&[0x80], &config());
        match &runs[0] {
            Run::Null(f) => {
                assert_eq!(
                    f.annotations(),
                    "(length error: failed to find end of LEB) (null error: failed to find end of LEB)"
                );
                assert_eq!(f.bytes, &[0x80]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn delta_runs_accumulate() {
        // start 10, then 3 steps of +2, then literals -1, +5
        let mut input = Vec::new();
        input.extend(write_sleb(-1));
        input.extend(write_sleb(10));
        input.extend(write_sleb(3));
        input.extend(write_sleb(2));
        input.extend(write_sleb(-2));
        input.extend(write_sleb(-1));
        input.extend(write_sleb(5));
        let runs = decode_delta_runs(&input, &config());
        assert_eq!(runs.len(), 3);

        match &runs[1] {
            Run::Repeat(f) => {
                assert_eq!(f.value.count, 3);
                assert_eq!(
                    f.value.value,
                    DeltaStep {
                        delta: 2,
                        first: 12,
                        last: 16
                    }
                );
            }
            other => panic!("unexpected {other:?}"),
        }
        match &runs[2] {
            Run::Literal { items, .. } => {
                assert_eq!(items[0].value, DeltaValue { delta: -1, value: 15 });
                assert_eq!(items[1].value, DeltaValue { delta: 5, value: 20 });
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn negative_running_value_is_warning() {
        let mut input = write_sleb(2);
        input.extend(write_sleb(-3));
        let runs = decode_delta_runs(&input, &config());
        match &runs[0] {
            Run::Repeat(f) => {
                assert_eq!(f.value.value.last, -6);
                assert_eq!(f.annotations(), "(rle warning: i < 0)");
                assert!(!f.diagnostics[0].is_error());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn delta_overflow_detected() {
        let mut input = write_sleb(-2);
        input.extend(write_sleb(i64::MAX));
        input.extend(write_sleb(1));
        let runs = decode_delta_runs(&input, &config());
        match &runs[0] {
            Run::Literal { items, .. } => {
                assert!(items[0].is_clean());
                assert_eq!(
                    items[1].diagnostics[0].kind,
                    DiagnosticKind::RunningValueOverflow
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn strings_decode_and_flag_problems() {
        let mut input = write_sleb(-3);
        input.extend([2, b'h', b'i']);
        input.extend([1, 0xff]);
        input.extend([5, b'x']);
        let runs = decode_string_runs(&input, &config());
        match &runs[0] {
            Run::Literal { items, .. } => {
                assert_eq!(items[0].value, "hi");
                assert!(items[0].is_clean());
                assert_eq!(items[1].value, "\u{fffd}");
                assert_eq!(items[1].annotations(), "(utf8 error: invalid utf-8)");
                assert_eq!(items[2].value, "x");
                assert_eq!(
                    items[2].diagnostics[0].kind,
                    DiagnosticKind::NotEnoughBytes {
                        needed: 5,
                        available: 1
                    }
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn malformed_value_varint() {
        let mut input = write_sleb(1);
        input.extend([0x80, 0x00]);
        let runs = decode_uleb_runs(&input, &config());
        match &runs[0] {
            Run::Repeat(f) => assert_eq!(
                f.diagnostics[0].kind,
                DiagnosticKind::MalformedVarint(VarintError::Overlong)
            ),
            other => panic!("unexpected {other:?}"),
        }
    }
}
