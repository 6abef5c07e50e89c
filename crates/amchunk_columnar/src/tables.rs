//! Actor tables and head hashes, shared by document and change bodies.

use amchunk_codec::leb128::uleb_field;
use amchunk_codec::{Diagnostic, DiagnosticKind, Field};

/// Length of a change hash.
pub const HASH_LEN: usize = 32;

/// One length-prefixed actor id.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorEntry<'a> {
    /// The id length.
    pub length: Field<'a, u64>,
    /// The id bytes; everything that remained if the length was too long.
    pub id: Field<'a, &'a [u8]>,
}

impl<'a> ActorEntry<'a> {
    /// Reads one actor id.
    pub fn parse(input: &'a [u8]) -> (Self, &'a [u8]) {
        let (length, rest) = uleb_field(input, None);
        let (id, rest) = match usize::try_from(length.value) {
            Ok(n) if n <= rest.len() => {
                let (id, after) = rest.split_at(n);
                (Field::new(id, id), after)
            }
            _ => (
                Field::new(rest, rest).with(Diagnostic::error(DiagnosticKind::ActorIdTooLong)),
                &rest[rest.len()..],
            ),
        };
        (Self { length, id }, rest)
    }
}

/// A counted list of actor ids.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorTable<'a> {
    /// The number of actors declared.
    pub count: Field<'a, u64>,
    /// The actors read.
    pub actors: Vec<ActorEntry<'a>>,
}

impl<'a> ActorTable<'a> {
    /// An empty table spanning no bytes.
    pub fn empty() -> Self {
        Self {
            count: Field::new(&[], 0),
            actors: Vec::new(),
        }
    }

    /// Reads a count and that many actor ids.
    pub fn parse(input: &'a [u8]) -> (Self, &'a [u8]) {
        let (mut count, mut rest) = uleb_field(input, None);
        let mut actors = Vec::new();
        let mut remaining = count.value;
        while remaining > 0 {
            if rest.is_empty() {
                count.push(Diagnostic::error(DiagnosticKind::MissingItems { remaining }));
                break;
            }
            let (actor, after) = ActorEntry::parse(rest);
            actors.push(actor);
            rest = after;
            remaining -= 1;
        }
        (Self { count, actors }, rest)
    }
}

/// A counted list of head hashes.
#[derive(Debug, Clone, PartialEq)]
pub struct Heads<'a> {
    /// The number of heads declared.
    pub count: Field<'a, u64>,
    /// Each head; `None` marks a missing or incomplete hash, which ends the
    /// list.
    pub hashes: Vec<Field<'a, Option<[u8; HASH_LEN]>>>,
}

impl<'a> Heads<'a> {
    /// An empty list spanning no bytes.
    pub fn empty() -> Self {
        Self {
            count: Field::new(&[], 0),
            hashes: Vec::new(),
        }
    }

    /// Reads a count and that many 32-byte hashes.
    pub fn parse(input: &'a [u8]) -> (Self, &'a [u8]) {
        let (count, mut rest) = uleb_field(input, None);
        let mut hashes = Vec::new();
        let mut remaining = count.value;
        while remaining > 0 {
            if rest.is_empty() {
                hashes.push(
                    Field::new(rest, None).with(Diagnostic::error(DiagnosticKind::MissingHead)),
                );
                break;
            }
            match rest.get(..HASH_LEN).and_then(|b| <[u8; HASH_LEN]>::try_from(b).ok()) {
                Some(hash) => {
                    hashes.push(Field::new(&rest[..HASH_LEN], Some(hash)));
                    rest = &rest[HASH_LEN..];
                }
                None => {
                    hashes.push(
                        Field::new(rest, None)
                            .with(Diagnostic::error(DiagnosticKind::IncompleteHead)),
                    );
                    rest = &rest[rest.len()..];
                    break;
                }
            }
            remaining -= 1;
        }
        (Self { count, hashes }, rest)
    }

    /// The complete hashes, in order.
    pub fn complete(&self) -> impl Iterator<Item = &[u8; HASH_LEN]> {
        self.hashes.iter().filter_map(|h| h.value.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_table() {
        let input = [2, 2, 0xab, 0xcd, 1, 0xef, 9];
        let (table, rest) = ActorTable::parse(&input);
        assert_eq!(table.actors.len(), 2);
        assert_eq!(table.actors[0].id.value, &[0xab, 0xcd]);
        assert_eq!(table.actors[1].id.value, &[0xef]);
        assert_eq!(rest, &[9]);
    }

    #[test]
    fn actor_id_too_long_consumes_rest() {
        let input = [2, 5, 1, 2];
        let (table, rest) = ActorTable::parse(&input);
        assert!(rest.is_empty());
        assert_eq!(table.actors.len(), 1);
        assert_eq!(table.actors[0].id.bytes, &[1, 2]);
        assert_eq!(
            table.actors[0].id.diagnostics[0].kind,
            DiagnosticKind::ActorIdTooLong
        );
        assert_eq!(
            table.count.diagnostics[0].kind,
            DiagnosticKind::MissingItems { remaining: 1 }
        );
    }

    #[test]
    fn heads_complete_and_incomplete() {
        let mut input = vec![3];
        input.extend([7u8; 32]);
        input.extend([1, 2, 3]);
        let (heads, rest) = Heads::parse(&input);
        assert!(rest.is_empty());
        assert_eq!(heads.hashes.len(), 2);
        assert_eq!(heads.hashes[0].value, Some([7u8; 32]));
        assert_eq!(heads.hashes[1].bytes, &[1, 2, 3]);
        assert_eq!(heads.hashes[1].diagnostics[0].kind, DiagnosticKind::IncompleteHead);
        assert_eq!(heads.complete().count(), 1);
    }

    #[test]
    fn missing_head() {
        let (heads, _) = Heads::parse(&[1]);
        assert_eq!(heads.hashes[0].diagnostics[0].kind, DiagnosticKind::MissingHead);
        assert!(heads.hashes[0].bytes.is_empty());
    }
}
