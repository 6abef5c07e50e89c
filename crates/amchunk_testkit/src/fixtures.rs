//! Chunk builders and file helpers.
//!
//! Builds well-formed document and change chunks field by field, so tests
//! can start from a valid chunk and break exactly the part they care about.

use std::io::Write;
use std::path::Path;

use amchunk_codec::leb128::{write_sleb_into, write_uleb_into};
use amchunk_codec::{build_chunk, ChunkType};
use amchunk_columnar::encoder::ColumnGroupEncoder;
use amchunk_columnar::HeadHash;
use tempfile::NamedTempFile;

fn write_actor(buf: &mut Vec<u8>, actor: &[u8]) {
    write_uleb_into(buf, actor.len() as u64);
    buf.extend_from_slice(actor);
}

fn write_actors(buf: &mut Vec<u8>, actors: &[Vec<u8>]) {
    write_uleb_into(buf, actors.len() as u64);
    for actor in actors {
        write_actor(buf, actor);
    }
}

fn write_heads(buf: &mut Vec<u8>, heads: &[HeadHash]) {
    write_uleb_into(buf, heads.len() as u64);
    for head in heads {
        buf.extend_from_slice(head);
    }
}

fn group(columns: &[(u64, Vec<u8>)]) -> (Vec<u8>, Vec<u8>) {
    let mut encoder = ColumnGroupEncoder::new();
    for (spec, body) in columns {
        encoder.column(*spec, body.clone());
    }
    encoder.finish()
}

/// Builds a document chunk.
#[derive(Debug, Clone, Default)]
pub struct DocumentBuilder {
    actors: Vec<Vec<u8>>,
    heads: Vec<HeadHash>,
    change_columns: Vec<(u64, Vec<u8>)>,
    op_columns: Vec<(u64, Vec<u8>)>,
    head_indexes: Option<Vec<u64>>,
    trailing: Vec<u8>,
}

impl DocumentBuilder {
    /// Creates a builder for a document with no actors, heads or columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an actor id.
    pub fn actor(mut self, id: impl Into<Vec<u8>>) -> Self {
        self.actors.push(id.into());
        self
    }

    /// Appends a head hash.
    pub fn head(mut self, hash: HeadHash) -> Self {
        self.heads.push(hash);
        self
    }

    /// Appends a change column.
    pub fn change_column(mut self, spec: u64, body: Vec<u8>) -> Self {
        self.change_columns.push((spec, body));
        self
    }

    /// Appends an operation column.
    pub fn op_column(mut self, spec: u64, body: Vec<u8>) -> Self {
        self.op_columns.push((spec, body));
        self
    }

    /// Sets the head indexes written after the column data.
    pub fn head_indexes(mut self, indexes: Vec<u64>) -> Self {
        self.head_indexes = Some(indexes);
        self
    }

    /// Appends raw bytes after everything else.
    pub fn trailing(mut self, bytes: &[u8]) -> Self {
        self.trailing.extend_from_slice(bytes);
        self
    }

    /// Returns the encoded body.
    pub fn body(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        write_actors(&mut buf, &self.actors);
        write_heads(&mut buf, &self.heads);

        let (change_desc, change_bodies) = group(&self.change_columns);
        let (op_desc, op_bodies) = group(&self.op_columns);
        buf.extend(change_desc);
        buf.extend(op_desc);
        buf.extend(change_bodies);
        buf.extend(op_bodies);

        if let Some(indexes) = &self.head_indexes {
            for index in indexes {
                write_uleb_into(&mut buf, *index);
            }
        }
        buf.extend_from_slice(&self.trailing);
        buf
    }

    /// Returns the framed chunk.
    pub fn build(&self) -> Vec<u8> {
        build_chunk(ChunkType::Document, &self.body())
    }
}

/// Builds a change chunk.
#[derive(Debug, Clone)]
pub struct ChangeBuilder {
    deps: Vec<HeadHash>,
    actor: Vec<u8>,
    seq: u64,
    start_op: u64,
    time: i64,
    message: Vec<u8>,
    other_actors: Vec<Vec<u8>>,
    op_columns: Vec<(u64, Vec<u8>)>,
    extra: Vec<u8>,
}

impl ChangeBuilder {
    /// Creates a builder for the first change of `actor`.
    pub fn new(actor: impl Into<Vec<u8>>) -> Self {
        Self {
            deps: Vec::new(),
            actor: actor.into(),
            seq: 1,
            start_op: 1,
            time: 0,
            message: Vec::new(),
            other_actors: Vec::new(),
            op_columns: Vec::new(),
            extra: Vec::new(),
        }
    }

    /// Appends a dependency hash.
    pub fn dep(mut self, hash: HeadHash) -> Self {
        self.deps.push(hash);
        self
    }

    /// Sets the sequence number.
    pub fn seq(mut self, seq: u64) -> Self {
        self.seq = seq;
        self
    }

    /// Sets the first operation counter.
    pub fn start_op(mut self, start_op: u64) -> Self {
        self.start_op = start_op;
        self
    }

    /// Sets the timestamp in milliseconds.
    pub fn time(mut self, millis: i64) -> Self {
        self.time = millis;
        self
    }

    /// Sets the commit message.
    pub fn message(mut self, message: impl AsRef<[u8]>) -> Self {
        self.message = message.as_ref().to_vec();
        self
    }

    /// Appends an actor to the other-actors table.
    pub fn other_actor(mut self, id: impl Into<Vec<u8>>) -> Self {
        self.other_actors.push(id.into());
        self
    }

    /// Appends an operation column.
    pub fn op_column(mut self, spec: u64, body: Vec<u8>) -> Self {
        self.op_columns.push((spec, body));
        self
    }

    /// Appends raw bytes after the column data.
    pub fn extra(mut self, bytes: &[u8]) -> Self {
        self.extra.extend_from_slice(bytes);
        self
    }

    /// Returns the encoded body.
    pub fn body(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        write_heads(&mut buf, &self.deps);
        write_actor(&mut buf, &self.actor);
        write_uleb_into(&mut buf, self.seq);
        write_uleb_into(&mut buf, self.start_op);
        write_sleb_into(&mut buf, self.time);
        write_uleb_into(&mut buf, self.message.len() as u64);
        buf.extend_from_slice(&self.message);
        write_actors(&mut buf, &self.other_actors);

        let (desc, bodies) = group(&self.op_columns);
        buf.extend(desc);
        buf.extend(bodies);
        buf.extend_from_slice(&self.extra);
        buf
    }

    /// Returns the framed chunk.
    pub fn build(&self) -> Vec<u8> {
        build_chunk(ChunkType::Change, &self.body())
    }
}

/// A chunk written to a temporary file, removed on drop.
pub struct ChunkFile {
    file: NamedTempFile,
}

impl ChunkFile {
    /// Writes `bytes` to a fresh temporary file.
    pub fn new(bytes: &[u8]) -> Self {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(bytes).expect("Failed to write chunk");
        file.flush().expect("Failed to flush chunk");
        Self { file }
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
