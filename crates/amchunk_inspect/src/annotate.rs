//! Walks chunks and emits their annotated listing.
//!
//! The annotator never stops on bad input. Whatever the decoders report is
//! rendered inline next to the bytes it concerns and the walk carries on,
//! so every input byte lands in exactly one line.

use amchunk_codec::{
    hex_encode, inflated_checksum, parse_chunk, ChecksumStatus, ChunkType, ChunkView, Diagnostic,
    DiagnosticKind, Field, Severity,
};
use amchunk_columnar::{
    ActorEntry, ActorTable, BoolRun, ChangeChunk, ColumnBody, ColumnData, ColumnDescriptors,
    DecodeContext, DocumentChunk, HeadIndexes, Heads, Repeated, Run,
};
use tracing::debug;

use crate::config::InspectConfig;
use crate::transcript::{Line, Transcript};

const TOO_SHORT: &str = "ERROR: too short (expected magic bytes, checksum, type and length)";

fn worst(diagnostics: &[Diagnostic]) -> Option<Severity> {
    diagnostics.iter().map(|d| d.severity).max()
}

fn with_annotations(comment: String, diagnostics: &[Diagnostic]) -> String {
    if diagnostics.is_empty() {
        return comment;
    }
    let mut out = comment;
    for d in diagnostics {
        out.push(' ');
        out.push_str(&d.to_string());
    }
    out
}

/// Produces a listing of back-to-back chunks.
#[derive(Debug)]
pub struct Annotator {
    config: InspectConfig,
    ctx: DecodeContext,
    depth: usize,
    transcript: Transcript,
    chunks: usize,
}

impl Annotator {
    /// Creates an annotator.
    pub fn new(config: InspectConfig) -> Self {
        Self {
            config,
            ctx: DecodeContext::new(config.decode),
            depth: 0,
            transcript: Transcript::new(),
            chunks: 0,
        }
    }

    /// Annotates every chunk in `input`.
    pub fn annotate(mut self, input: &[u8]) -> Transcript {
        let mut rest = input;
        while !rest.is_empty() {
            rest = self.chunk(rest);
        }
        debug!(
            chunks = self.chunks,
            lines = self.transcript.lines().len(),
            errors = self.transcript.count(Severity::Error),
            "annotated input"
        );
        self.transcript
    }

    fn line(&mut self, bytes: &[u8], comment: impl Into<String>, severity: Option<Severity>) {
        self.transcript.push(Line {
            depth: self.depth,
            bytes: bytes.to_vec(),
            comment: comment.into(),
            severity,
        });
    }

    fn plain(&mut self, bytes: &[u8], comment: impl Into<String>) {
        self.line(bytes, comment, None);
    }

    fn annotated(&mut self, bytes: &[u8], comment: String, diagnostics: &[Diagnostic]) {
        let severity = worst(diagnostics);
        self.line(bytes, with_annotations(comment, diagnostics), severity);
    }

    fn field<T>(&mut self, field: &Field<'_, T>, comment: String) {
        self.annotated(field.bytes, comment, &field.diagnostics);
    }

    fn nested(&mut self, f: impl FnOnce(&mut Self)) {
        self.depth += 1;
        f(self);
        self.depth -= 1;
    }

    fn chunk<'a>(&mut self, input: &'a [u8]) -> &'a [u8] {
        let (view, rest) = match parse_chunk(input) {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!(%err, len = input.len(), "trailing fragment");
                self.line(input, TOO_SHORT, Some(Severity::Error));
                return &[];
            }
        };
        self.chunks += 1;

        if view.magic.value {
            self.plain(view.magic.bytes, "magic bytes (valid)");
        } else {
            self.line(view.magic.bytes, "ERROR: invalid magic bytes", Some(Severity::Error));
        }
        self.checksum(&view);

        let type_comment = match view.kind() {
            Some(ChunkType::Document) => "type = DOCUMENT CHUNK",
            Some(ChunkType::Change) => "type = CHANGE CHUNK",
            Some(ChunkType::Compressed) => "type = COMPRESSED CHUNK",
            None => "type = INVALID (should be 0, 1 or 2)",
        };
        let type_severity = worst(&view.chunk_type.diagnostics);
        self.line(view.chunk_type.bytes, type_comment, type_severity);
        self.field(&view.length, format!("length = {}", view.length.value));

        let body = view.body;
        self.nested(|a| match view.kind() {
            Some(ChunkType::Document) => a.document(body),
            Some(ChunkType::Change) => a.change(body),
            Some(ChunkType::Compressed) => a.plain(body, "DEFLATE stream"),
            None => a.plain(body, "chunk data"),
        });

        rest
    }

    fn checksum(&mut self, view: &ChunkView<'_>) {
        let bytes = view.checksum.bytes;
        let mut status = view.checksum.value;
        let mut severity = Severity::Error;

        if status == ChecksumStatus::NotValidated && self.config.verify_compressed_checksums {
            match inflated_checksum(view.body) {
                Ok(expected) if expected == view.stored_checksum() => {
                    status = ChecksumStatus::Valid;
                }
                Ok(expected) => {
                    status = ChecksumStatus::Mismatch { expected };
                    severity = Severity::Warning;
                }
                Err(err) => debug!(%err, "compressed checksum left unverified"),
            }
        }

        match status {
            ChecksumStatus::Valid => self.plain(bytes, "checksum (valid)"),
            ChecksumStatus::NotValidated => self.plain(bytes, "checksum (not validated)"),
            ChecksumStatus::Mismatch { expected } => {
                let label = match severity {
                    Severity::Error => "ERROR",
                    Severity::Warning => "WARNING",
                };
                let kind = DiagnosticKind::ChecksumMismatch { expected };
                self.line(bytes, format!("{label}: {kind}"), Some(severity));
            }
        }
    }

    fn document(&mut self, body: &[u8]) {
        let doc = DocumentChunk::decode(body, &mut self.ctx);
        if doc.is_empty() {
            self.plain(&[], "empty document");
            return;
        }

        self.actor_table(&doc.actors);
        self.heads(&doc.heads);
        self.descriptors(&doc.change_columns);
        self.descriptors(&doc.op_columns);
        for column in doc.change_data.iter().chain(&doc.op_data) {
            self.column(column);
        }

        match &doc.head_indexes {
            HeadIndexes::Omitted => self.plain(&[], "head index omitted"),
            HeadIndexes::Present(indexes) => {
                self.plain(&[], "head index");
                self.nested(|a| {
                    for (hash, index) in indexes {
                        a.field(index, format!("{} is change {}", hex_encode(hash), index.value));
                    }
                });
            }
        }

        if !doc.trailing.bytes.is_empty() {
            self.field(&doc.trailing, "remaining data in chunk".to_string());
        }
    }

    fn change(&mut self, body: &[u8]) {
        let change = ChangeChunk::decode(body, &mut self.ctx);

        self.heads(&change.heads);
        self.actor(&change.actor);
        self.field(&change.seq, format!("sequence number = {}", change.seq.value));
        self.field(&change.start_op, format!("start op = {}", change.start_op.value));
        self.field(
            &change.time,
            format!("time = {}", amchunk_columnar::format_timestamp(change.time.value)),
        );
        self.field(
            &change.message_len,
            format!("message len = {}", change.message_len.value),
        );

        let Some(tail) = &change.tail else {
            self.field(&change.message, "commit message (truncated)".to_string());
            return;
        };
        self.field(
            &change.message,
            format!("commit message = {:?}", change.message.value),
        );

        self.actor_table(&tail.other_actors);
        self.descriptors(&tail.op_columns);
        for column in &tail.op_data {
            self.column(column);
        }
        if !tail.extra.bytes.is_empty() {
            self.field(&tail.extra, "extra bytes".to_string());
        }
    }

    fn actor(&mut self, actor: &ActorEntry<'_>) {
        self.field(&actor.length, format!("id length = {}", actor.length.value));
        self.field(&actor.id, format!("actor ID = {}", hex_encode(actor.id.value)));
    }

    fn actor_table(&mut self, table: &ActorTable<'_>) {
        self.field(
            &table.count,
            format!("number of actor ids = {}", table.count.value),
        );
        self.nested(|a| {
            for actor in &table.actors {
                a.actor(actor);
            }
        });
    }

    fn heads(&mut self, heads: &Heads<'_>) {
        self.field(&heads.count, format!("number of heads = {}", heads.count.value));
        self.nested(|a| {
            for head in &heads.hashes {
                let comment = match &head.value {
                    Some(hash) => format!("head {}", hex_encode(hash)),
                    None => "head".to_string(),
                };
                a.field(head, comment);
            }
        });
    }

    fn descriptors(&mut self, descriptors: &ColumnDescriptors<'_>) {
        self.field(
            &descriptors.count,
            format!(
                "number of {} columns = {}",
                descriptors.group, descriptors.count.value
            ),
        );
        self.nested(|a| {
            for field in &descriptors.columns {
                let c = &field.value;
                a.field(
                    field,
                    format!(
                        "column (spec = {}, id = {}, type = {}, deflate = {}, length = {})",
                        c.spec,
                        c.id,
                        c.column_type.as_u8(),
                        c.deflate,
                        c.length
                    ),
                );
            }
        });
    }

    fn column(&mut self, column: &ColumnData<'_>) {
        self.annotated(&[], format!("{} column", column.title()), &column.diagnostics);
        self.nested(|a| match &column.body {
            ColumnBody::Compressed(bytes) => a.plain(bytes, "compressed column"),
            ColumnBody::Integers(runs) => a.runs(
                runs,
                "values",
                |r| format!("{} repeated {} times", r.value, r.count),
                |v| v.to_string(),
            ),
            ColumnBody::Deltas(runs) => a.runs(
                runs,
                "deltas",
                |r| {
                    format!(
                        "{},... {} ({} steps of {})",
                        r.value.first, r.value.last, r.count, r.value.delta
                    )
                },
                |v| format!("{:+} = {}", v.delta, v.value),
            ),
            ColumnBody::Booleans(runs) => {
                for run in runs {
                    let BoolRun { value, count } = run.value;
                    a.field(run, format!("{value} repeated {count} times"));
                }
            }
            ColumnBody::Strings(runs) => a.runs(
                runs,
                "values",
                |r| format!("{:?} repeated {} times", r.value, r.count),
                |v| format!("{v:?}"),
            ),
            ColumnBody::ValueMeta(runs) => a.runs(
                runs,
                "values",
                |r| format!("{} repeated {} times", r.value, r.count),
                |v| v.to_string(),
            ),
            ColumnBody::Values(decoded) => {
                for value in &decoded.values {
                    a.field(value, value.value.to_string());
                }
                if !decoded.extra.is_empty() {
                    a.line(
                        decoded.extra,
                        "extra bytes in value column",
                        Some(Severity::Warning),
                    );
                }
            }
            ColumnBody::MissingMeta(field) => a.field(field, "value bytes".to_string()),
        });
    }

    fn runs<R, L>(
        &mut self,
        runs: &[Run<'_, R, L>],
        noun: &str,
        repeat: impl Fn(&Repeated<R>) -> String,
        literal: impl Fn(&L) -> String,
    ) {
        for run in runs {
            match run {
                Run::Null(field) => {
                    self.field(field, format!("null repeated {} times", field.value));
                }
                Run::Repeat(field) => self.field(field, repeat(&field.value)),
                Run::Literal { header, items } => {
                    self.field(header, format!("{} literal {noun}", header.value));
                    self.nested(|a| {
                        for item in items {
                            a.field(item, literal(&item.value));
                        }
                    });
                }
            }
        }
    }
}

/// Annotates `input` with `config`.
pub fn annotate(input: &[u8], config: &InspectConfig) -> Transcript {
    Annotator::new(*config).annotate(input)
}
