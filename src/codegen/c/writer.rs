//! Buffered source writer with forward-patchable fragments.
//!
//! Emission is mostly single-pass, but a few constructs are only known after
//! later passes run: method prototypes referenced before their definitions,
//! local declarations discovered while lowering a body. [`CodeBuffer`] keeps
//! the whole output in memory as a tree of fragments; opening a fragment
//! reserves a spot in the stream, and any holder of its [`FragmentId`] can
//! append there until the buffer is flushed.

use std::io::{self, BufWriter, Write as IoWrite};
use std::mem;

/// Handle to one fragment inside a [`CodeBuffer`].
///
/// Plain index, cheap to copy and store. A handle is only meaningful for the
/// buffer that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentId(u32);

/// Totals reported after a buffer is flushed.
#[derive(Debug, Default, Clone)]
pub struct FlushMetrics {
    pub bytes_written: usize,
    pub lines: usize,
}

enum Piece {
    /// Line closed with a newline. Indentation is the fragment's depth at
    /// the moment the line was closed, not when its text started.
    Line { indent: u16, text: String },
    /// Text closed without a newline; the output line continues with
    /// whatever comes next in stream order.
    Open { indent: u16, text: String },
    Nested(FragmentId),
}

struct Fragment {
    pieces: Vec<Piece>,
    pending: String,
    indent: u16,
}

impl Fragment {
    fn new(indent: u16) -> Self {
        Self {
            pieces: Vec::new(),
            pending: String::new(),
            indent,
        }
    }

    fn close_pending(&mut self, terminated: bool) {
        if !terminated && self.pending.is_empty() {
            return;
        }
        let text = mem::take(&mut self.pending);
        let indent = self.indent;
        self.pieces.push(if terminated {
            Piece::Line { indent, text }
        } else {
            Piece::Open { indent, text }
        });
    }
}

/// Arena of output fragments. All writing goes through [`CodeBuffer::writer`];
/// flushing consumes the buffer and serialises fragments in creation order of
/// their anchors.
pub struct CodeBuffer {
    fragments: Vec<Fragment>,
}

impl CodeBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            fragments: vec![Fragment::new(0)],
        }
    }

    /// The top-level fragment every buffer starts with.
    #[must_use]
    pub fn root(&self) -> FragmentId {
        FragmentId(0)
    }

    /// Positions a writer at the end of the given fragment.
    pub fn writer(&mut self, id: FragmentId) -> CodeWriter<'_> {
        CodeWriter { buf: self, id }
    }

    fn alloc(&mut self, indent: u16) -> FragmentId {
        let id = FragmentId(self.fragments.len() as u32);
        self.fragments.push(Fragment::new(indent));
        id
    }

    fn fragment_mut(&mut self, id: FragmentId) -> &mut Fragment {
        &mut self.fragments[id.0 as usize]
    }

    /// Serialises the fragment tree into `sink` and consumes the buffer.
    /// Unterminated trailing text is written without a final newline.
    pub fn flush<W: IoWrite>(mut self, sink: W) -> io::Result<FlushMetrics> {
        for fragment in &mut self.fragments {
            fragment.close_pending(false);
        }

        let mut out = BufWriter::new(sink);
        let mut metrics = FlushMetrics::default();
        let mut at_line_start = true;

        // Explicit traversal stack; fragment nesting tracks C scoping depth
        // and recursion would make it a stack-overflow hazard.
        let mut stack = vec![(0usize, 0usize)];
        while let Some((fragment_idx, piece_idx)) = stack.pop() {
            let fragment = &self.fragments[fragment_idx];
            let Some(piece) = fragment.pieces.get(piece_idx) else {
                continue;
            };
            stack.push((fragment_idx, piece_idx + 1));
            match piece {
                Piece::Line { indent, text } => {
                    if at_line_start && !text.is_empty() {
                        write_indent(&mut out, *indent, &mut metrics)?;
                    }
                    out.write_all(text.as_bytes())?;
                    out.write_all(b"\n")?;
                    metrics.bytes_written += text.len() + 1;
                    metrics.lines += 1;
                    at_line_start = true;
                }
                Piece::Open { indent, text } => {
                    if text.is_empty() {
                        continue;
                    }
                    if at_line_start {
                        write_indent(&mut out, *indent, &mut metrics)?;
                    }
                    out.write_all(text.as_bytes())?;
                    metrics.bytes_written += text.len();
                    at_line_start = false;
                }
                Piece::Nested(child) => {
                    stack.push((child.0 as usize, 0));
                }
            }
        }

        out.flush()?;
        Ok(metrics)
    }
}

impl Default for CodeBuffer {
    fn default() -> Self {
        Self::new()
    }
}

fn write_indent<W: IoWrite>(
    out: &mut W,
    indent: u16,
    metrics: &mut FlushMetrics,
) -> io::Result<()> {
    for _ in 0..indent {
        out.write_all(b"    ")?;
        metrics.bytes_written += 4;
    }
    Ok(())
}

/// Cursor appending to one fragment. Calls chain; dropping the writer leaves
/// the fragment open for a later cursor.
pub struct CodeWriter<'a> {
    buf: &'a mut CodeBuffer,
    id: FragmentId,
}

impl CodeWriter<'_> {
    pub fn write(&mut self, text: &str) -> &mut Self {
        self.buf.fragment_mut(self.id).pending.push_str(text);
        self
    }

    /// Closes the current line, recording the indentation depth in force
    /// right now.
    pub fn newline(&mut self) -> &mut Self {
        self.buf.fragment_mut(self.id).close_pending(true);
        self
    }

    pub fn println(&mut self, text: &str) -> &mut Self {
        self.write(text);
        self.newline()
    }

    pub fn indent(&mut self) -> &mut Self {
        let fragment = self.buf.fragment_mut(self.id);
        fragment.indent = fragment.indent.saturating_add(1);
        self
    }

    /// Decreases depth, saturating at zero rather than underflowing when a
    /// generator unwinds more scopes than it opened.
    pub fn outdent(&mut self) -> &mut Self {
        let fragment = self.buf.fragment_mut(self.id);
        fragment.indent = fragment.indent.saturating_sub(1);
        self
    }

    /// Reserves a sub-fragment at the current position and returns its
    /// handle. Pending text is closed first without a newline, so a fragment
    /// opened mid-line splices into that line.
    pub fn fragment(&mut self) -> FragmentId {
        let indent = {
            let fragment = self.buf.fragment_mut(self.id);
            fragment.close_pending(false);
            fragment.indent
        };
        let child = self.buf.alloc(indent);
        self.buf
            .fragment_mut(self.id)
            .pieces
            .push(Piece::Nested(child));
        child
    }
}
