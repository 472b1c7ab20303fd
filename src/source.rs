//! Source buffers and the positions that point into them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Serialize, Serializer};

/// How a source was obtained. Decides how positions are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceMode {
    File,
    Repl,
}

/// An owned source buffer plus the metadata needed to report on it.
#[derive(Debug)]
pub struct Source {
    path: PathBuf,
    bytes: Vec<u8>,
    mode: SourceMode,
}

impl Source {
    /// Source read from a file.
    pub fn from_file(path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Arc<Self> {
        Arc::new(Self {
            path: path.into(),
            bytes: bytes.into(),
            mode: SourceMode::File,
        })
    }

    /// Source typed at an interactive prompt.
    pub fn from_repl(bytes: impl Into<Vec<u8>>) -> Arc<Self> {
        Arc::new(Self {
            path: PathBuf::from("<repl>"),
            bytes: bytes.into(),
            mode: SourceMode::Repl,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mode(&self) -> SourceMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Bytes covered by `view`, clamped to the buffer.
    pub fn slice(&self, view: View) -> &[u8] {
        let start = view.offset.min(self.bytes.len());
        let end = view.end().min(self.bytes.len());
        &self.bytes[start..end]
    }
}

impl miette::SourceCode for Source {
    fn read_span<'a>(
        &'a self,
        span: &miette::SourceSpan,
        context_lines_before: usize,
        context_lines_after: usize,
    ) -> Result<Box<dyn miette::SpanContents<'a> + 'a>, miette::MietteError> {
        self.bytes
            .read_span(span, context_lines_before, context_lines_after)
    }
}

/// A span of the source: byte offset plus length. Does not own anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct View {
    pub offset: usize,
    pub len: usize,
}

impl View {
    pub fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// The exact span responsible for a node or a diagnostic.
#[derive(Debug, Clone)]
pub struct Pos {
    pub source: Arc<Source>,
    pub view: View,
}

impl Pos {
    pub fn new(source: Arc<Source>, view: View) -> Self {
        Self { source, view }
    }

    /// Whether this position points past the last byte of its source.
    pub fn is_eof(&self) -> bool {
        self.view.offset >= self.source.len()
    }

    pub fn text(&self) -> &[u8] {
        self.source.slice(self.view)
    }
}

impl Serialize for Pos {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.view.serialize(serializer)
    }
}
