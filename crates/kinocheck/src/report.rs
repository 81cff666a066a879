//! Reporting boundary: named steps and label+payload attachments.
//!
//! The core reports through [`StepSink`] and knows nothing about report
//! formats. [`NullSink`] discards, [`MemorySink`] records for assertions, and
//! [`DirSink`] writes artifacts to disk for real runs.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Payload kind for an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    /// PNG image
    Png,
    /// Plain text
    Text,
    /// JSON document
    Json,
}

impl AttachmentKind {
    /// File extension for artifacts written to disk
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Text => "txt",
            Self::Json => "json",
        }
    }
}

/// A diagnostic artifact: label plus raw payload
#[derive(Debug, Clone)]
pub struct Attachment {
    /// Human-readable label
    pub label: String,
    /// Payload kind
    pub kind: AttachmentKind,
    /// Raw payload bytes
    pub payload: Vec<u8>,
}

impl Attachment {
    /// PNG attachment
    #[must_use]
    pub fn png(label: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            label: label.into(),
            kind: AttachmentKind::Png,
            payload,
        }
    }

    /// Plain-text attachment
    #[must_use]
    pub fn text(label: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: AttachmentKind::Text,
            payload: body.into().into_bytes(),
        }
    }

    /// JSON attachment
    #[must_use]
    pub fn json(label: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: AttachmentKind::Json,
            payload: body.into().into_bytes(),
        }
    }
}

/// Where steps and artifacts go.
///
/// Implementations must not fail the caller; a sink that cannot record keeps
/// the problem to itself.
pub trait StepSink: Send + Sync {
    /// Report a named step
    fn step(&self, name: &str);

    /// Attach a diagnostic artifact
    fn attach(&self, attachment: Attachment);
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl StepSink for NullSink {
    fn step(&self, _name: &str) {}

    fn attach(&self, _attachment: Attachment) {}
}

/// Sink that records steps and attachments in memory, for assertions
#[derive(Debug, Default)]
pub struct MemorySink {
    steps: Mutex<Vec<String>>,
    attachments: Mutex<Vec<Attachment>>,
}

impl MemorySink {
    /// Create an empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded step names, in order
    #[must_use]
    pub fn steps(&self) -> Vec<String> {
        self.steps.lock().unwrap().clone()
    }

    /// Recorded attachment labels, in order
    #[must_use]
    pub fn attachment_labels(&self) -> Vec<String> {
        self.attachments
            .lock()
            .unwrap()
            .iter()
            .map(|a| a.label.clone())
            .collect()
    }

    /// Number of recorded attachments
    #[must_use]
    pub fn attachment_count(&self) -> usize {
        self.attachments.lock().unwrap().len()
    }

    /// Whether any recorded step contains the given fragment
    #[must_use]
    pub fn has_step(&self, fragment: &str) -> bool {
        self.steps
            .lock()
            .unwrap()
            .iter()
            .any(|step| step.contains(fragment))
    }
}

impl StepSink for MemorySink {
    fn step(&self, name: &str) {
        self.steps.lock().unwrap().push(name.to_string());
    }

    fn attach(&self, attachment: Attachment) {
        self.attachments.lock().unwrap().push(attachment);
    }
}

/// Sink that writes attachments to a directory and logs steps.
///
/// File names carry a timestamp so repeated failures of the same operation
/// never overwrite each other.
pub struct DirSink {
    dir: PathBuf,
}

impl DirSink {
    /// Create a sink writing into the given directory
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn sanitize(label: &str) -> String {
        label
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl fmt::Debug for DirSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirSink").field("dir", &self.dir).finish()
    }
}

impl StepSink for DirSink {
    fn step(&self, name: &str) {
        tracing::info!(step = name, "step");
    }

    fn attach(&self, attachment: Attachment) {
        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3f");
        let file = self.dir.join(format!(
            "{stamp}_{}.{}",
            Self::sanitize(&attachment.label),
            attachment.kind.extension()
        ));
        if let Err(error) = std::fs::create_dir_all(&self.dir)
            .and_then(|()| std::fs::write(&file, &attachment.payload))
        {
            tracing::warn!(label = %attachment.label, %error, "failed to write artifact");
        }
    }
}
