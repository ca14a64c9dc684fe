//! Diagnostic screenshot storage.

use crate::backend::Backend;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

pub trait SnapshotSink: Send {
    /// Persist one PNG and return where it went.
    fn store(&mut self, label: &str, png: &[u8]) -> io::Result<String>;
}

/// Writes `NN_label_unixsecs.png` files under a directory, creating it on
/// first use.
pub struct DirectorySnapshotSink {
    dir: PathBuf,
    seq: u32,
}

impl DirectorySnapshotSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            seq: 0,
        }
    }
}

impl SnapshotSink for DirectorySnapshotSink {
    fn store(&mut self, label: &str, png: &[u8]) -> io::Result<String> {
        fs::create_dir_all(&self.dir)?;
        self.seq += 1;
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let path = self
            .dir
            .join(format!("{:02}_{}_{}.png", self.seq, sanitize(label), stamp));
        fs::write(&path, png)?;
        Ok(path.display().to_string())
    }
}

/// Discards everything.
pub struct NoopSnapshotSink;

impl SnapshotSink for NoopSnapshotSink {
    fn store(&mut self, label: &str, _png: &[u8]) -> io::Result<String> {
        Ok(format!("(discarded) {}", label))
    }
}

/// Best-effort capture: failures are logged and swallowed.
pub struct SnapshotRecorder<S> {
    sink: S,
    paths: Vec<String>,
}

impl<S: SnapshotSink> SnapshotRecorder<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            paths: Vec::new(),
        }
    }

    pub async fn capture<B: Backend + ?Sized>(&mut self, backend: &mut B, label: &str) {
        let png = match backend.screenshot().await {
            Ok(png) => png,
            Err(e) => {
                warn!("Snapshot '{}' skipped: {}", label, e);
                return;
            }
        };
        match self.sink.store(label, &png) {
            Ok(path) => {
                debug!("Snapshot '{}' stored at {}", label, path);
                self.paths.push(path);
            }
            Err(e) => warn!("Snapshot '{}' could not be stored: {}", label, e),
        }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }
}

fn sanitize(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}
