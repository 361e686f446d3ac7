//! Test helpers: log capture and a storage facade over a memory backend.

use std::io;
use std::sync::{Arc, Mutex};
use tracing::subscriber::DefaultGuard;
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

use cloudfiles_common::StorageConfig;

use crate::client::SharedClientFactory;
use crate::memory::MemoryBackend;
use crate::operations::CloudStorage;

/// Collects formatted log output of the current thread.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

pub struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CaptureWriter(self.0.clone())
    }
}

impl LogCapture {
    /// Install a capturing subscriber for this thread until the guard drops.
    pub fn install() -> (Self, DefaultGuard) {
        let capture = Self::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(capture.clone())
            .with_max_level(Level::DEBUG)
            .with_ansi(false)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Number of diagnostic entries logged for research.
    pub fn research_entries(&self) -> usize {
        self.contents()
            .lines()
            .filter(|line| line.contains("storage operation failed"))
            .count()
    }
}

/// Storage facade whose contexts all share one memory backend.
pub fn memory_storage(buckets: &[&str]) -> (CloudStorage, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::with_buckets(buckets.iter().copied()));
    let storage = CloudStorage::with_factory(
        StorageConfig::default(),
        SharedClientFactory(backend.clone()),
    );
    (storage, backend)
}
