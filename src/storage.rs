//! Delivery store - scoped temporary persistence for generated documents.
//!
//! Each document is written under a per-request unique filename inside a
//! temporary directory that lives as long as the store. Downloads are
//! one-shot: `take` removes the registry entry and deletes the backing file.
//! Expired artifacts are swept opportunistically on every `store` call, and
//! the whole directory is removed when the store drops.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use tempfile::TempDir;
use thiserror::Error;
use uuid::Uuid;

use crate::generator::GeneratedDocument;

const ARTIFACT_TTL_MINUTES: i64 = 10;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("failed to create artifact directory: {0}")]
    Init(String),
    #[error("failed to write artifact: {0}")]
    Write(String),
    #[error("artifact not found or already downloaded")]
    NotFound,
    #[error("failed to read artifact: {0}")]
    Read(String),
}

#[derive(Debug)]
struct StoredArtifact {
    path: PathBuf,
    filename: String,
    created_at: DateTime<Utc>,
}

/// Handle returned by [`DeliveryStore::store`], good for one download.
#[derive(Debug, Clone)]
pub struct DownloadTicket {
    pub id: Uuid,
    pub filename: String,
    pub size_bytes: usize,
}

pub struct DeliveryStore {
    dir: TempDir,
    artifacts: Mutex<HashMap<Uuid, StoredArtifact>>,
    ttl: Duration,
}

impl DeliveryStore {
    pub fn new() -> Result<Self, DeliveryError> {
        Self::with_ttl(Duration::minutes(ARTIFACT_TTL_MINUTES))
    }

    pub fn with_ttl(ttl: Duration) -> Result<Self, DeliveryError> {
        let dir = tempfile::Builder::new()
            .prefix("client_agreements_")
            .tempdir()
            .map_err(|e| DeliveryError::Init(e.to_string()))?;
        Ok(Self {
            dir,
            artifacts: Mutex::new(HashMap::new()),
            ttl,
        })
    }

    /// Persist a generated document and hand back its one-shot ticket.
    ///
    /// Filenames carry a per-request random suffix, so concurrent requests
    /// for the same client never collide. A failed write cleans up any
    /// partial file before returning.
    pub fn store(&self, document: &GeneratedDocument) -> Result<DownloadTicket, DeliveryError> {
        self.sweep_expired();

        let safe_name = sanitize_filename::sanitize(&document.filename);
        let path = self.dir.path().join(&safe_name);
        if let Err(e) = fs::write(&path, &document.pdf) {
            let _ = fs::remove_file(&path);
            return Err(DeliveryError::Write(e.to_string()));
        }

        let id = Uuid::new_v4();
        let ticket = DownloadTicket {
            id,
            filename: safe_name.clone(),
            size_bytes: document.pdf.len(),
        };
        self.artifacts.lock().insert(
            id,
            StoredArtifact {
                path,
                filename: safe_name,
                created_at: Utc::now(),
            },
        );
        Ok(ticket)
    }

    /// One-shot retrieval: unregisters the artifact, reads it, and deletes
    /// the backing file even when the read fails.
    pub fn take(&self, id: &Uuid) -> Result<(String, Vec<u8>), DeliveryError> {
        let artifact = self
            .artifacts
            .lock()
            .remove(id)
            .ok_or(DeliveryError::NotFound)?;

        let bytes = fs::read(&artifact.path);
        if let Err(e) = fs::remove_file(&artifact.path) {
            log::warn!(
                "failed to remove artifact {}: {e}",
                artifact.path.display()
            );
        }

        bytes
            .map(|data| (artifact.filename, data))
            .map_err(|e| DeliveryError::Read(e.to_string()))
    }

    /// Drop artifacts past their TTL. Best-effort; failures are logged.
    pub fn sweep_expired(&self) {
        let cutoff = Utc::now() - self.ttl;
        let expired: Vec<StoredArtifact> = {
            let mut artifacts = self.artifacts.lock();
            let ids: Vec<Uuid> = artifacts
                .iter()
                .filter(|(_, artifact)| artifact.created_at < cutoff)
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| artifacts.remove(&id))
                .collect()
        };

        for artifact in expired {
            log::debug!("sweeping expired artifact {}", artifact.filename);
            if let Err(e) = fs::remove_file(&artifact.path) {
                log::warn!(
                    "failed to sweep artifact {}: {e}",
                    artifact.path.display()
                );
            }
        }
    }

    pub fn pending_count(&self) -> usize {
        self.artifacts.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document(filename: &str) -> GeneratedDocument {
        GeneratedDocument {
            filename: filename.to_string(),
            pdf: b"%PDF-1.5 test bytes".to_vec(),
            token_id: "AGR-00000000".to_string(),
            generated_on: "August 06, 2026".to_string(),
        }
    }

    #[test]
    fn test_store_then_take_round_trip() {
        let store = DeliveryStore::new().unwrap();
        let ticket = store.store(&sample_document("a_1.pdf")).unwrap();
        assert_eq!(ticket.size_bytes, 19);

        let (filename, bytes) = store.take(&ticket.id).unwrap();
        assert_eq!(filename, "a_1.pdf");
        assert_eq!(bytes, b"%PDF-1.5 test bytes");
        assert_eq!(store.pending_count(), 0);
    }

    #[test]
    fn test_take_is_one_shot() {
        let store = DeliveryStore::new().unwrap();
        let ticket = store.store(&sample_document("b_1.pdf")).unwrap();
        store.take(&ticket.id).unwrap();

        let err = store.take(&ticket.id).unwrap_err();
        assert!(matches!(err, DeliveryError::NotFound));
    }

    #[test]
    fn test_unknown_ticket_is_not_found() {
        let store = DeliveryStore::new().unwrap();
        let err = store.take(&Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, DeliveryError::NotFound));
    }

    #[test]
    fn test_expired_artifacts_are_swept_on_store() {
        let store = DeliveryStore::with_ttl(Duration::zero()).unwrap();
        let first = store.store(&sample_document("c_1.pdf")).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));

        store.store(&sample_document("c_2.pdf")).unwrap();
        let err = store.take(&first.id).unwrap_err();
        assert!(matches!(err, DeliveryError::NotFound));
    }
}
