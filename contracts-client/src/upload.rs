//! Upload batches.
//!
//! An [`UploadSession`] collects candidate files (from any number of
//! selections), classifies each by extension and drives the per-file state
//! machine:
//!
//! ```text
//! ready ──> uploading ──> success
//!                    └──> error
//! (disallowed extension) ──> error
//! ```
//!
//! The session is a cheap handle: clones share the same candidate list, so an
//! upload can be in flight on one clone while another edits the list.
//! Removing a candidate never cancels its request; the late result is
//! dropped.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::gateway::{ContractsGateway, FileHandle};

pub const ALLOWED_EXTENSIONS: [&str; 4] = ["pdf", "doc", "docx", "txt"];

const EVENT_CAPACITY: usize = 256;

pub fn is_allowed_extension(extension: &str) -> bool {
    ALLOWED_EXTENSIONS.contains(&extension.to_lowercase().as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Ready,
    Uploading,
    Success,
    Error,
}

impl UploadStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Success | UploadStatus::Error)
    }
}

#[derive(Debug, Clone)]
pub struct UploadCandidate {
    pub id: Uuid,
    pub file: FileHandle,
    pub name: String,
    pub size: u64,
    pub status: UploadStatus,
    /// Message from the last failed upload attempt.
    pub error: Option<String>,
}

impl UploadCandidate {
    fn classify(file: FileHandle) -> Self {
        let status = if is_allowed_extension(&file.extension()) {
            UploadStatus::Ready
        } else {
            UploadStatus::Error
        };

        Self {
            id: Uuid::new_v4(),
            name: file.name().to_string(),
            size: file.size(),
            file,
            status,
            error: None,
        }
    }

    pub fn has_allowed_extension(&self) -> bool {
        is_allowed_extension(&self.file.extension())
    }

    pub fn status_text(&self) -> &'static str {
        match self.status {
            UploadStatus::Ready => "Ready to upload",
            UploadStatus::Uploading => "Uploading...",
            UploadStatus::Success => "Uploaded",
            UploadStatus::Error if !self.has_allowed_extension() => "Invalid file type",
            UploadStatus::Error => "Upload failed",
        }
    }
}

/// Published on every change to the candidate list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UploadEvent {
    Added { id: Uuid, status: UploadStatus },
    StatusChanged { id: Uuid, status: UploadStatus },
    Removed { id: Uuid },
    Cleared,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedUpload {
    pub name: String,
    pub message: String,
}

/// Outcome of [`UploadSession::commit_batch`], kept because the list itself is cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub uploaded: Vec<String>,
    pub failed: Vec<FailedUpload>,
}

impl BatchReport {
    pub fn attempted(&self) -> usize {
        self.uploaded.len() + self.failed.len()
    }
}

enum Attempt {
    Missing,
    Skipped(UploadStatus),
    Finished {
        name: String,
        outcome: std::result::Result<(), String>,
    },
}

#[derive(Clone)]
pub struct UploadSession {
    gateway: Arc<dyn ContractsGateway>,
    candidates: Arc<Mutex<Vec<UploadCandidate>>>,
    events: broadcast::Sender<UploadEvent>,
}

impl UploadSession {
    pub fn new(gateway: Arc<dyn ContractsGateway>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            gateway,
            candidates: Arc::new(Mutex::new(Vec::new())),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UploadEvent> {
        self.events.subscribe()
    }

    /// Classifies and appends the files; returns their new ids in input order.
    pub fn add_files(&self, files: impl IntoIterator<Item = FileHandle>) -> Vec<Uuid> {
        let added: Vec<UploadCandidate> = files.into_iter().map(UploadCandidate::classify).collect();
        let ids: Vec<Uuid> = added.iter().map(|candidate| candidate.id).collect();

        for candidate in &added {
            debug!(
                candidate_id = %candidate.id,
                file = %candidate.name,
                status = ?candidate.status,
                "Candidate added"
            );
        }
        let events: Vec<UploadEvent> = added
            .iter()
            .map(|candidate| UploadEvent::Added {
                id: candidate.id,
                status: candidate.status,
            })
            .collect();

        self.lock().extend(added);
        for event in events {
            self.publish(event);
        }
        ids
    }

    /// Uploads one `ready` candidate and returns its terminal status.
    ///
    /// Returns the current status without issuing a request when the
    /// candidate is not `ready`, and `None` when no such candidate exists.
    pub async fn upload_one(&self, id: Uuid) -> Option<UploadStatus> {
        match self.attempt(id).await {
            Attempt::Missing => None,
            Attempt::Skipped(status) => Some(status),
            Attempt::Finished { outcome: Ok(()), .. } => Some(UploadStatus::Success),
            Attempt::Finished { outcome: Err(_), .. } => Some(UploadStatus::Error),
        }
    }

    async fn attempt(&self, id: Uuid) -> Attempt {
        let file = {
            let mut candidates = self.lock();
            let Some(candidate) = candidates.iter_mut().find(|c| c.id == id) else {
                debug!(candidate_id = %id, "Upload requested for unknown candidate");
                return Attempt::Missing;
            };
            if candidate.status != UploadStatus::Ready {
                debug!(candidate_id = %id, status = ?candidate.status, "Candidate not ready, skipping");
                return Attempt::Skipped(candidate.status);
            }
            candidate.status = UploadStatus::Uploading;
            candidate.file.clone()
        };
        self.publish(UploadEvent::StatusChanged {
            id,
            status: UploadStatus::Uploading,
        });

        let (status, outcome) = match self.gateway.upload(&file).await {
            Ok(receipt) => {
                info!(
                    candidate_id = %id,
                    file = %file.name(),
                    doc_id = ?receipt.doc_id,
                    "Upload succeeded"
                );
                (UploadStatus::Success, Ok(()))
            }
            Err(e) => {
                warn!(candidate_id = %id, file = %file.name(), "Upload failed: {}", e);
                (UploadStatus::Error, Err(e.to_string()))
            }
        };

        let error = outcome.as_ref().err().cloned();
        if !self.set_status(id, status, error) {
            debug!(candidate_id = %id, "Candidate removed while uploading, result dropped");
        }

        Attempt::Finished {
            name: file.name().to_string(),
            outcome,
        }
    }

    /// Removes a candidate in any state. An in-flight upload keeps running.
    pub fn remove_candidate(&self, id: Uuid) -> bool {
        let removed = {
            let mut candidates = self.lock();
            let before = candidates.len();
            candidates.retain(|candidate| candidate.id != id);
            candidates.len() != before
        };
        if removed {
            debug!(candidate_id = %id, "Candidate removed");
            self.publish(UploadEvent::Removed { id });
        }
        removed
    }

    /// Uploads every `ready` candidate one at a time, in list order, then clears the list.
    ///
    /// A failed upload does not stop the rest of the batch. Does nothing and
    /// returns an empty report while [`UploadSession::can_commit`] is false.
    pub async fn commit_batch(&self) -> BatchReport {
        if !self.can_commit() {
            debug!("Batch commit unavailable, an upload is in flight or the list is empty");
            return BatchReport::default();
        }

        let ready: Vec<Uuid> = self
            .lock()
            .iter()
            .filter(|candidate| candidate.status == UploadStatus::Ready)
            .map(|candidate| candidate.id)
            .collect();
        info!("Committing upload batch of {} files", ready.len());

        let mut report = BatchReport::default();
        for id in ready {
            if let Attempt::Finished { name, outcome } = self.attempt(id).await {
                match outcome {
                    Ok(()) => report.uploaded.push(name),
                    Err(message) => report.failed.push(FailedUpload { name, message }),
                }
            }
        }

        self.clear();
        info!(
            uploaded = report.uploaded.len(),
            failed = report.failed.len(),
            "Upload batch finished"
        );
        report
    }

    /// Drops every candidate, as when the upload dialog is closed.
    pub fn clear(&self) {
        self.lock().clear();
        self.publish(UploadEvent::Cleared);
    }

    /// The batch action is available when there is something to upload and nothing in flight.
    pub fn can_commit(&self) -> bool {
        let candidates = self.lock();
        !candidates.is_empty()
            && !candidates
                .iter()
                .any(|candidate| candidate.status == UploadStatus::Uploading)
    }

    pub fn candidates(&self) -> Vec<UploadCandidate> {
        self.lock().clone()
    }

    pub fn candidate(&self, id: Uuid) -> Option<UploadCandidate> {
        self.lock().iter().find(|c| c.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn set_status(&self, id: Uuid, status: UploadStatus, error: Option<String>) -> bool {
        let updated = {
            let mut candidates = self.lock();
            match candidates.iter_mut().find(|c| c.id == id) {
                Some(candidate) => {
                    candidate.status = status;
                    candidate.error = error;
                    true
                }
                None => false,
            }
        };
        if updated {
            self.publish(UploadEvent::StatusChanged { id, status });
        }
        updated
    }

    fn lock(&self) -> MutexGuard<'_, Vec<UploadCandidate>> {
        self.candidates.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: UploadEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }
}

/// Human-readable size, base 1024, at most two decimals ("0 Bytes", "1.5 KB").
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut exponent = 0;
    let mut whole = bytes;
    while whole >= 1024 && exponent < UNITS.len() - 1 {
        whole /= 1024;
        exponent += 1;
    }

    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[exponent])
}
