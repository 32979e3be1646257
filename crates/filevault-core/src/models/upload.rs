use std::fmt::{Display, Formatter, Result as FmtResult};

use bytes::Bytes;
use uuid::Uuid;

use crate::error::AppError;

/// Lifecycle of a single upload request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    InProgress,
    Committed,
    Aborted,
}

impl UploadStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, UploadStatus::InProgress)
    }
}

impl Display for UploadStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadStatus::InProgress => write!(f, "in_progress"),
            UploadStatus::Committed => write!(f, "committed"),
            UploadStatus::Aborted => write!(f, "aborted"),
        }
    }
}

/// Transient state of one upload. The file id is fixed at creation, before
/// any chunk is sent, so every chunk key of the session is known up front.
#[derive(Debug, Clone)]
pub struct UploadSession {
    file_id: Uuid,
    owner_id: Uuid,
    file_name: String,
    status: UploadStatus,
}

impl UploadSession {
    pub fn new(owner_id: Uuid, file_name: impl Into<String>) -> Self {
        Self {
            file_id: Uuid::new_v4(),
            owner_id,
            file_name: file_name.into(),
            status: UploadStatus::InProgress,
        }
    }

    pub fn file_id(&self) -> Uuid {
        self.file_id
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn commit(&mut self) -> Result<(), AppError> {
        self.transition(UploadStatus::Committed)
    }

    pub fn abort(&mut self) -> Result<(), AppError> {
        self.transition(UploadStatus::Aborted)
    }

    // Only InProgress -> Committed and InProgress -> Aborted are legal.
    fn transition(&mut self, to: UploadStatus) -> Result<(), AppError> {
        if self.status != UploadStatus::InProgress || to == UploadStatus::InProgress {
            return Err(AppError::InvalidState(format!(
                "upload {} cannot move from {} to {}",
                self.file_id, self.status, to
            )));
        }
        self.status = to;
        Ok(())
    }
}

/// A bounded, non-empty slice of the uploaded stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: u64,
    pub data: Bytes,
}

impl Chunk {
    pub fn new(index: u64, data: Bytes) -> Self {
        Self { index, data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
