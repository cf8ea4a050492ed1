use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{
    error::{ClientError, Result},
    models::{AskResponse, Contract, Credentials, TokenResponse, UploadReceipt},
};

/// Boundary to the contracts backend.
///
/// Every operation is a single request/response; implementations do not
/// retry, back off or time out on their own.
#[async_trait]
pub trait ContractsGateway: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<TokenResponse>;

    async fn signup(&self, credentials: &Credentials) -> Result<TokenResponse>;

    async fn list_contracts(&self) -> Result<Vec<Contract>>;

    /// Fails with [`ClientError::NotFound`] when the backend has no such contract.
    async fn get_contract(&self, id: &str) -> Result<Contract>;

    async fn upload(&self, file: &FileHandle) -> Result<UploadReceipt>;

    async fn ask(&self, question: &str) -> Result<AskResponse>;
}

/// A file selected for upload: its declared name and size plus where the bytes live.
#[derive(Debug, Clone)]
pub struct FileHandle {
    name: String,
    size: u64,
    source: FileSource,
}

#[derive(Debug, Clone)]
enum FileSource {
    Path(PathBuf),
    Memory(Arc<[u8]>),
}

impl FileHandle {
    /// Stats the file; the contents are only read when the upload happens.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(ClientError::InvalidInput(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            name,
            size: metadata.len(),
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            source: FileSource::Memory(bytes.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Lowercased text after the last `.`; the whole name when there is no dot.
    pub fn extension(&self) -> String {
        self.name
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_lowercase()
    }

    pub fn mime_type(&self) -> &'static str {
        match self.extension().as_str() {
            "pdf" => "application/pdf",
            "txt" => "text/plain",
            "doc" => "application/msword",
            "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            _ => "application/octet-stream",
        }
    }

    pub async fn read(&self) -> Result<Vec<u8>> {
        match &self.source {
            FileSource::Path(path) => Ok(tokio::fs::read(path).await?),
            FileSource::Memory(bytes) => Ok(bytes.to_vec()),
        }
    }
}
