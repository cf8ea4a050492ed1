pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod listing;
pub mod models;
pub mod query;
pub mod session;
pub mod storage;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use gateway::{ContractsGateway, FileHandle};
pub use http::HttpGateway;
pub use listing::{
    ContractFilter, EmptyState, ListingViewModel, PAGE_SIZE, Page, SummaryCounts, apply_filters,
};
pub use models::{
    AskResponse, ChunkMetadata, Clause, Contract, ContractStatus, Credentials, Evidence, Insight,
    RetrievedChunk, RiskLevel, TokenResponse, UploadReceipt,
};
pub use query::{EXAMPLE_QUESTIONS, ask};
pub use session::{Session, SessionStore, User};
pub use storage::{FileSessionStorage, InMemorySessionStorage, SessionStorage};
pub use upload::{
    ALLOWED_EXTENSIONS, BatchReport, FailedUpload, UploadCandidate, UploadEvent, UploadSession,
    UploadStatus, format_file_size,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedGateway, contract};
    use std::sync::Arc;

    #[tokio::test]
    async fn upload_then_refresh_listing() {
        let gateway = Arc::new(ScriptedGateway::new().with_contracts(vec![contract(
            "1",
            "Lease",
            "Acme Realty",
            ContractStatus::RenewalDue,
            RiskLevel::High,
        )]));

        let storage = Arc::new(InMemorySessionStorage::new());
        let mut store = SessionStore::restore(storage).await.unwrap();
        store
            .login(gateway.as_ref(), &Credentials::new("dana", "pw"))
            .await
            .unwrap();

        let uploads = UploadSession::new(gateway.clone());
        uploads.add_files([FileHandle::from_bytes("lease.pdf", "%PDF-1.7")]);
        let report = uploads.commit_batch().await;
        assert_eq!(report.uploaded, vec!["lease.pdf"]);

        let mut listing = ListingViewModel::new();
        listing.refresh(gateway.as_ref()).await.unwrap();
        assert_eq!(listing.summary().renewal_due, 1);
        assert_eq!(listing.summary().high_risk, 1);
        assert_eq!(listing.page().items.len(), 1);
    }
}
