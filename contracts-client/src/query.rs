use tracing::info;

use crate::{
    error::{ClientError, Result},
    gateway::ContractsGateway,
    models::AskResponse,
};

pub const EXAMPLE_QUESTIONS: [&str; 4] = [
    "What are the termination clauses in my contracts?",
    "Which contracts have liability caps?",
    "Show me payment terms across all contracts",
    "What are the key risks in my agreements?",
];

/// Sends a natural-language question; blank questions never reach the backend.
pub async fn ask(gateway: &dyn ContractsGateway, question: &str) -> Result<AskResponse> {
    let question = question.trim();
    if question.is_empty() {
        return Err(ClientError::InvalidInput(
            "Question must not be empty".to_string(),
        ));
    }

    let response = gateway.ask(question).await?;
    info!(chunks = response.chunks.len(), "Question answered");
    Ok(response)
}
