//! In-process gateway double shared by the unit tests.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::{
    error::{ClientError, Result},
    gateway::{ContractsGateway, FileHandle},
    models::{
        AskResponse, Contract, ContractStatus, Credentials, RiskLevel, TokenResponse,
        UploadReceipt,
    },
};

#[derive(Default)]
pub(crate) struct ScriptedGateway {
    token: String,
    login_error: Option<String>,
    contracts: Vec<Contract>,
    list_error: Option<String>,
    failing_uploads: HashSet<String>,
    upload_gate: Option<Arc<Notify>>,
    answer: Option<AskResponse>,
    uploads: Mutex<Vec<String>>,
    questions: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            token: "token".to_string(),
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = token.to_string();
        self
    }

    pub fn failing_login(mut self, message: &str) -> Self {
        self.login_error = Some(message.to_string());
        self
    }

    pub fn with_contracts(mut self, contracts: Vec<Contract>) -> Self {
        self.contracts = contracts;
        self
    }

    pub fn failing_list(mut self, message: &str) -> Self {
        self.list_error = Some(message.to_string());
        self
    }

    pub fn failing_upload(mut self, name: &str) -> Self {
        self.failing_uploads.insert(name.to_string());
        self
    }

    /// Uploads block until the returned handle is notified once per upload.
    pub fn gated_uploads(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.upload_gate = Some(gate.clone());
        (self, gate)
    }

    pub fn with_answer(mut self, answer: AskResponse) -> Self {
        self.answer = Some(answer);
        self
    }

    /// Names passed to `upload`, in call order.
    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }

    pub fn max_concurrent_uploads(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContractsGateway for ScriptedGateway {
    async fn login(&self, _credentials: &Credentials) -> Result<TokenResponse> {
        if let Some(message) = &self.login_error {
            return Err(ClientError::Api {
                status: 401,
                message: message.clone(),
            });
        }
        Ok(TokenResponse {
            access_token: self.token.clone(),
            token_type: Some("bearer".to_string()),
        })
    }

    async fn signup(&self, credentials: &Credentials) -> Result<TokenResponse> {
        self.login(credentials).await
    }

    async fn list_contracts(&self) -> Result<Vec<Contract>> {
        match &self.list_error {
            Some(message) => Err(ClientError::Api {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(self.contracts.clone()),
        }
    }

    async fn get_contract(&self, id: &str) -> Result<Contract> {
        self.contracts
            .iter()
            .find(|contract| contract.id == id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(id.to_string()))
    }

    async fn upload(&self, file: &FileHandle) -> Result<UploadReceipt> {
        self.uploads.lock().unwrap().push(file.name().to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.upload_gate {
            gate.notified().await;
        }
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_uploads.contains(file.name()) {
            return Err(ClientError::Api {
                status: 400,
                message: "Invalid file type".to_string(),
            });
        }
        Ok(UploadReceipt {
            message: Some("File uploaded and processed successfully".to_string()),
            doc_id: Some(format!("doc_{}", file.name())),
        })
    }

    async fn ask(&self, question: &str) -> Result<AskResponse> {
        self.questions.lock().unwrap().push(question.to_string());
        Ok(self.answer.clone().unwrap_or_else(|| AskResponse {
            answer: "No contracts found. Please upload some contracts first.".to_string(),
            chunks: Vec::new(),
        }))
    }
}

pub(crate) fn contract(
    id: &str,
    name: &str,
    parties: &str,
    status: ContractStatus,
    risk: RiskLevel,
) -> Contract {
    Contract {
        id: id.to_string(),
        name: name.to_string(),
        parties: parties.to_string(),
        status,
        risk,
        expiry_date: None,
        start_date: None,
        uploaded_on: None,
        clauses: Vec::new(),
        insights: Vec::new(),
        evidence: Vec::new(),
    }
}
