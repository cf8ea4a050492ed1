use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode, Url, multipart};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    config::ClientConfig,
    error::{ClientError, Result},
    gateway::{ContractsGateway, FileHandle},
    models::{AskRequest, AskResponse, Contract, Credentials, TokenResponse, UploadReceipt},
};

const FALLBACK_MESSAGE: &str = "Request failed";
const UNPARSABLE_MESSAGE: &str = "Network error";

/// [`ContractsGateway`] over HTTP with `reqwest`.
///
/// The bearer token is fixed at construction; build a new gateway after
/// logging in or out.
#[derive(Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.api_url.clone())
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn contract_url(&self, id: &str) -> Result<Url> {
        let mut url = Url::parse(&self.url("/contracts"))
            .map_err(|e| ClientError::InvalidInput(format!("Invalid API URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidInput("API URL cannot carry a path".to_string()))?
            .push(id);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn post_credentials(
        &self,
        path: &str,
        credentials: &Credentials,
    ) -> Result<TokenResponse> {
        info!(username = %credentials.username, "POST {}", path);
        let response = self
            .client
            .post(self.url(path))
            .json(credentials)
            .send()
            .await?;
        handle_response(response).await
    }
}

#[async_trait]
impl ContractsGateway for HttpGateway {
    async fn login(&self, credentials: &Credentials) -> Result<TokenResponse> {
        self.post_credentials("/login", credentials).await
    }

    async fn signup(&self, credentials: &Credentials) -> Result<TokenResponse> {
        self.post_credentials("/signup", credentials).await
    }

    async fn list_contracts(&self) -> Result<Vec<Contract>> {
        debug!("GET /contracts");
        let response = self
            .authorize(self.client.get(self.url("/contracts")))
            .send()
            .await?;
        let contracts: Vec<Contract> = handle_response(response).await?;
        info!("Fetched {} contracts", contracts.len());
        Ok(contracts)
    }

    async fn get_contract(&self, id: &str) -> Result<Contract> {
        debug!(contract_id = %id, "GET /contracts/{{id}}");
        let response = self
            .authorize(self.client.get(self.contract_url(id)?))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            warn!(contract_id = %id, "Contract not found");
            return Err(ClientError::NotFound(id.to_string()));
        }
        handle_response(response).await
    }

    async fn upload(&self, file: &FileHandle) -> Result<UploadReceipt> {
        info!(file = %file.name(), size = file.size(), "POST /upload");
        let part = multipart::Part::bytes(file.read().await?)
            .file_name(file.name().to_string())
            .mime_str(file.mime_type())?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .authorize(self.client.post(self.url("/upload")))
            .multipart(form)
            .send()
            .await?;
        handle_response(response).await
    }

    async fn ask(&self, question: &str) -> Result<AskResponse> {
        info!("POST /ask");
        let body = AskRequest {
            question: question.to_string(),
        };
        let response = self
            .authorize(self.client.post(self.url("/ask")))
            .json(&body)
            .send()
            .await?;
        handle_response(response).await
    }
}

async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        let message = error_message(&body);
        warn!(status = status.as_u16(), %message, "Request failed");
        return Err(ClientError::Api {
            status: status.as_u16(),
            message,
        });
    }

    Ok(serde_json::from_slice(&body)?)
}

/// Extracts the backend's `detail`; FastAPI validation errors carry a list of `{msg}`.
fn error_message(body: &[u8]) -> String {
    let Ok(value) = serde_json::from_slice::<Value>(body) else {
        return UNPARSABLE_MESSAGE.to_string();
    };

    match value.get("detail") {
        Some(Value::String(detail)) if !detail.is_empty() => detail.clone(),
        Some(Value::Array(items)) if !items.is_empty() => items
            .iter()
            .map(|item| match item.get("msg").and_then(Value::as_str) {
                Some(msg) => msg.to_string(),
                None => item.to_string(),
            })
            .collect::<Vec<_>>()
            .join("; "),
        _ => FALLBACK_MESSAGE.to_string(),
    }
}
