//! Azure OpenAI chat-completions oracle.

use async_trait::async_trait;
use certitude_core::ExtractionAttempt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::oracle::{FieldOracle, OracleError, parse_attempt};

pub const DEFAULT_DEPLOYMENT: &str = "gpt-4";
pub const DEFAULT_API_VERSION: &str = "2024-02-15-preview";

const SYSTEM_PROMPT: &str = "You are a helpful assistant that extracts data.";

/// Sampling temperature; non-zero so ensemble attempts can disagree.
const TEMPERATURE: f64 = 0.7;

fn build_user_prompt(text: &str) -> String {
    format!(
        "You are a strict data extraction assistant.\n\
         Extract the following fields from the certificate text provided below.\n\
         Return ONLY a valid JSON object. Do not include markdown formatting (```json).\n\
         \n\
         Fields to extract:\n\
         - issuer: Name of the organization issuing the certificate.\n\
         - certificate_number: The unique ID of the certificate.\n\
         - issued_date: Date issued (format YYYY-MM-DD if possible, else original).\n\
         - expiry_date: Date expired (format YYYY-MM-DD if possible, else original).\n\
         - subject: What is being certified (e.g., ISO 9001, Completion of Course).\n\
         \n\
         If a field is not found, use null.\n\
         \n\
         Certificate Text:\n\
         \"\"\"\n\
         {text}\n\
         \"\"\""
    )
}

/// Connection settings, usually from `AZURE_OPENAI_*` environment variables.
#[derive(Clone)]
pub struct AzureConfig {
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub deployment: String,
    pub api_version: String,
}

impl std::fmt::Debug for AzureConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .field("endpoint", &self.endpoint)
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: None,
            deployment: DEFAULT_DEPLOYMENT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

impl AzureConfig {
    /// The endpoint with any `/openai/deployments...` path or query string cut off.
    pub fn base_endpoint(&self) -> Option<String> {
        let raw = self.endpoint.as_deref()?;
        let base = raw.split("/openai/deployments").next().unwrap_or(raw);
        let base = base.split('?').next().unwrap_or(base);
        let base = base.trim_end_matches('/');
        (!base.is_empty()).then(|| base.to_string())
    }

    /// Whether a real key and endpoint are present. Placeholder keys do not count.
    pub fn is_configured(&self) -> bool {
        let key_ok = self
            .api_key
            .as_deref()
            .is_some_and(|k| !k.is_empty() && !k.contains("your-key"));
        key_ok && self.base_endpoint().is_some()
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatContent,
}

#[derive(Deserialize)]
struct ChatContent {
    content: Option<String>,
}

/// Calls an Azure OpenAI deployment once per `extract`.
pub struct AzureOracle {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl AzureOracle {
    pub fn new(config: &AzureConfig) -> Result<Self, OracleError> {
        if !config.is_configured() {
            return Err(OracleError::NotConfigured(
                "AZURE_OPENAI_API_KEY and AZURE_OPENAI_ENDPOINT must be set".into(),
            ));
        }
        let (Some(base), Some(api_key)) = (config.base_endpoint(), config.api_key.clone()) else {
            return Err(OracleError::NotConfigured("missing endpoint or key".into()));
        };
        let url = format!(
            "{base}/openai/deployments/{}/chat/completions?api-version={}",
            config.deployment, config.api_version
        );
        info!(endpoint = %base, deployment = %config.deployment, "azure oracle configured");
        Ok(Self {
            client: reqwest::Client::new(),
            url,
            api_key,
        })
    }
}

#[async_trait]
impl FieldOracle for AzureOracle {
    async fn extract(&self, text: &str) -> Result<ExtractionAttempt, OracleError> {
        let prompt = build_user_prompt(text);
        let body = ChatRequest {
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: TEMPERATURE,
        };

        debug!(chars = text.len(), "sending extraction request");
        let resp = self
            .client
            .post(&self.url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OracleError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let chat: ChatResponse = resp.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| OracleError::Malformed("response has no message content".into()))?;
        parse_attempt(&content)
    }

    fn name(&self) -> &str {
        "azure"
    }
}
