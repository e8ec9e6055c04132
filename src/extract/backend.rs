//! Inference-backend extractor: sends sub-batch text to a chat-completions
//! endpoint and parses the structured reply through the repair ladder.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{repair, ExtractError, Extractor};
use crate::config::BackendConfig;
use crate::model::PoliceOccurrence;

const EXTRACTION_PROMPT: &str = "\
Você é um analista de inteligência policial. Extraia do texto abaixo todas as \
ocorrências policiais completas e responda SOMENTE com um array JSON, sem \
markdown e sem comentários.\n\
Cada elemento do array deve ter exatamente os campos: \
\"id\" (cabeçalho completo: número, data/hora e unidade, ex. \
\"49294 - 20/12/2025 06:00:13 - 10BPM-19DEZ2025-03\"), \
\"date\" (DD/MM/AAAA), \
\"fact\" (natureza do fato em MAIÚSCULAS sem acentos), \
\"isCrime\" (booleano), \
\"narrative\" (relato integral começando em \"No dia\", incluindo o LinkGeo \
quando presente), \
\"involved\" (array de objetos com \"name\", \"cpf\" apenas dígitos, \
\"birthDate\", \"motherName\", \"condition\"; use \"Não informado\" quando o \
campo não constar).\n\
Regras: ignore ocorrências de ACIDENTE DE TRANSITO sem embriaguez, homicídio, \
drogas ou arma; não invente dados; não repita a mesma pessoa dentro de uma \
ocorrência; se não houver ocorrência completa no texto, responda [].";

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

pub struct BackendExtractor {
    client: reqwest::Client,
    config: BackendConfig,
}

impl BackendExtractor {
    pub fn new(config: BackendConfig) -> Result<Self, ExtractError> {
        if config.api_key.is_empty() {
            return Err(ExtractError::NotConfigured(
                "api key is empty; set SUMINFO_BACKEND__API_KEY or use --offline".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    async fn call_api(&self, text: &str) -> Result<String, ExtractError> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: EXTRACTION_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
            temperature: 0.1,
        };

        let mut last_error = None;
        for attempt in 0..self.config.max_retries {
            if attempt > 0 {
                let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                info!(attempt, delay_ms = delay.as_millis() as u64, "retrying backend call");
                tokio::time::sleep(delay).await;
            }

            match self.do_request(&request).await {
                Ok(content) => return Ok(content),
                Err(e) => {
                    warn!(attempt, error = %e, "backend call failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(ExtractError::MalformedResponse))
    }

    async fn do_request(&self, request: &ChatRequest) -> Result<String, ExtractError> {
        let response = self
            .client
            .post(&self.config.api_url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let chat_response: ChatResponse = response.json().await?;
        Ok(chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default())
    }
}

impl Extractor for BackendExtractor {
    async fn extract(&self, text: &str) -> Result<Vec<PoliceOccurrence>, ExtractError> {
        let content = self.call_api(text).await?;
        repair::parse_occurrences(strip_code_fence(&content))
    }
}

/// Models wrap JSON in markdown fences despite instructions; peel them off.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
