use crate::config::toml_config::GeminiConfig;
use crate::domain::model::ExtractedMention;
use crate::domain::ports::ExtractionGateway;
use crate::utils::error::{PharmacyError, Result};
use async_trait::async_trait;
use base64::Engine as _;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Instruction sent alongside every prescription file.
pub const PRESCRIPTION_PROMPT: &str = r#"You are a medical prescription analyzer. Extract all medicine names, dosages, and quantities from this prescription image or PDF.

Return the data in the following JSON format only (no additional text or explanation):
{
  "medicines": [
    {
      "name": "Medicine Name",
      "dosage": "500mg",
      "quantity": 1
    }
  ]
}

Rules:
- Extract ONLY the medicine names mentioned in the prescription
- Include dosage if clearly mentioned (e.g., 500mg, 10mg)
- Include quantity if mentioned, otherwise set to 1
- Use the exact medicine name as written
- Do not include any additional text, explanations, or markdown formatting
- Return only valid JSON"#;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExtractedMedicines {
    #[serde(default)]
    medicines: Vec<ExtractedMention>,
}

/// [`ExtractionGateway`] backed by the Gemini `generateContent` REST endpoint.
pub struct GeminiGateway {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiGateway {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let api_key = config
            .resolve_api_key()
            .ok_or_else(|| PharmacyError::MissingConfigError {
                field: "gemini.api_key".to_string(),
            })?;

        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }
}

#[async_trait]
impl ExtractionGateway for GeminiGateway {
    async fn extract(&self, file: &[u8], mime_type: &str) -> Result<Vec<ExtractedMention>> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type,
                            data: base64::engine::general_purpose::STANDARD.encode(file),
                        },
                    },
                    Part::Text {
                        text: PRESCRIPTION_PROMPT,
                    },
                ],
            }],
        };

        tracing::debug!("Sending prescription to model {} at {}", self.model, self.endpoint);
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Model response status: {}", status);
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PharmacyError::ExtractionError {
                message: format!("model API error {}: {}", status, body),
            });
        }

        let generated: GenerateResponse = response.json().await?;
        let text = response_text(&generated).ok_or_else(|| PharmacyError::ExtractionError {
            message: "empty response from model".to_string(),
        })?;

        parse_medicines(&text)
    }
}

/// Stand-in used when no API key is configured: the service still starts,
/// and every extraction reports the missing key.
#[derive(Debug, Clone, Copy, Default)]
pub struct MissingKeyGateway;

#[async_trait]
impl ExtractionGateway for MissingKeyGateway {
    async fn extract(&self, _file: &[u8], _mime_type: &str) -> Result<Vec<ExtractedMention>> {
        Err(PharmacyError::MissingConfigError {
            field: "gemini.api_key".to_string(),
        })
    }
}

pub fn gateway_from_config(config: &GeminiConfig) -> Result<Arc<dyn ExtractionGateway>> {
    match GeminiGateway::new(config) {
        Ok(gateway) => {
            tracing::info!("Using Gemini model {} at {}", gateway.model, gateway.endpoint);
            Ok(Arc::new(gateway))
        }
        Err(PharmacyError::MissingConfigError { field }) => {
            tracing::warn!("{} not configured, prescription upload will be unavailable", field);
            Ok(Arc::new(MissingKeyGateway))
        }
        Err(e) => Err(e),
    }
}

/// 取第一個候選回覆的所有文字片段
fn response_text(response: &GenerateResponse) -> Option<String> {
    let parts = &response.candidates.first()?.content.as_ref()?.parts;
    let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
    (!text.trim().is_empty()).then_some(text)
}

/// Parses the model's free text; surrounding prose or code fences are ignored.
pub fn parse_medicines(text: &str) -> Result<Vec<ExtractedMention>> {
    let re = Regex::new(r"(?s)\{.*\}").map_err(|e| PharmacyError::ConfigError {
        message: format!("invalid JSON pattern: {}", e),
    })?;
    let json_str = re.find(text).map(|m| m.as_str()).unwrap_or(text);

    let parsed: ExtractedMedicines = serde_json::from_str(json_str).map_err(|e| {
        tracing::error!("Failed to parse model response: {}", text);
        PharmacyError::ModelResponseError {
            message: e.to_string(),
            raw: text.to_string(),
        }
    })?;

    let (kept, dropped): (Vec<_>, Vec<_>) = parsed
        .medicines
        .into_iter()
        .partition(|m| !m.name.trim().is_empty());
    if !dropped.is_empty() {
        tracing::warn!("Dropped {} medicines without a name", dropped.len());
    }
    Ok(kept)
}
