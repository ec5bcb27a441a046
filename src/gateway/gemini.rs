//! [`TravelGateway`] backed by the Gemini `generateContent` REST API.

use async_trait::async_trait;
use base64::Engine;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::error::GatewayError;
use super::prompts;
use super::types::{ActivitySuggestion, Message, SafetyBundle, TravelAdvice};
use super::wire::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, LatLng, Part,
    RetrievalConfig, Tool, ToolConfig,
};
use super::TravelGateway;
use crate::config::{GatewayConfig, ModelConfig};
use crate::device::GeoPoint;

/// Gemini REST client.
pub struct GeminiGateway {
    /// API key appended as the `key` query parameter.
    api_key: Option<String>,
    /// Base URL, e.g. `https://generativelanguage.googleapis.com`.
    api_base_url: String,
    /// Model per operation.
    models: ModelConfig,
    /// HTTP client.
    client: reqwest::Client,
}

impl GeminiGateway {
    pub fn new(api_key: Option<String>, config: &GatewayConfig) -> Self {
        Self {
            api_key,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            models: config.models.clone(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .connect_timeout(Duration::from_secs(5))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base_url, model
        )
    }

    /// One `generateContent` round trip.
    async fn generate(
        &self,
        operation: &'static str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GatewayError> {
        let api_key = self.api_key.as_deref().ok_or(GatewayError::MissingApiKey)?;

        tracing::debug!(operation, model, "Sending Gemini request");

        let resp = self
            .client
            .post(self.endpoint(model))
            .query(&[("key", api_key)])
            .json(request)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(operation, model, status, "Gemini request rejected");
            return Err(GatewayError::Api { status, body });
        }

        let body: GenerateContentResponse = resp.json().await?;
        tracing::debug!(
            operation,
            candidates = body.candidates.len(),
            "Gemini response received"
        );
        Ok(body)
    }

    /// Round trip in JSON response mode, parsed into `T`.
    async fn generate_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<T, GatewayError> {
        let response = self.generate(operation, model, request).await?;
        let text = response.text().unwrap_or_default();
        serde_json::from_str(&text).map_err(|e| {
            tracing::warn!(operation, error = %e, "Structured response failed to parse");
            GatewayError::Schema(e)
        })
    }
}

/// Build the advice request: history turns, then the new prompt.
pub fn advice_request(
    prompt: &str,
    location: Option<GeoPoint>,
    history: &[Message],
) -> GenerateContentRequest {
    let mut contents: Vec<Content> = history
        .iter()
        .map(|msg| Content::turn(msg.role.wire_name(), msg.content.clone()))
        .collect();
    contents.push(Content::turn("user", prompt));

    GenerateContentRequest {
        contents,
        system_instruction: Some(Content::text(prompts::ADVICE_SYSTEM_INSTRUCTION)),
        tools: vec![Tool::google_search(), Tool::google_maps()],
        tool_config: location.map(|loc| ToolConfig {
            retrieval_config: RetrievalConfig {
                lat_lng: LatLng {
                    latitude: loc.latitude,
                    longitude: loc.longitude,
                },
            },
        }),
        generation_config: None,
    }
}

#[async_trait]
impl TravelGateway for GeminiGateway {
    async fn generate_travel_advice(
        &self,
        prompt: &str,
        location: Option<GeoPoint>,
        history: &[Message],
    ) -> Result<TravelAdvice, GatewayError> {
        let request = advice_request(prompt, location, history);
        let response = self
            .generate("travel_advice", &self.models.advice, &request)
            .await?;

        Ok(TravelAdvice {
            text: response
                .text()
                .unwrap_or_else(|| prompts::EMPTY_ADVICE_FALLBACK.to_string()),
            sources: response.grounding_sources(),
        })
    }

    async fn identify_image(&self, jpeg: &[u8]) -> Result<String, GatewayError> {
        let data = base64::engine::general_purpose::STANDARD.encode(jpeg);
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: None,
                parts: vec![
                    Part::inline("image/jpeg", data),
                    Part::text(prompts::LENS_INSTRUCTION),
                ],
            }],
            ..GenerateContentRequest::default()
        };

        let response = self
            .generate("identify_image", &self.models.lens, &request)
            .await?;
        Ok(response
            .text()
            .unwrap_or_else(|| prompts::EMPTY_LENS_FALLBACK.to_string()))
    }

    async fn create_itinerary(
        &self,
        destination: &str,
        days: u32,
        preferences: &str,
    ) -> Result<String, GatewayError> {
        let request = GenerateContentRequest {
            contents: vec![Content::turn(
                "user",
                prompts::itinerary(destination, days, preferences),
            )],
            tools: vec![Tool::google_search()],
            ..GenerateContentRequest::default()
        };

        let response = self
            .generate("create_itinerary", &self.models.itinerary, &request)
            .await?;
        Ok(response.text().unwrap_or_default())
    }

    async fn get_quick_suggestions(
        &self,
        destination: &str,
    ) -> Result<Vec<ActivitySuggestion>, GatewayError> {
        let request = GenerateContentRequest {
            contents: vec![Content::turn("user", prompts::quick_suggestions(destination))],
            generation_config: Some(GenerationConfig::json(prompts::suggestions_schema())),
            ..GenerateContentRequest::default()
        };

        self.generate_json("quick_suggestions", &self.models.suggestions, &request)
            .await
    }

    async fn get_safety_alerts(&self, lat: f64, lng: f64) -> Result<SafetyBundle, GatewayError> {
        let request = GenerateContentRequest {
            contents: vec![Content::turn("user", prompts::safety_alerts(lat, lng))],
            tools: vec![Tool::google_search()],
            generation_config: Some(GenerationConfig::json(prompts::safety_schema())),
            ..GenerateContentRequest::default()
        };

        self.generate_json("safety_alerts", &self.models.safety, &request)
            .await
    }
}
