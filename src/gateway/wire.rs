//! Gemini `generateContent` request and response shapes.
//!
//! Only the fields Nomad sends or reads are modelled. Unknown response
//! fields are ignored.

use serde::{Deserialize, Serialize};

use super::types::GroundingSource;

// ── Request ──────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<ToolConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn turn(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: Some(role.to_string()),
            parts: vec![Part::text(text)],
        }
    }

    /// Role-less content, used for system instructions.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part::text(text)],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<Blob>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn inline(mime_type: &str, data_b64: String) -> Self {
        Self {
            text: None,
            inline_data: Some(Blob {
                mime_type: mime_type.to_string(),
                data: data_b64,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    pub data: String, // base64
}

/// Empty JSON object used to switch a built-in tool on.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Enabled {}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_search: Option<Enabled>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_maps: Option<Enabled>,
}

impl Tool {
    pub fn google_search() -> Self {
        Self {
            google_search: Some(Enabled {}),
            ..Self::default()
        }
    }

    pub fn google_maps() -> Self {
        Self {
            google_maps: Some(Enabled {}),
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfig {
    pub retrieval_config: RetrievalConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalConfig {
    pub lat_lng: LatLng,
}

#[derive(Debug, Serialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: serde_json::Value,
}

impl GenerationConfig {
    pub fn json(schema: serde_json::Value) -> Self {
        Self {
            response_mime_type: "application/json".to_string(),
            response_schema: schema,
        }
    }
}

// ── Response ─────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<ChunkRef>,
    #[serde(default)]
    pub maps: Option<ChunkRef>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChunkRef {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate, `None` when the
    /// model returned no text at all.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Citations of the first candidate, resolved into typed sources.
    pub fn grounding_sources(&self) -> Vec<GroundingSource> {
        self.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|meta| {
                meta.grounding_chunks
                    .iter()
                    .filter_map(GroundingChunk::resolve)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl GroundingChunk {
    /// Web links win over map links; chunks without a URI are dropped.
    fn resolve(&self) -> Option<GroundingSource> {
        if let Some((uri, title)) = self.web.as_ref().and_then(ChunkRef::parts) {
            return Some(GroundingSource::Web { uri, title });
        }
        self.maps
            .as_ref()
            .and_then(ChunkRef::parts)
            .map(|(uri, title)| GroundingSource::Map { uri, title })
    }
}

impl ChunkRef {
    fn parts(&self) -> Option<(String, String)> {
        let uri = self.uri.as_deref().filter(|u| !u.is_empty())?;
        Some((uri.to_string(), self.title.clone().unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_concatenates_parts_of_first_candidate() {
        let json = r#"{"candidates": [
            {"content": {"role": "model", "parts": [{"text": "Hello, "}, {"text": "Kyoto"}]}},
            {"content": {"parts": [{"text": "ignored"}]}}
        ]}"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.text().as_deref(), Some("Hello, Kyoto"));
    }

    #[test]
    fn text_is_none_without_candidates() {
        let resp: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.text().is_none());
        assert!(resp.grounding_sources().is_empty());
    }

    #[test]
    fn grounding_chunks_resolve_to_tagged_sources() {
        let json = r#"{"candidates": [{
            "content": {"parts": [{"text": "x"}]},
            "groundingMetadata": {"groundingChunks": [
                {"web": {"uri": "https://example.com/gion", "title": "Gion"}},
                {"maps": {"uri": "https://maps.google.com/?cid=1", "title": "Nishiki Market"}},
                {"web": {"title": "no uri"}},
                {"retrievedContext": {"uri": "gs://bucket"}}
            ]}
        }]}"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        let sources = resp.grounding_sources();
        assert_eq!(sources.len(), 2);
        assert!(matches!(&sources[0], GroundingSource::Web { title, .. } if title == "Gion"));
        assert!(matches!(&sources[1], GroundingSource::Map { uri, .. } if uri.contains("cid=1")));
    }

    #[test]
    fn request_serializes_camel_case_and_skips_empty() {
        let req = GenerateContentRequest {
            contents: vec![Content::turn("user", "hi")],
            system_instruction: Some(Content::text("persona")),
            tools: vec![Tool::google_search(), Tool::google_maps()],
            tool_config: Some(ToolConfig {
                retrieval_config: RetrievalConfig {
                    lat_lng: LatLng {
                        latitude: 35.0,
                        longitude: 135.7,
                    },
                },
            }),
            generation_config: None,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "persona");
        assert!(value["systemInstruction"].get("role").is_none());
        assert_eq!(value["tools"][0], serde_json::json!({"googleSearch": {}}));
        assert_eq!(value["tools"][1], serde_json::json!({"googleMaps": {}}));
        assert_eq!(value["toolConfig"]["retrievalConfig"]["latLng"]["latitude"], 35.0);
        assert!(value.get("generationConfig").is_none());
    }
}
