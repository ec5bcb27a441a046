//! Prompt text and response schemas sent to the model.

use serde_json::{json, Value};

pub const ADVICE_SYSTEM_INSTRUCTION: &str = "You are NomadAI, a world-class travel assistant. \
Act as a tour guide, historian, translator, and safety advisor. \
Always verify travel info. Use grounding for real-time data. \
If a user asks for places nearby, use the location context provided. \
Be friendly, visual, and concise. Warn about common scams.";

pub const LENS_INSTRUCTION: &str = "Identify this landmark or object. Provide a brief, engaging \
historical or cultural fact about it. If it is a menu or sign, translate it briefly.";

pub const LIVE_SYSTEM_INSTRUCTION: &str = "You are NomadAI Live. Speak like a real-time tour guide. \
Keep responses short and conversational. If the user stops talking, wait for them. \
If they ask about surroundings, provide interesting facts.";

pub const EMPTY_ADVICE_FALLBACK: &str = "I'm sorry, I couldn't generate a response right now.";
pub const EMPTY_LENS_FALLBACK: &str =
    "I couldn't quite make that out. Could you try a different angle?";

pub fn itinerary(destination: &str, days: u32, preferences: &str) -> String {
    format!(
        "Create a detailed {days}-day itinerary for {destination}. \
         Preferences: {preferences}. \
         Return the response in a structured Markdown format with times and activities."
    )
}

pub fn quick_suggestions(destination: &str) -> String {
    format!("List 5 must-do unique activities or hidden gems in {destination}. Return in JSON.")
}

pub fn safety_alerts(lat: f64, lng: f64) -> String {
    format!(
        "Provide 3-4 specific travel safety alerts, scam warnings, or local etiquette tips \
         for the area around these coordinates: {lat}, {lng}. \
         Include the human-readable city/region name."
    )
}

pub fn translation(text: &str, target_language: &str) -> String {
    format!(
        "Translate this text to {target_language} and provide a phonetic pronunciation guide. \
         Context: Traveling. \
         Text: \"{text}\""
    )
}

pub fn suggestions_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "title": { "type": "STRING" },
                "category": { "type": "STRING" },
                "description": { "type": "STRING" }
            },
            "required": ["title", "category", "description"]
        }
    })
}

pub fn safety_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "locationName": { "type": "STRING" },
            "regionStatus": { "type": "STRING", "description": "Safe, Caution, or Alert" },
            "alerts": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING" },
                        "severity": { "type": "STRING", "enum": ["low", "medium", "high"] },
                        "desc": { "type": "STRING" }
                    },
                    "required": ["title", "severity", "desc"]
                }
            },
            "etiquette": {
                "type": "ARRAY",
                "items": { "type": "STRING" }
            }
        },
        "required": ["locationName", "regionStatus", "alerts", "etiquette"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn itinerary_prompt_embeds_all_inputs() {
        let prompt = itinerary("Kyoto, Japan", 3, "Relaxed, food-focused");
        assert!(prompt.contains("3-day itinerary for Kyoto, Japan"));
        assert!(prompt.contains("Preferences: Relaxed, food-focused"));
        assert!(prompt.contains("Markdown"));
    }

    #[test]
    fn safety_prompt_embeds_coordinates() {
        let prompt = safety_alerts(35.0116, 135.7681);
        assert!(prompt.contains("35.0116, 135.7681"));
    }

    #[test]
    fn translation_prompt_quotes_text() {
        let prompt = translation("How much is this?", "Japanese");
        assert!(prompt.contains("to Japanese"));
        assert!(prompt.contains("\"How much is this?\""));
    }

    #[test]
    fn safety_schema_requires_every_field() {
        let schema = safety_schema();
        let required = schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 4);
    }
}
