//! Gemini request builders and response extractors.
//!
//! Three endpoint families share the `generateContent` wire shape:
//! plain text generation, speech synthesis (audio modality) and vision
//! (inline image + instruction). Text-bearing responses all surface the
//! payload at `candidates[0].content.parts[0].text`; speech responses
//! carry base64 audio at `...parts[0].inlineData.data`.

use serde_json::json;

use juris_invoke::{KeyAuth, ProviderRequest, RawResponse};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Text generation request for a prompt.
pub fn text_request(model: &str, prompt: &str) -> ProviderRequest {
    ProviderRequest {
        url: format!("{}/{}:generateContent", API_BASE, model),
        body: json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }]
        }),
        auth: KeyAuth::QueryParam("key".into()),
    }
}

/// Speech synthesis request for a narration script.
pub fn tts_request(model: &str, voice: &str, script: &str) -> ProviderRequest {
    ProviderRequest {
        url: format!("{}/{}:generateContent", API_BASE, model),
        body: json!({
            "contents": [{
                "parts": [{ "text": script }]
            }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": voice }
                    }
                }
            }
        }),
        auth: KeyAuth::QueryParam("key".into()),
    }
}

/// Vision request: transcribe one document page image (base64) to text.
pub fn ocr_request(model: &str, mime_type: &str, image_base64: &str) -> ProviderRequest {
    ProviderRequest {
        url: format!("{}/{}:generateContent", API_BASE, model),
        body: json!({
            "contents": [{
                "parts": [
                    { "text": "Transcreva todo o texto desta página de documento, \
                               preservando a numeração de artigos e parágrafos. \
                               Responda apenas com o texto transcrito." },
                    { "inlineData": { "mimeType": mime_type, "data": image_base64 } }
                ]
            }]
        }),
        auth: KeyAuth::QueryParam("key".into()),
    }
}

/// Pull generated text out of a `generateContent` response.
pub fn extract_text(response: &RawResponse) -> Result<String, String> {
    let parsed: serde_json::Value =
        serde_json::from_slice(&response.body).map_err(|e| format!("invalid JSON: {}", e))?;
    let text = parsed["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .ok_or("no text in candidates[0].content.parts[0]")?;
    if text.trim().is_empty() {
        return Err("empty text part".into());
    }
    Ok(text.trim().to_string())
}

/// Pull base64 audio out of a speech response.
pub fn extract_audio(response: &RawResponse) -> Result<String, String> {
    let parsed: serde_json::Value =
        serde_json::from_slice(&response.body).map_err(|e| format!("invalid JSON: {}", e))?;
    let data = parsed["candidates"][0]["content"]["parts"][0]["inlineData"]["data"]
        .as_str()
        .ok_or("no inlineData in candidates[0].content.parts[0]")?;
    if data.is_empty() {
        return Err("empty audio payload".into());
    }
    Ok(data.to_string())
}
