use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::config::GenerationConfig;
use crate::types::{Planet, ZodiacSign};

/// Returned in place of a per-planet reading when the backend fails.
pub const EXPLANATION_FALLBACK: &str = "No explanation found. Please try again later.";
/// Returned in place of the holistic reading when the backend fails.
pub const HOLISTIC_FALLBACK: &str = "No holistic reading found. Please try again later.";

const TEMPERATURE: f64 = 0.7;
const EXPLANATION_MAX_TOKENS: u32 = 150;
const HOLISTIC_MAX_TOKENS: u32 = 300;

/// Chat-completion backend. The credential is the caller's bearer token,
/// forwarded per call — never stored, never logged.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn complete(
        &self,
        messages: &[Value],
        max_tokens: u32,
        credential: &str,
    ) -> anyhow::Result<String>;
}

/// OpenAI-style `/chat/completions` backend.
pub struct OpenAiCompatibleBackend {
    client: Client,
    base_url: String,
    model: String,
}

impl OpenAiCompatibleBackend {
    pub fn new(config: &GenerationConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .expect("failed to build HTTP client"),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl GenerationBackend for OpenAiCompatibleBackend {
    async fn complete(
        &self,
        messages: &[Value],
        max_tokens: u32,
        credential: &str,
    ) -> anyhow::Result<String> {
        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": TEMPERATURE,
            "max_tokens": max_tokens,
        });

        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %self.model, url = %url, "calling generation backend");

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {credential}"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            error!(status = %status, "generation backend error: {}", truncate(&text, 300));
            anyhow::bail!("generation backend returned HTTP {status}");
        }

        let data: Value = serde_json::from_str(&text)?;
        let content = data["choices"]
            .get(0)
            .and_then(|choice| choice["message"]["content"].as_str())
            .ok_or_else(|| anyhow::anyhow!("no content in generation response"))?;

        Ok(content.to_string())
    }
}

fn truncate(text: &str, limit: usize) -> &str {
    let mut end = limit.min(text.len());
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Produces the natural-language readings. Both operations are
/// fault-tolerant by design: any backend failure is replaced by a fixed
/// fallback string and never fails the request.
pub struct ReadingGenerator {
    backend: Arc<dyn GenerationBackend>,
}

impl ReadingGenerator {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// Concise reading (≤75 words) for one (planet, sign) placement.
    pub async fn explain(&self, planet: Planet, sign: ZodiacSign, credential: &str) -> String {
        let messages = explanation_messages(planet, sign);
        match self
            .backend
            .complete(&messages, EXPLANATION_MAX_TOKENS, credential)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(planet = %planet, sign = %sign, "explanation generation failed: {e:#}");
                EXPLANATION_FALLBACK.to_string()
            }
        }
    }

    /// One synthesis (≤200 words) over all placements, naming classical
    /// aspects by textual inference only — no geometry is computed here.
    pub async fn synthesize(&self, pairs: &[(Planet, ZodiacSign)], credential: &str) -> String {
        let messages = holistic_messages(pairs);
        match self
            .backend
            .complete(&messages, HOLISTIC_MAX_TOKENS, credential)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!("holistic reading generation failed: {e:#}");
                HOLISTIC_FALLBACK.to_string()
            }
        }
    }
}

fn explanation_messages(planet: Planet, sign: ZodiacSign) -> Vec<Value> {
    let system = format!(
        "In the voice of an astrologer, give a concise, brutally honest, and straight to the \
         point, personal chart reading for a person born with the planet {planet} in the sign \
         of {sign}. Do not give an introduction or waste any time. Give the reading and \
         nothing else. Use 75 words or less."
    );
    let user = format!(
        "In the voice of an expert astrologer, explain the significance of a person born with \
         the planet {planet} in the sign of {sign}."
    );
    vec![
        json!({"role": "system", "content": system}),
        json!({"role": "user", "content": user}),
    ]
}

fn holistic_messages(pairs: &[(Planet, ZodiacSign)]) -> Vec<Value> {
    let placements = pairs
        .iter()
        .map(|(planet, sign)| format!("{planet}: {sign}"))
        .collect::<Vec<_>>()
        .join(", ");

    let prompt = format!(
        "You are a skilled astrologer. Analyze the following planetary placements and identify \
         the conjunctions, sextiles, squares, trines, and oppositions. After identifying the \
         aspects, explain the effect they have on the person's life. Focus on the aspects and \
         interactions between the planets; do not exceed 200 words.\n\n\
         Planetary placements:\n{placements}\n\n\
         Remember to keep the explanation concise and focused on the aspects between the planets."
    );
    vec![json!({"role": "user", "content": prompt})]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explanation_prompt_shape() {
        let messages = explanation_messages(Planet::Mars, ZodiacSign::Scorpio);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");

        let system = messages[0]["content"].as_str().unwrap();
        assert!(system.contains("Mars"));
        assert!(system.contains("Scorpio"));
        assert!(system.contains("75 words or less"));
    }

    #[test]
    fn holistic_prompt_lists_all_placements() {
        let pairs: Vec<(Planet, ZodiacSign)> = Planet::ALL
            .iter()
            .map(|&p| (p, ZodiacSign::Aries))
            .collect();
        let messages = holistic_messages(&pairs);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");

        let prompt = messages[0]["content"].as_str().unwrap();
        for planet in Planet::ALL {
            assert!(prompt.contains(&format!("{planet}: Aries")), "{planet} missing");
        }
        assert!(prompt.contains("conjunctions, sextiles, squares, trines, and oppositions"));
        assert!(prompt.contains("do not exceed 200 words"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let text = "héllo wörld";
        let cut = truncate(text, 2);
        assert!(cut.len() <= 2);
        assert!(text.starts_with(cut));
        assert_eq!(truncate("short", 300), "short");
    }
}
