//! Remote text generation with per-model parameter profiles
//!
//! The reply contract never fails the caller: transport and API failures come
//! back as fixed apology strings so the conversational surface survives any
//! endpoint outage.

use serde::{Deserialize, Serialize};

use crate::config::{ModelChoice, ModelProfile, ModelTable, REQUEST_TIMEOUT};
use crate::{Error, Result};

/// Replies shorter than this escalate to the advanced profile
const MIN_REPLY_CHARS: usize = 20;

/// Generation length for the escalation retry
const ESCALATION_MAX_LENGTH: u32 = 250;

/// Sampling temperature for the escalation retry
const ESCALATION_TEMPERATURE: f32 = 0.8;

/// Stock answers that disqualify an escalated reply
const LOW_CONFIDENCE_REPLIES: [&str; 2] = ["i don't know", "i'm not sure"];

/// Leading role label the chat prompt makes models echo back
const REPLY_PREFIX: &str = "Assistant:";

/// Leading labels the escalation prompt makes models echo back
const ESCALATION_PREFIXES: [&str; 2] = ["Your detailed answer:", "Answer:"];

/// Fallback reply when the endpoint returns an empty result list
const EMPTY_RESULT_REPLY: &str = "I'm not sure how to respond to that.";

/// Reply when the endpoint answers with a non-success status
const API_ERROR_REPLY: &str =
    "I'm having trouble thinking right now. Let's talk about something else.";

/// Reply when the endpoint cannot be reached at all
const CONNECT_ERROR_REPLY: &str =
    "I'm having trouble connecting right now. Please try again in a moment.";

/// Request body for the generation endpoint
#[derive(Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParameters,
}

/// Sampling parameters sent with every generation call
#[derive(Serialize)]
struct GenerationParameters {
    max_length: u32,
    temperature: f32,
    top_p: f32,
    top_k: u32,
    repetition_penalty: f32,
    do_sample: bool,
}

impl GenerationParameters {
    const fn sampled(max_length: u32, temperature: f32) -> Self {
        Self {
            max_length,
            temperature,
            top_p: 0.95,
            top_k: 50,
            repetition_penalty: 1.2,
            do_sample: true,
        }
    }

    const fn for_profile(profile: &ModelProfile) -> Self {
        Self::sampled(profile.max_length, profile.temperature)
    }
}

/// The generation endpoint answers with either a result array or a lone
/// object carrying the same field
#[derive(Deserialize)]
#[serde(untagged)]
enum GenerationResponse {
    Sequence(Vec<GeneratedText>),
    Single(GeneratedText),
}

#[derive(Deserialize)]
struct GeneratedText {
    generated_text: String,
}

/// Produces assistant replies through remote generation endpoints
pub struct ChatClient {
    client: reqwest::Client,
    api_key: String,
    models: ModelTable,
}

impl ChatClient {
    /// Create a new chat client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client cannot be
    /// built
    pub fn new(models: ModelTable, api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("API key required for chat".to_string()));
        }

        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key,
            models,
        })
    }

    /// Produce a reply for `user_text` using the selected model profile.
    ///
    /// Never fails the caller: a non-success status or an unreachable
    /// endpoint comes back as a fixed apology string.
    pub async fn respond(&self, user_text: &str, model: ModelChoice) -> String {
        let profile = self.models.get(model);
        let prompt = chat_prompt(user_text);

        let raw = match self
            .generate(&profile.endpoint, &prompt, GenerationParameters::for_profile(profile))
            .await
        {
            Ok(Some(raw)) => raw,
            Ok(None) => return EMPTY_RESULT_REPLY.to_string(),
            Err(Error::Chat(e)) => {
                tracing::error!(error = %e, "generation failed");
                return API_ERROR_REPLY.to_string();
            }
            Err(e) => {
                tracing::error!(error = %e, "generation request failed");
                return CONNECT_ERROR_REPLY.to_string();
            }
        };

        let reply = clean_reply(&raw, &[REPLY_PREFIX]);
        if reply.chars().count() >= MIN_REPLY_CHARS {
            return reply;
        }

        tracing::debug!(chars = reply.chars().count(), "reply too short, escalating");
        self.escalate(user_text, reply).await
    }

    /// One retry against the advanced profile with an enriched prompt. The
    /// escalated reply wins only if it is strictly longer than the short
    /// reply and is not a low-confidence stock answer; any escalation
    /// failure silently keeps the original.
    async fn escalate(&self, user_text: &str, original: String) -> String {
        let profile = self.models.get(ModelChoice::Advanced);
        let prompt = escalation_prompt(user_text);
        let parameters =
            GenerationParameters::sampled(ESCALATION_MAX_LENGTH, ESCALATION_TEMPERATURE);

        match self.generate(&profile.endpoint, &prompt, parameters).await {
            Ok(Some(raw)) => {
                let escalated = clean_reply(&raw, &ESCALATION_PREFIXES);
                if accept_escalation(&original, &escalated) {
                    escalated
                } else {
                    original
                }
            }
            Ok(None) => original,
            Err(e) => {
                tracing::warn!(error = %e, "escalation failed, keeping short reply");
                original
            }
        }
    }

    /// Issue one generation call. `Ok(None)` means the endpoint answered 200
    /// with an empty result list.
    async fn generate(
        &self,
        endpoint: &str,
        prompt: &str,
        parameters: GenerationParameters,
    ) -> Result<Option<String>> {
        let request = GenerationRequest {
            inputs: prompt,
            parameters,
        };

        let response = self
            .client
            .post(endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Chat(format!("generation API error {status}: {body}")));
        }

        let result: GenerationResponse = response.json().await?;
        Ok(extract_text(result))
    }
}

/// First element of a result array, or the lone object's field
fn extract_text(response: GenerationResponse) -> Option<String> {
    match response {
        GenerationResponse::Sequence(items) => {
            items.into_iter().next().map(|item| item.generated_text)
        }
        GenerationResponse::Single(item) => Some(item.generated_text),
    }
}

/// The fixed instructional prompt for a chat turn
fn chat_prompt(user_text: &str) -> String {
    format!(
        "You are a helpful, friendly, and knowledgeable assistant.\n\n\
         User: {user_text}\n\n\
         Assistant:\n"
    )
}

/// The enriched prompt used when a reply came back too short
fn escalation_prompt(user_text: &str) -> String {
    format!(
        "You are a helpful assistant providing detailed, informative answers.\n\
         Answer the following question thoroughly:\n\n\
         Question: {user_text}\n\n\
         Your detailed answer:\n"
    )
}

/// Trim and strip any of the leading role labels models echo back
fn clean_reply(raw: &str, prefixes: &[&str]) -> String {
    let mut text = raw.trim();
    for prefix in prefixes {
        if let Some(rest) = text.strip_prefix(prefix) {
            text = rest.trim();
        }
    }
    text.to_string()
}

/// Whether a reply is one of the stock low-confidence answers
fn is_low_confidence(reply: &str) -> bool {
    let normalized = reply.trim().to_lowercase();
    LOW_CONFIDENCE_REPLIES
        .iter()
        .any(|phrase| normalized == *phrase)
}

/// An escalated reply wins only if strictly longer and not low-confidence
fn accept_escalation(original: &str, escalated: &str) -> bool {
    escalated.chars().count() > original.chars().count() && !is_low_confidence(escalated)
}
