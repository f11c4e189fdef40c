// Location classifier - best-effort enrichment of the free-text watching
// location into one of six category labels via an external text-generation
// service. Failures are logged and swallowed; experience creation never
// depends on this call succeeding.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::config::ClassifierConfig;

pub const LOCATION_CATEGORIES: [&str; 6] = [
    "Stadium",
    "Home",
    "Pub/Bar",
    "Friend's House",
    "Outdoor",
    "Other",
];

#[async_trait]
pub trait LocationClassifier: Send + Sync {
    /// Returns a category label, or None when classification is
    /// unavailable or fails.
    async fn categorize(&self, location: &str, details: Option<&str>) -> Option<String>;
}

/// Classifier backed by an OpenAI-compatible chat completion endpoint.
pub struct OpenAiClassifier {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl OpenAiClassifier {
    pub fn new(endpoint: String, model: String, api_key: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint,
            model,
            api_key,
        }
    }

    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let value: serde_json::Value = response.json().await?;
        value["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("completion response had no text content"))
    }
}

#[async_trait]
impl LocationClassifier for OpenAiClassifier {
    async fn categorize(&self, location: &str, details: Option<&str>) -> Option<String> {
        let context = build_location_context(location, details);
        match self.complete(&classification_prompt(&context)).await {
            // The label is stored verbatim; the model is trusted to answer
            // with one of the six categories.
            Ok(text) => Some(text.trim().to_string()),
            Err(e) => {
                warn!("AI categorization failed: {}", e);
                None
            }
        }
    }
}

/// Used when no API key is configured and in tests.
pub struct NoopClassifier;

#[async_trait]
impl LocationClassifier for NoopClassifier {
    async fn categorize(&self, _location: &str, _details: Option<&str>) -> Option<String> {
        None
    }
}

pub fn classifier_from_config(config: &ClassifierConfig) -> Arc<dyn LocationClassifier> {
    match &config.api_key {
        Some(key) => Arc::new(OpenAiClassifier::new(
            config.endpoint.clone(),
            config.model.clone(),
            key.clone(),
            Duration::from_secs(config.timeout_secs),
        )),
        None => Arc::new(NoopClassifier),
    }
}

fn build_location_context(location: &str, details: Option<&str>) -> String {
    match details.filter(|d| !d.trim().is_empty()) {
        Some(details) => format!("{} - {}", location, details),
        None => location.to_string(),
    }
}

fn classification_prompt(context: &str) -> String {
    let categories = LOCATION_CATEGORIES
        .map(|c| format!("\"{}\"", c))
        .join(", ");
    format!(
        "Categorize this football watching location into one of these categories: {}. \n\nLocation: {}\n\nRespond with only the category name, nothing else.",
        categories, context
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_joins_location_and_details() {
        assert_eq!(
            build_location_context("Pub", Some("The Red Lion")),
            "Pub - The Red Lion"
        );
        assert_eq!(build_location_context("Pub", None), "Pub");
        assert_eq!(build_location_context("Pub", Some("  ")), "Pub");
    }

    #[test]
    fn prompt_names_every_category() {
        let prompt = classification_prompt("Home");
        for category in LOCATION_CATEGORIES {
            assert!(prompt.contains(category));
        }
        assert!(prompt.contains("Location: Home"));
    }

    #[tokio::test]
    async fn noop_classifier_yields_none() {
        assert_eq!(NoopClassifier.categorize("Pub", None).await, None);
    }
}
