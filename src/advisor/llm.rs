// src/advisor/llm.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::{AdjustDifficultyRequest, AdjustDifficultyResponse, AdvisorError, DifficultyAdvisor};

const SYSTEM_PROMPT: &str = "You are an AI quiz master who dynamically adjusts quiz difficulty to keep users challenged and engaged.
You will be given the user's performance in the last quiz set (as a percentage) and the current difficulty level (Easy, Medium or Hard).
Decide whether to increase, decrease, or keep the difficulty level:
- If performance is high (above 90%), increase the difficulty to keep them challenged.
- If performance is low (below 60%), decrease the difficulty to avoid frustration.
- If performance is moderate (60-90%), keep the difficulty the same.
Reply with a JSON object: {\"adjustedDifficulty\": string, \"reasoning\": string}.";

/// Difficulty advisor backed by an OpenAI-compatible chat completions endpoint.
pub struct LlmAdvisor {
    client: Client,
    base_url: Url,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl LlmAdvisor {
    pub fn new(client: Client, base_url: Url, api_key: String, model: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
            model,
        }
    }

    /// HTTP client for the advisor. A stalled endpoint fails after `timeout`
    /// instead of holding the request open.
    pub fn client(timeout: Duration) -> reqwest::Result<Client> {
        Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.as_str().trim_end_matches('/'))
    }
}

/// Pulls the structured answer out of a completion's message content.
fn parse_answer(content: &str) -> Result<AdjustDifficultyResponse, AdvisorError> {
    let answer: AdjustDifficultyResponse = serde_json::from_str(content.trim())
        .map_err(|e| AdvisorError::Malformed(e.to_string()))?;

    if answer.adjusted_difficulty.trim().is_empty() {
        return Err(AdvisorError::Malformed("empty adjustedDifficulty".to_string()));
    }
    Ok(answer)
}

#[async_trait]
impl DifficultyAdvisor for LlmAdvisor {
    async fn adjust(
        &self,
        request: &AdjustDifficultyRequest,
    ) -> Result<AdjustDifficultyResponse, AdvisorError> {
        let body = json!({
            "model": self.model,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": format!(
                        "Here's the user's performance: {}%\nCurrent Difficulty: {}",
                        request.user_performance, request.current_difficulty
                    )
                }
            ]
        });

        tracing::debug!("Requesting difficulty adjustment from {}", self.endpoint());
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletion = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AdvisorError::Malformed("no completion content".to_string()))?;

        parse_answer(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_structured_content() {
        let answer = parse_answer(
            r#" {"adjustedDifficulty":"Hard","reasoning":"95% is consistently high."} "#,
        )
        .unwrap();
        assert_eq!(answer.adjusted_difficulty, "Hard");
    }

    #[test]
    fn rejects_prose_and_blank_labels() {
        assert!(matches!(parse_answer("Make it harder"), Err(AdvisorError::Malformed(_))));
        assert!(matches!(
            parse_answer(r#"{"adjustedDifficulty":" ","reasoning":""}"#),
            Err(AdvisorError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn stalled_endpoint_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accepts connections and never answers.
        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let advisor = LlmAdvisor::new(
            LlmAdvisor::client(Duration::from_millis(200)).unwrap(),
            Url::parse(&format!("http://{}/v1", addr)).unwrap(),
            "k".into(),
            "m".into(),
        );
        let request = AdjustDifficultyRequest {
            user_performance: 95.0,
            current_difficulty: "Medium".into(),
        };

        let started = std::time::Instant::now();
        let result = advisor.adjust(&request).await;
        assert!(matches!(result, Err(AdvisorError::Http(e)) if e.is_timeout()));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let advisor = LlmAdvisor::new(
            Client::new(),
            Url::parse("http://localhost:8080/v1/").unwrap(),
            "k".into(),
            "m".into(),
        );
        assert_eq!(advisor.endpoint(), "http://localhost:8080/v1/chat/completions");
    }
}
