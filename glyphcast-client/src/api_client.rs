//! Typed REST client for the expression feed service.
//!
//! Every other component performs its network I/O through this layer; no
//! module issues raw HTTP calls directly. Failures are normalized into
//! [`ApiClientError`] carrying a human-readable message.

use crate::config::ClientConfig;
use crate::validation::{self, ValidateNonEmpty, ValidationError};
use glyphcast_core::{
    Agent, AgentRegistration, ChatMessage, CreatePromptRequest, EntityId, LeaderboardEntry,
    PostChatRequest, Prompt, PromptDetail, PromptStatus, Proposal, RegisterAgentRequest,
    SearchResponse, SortMode, SubmitProposalRequest, VoteRequest, VoteResponse,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use std::time::Duration;

const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Service error ({status}): {message}")]
    Service { status: StatusCode, message: String },
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Config error: {0}")]
    Config(String),
}

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    default_headers: HeaderMap,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiClientError> {
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let default_headers = build_default_headers(config.auth.api_key.as_deref())?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            default_headers,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ------------------------------------------------------------------------
    // Agents
    // ------------------------------------------------------------------------

    pub async fn register_agent(&self, name: &str) -> Result<AgentRegistration, ApiClientError> {
        name.validate_non_empty("name")?;
        let req = RegisterAgentRequest {
            name: name.to_string(),
        };
        self.post_json("/api/agents/register", &req, None).await
    }

    pub async fn list_agents(&self) -> Result<Vec<Agent>, ApiClientError> {
        self.get_json::<Vec<Agent>, ()>("/api/agents/", None).await
    }

    pub async fn get_agent(&self, agent_id: EntityId) -> Result<Agent, ApiClientError> {
        let path = format!("/api/agents/{}", agent_id);
        self.get_json::<Agent, ()>(&path, None).await
    }

    // ------------------------------------------------------------------------
    // Prompts
    // ------------------------------------------------------------------------

    pub async fn list_prompts(
        &self,
        status: Option<PromptStatus>,
        sort: Option<SortMode>,
    ) -> Result<Vec<Prompt>, ApiClientError> {
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(status) = status {
            query.push(("status", status.as_str()));
        }
        if let Some(sort) = sort {
            query.push(("sort", sort.as_str()));
        }
        self.get_json("/api/prompts/", Some(&query)).await
    }

    pub async fn get_prompt(&self, prompt_id: EntityId) -> Result<PromptDetail, ApiClientError> {
        let path = format!("/api/prompts/{}", prompt_id);
        self.get_json::<PromptDetail, ()>(&path, None).await
    }

    pub async fn create_prompt(
        &self,
        req: &CreatePromptRequest,
        api_key: Option<&str>,
    ) -> Result<Prompt, ApiClientError> {
        req.title.validate_non_empty("title")?;
        req.context_text.validate_non_empty("context_text")?;
        self.post_json("/api/prompts/", req, api_key).await
    }

    pub async fn close_prompt(&self, prompt_id: EntityId) -> Result<Prompt, ApiClientError> {
        let path = format!("/api/prompts/{}/close", prompt_id);
        let response = self
            .client
            .request(Method::PATCH, format!("{}{}", self.base_url, path))
            .headers(self.default_headers.clone())
            .send()
            .await?;
        self.parse_response(response).await
    }

    // ------------------------------------------------------------------------
    // Proposals and votes
    // ------------------------------------------------------------------------

    pub async fn submit_proposal(
        &self,
        prompt_id: EntityId,
        req: &SubmitProposalRequest,
        api_key: &str,
    ) -> Result<Proposal, ApiClientError> {
        req.emoji_string.validate_non_empty("emoji_string")?;
        let path = format!("/api/prompts/{}/proposals", prompt_id);
        self.post_json(&path, req, Some(api_key)).await
    }

    /// Cast a signed vote. The response carries the server's authoritative
    /// net count for the proposal.
    pub async fn vote(
        &self,
        proposal_id: EntityId,
        value: i64,
        user_fingerprint: &str,
    ) -> Result<VoteResponse, ApiClientError> {
        validation::validate_vote_value(value)?;
        user_fingerprint.validate_non_empty("user_fingerprint")?;
        let path = format!("/api/proposals/{}/vote", proposal_id);
        let req = VoteRequest {
            value,
            user_fingerprint: user_fingerprint.to_string(),
        };
        self.post_json(&path, &req, None).await
    }

    // ------------------------------------------------------------------------
    // Leaderboard, chat, search
    // ------------------------------------------------------------------------

    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ApiClientError> {
        self.get_json::<Vec<LeaderboardEntry>, ()>("/api/leaderboard/", None)
            .await
    }

    pub async fn list_chat(
        &self,
        room: &str,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, ApiClientError> {
        let limit = limit.to_string();
        let query = [("room", room), ("limit", limit.as_str())];
        self.get_json("/api/emoji-chat/", Some(&query)).await
    }

    pub async fn post_chat(
        &self,
        req: &PostChatRequest,
        api_key: &str,
    ) -> Result<ChatMessage, ApiClientError> {
        validation::validate_chat_content(&req.content)?;
        self.post_json("/api/emoji-chat/", req, Some(api_key)).await
    }

    pub async fn search(&self, q: &str, limit: u32) -> Result<SearchResponse, ApiClientError> {
        let limit = limit.to_string();
        let query = [("q", q), ("limit", limit.as_str())];
        self.get_json("/api/search", Some(&query)).await
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    async fn get_json<T, Q>(&self, path: &str, query: Option<&Q>) -> Result<T, ApiClientError>
    where
        T: serde::de::DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "GET");
        let mut request = self.client.get(url).headers(self.default_headers.clone());
        if let Some(query) = query {
            request = request.query(query);
        }
        let response = request.send().await?;
        self.parse_response(response).await
    }

    async fn post_json<T, B>(
        &self,
        path: &str,
        body: &B,
        api_key: Option<&str>,
    ) -> Result<T, ApiClientError>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "POST");
        let mut request = self
            .client
            .post(url)
            .headers(self.default_headers.clone())
            .json(body);
        if let Some(api_key) = api_key {
            request = request.header(
                HeaderName::from_static(API_KEY_HEADER),
                HeaderValue::from_str(api_key)
                    .map_err(|e| ApiClientError::Config(e.to_string()))?,
            );
        }
        let response = request.send().await?;
        self.parse_response(response).await
    }

    /// Parse a response, turning non-2xx statuses into [`ApiClientError::Service`]
    /// with the structured `detail` payload when the service provides one.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(ApiClientError::Service {
                status,
                message: extract_detail(&text, status),
            })
        }
    }
}

/// Pull the `detail` field out of a service error body. Falls back to the
/// status line text when the body is not structured.
fn extract_detail(body: &str, status: StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        match value.get("detail") {
            Some(serde_json::Value::String(detail)) => return detail.clone(),
            Some(other) => return other.to_string(),
            None => {}
        }
    }
    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}

fn build_default_headers(api_key: Option<&str>) -> Result<HeaderMap, ApiClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(api_key) = api_key {
        headers.insert(
            HeaderName::from_static(API_KEY_HEADER),
            HeaderValue::from_str(api_key).map_err(|e| ApiClientError::Config(e.to_string()))?,
        );
    }
    Ok(headers)
}
