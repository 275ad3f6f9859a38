//! Thin REST client. Every endpoint answers with a `{status, message, data}`
//! envelope; success becomes `Ok(data)` and anything else an `AppError`
//! carrying the server's message.

use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::backend::error::{AppError, AppResult};
use crate::backend::models::{AuthSession, Credentials, Registration};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    Courses,
    Exams,
    Questions,
    ReadingMaterials,
    ExamResults,
    Payments,
    SpeakingQuestions,
    SpeakingResponses,
}

impl Resource {
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Users => "users",
            Resource::Courses => "courses",
            Resource::Exams => "exams",
            Resource::Questions => "questions",
            Resource::ReadingMaterials => "reading-materials",
            Resource::ExamResults => "exam-results",
            Resource::Payments => "payments",
            Resource::SpeakingQuestions => "speaking-questions",
            Resource::SpeakingResponses => "speaking-responses",
        }
    }
}

/// Backends disagree on how they spell success; all three shapes are accepted.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum EnvelopeStatus {
    Flag(bool),
    Code(i64),
    Text(String),
}

impl EnvelopeStatus {
    pub fn is_success(&self) -> bool {
        match self {
            EnvelopeStatus::Flag(ok) => *ok,
            EnvelopeStatus::Code(code) => *code == 1 || (200..300).contains(code),
            EnvelopeStatus::Text(text) => {
                matches!(text.to_ascii_lowercase().as_str(), "success" | "ok" | "true")
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub status: EnvelopeStatus,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

/// Decodes a response body into its envelope payload.
pub fn parse_envelope<T: DeserializeOwned>(http_status: u16, body: &str) -> AppResult<Option<T>> {
    let http_ok = (200..300).contains(&http_status);

    let envelope: Envelope<T> = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(_) if http_status == 401 => return Err(AppError::Unauthenticated),
        Err(_) if !http_ok => return Err(AppError::Api(format!("Server returned HTTP {}", http_status))),
        Err(e) => return Err(AppError::Serialization(e)),
    };

    if http_status == 401 {
        return Err(AppError::Unauthenticated);
    }

    if http_ok && envelope.status.is_success() {
        Ok(envelope.data)
    } else {
        let message = envelope
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("Request failed with HTTP {}", http_status));
        Err(AppError::Api(message))
    }
}

fn require<T>(data: Option<T>) -> AppResult<T> {
    data.ok_or_else(|| AppError::Api("Response contained no data".to_string()))
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn collection_url(&self, resource: Resource) -> String {
        format!("{}/{}", self.base_url, resource.path())
    }

    pub fn item_url(&self, resource: Resource, id: &str) -> String {
        format!("{}/{}/{}", self.base_url, resource.path(), id)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> AppResult<Option<T>> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        tracing::debug!(status, bytes = body.len(), "API response");

        parse_envelope(status, &body)
    }

    pub async fn list<T: DeserializeOwned>(&self, resource: Resource) -> AppResult<Vec<T>> {
        self.list_where(resource, &[]).await
    }

    pub async fn list_where<T: DeserializeOwned>(
        &self,
        resource: Resource,
        query: &[(&str, &str)],
    ) -> AppResult<Vec<T>> {
        let request = self.http.get(self.collection_url(resource)).query(query);
        Ok(self.send(request).await?.unwrap_or_default())
    }

    pub async fn details<T: DeserializeOwned>(&self, resource: Resource, id: &str) -> AppResult<T> {
        let request = self.http.get(self.item_url(resource, id));
        require(self.send(request).await?)
    }

    pub async fn store<B: Serialize, T: DeserializeOwned>(&self, resource: Resource, body: &B) -> AppResult<T> {
        let request = self.http.post(self.collection_url(resource)).json(body);
        require(self.send(request).await?)
    }

    /// Replaces one record. Servers answer with the stored record or with no data at all.
    pub async fn update<B: Serialize, T: DeserializeOwned>(
        &self,
        resource: Resource,
        id: &str,
        body: &B,
    ) -> AppResult<Option<T>> {
        let request = self.http.put(self.item_url(resource, id)).json(body);
        self.send(request).await
    }

    /// Create (no id) or replace (with id), ignoring whatever data the server echoes back.
    pub async fn save<B: Serialize>(&self, resource: Resource, id: Option<&str>, body: &B) -> AppResult<()> {
        match id {
            Some(id) => {
                self.update::<_, serde_json::Value>(resource, id, body).await?;
            }
            None => {
                let request = self.http.post(self.collection_url(resource)).json(body);
                self.send::<serde_json::Value>(request).await?;
            }
        }
        Ok(())
    }

    pub async fn destroy(&self, resource: Resource, id: &str) -> AppResult<()> {
        let request = self.http.delete(self.item_url(resource, id));
        self.send::<serde_json::Value>(request).await?;
        Ok(())
    }

    pub async fn login(&self, credentials: &Credentials) -> AppResult<AuthSession> {
        let request = self
            .http
            .post(format!("{}/auth/login", self.base_url))
            .json(credentials);
        require(self.send(request).await?)
    }

    pub async fn register(&self, registration: &Registration) -> AppResult<AuthSession> {
        let request = self
            .http
            .post(format!("{}/auth/register", self.base_url))
            .json(registration);
        require(self.send(request).await?)
    }
}
