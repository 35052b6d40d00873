//! Remote task service: the trait the controller talks to and its HTTP implementation.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::task::{Task, TaskDraft, TaskId};

#[async_trait]
pub trait TaskService: Send + Sync {
    async fn list(&self) -> Result<Vec<Task>>;
    async fn fetch(&self, id: TaskId) -> Result<Task>;
    async fn create(&self, draft: &TaskDraft) -> Result<Task>;
    async fn update(&self, id: TaskId, draft: &TaskDraft) -> Result<Task>;
    async fn delete(&self, id: TaskId) -> Result<()>;
}

/// `TaskService` over the `/todos` REST resource.
pub struct HttpTaskService {
    http: Client,
    base_url: String,
}

impl HttpTaskService {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self> {
        let trimmed = base_url.trim_end_matches('/');
        Url::parse(trimmed).map_err(|e| ClientError::InvalidUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            http,
            base_url: trimmed.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}/todos", self.base_url)
    }

    fn item_url(&self, id: TaskId) -> String {
        format!("{}/todos/{id}", self.base_url)
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response> {
        let res = request.send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status,
                url: url.to_string(),
            });
        }
        Ok(res)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, url: &str) -> Result<T> {
        let body = self.send(request, url).await?.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ClientError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl TaskService for HttpTaskService {
    async fn list(&self) -> Result<Vec<Task>> {
        let url = self.collection_url();
        debug!(%url, "GET tasks");
        self.send_json(self.http.get(&url), &url).await
    }

    async fn fetch(&self, id: TaskId) -> Result<Task> {
        let url = self.item_url(id);
        debug!(%url, "GET task");
        self.send_json(self.http.get(&url), &url).await
    }

    async fn create(&self, draft: &TaskDraft) -> Result<Task> {
        let url = self.collection_url();
        debug!(%url, title = %draft.title, "POST task");
        self.send_json(self.http.post(&url).json(draft), &url).await
    }

    async fn update(&self, id: TaskId, draft: &TaskDraft) -> Result<Task> {
        let url = self.item_url(id);
        debug!(%url, completed = draft.completed, "PUT task");
        self.send_json(self.http.put(&url).json(draft), &url).await
    }

    async fn delete(&self, id: TaskId) -> Result<()> {
        let url = self.item_url(id);
        debug!(%url, "DELETE task");
        self.send(self.http.delete(&url), &url).await?;
        Ok(())
    }
}
