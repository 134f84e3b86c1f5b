//! Jira REST client

use crate::{
    contract::{
        environment_update_body, transition_body, CreateIssueRequest, CreatedIssue, IssueTracker,
        SearchPage, SearchRequest,
    },
    Error, Result,
};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

const SEARCH_PATH: &str = "/rest/api/latest/search";
const ISSUE_PATH: &str = "/rest/api/latest/issue";

/// Connection settings for a Jira instance
#[derive(Debug, Clone)]
pub struct JiraConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
}

/// Issue tracker backed by Jira's REST API with basic authentication
pub struct JiraClient {
    client: Client,
    base_url: Url,
    username: String,
    password: String,
}

impl JiraClient {
    pub fn new(config: &JiraConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("exception-triage/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: Url::parse(&config.base_url)?,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn search_url(&self) -> Result<Url> {
        Ok(self.base_url.join(SEARCH_PATH)?)
    }

    fn issue_url(&self, suffix: Option<&str>) -> Result<Url> {
        let path = match suffix {
            Some(suffix) => format!("{}/{}", ISSUE_PATH, suffix),
            None => ISSUE_PATH.to_string(),
        };
        Ok(self.base_url.join(&path)?)
    }

    async fn post_search(&self, request: &SearchRequest) -> Result<Response> {
        debug!("Searching tracker at offset {}: {}", request.start_at, request.jql);

        let response = self
            .client
            .post(self.search_url()?)
            .basic_auth(&self.username, Some(&self.password))
            .json(request)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(Error::RetrievalFailed {
                status_code: response.status().as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl IssueTracker for JiraClient {
    async fn search(&self, request: &SearchRequest) -> Result<SearchPage> {
        Ok(self.post_search(request).await?.json().await?)
    }

    async fn search_raw(&self, request: &SearchRequest) -> Result<Value> {
        Ok(self.post_search(request).await?.json().await?)
    }

    async fn create_issue(&self, request: &CreateIssueRequest) -> Result<CreatedIssue> {
        info!("Creating tracker issue: {}", request.fields.summary);
        debug!("Sending: {}", serde_json::to_string(request)?);

        let response = self
            .client
            .post(self.issue_url(None)?)
            .basic_auth(&self.username, Some(&self.password))
            .json(request)
            .send()
            .await?;

        if response.status() != StatusCode::CREATED {
            return Err(Error::WriteFailed {
                status_code: response.status().as_u16(),
            });
        }

        Ok(response.json().await?)
    }

    async fn update_environment(&self, key: &str, environment: &str) -> Result<()> {
        let body = environment_update_body(environment);
        info!("Updating tracker issue {}", key);
        debug!("Sending: {}", body);

        let response = self
            .client
            .put(self.issue_url(Some(key))?)
            .basic_auth(&self.username, Some(&self.password))
            .json(&body)
            .send()
            .await?;

        if response.status() != StatusCode::NO_CONTENT {
            return Err(Error::WriteFailed {
                status_code: response.status().as_u16(),
            });
        }
        Ok(())
    }

    async fn transition(&self, key: &str, transition_id: &str) -> Result<u16> {
        info!("Transitioning tracker issue {} with transition {}", key, transition_id);

        let response = self
            .client
            .post(self.issue_url(Some(&format!("{}/transitions", key)))?)
            .basic_auth(&self.username, Some(&self.password))
            .json(&transition_body(transition_id))
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        debug!("Transition response ({}): {}", status, text);
        Ok(status)
    }
}
