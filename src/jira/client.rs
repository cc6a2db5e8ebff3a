use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, instrument};

use super::options::JiraOptions;
use super::types::{
    JiraIssue, JiraIssueBulkResponse, JiraIssuePickerResponse, JiraResource, JiraTokenResponse,
};

/// Failures from the ticket-tracking integration
///
/// These are request-level errors; they never touch room state.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("ticket provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("ticket provider returned status {0}")]
    Status(u16),
}

/// Abstract ticket-tracking integration the room gateway depends on
#[async_trait]
pub trait TicketProvider: Send + Sync {
    /// Exchanges an OAuth authorization code for an access token
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<JiraTokenResponse, ProviderError>;

    /// Lists the cloud sites the token grants access to
    async fn accessible_resources(&self, token: &str) -> Result<Vec<JiraResource>, ProviderError>;

    /// Typeahead issue search on one site
    async fn search_issues(
        &self,
        token: &str,
        resource_id: &str,
        query: &str,
    ) -> Result<JiraIssuePickerResponse, ProviderError>;

    /// Bulk-fetches issues with rendered (HTML) fields
    async fn fetch_issues(
        &self,
        token: &str,
        resource_id: &str,
        ids: &[String],
    ) -> Result<Vec<JiraIssue>, ProviderError>;
}

/// Atlassian cloud implementation of `TicketProvider`
pub struct HttpJiraClient {
    http: reqwest::Client,
    options: JiraOptions,
}

impl HttpJiraClient {
    pub fn new(options: JiraOptions) -> Self {
        Self {
            http: reqwest::Client::new(),
            options,
        }
    }

    fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(ProviderError::Status(response.status().as_u16()))
        }
    }
}

#[async_trait]
impl TicketProvider for HttpJiraClient {
    #[instrument(skip(self, code))]
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<JiraTokenResponse, ProviderError> {
        debug!("Exchanging authorization code for access token");

        let response = self
            .http
            .post(format!("{}/oauth/token", self.options.auth_base_url))
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", &self.options.client_id),
                ("client_secret", &self.options.client_secret),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await?;

        Ok(Self::ensure_success(response)?.json().await?)
    }

    #[instrument(skip(self, token))]
    async fn accessible_resources(&self, token: &str) -> Result<Vec<JiraResource>, ProviderError> {
        let response = self
            .http
            .get(format!(
                "{}/oauth/token/accessible-resources",
                self.options.api_base_url
            ))
            .bearer_auth(token)
            .send()
            .await?;

        Ok(Self::ensure_success(response)?.json().await?)
    }

    #[instrument(skip(self, token))]
    async fn search_issues(
        &self,
        token: &str,
        resource_id: &str,
        query: &str,
    ) -> Result<JiraIssuePickerResponse, ProviderError> {
        let response = self
            .http
            .get(format!(
                "{}/ex/jira/{}/rest/api/3/issue/picker",
                self.options.api_base_url, resource_id
            ))
            .query(&[("query", query), ("showSubTasks", "true")])
            .bearer_auth(token)
            .send()
            .await?;

        Ok(Self::ensure_success(response)?.json().await?)
    }

    #[instrument(skip(self, token))]
    async fn fetch_issues(
        &self,
        token: &str,
        resource_id: &str,
        ids: &[String],
    ) -> Result<Vec<JiraIssue>, ProviderError> {
        debug!(issue_count = ids.len(), "Bulk-fetching issues");

        let response = self
            .http
            .post(format!(
                "{}/ex/jira/{}/rest/api/3/issue/bulkfetch",
                self.options.api_base_url, resource_id
            ))
            .json(&serde_json::json!({
                "issueIdsOrKeys": ids,
                "expand": ["renderedFields"],
            }))
            .bearer_auth(token)
            .send()
            .await?;

        let bulk: JiraIssueBulkResponse = Self::ensure_success(response)?.json().await?;
        Ok(bulk.issues)
    }
}
