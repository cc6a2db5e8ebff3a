use serde::{Deserialize, Serialize};

// ---- Upstream Atlassian API contracts ----

/// OAuth token exchange response, passed through to the client
///
/// The service stores no token state; subsequent requests carry the access
/// token as a bearer header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraTokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub scope: String,
}

/// A Jira cloud site the token grants access to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraResource {
    pub id: String,
    pub name: String,
    pub url: String,
    pub scopes: Vec<String>,
    pub avatar_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JiraIssueBulkResponse {
    pub issues: Vec<JiraIssue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraIssue {
    pub id: String,
    pub key: String,
    #[serde(rename = "self")]
    pub url: String,
    pub fields: JiraIssueFields,
    pub rendered_fields: JiraRenderedFields,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JiraIssueFields {
    pub summary: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(rename = "issuetype")]
    pub issue_type: JiraIssueType,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraIssueType {
    pub name: String,
    pub icon_url: String,
}

/// Rendered (HTML) issue fields; sanitized before entering a `Ticket`
#[derive(Debug, Clone, Deserialize)]
pub struct JiraRenderedFields {
    #[serde(default)]
    pub description: Option<String>,
}

/// Issue picker response used for typeahead search
#[derive(Debug, Clone, Deserialize)]
pub struct JiraIssuePickerResponse {
    pub sections: Vec<JiraIssuePickerSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JiraIssuePickerSection {
    pub label: String,
    #[serde(default, rename = "msg")]
    pub no_suggestions_found_message: Option<String>,
    pub issues: Vec<JiraPickerIssue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JiraPickerIssue {
    pub id: i64,
    #[serde(rename = "img")]
    pub type_avatar_url: String,
    pub key: String,
    #[serde(rename = "summaryText")]
    pub match_summary: String,
}

// ---- Gateway contracts ----

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTicketsParams {
    pub resource_id: String,
    pub resource_url: String,
    pub query: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTicketsResponse {
    pub results: Vec<SearchTicketsResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_suggestions_found_message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTicketsResult {
    pub id: i64,
    #[serde(rename = "type")]
    pub type_label: String,
    pub type_avatar_url: String,
    pub key: String,
    pub match_summary: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackParams {
    pub code: String,
    #[allow(dead_code)]
    pub state: Option<String>,
}
