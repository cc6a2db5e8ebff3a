use std::env;

/// Jira OAuth and API configuration, read from the environment
///
/// The integration is considered disabled when no client id is configured;
/// the OAuth endpoints then report not-found.
#[derive(Debug, Clone)]
pub struct JiraOptions {
    pub client_id: String,
    pub client_secret: String,
    pub auth_base_url: String,
    pub api_base_url: String,
    pub authorize_url: String,
    pub audience: String,
    pub scope: String,
}

impl JiraOptions {
    pub const CALLBACK_PATH: &'static str = "/api/jira/callback";

    pub fn from_env() -> Self {
        Self {
            client_id: env::var("JIRA_CLIENT_ID").unwrap_or_default(),
            client_secret: env::var("JIRA_CLIENT_SECRET").unwrap_or_default(),
            auth_base_url: env::var("JIRA_AUTH_BASE_URL")
                .unwrap_or_else(|_| "https://auth.atlassian.com".to_string()),
            api_base_url: env::var("JIRA_API_BASE_URL")
                .unwrap_or_else(|_| "https://api.atlassian.com".to_string()),
            authorize_url: "/authorize".to_string(),
            audience: "api.atlassian.com".to_string(),
            scope: "read:jira-work read:jira-user".to_string(),
        }
    }

    pub fn enabled(&self) -> bool {
        !self.client_id.is_empty()
    }
}

impl Default for JiraOptions {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integration_disabled_without_client_id() {
        let options = JiraOptions {
            client_id: String::new(),
            client_secret: String::new(),
            auth_base_url: "https://auth.atlassian.com".to_string(),
            api_base_url: "https://api.atlassian.com".to_string(),
            authorize_url: "/authorize".to_string(),
            audience: "api.atlassian.com".to_string(),
            scope: "read:jira-work read:jira-user".to_string(),
        };

        assert!(!options.enabled());
    }
}
