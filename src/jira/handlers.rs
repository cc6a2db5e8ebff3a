use axum::{
    extract::{Host, Query, State},
    http::{HeaderMap, StatusCode},
    response::Redirect,
    Json,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::options::JiraOptions;
use super::types::{
    CallbackParams, JiraResource, JiraTokenResponse, SearchTicketsParams, SearchTicketsResponse,
    SearchTicketsResult,
};
use crate::shared::{bearer_token, AppError, AppState};

/// GET /api/jira/login
///
/// Redirects the browser to the Atlassian consent screen. The callback
/// returns here with an authorization code.
#[instrument(name = "jira_login", skip(state))]
pub async fn login(
    State(state): State<AppState>,
    Host(host): Host,
) -> Result<Redirect, AppError> {
    let options = ensure_enabled(&state)?;

    let state_token = Uuid::new_v4().to_string();
    let redirect_uri = format!("https://{}{}", host, JiraOptions::CALLBACK_PATH);

    let mut url = reqwest::Url::parse(&format!(
        "{}{}",
        options.auth_base_url, options.authorize_url
    ))
    .map_err(|_| AppError::Internal)?;
    url.query_pairs_mut()
        .append_pair("audience", &options.audience)
        .append_pair("client_id", &options.client_id)
        .append_pair("scope", &options.scope)
        .append_pair("redirect_uri", &redirect_uri)
        .append_pair("state", &state_token)
        .append_pair("response_type", "code")
        .append_pair("prompt", "consent");

    debug!("Redirecting to Atlassian authorization");
    Ok(Redirect::temporary(url.as_str()))
}

/// GET /api/jira/callback?code=…&state=…
///
/// Exchanges the authorization code and hands the access token to the
/// client, which passes it back as a bearer header on later requests. The
/// service itself keeps no token state.
#[instrument(name = "jira_callback", skip(state, params))]
pub async fn callback(
    State(state): State<AppState>,
    Host(host): Host,
    Query(params): Query<CallbackParams>,
) -> Result<Json<JiraTokenResponse>, AppError> {
    ensure_enabled(&state)?;

    let redirect_uri = format!("https://{}{}", host, JiraOptions::CALLBACK_PATH);
    let token = state
        .ticket_provider
        .exchange_code(&params.code, &redirect_uri)
        .await?;

    info!("Authorization code exchanged");
    Ok(Json(token))
}

/// HEAD /api/jira/user
///
/// Cheap logged-in probe: succeeds when the bearer token is still accepted
/// by the ticket tracker.
#[instrument(name = "jira_logged_in", skip(state, headers))]
pub async fn logged_in(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let token = bearer_token(&headers)?;
    state.ticket_provider.accessible_resources(token).await?;
    Ok(StatusCode::OK)
}

/// GET /api/jira/resources
#[instrument(name = "jira_resources", skip(state, headers))]
pub async fn resources(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<JiraResource>>, AppError> {
    let token = bearer_token(&headers)?;
    let resources = state.ticket_provider.accessible_resources(token).await?;
    Ok(Json(resources))
}

/// GET /api/jira/issues?resourceId=…&resourceUrl=…&query=…
///
/// Typeahead search across the selected site; flattens the tracker's
/// per-type sections into one candidate list.
#[instrument(name = "jira_search", skip(state, headers, params))]
pub async fn search_issues(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SearchTicketsParams>,
) -> Result<Json<SearchTicketsResponse>, AppError> {
    let token = bearer_token(&headers)?;

    let picker = state
        .ticket_provider
        .search_issues(token, &params.resource_id, &params.query)
        .await?;

    let results: Vec<SearchTicketsResult> = picker
        .sections
        .iter()
        .flat_map(|section| {
            section.issues.iter().map(|issue| SearchTicketsResult {
                id: issue.id,
                type_label: section.label.clone(),
                type_avatar_url: build_avatar_url(&params.resource_url, &issue.type_avatar_url),
                key: issue.key.clone(),
                match_summary: issue.match_summary.clone(),
            })
        })
        .collect();

    let no_suggestions_found_message = if results.is_empty() {
        picker
            .sections
            .first()
            .and_then(|section| section.no_suggestions_found_message.clone())
    } else {
        None
    };

    Ok(Json(SearchTicketsResponse {
        results,
        no_suggestions_found_message,
    }))
}

/// Resolves a (possibly relative) avatar path against the site base URL
fn build_avatar_url(resource_url: &str, avatar_path: &str) -> String {
    match reqwest::Url::parse(resource_url).and_then(|base| base.join(avatar_path)) {
        Ok(url) => url.to_string(),
        Err(_) => avatar_path.to_string(),
    }
}

fn ensure_enabled(state: &AppState) -> Result<&JiraOptions, AppError> {
    if state.jira_options.enabled() {
        Ok(&state.jira_options)
    } else {
        Err(AppError::NotFound(
            "jira integration is not configured".to_string(),
        ))
    }
}
