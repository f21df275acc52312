use std::time::Duration;

use async_trait::async_trait;
use base64::prelude::{BASE64_STANDARD, Engine as _};
use reqwest::{
    Client, Response,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use serde::{Deserialize, Serialize};

use crate::domain::comment::IssueComment;
use crate::error::{AppError, AppResult};
use crate::services::IssueTrackerService;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const COMMENT_PAGE_SIZE: usize = 100;

pub struct JiraClient {
    http: Client,
    base_url: Option<String>,
    email: Option<String>,
    token: Option<String>,
}

impl JiraClient {
    pub fn new(
        base_url: Option<String>,
        email: Option<String>,
        token: Option<String>,
    ) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| AppError::IssueTracker(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            http,
            base_url,
            email,
            token,
        })
    }

    fn api_details(&self) -> AppResult<(&str, &str, &str)> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Jira base URL not configured".to_string()))?;
        let email = self
            .email
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Jira email not configured".to_string()))?;
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Jira API token not configured".to_string()))?;
        Ok((base_url, email, token))
    }

    fn auth_header(email: &str, token: &str) -> String {
        let credentials = format!("{email}:{token}");
        let encoded = BASE64_STANDARD.encode(credentials);
        format!("Basic {encoded}")
    }

    // v2 of the REST API takes comment bodies as wiki markup.
    fn comments_endpoint(base_url: &str, issue_key: &str) -> String {
        format!(
            "{}/rest/api/2/issue/{}/comment",
            base_url.trim_end_matches('/'),
            issue_key
        )
    }

    fn comment_url(base_url: &str, issue_key: &str, comment_id: &str) -> String {
        format!(
            "{}/browse/{}?focusedCommentId={}",
            base_url.trim_end_matches('/'),
            issue_key,
            comment_id
        )
    }

    async fn ensure_success(response: Response) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unable to read response>".to_string());
        Err(AppError::IssueTracker(format!(
            "Jira responded with {status}: {body}"
        )))
    }
}

#[async_trait]
impl IssueTrackerService for JiraClient {
    async fn list_comments(&self, issue_key: &str) -> AppResult<Vec<IssueComment>> {
        let (base_url, email, token) = self.api_details()?;
        let mut comments = Vec::new();
        let mut start_at = 0;

        loop {
            let response = self
                .http
                .get(Self::comments_endpoint(base_url, issue_key))
                .query(&[("startAt", start_at), ("maxResults", COMMENT_PAGE_SIZE)])
                .header(AUTHORIZATION, Self::auth_header(email, token))
                .header(ACCEPT, "application/json")
                .send()
                .await
                .map_err(|err| AppError::IssueTracker(format!("failed to call Jira: {err}")))?;

            let page: JiraCommentPage = Self::ensure_success(response)
                .await?
                .json()
                .await
                .map_err(|err| {
                    AppError::IssueTracker(format!("failed to parse Jira response: {err}"))
                })?;

            let next = page.next_start();
            comments.extend(page.comments.into_iter().map(|comment| IssueComment {
                url: Some(Self::comment_url(base_url, issue_key, &comment.id)),
                id: comment.id,
                body: comment.body,
            }));

            match next {
                Some(next) => start_at = next,
                None => break,
            }
        }

        Ok(comments)
    }

    async fn add_comment(&self, issue_key: &str, body: &str) -> AppResult<IssueComment> {
        if body.trim().is_empty() {
            return Err(AppError::IssueTracker(
                "comment body must not be empty".to_string(),
            ));
        }

        let (base_url, email, token) = self.api_details()?;

        let response = self
            .http
            .post(Self::comments_endpoint(base_url, issue_key))
            .header(AUTHORIZATION, Self::auth_header(email, token))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&JiraCommentRequest { body })
            .send()
            .await
            .map_err(|err| AppError::IssueTracker(format!("failed to call Jira: {err}")))?;

        let payload: JiraComment = Self::ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|err| {
                AppError::IssueTracker(format!("failed to parse Jira response: {err}"))
            })?;

        Ok(IssueComment {
            url: Some(Self::comment_url(base_url, issue_key, &payload.id)),
            id: payload.id,
            body: payload.body,
        })
    }
}

#[derive(Serialize)]
struct JiraCommentRequest<'a> {
    body: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JiraCommentPage {
    #[serde(default)]
    start_at: usize,
    total: Option<usize>,
    #[serde(default)]
    comments: Vec<JiraComment>,
}

impl JiraCommentPage {
    /// Offset of the following page, or `None` once every comment has been read.
    fn next_start(&self) -> Option<usize> {
        let next = self.start_at + self.comments.len();
        match self.total {
            Some(total) if !self.comments.is_empty() && next < total => Some(next),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct JiraComment {
    id: String,
    #[serde(default)]
    body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_basic_auth_header() {
        assert_eq!(
            JiraClient::auth_header("dev@example.com", "secret"),
            "Basic ZGV2QGV4YW1wbGUuY29tOnNlY3JldA=="
        );
    }

    #[test]
    fn comment_endpoint_ignores_trailing_slash() {
        assert_eq!(
            JiraClient::comments_endpoint("https://acme.atlassian.net/", "DEP-1"),
            "https://acme.atlassian.net/rest/api/2/issue/DEP-1/comment"
        );
    }

    #[test]
    fn comment_body_is_sent_as_wiki_text() {
        let request = JiraCommentRequest {
            body: "h3. ManagerService (/)\n",
        };
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"body":"h3. ManagerService (/)\n"}"#
        );
    }

    #[test]
    fn parses_comment_page() {
        let page: JiraCommentPage = serde_json::from_str(
            r#"{"startAt":0,"total":1,"comments":[{"id":"10001","body":"h1. hi"}]}"#,
        )
        .unwrap();
        assert_eq!(page.comments.len(), 1);
        assert_eq!(page.comments[0].id, "10001");
        assert_eq!(page.next_start(), None);
    }

    #[test]
    fn follows_pages_until_total_is_reached() {
        let first: JiraCommentPage = serde_json::from_str(
            r#"{"startAt":0,"maxResults":2,"total":3,"comments":[{"id":"1","body":"a"},{"id":"2","body":"b"}]}"#,
        )
        .unwrap();
        assert_eq!(first.next_start(), Some(2));

        let last: JiraCommentPage = serde_json::from_str(
            r#"{"startAt":2,"maxResults":2,"total":3,"comments":[{"id":"3","body":"c"}]}"#,
        )
        .unwrap();
        assert_eq!(last.next_start(), None);
    }

    #[test]
    fn stops_on_empty_page_even_if_total_is_larger() {
        let page: JiraCommentPage =
            serde_json::from_str(r#"{"startAt":5,"total":9,"comments":[]}"#).unwrap();
        assert_eq!(page.next_start(), None);
    }

    #[tokio::test]
    async fn missing_credentials_are_configuration_errors() {
        let client =
            JiraClient::new(Some("https://acme.atlassian.net".into()), None, None).unwrap();
        let err = client.list_comments("DEP-1").await.unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }
}
