use async_trait::async_trait;
use base64::prelude::{BASE64_STANDARD, Engine as _};
use reqwest::{
    Client, RequestBuilder,
    header::{ACCEPT, AUTHORIZATION},
    multipart::{Form, Part},
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::config::JiraSettings;
use crate::domain::ticket::{
    Attachment, Comment, ExistingTestTicket, NewTestTicket, SourceTicket, Ticket,
};
use crate::domain::{adf, gherkin};
use crate::error::{AppError, AppResult};
use crate::infra::http::{HttpExecutor, RetryPolicy};
use crate::services::{IssueTrackerService, TestCaseRepository};

const SEARCH_PAGE_SIZE: usize = 100;
const TEST_LABELS: [&str; 2] = ["auto-generated", "gherkin-sync"];
const TEST_NOTE: &str = "Auto-generated acceptance test.";

pub struct JiraClient {
    http: HttpExecutor,
    settings: JiraSettings,
}

impl JiraClient {
    pub fn new(settings: JiraSettings, policy: RetryPolicy) -> AppResult<Self> {
        Ok(Self {
            http: HttpExecutor::new("Jira", policy)?,
            settings,
        })
    }

    fn api_details(&self) -> AppResult<(&str, &str, &str)> {
        let base_url = self
            .settings
            .base_url
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Jira base URL not configured".to_string()))?;
        let email = self
            .settings
            .email
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Jira email not configured".to_string()))?;
        let token = self
            .settings
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

    fn api_url(base_url: &str, path: &str) -> String {
        format!("{}/rest/api/3{}", base_url.trim_end_matches('/'), path)
    }

    fn browse_url(base_url: &str, key: &str) -> String {
        format!("{}/browse/{}", base_url.trim_end_matches('/'), key)
    }

    fn authorized(&self, builder: RequestBuilder) -> AppResult<RequestBuilder> {
        let (_, email, token) = self.api_details()?;
        Ok(builder
            .header(AUTHORIZATION, Self::auth_header(email, token))
            .header(ACCEPT, "application/json"))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let (base_url, email, token) = self.api_details()?;
        let url = Self::api_url(base_url, path);
        let auth = Self::auth_header(email, token);
        self.http
            .send_json(|http: &Client| {
                http.get(&url)
                    .header(AUTHORIZATION, &auth)
                    .header(ACCEPT, "application/json")
            })
            .await
    }

    async fn fetch_images(&self, attachments: &[JiraAttachment]) -> Vec<Attachment> {
        let mut images = Vec::new();
        for attachment in attachments
            .iter()
            .filter(|a| a.mime_type.starts_with("image/"))
        {
            match self.download(&attachment.content).await {
                Ok(bytes) => images.push(Attachment {
                    mime_type: attachment.mime_type.clone(),
                    bytes,
                    name: attachment.filename.clone(),
                }),
                Err(err) => {
                    debug!(file = %attachment.filename, error = %err, "skipping Jira image")
                }
            }
        }
        images
    }

    async fn download(&self, url: &str) -> AppResult<Vec<u8>> {
        let builder = self.authorized(self.http.client().get(url))?;
        let response = builder
            .send()
            .await
            .map_err(|err| AppError::Network(err.to_string()))?;
        if !response.status().is_success() {
            return Err(AppError::Http {
                status: response.status().as_u16(),
                body: String::new(),
            });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|err| AppError::Network(err.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn create_link(&self, link_type: &str, new_key: &str, source_key: &str) -> AppResult<()> {
        let (base_url, email, token) = self.api_details()?;
        let url = Self::api_url(base_url, "/issueLink");
        let auth = Self::auth_header(email, token);
        let body = json!({
            "type": { "name": link_type },
            "inwardIssue": { "key": new_key },
            "outwardIssue": { "key": source_key },
        });
        self.http
            .send(|http: &Client| http.post(&url).header(AUTHORIZATION, &auth).json(&body))
            .await?;
        Ok(())
    }

    async fn attach_feature(&self, key: &str, file_name: &str, feature: &str) -> AppResult<()> {
        let (base_url, email, token) = self.api_details()?;
        let url = Self::api_url(base_url, &format!("/issue/{key}/attachments"));
        let auth = Self::auth_header(email, token);
        self.http
            .send(|http: &Client| {
                let part = Part::bytes(feature.as_bytes().to_vec()).file_name(file_name.to_string());
                http.post(&url)
                    .header(AUTHORIZATION, &auth)
                    .header("X-Atlassian-Token", "no-check")
                    .multipart(Form::new().part("file", part))
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl IssueTrackerService for JiraClient {
    async fn fetch_ticket(&self, id: &str) -> AppResult<SourceTicket> {
        let key = id.trim();
        if key.is_empty() {
            return Err(AppError::IssueTracker("issue key must not be empty".to_string()));
        }

        let issue: JiraIssue = self
            .get_json(&format!("/issue/{key}?fields=summary,description,attachment"))
            .await?;
        let comments: JiraCommentPage = self.get_json(&format!("/issue/{key}/comment")).await?;
        let attachments = self.fetch_images(&issue.fields.attachment).await;

        Ok(SourceTicket {
            key: issue.key,
            summary: issue.fields.summary,
            description: adf::to_text(&issue.fields.description),
            comments: comments
                .comments
                .into_iter()
                .map(|comment| Comment {
                    author: comment
                        .author
                        .map(|a| a.display_name)
                        .unwrap_or_else(|| "User".to_string()),
                    body: adf::to_text(&comment.body),
                    timestamp: comment.created,
                })
                .collect(),
            attachments,
        })
    }

    async fn create_test_ticket(&self, request: &NewTestTicket) -> AppResult<Ticket> {
        let project_key = request.destination.trim();
        if project_key.is_empty() {
            return Err(AppError::Configuration(
                "no destination Jira project configured".to_string(),
            ));
        }
        if request.title.trim().is_empty() {
            return Err(AppError::IssueTracker("test title must not be empty".to_string()));
        }

        let (base_url, email, token) = self.api_details()?;
        let url = Self::api_url(base_url, "/issue");
        let auth = Self::auth_header(email, token);
        let request_body = JiraCreateIssueRequest::new(
            project_key,
            &self.settings.test_issue_type,
            request.title.trim(),
            &request.body,
        );

        let payload: JiraCreateIssueResponse = self
            .http
            .send_json(|http: &Client| {
                http.post(&url)
                    .header(AUTHORIZATION, &auth)
                    .header(ACCEPT, "application/json")
                    .json(&request_body)
            })
            .await?;

        if let Err(err) = self
            .attach_feature(&payload.key, &request.file_name, &request.body)
            .await
        {
            warn!(key = %payload.key, error = %err, "failed to attach feature file");
        }

        info!(key = %payload.key, "created Jira test");
        Ok(Ticket {
            url: Some(Self::browse_url(base_url, &payload.key)),
            key: payload.key,
        })
    }

    async fn link(&self, new_key: &str, source_key: &str) -> AppResult<()> {
        let preferred = self.settings.test_link_type.as_str();
        match self.create_link(preferred, new_key, source_key).await {
            Ok(()) => Ok(()),
            Err(err) if preferred != self.settings.relates_link_type => {
                debug!(link_type = preferred, error = %err, "falling back to relates link");
                self.create_link(&self.settings.relates_link_type, new_key, source_key)
                    .await
            }
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl TestCaseRepository for JiraClient {
    async fn existing_tests(
        &self,
        source_key: &str,
        destination: &str,
    ) -> AppResult<Vec<ExistingTestTicket>> {
        let (base_url, email, token) = self.api_details()?;
        let url = Self::api_url(base_url, "/search");
        let auth = Self::auth_header(email, token);
        let jql = format!(
            "project = \"{destination}\" AND issue in linkedIssues(\"{source_key}\") AND labels = \"{}\"",
            TEST_LABELS[0]
        );

        let mut tests = Vec::new();
        let mut page = 0;
        loop {
            let start_at = (page * SEARCH_PAGE_SIZE).to_string();
            let page_size = SEARCH_PAGE_SIZE.to_string();
            let result: JiraSearchPage = self
                .http
                .send_json(|http: &Client| {
                    http.get(&url)
                        .header(AUTHORIZATION, &auth)
                        .header(ACCEPT, "application/json")
                        .query(&[
                            ("jql", jql.as_str()),
                            ("startAt", start_at.as_str()),
                            ("maxResults", page_size.as_str()),
                            ("fields", "summary,description"),
                        ])
                })
                .await?;

            let fetched = result.issues.len();
            tests.extend(result.issues.into_iter().map(|issue| ExistingTestTicket {
                url: Some(Self::browse_url(base_url, &issue.key)),
                steps: stored_steps(&issue.fields.description),
                title: issue.fields.summary,
                key: issue.key,
            }));
            if fetched < SEARCH_PAGE_SIZE {
                break;
            }
            page += 1;
        }

        debug!(source = source_key, count = tests.len(), "found existing Jira tests");
        Ok(tests)
    }

    async fn update_test_ticket(&self, ticket: &ExistingTestTicket, body: &str) -> AppResult<()> {
        let (base_url, email, token) = self.api_details()?;
        let url = Self::api_url(base_url, &format!("/issue/{}", ticket.key));
        let auth = Self::auth_header(email, token);
        let fields = json!({ "fields": { "description": JiraDescription::for_feature(body) } });
        self.http
            .send(|http: &Client| http.put(&url).header(AUTHORIZATION, &auth).json(&fields))
            .await?;
        Ok(())
    }

    async fn delete_ticket(&self, key: &str) -> AppResult<()> {
        let (base_url, email, token) = self.api_details()?;
        let url = Self::api_url(base_url, &format!("/issue/{key}"));
        let auth = Self::auth_header(email, token);
        self.http
            .send(|http: &Client| http.delete(&url).header(AUTHORIZATION, &auth))
            .await?;
        Ok(())
    }
}

/// Steps stored in a test's description: the scenario inside the gherkin
/// code block when there is one, the flattened description otherwise.
fn stored_steps(description: &Value) -> String {
    adf::code_blocks(description)
        .first()
        .and_then(|feature| gherkin::extract_steps(feature))
        .unwrap_or_else(|| adf::to_text(description))
}

#[derive(Serialize)]
struct JiraCreateIssueRequest {
    fields: JiraCreateIssueFields,
}

impl JiraCreateIssueRequest {
    fn new(project_key: &str, issue_type: &str, summary: &str, feature: &str) -> Self {
        Self {
            fields: JiraCreateIssueFields {
                project: JiraProject {
                    key: project_key.to_string(),
                },
                summary: summary.to_string(),
                description: JiraDescription::for_feature(feature),
                issuetype: JiraIssueType {
                    name: issue_type.to_string(),
                },
                labels: TEST_LABELS.iter().map(|l| l.to_string()).collect(),
            },
        }
    }
}

#[derive(Serialize)]
struct JiraCreateIssueFields {
    project: JiraProject,
    summary: String,
    description: JiraDescription,
    issuetype: JiraIssueType,
    labels: Vec<String>,
}

#[derive(Serialize)]
struct JiraProject {
    key: String,
}

#[derive(Serialize)]
struct JiraIssueType {
    name: String,
}

#[derive(Serialize)]
struct JiraDescription {
    #[serde(rename = "type")]
    doc_type: &'static str,
    version: u8,
    content: Vec<JiraDocNode>,
}

impl JiraDescription {
    fn for_feature(feature: &str) -> Self {
        Self {
            doc_type: "doc",
            version: 1,
            content: vec![
                JiraDocNode::paragraph(TEST_NOTE.to_string()),
                JiraDocNode::code_block("gherkin", feature.trim_end().to_string()),
            ],
        }
    }
}

#[derive(Serialize)]
struct JiraDocNode {
    #[serde(rename = "type")]
    node_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    attrs: Option<JiraCodeAttrs>,
    content: Vec<JiraDocText>,
}

impl JiraDocNode {
    fn paragraph(text: String) -> Self {
        Self {
            node_type: "paragraph",
            attrs: None,
            content: vec![JiraDocText::text(text)],
        }
    }

    fn code_block(language: &'static str, text: String) -> Self {
        Self {
            node_type: "codeBlock",
            attrs: Some(JiraCodeAttrs { language }),
            content: vec![JiraDocText::text(text)],
        }
    }
}

#[derive(Serialize)]
struct JiraCodeAttrs {
    language: &'static str,
}

#[derive(Serialize)]
struct JiraDocText {
    #[serde(rename = "type")]
    text_type: &'static str,
    text: String,
}

impl JiraDocText {
    fn text(text: String) -> Self {
        Self {
            text_type: "text",
            text,
        }
    }
}

#[derive(Deserialize)]
struct JiraCreateIssueResponse {
    key: String,
}

#[derive(Deserialize)]
struct JiraIssue {
    key: String,
    fields: JiraIssueFields,
}

#[derive(Deserialize)]
struct JiraIssueFields {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    description: Value,
    #[serde(default)]
    attachment: Vec<JiraAttachment>,
}

#[derive(Deserialize)]
struct JiraAttachment {
    #[serde(default)]
    filename: String,
    #[serde(rename = "mimeType", default)]
    mime_type: String,
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct JiraCommentPage {
    #[serde(default)]
    comments: Vec<JiraComment>,
}

#[derive(Deserialize)]
struct JiraComment {
    author: Option<JiraUser>,
    #[serde(default)]
    body: Value,
    created: Option<String>,
}

#[derive(Deserialize)]
struct JiraUser {
    #[serde(rename = "displayName")]
    display_name: String,
}

#[derive(Deserialize)]
struct JiraSearchPage {
    #[serde(default)]
    issues: Vec<JiraIssue>,
}
