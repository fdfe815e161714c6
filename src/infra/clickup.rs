//! ClickUp REST v2 adapter.
//!
//! The team id and the "Test Case" custom task type id are resolved on first
//! use and kept for the lifetime of the client. A failed lookup is not
//! cached, so the next call simply tries again.

use async_trait::async_trait;
use reqwest::{
    Client,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::ClickUpSettings;
use crate::domain::report::TaskEntry;
use crate::domain::ticket::{
    Attachment, Comment, Destination, NewTestTicket, SourceTicket, Ticket,
};
use crate::error::{AppError, AppResult};
use crate::infra::http::{HttpExecutor, RetryPolicy};
use crate::services::{IssueTrackerService, TaskDirectory};

const TASK_PAGE_SIZE: usize = 100;
const TEST_TAGS: [&str; 2] = ["auto-generated", "gherkin-sync"];
const TEST_TYPE_NAMES: [&str; 4] = ["test case", "test", "prueba", "caso de prueba"];
const APP_TASK_URL: &str = "https://app.clickup.com/t";

pub struct ClickUpClient {
    http: HttpExecutor,
    settings: ClickUpSettings,
    team_id: OnceCell<String>,
    test_type_id: OnceCell<i64>,
}

impl ClickUpClient {
    pub fn new(settings: ClickUpSettings, policy: RetryPolicy) -> AppResult<Self> {
        Ok(Self {
            http: HttpExecutor::new("ClickUp", policy)?,
            settings,
            team_id: OnceCell::new(),
            test_type_id: OnceCell::new(),
        })
    }

    fn api_key(&self) -> AppResult<&str> {
        self.settings
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Configuration("CLICKUP_API_KEY not configured".to_string()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.api_base.trim_end_matches('/'), path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> AppResult<T> {
        let token = self.api_key()?;
        let url = self.url(path);
        self.http
            .send_json(|http: &Client| {
                http.get(&url)
                    .header(AUTHORIZATION, token)
                    .query(query)
            })
            .await
    }

    pub async fn team_id(&self) -> Option<String> {
        if let Some(id) = self.team_id.get() {
            return Some(id.clone());
        }
        let teams: TeamsResponse = match self.get("/team", &[]).await {
            Ok(teams) => teams,
            Err(err) => {
                warn!(error = %err, "failed to resolve ClickUp team");
                return None;
            }
        };
        let id = teams.teams.into_iter().next()?.id;
        let _ = self.team_id.set(id.clone());
        Some(id)
    }

    /// Custom task type used for created tests: the configured id when it
    /// parses, otherwise the first team type named like a test case.
    pub async fn test_case_type_id(&self) -> Option<i64> {
        if let Some(id) = self.test_type_id.get() {
            return Some(*id);
        }
        let resolved = match self
            .settings
            .test_case_type_id
            .as_deref()
            .and_then(|raw| raw.parse::<i64>().ok())
        {
            Some(id) => id,
            None => self.lookup_test_case_type().await?,
        };
        let _ = self.test_type_id.set(resolved);
        Some(resolved)
    }

    async fn lookup_test_case_type(&self) -> Option<i64> {
        let team_id = self.team_id().await?;
        let types: CustomTaskTypes = match self
            .get(&format!("/team/{team_id}/custom_item"), &[])
            .await
        {
            Ok(types) => types,
            Err(err) => {
                warn!(error = %err, "failed to list ClickUp task types");
                return None;
            }
        };
        types
            .custom_items
            .into_iter()
            .find(|item| TEST_TYPE_NAMES.contains(&item.name.to_lowercase().as_str()))
            .map(|item| item.id)
    }

    async fn fetch_images(&self, attachments: &[ClickUpAttachment]) -> Vec<Attachment> {
        let Ok(token) = self.api_key() else {
            return Vec::new();
        };
        let mut images = Vec::new();
        for attachment in attachments
            .iter()
            .filter(|a| a.mimetype.starts_with("image/"))
        {
            let response = self
                .http
                .client()
                .get(&attachment.url)
                .header(AUTHORIZATION, token)
                .send()
                .await;
            let bytes = match response {
                Ok(resp) if resp.status().is_success() => resp.bytes().await.ok(),
                _ => None,
            };
            match bytes {
                Some(bytes) => images.push(Attachment {
                    mime_type: attachment.mimetype.clone(),
                    bytes: bytes.to_vec(),
                    name: attachment.title.clone(),
                }),
                None => debug!(file = %attachment.title, "skipping ClickUp image"),
            }
        }
        images
    }

    async fn testing_folder(&self, space_id: &str) -> AppResult<Option<ClickUpFolder>> {
        let folders: FoldersResponse = self
            .get(&format!("/space/{space_id}/folder"), &[])
            .await?;
        Ok(folders.folders.into_iter().find(|folder| {
            let name = folder.name.to_lowercase();
            name.contains("testing") && name.contains("repository")
        }))
    }
}

#[async_trait]
impl IssueTrackerService for ClickUpClient {
    async fn fetch_ticket(&self, id: &str) -> AppResult<SourceTicket> {
        let task_id = id.trim();
        if task_id.is_empty() {
            return Err(AppError::IssueTracker("task id must not be empty".to_string()));
        }

        let task: ClickUpTask = self.get(&format!("/task/{task_id}"), &[]).await?;
        let comments: CommentsResponse =
            self.get(&format!("/task/{task_id}/comment"), &[]).await?;
        let attachments = self.fetch_images(&task.attachments).await;

        Ok(SourceTicket {
            key: task.id,
            summary: task.name,
            description: task.description.unwrap_or_default(),
            comments: comments
                .comments
                .into_iter()
                .map(|comment| Comment {
                    author: comment.user.map(|u| u.username).unwrap_or_default(),
                    body: comment.comment_text,
                    timestamp: comment.date,
                })
                .collect(),
            attachments,
        })
    }

    async fn create_test_ticket(&self, request: &NewTestTicket) -> AppResult<Ticket> {
        let list_id = request.destination.trim();
        if list_id.is_empty() {
            return Err(AppError::Configuration(
                "no destination ClickUp list selected".to_string(),
            ));
        }
        let token = self.api_key()?;

        let mut body = json!({
            "name": request.title,
            "description": format!("```gherkin\n{}\n```", request.body.trim_end()),
            "tags": TEST_TAGS,
        });
        if let Some(type_id) = self.test_case_type_id().await {
            body["custom_item_id"] = json!(type_id);
        }

        let url = self.url(&format!("/list/{list_id}/task"));
        let created: CreatedTask = self
            .http
            .send_json(|http: &Client| {
                http.post(&url)
                    .header(AUTHORIZATION, token)
                    .header(CONTENT_TYPE, "application/json")
                    .json(&body)
            })
            .await?;

        info!(task = %created.id, list = list_id, "created ClickUp test");
        let url = created
            .url
            .unwrap_or_else(|| format!("{APP_TASK_URL}/{}", created.id));
        Ok(Ticket {
            key: created.id,
            url: Some(url),
        })
    }

    async fn link(&self, new_key: &str, source_key: &str) -> AppResult<()> {
        let token = self.api_key()?;
        let url = self.url(&format!("/task/{source_key}/link/{new_key}"));
        self.http
            .send(|http: &Client| http.post(&url).header(AUTHORIZATION, token))
            .await?;
        Ok(())
    }

    async fn list_destinations(&self) -> AppResult<Vec<Destination>> {
        let mut destinations = Vec::new();
        for (space_name, space_id) in &self.settings.spaces {
            let Some(folder) = self.testing_folder(space_id).await? else {
                debug!(space = %space_name, "no testing repository folder");
                continue;
            };
            let lists: ListsResponse = self
                .get(&format!("/folder/{}/list", folder.id), &[])
                .await?;
            destinations.extend(lists.lists.into_iter().map(|list| Destination {
                label: format!("{space_name} - {}", list.name),
                value: list.id,
                description: format!("Folder: {}", folder.name),
            }));
        }
        Ok(destinations)
    }
}

#[async_trait]
impl TaskDirectory for ClickUpClient {
    async fn folder_lists(&self, folder_id: &str) -> AppResult<Vec<(String, String)>> {
        let lists: ListsResponse = self.get(&format!("/folder/{folder_id}/list"), &[]).await?;
        Ok(lists
            .lists
            .into_iter()
            .map(|list| (list.id, list.name))
            .collect())
    }

    async fn list_tasks(&self, list_id: &str) -> AppResult<Vec<TaskEntry>> {
        let mut tasks = Vec::new();
        let mut page = 0usize;
        loop {
            let query = [
                ("subtasks", "true".to_string()),
                ("include_closed", "true".to_string()),
                ("page", page.to_string()),
            ];
            let response: TasksResponse =
                self.get(&format!("/list/{list_id}/task"), &query).await?;
            let fetched = response.tasks.len();
            tasks.extend(response.tasks.into_iter().map(|task| TaskEntry {
                id: task.id,
                name: task.name,
                parent: task.parent,
            }));
            if fetched < TASK_PAGE_SIZE {
                break;
            }
            page += 1;
        }
        Ok(tasks)
    }
}

#[derive(Deserialize)]
struct TeamsResponse {
    #[serde(default)]
    teams: Vec<IdOnly>,
}

#[derive(Deserialize)]
struct IdOnly {
    id: String,
}

#[derive(Deserialize)]
struct CustomTaskTypes {
    #[serde(default)]
    custom_items: Vec<CustomTaskType>,
}

#[derive(Deserialize)]
struct CustomTaskType {
    id: i64,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct ClickUpTask {
    id: String,
    #[serde(default)]
    name: String,
    description: Option<String>,
    #[serde(default)]
    attachments: Vec<ClickUpAttachment>,
}

#[derive(Deserialize)]
struct ClickUpAttachment {
    #[serde(default)]
    title: String,
    #[serde(default, alias = "type")]
    mimetype: String,
    #[serde(default)]
    url: String,
}

#[derive(Deserialize)]
struct CommentsResponse {
    #[serde(default)]
    comments: Vec<ClickUpComment>,
}

#[derive(Deserialize)]
struct ClickUpComment {
    user: Option<ClickUpUser>,
    #[serde(default)]
    comment_text: String,
    date: Option<String>,
}

#[derive(Deserialize)]
struct ClickUpUser {
    #[serde(default)]
    username: String,
}

#[derive(Deserialize)]
struct CreatedTask {
    id: String,
    url: Option<String>,
}

#[derive(Deserialize)]
struct FoldersResponse {
    #[serde(default)]
    folders: Vec<ClickUpFolder>,
}

#[derive(Deserialize)]
struct ClickUpFolder {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct ListsResponse {
    #[serde(default)]
    lists: Vec<ClickUpList>,
}

#[derive(Deserialize)]
struct ClickUpList {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct TasksResponse {
    #[serde(default)]
    tasks: Vec<ClickUpTaskSummary>,
}

#[derive(Deserialize)]
struct ClickUpTaskSummary {
    id: String,
    #[serde(default)]
    name: String,
    parent: Option<String>,
}
