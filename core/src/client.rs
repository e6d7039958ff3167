//! Stateless HTTP request builder and response parser for the projects API.
//!
//! # Design
//! `ProjectClient` holds only the base path captured at construction and
//! carries no mutable state between calls. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method
//! that consumes an `HttpResponse`. The caller executes the round-trip, which
//! keeps this layer deterministic and free of I/O.
//!
//! URLs are `{base}/api/projects/[{project_id}/[tasks/[{task_id}/]]]{action}`.
//! Every request states its content type explicitly: JSON everywhere, the
//! multipart boundary for the avatar upload.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::BasePathProvider;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::multipart;
use crate::types::{
    AvatarUpload, NewProject, NewTask, Page, Project, ProjectAvatar, ServerErrorBody, Task,
};

const JSON: &str = "application/json";

/// Synchronous, stateless client for the projects API.
#[derive(Debug, Clone)]
pub struct ProjectClient {
    base_path: String,
}

impl ProjectClient {
    pub fn new<P>(provider: &P) -> Self
    where
        P: BasePathProvider + ?Sized,
    {
        Self {
            base_path: provider.base_path().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    // -- projects ---------------------------------------------------------

    pub fn build_list_projects(&self, page: u32) -> Result<HttpRequest, ApiError> {
        check_page(page)?;
        Ok(self.request(HttpMethod::Get, format!("?page={page}"), None))
    }

    pub fn build_get_project(&self, project_id: u64) -> HttpRequest {
        self.request(HttpMethod::Get, format!("{project_id}/"), None)
    }

    pub fn build_create_project(&self, input: &NewProject) -> Result<HttpRequest, ApiError> {
        let body = encode_json(input)?;
        Ok(self.request(HttpMethod::Post, "create/".to_string(), Some(body)))
    }

    pub fn build_update_project(&self, project: &Project) -> Result<HttpRequest, ApiError> {
        let body = encode_json(project)?;
        Ok(self.request(
            HttpMethod::Put,
            format!("{}/update/", project.id),
            Some(body),
        ))
    }

    pub fn build_delete_project(&self, project_id: u64) -> HttpRequest {
        self.request(HttpMethod::Delete, format!("{project_id}/delete/"), None)
    }

    pub fn parse_list_projects(&self, response: HttpResponse) -> Result<Vec<Project>, ApiError> {
        let page: Page<Project> = decode(response)?;
        Ok(page.results)
    }

    pub fn parse_get_project(&self, response: HttpResponse) -> Result<Project, ApiError> {
        decode(response)
    }

    pub fn parse_create_project(&self, response: HttpResponse) -> Result<Project, ApiError> {
        decode(response)
    }

    pub fn parse_update_project(&self, response: HttpResponse) -> Result<Project, ApiError> {
        decode(response)
    }

    /// Succeeds on any 2xx; the body is never inspected.
    pub fn parse_delete_project(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    // -- tasks ------------------------------------------------------------

    pub fn build_list_tasks(&self, project_id: u64, page: u32) -> Result<HttpRequest, ApiError> {
        check_page(page)?;
        Ok(self.request(
            HttpMethod::Get,
            format!("{project_id}/tasks/?page={page}"),
            None,
        ))
    }

    pub fn build_get_task(&self, project_id: u64, task_id: u64) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            format!("{project_id}/tasks/{task_id}/"),
            None,
        )
    }

    /// Any `id` on `input` is dropped: the server assigns identifiers.
    pub fn build_create_task(
        &self,
        project_id: u64,
        input: &NewTask,
    ) -> Result<HttpRequest, ApiError> {
        let body = if input.id.is_some() {
            encode_json(&NewTask {
                id: None,
                ..input.clone()
            })?
        } else {
            encode_json(input)?
        };
        Ok(self.request(
            HttpMethod::Post,
            format!("{project_id}/tasks/create/"),
            Some(body),
        ))
    }

    pub fn build_update_task(
        &self,
        project_id: u64,
        input: &NewTask,
    ) -> Result<HttpRequest, ApiError> {
        let task_id = input
            .id
            .ok_or_else(|| ApiError::transport("task update requires a task id"))?;
        let body = encode_json(input)?;
        Ok(self.request(
            HttpMethod::Put,
            format!("{project_id}/tasks/{task_id}/update/"),
            Some(body),
        ))
    }

    pub fn build_delete_task(&self, project_id: u64, task_id: u64) -> HttpRequest {
        self.request(
            HttpMethod::Delete,
            format!("{project_id}/tasks/{task_id}/delete/"),
            None,
        )
    }

    pub fn parse_list_tasks(
        &self,
        project_id: u64,
        response: HttpResponse,
    ) -> Result<Vec<Task>, ApiError> {
        let page: Page<Task> = decode(response)?;
        for task in &page.results {
            check_parent(project_id, task)?;
        }
        Ok(page.results)
    }

    pub fn parse_get_task(&self, project_id: u64, response: HttpResponse) -> Result<Task, ApiError> {
        decode_task(project_id, response)
    }

    pub fn parse_create_task(
        &self,
        project_id: u64,
        response: HttpResponse,
    ) -> Result<Task, ApiError> {
        decode_task(project_id, response)
    }

    pub fn parse_update_task(
        &self,
        project_id: u64,
        response: HttpResponse,
    ) -> Result<Task, ApiError> {
        decode_task(project_id, response)
    }

    pub fn parse_delete_task(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    // -- avatar -----------------------------------------------------------

    pub fn build_get_project_avatar(&self, project_id: u64) -> HttpRequest {
        self.request(HttpMethod::Get, format!("{project_id}/image/"), None)
    }

    /// Multipart upload of `upload` under `filename`. The filename becomes a
    /// path segment, so it is limited to ASCII letters, digits, `.`, `-`, `_`.
    pub fn build_update_project_avatar(
        &self,
        project_id: u64,
        upload: &AvatarUpload,
        filename: &str,
    ) -> Result<HttpRequest, ApiError> {
        check_filename(filename)?;
        let boundary = multipart::new_boundary();
        let body = multipart::encode_file(
            &boundary,
            multipart::IMAGE_FIELD,
            filename,
            &upload.content_type,
            &upload.bytes,
        );
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.url(&format!("{project_id}/image/{filename}/")),
            headers: vec![(
                "content-type".to_string(),
                multipart::content_type(&boundary),
            )],
            body: Some(body),
        })
    }

    pub fn parse_get_project_avatar(
        &self,
        response: HttpResponse,
    ) -> Result<ProjectAvatar, ApiError> {
        decode(response)
    }

    pub fn parse_update_project_avatar(
        &self,
        response: HttpResponse,
    ) -> Result<ProjectAvatar, ApiError> {
        decode(response)
    }

    fn url(&self, rest: &str) -> String {
        format!("{}/api/projects/{rest}", self.base_path)
    }

    fn request(&self, method: HttpMethod, rest: String, body: Option<Vec<u8>>) -> HttpRequest {
        HttpRequest {
            method,
            url: self.url(&rest),
            headers: vec![("content-type".to_string(), JSON.to_string())],
            body,
        }
    }
}

/// Map a non-2xx response to `ApiError::Server`.
///
/// The detail comes from the structured `{"detail": ...}` body when there is
/// one, otherwise from the raw body, otherwise from the status code.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    let detail = match serde_json::from_str::<ServerErrorBody>(&response.body) {
        Ok(body) => body.detail,
        Err(_) if !response.body.trim().is_empty() => response.body.trim().to_string(),
        Err(_) => format!("HTTP {}", response.status),
    };
    Err(ApiError::Server {
        status: response.status,
        detail,
    })
}

fn decode<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body)
        .map_err(|e| ApiError::transport(format!("could not decode response body: {e}")))
}

fn decode_task(project_id: u64, response: HttpResponse) -> Result<Task, ApiError> {
    let task: Task = decode(response)?;
    check_parent(project_id, &task)?;
    Ok(task)
}

fn encode_json<T: Serialize>(value: &T) -> Result<Vec<u8>, ApiError> {
    serde_json::to_vec(value)
        .map_err(|e| ApiError::transport(format!("could not encode request body: {e}")))
}

fn check_page(page: u32) -> Result<(), ApiError> {
    if page == 0 {
        return Err(ApiError::transport("page numbers start at 1"));
    }
    Ok(())
}

fn check_parent(project_id: u64, task: &Task) -> Result<(), ApiError> {
    if task.project != project_id {
        return Err(ApiError::transport(format!(
            "task {} belongs to project {}, not {project_id}",
            task.id, task.project
        )));
    }
    Ok(())
}

fn check_filename(filename: &str) -> Result<(), ApiError> {
    let valid = !filename.is_empty()
        && filename != "."
        && filename != ".."
        && filename
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_'));
    if !valid {
        return Err(ApiError::transport(format!(
            "invalid avatar filename {filename:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ProjectStatus, TaskStatus};

    fn client() -> ProjectClient {
        ProjectClient::new("http://localhost:8000")
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    fn json_body(req: &HttpRequest) -> serde_json::Value {
        serde_json::from_slice(req.body.as_deref().unwrap()).unwrap()
    }

    fn assert_json_header(req: &HttpRequest) {
        assert_eq!(
            req.headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
    }

    #[test]
    fn build_list_projects_forwards_page() {
        let req = client().build_list_projects(3).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8000/api/projects/?page=3");
        assert!(req.body.is_none());
        assert_json_header(&req);
    }

    #[test]
    fn build_list_projects_rejects_page_zero() {
        let err = client().build_list_projects(0).unwrap_err();
        assert!(matches!(err, ApiError::Transport { .. }));
    }

    #[test]
    fn build_get_project_produces_correct_request() {
        let req = client().build_get_project(12);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8000/api/projects/12/");
        assert_json_header(&req);
    }

    #[test]
    fn build_create_project_sends_no_id() {
        let input = NewProject {
            title: "Website".to_string(),
            description: "Relaunch".to_string(),
            manager: "ada".to_string(),
            status: ProjectStatus::Active,
        };
        let req = client().build_create_project(&input).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8000/api/projects/create/");
        assert_json_header(&req);
        let body = json_body(&req);
        assert!(body.get("id").is_none());
        assert_eq!(body["title"], "Website");
        assert_eq!(body["manager"], "ada");
    }

    #[test]
    fn build_update_project_targets_own_id() {
        let project = Project {
            id: 42,
            title: "Website".to_string(),
            description: String::new(),
            manager: "ada".to_string(),
            status: ProjectStatus::Completed,
        };
        let req = client().build_update_project(&project).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.url, "http://localhost:8000/api/projects/42/update/");
        assert_eq!(json_body(&req)["id"], 42);
        assert_eq!(json_body(&req)["status"], "completed");
    }

    #[test]
    fn build_delete_project_produces_correct_request() {
        let req = client().build_delete_project(9);
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.url, "http://localhost:8000/api/projects/9/delete/");
        assert!(req.body.is_none());
        assert_json_header(&req);
    }

    #[test]
    fn task_urls_are_nested_under_project() {
        let c = client();
        assert_eq!(
            c.build_list_tasks(7, 2).unwrap().url,
            "http://localhost:8000/api/projects/7/tasks/?page=2"
        );
        assert_eq!(
            c.build_get_task(7, 3).url,
            "http://localhost:8000/api/projects/7/tasks/3/"
        );
        assert_eq!(
            c.build_delete_task(7, 3).url,
            "http://localhost:8000/api/projects/7/tasks/3/delete/"
        );
        assert_eq!(c.build_delete_task(7, 3).method, HttpMethod::Delete);
    }

    #[test]
    fn build_create_task_strips_identifier() {
        let input = NewTask {
            id: Some(99),
            title: "Draft copy".to_string(),
            status: Some(TaskStatus::InProgress),
            ..NewTask::default()
        };
        let req = client().build_create_task(5, &input).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8000/api/projects/5/tasks/create/");
        assert_eq!(
            json_body(&req),
            serde_json::json!({"title": "Draft copy", "status": "in_progress"})
        );
    }

    #[test]
    fn build_update_task_uses_task_id_from_input() {
        let input = NewTask {
            id: Some(3),
            title: "x".to_string(),
            ..NewTask::default()
        };
        let req = client().build_update_task(7, &input).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.url, "http://localhost:8000/api/projects/7/tasks/3/update/");
        assert_eq!(json_body(&req), serde_json::json!({"id": 3, "title": "x"}));
        assert_json_header(&req);
    }

    #[test]
    fn build_update_task_requires_identifier() {
        let input = NewTask {
            title: "x".to_string(),
            ..NewTask::default()
        };
        let err = client().build_update_task(7, &input).unwrap_err();
        assert_eq!(err.to_string(), "client side Error: task update requires a task id");
    }

    #[test]
    fn build_update_project_avatar_is_multipart() {
        let upload = AvatarUpload::new("image/png", b"png-bytes".to_vec());
        let req = client()
            .build_update_project_avatar(4, &upload, "logo.png")
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8000/api/projects/4/image/logo.png/");

        let content_type = req.header("content-type").unwrap();
        let boundary = content_type
            .strip_prefix("multipart/form-data; boundary=")
            .unwrap();
        let body = String::from_utf8(req.body.clone().unwrap()).unwrap();
        assert!(body.starts_with(&format!("--{boundary}\r\n")));
        assert!(body.contains("name=\"image\"; filename=\"logo.png\""));
        assert!(body.contains("Content-Type: image/png\r\n\r\npng-bytes\r\n"));
        assert!(body.ends_with(&format!("--{boundary}--\r\n")));
    }

    #[test]
    fn build_update_project_avatar_rejects_path_like_filename() {
        let upload = AvatarUpload::new("image/png", Vec::new());
        for bad in ["", "..", "a/b.png", "my logo.png", "x\".png"] {
            let err = client()
                .build_update_project_avatar(4, &upload, bad)
                .unwrap_err();
            assert!(matches!(err, ApiError::Transport { .. }), "{bad:?}");
        }
    }

    #[test]
    fn parse_list_projects_returns_results_in_order() {
        let body = r#"{"count":5,"next":"/api/projects/?page=2","previous":null,"results":[
            {"id":2,"title":"B","manager":"ada"},
            {"id":1,"title":"A","manager":"ada"}]}"#;
        let projects = client().parse_list_projects(response(200, body)).unwrap();
        let ids: Vec<u64> = projects.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn parse_get_project_not_found_uses_detail() {
        let err = client()
            .parse_get_project(response(404, r#"{"detail":"Not found."}"#))
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found.");
    }

    #[test]
    fn unstructured_error_body_is_used_verbatim() {
        let err = client()
            .parse_create_project(response(500, "internal error"))
            .unwrap_err();
        assert_eq!(
            err,
            ApiError::Server {
                status: 500,
                detail: "internal error".to_string()
            }
        );
    }

    #[test]
    fn empty_error_body_falls_back_to_status() {
        let err = client().parse_delete_project(response(502, "")).unwrap_err();
        assert_eq!(err.to_string(), "HTTP 502");
    }

    #[test]
    fn parse_delete_ignores_body() {
        assert!(client().parse_delete_project(response(204, "")).is_ok());
        assert!(client()
            .parse_delete_task(response(200, "not json at all"))
            .is_ok());
    }

    #[test]
    fn parse_get_task_checks_parent_project() {
        let body = r#"{"id":3,"project":8,"title":"x"}"#;
        assert_eq!(client().parse_get_task(8, response(200, body)).unwrap().id, 3);
        let err = client().parse_get_task(7, response(200, body)).unwrap_err();
        assert!(matches!(err, ApiError::Transport { .. }));
    }

    #[test]
    fn parse_list_tasks_checks_every_parent() {
        let body = r#"{"count":2,"results":[
            {"id":1,"project":7,"title":"a"},
            {"id":2,"project":6,"title":"b"}]}"#;
        assert!(client().parse_list_tasks(7, response(200, body)).is_err());
    }

    #[test]
    fn parse_bad_json_is_client_side() {
        let err = client()
            .parse_get_project_avatar(response(200, "not json"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Transport { .. }));
        assert!(err.to_string().starts_with("client side Error: "));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = ProjectClient::new("http://localhost:8000/");
        let req = client.build_get_project_avatar(1);
        assert_eq!(req.url, "http://localhost:8000/api/projects/1/image/");
    }
}
