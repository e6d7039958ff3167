//! Asynchronous resource client: one request per operation.
//!
//! # Design
//! `ProjectService` pairs a `ProjectClient` (request building and response
//! parsing) with a `Transport` (the actual round-trip) and an
//! `ErrorNormalizer`. Every operation goes through `exchange`, so every
//! failure, whether raised while building, sending or parsing, reaches the
//! normalizer exactly once. The service holds no mutable state; operations
//! borrow `&self` and may run concurrently.

use tracing::debug;

use crate::client::ProjectClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::normalize::{ErrorNormalizer, Notifier, TracingNotifier};
use crate::transport::Transport;
use crate::types::{AvatarUpload, NewProject, NewTask, Project, ProjectAvatar, Task};

#[derive(Debug, Clone)]
pub struct ProjectService<T, N = TracingNotifier> {
    client: ProjectClient,
    transport: T,
    normalizer: ErrorNormalizer<N>,
}

impl<T: Transport> ProjectService<T> {
    /// Service that reports server failures through `TracingNotifier`.
    pub fn with_transport(client: ProjectClient, transport: T) -> Self {
        Self::new(client, transport, TracingNotifier)
    }
}

impl<T: Transport, N: Notifier> ProjectService<T, N> {
    pub fn new(client: ProjectClient, transport: T, notifier: N) -> Self {
        Self {
            client,
            transport,
            normalizer: ErrorNormalizer::new(notifier),
        }
    }

    pub fn client(&self) -> &ProjectClient {
        &self.client
    }

    pub async fn list_projects(&self, page: u32) -> Result<Vec<Project>, ApiError> {
        self.exchange(
            self.client.build_list_projects(page),
            ProjectClient::parse_list_projects,
        )
        .await
    }

    pub async fn get_project(&self, project_id: u64) -> Result<Project, ApiError> {
        self.exchange(
            Ok(self.client.build_get_project(project_id)),
            ProjectClient::parse_get_project,
        )
        .await
    }

    pub async fn create_project(&self, input: &NewProject) -> Result<Project, ApiError> {
        self.exchange(
            self.client.build_create_project(input),
            ProjectClient::parse_create_project,
        )
        .await
    }

    pub async fn update_project(&self, project: &Project) -> Result<Project, ApiError> {
        self.exchange(
            self.client.build_update_project(project),
            ProjectClient::parse_update_project,
        )
        .await
    }

    /// Only a project's manager may delete it; the server enforces this.
    pub async fn delete_project(&self, project_id: u64) -> Result<(), ApiError> {
        self.exchange(
            Ok(self.client.build_delete_project(project_id)),
            ProjectClient::parse_delete_project,
        )
        .await
    }

    pub async fn list_tasks(&self, project_id: u64, page: u32) -> Result<Vec<Task>, ApiError> {
        self.exchange(
            self.client.build_list_tasks(project_id, page),
            move |client, response| client.parse_list_tasks(project_id, response),
        )
        .await
    }

    pub async fn get_task(&self, project_id: u64, task_id: u64) -> Result<Task, ApiError> {
        self.exchange(
            Ok(self.client.build_get_task(project_id, task_id)),
            move |client, response| client.parse_get_task(project_id, response),
        )
        .await
    }

    pub async fn create_task(&self, project_id: u64, input: &NewTask) -> Result<Task, ApiError> {
        self.exchange(
            self.client.build_create_task(project_id, input),
            move |client, response| client.parse_create_task(project_id, response),
        )
        .await
    }

    pub async fn update_task(&self, project_id: u64, input: &NewTask) -> Result<Task, ApiError> {
        self.exchange(
            self.client.build_update_task(project_id, input),
            move |client, response| client.parse_update_task(project_id, response),
        )
        .await
    }

    /// Only the project's manager may delete its tasks; the server enforces this.
    pub async fn delete_task(&self, project_id: u64, task_id: u64) -> Result<(), ApiError> {
        self.exchange(
            Ok(self.client.build_delete_task(project_id, task_id)),
            ProjectClient::parse_delete_task,
        )
        .await
    }

    pub async fn get_project_avatar(&self, project_id: u64) -> Result<ProjectAvatar, ApiError> {
        self.exchange(
            Ok(self.client.build_get_project_avatar(project_id)),
            ProjectClient::parse_get_project_avatar,
        )
        .await
    }

    pub async fn update_project_avatar(
        &self,
        project_id: u64,
        upload: &AvatarUpload,
        filename: &str,
    ) -> Result<ProjectAvatar, ApiError> {
        self.exchange(
            self.client
                .build_update_project_avatar(project_id, upload, filename),
            ProjectClient::parse_update_project_avatar,
        )
        .await
    }

    async fn exchange<R, P>(
        &self,
        request: Result<HttpRequest, ApiError>,
        parse: P,
    ) -> Result<R, ApiError>
    where
        P: FnOnce(&ProjectClient, HttpResponse) -> Result<R, ApiError>,
    {
        let outcome = match request {
            Ok(request) => {
                debug!(method = %request.method, url = %request.url, "sending request");
                match self.transport.execute(request).await {
                    Ok(response) => parse(&self.client, response),
                    Err(err) => Err(err.into()),
                }
            }
            Err(err) => Err(err),
        };
        outcome.map_err(|err| self.normalizer.normalize(err))
    }
}
