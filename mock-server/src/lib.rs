//! In-memory implementation of the projects/tasks HTTP API.
//!
//! Pages hold `PAGE_SIZE` items. Errors answer with `{"detail": "..."}`.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;

pub const PAGE_SIZE: usize = 10;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub manager: String,
    pub status: String,
}

#[derive(Deserialize)]
pub struct ProjectInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub manager: String,
    #[serde(default = "default_project_status")]
    pub status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: u64,
    pub project: u64,
    pub title: String,
    pub description: String,
    pub status: String,
    pub assignee: Option<String>,
    pub due_date: Option<String>,
}

#[derive(Deserialize)]
pub struct TaskInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_task_status")]
    pub status: String,
    pub assignee: Option<String>,
    pub due_date: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Avatar {
    pub image: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PageBody<T> {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
}

fn default_project_status() -> String {
    "active".to_string()
}

fn default_task_status() -> String {
    "todo".to_string()
}

#[derive(Default)]
pub struct Store {
    projects: BTreeMap<u64, Project>,
    tasks: BTreeMap<u64, Task>,
    avatars: HashMap<u64, Avatar>,
    last_project_id: u64,
    last_task_id: u64,
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Debug)]
pub enum ApiFailure {
    NotFound,
    InvalidPage,
    BadRequest(String),
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiFailure::NotFound => (StatusCode::NOT_FOUND, "Not found.".to_string()),
            ApiFailure::InvalidPage => (StatusCode::NOT_FOUND, "Invalid page.".to_string()),
            ApiFailure::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail),
        };
        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/api/projects/", get(list_projects))
        .route("/api/projects/create/", post(create_project))
        .route("/api/projects/{project_id}/", get(get_project))
        .route("/api/projects/{project_id}/update/", put(update_project))
        .route("/api/projects/{project_id}/delete/", delete(delete_project))
        .route("/api/projects/{project_id}/tasks/", get(list_tasks))
        .route("/api/projects/{project_id}/tasks/create/", post(create_task))
        .route("/api/projects/{project_id}/tasks/{task_id}/", get(get_task))
        .route(
            "/api/projects/{project_id}/tasks/{task_id}/update/",
            put(update_task),
        )
        .route(
            "/api/projects/{project_id}/tasks/{task_id}/delete/",
            delete(delete_task),
        )
        .route("/api/projects/{project_id}/image/", get(get_avatar))
        .route(
            "/api/projects/{project_id}/image/{filename}/",
            post(upload_avatar),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Slice `items` into the requested page. Page 1 of an empty collection is
/// valid; any other page past the end is not.
fn paginate<T>(
    items: Vec<T>,
    page: Option<usize>,
    path: &str,
) -> Result<PageBody<T>, ApiFailure> {
    let page = page.unwrap_or(1);
    if page == 0 {
        return Err(ApiFailure::InvalidPage);
    }
    let count = items.len();
    let start = (page - 1) * PAGE_SIZE;
    if start >= count && page > 1 {
        return Err(ApiFailure::InvalidPage);
    }
    let results: Vec<T> = items.into_iter().skip(start).take(PAGE_SIZE).collect();
    let next = (start + PAGE_SIZE < count).then(|| format!("{path}?page={}", page + 1));
    let previous = (page > 1).then(|| format!("{path}?page={}", page - 1));
    Ok(PageBody {
        count,
        next,
        previous,
        results,
    })
}

async fn list_projects(
    State(db): State<Db>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageBody<Project>>, ApiFailure> {
    let store = db.read().await;
    let projects: Vec<Project> = store.projects.values().cloned().collect();
    paginate(projects, query.page, "/api/projects/").map(Json)
}

async fn create_project(
    State(db): State<Db>,
    Json(input): Json<ProjectInput>,
) -> (StatusCode, Json<Project>) {
    let mut store = db.write().await;
    store.last_project_id += 1;
    let project = Project {
        id: store.last_project_id,
        title: input.title,
        description: input.description,
        manager: input.manager,
        status: input.status,
    };
    store.projects.insert(project.id, project.clone());
    (StatusCode::CREATED, Json(project))
}

async fn get_project(
    State(db): State<Db>,
    Path(project_id): Path<u64>,
) -> Result<Json<Project>, ApiFailure> {
    let store = db.read().await;
    store
        .projects
        .get(&project_id)
        .cloned()
        .map(Json)
        .ok_or(ApiFailure::NotFound)
}

async fn update_project(
    State(db): State<Db>,
    Path(project_id): Path<u64>,
    Json(input): Json<ProjectInput>,
) -> Result<Json<Project>, ApiFailure> {
    let mut store = db.write().await;
    let project = store
        .projects
        .get_mut(&project_id)
        .ok_or(ApiFailure::NotFound)?;
    project.title = input.title;
    project.description = input.description;
    project.manager = input.manager;
    project.status = input.status;
    Ok(Json(project.clone()))
}

async fn delete_project(
    State(db): State<Db>,
    Path(project_id): Path<u64>,
) -> Result<StatusCode, ApiFailure> {
    let mut store = db.write().await;
    store
        .projects
        .remove(&project_id)
        .ok_or(ApiFailure::NotFound)?;
    store.tasks.retain(|_, task| task.project != project_id);
    store.avatars.remove(&project_id);
    Ok(StatusCode::NO_CONTENT)
}

async fn list_tasks(
    State(db): State<Db>,
    Path(project_id): Path<u64>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageBody<Task>>, ApiFailure> {
    let store = db.read().await;
    if !store.projects.contains_key(&project_id) {
        return Err(ApiFailure::NotFound);
    }
    let tasks: Vec<Task> = store
        .tasks
        .values()
        .filter(|task| task.project == project_id)
        .cloned()
        .collect();
    paginate(tasks, query.page, &format!("/api/projects/{project_id}/tasks/")).map(Json)
}

async fn create_task(
    State(db): State<Db>,
    Path(project_id): Path<u64>,
    Json(input): Json<TaskInput>,
) -> Result<(StatusCode, Json<Task>), ApiFailure> {
    let mut store = db.write().await;
    if !store.projects.contains_key(&project_id) {
        return Err(ApiFailure::NotFound);
    }
    store.last_task_id += 1;
    let task = Task {
        id: store.last_task_id,
        project: project_id,
        title: input.title,
        description: input.description,
        status: input.status,
        assignee: input.assignee,
        due_date: input.due_date,
    };
    store.tasks.insert(task.id, task.clone());
    Ok((StatusCode::CREATED, Json(task)))
}

async fn get_task(
    State(db): State<Db>,
    Path((project_id, task_id)): Path<(u64, u64)>,
) -> Result<Json<Task>, ApiFailure> {
    let store = db.read().await;
    store
        .tasks
        .get(&task_id)
        .filter(|task| task.project == project_id)
        .cloned()
        .map(Json)
        .ok_or(ApiFailure::NotFound)
}

async fn update_task(
    State(db): State<Db>,
    Path((project_id, task_id)): Path<(u64, u64)>,
    Json(input): Json<TaskInput>,
) -> Result<Json<Task>, ApiFailure> {
    let mut store = db.write().await;
    let task = store
        .tasks
        .get_mut(&task_id)
        .filter(|task| task.project == project_id)
        .ok_or(ApiFailure::NotFound)?;
    task.title = input.title;
    task.description = input.description;
    task.status = input.status;
    task.assignee = input.assignee;
    task.due_date = input.due_date;
    Ok(Json(task.clone()))
}

async fn delete_task(
    State(db): State<Db>,
    Path((project_id, task_id)): Path<(u64, u64)>,
) -> Result<StatusCode, ApiFailure> {
    let mut store = db.write().await;
    let owned = store
        .tasks
        .get(&task_id)
        .is_some_and(|task| task.project == project_id);
    if !owned {
        return Err(ApiFailure::NotFound);
    }
    store.tasks.remove(&task_id);
    Ok(StatusCode::NO_CONTENT)
}

async fn get_avatar(
    State(db): State<Db>,
    Path(project_id): Path<u64>,
) -> Result<Json<Avatar>, ApiFailure> {
    let store = db.read().await;
    store
        .avatars
        .get(&project_id)
        .cloned()
        .map(Json)
        .ok_or(ApiFailure::NotFound)
}

/// Stores the `image` part as a `data:` URL.
async fn upload_avatar(
    State(db): State<Db>,
    Path((project_id, _filename)): Path<(u64, String)>,
    mut multipart: Multipart,
) -> Result<Json<Avatar>, ApiFailure> {
    if !db.read().await.projects.contains_key(&project_id) {
        return Err(ApiFailure::NotFound);
    }

    let mut image = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiFailure::BadRequest(e.body_text()))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiFailure::BadRequest(e.body_text()))?;
        image = Some(format!("data:{content_type};base64,{}", STANDARD.encode(&bytes)));
    }

    let image =
        image.ok_or_else(|| ApiFailure::BadRequest("No image was submitted.".to_string()))?;
    let avatar = Avatar { image };
    let mut store = db.write().await;
    if !store.projects.contains_key(&project_id) {
        return Err(ApiFailure::NotFound);
    }
    store.avatars.insert(project_id, avatar.clone());
    Ok(Json(avatar))
}
