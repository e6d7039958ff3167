//! Client core for the projects/tasks API.
//!
//! # Overview
//! Two layers:
//! - `ProjectClient` builds `HttpRequest` values and parses `HttpResponse`
//!   values without touching the network (host-does-IO pattern).
//! - `ProjectService` runs one request per operation through a `Transport`
//!   and routes every failure through the `ErrorNormalizer`, which logs it
//!   and, for server-reported failures, notifies the user before the error
//!   is returned.
//!
//! # Design
//! - The base path is captured once at construction from a
//!   `BasePathProvider` and never changes.
//! - All failures are `ApiError`: `Transport` for anything on the client's
//!   side of the wire, `Server` for non-2xx responses.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod multipart;
pub mod normalize;
pub mod service;
pub mod transport;
pub mod types;

pub use client::ProjectClient;
pub use config::{ApiConfig, BasePathProvider, ConfigError};
pub use error::{ApiError, ErrorKind, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use normalize::{ErrorNormalizer, Notifier, TracingNotifier};
pub use service::ProjectService;
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    AvatarUpload, NewProject, NewTask, Page, Project, ProjectAvatar, ProjectStatus, ServerErrorBody,
    Task, TaskStatus,
};
