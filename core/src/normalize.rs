//! The single choke point every failed request passes through.
//!
//! # Design
//! `ErrorNormalizer` is stateless apart from its `Notifier`. Server failures
//! are logged, surfaced to the user through the notifier, and propagated.
//! Transport failures are logged and propagated without a notification.
//! Nothing here ever turns a failure into a success.

use tracing::{error, warn};

use crate::error::ApiError;

/// User-facing notification channel for server-reported failures.
///
/// `notify` is called synchronously, before the failure reaches the caller.
/// Closures taking `&str` implement it, which is how tests observe it.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

impl<F> Notifier for F
where
    F: Fn(&str) + Send + Sync,
{
    fn notify(&self, message: &str) {
        self(message)
    }
}

/// Default notifier: emits the message as a `warn` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str) {
        warn!(target: "taskboard::notify", "{message}");
    }
}

#[derive(Debug, Clone, Default)]
pub struct ErrorNormalizer<N = TracingNotifier> {
    notifier: N,
}

impl<N: Notifier> ErrorNormalizer<N> {
    pub fn new(notifier: N) -> Self {
        Self { notifier }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Report `err` and hand it back for propagation.
    pub fn normalize(&self, err: ApiError) -> ApiError {
        match &err {
            ApiError::Transport { message } => {
                error!(%message, "An error occurred");
            }
            ApiError::Server { status, detail } => {
                error!(status, %detail, "Backend returned an error status");
                self.notifier.notify(detail);
            }
        }
        err
    }
}
