//! Request-scoped context: the calling subject plus the cancellation and
//! deadline that bound any store I/O done on its behalf.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{StoreError, StoreResult};

/// Subject of every call made without an authenticated identity.
pub const ANONYMOUS: &str = "system:anonymous";
/// Group anonymous callers are provisioned into.
pub const UNAUTHENTICATED: &str = "system:unauthenticated";
/// Group a subject joins once the authentication layer has established it.
pub const AUTHENTICATED: &str = "system:authenticated";

#[derive(Debug, Clone, Default)]
pub struct Context {
    subject: Option<String>,
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl Context {
    /// An anonymous context with no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Set the resolved subject. The authentication layer calls this after
    /// validating a session; an empty subject leaves the context anonymous.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        let subject = subject.into();
        self.subject = (!subject.is_empty()).then_some(subject);
        self
    }

    /// Bound store I/O to `timeout` from now. An earlier deadline is kept.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The calling subject, or [`ANONYMOUS`].
    pub fn subject(&self) -> &str {
        self.subject.as_deref().unwrap_or(ANONYMOUS)
    }

    pub fn is_authenticated(&self) -> bool {
        self.subject() != ANONYMOUS
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drive `fut` until it completes, the context is cancelled or its
    /// deadline passes.
    pub(crate) async fn run<F>(&self, fut: F) -> StoreResult<F::Output>
    where
        F: Future,
    {
        if self.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        let guarded = async {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(StoreError::Cancelled),
                out = fut => Ok(out),
            }
        };

        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, guarded)
                .await
                .map_err(|_| StoreError::DeadlineExceeded)?,
            None => guarded.await,
        }
    }
}
