use std::time::Duration;

use tokio::time::Instant;

use crate::domain::user::models::Principal;
use crate::i18n::Locale;

/// Immutable per-request values handed explicitly to every service call.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: String,
    locale: Locale,
    deadline: Instant,
    principal: Option<Principal>,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>, locale: Locale, deadline: Instant) -> Self {
        Self {
            request_id: request_id.into(),
            locale,
            deadline,
            principal: None,
        }
    }

    /// Context for work started outside an HTTP request.
    pub fn background(timeout: Duration) -> Self {
        Self::new("background", Locale::default(), Instant::now() + timeout)
    }

    /// Copy of this context carrying the authenticated principal.
    pub fn with_principal(&self, principal: Principal) -> Self {
        Self {
            principal: Some(principal),
            ..self.clone()
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Time left before the request deadline, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}
