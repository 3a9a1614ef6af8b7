//! Session identity capability.
//!
//! # Responsibility
//! - Answer "is an identity present?" before the dashboard renders anything.
//!
//! # Invariants
//! - The identity blob is opaque; only its presence and JSON shape are checked.
//! - Identity contents are never logged.

use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Route the dashboard redirects to when no identity is present.
pub const LOGIN_ROUTE: &str = "/auth/login";

#[derive(Debug)]
pub enum SessionError {
    /// Identity blob is not valid JSON.
    Malformed(serde_json::Error),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(err) => write!(f, "malformed identity blob: {err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Malformed(err) => Some(err),
        }
    }
}

/// Confirmed identity, kept as the opaque JSON value it was stored as.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionIdentity {
    raw: Value,
}

impl SessionIdentity {
    /// Parses a stored identity blob.
    ///
    /// Returns `Ok(None)` for a blank blob.
    pub fn from_blob(blob: &str) -> Result<Option<Self>, SessionError> {
        let trimmed = blob.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let raw = serde_json::from_str::<Value>(trimmed).map_err(SessionError::Malformed)?;
        if raw.is_null() {
            return Ok(None);
        }
        Ok(Some(Self { raw }))
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

/// Synchronously readable identity presence check.
pub trait IdentitySource {
    fn identity(&self) -> Option<SessionIdentity>;
}

/// Identity source holding one stored blob, like a per-tab session store.
#[derive(Debug, Clone, Default)]
pub struct StoredIdentity {
    blob: Option<String>,
}

impl StoredIdentity {
    pub fn new(blob: Option<String>) -> Self {
        Self { blob }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

impl IdentitySource for StoredIdentity {
    fn identity(&self) -> Option<SessionIdentity> {
        let blob = self.blob.as_deref()?;
        match SessionIdentity::from_blob(blob) {
            Ok(identity) => identity,
            Err(err) => {
                log::warn!("event=session_identity module=session status=error error={err}");
                None
            }
        }
    }
}
