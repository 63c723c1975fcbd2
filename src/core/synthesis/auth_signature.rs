//! Recognizing credential rejections.
//!
//! A failure counts as an authentication failure when its HTTP status is in
//! the status table, or when its message contains one of the markers
//! (case-insensitive substring). Anything else, including quota and rate-limit
//! errors, is not.

use once_cell::sync::Lazy;
use regex::{RegexSet, RegexSetBuilder};

use crate::core::tts::TTSError;

/// Statuses that always mean the credential was rejected.
pub const AUTH_FAILURE_STATUSES: &[u16] = &[401, 403];

/// Message fragments that mean the credential was rejected.
pub const AUTH_FAILURE_MARKERS: &[&str] = &[
    "unauthorized",
    "unauthorised",
    "authentication",
    "invalid api key",
    "incorrect api key",
    "invalid subscription key",
    "access denied",
];

static BUILTIN: Lazy<AuthSignature> = Lazy::new(|| {
    // Markers are escaped literals, so the set always compiles
    AuthSignature::new(AUTH_FAILURE_STATUSES, AUTH_FAILURE_MARKERS)
        .unwrap_or_else(|_| AuthSignature::statuses_only(AUTH_FAILURE_STATUSES))
});

/// A table of statuses and message markers identifying auth failures.
#[derive(Debug, Clone)]
pub struct AuthSignature {
    statuses: Vec<u16>,
    markers: RegexSet,
}

impl AuthSignature {
    /// Build a signature from a status table and literal markers.
    pub fn new(statuses: &[u16], markers: &[&str]) -> Result<Self, regex::Error> {
        let markers = RegexSetBuilder::new(markers.iter().map(|m| regex::escape(m)))
            .case_insensitive(true)
            .build()?;
        Ok(Self {
            statuses: statuses.to_vec(),
            markers,
        })
    }

    fn statuses_only(statuses: &[u16]) -> Self {
        Self {
            statuses: statuses.to_vec(),
            markers: RegexSet::empty(),
        }
    }

    /// The default table.
    pub fn builtin() -> &'static AuthSignature {
        &BUILTIN
    }

    pub fn matches(&self, status: Option<u16>, message: &str) -> bool {
        status.is_some_and(|s| self.statuses.contains(&s)) || self.markers.is_match(message)
    }

    pub fn matches_error(&self, error: &TTSError) -> bool {
        self.matches(error.status(), &error.to_string())
    }
}

impl Default for AuthSignature {
    fn default() -> Self {
        Self::builtin().clone()
    }
}

/// Check an error against the default table.
pub fn is_auth_failure(error: &TTSError) -> bool {
    AuthSignature::builtin().matches_error(error)
}
