//! Typed results of remote existence checks.

use serde::{Deserialize, Serialize};

/// Result of asking a remote service whether a resource exists.
///
/// `Failed` is kept apart from `NotFound` so callers can decide whether a
/// broken probe should abort or fall through to the create path.
#[derive(Debug)]
pub enum ProbeOutcome<E> {
    Found,
    NotFound,
    Failed(E),
}

impl<E> ProbeOutcome<E> {
    /// Collapse the outcome into "exists or not" under the given policy.
    ///
    /// Returns the probe error back when the policy is [`ProbeErrorPolicy::Abort`].
    pub fn exists(self, policy: ProbeErrorPolicy) -> Result<bool, E> {
        match self {
            Self::Found => Ok(true),
            Self::NotFound => Ok(false),
            Self::Failed(e) => match policy {
                ProbeErrorPolicy::Abort => Err(e),
                ProbeErrorPolicy::AssumeAbsent => Ok(false),
            },
        }
    }
}

/// How to treat an existence check that failed for a reason other than
/// "not found" (network error, expired credentials, throttling).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbeErrorPolicy {
    /// Stop and report the probe error.
    #[default]
    Abort,
    /// Proceed as if the resource did not exist.
    AssumeAbsent,
}

impl ProbeErrorPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "abort" => Some(Self::Abort),
            "assume-absent" | "absent" => Some(Self::AssumeAbsent),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProbeErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Abort => f.write_str("abort"),
            Self::AssumeAbsent => f.write_str("assume-absent"),
        }
    }
}
