//! Error types for cairn core
//!
//! Provides error handling for:
//! - Lifecycle phase failures (carried by an object's readiness signal)
//! - Configuration lookups (environments, accounts, targets)

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Boxed error returned by lifecycle phases
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Shared form of a phase error, so every awaiter sees the same cause
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// The three initialization phases, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Runs before naming is finalized
    PreInitialize,
    /// Main construct creation
    Initialize,
    /// Runs after creation (tagging, output wiring, policies)
    PostInitialize,
}

impl Phase {
    /// All phases in the order they run
    pub const ALL: [Phase; 3] = [Phase::PreInitialize, Phase::Initialize, Phase::PostInitialize];

    /// Stable lowercase name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PreInitialize => "pre-initialize",
            Self::Initialize => "initialize",
            Self::PostInitialize => "post-initialize",
        }
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle errors
///
/// Cloneable: the same value is handed to every caller awaiting readiness.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LifecycleError {
    /// A phase returned an error; the original is kept as `source`
    #[error("initialization of {type_name} failed during {phase}: {source}")]
    PhaseFailed {
        /// Concrete type of the failing object
        type_name: &'static str,
        /// Phase that failed
        phase: Phase,
        /// Original phase error
        #[source]
        source: SharedError,
    },

    /// `activate` was called on an object that already started
    #[error("{type_name} '{name}' has already been activated")]
    AlreadyActivated {
        /// Concrete type of the object
        type_name: &'static str,
        /// Object name
        name: String,
    },

    /// Activation was dropped (cancelled, timed out, aborted) before the phases finished
    #[error("activation of '{name}' was dropped before initialization finished")]
    Abandoned {
        /// Object name
        name: String,
    },
}

impl LifecycleError {
    /// Phase that failed, if this is a phase failure
    #[inline]
    #[must_use]
    pub fn failed_phase(&self) -> Option<Phase> {
        match self {
            Self::PhaseFailed { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// Check if error came from a phase body
    #[inline]
    #[must_use]
    pub fn is_phase_failure(&self) -> bool {
        matches!(self, Self::PhaseFailed { .. })
    }
}

/// Configuration lookup errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No environment with this name
    #[error("unknown environment: {0}")]
    UnknownEnvironment(String),

    /// No account properties with this name
    #[error("unknown account: {0}")]
    UnknownAccount(String),

    /// A required setting is empty or absent
    #[error("missing configuration value: {0}")]
    MissingValue(String),
}
