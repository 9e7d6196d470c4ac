//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`PlanId`] / [`StepId`] / [`TaskId`] - Validated identifiers
//! - [`StepStatus`] / [`PlanMode`] / [`SignalType`] - Closed vocabularies
//! - [`UtcTimestamp`] - Second-precision UTC timestamp
//! - [`ContentHash`] - SHA-256 content hash for snapshot comparison
//!
//! # Validation
//!
//! Identifiers enforce validity at construction time. They travel through
//! comma-separated lists and whitespace-tokenized command lines, so commas,
//! whitespace, and control characters cannot be represented.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("invalid mode: {0}")]
    InvalidMode(String),

    #[error("invalid signal type: {0}")]
    InvalidSignalType(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

fn validate_id(id: &str) -> Result<(), TypeError> {
    if id.is_empty() {
        return Err(TypeError::InvalidId("identifier cannot be empty".into()));
    }
    if id.contains(',') {
        return Err(TypeError::InvalidId(
            "identifier cannot contain ','".into(),
        ));
    }
    for c in id.chars() {
        if c.is_whitespace() {
            return Err(TypeError::InvalidId(
                "identifier cannot contain whitespace".into(),
            ));
        }
        if c.is_ascii_control() {
            return Err(TypeError::InvalidId(
                "identifier cannot contain control characters".into(),
            ));
        }
    }
    Ok(())
}

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create a new validated identifier.
            ///
            /// # Errors
            ///
            /// Returns [`TypeError::InvalidId`] if the value is empty or
            /// contains commas, whitespace, or control characters.
            pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
                let id = id.into();
                validate_id(&id)?;
                Ok(Self(id))
            }

            /// Get the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypeError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type! {
    /// A validated plan identifier.
    ///
    /// Plan ids are either supplied by the caller or minted with
    /// [`random_id`] under the `plan-` prefix.
    PlanId
}

id_type! {
    /// A plan-local step identifier.
    ///
    /// Minted ids take the form `s{ordinal}`; externally supplied ids are
    /// accepted as long as they pass identifier validation.
    StepId
}

id_type! {
    /// A task identifier scoping context entries, budgets, and timers.
    TaskId
}

impl PlanId {
    /// Mint a random plan id (`plan-` + 16 hex chars).
    pub fn random() -> Self {
        Self(random_id("plan-"))
    }
}

/// Mint a random id: `prefix` followed by 16 hex characters.
pub fn random_id(prefix: &str) -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("{}{}", prefix, &hex[..16])
}

/// Execution status of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Done,
    Blocked,
}

impl StepStatus {
    /// The accepted command-line spellings, in declaration order.
    pub const NAMES: [&'static str; 4] = ["pending", "running", "done", "blocked"];

    /// Get the lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Done => "done",
            StepStatus::Blocked => "blocked",
        }
    }
}

impl std::str::FromStr for StepStatus {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(StepStatus::Pending),
            "running" => Ok(StepStatus::Running),
            "done" => Ok(StepStatus::Done),
            "blocked" => Ok(StepStatus::Blocked),
            other => Err(TypeError::InvalidStatus(other.to_string())),
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Plan generation mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanMode {
    #[default]
    Minimal,
    Full,
}

impl std::str::FromStr for PlanMode {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minimal" => Ok(PlanMode::Minimal),
            "full" => Ok(PlanMode::Full),
            other => Err(TypeError::InvalidMode(other.to_string())),
        }
    }
}

/// Orchestration signal vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalType {
    Start,
    Complete,
    Blocked,
    Switch,
    ReplanRequest,
}

impl SignalType {
    /// The accepted command-line spellings, in declaration order.
    pub const NAMES: [&'static str; 5] =
        ["START", "COMPLETE", "BLOCKED", "SWITCH", "REPLAN_REQUEST"];
}

impl std::str::FromStr for SignalType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "START" => Ok(SignalType::Start),
            "COMPLETE" => Ok(SignalType::Complete),
            "BLOCKED" => Ok(SignalType::Blocked),
            "SWITCH" => Ok(SignalType::Switch),
            "REPLAN_REQUEST" => Ok(SignalType::ReplanRequest),
            other => Err(TypeError::InvalidSignalType(other.to_string())),
        }
    }
}

/// A UTC timestamp rendered at second precision (`YYYY-MM-DDTHH:MM:SSZ`).
///
/// # Example
///
/// ```
/// use planloom::core::types::UtcTimestamp;
///
/// let now = UtcTimestamp::now();
/// assert!(now.to_string().ends_with('Z'));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UtcTimestamp(chrono::DateTime<chrono::Utc>);

impl UtcTimestamp {
    /// Create a timestamp for the current moment, truncated to seconds.
    pub fn now() -> Self {
        Self::from_datetime(chrono::Utc::now())
    }

    /// Create a timestamp from a chrono DateTime, truncated to seconds.
    pub fn from_datetime(dt: chrono::DateTime<chrono::Utc>) -> Self {
        use chrono::SubsecRound;
        Self(dt.trunc_subsecs(0))
    }

    /// Get the underlying datetime.
    pub fn as_datetime(&self) -> &chrono::DateTime<chrono::Utc> {
        &self.0
    }
}

impl TryFrom<String> for UtcTimestamp {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let dt = chrono::DateTime::parse_from_rfc3339(&s)
            .map_err(|e| TypeError::InvalidTimestamp(format!("{}: {}", s, e)))?;
        Ok(Self::from_datetime(dt.with_timezone(&chrono::Utc)))
    }
}

impl From<UtcTimestamp> for String {
    fn from(ts: UtcTimestamp) -> Self {
        ts.to_string()
    }
}

impl std::fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%SZ"))
    }
}

/// A SHA-256 content hash in lowercase hex.
///
/// Snapshots record file contents as hashes; diffing compares hashes by
/// path key, never raw bytes.
///
/// # Example
///
/// ```
/// use planloom::core::types::ContentHash;
///
/// let a = ContentHash::compute(b"hello");
/// let b = ContentHash::compute(b"hello");
/// assert_eq!(a, b);
/// assert_eq!(a.as_str().len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(String);

impl ContentHash {
    /// Compute the hash of a byte slice.
    pub fn compute(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(hex::encode(hasher.finalize()))
    }

    /// Get the hash as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
