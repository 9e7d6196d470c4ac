//! store::guard
//!
//! Policy decisions for filesystem, shell, and network operations.
//!
//! Policies come from [`GuardConfig`]; the evaluator itself is stateless.
//! A decision never blocks anything by itself: callers are expected to
//! honor `allowed` and to take a snapshot first when `require_snapshot`
//! is set.

use serde::Serialize;

use crate::core::config::GuardConfig;

/// The two guarded filesystem operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsOp {
    Read,
    Write,
}

impl std::str::FromStr for FsOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(FsOp::Read),
            "write" => Ok(FsOp::Write),
            other => Err(format!("invalid fs op: {}", other)),
        }
    }
}

/// A guard decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuardDecision {
    pub allowed: bool,
    pub require_snapshot: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl GuardDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            require_snapshot: false,
            reason: None,
        }
    }

    fn deny(reason: String) -> Self {
        Self {
            allowed: false,
            require_snapshot: false,
            reason: Some(reason),
        }
    }

    fn allow_with_snapshot(reason: String) -> Self {
        Self {
            allowed: true,
            require_snapshot: true,
            reason: Some(reason),
        }
    }
}

/// The policy evaluator.
#[derive(Debug, Default)]
pub struct GuardEvaluator {
    config: GuardConfig,
}

impl GuardEvaluator {
    /// Create an evaluator over the given policy.
    pub fn new(config: GuardConfig) -> Self {
        Self { config }
    }

    /// The active policy.
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Check a filesystem operation.
    ///
    /// Denied path prefixes veto both reads and writes; large writes are
    /// allowed but require a snapshot first.
    pub fn fs_guard(&self, op: FsOp, path: &str, size: u64) -> GuardDecision {
        if let Some(prefix) = self
            .config
            .fs
            .deny_prefixes
            .iter()
            .find(|prefix| path.starts_with(prefix.as_str()))
        {
            return GuardDecision::deny(format!("path under denied prefix '{}'", prefix));
        }
        if op == FsOp::Write && size >= self.config.fs.write_snapshot_bytes {
            return GuardDecision::allow_with_snapshot(format!(
                "write of {} bytes exceeds snapshot threshold",
                size
            ));
        }
        GuardDecision::allow()
    }

    /// Check a shell command line.
    pub fn shell_guard(&self, command: &str) -> GuardDecision {
        if let Some(pattern) = self
            .config
            .shell
            .deny_patterns
            .iter()
            .find(|pattern| command.contains(pattern.as_str()))
        {
            return GuardDecision::deny(format!("command matches denied pattern '{}'", pattern));
        }
        if let Some(pattern) = self
            .config
            .shell
            .snapshot_patterns
            .iter()
            .find(|pattern| command.contains(pattern.as_str()))
        {
            return GuardDecision::allow_with_snapshot(format!(
                "command matches destructive pattern '{}'",
                pattern
            ));
        }
        GuardDecision::allow()
    }

    /// Check a network host.
    ///
    /// Deny entries match exactly or as a domain suffix. A non-empty allow
    /// list turns the policy into a whitelist.
    pub fn net_guard(&self, host: &str) -> GuardDecision {
        let matches =
            |entry: &str| host == entry || host.ends_with(&format!(".{}", entry));
        if let Some(entry) = self
            .config
            .net
            .deny_hosts
            .iter()
            .find(|e| matches(e.as_str()))
        {
            return GuardDecision::deny(format!("host matches denied entry '{}'", entry));
        }
        if !self.config.net.allow_hosts.is_empty()
            && !self.config.net.allow_hosts.iter().any(|e| matches(e.as_str()))
        {
            return GuardDecision::deny("host not on the allow list".to_string());
        }
        GuardDecision::allow()
    }
}
