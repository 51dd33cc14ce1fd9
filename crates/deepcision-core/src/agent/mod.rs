//! Agents and the role manager that creates them.
//!
//! An [`Agent`] is a live handle bound to exactly one [`RoleConfig`]. The
//! [`RoleManager`] owns the loaded role definitions and the set of active
//! agents.
//!
//! [`RoleConfig`]: deepcision_types::role::RoleConfig

pub mod manager;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use deepcision_types::role::RoleConfig;

pub use manager::{RoleManager, RoleManagerState, RoleSource};

/// Unique identifier for an agent (UUID v7, time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub Uuid);

impl AgentId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AgentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[derive(Debug)]
struct AgentInner {
    id: AgentId,
    role: RoleConfig,
    created_at: DateTime<Utc>,
    gate: Mutex<()>,
    terminated: AtomicBool,
}

/// A live handle speaking through one role.
///
/// Cheap to clone; clones share identity, the serialization gate and the
/// terminated flag.
#[derive(Debug, Clone)]
pub struct Agent {
    inner: Arc<AgentInner>,
}

/// Held for the duration of a call through a non-concurrent agent.
pub type AgentTurn<'a> = MutexGuard<'a, ()>;

impl Agent {
    pub fn new(role: RoleConfig) -> Self {
        Self {
            inner: Arc::new(AgentInner {
                id: AgentId::new(),
                role,
                created_at: Utc::now(),
                gate: Mutex::new(()),
                terminated: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> AgentId {
        self.inner.id
    }

    pub fn role(&self) -> &RoleConfig {
        &self.inner.role
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    pub fn is_active(&self) -> bool {
        !self.inner.terminated.load(Ordering::Acquire)
    }

    /// Mark the agent terminated. Returns `false` if it already was.
    pub fn terminate(&self) -> bool {
        !self.inner.terminated.swap(true, Ordering::AcqRel)
    }

    /// Wait for this agent's turn to speak.
    ///
    /// Non-concurrent roles get a guard that serializes callers on this agent;
    /// concurrent roles return `None` immediately.
    pub async fn turn(&self) -> Option<AgentTurn<'_>> {
        if self.inner.role.concurrent {
            None
        } else {
            Some(self.inner.gate.lock().await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepcision_types::role::PromptTemplate;

    pub(crate) fn role(name: &str, concurrent: bool) -> RoleConfig {
        RoleConfig {
            name: name.into(),
            description: "helps".into(),
            api_type: "deepseek".into(),
            prompt_template: PromptTemplate::parse("{question}").unwrap(),
            concurrent,
            temperature: None,
            max_tokens: None,
        }
    }

    #[test]
    fn test_agent_id_roundtrip() {
        let id = AgentId::new();
        let parsed: AgentId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<AgentId>().is_err());
    }

    #[test]
    fn test_terminate_once() {
        let agent = Agent::new(role("a", false));
        assert!(agent.is_active());
        assert!(agent.terminate());
        assert!(!agent.terminate());
        assert!(!agent.is_active());
    }

    #[test]
    fn test_clones_share_state() {
        let agent = Agent::new(role("a", true));
        let clone = agent.clone();
        clone.terminate();
        assert_eq!(agent.id(), clone.id());
        assert!(!agent.is_active());
    }

    #[tokio::test]
    async fn test_concurrent_role_has_no_gate() {
        let agent = Agent::new(role("a", true));
        let first = agent.turn().await;
        let second = agent.turn().await;
        assert!(first.is_none());
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_non_concurrent_role_serializes() {
        let agent = Agent::new(role("a", false));
        let held = agent.turn().await;
        assert!(held.is_some());

        let waiter = agent.clone();
        let pending = tokio::time::timeout(std::time::Duration::from_millis(50), async move {
            waiter.turn().await.is_some()
        })
        .await;
        assert!(pending.is_err(), "second caller must wait for the first");

        drop(held);
        assert!(agent.turn().await.is_some());
    }
}
