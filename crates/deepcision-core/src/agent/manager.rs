//! Role manager: role definitions plus the active agent set.

use std::collections::HashMap;

use dashmap::DashMap;

use deepcision_types::error::RoleError;
use deepcision_types::role::RoleConfig;

use super::{Agent, AgentId};

/// Source of role definitions, keyed by role name.
///
/// Implementations live in deepcision-infra (e.g., `JsonRoleTemplates`).
pub trait RoleSource: Send + Sync {
    fn load(
        &self,
    ) -> impl std::future::Future<Output = Result<HashMap<String, RoleConfig>, RoleError>> + Send;
}

impl RoleSource for HashMap<String, RoleConfig> {
    async fn load(&self) -> Result<HashMap<String, RoleConfig>, RoleError> {
        Ok(self.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleManagerState {
    Unloaded,
    Loaded,
}

/// Loads role definitions and tracks the agents created from them.
///
/// Roles are loaded through `&mut self` at startup; agent creation and
/// termination only need `&self` so the manager can be shared behind an `Arc`.
#[derive(Debug)]
pub struct RoleManager {
    roles: HashMap<String, RoleConfig>,
    active: DashMap<AgentId, Agent>,
    state: RoleManagerState,
}

impl RoleManager {
    pub fn new() -> Self {
        Self {
            roles: HashMap::new(),
            active: DashMap::new(),
            state: RoleManagerState::Unloaded,
        }
    }

    pub fn state(&self) -> RoleManagerState {
        self.state
    }

    /// Load every role from `source`.
    ///
    /// Roles without a name take the map key. The whole load is rejected if
    /// any role fails validation. On failure the previously loaded roles and
    /// state are left untouched and `false` is returned.
    pub async fn load_templates(&mut self, source: &impl RoleSource) -> bool {
        let loaded = match source.load().await {
            Ok(roles) => roles,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load role templates");
                return false;
            }
        };

        let mut roles = HashMap::with_capacity(loaded.len());
        for (key, mut role) in loaded {
            if role.name.trim().is_empty() {
                role.name = key.clone();
            }
            if let Err(e) = role.validate() {
                tracing::warn!(role = %key, error = %e, "rejecting role templates");
                return false;
            }
            roles.insert(key, role);
        }

        tracing::info!(count = roles.len(), "role templates loaded");
        self.roles = roles;
        self.state = RoleManagerState::Loaded;
        true
    }

    pub fn get_role(&self, name: &str) -> Option<&RoleConfig> {
        self.roles.get(name)
    }

    /// All loaded role names, sorted.
    pub fn role_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.roles.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Create an active agent for `role_name`. Unknown roles yield `None`.
    pub fn create_agent(&self, role_name: &str) -> Option<Agent> {
        let role = self.get_role(role_name)?.clone();
        let agent = Agent::new(role);
        tracing::debug!(agent_id = %agent.id(), role = role_name, "agent created");
        self.active.insert(agent.id(), agent.clone());
        Some(agent)
    }

    pub fn get_agent(&self, id: &AgentId) -> Option<Agent> {
        self.active.get(id).map(|entry| entry.value().clone())
    }

    pub fn active_agents(&self) -> Vec<Agent> {
        self.active.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Terminate one agent. Unknown ids return `false`.
    pub fn terminate_agent(&self, id: &AgentId) -> bool {
        match self.active.remove(id) {
            Some((_, agent)) => {
                agent.terminate();
                tracing::debug!(agent_id = %id, "agent terminated");
                true
            }
            None => false,
        }
    }

    /// Terminate by the textual id. Unparseable ids count as unknown.
    pub fn terminate_agent_str(&self, id: &str) -> bool {
        id.parse::<AgentId>()
            .map(|id| self.terminate_agent(&id))
            .unwrap_or(false)
    }

    pub fn terminate_all_agents(&self) {
        let ids: Vec<AgentId> = self.active.iter().map(|entry| *entry.key()).collect();
        for id in ids {
            self.terminate_agent(&id);
        }
    }
}

impl Default for RoleManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tests::role;

    struct FailingSource;

    impl RoleSource for FailingSource {
        async fn load(&self) -> Result<HashMap<String, RoleConfig>, RoleError> {
            Err(RoleError::Read("role_template.json: not found".into()))
        }
    }

    fn source() -> HashMap<String, RoleConfig> {
        let mut roles = HashMap::new();
        roles.insert("analyst".to_string(), role("Analyst", false));
        roles.insert("critic".to_string(), role("", true));
        roles
    }

    async fn loaded() -> RoleManager {
        let mut manager = RoleManager::new();
        assert!(manager.load_templates(&source()).await);
        manager
    }

    #[tokio::test]
    async fn test_load_templates() {
        let manager = loaded().await;
        assert_eq!(manager.state(), RoleManagerState::Loaded);
        assert_eq!(manager.role_names(), vec!["analyst", "critic"]);
        assert_eq!(manager.get_role("critic").unwrap().name, "critic");
    }

    #[tokio::test]
    async fn test_load_failure_stays_unloaded() {
        let mut manager = RoleManager::new();
        assert!(!manager.load_templates(&FailingSource).await);
        assert_eq!(manager.state(), RoleManagerState::Unloaded);
        assert!(manager.get_role("analyst").is_none());
    }

    #[tokio::test]
    async fn test_invalid_role_rejects_load() {
        let mut roles = source();
        roles.get_mut("analyst").unwrap().temperature = Some(3.0);
        let mut manager = RoleManager::new();
        assert!(!manager.load_templates(&roles).await);
        assert_eq!(manager.state(), RoleManagerState::Unloaded);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_roles() {
        let mut manager = loaded().await;
        assert!(!manager.load_templates(&FailingSource).await);
        assert_eq!(manager.state(), RoleManagerState::Loaded);
        assert!(manager.get_role("analyst").is_some());
    }

    #[tokio::test]
    async fn test_create_agent_unknown_role() {
        let manager = loaded().await;
        assert!(manager.create_agent("unknown").is_none());
        assert_eq!(manager.active_count(), 0);
    }

    #[tokio::test]
    async fn test_create_and_terminate_agent() {
        let manager = loaded().await;
        let agent = manager.create_agent("analyst").unwrap();
        assert_eq!(agent.role().name, "Analyst");
        assert_eq!(manager.active_count(), 1);
        assert!(manager.get_agent(&agent.id()).is_some());

        assert!(manager.terminate_agent(&agent.id()));
        assert!(!agent.is_active());
        assert_eq!(manager.active_count(), 0);
        assert!(!manager.terminate_agent(&agent.id()));
    }

    #[tokio::test]
    async fn test_terminate_unknown_id() {
        let manager = loaded().await;
        assert!(!manager.terminate_agent(&AgentId::new()));
        assert!(!manager.terminate_agent_str("unknown-id"));
    }

    #[tokio::test]
    async fn test_terminate_all_agents() {
        let manager = loaded().await;
        let agents: Vec<Agent> = (0..3).map(|_| manager.create_agent("critic").unwrap()).collect();
        assert_eq!(manager.active_count(), 3);

        manager.terminate_all_agents();
        assert_eq!(manager.active_count(), 0);
        assert!(manager.active_agents().is_empty());
        assert!(agents.iter().all(|a| !a.is_active()));
    }
}
