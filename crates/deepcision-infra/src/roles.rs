//! Role template loading.
//!
//! Role templates are a JSON object mapping role names to [`RoleConfig`]s:
//!
//! ```json
//! {
//!   "analyst": {
//!     "description": "reviews data",
//!     "api_type": "deepseek",
//!     "prompt_template": "Question: {question}",
//!     "concurrent": false,
//!     "temperature": 0.2
//!   }
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use deepcision_core::agent::manager::RoleSource;
use deepcision_types::config::AppConfig;
use deepcision_types::error::RoleError;
use deepcision_types::role::RoleConfig;

/// Role templates read from a JSON file.
#[derive(Debug, Clone)]
pub struct JsonRoleTemplates {
    path: PathBuf,
}

impl JsonRoleTemplates {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RoleSource for JsonRoleTemplates {
    async fn load(&self) -> Result<HashMap<String, RoleConfig>, RoleError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| RoleError::Read(format!("{}: {e}", self.path.display())))?;
        let roles: HashMap<String, RoleConfig> = serde_json::from_str(&content)
            .map_err(|e| RoleError::Parse(format!("{}: {e}", self.path.display())))?;
        tracing::debug!(path = %self.path.display(), count = roles.len(), "read role templates");
        Ok(roles)
    }
}

/// Roles from an [`AppConfig`]: the `role_templates` file, if any, with
/// inline `roles` layered on top. Inline roles win on name collisions.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredRoles {
    file: Option<JsonRoleTemplates>,
    inline: BTreeMap<String, RoleConfig>,
}

impl ConfiguredRoles {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            file: config.role_templates.as_deref().map(JsonRoleTemplates::new),
            inline: config.roles.clone(),
        }
    }
}

impl RoleSource for ConfiguredRoles {
    async fn load(&self) -> Result<HashMap<String, RoleConfig>, RoleError> {
        let mut roles = match &self.file {
            Some(file) => file.load().await?,
            None => HashMap::new(),
        };
        for (name, role) in &self.inline {
            if roles.insert(name.clone(), role.clone()).is_some() {
                tracing::debug!(role = %name, "inline role overrides template file");
            }
        }
        Ok(roles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepcision_core::agent::manager::{RoleManager, RoleManagerState};
    use deepcision_types::role::PromptTemplate;
    use tempfile::TempDir;

    const TEMPLATES: &str = r#"{
        "analyst": {
            "name": "Analyst",
            "description": "reviews data",
            "api_type": "deepseek",
            "prompt_template": "Question: {question}",
            "concurrent": false,
            "temperature": 0.2,
            "max_tokens": 300
        },
        "critic": {
            "description": "finds flaws",
            "api_type": "openrouter",
            "prompt_template": "Critique: {question}"
        }
    }"#;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_load_json_templates() {
        let dir = TempDir::new().unwrap();
        let source = JsonRoleTemplates::new(write(&dir, "roles.json", TEMPLATES));

        let roles = source.load().await.unwrap();
        assert_eq!(roles.len(), 2);
        let analyst = &roles["analyst"];
        assert_eq!(analyst.name, "Analyst");
        assert_eq!(analyst.temperature, Some(0.2));
        assert_eq!(analyst.prompt_template.render("What is X?"), "Question: What is X?");
        assert!(!roles["critic"].concurrent);
        assert_eq!(roles["critic"].max_tokens, None);
    }

    #[tokio::test]
    async fn test_missing_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        let err = JsonRoleTemplates::new(dir.path().join("absent.json"))
            .load()
            .await
            .unwrap_err();
        assert!(matches!(err, RoleError::Read(_)));
    }

    #[tokio::test]
    async fn test_bad_placeholder_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "roles.json",
            r#"{"x": {"api_type": "deepseek", "prompt_template": "About {topic}"}}"#,
        );
        let err = JsonRoleTemplates::new(path).load().await.unwrap_err();
        assert!(matches!(err, RoleError::Parse(_)));
        assert!(err.to_string().contains("topic"));
    }

    #[tokio::test]
    async fn test_role_manager_from_file() {
        let dir = TempDir::new().unwrap();
        let source = JsonRoleTemplates::new(write(&dir, "roles.json", TEMPLATES));

        let mut manager = RoleManager::new();
        assert!(manager.load_templates(&source).await);
        assert_eq!(manager.state(), RoleManagerState::Loaded);
        assert_eq!(manager.role_names(), vec!["analyst", "critic"]);
        assert_eq!(manager.get_role("critic").unwrap().name, "critic");

        let broken = JsonRoleTemplates::new(write(&dir, "broken.json", "{ not json"));
        assert!(!manager.load_templates(&broken).await);
        assert_eq!(manager.role_names().len(), 2);
    }

    #[tokio::test]
    async fn test_inline_roles_override_file() {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig {
            role_templates: Some(write(&dir, "roles.json", TEMPLATES)),
            ..Default::default()
        };
        config.roles.insert(
            "critic".into(),
            RoleConfig {
                name: "Critic".into(),
                description: "inline".into(),
                api_type: "deepseek".into(),
                prompt_template: PromptTemplate::parse("{question}").unwrap(),
                concurrent: true,
                temperature: None,
                max_tokens: None,
            },
        );

        let roles = ConfiguredRoles::new(&config).load().await.unwrap();
        assert_eq!(roles.len(), 2);
        assert_eq!(roles["critic"].description, "inline");
        assert!(roles["critic"].concurrent);
    }

    #[tokio::test]
    async fn test_no_sources_is_empty() {
        let roles = ConfiguredRoles::new(&AppConfig::default()).load().await.unwrap();
        assert!(roles.is_empty());
    }
}
