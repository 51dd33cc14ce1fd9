//! Tokenizer registry with lazily-constructed singleton instances.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use deepcision_types::error::TokenizerError;

use super::{Tokenizer, TokenizerOptions};

/// Builds a tokenizer instance from options.
pub type TokenizerFactory =
    Arc<dyn Fn(&TokenizerOptions) -> Result<Arc<dyn Tokenizer>, TokenizerError> + Send + Sync>;

/// Registry mapping tokenizer names to factories and cached instances.
///
/// Factories are registered through `&mut self` at startup. Instances are
/// built on first lookup and reused for every later lookup of the same name;
/// options passed after the first construction are ignored.
pub struct TokenizerService {
    factories: HashMap<String, TokenizerFactory>,
    instances: Mutex<HashMap<String, Arc<dyn Tokenizer>>>,
}

impl TokenizerService {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            instances: Mutex::new(HashMap::new()),
        }
    }

    /// Register `factory` under `name`, replacing any previous registration
    /// and evicting its cached instance.
    pub fn register_tokenizer<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&TokenizerOptions) -> Result<Arc<dyn Tokenizer>, TokenizerError> + Send + Sync + 'static,
    {
        let name = name.into();
        self.instances
            .get_mut()
            .expect("tokenizer cache lock poisoned")
            .remove(&name);
        self.factories.insert(name, Arc::new(factory));
    }

    /// Get the singleton tokenizer for `name`, constructing it on first use.
    pub fn get_tokenizer(
        &self,
        name: &str,
        options: &TokenizerOptions,
    ) -> Result<Arc<dyn Tokenizer>, TokenizerError> {
        let factory = self.factories.get(name).ok_or_else(|| {
            TokenizerError::InvalidArgument(format!(
                "Tokenizer '{name}' not found. Available: {}",
                self.names().join(", ")
            ))
        })?;

        if let Some(existing) = self.cached(name) {
            return Ok(existing);
        }

        // Constructed outside the lock; if callers race, the first insert wins.
        tracing::debug!(tokenizer = name, "constructing tokenizer");
        let built = factory(options)?;
        let mut instances = self.instances.lock().expect("tokenizer cache lock poisoned");
        Ok(instances.entry(name.to_string()).or_insert(built).clone())
    }

    fn cached(&self, name: &str) -> Option<Arc<dyn Tokenizer>> {
        self.instances
            .lock()
            .expect("tokenizer cache lock poisoned")
            .get(name)
            .cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

impl Default for TokenizerService {
    fn default() -> Self {
        Self::new()
    }
}
