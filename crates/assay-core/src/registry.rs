//! Rule registry and recipes
//!
//! Rules are registered once at startup. A [`Recipe`] is an immutable
//! snapshot of the registry taken with [`RuleRegistry::recipe`]; it is cheap
//! to clone and safe to share between threads.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{Result, RewriteError};
use crate::template::{Rule, RuleDescriptor};

/// Ordered, named collection of rules
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    id: String,
    name: String,
    description: String,
    rules: IndexMap<String, Arc<Rule>>,
}

impl RuleRegistry {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            rules: IndexMap::new(),
        }
    }

    /// Append a rule; ids must be unique within the registry
    pub fn register(&mut self, rule: Rule) -> Result<()> {
        self.insert(Arc::new(rule))
    }

    pub fn register_all(&mut self, rules: impl IntoIterator<Item = Rule>) -> Result<()> {
        for rule in rules {
            self.register(rule)?;
        }
        Ok(())
    }

    /// Append every rule of `recipe`, in its order
    pub fn register_recipe(&mut self, recipe: &Recipe) -> Result<()> {
        for rule in recipe.rules() {
            self.insert(Arc::clone(rule))?;
        }
        Ok(())
    }

    fn insert(&mut self, rule: Arc<Rule>) -> Result<()> {
        if self.rules.contains_key(&rule.id) {
            return Err(RewriteError::DuplicateRule {
                id: rule.id.clone(),
            });
        }
        debug!("Registered rule {} in {}", rule.id, self.id);
        self.rules.insert(rule.id.clone(), rule);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.get(id).map(|rule| rule.as_ref())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Snapshot of the rules registered so far
    pub fn recipe(&self) -> Recipe {
        Recipe {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            rules: self.rules.values().cloned().collect(),
        }
    }
}

/// Immutable ordered list of rules applied together to a fixed point
#[derive(Debug, Clone)]
pub struct Recipe {
    id: String,
    name: String,
    description: String,
    rules: Arc<[Arc<Rule>]>,
}

impl Recipe {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn rules(&self) -> &[Arc<Rule>] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Recipe with the single rule `id`, if present
    pub fn only(&self, id: &str) -> Option<Recipe> {
        let rule = self.rules.iter().find(|rule| rule.id == id)?;
        Some(Recipe {
            id: rule.id.clone(),
            name: rule.name.clone(),
            description: rule.description.clone(),
            rules: Arc::from(vec![Arc::clone(rule)]),
        })
    }

    pub fn descriptor(&self) -> RecipeDescriptor {
        RecipeDescriptor {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            rules: self.rules.iter().map(|rule| rule.descriptor()).collect(),
        }
    }
}

/// Serializable summary of a recipe for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
    pub rules: Vec<RuleDescriptor>,
}
