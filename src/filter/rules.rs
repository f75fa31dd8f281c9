//! Rule storage and matching.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use super::types::{Request, Rule};
use crate::error::RuleError;

/// Trait for rule store implementations.
///
/// Implementations must give `match_any` and `rules` shared access and make
/// `add_rule` and `remove_rule` exclusive, so a reader never observes a
/// partially applied mutation.
pub trait RuleStore: Send + Sync {
    /// Insert a rule, failing if its id is already stored.
    fn add_rule(&self, rule: Rule) -> Result<(), RuleError>;

    /// Remove the rule with the given id.
    fn remove_rule(&self, id: &str) -> Result<(), RuleError>;

    /// Check whether any stored rule matches the request.
    fn match_any(&self, request: &Request) -> bool;

    /// Snapshot of all stored rules, ordered by id.
    fn rules(&self) -> Vec<Rule>;

    /// Number of stored rules.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory rule store guarded by a single read-write lock.
#[derive(Debug, Default)]
pub struct InMemoryRuleStore {
    rules: RwLock<HashMap<String, Rule>>,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RuleStore for InMemoryRuleStore {
    fn add_rule(&self, rule: Rule) -> Result<(), RuleError> {
        let mut rules = self.rules.write();
        if rules.contains_key(&rule.id) {
            return Err(RuleError::DuplicateId(rule.id));
        }
        rules.insert(rule.id.clone(), rule);
        Ok(())
    }

    fn remove_rule(&self, id: &str) -> Result<(), RuleError> {
        match self.rules.write().remove(id) {
            Some(_) => Ok(()),
            None => Err(RuleError::NotFound(id.to_string())),
        }
    }

    fn match_any(&self, request: &Request) -> bool {
        let rules = self.rules.read();
        match rules.values().find(|rule| rule.matches(request)) {
            Some(rule) => {
                debug!(rule_id = %rule.id, "Request matched rule");
                true
            }
            None => false,
        }
    }

    fn rules(&self) -> Vec<Rule> {
        let mut rules: Vec<Rule> = self.rules.read().values().cloned().collect();
        rules.sort_by(|a, b| a.id.cmp(&b.id));
        rules
    }

    fn len(&self) -> usize {
        self.rules.read().len()
    }
}
