//! Drug → primary pharmacogene mapping with alias resolution.

use std::collections::{BTreeMap, HashMap};

use pharmaguard_common::{Gene, PharmaGuardError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrugInfo {
    /// Canonical uppercase name, e.g. "CLOPIDOGREL"
    pub name: String,
    pub gene: Gene,
    pub drug_class: String,
    /// Short mechanism narrative used in explanations.
    pub pathway: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Trim and uppercase a user-supplied drug name.
pub fn normalize_drug_name(name: &str) -> String {
    name.trim().to_uppercase()
}

#[derive(Debug, Default)]
pub struct DrugTable {
    drugs: BTreeMap<String, DrugInfo>,
    /// alias → canonical name
    aliases: HashMap<String, String>,
}

impl DrugTable {
    /// Every alias must resolve to exactly one canonical drug and must not
    /// shadow another drug's canonical name.
    pub fn from_entries(entries: Vec<DrugInfo>) -> Result<Self> {
        let mut table = Self::default();

        for mut info in entries {
            info.name = normalize_drug_name(&info.name);
            if table.drugs.contains_key(&info.name) {
                return Err(PharmaGuardError::KnowledgeBase(format!("duplicate drug: {}", info.name)));
            }
            table.drugs.insert(info.name.clone(), info);
        }

        for info in table.drugs.values() {
            for alias in &info.aliases {
                let alias = normalize_drug_name(alias);
                if alias == info.name {
                    continue;
                }
                if table.drugs.contains_key(&alias) {
                    return Err(PharmaGuardError::KnowledgeBase(format!(
                        "alias {alias} of {} shadows a canonical drug name",
                        info.name
                    )));
                }
                if let Some(existing) = table.aliases.insert(alias.clone(), info.name.clone()) {
                    if existing != info.name {
                        return Err(PharmaGuardError::KnowledgeBase(format!(
                            "alias {alias} maps to both {existing} and {}",
                            info.name
                        )));
                    }
                }
            }
        }

        Ok(table)
    }

    /// Canonical name for a drug or one of its aliases. Idempotent on
    /// canonical names.
    pub fn canonical_name(&self, name: &str) -> Option<&str> {
        let key = normalize_drug_name(name);
        if let Some((canonical, _)) = self.drugs.get_key_value(&key) {
            return Some(canonical.as_str());
        }
        self.aliases.get(&key).map(String::as_str)
    }

    /// Canonical names only; aliases miss.
    pub fn get(&self, name: &str) -> Option<&DrugInfo> {
        self.drugs.get(&normalize_drug_name(name))
    }

    pub fn resolve(&self, name: &str) -> Option<&DrugInfo> {
        self.canonical_name(name).and_then(|c| self.drugs.get(c))
    }

    /// Canonical drugs in name order.
    pub fn iter(&self) -> impl Iterator<Item = &DrugInfo> {
        self.drugs.values()
    }

    pub fn len(&self) -> usize {
        self.drugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drugs.is_empty()
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }
}
