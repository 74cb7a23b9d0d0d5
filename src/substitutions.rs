use indexmap::IndexMap;

use crate::error::{GcbError, Result};

/// Substitution variables handed to `gcloud builds submit --substitutions`.
///
/// Keys are unique; re-inserting a key replaces its value in place, so the
/// rendered argument keeps the order in which keys were first added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionSet {
    entries: IndexMap<String, String>,
}

impl SubstitutionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// Inserts `flag` when `enabled`, otherwise an empty value.
    pub fn insert_flag(&mut self, key: &str, enabled: bool, flag: &str) {
        self.insert(key, if enabled { flag } else { "" });
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Renders the set as `KEY=VALUE,KEY=VALUE`.
    ///
    /// gcloud splits the argument on commas, so a value containing one is rejected.
    pub fn to_arg(&self) -> Result<String> {
        if let Some((key, value)) = self.iter().find(|(_, v)| v.contains(',')) {
            return Err(GcbError::Config(format!(
                "substitution {key}='{value}' must not contain ','"
            )));
        }

        Ok(self
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_in_insertion_order() {
        let mut set = SubstitutionSet::new();
        set.insert("_RELEASE_BRANCH", "release-1.18");
        set.insert("_NOMOCK", "");
        set.insert("_BUILDVERSION", "--buildversion=v1.18.3+abc");

        assert_eq!(
            set.to_arg().unwrap(),
            "_RELEASE_BRANCH=release-1.18,_NOMOCK=,_BUILDVERSION=--buildversion=v1.18.3+abc"
        );
    }

    #[test]
    fn reinserting_replaces_value_and_keeps_position() {
        let mut set = SubstitutionSet::new();
        set.insert("_A", "1");
        set.insert("_B", "2");
        assert_eq!(set.insert("_A", "3"), Some("1".to_string()));

        assert_eq!(set.len(), 2);
        assert_eq!(set.to_arg().unwrap(), "_A=3,_B=2");
    }

    #[test]
    fn insert_flag_uses_empty_value_when_disabled() {
        let mut set = SubstitutionSet::new();
        set.insert_flag("_OFFICIAL", true, "--official");
        set.insert_flag("_RC", false, "--rc");

        assert_eq!(set.get("_OFFICIAL"), Some("--official"));
        assert_eq!(set.get("_RC"), Some(""));
    }

    #[test]
    fn rejects_values_with_separator() {
        let mut set = SubstitutionSet::new();
        set.insert("_TOOL_BRANCH", "a,b");
        assert!(set.to_arg().is_err());
    }
}
