use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::AssignmentError;
use crate::identity::MemberId;

/// Resolves which provider handles an activity.
///
/// The mapping file is re-read on every call so edits apply without a restart.
/// A missing entry, unreadable file or malformed content all resolve to the
/// fallback identity; a broken mapping must never block the reservation flow.
#[derive(Debug, Clone)]
pub struct AssignmentResolver {
    path: PathBuf,
    fallback: MemberId,
}

impl AssignmentResolver {
    pub fn new(path: impl Into<PathBuf>, fallback: MemberId) -> Self {
        Self {
            path: path.into(),
            fallback,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn fallback(&self) -> MemberId {
        self.fallback
    }

    pub fn provider_for(&self, activity: &str) -> MemberId {
        self.load_mapping()
            .ok()
            .and_then(|mapping| mapping.get(activity).copied())
            .unwrap_or(self.fallback)
    }

    /// Distinct providers named by the mapping file, empty if it is unusable.
    pub fn providers(&self) -> Vec<MemberId> {
        let mut providers: Vec<MemberId> = self
            .load_mapping()
            .map(|mapping| mapping.into_values().collect())
            .unwrap_or_default();
        providers.sort();
        providers.dedup();
        providers
    }

    /// Strict read of the mapping file, for callers that want to report why it
    /// is unusable.
    pub fn load_mapping(&self) -> Result<BTreeMap<String, MemberId>, AssignmentError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| AssignmentError::Io {
            path: self.path.clone(),
            source,
        })?;
        parse_mapping(&raw)
    }
}

/// Parse `{"activity": identity}`. Identities may be JSON integers or numeric
/// strings; one bad entry invalidates the whole table.
pub fn parse_mapping(raw: &str) -> Result<BTreeMap<String, MemberId>, AssignmentError> {
    let entries: serde_json::Map<String, Value> = serde_json::from_str(raw)?;
    entries
        .into_iter()
        .map(|(activity, value)| {
            let id = match &value {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            };
            match id {
                Some(id) => Ok((activity, MemberId(id))),
                None => Err(AssignmentError::InvalidIdentity {
                    activity,
                    value: value.to_string(),
                }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: MemberId = MemberId(342021125800198144);

    fn scratch_file(contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("passage-assign-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("passeurs.json");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn mapped_activity_resolves_to_provider() {
        let path = scratch_file(r#"{"Tengu": 111, "Tanu": "222"}"#);
        let resolver = AssignmentResolver::new(&path, OWNER);
        assert_eq!(resolver.provider_for("Tengu"), MemberId(111));
        assert_eq!(resolver.provider_for("Tanu"), MemberId(222));
    }

    #[test]
    fn unknown_activity_falls_back_to_owner() {
        let path = scratch_file(r#"{"Tengu": 111}"#);
        let resolver = AssignmentResolver::new(&path, OWNER);
        assert_eq!(resolver.provider_for("Kimbo"), OWNER);
    }

    #[test]
    fn missing_file_falls_back_to_owner() {
        let resolver = AssignmentResolver::new("/nonexistent/passeurs.json", OWNER);
        assert_eq!(resolver.provider_for("Tengu"), OWNER);
        assert!(resolver.providers().is_empty());
        assert!(matches!(
            resolver.load_mapping(),
            Err(AssignmentError::Io { .. })
        ));
    }

    #[test]
    fn malformed_file_falls_back_to_owner() {
        let path = scratch_file("not json");
        let resolver = AssignmentResolver::new(&path, OWNER);
        assert_eq!(resolver.provider_for("Tengu"), OWNER);

        let path = scratch_file(r#"{"Tengu": "abc"}"#);
        let resolver = AssignmentResolver::new(&path, OWNER);
        assert_eq!(resolver.provider_for("Tengu"), OWNER);
    }

    #[test]
    fn mapping_is_reread_on_each_call() {
        let path = scratch_file(r#"{"Tengu": 111}"#);
        let resolver = AssignmentResolver::new(&path, OWNER);
        assert_eq!(resolver.provider_for("Tengu"), MemberId(111));
        std::fs::write(&path, r#"{"Tengu": 333}"#).unwrap();
        assert_eq!(resolver.provider_for("Tengu"), MemberId(333));
    }

    #[test]
    fn providers_are_distinct() {
        let path = scratch_file(r#"{"Tengu": 111, "Tanu": 111, "Kimbo": 5}"#);
        let resolver = AssignmentResolver::new(&path, OWNER);
        assert_eq!(resolver.providers(), vec![MemberId(5), MemberId(111)]);
    }
}
