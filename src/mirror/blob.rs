//! The metafield blob: parsing, merging and serialization.
//!
//! The blob is a single JSON object keyed by badge id. Each value is a
//! snapshot of that badge's persisted fields. Entries this service does not
//! touch are carried through as opaque [`serde_json::Value`]s.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::BadgeRecord;

/// Mapping of badge id to badge snapshot.
pub type MirrorMap = Map<String, Value>;

/// Which change is being mirrored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    /// A badge was created.
    Create,
    /// A badge was replaced.
    Update,
    /// A badge was deleted.
    Delete,
}

impl SyncAction {
    /// Lowercase name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the stored blob.
///
/// A missing, empty, unparsable or non-object value yields an empty map so
/// that a corrupted mirror heals itself on the next write.
#[must_use]
pub fn parse(raw: Option<&str>) -> MirrorMap {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return MirrorMap::new();
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            tracing::warn!(
                kind = json_kind(&other),
                "metafield value is not a JSON object; starting from an empty mirror"
            );
            MirrorMap::new()
        }
        Err(e) => {
            tracing::warn!(error = %e, "unparsable metafield value; starting from an empty mirror");
            MirrorMap::new()
        }
    }
}

/// Builds the mirrored snapshot of a badge: its persisted fields without
/// the id or timestamps, with null fields dropped.
#[must_use]
pub fn snapshot(badge: &BadgeRecord) -> Value {
    let mut map = match serde_json::to_value(&badge.fields) {
        Ok(Value::Object(map)) => map,
        _ => MirrorMap::new(),
    };
    map.retain(|_, v| !v.is_null());
    Value::Object(map)
}

/// Applies one change to the mapping and returns it.
#[must_use]
pub fn apply(mut map: MirrorMap, badge: &BadgeRecord, action: SyncAction) -> MirrorMap {
    let key = badge.id.to_string();
    match action {
        SyncAction::Delete => {
            map.remove(&key);
        }
        SyncAction::Create | SyncAction::Update => {
            map.insert(key, snapshot(badge));
        }
    }
    map
}

/// Serializes the mapping as the single string value written remotely.
#[must_use]
pub fn serialize(map: MirrorMap) -> String {
    Value::Object(map).to_string()
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
