//! Entity identifiers.
//!
//! The in-memory backend numbers records with a per-kind counter while the
//! MongoDB backend uses `ObjectId`s. Route handlers only ever see [`EntityId`],
//! and each backend decides for itself whether a given id can name one of its
//! records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifier accepted and returned by every storage operation.
///
/// Serialized untagged: a JSON number for `Num`, a JSON string for `Str`.
/// Equality and hashing go through the canonical text form, so `Num(3)` and
/// `Str("3")` name the same record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Num(u64),
    Str(String),
}

impl EntityId {
    /// Integer form, if this id has one (`Num`, or an all-digit `Str`).
    pub fn as_int(&self) -> Option<u64> {
        match self {
            EntityId::Num(n) => Some(*n),
            EntityId::Str(s) => s.trim().parse().ok(),
        }
    }

    /// String form, if this id is not numeric.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            EntityId::Num(_) => None,
            EntityId::Str(s) => Some(s.as_str()),
        }
    }

    fn canonical(&self) -> String {
        match self {
            EntityId::Num(n) => n.to_string(),
            EntityId::Str(s) => match s.trim().parse::<u64>() {
                Ok(n) => n.to_string(),
                Err(_) => s.clone(),
            },
        }
    }
}

impl PartialEq for EntityId {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (EntityId::Num(a), EntityId::Num(b)) => a == b,
            _ => self.canonical() == other.canonical(),
        }
    }
}

impl Eq for EntityId {}

impl Hash for EntityId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Num(n) => write!(f, "{}", n),
            EntityId::Str(s) => f.write_str(s),
        }
    }
}

impl From<u64> for EntityId {
    fn from(n: u64) -> Self {
        EntityId::Num(n)
    }
}

/// Path segments: all-digit text becomes `Num`, anything else `Str`.
impl From<String> for EntityId {
    fn from(s: String) -> Self {
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = s.parse() {
                return EntityId::Num(n);
            }
        }
        EntityId::Str(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        EntityId::from(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_path_segment_parsing() {
        assert_eq!(EntityId::from("42"), EntityId::Num(42));
        assert!(matches!(EntityId::from("42"), EntityId::Num(42)));
        assert!(matches!(
            EntityId::from("65a1f0c2e4b0a1b2c3d4e5f6"),
            EntityId::Str(_)
        ));
        assert!(matches!(EntityId::from("-1"), EntityId::Str(_)));
        assert!(matches!(EntityId::from(""), EntityId::Str(_)));
    }

    #[test]
    fn test_numeric_and_string_forms_are_equal() {
        let a = EntityId::Num(7);
        let b = EntityId::Str("7".to_string());
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_untagged_serde() {
        let n: EntityId = serde_json::from_str("12").unwrap();
        assert!(matches!(n, EntityId::Num(12)));

        let s: EntityId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(s.as_str(), Some("abc"));

        assert_eq!(serde_json::to_string(&EntityId::Num(3)).unwrap(), "3");
        assert_eq!(
            serde_json::to_string(&EntityId::Str("x".into())).unwrap(),
            "\"x\""
        );
    }

    #[test]
    fn test_as_int() {
        assert_eq!(EntityId::Str(" 9 ".into()).as_int(), Some(9));
        assert_eq!(EntityId::Str("nine".into()).as_int(), None);
        assert_eq!(EntityId::Num(9).as_int(), Some(9));
    }
}
