//! Typed identifiers for documents and editing sessions.
//!
//! Both wrap UUIDv7 (time-ordered, globally unique). They display as standard
//! UUID text for logging; the `short()` form (first 8 hex chars) is for
//! human-facing output only and never used as a lookup key.
//!
//! Block identifiers are different: they are opaque strings that must survive
//! a storage round-trip verbatim, so they live in [`crate::block::BlockId`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// A document identifier (UUIDv7), assigned by the store at creation.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(uuid::Uuid);

/// An editing session identifier (UUIDv7). One per opened editor view.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(uuid::Uuid);

// ── Shared behavior ─────────────────────────────────────────────────────────

macro_rules! impl_typed_id {
    ($T:ident, $name:literal) => {
        impl $T {
            /// Create a new time-ordered ID (UUIDv7).
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7())
            }

            /// First 8 hex characters, for human display only (not lookup).
            pub fn short(&self) -> String {
                self.0.as_simple().to_string()[..8].to_string()
            }

            /// Full 32-character hex string (no hyphens).
            pub fn to_hex(&self) -> String {
                self.0.as_simple().to_string()
            }

            /// Parse from a hex string (32 chars, no hyphens) or standard UUID format.
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                uuid::Uuid::parse_str(s).map(Self)
            }

            /// Check if a query string matches this ID by hex prefix.
            pub fn matches_hex_prefix(&self, prefix: &str) -> bool {
                self.to_hex().starts_with(prefix)
            }
        }

        impl Default for $T {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $T {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                // Full UUID with hyphens for log readability
                write!(f, "{}", self.0)
            }
        }

        impl fmt::Debug for $T {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $name, self.short())
            }
        }
    };
}

impl_typed_id!(DocumentId, "DocumentId");
impl_typed_id!(SessionId, "SessionId");

// ── Prefix resolution ───────────────────────────────────────────────────────

/// Error from document prefix resolution.
#[derive(Debug, thiserror::Error)]
pub enum PrefixError {
    #[error("no document matches '{0}'")]
    NoMatch(String),
    #[error("ambiguous prefix '{prefix}': matches {candidates:?}")]
    Ambiguous {
        prefix: String,
        candidates: Vec<String>,
    },
}

/// Resolve a user-typed query to a single document ID.
///
/// Accepts a full UUID (with or without hyphens) or a unique hex prefix.
pub fn resolve_document_prefix(
    ids: impl IntoIterator<Item = DocumentId>,
    query: &str,
) -> Result<DocumentId, PrefixError> {
    let ids: Vec<DocumentId> = ids.into_iter().collect();

    if let Ok(exact) = DocumentId::parse(query) {
        if ids.contains(&exact) {
            return Ok(exact);
        }
    }

    let needle = query.replace('-', "").to_ascii_lowercase();
    let matches: Vec<DocumentId> = ids
        .into_iter()
        .filter(|id| !needle.is_empty() && id.matches_hex_prefix(&needle))
        .collect();

    match matches.as_slice() {
        [] => Err(PrefixError::NoMatch(query.to_string())),
        [one] => Ok(*one),
        many => Err(PrefixError::Ambiguous {
            prefix: query.to_string(),
            candidates: many.iter().map(|id| id.short()).collect(),
        }),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_distinct() {
        let a = DocumentId::new();
        let b = DocumentId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_short_is_eight_hex_chars() {
        let id = DocumentId::new();
        assert_eq!(id.short().len(), 8);
        assert!(id.to_hex().starts_with(&id.short()));
    }

    #[test]
    fn test_parse_accepts_hex_and_hyphenated() {
        let id = DocumentId::new();
        assert_eq!(DocumentId::parse(&id.to_hex()).unwrap(), id);
        assert_eq!(DocumentId::parse(&id.to_string()).unwrap(), id);
        assert!(DocumentId::parse("not-a-uuid").is_err());
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = DocumentId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
        let parsed: DocumentId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    // ── Prefix resolution ───────────────────────────────────────────────

    #[test]
    fn test_resolve_unique_prefix() {
        let a = DocumentId::new();
        let found = resolve_document_prefix([a], &a.short()).unwrap();
        assert_eq!(found, a);
    }

    #[test]
    fn test_resolve_full_id() {
        let a = DocumentId::new();
        let b = DocumentId::new();
        let found = resolve_document_prefix([a, b], &b.to_string()).unwrap();
        assert_eq!(found, b);
    }

    #[test]
    fn test_resolve_no_match() {
        let a = DocumentId::parse("00000000-0000-7000-8000-000000000001").unwrap();
        let err = resolve_document_prefix([a], "ffff").unwrap_err();
        assert!(matches!(err, PrefixError::NoMatch(_)));
    }

    #[test]
    fn test_resolve_ambiguous() {
        let a = DocumentId::parse("abcd0000-0000-7000-8000-000000000001").unwrap();
        let b = DocumentId::parse("abcd0000-0000-7000-8000-000000000002").unwrap();
        let err = resolve_document_prefix([a, b], "abcd").unwrap_err();
        assert!(matches!(err, PrefixError::Ambiguous { .. }));
    }

    #[test]
    fn test_resolve_empty_query_matches_nothing() {
        let a = DocumentId::new();
        assert!(resolve_document_prefix([a], "").is_err());
    }
}
