//! Item key normalization.

use pantry_core::{DomainError, DomainResult, ValueObject};

/// Canonical key for a user-supplied item name: trimmed, then lowercased.
///
/// Never fails. A whitespace-only name yields an empty string; use
/// [`ItemKey::parse`] wherever the key addresses a record.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Normalized, non-empty item key (the record's identity in the store).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey(String);

impl ItemKey {
    /// Normalize a display name into a key, refusing names that normalize to
    /// nothing.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let key = normalize(raw);
        if key.is_empty() {
            return Err(DomainError::invalid_key(
                "item name is empty after trimming whitespace",
            ));
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl ValueObject for ItemKey {}

impl core::fmt::Display for ItemKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ItemKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ItemKey {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ItemKey> for String {
    fn from(value: ItemKey) -> Self {
        value.0
    }
}

impl core::str::FromStr for ItemKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize("  Kiwi "), "kiwi");
        assert_eq!(normalize("Apple"), "apple");
        assert_eq!(normalize("\tGreen Tea\n"), "green tea");
    }

    #[test]
    fn normalize_keeps_inner_whitespace() {
        assert_eq!(normalize(" Peanut  Butter "), "peanut  butter");
    }

    #[test]
    fn normalize_whitespace_only_is_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \t "), "");
    }

    #[test]
    fn parse_rejects_empty_key() {
        let err = ItemKey::parse("   ").unwrap_err();
        assert!(matches!(err, DomainError::InvalidKey(_)));
    }

    #[test]
    fn display_names_that_normalize_alike_are_one_key() {
        let a = ItemKey::parse("Apple").unwrap();
        let b = ItemKey::parse("  aPPLE").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "apple");
    }

    #[test]
    fn try_from_string_normalizes() {
        let key = ItemKey::try_from("  Pear ".to_string()).unwrap();
        assert_eq!(key.as_str(), "pear");
        assert!(ItemKey::try_from(String::new()).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: normalizing twice is the same as normalizing once.
        #[test]
        fn normalize_is_idempotent(s in "[ \\t\\na-zA-Z0-9äöüÄÖÜßéÉ_-]{0,32}") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }

        /// Property: a parsed key is already in normal form.
        #[test]
        fn parsed_key_is_normal(s in "[ a-zA-Z0-9]{0,24}") {
            if let Ok(key) = ItemKey::parse(&s) {
                prop_assert_eq!(normalize(key.as_str()), key.as_str());
                prop_assert!(!key.as_str().is_empty());
            }
        }
    }
}
