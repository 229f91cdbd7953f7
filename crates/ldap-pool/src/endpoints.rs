//! Endpoint resolution.
//!
//! A pool is configured with a single URI string naming one or more
//! servers; failover walks them in the order given.

use once_cell::sync::Lazy;
use regex::Regex;

static URI_SEPARATOR: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)] // the pattern is a literal
    Regex::new(r"[\s,]+").unwrap()
});

/// Split a configured URI list into an ordered sequence of endpoints.
///
/// URIs can be delimited by commas, whitespace, or both. Order is
/// preserved and duplicates are kept; an empty input yields an empty
/// sequence, which [`PoolConfig::validate`](crate::PoolConfig::validate)
/// treats as a configuration error.
#[must_use]
pub fn resolve(uri: &str) -> Vec<String> {
    URI_SEPARATOR
        .split(uri)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn single_uri() {
        assert_eq!(resolve("ldap://a"), vec!["ldap://a"]);
    }

    #[test]
    fn comma_and_whitespace_separators() {
        assert_eq!(
            resolve("ldap://a, ldap://b\tldaps://c,ldap://d"),
            vec!["ldap://a", "ldap://b", "ldaps://c", "ldap://d"]
        );
    }

    #[test]
    fn order_preserved_and_duplicates_kept() {
        assert_eq!(
            resolve("ldap://b ldap://a ldap://b"),
            vec!["ldap://b", "ldap://a", "ldap://b"]
        );
    }

    #[test]
    fn empty_and_blank_inputs() {
        assert!(resolve("").is_empty());
        assert!(resolve("  \t , ,, ").is_empty());
    }

    proptest! {
        // Joining any endpoint list with any mix of separators resolves
        // back to the original list.
        #[test]
        fn roundtrips_through_separators(
            parts in proptest::collection::vec("[a-z]{1,8}(://[a-z0-9.]{1,12})?", 1..6),
            seps in proptest::collection::vec(prop_oneof![
                Just(",".to_string()),
                Just(" ".to_string()),
                Just(", ".to_string()),
                Just("\t".to_string()),
                Just(" , ".to_string()),
            ], 5),
        ) {
            let mut joined = String::new();
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    joined.push_str(&seps[(i - 1) % seps.len()]);
                }
                joined.push_str(part);
            }
            prop_assert_eq!(resolve(&joined), parts);
        }
    }
}
