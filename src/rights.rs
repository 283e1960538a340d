use std::fmt;

use serde::{Deserialize, Serialize};

/// A caller's position in the linear permission hierarchy.
///
/// Declaration order is the hierarchy: every level holds all permissions of
/// the levels before it. The derived `Ord` follows that order, so
/// `RightsLevel::Admin > RightsLevel::Default`.
///
/// # Examples
///
/// ```
/// use guard_chain::RightsLevel;
///
/// assert!(RightsLevel::Admin.satisfies(RightsLevel::Default));
/// assert!(!RightsLevel::Default.satisfies(RightsLevel::Admin));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RightsLevel {
    /// Lowest level, granted to anonymous or unrecognized callers
    Default,
    /// Administrative level
    Admin,
}

impl RightsLevel {
    /// Every level, lowest first.
    pub const ALL: [RightsLevel; 2] = [RightsLevel::Default, RightsLevel::Admin];

    /// The lowest level in the hierarchy.
    pub const fn lowest() -> Self {
        RightsLevel::Default
    }

    /// Returns the wire token for this level.
    pub const fn as_str(self) -> &'static str {
        match self {
            RightsLevel::Default => "default",
            RightsLevel::Admin => "admin",
        }
    }

    /// Maps a presented token to a level.
    ///
    /// Absent, unknown or malformed tokens fall back to the lowest level.
    /// Matching is exact: `"Admin"` is not `"admin"`.
    pub fn from_token(token: Option<&str>) -> Self {
        token
            .and_then(|raw| Self::ALL.into_iter().find(|level| level.as_str() == raw))
            .unwrap_or_else(Self::lowest)
    }

    /// Returns `true` when this level sits at or above `minimum`.
    pub fn satisfies(self, minimum: RightsLevel) -> bool {
        self >= minimum
    }
}

impl Default for RightsLevel {
    fn default() -> Self {
        Self::lowest()
    }
}

impl fmt::Display for RightsLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_is_sorted_lowest_first() {
        let mut sorted = RightsLevel::ALL;
        sorted.sort();
        assert_eq!(sorted, RightsLevel::ALL);
        assert_eq!(RightsLevel::ALL[0], RightsLevel::lowest());
    }

    #[test]
    fn known_tokens_map_to_levels() {
        assert_eq!(RightsLevel::from_token(Some("admin")), RightsLevel::Admin);
        assert_eq!(RightsLevel::from_token(Some("default")), RightsLevel::Default);
    }

    #[test]
    fn unknown_or_missing_tokens_never_escalate() {
        assert_eq!(RightsLevel::from_token(None), RightsLevel::Default);
        assert_eq!(RightsLevel::from_token(Some("")), RightsLevel::Default);
        assert_eq!(RightsLevel::from_token(Some("root")), RightsLevel::Default);
        assert_eq!(RightsLevel::from_token(Some("ADMIN")), RightsLevel::Default);
        assert_eq!(RightsLevel::from_token(Some(" admin")), RightsLevel::Default);
    }

    #[test]
    fn satisfies_follows_hierarchy() {
        for actual in RightsLevel::ALL {
            for minimum in RightsLevel::ALL {
                assert_eq!(actual.satisfies(minimum), actual >= minimum);
            }
        }
        assert!(RightsLevel::Default.satisfies(RightsLevel::Default));
    }

    #[test]
    fn serializes_as_token() {
        assert_eq!(
            serde_json::to_value(RightsLevel::Admin).unwrap(),
            serde_json::json!("admin")
        );
    }
}
