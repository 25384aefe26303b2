use super::permission::{Permission, Segment};
use serde::{Deserialize, Serialize};

/// How a stored `ANY` segment is treated.
///
/// A requested `ANY` matches any granted value and a granted `*` matches any
/// requested value in both modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Query evaluation: a granted `ANY` also matches any requested value.
    /// This widens the plain rule, where only a requested `ANY` or a granted
    /// `*` matches every value.
    #[default]
    Query,
    /// Minimum-permission check: a granted `ANY` is only the literal `ANY`
    Minimum,
}

/// Whether one requested segment is satisfied by one granted segment
pub fn segment_matches(requested: &Segment, granted: &Segment, mode: MatchMode) -> bool {
    match (requested, granted) {
        (Segment::Any, _) => true,
        (_, Segment::Wildcard) => true,
        (_, Segment::Any) if mode == MatchMode::Query => true,
        (requested, granted) => requested == granted,
    }
}

/// Whether `granted` satisfies `requested` in every position
pub fn permission_matches(requested: &Permission, granted: &Permission, mode: MatchMode) -> bool {
    requested
        .segments()
        .into_iter()
        .zip(granted.segments())
        .all(|(r, g)| segment_matches(r, g, mode))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(raw: &str) -> Permission {
        Permission::parse(raw).unwrap()
    }

    #[test]
    fn test_exact_match() {
        assert!(permission_matches(&p("READ_PROJECT_LINE"), &p("read_project_line"), MatchMode::Query));
        assert!(!permission_matches(&p("READ_PROJECT_LINE"), &p("READ_PROJECT_PAGE"), MatchMode::Query));
    }

    #[test]
    fn test_granted_wildcard() {
        assert!(permission_matches(&p("READ_PROJECT_LINE"), &p("*_PROJECT_LINE"), MatchMode::Minimum));
        assert!(permission_matches(&p("READ_PROJECT_LINE"), &p("*_*_*"), MatchMode::Query));
    }

    #[test]
    fn test_requested_wildcard_is_literal() {
        assert!(!permission_matches(&p("READ_*_LINE"), &p("READ_PROJECT_LINE"), MatchMode::Query));
        assert!(permission_matches(&p("READ_*_LINE"), &p("READ_*_LINE"), MatchMode::Query));
    }

    #[test]
    fn test_requested_any() {
        for mode in [MatchMode::Query, MatchMode::Minimum] {
            assert!(permission_matches(&p("ANY_ANY_LINE"), &p("UPDATE_*_LINE"), mode));
            assert!(!permission_matches(&p("ANY_ANY_PAGE"), &p("UPDATE_*_LINE"), mode));
        }
    }

    #[test]
    fn test_granted_any_depends_on_mode() {
        let granted = p("ANY_PROJECT_LINE");
        assert!(permission_matches(&p("DELETE_PROJECT_LINE"), &granted, MatchMode::Query));
        assert!(!permission_matches(&p("DELETE_PROJECT_LINE"), &granted, MatchMode::Minimum));
        assert!(permission_matches(&p("ANY_PROJECT_LINE"), &granted, MatchMode::Minimum));
    }
}
