/// Checks whether an entry name is caught by any of the given exclusion rules. A rule is an exact
/// name, or has a leading and/or trailing '*' to match the end, start, or middle of a name.
///
pub fn is_excluded(name: &str, rules: &[String]) -> bool {
    rules.iter().any(|rule| rule_matches(name, rule))
}

/// Dot-files are noise in a destination listing, whatever the user has configured.
///
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

fn rule_matches(name: &str, rule: &str) -> bool {
    match rule {
        "*" => true,
        r if r.len() > 1 && r.starts_with('*') && r.ends_with('*') => {
            name.contains(&r[1..r.len() - 1])
        }
        r if r.starts_with('*') => name.ends_with(&r[1..]),
        r if r.ends_with('*') => name.starts_with(&r[..r.len() - 1]),
        r => name == r,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_exact_match() {
        let rules = vec![".DS_Store".to_string()];
        assert!(is_excluded(".DS_Store", &rules));
        assert!(!is_excluded("NGC188", &rules));
    }

    #[test]
    fn test_prefix_match() {
        let rules = vec!["._*".to_string()];
        assert!(is_excluded("._frame001.fits", &rules));
        assert!(!is_excluded("frame001.fits", &rules));
    }

    #[test]
    fn test_suffix_match() {
        let rules = vec!["*.tmp".to_string()];
        assert!(is_excluded("session.tmp", &rules));
        assert!(!is_excluded("tmp.session", &rules));
    }

    #[test]
    fn test_contains_match() {
        let rules = vec!["*flat*".to_string()];
        assert!(is_excluded("M31_flat_panel", &rules));
        assert!(!is_excluded("M31_light", &rules));
    }

    #[test]
    fn test_lone_star_matches_everything() {
        assert!(is_excluded("anything", &["*".to_string()]));
    }

    #[test]
    fn test_empty_rules() {
        let rules: Vec<String> = vec![];
        assert!(!is_excluded("anything", &rules));
    }

    #[test]
    fn test_is_hidden() {
        assert!(is_hidden(".Trashes"));
        assert!(!is_hidden("2023-10-27 - NGC188"));
    }
}
