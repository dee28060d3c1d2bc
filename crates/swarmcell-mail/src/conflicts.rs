//! Reservation overlap detection (spec.md §4.5, expanded in SPEC_FULL.md
//! §4.5). Each `path_pattern` is validated as a `glob::Pattern` and then
//! reduced to its fixed (non-wildcard) prefix; two patterns conflict when
//! one prefix contains the other — exact for the `*`/`**`-suffix glob style
//! reservations use in practice, and conservative (never under-reports) for
//! anything fancier.

use swarmcell_core::errors::{SwarmError, SwarmResult};

pub fn validate_pattern(pattern: &str) -> SwarmResult<()> {
    glob::Pattern::new(pattern).map_err(|e| SwarmError::Validation {
        field: "path_pattern".into(),
        reason: e.to_string(),
    })?;
    Ok(())
}

fn fixed_prefix(pattern: &str) -> &str {
    pattern.find(['*', '?', '[']).map_or(pattern, |idx| &pattern[..idx])
}

/// True if any string could match both patterns.
pub fn patterns_may_conflict(a: &str, b: &str) -> bool {
    let pa = fixed_prefix(a);
    let pb = fixed_prefix(b);
    pa.starts_with(pb) || pb.starts_with(pa)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_patterns_conflict() {
        assert!(patterns_may_conflict("src/lib.rs", "src/lib.rs"));
    }

    #[test]
    fn disjoint_prefixes_do_not_conflict() {
        assert!(!patterns_may_conflict("src/a/*", "src/b/*"));
    }

    #[test]
    fn nested_glob_conflicts_with_narrower_pattern() {
        assert!(patterns_may_conflict("src/**", "src/lib.rs"));
        assert!(patterns_may_conflict("src/module/*.rs", "src/module/**"));
    }

    #[test]
    fn rejects_malformed_pattern() {
        assert!(validate_pattern("src/[").is_err());
    }
}
