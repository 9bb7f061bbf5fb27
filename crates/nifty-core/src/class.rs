//! Class-path grammar: `segment (":" segment)*`, ancestor-first.
//!
//! Every CoreObject stamps an immutable class path at construction, e.g.
//! `"core:queue:pool"`. Subclass casts compose by checking a fully
//! qualified prefix against this path, with the match required to land
//! on a colon boundary so `"core:foo"` never matches `"core:foobar"`.

/// True iff `class` starts with `prefix` and the match ends at a colon
/// boundary (i.e. `prefix` is exactly `class`, or `class[prefix.len()]`
/// is `:`).
///
/// This closes the bare-`starts_with` bug the spec's Open Questions call
/// out: a naive `class.starts_with(prefix)` would let `"core:foo"` match
/// a query for `"core:foobar"`'s sibling `"core:foo"` — actually the
/// dangerous direction is the reverse, matching `"core:foobar"` against a
/// query for `"core:foo"`. Requiring a colon or end-of-string after the
/// prefix rules that out.
pub fn prefix_matches(class: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    match class.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with(':'),
        None => false,
    }
}

/// True iff `class` is a syntactically valid class path: one or more
/// non-empty, colon-free segments joined by single colons.
pub fn is_valid_class_path(class: &str) -> bool {
    if class.is_empty() {
        return false;
    }
    class.split(':').all(|seg| !seg.is_empty())
}

/// Build a subclass's fully qualified class path from its parent's path
/// and its own leaf segment, e.g. `extend("core:queue", "pool")` ==
/// `"core:queue:pool"`.
pub fn extend(parent: &str, leaf: &str) -> String {
    debug_assert!(!leaf.is_empty() && !leaf.contains(':'), "leaf must be a single segment");
    if parent.is_empty() {
        leaf.to_string()
    } else {
        format!("{parent}:{leaf}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match() {
        assert!(prefix_matches("core:queue", "core:queue"));
    }

    #[test]
    fn ancestor_prefix_matches() {
        assert!(prefix_matches("core:queue:pool", "core:queue"));
        assert!(prefix_matches("core:queue:pool", "core"));
    }

    #[test]
    fn sibling_segment_does_not_match() {
        assert!(!prefix_matches("core:foobar", "core:foo"));
        assert!(!prefix_matches("core:foo", "core:foobar"));
    }

    #[test]
    fn empty_prefix_matches_everything() {
        assert!(prefix_matches("core:queue", ""));
    }

    #[test]
    fn validity_checks() {
        assert!(is_valid_class_path("core:queue:pool"));
        assert!(!is_valid_class_path(""));
        assert!(!is_valid_class_path("core::pool"));
        assert!(!is_valid_class_path(":core"));
    }

    #[test]
    fn extend_builds_child_path() {
        assert_eq!(extend("core:queue", "pool"), "core:queue:pool");
        assert_eq!(extend("", "core"), "core");
    }
}
