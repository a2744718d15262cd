//! Skip policy for deliberately excluded sources.

/// Returns `true` if the resolved URL matches any configured source token.
///
/// Matching is plain substring containment; tokens are source names
/// (`"mangadex"`), not full URLs. Only resolved titles are ever checked —
/// an unresolved title is reported through its own path, not skipped.
pub fn should_skip(url: &str, skip_hosts: &[String]) -> bool {
    skip_hosts.iter().any(|token| url.contains(token.as_str()))
}
