use crate::directory::Member;
use crate::normalize::normalize_strict;

/// Which rule picked the member. Ordered from most to least specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Exact,
    Prefix,
    WordSubset,
    None,
}

#[derive(Debug, Clone, Copy)]
pub struct MatchResult<'a> {
    pub member: Option<&'a Member>,
    pub tier: MatchTier,
}

impl<'a> MatchResult<'a> {
    fn hit(member: &'a Member, tier: MatchTier) -> Self { Self { member: Some(member), tier } }
    fn miss() -> Self { Self { member: None, tier: MatchTier::None } }
}

/// Resolve a typed username to a roster entry.
///
/// Tiers are tried in order and the first member satisfying a tier wins; roster order breaks
/// ties within a tier:
/// 1. exact: normalized names equal
/// 2. prefix: member name starts with the username ("Joh" -> "John Smith")
/// 3. word subset: every username word occurs somewhere in the member name, any order
///
/// A blank username never matches, and neither do members whose name normalizes to empty.
pub fn resolve<'a>(username: &str, roster: &'a [Member]) -> MatchResult<'a> {
    let wanted = normalize_strict(username);
    if wanted.is_empty() {
        return MatchResult::miss();
    }
    let names: Vec<String> = roster.iter().map(|m| normalize_strict(&m.name)).collect();
    let candidates = || roster.iter().zip(names.iter()).filter(|(_, n)| !n.is_empty());

    if let Some((m, _)) = candidates().find(|(_, n)| **n == wanted) {
        return MatchResult::hit(m, MatchTier::Exact);
    }
    if let Some((m, _)) = candidates().find(|(_, n)| n.starts_with(wanted.as_str())) {
        return MatchResult::hit(m, MatchTier::Prefix);
    }
    if let Some((m, _)) = candidates().find(|(_, n)| words_contained(&wanted, n)) {
        return MatchResult::hit(m, MatchTier::WordSubset);
    }
    MatchResult::miss()
}

/// True when every whitespace-separated word of `needle` is a substring of `haystack`.
/// Both sides are expected to be normalized already. An empty needle is never contained.
pub fn words_contained(needle: &str, haystack: &str) -> bool {
    let mut words = needle.split_whitespace().peekable();
    if words.peek().is_none() {
        return false;
    }
    words.all(|w| haystack.contains(w))
}
