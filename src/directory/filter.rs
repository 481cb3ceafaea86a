use super::Member;
use crate::identity::words_contained;
use crate::normalize::{normalize, normalize_strict};

/// Narrow a roster by group and/or free-text name query.
///
/// Group identifiers keep their punctuation (`"G-1"` and `"G1"` are different groups); the
/// name query tolerates punctuation noise and word order. Blank filters match everything.
pub fn filter_roster<'a>(roster: &'a [Member], group: Option<&str>, query: Option<&str>) -> Vec<&'a Member> {
    let group = group.map(normalize).filter(|g| !g.is_empty());
    let query = query.map(normalize_strict).filter(|q| !q.is_empty());
    roster
        .iter()
        .filter(|m| match &group {
            Some(g) => normalize(&m.group_id) == *g,
            None => true,
        })
        .filter(|m| match &query {
            Some(q) => words_contained(q, &normalize_strict(&m.name)),
            None => true,
        })
        .collect()
}
