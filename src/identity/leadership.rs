use crate::directory::Member;
use crate::normalize::{normalize, normalize_strict};

/// Substrings of a normalized role/status field that mark leadership.
/// `"lider"` is the accent-stripped form of "líder".
pub const LEADER_MARKERS: &[&str] = &["lider", "leader"];

/// Decide whether `member` holds leadership privilege.
///
/// `member` should be borrowed from `roster`: its own row is excluded by address, so identical
/// duplicate rows still count as other records.
///
/// Either check is sufficient, and the roster scan only runs when the role check fails:
/// 1. role/status text carries a leadership marker
/// 2. some other roster entry names this member as its leader (see [`names_as_leader`])
///
/// Known trade-off: the group check uses a bidirectional prefix test, so short leader entries
/// like "Ana" match every "Ana ..." in the roster.
pub fn is_leader(member: &Member, roster: &[Member]) -> bool {
    if has_leader_marker(member) {
        return true;
    }
    let candidate = normalize_strict(&member.name);
    if candidate.is_empty() {
        return false;
    }
    roster
        .iter()
        .filter(|m| !std::ptr::eq(*m, member))
        .any(|m| names_as_leader(m, &candidate))
}

pub fn has_leader_marker(member: &Member) -> bool {
    let role = normalize(&member.role_title);
    let status = normalize(&member.status);
    LEADER_MARKERS.iter().any(|t| role.contains(t) || status.contains(t))
}

/// Does `other.leader_field` point at `candidate` (already strictly normalized)?
pub fn names_as_leader(other: &Member, candidate: &str) -> bool {
    let leader = normalize_strict(extract_leader_name(&other.leader_field, &other.group_id));
    if leader.is_empty() {
        return false;
    }
    leader.starts_with(candidate) || candidate.starts_with(leader.as_str())
}

/// Strip a leading `"<group_id> | "` from a leader field, compared case-insensitively.
/// Fields without that prefix come back trimmed but otherwise unchanged.
pub fn extract_leader_name<'a>(leader_field: &'a str, group_id: &str) -> &'a str {
    let field = leader_field.trim();
    let group = group_id.trim();
    if group.is_empty() {
        return field;
    }
    let prefix = format!("{} |", group);
    match field.get(..prefix.len()) {
        Some(head) if head.to_lowercase() == prefix.to_lowercase() => field[prefix.len()..].trim(),
        _ => field,
    }
}
