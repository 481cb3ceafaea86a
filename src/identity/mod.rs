//! Login decision for people listed in the upstream directory.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod matcher;
mod leadership;
mod provider;

pub use principal::{Principal, Role};
pub use matcher::{resolve, words_contained, MatchResult, MatchTier};
pub use leadership::{is_leader, has_leader_marker, names_as_leader, extract_leader_name, LEADER_MARKERS};
pub use provider::{
    AuthEngine, AuthOutcome, AdminCredentials, LoginRequest, LoginStatus,
    MSG_SUCCESS, MSG_NOT_FOUND, MSG_BAD_CREDENTIAL, MSG_NOT_LEADER, MSG_UNAVAILABLE,
};
