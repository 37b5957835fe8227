//! Group membership and policy attachments.
//!
//! Each edge lives below its owner: members and policies of a group, or
//! policies of a user.

use super::Op;
use super::attachment::{EdgeKind, EdgeRead};
use crate::model::{GroupMembership, GroupPolicyAttachment, ResourceKind, UserPolicyAttachment};

/// Hooks for [`GroupMembership`]: `/auth/groups/{group}/members/{user}`.
#[derive(Debug, Clone, Copy)]
pub struct MembershipKind;

impl EdgeKind for MembershipKind {
    type State = GroupMembership;

    const KIND: ResourceKind = ResourceKind::GroupMembership;
    const OWNER_COLLECTION: &'static str = "groups";
    const RELATION: &'static str = "members";
    const READ: EdgeRead = EdgeRead::ListSearch;
    const IMPORT_FORMAT: &'static str = "<group_id>:<user_id>";

    fn owner(state: &GroupMembership) -> &str {
        &state.group_id
    }

    fn target(state: &GroupMembership) -> &str {
        &state.user_id
    }

    fn from_endpoints(owner: &str, target: &str) -> GroupMembership {
        GroupMembership {
            group_id: owner.to_string(),
            user_id: target.to_string(),
        }
    }

    fn action(op: Op, state: &GroupMembership) -> String {
        let (user, group) = (&state.user_id, &state.group_id);
        match op {
            Op::Create => format!("add user {user} to group {group}"),
            Op::Delete => format!("remove user {user} from group {group}"),
            Op::Read | Op::Update => format!("{} group membership {group}/{user}", op.verb()),
        }
    }
}

/// Hooks for [`GroupPolicyAttachment`]: `/auth/groups/{group}/policies/{policy}`.
///
/// lakeFS exposes the edge itself here, so presence is a direct `GET`.
#[derive(Debug, Clone, Copy)]
pub struct GroupPolicyKind;

impl EdgeKind for GroupPolicyKind {
    type State = GroupPolicyAttachment;

    const KIND: ResourceKind = ResourceKind::GroupPolicyAttachment;
    const OWNER_COLLECTION: &'static str = "groups";
    const RELATION: &'static str = "policies";
    const READ: EdgeRead = EdgeRead::DirectGet;
    const IMPORT_FORMAT: &'static str = "<group_id>:<policy_id>";

    fn owner(state: &GroupPolicyAttachment) -> &str {
        &state.group_id
    }

    fn target(state: &GroupPolicyAttachment) -> &str {
        &state.policy_id
    }

    fn from_endpoints(owner: &str, target: &str) -> GroupPolicyAttachment {
        GroupPolicyAttachment {
            group_id: owner.to_string(),
            policy_id: target.to_string(),
        }
    }

    fn action(op: Op, state: &GroupPolicyAttachment) -> String {
        let (policy, group) = (&state.policy_id, &state.group_id);
        match op {
            Op::Create => format!("attach policy {policy} to group {group}"),
            Op::Delete => format!("detach policy {policy} from group {group}"),
            Op::Read | Op::Update => {
                format!("{} group policy attachment {group}/{policy}", op.verb())
            }
        }
    }
}

/// Hooks for [`UserPolicyAttachment`]: `/auth/users/{user}/policies/{policy}`.
#[derive(Debug, Clone, Copy)]
pub struct UserPolicyKind;

impl EdgeKind for UserPolicyKind {
    type State = UserPolicyAttachment;

    const KIND: ResourceKind = ResourceKind::UserPolicyAttachment;
    const OWNER_COLLECTION: &'static str = "users";
    const RELATION: &'static str = "policies";
    const READ: EdgeRead = EdgeRead::ListSearch;
    const IMPORT_FORMAT: &'static str = "<user_id>:<policy_id>";

    fn owner(state: &UserPolicyAttachment) -> &str {
        &state.user_id
    }

    fn target(state: &UserPolicyAttachment) -> &str {
        &state.policy_id
    }

    fn from_endpoints(owner: &str, target: &str) -> UserPolicyAttachment {
        UserPolicyAttachment {
            user_id: owner.to_string(),
            policy_id: target.to_string(),
        }
    }

    fn action(op: Op, state: &UserPolicyAttachment) -> String {
        let (policy, user) = (&state.policy_id, &state.user_id);
        match op {
            Op::Create => format!("attach policy {policy} to user {user}"),
            Op::Delete => format!("detach policy {policy} from user {user}"),
            Op::Read | Op::Update => {
                format!("{} user policy attachment {user}/{policy}", op.verb())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_wording() {
        let edge = MembershipKind::from_endpoints("g1", "u1");
        assert_eq!(MembershipKind::action(Op::Create, &edge), "add user u1 to group g1");
        assert_eq!(
            MembershipKind::action(Op::Delete, &edge),
            "remove user u1 from group g1"
        );
        assert_eq!(
            MembershipKind::action(Op::Read, &edge),
            "read group membership g1/u1"
        );
    }

    #[test]
    fn test_endpoints_map_to_fields() {
        let edge = UserPolicyKind::from_endpoints("u1", "p1");
        assert_eq!(edge.user_id, "u1");
        assert_eq!(edge.policy_id, "p1");
        assert_eq!(UserPolicyKind::owner(&edge), "u1");
        assert_eq!(UserPolicyKind::target(&edge), "p1");
    }
}
