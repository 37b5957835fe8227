//! Change planning: which fields force a replacement and which can be
//! updated in place.
//!
//! Every identity field is immutable once created. Server-computed fields
//! (`creation_date`, `friendly_name`, access keys) are never compared, since
//! desired configuration does not carry them.

use std::fmt;

use crate::model::{
    Group, GroupMembership, GroupPolicyAttachment, Policy, User, UserCredentials,
    UserPolicyAttachment,
};
use crate::statement;

/// Field-level comparison between desired configuration and prior state.
pub trait Plannable {
    /// Changed fields that can only be applied by destroy-then-create.
    fn replace_fields(&self, prior: &Self) -> Vec<&'static str>;

    /// Changed fields that can be applied in place.
    fn update_fields(&self, _prior: &Self) -> Vec<&'static str> {
        Vec::new()
    }
}

/// What it takes to move one instance from its prior state to its desired
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    NoOp,
    Create,
    Update { fields: Vec<&'static str> },
    Replace { fields: Vec<&'static str> },
    Delete,
}

impl Plan {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::NoOp)
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoOp => write!(f, "no changes"),
            Self::Create => write!(f, "create"),
            Self::Update { fields } => write!(f, "update in place ({})", fields.join(", ")),
            Self::Replace { fields } => write!(f, "replace ({})", fields.join(", ")),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Plans the change for one instance.
#[must_use]
pub fn plan<S: Plannable>(desired: Option<&S>, prior: Option<&S>) -> Plan {
    match (desired, prior) {
        (None, None) => Plan::NoOp,
        (Some(_), None) => Plan::Create,
        (None, Some(_)) => Plan::Delete,
        (Some(desired), Some(prior)) => {
            let fields = desired.replace_fields(prior);
            if !fields.is_empty() {
                return Plan::Replace { fields };
            }
            let fields = desired.update_fields(prior);
            if fields.is_empty() {
                Plan::NoOp
            } else {
                Plan::Update { fields }
            }
        }
    }
}

fn changed(fields: &[(&'static str, bool)]) -> Vec<&'static str> {
    fields
        .iter()
        .filter_map(|(name, differs)| differs.then_some(*name))
        .collect()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl Plannable for User {
    fn replace_fields(&self, prior: &Self) -> Vec<&'static str> {
        changed(&[("id", self.id != prior.id)])
    }
}

impl Plannable for Group {
    fn replace_fields(&self, prior: &Self) -> Vec<&'static str> {
        changed(&[
            ("id", self.id != prior.id),
            (
                "description",
                non_empty(&self.description) != non_empty(&prior.description),
            ),
        ])
    }
}

impl Plannable for Policy {
    fn replace_fields(&self, prior: &Self) -> Vec<&'static str> {
        changed(&[("id", self.id != prior.id)])
    }

    fn update_fields(&self, prior: &Self) -> Vec<&'static str> {
        let differs = self.statement != prior.statement
            && !statement::json_text_equal(&self.statement, &prior.statement);
        changed(&[("statement", differs)])
    }
}

impl Plannable for UserCredentials {
    fn replace_fields(&self, prior: &Self) -> Vec<&'static str> {
        changed(&[("user_id", self.user_id != prior.user_id)])
    }
}

impl Plannable for GroupMembership {
    fn replace_fields(&self, prior: &Self) -> Vec<&'static str> {
        changed(&[
            ("group_id", self.group_id != prior.group_id),
            ("user_id", self.user_id != prior.user_id),
        ])
    }
}

impl Plannable for GroupPolicyAttachment {
    fn replace_fields(&self, prior: &Self) -> Vec<&'static str> {
        changed(&[
            ("group_id", self.group_id != prior.group_id),
            ("policy_id", self.policy_id != prior.policy_id),
        ])
    }
}

impl Plannable for UserPolicyAttachment {
    fn replace_fields(&self, prior: &Self) -> Vec<&'static str> {
        changed(&[
            ("user_id", self.user_id != prior.user_id),
            ("policy_id", self.policy_id != prior.policy_id),
        ])
    }
}
