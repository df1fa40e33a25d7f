//! Fixed role ranking used for role-assignment restriction.
//!
//! The ranking is a lookup table, not derived from permission sets. It only
//! answers "may this user hand out that role".

use super::role::{Role, ADMIN, AUTHOR, EDITOR, SUPER_ADMIN, VIEWER};
use serde::{Deserialize, Serialize};

/// Ordered role names, lowest rank first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleHierarchy {
    order: Vec<String>,
}

impl Default for RoleHierarchy {
    fn default() -> Self {
        Self::new([VIEWER, AUTHOR, EDITOR, ADMIN, SUPER_ADMIN])
    }
}

impl RoleHierarchy {
    pub fn new<I, S>(order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            order: order.into_iter().map(Into::into).collect(),
        }
    }

    /// Rank of a role name; `None` for roles outside the table.
    pub fn rank(&self, role_name: &str) -> Option<usize> {
        self.order.iter().position(|n| n == role_name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether `actor` may assign the role named `target` to someone.
    ///
    /// Super Admin may assign anything. Nobody else may assign Super Admin.
    /// Otherwise the actor's rank must be at least the target's; a role
    /// missing from the table on either side denies.
    pub fn can_assign(&self, actor: &Role, target: &str) -> bool {
        if actor.is_super_admin() {
            return true;
        }
        if target == SUPER_ADMIN {
            return false;
        }
        match (self.rank(&actor.name), self.rank(target)) {
            (Some(actor_rank), Some(target_rank)) => actor_rank >= target_rank,
            _ => false,
        }
    }

    /// Role names `actor` may assign, in rank order.
    pub fn assignable_by<'a>(&'a self, actor: &'a Role) -> impl Iterator<Item = &'a str> + 'a {
        self.names().filter(move |name| self.can_assign(actor, name))
    }
}
