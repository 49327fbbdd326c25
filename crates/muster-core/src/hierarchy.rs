//! Role hierarchy
//!
//! An ordered ladder of role identifiers. Rank 0 is the most privileged
//! role; a larger rank means less privilege. Roles absent from the ladder
//! are unranked and never take part in rank comparisons.

use crate::config::RoleConfig;
use crate::error::ConfigError;
use crate::types::{Member, RoleId};
use std::collections::HashMap;
use std::fmt;

/// Index into the role ladder (lower = more privileged)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rank(pub usize);

impl Rank {
    /// Rank index
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }

    /// One step towards the top, if any
    #[inline]
    #[must_use]
    pub fn up(self) -> Option<Rank> {
        self.0.checked_sub(1).map(Rank)
    }

    /// One step towards the bottom (may fall off the ladder)
    #[inline]
    #[must_use]
    pub fn down(self) -> Rank {
        Rank(self.0 + 1)
    }

    /// Check if this rank is strictly more privileged than `other`
    #[inline]
    #[must_use]
    pub fn outranks(self, other: Rank) -> bool {
        self.0 < other.0
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A member's most privileged ranked role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedRole {
    /// Position in the ladder
    pub rank: Rank,
    /// The role holding that position
    pub role_id: RoleId,
}

/// Fixed role ladder built from configuration
#[derive(Debug, Clone)]
pub struct RoleHierarchy {
    ladder: Vec<RoleId>,
    index: HashMap<RoleId, Rank>,
    admin: Vec<RoleId>,
    probation: Rank,
    guest: Rank,
}

impl RoleHierarchy {
    /// Build ladder from role configuration
    ///
    /// # Errors
    /// - `ConfigError::DuplicateRole` if a role appears twice
    pub fn from_config(roles: &RoleConfig) -> Result<Self, ConfigError> {
        let ladder: Vec<RoleId> = roles.ladder().cloned().collect();
        let mut index = HashMap::with_capacity(ladder.len());
        for (i, role) in ladder.iter().enumerate() {
            if index.insert(role.clone(), Rank(i)).is_some() {
                return Err(ConfigError::DuplicateRole(role.clone()));
            }
        }

        let probation = index[&roles.recruit];
        let guest = index[&roles.guest];

        Ok(Self {
            ladder,
            index,
            admin: roles.admin.clone(),
            probation,
            guest,
        })
    }

    /// Rank of a role, or `None` when unranked
    #[inline]
    #[must_use]
    pub fn rank_of(&self, role: &RoleId) -> Option<Rank> {
        self.index.get(role).copied()
    }

    /// Role at a rank, or `None` past either end of the ladder
    #[inline]
    #[must_use]
    pub fn role_at(&self, rank: Rank) -> Option<&RoleId> {
        self.ladder.get(rank.0)
    }

    /// Most privileged ranked role among `roles`
    ///
    /// Returns `None` when no role is ranked. On equal ranks the first one
    /// seen is kept.
    #[must_use]
    pub fn highest_rank<'a, I>(&self, roles: I) -> Option<RankedRole>
    where
        I: IntoIterator<Item = &'a RoleId>,
    {
        let mut best: Option<RankedRole> = None;
        for role in roles {
            let Some(rank) = self.rank_of(role) else {
                continue;
            };
            if best.as_ref().map_or(true, |b| rank < b.rank) {
                best = Some(RankedRole {
                    rank,
                    role_id: role.clone(),
                });
            }
        }
        best
    }

    /// Most privileged ranked role a member holds
    #[inline]
    #[must_use]
    pub fn highest_rank_of(&self, member: &Member) -> Option<RankedRole> {
        self.highest_rank(&member.roles)
    }

    /// Rank of the probation (recruit) role
    #[inline]
    #[must_use]
    pub fn probation_rank(&self) -> Rank {
        self.probation
    }

    /// Rank of the guest role
    #[inline]
    #[must_use]
    pub fn guest_rank(&self) -> Rank {
        self.guest
    }

    /// Check if a role is administrative
    #[inline]
    #[must_use]
    pub fn is_admin(&self, role: &RoleId) -> bool {
        self.admin.contains(role)
    }

    /// Iterate the ladder with ranks, most privileged first
    pub fn iter(&self) -> impl Iterator<Item = (Rank, &RoleId)> {
        self.ladder.iter().enumerate().map(|(i, r)| (Rank(i), r))
    }

    /// Number of ranks
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ladder.len()
    }

    /// Check if ladder is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ladder.is_empty()
    }
}
