use std::collections::HashSet;

use crate::api::{CommunityId, Error, UserId};

/// User identity collaborator
pub trait Identity: Send + Sync {
    fn resolve_user(&self, user: &UserId) -> bool;
}

/// Community membership collaborator
pub trait Membership: Send + Sync {
    fn user_communities(&self, user: &UserId) -> HashSet<CommunityId>;

    /// Joins the community if the user is not a member, leaves it otherwise.
    /// Returns whether the user is a member afterwards.
    fn toggle_membership(&self, user: &UserId, community: &CommunityId) -> Result<bool, Error>;

    fn community_by_name(&self, name: &str) -> Option<CommunityId>;

    fn community_exists(&self, community: &CommunityId) -> bool;
}
