use std::collections::{btree_map, BTreeMap, HashSet};

use agora_core::{
    api::{self, AuthToken, Community, CommunityId, Error, NewCommunity, NewUser, UserId},
    Identity, Membership,
};
use parking_lot::RwLock;

/// In-memory user and community registry.
///
/// Stands in for the identity and membership services a deployment would
/// put in front of the forum.
pub struct Directory(RwLock<State>);

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<UserId, DbUser>,
    communities: BTreeMap<CommunityId, Community>,
}

#[derive(Debug)]
struct DbUser {
    name: String,
    communities: HashSet<CommunityId>,
}

impl Directory {
    pub fn new() -> Directory {
        Directory(RwLock::new(State::default()))
    }

    /// Return the current number of users
    pub fn num_users(&self) -> usize {
        self.0.read().users.len()
    }

    pub fn create_user(&self, u: NewUser) -> Result<(), Error> {
        u.validate()?;
        let mut state = self.0.write();

        if state.users.values().any(|db| db.name == u.name) {
            return Err(Error::NameAlreadyUsed(u.name));
        }

        match state.users.entry(u.id) {
            btree_map::Entry::Occupied(_) => Err(Error::UuidAlreadyUsed(u.id.0)),
            btree_map::Entry::Vacant(entry) => {
                entry.insert(DbUser {
                    name: u.name,
                    communities: HashSet::new(),
                });
                tracing::info!(user = ?u.id, "created user");
                Ok(())
            }
        }
    }

    pub fn create_community(&self, c: NewCommunity) -> Result<(), Error> {
        c.validate()?;
        let mut state = self.0.write();

        if state.communities.values().any(|db| db.name == c.name) {
            return Err(Error::NameAlreadyUsed(c.name));
        }

        match state.communities.entry(c.id) {
            btree_map::Entry::Occupied(_) => Err(Error::UuidAlreadyUsed(c.id.0)),
            btree_map::Entry::Vacant(entry) => {
                entry.insert(Community {
                    id: c.id,
                    name: c.name,
                    description: c.description,
                });
                tracing::info!(community = ?c.id, "created community");
                Ok(())
            }
        }
    }

    /// Resolves a bearer token to the user it authenticates
    pub fn resolve(&self, tok: AuthToken) -> Result<UserId, Error> {
        let user = UserId(tok.0);
        match self.0.read().users.contains_key(&user) {
            true => Ok(user),
            false => Err(Error::PermissionDenied),
        }
    }

    pub fn user(&self, id: &UserId) -> Result<api::User, Error> {
        self.0
            .read()
            .users
            .get(id)
            .map(|u| api::User {
                id: *id,
                name: u.name.clone(),
            })
            .ok_or(Error::UserNotFound(id.0))
    }

    pub fn users(&self) -> Vec<api::User> {
        self.0
            .read()
            .users
            .iter()
            .map(|(id, u)| api::User {
                id: *id,
                name: u.name.clone(),
            })
            .collect()
    }

    pub fn communities(&self) -> Vec<Community> {
        self.0.read().communities.values().cloned().collect()
    }
}

impl Default for Directory {
    fn default() -> Directory {
        Directory::new()
    }
}

impl Identity for Directory {
    fn resolve_user(&self, user: &UserId) -> bool {
        self.0.read().users.contains_key(user)
    }
}

impl Membership for Directory {
    fn user_communities(&self, user: &UserId) -> HashSet<CommunityId> {
        self.0
            .read()
            .users
            .get(user)
            .map(|u| u.communities.clone())
            .unwrap_or_default()
    }

    fn toggle_membership(&self, user: &UserId, community: &CommunityId) -> Result<bool, Error> {
        let mut state = self.0.write();
        if !state.communities.contains_key(community) {
            return Err(Error::CommunityNotFound(community.0));
        }
        let u = state
            .users
            .get_mut(user)
            .ok_or(Error::UserNotFound(user.0))?;
        let joined = match u.communities.remove(community) {
            true => false,
            false => u.communities.insert(*community),
        };
        tracing::debug!(?user, ?community, joined, "toggled membership");
        Ok(joined)
    }

    fn community_by_name(&self, name: &str) -> Option<CommunityId> {
        self.0
            .read()
            .communities
            .values()
            .find(|c| c.name == name)
            .map(|c| c.id)
    }

    fn community_exists(&self, community: &CommunityId) -> bool {
        self.0.read().communities.contains_key(community)
    }
}
