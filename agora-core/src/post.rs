use crate::{
    api::{self, CommentId, CommunityId, Entity, Error, NewPost, PostId, PostPatch, Time, UserId},
    Comment, CommentTree, VoteLedger,
};

/// A post, with its whole comment tree and all the vote ledgers inside it.
///
/// This is the unit of locking in `Forum`: everything reachable from a `Post`
/// is mutated under the same lock.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Post {
    pub id: PostId,
    pub community: Option<CommunityId>,
    pub author_id: UserId,
    pub date: Time,
    pub edited: Option<Time>,

    pub title: String,
    pub description: String,
    pub media: Vec<String>,

    pub votes: VoteLedger,
    pub comments: CommentTree,

    /// Date of the last change to the post or its comments, votes excluded
    last_activity: Time,
}

impl Post {
    pub fn new(id: PostId, author_id: UserId, date: Time, p: NewPost) -> Post {
        Post {
            id,
            community: p.community,
            author_id,
            date,
            edited: None,
            title: p.title,
            description: p.description,
            media: p.media,
            votes: VoteLedger::new(),
            comments: CommentTree::new(),
            last_activity: date,
        }
    }

    /// Adds `comment` at the top level, or as a reply to `parent`
    pub fn add_comment(
        &mut self,
        parent: Option<CommentId>,
        comment: Comment,
    ) -> Result<CommentId, Error> {
        let date = comment.date;
        let id = match parent {
            None => self.comments.push_root(comment)?,
            Some(parent) => self.comments.push_reply(&parent, comment)?,
        };
        self.touch(date);
        Ok(id)
    }

    fn touch(&mut self, date: Time) {
        self.last_activity = std::cmp::max(self.last_activity, date);
    }

    pub fn apply_patch(&mut self, patch: PostPatch, date: Time) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(media) = patch.media {
            self.media = media;
        }
        self.edited = Some(date);
        self.touch(date);
    }

    pub fn last_activity(&self) -> Time {
        self.last_activity
    }

    /// Ledger of `entity`, if it is this post or one of its comments
    pub fn ledger_mut(&mut self, entity: &Entity) -> Option<&mut VoteLedger> {
        match entity {
            Entity::Post(p) if *p == self.id => Some(&mut self.votes),
            Entity::Post(_) => None,
            Entity::Comment(c) => self.comments.get_mut(c).map(|c| &mut c.votes),
        }
    }

    pub fn ledger(&self, entity: &Entity) -> Option<&VoteLedger> {
        match entity {
            Entity::Post(p) if *p == self.id => Some(&self.votes),
            Entity::Post(_) => None,
            Entity::Comment(c) => self.comments.get(c).map(|c| &c.votes),
        }
    }

    /// List view: everything but the comments themselves
    pub fn summary(&self) -> api::Post {
        api::Post {
            id: self.id,
            community: self.community,
            author_id: self.author_id,
            date: self.date,
            edited: self.edited,
            title: self.title.clone(),
            description: self.description.clone(),
            media: self.media.clone(),
            votes: self.votes.count(),
            num_comments: self.comments.len(),
            comments: Vec::new(),
        }
    }

    pub fn detail(&self) -> api::Post {
        api::Post {
            comments: self.comments.to_api(),
            ..self.summary()
        }
    }
}
