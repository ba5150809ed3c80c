use std::{
    collections::{hash_map, HashMap},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use chrono::Utc;
use parking_lot::{Mutex, RwLock};

use crate::{
    api::{
        self, CommentId, Entity, Error, NewComment, NewPost, Page, PostId, PostPatch, UserId,
        Uuid, Vote, VoteCount, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
    },
    Comment, FeedAssembler, Identity, Membership, Post,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ForumConfig {
    /// Page size for listings that do not ask for one
    pub default_page_size: usize,

    /// Larger requested page sizes are clamped to this
    pub max_page_size: usize,
}

impl Default for ForumConfig {
    fn default() -> ForumConfig {
        ForumConfig {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

#[derive(Clone)]
pub(crate) struct PostHandle {
    /// Insertion sequence number, breaks ties between posts created at the
    /// same instant
    pub seq: u64,
    pub post: Arc<Mutex<Post>>,
}

/// The post store.
///
/// Each post sits behind its own mutex, which also covers its comment tree
/// and every ledger in it. The maps are only locked long enough to find or
/// register a post. Lock order is map read then post mutex, or post mutex
/// then `comments` write; `comments` is never held while waiting on a post.
pub struct Forum {
    config: ForumConfig,
    identity: Arc<dyn Identity>,
    membership: Arc<dyn Membership>,
    posts: RwLock<HashMap<PostId, PostHandle>>,

    /// Which post each comment belongs to, so that comment votes do not have
    /// to search every tree
    comments: RwLock<HashMap<CommentId, PostId>>,

    next_seq: AtomicU64,
}

impl Forum {
    pub fn new(identity: Arc<dyn Identity>, membership: Arc<dyn Membership>) -> Forum {
        Forum::with_config(ForumConfig::default(), identity, membership)
    }

    pub fn with_config(
        config: ForumConfig,
        identity: Arc<dyn Identity>,
        membership: Arc<dyn Membership>,
    ) -> Forum {
        Forum {
            config,
            identity,
            membership,
            posts: RwLock::new(HashMap::new()),
            comments: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &ForumConfig {
        &self.config
    }

    pub fn membership(&self) -> &dyn Membership {
        &*self.membership
    }

    pub fn feeds(&self) -> FeedAssembler<'_> {
        FeedAssembler::new(self)
    }

    pub fn num_posts(&self) -> usize {
        self.posts.read().len()
    }

    fn check_user(&self, user: &UserId) -> Result<(), Error> {
        match self.identity.resolve_user(user) {
            true => Ok(()),
            false => Err(Error::UserNotFound(user.0)),
        }
    }

    fn post(&self, id: &PostId) -> Result<Arc<Mutex<Post>>, Error> {
        self.posts
            .read()
            .get(id)
            .map(|h| h.post.clone())
            .ok_or(Error::PostNotFound(id.0))
    }

    /// All posts currently in the store, in no particular order
    pub(crate) fn snapshot(&self) -> Vec<PostHandle> {
        self.posts.read().values().cloned().collect()
    }

    pub fn create_post(&self, author: UserId, p: NewPost) -> Result<PostId, Error> {
        p.validate()?;
        self.check_user(&author)?;
        if let Some(c) = &p.community {
            if !self.membership.community_exists(c) {
                return Err(Error::CommunityNotFound(c.0));
            }
        }
        let id = PostId(Uuid::new_v4());
        let post = Post::new(id, author, Utc::now(), p);
        match self.posts.write().entry(id) {
            hash_map::Entry::Occupied(_) => return Err(Error::UuidAlreadyUsed(id.0)),
            hash_map::Entry::Vacant(e) => {
                e.insert(PostHandle {
                    seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                    post: Arc::new(Mutex::new(post)),
                });
            }
        }
        tracing::debug!(post = ?id, ?author, "created post");
        Ok(id)
    }

    /// Only the author of a post may edit it
    pub fn update_post(&self, id: PostId, editor: UserId, patch: PostPatch) -> Result<(), Error> {
        patch.validate()?;
        let post = self.post(&id)?;
        let mut post = post.lock();
        if post.author_id != editor {
            return Err(Error::PermissionDenied);
        }
        post.apply_patch(patch, Utc::now());
        tracing::debug!(post = ?id, "edited post");
        Ok(())
    }

    pub fn add_comment(&self, post: PostId, author: UserId, text: String) -> Result<CommentId, Error> {
        self.submit_comment(
            post,
            author,
            NewComment {
                text,
                parent_id: None,
            },
        )
    }

    pub fn add_reply(
        &self,
        post: PostId,
        parent: CommentId,
        author: UserId,
        text: String,
    ) -> Result<CommentId, Error> {
        self.submit_comment(
            post,
            author,
            NewComment {
                text,
                parent_id: Some(parent),
            },
        )
    }

    /// Adds a top-level comment, or a reply if `c.parent_id` is set. Parent
    /// lookup and insertion happen under the post's lock, and nothing is
    /// inserted if the parent is not found.
    pub fn submit_comment(
        &self,
        post: PostId,
        author: UserId,
        c: NewComment,
    ) -> Result<CommentId, Error> {
        c.validate()?;
        self.check_user(&author)?;
        let handle = self.post(&post)?;
        let mut p = handle.lock();
        let comment = Comment::new(CommentId(Uuid::new_v4()), author, Utc::now(), c.text);
        let id = p.add_comment(c.parent_id, comment)?;
        self.comments.write().insert(id, post);
        tracing::debug!(?post, comment = ?id, parent = ?c.parent_id, "added comment");
        Ok(id)
    }

    pub fn get_comments(&self, post: PostId, page: Page) -> Result<Vec<api::Comment>, Error> {
        let post = self.post(&post)?;
        let post = post.lock();
        Ok(post.comments.page(
            &page,
            self.config.default_page_size,
            self.config.max_page_size,
        ))
    }

    pub fn get_post_detail(&self, post: PostId) -> Result<api::Post, Error> {
        Ok(self.post(&post)?.lock().detail())
    }

    fn post_of(&self, entity: &Entity) -> Result<PostId, Error> {
        match entity {
            Entity::Post(p) => Ok(*p),
            Entity::Comment(c) => self
                .comments
                .read()
                .get(c)
                .copied()
                .ok_or(Error::CommentNotFound(c.0)),
        }
    }

    /// Casts `vote` for `user` on `entity`, or retracts their vote if `vote`
    /// is None. Returns the entity's counts right after the change.
    pub fn vote(&self, entity: Entity, user: UserId, vote: Option<Vote>) -> Result<VoteCount, Error> {
        self.check_user(&user)?;
        let post = self.post(&self.post_of(&entity)?)?;
        let mut post = post.lock();
        let ledger = post.ledger_mut(&entity).ok_or_else(|| {
            tracing::warn!(?entity, "entity is indexed but not in its post");
            entity.not_found()
        })?;
        let count = match vote {
            Some(v) => ledger.cast(user, v),
            None => ledger.retract(&user),
        };
        tracing::debug!(?entity, ?user, ?vote, ?count, "voted");
        Ok(count)
    }

    pub fn upvote(&self, entity: Entity, user: UserId) -> Result<VoteCount, Error> {
        self.vote(entity, user, Some(Vote::Up))
    }

    pub fn downvote(&self, entity: Entity, user: UserId) -> Result<VoteCount, Error> {
        self.vote(entity, user, Some(Vote::Down))
    }

    pub fn retract_vote(&self, entity: Entity, user: UserId) -> Result<VoteCount, Error> {
        self.vote(entity, user, None)
    }

    pub fn vote_of(&self, entity: Entity, user: UserId) -> Result<Option<Vote>, Error> {
        let post = self.post(&self.post_of(&entity)?)?;
        let post = post.lock();
        Ok(post
            .ledger(&entity)
            .ok_or_else(|| entity.not_found())?
            .vote_of(&user))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::thread;

    use super::*;
    use crate::{collab::stub::StubDirectory, api::CommunityId};

    pub(crate) fn forum() -> (Arc<StubDirectory>, Forum) {
        let dir = Arc::new(StubDirectory::default());
        let forum = Forum::new(dir.clone(), dir.clone());
        (dir, forum)
    }

    pub(crate) fn new_post(community: Option<CommunityId>, title: &str) -> NewPost {
        NewPost {
            community,
            title: String::from(title),
            description: String::from("description"),
            media: Vec::new(),
        }
    }

    #[test]
    fn comment_then_reply_shows_in_detail() {
        let (dir, forum) = forum();
        let u = dir.new_user();
        let p = forum.create_post(u, new_post(None, "T")).unwrap();
        let c1 = forum.add_comment(p, u, String::from("hi")).unwrap();
        let r1 = forum.add_reply(p, c1, u, String::from("hello")).unwrap();

        let detail = forum.get_post_detail(p).unwrap();
        assert_eq!(detail.title, "T");
        let thread = detail
            .comments
            .iter()
            .map(|c| (c.id, c.parent_id, c.depth, c.text.as_str(), c.num_replies))
            .collect::<Vec<_>>();
        assert_eq!(
            thread,
            vec![(c1, None, 0, "hi", 1), (r1, Some(c1), 1, "hello", 0)]
        );
    }

    #[test]
    fn very_deep_thread() {
        let (dir, forum) = forum();
        let u = dir.new_user();
        let p = forum.create_post(u, new_post(None, "T")).unwrap();
        let mut parent = forum.add_comment(p, u, String::from("0")).unwrap();
        for i in 1..12_000 {
            parent = forum.add_reply(p, parent, u, format!("{i}")).unwrap();
        }
        forum.upvote(Entity::Comment(parent), u).unwrap();

        let detail = forum.get_post_detail(p).unwrap();
        assert_eq!(detail.num_comments, 12_000);
        let last = detail.comments.last().unwrap();
        assert_eq!((last.id, last.depth), (parent, 11_999));
        assert_eq!(last.votes, VoteCount { up: 1, down: 0 });
        assert_eq!(forum.get_comments(p, Page::default()).unwrap().len(), 12_000);
        assert_eq!(
            forum.feeds().posts_without_comments(&Default::default())[0].num_comments,
            12_000
        );
        drop(forum);
    }

    #[test]
    fn comment_vote_switch() {
        let (dir, forum) = forum();
        let u = dir.new_user();
        let p = forum.create_post(u, new_post(None, "T")).unwrap();
        let c1 = Entity::Comment(forum.add_comment(p, u, String::from("hi")).unwrap());
        assert_eq!(forum.downvote(c1, u).unwrap(), VoteCount { up: 0, down: 1 });
        assert_eq!(forum.upvote(c1, u).unwrap(), VoteCount { up: 1, down: 0 });
        assert_eq!(forum.vote_of(c1, u).unwrap(), Some(Vote::Up));
        assert_eq!(forum.retract_vote(c1, u).unwrap(), VoteCount { up: 0, down: 0 });
        // the post's own ledger is separate
        assert_eq!(forum.vote_of(Entity::Post(p), u).unwrap(), None);
    }

    #[test]
    fn reply_to_missing_parent() {
        let (dir, forum) = forum();
        let u = dir.new_user();
        let p = forum.create_post(u, new_post(None, "T")).unwrap();
        forum.add_comment(p, u, String::from("hi")).unwrap();
        let before = forum.get_post_detail(p).unwrap();
        let missing = CommentId(Uuid::new_v4());
        assert_eq!(
            forum.add_reply(p, missing, u, String::from("hello")),
            Err(Error::CommentNotFound(missing.0))
        );
        let after = forum.get_post_detail(p).unwrap();
        assert_eq!(after.num_comments, before.num_comments);
        assert_eq!(after, before);
    }

    #[test]
    fn reply_under_the_wrong_post() {
        let (dir, forum) = forum();
        let u = dir.new_user();
        let p1 = forum.create_post(u, new_post(None, "one")).unwrap();
        let p2 = forum.create_post(u, new_post(None, "two")).unwrap();
        let c = forum.add_comment(p1, u, String::from("hi")).unwrap();
        assert_eq!(
            forum.add_reply(p2, c, u, String::from("hello")),
            Err(Error::CommentNotFound(c.0))
        );
        assert_eq!(forum.get_post_detail(p2).unwrap().num_comments, 0);
    }

    #[test]
    fn not_found_and_validation() {
        let (dir, forum) = forum();
        let u = dir.new_user();
        let missing = PostId(Uuid::new_v4());
        assert_eq!(
            forum.add_comment(missing, u, String::from("hi")),
            Err(Error::PostNotFound(missing.0))
        );
        assert_eq!(
            forum.get_post_detail(missing),
            Err(Error::PostNotFound(missing.0))
        );
        assert_eq!(
            forum.get_comments(missing, Page::default()),
            Err(Error::PostNotFound(missing.0))
        );
        assert_eq!(
            forum.upvote(Entity::Post(missing), u),
            Err(Error::PostNotFound(missing.0))
        );
        let c = CommentId(Uuid::new_v4());
        assert_eq!(
            forum.downvote(Entity::Comment(c), u),
            Err(Error::CommentNotFound(c.0))
        );
        assert_eq!(
            forum.create_post(u, new_post(None, "")),
            Err(Error::EmptyField(String::from("title")))
        );
        let stranger = UserId(Uuid::new_v4());
        assert_eq!(
            forum.create_post(stranger, new_post(None, "T")),
            Err(Error::UserNotFound(stranger.0))
        );
        let nowhere = CommunityId(Uuid::new_v4());
        assert_eq!(
            forum.create_post(u, new_post(Some(nowhere), "T")),
            Err(Error::CommunityNotFound(nowhere.0))
        );
        let p = forum.create_post(u, new_post(None, "T")).unwrap();
        assert_eq!(
            forum.add_comment(p, u, String::from("   ")),
            Err(Error::EmptyField(String::from("text")))
        );
        assert_eq!(forum.num_posts(), 1);
    }

    #[test]
    fn only_author_edits() {
        let (dir, forum) = forum();
        let author = dir.new_user();
        let other = dir.new_user();
        let p = forum.create_post(author, new_post(None, "T")).unwrap();
        let patch = PostPatch {
            title: Some(String::from("new title")),
            ..PostPatch::default()
        };
        assert_eq!(
            forum.update_post(p, other, patch.clone()),
            Err(Error::PermissionDenied)
        );
        forum.update_post(p, author, patch).unwrap();
        let detail = forum.get_post_detail(p).unwrap();
        assert_eq!(detail.title, "new title");
        assert_eq!(detail.description, "description");
        assert!(detail.edited.is_some());
        assert_eq!(
            forum.update_post(p, author, PostPatch::default()),
            Err(Error::EmptyPatch)
        );
    }

    #[test]
    fn comment_pages() {
        let (dir, forum) = forum();
        let u = dir.new_user();
        let p = forum.create_post(u, new_post(None, "T")).unwrap();
        for i in 0..5 {
            forum.add_comment(p, u, format!("comment {i}")).unwrap();
        }
        let page = forum
            .get_comments(
                p,
                Page {
                    offset: 1,
                    limit: Some(2),
                },
            )
            .unwrap();
        assert_eq!(
            page.iter().map(|c| c.text.as_str()).collect::<Vec<_>>(),
            vec!["comment 1", "comment 2"]
        );
    }

    #[test]
    fn concurrent_votes_and_replies() {
        let (dir, forum) = forum();
        let author = dir.new_user();
        let p = forum.create_post(author, new_post(None, "T")).unwrap();
        let c = forum.add_comment(p, author, String::from("root")).unwrap();
        let users = (0..16).map(|_| dir.new_user()).collect::<Vec<_>>();

        thread::scope(|s| {
            for (i, u) in users.iter().enumerate() {
                let forum = &forum;
                s.spawn(move || {
                    for _ in 0..50 {
                        forum.downvote(Entity::Comment(c), *u).unwrap();
                        forum.upvote(Entity::Comment(c), *u).unwrap();
                        forum.upvote(Entity::Post(p), *u).unwrap();
                    }
                    if i % 2 == 0 {
                        forum.downvote(Entity::Comment(c), *u).unwrap();
                    }
                    forum.add_reply(p, c, *u, format!("reply {i}")).unwrap();
                });
            }
        });

        let detail = forum.get_post_detail(p).unwrap();
        assert_eq!(detail.votes, VoteCount { up: 16, down: 0 });
        assert_eq!(detail.comments[0].votes, VoteCount { up: 8, down: 8 });
        assert_eq!(detail.comments[0].num_replies, 16);
        assert_eq!(api::replies_of(&detail.comments, &c).count(), 16);
        assert_eq!(detail.num_comments, 17);
    }
}
