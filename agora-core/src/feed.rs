use std::collections::HashSet;

use crate::{
    api::{self, CommunityId, Error, FeedQuery, Order, Page, PostId, Time, UserId},
    Forum, OrderExt,
};

/// A post as seen from a listing, with what is needed to order it
#[derive(Clone, Debug)]
pub struct Listed {
    pub seq: u64,
    pub last_activity: Time,
    pub post: api::Post,
}

/// Read-side views over a `Forum`.
///
/// Listings are fresh snapshots: each post is locked only while it is copied
/// out, so a listing never blocks writers for longer than a single post copy.
/// Listings never include comments, only their count.
pub struct FeedAssembler<'a> {
    forum: &'a Forum,
}

impl<'a> FeedAssembler<'a> {
    pub(crate) fn new(forum: &'a Forum) -> FeedAssembler<'a> {
        FeedAssembler { forum }
    }

    /// All posts, or only those of `q.community` if set
    pub fn posts_without_comments(&self, q: &FeedQuery) -> Vec<api::Post> {
        let res = match q.community {
            None => self.collect(|_| true, q.order(), q.page()),
            Some(c) => self.collect(|p| p == Some(c), q.order(), q.page()),
        };
        tracing::trace!(?q, num_posts = res.len(), "listed posts");
        res
    }

    /// Posts of every community `user` is a member of, newest first. Posts
    /// outside of any community are never part of a user feed.
    pub fn feed_for_user(&self, user: &UserId, page: Page) -> Vec<api::Post> {
        let communities: HashSet<CommunityId> = self.forum.membership().user_communities(user);
        if communities.is_empty() {
            return Vec::new();
        }
        self.collect(
            |p| p.map(|c| communities.contains(&c)).unwrap_or(false),
            Order::default(),
            page,
        )
    }

    /// Posts of the community named `name`, newest first. Unknown names give
    /// an empty feed.
    pub fn community_feed(&self, name: &str, page: Page) -> Vec<api::Post> {
        match self.forum.membership().community_by_name(name) {
            Some(c) => self.collect(|p| p == Some(c), Order::default(), page),
            None => {
                tracing::debug!(community = name, "feed requested for unknown community");
                Vec::new()
            }
        }
    }

    pub fn post_detail(&self, post: PostId) -> Result<api::Post, Error> {
        self.forum.get_post_detail(post)
    }

    pub fn comments(&self, post: PostId, page: Page) -> Result<Vec<api::Comment>, Error> {
        self.forum.get_comments(post, page)
    }

    fn collect<F>(&self, keep: F, order: Order, page: Page) -> Vec<api::Post>
    where
        F: Fn(Option<CommunityId>) -> bool,
    {
        let config = self.forum.config();
        let (offset, limit) = page.bounds(config.default_page_size, config.max_page_size);
        let mut listed = self
            .forum
            .snapshot()
            .into_iter()
            .filter_map(|h| {
                let post = h.post.lock();
                keep(post.community).then(|| Listed {
                    seq: h.seq,
                    last_activity: post.last_activity(),
                    post: post.summary(),
                })
            })
            .collect::<Vec<_>>();
        order.sort(&mut listed);
        listed
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|l| l.post)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::{Entity, OrderType, SortBy, VoteCount},
        store::tests::{forum, new_post},
        Membership,
    };

    fn titles(posts: &[api::Post]) -> Vec<&str> {
        posts.iter().map(|p| p.title.as_str()).collect()
    }

    #[test]
    fn feed_follows_membership() {
        let (dir, forum) = forum();
        let u = dir.new_user();
        let c1 = dir.new_community("c1");
        let c2 = dir.new_community("c2");
        dir.toggle_membership(&u, &c1).unwrap();
        forum.create_post(u, new_post(Some(c1), "in c1")).unwrap();
        forum.create_post(u, new_post(Some(c2), "in c2")).unwrap();
        forum.create_post(u, new_post(None, "nowhere")).unwrap();

        let feed = forum.feeds().feed_for_user(&u, Page::default());
        assert_eq!(titles(&feed), vec!["in c1"]);
        assert!(feed.iter().all(|p| p.comments.is_empty()));

        assert!(!dir.toggle_membership(&u, &c1).unwrap());
        assert!(forum.feeds().feed_for_user(&u, Page::default()).is_empty());

        let stranger = UserId::stub();
        assert!(forum.feeds().feed_for_user(&stranger, Page::default()).is_empty());
    }

    #[test]
    fn list_view_has_counts_but_no_comments() {
        let (dir, forum) = forum();
        let u = dir.new_user();
        let v = dir.new_user();
        let p = forum.create_post(u, new_post(None, "T")).unwrap();
        let c = forum.add_comment(p, u, String::from("hi")).unwrap();
        let r = forum.add_reply(p, c, v, String::from("hello")).unwrap();
        forum.add_reply(p, r, u, String::from("hey")).unwrap();
        forum.upvote(Entity::Post(p), u).unwrap();
        forum.downvote(Entity::Post(p), v).unwrap();

        let list = forum.feeds().posts_without_comments(&FeedQuery::default());
        assert_eq!(list.len(), 1);
        assert!(list[0].comments.is_empty());
        assert_eq!(list[0].num_comments, 3);
        assert_eq!(list[0].votes, VoteCount { up: 1, down: 1 });

        let detail = forum.feeds().post_detail(p).unwrap();
        let depths: Vec<usize> = detail.comments.iter().map(|c| c.depth).collect();
        assert_eq!(depths, vec![0, 1, 2]);
        assert_eq!(forum.feeds().comments(p, Page::all()).unwrap(), detail.comments);
    }

    #[test]
    fn newest_first_and_pages() {
        let (dir, forum) = forum();
        let u = dir.new_user();
        for i in 0..5 {
            forum.create_post(u, new_post(None, &format!("p{i}"))).unwrap();
        }
        let all = forum.feeds().posts_without_comments(&FeedQuery::default());
        assert_eq!(titles(&all), vec!["p4", "p3", "p2", "p1", "p0"]);

        let q = FeedQuery {
            offset: 1,
            limit: Some(2),
            ..FeedQuery::default()
        };
        assert_eq!(
            titles(&forum.feeds().posts_without_comments(&q)),
            vec!["p3", "p2"]
        );

        let q = FeedQuery {
            direction: OrderType::Asc,
            ..FeedQuery::default()
        };
        assert_eq!(
            titles(&forum.feeds().posts_without_comments(&q)),
            vec!["p0", "p1", "p2", "p3", "p4"]
        );
    }

    #[test]
    fn community_filter_and_names() {
        let (dir, forum) = forum();
        let u = dir.new_user();
        let rust = dir.new_community("rust");
        let go = dir.new_community("go");
        forum.create_post(u, new_post(Some(rust), "r1")).unwrap();
        forum.create_post(u, new_post(Some(go), "g1")).unwrap();
        forum.create_post(u, new_post(Some(rust), "r2")).unwrap();

        let q = FeedQuery::community(rust);
        assert_eq!(
            titles(&forum.feeds().posts_without_comments(&q)),
            vec!["r2", "r1"]
        );
        assert_eq!(
            titles(&forum.feeds().community_feed("go", Page::default())),
            vec!["g1"]
        );
        assert!(forum
            .feeds()
            .community_feed("haskell", Page::default())
            .is_empty());
    }

    #[test]
    fn by_score_and_activity() {
        let (dir, forum) = forum();
        let u = dir.new_user();
        let v = dir.new_user();
        let quiet = forum.create_post(u, new_post(None, "quiet")).unwrap();
        let liked = forum.create_post(u, new_post(None, "liked")).unwrap();
        forum.upvote(Entity::Post(liked), u).unwrap();
        forum.upvote(Entity::Post(liked), v).unwrap();
        forum.downvote(Entity::Post(quiet), v).unwrap();
        let q = FeedQuery {
            sort: SortBy::Score,
            ..FeedQuery::default()
        };
        assert_eq!(
            titles(&forum.feeds().posts_without_comments(&q)),
            vec!["liked", "quiet"]
        );

        forum.add_comment(quiet, v, String::from("bump")).unwrap();
        let q = FeedQuery {
            sort: SortBy::Activity,
            ..FeedQuery::default()
        };
        assert_eq!(
            titles(&forum.feeds().posts_without_comments(&q)),
            vec!["quiet", "liked"]
        );
    }
}
