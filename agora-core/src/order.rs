use std::cmp::Reverse;

use crate::{
    api::{Order, OrderType, SortBy},
    Listed,
};

pub trait OrderExt {
    fn sort(&self, posts: &mut [Listed]);
}

impl OrderExt for Order {
    /// Ties are broken by creation order, so that the result does not depend
    /// on how posts were collected. Score ties show the newest posts first in
    /// both directions.
    fn sort(&self, posts: &mut [Listed]) {
        match (self.by, self.direction) {
            (SortBy::CreationDate, OrderType::Asc) => {
                posts.sort_unstable_by_key(|p| (p.post.date, p.seq))
            }
            (SortBy::CreationDate, OrderType::Desc) => {
                posts.sort_unstable_by_key(|p| Reverse((p.post.date, p.seq)))
            }
            (SortBy::Score, OrderType::Asc) => posts
                .sort_unstable_by_key(|p| (p.post.votes.score(), Reverse((p.post.date, p.seq)))),
            (SortBy::Score, OrderType::Desc) => posts.sort_unstable_by_key(|p| {
                (Reverse(p.post.votes.score()), Reverse((p.post.date, p.seq)))
            }),
            (SortBy::Activity, OrderType::Asc) => {
                posts.sort_unstable_by_key(|p| (p.last_activity, p.seq))
            }
            (SortBy::Activity, OrderType::Desc) => {
                posts.sort_unstable_by_key(|p| Reverse((p.last_activity, p.seq)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::api::{self, PostId, UserId, Uuid, VoteCount};

    fn listed(seq: u64, minutes: i64, up: usize, down: usize, active: i64) -> Listed {
        let date = Utc.timestamp_opt(1_600_000_000, 0).unwrap() + Duration::minutes(minutes);
        Listed {
            seq,
            last_activity: date + Duration::minutes(active),
            post: api::Post {
                id: PostId(Uuid::from_u128(seq as u128 + 1)),
                community: None,
                author_id: UserId::stub(),
                date,
                edited: None,
                title: format!("post {seq}"),
                description: String::new(),
                media: Vec::new(),
                votes: VoteCount { up, down },
                num_comments: 0,
                comments: Vec::new(),
            },
        }
    }

    fn sorted(by: SortBy, direction: OrderType, mut posts: Vec<Listed>) -> Vec<u64> {
        Order { by, direction }.sort(&mut posts);
        posts.into_iter().map(|p| p.seq).collect()
    }

    fn sample() -> Vec<Listed> {
        vec![
            listed(0, 0, 1, 0, 30),
            listed(1, 10, 5, 1, 0),
            listed(2, 10, 0, 3, 5),
            listed(3, 20, 2, 1, 0),
        ]
    }

    #[test]
    fn creation_date() {
        assert_eq!(
            sorted(SortBy::CreationDate, OrderType::Desc, sample()),
            vec![3, 2, 1, 0]
        );
        assert_eq!(
            sorted(SortBy::CreationDate, OrderType::Asc, sample()),
            vec![0, 1, 2, 3]
        );
    }

    #[test]
    fn score() {
        // scores: 1, 4, -3, 1
        assert_eq!(
            sorted(SortBy::Score, OrderType::Desc, sample()),
            vec![1, 3, 0, 2]
        );
        assert_eq!(
            sorted(SortBy::Score, OrderType::Asc, sample()),
            vec![2, 3, 0, 1]
        );
    }

    #[test]
    fn activity() {
        // last activity at minutes: 30, 10, 15, 20
        assert_eq!(
            sorted(SortBy::Activity, OrderType::Desc, sample()),
            vec![0, 3, 2, 1]
        );
        assert_eq!(
            sorted(SortBy::Activity, OrderType::Asc, sample()),
            vec![1, 2, 3, 0]
        );
    }
}
