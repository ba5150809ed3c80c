use uuid::Uuid;

use crate::{Error, Time, UserId, VoteCount};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct CommentId(pub Uuid);

/// A comment as sent over the wire.
///
/// Threads travel flat: a thread is a list of comments in pre-order (each
/// comment followed by its replies, in insertion order), and `parent_id` and
/// `depth` locate each comment in it. This keeps both encoding and decoding
/// independent of how deep a thread goes.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Comment {
    pub id: CommentId,

    /// None for top-level comments
    pub parent_id: Option<CommentId>,

    /// 0 for top-level comments
    pub depth: usize,

    pub author_id: UserId,
    pub date: Time,
    pub text: String,
    pub votes: VoteCount,

    /// Number of direct replies
    pub num_replies: usize,
}

/// Direct replies to `parent` in a pre-order comment list
pub fn replies_of<'a>(
    thread: &'a [Comment],
    parent: &'a CommentId,
) -> impl Iterator<Item = &'a Comment> {
    thread.iter().filter(move |c| c.parent_id.as_ref() == Some(parent))
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewComment {
    pub text: String,

    /// None for a top-level comment
    #[serde(default)]
    pub parent_id: Option<CommentId>,
}

impl NewComment {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_required("text", &self.text, crate::MAX_TEXT_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(depth: usize) -> Vec<Comment> {
        let mut parent = None;
        (0..depth)
            .map(|d| {
                let c = Comment {
                    id: CommentId(Uuid::from_u128(d as u128 + 1)),
                    parent_id: parent,
                    depth: d,
                    author_id: UserId::stub(),
                    date: chrono::Utc::now(),
                    text: format!("level {d}"),
                    votes: VoteCount::default(),
                    num_replies: usize::from(d + 1 < depth),
                };
                parent = Some(c.id);
                c
            })
            .collect()
    }

    #[test]
    fn deep_thread_survives_json() {
        let thread = chain(5_000);
        let json = serde_json::to_vec(&thread).unwrap();
        let back: Vec<Comment> = serde_json::from_slice(&json).unwrap();
        assert_eq!(back, thread);
        assert_eq!(back.last().map(|c| c.depth), Some(4_999));
    }

    #[test]
    fn replies_are_found_by_parent() {
        let thread = chain(3);
        let replies = replies_of(&thread, &thread[0].id)
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>();
        assert_eq!(replies, vec!["level 1"]);
        assert_eq!(replies_of(&thread, &thread[2].id).count(), 0);
    }
}
