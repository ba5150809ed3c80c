use bolero::generator::TypeGenerator;
use crate::{CommentId, Error, PostId};

#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    Hash,
    PartialEq,
    bolero::generator::TypeGenerator,
    serde::Deserialize,
    serde::Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Up,
    Down,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct VoteCount {
    pub up: usize,
    pub down: usize,
}

impl VoteCount {
    pub fn score(&self) -> i64 {
        self.up as i64 - self.down as i64
    }
}

/// Body of a vote request. `None` retracts any vote the user currently has.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct VoteRequest {
    pub vote: Option<Vote>,
}

/// Anything that can receive votes
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum Entity {
    Post(PostId),
    Comment(CommentId),
}

impl Entity {
    pub fn not_found(&self) -> Error {
        match self {
            Entity::Post(p) => Error::PostNotFound(p.0),
            Entity::Comment(c) => Error::CommentNotFound(c.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_request_json() {
        let up: VoteRequest = serde_json::from_str(r#"{"vote":"up"}"#).unwrap();
        assert_eq!(up.vote, Some(Vote::Up));
        let retract: VoteRequest = serde_json::from_str(r#"{"vote":null}"#).unwrap();
        assert_eq!(retract.vote, None);
        assert!(serde_json::from_str::<VoteRequest>(r#"{"vote":"sideways"}"#).is_err());
    }

    #[test]
    fn score() {
        assert_eq!(VoteCount { up: 1, down: 4 }.score(), -3);
        assert_eq!(VoteCount::default().score(), 0);
    }
}
