use std::collections::HashSet;

use crate::api::{UserId, Vote, VoteCount};

/// Up and down votes cast on a single post or comment.
///
/// Only the voter sets are stored: counts are always their cardinalities, and
/// a user is in at most one of the two sets.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VoteLedger {
    up: HashSet<UserId>,
    down: HashSet<UserId>,
}

impl VoteLedger {
    pub fn new() -> VoteLedger {
        VoteLedger::default()
    }

    pub fn count(&self) -> VoteCount {
        VoteCount {
            up: self.up.len(),
            down: self.down.len(),
        }
    }

    pub fn vote_of(&self, user: &UserId) -> Option<Vote> {
        if self.up.contains(user) {
            Some(Vote::Up)
        } else if self.down.contains(user) {
            Some(Vote::Down)
        } else {
            None
        }
    }

    pub fn upvote(&mut self, user: UserId) -> VoteCount {
        self.cast(user, Vote::Up)
    }

    pub fn downvote(&mut self, user: UserId) -> VoteCount {
        self.cast(user, Vote::Down)
    }

    /// Records `vote` for `user`, switching sides if they had voted the other
    /// way. Voting the same way twice is a no-op, not a toggle.
    pub fn cast(&mut self, user: UserId, vote: Vote) -> VoteCount {
        let (into, from) = match vote {
            Vote::Up => (&mut self.up, &mut self.down),
            Vote::Down => (&mut self.down, &mut self.up),
        };
        from.remove(&user);
        into.insert(user);
        self.count()
    }

    pub fn retract(&mut self, user: &UserId) -> VoteCount {
        self.up.remove(user);
        self.down.remove(user);
        self.count()
    }

    pub fn upvoters(&self) -> impl Iterator<Item = &UserId> {
        self.up.iter()
    }

    pub fn downvoters(&self) -> impl Iterator<Item = &UserId> {
        self.down.iter()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::api::Uuid;
    use bolero::generator::TypeGenerator;

    fn user(n: u8) -> UserId {
        UserId(Uuid::from_u128(n as u128 + 1))
    }

    fn check_invariants(ledger: &VoteLedger) {
        assert!(ledger.up.is_disjoint(&ledger.down), "{ledger:?} has a user on both sides");
        let c = ledger.count();
        assert_eq!(c.up, ledger.upvoters().count());
        assert_eq!(c.down, ledger.downvoters().count());
    }

    #[test]
    fn switching_sides() {
        let mut l = VoteLedger::new();
        assert_eq!(l.downvote(user(0)), VoteCount { up: 0, down: 1 });
        assert_eq!(l.upvote(user(0)), VoteCount { up: 1, down: 0 });
        assert_eq!(l.vote_of(&user(0)), Some(Vote::Up));
        check_invariants(&l);
    }

    #[test]
    fn revote_is_idempotent() {
        let mut l = VoteLedger::new();
        l.upvote(user(0));
        let once = l.clone();
        assert_eq!(l.upvote(user(0)), VoteCount { up: 1, down: 0 });
        assert_eq!(l, once);
    }

    #[test]
    fn retract() {
        let mut l = VoteLedger::new();
        l.upvote(user(0));
        l.downvote(user(1));
        assert_eq!(l.retract(&user(0)), VoteCount { up: 0, down: 1 });
        assert_eq!(l.retract(&user(0)), VoteCount { up: 0, down: 1 });
        assert_eq!(l.vote_of(&user(0)), None);
        assert_eq!(l.vote_of(&user(1)), Some(Vote::Down));
    }

    #[derive(Clone, Debug, bolero::generator::TypeGenerator)]
    enum Op {
        Cast { user: u8, vote: Vote },
        Retract { user: u8 },
    }

    #[test]
    fn matches_last_vote_model() {
        bolero::check!()
            .with_type::<Vec<Op>>()
            .cloned()
            .for_each(|ops| {
                let mut ledger = VoteLedger::new();
                let mut model = HashMap::new();
                for op in ops {
                    let before = ledger.count();
                    match op {
                        Op::Cast { user: u, vote } => {
                            let previous = model.insert(u, vote);
                            let after = ledger.cast(user(u), vote);
                            match (previous, vote) {
                                (Some(p), v) if p == v => assert_eq!(after, before),
                                (Some(Vote::Down), Vote::Up) => assert_eq!(
                                    after,
                                    VoteCount {
                                        up: before.up + 1,
                                        down: before.down - 1
                                    }
                                ),
                                (Some(Vote::Up), Vote::Down) => assert_eq!(
                                    after,
                                    VoteCount {
                                        up: before.up - 1,
                                        down: before.down + 1
                                    }
                                ),
                                _ => (),
                            }
                        }
                        Op::Retract { user: u } => {
                            model.remove(&u);
                            ledger.retract(&user(u));
                        }
                    }
                    check_invariants(&ledger);
                }
                for u in 0..=u8::MAX {
                    assert_eq!(ledger.vote_of(&user(u)), model.get(&u).copied());
                }
            });
    }
}
