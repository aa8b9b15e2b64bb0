use serenity::model::id::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteChoice {
    Skip,
    Keep,
}

/// One voter's stance on the currently playing track. The vote list is scoped
/// to the current track and wiped whenever it changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub voter: UserId,
    pub choice: VoteChoice,
}

/// Records `voter`'s choice, overwriting any earlier vote from the same user
/// instead of duplicating it.
pub fn cast(votes: &mut Vec<Vote>, voter: UserId, choice: VoteChoice) {
    match votes.iter_mut().find(|vote| vote.voter == voter) {
        Some(vote) => vote.choice = choice,
        None => votes.push(Vote { voter, choice }),
    }
}

/// Removes `voter`'s vote if there is one. Returns false when there was
/// nothing to remove so the caller can report it.
pub fn remove(votes: &mut Vec<Vote>, voter: UserId) -> bool {
    let before = votes.len();
    votes.retain(|vote| vote.voter != voter);
    votes.len() < before
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteTotals {
    pub skip: u64,
    pub keep: u64,
}

impl VoteTotals {
    /// Ties favor skipping.
    pub fn winner(&self) -> VoteChoice {
        if self.skip >= self.keep {
            VoteChoice::Skip
        } else {
            VoteChoice::Keep
        }
    }
}

/// Weighted tally over the vote list. `weight_of` looks up the voter's score
/// (guild XP); a missing score weighs 0 and the vote still counts as cast.
pub fn tally<F>(votes: &[Vote], weight_of: F) -> VoteTotals
where
    F: Fn(UserId) -> u64,
{
    let mut totals = VoteTotals { skip: 0, keep: 0 };

    for vote in votes {
        let weight = weight_of(vote.voter);
        match vote.choice {
            VoteChoice::Skip => totals.skip += weight,
            VoteChoice::Keep => totals.keep += weight,
        }
    }

    totals
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn weights(pairs: &[(u64, u64)]) -> HashMap<UserId, u64> {
        pairs.iter().map(|&(id, xp)| (UserId(id), xp)).collect()
    }

    #[test]
    fn totals_are_weighted_sums() {
        let mut votes = Vec::new();
        cast(&mut votes, UserId(1), VoteChoice::Skip);
        cast(&mut votes, UserId(2), VoteChoice::Keep);
        cast(&mut votes, UserId(3), VoteChoice::Skip);

        let xp = weights(&[(1, 5), (2, 3), (3, 2)]);
        let totals = tally(&votes, |voter| xp.get(&voter).copied().unwrap_or(0));

        assert_eq!(totals, VoteTotals { skip: 7, keep: 3 });
        assert_eq!(totals.winner(), VoteChoice::Skip);
    }

    #[test]
    fn revote_overwrites_instead_of_duplicating() {
        let mut votes = Vec::new();
        cast(&mut votes, UserId(1), VoteChoice::Skip);
        cast(&mut votes, UserId(1), VoteChoice::Keep);
        cast(&mut votes, UserId(1), VoteChoice::Skip);

        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].choice, VoteChoice::Skip);
    }

    #[test]
    fn missing_weight_counts_as_zero() {
        let mut votes = Vec::new();
        cast(&mut votes, UserId(1), VoteChoice::Skip);
        cast(&mut votes, UserId(2), VoteChoice::Keep);

        let xp = weights(&[(2, 4)]);
        let totals = tally(&votes, |voter| xp.get(&voter).copied().unwrap_or(0));

        assert_eq!(totals, VoteTotals { skip: 0, keep: 4 });
        assert_eq!(totals.winner(), VoteChoice::Keep);
    }

    #[test]
    fn tie_favors_skip() {
        let totals = VoteTotals { skip: 3, keep: 3 };
        assert_eq!(totals.winner(), VoteChoice::Skip);

        let empty = tally(&[], |_| 0);
        assert_eq!(empty, VoteTotals { skip: 0, keep: 0 });
        assert_eq!(empty.winner(), VoteChoice::Skip);
    }

    #[test]
    fn remove_absent_vote_reports_false() {
        let mut votes = Vec::new();
        cast(&mut votes, UserId(1), VoteChoice::Keep);

        assert!(!remove(&mut votes, UserId(2)));
        assert_eq!(votes.len(), 1);

        assert!(remove(&mut votes, UserId(1)));
        assert!(votes.is_empty());
    }

    #[test]
    fn skip_triggers_on_first_qualifying_tally() {
        // alice alone at weight 5: 5 >= 0 already decides skip before anyone
        // else has voted.
        let mut votes = Vec::new();
        cast(&mut votes, UserId(1), VoteChoice::Skip);

        let xp = weights(&[(1, 5), (2, 3)]);
        let totals = tally(&votes, |voter| xp.get(&voter).copied().unwrap_or(0));
        assert_eq!(totals.winner(), VoteChoice::Skip);

        // bob's keep afterwards flips nothing: 5 >= 3.
        cast(&mut votes, UserId(2), VoteChoice::Keep);
        let totals = tally(&votes, |voter| xp.get(&voter).copied().unwrap_or(0));
        assert_eq!(totals, VoteTotals { skip: 5, keep: 3 });
        assert_eq!(totals.winner(), VoteChoice::Skip);
    }
}
