//! Friend-graph computations over already-loaded id sets.

use std::collections::{HashMap, HashSet};

/// Ids present in both friend lists, ascending.
pub fn mutual_friends(a_friends: &[i64], b_friends: &[i64]) -> Vec<i64> {
    let a: HashSet<i64> = a_friends.iter().copied().collect();
    let mut mutual: Vec<i64> = b_friends
        .iter()
        .copied()
        .filter(|id| a.contains(id))
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    mutual.sort_unstable();
    mutual
}

/// A suggested user and how many of the viewer's friends they are friends with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suggestion {
    pub user_id: i64,
    pub mutual_count: usize,
}

/// Friends-of-friends ranked by mutual friend count (ties by id).
///
/// `friends_of_friends` pairs each of the viewer's friends with that friend's
/// own friend list. Candidates in `exclude` (pending requests, blocks) are
/// dropped, as are the viewer and their existing friends.
pub fn suggest_friends(
    viewer_id: i64,
    viewer_friends: &[i64],
    friends_of_friends: &[(i64, Vec<i64>)],
    exclude: &[i64],
    limit: usize,
) -> Vec<Suggestion> {
    let mut skip: HashSet<i64> = viewer_friends.iter().chain(exclude).copied().collect();
    skip.insert(viewer_id);

    let mut counts: HashMap<i64, usize> = HashMap::new();
    for (_, their_friends) in friends_of_friends {
        let unique: HashSet<i64> = their_friends.iter().copied().collect();
        for candidate in unique {
            if !skip.contains(&candidate) {
                *counts.entry(candidate).or_default() += 1;
            }
        }
    }

    let mut ranked: Vec<Suggestion> = counts
        .into_iter()
        .map(|(user_id, mutual_count)| Suggestion { user_id, mutual_count })
        .collect();
    ranked.sort_by(|a, b| b.mutual_count.cmp(&a.mutual_count).then(a.user_id.cmp(&b.user_id)));
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mutual_friends_is_intersection() {
        assert_eq!(mutual_friends(&[1, 2, 3, 4], &[4, 3, 9, 3]), vec![3, 4]);
        assert!(mutual_friends(&[1], &[]).is_empty());
    }

    #[test]
    fn test_suggestions_rank_by_mutual_count() {
        // viewer 1 is friends with 2 and 3
        let fof = vec![(2, vec![1, 3, 10, 11]), (3, vec![1, 2, 10, 12, 13])];
        let ranked = suggest_friends(1, &[2, 3], &fof, &[12], 10);

        assert_eq!(
            ranked,
            vec![
                Suggestion { user_id: 10, mutual_count: 2 },
                Suggestion { user_id: 11, mutual_count: 1 },
                Suggestion { user_id: 13, mutual_count: 1 },
            ]
        );
    }

    #[test]
    fn test_suggestions_respect_limit() {
        let fof = vec![(2, vec![10, 11, 12])];
        assert_eq!(suggest_friends(1, &[2], &fof, &[], 2).len(), 2);
    }
}
