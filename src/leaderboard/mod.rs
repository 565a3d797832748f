use serde::Serialize;

use crate::metrics::RecognitionTally;

/// Number of ranks shown on a leaderboard.
pub const PODIUM_SIZE: u32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    #[serde(flatten)]
    pub tally: RecognitionTally,
}

/// Standard competition ranking ("1224") over keys already sorted best
/// first: an entry equal to its predecessor shares its rank, otherwise its
/// rank is its 1-based position.
pub fn competition_ranks<K: PartialEq>(sorted_keys: &[K]) -> Vec<u32> {
    let mut ranks: Vec<u32> = Vec::with_capacity(sorted_keys.len());
    for (i, key) in sorted_keys.iter().enumerate() {
        let rank = match ranks.last() {
            Some(&prev) if sorted_keys[i - 1] == *key => prev,
            _ => i as u32 + 1,
        };
        ranks.push(rank);
    }
    ranks
}

/// Rank a tally by kudos received and keep everyone ranked within `podium`,
/// including all entries tied at the cutoff.
pub fn rank_leaderboard(mut tally: Vec<RecognitionTally>, podium: u32) -> Vec<LeaderboardEntry> {
    tally.sort_by(|a, b| {
        b.kudos_count
            .cmp(&a.kudos_count)
            .then_with(|| a.display_name.cmp(&b.display_name))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    let counts: Vec<u64> = tally.iter().map(|t| t.kudos_count).collect();
    let ranks = competition_ranks(&counts);

    tally
        .into_iter()
        .zip(ranks)
        .take_while(|(_, rank)| *rank <= podium)
        .map(|(tally, rank)| LeaderboardEntry { rank, tally })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn tally(id: &str, kudos: u64) -> RecognitionTally {
        RecognitionTally {
            user_id: id.to_string(),
            display_name: id.to_uppercase(),
            dept_code: "ENG".to_string(),
            kudos_count: kudos,
            value_tags: BTreeMap::new(),
        }
    }

    fn ranked(entries: &[LeaderboardEntry]) -> Vec<(&str, u32)> {
        entries
            .iter()
            .map(|e| (e.tally.user_id.as_str(), e.rank))
            .collect()
    }

    #[test]
    fn test_competition_ranks() {
        assert_eq!(competition_ranks(&[10, 10, 7]), vec![1, 1, 3]);
        assert_eq!(competition_ranks(&[9, 8, 8, 8, 2]), vec![1, 2, 2, 2, 5]);
        assert_eq!(competition_ranks(&["a", "b", "c"]), vec![1, 2, 3]);
        assert!(competition_ranks::<u64>(&[]).is_empty());
    }

    #[test]
    fn test_two_way_tie_for_first() {
        let board = rank_leaderboard(vec![tally("c", 7), tally("b", 10), tally("a", 10)], PODIUM_SIZE);
        assert_eq!(ranked(&board), vec![("a", 1), ("b", 1), ("c", 3)]);
    }

    #[test]
    fn test_ties_at_cutoff_are_kept() {
        let board = rank_leaderboard(
            vec![
                tally("a", 9),
                tally("b", 8),
                tally("c", 5),
                tally("d", 5),
                tally("e", 5),
                tally("f", 1),
            ],
            PODIUM_SIZE,
        );
        assert_eq!(
            ranked(&board),
            vec![("a", 1), ("b", 2), ("c", 3), ("d", 3), ("e", 3)]
        );
    }

    #[test]
    fn test_rank_gap_skips_podium() {
        // Three-way tie for first leaves no rank 2 or 3.
        let board = rank_leaderboard(
            vec![tally("a", 4), tally("b", 4), tally("c", 4), tally("d", 3)],
            PODIUM_SIZE,
        );
        assert_eq!(ranked(&board), vec![("a", 1), ("b", 1), ("c", 1)]);
    }

    #[test]
    fn test_empty_and_short_tallies() {
        assert!(rank_leaderboard(Vec::new(), PODIUM_SIZE).is_empty());
        let board = rank_leaderboard(vec![tally("a", 1)], PODIUM_SIZE);
        assert_eq!(ranked(&board), vec![("a", 1)]);
    }
}
