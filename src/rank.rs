/// The fixed rank ladder, ascending. Thresholds are inclusive: sitting exactly
/// on a threshold grants that rank.
pub const RANKS: &[(u64, &str)] = &[
    (0, "New Neighbor"),
    (100, "Familiar Face"),
    (250, "Resident"),
    (500, "Housemate"),
    (1000, "Block Captain"),
];

/// Highest rank whose threshold is <= `points`.
pub fn compute_rank(points: u64) -> &'static str {
    RANKS
        .iter()
        .rev()
        .find(|(threshold, _)| points >= *threshold)
        .map(|(_, name)| *name)
        .unwrap_or(RANKS[0].1)
}

/// Emitted after a point mutation moved a user across a threshold. Acting on
/// it (role grant/revoke, congratulation message) is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankChange {
    pub user_id: String,
    pub old_rank: String,
    pub new_rank: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_points_is_new_neighbor() {
        assert_eq!(compute_rank(0), "New Neighbor");
    }

    #[test]
    fn thresholds_are_inclusive() {
        assert_eq!(compute_rank(99), "New Neighbor");
        assert_eq!(compute_rank(100), "Familiar Face");
        assert_eq!(compute_rank(250), "Resident");
        assert_eq!(compute_rank(500), "Housemate");
        assert_eq!(compute_rank(1000), "Block Captain");
        assert_eq!(compute_rank(250_000), "Block Captain");
    }
}
