/// Reward tiers, highest first: (exclusive lower bound on count, points)
const TIERS: [(u64, u64); 3] = [(400, 100), (200, 50), (100, 25)];

/// Points awarded for `count` events in one run
pub fn score(count: u64) -> u64 {
    TIERS
        .iter()
        .find(|(floor, _)| count > *floor)
        .map(|(_, points)| *points)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries() {
        assert_eq!(score(0), 0);
        assert_eq!(score(100), 0);
        assert_eq!(score(101), 25);
        assert_eq!(score(200), 25);
        assert_eq!(score(201), 50);
        assert_eq!(score(400), 50);
        assert_eq!(score(401), 100);
        assert_eq!(score(u64::MAX), 100);
    }

    #[test]
    fn monotone() {
        for count in 0..1000 {
            assert!(score(count) <= score(count + 1), "score({count})");
        }
    }
}
