use crate::models::ScoreBucket;

/// Population comparisons are withheld from respondents until the
/// distribution has at least this many responses. Applied where results
/// are presented, never inside `calculate_percentile`.
pub const MIN_RESPONSES_FOR_COMPARISON: i64 = 20;

/// Percent of respondents the given score beats, rounded half away from
/// zero. Ties count as not beaten (strictly-below semantics). Returns
/// `None` when the distribution holds no responses at all, so callers can
/// tell "no data yet" apart from the 0th percentile.
pub fn calculate_percentile(score: i32, distribution: &[ScoreBucket]) -> Option<u8> {
    let total: i64 = distribution.iter().map(|b| b.response_count).sum();
    if total == 0 {
        return None;
    }

    let below: i64 = distribution
        .iter()
        .filter(|b| b.score < score)
        .map(|b| b.response_count)
        .sum();

    Some((below as f64 * 100.0 / total as f64).round() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(score: i32, response_count: i64) -> ScoreBucket {
        ScoreBucket {
            score,
            response_count,
        }
    }

    fn quarters() -> Vec<ScoreBucket> {
        vec![bucket(10, 1), bucket(20, 1), bucket(30, 1), bucket(40, 1)]
    }

    #[test]
    fn empty_distribution_has_no_percentile() {
        assert_eq!(calculate_percentile(5, &[]), None);
        assert_eq!(calculate_percentile(-3, &[]), None);
    }

    #[test]
    fn zero_counts_have_no_percentile() {
        let dist = vec![bucket(1, 0), bucket(2, 0)];
        assert_eq!(calculate_percentile(2, &dist), None);
    }

    #[test]
    fn strictly_below_quarters() {
        let dist = quarters();
        assert_eq!(calculate_percentile(20, &dist), Some(25));
        assert_eq!(calculate_percentile(30, &dist), Some(50));
    }

    #[test]
    fn lowest_score_is_zeroth_percentile() {
        let dist = quarters();
        assert_eq!(calculate_percentile(10, &dist), Some(0));
        assert_eq!(calculate_percentile(-100, &dist), Some(0));
    }

    #[test]
    fn highest_observed_score_excludes_own_bucket() {
        let dist = quarters();
        assert_eq!(calculate_percentile(40, &dist), Some(75));
    }

    #[test]
    fn score_above_every_bucket_is_hundredth() {
        let dist = quarters();
        assert_eq!(calculate_percentile(50, &dist), Some(100));
    }

    #[test]
    fn unobserved_score_still_counts_lower_buckets() {
        let dist = vec![bucket(10, 2), bucket(20, 2)];
        assert_eq!(calculate_percentile(15, &dist), Some(50));
    }

    #[test]
    fn halves_round_away_from_zero() {
        // 1 of 8 strictly below -> 12.5 -> 13
        let dist = vec![bucket(1, 1), bucket(2, 7)];
        assert_eq!(calculate_percentile(2, &dist), Some(13));
    }

    #[test]
    fn percentile_is_monotone_in_score() {
        let dist = vec![
            bucket(0, 3),
            bucket(2, 9),
            bucket(4, 17),
            bucket(6, 11),
            bucket(8, 4),
        ];
        let mut previous = 0u8;
        for score in -1..=9 {
            let value = calculate_percentile(score, &dist).unwrap();
            assert!(value >= previous, "percentile dipped at score {score}");
            assert!(value <= 100);
            previous = value;
        }
    }
}
