use std::fmt::Write;

use crate::models::DistributionSnapshot;
use crate::percentile;

pub fn build_report(snapshot: &DistributionSnapshot) -> String {
    let total = snapshot.total_responses();
    let mut output = String::new();

    let _ = writeln!(output, "# SelfCheck Population Report");
    let _ = writeln!(
        output,
        "Survey version {} ({} completed responses)",
        snapshot.version, total
    );
    if let Some(refreshed_at) = snapshot.refreshed_at {
        let _ = writeln!(
            output,
            "Aggregate snapshot refreshed at {}",
            refreshed_at.format("%Y-%m-%d %H:%M UTC")
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Score Distribution");

    if snapshot.buckets.is_empty() {
        let _ = writeln!(output, "No responses recorded for this version yet.");
    } else {
        for bucket in snapshot.buckets.iter() {
            let share = if total == 0 {
                0.0
            } else {
                bucket.response_count as f64 * 100.0 / total as f64
            };
            let _ = writeln!(
                output,
                "- score {}: {} responses ({:.1}%)",
                bucket.score, bucket.response_count, share
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Percentile Reference");

    if total < percentile::MIN_RESPONSES_FOR_COMPARISON {
        let _ = writeln!(
            output,
            "Withheld: population comparisons need at least {} responses (currently {}).",
            percentile::MIN_RESPONSES_FOR_COMPARISON,
            total
        );
    } else {
        for bucket in snapshot.buckets.iter() {
            if let Some(value) = percentile::calculate_percentile(bucket.score, &snapshot.buckets)
            {
                let _ = writeln!(
                    output,
                    "- score {} beats {}% of respondents",
                    bucket.score, value
                );
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoreBucket;

    #[test]
    fn empty_snapshot_reports_no_data() {
        let snapshot = DistributionSnapshot {
            version: "1.0".to_string(),
            buckets: Vec::new(),
            refreshed_at: None,
        };
        let report = build_report(&snapshot);
        assert!(report.contains("No responses recorded"));
        assert!(report.contains("0 completed responses"));
    }

    #[test]
    fn small_samples_withhold_comparisons() {
        let snapshot = DistributionSnapshot {
            version: "1.0".to_string(),
            buckets: vec![
                ScoreBucket {
                    score: 2,
                    response_count: 4,
                },
                ScoreBucket {
                    score: 5,
                    response_count: 5,
                },
            ],
            refreshed_at: None,
        };
        let report = build_report(&snapshot);
        assert!(report.contains("Withheld"));
        assert!(!report.contains("beats"));
    }
}
