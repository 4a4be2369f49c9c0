//! Graded similarity for descriptor matches.

use crate::model::normalize_similarity;

/// Score a match from its per-location query percentages and overall coverage.
///
/// The score is the mean of the locations' query percentages, scaled by
/// `coverage / 100` when the coverage is positive. Unparseable percentages
/// count as 0 but still count towards the mean. A match without locations
/// scores 0. The result is clamped to [0, 100].
pub fn similarity_score(query_percentages: &[&str], coverage: &str) -> f64 {
    if query_percentages.is_empty() {
        return 0.0;
    }

    let sum: f64 = query_percentages.iter().map(|p| parse_percentage(p)).sum();
    let mut score = sum / query_percentages.len() as f64;

    let coverage = parse_percentage(coverage);
    if coverage > 0.0 {
        score *= coverage / 100.0;
    }

    normalize_similarity(score)
}

fn parse_percentage(value: &str) -> f64 {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_of_locations() {
        assert_eq!(similarity_score(&["80", "60"], ""), 70.0);
    }

    #[test]
    fn test_scaled_by_coverage() {
        assert_eq!(similarity_score(&["80", "60"], "50"), 35.0);
    }

    #[test]
    fn test_zero_or_bad_coverage_not_applied() {
        assert_eq!(similarity_score(&["90"], "0"), 90.0);
        assert_eq!(similarity_score(&["90"], "n/a"), 90.0);
    }

    #[test]
    fn test_no_locations_scores_zero() {
        assert_eq!(similarity_score(&[], "100"), 0.0);
    }

    #[test]
    fn test_unparseable_location_counts_as_zero() {
        assert_eq!(similarity_score(&["100", "garbage"], ""), 50.0);
        assert_eq!(similarity_score(&["NaN", "40"], ""), 20.0);
    }

    #[test]
    fn test_clamped_to_bounds() {
        assert_eq!(similarity_score(&["250"], ""), 100.0);
        assert_eq!(similarity_score(&["-20"], ""), 0.0);
    }
}
