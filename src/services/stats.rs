// Stats aggregator - profile summary numbers computed over a user's own
// experience list.

use std::collections::HashMap;

use crate::models::{ExperienceView, UserStats};

/// Count, average rating to one decimal place (0 for an empty list), and
/// the most frequent watching location. Frequency ties break
/// alphabetically so the result is deterministic.
pub fn compute_user_stats(experiences: &[ExperienceView]) -> UserStats {
    let total_experiences = experiences.len();

    let average_rating = if total_experiences > 0 {
        let sum: i64 = experiences.iter().map(|e| e.rating).sum();
        (sum as f64 / total_experiences as f64 * 10.0).round() / 10.0
    } else {
        0.0
    };

    let mut location_counts: HashMap<&str, usize> = HashMap::new();
    for experience in experiences {
        *location_counts
            .entry(experience.watching_location.as_str())
            .or_insert(0) += 1;
    }
    let favorite_location = location_counts
        .into_iter()
        .max_by(|(loc_a, count_a), (loc_b, count_b)| {
            count_a.cmp(count_b).then_with(|| loc_b.cmp(loc_a))
        })
        .map(|(location, _)| location.to_string());

    UserStats {
        total_experiences,
        average_rating,
        favorite_location,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn experience(rating: i64, location: &str) -> ExperienceView {
        let now = Utc::now();
        ExperienceView {
            id: String::new(),
            match_id: None,
            custom_match_description: None,
            home_team: None,
            away_team: None,
            home_score: None,
            away_score: None,
            competition: None,
            venue: None,
            watching_location: location.to_string(),
            location_details: None,
            rating,
            review: None,
            watched_at: now,
            ai_categorized_location: None,
            created_at: now,
            media: Vec::new(),
        }
    }

    #[test]
    fn average_of_three_four_five_is_four() {
        let stats = compute_user_stats(&[
            experience(3, "Pub"),
            experience(4, "Pub"),
            experience(5, "Home"),
        ]);
        assert_eq!(stats.total_experiences, 3);
        assert_eq!(stats.average_rating, 4.0);
    }

    #[test]
    fn average_rounds_to_one_decimal() {
        let stats = compute_user_stats(&[experience(4, "Pub"), experience(5, "Pub")]);
        assert_eq!(stats.average_rating, 4.5);

        let stats = compute_user_stats(&[
            experience(3, "Pub"),
            experience(3, "Pub"),
            experience(4, "Pub"),
        ]);
        assert_eq!(stats.average_rating, 3.3);
    }

    #[test]
    fn empty_list_yields_zero_average_and_no_favorite() {
        let stats = compute_user_stats(&[]);
        assert_eq!(stats.total_experiences, 0);
        assert_eq!(stats.average_rating, 0.0);
        assert_eq!(stats.favorite_location, None);
    }

    #[test]
    fn favorite_location_is_most_frequent() {
        let stats = compute_user_stats(&[
            experience(4, "Pub"),
            experience(4, "Pub"),
            experience(4, "Home"),
        ]);
        assert_eq!(stats.favorite_location, Some("Pub".to_string()));
    }

    #[test]
    fn favorite_location_ties_break_alphabetically() {
        let stats = compute_user_stats(&[experience(4, "Pub"), experience(4, "Home")]);
        assert_eq!(stats.favorite_location, Some("Home".to_string()));
    }
}
