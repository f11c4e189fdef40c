// Experience service - CRUD for watching experiences, including lazy match
// resolution, season derivation, and best-effort location classification.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use futures::future::join_all;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::infrastructure::database::Database;
use crate::infrastructure::middleware::ViewerContext;
use crate::models::{
    ExperienceInput, ExperienceView, MatchRecord, UserStats, WatchingExperience,
};
use crate::services::location_classifier::LocationClassifier;
use crate::services::stats::compute_user_stats;

/// Season string for a match played in `year`, e.g. 2024 -> "2024/25".
pub fn season_for(year: i32) -> String {
    format!("{}/{:02}", year, (year + 1) % 100)
}

/// Match dates arrive as RFC 3339 or as the datetime-local formats the
/// client's form controls produce.
pub fn parse_match_date(s: &str) -> AppResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default()));
    }
    Err(AppError::Validation(format!("Invalid match date: {}", s)))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Clone)]
pub struct ExperienceService {
    db: Arc<Database>,
    classifier: Arc<dyn LocationClassifier>,
}

impl ExperienceService {
    pub fn new(db: Arc<Database>, classifier: Arc<dyn LocationClassifier>) -> Self {
        Self { db, classifier }
    }

    /// Create an experience for the viewer, resolving or creating the
    /// match it references.
    pub async fn create(
        &self,
        viewer: &ViewerContext,
        input: &ExperienceInput,
    ) -> AppResult<WatchingExperience> {
        let (home_team, away_team, match_date_raw, competition, watching_location) = match (
            non_empty(&input.home_team),
            non_empty(&input.away_team),
            non_empty(&input.match_date),
            non_empty(&input.competition),
            non_empty(&input.watching_location),
        ) {
            (Some(h), Some(a), Some(d), Some(c), Some(w)) => (h, a, d, c, w),
            _ => return Err(AppError::Validation("Missing required fields".to_string())),
        };
        let rating = input
            .rating
            .ok_or_else(|| AppError::Validation("Missing required fields".to_string()))?;
        if !(1..=5).contains(&rating) {
            return Err(AppError::Validation(
                "Rating must be between 1 and 5".to_string(),
            ));
        }

        let match_date = parse_match_date(match_date_raw)?;
        let match_id = self
            .resolve_match(home_team, away_team, match_date, competition, input)
            .await?;

        let ai_categorized_location = self
            .classifier
            .categorize(watching_location, input.location_details.as_deref())
            .await;

        let now = Utc::now();
        let experience = WatchingExperience {
            id: Uuid::new_v4().to_string(),
            user_id: viewer.user_id.clone(),
            match_id: Some(match_id),
            custom_match_description: input.custom_match_description.clone(),
            watching_location: watching_location.to_string(),
            location_details: non_empty(&input.location_details).map(str::to_string),
            rating,
            review: non_empty(&input.review).map(str::to_string),
            watched_at: match_date,
            is_public: true,
            ai_categorized_location,
            created_at: now,
            updated_at: now,
        };
        self.db.insert_experience(&experience).await?;
        Ok(experience)
    }

    /// Update an experience owned by the viewer. When the four match
    /// fields are all supplied, the linked match is rewritten in place
    /// (or created if the experience had none). Absent fields keep their
    /// stored values.
    pub async fn update(
        &self,
        viewer: &ViewerContext,
        experience_id: &str,
        input: &ExperienceInput,
    ) -> AppResult<WatchingExperience> {
        let existing = self
            .db
            .get_experience_owned(experience_id, &viewer.user_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("Experience not found or unauthorized".to_string())
            })?;

        if let Some(rating) = input.rating {
            if !(1..=5).contains(&rating) {
                return Err(AppError::Validation(
                    "Rating must be between 1 and 5".to_string(),
                ));
            }
        }

        let mut match_id = existing.match_id.clone();
        let mut watched_at = existing.watched_at;
        if let (Some(home_team), Some(away_team), Some(match_date_raw), Some(competition)) = (
            non_empty(&input.home_team),
            non_empty(&input.away_team),
            non_empty(&input.match_date),
            non_empty(&input.competition),
        ) {
            let match_date = parse_match_date(match_date_raw)?;
            watched_at = match_date;
            match match_id.as_deref() {
                Some(id) => {
                    // Rewrites the shared match row; other experiences
                    // referencing the same match see the new details.
                    let mut m = self.db.get_match(id).await?.ok_or_else(|| {
                        AppError::DatabaseError(format!(
                            "Experience {} references missing match {}",
                            experience_id, id
                        ))
                    })?;
                    m.home_team = home_team.to_string();
                    m.away_team = away_team.to_string();
                    m.home_score = input.home_score;
                    m.away_score = input.away_score;
                    m.match_date = match_date;
                    m.competition = competition.to_string();
                    m.venue = non_empty(&input.venue).map(str::to_string);
                    m.season = season_for(match_date.year());
                    self.db.update_match(&m).await?;
                }
                None => {
                    let m = new_match(home_team, away_team, match_date, competition, input);
                    self.db.insert_match(&m).await?;
                    match_id = Some(m.id);
                }
            }
        }

        let updated = WatchingExperience {
            id: existing.id,
            user_id: existing.user_id,
            match_id,
            custom_match_description: input
                .custom_match_description
                .clone()
                .or(existing.custom_match_description),
            watching_location: non_empty(&input.watching_location)
                .map(str::to_string)
                .unwrap_or(existing.watching_location),
            location_details: non_empty(&input.location_details)
                .map(str::to_string)
                .or(existing.location_details),
            rating: input.rating.unwrap_or(existing.rating),
            review: non_empty(&input.review)
                .map(str::to_string)
                .or(existing.review),
            watched_at,
            is_public: existing.is_public,
            ai_categorized_location: existing.ai_categorized_location,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };
        self.db.update_experience(&updated).await?;
        Ok(updated)
    }

    /// Delete an experience owned by the viewer, media rows first. The
    /// schema cascades, but the explicit delete keeps the behaviour
    /// independent of foreign-key enforcement being switched on.
    pub async fn delete(&self, viewer: &ViewerContext, experience_id: &str) -> AppResult<()> {
        self.db
            .get_experience_owned(experience_id, &viewer.user_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("Experience not found or unauthorized".to_string())
            })?;

        self.db.delete_media_for_experience(experience_id).await?;
        self.db.delete_experience(experience_id).await?;
        Ok(())
    }

    /// The viewer's own experiences with media attached, plus their
    /// profile stats.
    pub async fn list_own(
        &self,
        viewer: &ViewerContext,
    ) -> AppResult<(Vec<ExperienceView>, UserStats)> {
        let mut experiences = self.db.experiences_for_user(&viewer.user_id).await?;
        let stats = compute_user_stats(&experiences);

        let media_lookups = experiences
            .iter()
            .map(|e| self.db.media_for_experience(&e.id));
        let media = join_all(media_lookups).await;
        for (experience, media) in experiences.iter_mut().zip(media) {
            experience.media = media?;
        }

        Ok((experiences, stats))
    }

    async fn resolve_match(
        &self,
        home_team: &str,
        away_team: &str,
        match_date: DateTime<Utc>,
        competition: &str,
        input: &ExperienceInput,
    ) -> AppResult<String> {
        // Matches are keyed by home team alone: every experience naming
        // the same home side shares one match row.
        if let Some(existing) = self.db.find_match_by_home_team(home_team).await? {
            return Ok(existing.id);
        }
        let m = new_match(home_team, away_team, match_date, competition, input);
        self.db.insert_match(&m).await?;
        Ok(m.id)
    }
}

fn new_match(
    home_team: &str,
    away_team: &str,
    match_date: DateTime<Utc>,
    competition: &str,
    input: &ExperienceInput,
) -> MatchRecord {
    let now = Utc::now();
    MatchRecord {
        id: Uuid::new_v4().to_string(),
        home_team: home_team.to_string(),
        away_team: away_team.to_string(),
        home_score: input.home_score,
        away_score: input.away_score,
        match_date,
        competition: competition.to_string(),
        venue: non_empty(&input.venue).map(str::to_string),
        season: season_for(match_date.year()),
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::services::location_classifier::NoopClassifier;

    fn viewer(id: &str) -> ViewerContext {
        ViewerContext {
            user_id: id.to_string(),
            name: id.to_string(),
            email: format!("{}@example.com", id),
        }
    }

    async fn service() -> (Arc<Database>, ExperienceService) {
        let db = Arc::new(Database::new_in_memory().await.unwrap());
        for id in ["alice", "bob"] {
            db.insert_user(&User {
                id: id.to_string(),
                name: id.to_string(),
                email: format!("{}@example.com", id),
                image: None,
            })
            .await
            .unwrap();
        }
        let svc = ExperienceService::new(db.clone(), Arc::new(NoopClassifier));
        (db, svc)
    }

    fn arsenal_input(rating: i64, location: &str) -> ExperienceInput {
        ExperienceInput {
            home_team: Some("Arsenal".to_string()),
            away_team: Some("Chelsea".to_string()),
            match_date: Some("2024-03-01T15:00".to_string()),
            competition: Some("Premier League".to_string()),
            watching_location: Some(location.to_string()),
            rating: Some(rating),
            ..Default::default()
        }
    }

    #[test]
    fn season_spans_the_year_boundary() {
        assert_eq!(season_for(2024), "2024/25");
        assert_eq!(season_for(1999), "1999/00");
        assert_eq!(season_for(2009), "2009/10");
    }

    #[test]
    fn match_date_formats_are_accepted() {
        assert!(parse_match_date("2024-03-01T15:00").is_ok());
        assert!(parse_match_date("2024-03-01T15:00:00").is_ok());
        assert!(parse_match_date("2024-03-01T15:00:00Z").is_ok());
        assert!(parse_match_date("2024-03-01").is_ok());
        assert!(parse_match_date("next saturday").is_err());
    }

    #[tokio::test]
    async fn rating_bounds_are_enforced() {
        let (_db, svc) = service().await;
        for rating in [0, 6] {
            let result = svc.create(&viewer("alice"), &arsenal_input(rating, "Pub")).await;
            assert!(matches!(result, Err(AppError::Validation(_))));
        }
        for rating in [1, 5] {
            let created = svc
                .create(&viewer("alice"), &arsenal_input(rating, "Pub"))
                .await
                .unwrap();
            assert_eq!(created.rating, rating);
        }
    }

    #[tokio::test]
    async fn missing_required_fields_fail_before_any_write() {
        let (db, svc) = service().await;
        let mut input = arsenal_input(4, "Pub");
        input.competition = None;
        let result = svc.create(&viewer("alice"), &input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(db.find_match_by_home_team("Arsenal").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn matches_are_reused_by_home_team_across_users() {
        let (_db, svc) = service().await;
        let first = svc
            .create(&viewer("alice"), &arsenal_input(4, "Pub"))
            .await
            .unwrap();
        assert!(first.match_id.is_some());
        assert_eq!(first.watched_at, parse_match_date("2024-03-01T15:00").unwrap());

        let second = svc
            .create(&viewer("bob"), &arsenal_input(5, "Home"))
            .await
            .unwrap();
        assert_eq!(first.match_id, second.match_id);
    }

    #[tokio::test]
    async fn created_match_carries_derived_season() {
        let (db, svc) = service().await;
        svc.create(&viewer("alice"), &arsenal_input(4, "Pub"))
            .await
            .unwrap();
        let m = db.find_match_by_home_team("Arsenal").await.unwrap().unwrap();
        assert_eq!(m.season, "2024/25");
        assert_eq!(m.away_team, "Chelsea");
    }

    #[tokio::test]
    async fn update_is_owner_only_and_rewrites_the_match() {
        let (db, svc) = service().await;
        let created = svc
            .create(&viewer("alice"), &arsenal_input(4, "Pub"))
            .await
            .unwrap();

        let not_owner = svc
            .update(&viewer("bob"), &created.id, &arsenal_input(5, "Home"))
            .await;
        assert!(matches!(not_owner, Err(AppError::NotFound(_))));

        let mut input = arsenal_input(5, "Home");
        input.home_score = Some(2);
        input.away_score = Some(1);
        let updated = svc.update(&viewer("alice"), &created.id, &input).await.unwrap();
        assert_eq!(updated.rating, 5);
        assert_eq!(updated.watching_location, "Home");
        assert_eq!(updated.match_id, created.match_id);

        let m = db.get_match(created.match_id.as_deref().unwrap()).await.unwrap().unwrap();
        assert_eq!(m.home_score, Some(2));
        assert_eq!(m.away_score, Some(1));
    }

    #[tokio::test]
    async fn partial_update_keeps_stored_values() {
        let (_db, svc) = service().await;
        let mut input = arsenal_input(4, "Pub");
        input.review = Some("Great atmosphere".to_string());
        let created = svc.create(&viewer("alice"), &input).await.unwrap();

        let patch = ExperienceInput {
            rating: Some(2),
            ..Default::default()
        };
        let updated = svc.update(&viewer("alice"), &created.id, &patch).await.unwrap();
        assert_eq!(updated.rating, 2);
        assert_eq!(updated.watching_location, "Pub");
        assert_eq!(updated.review, Some("Great atmosphere".to_string()));
        assert_eq!(updated.match_id, created.match_id);
    }

    #[tokio::test]
    async fn delete_removes_media_then_experience() {
        let (db, svc) = service().await;
        let created = svc
            .create(&viewer("alice"), &arsenal_input(4, "Pub"))
            .await
            .unwrap();
        db.insert_media(&crate::models::ExperienceMedia {
            id: "md1".to_string(),
            experience_id: created.id.clone(),
            media_type: crate::models::MediaType::Photo,
            media_url: "/media/md1.jpg".to_string(),
            caption: None,
            created_at: Utc::now(),
        })
        .await
        .unwrap();

        let not_owner = svc.delete(&viewer("bob"), &created.id).await;
        assert!(matches!(not_owner, Err(AppError::NotFound(_))));

        svc.delete(&viewer("alice"), &created.id).await.unwrap();
        assert!(db.get_experience(&created.id).await.unwrap().is_none());
        assert!(db.media_for_experience(&created.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_own_orders_by_watched_at_and_attaches_media() {
        let (db, svc) = service().await;
        let mut older = arsenal_input(3, "Pub");
        older.match_date = Some("2024-03-01T15:00".to_string());
        let older = svc.create(&viewer("alice"), &older).await.unwrap();

        let mut newer = arsenal_input(5, "Home");
        newer.match_date = Some("2024-04-01T15:00".to_string());
        let newer = svc.create(&viewer("alice"), &newer).await.unwrap();

        db.insert_media(&crate::models::ExperienceMedia {
            id: "md1".to_string(),
            experience_id: newer.id.clone(),
            media_type: crate::models::MediaType::Photo,
            media_url: "/media/md1.jpg".to_string(),
            caption: None,
            created_at: Utc::now(),
        })
        .await
        .unwrap();

        let (experiences, stats) = svc.list_own(&viewer("alice")).await.unwrap();
        assert_eq!(experiences.len(), 2);
        assert_eq!(experiences[0].id, newer.id);
        assert_eq!(experiences[1].id, older.id);
        assert_eq!(experiences[0].media.len(), 1);
        assert!(experiences[1].media.is_empty());
        assert_eq!(stats.total_experiences, 2);
        assert_eq!(stats.average_rating, 4.0);
    }
}
