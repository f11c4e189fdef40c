// Database layer - low-level SQL for the Away Days tables.
// Services own validation and composition; every query lives here.

use chrono::{DateTime, Utc};
use sqlx::sqlite::{Sqlite, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Row};

use crate::error::{AppError, AppResult};
use crate::models::{
    ExperienceMedia, ExperienceView, FeedEntry, Friendship, FriendshipStatus, MatchRecord,
    MediaType, MediaView, User, WatchingExperience,
};

/// Feed page size: the assembler never returns more rows than this.
pub const FEED_LIMIT: i64 = 50;

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect(url: &str) -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect to {}: {}", url, e)))?;
        Ok(Self { pool })
    }

    /// In-memory database for tests. A single connection keeps every query
    /// on the same SQLite memory instance.
    pub async fn new_in_memory() -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to connect to in-memory SQLite: {}", e))
            })?;
        let db = Self { pool };
        db.initialize().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Database health check failed: {}", e)))?;
        Ok(())
    }

    /// Create the persisted layout. `account` and `verification` belong to
    /// the external auth subsystem and are never touched past creation;
    /// `likes` and `comments` are schema-only until their endpoints exist.
    pub async fn initialize(&self) -> AppResult<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS user (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                emailVerified INTEGER,
                image TEXT,
                createdAt TEXT NOT NULL,
                updatedAt TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS session (
                id TEXT PRIMARY KEY,
                expiresAt TEXT NOT NULL,
                token TEXT NOT NULL UNIQUE,
                ipAddress TEXT,
                userAgent TEXT,
                userId TEXT NOT NULL REFERENCES user(id) ON DELETE CASCADE,
                createdAt TEXT NOT NULL,
                updatedAt TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS account (
                id TEXT PRIMARY KEY,
                accountId TEXT NOT NULL,
                providerId TEXT NOT NULL,
                userId TEXT NOT NULL REFERENCES user(id) ON DELETE CASCADE,
                accessToken TEXT,
                refreshToken TEXT,
                idToken TEXT,
                accessTokenExpiresAt TEXT,
                refreshTokenExpiresAt TEXT,
                scope TEXT,
                password TEXT,
                createdAt TEXT NOT NULL,
                updatedAt TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS verification (
                id TEXT PRIMARY KEY,
                identifier TEXT NOT NULL,
                value TEXT NOT NULL,
                expiresAt TEXT NOT NULL,
                createdAt TEXT,
                updatedAt TEXT
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS matches (
                id TEXT PRIMARY KEY,
                homeTeam TEXT NOT NULL,
                awayTeam TEXT NOT NULL,
                homeScore INTEGER,
                awayScore INTEGER,
                matchDate TEXT NOT NULL,
                competition TEXT NOT NULL,
                venue TEXT,
                season TEXT NOT NULL,
                createdAt TEXT NOT NULL,
                updatedAt TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS watchingExperiences (
                id TEXT PRIMARY KEY,
                userId TEXT NOT NULL REFERENCES user(id) ON DELETE CASCADE,
                matchId TEXT REFERENCES matches(id) ON DELETE CASCADE,
                customMatchDescription TEXT,
                watchingLocation TEXT NOT NULL,
                locationDetails TEXT,
                rating INTEGER NOT NULL,
                review TEXT,
                watchedAt TEXT NOT NULL,
                isPublic INTEGER NOT NULL DEFAULT 1,
                aiCategorizedLocation TEXT,
                createdAt TEXT NOT NULL,
                updatedAt TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS friendships (
                id TEXT PRIMARY KEY,
                requesterId TEXT NOT NULL REFERENCES user(id) ON DELETE CASCADE,
                addresseeId TEXT NOT NULL REFERENCES user(id) ON DELETE CASCADE,
                pairKey TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                createdAt TEXT NOT NULL,
                updatedAt TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS experienceMedia (
                id TEXT PRIMARY KEY,
                experienceId TEXT NOT NULL REFERENCES watchingExperiences(id) ON DELETE CASCADE,
                mediaType TEXT NOT NULL,
                mediaUrl TEXT NOT NULL,
                caption TEXT,
                createdAt TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS likes (
                id TEXT PRIMARY KEY,
                userId TEXT NOT NULL REFERENCES user(id) ON DELETE CASCADE,
                experienceId TEXT NOT NULL REFERENCES watchingExperiences(id) ON DELETE CASCADE,
                createdAt TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS comments (
                id TEXT PRIMARY KEY,
                userId TEXT NOT NULL REFERENCES user(id) ON DELETE CASCADE,
                experienceId TEXT NOT NULL REFERENCES watchingExperiences(id) ON DELETE CASCADE,
                content TEXT NOT NULL,
                createdAt TEXT NOT NULL,
                updatedAt TEXT NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_session_token ON session(token)",
            "CREATE INDEX IF NOT EXISTS idx_matches_home_team ON matches(homeTeam)",
            "CREATE INDEX IF NOT EXISTS idx_experiences_user ON watchingExperiences(userId)",
            "CREATE INDEX IF NOT EXISTS idx_experiences_created ON watchingExperiences(createdAt DESC)",
            "CREATE INDEX IF NOT EXISTS idx_friendships_pair ON friendships(pairKey)",
            "CREATE INDEX IF NOT EXISTS idx_media_experience ON experienceMedia(experienceId)",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(format!("Failed to initialize schema: {}", e))
                })?;
        }
        Ok(())
    }

    // ---- users & sessions ----

    pub async fn insert_user(&self, user: &User) -> AppResult<()> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO user (id, name, email, image, createdAt, updatedAt) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.image)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert user: {}", e)))?;
        Ok(())
    }

    pub async fn get_user_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT id, name, email, image FROM user WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get user {}: {}", id, e)))?;
        Ok(row.map(user_from_row))
    }

    pub async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT id, name, email, image FROM user WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to look up user by email: {}", e))
            })?;
        Ok(row.map(user_from_row))
    }

    pub async fn insert_session(
        &self,
        id: &str,
        token: &str,
        user_id: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO session (id, expiresAt, token, userId, createdAt, updatedAt) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(expires_at)
        .bind(token)
        .bind(user_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert session: {}", e)))?;
        Ok(())
    }

    /// Resolve a session token to its user. Expired sessions resolve to None.
    pub async fn session_user(&self, token: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT u.id, u.name, u.email, u.image
            FROM session s
            JOIN user u ON u.id = s.userId
            WHERE s.token = ? AND s.expiresAt > ?
            "#,
        )
        .bind(token)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to resolve session: {}", e)))?;
        Ok(row.map(user_from_row))
    }

    // ---- matches ----

    /// Lookup by home-team name only; see the experience service for why.
    pub async fn find_match_by_home_team(&self, home_team: &str) -> AppResult<Option<MatchRecord>> {
        let row = sqlx::query(
            "SELECT id, homeTeam, awayTeam, homeScore, awayScore, matchDate, competition, venue, season, createdAt, updatedAt FROM matches WHERE homeTeam = ? LIMIT 1",
        )
        .bind(home_team)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to find match: {}", e)))?;
        Ok(row.map(match_from_row))
    }

    pub async fn get_match(&self, id: &str) -> AppResult<Option<MatchRecord>> {
        let row = sqlx::query("SELECT * FROM matches WHERE id = ? LIMIT 1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get match {}: {}", id, e)))?;
        Ok(row.map(match_from_row))
    }

    pub async fn insert_match(&self, m: &MatchRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO matches (id, homeTeam, awayTeam, homeScore, awayScore, matchDate, competition, venue, season, createdAt, updatedAt)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&m.id)
        .bind(&m.home_team)
        .bind(&m.away_team)
        .bind(m.home_score)
        .bind(m.away_score)
        .bind(m.match_date)
        .bind(&m.competition)
        .bind(&m.venue)
        .bind(&m.season)
        .bind(m.created_at)
        .bind(m.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert match: {}", e)))?;
        Ok(())
    }

    pub async fn update_match(&self, m: &MatchRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE matches
            SET homeTeam = ?, awayTeam = ?, homeScore = ?, awayScore = ?, matchDate = ?, competition = ?, venue = ?, season = ?, updatedAt = ?
            WHERE id = ?
            "#,
        )
        .bind(&m.home_team)
        .bind(&m.away_team)
        .bind(m.home_score)
        .bind(m.away_score)
        .bind(m.match_date)
        .bind(&m.competition)
        .bind(&m.venue)
        .bind(&m.season)
        .bind(Utc::now())
        .bind(&m.id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to update match {}: {}", m.id, e)))?;
        Ok(())
    }

    // ---- watching experiences ----

    pub async fn insert_experience(&self, e: &WatchingExperience) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO watchingExperiences
                (id, userId, matchId, customMatchDescription, watchingLocation, locationDetails, rating, review, watchedAt, isPublic, aiCategorizedLocation, createdAt, updatedAt)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&e.id)
        .bind(&e.user_id)
        .bind(&e.match_id)
        .bind(&e.custom_match_description)
        .bind(&e.watching_location)
        .bind(&e.location_details)
        .bind(e.rating)
        .bind(&e.review)
        .bind(e.watched_at)
        .bind(e.is_public)
        .bind(&e.ai_categorized_location)
        .bind(e.created_at)
        .bind(e.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|err| AppError::DatabaseError(format!("Failed to insert experience: {}", err)))?;
        Ok(())
    }

    /// Fetch an experience only when it is owned by `user_id`. Absence and
    /// non-ownership are indistinguishable to the caller.
    pub async fn get_experience_owned(
        &self,
        id: &str,
        user_id: &str,
    ) -> AppResult<Option<WatchingExperience>> {
        let row =
            sqlx::query("SELECT * FROM watchingExperiences WHERE id = ? AND userId = ? LIMIT 1")
                .bind(id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(format!("Failed to get experience {}: {}", id, e))
                })?;
        Ok(row.map(experience_from_row))
    }

    pub async fn get_experience(&self, id: &str) -> AppResult<Option<WatchingExperience>> {
        let row = sqlx::query("SELECT * FROM watchingExperiences WHERE id = ? LIMIT 1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to get experience {}: {}", id, e))
            })?;
        Ok(row.map(experience_from_row))
    }

    pub async fn update_experience(&self, e: &WatchingExperience) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE watchingExperiences
            SET matchId = ?, customMatchDescription = ?, watchingLocation = ?, locationDetails = ?, rating = ?, review = ?, watchedAt = ?, updatedAt = ?
            WHERE id = ?
            "#,
        )
        .bind(&e.match_id)
        .bind(&e.custom_match_description)
        .bind(&e.watching_location)
        .bind(&e.location_details)
        .bind(e.rating)
        .bind(&e.review)
        .bind(e.watched_at)
        .bind(e.updated_at)
        .bind(&e.id)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            AppError::DatabaseError(format!("Failed to update experience {}: {}", e.id, err))
        })?;
        Ok(())
    }

    pub async fn delete_experience(&self, id: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM watchingExperiences WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to delete experience {}: {}", id, e))
            })?;
        Ok(())
    }

    /// A user's experiences joined with their matches, most recently
    /// watched first. Media is attached by the service.
    pub async fn experiences_for_user(&self, user_id: &str) -> AppResult<Vec<ExperienceView>> {
        let rows = sqlx::query(
            r#"
            SELECT e.id, e.matchId, e.customMatchDescription,
                   m.homeTeam, m.awayTeam, m.homeScore, m.awayScore, m.competition, m.venue,
                   e.watchingLocation, e.locationDetails, e.rating, e.review, e.watchedAt,
                   e.aiCategorizedLocation, e.createdAt
            FROM watchingExperiences e
            LEFT JOIN matches m ON m.id = e.matchId
            WHERE e.userId = ?
            ORDER BY e.watchedAt DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to list experiences for user: {}", e))
        })?;

        Ok(rows
            .into_iter()
            .map(|row| ExperienceView {
                id: row.get("id"),
                match_id: row.get("matchId"),
                custom_match_description: row.get("customMatchDescription"),
                home_team: row.get("homeTeam"),
                away_team: row.get("awayTeam"),
                home_score: row.get("homeScore"),
                away_score: row.get("awayScore"),
                competition: row.get("competition"),
                venue: row.get("venue"),
                watching_location: row.get("watchingLocation"),
                location_details: row.get("locationDetails"),
                rating: row.get("rating"),
                review: row.get("review"),
                watched_at: row.get("watchedAt"),
                ai_categorized_location: row.get("aiCategorizedLocation"),
                created_at: row.get("createdAt"),
                media: Vec::new(),
            })
            .collect())
    }

    /// Public experiences owned by any id in `owner_ids`, newest first,
    /// joined with match and author rows, capped at [`FEED_LIMIT`].
    pub async fn feed_experiences(&self, owner_ids: &[String]) -> AppResult<Vec<FeedEntry>> {
        if owner_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT e.id, e.userId, e.matchId, e.customMatchDescription,
                   m.homeTeam, m.awayTeam, m.homeScore, m.awayScore, m.competition, m.venue,
                   e.watchingLocation, e.locationDetails, e.rating, e.review, e.watchedAt,
                   e.aiCategorizedLocation, e.createdAt,
                   u.name AS userName, u.email AS userEmail, u.image AS userImage
            FROM watchingExperiences e
            LEFT JOIN matches m ON m.id = e.matchId
            LEFT JOIN user u ON u.id = e.userId
            WHERE e.isPublic = 1 AND e.userId IN (
            "#,
        );
        let mut separated = qb.separated(",");
        for id in owner_ids {
            separated.push_bind(id);
        }
        qb.push(") ORDER BY e.createdAt DESC LIMIT ");
        qb.push_bind(FEED_LIMIT);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to fetch feed: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(|row| FeedEntry {
                id: row.get("id"),
                user_id: row.get("userId"),
                match_id: row.get("matchId"),
                custom_match_description: row.get("customMatchDescription"),
                home_team: row.get("homeTeam"),
                away_team: row.get("awayTeam"),
                home_score: row.get("homeScore"),
                away_score: row.get("awayScore"),
                competition: row.get("competition"),
                venue: row.get("venue"),
                watching_location: row.get("watchingLocation"),
                location_details: row.get("locationDetails"),
                rating: row.get("rating"),
                review: row.get("review"),
                watched_at: row.get("watchedAt"),
                ai_categorized_location: row.get("aiCategorizedLocation"),
                created_at: row.get("createdAt"),
                user_name: row.get("userName"),
                user_email: row.get("userEmail"),
                user_image: row.get("userImage"),
                media: Vec::new(),
            })
            .collect())
    }

    // ---- friendships ----

    pub async fn find_friendship_by_pair_key(
        &self,
        pair_key: &str,
    ) -> AppResult<Option<Friendship>> {
        let row = sqlx::query("SELECT * FROM friendships WHERE pairKey = ? LIMIT 1")
            .bind(pair_key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to find friendship: {}", e)))?;
        row.map(friendship_from_row).transpose()
    }

    pub async fn insert_friendship(&self, f: &Friendship, pair_key: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO friendships (id, requesterId, addresseeId, pairKey, status, createdAt, updatedAt)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&f.id)
        .bind(&f.requester_id)
        .bind(&f.addressee_id)
        .bind(pair_key)
        .bind(f.status.as_str())
        .bind(f.created_at)
        .bind(f.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert friendship: {}", e)))?;
        Ok(())
    }

    pub async fn get_friendship(&self, id: &str) -> AppResult<Option<Friendship>> {
        let row = sqlx::query("SELECT * FROM friendships WHERE id = ? LIMIT 1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to get friendship {}: {}", id, e))
            })?;
        row.map(friendship_from_row).transpose()
    }

    pub async fn update_friendship_status(
        &self,
        id: &str,
        status: FriendshipStatus,
    ) -> AppResult<()> {
        sqlx::query("UPDATE friendships SET status = ?, updatedAt = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to update friendship {}: {}", id, e))
            })?;
        Ok(())
    }

    /// Every friendship row the user appears in, regardless of status or
    /// direction.
    pub async fn friendships_involving(&self, user_id: &str) -> AppResult<Vec<Friendship>> {
        let rows =
            sqlx::query("SELECT * FROM friendships WHERE requesterId = ? OR addresseeId = ?")
                .bind(user_id)
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(format!("Failed to list friendships: {}", e))
                })?;
        rows.into_iter().map(friendship_from_row).collect()
    }

    /// Accepted edges touching the user, as (requesterId, addresseeId) pairs.
    pub async fn accepted_friend_pairs(&self, user_id: &str) -> AppResult<Vec<(String, String)>> {
        let rows = sqlx::query(
            r#"
            SELECT requesterId, addresseeId FROM friendships
            WHERE status = 'accepted' AND (requesterId = ? OR addresseeId = ?)
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list accepted edges: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get("requesterId"), row.get("addresseeId")))
            .collect())
    }

    // ---- experience media ----

    pub async fn insert_media(&self, m: &ExperienceMedia) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO experienceMedia (id, experienceId, mediaType, mediaUrl, caption, createdAt) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&m.id)
        .bind(&m.experience_id)
        .bind(m.media_type.as_str())
        .bind(&m.media_url)
        .bind(&m.caption)
        .bind(m.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert media: {}", e)))?;
        Ok(())
    }

    pub async fn media_for_experience(&self, experience_id: &str) -> AppResult<Vec<MediaView>> {
        let rows = sqlx::query(
            "SELECT id, mediaType, mediaUrl, caption FROM experienceMedia WHERE experienceId = ?",
        )
        .bind(experience_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list media: {}", e)))?;

        rows.into_iter()
            .map(|row| {
                let media_type: String = row.get("mediaType");
                let media_type = MediaType::parse(&media_type).ok_or_else(|| {
                    AppError::DatabaseError(format!("Unknown media type: {}", media_type))
                })?;
                Ok(MediaView {
                    id: row.get("id"),
                    media_type,
                    media_url: row.get("mediaUrl"),
                    caption: row.get("caption"),
                })
            })
            .collect()
    }

    pub async fn delete_media_for_experience(&self, experience_id: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM experienceMedia WHERE experienceId = ?")
            .bind(experience_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete media: {}", e)))?;
        Ok(())
    }
}

fn user_from_row(row: sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        image: row.get("image"),
    }
}

fn match_from_row(row: sqlx::sqlite::SqliteRow) -> MatchRecord {
    MatchRecord {
        id: row.get("id"),
        home_team: row.get("homeTeam"),
        away_team: row.get("awayTeam"),
        home_score: row.get("homeScore"),
        away_score: row.get("awayScore"),
        match_date: row.get("matchDate"),
        competition: row.get("competition"),
        venue: row.get("venue"),
        season: row.get("season"),
        created_at: row.get("createdAt"),
        updated_at: row.get("updatedAt"),
    }
}

fn experience_from_row(row: sqlx::sqlite::SqliteRow) -> WatchingExperience {
    WatchingExperience {
        id: row.get("id"),
        user_id: row.get("userId"),
        match_id: row.get("matchId"),
        custom_match_description: row.get("customMatchDescription"),
        watching_location: row.get("watchingLocation"),
        location_details: row.get("locationDetails"),
        rating: row.get("rating"),
        review: row.get("review"),
        watched_at: row.get("watchedAt"),
        is_public: row.get("isPublic"),
        ai_categorized_location: row.get("aiCategorizedLocation"),
        created_at: row.get("createdAt"),
        updated_at: row.get("updatedAt"),
    }
}

fn friendship_from_row(row: sqlx::sqlite::SqliteRow) -> AppResult<Friendship> {
    let status: String = row.get("status");
    let status = FriendshipStatus::parse(&status)
        .ok_or_else(|| AppError::DatabaseError(format!("Unknown friendship status: {}", status)))?;
    Ok(Friendship {
        id: row.get("id"),
        requester_id: row.get("requesterId"),
        addressee_id: row.get("addresseeId"),
        status,
        created_at: row.get("createdAt"),
        updated_at: row.get("updatedAt"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_user(id: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            name: id.to_string(),
            email: email.to_string(),
            image: None,
        }
    }

    #[tokio::test]
    async fn session_lookup_honours_expiry() {
        let db = Database::new_in_memory().await.unwrap();
        db.insert_user(&test_user("u1", "u1@example.com"))
            .await
            .unwrap();
        db.insert_session("s1", "live-token", "u1", Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        db.insert_session("s2", "dead-token", "u1", Utc::now() - Duration::hours(1))
            .await
            .unwrap();

        let live = db.session_user("live-token").await.unwrap();
        assert_eq!(live.map(|u| u.id), Some("u1".to_string()));
        assert!(db.session_user("dead-token").await.unwrap().is_none());
        assert!(db.session_user("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn match_lookup_is_by_home_team_only() {
        let db = Database::new_in_memory().await.unwrap();
        let now = Utc::now();
        let m = MatchRecord {
            id: "m1".to_string(),
            home_team: "Arsenal".to_string(),
            away_team: "Chelsea".to_string(),
            home_score: None,
            away_score: None,
            match_date: now,
            competition: "Premier League".to_string(),
            venue: None,
            season: "2024/25".to_string(),
            created_at: now,
            updated_at: now,
        };
        db.insert_match(&m).await.unwrap();

        let found = db.find_match_by_home_team("Arsenal").await.unwrap();
        assert_eq!(found.map(|m| m.id), Some("m1".to_string()));
        assert!(db
            .find_match_by_home_team("Chelsea")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn media_rows_can_be_deleted_per_experience() {
        let db = Database::new_in_memory().await.unwrap();
        db.insert_user(&test_user("u1", "u1@example.com"))
            .await
            .unwrap();
        let now = Utc::now();
        let exp = WatchingExperience {
            id: "e1".to_string(),
            user_id: "u1".to_string(),
            match_id: None,
            custom_match_description: None,
            watching_location: "Pub".to_string(),
            location_details: None,
            rating: 4,
            review: None,
            watched_at: now,
            is_public: true,
            ai_categorized_location: None,
            created_at: now,
            updated_at: now,
        };
        db.insert_experience(&exp).await.unwrap();
        db.insert_media(&ExperienceMedia {
            id: "md1".to_string(),
            experience_id: "e1".to_string(),
            media_type: MediaType::Photo,
            media_url: "/media/md1.jpg".to_string(),
            caption: None,
            created_at: now,
        })
        .await
        .unwrap();

        assert_eq!(db.media_for_experience("e1").await.unwrap().len(), 1);
        db.delete_media_for_experience("e1").await.unwrap();
        assert!(db.media_for_experience("e1").await.unwrap().is_empty());
    }
}
