use std::sync::Arc;

use crate::{
    config::Config,
    infrastructure::database::Database,
    infrastructure::media_storage::{DiskMediaStorage, MediaStorage},
    infrastructure::middleware::HasDatabase,
    services::experience_service::ExperienceService,
    services::feed_service::FeedService,
    services::friendship_service::FriendshipService,
    services::location_classifier::{classifier_from_config, LocationClassifier},
};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub experiences: ExperienceService,
    pub friendships: FriendshipService,
    pub feed: FeedService,
    pub storage: Arc<dyn MediaStorage>,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db = Arc::new(Database::connect(&config.database.url).await?);
        db.initialize().await?;

        let storage: Arc<dyn MediaStorage> = Arc::new(DiskMediaStorage::new(&config.media.root));
        let classifier = classifier_from_config(&config.classifier);

        Ok(Self::with_parts(db, storage, classifier, config))
    }

    /// Assemble state from pre-built collaborators; used by tests to
    /// substitute in-memory and stub implementations.
    pub fn with_parts(
        db: Arc<Database>,
        storage: Arc<dyn MediaStorage>,
        classifier: Arc<dyn LocationClassifier>,
        config: Config,
    ) -> Self {
        let experiences = ExperienceService::new(db.clone(), classifier);
        let friendships = FriendshipService::new(db.clone());
        let feed = FeedService::new(db.clone());
        Self {
            db,
            experiences,
            friendships,
            feed,
            storage,
            config,
        }
    }
}

impl HasDatabase for AppState {
    fn database(&self) -> &Arc<Database> {
        &self.db
    }
}
