// Feed assembler - merges the viewer's own public experiences with their
// accepted friends' into one reverse-chronological page.

use futures::future::join_all;
use std::sync::Arc;

use crate::error::AppResult;
use crate::infrastructure::database::Database;
use crate::infrastructure::middleware::ViewerContext;
use crate::models::FeedEntry;
use crate::services::friendship_service::FriendshipService;

#[derive(Clone)]
pub struct FeedService {
    db: Arc<Database>,
    friendships: FriendshipService,
}

impl FeedService {
    pub fn new(db: Arc<Database>) -> Self {
        let friendships = FriendshipService::new(db.clone());
        Self { db, friendships }
    }

    pub async fn feed_for(&self, viewer: &ViewerContext) -> AppResult<Vec<FeedEntry>> {
        let mut owner_ids = self.friendships.friend_ids_of(&viewer.user_id).await?;
        // Self always sees their own posts.
        owner_ids.push(viewer.user_id.clone());

        let mut entries = self.db.feed_experiences(&owner_ids).await?;

        let media_lookups = entries.iter().map(|e| self.db.media_for_experience(&e.id));
        let media = join_all(media_lookups).await;
        for (entry, media) in entries.iter_mut().zip(media) {
            entry.media = media?;
        }
        Ok(entries)
    }
}
