// Friendship service - friend-graph resolution and the request/respond
// state machine. An unordered pair of users has at most one friendship
// row; the canonical pair key makes the duplicate check a single lookup.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::infrastructure::database::Database;
use crate::infrastructure::middleware::ViewerContext;
use crate::models::{FriendEntry, Friendship, FriendshipStatus};

/// Canonical key for the unordered pair {a, b}: both orientations of a
/// relationship map to the same key.
pub fn pair_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{}:{}", a, b)
    } else {
        format!("{}:{}", b, a)
    }
}

#[derive(Clone)]
pub struct FriendshipService {
    db: Arc<Database>,
}

impl FriendshipService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Every user with an accepted edge touching `user_id`, in either
    /// direction. No ordering guarantee.
    pub async fn friend_ids_of(&self, user_id: &str) -> AppResult<Vec<String>> {
        let pairs = self.db.accepted_friend_pairs(user_id).await?;
        Ok(pairs
            .into_iter()
            .map(|(requester_id, addressee_id)| {
                if requester_id == user_id {
                    addressee_id
                } else {
                    requester_id
                }
            })
            .collect())
    }

    /// Send a friend request to the user registered under `email`.
    pub async fn send_request(&self, viewer: &ViewerContext, email: &str) -> AppResult<Friendship> {
        let target = self
            .db
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if target.id == viewer.user_id {
            return Err(AppError::Validation(
                "Cannot send friend request to yourself".to_string(),
            ));
        }

        let key = pair_key(&viewer.user_id, &target.id);
        if let Some(existing) = self.db.find_friendship_by_pair_key(&key).await? {
            match existing.status {
                FriendshipStatus::Accepted => {
                    return Err(AppError::Validation(
                        "Already friends with this user".to_string(),
                    ));
                }
                FriendshipStatus::Pending => {
                    return Err(AppError::Validation(
                        "Friend request already sent".to_string(),
                    ));
                }
                // A declined or blocked row still occupies the pair; no
                // resurrection path is exposed.
                FriendshipStatus::Declined | FriendshipStatus::Blocked => {
                    return Err(AppError::Validation(
                        "Friend request already sent".to_string(),
                    ));
                }
            }
        }

        let now = Utc::now();
        let friendship = Friendship {
            id: Uuid::new_v4().to_string(),
            requester_id: viewer.user_id.clone(),
            addressee_id: target.id,
            status: FriendshipStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.db.insert_friendship(&friendship, &key).await?;
        Ok(friendship)
    }

    /// Accept or decline a pending request addressed to the viewer.
    pub async fn respond(
        &self,
        viewer: &ViewerContext,
        friendship_id: &str,
        action: &str,
    ) -> AppResult<Friendship> {
        let new_status = match action {
            "accept" => FriendshipStatus::Accepted,
            "decline" => FriendshipStatus::Declined,
            _ => {
                return Err(AppError::Validation(
                    "Action must be 'accept' or 'decline'".to_string(),
                ));
            }
        };

        let friendship = self.db.get_friendship(friendship_id).await?;
        let friendship = match friendship {
            Some(f)
                if f.addressee_id == viewer.user_id && f.status == FriendshipStatus::Pending =>
            {
                f
            }
            // Wrong addressee, already responded, or absent: all collapse
            // to the same 404.
            _ => {
                return Err(AppError::NotFound(
                    "Friend request not found or already responded to".to_string(),
                ));
            }
        };

        self.db
            .update_friendship_status(&friendship.id, new_status)
            .await?;
        self.db
            .get_friendship(&friendship.id)
            .await?
            .ok_or_else(|| AppError::DatabaseError("Friendship vanished during update".to_string()))
    }

    /// Every relationship the viewer appears in, mapped to the other
    /// user's identity plus status and direction.
    pub async fn list_friends(&self, viewer: &ViewerContext) -> AppResult<Vec<FriendEntry>> {
        let friendships = self.db.friendships_involving(&viewer.user_id).await?;

        let mut entries = Vec::with_capacity(friendships.len());
        for friendship in friendships {
            let is_requester = friendship.requester_id == viewer.user_id;
            let friend_user_id = if is_requester {
                &friendship.addressee_id
            } else {
                &friendship.requester_id
            };

            let friend = self
                .db
                .get_user_by_id(friend_user_id)
                .await?
                .ok_or_else(|| {
                    AppError::DatabaseError(format!(
                        "Friendship {} references missing user {}",
                        friendship.id, friend_user_id
                    ))
                })?;

            entries.push(FriendEntry {
                id: friendship.id,
                name: friend.name,
                email: friend.email,
                image: friend.image,
                status: friendship.status,
                is_requester,
            });
        }
        Ok(entries)
    }
}
