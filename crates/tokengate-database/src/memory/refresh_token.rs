//! In-memory refresh token repository.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use tokengate_core::error::AppError;
use tokengate_core::result::AppResult;
use tokengate_entity::token::{NewRefreshToken, RefreshToken};

use crate::repositories::RefreshTokenRepository;

/// In-memory [`RefreshTokenRepository`]. Rows are kept in insertion order so
/// rows created within the same clock tick still sort oldest first.
#[derive(Debug, Clone, Default)]
pub struct MemoryRefreshTokenRepository {
    rows: Arc<RwLock<Vec<RefreshToken>>>,
}

impl MemoryRefreshTokenRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every row of a user, active or not, oldest first.
    pub async fn all_for_user(&self, user_id: Uuid) -> Vec<RefreshToken> {
        self.rows
            .read()
            .await
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RefreshTokenRepository for MemoryRefreshTokenRepository {
    async fn create(&self, data: &NewRefreshToken) -> AppResult<RefreshToken> {
        let mut rows = self.rows.write().await;

        if rows.iter().any(|r| r.token == data.token) {
            return Err(AppError::conflict("Refresh token already issued"));
        }

        let row = RefreshToken {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            token: data.token.clone(),
            is_active: true,
            created_at: Utc::now(),
            expires_at: data.expires_at,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn find_by_token(&self, token: &str) -> AppResult<Option<RefreshToken>> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .find(|r| r.token == token)
            .cloned())
    }

    async fn list_active_by_user(&self, user_id: Uuid) -> AppResult<Vec<RefreshToken>> {
        let mut active: Vec<RefreshToken> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|r| r.user_id == user_id && r.is_active)
            .cloned()
            .collect();
        // Stable sort keeps insertion order for equal timestamps.
        active.sort_by_key(|r| r.created_at);
        Ok(active)
    }

    async fn deactivate(&self, ids: &[Uuid]) -> AppResult<u64> {
        let mut rows = self.rows.write().await;
        let mut changed = 0;
        for row in rows.iter_mut().filter(|r| r.is_active && ids.contains(&r.id)) {
            row.is_active = false;
            changed += 1;
        }
        Ok(changed)
    }

    async fn deactivate_if_active(&self, id: Uuid) -> AppResult<bool> {
        let mut rows = self.rows.write().await;
        match rows.iter_mut().find(|r| r.id == id && r.is_active) {
            Some(row) => {
                row.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn deactivate_all_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        let mut rows = self.rows.write().await;
        let mut changed = 0;
        for row in rows
            .iter_mut()
            .filter(|r| r.user_id == user_id && r.is_active)
        {
            row.is_active = false;
            changed += 1;
        }
        Ok(changed)
    }
}
