//! In-memory user repository guarded by a Tokio lock.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use tokengate_core::error::AppError;
use tokengate_core::result::AppResult;
use tokengate_entity::user::{CreateUser, UpdateProfile, User};

use crate::repositories::UserRepository;

/// In-memory [`UserRepository`] enforcing the same uniqueness rules as the
/// database schema.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl MemoryUserRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a stored user wholesale.
    pub async fn put(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }

    async fn modify<F>(&self, user_id: Uuid, apply: F) -> AppResult<User>
    where
        F: FnOnce(&mut User) + Send,
    {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))?;
        apply(user);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create(&self, data: &CreateUser) -> AppResult<User> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.username == data.username) {
            return Err(AppError::conflict("username already used"));
        }
        if users.values().any(|u| u.email.eq_ignore_ascii_case(&data.email)) {
            return Err(AppError::conflict("email already used"));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: data.username.clone(),
            email: data.email.clone(),
            password_hash: data.password_hash.clone(),
            first_name: data.first_name.clone(),
            last_name: data.last_name.clone(),
            phone_number: data.phone_number.clone(),
            birth_date: data.birth_date,
            is_active: true,
            email_verified: false,
            last_password_change_at: now,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_profile(&self, data: &UpdateProfile) -> AppResult<User> {
        let data = data.clone();
        self.modify(data.id, move |user| {
            if data.first_name.is_some() {
                user.first_name = data.first_name;
            }
            if data.last_name.is_some() {
                user.last_name = data.last_name;
            }
            if data.phone_number.is_some() {
                user.phone_number = data.phone_number;
            }
            if data.birth_date.is_some() {
                user.birth_date = data.birth_date;
            }
        })
        .await
    }

    async fn update_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let password_hash = password_hash.to_string();
        self.modify(user_id, move |user| {
            user.password_hash = password_hash;
            user.last_password_change_at = changed_at;
        })
        .await
        .map(|_| ())
    }

    async fn set_active(&self, user_id: Uuid, active: bool) -> AppResult<()> {
        self.modify(user_id, move |user| user.is_active = active)
            .await
            .map(|_| ())
    }

    async fn mark_email_verified(&self, user_id: Uuid) -> AppResult<()> {
        self.modify(user_id, |user| user.email_verified = true)
            .await
            .map(|_| ())
    }
}
