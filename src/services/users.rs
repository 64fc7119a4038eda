//! Users service: lookups and the blocked flag

use crate::{
    error::AppResult,
    models::user::{CreateUser, User, UserQuery},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List users with pagination
    pub async fn list_users(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        self.repository.users.search(query).await
    }

    /// Get a single user
    pub async fn get_user(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Provision a user record
    pub async fn create_user(&self, user: &CreateUser) -> AppResult<User> {
        let created = self.repository.users.create(user).await?;
        tracing::info!(user_id = created.id, "user created");
        Ok(created)
    }

    /// Block or unblock a user. Blocked users keep their open loans and may
    /// still return books; they just cannot borrow new ones.
    pub async fn set_blocked(&self, id: i32, blocked: bool) -> AppResult<User> {
        let user = self.repository.users.set_blocked(id, blocked).await?;
        tracing::info!(user_id = id, blocked, "user blocked flag changed");
        Ok(user)
    }
}
