use async_trait::async_trait;
use common::{User, UserId, UserUpdate};

use crate::error::Result;

/// Storage for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Stores a new user; fails if the id is taken.
    async fn insert(&self, user: User) -> Result<User>;

    async fn get(&self, id: &UserId) -> Result<Option<User>>;

    /// Every user, ordered by id.
    async fn list_all(&self) -> Result<Vec<User>>;

    /// Overwrites the profile fields of a user.
    async fn update(&self, id: &UserId, update: UserUpdate) -> Result<Option<User>>;

    /// Returns false if no user had that id.
    async fn delete(&self, id: &UserId) -> Result<bool>;
}
