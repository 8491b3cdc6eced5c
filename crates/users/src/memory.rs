use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{User, UserId, UserUpdate, Validate};
use tokio::sync::RwLock;

use crate::error::{Result, UserError};
use crate::store::UserStore;

/// In-memory user store used when no database is configured and in tests.
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: User) -> Result<User> {
        user.validate()?;
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(UserError::AlreadyExists(user.id));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get(&self, id: &UserId) -> Result<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(users)
    }

    async fn update(&self, id: &UserId, update: UserUpdate) -> Result<Option<User>> {
        update.validate()?;
        let mut users = self.users.write().await;
        Ok(users.get_mut(id).map(|user| {
            user.apply(update);
            user.clone()
        }))
    }

    async fn delete(&self, id: &UserId) -> Result<bool> {
        Ok(self.users.write().await.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::UserType;

    fn vendor(id: &str) -> User {
        User {
            id: UserId::new(id),
            name: "Vera".to_string(),
            address: "3 Vendor Way".to_string(),
            phone: None,
            email: "vera@example.com".to_string(),
            user_type: UserType::Vendor,
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicates() {
        let store = InMemoryUserStore::new();
        store.insert(vendor("v1")).await.unwrap();
        let err = store.insert(vendor("v1")).await.unwrap_err();
        assert!(matches!(err, UserError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_insert_validates() {
        let store = InMemoryUserStore::new();
        let mut user = vendor("v1");
        user.email = String::new();
        let err = store.insert(user).await.unwrap_err();
        assert!(matches!(err, UserError::Validation(ref e) if e.has_field("email")));
    }

    #[tokio::test]
    async fn test_update_keeps_type() {
        let store = InMemoryUserStore::new();
        store.insert(vendor("v1")).await.unwrap();
        let update = UserUpdate {
            name: "Vic".to_string(),
            address: "4 Vendor Way".to_string(),
            phone: Some("12345678".to_string()),
            email: "vic@example.com".to_string(),
        };
        let updated = store
            .update(&UserId::new("v1"), update)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Vic");
        assert_eq!(updated.user_type, UserType::Vendor);
        assert!(
            store
                .update(&UserId::new("nobody"), UserUpdate::from(&updated))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let store = InMemoryUserStore::new();
        store.insert(vendor("b")).await.unwrap();
        store.insert(vendor("a")).await.unwrap();
        let ids: Vec<String> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.id.to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);

        assert!(store.delete(&UserId::new("a")).await.unwrap());
        assert!(!store.delete(&UserId::new("a")).await.unwrap());
    }
}
