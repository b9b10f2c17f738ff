//! In-memory credential store for tests and local runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::User;

use super::UserRepository;

#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserRepository for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> AppResult<User> {
        // Email uniqueness is checked under the write lock.
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) || users.values().any(|u| u.email == user.email) {
            return Err(AppError::DuplicateUser);
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> AppResult<User> {
        let mut users = self.users.write().await;
        let stored = users.get_mut(&user.id).ok_or(AppError::NotFound)?;
        stored.password_hash = user.password_hash;
        stored.is_verified = user.is_verified;
        stored.updated_at = user.updated_at;
        Ok(stored.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str) -> User {
        User::new(Uuid::new_v4(), email.to_string(), "hash".to_string())
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = MemoryUserStore::new();
        let created = store.insert(user("a@x.com")).await.unwrap();

        let by_email = store.find_by_email("a@x.com").await.unwrap().unwrap();
        let by_id = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_email, created);
        assert_eq!(by_id, created);
        assert!(store.find_by_email("b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_email_is_unique() {
        let store = MemoryUserStore::new();
        store.insert(user("a@x.com")).await.unwrap();

        let result = store.insert(user("a@x.com")).await;
        assert!(matches!(result, Err(AppError::DuplicateUser)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_keep_one() {
        let store = MemoryUserStore::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.insert(user("a@x.com")).await.is_ok() })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let store = MemoryUserStore::new();
        let result = store.update(user("a@x.com")).await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_update_keeps_email() {
        let store = MemoryUserStore::new();
        let mut created = store.insert(user("a@x.com")).await.unwrap();

        created.email = "other@x.com".to_string();
        created.mark_verified();
        let updated = store.update(created).await.unwrap();

        assert_eq!(updated.email, "a@x.com");
        assert!(updated.is_verified);
    }
}
