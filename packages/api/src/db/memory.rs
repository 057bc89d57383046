use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use gate::Role;
use uuid::Uuid;

use super::users::UserStore;
use crate::models::{NewUser, PushSubscription, User};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    push: HashMap<String, (Uuid, PushSubscription)>,
}

/// In-memory UserStore for tests and database-less runs.
#[derive(Clone, Debug, Default)]
pub struct MemoryUserStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscriptions currently owned by `user_id`.
    pub fn push_subscriptions(&self, user_id: Uuid) -> Vec<PushSubscription> {
        self.tables
            .lock()
            .unwrap()
            .push
            .values()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, subscription)| subscription.clone())
            .collect()
    }

    fn update(&self, id: Uuid, change: impl FnOnce(&mut User)) -> Option<User> {
        let mut tables = self.tables.lock().unwrap();
        let user = tables.users.get_mut(&id)?;
        change(user);
        user.updated_at = Utc::now();
        Some(user.clone())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        Ok(self.tables.lock().unwrap().users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, user: NewUser) -> Result<Option<User>, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        if tables.users.values().any(|u| u.email == user.email) {
            return Ok(None);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: user.email,
            name: user.name,
            password_hash: Some(user.password_hash),
            role: user.role.as_str().to_string(),
            is_banned: false,
            onboarding_complete: false,
            display_name: None,
            bio: None,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(Some(user))
    }

    async fn list(&self) -> Result<Vec<User>, sqlx::Error> {
        let mut users: Vec<User> = self.tables.lock().unwrap().users.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn complete_onboarding(
        &self,
        id: Uuid,
        display_name: &str,
        bio: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        Ok(self.update(id, |user| {
            user.display_name = Some(display_name.to_string());
            user.bio = bio.map(str::to_string);
            user.onboarding_complete = true;
        }))
    }

    async fn set_banned(&self, id: Uuid, is_banned: bool) -> Result<Option<User>, sqlx::Error> {
        Ok(self.update(id, |user| user.is_banned = is_banned))
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<User>, sqlx::Error> {
        Ok(self.update(id, |user| user.role = role.as_str().to_string()))
    }

    async fn save_push_subscription(
        &self,
        user_id: Uuid,
        subscription: &PushSubscription,
    ) -> Result<(), sqlx::Error> {
        self.tables
            .lock()
            .unwrap()
            .push
            .insert(subscription.endpoint.clone(), (user_id, subscription.clone()));
        Ok(())
    }

    async fn delete_push_subscription(
        &self,
        user_id: Uuid,
        endpoint: &str,
    ) -> Result<bool, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        match tables.push.get(endpoint) {
            Some((owner, _)) if *owner == user_id => {
                tables.push.remove(endpoint);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
