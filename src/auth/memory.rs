use super::UserStore;
use crate::models::{NewUser, UserRecord};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// In-process user store, used when Supabase is not configured and in tests.
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<Mutex<Vec<UserRecord>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, user: UserRecord) -> Self {
        self.users.lock().unwrap().push(user);
        self
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn users(&self) -> Result<MutexGuard<'_, Vec<UserRecord>>> {
        self.users
            .lock()
            .map_err(|_| Error::UserStore("user table lock poisoned".to_string()))
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        Ok(self.users()?.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>> {
        Ok(self.users()?.iter().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<UserRecord> {
        let mut users = self.users()?;
        if users.iter().any(|u| u.email == user.email) {
            return Err(Error::DuplicateEmail(user.email));
        }

        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            name: user.name,
            email: user.email,
            phone: user.phone,
            password_hash: user.password_hash,
            plan: user.plan,
            created_at: Utc::now(),
        };
        users.push(record.clone());
        Ok(record)
    }
}
