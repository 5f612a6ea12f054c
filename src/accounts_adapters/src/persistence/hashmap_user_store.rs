use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use accounts_core::{Email, Phone, TokenDigest, User, UserId, UserStore, UserStoreError, Visibility};

/// In-memory user store. Enforces the same uniqueness and versioning rules as
/// the Postgres store.
#[derive(Default, Clone)]
pub struct HashMapUserStore {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl HashMapUserStore {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn find_active(&self, predicate: impl Fn(&User) -> bool) -> Result<User, UserStoreError> {
        let users = self.users.read().await;
        users
            .values()
            .find(|user| user.is_active() && predicate(user))
            .cloned()
            .ok_or(UserStoreError::UserNotFound)
    }
}

fn check_unique<'a>(
    mut others: impl Iterator<Item = &'a User>,
    user: &User,
) -> Result<(), UserStoreError> {
    others.try_for_each(|other| {
        if other.email() == user.email() {
            return Err(UserStoreError::DuplicateEmail);
        }
        if other.phone() == user.phone() {
            return Err(UserStoreError::DuplicatePhone);
        }
        Ok(())
    })
}

#[async_trait::async_trait]
impl UserStore for HashMapUserStore {
    async fn add_user(&self, user: User) -> Result<User, UserStoreError> {
        let mut users = self.users.write().await;
        check_unique(users.values(), &user)?;
        users.insert(*user.id(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: &UserId, visibility: Visibility) -> Result<User, UserStoreError> {
        let users = self.users.read().await;
        match users.get(id) {
            Some(user) if visibility == Visibility::All || user.is_active() => Ok(user.clone()),
            _ => Err(UserStoreError::UserNotFound),
        }
    }

    async fn find_by_email(&self, email: &Email) -> Result<User, UserStoreError> {
        self.find_active(|user| user.email() == email).await
    }

    async fn find_by_phone(&self, phone: &Phone) -> Result<User, UserStoreError> {
        self.find_active(|user| user.phone() == phone).await
    }

    async fn find_by_password_reset_token(
        &self,
        digest: &TokenDigest,
    ) -> Result<User, UserStoreError> {
        self.find_active(|user| {
            user.password_reset()
                .is_some_and(|pending| &pending.digest == digest)
        })
        .await
    }

    async fn update_user(&self, user: &User) -> Result<User, UserStoreError> {
        let mut users = self.users.write().await;
        let stored = users.get(user.id()).ok_or(UserStoreError::UserNotFound)?;
        if stored.version() != user.version() {
            return Err(UserStoreError::Conflict);
        }
        check_unique(users.values().filter(|other| other.id() != user.id()), user)?;

        let mut record = user.to_record();
        record.version += 1;
        let saved = User::from(record);
        users.insert(*saved.id(), saved.clone());
        Ok(saved)
    }
}
