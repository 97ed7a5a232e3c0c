//! Current user service

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use apvd_api::User;
use apvd_persistence::UserRepository;

const CURRENT_USER_KEY: u8 = 0;

/// Default lifetime of the cached current user
pub const DEFAULT_USER_TTL: Duration = Duration::from_secs(60);

/// Fetches the current user once per TTL window
#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
    cache: Cache<u8, User>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self::with_ttl(repository, DEFAULT_USER_TTL)
    }

    pub fn with_ttl(repository: Arc<dyn UserRepository>, ttl: Duration) -> Self {
        Self {
            repository,
            cache: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
        }
    }

    pub async fn get_current(&self) -> anyhow::Result<User> {
        if let Some(user) = self.cache.get(&CURRENT_USER_KEY).await {
            return Ok(user);
        }

        let user = self.repository.get_current().await?;
        tracing::debug!(username = %user.username, super_admin = user.is_super_admin, "loaded current user");
        self.cache.insert(CURRENT_USER_KEY, user.clone()).await;

        Ok(user)
    }

    pub async fn get_by_usernames(&self, usernames: &[String]) -> anyhow::Result<Vec<User>> {
        self.repository.get_by_usernames(usernames).await
    }

    pub async fn invalidate(&self) {
        self.cache.invalidate(&CURRENT_USER_KEY).await;
    }
}
