use async_trait::async_trait;

use apvd_api::User;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_current(&self) -> anyhow::Result<User>;

    async fn get_by_usernames(&self, usernames: &[String]) -> anyhow::Result<Vec<User>>;
}
