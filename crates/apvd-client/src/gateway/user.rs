use async_trait::async_trait;
use serde::Deserialize;

use apvd_api::{User, UserGroupRef};
use apvd_persistence::UserRepository;

use super::HttpGateway;

const USER_FIELDS: &str = "id,username,name,userGroups[id,code,name]";

/// Authority granted to super administrators
const ALL_AUTHORITY: &str = "ALL";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserPayload {
    id: String,
    username: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    user_groups: Vec<UserGroupRef>,
    #[serde(default)]
    authorities: Vec<String>,
}

impl From<UserPayload> for User {
    fn from(payload: UserPayload) -> Self {
        let is_super_admin = payload.authorities.iter().any(|a| a == ALL_AUTHORITY);
        User {
            id: payload.id,
            username: payload.username,
            name: payload.name,
            user_groups: payload.user_groups,
            is_super_admin,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UsersPage {
    #[serde(default)]
    users: Vec<UserPayload>,
}

#[async_trait]
impl UserRepository for HttpGateway {
    async fn get_current(&self) -> anyhow::Result<User> {
        let query = [("fields", format!("{},authorities", USER_FIELDS))];
        let payload: UserPayload = self.client.get_json("/api/me", &query).await?;
        let user = User::from(payload);
        tracing::debug!(username = %user.username, super_admin = user.is_super_admin, "fetched current user");
        Ok(user)
    }

    async fn get_by_usernames(&self, usernames: &[String]) -> anyhow::Result<Vec<User>> {
        if usernames.is_empty() {
            return Ok(Vec::new());
        }

        let query = [
            ("fields", USER_FIELDS.to_string()),
            ("filter", format!("username:in:[{}]", usernames.join(","))),
            ("paging", "false".to_string()),
        ];
        let page: UsersPage = self.client.get_json("/api/users", &query).await?;
        Ok(page.users.into_iter().map(User::from).collect())
    }
}
