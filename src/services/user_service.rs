use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::ServiceError;
use crate::auth::{AuthService, Identity};
use crate::database::{Record, Repository};

/// User fields safe to return to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub display_name: String,
}

impl From<&PublicUser> for Identity {
    fn from(user: &PublicUser) -> Self {
        Identity {
            id: user.id.clone(),
            username: user.username.clone(),
            display_name: user.display_name.clone(),
        }
    }
}

/// A freshly issued token and the user it was issued for.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user: PublicUser,
    pub expires_in: String,
}

pub struct UserService {
    users: Repository,
    auth: Arc<AuthService>,
}

impl UserService {
    pub fn new(users: Repository, auth: Arc<AuthService>) -> Self {
        Self { users, auth }
    }

    /// Creates an account and signs the new user in. Username uniqueness is a
    /// scan before the append, so two concurrent registrations of one name can
    /// both succeed.
    pub async fn register(
        &self,
        username: Option<&str>,
        password: Option<&str>,
        display_name: Option<&str>,
    ) -> Result<Session, ServiceError> {
        let (username, password) = require_credentials(username, password)?;

        let existing = self.users.list_all().await?;
        if existing.iter().any(|u| u.text("username") == username) {
            warn!("Registration rejected: username '{}' already taken", username);
            return Err(ServiceError::Conflict("Username already exists".to_string()));
        }

        let user = PublicUser {
            id: format!("user-{}", Uuid::new_v4().simple()),
            username: username.to_string(),
            display_name: display_name
                .filter(|d| !d.is_empty())
                .unwrap_or(username)
                .to_string(),
        };

        let mut record = Record::new();
        record
            .set("id", user.id.as_str())
            .set("username", user.username.as_str())
            .set("password", password)
            .set("display_name", user.display_name.as_str());
        self.users.append(&record).await?;
        info!("Registered user {} ({})", user.username, user.id);

        self.session_for(user)
    }

    /// Exact username + password match; either factor failing looks the same.
    pub async fn login(&self, username: Option<&str>, password: Option<&str>) -> Result<Session, ServiceError> {
        let (username, password) = require_credentials(username, password)?;

        let users = self.users.list_all().await?;
        let Some(found) = users
            .iter()
            .find(|u| u.text("username") == username && u.text("password") == password)
        else {
            warn!("Login failed for '{}'", username);
            return Err(ServiceError::Unauthorized("Invalid username or password".to_string()));
        };

        let user = PublicUser {
            id: found.text("id"),
            username: found.text("username"),
            display_name: found.text("display_name"),
        };
        self.session_for(user)
    }

    fn session_for(&self, user: PublicUser) -> Result<Session, ServiceError> {
        let token = self.auth.issue(&Identity::from(&user))?;
        Ok(Session {
            token,
            user,
            expires_in: self.auth.expires_in().to_string(),
        })
    }
}

fn require_credentials<'a>(
    username: Option<&'a str>,
    password: Option<&'a str>,
) -> Result<(&'a str, &'a str), ServiceError> {
    let username = username.filter(|u| !u.is_empty());
    let password = password.filter(|p| !p.is_empty());
    match (username, password) {
        (Some(u), Some(p)) => Ok((u, p)),
        (u, p) => {
            let mut fields = Vec::new();
            if u.is_none() {
                fields.push("username");
            }
            if p.is_none() {
                fields.push("password");
            }
            Err(ServiceError::missing_fields("Username and password are required", fields))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecurityConfig;
    use crate::database::{schema::USERS, HeaderMode};
    use crate::sheets::{MemoryStore, StoreManager};

    async fn service() -> (UserService, Arc<AuthService>) {
        let manager = Arc::new(StoreManager::with_store(Arc::new(MemoryStore::new())));
        let repo = Repository::new(USERS, manager, HeaderMode::TrustDeclaredOrder);
        repo.initialize().await.unwrap();
        let auth = Arc::new(
            AuthService::new(&SecurityConfig {
                jwt_secret: "test-secret".into(),
                jwt_expires_in: "1h".into(),
            })
            .unwrap(),
        );
        (UserService::new(repo, auth.clone()), auth)
    }

    #[tokio::test]
    async fn register_then_duplicate_conflicts() {
        let (users, auth) = service().await;
        let session = users.register(Some("alice"), Some("p"), Some("Alice")).await.unwrap();
        assert_eq!(session.user.username, "alice");
        assert_eq!(session.user.display_name, "Alice");
        assert!(session.user.id.starts_with("user-"));
        assert_eq!(auth.verify(&session.token).unwrap().id, session.user.id);

        let again = users.register(Some("alice"), Some("other"), None).await;
        assert!(matches!(again, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn display_name_defaults_to_username() {
        let (users, _) = service().await;
        let session = users.register(Some("bob"), Some("pw"), None).await.unwrap();
        assert_eq!(session.user.display_name, "bob");
    }

    #[tokio::test]
    async fn register_requires_username_and_password() {
        let (users, _) = service().await;
        match users.register(Some("carol"), Some(""), None).await {
            Err(ServiceError::Validation { fields, .. }) => assert_eq!(fields, vec!["password"]),
            other => panic!("expected validation error, got {:?}", other),
        }
        match users.login(None, None).await {
            Err(ServiceError::Validation { fields, .. }) => assert_eq!(fields, vec!["username", "password"]),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn login_matches_plaintext_credentials() {
        let (users, _) = service().await;
        let registered = users.register(Some("dave"), Some("s3cret"), Some("Dave")).await.unwrap();

        let session = users.login(Some("dave"), Some("s3cret")).await.unwrap();
        assert_eq!(session.user, registered.user);
        assert_eq!(session.expires_in, "1h");

        assert!(matches!(
            users.login(Some("dave"), Some("wrong")).await,
            Err(ServiceError::Unauthorized(_))
        ));
        assert!(matches!(
            users.login(Some("nobody"), Some("s3cret")).await,
            Err(ServiceError::Unauthorized(_))
        ));
    }
}
