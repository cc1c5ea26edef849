//! Auth Repository

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::{
        AccessToken, AuthSession, AuthUser, Credentials, NotificationPreferences, Password,
        ProfileUpdate, SignUp, UserProfile, UserUuid,
    },
    backend::{BackendError, PREFER_RETURN_MINIMAL, PREFER_UPSERT, PostgrestClient, eq_filter},
};

const USERS_TABLE: &str = "users";
const PREFERENCES_TABLE: &str = "user_preferences";

/// Identity and profile persistence.
#[automock]
#[async_trait]
pub trait AuthRepository: Send + Sync {
    /// Register a new identity.
    async fn sign_up(&self, credentials: Credentials) -> Result<SignUp, BackendError>;

    /// Exchange credentials for a session.
    async fn sign_in(&self, credentials: Credentials) -> Result<AuthSession, BackendError>;

    /// End the current session.
    async fn sign_out(&self) -> Result<(), BackendError>;

    /// Replace the signed-in user's password.
    async fn update_password(&self, password: Password) -> Result<(), BackendError>;

    /// Insert the directory row for a new user.
    async fn create_profile(&self, profile: UserProfile) -> Result<(), BackendError>;

    /// Fetch a directory row, if present.
    async fn get_profile(&self, user: UserUuid) -> Result<Option<UserProfile>, BackendError>;

    /// Find which user, if any, holds a username.
    async fn find_username_owner(&self, username: String)
    -> Result<Option<UserUuid>, BackendError>;

    /// Update the editable profile fields.
    async fn update_profile(
        &self,
        user: UserUuid,
        update: ProfileUpdate,
    ) -> Result<(), BackendError>;

    /// Stored notification preferences, if the user ever saved any.
    async fn get_notification_preferences(
        &self,
        user: UserUuid,
    ) -> Result<Option<NotificationPreferences>, BackendError>;

    /// Insert or replace the user's notification preferences.
    async fn save_notification_preferences(
        &self,
        user: UserUuid,
        preferences: NotificationPreferences,
    ) -> Result<(), BackendError>;
}

/// Auth API and `users` table access over REST.
#[derive(Debug, Clone)]
pub struct RestAuthRepository {
    client: PostgrestClient,
}

impl RestAuthRepository {
    #[must_use]
    pub fn new(client: PostgrestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthRepository for RestAuthRepository {
    async fn sign_up(&self, credentials: Credentials) -> Result<SignUp, BackendError> {
        let request = self.client.auth(Method::POST, "signup").json(&json!({
            "email": credentials.email,
            "password": credentials.password.expose(),
        }));

        let sign_up = match self.client.fetch::<SignUpResponse>(request).await? {
            SignUpResponse::Session(session) => {
                let session = session.into_session();

                SignUp {
                    user: session.user.clone(),
                    session: Some(session),
                }
            }
            SignUpResponse::User(user) => SignUp {
                user,
                session: None,
            },
        };

        if let Some(session) = &sign_up.session {
            self.client
                .set_access_token(Some(session.access_token.clone()));
        }

        Ok(sign_up)
    }

    async fn sign_in(&self, credentials: Credentials) -> Result<AuthSession, BackendError> {
        let request = self
            .client
            .auth(Method::POST, "token")
            .query(&[("grant_type", "password")])
            .json(&json!({
                "email": credentials.email,
                "password": credentials.password.expose(),
            }));

        let session = self
            .client
            .fetch::<SessionResponse>(request)
            .await?
            .into_session();

        self.client
            .set_access_token(Some(session.access_token.clone()));

        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        self.client
            .execute(self.client.auth(Method::POST, "logout"))
            .await?;

        self.client.set_access_token(None);

        Ok(())
    }

    async fn update_password(&self, password: Password) -> Result<(), BackendError> {
        let request = self
            .client
            .auth(Method::PUT, "user")
            .json(&json!({ "password": password.expose() }));

        self.client.execute(request).await
    }

    async fn create_profile(&self, profile: UserProfile) -> Result<(), BackendError> {
        let request = self
            .client
            .table(Method::POST, USERS_TABLE)
            .header("Prefer", PREFER_RETURN_MINIMAL)
            .json(&profile);

        self.client.execute(request).await
    }

    async fn get_profile(&self, user: UserUuid) -> Result<Option<UserProfile>, BackendError> {
        let request = self
            .client
            .table(Method::GET, USERS_TABLE)
            .query(&[
                ("select", "id,email,name,username".to_string()),
                ("id", eq_filter(user)),
            ]);

        let rows: Vec<UserProfile> = self.client.fetch(request).await?;

        Ok(rows.into_iter().next())
    }

    async fn find_username_owner(
        &self,
        username: String,
    ) -> Result<Option<UserUuid>, BackendError> {
        #[derive(Deserialize)]
        struct Row {
            id: UserUuid,
        }

        let request = self
            .client
            .table(Method::GET, USERS_TABLE)
            .query(&[("select", "id".to_string()), ("username", eq_filter(username))]);

        let rows: Vec<Row> = self.client.fetch(request).await?;

        Ok(rows.into_iter().next().map(|row| row.id))
    }

    async fn update_profile(
        &self,
        user: UserUuid,
        update: ProfileUpdate,
    ) -> Result<(), BackendError> {
        let request = self
            .client
            .table(Method::PATCH, USERS_TABLE)
            .query(&[("id", eq_filter(user))])
            .header("Prefer", PREFER_RETURN_MINIMAL)
            .json(&update);

        self.client.execute(request).await
    }

    async fn get_notification_preferences(
        &self,
        user: UserUuid,
    ) -> Result<Option<NotificationPreferences>, BackendError> {
        let request = self
            .client
            .table(Method::GET, PREFERENCES_TABLE)
            .query(&[
                ("select", "notifications".to_string()),
                ("user_id", eq_filter(user)),
            ]);

        let rows: Vec<PreferencesRow> = self.client.fetch(request).await?;

        Ok(rows.into_iter().next().and_then(|row| row.notifications))
    }

    async fn save_notification_preferences(
        &self,
        user: UserUuid,
        preferences: NotificationPreferences,
    ) -> Result<(), BackendError> {
        let request = self
            .client
            .table(Method::POST, PREFERENCES_TABLE)
            .header("Prefer", PREFER_UPSERT)
            .json(&json!({
                "user_id": user,
                "notifications": preferences,
            }));

        self.client.execute(request).await
    }
}

#[derive(Debug, Deserialize)]
struct PreferencesRow {
    #[serde(default)]
    notifications: Option<NotificationPreferences>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(SessionResponse),
    User(AuthUser),
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl SessionResponse {
    fn into_session(self) -> AuthSession {
        AuthSession {
            user: self.user,
            access_token: AccessToken::new(self.access_token),
            refresh_token: self.refresh_token.map(AccessToken::new),
            expires_at: self
                .expires_at
                .and_then(|seconds| Timestamp::from_second(seconds).ok()),
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn session_response_decodes_user_and_expiry() -> TestResult {
        let body = r#"{
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 1700000000,
            "refresh_token": "refresh",
            "user": { "id": "0191e7b4-8c4e-7a52-9a0e-3c5d2f1b6a77", "email": "ana@example.com" }
        }"#;

        let session = serde_json::from_str::<SessionResponse>(body)?.into_session();

        assert_eq!(session.access_token.expose(), "jwt");
        assert_eq!(session.user.email.as_deref(), Some("ana@example.com"));
        assert_eq!(session.expires_at, Some(Timestamp::from_second(1_700_000_000)?));

        Ok(())
    }

    #[test]
    fn partial_preferences_keep_the_defaults() -> TestResult {
        let body = r#"[{ "notifications": { "promotions": false } }]"#;

        let rows: Vec<PreferencesRow> = serde_json::from_str(body)?;
        let preferences = rows.into_iter().next().and_then(|row| row.notifications);

        assert_eq!(
            preferences,
            Some(NotificationPreferences {
                promotions: false,
                ..NotificationPreferences::default()
            })
        );

        Ok(())
    }

    #[test]
    fn sign_up_without_session_decodes_as_user() -> TestResult {
        let body = r#"{ "id": "0191e7b4-8c4e-7a52-9a0e-3c5d2f1b6a77", "email": "ana@example.com", "confirmation_sent_at": "2024-05-01T10:00:00Z" }"#;

        let response: SignUpResponse = serde_json::from_str(body)?;

        assert!(
            matches!(response, SignUpResponse::User(_)),
            "expected a bare user, got {response:?}"
        );

        Ok(())
    }
}
