//! Session service.

use std::{fmt, sync::Arc};

use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::auth::{
    AuthError, AuthRepository, AuthUser, Credentials, NewAccount, NotificationPreferences,
    Password, ProfileUpdate, UserProfile, UserUuid, ValidationError,
};

/// Minimum password length accepted at sign-up and password change.
pub const MIN_PASSWORD_CHARS: usize = 6;

/// The signed-in user for one client session.
///
/// Other services receive the user id explicitly; this type only tracks who
/// is signed in and notifies subscribers when that changes.
pub struct Session {
    repository: Arc<dyn AuthRepository>,
    current: watch::Sender<Option<AuthUser>>,
}

impl Session {
    #[must_use]
    pub fn new(repository: Arc<dyn AuthRepository>) -> Self {
        let (current, _) = watch::channel(None);

        Self {
            repository,
            current,
        }
    }

    /// The signed-in user's id, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<UserUuid> {
        self.current.borrow().as_ref().map(|user| user.uuid)
    }

    /// The signed-in user's id.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotAuthenticated`] when nobody is signed in.
    pub fn require_user(&self) -> Result<UserUuid, AuthError> {
        self.current_user().ok_or(AuthError::NotAuthenticated)
    }

    /// Receive a notification on every sign-in and sign-out.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthUser>> {
        self.current.subscribe()
    }

    /// Register an account and its directory profile.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any request when the form is
    /// incomplete, [`AuthError::AlreadyExists`] when the email or username
    /// is taken, or a backend error.
    #[instrument(skip_all, fields(username = %account.username))]
    pub async fn sign_up(&self, account: NewAccount) -> Result<AuthUser, AuthError> {
        validate_account(&account)?;

        let sign_up = self
            .repository
            .sign_up(Credentials {
                email: account.email.clone(),
                password: account.password,
            })
            .await?;

        self.repository
            .create_profile(UserProfile {
                uuid: sign_up.user.uuid,
                email: account.email,
                name: account.name.trim().to_string(),
                username: account.username,
            })
            .await?;

        if sign_up.session.is_some() {
            self.current.send_replace(Some(sign_up.user.clone()));
        }

        info!(user = %sign_up.user.uuid, "account created");

        Ok(sign_up.user)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] when the backend rejects
    /// the pair, or a backend error.
    #[instrument(skip_all)]
    pub async fn sign_in(&self, email: &str, password: Password) -> Result<AuthUser, AuthError> {
        let session = self
            .repository
            .sign_in(Credentials {
                email: email.to_string(),
                password,
            })
            .await?;

        self.current.send_replace(Some(session.user.clone()));

        info!(user = %session.user.uuid, "signed in");

        Ok(session.user)
    }

    /// End the session.
    ///
    /// # Errors
    ///
    /// Returns a backend error when the sign-out call fails; the local
    /// session is kept in that case.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.repository.sign_out().await?;

        self.current.send_replace(None);

        Ok(())
    }

    /// The signed-in user's directory profile.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ProfileNotFound`] when the directory row is
    /// missing.
    pub async fn profile(&self) -> Result<UserProfile, AuthError> {
        let user = self.require_user()?;

        self.repository
            .get_profile(user)
            .await?
            .ok_or(AuthError::ProfileNotFound)
    }

    /// Change name and username.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UsernameTaken`] when another user holds the
    /// username.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<(), AuthError> {
        let user = self.require_user()?;

        validate_name(&update.name)?;
        validate_username(&update.username)?;

        let owner = self
            .repository
            .find_username_owner(update.username.clone())
            .await?;

        if owner.is_some_and(|owner| owner != user) {
            return Err(AuthError::UsernameTaken);
        }

        // The pre-check can race another rename; the unique index decides.
        self.repository
            .update_profile(user, update)
            .await
            .map_err(|error| match AuthError::from(error) {
                AuthError::AlreadyExists => AuthError::UsernameTaken,
                other => other,
            })
    }

    /// The signed-in user's notification preferences, or the defaults when
    /// none were saved.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotAuthenticated`] without a session, or a backend
    /// error.
    pub async fn notification_preferences(&self) -> Result<NotificationPreferences, AuthError> {
        let user = self.require_user()?;

        Ok(self
            .repository
            .get_notification_preferences(user)
            .await?
            .unwrap_or_default())
    }

    /// Save the signed-in user's notification preferences.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotAuthenticated`] without a session, or a backend
    /// error.
    pub async fn update_notification_preferences(
        &self,
        preferences: NotificationPreferences,
    ) -> Result<(), AuthError> {
        let user = self.require_user()?;

        self.repository
            .save_notification_preferences(user, preferences)
            .await?;

        info!(%user, ?preferences, "notification preferences saved");

        Ok(())
    }

    /// Replace the signed-in user's password.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the password is too short.
    pub async fn change_password(&self, password: Password) -> Result<(), AuthError> {
        self.require_user()?;

        validate_password(&password)?;

        if let Err(error) = self.repository.update_password(password).await {
            warn!("password change failed: {error}");

            return Err(error.into());
        }

        Ok(())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.current_user())
            .finish_non_exhaustive()
    }
}

fn validate_account(account: &NewAccount) -> Result<(), ValidationError> {
    validate_name(&account.name)?;
    validate_username(&account.username)?;
    validate_email(&account.email)?;
    validate_password(&account.password)
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::MissingName);
    }

    Ok(())
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.trim().is_empty() {
        return Err(ValidationError::MissingUsername);
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ValidationError::InvalidUsername);
    }

    Ok(())
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty()
                && !email.chars().any(char::is_whitespace)
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        });

    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

fn validate_password(password: &Password) -> Result<(), ValidationError> {
    if password.char_count() < MIN_PASSWORD_CHARS {
        return Err(ValidationError::PasswordTooShort(MIN_PASSWORD_CHARS));
    }

    Ok(())
}
