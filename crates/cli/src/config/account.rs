//! Account Config

use clap::Args;
use inkvault_app::auth::Password;

/// Credentials used when a command needs a signed-in user.
#[derive(Debug, Args)]
pub(crate) struct AccountArgs {
    /// Account email address
    #[arg(long, env = "INKVAULT_EMAIL")]
    pub email: Option<String>,

    /// Account password
    #[arg(long, env = "INKVAULT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl AccountArgs {
    /// Email and password, when both are set.
    pub(crate) fn credentials(&self) -> Option<(String, Password)> {
        let email = self.email.clone()?;
        let password = self.password.clone()?;

        Some((email, Password::new(password)))
    }
}
