use std::io;

use clap::{Args, Subcommand};
use inkvault_app::{
    auth::{NewAccount, NotificationPreferences, Password, ProfileUpdate},
    context::AppContext,
};

use crate::{
    commands::{CommandError, signed_in},
    config::account::AccountArgs,
    output,
};

#[derive(Debug, Args)]
pub(crate) struct AccountCommand {
    #[command(subcommand)]
    command: AccountSubcommand,
}

#[derive(Debug, Subcommand)]
enum AccountSubcommand {
    /// Register the configured email and password
    SignUp {
        /// Display name
        #[arg(long)]
        name: String,

        /// Public username (letters, digits and underscores)
        #[arg(long)]
        username: String,
    },

    /// Show the profile and owned designs
    Profile,

    /// Change name and username
    Update {
        #[arg(long)]
        name: String,

        #[arg(long)]
        username: String,
    },

    /// Change the password
    Password {
        /// New password
        #[arg(long, env = "INKVAULT_NEW_PASSWORD", hide_env_values = true)]
        new_password: String,
    },

    /// Show or change which notifications you receive
    Notifications {
        /// Discounts and special offers
        #[arg(long)]
        promotions: Option<bool>,

        /// Prize wheel winnings
        #[arg(long)]
        rewards: Option<bool>,

        /// New designs in the catalog
        #[arg(long)]
        catalog: Option<bool>,
    },
}

pub(crate) async fn run(
    ctx: &AppContext,
    account: &AccountArgs,
    command: AccountCommand,
    out: &mut impl io::Write,
) -> Result<(), CommandError> {
    match command.command {
        AccountSubcommand::SignUp { name, username } => {
            let (email, password) = account
                .credentials()
                .ok_or(CommandError::MissingCredentials)?;

            let user = ctx
                .session
                .sign_up(NewAccount {
                    email,
                    password,
                    name,
                    username,
                })
                .await?;

            writeln!(out, "Account {} created.", user.uuid)?;
        }
        AccountSubcommand::Profile => {
            let user = signed_in(ctx, account).await?;
            let profile = ctx.session.profile().await?;
            let owned = ctx.purchases.purchases(user).await?;

            writeln!(out, "{} (@{})", profile.name, profile.username)?;
            writeln!(out, "{}", profile.email)?;

            if owned.is_empty() {
                writeln!(out, "No designs owned yet.")?;
            } else {
                writeln!(out, "{}", output::purchases_table(&owned))?;
            }
        }
        AccountSubcommand::Update { name, username } => {
            signed_in(ctx, account).await?;

            ctx.session
                .update_profile(ProfileUpdate { name, username })
                .await?;

            writeln!(out, "Profile updated.")?;
        }
        AccountSubcommand::Password { new_password } => {
            signed_in(ctx, account).await?;

            ctx.session
                .change_password(Password::new(new_password))
                .await?;

            writeln!(out, "Password changed.")?;
        }
        AccountSubcommand::Notifications {
            promotions,
            rewards,
            catalog,
        } => {
            signed_in(ctx, account).await?;

            let current = ctx.session.notification_preferences().await?;
            let wanted = NotificationPreferences {
                promotions: promotions.unwrap_or(current.promotions),
                rewards: rewards.unwrap_or(current.rewards),
                catalog: catalog.unwrap_or(current.catalog),
            };

            if wanted != current {
                ctx.session.update_notification_preferences(wanted).await?;
            }

            write_preferences(out, wanted)?;
        }
    }

    Ok(())
}

fn write_preferences(
    out: &mut impl io::Write,
    preferences: NotificationPreferences,
) -> io::Result<()> {
    let label = |enabled: bool| if enabled { "on" } else { "off" };

    writeln!(out, "promotions: {}", label(preferences.promotions))?;
    writeln!(out, "rewards:    {}", label(preferences.rewards))?;
    writeln!(out, "catalog:    {}", label(preferences.catalog))
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn preferences_are_listed_one_per_line() -> TestResult {
        let mut out = Vec::new();

        write_preferences(
            &mut out,
            NotificationPreferences {
                rewards: false,
                ..NotificationPreferences::default()
            },
        )?;

        assert_eq!(
            String::from_utf8(out)?,
            "promotions: on\nrewards:    off\ncatalog:    on\n"
        );

        Ok(())
    }
}
