//! Subcommands.

use std::io;

use clap::Subcommand;
use inkvault_app::{
    FailureKind,
    auth::{AuthError, UserUuid},
    context::AppContext,
    domain::{
        carts::CartError, designs::CatalogError, points::PointsError, purchases::PurchaseError,
        wishlist::WishlistError,
    },
};
use thiserror::Error;

use crate::config::account::AccountArgs;

mod account;
mod buy;
mod cart;
mod catalog;
mod points;
mod reconcile;
mod wishlist;

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Browse the design catalog
    Catalog(catalog::CatalogArgs),

    /// Buy a single design
    Buy(buy::BuyArgs),

    /// Manage the cart and check out
    Cart(cart::CartCommand),

    /// Manage the wishlist
    Wishlist(wishlist::WishlistCommand),

    /// Points balance, rewards and the prize wheel
    Points(points::PointsCommand),

    /// Account registration and profile
    Account(account::AccountCommand),

    /// Repair interrupted purchases and spins
    Reconcile,
}

#[derive(Debug, Error)]
pub(crate) enum CommandError {
    #[error("sign-in required; set INKVAULT_EMAIL and INKVAULT_PASSWORD")]
    MissingCredentials,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Wishlist(#[from] WishlistError),

    #[error(transparent)]
    Purchase(#[from] PurchaseError),

    #[error(transparent)]
    Points(#[from] PointsError),

    #[error("failed to write output")]
    Output(#[from] io::Error),
}

impl CommandError {
    pub(crate) fn kind(&self) -> FailureKind {
        match self {
            Self::MissingCredentials => FailureKind::Unauthenticated,
            Self::Auth(error) => error.kind(),
            Self::Catalog(error) => error.kind(),
            Self::Cart(error) => error.kind(),
            Self::Wishlist(error) => error.kind(),
            Self::Purchase(error) => error.kind(),
            Self::Points(error) => error.kind(),
            Self::Output(_) => FailureKind::Transient,
        }
    }

    /// Message shown to the user. Backend details stay in the logs.
    pub(crate) fn user_message(&self) -> String {
        match self {
            Self::MissingCredentials | Self::Output(_) => self.to_string(),
            Self::Purchase(error @ PurchaseError::ItemsUnavailable(_)) => format!(
                "These designs are no longer available and were removed from your cart: {}",
                error.unavailable_titles().join(", ")
            ),
            Self::Purchase(PurchaseError::EmptyCart) => "Your cart is empty.".to_string(),
            Self::Cart(CartError::AlreadyInCart) => "That design is already in your cart.".to_string(),
            Self::Points(PointsError::UnknownReward(id)) => format!("There is no reward {id:?}."),
            Self::Auth(AuthError::Validation(error)) => format!("{}.", capitalise(&error.to_string())),
            Self::Auth(AuthError::UsernameTaken) => "That username is already taken.".to_string(),
            other => other.kind().user_message().to_string(),
        }
    }
}

pub(crate) async fn run(
    ctx: &AppContext,
    account: &AccountArgs,
    command: Command,
    out: &mut impl io::Write,
) -> Result<(), CommandError> {
    match command {
        Command::Catalog(args) => catalog::run(ctx, account, args, out).await,
        Command::Buy(args) => buy::run(ctx, account, args, out).await,
        Command::Cart(command) => cart::run(ctx, account, command, out).await,
        Command::Wishlist(command) => wishlist::run(ctx, account, command, out).await,
        Command::Points(command) => points::run(ctx, account, command, out).await,
        Command::Account(command) => account::run(ctx, account, command, out).await,
        Command::Reconcile => reconcile::run(ctx, out).await,
    }
}

/// The signed-in user, signing in with the configured credentials first.
async fn signed_in(ctx: &AppContext, account: &AccountArgs) -> Result<UserUuid, CommandError> {
    if let Some(user) = ctx.session.current_user() {
        return Ok(user);
    }

    let (email, password) = account
        .credentials()
        .ok_or(CommandError::MissingCredentials)?;

    Ok(ctx.session.sign_in(&email, password).await?.uuid)
}

/// Sign in when credentials are configured, otherwise browse anonymously.
async fn maybe_signed_in(
    ctx: &AppContext,
    account: &AccountArgs,
) -> Result<Option<UserUuid>, CommandError> {
    match signed_in(ctx, account).await {
        Ok(user) => Ok(Some(user)),
        Err(CommandError::MissingCredentials) => Ok(None),
        Err(error) => Err(error),
    }
}

fn capitalise(message: &str) -> String {
    let mut chars = message.chars();

    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use inkvault_app::{
        auth::MockAuthRepository,
        context::{AppContext, AppSettings, Repositories},
        domain::{
            carts::MockCartRepository, designs::MockDesignsRepository,
            points::MockPointsRepository, purchases::{CertificateLocator, MockPurchasesRepository},
            wishlist::MockWishlistRepository,
        },
    };

    use crate::config::account::AccountArgs;

    /// Mocks for every repository, to be configured by each test.
    #[derive(Default)]
    pub(crate) struct Mocks {
        pub designs: MockDesignsRepository,
        pub carts: MockCartRepository,
        pub wishlist: MockWishlistRepository,
        pub purchases: MockPurchasesRepository,
        pub points: MockPointsRepository,
    }

    impl Mocks {
        pub(crate) fn context(self) -> AppContext {
            let repositories = Repositories {
                auth: Arc::new(MockAuthRepository::new()),
                designs: Arc::new(self.designs),
                carts: Arc::new(self.carts),
                wishlist: Arc::new(self.wishlist),
                purchases: Arc::new(self.purchases),
                points: Arc::new(self.points),
            };

            AppContext::new(
                &repositories,
                CertificateLocator::new("https://project.example.co"),
                AppSettings::default(),
            )
        }
    }

    pub(crate) fn anonymous() -> AccountArgs {
        AccountArgs {
            email: None,
            password: None,
        }
    }
}
