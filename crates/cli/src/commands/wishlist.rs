use std::io;

use clap::{Args, Subcommand};
use inkvault_app::{
    context::AppContext,
    domain::{designs::DesignUuid, wishlist::Toggled},
};

use crate::{
    commands::{CommandError, signed_in},
    config::account::AccountArgs,
    output,
};

#[derive(Debug, Args)]
pub(crate) struct WishlistCommand {
    #[command(subcommand)]
    command: WishlistSubcommand,
}

#[derive(Debug, Subcommand)]
enum WishlistSubcommand {
    /// Show wishlisted designs
    Show,

    /// Add the design if absent, remove it otherwise
    Toggle { design: DesignUuid },
}

pub(crate) async fn run(
    ctx: &AppContext,
    account: &AccountArgs,
    command: WishlistCommand,
    out: &mut impl io::Write,
) -> Result<(), CommandError> {
    let user = signed_in(ctx, account).await?;

    ctx.wishlist.refresh(user).await?;

    match command.command {
        WishlistSubcommand::Show => {
            let designs = ctx.wishlist.designs(user);

            if designs.is_empty() {
                writeln!(out, "Your wishlist is empty.")?;
            } else {
                writeln!(out, "{}", output::designs_table(&designs, Some(user)))?;
            }
        }
        WishlistSubcommand::Toggle { design } => match ctx.wishlist.toggle(user, design).await? {
            Toggled::Added => writeln!(out, "Added to your wishlist.")?,
            Toggled::Removed => writeln!(out, "Removed from your wishlist.")?,
        },
    }

    Ok(())
}
