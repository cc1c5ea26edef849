use std::io;

use clap::{Args, Subcommand};
use inkvault_app::{
    context::AppContext,
    domain::{carts::AddOutcome, designs::DesignUuid},
};

use crate::{
    commands::{CommandError, buy::write_follow_up, signed_in},
    config::account::AccountArgs,
    output,
};

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Show the cart and its total
    Show,

    /// Add a design to the cart
    Add { design: DesignUuid },

    /// Remove a design from the cart
    Remove { design: DesignUuid },

    /// Empty the cart
    Clear,

    /// Buy everything in the cart
    Checkout,
}

pub(crate) async fn run(
    ctx: &AppContext,
    account: &AccountArgs,
    command: CartCommand,
    out: &mut impl io::Write,
) -> Result<(), CommandError> {
    let user = signed_in(ctx, account).await?;

    match command.command {
        CartSubcommand::Show => {
            let entries = ctx.cart.load(user).await?;

            if entries.is_empty() {
                writeln!(out, "Your cart is empty.")?;
            } else {
                writeln!(out, "{}", output::cart_table(&entries, ctx.cart.total(user)))?;
            }
        }
        CartSubcommand::Add { design } => match ctx.cart.add(user, design).await? {
            AddOutcome::Added => writeln!(out, "Added to your cart.")?,
            AddOutcome::AlreadyPresent => writeln!(out, "That design is already in your cart.")?,
        },
        CartSubcommand::Remove { design } => {
            ctx.cart.remove(user, design).await?;

            writeln!(out, "Removed from your cart.")?;
        }
        CartSubcommand::Clear => {
            ctx.cart.clear(user).await?;

            writeln!(out, "Your cart is empty.")?;
        }
        CartSubcommand::Checkout => {
            ctx.cart.load(user).await?;

            let receipt = ctx.purchases.checkout(user).await?;

            writeln!(out, "{}", output::cart_table(&receipt.entries, receipt.total))?;
            writeln!(out, "Purchased {} designs.", receipt.entries.len())?;

            if receipt.cart_clear_error.is_some() {
                writeln!(out, "Your cart could not be emptied; clear it before shopping again.")?;
            }

            write_follow_up(out, &receipt.follow_up)?;
        }
    }

    Ok(())
}
