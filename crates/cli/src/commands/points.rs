use std::io;

use clap::{Args, Subcommand};
use inkvault_app::{
    context::AppContext,
    domain::points::{SPIN_STAKE, SpinOutcome},
};

use crate::{
    commands::{CommandError, signed_in},
    config::account::AccountArgs,
    output,
};

#[derive(Debug, Args)]
pub(crate) struct PointsCommand {
    #[command(subcommand)]
    command: PointsSubcommand,
}

#[derive(Debug, Subcommand)]
enum PointsSubcommand {
    /// Show the points balance
    Balance,

    /// List the rewards on offer
    Rewards,

    /// Trade points for a reward
    Redeem {
        /// Reward id, as listed by `points rewards`
        reward: String,
    },

    /// Stake points on the prize wheel
    Spin,
}

pub(crate) async fn run(
    ctx: &AppContext,
    account: &AccountArgs,
    command: PointsCommand,
    out: &mut impl io::Write,
) -> Result<(), CommandError> {
    if let PointsSubcommand::Rewards = command.command {
        writeln!(out, "{}", output::rewards_table(ctx.rewards.rewards()))?;

        return Ok(());
    }

    let user = signed_in(ctx, account).await?;

    match command.command {
        PointsSubcommand::Balance => {
            writeln!(out, "You have {} points.", ctx.ledger.balance(user).await?)?;
        }
        PointsSubcommand::Redeem { reward } => {
            let redemption = ctx.rewards.redeem(user, &reward).await?;

            writeln!(
                out,
                "Redeemed {} for {} points.",
                redemption.reward.name, redemption.reward.cost
            )?;
            write_balance(out, redemption.balance)?;
        }
        PointsSubcommand::Spin => {
            let spin = ctx.wheel.spin(user).await?;

            match spin.segment.outcome {
                SpinOutcome::Nothing => writeln!(
                    out,
                    "{}. You staked {SPIN_STAKE} points.",
                    spin.segment.label
                )?,
                SpinOutcome::Points(points) => writeln!(out, "You won {points} points!")?,
                SpinOutcome::ExclusiveArt => {
                    writeln!(out, "You won an exclusive artwork! We will be in touch.")?;
                }
            }

            write_balance(out, spin.balance)?;
        }
        PointsSubcommand::Rewards => {}
    }

    Ok(())
}

fn write_balance(out: &mut impl io::Write, balance: Option<i64>) -> io::Result<()> {
    match balance {
        Some(balance) => writeln!(out, "Balance: {balance} points."),
        None => writeln!(out, "Your balance could not be refreshed."),
    }
}
