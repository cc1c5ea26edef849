use std::io;

use clap::Args;
use inkvault_app::{
    context::AppContext,
    domain::{
        designs::DesignUuid,
        purchases::{FollowUp, Replenishment},
    },
};

use crate::{
    commands::{CommandError, signed_in},
    config::account::AccountArgs,
};

#[derive(Debug, Args)]
pub(crate) struct BuyArgs {
    /// Id of the design to buy
    design: DesignUuid,
}

pub(crate) async fn run(
    ctx: &AppContext,
    account: &AccountArgs,
    args: BuyArgs,
    out: &mut impl io::Write,
) -> Result<(), CommandError> {
    let user = signed_in(ctx, account).await?;

    let receipt = ctx.purchases.purchase_design(user, args.design).await?;

    writeln!(out, "Design {} is yours.", receipt.design)?;
    writeln!(out, "Certificate: {}", receipt.certificate_url)?;

    write_follow_up(out, &receipt.follow_up)?;

    Ok(())
}

/// Notes about the catalog after a sale. Only worth mentioning when
/// something changed or went wrong.
pub(crate) fn write_follow_up(out: &mut impl io::Write, follow_up: &FollowUp) -> io::Result<()> {
    if let Replenishment::Replenished { created, .. } = follow_up.replenishment {
        writeln!(out, "{created} new designs were added to the catalog.")?;
    }

    if follow_up.refresh_error.is_some() {
        writeln!(out, "The catalog could not be refreshed; list it again to see the latest designs.")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use inkvault_app::FailureKind;

    use super::*;

    #[test]
    fn quiet_follow_up_prints_nothing() -> io::Result<()> {
        let mut out = Vec::new();

        write_follow_up(
            &mut out,
            &FollowUp {
                refresh_error: None,
                replenishment: Replenishment::NotNeeded { available: 8 },
            },
        )?;

        assert!(out.is_empty());

        Ok(())
    }

    #[test]
    fn replenishment_and_stale_catalog_are_mentioned() -> io::Result<()> {
        let mut out = Vec::new();

        write_follow_up(
            &mut out,
            &FollowUp {
                refresh_error: Some(FailureKind::Transient),
                replenishment: Replenishment::Replenished {
                    available: 2,
                    created: 5,
                },
            },
        )?;

        let printed = String::from_utf8_lossy(&out);

        assert!(printed.contains("5 new designs"));
        assert!(printed.contains("could not be refreshed"));

        Ok(())
    }
}
