use std::io;

use clap::Args;
use inkvault_app::{context::AppContext, domain::designs::DesignFilter};
use rust_decimal::Decimal;

use crate::{
    commands::{CommandError, maybe_signed_in},
    config::account::AccountArgs,
    output,
};

#[derive(Debug, Args)]
pub(crate) struct CatalogArgs {
    /// Only designs in this style
    #[arg(long)]
    style: Option<String>,

    /// Lowest price to include
    #[arg(long)]
    min_price: Option<Decimal>,

    /// Highest price to include
    #[arg(long)]
    max_price: Option<Decimal>,

    /// Case-insensitive search over title, description and style
    #[arg(long)]
    search: Option<String>,

    /// Include sold and reserved designs
    #[arg(long)]
    all: bool,

    /// Number of pages to load
    #[arg(long, default_value_t = 1)]
    pages: u32,

    /// List the styles present in the loaded designs instead
    #[arg(long)]
    styles: bool,
}

impl CatalogArgs {
    fn filter(&self) -> DesignFilter {
        let base = if self.all {
            DesignFilter::any()
        } else {
            DesignFilter::default()
        };

        DesignFilter {
            style: self.style.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
            search: self.search.clone(),
            ..base
        }
    }
}

pub(crate) async fn run(
    ctx: &AppContext,
    account: &AccountArgs,
    args: CatalogArgs,
    out: &mut impl io::Write,
) -> Result<(), CommandError> {
    let viewer = maybe_signed_in(ctx, account).await?;

    ctx.catalog.refresh().await?;

    for _ in 1..args.pages {
        if !ctx.catalog.has_more() {
            break;
        }

        ctx.catalog.fetch_page(false).await?;
    }

    if args.styles {
        for style in ctx.catalog.styles() {
            writeln!(out, "{style}")?;
        }

        return Ok(());
    }

    let designs = ctx.catalog.filter(&args.filter());

    writeln!(out, "{}", output::designs_table(&designs, viewer))?;

    let loaded = ctx.catalog.designs().len();

    match ctx.catalog.total() {
        Some(total) => writeln!(out, "{} shown, {loaded} of {total} loaded", designs.len())?,
        None => writeln!(out, "{} shown, {loaded} loaded", designs.len())?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use inkvault_app::domain::designs::{Design, DesignPage, DesignStatus, DesignUuid};
    use jiff::Timestamp;
    use testresult::TestResult;

    use crate::commands::test_support::{Mocks, anonymous};

    use super::*;

    fn design(title: &str, style: &str, status: DesignStatus) -> Design {
        Design {
            uuid: DesignUuid::new(),
            title: title.to_string(),
            description: String::new(),
            style: style.to_string(),
            price: Decimal::from(100),
            status,
            image_url: format!("https://cdn.example.com/{title}.png"),
            preview_url: None,
            owner: None,
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
        }
    }

    fn args() -> CatalogArgs {
        CatalogArgs {
            style: None,
            min_price: None,
            max_price: None,
            search: None,
            all: false,
            pages: 1,
            styles: false,
        }
    }

    fn mocks() -> Mocks {
        let mut mocks = Mocks::default();
        mocks.designs.expect_list_designs().returning(|_| {
            Ok(DesignPage {
                designs: vec![
                    design("Serpente", "fineline", DesignStatus::Available),
                    design("Lua", "blackwork", DesignStatus::Sold),
                ],
                total: Some(2),
            })
        });
        mocks
    }

    #[tokio::test]
    async fn lists_only_available_designs_by_default() -> TestResult {
        let ctx = mocks().context();
        let mut out = Vec::new();

        run(&ctx, &anonymous(), args(), &mut out).await?;

        let printed = String::from_utf8(out)?;

        assert!(printed.contains("Serpente"));
        assert!(!printed.contains("Lua"));
        assert!(printed.contains("1 shown, 2 of 2 loaded"));

        Ok(())
    }

    #[tokio::test]
    async fn styles_are_listed_once_each() -> TestResult {
        let ctx = mocks().context();
        let mut out = Vec::new();

        run(
            &ctx,
            &anonymous(),
            CatalogArgs {
                styles: true,
                ..args()
            },
            &mut out,
        )
        .await?;

        assert_eq!(String::from_utf8(out)?, "blackwork\nfineline\n");

        Ok(())
    }
}
