//! Catalog and maintenance tunables

use clap::Args;
use inkvault_app::context::AppSettings;
use jiff::SignedDuration;

#[derive(Debug, Args)]
pub(crate) struct TuningArgs {
    /// Designs fetched per catalog page
    #[arg(long, env = "INKVAULT_PAGE_SIZE", default_value_t = 12)]
    pub page_size: u64,

    /// Available designs below which a sale asks the backend for more
    #[arg(long, env = "INKVAULT_REPLENISH_FLOOR", default_value_t = 3)]
    pub replenish_floor: u64,

    /// Minutes an unfinished spin is left alone before reconciliation touches it
    #[arg(long, env = "INKVAULT_RECONCILE_GRACE_MINUTES", default_value_t = 5)]
    pub reconcile_grace_minutes: i64,
}

impl TuningArgs {
    pub(crate) fn settings(&self) -> AppSettings {
        AppSettings {
            page_size: self.page_size.max(1),
            replenish_floor: self.replenish_floor,
            reconcile_grace: SignedDuration::from_mins(self.reconcile_grace_minutes.max(0)),
        }
    }
}
