//! Repairs partial failures left behind by purchases and wheel spins.
//!
//! A sale writes the design first and the purchase record second, and a spin
//! journals each step before taking it, so every interrupted operation leaves
//! a trace that can be finished later:
//!
//! - sold designs without a purchase record get one, dated when the design
//!   was last updated;
//! - `awarded` spins get their reward credited and are settled;
//! - `debited` spins get their stake back and are cancelled;
//! - `pending` spins are reported, since the stake may or may not have been
//!   taken.
//!
//! Only designs and intents untouched for the grace period are repaired, so
//! sales and spins still in flight are left alone.

use std::{fmt, sync::Arc};

use jiff::{SignedDuration, Timestamp};
use rustc_hash::FxHashSet;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    backend::BackendError,
    domain::{
        designs::{Design, DesignUuid, DesignsRepository},
        points::{PointsRepository, SpinIntent, SpinIntentUpdate, SpinIntentUuid, SpinState},
        purchases::{
            certificates::CertificateLocator, models::NewPurchase,
            repository::PurchasesRepository,
        },
    },
    errors::FailureKind,
};

/// Default age a sold design or open spin intent must reach before it is
/// repaired.
pub const DEFAULT_GRACE: SignedDuration = SignedDuration::from_mins(5);

/// What a repair step could not do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairFailure {
    pub step: RepairStep,
    pub subject: String,
    pub kind: FailureKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairStep {
    ListSold,
    FindPurchased,
    RestoreRecord,
    ListSpins,
    CreditSpin,
    RefundSpin,
    CloseSpin,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationReport {
    /// Designs that got their missing purchase record back.
    pub restored_records: Vec<DesignUuid>,

    /// Sold designs without an owner. Not repaired automatically.
    pub ownership_anomalies: Vec<DesignUuid>,

    /// Awarded spins that were credited and settled.
    pub settled_spins: Vec<SpinIntentUuid>,

    /// Debited spins whose stake was returned.
    pub refunded_spins: Vec<SpinIntentUuid>,

    /// Spins left for a person to look at, or still inside the grace period.
    pub pending_spins: Vec<SpinIntentUuid>,

    pub failures: Vec<RepairFailure>,
}

impl ReconciliationReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.restored_records.is_empty()
            && self.ownership_anomalies.is_empty()
            && self.settled_spins.is_empty()
            && self.refunded_spins.is_empty()
            && self.pending_spins.is_empty()
            && self.failures.is_empty()
    }

    fn fail(&mut self, step: RepairStep, subject: impl ToString, error: &BackendError) {
        self.failures.push(RepairFailure {
            step,
            subject: subject.to_string(),
            kind: error.kind(),
        });
    }
}

pub struct Reconciler {
    designs: Arc<dyn DesignsRepository>,
    purchases: Arc<dyn PurchasesRepository>,
    points: Arc<dyn PointsRepository>,
    certificates: CertificateLocator,
    grace: SignedDuration,
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("certificates", &self.certificates)
            .field("grace", &self.grace)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    #[must_use]
    pub fn new(
        designs: Arc<dyn DesignsRepository>,
        purchases: Arc<dyn PurchasesRepository>,
        points: Arc<dyn PointsRepository>,
        certificates: CertificateLocator,
    ) -> Self {
        Self {
            designs,
            purchases,
            points,
            certificates,
            grace: DEFAULT_GRACE,
        }
    }

    #[must_use]
    pub fn with_grace(mut self, grace: SignedDuration) -> Self {
        self.grace = grace;
        self
    }

    /// Run every repair step. Failures are collected in the report rather
    /// than stopping the run.
    #[instrument(skip_all)]
    pub async fn run(&self) -> ReconciliationReport {
        let mut report = ReconciliationReport::default();

        let cutoff = Timestamp::now()
            .checked_sub(self.grace)
            .unwrap_or(Timestamp::MIN);

        self.restore_purchase_records(cutoff, &mut report).await;
        self.finish_spins(cutoff, &mut report).await;

        info!(
            restored = report.restored_records.len(),
            anomalies = report.ownership_anomalies.len(),
            settled = report.settled_spins.len(),
            refunded = report.refunded_spins.len(),
            pending = report.pending_spins.len(),
            failures = report.failures.len(),
            "reconciliation finished"
        );

        report
    }

    async fn restore_purchase_records(
        &self,
        cutoff: Timestamp,
        report: &mut ReconciliationReport,
    ) {
        let sold = match self.designs.list_sold().await {
            Ok(sold) => sold,
            Err(error) => {
                warn!(%error, "listing sold designs failed");
                report.fail(RepairStep::ListSold, "designs", &error);

                return;
            }
        };

        let mut owned: Vec<(DesignUuid, Design)> = Vec::with_capacity(sold.len());

        for design in sold {
            if design.updated_at > cutoff {
                debug!(design = %design.uuid, "sale still in flight");
            } else if design.has_consistent_ownership() {
                owned.push((design.uuid, design));
            } else {
                warn!(design = %design.uuid, "sold design has no owner");
                report.ownership_anomalies.push(design.uuid);
            }
        }

        if owned.is_empty() {
            return;
        }

        let ids = owned.iter().map(|(uuid, _)| *uuid).collect();

        let recorded: FxHashSet<DesignUuid> = match self.purchases.find_purchased(ids).await {
            Ok(recorded) => recorded.into_iter().collect(),
            Err(error) => {
                warn!(%error, "looking up purchase records failed");
                report.fail(RepairStep::FindPurchased, "purchases", &error);

                return;
            }
        };

        for (uuid, design) in owned {
            if recorded.contains(&uuid) {
                continue;
            }

            let Some(owner) = design.owner else {
                continue;
            };

            let restored = self
                .purchases
                .create_purchase(NewPurchase {
                    user: owner,
                    design: uuid,
                    purchase_date: design.updated_at,
                    certificate_url: self.certificates.url_for(uuid),
                })
                .await;

            match restored {
                Ok(()) | Err(BackendError::UniqueViolation) => {
                    info!(design = %uuid, %owner, "purchase record restored");
                    report.restored_records.push(uuid);
                }
                Err(error) => {
                    warn!(%error, design = %uuid, "restoring purchase record failed");
                    report.fail(RepairStep::RestoreRecord, uuid, &error);
                }
            }
        }
    }

    async fn finish_spins(&self, cutoff: Timestamp, report: &mut ReconciliationReport) {
        let intents = match self.points.list_unsettled_spin_intents().await {
            Ok(intents) => intents,
            Err(error) => {
                warn!(%error, "listing open spins failed");
                report.fail(RepairStep::ListSpins, "spin_intents", &error);

                return;
            }
        };

        for intent in intents {
            if intent.updated_at > cutoff {
                report.pending_spins.push(intent.uuid);

                continue;
            }

            match intent.state {
                SpinState::Awarded => self.credit(&intent, report).await,
                SpinState::Debited => self.refund(&intent, report).await,
                SpinState::Pending => {
                    warn!(intent = %intent.uuid, user = %intent.user, "spin left pending");
                    report.pending_spins.push(intent.uuid);
                }
                SpinState::Settled | SpinState::Cancelled => {}
            }
        }
    }

    async fn credit(&self, intent: &SpinIntent, report: &mut ReconciliationReport) {
        let reward = intent.reward.unwrap_or_default();

        if reward > 0 {
            if let Err(error) = self.points.adjust_points(intent.user, reward).await {
                warn!(%error, intent = %intent.uuid, "crediting spin reward failed");
                report.fail(RepairStep::CreditSpin, intent.uuid, &error);

                return;
            }
        }

        let update = SpinIntentUpdate::to(SpinState::Settled).with_reward(reward);

        if self.close(intent, update, report).await {
            info!(intent = %intent.uuid, reward, "spin credited");
            report.settled_spins.push(intent.uuid);
        }
    }

    async fn refund(&self, intent: &SpinIntent, report: &mut ReconciliationReport) {
        if let Err(error) = self.points.adjust_points(intent.user, intent.stake).await {
            warn!(%error, intent = %intent.uuid, "refunding spin stake failed");
            report.fail(RepairStep::RefundSpin, intent.uuid, &error);

            return;
        }

        if self
            .close(intent, SpinIntentUpdate::to(SpinState::Cancelled), report)
            .await
        {
            info!(intent = %intent.uuid, stake = intent.stake, "spin stake refunded");
            report.refunded_spins.push(intent.uuid);
        }
    }

    /// A failure here means the points moved but the intent stays open, so
    /// the next run would move them again.
    async fn close(
        &self,
        intent: &SpinIntent,
        update: SpinIntentUpdate,
        report: &mut ReconciliationReport,
    ) -> bool {
        match self.points.update_spin_intent(intent.uuid, update).await {
            Ok(()) => true,
            Err(error) => {
                error!(%error, intent = %intent.uuid, "points moved but spin left open");
                report.fail(RepairStep::CloseSpin, intent.uuid, &error);

                false
            }
        }
    }
}
