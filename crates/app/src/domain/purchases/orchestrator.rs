//! Purchase orchestrator.
//!
//! A design changes hands through one conditional update that only matches
//! while the design is still available. Whoever's update the backend
//! commits first owns the design; everyone else sees zero rows changed and
//! gets [`PurchaseError::Unavailable`]. Nothing is mutated locally until the
//! backend has answered.

use std::{fmt, sync::Arc};

use jiff::Timestamp;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    auth::UserUuid,
    domain::{
        carts::{CartStore, models::total},
        designs::{Catalog, DesignUuid, DesignsRepository},
        purchases::{
            certificates::CertificateLocator,
            errors::PurchaseError,
            models::{
                CheckoutReceipt, FollowUp, NewPurchase, PurchaseReceipt, PurchaseRecord,
                Replenishment,
            },
            repository::PurchasesRepository,
        },
    },
    errors::FailureKind,
};

/// Below this many available designs the backend is asked for more.
pub const REPLENISH_FLOOR: u64 = 3;

pub struct PurchaseOrchestrator {
    designs: Arc<dyn DesignsRepository>,
    purchases: Arc<dyn PurchasesRepository>,
    catalog: Arc<Catalog>,
    cart: Arc<CartStore>,
    certificates: CertificateLocator,
    replenish_floor: u64,
}

impl fmt::Debug for PurchaseOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PurchaseOrchestrator")
            .field("certificates", &self.certificates)
            .field("replenish_floor", &self.replenish_floor)
            .finish_non_exhaustive()
    }
}

impl PurchaseOrchestrator {
    #[must_use]
    pub fn new(
        designs: Arc<dyn DesignsRepository>,
        purchases: Arc<dyn PurchasesRepository>,
        catalog: Arc<Catalog>,
        cart: Arc<CartStore>,
        certificates: CertificateLocator,
    ) -> Self {
        Self {
            designs,
            purchases,
            catalog,
            cart,
            certificates,
            replenish_floor: REPLENISH_FLOOR,
        }
    }

    #[must_use]
    pub fn with_replenish_floor(mut self, floor: u64) -> Self {
        self.replenish_floor = floor;
        self
    }

    /// Buy a single design for the user.
    ///
    /// # Errors
    ///
    /// Returns [`PurchaseError::Unavailable`] when the design was already
    /// sold or reserved, [`PurchaseError::RecordMissing`] when the design was
    /// sold but its purchase record could not be written, or a backend error
    /// when nothing was changed.
    #[instrument(skip_all, fields(%user, %design))]
    pub async fn purchase_design(
        &self,
        user: UserUuid,
        design: DesignUuid,
    ) -> Result<PurchaseReceipt, PurchaseError> {
        if self
            .catalog
            .get(design)
            .is_some_and(|loaded| !loaded.is_available())
        {
            debug!("design already known to be unavailable");

            return Err(PurchaseError::Unavailable);
        }

        let now = Timestamp::now();

        let changed = self.designs.mark_sold(design, user, now).await?;

        if changed == 0 {
            info!("design was bought by someone else first");

            return Err(PurchaseError::Unavailable);
        }

        let certificate_url = self.certificates.url_for(design);

        let recorded = self
            .purchases
            .create_purchase(NewPurchase {
                user,
                design,
                purchase_date: now,
                certificate_url: certificate_url.clone(),
            })
            .await;

        if let Err(source) = recorded {
            error!(error = %source, "design marked sold but purchase record not written");

            return Err(PurchaseError::RecordMissing { design, source });
        }

        info!("design sold");

        let follow_up = self.follow_up().await;

        Ok(PurchaseReceipt {
            design,
            certificate_url,
            follow_up,
        })
    }

    /// Buy everything in the user's loaded cart as one unit.
    ///
    /// The cart is first checked against live statuses; any entry no longer
    /// available is removed and the checkout stops so the user can review the
    /// updated cart.
    ///
    /// # Errors
    ///
    /// Returns [`PurchaseError::EmptyCart`] without any request when the
    /// loaded cart is empty, [`PurchaseError::ItemsUnavailable`] naming the
    /// removed entries, or a backend error, in which case nothing was bought
    /// and the cart is unchanged.
    #[instrument(skip_all, fields(%user))]
    pub async fn checkout(&self, user: UserUuid) -> Result<CheckoutReceipt, PurchaseError> {
        if self.cart.list(user).is_empty() {
            return Err(PurchaseError::EmptyCart);
        }

        let removed = self.cart.validate(user).await?;

        if !removed.is_empty() {
            warn!(removed = removed.len(), "checkout stopped, cart had unavailable designs");

            return Err(PurchaseError::ItemsUnavailable(removed));
        }

        let entries = self.cart.list(user);

        if entries.is_empty() {
            return Err(PurchaseError::EmptyCart);
        }

        let total = total(&entries);

        self.purchases.purchase_cart(user).await?;

        info!(designs = entries.len(), %total, "checkout completed");

        let cart_clear_error = match self.cart.clear(user).await {
            Ok(()) => None,
            Err(error) => {
                warn!(%error, "cart not cleared after checkout");

                Some(error.kind())
            }
        };

        let follow_up = self.follow_up().await;

        Ok(CheckoutReceipt {
            entries,
            total,
            cart_clear_error,
            follow_up,
        })
    }

    /// The user's purchase records, newest first.
    ///
    /// # Errors
    ///
    /// Returns a backend error when the records cannot be read.
    pub async fn purchases(&self, user: UserUuid) -> Result<Vec<PurchaseRecord>, PurchaseError> {
        Ok(self.purchases.list_purchases(user).await?)
    }

    /// Refresh the catalog and top it up when the available pool is low.
    async fn follow_up(&self) -> FollowUp {
        let mut refresh_error = self.refresh_catalog().await;

        let replenishment = match self.designs.count_available().await {
            Err(error) => {
                warn!(%error, "available count failed, replenishment skipped");

                Replenishment::Failed(error.kind())
            }
            Ok(available) if available >= self.replenish_floor => {
                Replenishment::NotNeeded { available }
            }
            Ok(available) => match self.designs.replenish().await {
                Ok(created) => {
                    info!(available, created = created.len(), "catalog replenished");

                    refresh_error = self.refresh_catalog().await;

                    Replenishment::Replenished {
                        available,
                        created: created.len(),
                    }
                }
                Err(error) => {
                    warn!(%error, available, "catalog replenishment failed");

                    Replenishment::Failed(error.kind())
                }
            },
        };

        FollowUp {
            refresh_error,
            replenishment,
        }
    }

    async fn refresh_catalog(&self) -> Option<FailureKind> {
        match self.catalog.refresh().await {
            Ok(_) => None,
            Err(error) => {
                warn!(%error, "catalog refresh after sale failed");

                Some(error.kind())
            }
        }
    }
}
