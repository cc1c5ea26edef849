//! App Context

use std::{fmt, sync::Arc};

use jiff::SignedDuration;
use thiserror::Error;

use crate::{
    auth::{AuthRepository, RestAuthRepository, Session},
    backend::{BackendConfig, BackendError, PostgrestClient},
    domain::{
        carts::{CartRepository, CartStore, RestCartRepository},
        designs::{Catalog, DEFAULT_PAGE_SIZE, DesignsRepository, RestDesignsRepository},
        points::{PointsLedger, PointsRepository, PrizeWheel, RestPointsRepository, RewardStore},
        purchases::{
            CertificateLocator, DEFAULT_GRACE, PurchaseOrchestrator, PurchasesRepository,
            REPLENISH_FLOOR, Reconciler, RestPurchasesRepository,
        },
        wishlist::{RestWishlistRepository, WishlistRepository, WishlistStore},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to initialise the backend client")]
    Backend(#[source] BackendError),
}

/// Tunables that are not part of the backend connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppSettings {
    pub page_size: u64,
    pub replenish_floor: u64,
    pub reconcile_grace: SignedDuration,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            replenish_floor: REPLENISH_FLOOR,
            reconcile_grace: DEFAULT_GRACE,
        }
    }
}

/// One implementation per persistence seam.
#[derive(Clone)]
pub struct Repositories {
    pub auth: Arc<dyn AuthRepository>,
    pub designs: Arc<dyn DesignsRepository>,
    pub carts: Arc<dyn CartRepository>,
    pub wishlist: Arc<dyn WishlistRepository>,
    pub purchases: Arc<dyn PurchasesRepository>,
    pub points: Arc<dyn PointsRepository>,
}

impl fmt::Debug for Repositories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}

impl Repositories {
    /// REST repositories sharing one backend client.
    #[must_use]
    pub fn rest(client: &PostgrestClient) -> Self {
        Self {
            auth: Arc::new(RestAuthRepository::new(client.clone())),
            designs: Arc::new(RestDesignsRepository::new(client.clone())),
            carts: Arc::new(RestCartRepository::new(client.clone())),
            wishlist: Arc::new(RestWishlistRepository::new(client.clone())),
            purchases: Arc::new(RestPurchasesRepository::new(client.clone())),
            points: Arc::new(RestPointsRepository::new(client.clone())),
        }
    }
}

#[derive(Clone)]
pub struct AppContext {
    pub session: Arc<Session>,
    pub catalog: Arc<Catalog>,
    pub cart: Arc<CartStore>,
    pub wishlist: Arc<WishlistStore>,
    pub purchases: Arc<PurchaseOrchestrator>,
    pub ledger: Arc<PointsLedger>,
    pub rewards: Arc<RewardStore>,
    pub wheel: Arc<PrizeWheel>,
    pub reconciler: Arc<Reconciler>,
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("session", &self.session)
            .field("purchases", &self.purchases)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Build application context against the managed backend.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn from_config(config: BackendConfig, settings: AppSettings) -> Result<Self, AppInitError> {
        let client = PostgrestClient::new(config).map_err(AppInitError::Backend)?;
        let certificates = CertificateLocator::new(client.base_url());

        Ok(Self::new(&Repositories::rest(&client), certificates, settings))
    }

    /// Wire every service over the given repositories.
    #[must_use]
    pub fn new(
        repositories: &Repositories,
        certificates: CertificateLocator,
        settings: AppSettings,
    ) -> Self {
        let catalog = Arc::new(Catalog::with_page_size(
            repositories.designs.clone(),
            settings.page_size,
        ));

        let cart = Arc::new(CartStore::new(
            repositories.carts.clone(),
            repositories.designs.clone(),
        ));

        let purchases = PurchaseOrchestrator::new(
            repositories.designs.clone(),
            repositories.purchases.clone(),
            catalog.clone(),
            cart.clone(),
            certificates.clone(),
        )
        .with_replenish_floor(settings.replenish_floor);

        let reconciler = Reconciler::new(
            repositories.designs.clone(),
            repositories.purchases.clone(),
            repositories.points.clone(),
            certificates,
        )
        .with_grace(settings.reconcile_grace);

        let ledger = Arc::new(PointsLedger::new(repositories.points.clone()));

        Self {
            session: Arc::new(Session::new(repositories.auth.clone())),
            catalog,
            cart,
            wishlist: Arc::new(WishlistStore::new(repositories.wishlist.clone())),
            purchases: Arc::new(purchases),
            rewards: Arc::new(RewardStore::new(
                ledger.clone(),
                repositories.points.clone(),
            )),
            wheel: Arc::new(PrizeWheel::new(ledger.clone(), repositories.points.clone())),
            ledger,
            reconciler: Arc::new(reconciler),
        }
    }
}
