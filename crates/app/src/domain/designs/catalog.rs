//! Catalog store.

use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use tracing::{debug, warn};

use crate::{
    backend::PageRange,
    domain::designs::{
        errors::CatalogError,
        filters::DesignFilter,
        models::{Design, DesignPage, DesignUuid},
        repository::DesignsRepository,
    },
    errors::FailureKind,
};

/// Designs requested per page.
pub const DEFAULT_PAGE_SIZE: u64 = 12;

#[derive(Debug)]
struct CatalogState {
    designs: Vec<Design>,
    next_page: u64,
    has_more: bool,
    total: Option<u64>,
    last_error: Option<FailureKind>,

    /// Bumped on every reset so an append that raced a reset is dropped.
    generation: u64,
}

impl Default for CatalogState {
    fn default() -> Self {
        Self {
            designs: Vec::new(),
            next_page: 0,
            has_more: true,
            total: None,
            last_error: None,
            generation: 0,
        }
    }
}

/// Paginated client-side view of the catalog, newest first.
///
/// Local state only changes once the backend has answered. Lookups never
/// touch the network.
pub struct Catalog {
    repository: Arc<dyn DesignsRepository>,
    page_size: u64,
    state: RwLock<CatalogState>,
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl Catalog {
    #[must_use]
    pub fn new(repository: Arc<dyn DesignsRepository>) -> Self {
        Self::with_page_size(repository, DEFAULT_PAGE_SIZE)
    }

    #[must_use]
    pub fn with_page_size(repository: Arc<dyn DesignsRepository>, page_size: u64) -> Self {
        Self {
            repository,
            page_size: page_size.max(1),
            state: RwLock::default(),
        }
    }

    /// Load the next page, or the first page again when `reset` is set.
    ///
    /// Returns the number of designs the page added to the view.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Fetch`] when the backend cannot be read. The
    /// loaded designs and the `has_more` flag are left as they were.
    pub async fn fetch_page(&self, reset: bool) -> Result<usize, CatalogError> {
        let (page, generation) = {
            let state = self.read();

            if !reset && !state.has_more {
                return Ok(0);
            }

            (if reset { 0 } else { state.next_page }, state.generation)
        };

        let range = PageRange::page(page, self.page_size);

        debug!(page, reset, "fetching catalog page");

        let result = self.repository.list_designs(range).await;

        let mut state = self.write();

        let DesignPage { designs, total } = match result {
            Ok(page) => page,
            Err(source) => {
                warn!(page, error = %source, "catalog fetch failed");

                state.last_error = Some(source.kind());

                return Err(CatalogError::Fetch(source));
            }
        };

        if !reset && state.generation != generation {
            debug!(page, "discarding page fetched before a reset");

            return Ok(0);
        }

        if reset {
            state.designs.clear();
            state.generation = state.generation.wrapping_add(1);
        }

        let fetched = designs.len() as u64;
        let mut added = 0;

        for design in designs {
            if let Some(existing) = state.designs.iter_mut().find(|d| d.uuid == design.uuid) {
                *existing = design;
            } else {
                state.designs.push(design);
                added += 1;
            }
        }

        state.next_page = page + 1;
        state.total = total;
        state.last_error = None;
        state.has_more = match total {
            Some(total) => range.start.saturating_add(self.page_size) < total,
            None => fetched == self.page_size,
        };

        Ok(added)
    }

    /// Reload the first page, dropping everything loaded so far.
    ///
    /// # Errors
    ///
    /// See [`Catalog::fetch_page`].
    pub async fn refresh(&self) -> Result<usize, CatalogError> {
        self.fetch_page(true).await
    }

    /// Whether the locally held design is available. Unknown ids are
    /// reported unavailable.
    #[must_use]
    pub fn is_available(&self, uuid: DesignUuid) -> bool {
        self.read()
            .designs
            .iter()
            .any(|design| design.uuid == uuid && design.is_available())
    }

    #[must_use]
    pub fn get(&self, uuid: DesignUuid) -> Option<Design> {
        self.read()
            .designs
            .iter()
            .find(|design| design.uuid == uuid)
            .cloned()
    }

    /// Available designs among those loaded.
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.read()
            .designs
            .iter()
            .filter(|design| design.is_available())
            .count()
    }

    #[must_use]
    pub fn designs(&self) -> Vec<Design> {
        self.read().designs.clone()
    }

    #[must_use]
    pub fn filter(&self, filter: &DesignFilter) -> Vec<Design> {
        self.read()
            .designs
            .iter()
            .filter(|design| filter.matches(design))
            .cloned()
            .collect()
    }

    /// Distinct style tags among the loaded designs, sorted.
    #[must_use]
    pub fn styles(&self) -> Vec<String> {
        let mut styles: Vec<String> = self
            .read()
            .designs
            .iter()
            .map(|design| design.style.clone())
            .collect();

        styles.sort_unstable();
        styles.dedup();

        styles
    }

    #[must_use]
    pub fn has_more(&self) -> bool {
        self.read().has_more
    }

    /// Total rows reported by the last successful fetch.
    #[must_use]
    pub fn total(&self) -> Option<u64> {
        self.read().total
    }

    /// Kind of the most recent fetch failure, cleared by the next success.
    #[must_use]
    pub fn last_error(&self) -> Option<FailureKind> {
        self.read().last_error
    }

    fn read(&self) -> RwLockReadGuard<'_, CatalogState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CatalogState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
