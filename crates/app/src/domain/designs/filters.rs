//! Catalog filters.

use rust_decimal::Decimal;

use crate::domain::designs::models::{Design, DesignStatus};

/// Browsing filter applied to the locally loaded catalog.
///
/// The default shows only available designs.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignFilter {
    pub style: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub status: Option<DesignStatus>,

    /// Case-insensitive match against title, description and style.
    pub search: Option<String>,
}

impl Default for DesignFilter {
    fn default() -> Self {
        Self {
            style: None,
            min_price: None,
            max_price: None,
            status: Some(DesignStatus::Available),
            search: None,
        }
    }
}

impl DesignFilter {
    /// A filter that lets every design through.
    #[must_use]
    pub fn any() -> Self {
        Self {
            status: None,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn matches(&self, design: &Design) -> bool {
        let style = self
            .style
            .as_deref()
            .is_none_or(|style| style.is_empty() || design.style == style);

        let min = self.min_price.is_none_or(|min| design.price >= min);
        let max = self.max_price.is_none_or(|max| design.price <= max);
        let status = self.status.is_none_or(|status| design.status == status);

        style && min && max && status && self.matches_search(design)
    }

    fn matches_search(&self, design: &Design) -> bool {
        let Some(term) = self.search.as_deref().map(str::trim) else {
            return true;
        };

        if term.is_empty() {
            return true;
        }

        let term = term.to_lowercase();

        [&design.title, &design.description, &design.style]
            .iter()
            .any(|field| field.to_lowercase().contains(&term))
    }
}
