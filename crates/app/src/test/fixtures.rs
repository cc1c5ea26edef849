//! Test Fixtures

use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::domain::{
    carts::{CartEntryUuid, CartRow},
    designs::{Design, DesignStatus, DesignUuid},
};

const STYLES: [&str; 3] = ["fineline", "blackwork", "old school"];

/// An available, unowned design.
pub(crate) fn design(title: &str, style: &str, price: i64) -> Design {
    let now = Timestamp::now();

    Design {
        uuid: DesignUuid::new(),
        title: title.to_string(),
        description: format!("{title} in {style}"),
        style: style.to_string(),
        price: Decimal::from(price),
        status: DesignStatus::Available,
        image_url: format!("https://cdn.example.com/{}.png", title.to_lowercase()),
        preview_url: None,
        owner: None,
        created_at: now,
        updated_at: now,
    }
}

/// `count` available designs cycling through a few styles.
pub(crate) fn designs(count: usize) -> Vec<Design> {
    STYLES
        .iter()
        .cycle()
        .zip(0..count)
        .map(|(style, n)| design(&format!("Design {n}"), style, 100 + n as i64))
        .collect()
}

/// A cart row joined with its design.
pub(crate) fn cart_row(design: Design) -> CartRow {
    CartRow {
        uuid: CartEntryUuid::new(),
        design_uuid: design.uuid,
        design: Some(design),
    }
}
