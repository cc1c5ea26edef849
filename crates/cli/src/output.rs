//! Table rendering for command output.

use std::ops::Range;

use inkvault_app::{
    auth::UserUuid,
    domain::{
        carts::CartEntry,
        designs::{AssetVisibility, Design, DesignStatus},
        points::Reward,
        purchases::{PurchaseRecord, ReconciliationReport},
    },
};
use rust_decimal::Decimal;
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};

pub(crate) fn designs_table(designs: &[Design], viewer: Option<UserUuid>) -> String {
    let mut builder = Builder::default();

    builder.push_record(["Id", "Title", "Style", "Price", "Status", "Image"]);

    for design in designs {
        builder.push_record([
            design.uuid.to_string(),
            design.title.clone(),
            design.style.clone(),
            design.price.to_string(),
            status_label(design.status).to_string(),
            image(design, viewer),
        ]);
    }

    render(builder, Some(Columns::new(3..4)))
}

pub(crate) fn cart_table(entries: &[CartEntry], total: Decimal) -> String {
    let mut builder = Builder::default();

    builder.push_record(["Id", "Title", "Style", "Price"]);

    for entry in entries {
        builder.push_record([
            entry.design.uuid.to_string(),
            entry.design.title.clone(),
            entry.design.style.clone(),
            entry.design.price.to_string(),
        ]);
    }

    builder.push_record([String::new(), "Total".to_string(), String::new(), total.to_string()]);

    render(builder, Some(Columns::new(3..4)))
}

pub(crate) fn rewards_table(rewards: &[Reward]) -> String {
    let mut builder = Builder::default();

    builder.push_record(["Id", "Reward", "Description", "Cost"]);

    for reward in rewards {
        builder.push_record([
            reward.id.to_string(),
            reward.name.to_string(),
            reward.description.to_string(),
            reward.cost.to_string(),
        ]);
    }

    render(builder, Some(Columns::new(3..4)))
}

pub(crate) fn purchases_table(records: &[PurchaseRecord]) -> String {
    let mut builder = Builder::default();

    builder.push_record(["Design", "Title", "Purchased", "Certificate"]);

    for record in records {
        builder.push_record([
            record.design_uuid.to_string(),
            record
                .design
                .as_ref()
                .map_or_else(String::new, |design| design.title.clone()),
            record.purchase_date.to_string(),
            record.certificate_url.clone(),
        ]);
    }

    render(builder, None)
}

/// One line per repair, anomaly or failure.
pub(crate) fn report_lines(report: &ReconciliationReport) -> Vec<String> {
    if report.is_clean() {
        return vec!["nothing to reconcile".to_string()];
    }

    let mut lines = Vec::new();

    lines.extend(
        report
            .restored_records
            .iter()
            .map(|design| format!("restored purchase record for design {design}")),
    );
    lines.extend(
        report
            .ownership_anomalies
            .iter()
            .map(|design| format!("design {design} is sold but has no owner")),
    );
    lines.extend(
        report
            .settled_spins
            .iter()
            .map(|spin| format!("credited and settled spin {spin}")),
    );
    lines.extend(
        report
            .refunded_spins
            .iter()
            .map(|spin| format!("refunded stake of spin {spin}")),
    );
    lines.extend(
        report
            .pending_spins
            .iter()
            .map(|spin| format!("spin {spin} left pending")),
    );
    lines.extend(report.failures.iter().map(|failure| {
        format!(
            "{:?} failed for {}: {:?}",
            failure.step, failure.subject, failure.kind
        )
    }));

    lines
}

fn image(design: &Design, viewer: Option<UserUuid>) -> String {
    match design.visibility_for(viewer) {
        AssetVisibility::Original => design.image_url.clone(),
        AssetVisibility::Protected => format!("{} (watermarked)", design.image_url),
    }
}

fn status_label(status: DesignStatus) -> &'static str {
    match status {
        DesignStatus::Available => "available",
        DesignStatus::Sold => "sold",
        DesignStatus::Reserved => "reserved",
    }
}

fn render(builder: Builder, right_aligned: Option<Columns<Range<usize>>>) -> String {
    let mut table = builder.build();

    table.with(Style::modern_rounded());

    if let Some(columns) = right_aligned {
        table.modify(columns, Alignment::right());
    }

    table.to_string()
}

#[cfg(test)]
mod tests {
    use inkvault_app::domain::{designs::DesignUuid, purchases::RepairFailure};
    use jiff::Timestamp;

    use super::*;

    fn design(owner: Option<UserUuid>) -> Design {
        Design {
            uuid: DesignUuid::new(),
            title: "Serpente".to_string(),
            description: String::new(),
            style: "fineline".to_string(),
            price: Decimal::new(14990, 2),
            status: if owner.is_some() {
                DesignStatus::Sold
            } else {
                DesignStatus::Available
            },
            image_url: "https://cdn.example.com/serpente.png".to_string(),
            preview_url: None,
            owner,
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
        }
    }

    #[test]
    fn owners_see_the_original_image() {
        let owner = UserUuid::new();

        let table = designs_table(&[design(Some(owner))], Some(owner));

        assert!(table.contains("Serpente"));
        assert!(table.contains("149.90"));
        assert!(table.contains("sold"));
        assert!(!table.contains("watermarked"));
    }

    #[test]
    fn everyone_else_sees_a_watermark() {
        let table = designs_table(&[design(Some(UserUuid::new()))], Some(UserUuid::new()));

        assert!(table.contains("watermarked"));
    }

    #[test]
    fn clean_report_says_so() {
        assert_eq!(
            report_lines(&ReconciliationReport::default()),
            vec!["nothing to reconcile".to_string()]
        );
    }

    #[test]
    fn report_lists_failures() {
        let report = ReconciliationReport {
            failures: vec![RepairFailure {
                step: inkvault_app::domain::purchases::RepairStep::ListSold,
                subject: "designs".to_string(),
                kind: inkvault_app::FailureKind::Transient,
            }],
            ..ReconciliationReport::default()
        };

        assert_eq!(
            report_lines(&report),
            vec!["ListSold failed for designs: Transient".to_string()]
        );
    }
}
