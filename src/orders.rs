//! Order lines and the display aggregates derived from them.
//!
//! An order owns two disjoint line sequences: active lines and cancelled
//! (voided/returned) lines. Everything here is pure and recomputed from the
//! record on every render.
//!
//! **Rules:**
//! - Line total = quantity × unit price, rounded to cents
//! - Cancelled value prefers the server aggregate when it is positive, and
//!   falls back to summing cancelled lines otherwise
//! - All accumulation is in `Decimal`, never binary floats

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::wire::{lenient_decimal, RecordId};

/// Currency precision (cents).
pub const CURRENCY_DP: u32 = 2;

/// Round to currency precision, half away from zero.
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CURRENCY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// One product entry within an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(rename = "produto", alias = "codigo", default)]
    pub product_id: Option<RecordId>,
    #[serde(rename = "descricao", alias = "nome", default)]
    pub description: String,
    #[serde(
        rename = "quantidade",
        alias = "qtd",
        deserialize_with = "lenient_decimal"
    )]
    pub quantity: Decimal,
    #[serde(
        rename = "preco_unitario",
        alias = "valor_unitario",
        deserialize_with = "lenient_decimal"
    )]
    pub unit_price: Decimal,
}

impl LineItem {
    pub fn new(description: impl Into<String>, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            product_id: None,
            description: description.into(),
            quantity,
            unit_price,
        }
    }

    /// Quantity times unit price in cents. Saturates at the `Decimal` bounds
    /// instead of panicking on absurd wire values.
    pub fn line_total(&self) -> Decimal {
        round_currency(self.quantity.saturating_mul(self.unit_price))
    }
}

/// A parent record carrying active and cancelled line sequences.
pub trait LineItemRecord {
    fn active_items(&self) -> &[LineItem];
    fn cancelled_items(&self) -> &[LineItem];
    /// Cancelled total as reported by the server, if any.
    fn reported_cancelled_total(&self) -> Option<Decimal>;
}

/// Cancellation classification shown on the order row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationStatus {
    NoCancellation,
    PartialCancellation,
    FullCancellation,
}

impl CancellationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CancellationStatus::NoCancellation => "Sem cancelamento",
            CancellationStatus::PartialCancellation => "Cancelamento parcial",
            CancellationStatus::FullCancellation => "Cancelado",
        }
    }
}

pub fn sum_line_totals(items: &[LineItem]) -> Decimal {
    items
        .iter()
        .map(LineItem::line_total)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

pub fn sum_quantities(items: &[LineItem]) -> Decimal {
    items
        .iter()
        .map(|i| i.quantity)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Classify an order by its cancelled lines.
///
/// A positive reported cancelled total with no cancelled lines still counts
/// as partial: the upstream aggregate and the line data can disagree, and
/// the aggregate is not discarded.
pub fn status(record: &impl LineItemRecord) -> CancellationStatus {
    let has_active = !record.active_items().is_empty();
    let has_cancelled = !record.cancelled_items().is_empty();
    let reported = record.reported_cancelled_total().unwrap_or(Decimal::ZERO);

    if !has_cancelled && reported.is_zero() {
        CancellationStatus::NoCancellation
    } else if has_cancelled && !has_active {
        CancellationStatus::FullCancellation
    } else {
        CancellationStatus::PartialCancellation
    }
}

/// Cancelled amount: the reported aggregate when positive, else the sum of
/// cancelled line totals.
pub fn cancelled_value(record: &impl LineItemRecord) -> Decimal {
    match record.reported_cancelled_total() {
        Some(total) if total > Decimal::ZERO => total,
        _ => sum_line_totals(record.cancelled_items()),
    }
}

/// Value of the lines that were not cancelled.
pub fn active_value(record: &impl LineItemRecord) -> Decimal {
    sum_line_totals(record.active_items())
}

/// Active plus cancelled quantities.
pub fn total_quantity(record: &impl LineItemRecord) -> Decimal {
    sum_quantities(record.active_items()).saturating_add(sum_quantities(record.cancelled_items()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    struct Order {
        active: Vec<LineItem>,
        cancelled: Vec<LineItem>,
        reported: Option<Decimal>,
    }

    impl LineItemRecord for Order {
        fn active_items(&self) -> &[LineItem] {
            &self.active
        }
        fn cancelled_items(&self) -> &[LineItem] {
            &self.cancelled
        }
        fn reported_cancelled_total(&self) -> Option<Decimal> {
            self.reported
        }
    }

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn item(qty: &str, price: &str) -> LineItem {
        LineItem::new("Anel prata", d(qty), d(price))
    }

    fn order(active: Vec<LineItem>, cancelled: Vec<LineItem>, reported: Option<&str>) -> Order {
        Order {
            active,
            cancelled,
            reported: reported.map(d),
        }
    }

    #[test]
    fn no_lines_means_no_cancellation() {
        let o = order(vec![], vec![], None);
        assert_eq!(status(&o), CancellationStatus::NoCancellation);
        let o = order(vec![], vec![], Some("0"));
        assert_eq!(status(&o), CancellationStatus::NoCancellation);
    }

    #[test]
    fn only_cancelled_lines_is_full_cancellation() {
        let o = order(vec![], vec![item("1", "10")], None);
        assert_eq!(status(&o), CancellationStatus::FullCancellation);
    }

    #[test]
    fn mixed_lines_is_partial() {
        let o = order(vec![item("1", "10")], vec![item("1", "5")], None);
        assert_eq!(status(&o), CancellationStatus::PartialCancellation);
    }

    #[test]
    fn reported_total_without_lines_is_partial() {
        let o = order(vec![item("1", "80")], vec![], Some("50"));
        assert_eq!(status(&o), CancellationStatus::PartialCancellation);
    }

    #[test]
    fn cancelled_value_prefers_positive_aggregate() {
        let o = order(vec![], vec![item("2", "10")], Some("15.00"));
        assert_eq!(cancelled_value(&o), d("15.00"));
    }

    #[test]
    fn cancelled_value_falls_back_to_lines() {
        let o = order(vec![], vec![item("2", "10.50"), item("1", "3.25")], Some("0"));
        assert_eq!(cancelled_value(&o), d("24.25"));
        let o = order(vec![], vec![item("3", "1.10")], None);
        assert_eq!(cancelled_value(&o), d("3.30"));
    }

    #[test]
    fn total_quantity_counts_both_sequences() {
        let o = order(
            vec![item("2", "1"), item("0.5", "4")],
            vec![item("1", "9")],
            None,
        );
        assert_eq!(total_quantity(&o), d("3.5"));
    }

    #[test]
    fn accumulation_has_no_cent_drift() {
        let lines: Vec<LineItem> = (0..1000).map(|_| item("1", "0.10")).collect();
        let o = order(lines, vec![], None);
        assert_eq!(active_value(&o), d("100.00"));
    }

    #[test]
    fn oversized_wire_amounts_saturate_instead_of_panicking() {
        let huge = "100000000000000000";
        let o = order(vec![item(huge, huge)], vec![item(huge, huge)], None);
        assert_eq!(cancelled_value(&o), Decimal::MAX);
        assert_eq!(active_value(&o), Decimal::MAX);

        let many = order(vec![item(huge, huge), item(huge, huge)], vec![], None);
        assert_eq!(active_value(&many), Decimal::MAX);

        let qty = "70000000000000000000000000000";
        let o = order(vec![item(qty, "1")], vec![item(qty, "1")], None);
        assert_eq!(total_quantity(&o), Decimal::MAX);
    }

    #[test]
    fn line_total_rounds_to_cents() {
        assert_eq!(item("3", "0.335").line_total(), d("1.01"));
        assert_eq!(item("0.333", "3").line_total(), d("1.00"));
    }

    #[test]
    fn line_item_reads_portuguese_wire_names() {
        let line: LineItem = serde_json::from_value(serde_json::json!({
            "codigo": 4411,
            "descricao": "Brinco ouro",
            "quantidade": "2",
            "valor_unitario": 199.9
        }))
        .unwrap();
        assert_eq!(line.product_id, Some(RecordId::from(4411)));
        assert_eq!(line.line_total(), d("399.80"));
    }
}
