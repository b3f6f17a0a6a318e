//! Daily sales screen (`vendas_diarias`).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{money, opt_display};
use crate::controller::ListController;
use crate::filters::{FilterCriteria, DATE_FORMAT, FIELD_DATE_FROM, FIELD_DATE_TO};
use crate::orders::round_currency;
use crate::render::{Column, Identified, RowActionKind};
use crate::wire::{
    lenient_date, lenient_decimal, lenient_i64, lenient_opt_decimal, lenient_opt_i64, lenient_u64,
    RecordId,
};

pub const RESOURCE: &str = "vendas_diarias";
pub const REQUIRED_FILTERS: &[&str] = &[FIELD_DATE_FROM, FIELD_DATE_TO];
pub const ROW_ACTIONS: &[RowActionKind] = &[RowActionKind::ViewDetail];

/// How many days back the default range starts.
pub const DEFAULT_RANGE_DAYS: i64 = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySale {
    #[serde(rename = "data", deserialize_with = "lenient_date")]
    pub date: NaiveDate,
    #[serde(rename = "filial", deserialize_with = "lenient_i64")]
    pub branch_id: i64,
    #[serde(rename = "caixa", default, deserialize_with = "lenient_opt_i64")]
    pub register_id: Option<i64>,
    #[serde(rename = "quantidade_vendas", default, deserialize_with = "lenient_u64")]
    pub sale_count: u64,
    #[serde(rename = "valor_total", deserialize_with = "lenient_decimal")]
    pub gross_total: Decimal,
    #[serde(rename = "valor_cancelado", default, deserialize_with = "lenient_opt_decimal")]
    pub cancelled_total: Option<Decimal>,
}

impl DailySale {
    pub fn net_total(&self) -> Decimal {
        round_currency(
            self.gross_total
                .saturating_sub(self.cancelled_total.unwrap_or(Decimal::ZERO)),
        )
    }

    /// Net total per sale; zero on days without sales.
    pub fn average_ticket(&self) -> Decimal {
        if self.sale_count == 0 {
            return Decimal::ZERO;
        }
        round_currency(self.net_total() / Decimal::from(self.sale_count))
    }
}

/// Rows carry no id of their own; date, branch and register identify a row.
impl Identified for DailySale {
    fn record_id(&self) -> RecordId {
        let register = self
            .register_id
            .map(|r| r.to_string())
            .unwrap_or_else(|| "0".to_string());
        RecordId::new(format!(
            "{}-{}-{}",
            self.date.format(DATE_FORMAT),
            self.branch_id,
            register
        ))
    }
}

/// Aggregate of the rows on one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageTotals {
    pub sale_count: u64,
    pub gross_total: Decimal,
    pub cancelled_total: Decimal,
    pub net_total: Decimal,
}

impl PageTotals {
    pub fn average_ticket(&self) -> Decimal {
        if self.sale_count == 0 {
            return Decimal::ZERO;
        }
        round_currency(self.net_total / Decimal::from(self.sale_count))
    }

    /// Summary line printed under the daily sales table.
    pub fn footer(&self) -> String {
        format!(
            "Vendas: {} · Bruto: {} · Cancelado: {} · Líquido: {} · Ticket médio: {}",
            self.sale_count,
            money(self.gross_total),
            money(self.cancelled_total),
            money(self.net_total),
            money(self.average_ticket())
        )
    }
}

/// Sums saturate so a corrupt row cannot take the footer down.
pub fn page_totals(rows: &[DailySale]) -> PageTotals {
    rows.iter().fold(PageTotals::default(), |acc, row| PageTotals {
        sale_count: acc.sale_count.saturating_add(row.sale_count),
        gross_total: acc.gross_total.saturating_add(row.gross_total),
        cancelled_total: acc
            .cancelled_total
            .saturating_add(row.cancelled_total.unwrap_or(Decimal::ZERO)),
        net_total: acc.net_total.saturating_add(row.net_total()),
    })
}

/// The last week, today included.
pub fn default_criteria(today: NaiveDate) -> FilterCriteria {
    let from = today - chrono::Duration::days(DEFAULT_RANGE_DAYS);
    FilterCriteria::new()
        .with(FIELD_DATE_FROM, from)
        .with(FIELD_DATE_TO, today)
}

pub fn controller(today: NaiveDate, page_size: u32) -> ListController<DailySale> {
    ListController::new(RESOURCE, default_criteria(today), page_size).with_required(REQUIRED_FILTERS)
}

pub fn columns() -> Vec<Column<DailySale>> {
    vec![
        Column::new("Data", |s: &DailySale| s.date.format(DATE_FORMAT).to_string()),
        Column::new("Filial", |s: &DailySale| s.branch_id.to_string()),
        Column::new("Caixa", |s: &DailySale| opt_display(s.register_id)),
        Column::new("Vendas", |s: &DailySale| s.sale_count.to_string()),
        Column::new("Bruto", |s: &DailySale| money(s.gross_total)),
        Column::new("Cancelado", |s: &DailySale| {
            money(s.cancelled_total.unwrap_or(Decimal::ZERO))
        }),
        Column::new("Líquido", |s: &DailySale| money(s.net_total())),
        Column::new("Ticket médio", |s: &DailySale| money(s.average_ticket())),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ListState;
    use crate::error::ListError;
    use crate::testing::MemoryListing;
    use serde_json::json;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    fn rows() -> Vec<serde_json::Value> {
        vec![
            json!({ "data": "2024-03-09", "filial": 1, "caixa": 1, "quantidade_vendas": 3,
                    "valor_total": "100.00", "valor_cancelado": "10.00" }),
            json!({ "data": "2024-03-09 00:00:00", "filial": "1", "caixa": "2", "quantidade_vendas": "0",
                    "valor_total": 0, "valor_cancelado": null }),
            json!({ "data": "2024-03-10", "filial": 2, "quantidade_vendas": 4,
                    "valor_total": 50.5 }),
        ]
    }

    fn decoded() -> Vec<DailySale> {
        serde_json::from_value(json!(rows())).unwrap()
    }

    #[test]
    fn derived_values() {
        let sales = decoded();
        assert_eq!(sales[0].net_total(), d("90.00"));
        assert_eq!(sales[0].average_ticket(), d("30.00"));
        assert_eq!(sales[1].average_ticket(), Decimal::ZERO);
        assert_eq!(sales[2].average_ticket(), d("12.63"));
    }

    #[test]
    fn record_ids_combine_date_branch_register() {
        let sales = decoded();
        assert_eq!(sales[0].record_id().as_str(), "2024-03-09-1-1");
        assert_eq!(sales[2].record_id().as_str(), "2024-03-10-2-0");
    }

    #[test]
    fn totals_footer() {
        let totals = page_totals(&decoded());
        assert_eq!(totals.sale_count, 7);
        assert_eq!(totals.net_total, d("140.50"));
        assert_eq!(
            totals.footer(),
            "Vendas: 7 · Bruto: 150.50 · Cancelado: 10.00 · Líquido: 140.50 · Ticket médio: 20.07"
        );
        assert_eq!(page_totals(&[]).average_ticket(), Decimal::ZERO);
    }

    #[test]
    fn totals_saturate_on_extreme_rows() {
        let big = json!({ "data": "2024-03-09", "filial": 1, "quantidade_vendas": i64::MAX,
                          "valor_total": "70000000000000000000000000000",
                          "valor_cancelado": "-70000000000000000000000000000" });
        let sales: Vec<DailySale> =
            serde_json::from_value(json!([big.clone(), big.clone(), big])).unwrap();
        assert_eq!(sales[0].net_total(), Decimal::MAX);
        let totals = page_totals(&sales);
        assert_eq!(totals.sale_count, u64::MAX);
        assert_eq!(totals.gross_total, Decimal::MAX);
        assert_eq!(totals.net_total, Decimal::MAX);
    }

    #[test]
    fn default_range_is_last_week() {
        let criteria = default_criteria(today());
        assert_eq!(
            criteria.get(FIELD_DATE_FROM).and_then(|v| v.as_date()),
            NaiveDate::from_ymd_opt(2024, 3, 4)
        );
    }

    #[tokio::test]
    async fn inverted_range_never_reaches_the_service() {
        let svc = MemoryListing::new(rows());
        let mut ctl = controller(today(), 10);
        let t = ctl.mount().unwrap();
        ctl.run(&svc, t).await.unwrap();
        assert_eq!(ctl.items().len(), 3);

        ctl.filters_mut()
            .set(FIELD_DATE_FROM, NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
        let err = ctl.apply_filters().unwrap_err();
        assert!(matches!(err, ListError::Validation(_)));
        assert_eq!(svc.calls(), 1);
        assert_eq!(ctl.state(), ListState::Loaded);
        assert_eq!(ctl.items().len(), 3);
    }
}
