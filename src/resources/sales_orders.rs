//! Sales orders screen (`pedidos_vendas`).
//!
//! Lists orders for a date range with their cancellation situation. The
//! situation, cancelled value and item count are derived per row from the
//! order lines.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{money, opt_display, quantity};
use crate::controller::ListController;
use crate::filters::{
    CancellationFilter, FilterCriteria, FIELD_CANCELLATION, FIELD_DATE_FROM, FIELD_DATE_TO,
};
use crate::orders::{self, LineItem, LineItemRecord};
use crate::render::{Column, Identified, RowActionKind};
use crate::wire::{lenient_i64, lenient_opt_decimal, lenient_opt_i64, RecordId};

pub const RESOURCE: &str = "pedidos_vendas";
pub const REQUIRED_FILTERS: &[&str] = &[FIELD_DATE_FROM, FIELD_DATE_TO];
pub const ROW_ACTIONS: &[RowActionKind] = &[RowActionKind::ViewDetail];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesOrder {
    #[serde(rename = "id", alias = "pedido")]
    pub id: RecordId,
    #[serde(rename = "filial", deserialize_with = "lenient_i64")]
    pub branch_id: i64,
    #[serde(rename = "caixa", default, deserialize_with = "lenient_opt_i64")]
    pub register_id: Option<i64>,
    #[serde(rename = "data", default)]
    pub date: Option<String>,
    #[serde(rename = "vendedor", default)]
    pub seller: Option<String>,
    #[serde(rename = "itens", default)]
    pub active_items: Vec<LineItem>,
    #[serde(rename = "itens_cancelados", default)]
    pub cancelled_items: Vec<LineItem>,
    #[serde(
        rename = "total_cancelado",
        default,
        deserialize_with = "lenient_opt_decimal"
    )]
    pub reported_cancelled_total: Option<Decimal>,
    #[serde(rename = "valor_total", default, deserialize_with = "lenient_opt_decimal")]
    pub reported_total: Option<Decimal>,
}

impl LineItemRecord for SalesOrder {
    fn active_items(&self) -> &[LineItem] {
        &self.active_items
    }

    fn cancelled_items(&self) -> &[LineItem] {
        &self.cancelled_items
    }

    fn reported_cancelled_total(&self) -> Option<Decimal> {
        self.reported_cancelled_total
    }
}

impl Identified for SalesOrder {
    fn record_id(&self) -> RecordId {
        self.id.clone()
    }
}

impl SalesOrder {
    /// Order value as reported, or the sum of active lines.
    pub fn total_value(&self) -> Decimal {
        self.reported_total
            .unwrap_or_else(|| orders::active_value(self))
    }
}

/// Today's orders, all cancellation situations.
pub fn default_criteria(today: NaiveDate) -> FilterCriteria {
    FilterCriteria::new()
        .with(FIELD_DATE_FROM, today)
        .with(FIELD_DATE_TO, today)
        .with(FIELD_CANCELLATION, CancellationFilter::Todos)
}

pub fn controller(today: NaiveDate, page_size: u32) -> ListController<SalesOrder> {
    ListController::new(RESOURCE, default_criteria(today), page_size).with_required(REQUIRED_FILTERS)
}

pub fn columns() -> Vec<Column<SalesOrder>> {
    vec![
        Column::new("Pedido", |o: &SalesOrder| o.id.to_string()),
        Column::new("Data", |o: &SalesOrder| opt_display(o.date.as_deref())),
        Column::new("Filial", |o: &SalesOrder| o.branch_id.to_string()),
        Column::new("Caixa", |o: &SalesOrder| opt_display(o.register_id)),
        Column::new("Vendedor", |o: &SalesOrder| opt_display(o.seller.as_deref())),
        Column::new("Qtd. itens", |o: &SalesOrder| quantity(orders::total_quantity(o))),
        Column::new("Valor", |o: &SalesOrder| money(o.total_value())),
        Column::new("Cancelado", |o: &SalesOrder| money(orders::cancelled_value(o))),
        Column::new("Situação", |o: &SalesOrder| orders::status(o).label().to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ListState;
    use crate::filters::{FilterValue, FIELD_BRANCH};
    use crate::orders::CancellationStatus;
    use crate::paging::{Page, PageRequest};
    use crate::render::{render_page, Viewport};
    use crate::testing::MemoryListing;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn wire_orders() -> Vec<serde_json::Value> {
        vec![
            json!({
                "id": 1001, "filial": "12", "caixa": 2, "data": "2024-01-15 10:02:00",
                "vendedor": "Marina",
                "itens": [{ "descricao": "Anel", "quantidade": 1, "preco_unitario": "120.00" }],
                "itens_cancelados": [],
                "total_cancelado": "0.00",
                "valor_total": "120.00"
            }),
            json!({
                "id": "1002", "filial": 12, "caixa": null,
                "itens": [],
                "itens_cancelados": [{ "descricao": "Colar", "quantidade": "2", "preco_unitario": 35.5 }],
                "total_cancelado": null
            }),
            json!({
                "id": 1003, "filial": 12,
                "itens": [{ "descricao": "Pulseira", "quantidade": 1, "preco_unitario": 80 }],
                "itens_cancelados": [],
                "total_cancelado": 50
            }),
        ]
    }

    #[test]
    fn decodes_and_derives_row_fields() {
        let orders: Vec<SalesOrder> = serde_json::from_value(json!(wire_orders())).unwrap();
        assert_eq!(orders::status(&orders[0]), CancellationStatus::NoCancellation);
        assert_eq!(orders::status(&orders[1]), CancellationStatus::FullCancellation);
        assert_eq!(orders::status(&orders[2]), CancellationStatus::PartialCancellation);

        assert_eq!(money(orders::cancelled_value(&orders[1])), "71.00");
        assert_eq!(money(orders::cancelled_value(&orders[2])), "50.00");
        assert_eq!(money(orders[1].total_value()), "0.00");
        assert_eq!(orders[1].register_id, None);
        assert_eq!(orders[0].branch_id, 12);
    }

    #[test]
    fn columns_render_derived_values() {
        let orders: Vec<SalesOrder> = serde_json::from_value(json!(wire_orders())).unwrap();
        let page = Page::assemble(orders, PageRequest::new(1, 10), 3, Some(1));
        let view = render_page(&page, &columns(), ROW_ACTIONS, Viewport::new(1280));
        assert_eq!(view.headers.len(), 9);
        let second = &view.rows[1].cells;
        assert_eq!(second[0], "1002");
        assert_eq!(second[3], "-");
        assert_eq!(second[5], "2");
        assert_eq!(second[7], "71.00");
        assert_eq!(second[8], "Cancelado");
    }

    #[test]
    fn defaults_cover_today_and_all_situations() {
        let criteria = default_criteria(today());
        assert_eq!(criteria.get(FIELD_DATE_FROM), Some(&FilterValue::Date(today())));
        assert_eq!(
            criteria.get(FIELD_CANCELLATION),
            Some(&FilterValue::Text("todos".into()))
        );
        assert!(criteria.validate(REQUIRED_FILTERS).is_ok());
    }

    #[tokio::test]
    async fn screen_loads_through_controller() {
        let svc = MemoryListing::new(wire_orders());
        let mut ctl = controller(today(), 2);
        ctl.filters_mut().set(FIELD_BRANCH, 12);
        ctl.filters_mut()
            .set(FIELD_CANCELLATION, CancellationFilter::ComCancelados);
        let ticket = ctl.mount().unwrap();
        ctl.run(&svc, ticket).await.unwrap();

        assert_eq!(ctl.state(), ListState::Loaded);
        assert_eq!(ctl.page().unwrap().total_pages, 2);
        assert_eq!(ctl.items().len(), 2);
    }

    #[test]
    fn clearing_dates_blocks_the_fetch() {
        let mut ctl = controller(today(), 10);
        ctl.filters_mut().set(FIELD_DATE_TO, "");
        assert!(ctl.apply_filters().is_err());
        assert_eq!(ctl.state(), ListState::Idle);
    }
}
