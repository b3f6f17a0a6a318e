//! Listing screens backed by the admin dashboard.
//!
//! Each screen module owns its record type, default filters, required
//! filters, columns and row actions, and builds a ready-to-mount
//! [`ListController`](crate::controller::ListController).

use rust_decimal::Decimal;

pub mod daily_sales;
pub mod sales_orders;
pub mod sync_requests;

/// Screens available from the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    SalesOrders,
    SyncRequests,
    DailySales,
}

impl Screen {
    pub fn resource(&self) -> &'static str {
        match self {
            Screen::SalesOrders => sales_orders::RESOURCE,
            Screen::SyncRequests => sync_requests::RESOURCE,
            Screen::DailySales => daily_sales::RESOURCE,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Screen::SalesOrders => "Pedidos de venda",
            Screen::SyncRequests => "Requisições de sincronização",
            Screen::DailySales => "Vendas diárias",
        }
    }
}

/// Two-decimal display of a money amount.
pub fn money(value: Decimal) -> String {
    format!("{:.2}", crate::orders::round_currency(value))
}

/// Quantity display without trailing zeros.
pub fn quantity(value: Decimal) -> String {
    value.normalize().to_string()
}

fn opt_display<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}
