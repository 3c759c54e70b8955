use crate::store::{Order, OrderStatus, Store};

/// Headline numbers for the dashboard page
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub vendors: usize,
    pub clients: usize,
    pub orders: usize,
    pub sub_admins: usize,
    pub active_work_types: usize,
    /// Order count per status, in `OrderStatus::ALL` order
    pub orders_by_status: Vec<(OrderStatus, usize)>,
    /// Totals over orders that are not cancelled
    pub billed_to_clients: f64,
    pub paid_to_vendors: f64,
    pub margin: f64,
}

pub fn summarize(store: &Store) -> DashboardSummary {
    let orders: Vec<&Order> = store.listing::<Order>(false);
    let billable = orders
        .iter()
        .filter(|o| o.status != OrderStatus::Cancelled);

    let (billed, paid) = billable.fold((0.0, 0.0), |(billed, paid), o| {
        (billed + o.amount_to_client, paid + o.amount_to_vendor)
    });

    DashboardSummary {
        vendors: store.vendors.iter().filter(|v| v.deleted_at.is_none()).count(),
        clients: store.clients.iter().filter(|c| c.deleted_at.is_none()).count(),
        orders: orders.len(),
        sub_admins: store
            .sub_admins
            .iter()
            .filter(|a| a.deleted_at.is_none())
            .count(),
        active_work_types: store
            .work_types
            .iter()
            .filter(|w| w.active && w.deleted_at.is_none())
            .count(),
        orders_by_status: OrderStatus::ALL
            .iter()
            .map(|s| (*s, orders.iter().filter(|o| o.status == *s).count()))
            .collect(),
        billed_to_clients: billed,
        paid_to_vendors: paid,
        margin: billed - paid,
    }
}

/// Most recent live orders, newest first
pub fn recent_orders(store: &Store, limit: usize) -> Vec<&Order> {
    let mut orders = store.listing::<Order>(false);
    orders.sort_by(|a, b| b.order_date.cmp(&a.order_date).then(b.id.cmp(&a.id)));
    orders.truncate(limit);
    orders
}
