//! Order lifecycle operations: pending -> initiated -> paid

use uuid::Uuid;

use crate::models::Order;
use crate::store::{LedgerResult, LedgerStore, OrderTransition};

/// Create a pending order for a cart snapshot.
///
/// One order per cart: a second create for the same (user, cart) pair is
/// rejected by the store's uniqueness guard.
pub async fn create_order(
    store: &dyn LedgerStore,
    user_id: Uuid,
    cart_id: Uuid,
    amount_minor: i64,
) -> LedgerResult<Order> {
    let order = store.create_order(user_id, cart_id, amount_minor).await?;
    tracing::info!(
        order_id = %order.id,
        user_id = %user_id,
        cart_id = %cart_id,
        amount_minor,
        "order created"
    );
    Ok(order)
}

/// Start a purchase: pending -> initiated.
///
/// The compare-and-set in the store means two concurrent purchase
/// attempts cannot both pass the guard; the loser gets the current row
/// back with `transitioned == false`.
pub async fn begin_purchase(
    store: &dyn LedgerStore,
    order_id: Uuid,
) -> LedgerResult<OrderTransition> {
    let transition = store.begin_purchase(order_id).await?;

    if transition.transitioned {
        tracing::info!(order_id = %order_id, "purchase initiated");
    } else {
        tracing::info!(
            order_id = %order_id,
            status = ?transition.order.status,
            "purchase already in progress or settled"
        );
    }

    Ok(transition)
}

/// Settle an order: {pending, initiated} -> paid.
///
/// Calling this on an already-paid order is a success no-op — gateway
/// callbacks are expected to arrive more than once.
pub async fn mark_paid(store: &dyn LedgerStore, order_id: Uuid) -> LedgerResult<OrderTransition> {
    let transition = store.mark_paid(order_id).await?;

    if transition.transitioned {
        tracing::info!(order_id = %order_id, "order marked paid");
    } else {
        tracing::info!(order_id = %order_id, "order already paid");
    }

    Ok(transition)
}

pub async fn get_order(store: &dyn LedgerStore, order_id: Uuid) -> LedgerResult<Option<Order>> {
    store.find_order(order_id).await
}
