use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{types::Json, QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType},
    traits::{OrderStoreError, StatusTransition},
};

/// Inserts a new order into the database using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
///
/// New orders always start in `AWAITING_PAYMENT`.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderStoreError> {
    let total_price = order.total_price();
    let NewOrder { customer, address, items, shipping, created_at, payment_expires_at, .. } = order;
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                customer_name,
                customer_email,
                customer_cpf,
                customer_phone,
                street,
                number,
                complement,
                district,
                city,
                state,
                postal_code,
                items,
                shipping,
                total_price,
                status,
                created_at,
                updated_at,
                payment_expires_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING *;
        "#,
    )
    .bind(customer.name)
    .bind(customer.email)
    .bind(customer.cpf)
    .bind(customer.phone)
    .bind(address.street)
    .bind(address.number)
    .bind(address.complement)
    .bind(address.district)
    .bind(address.city)
    .bind(address.state)
    .bind(address.postal_code)
    .bind(Json(items))
    .bind(Json(shipping))
    .bind(total_price)
    .bind(OrderStatusType::AwaitingPayment)
    .bind(created_at)
    .bind(created_at)
    .bind(payment_expires_at)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order {} inserted. Total {}. Payment window closes at {}", order.id, order.total_price, order.payment_expires_at);
    Ok(order)
}

pub async fn fetch_order_by_id(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_carrier_shipment_id(
    shipment_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE carrier_shipment_id = $1 LIMIT 1")
        .bind(shipment_id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Returns the most recent order for the CPF and email pair. Emails are compared case-insensitively.
pub async fn fetch_order_by_cpf_and_email(
    cpf: &str,
    email: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        "SELECT * FROM orders WHERE customer_cpf = $1 AND lower(customer_email) = lower($2) ORDER BY id DESC LIMIT 1",
    )
    .bind(cpf)
    .bind(email)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

pub async fn fetch_order_by_tracking_code_and_email(
    tracking_code: &str,
    email: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        "SELECT * FROM orders WHERE tracking_code = $1 AND lower(customer_email) = lower($2) ORDER BY id DESC LIMIT 1",
    )
    .bind(tracking_code)
    .bind(email)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

fn push_status_in(builder: &mut QueryBuilder<'_, Sqlite>, statuses: &[OrderStatusType]) {
    builder.push("status IN (");
    let mut list = builder.separated(", ");
    for status in statuses {
        list.push_bind(*status);
    }
    list.push_unseparated(")");
}

/// Fetches orders that can still be expired and whose payment deadline is strictly before `now`.
pub async fn fetch_expired_orders(now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders WHERE ");
    push_status_in(&mut builder, OrderStatusType::expirable());
    builder.push(" AND payment_expires_at < ");
    builder.push_bind(now);
    builder.push(" ORDER BY payment_expires_at ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ {} orders have passed their payment deadline", orders.len());
    Ok(orders)
}

pub async fn set_checkout_session_id(
    id: OrderId,
    session_id: &str,
    conn: &mut SqliteConnection,
) -> Result<(), OrderStoreError> {
    let result = sqlx::query("UPDATE orders SET checkout_session_id = $1, updated_at = $2 WHERE id = $3")
        .bind(session_id)
        .bind(Utc::now())
        .bind(id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(OrderStoreError::OrderNotFound(id));
    }
    Ok(())
}

/// Moves the order into `transition.target` if, and only if, its current status is one of the target's
/// predecessors. Returns `true` when the row was changed.
///
/// This single statement is the only guard against duplicate and concurrent deliveries. Two callers racing on the
/// same order will both issue it, and SQLite's write lock guarantees that at most one of them sees a changed row.
pub async fn transition_status(
    id: OrderId,
    transition: &StatusTransition,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let predecessors = transition.target.predecessors();
    if predecessors.is_empty() {
        return Ok(false);
    }
    let mut builder = QueryBuilder::new("UPDATE orders SET status = ");
    builder.push_bind(transition.target);
    builder.push(", updated_at = ");
    builder.push_bind(Utc::now());
    if let Some(payment) = &transition.payment {
        builder.push(", gateway_payment_id = ");
        builder.push_bind(payment.gateway_payment_id.clone());
        if let Some(method) = &payment.method {
            builder.push(", payment_method = ");
            builder.push_bind(method.clone());
        }
        if let Some(last_four) = &payment.card_last_four {
            builder.push(", card_last_four = ");
            builder.push_bind(last_four.clone());
        }
    }
    if let Some(code) = &transition.tracking_code {
        builder.push(", tracking_code = ");
        builder.push_bind(code.clone());
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" AND ");
    push_status_in(&mut builder, predecessors);
    trace!("🗃️ Executing query: {}", builder.sql());
    let result = builder.build().execute(conn).await?;
    let changed = result.rows_affected() == 1;
    trace!("🗃️ Transition of order {id} to {} changed {} rows", transition.target, result.rows_affected());
    Ok(changed)
}

/// Stores the carrier shipment id, but only if the order does not have one yet.
pub async fn set_carrier_shipment_id(
    id: OrderId,
    shipment_id: &str,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE orders SET carrier_shipment_id = $1, updated_at = $2 WHERE id = $3 AND carrier_shipment_id IS NULL",
    )
    .bind(shipment_id)
    .bind(Utc::now())
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
