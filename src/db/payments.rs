use rusqlite::{params, Connection, Row};

use super::models::{Payment, PaymentStatus};
use super::new_id;

const PAYMENT_COLUMNS: &str =
    "id, order_id, amount, currency, method, payment_id, status, created_at, updated_at";

/// How many payments the recent listing returns.
pub const RECENT_LIMIT: usize = 10;

fn payment_from_row(row: &Row<'_>) -> rusqlite::Result<Payment> {
    Ok(Payment {
        id: row.get(0)?,
        order_id: row.get(1)?,
        amount: row.get(2)?,
        currency: row.get(3)?,
        method: row.get(4)?,
        payment_id: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

pub fn insert_pending(
    conn: &Connection,
    order_id: &str,
    amount: i64,
    currency: &str,
    method: &str,
) -> rusqlite::Result<Payment> {
    let id = new_id();
    conn.execute(
        "INSERT INTO payments (id, order_id, amount, currency, method, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![id, order_id, amount, currency, method, PaymentStatus::Pending],
    )?;
    conn.query_row(
        &format!("SELECT {} FROM payments WHERE id = ?1", PAYMENT_COLUMNS),
        params![id],
        payment_from_row,
    )
}

/// Record the verification outcome for an order. Returns false when no
/// payment carries that order id.
pub fn settle(
    conn: &Connection,
    order_id: &str,
    status: PaymentStatus,
    payment_id: Option<&str>,
) -> rusqlite::Result<bool> {
    let updated = conn.execute(
        "UPDATE payments SET
            status = ?2,
            payment_id = COALESCE(?3, payment_id),
            updated_at = datetime('now')
         WHERE order_id = ?1",
        params![order_id, status, payment_id],
    )?;
    Ok(updated > 0)
}

/// Mark an order failed, but only while it is still pending. A settled
/// payment is never downgraded.
pub fn fail_pending(conn: &Connection, order_id: &str) -> rusqlite::Result<bool> {
    let updated = conn.execute(
        "UPDATE payments SET status = ?2, updated_at = datetime('now')
         WHERE order_id = ?1 AND status = ?3",
        params![order_id, PaymentStatus::Failed, PaymentStatus::Pending],
    )?;
    Ok(updated > 0)
}

pub fn recent(conn: &Connection) -> rusqlite::Result<Vec<Payment>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM payments ORDER BY created_at DESC, rowid DESC LIMIT ?1",
        PAYMENT_COLUMNS
    ))?;
    let payments = stmt
        .query_map(params![RECENT_LIMIT as i64], payment_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(payments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_conn;

    #[test]
    fn pending_then_paid() {
        let conn = test_conn();
        let payment = insert_pending(&conn, "order_1", 50000, "INR", "razorpay").unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert!(payment.payment_id.is_none());

        assert!(settle(&conn, "order_1", PaymentStatus::Paid, Some("pay_1")).unwrap());
        let stored = &recent(&conn).unwrap()[0];
        assert_eq!(stored.status, PaymentStatus::Paid);
        assert_eq!(stored.payment_id.as_deref(), Some("pay_1"));

        assert!(!settle(&conn, "order_missing", PaymentStatus::Failed, None).unwrap());
    }

    #[test]
    fn fail_pending_leaves_paid_orders_alone() {
        let conn = test_conn();
        insert_pending(&conn, "order_1", 100, "INR", "razorpay").unwrap();
        insert_pending(&conn, "order_2", 100, "INR", "razorpay").unwrap();
        settle(&conn, "order_1", PaymentStatus::Paid, Some("pay_1")).unwrap();

        assert!(!fail_pending(&conn, "order_1").unwrap());
        assert!(fail_pending(&conn, "order_2").unwrap());

        let payments = recent(&conn).unwrap();
        let status_of = |order: &str| {
            payments
                .iter()
                .find(|p| p.order_id == order)
                .map(|p| p.status)
                .unwrap()
        };
        assert_eq!(status_of("order_1"), PaymentStatus::Paid);
        assert_eq!(status_of("order_2"), PaymentStatus::Failed);
    }

    #[test]
    fn duplicate_order_ids_rejected() {
        let conn = test_conn();
        insert_pending(&conn, "order_1", 100, "INR", "razorpay").unwrap();
        assert!(insert_pending(&conn, "order_1", 100, "INR", "razorpay").is_err());
    }

    #[test]
    fn recent_caps_at_limit() {
        let conn = test_conn();
        for i in 0..12 {
            insert_pending(&conn, &format!("order_{}", i), 100, "INR", "razorpay").unwrap();
        }
        let payments = recent(&conn).unwrap();
        assert_eq!(payments.len(), RECENT_LIMIT);
        assert_eq!(payments[0].order_id, "order_11");
    }
}
