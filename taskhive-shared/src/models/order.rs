/// Order models and database operations
///
/// Confirmed orders land in `orders` after gateway signature verification;
/// checkouts that never complete are captured in `abandoned_orders` with a
/// locally generated reference. Stats are computed over the previous IST
/// civil day because that is the day boundary the storefront reports on.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE payment_gateway AS ENUM ('razorpay', 'cashfree');
///
/// CREATE TABLE orders (
///     id UUID PRIMARY KEY,
///     order_id TEXT NOT NULL,
///     full_name TEXT NOT NULL,
///     email TEXT NOT NULL,
///     phone TEXT NOT NULL,
///     profession TEXT,
///     remarks TEXT,
///     amount BIGINT NOT NULL,
///     additional_products TEXT[] NOT NULL DEFAULT '{}',
///     gateway payment_gateway NOT NULL,
///     payment_id TEXT,
///     signature TEXT,
///     delivery_email_sent BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT orders_order_id_key UNIQUE (order_id)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::models::order::Order;
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// // Replays of a confirmed payment look the order up first
/// if let Some(existing) = Order::find_by_order_id(&pool, "order_N5Xk2x").await? {
///     println!("already recorded: {}", existing.id);
/// }
/// # Ok(())
/// # }
/// ```
use chrono::{DateTime, Days, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// IST is UTC+05:30, no daylight saving
const IST_OFFSET_SECONDS: i64 = 5 * 3600 + 30 * 60;

/// Random suffix length for abandoned-order references
const ABANDONED_REF_SUFFIX_LENGTH: usize = 6;

/// Which gateway collected the payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_gateway", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentGateway {
    Razorpay,
    Cashfree,
}

impl PaymentGateway {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentGateway::Razorpay => "razorpay",
            PaymentGateway::Cashfree => "cashfree",
        }
    }
}

/// A confirmed order.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    /// Unique row ID (UUID v4)
    pub id: Uuid,

    /// Gateway order reference; unique, the idempotency key for confirmation
    pub order_id: String,

    /// Customer name
    pub full_name: String,

    /// Customer email; delivery target for the confirmation email
    pub email: String,

    /// Customer phone
    pub phone: String,

    /// Optional self-reported profession
    pub profession: Option<String>,

    /// Optional free-form remarks
    pub remarks: Option<String>,

    /// Amount in the smallest currency unit (paise)
    pub amount: i64,

    /// Extra product codes beyond the base purchase
    pub additional_products: Vec<String>,

    /// Gateway that collected the payment
    pub gateway: PaymentGateway,

    /// Gateway payment reference, when reported
    pub payment_id: Option<String>,

    /// Gateway signature presented at confirmation, kept for audit
    pub signature: Option<String>,

    /// Whether the fulfilment email went out
    pub delivery_email_sent: bool,

    /// When the order was recorded
    pub created_at: DateTime<Utc>,

    /// When the order was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for recording a confirmed order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrder {
    pub order_id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub profession: Option<String>,
    pub remarks: Option<String>,
    pub amount: i64,
    pub additional_products: Vec<String>,
    pub gateway: PaymentGateway,
    pub payment_id: Option<String>,
    pub signature: Option<String>,
}

/// A checkout that collected contact details but never completed payment.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AbandonedOrder {
    pub id: Uuid,

    /// Locally generated reference, `abd_<millis>_<random>`
    pub abd_order_id: String,

    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub profession: Option<String>,
    pub remarks: Option<String>,
    pub amount: i64,
    pub additional_products: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for capturing an abandoned checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAbandonedOrder {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub profession: Option<String>,
    pub remarks: Option<String>,
    pub amount: i64,
    pub additional_products: Vec<String>,
}

/// Previous-IST-day order counts plus the most recent order overall.
#[derive(Debug, Clone, Serialize)]
pub struct OrderStats {
    /// The IST civil day the counts cover
    pub date: NaiveDate,
    pub orders: i64,
    pub abandoned: i64,
    pub latest_order: Option<Order>,
}

/// Generates an abandoned-order reference: `abd_<millis>_<random>`.
pub fn generate_abandoned_ref() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();

    let suffix: String = (0..ABANDONED_REF_SUFFIX_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect();

    format!("abd_{}_{}", Utc::now().timestamp_millis(), suffix)
}

/// UTC bounds `[start, end)` of yesterday's IST civil day, relative to `now`.
pub fn ist_yesterday_utc_bounds(now: DateTime<Utc>) -> (NaiveDate, DateTime<Utc>, DateTime<Utc>) {
    let offset = Duration::seconds(IST_OFFSET_SECONDS);
    let ist_today = (now + offset).date_naive();
    let ist_yesterday = ist_today - Days::new(1);

    // Midnight IST expressed back as a UTC instant
    let start = Utc.from_utc_datetime(&(ist_yesterday.and_time(NaiveTime::MIN) - offset));
    let end = start + Duration::hours(24);

    (ist_yesterday, start, end)
}

const ORDER_COLUMNS: &str = "id, order_id, full_name, email, phone, profession, remarks, \
     amount, additional_products, gateway, payment_id, signature, delivery_email_sent, \
     created_at, updated_at";

const ABANDONED_COLUMNS: &str = "id, abd_order_id, full_name, email, phone, profession, \
     remarks, amount, additional_products, created_at";

impl Order {
    /// Records a confirmed order.
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on `orders_order_id_key` if the gateway
    /// order was already recorded; callers treat replays via
    /// [`Order::find_by_order_id`] before inserting.
    pub async fn create(pool: &PgPool, data: CreateOrder) -> Result<Self, sqlx::Error> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO orders (id, order_id, full_name, email, phone, profession, remarks,
                                amount, additional_products, gateway, payment_id, signature)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(data.order_id)
        .bind(data.full_name)
        .bind(data.email)
        .bind(data.phone)
        .bind(data.profession)
        .bind(data.remarks)
        .bind(data.amount)
        .bind(data.additional_products)
        .bind(data.gateway)
        .bind(data.payment_id)
        .bind(data.signature)
        .fetch_one(pool)
        .await?;

        Ok(order)
    }

    /// Finds an order by row ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(order)
    }

    /// Finds an order by its gateway order reference.
    pub async fn find_by_order_id(
        pool: &PgPool,
        order_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = $1"
        ))
        .bind(order_id)
        .fetch_optional(pool)
        .await?;

        Ok(order)
    }

    /// Sets the delivery-email flag and returns the updated order.
    pub async fn set_delivery_email_sent(
        pool: &PgPool,
        id: Uuid,
        sent: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            UPDATE orders SET delivery_email_sent = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(sent)
        .fetch_optional(pool)
        .await?;

        Ok(order)
    }

    /// Lists orders newest first within an optional creation window.
    pub async fn list(
        pool: &PgPool,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE ($1::timestamptz IS NULL OR created_at >= $1)
              AND ($2::timestamptz IS NULL OR created_at < $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(from)
        .bind(to)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(orders)
    }

    /// Counts orders within an optional creation window.
    pub async fn count(
        pool: &PgPool,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM orders
            WHERE ($1::timestamptz IS NULL OR created_at >= $1)
              AND ($2::timestamptz IS NULL OR created_at < $2)
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(pool)
        .await?;

        Ok(count.0)
    }

    /// Computes counts for yesterday's IST civil day plus the latest order.
    pub async fn stats_for_yesterday(pool: &PgPool) -> Result<OrderStats, sqlx::Error> {
        let (date, start, end) = ist_yesterday_utc_bounds(Utc::now());

        let orders = Self::count(pool, Some(start), Some(end)).await?;
        let abandoned = AbandonedOrder::count_between(pool, start, end).await?;

        let latest_order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC LIMIT 1"
        ))
        .fetch_optional(pool)
        .await?;

        Ok(OrderStats {
            date,
            orders,
            abandoned,
            latest_order,
        })
    }
}

impl AbandonedOrder {
    /// Captures an abandoned checkout under a freshly generated reference.
    pub async fn create(pool: &PgPool, data: CreateAbandonedOrder) -> Result<Self, sqlx::Error> {
        let order = sqlx::query_as::<_, AbandonedOrder>(&format!(
            r#"
            INSERT INTO abandoned_orders (id, abd_order_id, full_name, email, phone,
                                          profession, remarks, amount, additional_products)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {ABANDONED_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(generate_abandoned_ref())
        .bind(data.full_name)
        .bind(data.email)
        .bind(data.phone)
        .bind(data.profession)
        .bind(data.remarks)
        .bind(data.amount)
        .bind(data.additional_products)
        .fetch_one(pool)
        .await?;

        Ok(order)
    }

    /// Lists abandoned checkouts, newest first.
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let orders = sqlx::query_as::<_, AbandonedOrder>(&format!(
            r#"
            SELECT {ABANDONED_COLUMNS} FROM abandoned_orders
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(orders)
    }

    /// Counts abandoned checkouts in `[start, end)`.
    /// Counts all abandoned checkouts.
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM abandoned_orders")
            .fetch_one(pool)
            .await?;

        Ok(count.0)
    }

    pub async fn count_between(
        pool: &PgPool,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM abandoned_orders WHERE created_at >= $1 AND created_at < $2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await?;

        Ok(count.0)
    }

    /// Deletes an abandoned checkout (e.g. after conversion or expiry).
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM abandoned_orders WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_as_str() {
        assert_eq!(PaymentGateway::Razorpay.as_str(), "razorpay");
        assert_eq!(PaymentGateway::Cashfree.as_str(), "cashfree");
    }

    #[test]
    fn test_gateway_serde() {
        let gateway: PaymentGateway = serde_json::from_str("\"razorpay\"").unwrap();
        assert_eq!(gateway, PaymentGateway::Razorpay);
        assert!(serde_json::from_str::<PaymentGateway>("\"stripe\"").is_err());
    }

    #[test]
    fn test_abandoned_ref_format() {
        let reference = generate_abandoned_ref();
        assert!(reference.starts_with("abd_"));

        let parts: Vec<&str> = reference.splitn(3, '_').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), ABANDONED_REF_SUFFIX_LENGTH);
    }

    #[test]
    fn test_abandoned_refs_are_unique() {
        let a = generate_abandoned_ref();
        let b = generate_abandoned_ref();
        assert_ne!(a, b);
    }

    #[test]
    fn test_ist_yesterday_bounds_midday() {
        // 10:00 UTC is 15:30 IST the same day
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let (date, start, end) = ist_yesterday_utc_bounds(now);

        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 14).unwrap());
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 13, 18, 30, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 1, 14, 18, 30, 0).unwrap());
    }

    #[test]
    fn test_ist_yesterday_bounds_crosses_date_line() {
        // 20:00 UTC is already 01:30 IST the next day
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 20, 0, 0).unwrap();
        let (date, start, end) = ist_yesterday_utc_bounds(now);

        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 14, 18, 30, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 1, 15, 18, 30, 0).unwrap());
    }

    #[test]
    fn test_bounds_span_exactly_one_day() {
        let now = Utc::now();
        let (_, start, end) = ist_yesterday_utc_bounds(now);
        assert_eq!(end - start, Duration::hours(24));
        assert!(end <= now);
    }

    // Integration tests for database operations are in tests/ and require
    // a running database
}
