/// Payment gateway endpoints
///
/// Thin wrappers over the two gateways' order APIs. Razorpay creates a
/// gateway order the checkout widget opens against; Cashfree creates a
/// hosted checkout session and exposes a payment-details lookup. Both are
/// pass-throughs: the handlers add credentials and normalize amounts, and
/// the gateway's JSON comes back under `data`.
///
/// A gateway whose credentials are absent from the environment is
/// disabled; calling its endpoints is a 500.
///
/// # Endpoints
///
/// - `POST /v1/payments/razorpay/order` - Create a Razorpay order
/// - `POST /v1/payments/cashfree/session` - Create a Cashfree session
/// - `GET /v1/payments/cashfree/:order_id` - Payment details for an order
use axum::extract::{Path, State};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use crate::{
    app::AppState,
    config::{CashfreeConfig, RazorpayConfig},
    error::{ApiError, ApiResult},
    response::{self, DataEnvelope},
    routes::Json,
};

/// Razorpay orders endpoint
const RAZORPAY_ORDERS_URL: &str = "https://api.razorpay.com/v1/orders";

/// Cashfree API version header value
const CASHFREE_API_VERSION: &str = "2025-01-01";

/// Razorpay order request
#[derive(Debug, Deserialize)]
pub struct RazorpayOrderRequest {
    /// Amount in rupees; converted to paise for the gateway
    pub amount: Option<i64>,
}

/// Cashfree session request
#[derive(Debug, Deserialize)]
pub struct CashfreeSessionRequest {
    /// Amount in rupees
    pub amount: Option<f64>,

    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,

    /// Page the gateway redirects back to; falls back to the configured
    /// return URL
    pub url: Option<String>,

    /// Echoed back to the return URL as `orderType`
    pub order_type: Option<String>,
}

fn razorpay_config(state: &AppState) -> Result<&RazorpayConfig, ApiError> {
    state
        .config
        .razorpay
        .as_ref()
        .ok_or_else(|| ApiError::Internal("Razorpay is not configured".to_string()))
}

fn cashfree_config(state: &AppState) -> Result<&CashfreeConfig, ApiError> {
    state
        .config
        .cashfree
        .as_ref()
        .ok_or_else(|| ApiError::Internal("Cashfree is not configured".to_string()))
}

async fn read_gateway_json(
    gateway: &str,
    response: reqwest::Response,
) -> Result<JsonValue, ApiError> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Internal(format!(
            "{} request failed: {} {}",
            gateway, status, body
        )));
    }

    let body: JsonValue = response
        .json()
        .await
        .map_err(|err| ApiError::Internal(format!("{} returned invalid JSON: {}", gateway, err)))?;

    Ok(body)
}

/// Create a Razorpay order
///
/// # Endpoint
///
/// ```text
/// POST /v1/payments/razorpay/order
///
/// { "amount": 499 }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "data": { "order_id": "order_N5...", "amount": 49900, "currency": "INR", "receipt": "rcpt_1719..." }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing or non-positive amount
/// - `500 Internal Server Error`: Gateway not configured or rejected the order
pub async fn create_razorpay_order(
    State(state): State<AppState>,
    Json(req): Json<RazorpayOrderRequest>,
) -> ApiResult<Json<DataEnvelope<JsonValue>>> {
    let razorpay = razorpay_config(&state)?;

    let amount = match req.amount {
        Some(amount) if amount > 0 => amount,
        _ => return Err(ApiError::BadRequest("Amount is required".to_string())),
    };

    let receipt = format!("rcpt_{}", Utc::now().timestamp_millis());

    let response = state
        .http
        .post(RAZORPAY_ORDERS_URL)
        .basic_auth(&razorpay.key_id, Some(&razorpay.key_secret))
        .json(&json!({
            "amount": amount * 100,
            "currency": "INR",
            "receipt": receipt,
            "payment_capture": 1,
        }))
        .send()
        .await
        .map_err(|err| ApiError::Internal(format!("Razorpay request failed: {}", err)))?;

    let order = read_gateway_json("Razorpay", response).await?;

    Ok(response::ok(json!({
        "order_id": order["id"],
        "amount": order["amount"],
        "currency": order["currency"],
        "receipt": order["receipt"],
    })))
}

/// Create a Cashfree checkout session
///
/// Builds a gateway order under a fresh `order_<millis>` reference with
/// the customer's real details and a return URL carrying `orderId` and
/// `orderType`, then returns the gateway's session JSON.
///
/// # Endpoint
///
/// ```text
/// POST /v1/payments/cashfree/session
///
/// {
///   "amount": 499,
///   "name": "Priya Sharma",
///   "email": "priya@example.com",
///   "phone": "+911234567890",
///   "url": "https://example.com/checkout",
///   "order_type": "main"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing amount, contact fields, order type, or
///   return URL
/// - `500 Internal Server Error`: Gateway not configured or rejected the order
pub async fn create_cashfree_session(
    State(state): State<AppState>,
    Json(req): Json<CashfreeSessionRequest>,
) -> ApiResult<Json<DataEnvelope<JsonValue>>> {
    let cashfree = cashfree_config(&state)?;

    let amount = match req.amount {
        Some(amount) if amount > 0.0 => amount,
        _ => return Err(ApiError::BadRequest("Amount is required".to_string())),
    };

    let name = match req.name.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => return Err(ApiError::BadRequest("Name is required".to_string())),
    };
    let email = match req.email.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => return Err(ApiError::BadRequest("Email is required".to_string())),
    };
    let phone = match req.phone.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => return Err(ApiError::BadRequest("Phone is required".to_string())),
    };
    let order_type = match req.order_type.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => return Err(ApiError::BadRequest("Order type is required".to_string())),
    };

    let base_url = req
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .or_else(|| cashfree.return_url.clone())
        .ok_or_else(|| ApiError::BadRequest("Return URL is required".to_string()))?;

    let millis = Utc::now().timestamp_millis();
    let order_id = format!("order_{}", millis);
    let customer_id = format!("cust_{}", millis);
    let return_url = format!("{}?orderId={}&orderType={}", base_url, order_id, order_type);

    let response = state
        .http
        .post(format!("{}/orders", cashfree.base_url.trim_end_matches('/')))
        .header("x-client-id", &cashfree.client_id)
        .header("x-client-secret", &cashfree.client_secret)
        .header("x-api-version", CASHFREE_API_VERSION)
        .json(&json!({
            "order_id": order_id,
            "order_amount": amount,
            "order_currency": "INR",
            "customer_details": {
                "customer_id": customer_id,
                "customer_name": name,
                "customer_email": email,
                "customer_phone": phone,
            },
            "order_meta": {
                "return_url": return_url,
            },
        }))
        .send()
        .await
        .map_err(|err| ApiError::Internal(format!("Cashfree request failed: {}", err)))?;

    let session = read_gateway_json("Cashfree", response).await?;

    Ok(response::ok(session))
}

/// Fetch payment attempts for a Cashfree order
///
/// # Endpoint
///
/// ```text
/// GET /v1/payments/cashfree/order_1719...
/// ```
///
/// # Errors
///
/// - `500 Internal Server Error`: Gateway not configured or lookup failed
pub async fn cashfree_payment_details(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> ApiResult<Json<DataEnvelope<JsonValue>>> {
    let cashfree = cashfree_config(&state)?;

    let response = state
        .http
        .get(format!(
            "{}/orders/{}/payments",
            cashfree.base_url.trim_end_matches('/'),
            order_id
        ))
        .header("x-client-id", &cashfree.client_id)
        .header("x-client-secret", &cashfree.client_secret)
        .header("x-api-version", CASHFREE_API_VERSION)
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(|err| ApiError::Internal(format!("Cashfree request failed: {}", err)))?;

    let payments = read_gateway_json("Cashfree", response).await?;

    Ok(response::ok(payments))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_request_deserializes() {
        let req: CashfreeSessionRequest = serde_json::from_str(
            r#"{
                "amount": 499,
                "name": "Priya Sharma",
                "email": "priya@example.com",
                "phone": "+911234567890",
                "order_type": "main"
            }"#,
        )
        .unwrap();

        assert_eq!(req.amount, Some(499.0));
        assert_eq!(req.order_type.as_deref(), Some("main"));
        assert!(req.url.is_none());
    }

    #[test]
    fn test_razorpay_request_tolerates_missing_amount() {
        let req: RazorpayOrderRequest = serde_json::from_str("{}").unwrap();
        assert!(req.amount.is_none());
    }

    // Gateway calls are exercised manually against the sandbox; these
    // handlers stay thin so there is no logic to cover beyond validation
}
