use super::*;
use crate::payments::{CheckoutSession, PaymentError, PaymentIntent, SessionLineItem};
use crate::state::test_helpers;
use std::sync::Mutex;

/// Gateway that records calls and returns canned responses.
struct MockGateway {
    intents: Mutex<Vec<i64>>,
    sessions: Mutex<Vec<(Vec<SessionLineItem>, String, String)>>,
    fail_with: Option<String>,
}

impl MockGateway {
    fn ok() -> Self {
        Self { intents: Mutex::new(Vec::new()), sessions: Mutex::new(Vec::new()), fail_with: None }
    }

    fn failing(message: &str) -> Self {
        Self {
            intents: Mutex::new(Vec::new()),
            sessions: Mutex::new(Vec::new()),
            fail_with: Some(message.to_owned()),
        }
    }
}

#[async_trait::async_trait]
impl PaymentGateway for MockGateway {
    async fn create_payment_intent(&self, amount_cents: i64, _currency: &str) -> Result<PaymentIntent, PaymentError> {
        if let Some(message) = &self.fail_with {
            return Err(PaymentError::ApiResponse { status: 402, message: message.clone() });
        }
        self.intents.lock().expect("mock mutex should lock").push(amount_cents);
        Ok(PaymentIntent { id: "pi_test".into(), client_secret: format!("pi_test_secret_{amount_cents}") })
    }

    async fn create_checkout_session(
        &self,
        line_items: &[SessionLineItem],
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, PaymentError> {
        if let Some(message) = &self.fail_with {
            return Err(PaymentError::ApiResponse { status: 500, message: message.clone() });
        }
        self.sessions
            .lock()
            .expect("mock mutex should lock")
            .push((line_items.to_vec(), success_url.to_owned(), cancel_url.to_owned()));
        Ok(CheckoutSession { id: "cs_test".into(), url: "https://checkout.stripe.com/c/pay/cs_test".into() })
    }
}

fn item(price: f64, quantity: u32) -> CartItem {
    CartItem { id: "prod".into(), name: "Shea Butter".into(), price, quantity }
}

fn body(items: Vec<CartItem>) -> Json<CheckoutBody> {
    Json(CheckoutBody { items })
}

// =============================================================================
// INTENT ROUTE
// =============================================================================

#[tokio::test]
async fn intent_without_gateway_fails_fast() {
    let state = test_helpers::test_app_state();
    let err = create_intent(State(state), body(vec![item(10.0, 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotConfigured(_)));
}

#[tokio::test]
async fn zero_total_is_free_and_skips_provider() {
    let gateway = Arc::new(MockGateway::ok());
    let state = test_helpers::test_app_state_with_gateway(gateway.clone());

    let Json(response) = create_intent(State(state), body(vec![item(10.0, 0)]))
        .await
        .unwrap();
    assert_eq!(response, serde_json::json!({ "free": true }));
    assert!(gateway.intents.lock().unwrap().is_empty());
}

#[tokio::test]
async fn empty_cart_is_free() {
    let gateway = Arc::new(MockGateway::ok());
    let state = test_helpers::test_app_state_with_gateway(gateway.clone());

    let Json(response) = create_intent(State(state), body(vec![])).await.unwrap();
    assert_eq!(response, serde_json::json!({ "free": true }));
}

#[tokio::test]
async fn below_minimum_rejects_without_provider_call() {
    let gateway = Arc::new(MockGateway::ok());
    let state = test_helpers::test_app_state_with_gateway(gateway.clone());

    let err = create_intent(State(state), body(vec![item(0.49, 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::MinimumAmount { min_cents: 50 }));
    assert!(gateway.intents.lock().unwrap().is_empty());
}

#[tokio::test]
async fn charge_passes_rounded_cents_to_provider() {
    let gateway = Arc::new(MockGateway::ok());
    let state = test_helpers::test_app_state_with_gateway(gateway.clone());

    let Json(response) = create_intent(State(state), body(vec![item(19.99, 2), item(0.015, 1)]))
        .await
        .unwrap();

    // 19.99 * 2 * 100 = 3998; 0.015 * 100 rounds to 2.
    assert_eq!(gateway.intents.lock().unwrap().as_slice(), &[4000]);
    assert_eq!(
        response.get("clientSecret").and_then(|v| v.as_str()),
        Some("pi_test_secret_4000")
    );
}

#[tokio::test]
async fn minimum_boundary_is_chargeable() {
    let gateway = Arc::new(MockGateway::ok());
    let state = test_helpers::test_app_state_with_gateway(gateway.clone());

    create_intent(State(state), body(vec![item(0.50, 1)])).await.unwrap();
    assert_eq!(gateway.intents.lock().unwrap().as_slice(), &[50]);
}

#[tokio::test]
async fn negative_price_is_a_validation_error() {
    let gateway = Arc::new(MockGateway::ok());
    let state = test_helpers::test_app_state_with_gateway(gateway.clone());

    let err = create_intent(State(state), body(vec![item(-1.0, 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    assert!(gateway.intents.lock().unwrap().is_empty());
}

#[tokio::test]
async fn provider_failure_passes_message_through() {
    let gateway = Arc::new(MockGateway::failing("card declined"));
    let state = test_helpers::test_app_state_with_gateway(gateway);

    let err = create_intent(State(state), body(vec![item(10.0, 1)]))
        .await
        .unwrap_err();
    let ApiError::Provider(message) = err else {
        panic!("expected Provider error");
    };
    assert_eq!(message, "card declined");
}

// =============================================================================
// SESSION ROUTE
// =============================================================================

#[tokio::test]
async fn session_without_gateway_fails_fast() {
    let state = test_helpers::test_app_state();
    let err = create_session(State(state), HeaderMap::new(), body(vec![item(10.0, 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotConfigured(_)));
}

#[tokio::test]
async fn session_forwards_items_without_totaling() {
    let gateway = Arc::new(MockGateway::ok());
    let state = test_helpers::test_app_state_with_gateway(gateway.clone());

    let Json(response) = create_session(
        State(state),
        HeaderMap::new(),
        body(vec![item(12.50, 2), item(0.99, 5)]),
    )
    .await
    .unwrap();

    assert_eq!(
        response.get("url").and_then(|v| v.as_str()),
        Some("https://checkout.stripe.com/c/pay/cs_test")
    );

    let sessions = gateway.sessions.lock().unwrap();
    let (items, success_url, cancel_url) = &sessions[0];
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].unit_amount_cents, 1250);
    assert_eq!(items[0].quantity, 2);
    assert!(success_url.ends_with("/marketplace?success=true"));
    assert!(cancel_url.ends_with("/marketplace?canceled=true"));
}

#[tokio::test]
async fn session_uses_request_origin_when_base_unset() {
    let gateway = Arc::new(MockGateway::ok());
    let state = test_helpers::test_app_state_with_gateway(gateway.clone());

    let mut headers = HeaderMap::new();
    headers.insert(ORIGIN, "https://thenewalkebulan.com".parse().unwrap());
    create_session(State(state), headers, body(vec![item(10.0, 1)]))
        .await
        .unwrap();

    let sessions = gateway.sessions.lock().unwrap();
    assert_eq!(sessions[0].1, "https://thenewalkebulan.com/marketplace?success=true");
}

// =============================================================================
// CARD VALIDATION
// =============================================================================

#[tokio::test]
async fn validate_card_reports_luhn_and_brand() {
    let Json(response) = validate_card(Json(ValidateCardBody { number: Some("4242424242424242".into()) }))
        .await
        .unwrap();
    assert_eq!(response.get("valid").and_then(serde_json::Value::as_bool), Some(true));
    assert_eq!(response.get("brand").and_then(|v| v.as_str()), Some("visa"));

    let Json(response) = validate_card(Json(ValidateCardBody { number: Some("4242424242424241".into()) }))
        .await
        .unwrap();
    assert_eq!(response.get("valid").and_then(serde_json::Value::as_bool), Some(false));
}

#[tokio::test]
async fn validate_card_requires_number() {
    let err = validate_card(Json(ValidateCardBody { number: None })).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

// =============================================================================
// BASE URL RESOLUTION
// =============================================================================

#[test]
fn base_url_prefers_configured_value() {
    let mut headers = HeaderMap::new();
    headers.insert(ORIGIN, "https://other.example".parse().unwrap());
    assert_eq!(
        request_base_url(Some("https://app.example/"), &headers),
        "https://app.example"
    );
}

#[test]
fn base_url_falls_back_to_origin_then_host() {
    let mut headers = HeaderMap::new();
    headers.insert(ORIGIN, "https://origin.example".parse().unwrap());
    assert_eq!(request_base_url(None, &headers), "https://origin.example");

    let mut headers = HeaderMap::new();
    headers.insert(HOST, "host.example:8080".parse().unwrap());
    assert_eq!(request_base_url(None, &headers), "http://host.example:8080");

    assert_eq!(request_base_url(None, &HeaderMap::new()), "http://localhost:3000");
}
