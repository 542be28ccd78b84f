//! HTTP handlers for billing endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;

use axum::extract::{Json, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use secrecy::{ExposeSecret, SecretString};

use crate::application::handlers::billing::{
    BillingRequestError, ConfirmSessionCommand, ConfirmSessionHandler,
    CreateCheckoutSessionCommand, CreateCheckoutSessionHandler, CreatePortalSessionCommand,
    CreatePortalSessionHandler, CustomerProvisioner, GetStatusHandler, GetStatusQuery,
    ProcessAppleWebhookCommand, ProcessAppleWebhookHandler, ProcessWebhookCommand,
    ProcessWebhookHandler, RecordWriter,
};
use crate::domain::billing::{AppleNotificationEnvelope, WebhookError, WebhookVerifier};
use crate::ports::{AppleNotificationVerifier, PaymentProvider, SnapshotCache, UserRecordStore};

use super::dto::{
    BillingRecordResponse, CheckoutSessionRequest, ConfirmSessionRequest, ConfirmSessionResponse,
    ErrorResponse, PortalSessionRequest, SessionUrlResponse, StatusParams, StatusResponse,
    WebhookAckResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// This struct is cloned for each request and contains Arc-wrapped dependencies
/// for efficient sharing across handlers.
#[derive(Clone)]
pub struct BillingAppState {
    pub record_store: Arc<dyn UserRecordStore>,
    pub snapshot_cache: Arc<dyn SnapshotCache>,
    pub payment_provider: Arc<dyn PaymentProvider>,
    /// None when App Store verification is not configured.
    pub apple_verifier: Option<Arc<dyn AppleNotificationVerifier>>,
    pub webhook_secret: SecretString,
    pub price_id: Option<String>,
    pub public_base_url: String,
    pub require_livemode: bool,
}

impl BillingAppState {
    /// Create handlers on demand from the shared state.
    pub fn webhook_handler(&self) -> ProcessWebhookHandler {
        ProcessWebhookHandler::new(
            WebhookVerifier::new(self.webhook_secret.expose_secret()),
            self.payment_provider.clone(),
            self.record_store.clone(),
            self.snapshot_cache.clone(),
            self.require_livemode,
        )
    }

    pub fn apple_webhook_handler(&self) -> ProcessAppleWebhookHandler {
        ProcessAppleWebhookHandler::new(
            self.apple_verifier.clone(),
            self.record_store.clone(),
            self.snapshot_cache.clone(),
        )
    }

    pub fn checkout_handler(&self) -> CreateCheckoutSessionHandler {
        CreateCheckoutSessionHandler::new(
            self.payment_provider.clone(),
            self.provisioner(),
            self.price_id.clone(),
            self.public_base_url.clone(),
        )
    }

    pub fn portal_handler(&self) -> CreatePortalSessionHandler {
        CreatePortalSessionHandler::new(
            self.payment_provider.clone(),
            self.record_store.clone(),
            self.public_base_url.clone(),
        )
    }

    pub fn status_handler(&self) -> GetStatusHandler {
        GetStatusHandler::new(self.record_store.clone())
    }

    pub fn confirm_handler(&self) -> ConfirmSessionHandler {
        ConfirmSessionHandler::new(
            self.payment_provider.clone(),
            self.record_store.clone(),
            self.snapshot_cache.clone(),
        )
    }

    fn provisioner(&self) -> CustomerProvisioner {
        let writer = RecordWriter::new(self.record_store.clone(), self.snapshot_cache.clone());
        CustomerProvisioner::new(
            self.payment_provider.clone(),
            self.record_store.clone(),
            writer,
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /webhook - Handle provider webhook events.
///
/// The body must stay raw bytes; the signature covers them exactly as
/// sent. Benign drops are acknowledged with 200 so the provider stops
/// redelivering.
pub async fn handle_stripe_webhook(
    State(state): State<BillingAppState>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> axum::response::Response {
    let signature = match headers.get("Stripe-Signature").and_then(|v| v.to_str().ok()) {
        Some(signature) => signature.to_string(),
        None => {
            return webhook_error_response(&WebhookError::ParseError(
                "Missing Stripe-Signature header".to_string(),
            ));
        }
    };

    let handler = state.webhook_handler();
    let cmd = ProcessWebhookCommand {
        payload: body.to_vec(),
        signature,
    };

    match handler.handle(cmd).await {
        Ok(_) => (StatusCode::OK, Json(WebhookAckResponse { received: true })).into_response(),
        Err(err) => webhook_error_response(&err),
    }
}

/// POST /webhook-apple - Handle App Store server notifications.
pub async fn handle_apple_webhook(
    State(state): State<BillingAppState>,
    Json(envelope): Json<AppleNotificationEnvelope>,
) -> axum::response::Response {
    let handler = state.apple_webhook_handler();
    let cmd = ProcessAppleWebhookCommand {
        signed_payload: envelope.signed_payload,
    };

    match handler.handle(cmd).await {
        Ok(_) => (StatusCode::OK, Json(WebhookAckResponse { received: true })).into_response(),
        Err(err) => webhook_error_response(&err),
    }
}

/// Maps a webhook error to its response. Errors whose status is 2xx are
/// acknowledgements in disguise and get the ack body.
fn webhook_error_response(err: &WebhookError) -> axum::response::Response {
    let status = err.status_code();
    if status.is_success() {
        return (status, Json(WebhookAckResponse { received: true })).into_response();
    }

    let error_code = match err {
        WebhookError::InvalidSignature => "INVALID_SIGNATURE",
        WebhookError::TimestampOutOfRange | WebhookError::InvalidTimestamp => "INVALID_TIMESTAMP",
        WebhookError::ParseError(_) => "PARSE_ERROR",
        WebhookError::MissingField(_) => "MISSING_FIELD",
        WebhookError::VerificationUnavailable => "VERIFICATION_UNAVAILABLE",
        WebhookError::ProviderApi(_) => "PROVIDER_ERROR",
        // 2xx variants are handled above
        WebhookError::UnresolvedIdentity | WebhookError::Ignored(_) => "ACKNOWLEDGED",
    };

    (status, Json(ErrorResponse::new(error_code, err.to_string()))).into_response()
}

// ════════════════════════════════════════════════════════════════════════════════
// Session and Status Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /create-checkout-session - Start the hosted checkout flow.
pub async fn create_checkout_session(
    State(state): State<BillingAppState>,
    Json(request): Json<CheckoutSessionRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let handler = state.checkout_handler();
    let cmd = CreateCheckoutSessionCommand {
        email: request.email,
        external_token: request.external_token,
    };

    let session = handler.handle(cmd).await?;

    Ok(Json(SessionUrlResponse { url: session.url }))
}

/// POST /create-portal-session - Open the billing portal.
pub async fn create_portal_session(
    State(state): State<BillingAppState>,
    Json(request): Json<PortalSessionRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let handler = state.portal_handler();
    let cmd = CreatePortalSessionCommand {
        email: request.email,
    };

    let session = handler.handle(cmd).await?;

    Ok(Json(SessionUrlResponse { url: session.url }))
}

/// GET /status?identity=... - Read the billing record for an identity.
pub async fn get_status(
    State(state): State<BillingAppState>,
    Query(params): Query<StatusParams>,
) -> Result<impl IntoResponse, BillingApiError> {
    let handler = state.status_handler();
    let query = GetStatusQuery {
        identity: params.identity,
    };

    let result = handler.handle(query).await?;

    Ok(Json(StatusResponse {
        user: result.record.map(BillingRecordResponse::from),
    }))
}

/// POST /confirm-session - Confirm a checkout session after redirect.
pub async fn confirm_session(
    State(state): State<BillingAppState>,
    Json(request): Json<ConfirmSessionRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let handler = state.confirm_handler();
    let cmd = ConfirmSessionCommand {
        session_id: request.session_id,
        identity: request.identity,
    };

    let result = handler.handle(cmd).await?;

    Ok(Json(ConfirmSessionResponse {
        identity: result.identity.as_str().to_string(),
        is_premium: result.is_premium,
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts application errors to HTTP responses.
pub struct BillingApiError(BillingRequestError);

impl From<BillingRequestError> for BillingApiError {
    fn from(err: BillingRequestError) -> Self {
        Self(err)
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_code) = match &self.0 {
            BillingRequestError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            BillingRequestError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            BillingRequestError::Provider(_) => (StatusCode::BAD_GATEWAY, "PAYMENT_PROVIDER_ERROR"),
            BillingRequestError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse::new(error_code, self.0.to_string());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{PaymentError, StoreError};

    // ════════════════════════════════════════════════════════════════════════════
    // Error Mapping Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn api_error_maps_invalid_request_to_400() {
        let err = BillingApiError(BillingRequestError::InvalidRequest("bad".to_string()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_maps_not_found_to_404() {
        let err = BillingApiError(BillingRequestError::NotFound("customer"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn api_error_maps_provider_failure_to_502() {
        let err = BillingApiError(BillingRequestError::Provider(PaymentError::network(
            "timeout",
        )));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn api_error_maps_storage_failure_to_500() {
        let err = BillingApiError(BillingRequestError::Storage(StoreError::Database(
            "down".to_string(),
        )));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Webhook Response Mapping Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn invalid_signature_maps_to_401() {
        let response = webhook_error_response(&WebhookError::InvalidSignature);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn unresolved_identity_is_acknowledged_with_200() {
        let response = webhook_error_response(&WebhookError::UnresolvedIdentity);
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn ignored_event_is_acknowledged_with_200() {
        let response = webhook_error_response(&WebhookError::Ignored("test mode".to_string()));
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn provider_failure_maps_to_500_for_redelivery() {
        let response = webhook_error_response(&WebhookError::ProviderApi("timeout".to_string()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn verification_unavailable_maps_to_400() {
        let response = webhook_error_response(&WebhookError::VerificationUnavailable);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
