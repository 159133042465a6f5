//! HTTP handlers for billing endpoints.
//!
//! Connects Axum routes to the application layer handlers. Checkout and
//! portal endpoints surface errors synchronously; the webhook endpoint only
//! errors on signature/configuration problems and acknowledges everything
//! else once verification passes.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::billing::{
    CreateCheckoutCommand, CreateCheckoutHandler, CreatePortalCommand, CreatePortalHandler,
    GetSubscriptionHandler, GetSubscriptionQuery, ProcessWebhookCommand, ProcessWebhookHandler,
    SyncSubscriptionHandler, UpdateCancellationCommand, UpdateCancellationHandler,
};
use crate::config::PaymentConfig;
use crate::domain::billing::BillingError;
use crate::domain::foundation::{PlanId, UserId};
use crate::ports::{PaymentProvider, PlanCatalog, ProfileRepository, SubscriptionStore};

use super::dto::{
    ApiResponse, CheckoutData, CheckoutRequest, ErrorResponse, PortalData, PortalRequest,
    SubscriptionData, WebhookAck,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for billing routes.
///
/// Cloned per request; all dependencies are Arc-wrapped.
#[derive(Clone)]
pub struct BillingAppState {
    pub profiles: Arc<dyn ProfileRepository>,
    pub catalog: Arc<dyn PlanCatalog>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub payment_provider: Arc<dyn PaymentProvider>,
    pub payment_config: Arc<PaymentConfig>,
}

impl BillingAppState {
    fn sync_handler(&self) -> Arc<SyncSubscriptionHandler> {
        Arc::new(SyncSubscriptionHandler::new(
            self.profiles.clone(),
            self.catalog.clone(),
            self.subscriptions.clone(),
        ))
    }

    pub fn webhook_handler(&self) -> ProcessWebhookHandler {
        ProcessWebhookHandler::new(
            self.payment_config.stripe_webhook_secret.clone(),
            self.profiles.clone(),
            self.sync_handler(),
        )
    }

    pub fn checkout_handler(&self) -> CreateCheckoutHandler {
        CreateCheckoutHandler::new(
            self.payment_config.has_secret_key(),
            self.payment_config.checkout_success_url.clone(),
            self.payment_config.checkout_cancel_url.clone(),
            self.profiles.clone(),
            self.payment_provider.clone(),
        )
    }

    pub fn portal_handler(&self) -> CreatePortalHandler {
        CreatePortalHandler::new(
            self.payment_config.has_secret_key(),
            self.payment_config.portal_return_url.clone(),
            self.profiles.clone(),
            self.payment_provider.clone(),
        )
    }

    pub fn cancellation_handler(&self) -> UpdateCancellationHandler {
        UpdateCancellationHandler::new(
            self.subscriptions.clone(),
            self.payment_provider.clone(),
            self.sync_handler(),
        )
    }

    pub fn subscription_query(&self) -> GetSubscriptionHandler {
        GetSubscriptionHandler::new(self.subscriptions.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Authenticated User Extraction
// ════════════════════════════════════════════════════════════════════════════════

/// Authenticated user context extracted from the request.
///
/// The identity provider is an external collaborator: the upstream gateway
/// validates the session and injects `X-User-Id` / `X-User-Email` headers.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub email: String,
}

/// Rejection type for AuthenticatedUser extraction.
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> axum::response::Response {
        let error = ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

impl<S> axum::extract::FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let user_id = parts
                .headers
                .get("X-User-Id")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| UserId::new(s).ok())
                .ok_or(AuthenticationRequired)?;

            let email = parts
                .headers
                .get("X-User-Email")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();

            Ok(AuthenticatedUser { user_id, email })
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Endpoint Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /billing/webhook - ingest a provider webhook delivery
pub async fn handle_webhook(
    State(state): State<BillingAppState>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> axum::response::Response {
    let signature = headers
        .get("provider-signature")
        .or_else(|| headers.get("stripe-signature"))
        .and_then(|v| v.to_str().ok());

    let Some(signature) = signature else {
        let error = ErrorResponse::new(
            "INVALID_WEBHOOK_SIGNATURE",
            "Missing provider-signature header",
        );
        return (StatusCode::BAD_REQUEST, Json(error)).into_response();
    };

    let handler = state.webhook_handler();
    let cmd = ProcessWebhookCommand {
        payload: body.to_vec(),
        signature: signature.to_string(),
    };

    match handler.handle(cmd).await {
        // Signature valid: always acknowledge, whatever the handlers did.
        Ok(_receipt) => (StatusCode::OK, Json(WebhookAck::received())).into_response(),
        // Signature or secret problems are the only non-2xx responses.
        Err(err) => {
            let error = ErrorResponse::new(err.code().to_string(), err.message());
            (StatusCode::BAD_REQUEST, Json(error)).into_response()
        }
    }
}

/// POST /billing/checkout - open a hosted checkout session
pub async fn create_checkout(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
    Json(request): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let plan_id = PlanId::new(request.plan_id)
        .map_err(|e| BillingError::validation("planId", e.to_string()))?;

    let handler = state.checkout_handler();
    let cmd = CreateCheckoutCommand {
        user_id: user.user_id,
        email: user.email,
        price_id: request.price_id,
        plan_id,
        billing_interval: request.billing_interval,
    };

    let issued = handler.handle(cmd).await?;

    Ok(Json(ApiResponse::ok(CheckoutData::from(issued))))
}

/// POST /billing/portal - open a hosted billing portal session
pub async fn create_portal(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
    Json(request): Json<PortalRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let handler = state.portal_handler();
    let cmd = CreatePortalCommand {
        user_id: user.user_id,
        flow: request.flow_type,
        return_url: request.return_url,
        configuration_id: request.configuration_id,
    };

    let issued = handler.handle(cmd).await?;

    Ok(Json(ApiResponse::ok(PortalData::from(issued))))
}

/// GET /billing/subscription - read back the user's subscription record
pub async fn get_subscription(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, BillingApiError> {
    let handler = state.subscription_query();
    let record = handler
        .handle(GetSubscriptionQuery {
            user_id: user.user_id,
        })
        .await?;

    Ok(Json(ApiResponse::ok(record.map(SubscriptionData::from))))
}

/// POST /billing/cancel - cancel at period end
pub async fn cancel_subscription(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, BillingApiError> {
    update_cancellation(state, user, true).await
}

/// POST /billing/resume - clear a pending cancellation
pub async fn resume_subscription(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, BillingApiError> {
    update_cancellation(state, user, false).await
}

async fn update_cancellation(
    state: BillingAppState,
    user: AuthenticatedUser,
    cancel_at_period_end: bool,
) -> Result<Json<ApiResponse<SubscriptionData>>, BillingApiError> {
    let handler = state.cancellation_handler();
    let record = handler
        .handle(UpdateCancellationCommand {
            user_id: user.user_id,
            cancel_at_period_end,
        })
        .await?;

    Ok(Json(ApiResponse::ok(SubscriptionData::from(record))))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts billing errors to HTTP responses.
pub struct BillingApiError(BillingError);

impl From<BillingError> for BillingApiError {
    fn from(err: BillingError) -> Self {
        Self(err)
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            BillingError::InvalidSignature => StatusCode::BAD_REQUEST,
            BillingError::Validation { .. } => StatusCode::BAD_REQUEST,
            BillingError::CustomerNotConfigured(_)
            | BillingError::SubscriptionNotFound(_)
            | BillingError::PlanNotFound(_) => StatusCode::NOT_FOUND,
            BillingError::Configuration(_)
            | BillingError::ProviderApi(_)
            | BillingError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorResponse::new(self.0.code().to_string(), self.0.message());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryPlanCatalog, InMemoryProfileRepository, InMemorySubscriptionStore,
    };
    use crate::adapters::stripe::MockPaymentProvider;
    use crate::domain::billing::{SubscriptionPlan, UserProfile, UserSubscription};
    use crate::domain::foundation::PlanId;
    use crate::domain::billing::BillingInterval;

    fn pro_plan() -> SubscriptionPlan {
        SubscriptionPlan {
            plan_id: PlanId::new("pro").unwrap(),
            name: "Pro".to_string(),
            monthly_price: 1900,
            yearly_price: 19000,
            currency: "usd".to_string(),
            stripe_monthly_price_id: Some("price_pro_month".to_string()),
            stripe_yearly_price_id: Some("price_pro_year".to_string()),
            stripe_product_id: Some("prod_pro".to_string()),
            is_active: true,
        }
    }

    fn configured_payment() -> PaymentConfig {
        PaymentConfig {
            stripe_secret_key: "sk_test_abc".to_string(),
            stripe_webhook_secret: "whsec_test".to_string(),
            ..Default::default()
        }
    }

    fn test_state() -> BillingAppState {
        BillingAppState {
            profiles: Arc::new(InMemoryProfileRepository::new()),
            catalog: Arc::new(InMemoryPlanCatalog::with_plans(vec![pro_plan()])),
            subscriptions: Arc::new(InMemorySubscriptionStore::new()),
            payment_provider: Arc::new(MockPaymentProvider::new()),
            payment_config: Arc::new(configured_payment()),
        }
    }

    fn test_user() -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: UserId::new("u1").unwrap(),
            email: "u1@example.com".to_string(),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Handler Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn checkout_returns_session_payload() {
        let result = create_checkout(
            State(test_state()),
            test_user(),
            Json(CheckoutRequest {
                price_id: "price_pro_month".to_string(),
                plan_id: "pro".to_string(),
                billing_interval: BillingInterval::Month,
            }),
        )
        .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn checkout_with_empty_plan_id_is_rejected() {
        let result = create_checkout(
            State(test_state()),
            test_user(),
            Json(CheckoutRequest {
                price_id: "price_pro_month".to_string(),
                plan_id: String::new(),
                billing_interval: BillingInterval::Month,
            }),
        )
        .await;

        let response = result.err().unwrap().into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn portal_without_customer_is_404() {
        let result = create_portal(
            State(test_state()),
            test_user(),
            Json(PortalRequest::default()),
        )
        .await;

        let response = result.err().unwrap().into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn portal_with_customer_succeeds() {
        let state = test_state();
        let mut profile = UserProfile::new(UserId::new("u1").unwrap(), None);
        profile.attach_customer("cus_1");
        state.profiles.upsert(&profile).await.unwrap();

        let result = create_portal(State(state), test_user(), Json(PortalRequest::default())).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn subscription_query_returns_null_when_absent() {
        let result = get_subscription(State(test_state()), test_user()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn cancel_without_record_is_404() {
        let result = cancel_subscription(State(test_state()), test_user()).await;
        let response = result.err().unwrap().into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn webhook_with_missing_header_is_400() {
        let response = handle_webhook(
            State(test_state()),
            axum::http::HeaderMap::new(),
            axum::body::Bytes::from_static(b"{}"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn webhook_with_bad_signature_is_400() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert("provider-signature", "t=1,v1=deadbeef".parse().unwrap());

        let response = handle_webhook(
            State(test_state()),
            headers,
            axum::body::Bytes::from_static(b"{}"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn webhook_without_secret_is_400() {
        let mut state = test_state();
        state.payment_config = Arc::new(PaymentConfig {
            stripe_secret_key: "sk_test_abc".to_string(),
            stripe_webhook_secret: String::new(),
            ..Default::default()
        });

        let mut headers = axum::http::HeaderMap::new();
        headers.insert("provider-signature", "t=1,v1=deadbeef".parse().unwrap());

        let response =
            handle_webhook(State(state), headers, axum::body::Bytes::from_static(b"{}")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn checkout_without_secret_key_is_500() {
        let mut state = test_state();
        state.payment_config = Arc::new(PaymentConfig::default());

        let result = create_checkout(
            State(state),
            test_user(),
            Json(CheckoutRequest {
                price_id: "price_pro_month".to_string(),
                plan_id: "pro".to_string(),
                billing_interval: BillingInterval::Month,
            }),
        )
        .await;

        let response = result.err().unwrap().into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn cancel_with_paid_record_succeeds() {
        let state = test_state();
        let record: UserSubscription = serde_json::from_value(serde_json::json!({
            "user_id": "u1",
            "plan_id": "pro",
            "stripe_subscription_id": "sub_1",
            "stripe_customer_id": "cus_1",
            "status": "active",
            "current_period_start": "2024-01-01T00:00:00Z",
            "current_period_end": "2024-02-01T00:00:00Z",
            "cancel_at_period_end": false,
            "billing_interval": "month",
            "trial_start": null,
            "trial_end": null
        }))
        .unwrap();
        state.subscriptions.replace(&record).await.unwrap();

        let mut profile = UserProfile::new(UserId::new("u1").unwrap(), None);
        profile.attach_customer("cus_1");
        state.profiles.upsert(&profile).await.unwrap();

        let provider = Arc::new(MockPaymentProvider::new());
        provider.set_cancellation_response("sub_1", "cus_1", "price_pro_month", true);
        let state = BillingAppState {
            payment_provider: provider,
            ..state
        };

        let result = cancel_subscription(State(state), test_user()).await;
        assert!(result.is_ok());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Error Mapping Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn invalid_signature_maps_to_400() {
        let response = BillingApiError(BillingError::invalid_signature()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn validation_maps_to_400() {
        let response =
            BillingApiError(BillingError::validation("priceId", "empty")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn customer_not_configured_maps_to_404() {
        let response =
            BillingApiError(BillingError::customer_not_configured(UserId::new("u").unwrap()))
                .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn provider_api_maps_to_500() {
        let response = BillingApiError(BillingError::provider_api("boom")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn configuration_maps_to_500() {
        let response = BillingApiError(BillingError::configuration("no key")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
