//! PayU payment route handlers.
//!
//! Three surfaces:
//! - `create` signs the gateway parameters the browser submits to PayU;
//! - `callback` receives the gateway's server-to-server confirmation,
//!   verifies the digest, and reconciles the order;
//! - `verify` is the user-initiated fallback for when the callback is
//!   delayed or lost.
//!
//! The callback and fallback both funnel through
//! [`CheckoutService::place_paid_order`], and the unique constraint on the
//! order's transaction id makes racing deliveries converge on one order.

use axum::{Form, Json, extract::State};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use vastra_core::{Email, TxnId, UserId};

use crate::db::{PaymentIntentRepository, UserRepository};
use crate::error::{AppError, Result, add_breadcrumb, set_sentry_user};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::Order;
use crate::payu::{self, hash};
use crate::services::{CheckoutService, PlacedOrder};
use crate::state::AppState;

/// Amount as submitted by the client: JSON number or string.
///
/// The raw textual form is preserved because the exact bytes go into the
/// signed digest; re-serializing `500.50` as `500.5` would produce a
/// signature the gateway rejects.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AmountField {
    Number(serde_json::Number),
    Text(String),
}

impl AmountField {
    fn raw(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

/// Request body for payment initiation.
#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub amount: Option<AmountField>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Signed gateway parameters the browser posts to PayU.
#[derive(Debug, Serialize)]
pub struct PaymentParams {
    pub key: String,
    pub txnid: String,
    pub amount: String,
    pub productinfo: String,
    pub firstname: String,
    pub email: String,
    pub phone: String,
    pub hash: String,
    pub surl: String,
    pub furl: String,
}

/// `POST /api/payment/payu/create` - sign a new transaction.
///
/// Validates the buyer-entered fields, records a payment intent binding
/// the transaction id to the session user (when present), and returns the
/// signed parameter set.
pub async fn create(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Json(req): Json<CreatePaymentRequest>,
) -> Result<Json<PaymentParams>> {
    let fields = validate_create_request(&req)?;

    if let Some(user) = &user {
        set_sentry_user(&user.id, Some(user.email.as_str()));
    }

    let txn_id = TxnId::new(payu::new_txn_id());

    PaymentIntentRepository::new(state.pool())
        .create(
            &txn_id,
            user.as_ref().map(|u| u.id),
            fields.amount,
            fields.email.as_str(),
        )
        .await?;

    let payu_cfg = &state.config().payu;
    let hash = hash::initiation_hash(
        &payu_cfg.merchant_key,
        txn_id.as_str(),
        &fields.raw_amount,
        payu::PRODUCT_INFO,
        &fields.name,
        fields.email.as_str(),
        payu_cfg.salt.expose_secret(),
    );

    add_breadcrumb(
        "payment",
        "transaction initiated",
        Some(&[("txnid", txn_id.as_str()), ("amount", &fields.raw_amount)]),
    );
    tracing::info!(txnid = %txn_id, amount = %fields.raw_amount, "payment initiated");

    Ok(Json(PaymentParams {
        key: payu_cfg.merchant_key.clone(),
        txnid: txn_id.into_inner(),
        amount: fields.raw_amount,
        productinfo: payu::PRODUCT_INFO.to_string(),
        firstname: fields.name,
        email: fields.email.into_inner(),
        phone: fields.phone,
        hash,
        surl: payu_cfg.success_url.clone(),
        furl: payu_cfg.fail_url.clone(),
    }))
}

/// Initiation fields after validation.
///
/// `raw_amount` is the trimmed client text, kept verbatim past this
/// point: those exact bytes go into the digest and back out in the
/// response, and the gateway hashes the same trimmed text.
#[derive(Debug)]
struct ValidatedFields {
    raw_amount: String,
    amount: Decimal,
    name: String,
    email: Email,
    phone: String,
}

/// Check presence first (enumerating every missing field in one
/// message), then shape: amount, email, phone, in that order.
fn validate_create_request(req: &CreatePaymentRequest) -> Result<ValidatedFields> {
    let raw = req.amount.as_ref().map(AmountField::raw);

    let mut missing = Vec::new();
    if raw.as_deref().is_none_or(|s| s.trim().is_empty()) {
        missing.push("amount");
    }
    if req.name.as_deref().is_none_or(|s| s.trim().is_empty()) {
        missing.push("name");
    }
    if req.email.as_deref().is_none_or(|s| s.trim().is_empty()) {
        missing.push("email");
    }
    if req.phone.as_deref().is_none_or(|s| s.trim().is_empty()) {
        missing.push("phone");
    }
    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    let raw_amount = raw.unwrap_or_default().trim().to_string();
    let amount: Decimal = raw_amount
        .parse()
        .map_err(|_| AppError::Validation("Amount must be a positive number".to_string()))?;
    if amount <= Decimal::ZERO {
        return Err(AppError::Validation(
            "Amount must be a positive number".to_string(),
        ));
    }

    let email = Email::parse(req.email.as_deref().unwrap_or_default())
        .map_err(|_| AppError::Validation("Invalid email address".to_string()))?;

    let phone = req.phone.as_deref().unwrap_or_default().trim().to_string();
    if phone.len() != 10 || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(
            "Phone number must be 10 digits".to_string(),
        ));
    }

    Ok(ValidatedFields {
        raw_amount,
        amount,
        name: req.name.as_deref().unwrap_or_default().trim().to_string(),
        email,
        phone,
    })
}

/// Gateway callback payload (form-encoded).
///
/// Every field is optional at the type level so a malformed delivery gets
/// a clean 400 with the missing fields named instead of a deserializer
/// rejection.
#[derive(Debug, Deserialize)]
pub struct CallbackForm {
    pub txnid: Option<String>,
    pub amount: Option<String>,
    pub productinfo: Option<String>,
    pub firstname: Option<String>,
    pub email: Option<String>,
    pub status: Option<String>,
    pub hash: Option<String>,
    pub mihpayid: Option<String>,
    pub bank_ref_num: Option<String>,
}

/// Acknowledgment body for the gateway.
#[derive(Debug, Serialize)]
pub struct CallbackAck {
    pub success: bool,
    pub message: &'static str,
}

/// `POST /api/payment/payu/callback` - server-to-server confirmation.
///
/// Before signature verification, failures are real HTTP errors: the
/// sender is either malformed or not PayU. After verification, the
/// delivery is authentic and must be acknowledged exactly once, so
/// reconciliation failures are logged and swallowed - the gateway always
/// gets `200 {"success": true}` and never retries forever.
pub async fn callback(
    State(state): State<AppState>,
    Form(form): Form<CallbackForm>,
) -> Result<Json<CallbackAck>> {
    let mut missing = Vec::new();
    if form.txnid.as_deref().is_none_or(|s| s.trim().is_empty()) {
        missing.push("txnid");
    }
    if form.amount.as_deref().is_none_or(|s| s.trim().is_empty()) {
        missing.push("amount");
    }
    if form.hash.as_deref().is_none_or(|s| s.trim().is_empty()) {
        missing.push("hash");
    }
    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    let txnid = form.txnid.as_deref().unwrap_or_default();
    let status = form.status.as_deref().unwrap_or_default();
    let payu_cfg = &state.config().payu;

    let verified = hash::verify_callback(
        &payu_cfg.merchant_key,
        txnid,
        form.amount.as_deref().unwrap_or_default(),
        form.productinfo.as_deref().unwrap_or_default(),
        form.firstname.as_deref().unwrap_or_default(),
        form.email.as_deref().unwrap_or_default(),
        status,
        payu_cfg.salt.expose_secret(),
        form.hash.as_deref().unwrap_or_default(),
    );
    if !verified {
        tracing::warn!(txnid, "callback signature mismatch");
        return Err(AppError::SignatureMismatch);
    }

    add_breadcrumb(
        "payment",
        "callback verified",
        Some(&[("txnid", txnid), ("status", status)]),
    );

    if status != payu::STATUS_SUCCESS {
        tracing::info!(txnid, status, "non-success callback acknowledged");
        return Ok(Json(CallbackAck {
            success: true,
            message: "Callback received",
        }));
    }

    let txn_id = TxnId::new(txnid.to_string());
    let payment_id = form.mihpayid.clone().or_else(|| form.bank_ref_num.clone());

    // Authentic success delivery: reconcile, but never bounce the gateway
    if let Err(e) = reconcile_callback(
        &state,
        &txn_id,
        form.email.as_deref().unwrap_or_default(),
        form.amount.as_deref().unwrap_or_default(),
        payment_id,
        form.hash.clone(),
    )
    .await
    {
        tracing::error!(txnid = %txn_id, error = %e, "callback reconciliation failed");
        sentry::capture_error(&e);
    }

    Ok(Json(CallbackAck {
        success: true,
        message: "Callback processed",
    }))
}

/// Resolve the paying user and place the order for a verified success
/// callback.
async fn reconcile_callback(
    state: &AppState,
    txn_id: &TxnId,
    callback_email: &str,
    callback_amount: &str,
    payment_id: Option<String>,
    captured_hash: Option<String>,
) -> std::result::Result<(), AppError> {
    let intent = PaymentIntentRepository::new(state.pool())
        .get_by_txn_id(txn_id)
        .await?;

    // The signature covers the confirmed amount, so a difference from the
    // quoted amount is not tampering - but it is worth a paper trail
    if let Some(intent) = &intent
        && let Ok(confirmed) = callback_amount.trim().parse::<Decimal>()
        && confirmed != intent.amount
    {
        tracing::warn!(
            txnid = %intent.txn_id,
            quoted = %intent.amount,
            confirmed = %confirmed,
            initiated_at = %intent.created_at,
            "confirmed amount differs from initiation amount"
        );
    }

    let Some(user_id) = resolve_user(state, intent.as_ref(), callback_email).await? else {
        tracing::warn!(txnid = %txn_id, "no user resolvable for verified callback, skipping");
        return Ok(());
    };

    match CheckoutService::new(state.pool())
        .place_paid_order(user_id, txn_id.clone(), payment_id, captured_hash)
        .await
    {
        Ok(_) => Ok(()),
        // Cart already emptied by a duplicate delivery or the fallback path
        Err(crate::services::checkout::CheckoutError::EmptyCart) => {
            tracing::info!(txnid = %txn_id, "cart empty at callback, nothing to reconcile");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// The payment intent recorded at initiation is the trusted binding.
/// Email exact-match is the fallback for guest-initiated transactions,
/// preferring the email captured at initiation over the one echoed by
/// the gateway.
async fn resolve_user(
    state: &AppState,
    intent: Option<&crate::db::payment_intents::PaymentIntent>,
    callback_email: &str,
) -> std::result::Result<Option<UserId>, AppError> {
    if let Some(user_id) = intent.and_then(|i| i.user_id) {
        return Ok(Some(user_id));
    }

    let email_source = intent.map_or(callback_email, |i| i.buyer_email.as_str());
    let Ok(email) = Email::parse(email_source) else {
        return Ok(None);
    };
    let user = UserRepository::new(state.pool()).get_by_email(&email).await?;
    Ok(user.map(|u| u.id))
}

/// Request body for fallback verification.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub txnid: Option<String>,
}

/// Response for fallback verification.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub order: Order,
}

/// `POST /api/payment/verify` - user-initiated fallback confirmation.
///
/// Covers the window where the browser returned from the gateway but the
/// server-to-server callback has not landed. Idempotent: an existing
/// order for this (transaction id, user) is returned as-is. Unlike the
/// callback, errors here surface to the client - a human is present to
/// retry.
pub async fn verify(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>> {
    let txnid = req
        .txnid
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("Missing required fields: txnid".to_string()))?;

    set_sentry_user(&user.id, Some(user.email.as_str()));
    add_breadcrumb("payment", "fallback verification", Some(&[("txnid", txnid)]));

    let txn_id = TxnId::new(txnid.to_string());

    if let Some(order) = crate::db::OrderRepository::new(state.pool())
        .get_by_txn_id_for_user(&txn_id, user.id)
        .await?
    {
        return Ok(Json(VerifyResponse {
            success: true,
            order,
        }));
    }

    let placed = CheckoutService::new(state.pool())
        .place_paid_order(user.id, txn_id, None, None)
        .await?;

    if let PlacedOrder::AlreadyProcessed(order) = &placed {
        tracing::info!(order_id = %order.id, "fallback lost creation race, returning existing order");
    }

    Ok(Json(VerifyResponse {
        success: true,
        order: placed.into_order(),
    }))
}
