use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::api::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::notify::{DeliveryReceipt, SendWhatsAppRequest};
use crate::tenancy::TenantContext;

#[utoipa::path(
    post,
    path = "/api/v1/notifications/whatsapp",
    tag = "notifications",
    request_body = SendWhatsAppRequest,
    responses(
        (status = 202, description = "Accepted by the provider", body = DeliveryReceipt),
        (status = 400, description = "Validation failed"),
        (status = 502, description = "Provider rejected or unreachable"),
    ),
    security(("bearer" = []))
)]
pub async fn send_whatsapp(
    State(state): State<AppState>,
    ctx: TenantContext,
    body: Result<Json<SendWhatsAppRequest>, JsonRejection>,
) -> ApiResult<DeliveryReceipt> {
    let Json(req) = body?;
    let receipt = state.services.notifications.send_whatsapp(&ctx, req).await?;
    Ok(ApiResponse::accepted(receipt))
}
