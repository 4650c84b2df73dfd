//! Models endpoint
//!
//! Lists the models of every provider the caller can actually reach.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Extension, Json};

use crate::{gateway::ModelList, middleware::auth::AuthenticatedTenant, AppState};

/// List available models
pub async fn list_models(
    State(state): State<Arc<AppState>>,
    Extension(tenant): Extension<AuthenticatedTenant>,
) -> (StatusCode, Json<ModelList>) {
    let models = state.gateway.list_models(&tenant.tenant_id).await;
    (StatusCode::OK, Json(models))
}
