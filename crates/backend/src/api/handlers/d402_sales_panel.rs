use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use contracts::dashboards::d402_sales_panel::{
    CreateSessionResponse, DashboardAction, DashboardView, SalesMetadata,
};
use uuid::Uuid;

use crate::api::state::AppState;
use crate::dashboards::d402_sales_panel::error::DashboardResult;

/// GET /api/d402/metadata
pub async fn get_metadata(State(state): State<AppState>) -> DashboardResult<Json<SalesMetadata>> {
    let catalog = state.service.catalog().await.map_err(|e| {
        tracing::error!("D402 Dashboard: Failed to load metadata: {}", e);
        e
    })?;
    let bounds = catalog.bounds();

    Ok(Json(SalesMetadata {
        min_date: bounds.start,
        max_date: bounds.end,
        states: catalog.states().to_vec(),
        products: catalog.products().to_vec(),
    }))
}

/// POST /api/d402/sessions
pub async fn create_session(
    State(state): State<AppState>,
) -> DashboardResult<(StatusCode, Json<CreateSessionResponse>)> {
    let removed = state.sessions.cleanup_idle(state.session_max_idle).await;
    if removed > 0 {
        tracing::info!("D402 Dashboard: Removed {} idle sessions", removed);
    }

    let (session_id, session) = state.sessions.create().await;
    let mut session = session.lock().await;
    let view = match state.service.render(&mut session).await {
        Ok(view) => view,
        Err(e) => {
            drop(session);
            state.sessions.remove(session_id).await;
            tracing::error!("D402 Dashboard: Failed to create session: {}", e);
            return Err(e);
        }
    };

    tracing::info!("D402 Dashboard: Session {} created", session_id);
    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse { session_id, view }),
    ))
}

/// GET /api/d402/sessions/:id
pub async fn get_view(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> DashboardResult<Json<DashboardView>> {
    let session = state.sessions.get(id).await?;
    let mut session = session.lock().await;
    session.touch();

    let view = state.service.render(&mut session).await.map_err(|e| {
        tracing::error!("D402 Dashboard: Failed to render session {}: {}", id, e);
        e
    })?;
    Ok(Json(view))
}

/// POST /api/d402/sessions/:id/actions
pub async fn apply_action(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(action): Json<DashboardAction>,
) -> DashboardResult<Json<DashboardView>> {
    let session = state.sessions.get(id).await?;
    // Held until the new view is rendered
    let mut session = session.lock().await;

    let catalog = state.service.catalog().await?;
    if let Err(e) = session.apply(&catalog, action.clone()) {
        tracing::warn!("D402 Dashboard: Rejected {:?} for {}: {}", action, id, e);
        return Err(e);
    }

    let view = state.service.render(&mut session).await.map_err(|e| {
        tracing::error!("D402 Dashboard: Failed to render session {}: {}", id, e);
        e
    })?;
    tracing::info!(
        "D402 Dashboard: Applied {:?} for {} ({} rows)",
        action,
        id,
        view.tables.kpis.row_count
    );
    Ok(Json(view))
}

/// DELETE /api/d402/sessions/:id
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if state.sessions.remove(id).await {
        tracing::info!("D402 Dashboard: Session {} closed", id);
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
