// HTTP request handlers
use crate::application::checklist_service::{ChecklistContextId, ChecklistSnapshot};
use crate::application::input_session_service::InputSessionId;
use crate::domain::chart::degradation_chart;
use crate::domain::record::{EvaluationRecord, RecordKind};
use crate::domain::risk::RiskLevel;
use crate::infrastructure::chunked_json::stream_from_receiver;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::api_error::ApiError;
use crate::presentation::app_state::AppState;
use crate::presentation::dto::{
    ClearedView, DegradationRequest, DegradationView, EntryRequest, MergeRequest,
    OpenChecklistRequest, PerformanceBatchRequest, PerformanceRequest, PerformanceView, RiskView,
    SelectionQuery, SessionEvaluationView, SetItemRequest,
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

type ApiResult = Result<Response, ApiError>;

/// JSON body, Brotli-compressed when the client asks for it
async fn reply<T: Serialize>(headers: &HeaderMap, status: StatusCode, value: &T) -> Response {
    match json_response(status, value, accepts_brotli(headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::InvalidInput(format!("'{raw}' is not a record id")))
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Evaluate one reading and open a checklist for its risk levels
pub async fn evaluate_performance(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PerformanceRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = payload?;
    let reading = request.reading()?;
    let record = state
        .performance_service
        .evaluate(reading, request.time_series)
        .await?;

    let (risks, checklist) = evaluation_feedback(&state, &record).await?;
    let view = PerformanceView {
        record,
        risks,
        checklist,
    };
    Ok(reply(&headers, StatusCode::CREATED, &view).await)
}

/// Risk badges of a performance record and a fresh checklist context for its levels
async fn evaluation_feedback(
    state: &AppState,
    record: &EvaluationRecord,
) -> Result<(Vec<RiskView>, ChecklistSnapshot), ApiError> {
    let results = record.stress_result().ok_or_else(|| {
        ApiError::Internal(anyhow::anyhow!("record {} has no stress result", record.id))
    })?;
    let checklist = state
        .checklist_service
        .open(results.risk_electrical, results.risk_thermal, results.risk_sensitivity)
        .await;
    Ok((RiskView::for_result(results), checklist))
}

fn session_not_found(session: &InputSessionId) -> ApiError {
    ApiError::not_found(format!("input session {session}"))
}

pub async fn open_input_session(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let view = state.input_session_service.open().await;
    reply(&headers, StatusCode::CREATED, &view).await
}

pub async fn get_input_session(
    Path(session): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> ApiResult {
    let session = InputSessionId::new(session);
    let view = state
        .input_session_service
        .view(&session)
        .await
        .ok_or_else(|| session_not_found(&session))?;
    Ok(reply(&headers, StatusCode::OK, &view).await)
}

/// Add one reading at the session's next 5-minute offset
pub async fn add_input_entry(
    Path(session): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<EntryRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = payload?;
    let reading = request.reading()?;
    let session = InputSessionId::new(session);
    let view = state
        .input_session_service
        .push(&session, reading)
        .await
        .ok_or_else(|| session_not_found(&session))?;
    Ok(reply(&headers, StatusCode::OK, &view).await)
}

pub async fn remove_input_entry(
    Path((session, index)): Path<(String, String)>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> ApiResult {
    let index: usize = index
        .parse()
        .map_err(|_| ApiError::InvalidInput(format!("'{index}' is not an entry index")))?;
    let session = InputSessionId::new(session);
    let view = state
        .input_session_service
        .remove(&session, index)
        .await?
        .ok_or_else(|| session_not_found(&session))?;
    Ok(reply(&headers, StatusCode::OK, &view).await)
}

pub async fn reset_input_session(
    Path(session): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> ApiResult {
    let session = InputSessionId::new(session);
    let view = state
        .input_session_service
        .reset(&session)
        .await
        .ok_or_else(|| session_not_found(&session))?;
    Ok(reply(&headers, StatusCode::OK, &view).await)
}

/// Evaluate and drain the session; each entry is paired with the one before it
pub async fn evaluate_input_session(
    Path(session): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> ApiResult {
    let session = InputSessionId::new(session);
    let records = state
        .input_session_service
        .evaluate(&session)
        .await?
        .ok_or_else(|| session_not_found(&session))?;
    let latest = records
        .last()
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("session {session} produced no records")))?;
    let (risks, checklist) = evaluation_feedback(&state, latest).await?;

    let view = SessionEvaluationView {
        records,
        risks,
        checklist,
    };
    Ok(reply(&headers, StatusCode::CREATED, &view).await)
}

pub async fn close_input_session(
    Path(session): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult {
    let session = InputSessionId::new(session);
    if !state.input_session_service.close(&session).await {
        return Err(session_not_found(&session));
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Evaluate uploaded rows in order (progressive NDJSON)
pub async fn evaluate_performance_batch(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PerformanceBatchRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = payload?;
    let rows = request.into_rows()?;
    let rx = state.streaming_service.stream_batch(rows);
    Ok(stream_from_receiver(rx).into_response())
}

pub async fn evaluate_degradation(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DegradationRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = payload?;
    let points = request.into_points()?;
    let record = state.degradation_service.evaluate(points).await?;
    Ok(reply(&headers, StatusCode::CREATED, &degradation_view(record)).await)
}

/// Merge the selected history series with new points and classify the result
pub async fn evaluate_degradation_merge(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MergeRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = payload?;
    let (selected_ids, points) = request.into_parts()?;
    let record = state
        .degradation_service
        .evaluate_merged(&selected_ids, points)
        .await?;
    Ok(reply(&headers, StatusCode::CREATED, &degradation_view(record)).await)
}

fn degradation_view(record: EvaluationRecord) -> DegradationView {
    let chart = degradation_chart(record.resistance_points().unwrap_or_default());
    DegradationView { record, chart }
}

pub async fn list_history(
    Path(kind): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> ApiResult {
    let kind: RecordKind = kind.parse()?;
    let records = state.history_service.list(kind).await?;
    Ok(reply(&headers, StatusCode::OK, &records).await)
}

pub async fn get_history_record(
    Path((kind, id)): Path<(String, String)>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> ApiResult {
    let kind: RecordKind = kind.parse()?;
    let id = parse_id(&id)?;
    let record = state
        .history_service
        .get(kind, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("{kind} record {id}")))?;
    Ok(reply(&headers, StatusCode::OK, &record).await)
}

pub async fn delete_history_record(
    Path((kind, id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> ApiResult {
    let kind: RecordKind = kind.parse()?;
    let id = parse_id(&id)?;
    if !state.history_service.delete(kind, id).await? {
        return Err(ApiError::not_found(format!("{kind} record {id}")));
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn clear_history(
    Path(kind): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> ApiResult {
    let kind: RecordKind = kind.parse()?;
    let removed = state.history_service.clear(kind).await?;
    Ok(reply(&headers, StatusCode::OK, &ClearedView { removed }).await)
}

pub async fn degradation_chart_data(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    query: Result<Query<SelectionQuery>, QueryRejection>,
) -> ApiResult {
    let Query(query) = query?;
    let chart = state.history_service.degradation_chart(&query.ids()?).await?;
    Ok(reply(&headers, StatusCode::OK, &chart).await)
}

pub async fn performance_chart_data(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    query: Result<Query<SelectionQuery>, QueryRejection>,
) -> ApiResult {
    let Query(query) = query?;
    let chart = state.history_service.performance_chart(&query.ids()?).await?;
    Ok(reply(&headers, StatusCode::OK, &chart).await)
}

/// Open a checklist context, either for a stored record or for explicit levels
pub async fn open_checklist(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<OpenChecklistRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = payload?;
    let snapshot = match request.record_id {
        Some(id) => state
            .checklist_service
            .open_for_record(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("performance record {id}")))?,
        None => {
            let levels = (
                request.risk_electrical,
                request.risk_thermal,
                request.risk_sensitivity,
            );
            let (Some(electrical), Some(thermal), sensitivity) = levels else {
                return Err(ApiError::InvalidInput(
                    "either recordId or riskElectrical and riskThermal are required".to_string(),
                ));
            };
            state
                .checklist_service
                .open(electrical, thermal, sensitivity.unwrap_or(RiskLevel::Baseline))
                .await
        }
    };
    Ok(reply(&headers, StatusCode::CREATED, &snapshot).await)
}

pub async fn get_checklist(
    Path(context): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> ApiResult {
    let context = ChecklistContextId::new(context);
    let snapshot = state
        .checklist_service
        .snapshot(&context)
        .await
        .ok_or_else(|| ApiError::not_found(format!("checklist {context}")))?;
    Ok(reply(&headers, StatusCode::OK, &snapshot).await)
}

pub async fn set_checklist_item(
    Path(context): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SetItemRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = payload?;
    let context = ChecklistContextId::new(context);
    let snapshot = state
        .checklist_service
        .set_item(&context, request.category, request.index, request.checked)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("checklist {context}")))?;
    Ok(reply(&headers, StatusCode::OK, &snapshot).await)
}

pub async fn close_checklist(
    Path(context): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult {
    let context = ChecklistContextId::new(context);
    if !state.checklist_service.close(&context).await {
        return Err(ApiError::not_found(format!("checklist {context}")));
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}
