use crate::SharedState;
use crate::error::ApiError;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use relay::normalize::{normalize_worksheet, numeric_id};
use relay::{ActivityNote, Lead, Worksheet, build_patch};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Fields a customer update may touch. Everything else in the body is
/// dropped rather than forwarded, so a stray key cannot clobber workflow
/// columns through the flat updateCustomer action.
const CUSTOMER_FIELDS: &[&str] = &[
    "name",
    "email",
    "phone",
    "zip",
    "dob",
    "agent",
    "policyNumber",
    "coverage",
    "deductibles",
    "discounts",
    "vehicles",
    "renewalDate",
];

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/agent/leads", get(list_leads))
        .route("/api/agent/update", post(update_lead))
        .route("/api/agent/customers", get(list_customers))
        .route("/api/agent/customers/update", post(update_customer))
        .route("/api/agent/worksheet", post(save_worksheet))
        .route("/api/agent/worksheet/load", get(load_worksheets))
        .route("/api/agent/options", get(list_options))
        .route("/api/agent/notes", get(list_notes).post(add_note))
        .route("/api/lead", post(submit_lead))
        .route("/api/claims", post(submit_claim))
        .with_state(state)
}

#[derive(Serialize)]
struct RowsResponse {
    ok: bool,
    rows: Vec<Lead>,
}

#[derive(Serialize)]
struct Ack {
    ok: bool,
}

const ACK: Ack = Ack { ok: true };

async fn list_leads(State(state): State<SharedState>) -> Result<Json<RowsResponse>, ApiError> {
    let rows = state.client.list_leads().await?;
    state.dashboard.write().await.replace_leads(rows.clone());
    Ok(Json(RowsResponse { ok: true, rows }))
}

#[derive(Deserialize)]
struct UpdateRequest {
    id: Option<Value>,
    patch: Option<Map<String, Value>>,
}

async fn update_lead(
    State(state): State<SharedState>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<Ack>, ApiError> {
    let mut fields = req
        .patch
        .ok_or_else(|| ApiError::BadInput("missing patch".to_string()))?;
    if let Some(id) = req.id {
        fields.insert("id".to_string(), id);
    }

    let patch = build_patch(fields)?;
    state.client.update_lead(&patch).await?;
    state.dashboard.write().await.apply_patch(&patch);
    Ok(Json(ACK))
}

#[derive(Deserialize)]
struct CustomerQuery {
    agent: Option<String>,
    q: Option<String>,
}

async fn list_customers(
    State(state): State<SharedState>,
    Query(query): Query<CustomerQuery>,
) -> Result<Json<RowsResponse>, ApiError> {
    let rows = state.client.list_leads().await?;
    state.dashboard.write().await.replace_leads(rows.clone());

    let filter = relay::LeadFilter {
        agent: query.agent.filter(|a| !a.is_empty()),
        search: query.q,
        ..relay::LeadFilter::won()
    };
    let rows = filter.apply(&rows).into_iter().cloned().collect();
    Ok(Json(RowsResponse { ok: true, rows }))
}

async fn update_customer(
    State(state): State<SharedState>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<Ack>, ApiError> {
    let mut fields = Map::new();
    for key in CUSTOMER_FIELDS {
        if let Some(value) = body.get(*key) {
            fields.insert((*key).to_string(), value.clone());
        }
    }
    if let Some(id) = body.get("id") {
        fields.insert("id".to_string(), id.clone());
    }

    let patch = build_patch(fields)?;
    state.client.update_customer(&patch).await?;
    state.dashboard.write().await.apply_patch(&patch);
    Ok(Json(ACK))
}

#[derive(Deserialize)]
struct WorksheetSaveRequest {
    id: Option<Value>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

#[derive(Serialize)]
struct WorksheetSaved {
    ok: bool,
    saved: bool,
}

async fn save_worksheet(
    State(state): State<SharedState>,
    Json(req): Json<WorksheetSaveRequest>,
) -> Result<Json<WorksheetSaved>, ApiError> {
    let id = numeric_id(req.id.as_ref())
        .ok_or_else(|| ApiError::BadInput("missing worksheet id".to_string()))?;

    let worksheet = normalize_worksheet(&req.rest);
    state.client.save_worksheet(id, &worksheet).await?;
    state.dashboard.write().await.put_worksheet(id, worksheet);
    Ok(Json(WorksheetSaved {
        ok: true,
        saved: true,
    }))
}

#[derive(Serialize)]
struct WorksheetsResponse {
    ok: bool,
    worksheets: HashMap<u64, Worksheet>,
}

async fn load_worksheets(
    State(state): State<SharedState>,
) -> Result<Json<WorksheetsResponse>, ApiError> {
    let worksheets = state.client.load_worksheets().await?;
    state
        .dashboard
        .write()
        .await
        .replace_worksheets(worksheets.clone());
    Ok(Json(WorksheetsResponse {
        ok: true,
        worksheets,
    }))
}

#[derive(Serialize)]
struct OptionsResponse {
    ok: bool,
    agents: Vec<String>,
    statuses: Vec<String>,
}

/// Roster and status options come from config so the UI does not hold its
/// own copy.
async fn list_options(State(state): State<SharedState>) -> Json<OptionsResponse> {
    Json(OptionsResponse {
        ok: true,
        agents: state.agents.clone(),
        statuses: state.statuses.clone(),
    })
}

#[derive(Deserialize)]
struct NoteRequest {
    id: Option<Value>,
    text: Option<String>,
    agent: Option<String>,
}

#[derive(Serialize)]
struct NoteResponse {
    ok: bool,
    note: ActivityNote,
}

/// Notes live for the lifetime of this process only; they are never
/// relayed to the store.
async fn add_note(
    State(state): State<SharedState>,
    Json(req): Json<NoteRequest>,
) -> Result<Json<NoteResponse>, ApiError> {
    let id = numeric_id(req.id.as_ref())
        .ok_or_else(|| ApiError::BadInput("missing lead id".to_string()))?;
    let text = req.text.unwrap_or_default();
    if text.trim().is_empty() {
        return Err(ApiError::BadInput("empty note".to_string()));
    }

    let note = state
        .dashboard
        .write()
        .await
        .add_note(id, text, req.agent.unwrap_or_default());
    Ok(Json(NoteResponse { ok: true, note }))
}

#[derive(Deserialize)]
struct NotesQuery {
    id: u64,
}

#[derive(Serialize)]
struct NotesResponse {
    ok: bool,
    notes: Vec<ActivityNote>,
}

async fn list_notes(
    State(state): State<SharedState>,
    Query(query): Query<NotesQuery>,
) -> Json<NotesResponse> {
    let notes = state.dashboard.read().await.notes(query.id).to_vec();
    Json(NotesResponse { ok: true, notes })
}

async fn submit_lead(
    State(state): State<SharedState>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<Ack>, ApiError> {
    state.client.submit_intake(&body).await?;
    Ok(Json(ACK))
}

async fn submit_claim(
    State(state): State<SharedState>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<Ack>, ApiError> {
    state.client.submit_claim(&body).await?;
    Ok(Json(ACK))
}
