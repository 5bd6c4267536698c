//! HTTP surface: callers post the raw buffers or JSON they fetched from the
//! backend and get analyzed summaries back.

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::accounting::aggregates::{AggregateSummary, AggregatesReport};
use crate::accounting::bins::{analyze_block_bin_response, BinTotals, BlockBinsSummary};
use crate::accounting::blocks::BlocksSummary;
use crate::accounting::traces::{AnalyzedTracesSummary, TraceFilter};
use crate::accounting::{
    analyze_aggregates, analyze_blocks_with_tolerance, analyze_summaries,
    analyze_transaction_traces, parse_aggregates,
};
use crate::codec::address::parse_address;
use crate::codec::CodecError;
use crate::decode::{decode_blocks, decode_traces};
use crate::decode_stats::{DecodeSnapshot, DECODE_STATS};
use crate::wei::Wei;

#[derive(Clone)]
pub struct AppState {
    pub tolerance_wei: Wei,
    pub max_body_bytes: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("decode task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Codec(_) => StatusCode::BAD_REQUEST,
            ApiError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::warn!("request failed: {}", self);
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct AccountQuery {
    pub address: String,
    pub year: Option<i32>,
}

/// Category toggles default to shown.
#[derive(Debug, Deserialize)]
pub struct TracesQuery {
    pub address: String,
    pub mev: Option<bool>,
    pub spam: Option<bool>,
    pub outgoing: Option<bool>,
    pub incoming: Option<bool>,
    pub unknown: Option<bool>,
}

impl TracesQuery {
    fn filter(&self) -> TraceFilter {
        TraceFilter {
            mev: self.mev.unwrap_or(true),
            spam: self.spam.unwrap_or(true),
            outgoing: self.outgoing.unwrap_or(true),
            incoming: self.incoming.unwrap_or(true),
            unknown: self.unknown.unwrap_or(true),
        }
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn decode_stats() -> Json<DecodeSnapshot> {
    Json(DECODE_STATS.snapshot())
}

async fn post_blocks(
    State(state): State<AppState>,
    Query(query): Query<AccountQuery>,
    body: Bytes,
) -> Result<Json<BlocksSummary>, ApiError> {
    let account = parse_address(&query.address)?;
    let tolerance = state.tolerance_wei;
    let summary = tokio::task::spawn_blocking(move || {
        decode_blocks(&body, account)
            .and_then(|blocks| analyze_blocks_with_tolerance(&blocks, tolerance))
    })
    .await?
    .map_err(count_failure)?;

    DECODE_STATS.record_blocks(&summary);
    Ok(Json(summary))
}

async fn post_traces(
    Query(query): Query<TracesQuery>,
    body: Bytes,
) -> Result<Json<AnalyzedTracesSummary>, ApiError> {
    let account = parse_address(&query.address)?;
    let mut summary = tokio::task::spawn_blocking(move || {
        decode_traces(&body, account).and_then(analyze_transaction_traces)
    })
    .await?
    .map_err(count_failure)?;

    DECODE_STATS.record_traces(&summary);
    // Totals cover every decoded trace; only the listing is filtered.
    let filter = query.filter();
    summary.transactions.retain(|tr| filter.accepts(tr));
    Ok(Json(summary))
}

async fn post_aggregates(
    Query(query): Query<AccountQuery>,
    body: String,
) -> Result<Json<AggregatesReport>, ApiError> {
    let account = parse_address(&query.address)?;
    let records = parse_aggregates(&body).map_err(count_failure)?;
    let report = analyze_aggregates(account, &records, query.year).map_err(count_failure)?;
    Ok(Json(report))
}

async fn post_summaries(body: String) -> Result<Json<AggregateSummary>, ApiError> {
    let summaries: Vec<AggregateSummary> = serde_json::from_str(&body)
        .map_err(CodecError::from)
        .map_err(count_failure)?;
    Ok(Json(analyze_summaries(&summaries).map_err(count_failure)?))
}

#[derive(Serialize)]
struct BinsResponse {
    totals: BinTotals,
    bins: BlockBinsSummary,
}

async fn post_bins(body: String) -> Result<Json<BinsResponse>, ApiError> {
    let bins = analyze_block_bin_response(&body).map_err(count_failure)?;
    let totals = bins.totals().map_err(count_failure)?;
    Ok(Json(BinsResponse { totals, bins }))
}

fn count_failure(err: CodecError) -> CodecError {
    DECODE_STATS.record_failure(&err);
    err
}

pub fn app_router(state: AppState) -> Router {
    let limit = state.max_body_bytes;
    Router::new()
        .route("/health", get(health))
        .route("/stats/decode", get(decode_stats))
        .route("/decode/blocks", post(post_blocks))
        .route("/decode/traces", post(post_traces))
        .route("/aggregates", post(post_aggregates))
        .route("/aggregates/summaries", post(post_summaries))
        .route("/bins", post(post_bins))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

pub async fn run_http_server(addr: &str, state: AppState) -> Result<()> {
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
