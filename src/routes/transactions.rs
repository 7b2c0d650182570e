use axum::extract::{Path, Query, State};
use http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{
    CreatedTransaction, Session, TickerLedgerList, TransactionInput, TransactionList,
    TransactionQuery, TransactionRecord,
};
use crate::services::transaction_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_transactions).post(create_transaction))
        .route("/by-ticker", get(list_by_ticker))
        .route(
            "/:id",
            get(get_transaction).put(update_transaction).delete(delete_transaction),
        )
}

pub async fn list_transactions(
    session: Session,
    State(state): State<AppState>,
    Query(query): Query<TransactionQuery>,
) -> Json<TransactionList> {
    info!("GET /transactions - Listing ledger for '{}'", session.username);
    let (transactions, ledger_available) =
        transaction_service::list(state.store.as_ref(), query.ticker.as_deref()).await;
    Json(TransactionList {
        ledger_available,
        transactions,
    })
}

pub async fn list_by_ticker(
    session: Session,
    State(state): State<AppState>,
) -> Json<TickerLedgerList> {
    info!("GET /transactions/by-ticker - Ledger per ticker for '{}'", session.username);
    let (tickers, ledger_available) = transaction_service::list_by_ticker(state.store.as_ref()).await;
    Json(TickerLedgerList {
        ledger_available,
        tickers,
    })
}

pub async fn create_transaction(
    session: Session,
    State(state): State<AppState>,
    Json(data): Json<TransactionInput>,
) -> Result<(StatusCode, Json<CreatedTransaction>), AppError> {
    info!("POST /transactions - New {:?} of {} by '{}'", data.side, data.ticker, session.username);
    let id = transaction_service::create(state.store.as_ref(), data)
        .await
        .map_err(|e| {
            error!("Failed to create transaction: {}", e);
            e
        })?;
    Ok((StatusCode::CREATED, Json(CreatedTransaction { id })))
}

pub async fn get_transaction(
    _session: Session,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionRecord>, AppError> {
    info!("GET /transactions/{} - Fetching transaction", id);
    let record = transaction_service::fetch_one(state.store.as_ref(), id).await?;
    Ok(Json(record))
}

pub async fn update_transaction(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(data): Json<TransactionInput>,
) -> Result<Json<TransactionRecord>, AppError> {
    info!("PUT /transactions/{} - Editing transaction for '{}'", id, session.username);
    let updated = transaction_service::update(state.store.as_ref(), id, data)
        .await
        .map_err(|e| {
            error!("Failed to update transaction {}: {}", id, e);
            e
        })?;
    Ok(Json(updated))
}

pub async fn delete_transaction(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    info!("DELETE /transactions/{} - Deleting transaction for '{}'", id, session.username);
    transaction_service::delete(state.store.as_ref(), id)
        .await
        .map_err(|e| {
            error!("Failed to delete transaction {}: {}", id, e);
            e
        })?;
    Ok(StatusCode::NO_CONTENT)
}
