use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{NewTransaction, TransactionRow};

pub async fn fetch_all(pool: &PgPool) -> Result<Vec<TransactionRow>, sqlx::Error> {
    sqlx::query_as::<_, TransactionRow>(
        "SELECT id, trade_date, portfolio, side, ticker, quantity, price, amount
         FROM transactions
         ORDER BY ticker ASC, trade_date ASC, created_at ASC"
    )
        .fetch_all(pool)
        .await
}

pub async fn fetch_one(pool: &PgPool, id: Uuid) -> Result<Option<TransactionRow>, sqlx::Error> {
    sqlx::query_as::<_, TransactionRow>(
        "SELECT id, trade_date, portfolio, side, ticker, quantity, price, amount
         FROM transactions
         WHERE id = $1"
    )
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn create(pool: &PgPool, input: &NewTransaction) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO transactions (id, trade_date, portfolio, side, ticker, quantity, price, amount)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
    )
        .bind(id)
        .bind(input.date)
        .bind(&input.portfolio)
        .bind(input.side.as_str())
        .bind(&input.ticker)
        .bind(input.quantity)
        .bind(input.price)
        .bind(input.amount())
        .execute(pool)
        .await?;
    Ok(id)
}

pub async fn update(pool: &PgPool, id: Uuid, input: &NewTransaction) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE transactions
         SET trade_date = $2, portfolio = $3, side = $4, ticker = $5,
             quantity = $6, price = $7, amount = $8
         WHERE id = $1"
    )
        .bind(id)
        .bind(input.date)
        .bind(&input.portfolio)
        .bind(input.side.as_str())
        .bind(&input.ticker)
        .bind(input.quantity)
        .bind(input.price)
        .bind(input.amount())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM transactions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
