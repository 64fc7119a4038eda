//! Loans repository: the ledger of borrow records.
//!
//! Rows are created `active`, move to `overdue` through the single
//! `mark_overdue` rule, and reach a terminal state exactly once through
//! `complete_return`.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookShort,
        loan::{Loan, LoanDetails, LoanQuery, LoanStatus},
        user::UserShort,
    },
};

/// Overdue transition rule, shared by the lazy and sweep reconcile paths.
/// `$1` binds "today".
const OPEN_PAST_DUE: &str = "status = 'active' AND due_date < $1";

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::LoanNotFound(id))
    }

    /// Get loan with joined book and user data
    pub async fn get_details_by_id(&self, id: i32) -> AppResult<LoanDetails> {
        let row = sqlx::query(&format!("{} WHERE l.id = $1", DETAILS_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::LoanNotFound(id))?;

        details_from_row(&row)
    }

    /// Any open loan for this (user, book) pair, read under the borrow
    /// transaction so the result reflects committed state at lock time.
    pub async fn find_open_loan(
        &self,
        tx: &mut PgConnection,
        user_id: i32,
        book_id: i32,
    ) -> AppResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            SELECT * FROM loans
            WHERE user_id = $1 AND book_id = $2 AND status IN ('active', 'overdue')
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&mut *tx)
        .await?;

        Ok(loan)
    }

    /// Insert a new active loan
    pub async fn insert(
        &self,
        tx: &mut PgConnection,
        user_id: i32,
        book_id: i32,
        now: DateTime<Utc>,
        due_date: NaiveDate,
    ) -> AppResult<Loan> {
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (user_id, book_id, borrow_date, due_date, status)
            VALUES ($1, $2, $3, $4, 'active')
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(now)
        .bind(due_date)
        .fetch_one(&mut *tx)
        .await?;

        Ok(loan)
    }

    /// Transition past-due active loans to overdue.
    ///
    /// `loan_id = Some(..)` is the lazy path (one loan, just before it is
    /// read); `None` is the periodic sweep. Idempotent: overdue and terminal
    /// rows never match the rule. Returns the number of transitions.
    pub async fn mark_overdue(&self, today: NaiveDate, loan_id: Option<i32>) -> AppResult<u64> {
        let query = match loan_id {
            Some(_) => format!(
                "UPDATE loans SET status = 'overdue' WHERE {} AND id = $2",
                OPEN_PAST_DUE
            ),
            None => format!("UPDATE loans SET status = 'overdue' WHERE {}", OPEN_PAST_DUE),
        };

        let mut builder = sqlx::query(&query).bind(today);
        if let Some(id) = loan_id {
            builder = builder.bind(id);
        }

        Ok(builder.execute(&self.pool).await?.rows_affected())
    }

    /// Terminate a loan: set the return timestamp and final status.
    ///
    /// Returns on or before the due date close as `returned`, later ones as
    /// `returned-late`. Fails with `AlreadyReturned` for terminal loans; the
    /// guarded update keeps the transition one-shot even under races.
    pub async fn complete_return(
        &self,
        tx: &mut PgConnection,
        loan_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<Loan> {
        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::LoanNotFound(loan_id))?;

        if loan.status.is_terminal() {
            return Err(AppError::AlreadyReturned(loan_id));
        }

        let status = LoanStatus::on_return(loan.due_date, now.date_naive());

        let updated = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET return_date = $1, status = $2
            WHERE id = $3 AND status IN ('active', 'overdue')
            RETURNING *
            "#,
        )
        .bind(now)
        .bind(status)
        .bind(loan_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::AlreadyReturned(loan_id))?;

        Ok(updated)
    }

    /// Search loans with filters and pagination
    pub async fn search(&self, query: &LoanQuery) -> AppResult<(Vec<LoanDetails>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(15).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let mut conditions = Vec::new();
        let mut idx = 0;

        if query.status.is_some() {
            idx += 1;
            conditions.push(format!("l.status = ${}", idx));
        }
        if query.user_id.is_some() {
            idx += 1;
            conditions.push(format!("l.user_id = ${}", idx));
        }
        if query.book_id.is_some() {
            idx += 1;
            conditions.push(format!("l.book_id = ${}", idx));
        }
        if query.from_date.is_some() {
            idx += 1;
            conditions.push(format!("l.borrow_date >= ${}::date", idx));
        }
        if query.to_date.is_some() {
            idx += 1;
            conditions.push(format!("l.borrow_date < (${}::date + 1)", idx));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sort_column = match query.sort_by.as_deref() {
            Some("due_date") => "l.due_date",
            Some("return_date") => "l.return_date",
            Some("status") => "l.status",
            _ => "l.borrow_date",
        };
        let sort_direction = match query.sort_direction.as_deref() {
            Some("asc") => "ASC",
            _ => "DESC",
        };

        macro_rules! bind_filters {
            ($builder:expr) => {{
                let mut b = $builder;
                if let Some(status) = query.status {
                    b = b.bind(status);
                }
                if let Some(user_id) = query.user_id {
                    b = b.bind(user_id);
                }
                if let Some(book_id) = query.book_id {
                    b = b.bind(book_id);
                }
                if let Some(from_date) = query.from_date {
                    b = b.bind(from_date);
                }
                if let Some(to_date) = query.to_date {
                    b = b.bind(to_date);
                }
                b
            }};
        }

        let count_query = format!("SELECT COUNT(*) FROM loans l {}", where_clause);
        let total = bind_filters!(sqlx::query_scalar::<_, i64>(&count_query))
            .fetch_one(&self.pool)
            .await?;

        let select_query = format!(
            "{} {} ORDER BY {} {} LIMIT {} OFFSET {}",
            DETAILS_SELECT, where_clause, sort_column, sort_direction, per_page, offset
        );
        let rows = bind_filters!(sqlx::query(&select_query))
            .fetch_all(&self.pool)
            .await?;

        let mut loans = Vec::with_capacity(rows.len());
        for row in &rows {
            loans.push(details_from_row(row)?);
        }

        Ok((loans, total))
    }

    /// Count open loans
    pub async fn count_open(&self) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE status IN ('active', 'overdue')")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Count overdue loans
    pub async fn count_overdue(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE status = 'overdue'")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

const DETAILS_SELECT: &str = r#"
SELECT l.id, l.user_id, l.book_id, l.borrow_date, l.due_date, l.return_date, l.status,
       b.title AS book_title, b.author AS book_author, b.isbn AS book_isbn,
       b.available_copies AS book_available_copies, b.total_copies AS book_total_copies,
       u.name AS user_name, u.email AS user_email
FROM loans l
JOIN books b ON l.book_id = b.id
JOIN users u ON l.user_id = u.id
"#;

fn details_from_row(row: &sqlx::postgres::PgRow) -> AppResult<LoanDetails> {
    Ok(LoanDetails {
        id: row.get("id"),
        borrow_date: row.get("borrow_date"),
        due_date: row.get("due_date"),
        return_date: row.get("return_date"),
        status: row.get("status"),
        book: BookShort {
            id: row.get("book_id"),
            title: row.get("book_title"),
            author: row.get("book_author"),
            isbn: row.get("book_isbn"),
            available_copies: row.get("book_available_copies"),
            total_copies: row.get("book_total_copies"),
        },
        user: Some(UserShort {
            id: row.get("user_id"),
            name: row.get("user_name"),
            email: row.get("user_email"),
        }),
    })
}
