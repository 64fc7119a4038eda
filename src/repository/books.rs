//! Books repository: catalog data and the inventory counters.
//!
//! `available_copies` is only ever written by the guarded mutators below,
//! all of which run on a transaction that has locked the book row. Catalog
//! updates never touch it directly.

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::{resized_available, Book, BookQuery, CreateBook, UpdateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::BookNotFound(id))
    }

    /// Get book by ID with a row lock.
    ///
    /// Serialization point for every inventory mutation: concurrent
    /// borrow/return/resize operations on the same book queue up here.
    pub async fn get_for_update(&self, tx: &mut PgConnection, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::BookNotFound(id))
    }

    /// Take one copy out of the available pool.
    ///
    /// The guard repeats the availability check so a stale read can never
    /// drive the count negative; zero rows affected means the book ran out.
    pub async fn decrement_available(&self, tx: &mut PgConnection, id: i32) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies - 1, updated_at = NOW()
            WHERE id = $1 AND available_copies > 0
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::BookUnavailable(id));
        }
        Ok(())
    }

    /// Put one copy back into the available pool.
    ///
    /// Unreachable when the ledger is consistent: every open loan accounts
    /// for exactly one missing copy, so a return always has room.
    pub async fn increment_available(&self, tx: &mut PgConnection, id: i32) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies + 1, updated_at = NOW()
            WHERE id = $1 AND available_copies < total_copies
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Invariant(format!(
                "available_copies would exceed total_copies for book {}",
                id
            )));
        }
        Ok(())
    }

    /// Change `total_copies`, moving `available_copies` by the same delta,
    /// clamped to `[0, new_total]`. Expects the row to be locked already.
    pub async fn resize_total_copies(
        &self,
        tx: &mut PgConnection,
        book: &Book,
        new_total: i32,
    ) -> AppResult<Book> {
        let new_available = resized_available(book.available_copies, book.total_copies, new_total);

        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET total_copies = $1, available_copies = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(new_total)
        .bind(new_available)
        .bind(book.id)
        .fetch_one(&mut *tx)
        .await?;

        Ok(updated)
    }

    /// Create a new book; all copies start available
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, isbn, category, published_year,
                               description, total_copies, available_copies)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.category)
        .bind(book.published_year)
        .bind(&book.description)
        .bind(book.total_copies)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Update catalog fields. Inventory counters are out of scope here;
    /// `total_copies` changes go through `resize_total_copies`.
    pub async fn update_fields(
        &self,
        tx: &mut PgConnection,
        id: i32,
        book: &UpdateBook,
    ) -> AppResult<()> {
        let mut sets = vec!["updated_at = NOW()".to_string()];
        let mut param_idx = 1;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, param_idx));
                    param_idx += 1;
                }
            };
        }

        add_field!(book.title, "title");
        add_field!(book.author, "author");
        add_field!(book.isbn, "isbn");
        add_field!(book.category, "category");
        add_field!(book.published_year, "published_year");
        add_field!(book.description, "description");

        let query = format!("UPDATE books SET {} WHERE id = ${}", sets.join(", "), param_idx);

        let mut builder = sqlx::query(&query);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(book.title);
        bind_field!(book.author);
        bind_field!(book.isbn);
        bind_field!(book.category);
        bind_field!(book.published_year);
        bind_field!(book.description);

        builder.bind(id).execute(&mut *tx).await?;
        Ok(())
    }

    /// Delete a book. Open loans block deletion; closed loan history is
    /// removed with the book (FK cascade).
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let open_loans: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE book_id = $1 AND status IN ('active', 'overdue')",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if open_loans > 0 {
            return Err(AppError::BookHasOpenLoans(id));
        }

        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::BookNotFound(id));
        }
        Ok(())
    }

    /// Search books with filters and pagination
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(15).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(ref category) = query.category {
            params.push(category.clone());
            conditions.push(format!("category = ${}", params.len()));
        }

        if query.available == Some(true) {
            conditions.push("available_copies > 0".to_string());
        }

        if let Some(ref search) = query.search {
            params.push(format!("%{}%", search));
            conditions.push(format!(
                "(title ILIKE ${n} OR author ILIKE ${n} OR isbn ILIKE ${n})",
                n = params.len()
            ));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sort_column = match query.sort_by.as_deref() {
            Some("author") => "author",
            Some("category") => "category",
            Some("published_year") => "published_year",
            Some("available_copies") => "available_copies",
            Some("created_at") => "created_at",
            _ => "title",
        };
        let sort_direction = match query.sort_direction.as_deref() {
            Some("desc") => "DESC",
            _ => "ASC",
        };

        let count_query = format!("SELECT COUNT(*) FROM books {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_builder = count_builder.bind(param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            "SELECT * FROM books {} ORDER BY {} {} LIMIT {} OFFSET {}",
            where_clause, sort_column, sort_direction, per_page, offset
        );
        let mut select_builder = sqlx::query_as::<_, Book>(&select_query);
        for param in &params {
            select_builder = select_builder.bind(param);
        }
        let books = select_builder.fetch_all(&self.pool).await?;

        Ok((books, total))
    }

    /// Count all books
    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
