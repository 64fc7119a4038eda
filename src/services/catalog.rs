//! Catalog service: book management

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List books with filters and pagination
    pub async fn list_books(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        self.repository.books.search(query).await
    }

    /// Get a single book
    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Create a book
    pub async fn create_book(&self, book: &CreateBook) -> AppResult<Book> {
        let created = self
            .repository
            .books
            .create(book)
            .await
            .map_err(map_isbn_unique_violation)?;

        tracing::info!(book_id = created.id, isbn = %created.isbn, "book created");
        Ok(created)
    }

    /// Update a book. A `total_copies` change goes through the resize path
    /// so `available_copies` moves by the same delta, in one transaction.
    pub async fn update_book(&self, id: i32, update: &UpdateBook) -> AppResult<Book> {
        let mut tx = self.repository.pool.begin().await?;

        let book = self.repository.books.get_for_update(&mut *tx, id).await?;

        self.repository
            .books
            .update_fields(&mut *tx, id, update)
            .await
            .map_err(map_isbn_unique_violation)?;

        if let Some(new_total) = update.total_copies {
            if new_total != book.total_copies {
                self.repository
                    .books
                    .resize_total_copies(&mut *tx, &book, new_total)
                    .await?;
            }
        }

        tx.commit().await?;

        self.repository.books.get_by_id(id).await
    }

    /// Delete a book without open loans
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "book deleted");
        Ok(())
    }
}

fn map_isbn_unique_violation(err: AppError) -> AppError {
    if let AppError::Database(sqlx::Error::Database(ref db)) = err {
        if db.code().as_deref() == Some("23505") && db.constraint() == Some("books_isbn_key") {
            return AppError::Validation("A book with this ISBN already exists".to_string());
        }
    }
    err
}
