//! HTTP handlers for `/book/`.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bookstore_http::error::{AppError, ErrorResponse};

use super::models::{Book, BookInput};
use super::repository::BookRepository;
use crate::utils::{parse_id, JsonBody};

/// Shared state handed to every books handler.
#[derive(Clone)]
pub struct BooksState {
    pub repository: Arc<dyn BookRepository>,
    /// Answer 404 instead of a zero-valued record for missing books
    pub missing_as_not_found: bool,
}

impl BooksState {
    fn missing(&self, id: i64) -> Result<Json<Book>, AppError> {
        if self.missing_as_not_found {
            Err(AppError::not_found(format!("book {} not found", id)))
        } else {
            Ok(Json(Book::default()))
        }
    }
}

/// Build the `/book/` router bound to `state`.
pub fn router(state: BooksState) -> Router {
    Router::new()
        .route("/book/", get(list_books).post(create_book))
        .route(
            "/book/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/book/",
    tag = "Books",
    responses(
        (status = 200, description = "Every stored book", body = [Book]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_books(State(state): State<BooksState>) -> Result<Json<Vec<Book>>, AppError> {
    let books = state.repository.find_all().await?;
    tracing::debug!(count = books.len(), "listed books");
    Ok(Json(books))
}

#[utoipa::path(
    get,
    path = "/book/{id}",
    tag = "Books",
    params(("id" = i64, Path, description = "Book identifier")),
    responses(
        (status = 200, description = "The book, or a zero-valued record when it does not exist", body = Book),
        (status = 400, description = "Identifier is not an integer", body = ErrorResponse),
        (status = 404, description = "Book not found (strict mode only)", body = ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<BooksState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Book>, AppError> {
    let id = parse_id(&raw_id)?;

    match state.repository.find_by_id(id).await? {
        Some(book) => Ok(Json(book)),
        None => {
            tracing::debug!(book_id = id, "book not found");
            state.missing(id)
        }
    }
}

#[utoipa::path(
    post,
    path = "/book/",
    tag = "Books",
    request_body = BookInput,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Malformed JSON body", body = ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<BooksState>,
    JsonBody(input): JsonBody<BookInput>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let book = state.repository.create(&input).await?;
    tracing::info!(book_id = book.id, name = %book.name, "book created");
    Ok((StatusCode::CREATED, Json(book)))
}

#[utoipa::path(
    put,
    path = "/book/{id}",
    tag = "Books",
    params(("id" = i64, Path, description = "Book identifier")),
    request_body = BookInput,
    responses(
        (status = 200, description = "Merged book; empty fields keep their stored value", body = Book),
        (status = 400, description = "Bad identifier or malformed JSON body", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<BooksState>,
    Path(raw_id): Path<String>,
    JsonBody(input): JsonBody<BookInput>,
) -> Result<Json<Book>, AppError> {
    let id = parse_id(&raw_id)?;
    let not_found = || AppError::not_found(format!("book {} not found", id));

    let mut book = state.repository.find_by_id(id).await?.ok_or_else(not_found)?;
    book.merge(input);

    let saved = state.repository.save(&book).await?.ok_or_else(not_found)?;
    tracing::info!(book_id = id, "book updated");
    Ok(Json(saved))
}

#[utoipa::path(
    delete,
    path = "/book/{id}",
    tag = "Books",
    params(("id" = i64, Path, description = "Book identifier")),
    responses(
        (status = 200, description = "Final state of the deleted book, or a zero-valued record", body = Book),
        (status = 400, description = "Identifier is not an integer", body = ErrorResponse),
        (status = 404, description = "Book not found (strict mode only)", body = ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<BooksState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Book>, AppError> {
    let id = parse_id(&raw_id)?;

    match state.repository.delete(id).await? {
        Some(book) => {
            tracing::info!(book_id = id, "book deleted");
            Ok(Json(book))
        }
        None => {
            tracing::debug!(book_id = id, "nothing to delete");
            state.missing(id)
        }
    }
}
