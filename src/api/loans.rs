//! Loan lifecycle endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppResult,
    models::loan::{Loan, LoanStatus, LoanWithDetails},
};

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// List of items
    pub items: Vec<T>,
    /// Total number of items
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Items per page
    pub per_page: i64,
}

/// Create loan request
#[derive(Deserialize, Validate, ToSchema)]
pub struct CreateLoanRequest {
    /// Borrowing user ID
    #[validate(range(min = 1))]
    pub user_id: i32,
    /// Item ID to borrow
    #[validate(range(min = 1))]
    pub item_id: i32,
    /// Due time; defaults to the configured loan period when omitted
    pub due_time: Option<DateTime<Utc>>,
}

/// Extend loan request
#[derive(Deserialize, Validate, ToSchema)]
pub struct ExtendLoanRequest {
    /// Days to add; defaults to the configured extension period
    #[validate(range(min = 1, max = 30))]
    pub days: Option<i64>,
}

/// Return response with the closed loan
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    /// Return status
    pub status: String,
    /// The returned loan
    pub loan: Loan,
}

/// Loan listing query
#[derive(Deserialize)]
pub struct LoanQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<LoanStatus>,
}

/// Create a new loan (borrow an item)
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    request_body = CreateLoanRequest,
    responses(
        (status = 201, description = "Loan created", body = Loan),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "User or item not found"),
        (status = 409, description = "Item unavailable or duplicate active loan"),
        (status = 503, description = "A collaborator service is unavailable")
    )
)]
pub async fn create_loan(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateLoanRequest>,
) -> AppResult<(StatusCode, Json<Loan>)> {
    request.validate()?;

    let loan = state
        .services
        .loans
        .create_loan(request.user_id, request.item_id, request.due_time)
        .await?;

    Ok((StatusCode::CREATED, Json(loan)))
}

/// Return a borrowed item
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Item returned", body = ReturnResponse),
        (status = 404, description = "Loan not found"),
        (status = 422, description = "Loan already returned")
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<ReturnResponse>> {
    let loan = state.services.loans.return_loan(loan_id).await?;

    Ok(Json(ReturnResponse {
        status: "returned".to_string(),
        loan,
    }))
}

/// Extend a loan's due time
#[utoipa::path(
    post,
    path = "/loans/{id}/extend",
    tag = "loans",
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    request_body = ExtendLoanRequest,
    responses(
        (status = 200, description = "Loan extended", body = Loan),
        (status = 404, description = "Loan not found"),
        (status = 422, description = "Loan not active or extension cap reached")
    )
)]
pub async fn extend_loan(
    State(state): State<crate::AppState>,
    Path(loan_id): Path<i32>,
    Json(request): Json<ExtendLoanRequest>,
) -> AppResult<Json<Loan>> {
    request.validate()?;

    let loan = state
        .services
        .loans
        .extend_loan(loan_id, request.days)
        .await?;
    Ok(Json(loan))
}

/// Get a loan with user and item details
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan details", body = LoanWithDetails),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_loan(
    State(state): State<crate::AppState>,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<LoanWithDetails>> {
    let details = state.services.loans.get_loan_with_details(loan_id).await?;
    Ok(Json(details))
}

/// List loans with pagination
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    params(
        ("page" = Option<i64>, Query, description = "Page number (default: 1)"),
        ("per_page" = Option<i64>, Query, description = "Loans per page (default: 20)"),
        ("status" = Option<String>, Query, description = "Filter by status (ACTIVE, RETURNED, OVERDUE)")
    ),
    responses(
        (status = 200, description = "List of loans", body = PaginatedResponse<Loan>)
    )
)]
pub async fn list_loans(
    State(state): State<crate::AppState>,
    Query(query): Query<LoanQuery>,
) -> AppResult<Json<PaginatedResponse<Loan>>> {
    let page = query.page.unwrap_or(1);
    let per_page = query.per_page.unwrap_or(20);

    let (loans, total) = state
        .services
        .loans
        .list_loans(page, per_page, query.status)
        .await?;

    Ok(Json(PaginatedResponse {
        items: loans,
        total,
        page,
        per_page,
    }))
}

/// List overdue loans
#[utoipa::path(
    get,
    path = "/loans/overdue",
    tag = "loans",
    responses(
        (status = 200, description = "Loans past their due time", body = Vec<Loan>)
    )
)]
pub async fn overdue_loans(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<Loan>>> {
    let loans = state.services.loans.overdue_loans().await?;
    Ok(Json(loans))
}

/// Get loans for a specific user
#[utoipa::path(
    get,
    path = "/users/{id}/loans",
    tag = "loans",
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User's loans", body = Vec<LoanWithDetails>),
        (status = 404, description = "User not found"),
        (status = 503, description = "Identity Directory unavailable")
    )
)]
pub async fn get_user_loans(
    State(state): State<crate::AppState>,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Vec<LoanWithDetails>>> {
    let loans = state.services.loans.get_user_loans(user_id).await?;
    Ok(Json(loans))
}
