//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{health, loans};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Circulate API",
        version = "0.3.0",
        description = "Loan lifecycle service REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Loans
        loans::create_loan,
        loans::return_loan,
        loans::extend_loan,
        loans::get_loan,
        loans::list_loans,
        loans::overdue_loans,
        loans::get_user_loans,
    ),
    components(
        schemas(
            // Loans
            loans::CreateLoanRequest,
            loans::ExtendLoanRequest,
            loans::ReturnResponse,
            crate::models::loan::Loan,
            crate::models::loan::LoanStatus,
            crate::models::loan::LoanWithDetails,
            crate::models::loan::UserSummary,
            crate::models::loan::ItemSummary,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
            crate::error::ErrorKind,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "loans", description = "Loan lifecycle management")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
