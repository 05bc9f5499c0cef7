use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::auth::login,
        handlers::voucher::list_vouchers,
        handlers::voucher::create_voucher,
        handlers::voucher::get_voucher,
        handlers::voucher::update_voucher,
        handlers::voucher::delete_voucher,
        handlers::voucher::upload_csv,
        handlers::voucher::export_csv,
    ),
    components(
        schemas(
            HealthResponse,
            LoginRequest,
            LoginResponse,
            CreateVoucherRequest,
            UpdateVoucherRequest,
            VoucherResponse,
            ListVoucherQuery,
            PaginationMeta,
            CsvUploadResponse,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness probe"),
        (name = "auth", description = "Token issuance"),
        (name = "voucher", description = "Voucher management and CSV import/export"),
    ),
    info(
        title = "Voucher Backend API",
        version = "1.0.0",
        description = "Voucher management REST API documentation"
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/login",
            "/vouchers",
            "/vouchers/get-by-id/{id}",
            "/vouchers/{id}",
            "/vouchers/upload-csv",
            "/vouchers/export",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
