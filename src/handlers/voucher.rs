use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::Utc;
use futures_util::StreamExt;

use crate::error::{AppError, AppResult};
use crate::middlewares::current_username;
use crate::models::*;
use crate::services::VoucherService;

#[utoipa::path(
    get,
    path = "/vouchers",
    tag = "voucher",
    security(("bearer_auth" = [])),
    params(
        ("page" = Option<i64>, Query, description = "Page number, starting at 1"),
        ("page_size" = Option<i64>, Query, description = "Items per page (1-100)"),
        ("search" = Option<String>, Query, description = "Matches code, name or description"),
        ("sort_by" = Option<String>, Query, description = "id, code, name, discount or created_at"),
        ("sort_order" = Option<String>, Query, description = "asc or desc"),
        ("is_active" = Option<bool>, Query, description = "Filter by active flag")
    ),
    responses(
        (status = 200, description = "Vouchers retrieved successfully"),
        (status = 400, description = "Invalid query parameters"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn list_vouchers(
    voucher_service: web::Data<VoucherService>,
    query: web::Query<ListVoucherQuery>,
) -> Result<HttpResponse> {
    match voucher_service.list_vouchers(query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            "Vouchers retrieved successfully",
            page,
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/vouchers",
    tag = "voucher",
    security(("bearer_auth" = [])),
    request_body = CreateVoucherRequest,
    responses(
        (status = 201, description = "Voucher created successfully", body = VoucherResponse),
        (status = 400, description = "Validation failed or code already exists"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn create_voucher(
    voucher_service: web::Data<VoucherService>,
    request: web::Json<CreateVoucherRequest>,
) -> Result<HttpResponse> {
    match voucher_service.create_voucher(request.into_inner()).await {
        Ok(voucher) => Ok(HttpResponse::Created().json(ApiResponse::success(
            "Voucher created successfully",
            voucher,
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/vouchers/get-by-id/{id}",
    tag = "voucher",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Voucher id")),
    responses(
        (status = 200, description = "Voucher retrieved successfully", body = VoucherResponse),
        (status = 404, description = "Voucher not found")
    )
)]
pub async fn get_voucher(
    voucher_service: web::Data<VoucherService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match voucher_service.get_voucher(path.into_inner()).await {
        Ok(voucher) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            "Voucher retrieved successfully",
            voucher,
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/vouchers/{id}",
    tag = "voucher",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Voucher id")),
    request_body = UpdateVoucherRequest,
    responses(
        (status = 200, description = "Voucher updated successfully", body = VoucherResponse),
        (status = 400, description = "Validation failed or code already exists"),
        (status = 404, description = "Voucher not found")
    )
)]
pub async fn update_voucher(
    voucher_service: web::Data<VoucherService>,
    path: web::Path<i64>,
    request: web::Json<UpdateVoucherRequest>,
) -> Result<HttpResponse> {
    match voucher_service
        .update_voucher(path.into_inner(), request.into_inner())
        .await
    {
        Ok(voucher) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            "Voucher updated successfully",
            voucher,
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/vouchers/{id}",
    tag = "voucher",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Voucher id")),
    responses(
        (status = 200, description = "Voucher deleted successfully"),
        (status = 404, description = "Voucher not found")
    )
)]
pub async fn delete_voucher(
    voucher_service: web::Data<VoucherService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match voucher_service.delete_voucher(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::message("Voucher deleted successfully"))),
        Err(e) => Ok(e.error_response()),
    }
}

fn is_csv_field(field: &actix_multipart::Field) -> bool {
    let csv_type = field
        .content_type()
        .is_some_and(|mime| mime.essence_str() == "text/csv");
    let csv_name = field
        .content_disposition()
        .and_then(|cd| cd.get_filename())
        .is_some_and(|name| name.to_ascii_lowercase().ends_with(".csv"));
    csv_type || csv_name
}

/// 读取表单中的 `file` 字段，超过上限直接拒绝
async fn read_csv_upload(mut payload: Multipart, max_bytes: usize) -> AppResult<Vec<u8>> {
    let invalid = |e: actix_multipart::MultipartError| {
        AppError::ValidationError(format!("invalid multipart payload: {e}"))
    };

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(invalid)?;
        if field.name() != Some("file") {
            continue;
        }
        if !is_csv_field(&field) {
            return Err(AppError::ValidationError(
                "Only CSV files are allowed".to_string(),
            ));
        }

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(invalid)?;
            if data.len() + chunk.len() > max_bytes {
                return Err(AppError::ValidationError(format!(
                    "file exceeds the maximum upload size of {max_bytes} bytes"
                )));
            }
            data.extend_from_slice(&chunk);
        }
        return Ok(data);
    }

    Err(AppError::ValidationError(
        "file field is required".to_string(),
    ))
}

#[utoipa::path(
    post,
    path = "/vouchers/upload-csv",
    tag = "voucher",
    security(("bearer_auth" = [])),
    request_body(
        content = String,
        description = "multipart/form-data with a `file` field holding the CSV",
        content_type = "multipart/form-data"
    ),
    responses(
        (status = 200, description = "CSV uploaded successfully", body = CsvUploadResponse),
        (status = 400, description = "Not a CSV file or invalid header")
    )
)]
pub async fn upload_csv(
    voucher_service: web::Data<VoucherService>,
    req: HttpRequest,
    payload: Multipart,
) -> Result<HttpResponse> {
    let data = match read_csv_upload(payload, voucher_service.max_upload_bytes()).await {
        Ok(data) => data,
        Err(e) => return Ok(e.error_response()),
    };

    if let Some(username) = current_username(&req) {
        log::info!("CSV upload of {} bytes by {username}", data.len());
    }

    match voucher_service.import_csv(&data).await {
        Ok(result) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            "CSV uploaded successfully",
            result,
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/vouchers/export",
    tag = "voucher",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "CSV file with every voucher", content_type = "text/csv")
    )
)]
pub async fn export_csv(voucher_service: web::Data<VoucherService>) -> Result<HttpResponse> {
    match voucher_service.export_csv().await {
        Ok(body) => {
            let filename = format!(
                "vouchers_export_{}.csv",
                Utc::now().format("%Y%m%d_%H%M%S")
            );
            Ok(HttpResponse::Ok()
                .content_type("text/csv")
                .insert_header((
                    "Content-Disposition",
                    format!("attachment; filename={filename}"),
                ))
                .body(body))
        }
        Err(e) => Ok(e.error_response()),
    }
}

pub fn voucher_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/vouchers")
            .route("", web::get().to(list_vouchers))
            .route("", web::post().to(create_voucher))
            .route("/export", web::get().to(export_csv))
            .route("/upload-csv", web::post().to(upload_csv))
            .route("/get-by-id/{id}", web::get().to(get_voucher))
            .route("/{id}", web::put().to(update_voucher))
            .route("/{id}", web::delete().to(delete_voucher)),
    );
}
