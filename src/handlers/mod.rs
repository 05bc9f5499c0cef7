pub mod auth;
pub mod health;
pub mod voucher;

pub use auth::auth_config;
pub use health::health_config;
pub use voucher::voucher_config;

use actix_web::{ResponseError, error, web};

use crate::error::AppError;

/// 提取器失败（JSON、查询参数、路径）统一转为 400 信封
pub fn extractor_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let message = format!("invalid request body: {err}");
        error::InternalError::from_response(err, AppError::ValidationError(message).error_response())
            .into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        let message = format!("invalid query parameters: {err}");
        error::InternalError::from_response(err, AppError::ValidationError(message).error_response())
            .into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        let message = format!("invalid path parameter: {err}");
        error::InternalError::from_response(err, AppError::ValidationError(message).error_response())
            .into()
    }));
}

/// Full route table; shared by the server and the integration tests.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(extractor_config)
        .configure(health_config)
        .configure(auth_config)
        .configure(voucher_config);
}
