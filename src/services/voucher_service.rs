use std::sync::Arc;

use crate::config::CsvConfig;
use crate::error::{AppError, AppResult, DUPLICATE_CODE_MESSAGE};
use crate::models::*;
use crate::repository::VoucherRepository;
use crate::services::voucher_csv;

#[derive(Clone)]
pub struct VoucherService {
    repo: Arc<dyn VoucherRepository>,
    csv: CsvConfig,
}

fn not_found() -> AppError {
    AppError::NotFound("voucher not found".to_string())
}

impl VoucherService {
    pub fn new(repo: Arc<dyn VoucherRepository>, csv: CsvConfig) -> Self {
        Self { repo, csv }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.csv.max_upload_bytes
    }

    pub async fn create_voucher(&self, request: CreateVoucherRequest) -> AppResult<VoucherResponse> {
        request.validate()?;

        // 预检查只为给出友好的错误，唯一索引才是最终保证
        if self.repo.find_by_code(&request.code).await?.is_some() {
            return Err(AppError::Conflict(DUPLICATE_CODE_MESSAGE.to_string()));
        }

        let voucher = self.repo.create(request.into_new_voucher()).await?;
        log::info!("Voucher {} created (id={})", voucher.code, voucher.id);
        Ok(VoucherResponse::from(voucher))
    }

    pub async fn get_voucher(&self, id: i64) -> AppResult<VoucherResponse> {
        let voucher = self.repo.find_by_id(id).await?.ok_or_else(not_found)?;
        Ok(VoucherResponse::from(voucher))
    }

    pub async fn list_vouchers(
        &self,
        query: ListVoucherQuery,
    ) -> AppResult<PaginatedResponse<VoucherResponse>> {
        let params = VoucherListParams::try_from(query)?;
        let (vouchers, total) = self.repo.find_all(&params).await?;

        let items = vouchers.into_iter().map(VoucherResponse::from).collect();
        Ok(PaginatedResponse::new(
            items,
            params.page,
            params.page_size,
            total,
        ))
    }

    pub async fn update_voucher(
        &self,
        id: i64,
        request: UpdateVoucherRequest,
    ) -> AppResult<VoucherResponse> {
        request.validate()?;

        let mut voucher = self.repo.find_by_id(id).await?.ok_or_else(not_found)?;

        if let Some(code) = &request.code {
            if let Some(existing) = self.repo.find_by_code(code).await? {
                if existing.id != voucher.id {
                    return Err(AppError::Conflict(DUPLICATE_CODE_MESSAGE.to_string()));
                }
            }
        }

        request.apply_to(&mut voucher);
        let updated = self.repo.update(&voucher).await?;
        log::info!("Voucher {} updated", updated.id);
        Ok(VoucherResponse::from(updated))
    }

    pub async fn delete_voucher(&self, id: i64) -> AppResult<()> {
        if self.repo.find_by_id(id).await?.is_none() {
            return Err(not_found());
        }

        self.repo.soft_delete(id).await?;
        log::info!("Voucher {id} soft-deleted");
        Ok(())
    }

    pub async fn import_csv(&self, data: &[u8]) -> AppResult<CsvUploadResponse> {
        let parsed = voucher_csv::parse_import(data)?;
        let parsed_count = parsed.vouchers.len();

        let outcome = self.repo.bulk_create(parsed.vouchers).await;

        let mut response = CsvUploadResponse {
            success_count: outcome.success_count,
            failed_count: parsed_count - outcome.success_count,
            errors: outcome.errors,
        };
        if self.csv.report_skipped_rows {
            response.failed_count += parsed.skipped.len();
            response.errors.extend(parsed.skipped);
        }

        log::info!(
            "CSV import finished: {} created, {} failed",
            response.success_count,
            response.failed_count
        );
        Ok(response)
    }

    pub async fn export_csv(&self) -> AppResult<Vec<u8>> {
        let vouchers = self.repo.export_all().await?;
        voucher_csv::write_export(&vouchers)
    }
}
