use crate::entities::voucher_entity;
use crate::error::{AppError, AppResult};
use crate::models::pagination::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::utils::time::{deserialize_flexible, deserialize_flexible_option, format_long_date};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub type Voucher = voucher_entity::Model;

const CODE_LEN: (usize, usize) = (3, 50);
const NAME_LEN: (usize, usize) = (3, 255);

/// Insertable voucher; storage assigns id, counters and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVoucher {
    pub code: String,
    pub name: String,
    pub description: String,
    pub discount: f64,
    pub max_usage: i32,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateVoucherRequest {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub discount: f64,
    pub max_usage: i32,
    #[serde(deserialize_with = "deserialize_flexible")]
    pub valid_from: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_flexible")]
    pub valid_until: DateTime<Utc>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Every field is optional; only fields present in the body are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateVoucherRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub discount: Option<f64>,
    #[serde(default)]
    pub max_usage: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_flexible_option")]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_flexible_option")]
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

fn check_len(field: &str, value: &str, (min, max): (usize, usize)) -> AppResult<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(AppError::ValidationError(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(())
}

fn check_discount(discount: f64) -> AppResult<()> {
    if !(0.0..=100.0).contains(&discount) {
        return Err(AppError::ValidationError(
            "discount must be between 0 and 100".to_string(),
        ));
    }
    Ok(())
}

fn check_max_usage(max_usage: i32) -> AppResult<()> {
    if max_usage < 1 {
        return Err(AppError::ValidationError(
            "max_usage must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn check_period(valid_from: DateTime<Utc>, valid_until: DateTime<Utc>) -> AppResult<()> {
    if valid_until <= valid_from {
        return Err(AppError::ValidationError(
            "valid_until must be after valid_from".to_string(),
        ));
    }
    Ok(())
}

impl NewVoucher {
    /// Same rules as a create request; applied to CSV rows before insert.
    pub fn validate(&self) -> AppResult<()> {
        check_len("code", &self.code, CODE_LEN)?;
        check_len("name", &self.name, NAME_LEN)?;
        check_discount(self.discount)?;
        check_max_usage(self.max_usage)?;
        check_period(self.valid_from, self.valid_until)
    }
}

impl CreateVoucherRequest {
    pub fn validate(&self) -> AppResult<()> {
        check_len("code", &self.code, CODE_LEN)?;
        check_len("name", &self.name, NAME_LEN)?;
        check_discount(self.discount)?;
        check_max_usage(self.max_usage)?;
        check_period(self.valid_from, self.valid_until)
    }

    pub fn into_new_voucher(self) -> NewVoucher {
        NewVoucher {
            code: self.code,
            name: self.name,
            description: self.description.unwrap_or_default(),
            discount: self.discount,
            max_usage: self.max_usage,
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            is_active: self.is_active.unwrap_or(true),
        }
    }
}

impl UpdateVoucherRequest {
    /// Date ordering is only enforced on create.
    pub fn validate(&self) -> AppResult<()> {
        if let Some(code) = &self.code {
            check_len("code", code, CODE_LEN)?;
        }
        if let Some(name) = &self.name {
            check_len("name", name, NAME_LEN)?;
        }
        if let Some(discount) = self.discount {
            check_discount(discount)?;
        }
        if let Some(max_usage) = self.max_usage {
            check_max_usage(max_usage)?;
        }
        Ok(())
    }

    /// Copies every present field onto `voucher`.
    pub fn apply_to(self, voucher: &mut Voucher) {
        if let Some(code) = self.code {
            voucher.code = code;
        }
        if let Some(name) = self.name {
            voucher.name = name;
        }
        if let Some(description) = self.description {
            voucher.description = description;
        }
        if let Some(discount) = self.discount {
            voucher.discount = discount;
        }
        if let Some(max_usage) = self.max_usage {
            voucher.max_usage = max_usage;
        }
        if let Some(valid_from) = self.valid_from {
            voucher.valid_from = valid_from;
        }
        if let Some(valid_until) = self.valid_until {
            voucher.valid_until = valid_until;
        }
        if let Some(is_active) = self.is_active {
            voucher.is_active = is_active;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VoucherResponse {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub description: String,
    pub discount: f64,
    pub max_usage: i32,
    pub used_count: i32,
    pub valid_from: String,
    pub valid_until: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Voucher> for VoucherResponse {
    fn from(v: Voucher) -> Self {
        Self {
            id: v.id,
            code: v.code,
            name: v.name,
            description: v.description,
            discount: v.discount,
            max_usage: v.max_usage,
            used_count: v.used_count,
            valid_from: format_long_date(v.valid_from),
            valid_until: format_long_date(v.valid_until),
            is_active: v.is_active,
            created_at: format_long_date(v.created_at),
            updated_at: format_long_date(v.updated_at),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Code,
    Name,
    Discount,
    CreatedAt,
}

impl std::str::FromStr for SortField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(SortField::Id),
            "code" => Ok(SortField::Code),
            "name" => Ok(SortField::Name),
            "discount" => Ok(SortField::Discount),
            "created_at" => Ok(SortField::CreatedAt),
            other => Err(AppError::ValidationError(format!(
                "sort_by must be one of: id, code, name, discount, created_at (got '{other}')"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl std::str::FromStr for SortOrder {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(AppError::ValidationError(format!(
                "sort_order must be asc or desc (got '{other}')"
            ))),
        }
    }
}

/// Raw query string of `GET /vouchers`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ListVoucherQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub is_active: Option<bool>,
}

/// Validated list request handed to storage.
#[derive(Debug, Clone, PartialEq)]
pub struct VoucherListParams {
    pub page: u64,
    pub page_size: u64,
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
}

impl Default for VoucherListParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            search: None,
            is_active: None,
            sort_field: SortField::CreatedAt,
            sort_order: SortOrder::Asc,
        }
    }
}

impl VoucherListParams {
    /// Rows to skip; `None` once the page lies past any addressable row.
    pub fn offset(&self) -> Option<u64> {
        self.page
            .checked_sub(1)?
            .checked_mul(self.page_size)
            .filter(|&offset| offset <= i64::MAX as u64)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

impl TryFrom<ListVoucherQuery> for VoucherListParams {
    type Error = AppError;

    fn try_from(query: ListVoucherQuery) -> Result<Self, Self::Error> {
        let page = match query.page {
            None => DEFAULT_PAGE,
            Some(p) if p >= 1 => p as u64,
            Some(_) => {
                return Err(AppError::ValidationError(
                    "page must be at least 1".to_string(),
                ));
            }
        };

        let page_size = match query.page_size {
            None => DEFAULT_PAGE_SIZE,
            Some(s) if (1..=MAX_PAGE_SIZE as i64).contains(&s) => s as u64,
            Some(_) => {
                return Err(AppError::ValidationError(format!(
                    "page_size must be between 1 and {MAX_PAGE_SIZE}"
                )));
            }
        };

        let sort_field = match non_blank(query.sort_by.as_deref()) {
            Some(s) => s.parse()?,
            None => SortField::CreatedAt,
        };
        let sort_order = match non_blank(query.sort_order.as_deref()) {
            Some(s) => s.parse()?,
            None => SortOrder::Asc,
        };

        Ok(Self {
            page,
            page_size,
            search: query.search.filter(|s| !s.is_empty()),
            is_active: query.is_active,
            sort_field,
            sort_order,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CsvUploadResponse {
    pub success_count: usize,
    pub failed_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Result of creating a batch row by row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkCreateOutcome {
    pub success_count: usize,
    pub errors: Vec<String>,
}
