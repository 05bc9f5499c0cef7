//! Voucher persistence with soft delete.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, LikeExpr, Order};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Unchanged, ColumnTrait, Condition, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};

use crate::entities::voucher_entity as vouchers;
use crate::error::{AppError, AppResult};
use crate::models::{BulkCreateOutcome, NewVoucher, SortField, SortOrder, Voucher, VoucherListParams};

#[cfg(test)]
use mockall::automock;

/// Storage collaborator for vouchers.
///
/// Every read excludes soft-deleted rows.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VoucherRepository: Send + Sync {
    async fn create(&self, voucher: NewVoucher) -> AppResult<Voucher>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Voucher>>;

    /// Exact, case-sensitive match.
    async fn find_by_code(&self, code: &str) -> AppResult<Option<Voucher>>;

    /// One page of matches plus the number of rows matching the same filter.
    async fn find_all(&self, params: &VoucherListParams) -> AppResult<(Vec<Voucher>, u64)>;

    /// Writes every mutable column of `voucher` and bumps `updated_at`.
    async fn update(&self, voucher: &Voucher) -> AppResult<Voucher>;

    /// Returns `NotFound` when the row is missing or already deleted.
    async fn soft_delete(&self, id: i64) -> AppResult<()>;

    /// Inserts rows one at a time; a failing row does not stop the rest.
    async fn bulk_create(&self, batch: Vec<NewVoucher>) -> BulkCreateOutcome;

    /// All live vouchers, newest first.
    async fn export_all(&self) -> AppResult<Vec<Voucher>>;
}

pub struct VoucherStore {
    db: DatabaseConnection,
}

impl VoucherStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn live() -> Select<vouchers::Entity> {
        vouchers::Entity::find().filter(vouchers::Column::DeletedAt.is_null())
    }

    fn filtered(params: &VoucherListParams) -> Select<vouchers::Entity> {
        let mut query = Self::live();

        if let Some(search) = &params.search {
            let pattern = contains_pattern(search);
            let lower_like = |col: vouchers::Column| {
                Expr::expr(Func::lower(Expr::col(col)))
                    .like(LikeExpr::new(pattern.clone()).escape(LIKE_ESCAPE))
            };
            query = query.filter(
                Condition::any()
                    .add(lower_like(vouchers::Column::Code))
                    .add(lower_like(vouchers::Column::Name))
                    .add(lower_like(vouchers::Column::Description)),
            );
        }

        if let Some(is_active) = params.is_active {
            query = query.filter(vouchers::Column::IsActive.eq(is_active));
        }

        query
    }

    /// Filtered rows in list order; ties fall back to `id` in the same direction.
    fn ordered(params: &VoucherListParams) -> Select<vouchers::Entity> {
        let order = sort_order(params.sort_order);
        let query = Self::filtered(params).order_by(sort_column(params.sort_field), order.clone());
        if params.sort_field == SortField::Id {
            query
        } else {
            query.order_by(vouchers::Column::Id, order)
        }
    }

    fn export_query() -> Select<vouchers::Entity> {
        Self::live()
            .order_by_desc(vouchers::Column::CreatedAt)
            .order_by_desc(vouchers::Column::Id)
    }
}

const LIKE_ESCAPE: char = '!';

/// `%term%` with LIKE wildcards in the term matched literally.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn sort_column(field: SortField) -> vouchers::Column {
    match field {
        SortField::Id => vouchers::Column::Id,
        SortField::Code => vouchers::Column::Code,
        SortField::Name => vouchers::Column::Name,
        SortField::Discount => vouchers::Column::Discount,
        SortField::CreatedAt => vouchers::Column::CreatedAt,
    }
}

fn sort_order(order: SortOrder) -> Order {
    match order {
        SortOrder::Asc => Order::Asc,
        SortOrder::Desc => Order::Desc,
    }
}

#[async_trait]
impl VoucherRepository for VoucherStore {
    async fn create(&self, voucher: NewVoucher) -> AppResult<Voucher> {
        let now = Utc::now();
        let model = vouchers::ActiveModel {
            code: Set(voucher.code),
            name: Set(voucher.name),
            description: Set(voucher.description),
            discount: Set(voucher.discount),
            max_usage: Set(voucher.max_usage),
            used_count: Set(0),
            valid_from: Set(voucher.valid_from),
            valid_until: Set(voucher.valid_until),
            is_active: Set(voucher.is_active),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        Ok(model)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Voucher>> {
        Ok(Self::live()
            .filter(vouchers::Column::Id.eq(id))
            .one(&self.db)
            .await?)
    }

    async fn find_by_code(&self, code: &str) -> AppResult<Option<Voucher>> {
        Ok(Self::live()
            .filter(vouchers::Column::Code.eq(code))
            .one(&self.db)
            .await?)
    }

    async fn find_all(&self, params: &VoucherListParams) -> AppResult<(Vec<Voucher>, u64)> {
        // 总数与列表使用同一过滤条件
        let total = Self::filtered(params).count(&self.db).await?;

        // 超出可寻址范围的页必然为空
        let Some(offset) = params.offset() else {
            return Ok((Vec::new(), total));
        };

        let items = Self::ordered(params)
            .limit(params.page_size)
            .offset(offset)
            .all(&self.db)
            .await?;

        Ok((items, total))
    }

    async fn update(&self, voucher: &Voucher) -> AppResult<Voucher> {
        let model = vouchers::ActiveModel {
            id: Unchanged(voucher.id),
            code: Set(voucher.code.clone()),
            name: Set(voucher.name.clone()),
            description: Set(voucher.description.clone()),
            discount: Set(voucher.discount),
            max_usage: Set(voucher.max_usage),
            used_count: Set(voucher.used_count),
            valid_from: Set(voucher.valid_from),
            valid_until: Set(voucher.valid_until),
            is_active: Set(voucher.is_active),
            created_at: Unchanged(voucher.created_at),
            updated_at: Set(Utc::now()),
            deleted_at: Unchanged(voucher.deleted_at),
        }
        .update(&self.db)
        .await?;

        Ok(model)
    }

    async fn soft_delete(&self, id: i64) -> AppResult<()> {
        let now = Utc::now();
        let result = vouchers::Entity::update_many()
            .col_expr(vouchers::Column::DeletedAt, Expr::value(now))
            .col_expr(vouchers::Column::UpdatedAt, Expr::value(now))
            .filter(vouchers::Column::Id.eq(id))
            .filter(vouchers::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("voucher not found".to_string()));
        }
        Ok(())
    }

    async fn bulk_create(&self, batch: Vec<NewVoucher>) -> BulkCreateOutcome {
        let mut outcome = BulkCreateOutcome::default();

        for (i, voucher) in batch.into_iter().enumerate() {
            let created = match voucher.validate() {
                Ok(()) => self.create(voucher).await,
                Err(e) => Err(e),
            };
            match created {
                Ok(_) => outcome.success_count += 1,
                Err(e) => outcome.errors.push(format!("Row {}: {e}", i + 1)),
            }
        }

        outcome
    }

    async fn export_all(&self) -> AppResult<Vec<Voucher>> {
        Ok(Self::export_query().all(&self.db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sea_orm::{DbBackend, MockDatabase, MockExecResult, QueryTrait, Value};
    use std::collections::BTreeMap;

    fn sql(query: Select<vouchers::Entity>) -> String {
        query.build(DbBackend::Postgres).to_string()
    }

    fn stored(id: i64, code: &str) -> Voucher {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        Voucher {
            id,
            code: code.to_string(),
            name: "Stored voucher".to_string(),
            description: String::new(),
            discount: 10.0,
            max_usage: 5,
            used_count: 0,
            valid_from: at,
            valid_until: Utc.with_ymd_and_hms(2025, 12, 31, 0, 0, 0).unwrap(),
            is_active: true,
            created_at: at,
            updated_at: at,
            deleted_at: None,
        }
    }

    fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("Sale"), "%sale%");
        assert_eq!(contains_pattern("A_b"), "%a!_b%");
        assert_eq!(contains_pattern("50%!"), "%50!%!!%");
    }

    #[test]
    fn test_filter_combines_search_active_and_live_rows() {
        let params = VoucherListParams {
            search: Some("Sale_10".to_string()),
            is_active: Some(true),
            ..Default::default()
        };
        let query = sql(VoucherStore::filtered(&params));

        assert!(query.contains(r#""deleted_at" IS NULL"#), "{query}");
        assert!(query.contains(r#"LOWER("code") LIKE"#), "{query}");
        assert!(query.contains(r#"LOWER("name") LIKE"#), "{query}");
        assert!(query.contains(r#"LOWER("description") LIKE"#), "{query}");
        assert!(query.contains("'%sale!_10%'"), "{query}");
        assert!(query.contains("ESCAPE '!'"), "{query}");
        assert!(query.contains(" OR "), "{query}");
        assert!(query.contains(r#""is_active" = TRUE"#), "{query}");
    }

    #[test]
    fn test_filter_without_criteria_only_hides_deleted() {
        let query = sql(VoucherStore::filtered(&VoucherListParams::default()));
        assert!(query.contains(r#""deleted_at" IS NULL"#));
        assert!(!query.contains("LIKE"));
        assert!(!query.contains("is_active"));
    }

    #[test]
    fn test_ordering_breaks_ties_by_id() {
        let params = VoucherListParams {
            sort_field: SortField::Discount,
            sort_order: SortOrder::Desc,
            ..Default::default()
        };
        let query = sql(VoucherStore::ordered(&params));
        assert!(
            query.contains(r#"ORDER BY "vouchers"."discount" DESC, "vouchers"."id" DESC"#),
            "{query}"
        );

        let params = VoucherListParams {
            sort_field: SortField::Id,
            ..Default::default()
        };
        let query = sql(VoucherStore::ordered(&params));
        assert!(query.ends_with(r#"ORDER BY "vouchers"."id" ASC"#), "{query}");
    }

    #[test]
    fn test_export_is_newest_first() {
        let query = sql(VoucherStore::export_query());
        assert!(query.contains(r#""deleted_at" IS NULL"#));
        assert!(
            query.contains(r#"ORDER BY "vouchers"."created_at" DESC, "vouchers"."id" DESC"#),
            "{query}"
        );
    }

    #[tokio::test]
    async fn test_find_all_returns_page_and_total() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([[count_row(3)]])
            .append_query_results([[stored(1, "SALE01")]])
            .into_connection();
        let store = VoucherStore::new(db);

        let (items, total) = store.find_all(&VoucherListParams::default()).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].code, "SALE01");
    }

    #[tokio::test]
    async fn test_find_all_past_addressable_range_is_empty() {
        // 只准备计数结果，若再查询数据会失败
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([[count_row(5)]])
            .into_connection();
        let store = VoucherStore::new(db);

        let params = VoucherListParams {
            page: i64::MAX as u64,
            page_size: 100,
            ..Default::default()
        };
        let (items, total) = store.find_all(&params).await.unwrap();
        assert!(items.is_empty());
        assert_eq!(total, 5);
    }

    #[tokio::test]
    async fn test_soft_delete_missing_row_is_not_found() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
            ])
            .into_connection();
        let store = VoucherStore::new(db);

        assert!(store.soft_delete(7).await.is_ok());
        assert!(matches!(
            store.soft_delete(7).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_bulk_create_rejects_rows_breaking_voucher_rules() {
        // 仅第二行会写库
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([[stored(1, "GOOD01")]])
            .into_connection();
        let store = VoucherStore::new(db);

        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let invalid = NewVoucher {
            code: "X".to_string(),
            name: "N".to_string(),
            description: String::new(),
            discount: 500.0,
            max_usage: 0,
            valid_from: Utc.with_ymd_and_hms(2025, 12, 31, 0, 0, 0).unwrap(),
            valid_until: at,
            is_active: true,
        };
        let valid = NewVoucher {
            code: "GOOD01".to_string(),
            name: "Good one".to_string(),
            discount: 10.0,
            max_usage: 5,
            valid_from: at,
            valid_until: Utc.with_ymd_and_hms(2025, 12, 31, 0, 0, 0).unwrap(),
            ..invalid.clone()
        };

        let outcome = store.bulk_create(vec![invalid, valid]).await;
        assert_eq!(outcome.success_count, 1);
        assert_eq!(
            outcome.errors,
            vec!["Row 1: code must be between 3 and 50 characters"]
        );
    }
}
