use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "vouchers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Double")]
    pub discount: f64,
    pub max_usage: i32,
    pub used_count: i32,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Active, below its usage cap, and `now` falls inside `[valid_from, valid_until)`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.used_count < self.max_usage
            && now >= self.valid_from
            && now < self.valid_until
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    pub fn can_be_used_at(&self, now: DateTime<Utc>) -> bool {
        self.is_valid_at(now) && self.used_count < self.max_usage
    }

    /// Not wired to any endpoint yet; persisting the new count is up to the caller.
    pub fn increment_usage(&mut self) {
        self.used_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn sample(now: DateTime<Utc>) -> Model {
        Model {
            id: 1,
            code: "TEST10".to_string(),
            name: "Test voucher".to_string(),
            description: String::new(),
            discount: 10.0,
            max_usage: 2,
            used_count: 0,
            valid_from: now - Duration::days(1),
            valid_until: now + Duration::days(1),
            is_active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_valid_voucher() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let v = sample(now);
        assert!(v.is_valid_at(now));
        assert!(v.can_be_used_at(now));
    }

    #[test]
    fn test_inactive_voucher_is_invalid() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let mut v = sample(now);
        v.is_active = false;
        assert!(!v.is_valid_at(now));
    }

    #[test]
    fn test_usage_cap_reached() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let mut v = sample(now);
        v.increment_usage();
        assert!(v.can_be_used_at(now));
        v.increment_usage();
        assert_eq!(v.used_count, 2);
        assert!(!v.is_valid_at(now));
        assert!(!v.can_be_used_at(now));
    }

    #[test]
    fn test_date_window_is_half_open() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let v = sample(now);
        assert!(v.is_valid_at(v.valid_from));
        assert!(!v.is_valid_at(v.valid_until));
        assert!(!v.is_valid_at(v.valid_from - Duration::seconds(1)));
    }
}
