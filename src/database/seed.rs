//! Development sample data.

use crate::error::AppResult;
use crate::models::{NewVoucher, VoucherListParams};
use crate::repository::VoucherRepository;
use crate::utils::time::parse_strict_datetime;

// code, name, description, discount, max_usage, valid_from, valid_until
const SAMPLE_VOUCHERS: &[(&str, &str, &str, f64, i32, &str, &str)] = &[
    ("WELCOME2025", "Welcome Bonus 2025", "Special discount for new customers in 2025", 25.0, 100, "2025-01-01 00:00:00", "2025-12-31 23:59:59"),
    ("NEWYEAR50", "New Year Flash Sale", "Limited time 50% discount for New Year celebration", 50.0, 50, "2025-01-01 00:00:00", "2025-01-07 23:59:59"),
    ("VALENTINE20", "Valentine Special", "Show love with 20% discount", 20.0, 200, "2025-02-10 00:00:00", "2025-02-14 23:59:59"),
    ("SPRING15", "Spring Sale", "Fresh start with 15% off", 15.0, 150, "2025-03-01 00:00:00", "2025-05-31 23:59:59"),
    ("SUMMER30", "Summer Vibes", "Hot deals with 30% discount", 30.0, 100, "2025-06-01 00:00:00", "2025-08-31 23:59:59"),
    ("BACKTOSCHOOL", "Back to School", "Student discount 25% off", 25.0, 300, "2025-08-01 00:00:00", "2025-10-01 06:59:59"),
    ("OCTOBER10", "October Fest", "Celebrate with 10% discount", 10.0, 500, "2025-10-01 00:00:00", "2025-11-01 06:59:59"),
    ("BLACKFRIDAY", "Black Friday Mega Sale", "Biggest discount of the year - 60% off", 60.0, 200, "2025-11-28 00:00:00", "2025-11-30 23:59:59"),
    ("CYBERMONDAY", "Cyber Monday Special", "Online exclusive 45% discount", 45.0, 250, "2025-12-01 00:00:00", "2025-12-02 23:59:59"),
    ("CHRISTMAS35", "Christmas Gift", "Holiday season special 35% off", 35.0, 400, "2025-12-15 00:00:00", "2025-12-25 23:59:59"),
    ("VIPGOLD", "VIP Gold Member", "Exclusive VIP discount 40%", 40.0, 1000, "2025-01-01 00:00:00", "2025-12-31 23:59:59"),
    ("FIRSTBUY", "First Purchase", "First time buyer gets 30% off", 30.0, 500, "2025-01-01 00:00:00", "2025-12-31 23:59:59"),
    ("LOYAL100", "Loyalty Reward", "Thank you for being loyal - 20% off", 20.0, 1000, "2025-01-01 00:00:00", "2025-12-31 23:59:59"),
    ("FLASH5MIN", "Flash 5 Minutes", "Ultra limited 70% discount - only 20 uses", 70.0, 20, "2025-01-15 12:00:00", "2025-01-15 12:05:00"),
    ("WEEKEND15", "Weekend Special", "Every weekend get 15% off", 15.0, 1000, "2025-01-01 00:00:00", "2025-12-31 23:59:59"),
];

fn sample_vouchers() -> Vec<NewVoucher> {
    SAMPLE_VOUCHERS
        .iter()
        .filter_map(|&(code, name, description, discount, max_usage, from, until)| {
            Some(NewVoucher {
                code: code.to_string(),
                name: name.to_string(),
                description: description.to_string(),
                discount,
                max_usage,
                valid_from: parse_strict_datetime(from)?,
                valid_until: parse_strict_datetime(until)?,
                is_active: true,
            })
        })
        .collect()
}

/// Inserts the sample vouchers when the table has no live rows.
///
/// Returns how many were created.
pub async fn seed_vouchers(repo: &dyn VoucherRepository) -> AppResult<usize> {
    let (_, existing) = repo.find_all(&VoucherListParams::default()).await?;
    if existing > 0 {
        log::info!("Database already has data, skipping seed");
        return Ok(0);
    }

    let mut created = 0;
    for voucher in sample_vouchers() {
        // 已存在同码则跳过
        if repo.find_by_code(&voucher.code).await?.is_some() {
            continue;
        }
        let code = voucher.code.clone();
        match repo.create(voucher).await {
            Ok(_) => created += 1,
            Err(e) => log::warn!("Failed to seed voucher {code}: {e}"),
        }
    }

    log::info!("Seeded {created} vouchers");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockVoucherRepository;

    #[test]
    fn test_sample_vouchers_are_well_formed() {
        let vouchers = sample_vouchers();
        assert_eq!(vouchers.len(), SAMPLE_VOUCHERS.len());
        for v in &vouchers {
            assert!(v.valid_until > v.valid_from, "{}", v.code);
            assert!((0.0..=100.0).contains(&v.discount));
        }
    }

    #[tokio::test]
    async fn test_seed_skips_populated_table() {
        let mut repo = MockVoucherRepository::new();
        repo.expect_find_all().returning(|_| Ok((vec![], 3)));
        repo.expect_create().never();

        assert_eq!(seed_vouchers(&repo).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_seed_empty_table() {
        let mut repo = MockVoucherRepository::new();
        repo.expect_find_all().returning(|_| Ok((vec![], 0)));
        repo.expect_find_by_code().returning(|_| Ok(None));
        repo.expect_create()
            .times(SAMPLE_VOUCHERS.len())
            .returning(|v| {
                Ok(crate::models::Voucher {
                    id: 1,
                    code: v.code,
                    name: v.name,
                    description: v.description,
                    discount: v.discount,
                    max_usage: v.max_usage,
                    used_count: 0,
                    valid_from: v.valid_from,
                    valid_until: v.valid_until,
                    is_active: v.is_active,
                    created_at: v.valid_from,
                    updated_at: v.valid_from,
                    deleted_at: None,
                })
            });

        assert_eq!(seed_vouchers(&repo).await.unwrap(), SAMPLE_VOUCHERS.len());
    }
}
