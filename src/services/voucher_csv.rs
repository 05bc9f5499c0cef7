//! CSV import parsing and export rendering for vouchers.
//!
//! Two header layouts are accepted on import: the dedicated import layout
//! (dates as `YYYY-MM-DD`) and the export layout (dates as
//! `YYYY-MM-DD HH:MM:SS`), so an exported file can be uploaded again.

use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};

use crate::error::{AppError, AppResult};
use crate::models::{NewVoucher, Voucher};
use crate::utils::time::{DATETIME_FORMAT, parse_strict_date, parse_strict_datetime};

pub const IMPORT_HEADER: [&str; 8] = [
    "code",
    "name",
    "description",
    "discount",
    "max_usage",
    "valid_from",
    "valid_until",
    "is_active",
];

pub const EXPORT_HEADER: [&str; 10] = [
    "code",
    "name",
    "description",
    "discount",
    "max_usage",
    "used_count",
    "valid_from",
    "valid_until",
    "is_active",
    "created_at",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Import,
    Export,
}

struct Columns {
    valid_from: usize,
    valid_until: usize,
    is_active: usize,
}

impl Layout {
    fn detect(header: &StringRecord) -> Option<Self> {
        if header_matches(header, &IMPORT_HEADER) {
            Some(Layout::Import)
        } else if header_matches(header, &EXPORT_HEADER) {
            Some(Layout::Export)
        } else {
            None
        }
    }

    fn columns(self) -> Columns {
        match self {
            Layout::Import => Columns {
                valid_from: 5,
                valid_until: 6,
                is_active: 7,
            },
            Layout::Export => Columns {
                valid_from: 6,
                valid_until: 7,
                is_active: 8,
            },
        }
    }

    fn parse_date(self, raw: &str) -> Option<DateTime<Utc>> {
        match self {
            Layout::Import => parse_strict_date(raw),
            Layout::Export => parse_strict_datetime(raw),
        }
    }
}

/// Positional, case-insensitive; extra trailing columns are fine.
fn header_matches(header: &StringRecord, expected: &[&str]) -> bool {
    header.len() >= expected.len()
        && expected
            .iter()
            .zip(header.iter())
            .all(|(want, got)| got.trim().eq_ignore_ascii_case(want))
}

#[derive(Debug, Default)]
pub struct ParsedImport {
    pub vouchers: Vec<NewVoucher>,
    /// `Line {n}: {reason}` for each row that could not be parsed.
    pub skipped: Vec<String>,
}

/// Accepted spellings: `1 t T TRUE true True` and `0 f F FALSE false False`.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

fn parse_row(layout: Layout, record: &StringRecord) -> Result<NewVoucher, String> {
    let cols = layout.columns();
    if record.len() <= cols.valid_until {
        return Err("invalid number of columns".to_string());
    }
    let field = |i: usize| record.get(i).unwrap_or_default().trim();

    let discount = field(3)
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite())
        .ok_or_else(|| "invalid discount value".to_string())?;
    let max_usage = field(4)
        .parse::<i32>()
        .map_err(|_| "invalid max_usage value".to_string())?;
    let valid_from = layout
        .parse_date(field(cols.valid_from))
        .ok_or_else(|| "invalid valid_from date".to_string())?;
    let valid_until = layout
        .parse_date(field(cols.valid_until))
        .ok_or_else(|| "invalid valid_until date".to_string())?;
    let is_active = record
        .get(cols.is_active)
        .and_then(|raw| parse_bool(raw.trim()))
        .unwrap_or(true);

    Ok(NewVoucher {
        code: field(0).to_string(),
        name: field(1).to_string(),
        description: field(2).to_string(),
        discount,
        max_usage,
        valid_from,
        valid_until,
        is_active,
    })
}

/// Fails as a whole only when the header is missing or wrong, or a line is not decodable CSV.
pub fn parse_import(data: &[u8]) -> AppResult<ParsedImport> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(data);

    let mut records = reader.records();
    let header = match records.next() {
        Some(Ok(header)) => header,
        Some(Err(e)) => {
            return Err(AppError::ValidationError(format!(
                "failed to read CSV header: {e}"
            )));
        }
        None => {
            return Err(AppError::ValidationError(
                "failed to read CSV header: file is empty".to_string(),
            ));
        }
    };

    let layout = Layout::detect(&header)
        .ok_or_else(|| AppError::ValidationError("invalid CSV header format".to_string()))?;

    let mut parsed = ParsedImport::default();
    for result in records {
        let record = result.map_err(|e| {
            let line = e.position().map(|p| p.line()).unwrap_or_default();
            AppError::ValidationError(format!("failed to read CSV row {line}: {e}"))
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        match parse_row(layout, &record) {
            Ok(voucher) => parsed.vouchers.push(voucher),
            Err(reason) => {
                log::debug!("Skipping CSV line {line}: {reason}");
                parsed.skipped.push(format!("Line {line}: {reason}"));
            }
        }
    }

    Ok(parsed)
}

pub fn write_export(vouchers: &[Voucher]) -> AppResult<Vec<u8>> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(EXPORT_HEADER)?;

    for v in vouchers {
        writer.write_record([
            v.code.clone(),
            v.name.clone(),
            v.description.clone(),
            format!("{:.2}", v.discount),
            v.max_usage.to_string(),
            v.used_count.to_string(),
            v.valid_from.format(DATETIME_FORMAT).to_string(),
            v.valid_until.format(DATETIME_FORMAT).to_string(),
            v.is_active.to_string(),
            v.created_at.format(DATETIME_FORMAT).to_string(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::InternalError(format!("failed to flush CSV: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const HEADER: &str = "code,name,description,discount,max_usage,valid_from,valid_until,is_active\n";

    fn voucher(id: i64, code: &str) -> Voucher {
        Voucher {
            id,
            code: code.to_string(),
            name: format!("{code} name"),
            description: "with, comma".to_string(),
            discount: 12.5,
            max_usage: 10,
            used_count: 3,
            valid_from: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            valid_until: Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap(),
            is_active: false,
            created_at: Utc.with_ymd_and_hms(2024, 12, 1, 8, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 12, 1, 8, 0, 0).unwrap(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_parse_well_formed_rows() {
        let csv = format!(
            "{HEADER}SAVE10, Save ten ,desc,10,5,2025-01-01,2025-12-31,false\n\
             SAVE20,Save twenty,,20.5,1,2025-02-01,2025-03-01,true\n"
        );
        let parsed = parse_import(csv.as_bytes()).unwrap();

        assert!(parsed.skipped.is_empty());
        assert_eq!(parsed.vouchers.len(), 2);
        let first = &parsed.vouchers[0];
        assert_eq!(first.code, "SAVE10");
        assert_eq!(first.name, "Save ten");
        assert_eq!(first.discount, 10.0);
        assert_eq!(first.max_usage, 5);
        assert!(!first.is_active);
        assert_eq!(
            first.valid_until,
            Utc.with_ymd_and_hms(2025, 12, 31, 0, 0, 0).unwrap()
        );
        assert_eq!(parsed.vouchers[1].discount, 20.5);
    }

    #[test]
    fn test_header_is_case_insensitive_and_tolerates_trailing_columns() {
        let csv = " CODE ,Name,DESCRIPTION,discount,max_usage,valid_from,valid_until,is_active,notes\n\
                   A01,Alpha,,5,1,2025-01-01,2025-02-01,true,ignored\n";
        let parsed = parse_import(csv.as_bytes()).unwrap();
        assert_eq!(parsed.vouchers.len(), 1);
    }

    #[test]
    fn test_reordered_or_missing_header_fails() {
        let reordered = "name,code,description,discount,max_usage,valid_from,valid_until,is_active\n\
                         Alpha,A01,,5,1,2025-01-01,2025-02-01,true\n";
        assert!(matches!(
            parse_import(reordered.as_bytes()),
            Err(AppError::ValidationError(msg)) if msg == "invalid CSV header format"
        ));

        let missing = "code,name,discount,max_usage,valid_from,valid_until,is_active\n";
        assert!(parse_import(missing.as_bytes()).is_err());

        assert!(parse_import(b"").is_err());
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let csv = format!(
            "{HEADER}GOOD1,Good,,10,5,2025-01-01,2025-12-31,true\n\
             BAD1,Bad discount,,ten,5,2025-01-01,2025-12-31,true\n\
             BAD2,Bad usage,,10,many,2025-01-01,2025-12-31,true\n\
             BAD3,Bad date,,10,5,01/01/2025,2025-12-31,true\n\
             BAD4,Short\n\
             GOOD2,Good,,10,5,2025-01-01,2025-12-31\n"
        );
        let parsed = parse_import(csv.as_bytes()).unwrap();

        let codes: Vec<_> = parsed.vouchers.iter().map(|v| v.code.as_str()).collect();
        assert_eq!(codes, ["GOOD1", "GOOD2"]);
        assert_eq!(parsed.skipped.len(), 4);
        assert_eq!(parsed.skipped[0], "Line 3: invalid discount value");
        assert_eq!(parsed.skipped[3], "Line 6: invalid number of columns");
    }

    #[test]
    fn test_is_active_defaults_to_true() {
        let csv = format!(
            "{HEADER}A01,Alpha,,5,1,2025-01-01,2025-02-01,maybe\n\
             A02,Beta,,5,1,2025-01-01,2025-02-01,0\n"
        );
        let parsed = parse_import(csv.as_bytes()).unwrap();
        assert!(parsed.vouchers[0].is_active);
        assert!(!parsed.vouchers[1].is_active);
    }

    #[test]
    fn test_export_header_only_when_empty() {
        let out = write_export(&[]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "code,name,description,discount,max_usage,used_count,valid_from,valid_until,is_active,created_at\n"
        );
    }

    #[test]
    fn test_export_row_format() {
        let out = String::from_utf8(write_export(&[voucher(1, "SAVE12")]).unwrap()).unwrap();
        let row = out.lines().nth(1).unwrap();
        assert_eq!(
            row,
            "SAVE12,SAVE12 name,\"with, comma\",12.50,10,3,2025-01-01 00:00:00,2025-12-31 23:59:59,false,2024-12-01 08:00:00"
        );
    }

    #[test]
    fn test_export_then_import_round_trip() {
        let originals = vec![voucher(2, "SECOND"), voucher(1, "FIRST")];
        let exported = write_export(&originals).unwrap();
        let parsed = parse_import(&exported).unwrap();

        assert!(parsed.skipped.is_empty());
        assert_eq!(parsed.vouchers.len(), originals.len());
        for (original, imported) in originals.iter().zip(&parsed.vouchers) {
            assert_eq!(imported.code, original.code);
            assert_eq!(imported.name, original.name);
            assert_eq!(imported.description, original.description);
            assert_eq!(imported.discount, original.discount);
            assert_eq!(imported.max_usage, original.max_usage);
            assert_eq!(imported.valid_from, original.valid_from);
            assert_eq!(imported.valid_until, original.valid_until);
            assert_eq!(imported.is_active, original.is_active);
        }
    }
}
