//! Pagination metadata returned alongside list results.

use serde::Serialize;

/// Page position of a list response. Serializes to `{}` for an empty result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "is_zero")]
    pub current_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub page_size: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub first_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub last_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub total_records: i64,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        *self == Metadata::default()
    }
}

/// Derive metadata for a result window.
pub fn calculate(total_records: i64, page: i64, page_size: i64) -> Metadata {
    if total_records <= 0 {
        return Metadata::default();
    }

    let page_size = page_size.max(1);
    Metadata {
        current_page: page,
        page_size,
        first_page: 1,
        last_page: (total_records + page_size - 1) / page_size,
        total_records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_records_is_empty() {
        for (page, page_size) in [(1, 1), (1, 20), (500, 100), (10_000_000, 7)] {
            let metadata = calculate(0, page, page_size);
            assert!(metadata.is_empty());
            assert_eq!(serde_json::to_string(&metadata).unwrap(), "{}");
        }
    }

    #[test]
    fn test_last_page_is_ceiling() {
        for total in 1..=250_i64 {
            for page_size in [1_i64, 3, 20, 100] {
                let metadata = calculate(total, 1, page_size);
                let expected = (total as f64 / page_size as f64).ceil() as i64;
                assert_eq!(metadata.last_page, expected, "total={total} size={page_size}");
                assert_eq!(metadata.first_page, 1);
                assert_eq!(metadata.total_records, total);
            }
        }
    }

    #[test]
    fn test_serializes_all_fields() {
        let metadata = calculate(45, 2, 20);
        let json = serde_json::to_value(metadata).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "current_page": 2,
                "page_size": 20,
                "first_page": 1,
                "last_page": 3,
                "total_records": 45
            })
        );
    }

    #[test]
    fn test_zero_page_size_does_not_panic() {
        let metadata = calculate(10, 1, 0);
        assert_eq!(metadata.last_page, 10);
    }
}
