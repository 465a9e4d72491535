//! Query parameters shared by several endpoints

use chrono::NaiveDate;
use serde::Deserialize;

use crate::errors::{AppError, AppResult};
use crate::utils::datetime::DateTimeParser;

/// `?start=YYYY-MM-DD&end=YYYY-MM-DD`, both optional and inclusive
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateRangeParams {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl DateRangeParams {
    pub fn parse(&self) -> AppResult<(Option<NaiveDate>, Option<NaiveDate>)> {
        Ok((parse_bound(self.start.as_deref())?, parse_bound(self.end.as_deref())?))
    }
}

fn parse_bound(value: Option<&str>) -> AppResult<Option<NaiveDate>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => DateTimeParser::parse_date(raw)
            .map(Some)
            .map_err(|e| AppError::validation(e.to_string())),
        None => Ok(None),
    }
}

/// `?hidden=true|false`, defaulting to visible videos
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoFilterParams {
    #[serde(default)]
    pub hidden: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_range() {
        let params = DateRangeParams {
            start: Some("2025-01-01".to_string()),
            end: Some(String::new()),
        };
        let (start, end) = params.parse().unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(end, None);
    }

    #[test]
    fn test_invalid_date_is_validation_error() {
        let params = DateRangeParams {
            start: Some("01/02/2025".to_string()),
            end: None,
        };
        assert!(matches!(params.parse(), Err(AppError::Validation { .. })));
    }
}
