use crate::utils::error::{HoneycombError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(HoneycombError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(HoneycombError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(HoneycombError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(HoneycombError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(HoneycombError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// 請求欄位：必須是有限且大於零的數值
pub fn validate_positive_f64(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(HoneycombError::validation(
            field_name,
            format!("must be a finite number greater than 0 (got {})", value),
        ));
    }
    Ok(())
}

pub fn validate_non_negative_f64(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(HoneycombError::validation(
            field_name,
            format!("must be a finite number >= 0 (got {})", value),
        ));
    }
    Ok(())
}

pub fn validate_unit_interval(field_name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(HoneycombError::validation(
            field_name,
            format!("must be between 0 and 1 (got {})", value),
        ));
    }
    Ok(())
}

/// 選項列表不可為空，且每個值都必須大於零
pub fn validate_options(field_name: &str, values: &[f64]) -> Result<()> {
    if values.is_empty() {
        return Err(HoneycombError::validation(
            field_name,
            "at least one option is required",
        ));
    }
    for (i, value) in values.iter().enumerate() {
        validate_positive_f64(&format!("{}[{}]", field_name, i), *value)?;
    }
    Ok(())
}

/// job_id 會成為儲存路徑的第一段，不允許跳脫到其他目錄
pub fn validate_job_id(field_name: &str, job_id: &str) -> Result<()> {
    if job_id.trim().is_empty() {
        return Err(HoneycombError::validation(field_name, "cannot be empty"));
    }
    if job_id.starts_with('/') || job_id.contains('\\') || job_id.contains('\0') {
        return Err(HoneycombError::validation(
            field_name,
            "must be a relative path without backslashes",
        ));
    }
    if job_id.split('/').any(|segment| segment == ".." || segment == ".") {
        return Err(HoneycombError::validation(
            field_name,
            "cannot contain '.' or '..' segments",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("supabase_url", "https://example.supabase.co").is_ok());
        assert!(validate_url("supabase_url", "http://localhost:54321").is_ok());
        assert!(validate_url("supabase_url", "").is_err());
        assert!(validate_url("supabase_url", "invalid-url").is_err());
        assert!(validate_url("supabase_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("port", 10000, 1).is_ok());
        assert!(validate_positive_number("port", 0, 1).is_err());
    }

    #[test]
    fn test_validate_options() {
        assert!(validate_options("cell_size_um_options", &[50.0, 75.5]).is_ok());
        assert!(validate_options("cell_size_um_options", &[]).is_err());
        assert!(validate_options("cell_size_um_options", &[50.0, 0.0]).is_err());
        assert!(validate_options("cell_size_um_options", &[f64::NAN]).is_err());
    }

    #[test]
    fn test_validate_job_id() {
        assert!(validate_job_id("job_id", "job-123").is_ok());
        assert!(validate_job_id("job_id", "user/job-123").is_ok());
        assert!(validate_job_id("job_id", "").is_err());
        assert!(validate_job_id("job_id", "/etc").is_err());
        assert!(validate_job_id("job_id", "../secrets").is_err());
        assert!(validate_job_id("job_id", "a\\b").is_err());
    }

    #[test]
    fn test_validate_unit_interval() {
        assert!(validate_unit_interval("jitter_strength", 0.0).is_ok());
        assert!(validate_unit_interval("jitter_strength", 1.0).is_ok());
        assert!(validate_unit_interval("jitter_strength", 1.5).is_err());
        assert!(validate_unit_interval("jitter_strength", f64::NAN).is_err());
    }
}
