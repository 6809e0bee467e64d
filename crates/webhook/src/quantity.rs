//! Kubernetes resource quantity parsing.
//!
//! Accelerator resources arrive as quantity strings such as `"1"`, `"500m"`,
//! `"16Gi"` or `"1e3"`. Only the numeric value matters to the webhook, so the
//! parser produces an `f64` rather than an exact decimal.

use error_stack::Report;
use error_stack::ResultExt;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use thiserror::Error;

/// Errors produced while parsing a quantity string.
#[derive(Debug, Error)]
pub enum QuantityError {
    #[error("Invalid quantity value: {value}")]
    InvalidValue { value: String },
    #[error("Unsupported quantity suffix: {suffix}")]
    UnsupportedSuffix { suffix: String },
}

/// Parse a quantity string into its numeric value.
///
/// Supports the following suffixes:
/// - Binary: "Ki", "Mi", "Gi", "Ti", "Pi", "Ei"
/// - Decimal: "n", "u", "m", "", "k", "M", "G", "T", "P", "E"
/// - Decimal exponent: "e<n>" / "E<n>"
///
/// # Errors
///
/// - [`QuantityError::InvalidValue`] if the numeric part is missing or malformed
/// - [`QuantityError::UnsupportedSuffix`] if the suffix is not a known unit
pub fn parse_quantity(value: &str) -> Result<f64, Report<QuantityError>> {
    let value = value.trim();

    let split = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '+' || c == '-'))
        .unwrap_or(value.len());
    let (numeric_part, suffix) = value.split_at(split);

    let numeric_value = numeric_part
        .parse::<f64>()
        .change_context_lazy(|| QuantityError::InvalidValue {
            value: value.to_string(),
        })?;

    let multiplier = match suffix {
        "" => 1.0,
        "n" => 1e-9,
        "u" => 1e-6,
        "m" => 1e-3,
        "k" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        "P" => 1e15,
        "E" => 1e18,
        "Ki" => 1024_f64,
        "Mi" => 1024_f64.powi(2),
        "Gi" => 1024_f64.powi(3),
        "Ti" => 1024_f64.powi(4),
        "Pi" => 1024_f64.powi(5),
        "Ei" => 1024_f64.powi(6),
        exponent if exponent.starts_with(['e', 'E']) => {
            let power = exponent[1..].parse::<i32>().change_context_lazy(|| {
                QuantityError::UnsupportedSuffix {
                    suffix: suffix.to_string(),
                }
            })?;
            10_f64.powi(power)
        }
        _ => {
            return Err(Report::new(QuantityError::UnsupportedSuffix {
                suffix: suffix.to_string(),
            }));
        }
    };

    Ok(numeric_value * multiplier)
}

/// Whether the quantity parses to a strictly positive value.
///
/// Malformed quantities are not positive.
pub fn is_positive(quantity: &Quantity) -> bool {
    parse_quantity(&quantity.0).is_ok_and(|value| value > 0.0)
}

/// Integer value of a quantity, rounded up the way the API server does.
///
/// # Errors
///
/// - [`QuantityError`] if the quantity string cannot be parsed
pub fn integer_value(quantity: &Quantity) -> Result<i64, Report<QuantityError>> {
    let value = parse_quantity(&quantity.0)?;
    Ok(value.ceil() as i64)
}
