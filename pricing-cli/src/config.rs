//! User settings read from a TOML file.
//!
//! Every section and field is optional; anything missing keeps its default.
//! Rates are written as percentages, the same way they are typed on the
//! command line.
//!
//! ```toml
//! [vat]
//! purchase_percent = 21
//! sale_percent = 10.5
//! bearer = "business_absorbs"   # customer_pays | business_absorbs
//!
//! [payments]
//! processor_percent = 6.29
//!
//! [installments]
//! monthly_inflation_percent = 2.2
//! count = 12
//!
//! [display]
//! currency_symbol = "$"
//! thousands_separator = "."
//! decimal_separator = ","
//!
//! [input]
//! thousands_separator = ","
//! decimal_separator = "."
//! ```

use std::path::{Path, PathBuf};

use pricing_core::VatBearer;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::utils::NumberFormat;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VatSettings {
    pub purchase_percent: Decimal,
    pub sale_percent: Decimal,
    pub bearer: VatBearer,
}

impl Default for VatSettings {
    fn default() -> Self {
        Self {
            purchase_percent: Decimal::from(21),
            sale_percent: Decimal::from(21),
            bearer: VatBearer::CustomerPays,
        }
    }
}

/// Payment-processor commission applied when none is given per computation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentSettings {
    pub processor_percent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallmentSettings {
    pub monthly_inflation_percent: Decimal,
    pub count: u32,
}

impl Default for InstallmentSettings {
    fn default() -> Self {
        Self {
            monthly_inflation_percent: Decimal::new(22, 1),
            count: 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub currency_symbol: String,
    pub thousands_separator: char,
    pub decimal_separator: char,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            currency_symbol: "$".to_string(),
            thousands_separator: NumberFormat::ES_AR.thousands_separator,
            decimal_separator: NumberFormat::ES_AR.decimal_separator,
        }
    }
}

impl DisplaySettings {
    pub fn number_format(&self) -> NumberFormat {
        NumberFormat {
            thousands_separator: self.thousands_separator,
            decimal_separator: self.decimal_separator,
        }
    }
}

/// Separators expected in numeric command-line arguments and CSV text cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    pub thousands_separator: char,
    pub decimal_separator: char,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            thousands_separator: NumberFormat::PLAIN.thousands_separator,
            decimal_separator: NumberFormat::PLAIN.decimal_separator,
        }
    }
}

impl InputSettings {
    pub fn number_format(&self) -> NumberFormat {
        NumberFormat {
            thousands_separator: self.thousands_separator,
            decimal_separator: self.decimal_separator,
        }
    }
}

// =============================================================================
// Settings
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub vat: VatSettings,
    pub payments: PaymentSettings,
    pub installments: InstallmentSettings,
    pub display: DisplaySettings,
    pub input: InputSettings,
}

impl Settings {
    /// Loads settings from `path`, or returns the defaults when no path is
    /// given. A path that was given but cannot be read is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            debug!("no config file given, using defaults");
            return Ok(Self::default());
        };

        info!(path = %path.display(), "loading config file");
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_percent("vat.purchase_percent", self.vat.purchase_percent)?;
        check_percent("vat.sale_percent", self.vat.sale_percent)?;
        check_percent("payments.processor_percent", self.payments.processor_percent)?;

        if self.installments.count == 0 {
            return Err(ConfigError::Invalid {
                field: "installments.count",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.installments.monthly_inflation_percent <= Decimal::from(-100) {
            return Err(ConfigError::Invalid {
                field: "installments.monthly_inflation_percent",
                reason: "must be above -100".to_string(),
            });
        }

        check_separators("display", &self.display.number_format())?;
        check_separators("input", &self.input.number_format())?;
        Ok(())
    }
}

fn check_percent(
    field: &'static str,
    value: Decimal,
) -> Result<(), ConfigError> {
    if value < Decimal::ZERO || value >= Decimal::ONE_HUNDRED {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("must be between 0 and 100, got {value}"),
        });
    }
    Ok(())
}

fn check_separators(
    field: &'static str,
    format: &NumberFormat,
) -> Result<(), ConfigError> {
    let bad = |c: char| c.is_ascii_digit() || c == '-';
    if format.thousands_separator == format.decimal_separator
        || bad(format.thousands_separator)
        || bad(format.decimal_separator)
    {
        return Err(ConfigError::Invalid {
            field,
            reason: format!(
                "separators must differ and not be digits or '-', got '{}' and '{}'",
                format.thousands_separator, format.decimal_separator
            ),
        });
    }
    Ok(())
}
