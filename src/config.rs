use crate::record::{PRODUCT_SKU, REVIEW_TYPE};
use std::str::FromStr;

/// What to do with a date column that cannot be read.
///
/// Empty or absent dates always fall back to the epoch; the policy only decides
/// the fate of non-empty values that match none of the accepted formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatePolicy {
    /// Substitute `1970-01-01 00:00:00` and keep the row.
    #[default]
    Epoch,
    /// Skip the row with [`RowError::InvalidDate`](crate::RowError::InvalidDate).
    Reject,
}

impl FromStr for DatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "epoch" => Ok(Self::Epoch),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown date policy '{other}' (expected epoch or reject)")),
        }
    }
}

/// Per-run knobs. `Default` matches the store's CSV export layout.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub delimiter: u8,
    /// Header column holding the product's external reference.
    pub sku_field: String,
    pub date_policy: DatePolicy,
    /// Type tag written on every inserted comment.
    pub review_type: String,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            sku_field: PRODUCT_SKU.to_string(),
            date_policy: DatePolicy::default(),
            review_type: REVIEW_TYPE.to_string(),
        }
    }
}

impl ImportOptions {
    pub fn with_date_policy(mut self, policy: DatePolicy) -> Self {
        self.date_policy = policy;
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}
