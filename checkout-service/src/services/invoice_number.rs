use chrono::{NaiveDate, Utc};
use rand::{distributions::Alphanumeric, Rng};

const SUFFIX_LENGTH: usize = 6;

/// Source of invoice numbers for newly recorded invoices.
pub trait InvoiceNumberGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Generates `{prefix}-{YYYYMMDD}-{suffix}` numbers dated in UTC, with an
/// uppercase alphanumeric suffix.
#[derive(Debug, Clone)]
pub struct DatedInvoiceNumbers {
    prefix: String,
}

impl DatedInvoiceNumbers {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn format(&self, date: NaiveDate, suffix: &str) -> String {
        format!("{}-{}-{}", self.prefix, date.format("%Y%m%d"), suffix)
    }
}

impl Default for DatedInvoiceNumbers {
    fn default() -> Self {
        Self::new("INV")
    }
}

impl InvoiceNumberGenerator for DatedInvoiceNumbers {
    fn generate(&self) -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SUFFIX_LENGTH)
            .map(|b| char::from(b).to_ascii_uppercase())
            .collect();

        self.format(Utc::now().date_naive(), &suffix)
    }
}
