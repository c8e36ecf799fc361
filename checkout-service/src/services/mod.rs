pub mod graph;
pub mod invoice_number;
pub mod metrics;
pub mod rapyd;
pub mod sharepoint;

pub use graph::{GraphClient, GraphError, GraphRequest, HttpGraphClient};
pub use invoice_number::{DatedInvoiceNumbers, InvoiceNumberGenerator};
pub use metrics::CheckoutMetrics;
pub use rapyd::{CheckoutError, CheckoutProvider, RapydClient};
pub use sharepoint::{SharePointClient, SharePointError};
