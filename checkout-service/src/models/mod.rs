pub mod invoice;
pub mod outcome;

pub use invoice::{
    InvoiceDetails, InvoiceFields, NewListItem, PaymentStatus, StatusFields, StatusUpdate,
};
pub use outcome::ListItemOutcome;
