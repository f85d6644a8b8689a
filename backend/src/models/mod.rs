pub mod hijri;
pub mod request;

pub use hijri::IslamicMonth;
pub use request::{FieldError, ReportRequest};
