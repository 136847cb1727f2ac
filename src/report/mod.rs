//! Income and expense reports over a recent time window.

mod aggregation;
mod endpoint;
mod format;
mod pdf;

pub use aggregation::{
    CategoryBreakdown, Report, ReportPeriod, ReportSummary, ReportWindow, TransactionRow,
    build_report,
};
pub use endpoint::{
    ReportQuery, ReportState, generate_report, get_report_endpoint, get_report_pdf_endpoint,
};
pub use format::{MAX_DESCRIPTION_GRAPHEMES, format_currency, format_date, truncate_description};
pub use pdf::render_pdf;
