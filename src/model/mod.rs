mod metric;
mod paper;

pub use metric::{Estimation, MetricRecord};
pub use paper::{CitationData, PaperRecord};
