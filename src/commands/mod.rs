pub mod analyze;
pub mod classify;
pub mod presets;

pub use analyze::run_analyze;
pub use classify::{classify_and_report, resolve_config, run_classify};
pub use presets::run_presets;
