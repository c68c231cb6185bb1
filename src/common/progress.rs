use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner for stages of unknown length (citation streaming)
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .expect("Failed to create progress style"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Bar over a known number of items, e.g. rule tables to write
pub fn create_count_progress_bar(total_items: u64, unit: &str) -> ProgressBar {
    let pb = ProgressBar::new(total_items);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:30.cyan/blue}}] {{pos}}/{{len}} {} {{msg}}",
                unit
            ))
            .expect("Failed to create progress style")
            .progress_chars("#>-"),
    );
    pb
}
