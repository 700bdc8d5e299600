use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE_PROGRESS: &str =
    "[{elapsed_precise}] {msg} {spinner:.green} [{wide_bar:.cyan/blue}] {pos}/{len} eta: {eta}";
const TEMPLATE_SPINNER: &str = "[{elapsed_precise}] {msg} {spinner:.green}";

/// Counting bar for the subject loop; a spinner when the length is unknown.
pub fn create_progress_bar_count(quiet_mode: bool, msg: &str, length: Option<u64>) -> ProgressBar {
    let bar = match (quiet_mode, length) {
        (true, _) => ProgressBar::hidden(),
        (false, Some(len)) => ProgressBar::new(len),
        (false, None) => ProgressBar::new_spinner(),
    };

    bar.set_message(msg);
    if length.is_some() {
        bar.set_style(
            ProgressStyle::default_bar()
                .template(TEMPLATE_PROGRESS)
                .progress_chars("=> "),
        );
    } else {
        bar.set_style(ProgressStyle::default_spinner().template(TEMPLATE_SPINNER));
    }

    bar.inc(0); // Just to avoid the drawing after the log.

    bar
}
