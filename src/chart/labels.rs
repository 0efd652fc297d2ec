use super::scale::SampleInterval;

/// Number of labels, and the largest viewport any chart may request.
pub const LABEL_CAPACITY: usize = 1024;

/// Elapsed-time labels for the x axis, oldest first.
///
/// Index `i` reads as `|i - 1023| * interval` seconds ago. Built once and
/// shared by every chart.
#[derive(Debug, Clone)]
pub struct LabelTable {
    labels: Vec<String>,
}

impl LabelTable {
    pub fn new(interval: SampleInterval) -> Self {
        let interval_ms = interval.as_millis_f64();
        let last = (LABEL_CAPACITY - 1) as f64;
        let labels = (0..LABEL_CAPACITY)
            .map(|i| format_offset(((i as f64 - last) * interval_ms / 1000.0).abs()))
            .collect();
        LabelTable { labels }
    }

    /// The newest `n` labels, capped at the table size.
    pub fn suffix(&self, n: usize) -> &[String] {
        let n = n.min(self.labels.len());
        &self.labels[self.labels.len() - n..]
    }
}

/// One decimal place, with a trailing ".0" dropped.
fn format_offset(secs: f64) -> String {
    let formatted = format!("{:.1}", secs);
    match formatted.strip_suffix(".0") {
        Some(whole) => whole.to_string(),
        None => formatted,
    }
}
