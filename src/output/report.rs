use crate::engine::ExtractedRecord;
use crate::SentinelError;

/// Tally of one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// URLs that produced a record, with or without a price
    pub succeeded: usize,
    /// URLs whose pipeline run failed
    pub failed: usize,
    /// Successful URLs whose page had no readable price
    pub missing_price: usize,
    /// `(url, error message)` for each failure, in processing order
    pub failures: Vec<(String, String)>,
}

impl BatchReport {
    pub fn record_success(&mut self, record: &ExtractedRecord) {
        self.succeeded += 1;
        if record.price.is_none() {
            self.missing_price += 1;
        }
    }

    pub fn record_failure(&mut self, url: &str, error: &SentinelError) {
        self.failed += 1;
        self.failures.push((url.to_string(), error.to_string()));
    }

    /// URLs processed so far
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}
