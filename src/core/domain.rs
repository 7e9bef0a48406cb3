use serde::{Deserialize, Serialize};

// Identifiable defines common traits that can be shared by persistent objects
pub trait Identifiable: Sync + Send {
    fn id(&self) -> String;
    fn version(&self) -> i64;
    fn set_version(&mut self, version: i64);
}

pub const DEFAULT_LOAN_DAYS: i64 = 14;

// Configuration abstracts config options for library system
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct Configuration {
    pub branch_id: String,
    pub book_loan_days: i64,
}

impl Configuration {
    pub fn new(branch_id: &str) -> Self {
        Configuration {
            branch_id: branch_id.to_string(),
            book_loan_days: DEFAULT_LOAN_DAYS,
        }
    }

    // VERDANT_LOAN_DAYS overrides the loan period; non-positive or unparsable values are ignored.
    pub fn from_env(branch_id: &str) -> Self {
        let mut config = Configuration::new(branch_id);
        if let Some(days) = std::env::var("VERDANT_LOAN_DAYS").ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|d| *d > 0) {
            config.book_loan_days = days;
        }
        config
    }

    pub fn with_loan_days(mut self, days: i64) -> Self {
        self.book_loan_days = days;
        self
    }
}
