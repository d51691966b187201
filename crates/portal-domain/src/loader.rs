use crate::domain::Domain;
use crate::types::{DomainError, DomainSettings};
use tracing::{debug, error, warn};

/// Split a list of descriptors separated by commas or newlines
pub fn split_descriptors(raw: &str) -> Vec<String> {
    raw.split([',', '\n'])
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// A descriptor that could not be turned into a [`Domain`]
#[derive(Debug)]
pub struct LoadFailure {
    /// Position of the descriptor in the input
    pub index: usize,
    pub error: DomainError,
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub domains: Vec<Domain>,
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.domains.iter().all(|d| d.diagnostics().is_empty())
    }
}

/// Parse every descriptor; a bad entry is reported and skipped
pub fn load_domains<I, S>(descriptors: I, settings: &DomainSettings) -> LoadReport
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut report = LoadReport::default();

    for (index, descriptor) in descriptors.into_iter().enumerate() {
        match Domain::parse(descriptor.as_ref(), settings) {
            Ok(domain) => {
                for diagnostic in domain.diagnostics() {
                    warn!(domain = %domain.name(), "Error: {}", diagnostic);
                }
                debug!(domain = %domain.name(), stage = ?domain.stage(), "Loaded domain");
                report.domains.push(domain);
            }
            Err(e) => {
                // The descriptor may carry credentials, only its position is logged
                error!(index, error = %e, "Skipping invalid domain descriptor");
                report.failures.push(LoadFailure { index, error: e });
            }
        }
    }

    report
}
