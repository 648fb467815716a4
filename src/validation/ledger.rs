/// Ordered record of every automatic correction applied during one run.
///
/// Entries are human-readable, distinct, and kept in the order the fixes happen.
/// A run whose ledger is empty made no change to the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    entries: Vec<String>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, description: impl Into<String>) {
        let description = description.into();
        if self.entries.contains(&description) {
            return;
        }
        tracing::trace!("Fix: {}", description);
        self.entries.push(description);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<String> {
        self.entries
    }
}
