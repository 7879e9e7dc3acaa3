//! Headless browsing state fed by delivered catalog snapshots.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::data::{Record, RecordCollection};
use crate::errors::CatalogError;
use crate::event::{EventReporter, Severity};
use crate::pipeline::CatalogSnapshot;
use crate::types::StatusText;

/// Input line mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputMode {
    /// Typing filters the list.
    #[default]
    Normal,
    /// Typing enters a command.
    Command,
}

impl InputMode {
    /// Mode for a numeric code, if the code is known.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Normal),
            1 => Some(Self::Command),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Command => 1,
        }
    }

    /// Prompt shown in front of the input line.
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "> ",
            Self::Command => ": ",
        }
    }
}

/// Consumer-side state: the latest catalog, status line, filter, and input mode.
pub struct BrowserSession {
    records: RecordCollection,
    fetched_at: Option<DateTime<Utc>>,
    status: StatusText,
    filter: String,
    input_mode: InputMode,
    reporter: Arc<EventReporter>,
}

impl BrowserSession {
    pub fn new(reporter: Arc<EventReporter>) -> Self {
        Self {
            records: Vec::new(),
            fetched_at: None,
            status: StatusText::new(),
            filter: String::new(),
            input_mode: InputMode::default(),
            reporter,
        }
    }

    /// Replace the catalog with a delivered snapshot and clear the fetching status.
    pub fn apply_snapshot(&mut self, snapshot: CatalogSnapshot) {
        self.records = snapshot.records;
        self.fetched_at = Some(snapshot.fetched_at);
        self.status.clear();
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<StatusText>) {
        self.status = status.into();
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    /// Switch input mode by code.
    ///
    /// Unknown codes are reported and rejected; the current mode is kept.
    pub fn set_input_mode_code(&mut self, code: u8) -> Result<InputMode, CatalogError> {
        match InputMode::from_code(code) {
            Some(mode) => {
                self.input_mode = mode;
                Ok(mode)
            }
            None => {
                let err = CatalogError::Configuration(format!("Selected invalid mode: {code}"));
                self.reporter.register(
                    Severity::Error,
                    &err.to_string(),
                    "Error while trying to switch modes, check logs",
                );
                Err(err)
            }
        }
    }

    /// Records whose name contains the filter, ignoring case, in catalog order.
    pub fn visible_records(&self) -> Vec<&Record> {
        let needle = self.filter.to_lowercase();
        self.records
            .iter()
            .filter(|record| record.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// `shown/total` counter for the list title.
    pub fn list_title(&self) -> String {
        format!("{}/{}", self.visible_records().len(), self.records.len())
    }
}

/// List entry for `record`: level and name, with `C`/`R` markers right-aligned to `width`.
///
/// Markers are omitted when fewer than three columns would remain for padding.
pub fn list_label(record: &Record, width: usize) -> String {
    let mut label = format!("{} {}", record.level, record.name);
    let markers: String = [(record.concentration, 'C'), (record.ritual, 'R')]
        .into_iter()
        .filter_map(|(set, marker)| set.then_some(marker))
        .collect();
    if markers.is_empty() {
        return label;
    }
    let pad = width.saturating_sub(label.chars().count());
    if pad >= 3 {
        label.push_str(&" ".repeat(pad - markers.len()));
        label.push_str(&markers);
    }
    label
}
