use serde::{Deserialize, Serialize};

pub use crate::types::RecordKey;

/// A single-field `{name}` tuple used for schools and affiliations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Named {
    pub name: String,
}

impl Named {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Canonical catalog record, as stored in local and cached collection files.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    /// Stable slug; sort and merge key. Equal keys are the same logical spell.
    pub key: RecordKey,
    pub name: String,
    pub desc: String,
    pub higher_level: String,
    pub range: String,
    /// Component codes such as `V`, `S`, `M`.
    pub components: Vec<String>,
    pub material: String,
    pub ritual: bool,
    pub duration: String,
    pub concentration: bool,
    pub casting_time: String,
    /// Spell level; `0` for cantrips.
    pub level: u8,
    pub school: Named,
    /// Affiliations (classes able to cast the spell).
    pub classes: Vec<Named>,
    /// Sub-affiliations rendered as `Class (Detail)`.
    pub subclasses: Vec<Named>,
}

impl Record {
    /// True when `key` is non-blank; keyless records cannot be sorted or merged.
    pub fn has_key(&self) -> bool {
        !self.key.trim().is_empty()
    }
}

/// Records ordered ascending by `key`.
pub type RecordCollection = Vec<Record>;

/// True when `records` is ascending (non-strictly) by `key`.
pub fn is_sorted_by_key(records: &[Record]) -> bool {
    records.windows(2).all(|pair| pair[0].key <= pair[1].key)
}

/// Sort `records` ascending by `key` unless they already are.
///
/// The sort is stable, so records sharing a key keep their relative order.
pub fn sort_by_key(records: &mut [Record]) {
    if !is_sorted_by_key(records) {
        records.sort_by(|left, right| left.key.cmp(&right.key));
    }
}
