//! Remote wire schema and its normalization into canonical records.

use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::remote::{
    ARCHETYPE_SEPARATOR, CIRCLE_CLASS, EXCLUDED_CLASS, LIST_DELIMITER, WIRE_FALSE, WIRE_TRUE,
};
use crate::data::{Named, Record, RecordCollection};
use crate::types::EndpointUrl;

/// One page of the remote catalog.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct WirePage {
    /// Total record count reported by the remote; informational only.
    #[serde(deserialize_with = "null_as_default")]
    pub count: u64,
    /// Link to the following page; absent, null, or empty on the last page.
    pub next: Option<EndpointUrl>,
    #[serde(deserialize_with = "null_as_default")]
    pub results: Vec<WireRecord>,
}

impl WirePage {
    /// The next page link, if pagination should continue.
    pub fn next_link(&self) -> Option<&str> {
        self.next
            .as_deref()
            .map(str::trim)
            .filter(|next| !next.is_empty())
    }
}

/// A record as served by the remote, with list and boolean fields flattened to strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub desc: String,
    #[serde(deserialize_with = "null_as_default")]
    pub higher_level: String,
    #[serde(deserialize_with = "null_as_default")]
    pub range: String,
    /// Comma list, e.g. `V, S, M`.
    #[serde(deserialize_with = "null_as_default")]
    pub components: String,
    #[serde(deserialize_with = "null_as_default")]
    pub material: String,
    /// `yes` or `no`.
    #[serde(deserialize_with = "null_as_default")]
    pub ritual: String,
    #[serde(deserialize_with = "null_as_default")]
    pub duration: String,
    /// `yes` or `no`.
    #[serde(deserialize_with = "null_as_default")]
    pub concentration: String,
    #[serde(deserialize_with = "null_as_default")]
    pub casting_time: String,
    /// Numeric level; the remote also sends a display string under `level`.
    #[serde(deserialize_with = "null_as_default")]
    pub level_int: u8,
    #[serde(deserialize_with = "null_as_default")]
    pub school: String,
    /// Comma list of classes.
    #[serde(deserialize_with = "null_as_default")]
    pub dnd_class: String,
    /// Comma list of `Class: Detail` pairs.
    #[serde(deserialize_with = "null_as_default")]
    pub archetype: String,
    /// Comma list of druid circles.
    #[serde(deserialize_with = "null_as_default")]
    pub circles: String,
}

/// Read an explicit `null` as the field's default instead of failing the page.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Split a comma list into trimmed, non-empty tokens.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(LIST_DELIMITER)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn wire_bool(raw: &str) -> bool {
    raw == WIRE_TRUE
}

fn subclass_name(class: &str, detail: &str) -> String {
    format!("{class} ({detail})")
}

fn subclasses(archetype: &str, circles: &str) -> Vec<Named> {
    let mut entries: Vec<Named> = Vec::new();
    for token in split_list(archetype) {
        let mut parts = token.split(ARCHETYPE_SEPARATOR);
        // tokens without a separator are malformed and dropped
        if let (Some(class), Some(detail)) = (parts.next(), parts.next()) {
            entries.push(Named::new(subclass_name(class, detail)));
        }
    }
    for circle in split_list(circles) {
        let name = subclass_name(CIRCLE_CLASS, &circle);
        // the remote sometimes lists a circle under archetype as well
        if entries.iter().any(|entry| entry.name == name) {
            continue;
        }
        entries.push(Named::new(name));
    }
    entries
}

/// Convert one wire record into the canonical shape.
pub fn normalize_record(wire: &WireRecord) -> Record {
    Record {
        key: wire.slug.clone(),
        name: wire.name.clone(),
        desc: wire.desc.clone(),
        higher_level: wire.higher_level.clone(),
        range: wire.range.clone(),
        components: split_list(&wire.components),
        material: wire.material.clone(),
        ritual: wire_bool(&wire.ritual),
        duration: wire.duration.clone(),
        concentration: wire_bool(&wire.concentration),
        casting_time: wire.casting_time.clone(),
        level: wire.level_int,
        school: Named::new(wire.school.clone()),
        classes: split_list(&wire.dnd_class)
            .into_iter()
            .filter(|class| class != EXCLUDED_CLASS)
            .map(Named::new)
            .collect(),
        subclasses: subclasses(&wire.archetype, &wire.circles),
    }
}

/// Normalize every record of a page, preserving page order.
pub fn normalize_page(records: &[WireRecord]) -> RecordCollection {
    records.iter().map(normalize_record).collect()
}

/// Render a canonical record back to wire form.
///
/// Subclasses are rendered as `archetype` pairs, so `circles` is always empty.
impl From<&Record> for WireRecord {
    fn from(record: &Record) -> Self {
        let join = |items: Vec<&str>| items.join(", ");
        let archetype = record
            .subclasses
            .iter()
            .filter_map(|entry| {
                let (class, rest) = entry.name.split_once(" (")?;
                let detail = rest.strip_suffix(')')?;
                Some(format!("{class}{ARCHETYPE_SEPARATOR}{detail}"))
            })
            .collect::<Vec<_>>()
            .join(", ");
        let flag = |value: bool| (if value { WIRE_TRUE } else { WIRE_FALSE }).to_string();
        Self {
            slug: record.key.clone(),
            name: record.name.clone(),
            desc: record.desc.clone(),
            higher_level: record.higher_level.clone(),
            range: record.range.clone(),
            components: join(record.components.iter().map(String::as_str).collect()),
            material: record.material.clone(),
            ritual: flag(record.ritual),
            duration: record.duration.clone(),
            concentration: flag(record.concentration),
            casting_time: record.casting_time.clone(),
            level_int: record.level,
            school: record.school.name.clone(),
            dnd_class: join(record.classes.iter().map(|class| class.name.as_str()).collect()),
            archetype,
            circles: String::new(),
        }
    }
}
