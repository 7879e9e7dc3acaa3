/// Unique, stable record slug used as the sort and merge key.
/// Examples: `acid-arrow`, `cone-of-cold`
pub type RecordKey = String;
/// Human label for a configured source.
/// Examples: `custom spells`, `remote spells`
pub type SourceName = String;
/// Remote endpoint or page URL.
/// Example: `https://api.open5e.com/spells/?page=2`
pub type EndpointUrl = String;
/// Text written to the durable event log.
/// Example: `Loaded 321 records for remote spells from /home/u/.config/litch/cache/spells.json`
pub type LogMessage = String;
/// Short human-readable status forwarded to the presentation layer.
/// Examples: `Loading spells...`, `Caching remote spells...`, `Done`
pub type StatusText = String;
