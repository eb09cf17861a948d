//! Envelope codec
//!
//! Converts between a registry's exported tables and the textual wire
//! envelope shared with the backend. The envelope is a JSON document with
//! exactly two top-level fields:
//!
//! ```json
//! {
//!   "version": "42",
//!   "tables": {
//!     "WeaponConfig": { "1": { "name": "sword", "damage": 10 } }
//!   }
//! }
//! ```
//!
//! Each table is tagged with a stable type tag so the decoder can rebuild the
//! concrete record type without an external schema. The codec only knows how
//! to do that for types registered with [`EnvelopeCodec::register`]; every
//! other type must be declared excluded, and there is no third option.
//! Enum fields ride as their symbolic variant name, never an ordinal, so
//! reordering variants across versions cannot corrupt serialized data.

use std::any::{self, TypeId};
use std::collections::{BTreeMap, HashMap, HashSet};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, Result};
use crate::registry::ConfigRegistry;
use crate::table::{ConfigTable, ErasedTable};

/// Declared set of config types omitted from the envelope
///
/// Exclusion affects serialization only; excluded types are stored and looked
/// up like any other. Only the codec consults this set.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    types: HashSet<TypeId>,
}

impl ExclusionSet {
    /// Create an empty exclusion set
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `T` excluded from the envelope
    pub fn exclude<T: 'static>(mut self) -> Self {
        self.types.insert(TypeId::of::<T>());
        self
    }

    /// Whether `T` is excluded
    pub fn contains<T: 'static>(&self) -> bool {
        self.types.contains(&TypeId::of::<T>())
    }

    fn contains_id(&self, type_id: &TypeId) -> bool {
        self.types.contains(type_id)
    }
}

/// JSON layout of the envelope
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: String,
    tables: BTreeMap<String, serde_json::Value>,
}

type EncodeFn = fn(&ErasedTable) -> Result<serde_json::Value>;
type DecodeFn = fn(serde_json::Value) -> Result<ErasedTable>;

/// Per-type codec binding: monomorphized encode/decode for one record type
struct TypeBinding {
    encode: EncodeFn,
    decode: DecodeFn,
}

/// JSON output layout for encoded envelopes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Compact,
    Pretty,
}

/// Record counts per table, as reported by [`EnvelopeCodec::inspect`]
#[derive(Debug, Clone)]
pub struct EnvelopeInfo {
    /// Version after the decimal parse, zero fallback included
    pub version: u64,
    /// The raw version label as it appears on the wire
    pub version_label: String,
    /// `(type tag, record count)` per table, sorted by tag
    pub tables: Vec<(String, usize)>,
}

/// Codec between a [`ConfigRegistry`] and the wire envelope
pub struct EnvelopeCodec {
    by_tag: HashMap<String, TypeBinding>,
    tags_by_type: HashMap<TypeId, String>,
    exclusions: ExclusionSet,
    output_format: OutputFormat,
}

impl EnvelopeCodec {
    /// Create a codec with no bindings and nothing excluded
    pub fn new() -> Self {
        Self {
            by_tag: HashMap::new(),
            tags_by_type: HashMap::new(),
            exclusions: ExclusionSet::new(),
            output_format: OutputFormat::Compact,
        }
    }

    /// Set the declared exclusion set
    pub fn with_exclusions(mut self, exclusions: ExclusionSet) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Set the JSON output layout used by [`encode`](Self::encode)
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Bind `T` to a stable wire tag
    ///
    /// The tag is what identifies `T`'s table inside the envelope, so it must
    /// stay stable across releases on both sides of the wire. Fails with
    /// [`ConfigError::DuplicateTypeRegistration`] if either the tag or `T`
    /// is already bound.
    pub fn register<T>(&mut self, tag: impl Into<String>) -> Result<()>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let tag = tag.into();
        if self.by_tag.contains_key(&tag) || self.tags_by_type.contains_key(&TypeId::of::<T>()) {
            return Err(ConfigError::DuplicateTypeRegistration {
                type_name: any::type_name::<T>().to_string(),
            });
        }

        self.tags_by_type.insert(TypeId::of::<T>(), tag.clone());
        self.by_tag.insert(
            tag,
            TypeBinding {
                encode: encode_table::<T>,
                decode: decode_table::<T>,
            },
        );
        Ok(())
    }

    /// Encode a registry's tables under the given version label
    ///
    /// Excluded types are omitted entirely, with no placeholder. A
    /// non-excluded type without a binding fails with
    /// [`ConfigError::UnserializableType`].
    pub fn encode(&self, registry: &ConfigRegistry, version_label: &str) -> Result<String> {
        let mut tables = BTreeMap::new();

        for (type_id, table) in registry.export_all() {
            if self.exclusions.contains_id(type_id) {
                continue;
            }

            let tag = self.tags_by_type.get(type_id).ok_or_else(|| {
                ConfigError::UnserializableType {
                    type_tag: table.type_name().to_string(),
                }
            })?;
            let binding = &self.by_tag[tag];
            tables.insert(tag.clone(), (binding.encode)(table)?);
        }

        let envelope = Envelope {
            version: version_label.to_string(),
            tables,
        };

        Ok(match self.output_format {
            OutputFormat::Compact => serde_json::to_string(&envelope)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(&envelope)?,
        })
    }

    /// Decode an envelope into a version and a table mapping
    ///
    /// Every tag in the envelope must have a binding; an unknown tag fails
    /// with [`ConfigError::UnserializableType`]. The returned mapping is
    /// ready for [`ConfigRegistry::update_to`].
    pub fn decode(&self, text: &str) -> Result<(u64, HashMap<TypeId, ErasedTable>)> {
        let envelope: Envelope = serde_json::from_str(text)?;
        let version = parse_version_label(&envelope.version);

        let mut mapping = HashMap::with_capacity(envelope.tables.len());
        for (tag, payload) in envelope.tables {
            let binding = self
                .by_tag
                .get(&tag)
                .ok_or(ConfigError::UnserializableType { type_tag: tag })?;
            let table = (binding.decode)(payload)?;
            mapping.insert(table.type_id(), table);
        }

        Ok((version, mapping))
    }

    /// Decode an envelope and apply it to the registry in one step
    pub fn apply(&self, registry: &mut ConfigRegistry, text: &str) -> Result<()> {
        let (version, mapping) = self.decode(text)?;
        registry.update_to(version, mapping);
        Ok(())
    }

    /// Summarize an envelope without decoding any table
    ///
    /// Needs no bindings, so it works on envelopes carrying unknown types.
    pub fn inspect(text: &str) -> Result<EnvelopeInfo> {
        let envelope: Envelope = serde_json::from_str(text)?;
        let tables = envelope
            .tables
            .iter()
            .map(|(tag, payload)| {
                let count = payload.as_object().map(|o| o.len()).unwrap_or(0);
                (tag.clone(), count)
            })
            .collect();

        Ok(EnvelopeInfo {
            version: parse_version_label(&envelope.version),
            version_label: envelope.version,
            tables,
        })
    }
}

impl Default for EnvelopeCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the wire version label as a base-10 unsigned integer
///
/// Unparsable labels fall back to 0 instead of erroring. That matches the
/// behavior remote peers already rely on, so it is preserved here; the warn
/// event is the only signal callers get.
fn parse_version_label(label: &str) -> u64 {
    match label.parse::<u64>() {
        Ok(version) => version,
        Err(_) => {
            warn!(label, "unparsable envelope version label, falling back to 0");
            0
        }
    }
}

fn encode_table<T: Serialize + 'static>(table: &ErasedTable) -> Result<serde_json::Value> {
    let table = table
        .downcast_ref::<T>()
        .ok_or_else(|| ConfigError::UnserializableType {
            type_tag: any::type_name::<T>().to_string(),
        })?;
    Ok(serde_json::to_value(table.records())?)
}

fn decode_table<T>(payload: serde_json::Value) -> Result<ErasedTable>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    let records: HashMap<i32, T> = serde_json::from_value(payload)?;
    Ok(ErasedTable::new(ConfigTable::from_map(records)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    enum Rarity {
        Common,
        Rare,
        Legendary,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct WeaponConfig {
        id: i32,
        name: String,
        rarity: Rarity,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct LevelConfig {
        id: i32,
        xp_required: u64,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct DebugOverrides {
        god_mode: bool,
    }

    fn codec() -> EnvelopeCodec {
        let mut codec =
            EnvelopeCodec::new().with_exclusions(ExclusionSet::new().exclude::<DebugOverrides>());
        codec.register::<WeaponConfig>("WeaponConfig").unwrap();
        codec.register::<LevelConfig>("LevelConfig").unwrap();
        codec
    }

    fn populated_registry() -> ConfigRegistry {
        let mut registry = ConfigRegistry::new();
        registry
            .add_many(
                |w: &WeaponConfig| w.id,
                vec![
                    WeaponConfig { id: 1, name: "sword".into(), rarity: Rarity::Common },
                    WeaponConfig { id: 2, name: "excalibur".into(), rarity: Rarity::Legendary },
                ],
            )
            .unwrap();
        registry
            .add_many(
                |l: &LevelConfig| l.id,
                vec![
                    LevelConfig { id: 1, xp_required: 100 },
                    LevelConfig { id: 2, xp_required: 250 },
                ],
            )
            .unwrap();
        registry
            .add_singleton(DebugOverrides { god_mode: true })
            .unwrap();
        registry
    }

    #[test]
    fn test_roundtrip_skips_excluded_type() {
        let codec = codec();
        let registry = populated_registry();

        let text = codec.encode(&registry, "42").unwrap();
        assert!(!text.contains("god_mode"));

        let (version, mapping) = codec.decode(&text).unwrap();
        assert_eq!(version, 42);
        assert_eq!(mapping.len(), 2);

        let mut decoded = ConfigRegistry::new();
        decoded.update_to(version, mapping);

        assert_eq!(decoded.get::<WeaponConfig>(2).unwrap().name, "excalibur");
        assert_eq!(decoded.get::<LevelConfig>(2).unwrap().xp_required, 250);
        assert!(decoded.get_all::<DebugOverrides>().is_empty());
    }

    #[test]
    fn test_enum_encoded_by_symbolic_name() {
        let codec = codec();
        let registry = populated_registry();

        let text = codec.encode(&registry, "1").unwrap();
        assert!(text.contains("\"Legendary\""));
        assert!(text.contains("\"Common\""));

        let (_, mapping) = codec.decode(&text).unwrap();
        let mut decoded = ConfigRegistry::new();
        decoded.update_to(1, mapping);
        assert_eq!(decoded.get::<WeaponConfig>(2).unwrap().rarity, Rarity::Legendary);
    }

    #[test]
    fn test_unregistered_type_fails_encode() {
        // No exclusion set, so DebugOverrides has to be representable.
        let mut codec = EnvelopeCodec::new();
        codec.register::<WeaponConfig>("WeaponConfig").unwrap();
        codec.register::<LevelConfig>("LevelConfig").unwrap();

        let registry = populated_registry();
        let result = codec.encode(&registry, "1");
        assert!(matches!(result, Err(ConfigError::UnserializableType { .. })));
    }

    #[test]
    fn test_unknown_tag_fails_decode() {
        let codec = codec();
        let text = r#"{"version":"1","tables":{"UnknownConfig":{"0":{}}}}"#;
        let result = codec.decode(text);
        assert!(matches!(
            result,
            Err(ConfigError::UnserializableType { ref type_tag }) if type_tag == "UnknownConfig"
        ));
    }

    #[test]
    fn test_unparsable_version_falls_back_to_zero() {
        let codec = codec();
        let registry = populated_registry();

        let text = codec.encode(&registry, "not-a-number").unwrap();
        let mut decoded = ConfigRegistry::new();
        decoded.set_version(99);
        codec.apply(&mut decoded, &text).unwrap();

        assert_eq!(decoded.version(), 0);
    }

    #[test]
    fn test_duplicate_binding_registration() {
        let mut codec = EnvelopeCodec::new();
        codec.register::<WeaponConfig>("WeaponConfig").unwrap();

        // Same type under a new tag.
        let same_type = codec.register::<WeaponConfig>("Weapons");
        assert!(matches!(
            same_type,
            Err(ConfigError::DuplicateTypeRegistration { .. })
        ));

        // Same tag for a new type.
        let same_tag = codec.register::<LevelConfig>("WeaponConfig");
        assert!(matches!(
            same_tag,
            Err(ConfigError::DuplicateTypeRegistration { .. })
        ));
    }

    #[test]
    fn test_inspect_without_bindings() {
        let codec = codec();
        let registry = populated_registry();
        let text = codec.encode(&registry, "17").unwrap();

        let info = EnvelopeCodec::inspect(&text).unwrap();
        assert_eq!(info.version, 17);
        assert_eq!(info.version_label, "17");
        assert_eq!(
            info.tables,
            vec![("LevelConfig".to_string(), 2), ("WeaponConfig".to_string(), 2)]
        );
    }

    #[test]
    fn test_parse_version_label() {
        assert_eq!(parse_version_label("42"), 42);
        assert_eq!(parse_version_label("0"), 0);
        assert_eq!(parse_version_label("not-a-number"), 0);
        assert_eq!(parse_version_label(""), 0);
        assert_eq!(parse_version_label("-3"), 0);
    }

    #[test]
    fn test_pretty_output_format() {
        let codec = codec().with_output_format(OutputFormat::Pretty);
        let registry = populated_registry();

        let text = codec.encode(&registry, "1").unwrap();
        assert!(text.contains('\n'));

        let (version, mapping) = codec.decode(&text).unwrap();
        assert_eq!(version, 1);
        assert_eq!(mapping.len(), 2);
    }
}
