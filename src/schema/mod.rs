// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Logic for parsing and interacting with schemas in Avro format.

mod name;
mod parser;
mod record;
mod resolve;
mod union;

pub use crate::schema::{
    name::{Alias, Aliases, Name, Names, Namespace},
    record::{RecordField, RecordSchema},
    resolve::ResolvedSchema,
    union::UnionSchema,
};
pub(crate) use crate::schema::resolve::{dereference, resolve_names};
use crate::{
    AvroResult,
    error::Details,
    rabin::Rabin,
    schema::parser::Parser,
};
use digest::Digest;
use serde::{Serialize, Serializer, ser::SerializeMap, ser::SerializeSeq};
use serde_json::{Map, Value as JsonValue};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use strum_macros::{Display, EnumDiscriminants};

/// Represents documentation for complex Avro schemas.
pub type Documentation = Option<String>;

/// Represents an Avro schema fingerprint.
///
/// More information about Avro schema fingerprints can be found in the
/// [Avro Schema Fingerprint documentation](https://avro.apache.org/docs/++version++/specification/#schema-fingerprints)
pub struct SchemaFingerprint {
    pub bytes: Vec<u8>,
}

impl fmt::Display for SchemaFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for byte in &self.bytes {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Represents any valid Avro schema.
///
/// More information about Avro schemas can be found in the
/// [Avro Specification](https://avro.apache.org/docs/++version++/specification/#schema-declaration)
#[derive(Clone, Debug, EnumDiscriminants, Display)]
#[strum_discriminants(name(SchemaKind), derive(Hash, Ord, PartialOrd, Display))]
pub enum Schema {
    /// A `null` Avro schema.
    Null,
    /// A `boolean` Avro schema.
    Boolean,
    /// An `int` Avro schema.
    Int,
    /// A `long` Avro schema.
    Long,
    /// A `float` Avro schema.
    Float,
    /// A `double` Avro schema.
    Double,
    /// A `bytes` Avro schema.
    ///
    /// `Bytes` represents a sequence of 8-bit unsigned bytes.
    Bytes,
    /// A `string` Avro schema.
    ///
    /// `String` represents a unicode character sequence.
    String,
    /// An `array` Avro schema.
    ///
    /// All items will have the same schema.
    Array(ArraySchema),
    /// A `map` Avro schema.
    ///
    /// Keys are always a `Schema::String` and all values will have the same schema.
    Map(MapSchema),
    /// A `union` Avro schema.
    Union(UnionSchema),
    /// A `record` Avro schema.
    Record(RecordSchema),
    /// An `enum` Avro schema.
    Enum(EnumSchema),
    /// A `fixed` Avro schema.
    Fixed(FixedSchema),
    /// A reference to another named schema, by fullname.
    ///
    /// Produced by the parser both for textual references to previously
    /// defined types and for recursive references to a record from within its
    /// own definition. Resolved through a [`Names`] registry.
    Ref { name: Name },
}

/// A description of an Array schema.
#[derive(Clone, Debug)]
pub struct ArraySchema {
    /// The schema of the array items
    pub items: Box<Schema>,
    /// The custom attributes of the schema
    pub attributes: BTreeMap<String, JsonValue>,
}

/// A description of a Map schema.
#[derive(Clone, Debug)]
pub struct MapSchema {
    /// The schema of the map values
    pub values: Box<Schema>,
    /// The custom attributes of the schema
    pub attributes: BTreeMap<String, JsonValue>,
}

/// A description of an Enum schema.
#[derive(Clone, Debug)]
pub struct EnumSchema {
    /// The name of the schema
    pub name: Name,
    /// The aliases of the schema
    pub aliases: Aliases,
    /// The documentation of the schema
    pub doc: Documentation,
    /// The ordered set of symbols of the schema
    pub symbols: Vec<String>,
    /// The custom attributes of the schema
    pub attributes: BTreeMap<String, JsonValue>,
}

/// A description of a Fixed schema.
#[derive(Clone, Debug)]
pub struct FixedSchema {
    /// The name of the schema
    pub name: Name,
    /// The aliases of the schema
    pub aliases: Aliases,
    /// The documentation of the schema
    pub doc: Documentation,
    /// The exact number of bytes of the fixed schema.
    ///
    /// A size of zero is legal: such a datum occupies no bytes on the wire.
    pub size: usize,
    /// The custom attributes of the schema
    pub attributes: BTreeMap<String, JsonValue>,
}

impl SchemaKind {
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            SchemaKind::Null
                | SchemaKind::Boolean
                | SchemaKind::Int
                | SchemaKind::Long
                | SchemaKind::Double
                | SchemaKind::Float
                | SchemaKind::Bytes
                | SchemaKind::String,
        )
    }
}

impl PartialEq for Schema {
    /// Assess equality of two `Schema` based on [Parsing Canonical Form].
    ///
    /// [Parsing Canonical Form]:
    /// https://avro.apache.org/docs/++version++/specification/#parsing-canonical-form-for-schemas
    fn eq(&self, other: &Self) -> bool {
        self.canonical_form() == other.canonical_form()
    }
}

impl Schema {
    /// Converts `self` into its [Parsing Canonical Form].
    ///
    /// [Parsing Canonical Form]:
    /// https://avro.apache.org/docs/++version++/specification/#parsing-canonical-form-for-schemas
    pub fn canonical_form(&self) -> String {
        let json = serde_json::to_value(self)
            .unwrap_or_else(|e| panic!("Cannot convert Schema to JSON: {e}"));
        let mut defined_names = HashSet::new();
        parsing_canonical_form(&json, &mut defined_names)
    }

    /// Generate the [fingerprint] of the schema's [Parsing Canonical Form].
    ///
    /// The fingerprint is computed from the canonical form on every call;
    /// parsed schemas are immutable, so callers that use fingerprints as
    /// equality keys may cache the result freely.
    ///
    /// # Example
    /// ```
    /// use avro_projector::{Schema, Error, rabin::Rabin};
    /// use sha2::Sha256;
    ///
    /// fn main() -> Result<(), Error> {
    ///     let raw_schema = r#"
    ///         {
    ///             "type": "record",
    ///             "name": "test",
    ///             "fields": [
    ///                 {"name": "a", "type": "long", "default": 42},
    ///                 {"name": "b", "type": "string"}
    ///             ]
    ///         }
    ///     "#;
    ///     let schema = Schema::parse_str(raw_schema)?;
    ///     println!("{}", schema.fingerprint::<Sha256>());
    ///     println!("{}", schema.fingerprint::<Rabin>());
    ///     Ok(())
    /// }
    /// ```
    ///
    /// [Parsing Canonical Form]:
    /// https://avro.apache.org/docs/++version++/specification/#parsing-canonical-form-for-schemas
    /// [fingerprint]:
    /// https://avro.apache.org/docs/++version++/specification/#schema-fingerprints
    pub fn fingerprint<D: Digest>(&self) -> SchemaFingerprint {
        let mut d = D::new();
        d.update(self.canonical_form());
        SchemaFingerprint {
            bytes: d.finalize().to_vec(),
        }
    }

    /// The 64-bit CRC-64-AVRO (Rabin) fingerprint of the canonical form.
    ///
    /// This is the fingerprint this crate treats as the schema's identity.
    pub fn rabin_fingerprint(&self) -> u64 {
        let mut hasher = Rabin::default();
        digest::Update::update(&mut hasher, self.canonical_form().as_bytes());
        hasher.as_u64()
    }

    /// Create a `Schema` from a string representing a JSON Avro schema.
    pub fn parse_str(input: &str) -> AvroResult<Schema> {
        let mut parser = Parser::new(Names::default());
        parser.parse_str(input)
    }

    /// Create a `Schema` from a file containing a JSON Avro schema.
    pub fn parse_file(path: impl AsRef<Path>) -> AvroResult<Schema> {
        let input = std::fs::read_to_string(path).map_err(Details::ReadSchemaFromFile)?;
        Self::parse_str(&input)
    }

    /// Create a `Schema` from a string representing a JSON Avro schema, with a
    /// pre-populated registry of named schemas for resolving textual
    /// references. The registry is filled up with every named type defined by
    /// the parsed schema.
    pub fn parse_str_with_names(input: &str, names: &mut Names) -> AvroResult<Schema> {
        let mut parser = Parser::new(std::mem::take(names));
        let result = parser.parse_str(input);
        *names = parser.into_parsed_schemas();
        result
    }

    /// Parses an Avro schema from a JSON value.
    pub fn parse(value: &JsonValue) -> AvroResult<Schema> {
        let mut parser = Parser::new(Names::default());
        parser.parse(value, &None)
    }

    /// Like [`parse_str`](Self::parse_str), but panics on malformed input.
    ///
    /// A convenience for tests and static schema literals only.
    pub fn must_parse(input: &str) -> Schema {
        match Self::parse_str(input) {
            Ok(schema) => schema,
            Err(e) => panic!("Failed to parse schema: {e}"),
        }
    }

    /// A convenience for an array schema with the given item schema.
    pub fn array(items: Schema) -> Schema {
        Schema::Array(ArraySchema {
            items: Box::new(items),
            attributes: Default::default(),
        })
    }

    /// A convenience for a map schema with the given value schema.
    pub fn map(values: Schema) -> Schema {
        Schema::Map(MapSchema {
            values: Box::new(values),
            attributes: Default::default(),
        })
    }

    /// Returns whether the schema represents a named type according to the
    /// Avro specification.
    pub fn is_named(&self) -> bool {
        matches!(
            self,
            Schema::Ref { .. } | Schema::Record(_) | Schema::Enum(_) | Schema::Fixed(_)
        )
    }

    /// Returns the name of the schema if it has one.
    pub fn name(&self) -> Option<&Name> {
        match self {
            Schema::Ref { name, .. }
            | Schema::Record(RecordSchema { name, .. })
            | Schema::Enum(EnumSchema { name, .. })
            | Schema::Fixed(FixedSchema { name, .. }) => Some(name),
            _ => None,
        }
    }

    /// Returns the namespace of the schema if it has one.
    pub fn namespace(&self) -> Namespace {
        self.name().and_then(|n| n.namespace.clone())
    }

    /// Returns the aliases of the schema if it has any.
    pub fn aliases(&self) -> Option<&Vec<Alias>> {
        match self {
            Schema::Record(RecordSchema { aliases, .. })
            | Schema::Enum(EnumSchema { aliases, .. })
            | Schema::Fixed(FixedSchema { aliases, .. }) => aliases.as_ref(),
            _ => None,
        }
    }

    /// Returns the doc of the schema if it has one.
    pub fn doc(&self) -> Option<&String> {
        match self {
            Schema::Record(RecordSchema { doc, .. })
            | Schema::Enum(EnumSchema { doc, .. })
            | Schema::Fixed(FixedSchema { doc, .. }) => doc.as_ref(),
            _ => None,
        }
    }

    /// Returns the custom attributes (metadata) if the schema supports them.
    pub fn custom_attributes(&self) -> Option<&BTreeMap<String, JsonValue>> {
        match self {
            Schema::Record(RecordSchema { attributes, .. })
            | Schema::Enum(EnumSchema { attributes, .. })
            | Schema::Fixed(FixedSchema { attributes, .. })
            | Schema::Array(ArraySchema { attributes, .. })
            | Schema::Map(MapSchema { attributes, .. }) => Some(attributes),
            _ => None,
        }
    }
}

impl Serialize for Schema {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match &self {
            Schema::Ref { name } => serializer.serialize_str(&name.fullname(&None)),
            Schema::Null => serializer.serialize_str("null"),
            Schema::Boolean => serializer.serialize_str("boolean"),
            Schema::Int => serializer.serialize_str("int"),
            Schema::Long => serializer.serialize_str("long"),
            Schema::Float => serializer.serialize_str("float"),
            Schema::Double => serializer.serialize_str("double"),
            Schema::Bytes => serializer.serialize_str("bytes"),
            Schema::String => serializer.serialize_str("string"),
            Schema::Array(ArraySchema { items, attributes }) => {
                let mut map = serializer.serialize_map(Some(2 + attributes.len()))?;
                map.serialize_entry("type", "array")?;
                map.serialize_entry("items", items)?;
                for (key, value) in attributes {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Schema::Map(MapSchema { values, attributes }) => {
                let mut map = serializer.serialize_map(Some(2 + attributes.len()))?;
                map.serialize_entry("type", "map")?;
                map.serialize_entry("values", values)?;
                for (key, value) in attributes {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Schema::Union(inner) => {
                let variants = inner.variants();
                let mut seq = serializer.serialize_seq(Some(variants.len()))?;
                for v in variants {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
            Schema::Record(RecordSchema {
                name,
                aliases,
                doc,
                fields,
                attributes,
                lookup: _lookup,
            }) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("type", "record")?;
                if let Some(ref n) = name.namespace {
                    map.serialize_entry("namespace", n)?;
                }
                map.serialize_entry("name", &name.name)?;
                if let Some(docstr) = doc {
                    map.serialize_entry("doc", docstr)?;
                }
                if let Some(aliases) = aliases {
                    map.serialize_entry("aliases", aliases)?;
                }
                map.serialize_entry("fields", fields)?;
                for attr in attributes {
                    map.serialize_entry(attr.0, attr.1)?;
                }
                map.end()
            }
            Schema::Enum(EnumSchema {
                name,
                symbols,
                aliases,
                doc,
                attributes,
            }) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("type", "enum")?;
                if let Some(ref n) = name.namespace {
                    map.serialize_entry("namespace", n)?;
                }
                map.serialize_entry("name", &name.name)?;
                map.serialize_entry("symbols", symbols)?;
                if let Some(aliases) = aliases {
                    map.serialize_entry("aliases", aliases)?;
                }
                if let Some(doc) = doc {
                    map.serialize_entry("doc", doc)?;
                }
                for attr in attributes {
                    map.serialize_entry(attr.0, attr.1)?;
                }
                map.end()
            }
            Schema::Fixed(FixedSchema {
                name,
                aliases,
                doc,
                size,
                attributes,
            }) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("type", "fixed")?;
                if let Some(ref n) = name.namespace {
                    map.serialize_entry("namespace", n)?;
                }
                map.serialize_entry("name", &name.name)?;
                if let Some(docstr) = doc {
                    map.serialize_entry("doc", docstr)?;
                }
                map.serialize_entry("size", size)?;
                if let Some(aliases) = aliases {
                    map.serialize_entry("aliases", aliases)?;
                }
                for attr in attributes {
                    map.serialize_entry(attr.0, attr.1)?;
                }
                map.end()
            }
        }
    }
}

/// Transforms a valid Avro schema in JSON form into [the Parsing Canonical Form].
///
/// [the Parsing Canonical Form]:
/// https://avro.apache.org/docs/++version++/specification/#transforming-into-parsing-canonical-form
fn parsing_canonical_form(schema: &JsonValue, defined_names: &mut HashSet<String>) -> String {
    match schema {
        JsonValue::Object(map) => pcf_map(map, defined_names),
        JsonValue::String(s) => pcf_string(s),
        JsonValue::Array(v) => pcf_array(v, defined_names),
        json => panic!("got invalid JSON value for canonical form of schema: {json}"),
    }
}

fn pcf_map(schema: &Map<String, JsonValue>, defined_names: &mut HashSet<String>) -> String {
    let typ = schema.get("type").and_then(|v| v.as_str());
    let name = if is_named_type(typ) {
        let ns = schema.get("namespace").and_then(|v| v.as_str());
        let raw_name = schema.get("name").and_then(|v| v.as_str());
        Some(format!(
            "{}{}",
            ns.map_or("".to_string(), |n| format!("{n}.")),
            raw_name.unwrap_or_default()
        ))
    } else {
        None
    };

    // A name that has already been defined canonicalizes to a plain
    // reference string.
    if let Some(ref n) = name {
        if defined_names.contains(n) {
            return pcf_string(n);
        } else {
            defined_names.insert(n.clone());
        }
    }

    let mut fields = Vec::new();
    for (k, v) in schema {
        // Reduce primitive types to their simple form. ([PRIMITIVE] rule)
        if schema.len() == 1 && k == "type" {
            // Invariant: function is only callable from a valid schema, so this is acceptable.
            if let JsonValue::String(s) = v {
                return pcf_string(s);
            }
        }

        // Strip out unused fields ([STRIP] rule)
        let Some(ordering_position) = field_ordering_position(k) else {
            continue;
        };

        // Fully qualify the name, if it isn't already ([FULLNAMES] rule).
        if k == "name"
            && let Some(ref n) = name
        {
            fields.push((ordering_position, format!("{}:{}", pcf_string(k), pcf_string(n))));
            continue;
        }

        // Strip off quotes surrounding "size", if they exist ([INTEGERS] rule).
        if k == "size" {
            let i = match v.as_str() {
                Some(s) => s.parse::<i64>().expect("Only valid schemas are accepted!"),
                None => v.as_i64().unwrap(),
            };
            fields.push((ordering_position, format!("{}:{}", pcf_string(k), i)));
            continue;
        }

        // For anything else, recursively process the result.
        fields.push((
            ordering_position,
            format!(
                "{}:{}",
                pcf_string(k),
                parsing_canonical_form(v, defined_names)
            ),
        ));
    }

    // Sort the fields by their canonical ordering ([ORDER] rule).
    fields.sort_unstable_by_key(|(ordering_position, _)| *ordering_position);
    let inter = fields
        .into_iter()
        .map(|(_, v)| v)
        .collect::<Vec<_>>()
        .join(",");
    format!("{{{inter}}}")
}

fn is_named_type(typ: Option<&str>) -> bool {
    matches!(typ, Some("record") | Some("enum") | Some("fixed"))
}

fn pcf_array(arr: &[JsonValue], defined_names: &mut HashSet<String>) -> String {
    let inter = arr
        .iter()
        .map(|a| parsing_canonical_form(a, defined_names))
        .collect::<Vec<String>>()
        .join(",");
    format!("[{inter}]")
}

fn pcf_string(s: &str) -> String {
    format!(r#""{s}""#)
}

/// The only fields retained by the canonical form, in canonical order
/// ([ORDER] and [STRIP] rules).
const RESERVED_FIELDS: &[&str] = &["name", "type", "fields", "symbols", "items", "values", "size"];

fn field_ordering_position(field: &str) -> Option<usize> {
    RESERVED_FIELDS
        .iter()
        .position(|&f| f == field)
        .map(|pos| pos + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::rabin::Rabin;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_invalid_schema() {
        assert!(Schema::parse_str("invalid").is_err());
    }

    #[test]
    fn test_primitive_schemas() {
        for (input, expected) in [
            (r#""null""#, SchemaKind::Null),
            (r#""boolean""#, SchemaKind::Boolean),
            (r#""int""#, SchemaKind::Int),
            (r#""long""#, SchemaKind::Long),
            (r#""float""#, SchemaKind::Float),
            (r#""double""#, SchemaKind::Double),
            (r#""bytes""#, SchemaKind::Bytes),
            (r#""string""#, SchemaKind::String),
        ] {
            let schema = Schema::parse_str(input).unwrap();
            assert_eq!(SchemaKind::from(&schema), expected);
            // The verbose object form is equivalent.
            let object_form = format!(r#"{{"type": {input}}}"#);
            let schema2 = Schema::parse_str(&object_form).unwrap();
            assert_eq!(schema, schema2);
        }
    }

    #[test]
    fn test_unknown_type_name() {
        match Schema::parse_str(r#""mystery""#).map_err(Error::into_details) {
            Err(Details::UnknownTypeName(name)) => assert_eq!(name, "mystery"),
            other => panic!("Expected Details::UnknownTypeName, got {other:?}"),
        }
    }

    #[test]
    fn test_canonical_form_strips_attributes() {
        let schema = Schema::parse_str(
            r#"{
                "type": "record",
                "name": "test",
                "namespace": "com.example",
                "doc": "documented",
                "custom-attr": 17,
                "fields": [
                    {"name": "a", "type": "long", "default": 42, "doc": "field doc"},
                    {"name": "b", "type": "string", "aliases": ["bee"]}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(
            schema.canonical_form(),
            r#"{"name":"com.example.test","type":"record","fields":[{"name":"a","type":"long"},{"name":"b","type":"string"}]}"#
        );
    }

    #[test]
    fn test_canonical_form_primitives_and_containers() {
        let schema = Schema::parse_str(r#"{"type": "array", "items": {"type": "int"}}"#).unwrap();
        assert_eq!(schema.canonical_form(), r#"{"type":"array","items":"int"}"#);

        let schema = Schema::parse_str(r#"{"type": "map", "values": ["null", "string"]}"#).unwrap();
        assert_eq!(
            schema.canonical_form(),
            r#"{"type":"map","values":["null","string"]}"#
        );

        let schema = Schema::parse_str(
            r#"{"type": "fixed", "name": "md5", "namespace": "hashes", "size": 16}"#,
        )
        .unwrap();
        assert_eq!(
            schema.canonical_form(),
            r#"{"name":"hashes.md5","type":"fixed","size":16}"#
        );

        let schema = Schema::parse_str(
            r#"{"type": "enum", "name": "suit", "symbols": ["clubs", "hearts"]}"#,
        )
        .unwrap();
        assert_eq!(
            schema.canonical_form(),
            r#"{"name":"suit","type":"enum","symbols":["clubs","hearts"]}"#
        );
    }

    #[test]
    fn test_canonical_form_repeated_name_becomes_reference() {
        let schema = Schema::parse_str(
            r#"{
                "type": "record",
                "name": "LongList",
                "fields": [
                    {"name": "value", "type": "long"},
                    {"name": "next", "type": ["null", "LongList"]}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(
            schema.canonical_form(),
            r#"{"name":"LongList","type":"record","fields":[{"name":"value","type":"long"},{"name":"next","type":["null","LongList"]}]}"#
        );
    }

    /// `parse(canonical(S))` must canonicalize to the same text, and thus the
    /// same fingerprint, as `S`.
    #[test]
    fn test_canonical_form_round_trip() {
        for input in [
            r#""string""#,
            r#"{"type": "array", "items": ["null", {"name": "N", "type": "fixed", "size": 4}]}"#,
            r#"{
                "type": "record",
                "name": "test",
                "namespace": "ns",
                "fields": [
                    {"name": "a", "type": "long", "default": 42},
                    {"name": "rec", "type": {"type": "record", "name": "inner",
                        "fields": [{"name": "z", "type": "test"}]}}
                ]
            }"#,
        ] {
            let schema = Schema::parse_str(input).unwrap();
            let canonical = schema.canonical_form();
            let reparsed = Schema::parse_str(&canonical).unwrap();
            assert_eq!(canonical, reparsed.canonical_form());
            assert_eq!(schema.rabin_fingerprint(), reparsed.rabin_fingerprint());
        }
    }

    /// Byte-different JSON with identical canonical form must have equal
    /// fingerprints, and a semantically different schema must not.
    #[test]
    fn test_fingerprint_equality() {
        let with_docs = Schema::parse_str(
            r#"{
                "type": "record",
                "name": "Rec",
                "doc": "first version",
                "fields": [
                    {"name": "a", "type": "int", "doc": "counts things"},
                    {"name": "b", "type": "string", "aliases": ["bee"]}
                ]
            }"#,
        )
        .unwrap();
        let bare = Schema::parse_str(
            r#"{"type":"record","name":"Rec","fields":[{"name":"a","type":"int"},{"name":"b","type":"string"}]}"#,
        )
        .unwrap();
        assert_eq!(with_docs.rabin_fingerprint(), bare.rabin_fingerprint());
        assert_eq!(
            with_docs.fingerprint::<Rabin>().to_string(),
            bare.fingerprint::<Rabin>().to_string()
        );
        assert_eq!(with_docs, bare);

        let different = Schema::parse_str(
            r#"{"type":"record","name":"Rec","fields":[{"name":"a","type":"long"},{"name":"b","type":"string"}]}"#,
        )
        .unwrap();
        assert_ne!(with_docs.rabin_fingerprint(), different.rabin_fingerprint());
        assert_ne!(with_docs, different);
    }

    #[test]
    fn test_rabin_fingerprint_of_primitives() {
        // Reference values from the Avro specification test data.
        assert_eq!(
            Schema::Null.rabin_fingerprint() as i64,
            7195948357588979594
        );
        assert_eq!(
            Schema::Boolean.rabin_fingerprint() as i64,
            -6970731678124411036
        );
    }

    #[test]
    fn test_sha256_fingerprint_is_32_bytes() {
        let fp = Schema::Int.fingerprint::<sha2::Sha256>();
        assert_eq!(fp.bytes.len(), 32);
        assert_eq!(fp.to_string().len(), 64);
    }

    #[test]
    fn test_nested_union_is_rejected() {
        let result = Schema::parse_str(r#"["null", ["int", "string"]]"#);
        assert!(matches!(
            result.map_err(Error::into_details),
            Err(Details::NestedUnion)
        ));
    }

    #[test]
    fn test_ambiguous_union_is_rejected() {
        let result = Schema::parse_str(r#"[{"type": "array", "items": "int"}, {"type": "array", "items": "string"}]"#);
        assert!(matches!(
            result.map_err(Error::into_details),
            Err(Details::UnionDuplicate)
        ));
    }

    #[test]
    fn test_fixed_size_is_required() {
        let result = Schema::parse_str(r#"{"type": "fixed", "name": "f"}"#);
        assert!(matches!(
            result.map_err(Error::into_details),
            Err(Details::GetFixedSizeField)
        ));

        let result = Schema::parse_str(r#"{"type": "fixed", "name": "f", "size": -2}"#);
        assert!(matches!(
            result.map_err(Error::into_details),
            Err(Details::GetFixedSizeFieldPositive(_))
        ));
    }

    #[test]
    fn test_fixed_size_zero_is_legal() {
        let schema = Schema::parse_str(r#"{"type": "fixed", "name": "empty", "size": 0}"#).unwrap();
        let Schema::Fixed(fixed) = schema else {
            panic!("expected fixed");
        };
        assert_eq!(fixed.size, 0);
    }

    #[test]
    fn test_duplicate_record_field_is_rejected() {
        let result = Schema::parse_str(
            r#"{
                "type": "record",
                "name": "Rec",
                "fields": [
                    {"name": "a", "type": "int"},
                    {"name": "a", "type": "string"}
                ]
            }"#,
        );
        assert!(matches!(
            result.map_err(Error::into_details),
            Err(Details::FieldNameDuplicate(name)) if name == "a"
        ));
    }

    #[test]
    fn test_recursive_record_parses() {
        let schema = Schema::parse_str(
            r#"{
                "type": "record",
                "name": "LongList",
                "fields": [
                    {"name": "value", "type": "long"},
                    {"name": "next", "type": ["null", "LongList"]}
                ]
            }"#,
        )
        .unwrap();
        let Schema::Record(record) = &schema else {
            panic!("expected record");
        };
        let Schema::Union(ref union_schema) = record.fields[1].schema else {
            panic!("expected union");
        };
        assert!(matches!(
            union_schema.variants()[1],
            Schema::Ref { ref name } if name.name == "LongList"
        ));
    }

    #[test]
    fn test_parse_str_with_names_shares_registry() {
        let mut names = Names::default();
        Schema::parse_str_with_names(
            r#"{"type": "record", "name": "Nested", "fields": [{"name": "z", "type": "int"}]}"#,
            &mut names,
        )
        .unwrap();
        assert_eq!(names.len(), 1);

        let outer = Schema::parse_str_with_names(
            r#"{"type": "record", "name": "Outer", "fields": [{"name": "n", "type": "Nested"}]}"#,
            &mut names,
        )
        .unwrap();
        let Schema::Record(record) = &outer else {
            panic!("expected record");
        };
        assert!(matches!(record.fields[0].schema, Schema::Ref { .. }));
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_custom_attributes_survive_round_trip() {
        let input = r#"{"type": "record", "name": "Rec", "confluent:id": 42, "fields": []}"#;
        let schema = Schema::parse_str(input).unwrap();
        let attrs = schema.custom_attributes().unwrap();
        assert_eq!(attrs.get("confluent:id"), Some(&serde_json::json!(42)));

        let json = serde_json::to_value(&schema).unwrap();
        let reparsed = Schema::parse(&json).unwrap();
        assert_eq!(
            reparsed.custom_attributes().unwrap().get("confluent:id"),
            Some(&serde_json::json!(42))
        );
    }

    #[test]
    fn test_namespace_inherited_by_inner_record() {
        let schema = Schema::parse_str(
            r#"{
                "type": "record",
                "name": "Outer",
                "namespace": "space",
                "fields": [
                    {"name": "inner", "type": {"type": "record", "name": "Inner",
                        "fields": [{"name": "z", "type": "double"}]}}
                ]
            }"#,
        )
        .unwrap();
        let Schema::Record(outer) = &schema else {
            panic!("expected record");
        };
        let Schema::Record(ref inner) = outer.fields[0].schema else {
            panic!("expected record");
        };
        assert_eq!(inner.name.fullname(&None), "space.Inner");
    }
}
