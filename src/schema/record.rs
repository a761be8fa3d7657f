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

use crate::AvroResult;
use crate::error::Details;
use crate::schema::parser::Parser;
use crate::schema::{Aliases, Documentation, Name, Schema};
use crate::util::MapHelper;
use crate::validator::validate_record_field_name;
use log::warn;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A description of a Record schema.
#[derive(Clone, Debug)]
pub struct RecordSchema {
    /// The name of the schema
    pub name: Name,
    /// The aliases of the schema
    pub aliases: Aliases,
    /// The documentation of the schema
    pub doc: Documentation,
    /// The set of fields of the schema
    pub fields: Vec<RecordField>,
    /// Maps field names (and field aliases) to their position in `fields`.
    pub lookup: BTreeMap<String, usize>,
    /// The custom attributes of the schema
    pub attributes: BTreeMap<String, Value>,
}

/// Represents a `field` in a `record` Avro schema.
#[derive(Clone, Debug)]
pub struct RecordField {
    /// Name of the field.
    pub name: String,
    /// Documentation of the field.
    pub doc: Documentation,
    /// Aliases of the field's name. They have no namespace.
    pub aliases: Vec<String>,
    /// Default value of the field, as the raw JSON from the schema document.
    /// Used when projecting Avro data written without this field.
    pub default: Option<Value>,
    /// Schema of the field.
    pub schema: Schema,
    /// A collection of all unknown attributes of the field.
    pub custom_attributes: BTreeMap<String, Value>,
}

impl RecordField {
    /// Parse a `serde_json::Map` into a `RecordField`.
    pub(crate) fn parse(
        field: &Map<String, Value>,
        parser: &mut Parser,
        enclosing_record: &Name,
    ) -> AvroResult<Self> {
        let name = field.name().ok_or(Details::GetNameFieldFromRecord)?;

        validate_record_field_name(&name)?;

        let ty = field.get("type").ok_or(Details::GetRecordFieldTypeField)?;
        let schema = parser.parse(ty, &enclosing_record.namespace)?;

        if let Some(logical_type) = field.get("logicalType") {
            warn!(
                "Ignored the {enclosing_record}.{name} `logicalType` attribute (`{logical_type}`). \
                 It should probably be nested inside the `type` of the field"
            );
        }

        let aliases = field
            .get("aliases")
            .and_then(|aliases| {
                aliases.as_array().map(|aliases| {
                    aliases
                        .iter()
                        .flat_map(|alias| alias.as_str())
                        .map(|alias| alias.to_string())
                        .collect::<Vec<String>>()
                })
            })
            .unwrap_or_default();

        Ok(RecordField {
            name,
            doc: field.doc(),
            default: field.get("default").cloned(),
            aliases,
            custom_attributes: RecordField::get_field_custom_attributes(field),
            schema,
        })
    }

    fn get_field_custom_attributes(field: &Map<String, Value>) -> BTreeMap<String, Value> {
        let mut custom_attributes: BTreeMap<String, Value> = BTreeMap::new();
        for (key, value) in field {
            match key.as_str() {
                "type" | "name" | "doc" | "default" | "aliases" => continue,
                _ => custom_attributes.insert(key.clone(), value.clone()),
            };
        }
        custom_attributes
    }

    /// Returns true if the field's schema is a union whose first member is `null`.
    pub fn is_nullable(&self) -> bool {
        match self.schema {
            Schema::Union(ref inner) => inner.is_nullable(),
            _ => false,
        }
    }
}

impl Serialize for RecordField {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("type", &self.schema)?;

        if let Some(default) = &self.default {
            map.serialize_entry("default", default)?;
        }

        if let Some(doc) = &self.doc {
            map.serialize_entry("doc", doc)?;
        }

        if !self.aliases.is_empty() {
            map.serialize_entry("aliases", &self.aliases)?;
        }

        for attr in &self.custom_attributes {
            map.serialize_entry(attr.0, attr.1)?;
        }

        map.end()
    }
}

#[cfg(test)]
mod tests {
    use crate::Schema;
    use crate::schema::Name;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lookup_covers_names_and_aliases() {
        let schema = Schema::parse_str(
            r#"{
                "type": "record",
                "name": "Rec",
                "fields": [
                    {"name": "a", "type": "int"},
                    {"name": "b", "type": "string", "aliases": ["bee", "buzz"]}
                ]
            }"#,
        )
        .unwrap();

        let Schema::Record(record) = schema else {
            panic!("expected a record schema");
        };
        assert_eq!(record.name, Name::new("Rec").unwrap());
        assert_eq!(record.lookup.get("a"), Some(&0));
        assert_eq!(record.lookup.get("b"), Some(&1));
        assert_eq!(record.lookup.get("bee"), Some(&1));
        assert_eq!(record.lookup.get("buzz"), Some(&1));
    }

    #[test]
    fn test_nullable_record_field() {
        let schema = Schema::parse_str(
            r#"{
                "type": "record",
                "name": "Rec",
                "fields": [
                    {"name": "maybe", "type": ["null", "long"], "default": null},
                    {"name": "must", "type": "long"}
                ]
            }"#,
        )
        .unwrap();

        let Schema::Record(record) = schema else {
            panic!("expected a record schema");
        };
        assert!(record.fields[0].is_nullable());
        assert!(!record.fields[1].is_nullable());
    }
}
