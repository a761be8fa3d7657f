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

//! Normalization of JSON field defaults into native [`Value`]s.
//!
//! Happens once, while a projector is compiled; decoding only ever clones the
//! precomputed values.

use crate::AvroResult;
use crate::error::Details;
use crate::schema::{
    EnumSchema, FixedSchema, Names, Namespace, RecordSchema, Schema, SchemaKind, dereference,
};
use crate::types::{GenericEnum, GenericRecord, Value};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;

fn wrong_type(schema: &Schema, json: &JsonValue) -> crate::Error {
    Details::GetDefaultValue {
        schema: SchemaKind::from(schema),
        value: json.clone(),
    }
    .into()
}

/// Convert the raw JSON default of a field into the native shape the reader
/// type expects.
pub(crate) fn normalize_default(
    schema: &Schema,
    json: &JsonValue,
    names: &Names,
    enclosing_namespace: &Namespace,
) -> AvroResult<Value> {
    let schema = dereference(schema, names, enclosing_namespace)?;
    match schema {
        Schema::Null => match json {
            JsonValue::Null => Ok(Value::Null),
            _ => Err(wrong_type(schema, json)),
        },
        Schema::Boolean => match json {
            JsonValue::Bool(b) => Ok(Value::Boolean(*b)),
            _ => Err(wrong_type(schema, json)),
        },
        Schema::Int => json
            .as_i64()
            .map(|n| Value::Int(n as i32))
            .or_else(|| json.as_f64().map(|n| Value::Int(n as i32)))
            .ok_or_else(|| wrong_type(schema, json)),
        Schema::Long => json
            .as_i64()
            .map(Value::Long)
            .or_else(|| json.as_f64().map(|n| Value::Long(n as i64)))
            .ok_or_else(|| wrong_type(schema, json)),
        Schema::Float => json_number(json)
            .map(|n| Value::Float(n as f32))
            .ok_or_else(|| wrong_type(schema, json)),
        Schema::Double => json_number(json)
            .map(Value::Double)
            .ok_or_else(|| wrong_type(schema, json)),
        Schema::Bytes => match json {
            JsonValue::String(s) => Ok(Value::Bytes(latin1_bytes(s, schema, json)?)),
            _ => Err(wrong_type(schema, json)),
        },
        Schema::String => match json {
            JsonValue::String(s) => Ok(Value::String(s.clone())),
            _ => Err(wrong_type(schema, json)),
        },
        Schema::Fixed(FixedSchema { size, .. }) => match json {
            JsonValue::String(s) => {
                let bytes = latin1_bytes(s, schema, json)?;
                if bytes.len() == *size {
                    Ok(Value::Fixed(bytes))
                } else {
                    Err(wrong_type(schema, json))
                }
            }
            _ => Err(wrong_type(schema, json)),
        },
        Schema::Enum(EnumSchema { symbols, .. }) => match json {
            JsonValue::String(s) => match symbols.iter().position(|symbol| symbol == s) {
                Some(index) => {
                    let symbols: Arc<[String]> = symbols.clone().into();
                    Ok(Value::Enum(GenericEnum::with_index(symbols, index as i32)))
                }
                None => Err(wrong_type(schema, json)),
            },
            _ => Err(wrong_type(schema, json)),
        },
        Schema::Array(inner) => match json {
            JsonValue::Array(items) => items
                .iter()
                .map(|item| normalize_default(&inner.items, item, names, enclosing_namespace))
                .collect::<AvroResult<Vec<Value>>>()
                .map(Value::Array),
            _ => Err(wrong_type(schema, json)),
        },
        Schema::Map(inner) => match json {
            JsonValue::Object(entries) => {
                let mut map = HashMap::with_capacity(entries.len());
                for (key, item) in entries {
                    let value =
                        normalize_default(&inner.values, item, names, enclosing_namespace)?;
                    map.insert(key.clone(), value);
                }
                Ok(Value::Map(map))
            }
            _ => Err(wrong_type(schema, json)),
        },
        Schema::Record(RecordSchema { name, fields, .. }) => match json {
            JsonValue::Object(entries) => {
                let record_namespace = name.fully_qualified_name(enclosing_namespace).namespace;
                let handle = Arc::new(schema.clone());
                let mut record = GenericRecord::from_arc(handle);
                for field in fields {
                    // The JSON object supplies values field by field; fields
                    // it omits fall back to their own declared default.
                    let field_json = entries.get(&field.name).or(field.default.as_ref()).ok_or(
                        Details::MissingField {
                            record: name.fullname(&None),
                            field: field.name.clone(),
                        },
                    )?;
                    let value =
                        normalize_default(&field.schema, field_json, names, &record_namespace)?;
                    record.put(&field.name, value);
                }
                Ok(Value::Record(record))
            }
            _ => Err(wrong_type(schema, json)),
        },
        Schema::Union(union_schema) => {
            // A union default always describes its first member.
            let first = union_schema
                .variants()
                .first()
                .ok_or(Details::EmptyUnion)?;
            normalize_default(first, json, names, enclosing_namespace)
        }
        Schema::Ref { .. } => unreachable!("references are dereferenced above"),
    }
}

fn json_number(json: &JsonValue) -> Option<f64> {
    json.as_f64()
}

/// Decode the Avro-canonical "ISO-8859-1 string" convention for binary
/// defaults: each code point 0 through 255 becomes one byte.
fn latin1_bytes(s: &str, schema: &Schema, json: &JsonValue) -> AvroResult<Vec<u8>> {
    s.chars()
        .map(|c| {
            let code = c as u32;
            u8::try_from(code).map_err(|_| wrong_type(schema, json))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Schema;
    use serde_json::json;

    fn normalize(schema: &Schema, json: &JsonValue) -> AvroResult<Value> {
        normalize_default(schema, json, &Names::default(), &None)
    }

    #[test]
    fn test_numeric_defaults_are_coerced() {
        assert_eq!(normalize(&Schema::Int, &json!(7)).unwrap(), Value::Int(7));
        assert_eq!(
            normalize(&Schema::Long, &json!(7.0)).unwrap(),
            Value::Long(7)
        );
        assert_eq!(
            normalize(&Schema::Float, &json!(1.5)).unwrap(),
            Value::Float(1.5)
        );
        assert_eq!(
            normalize(&Schema::Double, &json!(2)).unwrap(),
            Value::Double(2.0)
        );
        assert!(normalize(&Schema::Int, &json!("nope")).is_err());
    }

    #[test]
    fn test_bytes_default_latin1_round_trip() {
        // "ÿ" is U+00FF and must become the single byte 0xff.
        assert_eq!(
            normalize(&Schema::Bytes, &json!("a\u{00ff}")).unwrap(),
            Value::Bytes(vec![b'a', 0xff])
        );
        // Code points above 255 cannot be byte defaults.
        assert!(normalize(&Schema::Bytes, &json!("\u{0100}")).is_err());
    }

    #[test]
    fn test_fixed_default_checks_size() {
        let schema =
            Schema::parse_str(r#"{"type": "fixed", "name": "f4", "size": 4}"#).unwrap();
        assert_eq!(
            normalize(&schema, &json!("abcd")).unwrap(),
            Value::Fixed(b"abcd".to_vec())
        );
        assert!(normalize(&schema, &json!("abc")).is_err());
    }

    #[test]
    fn test_enum_default_resolves_symbol() {
        let schema = Schema::parse_str(
            r#"{"type": "enum", "name": "suit", "symbols": ["clubs", "hearts"]}"#,
        )
        .unwrap();
        let Value::Enum(e) = normalize(&schema, &json!("hearts")).unwrap() else {
            panic!("expected enum value");
        };
        assert_eq!(e.index(), 1);
        assert_eq!(e.symbol(), Some("hearts"));
        assert!(normalize(&schema, &json!("spades")).is_err());
    }

    #[test]
    fn test_array_default_is_recursively_normalized() {
        let schema = Schema::array(Schema::Long);
        assert_eq!(
            normalize(&schema, &json!([1, 2, 3])).unwrap(),
            Value::Array(vec![Value::Long(1), Value::Long(2), Value::Long(3)])
        );
    }

    #[test]
    fn test_map_default() {
        let schema = Schema::map(Schema::Int);
        let Value::Map(map) = normalize(&schema, &json!({"a": 1})).unwrap() else {
            panic!("expected map value");
        };
        assert_eq!(map.get("a"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_record_default_populated_field_by_field() {
        let schema = Schema::parse_str(
            r#"{
                "type": "record",
                "name": "Nested",
                "fields": [
                    {"name": "a", "type": "int"},
                    {"name": "b", "type": "string", "default": "fallback"}
                ]
            }"#,
        )
        .unwrap();
        let Value::Record(record) = normalize(&schema, &json!({"a": 4})).unwrap() else {
            panic!("expected record value");
        };
        assert_eq!(record.get("a"), Some(&Value::Int(4)));
        assert_eq!(
            record.get("b"),
            Some(&Value::String("fallback".to_string()))
        );

        // A field with neither an entry nor its own default is an error.
        assert!(normalize(&schema, &json!({"b": "x"})).is_err());
    }

    #[test]
    fn test_union_default_matches_first_member() {
        let schema = Schema::parse_str(r#"["null", "string"]"#).unwrap();
        assert_eq!(normalize(&schema, &json!(null)).unwrap(), Value::Null);
        // The default of a nullable union must be null, matching the first member.
        assert!(normalize(&schema, &json!("text")).is_err());
    }
}
