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

//! Encoding of [`Value`]s into the Avro binary format.

use crate::AvroResult;
use crate::error::Details;
use crate::schema::{
    EnumSchema, FixedSchema, Names, Namespace, RecordSchema, ResolvedSchema, Schema, SchemaKind,
    UnionSchema, dereference,
};
use crate::types::{Value, ValueKind};
use crate::util::{zig_i32, zig_i64};
use log::error;

/// Encode a `Value` into Avro binary format.
///
/// **NOTE** This performs no schema validation. The value is assumed to be
/// valid with regards to the schema; the schema only guides the encoding of
/// complex values.
pub fn encode(value: &Value, schema: &Schema, buffer: &mut Vec<u8>) -> AvroResult<()> {
    let rs = ResolvedSchema::try_from(schema)?;
    encode_internal(value, schema, rs.get_names(), &None, buffer)
}

fn encode_bytes(bytes: &[u8], buffer: &mut Vec<u8>) {
    zig_i64(bytes.len() as i64, buffer);
    buffer.extend_from_slice(bytes);
}

fn mismatch(value: &Value, schema: &Schema) -> Details {
    Details::EncodeValueWrongType {
        value: ValueKind::from(value),
        schema: SchemaKind::from(schema),
    }
}

pub(crate) fn encode_internal(
    value: &Value,
    schema: &Schema,
    names: &Names,
    enclosing_namespace: &Namespace,
    buffer: &mut Vec<u8>,
) -> AvroResult<()> {
    if let Schema::Ref { .. } = schema {
        let resolved = dereference(schema, names, enclosing_namespace)?;
        return encode_internal(value, resolved, names, enclosing_namespace, buffer);
    }

    if let Schema::Union(union) = schema {
        let (index, branch) = union_branch(union, value, names, enclosing_namespace)?;
        zig_i64(index as i64, buffer);
        return encode_internal(value, branch, names, enclosing_namespace, buffer);
    }

    match value {
        Value::Null => match schema {
            Schema::Null => Ok(()),
            _ => Err(mismatch(value, schema).into()),
        },
        Value::Boolean(b) => match schema {
            Schema::Boolean => {
                buffer.push(u8::from(*b));
                Ok(())
            }
            _ => Err(mismatch(value, schema).into()),
        },
        Value::Int(i) => match schema {
            Schema::Int => {
                zig_i32(*i, buffer);
                Ok(())
            }
            _ => Err(mismatch(value, schema).into()),
        },
        Value::Long(i) => match schema {
            Schema::Long => {
                zig_i64(*i, buffer);
                Ok(())
            }
            _ => Err(mismatch(value, schema).into()),
        },
        Value::Float(x) => match schema {
            Schema::Float => {
                buffer.extend_from_slice(&x.to_le_bytes());
                Ok(())
            }
            _ => Err(mismatch(value, schema).into()),
        },
        Value::Double(x) => match schema {
            Schema::Double => {
                buffer.extend_from_slice(&x.to_le_bytes());
                Ok(())
            }
            _ => Err(mismatch(value, schema).into()),
        },
        Value::Bytes(bytes) => match schema {
            Schema::Bytes => {
                encode_bytes(bytes, buffer);
                Ok(())
            }
            _ => Err(mismatch(value, schema).into()),
        },
        Value::String(s) => match schema {
            Schema::String => {
                encode_bytes(s.as_bytes(), buffer);
                Ok(())
            }
            Schema::Enum(EnumSchema { symbols, .. }) => {
                if let Some(index) = symbols.iter().position(|symbol| symbol == s) {
                    zig_i32(index as i32, buffer);
                    Ok(())
                } else {
                    error!("Invalid symbol string {s:?}");
                    Err(Details::UnknownEnumSymbol(s.clone()).into())
                }
            }
            _ => Err(mismatch(value, schema).into()),
        },
        Value::Fixed(bytes) => match schema {
            Schema::Fixed(FixedSchema { size, .. }) => {
                if bytes.len() == *size {
                    buffer.extend_from_slice(bytes);
                    Ok(())
                } else {
                    Err(Details::FixedSizeMismatch {
                        reader: *size,
                        writer: bytes.len(),
                    }
                    .into())
                }
            }
            _ => Err(mismatch(value, schema).into()),
        },
        Value::Enum(e) => match schema {
            Schema::Enum(_) => {
                let index = e.index();
                if index < 0 {
                    Err(Details::EncodeEnumUnset.into())
                } else {
                    zig_i32(index, buffer);
                    Ok(())
                }
            }
            _ => Err(mismatch(value, schema).into()),
        },
        Value::Array(items) => match schema {
            Schema::Array(inner) => {
                if !items.is_empty() {
                    zig_i64(items.len() as i64, buffer);
                    for item in items {
                        encode_internal(item, &inner.items, names, enclosing_namespace, buffer)?;
                    }
                }
                buffer.push(0u8);
                Ok(())
            }
            _ => Err(mismatch(value, schema).into()),
        },
        Value::Map(map) => match schema {
            Schema::Map(inner) => {
                if !map.is_empty() {
                    zig_i64(map.len() as i64, buffer);
                    for (key, item) in map {
                        encode_bytes(key.as_bytes(), buffer);
                        encode_internal(item, &inner.values, names, enclosing_namespace, buffer)?;
                    }
                }
                buffer.push(0u8);
                Ok(())
            }
            _ => Err(mismatch(value, schema).into()),
        },
        Value::Record(record) => match schema {
            Schema::Record(RecordSchema { name, fields, .. }) => {
                let record_namespace = name.fully_qualified_name(enclosing_namespace).namespace;
                for field in fields {
                    match record.get(&field.name) {
                        Some(v) => {
                            encode_internal(v, &field.schema, names, &record_namespace, buffer)?
                        }
                        None if field.is_nullable() => encode_internal(
                            &Value::Null,
                            &field.schema,
                            names,
                            &record_namespace,
                            buffer,
                        )?,
                        None => return Err(Details::EncodeMissingField(field.name.clone()).into()),
                    }
                }
                Ok(())
            }
            _ => Err(mismatch(value, schema).into()),
        },
    }
}

/// Pick the union branch a value encodes under: the `null` member for a null
/// value, otherwise the first member the value structurally matches.
fn union_branch<'s>(
    union: &'s UnionSchema,
    value: &Value,
    names: &'s Names,
    enclosing_namespace: &Namespace,
) -> AvroResult<(usize, &'s Schema)> {
    if matches!(value, Value::Null) {
        return union
            .find_kind(SchemaKind::Null)
            .map(|i| (i, &union.variants()[i]))
            .ok_or_else(|| Details::EncodeUnionBranch(ValueKind::Null).into());
    }

    for (i, member) in union.variants().iter().enumerate() {
        let member = dereference(member, names, enclosing_namespace)?;
        let matches = match (value, member) {
            (Value::Boolean(_), Schema::Boolean)
            | (Value::Int(_), Schema::Int)
            | (Value::Long(_), Schema::Long)
            | (Value::Float(_), Schema::Float)
            | (Value::Double(_), Schema::Double)
            | (Value::Bytes(_), Schema::Bytes)
            | (Value::String(_), Schema::String)
            | (Value::Array(_), Schema::Array(_))
            | (Value::Map(_), Schema::Map(_))
            | (Value::Enum(_), Schema::Enum(_)) => true,
            (Value::Fixed(bytes), Schema::Fixed(FixedSchema { size, .. })) => {
                bytes.len() == *size
            }
            (Value::Record(record), Schema::Record(RecordSchema { name, .. })) => {
                match record.schema().name() {
                    Some(value_name) => {
                        value_name.fullname(enclosing_namespace)
                            == name.fullname(enclosing_namespace)
                    }
                    None => true,
                }
            }
            _ => false,
        };
        if matches {
            return Ok((i, &union.variants()[i]));
        }
    }

    Err(Details::EncodeUnionBranch(ValueKind::from(value)).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Schema;
    use crate::types::GenericRecord;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encode_scalars() {
        let mut buffer = Vec::new();
        encode(&Value::Long(1), &Schema::Long, &mut buffer).unwrap();
        assert_eq!(buffer, [2]);

        buffer.clear();
        encode(&Value::Int(-1), &Schema::Int, &mut buffer).unwrap();
        assert_eq!(buffer, [1]);

        buffer.clear();
        encode(&Value::Boolean(true), &Schema::Boolean, &mut buffer).unwrap();
        assert_eq!(buffer, [1]);

        buffer.clear();
        encode(&Value::Null, &Schema::Null, &mut buffer).unwrap();
        assert_eq!(buffer, [0u8; 0]);
    }

    #[test]
    fn test_encode_string_and_bytes() {
        let mut buffer = Vec::new();
        encode(
            &Value::String("foo".to_string()),
            &Schema::String,
            &mut buffer,
        )
        .unwrap();
        assert_eq!(buffer, [6, b'f', b'o', b'o']);

        buffer.clear();
        encode(&Value::Bytes(vec![0xde, 0xad]), &Schema::Bytes, &mut buffer).unwrap();
        assert_eq!(buffer, [4, 0xde, 0xad]);
    }

    #[test]
    fn test_encode_array_single_block() {
        let mut buffer = Vec::new();
        let schema = Schema::array(Schema::Int);
        encode(
            &Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
            &schema,
            &mut buffer,
        )
        .unwrap();
        assert_eq!(buffer, [6, 2, 4, 6, 0]);

        buffer.clear();
        encode(&Value::Array(vec![]), &schema, &mut buffer).unwrap();
        assert_eq!(buffer, [0]);
    }

    /// Encoding `null` under `["null", T]` produces exactly one byte for the
    /// tag and nothing else, regardless of T.
    #[test]
    fn test_encode_null_union_is_tag_only() {
        for other in [r#""boolean""#, r#""bytes""#, r#"{"type":"array","items":"long"}"#] {
            let schema = Schema::parse_str(&format!(r#"["null", {other}]"#)).unwrap();
            let mut buffer = Vec::new();
            encode(&Value::Null, &schema, &mut buffer).unwrap();
            assert_eq!(buffer, [0], "wire for null under [null, {other}]");
        }
    }

    #[test]
    fn test_encode_union_picks_matching_branch() {
        let schema = Schema::parse_str(r#"["null", "string"]"#).unwrap();
        let mut buffer = Vec::new();
        encode(&Value::String("x".to_string()), &schema, &mut buffer).unwrap();
        assert_eq!(buffer, [2, 2, b'x']);
    }

    #[test]
    fn test_encode_record_in_field_order() {
        let schema = Schema::parse_str(
            r#"{
                "type": "record",
                "name": "Rec",
                "fields": [
                    {"name": "b", "type": "string"},
                    {"name": "a", "type": "long"}
                ]
            }"#,
        )
        .unwrap();
        let mut record = GenericRecord::new(&schema).unwrap();
        record.put("a", 3i64);
        record.put("b", "ab");
        let mut buffer = Vec::new();
        encode(&Value::Record(record), &schema, &mut buffer).unwrap();
        // "b" first (len 2, 'a', 'b'), then long 3
        assert_eq!(buffer, [4, b'a', b'b', 6]);
    }

    #[test]
    fn test_encode_missing_field_fails() {
        let schema = Schema::parse_str(
            r#"{
                "type": "record",
                "name": "Rec",
                "fields": [{"name": "a", "type": "long"}]
            }"#,
        )
        .unwrap();
        let record = GenericRecord::new(&schema).unwrap();
        let mut buffer = Vec::new();
        let result = encode(&Value::Record(record), &schema, &mut buffer);
        assert!(matches!(
            result.map_err(crate::Error::into_details),
            Err(Details::EncodeMissingField(name)) if name == "a"
        ));
    }

    #[test]
    fn test_encode_recursive_record() {
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
        let mut tail = GenericRecord::new(&schema).unwrap();
        tail.put("value", 2i64);
        tail.put("next", Value::Null);
        let mut head = GenericRecord::new(&schema).unwrap();
        head.put("value", 1i64);
        head.put("next", Value::Record(tail));

        let mut buffer = Vec::new();
        encode(&Value::Record(head), &schema, &mut buffer).unwrap();
        // value 1, tag 1, value 2, tag 0
        assert_eq!(buffer, [2, 2, 4, 0]);
    }
}
