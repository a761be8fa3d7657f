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

//! Logic handling the intermediate representation of Avro values.

use crate::Schema;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use strum_macros::EnumDiscriminants;

/// The sentinel index of a [`GenericEnum`] that has not been set yet.
pub const ENUM_UNSET: i32 = -1;

/// Represents any valid Avro value.
///
/// A union datum is represented directly by the value of the selected branch;
/// the `null` branch becomes [`Value::Null`].
#[derive(Clone, Debug, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(ValueKind), derive(Hash, Ord, PartialOrd))]
pub enum Value {
    /// A `null` Avro value.
    Null,
    /// A `boolean` Avro value.
    Boolean(bool),
    /// An `int` Avro value.
    Int(i32),
    /// A `long` Avro value.
    Long(i64),
    /// A `float` Avro value.
    Float(f32),
    /// A `double` Avro value.
    Double(f64),
    /// A `bytes` Avro value.
    Bytes(Vec<u8>),
    /// A `string` Avro value.
    String(String),
    /// A `fixed` Avro value.
    Fixed(Vec<u8>),
    /// An `array` Avro value.
    Array(Vec<Value>),
    /// A `map` Avro value.
    Map(HashMap<String, Value>),
    /// An `enum` Avro value.
    Enum(GenericEnum),
    /// A `record` Avro value.
    Record(GenericRecord),
}

/// A schema-aware record value: a mapping from field name to [`Value`],
/// tied to the `record` schema it conforms to.
#[derive(Clone, Debug)]
pub struct GenericRecord {
    schema: Arc<Schema>,
    fields: HashMap<String, Value>,
}

impl GenericRecord {
    /// Create an empty record tied to the given schema.
    ///
    /// Returns `None` when `schema` is not a `record`.
    pub fn new(schema: &Schema) -> Option<Self> {
        match schema {
            Schema::Record(_) => Some(Self {
                schema: Arc::new(schema.clone()),
                fields: HashMap::new(),
            }),
            _ => None,
        }
    }

    /// Create an empty record from an already shared schema handle.
    ///
    /// Invariant: `schema` is a `Schema::Record`.
    pub(crate) fn from_arc(schema: Arc<Schema>) -> Self {
        debug_assert!(matches!(*schema, Schema::Record(_)));
        Self {
            schema,
            fields: HashMap::new(),
        }
    }

    /// Overwrite or insert the value of a field.
    ///
    /// No type checking happens here; whoever fills the record is responsible
    /// for writing values of the shape the schema promises.
    pub fn put(&mut self, name: &str, value: impl Into<Value>) {
        self.fields.insert(name.to_string(), value.into());
    }

    /// The value of the field called `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The record schema this value conforms to.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Iterate over the (name, value) pairs currently present.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

// Two records compare by their field values; the schema handle is not
// consulted so that records parsed from byte-different but canonically equal
// schemas compare equal.
impl PartialEq for GenericRecord {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

/// An enum value: the ordered symbol list of its schema plus the index of the
/// current symbol, or [`ENUM_UNSET`] when no symbol has been chosen yet.
#[derive(Clone, Debug)]
pub struct GenericEnum {
    symbols: Arc<[String]>,
    index: i32,
}

impl GenericEnum {
    pub fn new(symbols: impl Into<Arc<[String]>>) -> Self {
        Self {
            symbols: symbols.into(),
            index: ENUM_UNSET,
        }
    }

    pub(crate) fn with_index(symbols: Arc<[String]>, index: i32) -> Self {
        Self { symbols, index }
    }

    /// Set the current symbol by index. Out-of-range indices are left to the
    /// caller to avoid; [`symbol`](Self::symbol) will simply return `None`.
    pub fn set_index(&mut self, index: i32) {
        self.index = index;
    }

    /// Set the current symbol by name. Returns false and leaves the value
    /// untouched when the symbol is not part of the schema.
    pub fn set_symbol(&mut self, symbol: &str) -> bool {
        match self.symbols.iter().position(|s| s == symbol) {
            Some(index) => {
                self.index = index as i32;
                true
            }
            None => false,
        }
    }

    pub fn index(&self) -> i32 {
        self.index
    }

    /// The current symbol, or `None` when unset or out of range.
    pub fn symbol(&self) -> Option<&str> {
        usize::try_from(self.index)
            .ok()
            .and_then(|i| self.symbols.get(i))
            .map(|s| s.as_str())
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }
}

impl PartialEq for GenericEnum {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.symbols == other.symbols
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Self::Null
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<GenericRecord> for Value {
    fn from(value: GenericRecord) -> Self {
        Self::Record(value)
    }
}

impl From<GenericEnum> for Value {
    fn from(value: GenericEnum) -> Self {
        Self::Enum(value)
    }
}

fn diagnostic_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(*b),
        Value::Int(i) => JsonValue::from(*i),
        Value::Long(i) => JsonValue::from(*i),
        Value::Float(f) => JsonValue::from(*f),
        Value::Double(d) => JsonValue::from(*d),
        Value::Bytes(bytes) | Value::Fixed(bytes) => {
            JsonValue::Array(bytes.iter().map(|b| JsonValue::from(*b)).collect())
        }
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Array(items) => JsonValue::Array(items.iter().map(diagnostic_json).collect()),
        Value::Map(map) => JsonValue::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), diagnostic_json(v)))
                .collect(),
        ),
        Value::Enum(e) => match e.symbol() {
            Some(symbol) => JsonValue::String(symbol.to_string()),
            None => JsonValue::Null,
        },
        Value::Record(record) => JsonValue::Object(
            record
                .fields()
                .map(|(k, v)| (k.to_string(), diagnostic_json(v)))
                .collect(),
        ),
    }
}

/// A deterministic textual rendering for diagnostics and tests: JSON with the
/// keys of maps and records in sorted order, bytes as number arrays.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", diagnostic_json(self))
    }
}

impl fmt::Display for GenericRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", diagnostic_json(&Value::Record(self.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record_schema() -> Schema {
        Schema::parse_str(
            r#"{
                "type": "record",
                "name": "Rec",
                "fields": [
                    {"name": "a", "type": "long"},
                    {"name": "b", "type": "string"}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_generic_record_put_get() {
        let schema = record_schema();
        let mut record = GenericRecord::new(&schema).unwrap();
        assert_eq!(record.get("a"), None);
        record.put("a", 27i64);
        record.put("b", "foo");
        assert_eq!(record.get("a"), Some(&Value::Long(27)));
        assert_eq!(record.get("b"), Some(&Value::String("foo".to_string())));
        record.put("a", 28i64);
        assert_eq!(record.get("a"), Some(&Value::Long(28)));
    }

    #[test]
    fn test_generic_record_requires_record_schema() {
        assert!(GenericRecord::new(&Schema::Int).is_none());
    }

    #[test]
    fn test_generic_record_display_is_deterministic() {
        let schema = record_schema();
        let mut record = GenericRecord::new(&schema).unwrap();
        record.put("b", "foo");
        record.put("a", 1i64);
        assert_eq!(record.to_string(), r#"{"a":1,"b":"foo"}"#);
    }

    #[test]
    fn test_generic_enum() {
        let symbols: Vec<String> = vec!["diamonds".into(), "spades".into(), "clubs".into()];
        let mut value = GenericEnum::new(symbols);
        assert_eq!(value.index(), ENUM_UNSET);
        assert_eq!(value.symbol(), None);

        value.set_index(1);
        assert_eq!(value.symbol(), Some("spades"));

        assert!(value.set_symbol("clubs"));
        assert_eq!(value.index(), 2);

        assert!(!value.set_symbol("hearts"));
        assert_eq!(value.index(), 2);
    }

    #[test]
    fn test_value_display() {
        let mut map = HashMap::new();
        map.insert("k".to_string(), Value::Bytes(vec![1, 2]));
        assert_eq!(Value::Map(map).to_string(), r#"{"k":[1,2]}"#);
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(
            Value::Array(vec![Value::Int(1), Value::Int(2)]).to_string(),
            "[1,2]"
        );
    }
}
