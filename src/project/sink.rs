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

use crate::types::{GenericRecord, Value};

/// The contract between the projection executor and a record-shaped target.
///
/// [`GenericRecord`] implements it by inserting into its field map. A
/// statically-typed record can implement it by matching on the field name and
/// converting the [`Value`] into its own field types; such an implementation
/// may legitimately not know some fields (for example after renames), in
/// which case it hands the value back and the executor discards it.
pub trait RecordSink {
    /// Write `value` into the field called `name`.
    ///
    /// Returns `None` when the value was accepted, or gives the value back
    /// when the target has no field of that name. For a returned value the
    /// executor retries once under the name with its first character
    /// uppercased before giving up on the field.
    fn put_field(&mut self, name: &str, value: Value) -> Option<Value>;
}

impl RecordSink for GenericRecord {
    fn put_field(&mut self, name: &str, value: Value) -> Option<Value> {
        self.put(name, value);
        None
    }
}

/// Deliver `value` under `name`, falling back to the title-cased spelling.
/// A value accepted under neither spelling is dropped.
pub(crate) fn deliver(target: &mut dyn RecordSink, name: &str, value: Value) {
    if let Some(value) = target.put_field(name, value)
        && let Some(title_cased) = title_case(name)
    {
        let _ = target.put_field(&title_cased, value);
    }
}

/// Uppercase the first character only. This is deliberately not a full
/// snake-to-camel conversion; `some_name` becomes `Some_name`.
fn title_case(name: &str) -> Option<String> {
    let mut chars = name.chars();
    let first = chars.next()?;
    if first.is_uppercase() || !first.is_alphabetic() {
        return None;
    }
    let mut result: String = first.to_uppercase().collect();
    result.push_str(chars.as_str());
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Schema;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("some_name"), Some("Some_name".to_string()));
        assert_eq!(title_case("x"), Some("X".to_string()));
        assert_eq!(title_case("Already"), None);
        assert_eq!(title_case("_underscore"), None);
        assert_eq!(title_case(""), None);
    }

    struct Typed {
        sum: i64,
        key: Option<String>,
    }

    impl RecordSink for Typed {
        fn put_field(&mut self, name: &str, value: Value) -> Option<Value> {
            match (name, value) {
                ("sum", Value::Long(n)) => self.sum = n,
                ("key", Value::String(s)) => self.key = Some(s),
                (_, value) => return Some(value),
            }
            None
        }
    }

    #[test]
    fn test_deliver_to_typed_sink() {
        let mut target = Typed { sum: 0, key: None };
        deliver(&mut target, "sum", Value::Long(9));
        deliver(&mut target, "key", Value::String("k".into()));
        // unknown fields are discarded without error
        deliver(&mut target, "gone", Value::Int(1));
        assert_eq!(target.sum, 9);
        assert_eq!(target.key.as_deref(), Some("k"));
    }

    #[test]
    fn test_deliver_to_generic_record() {
        let schema = Schema::parse_str(
            r#"{"type": "record", "name": "R", "fields": [{"name": "a", "type": "int"}]}"#,
        )
        .unwrap();
        let mut record = GenericRecord::new(&schema).unwrap();
        deliver(&mut record, "a", Value::Int(5));
        assert_eq!(record.get("a"), Some(&Value::Int(5)));
    }
}
