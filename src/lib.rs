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

//! Decoding of [Apache Avro](https://avro.apache.org/) binary data with full
//! schema-resolution support.
//!
//! The crate is built around one object: the [`Projector`]. Given the schema
//! data was **written** with and the schema a consumer wants to **read** it
//! as, [`Projector::new`] compiles the Avro schema-evolution rules for that
//! pair once; each [`Projector::read_value`] call then decodes one binary
//! datum directly into a reader-shaped value, in a single pass and without
//! backtracking. Supported evolutions are the standard Avro set: numeric and
//! bytes/string promotions, field renames through aliases, dropped writer
//! fields, added reader fields with defaults, and union/non-union
//! conversions, recursively through arrays, maps, records and unions.
//!
//! ```
//! use avro_projector::{Decoder, GenericRecord, Projector, Schema, encode, types::Value};
//!
//! // The schema the bytes were produced with...
//! let writer = Schema::parse_str(r#"{
//!     "type": "record", "name": "Rec",
//!     "fields": [{"name": "id", "type": "int"}]
//! }"#)?;
//! // ...and the schema the consumer expects: `id` widened to a long, plus
//! // a field the writer never knew, filled from its default.
//! let reader = Schema::parse_str(r#"{
//!     "type": "record", "name": "Rec",
//!     "fields": [
//!         {"name": "id", "type": "long"},
//!         {"name": "tag", "type": "string", "default": "none"}
//!     ]
//! }"#)?;
//!
//! let mut record = GenericRecord::new(&writer).unwrap();
//! record.put("id", 7i32);
//! let mut wire = Vec::new();
//! encode(&Value::Record(record), &writer, &mut wire)?;
//!
//! let projector = Projector::new(&reader, &writer)?;
//! let Value::Record(projected) = projector.read_value(&mut Decoder::new(&wire))? else {
//!     unreachable!("the reader schema is a record");
//! };
//! assert_eq!(projected.get("id"), Some(&Value::Long(7)));
//! assert_eq!(projected.get("tag"), Some(&Value::String("none".into())));
//! # Ok::<(), avro_projector::Error>(())
//! ```
//!
//! Reading with identical reader and writer schemas is the degenerate
//! projection and needs no special API.
//!
//! Targets other than [`GenericRecord`] — typically statically-typed structs
//! — are filled through [`Projector::read`] and the [`RecordSink`] contract.
//!
//! # MSRV
//!
//! The current MSRV is 1.88.0.

mod decode;
mod encode;
mod project;
mod util;
mod validator;

pub mod error;
pub mod rabin;
pub mod schema;
pub mod types;

pub use decode::Decoder;
pub use encode::encode;
pub use error::Error;
pub use project::{Projector, RecordSink};
pub use schema::Schema;
pub use types::{GenericEnum, GenericRecord};
pub use util::{DEFAULT_MAX_ALLOCATION_BYTES, max_allocation_bytes};

/// A convenience type alias for `Result`s with `Error`s.
pub type AvroResult<T> = Result<T, Error>;

#[cfg(test)]
mod tests {
    use crate::types::Value;
    use crate::{Decoder, GenericRecord, Projector, Schema, encode};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_same_schema_round_trip() {
        let schema = Schema::parse_str(
            r#"
            {
                "type": "record",
                "name": "test",
                "fields": [
                    {"name": "a", "type": "long", "default": 42},
                    {"name": "b", "type": "string"}
                ]
            }
        "#,
        )
        .unwrap();

        let mut record = GenericRecord::new(&schema).unwrap();
        record.put("a", 27i64);
        record.put("b", "foo");

        let mut wire = Vec::new();
        encode(&Value::Record(record.clone()), &schema, &mut wire).unwrap();

        let projector = Projector::new(&schema, &schema).unwrap();
        let mut decoder = Decoder::new(&wire);
        let decoded = projector.read_value(&mut decoder).unwrap();
        assert_eq!(decoded, Value::Record(record));
        assert!(decoder.is_empty());
    }

    #[test]
    fn test_illformed_length() {
        let schema = Schema::parse_str(
            r#"
            {
                "type": "record",
                "name": "test",
                "fields": [
                    {"name": "a", "type": "long", "default": 42},
                    {"name": "b", "type": "string"}
                ]
            }
        "#,
        )
        .unwrap();

        // Would allocate 18446744073709551605 bytes
        let illformed: &[u8] = &[0x3e, 0x15, 0xff, 0x1f, 0x15, 0xff];

        let projector = Projector::new(&schema, &schema).unwrap();
        let mut decoder = Decoder::new(illformed);
        assert!(projector.read_value(&mut decoder).is_err());
    }
}
