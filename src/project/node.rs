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

//! The executable projector tree and its interpreter.
//!
//! A compiled tree mirrors the writer schema: running a node consumes exactly
//! one writer datum from the decoder and produces it shaped the way the
//! reader expects. Structure mismatches are impossible here; the compiler
//! rejected them. What remains data-dependent at decode time is the union
//! tag, the enum index and the integrity of the bytes themselves.

use crate::AvroResult;
use crate::decode::Decoder;
use crate::error::Details;
use crate::project::sink::{RecordSink, deliver};
use crate::types::{GenericEnum, GenericRecord, Value};
use crate::Schema;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

pub(crate) enum Node {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    IntToLong,
    IntToFloat,
    IntToDouble,
    LongToFloat,
    LongToDouble,
    FloatToDouble,
    BytesToString,
    StringToBytes,
    Fixed(usize),
    Enum(EnumNode),
    Array(Box<Node>),
    Map(Box<Node>),
    Union(Vec<Node>),
    Record(Arc<RecordNode>),
    /// A lazily bound link to a record projector that was still being
    /// compiled when this node was created. Bound before compilation
    /// finishes; an unbound link at decode time is a compiler bug.
    Recursive(Arc<OnceLock<Arc<RecordNode>>>),
}

pub(crate) struct EnumNode {
    /// The reader's symbols, shared by every decoded value.
    pub(crate) symbols: Arc<[String]>,
    /// Writer index to reader index. `None` marks a writer symbol the reader
    /// does not know; decoding one fails.
    pub(crate) lookup: Box<[Option<i32>]>,
    /// The writer's symbols, kept for error reporting.
    pub(crate) writer_symbols: Vec<String>,
}

pub(crate) struct RecordNode {
    /// The reader's record schema, handed to every [`GenericRecord`] built
    /// from this node.
    pub(crate) reader_schema: Arc<Schema>,
    /// One entry per writer field, in writer order.
    pub(crate) fields: Vec<FieldNode>,
    /// Precomputed values for reader fields with no writer counterpart,
    /// applied after all writer bytes are consumed.
    pub(crate) defaults: Vec<(String, Value)>,
}

pub(crate) struct FieldNode {
    pub(crate) node: Node,
    /// The reader field this writer field is delivered into. `None` for
    /// writer fields the reader dropped: their bytes are consumed and the
    /// value is discarded.
    pub(crate) target: Option<String>,
}

impl Node {
    /// Decode one writer datum, reshaped for the reader.
    pub(crate) fn unwrap_value(&self, decoder: &mut Decoder<'_>) -> AvroResult<Value> {
        match self {
            Node::Null => {
                decoder.read_null()?;
                Ok(Value::Null)
            }
            Node::Boolean => Ok(Value::Boolean(decoder.read_boolean()?)),
            Node::Int => Ok(Value::Int(decoder.read_int()?)),
            Node::Long => Ok(Value::Long(decoder.read_long()?)),
            Node::Float => Ok(Value::Float(decoder.read_float()?)),
            Node::Double => Ok(Value::Double(decoder.read_double()?)),
            Node::Bytes => Ok(Value::Bytes(decoder.read_bytes()?)),
            Node::String => Ok(Value::String(decoder.read_string()?)),
            Node::IntToLong => Ok(Value::Long(i64::from(decoder.read_int()?))),
            Node::IntToFloat => Ok(Value::Float(decoder.read_int()? as f32)),
            Node::IntToDouble => Ok(Value::Double(f64::from(decoder.read_int()?))),
            Node::LongToFloat => Ok(Value::Float(decoder.read_long()? as f32)),
            Node::LongToDouble => Ok(Value::Double(decoder.read_long()? as f64)),
            Node::FloatToDouble => Ok(Value::Double(f64::from(decoder.read_float()?))),
            Node::BytesToString => {
                let bytes = decoder.read_bytes()?;
                String::from_utf8(bytes)
                    .map(Value::String)
                    .map_err(|e| Details::ConvertToUtf8(e).into())
            }
            Node::StringToBytes => Ok(Value::Bytes(decoder.read_string()?.into_bytes())),
            Node::Fixed(size) => Ok(Value::Fixed(decoder.read_fixed_vec(*size)?)),
            Node::Enum(node) => node.unwrap_value(decoder),
            Node::Array(item) => {
                let mut collected = Vec::new();
                let mut count = decoder.read_array_start()?;
                while count != 0 {
                    for _ in 0..count {
                        collected.push(item.unwrap_value(decoder)?);
                    }
                    count = decoder.read_array_next()?;
                }
                Ok(Value::Array(collected))
            }
            Node::Map(value) => {
                let mut collected = HashMap::new();
                let mut count = decoder.read_map_start()?;
                while count != 0 {
                    for _ in 0..count {
                        let key = decoder.read_string()?;
                        collected.insert(key, value.unwrap_value(decoder)?);
                    }
                    count = decoder.read_map_next()?;
                }
                Ok(Value::Map(collected))
            }
            Node::Union(branches) => {
                let index = decoder.read_union_index()?;
                let branch = usize::try_from(index)
                    .ok()
                    .and_then(|i| branches.get(i))
                    .ok_or(Details::UnknownUnionBranch {
                        index,
                        num_variants: branches.len(),
                    })?;
                branch.unwrap_value(decoder)
            }
            Node::Record(record) => record.unwrap_value(decoder),
            Node::Recursive(link) => link
                .get()
                .expect("recursive projector was bound during compilation")
                .unwrap_value(decoder),
        }
    }
}

impl EnumNode {
    fn unwrap_value(&self, decoder: &mut Decoder<'_>) -> AvroResult<Value> {
        let index = decoder.read_enum()?;
        let mapped = usize::try_from(index)
            .ok()
            .and_then(|i| self.lookup.get(i))
            .ok_or(Details::EnumIndexOutOfRange {
                index: i64::from(index),
                nsymbols: self.writer_symbols.len(),
            })?;
        match mapped {
            Some(reader_index) => Ok(Value::Enum(GenericEnum::with_index(
                self.symbols.clone(),
                *reader_index,
            ))),
            None => {
                Err(Details::UnknownEnumSymbol(self.writer_symbols[index as usize].clone()).into())
            }
        }
    }
}

impl RecordNode {
    /// Decode one writer record into a fresh [`GenericRecord`].
    pub(crate) fn unwrap_value(&self, decoder: &mut Decoder<'_>) -> AvroResult<Value> {
        let mut record = GenericRecord::from_arc(self.reader_schema.clone());
        self.project(&mut record, decoder)?;
        Ok(Value::Record(record))
    }

    /// Decode one writer record, delivering field values into `target`.
    ///
    /// Writer fields are consumed strictly in writer order; deleted fields
    /// are decoded and dropped. Defaults for reader fields without a writer
    /// counterpart are applied after the last writer byte of the record.
    pub(crate) fn project(
        &self,
        target: &mut dyn RecordSink,
        decoder: &mut Decoder<'_>,
    ) -> AvroResult<()> {
        for field in &self.fields {
            let value = field.node.unwrap_value(decoder)?;
            if let Some(name) = &field.target {
                deliver(target, name, value);
            }
        }
        for (name, value) in &self.defaults {
            deliver(target, name, value.clone());
        }
        Ok(())
    }
}
