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

//! Schema resolution as a compiled projection.
//!
//! A [`Projector`] is built once from a (reader, writer) schema pair and can
//! then decode any number of payloads written under the writer schema,
//! delivering each datum already shaped the way the reader schema expects:
//! numeric and textual promotions applied, renamed fields matched through
//! their aliases, dropped writer fields consumed and discarded, added reader
//! fields filled from their defaults.
//!
//! All structural checking happens eagerly during compilation, so an
//! incompatible schema pair is an error from [`Projector::new`], never a
//! surprise mid-decode.

mod defaults;
mod node;
mod sink;

pub use sink::RecordSink;

use crate::AvroResult;
use crate::decode::Decoder;
use crate::error::Details;
use crate::project::defaults::normalize_default;
use crate::project::node::{EnumNode, FieldNode, Node, RecordNode};
use crate::schema::{
    EnumSchema, Name, Names, Namespace, RecordSchema, Schema, SchemaKind,
    UnionSchema, resolve_names,
};
use crate::types::Value;
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// A compiled projection from a writer schema into a reader schema.
///
/// Immutable once built; a single `Projector` may be shared freely between
/// threads and reused for any number of decoders.
pub struct Projector {
    reader: Schema,
    writer: Schema,
    root: Node,
}

impl Projector {
    /// Compile a projector for data written with `writer` and consumed as
    /// `reader`.
    ///
    /// Passing the same schema twice yields a plain decoder for that schema.
    pub fn new(reader: &Schema, writer: &Schema) -> AvroResult<Self> {
        let mut reader_names = Names::default();
        resolve_names(reader, &mut reader_names, &None)?;
        let mut writer_names = Names::default();
        resolve_names(writer, &mut writer_names, &None)?;

        debug!(
            "Compiling projector from writer {} to reader {}",
            SchemaKind::from(writer),
            SchemaKind::from(reader)
        );

        let mut compiler = Compiler {
            reader_names,
            writer_names,
            in_progress: HashMap::new(),
        };
        let root = compiler.compile(reader, writer, &None, &None, false)?;

        Ok(Self {
            reader: reader.clone(),
            writer: writer.clone(),
            root,
        })
    }

    pub fn reader_schema(&self) -> &Schema {
        &self.reader
    }

    pub fn writer_schema(&self) -> &Schema {
        &self.writer
    }

    /// Decode one writer datum and return it as a reader-shaped [`Value`].
    pub fn read_value(&self, decoder: &mut Decoder<'_>) -> AvroResult<Value> {
        self.root.unwrap_value(decoder)
    }

    /// Decode one writer datum into `target`.
    ///
    /// The reader schema must be a record; for any other shape use
    /// [`read_value`](Self::read_value). Fields are located on the target by
    /// the reader's declared field name and then by that name with its first
    /// character uppercased; fields the target does not know are consumed and
    /// discarded. A decode error leaves the target partially populated and it
    /// should be thrown away.
    pub fn read(&self, target: &mut dyn RecordSink, decoder: &mut Decoder<'_>) -> AvroResult<()> {
        match &self.root {
            Node::Record(record) => record.project(target, decoder),
            _ => Err(Details::BadTarget(
                "the reader schema is not a record".to_string(),
            )
            .into()),
        }
    }
}

/// Key of a record pair being compiled: the skip flag (identity projections
/// for dropped writer fields live in their own space), the reader fullname
/// and the writer fullname.
type RecordKey = (bool, Name, Name);

struct Compiler {
    reader_names: Names,
    writer_names: Names,
    /// Record pairs already compiled or still on the stack, for sharing and
    /// for tying recursive references back to their record projector.
    in_progress: HashMap<RecordKey, Arc<OnceLock<Arc<RecordNode>>>>,
}

impl Compiler {
    fn reader_names(&self, skip: bool) -> &Names {
        // A skip projector decodes writer data as itself, so its "reader"
        // side lives in the writer's name registry.
        if skip { &self.writer_names } else { &self.reader_names }
    }

    fn deref_reader(&self, schema: &Schema, ns: &Namespace, skip: bool) -> AvroResult<Schema> {
        match schema {
            Schema::Ref { name } => {
                let names = self.reader_names(skip);
                let fqn = name.fully_qualified_name(ns);
                names
                    .get(&fqn)
                    .or_else(|| names.get(name))
                    .cloned()
                    .ok_or_else(|| Details::SchemaResolutionError(fqn).into())
            }
            _ => Ok(schema.clone()),
        }
    }

    fn deref_writer(&self, schema: &Schema, ns: &Namespace) -> AvroResult<Schema> {
        match schema {
            Schema::Ref { name } => {
                let fqn = name.fully_qualified_name(ns);
                self.writer_names
                    .get(&fqn)
                    .or_else(|| self.writer_names.get(name))
                    .cloned()
                    .ok_or_else(|| Details::SchemaResolutionError(fqn).into())
            }
            _ => Ok(schema.clone()),
        }
    }

    /// Compile the projector for one (reader, writer) pair.
    ///
    /// With `skip` set, both sides are writer schemas and the result is an
    /// identity decoder whose output will be discarded.
    fn compile(
        &mut self,
        reader: &Schema,
        writer: &Schema,
        r_ns: &Namespace,
        w_ns: &Namespace,
        skip: bool,
    ) -> AvroResult<Node> {
        let reader = self.deref_reader(reader, r_ns, skip)?;
        let writer = self.deref_writer(writer, w_ns)?;

        // The writer union drives the decode: the tag on the wire selects
        // one projector per writer member.
        if let Schema::Union(writer_union) = &writer {
            return self.compile_writer_union(&reader, writer_union, r_ns, w_ns, skip);
        }

        // Writer is not a union but the reader is: the first reader member
        // matching the writer absorbs every datum.
        if let Schema::Union(reader_union) = &reader {
            let member = self
                .find_reader_member(reader_union, &writer, r_ns, w_ns, skip)?
                .ok_or(Details::NoMatchingUnionBranch)?;
            return self.compile(&member, &writer, r_ns, w_ns, skip);
        }

        match (&reader, &writer) {
            (Schema::Null, Schema::Null) => Ok(Node::Null),
            (Schema::Boolean, Schema::Boolean) => Ok(Node::Boolean),
            (Schema::Int, Schema::Int) => Ok(Node::Int),
            (Schema::Long, Schema::Int) => Ok(Node::IntToLong),
            (Schema::Float, Schema::Int) => Ok(Node::IntToFloat),
            (Schema::Double, Schema::Int) => Ok(Node::IntToDouble),
            (Schema::Long, Schema::Long) => Ok(Node::Long),
            (Schema::Float, Schema::Long) => Ok(Node::LongToFloat),
            (Schema::Double, Schema::Long) => Ok(Node::LongToDouble),
            (Schema::Float, Schema::Float) => Ok(Node::Float),
            (Schema::Double, Schema::Float) => Ok(Node::FloatToDouble),
            (Schema::Double, Schema::Double) => Ok(Node::Double),
            (Schema::Bytes, Schema::Bytes) => Ok(Node::Bytes),
            (Schema::String, Schema::Bytes) => Ok(Node::BytesToString),
            (Schema::String, Schema::String) => Ok(Node::String),
            (Schema::Bytes, Schema::String) => Ok(Node::StringToBytes),
            (Schema::Fixed(reader_fixed), Schema::Fixed(writer_fixed)) => {
                if reader_fixed.size == writer_fixed.size {
                    Ok(Node::Fixed(writer_fixed.size))
                } else {
                    Err(Details::FixedSizeMismatch {
                        reader: reader_fixed.size,
                        writer: writer_fixed.size,
                    }
                    .into())
                }
            }
            (Schema::Enum(reader_enum), Schema::Enum(writer_enum)) => {
                Ok(Node::Enum(compile_enum(reader_enum, writer_enum)))
            }
            (Schema::Array(reader_array), Schema::Array(writer_array)) => {
                let items =
                    self.compile(&reader_array.items, &writer_array.items, r_ns, w_ns, skip)?;
                Ok(Node::Array(Box::new(items)))
            }
            (Schema::Map(reader_map), Schema::Map(writer_map)) => {
                let values =
                    self.compile(&reader_map.values, &writer_map.values, r_ns, w_ns, skip)?;
                Ok(Node::Map(Box::new(values)))
            }
            (Schema::Record(reader_record), Schema::Record(writer_record)) => {
                self.compile_record(reader_record, writer_record, r_ns, w_ns, skip)
            }
            (reader, writer) => Err(Details::IncompatibleProjection {
                writer: SchemaKind::from(writer),
                reader: SchemaKind::from(reader),
            }
            .into()),
        }
    }

    /// An identity projector over a writer schema; used to consume the bytes
    /// of writer data the reader has no interest in.
    fn compile_skip(&mut self, writer: &Schema, w_ns: &Namespace) -> AvroResult<Node> {
        self.compile(writer, writer, w_ns, w_ns, true)
    }

    fn compile_writer_union(
        &mut self,
        reader: &Schema,
        writer_union: &UnionSchema,
        r_ns: &Namespace,
        w_ns: &Namespace,
        skip: bool,
    ) -> AvroResult<Node> {
        let mut branches = Vec::with_capacity(writer_union.variants().len());

        if let Schema::Union(reader_union) = reader {
            // Union to union: match each writer member against the reader
            // union so renames and promotions inside branches resolve; an
            // unmatched member still consumes its bytes.
            for member in writer_union.variants() {
                match self.find_reader_member(reader_union, member, r_ns, w_ns, skip)? {
                    Some(reader_member) => {
                        branches.push(self.compile(&reader_member, member, r_ns, w_ns, skip)?)
                    }
                    None => branches.push(self.compile_skip(member, w_ns)?),
                }
            }
        } else {
            // Union to non-union: members matching the reader project into
            // it, the rest only consume. At least one member must match.
            let mut any_match = false;
            for member in writer_union.variants() {
                if self.schemas_match(reader, member, r_ns, w_ns, skip)? {
                    any_match = true;
                    branches.push(self.compile(reader, member, r_ns, w_ns, skip)?);
                } else {
                    branches.push(self.compile_skip(member, w_ns)?);
                }
            }
            if !any_match {
                return Err(Details::NoMatchingUnionBranch.into());
            }
        }

        Ok(Node::Union(branches))
    }

    /// The first member of a reader union that can absorb `writer`, if any.
    fn find_reader_member(
        &self,
        reader_union: &UnionSchema,
        writer: &Schema,
        r_ns: &Namespace,
        w_ns: &Namespace,
        skip: bool,
    ) -> AvroResult<Option<Schema>> {
        for member in reader_union.variants() {
            if self.schemas_match(member, writer, r_ns, w_ns, skip)? {
                return Ok(Some(member.clone()));
            }
        }
        Ok(None)
    }

    /// Whether a writer datum of `writer`'s type can be delivered into
    /// `reader`: same type category, with named types matched by fullname or
    /// reader alias, plus the Avro promotions.
    fn schemas_match(
        &self,
        reader: &Schema,
        writer: &Schema,
        r_ns: &Namespace,
        w_ns: &Namespace,
        skip: bool,
    ) -> AvroResult<bool> {
        let reader = self.deref_reader(reader, r_ns, skip)?;
        let writer = self.deref_writer(writer, w_ns)?;

        Ok(match (&reader, &writer) {
            (Schema::Record(reader_record), Schema::Record(writer_record)) => named_match(
                &reader_record.name,
                &reader_record.aliases,
                &writer_record.name,
                r_ns,
                w_ns,
            ),
            (Schema::Enum(reader_enum), Schema::Enum(writer_enum)) => named_match(
                &reader_enum.name,
                &reader_enum.aliases,
                &writer_enum.name,
                r_ns,
                w_ns,
            ),
            (Schema::Fixed(reader_fixed), Schema::Fixed(writer_fixed)) => named_match(
                &reader_fixed.name,
                &reader_fixed.aliases,
                &writer_fixed.name,
                r_ns,
                w_ns,
            ),
            _ => {
                let reader_kind = SchemaKind::from(&reader);
                let writer_kind = SchemaKind::from(&writer);
                if reader.is_named() || writer.is_named() {
                    false
                } else {
                    reader_kind == writer_kind
                        || matches!(
                            (writer_kind, reader_kind),
                            (SchemaKind::Int, SchemaKind::Long)
                                | (SchemaKind::Int, SchemaKind::Float)
                                | (SchemaKind::Int, SchemaKind::Double)
                                | (SchemaKind::Long, SchemaKind::Float)
                                | (SchemaKind::Long, SchemaKind::Double)
                                | (SchemaKind::Float, SchemaKind::Double)
                                | (SchemaKind::Bytes, SchemaKind::String)
                                | (SchemaKind::String, SchemaKind::Bytes)
                        )
                }
            }
        })
    }

    fn compile_record(
        &mut self,
        reader: &RecordSchema,
        writer: &RecordSchema,
        r_ns: &Namespace,
        w_ns: &Namespace,
        skip: bool,
    ) -> AvroResult<Node> {
        let reader_fqn = reader.name.fully_qualified_name(r_ns);
        let writer_fqn = writer.name.fully_qualified_name(w_ns);
        let key = (skip, reader_fqn.clone(), writer_fqn.clone());

        if let Some(link) = self.in_progress.get(&key) {
            // Either compiled before (shared) or an enclosing frame is still
            // working on it (recursive).
            return Ok(match link.get() {
                Some(done) => Node::Record(done.clone()),
                None => Node::Recursive(link.clone()),
            });
        }
        let link: Arc<OnceLock<Arc<RecordNode>>> = Arc::new(OnceLock::new());
        self.in_progress.insert(key, link.clone());

        debug!("Compiling record projection {writer_fqn} -> {reader_fqn}");

        let r_inner_ns = reader_fqn.namespace.clone();
        let w_inner_ns = writer_fqn.namespace.clone();

        let mut used = vec![false; reader.fields.len()];
        let mut fields = Vec::with_capacity(writer.fields.len());
        for w_field in &writer.fields {
            // A direct name match wins over an alias match; within each, the
            // earliest reader field in declaration order wins, and a reader
            // field is matched at most once.
            let matched = reader
                .fields
                .iter()
                .enumerate()
                .position(|(i, r_field)| !used[i] && r_field.name == w_field.name)
                .or_else(|| {
                    reader.fields.iter().enumerate().position(|(i, r_field)| {
                        !used[i] && r_field.aliases.iter().any(|alias| *alias == w_field.name)
                    })
                });

            match matched {
                Some(i) => {
                    used[i] = true;
                    let r_field = &reader.fields[i];
                    let node =
                        self.compile(&r_field.schema, &w_field.schema, &r_inner_ns, &w_inner_ns, skip)?;
                    fields.push(FieldNode {
                        node,
                        target: Some(r_field.name.clone()),
                    });
                }
                None => {
                    let node = self.compile_skip(&w_field.schema, &w_inner_ns)?;
                    fields.push(FieldNode { node, target: None });
                }
            }
        }

        let mut defaults = Vec::new();
        for (i, r_field) in reader.fields.iter().enumerate() {
            if used[i] {
                continue;
            }
            match &r_field.default {
                Some(json) => {
                    let value = normalize_default(
                        &r_field.schema,
                        json,
                        self.reader_names(skip),
                        &r_inner_ns,
                    )?;
                    defaults.push((r_field.name.clone(), value));
                }
                None => {
                    return Err(Details::MissingField {
                        record: reader_fqn.fullname(&None),
                        field: r_field.name.clone(),
                    }
                    .into());
                }
            }
        }

        let node = Arc::new(RecordNode {
            reader_schema: Arc::new(Schema::Record(reader.clone())),
            fields,
            defaults,
        });
        link.set(node.clone())
            .unwrap_or_else(|_| unreachable!("record projector bound twice"));
        Ok(Node::Record(node))
    }
}

fn compile_enum(reader: &EnumSchema, writer: &EnumSchema) -> EnumNode {
    let symbols: Arc<[String]> = reader.symbols.clone().into();
    let lookup = writer
        .symbols
        .iter()
        .map(|w_symbol| {
            reader
                .symbols
                .iter()
                .position(|r_symbol| r_symbol == w_symbol)
                .map(|i| i as i32)
        })
        .collect();
    EnumNode {
        symbols,
        lookup,
        writer_symbols: writer.symbols.clone(),
    }
}

fn named_match(
    reader_name: &Name,
    reader_aliases: &Option<Vec<crate::schema::Alias>>,
    writer_name: &Name,
    r_ns: &Namespace,
    w_ns: &Namespace,
) -> bool {
    let writer_fullname = writer_name.fully_qualified_name(w_ns).fullname(&None);
    if reader_name.fully_qualified_name(r_ns).fullname(&None) == writer_fullname {
        return true;
    }
    match reader_aliases {
        Some(aliases) => aliases.iter().any(|alias| {
            alias.fully_qualified_name(&reader_name.fully_qualified_name(r_ns).namespace)
                .fullname(&None)
                == writer_fullname
        }),
        None => false,
    }
}
