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

use crate::error::Details;
use crate::schema::{
    EnumSchema, FixedSchema, Names, Namespace, RecordSchema, Schema, UnionSchema,
};
use crate::{AvroResult, Error};

/// A schema bundled with the registry of every named type it defines,
/// keyed by fullname. All [`Schema::Ref`] nodes inside the schema are
/// guaranteed to resolve against that registry.
#[derive(Debug)]
pub struct ResolvedSchema {
    names: Names,
    root: Schema,
}

impl TryFrom<&Schema> for ResolvedSchema {
    type Error = Error;

    fn try_from(schema: &Schema) -> AvroResult<Self> {
        let mut names = Names::default();
        resolve_names(schema, &mut names, &None)?;
        Ok(ResolvedSchema {
            names,
            root: schema.clone(),
        })
    }
}

impl ResolvedSchema {
    pub fn get_root_schema(&self) -> &Schema {
        &self.root
    }

    pub fn get_names(&self) -> &Names {
        &self.names
    }
}

/// Walk `schema` and register every named type in `names`, erroring on
/// colliding definitions and on references to names never defined.
pub(crate) fn resolve_names(
    schema: &Schema,
    names: &mut Names,
    enclosing_namespace: &Namespace,
) -> AvroResult<()> {
    match schema {
        Schema::Array(inner) => resolve_names(&inner.items, names, enclosing_namespace),
        Schema::Map(inner) => resolve_names(&inner.values, names, enclosing_namespace),
        Schema::Union(UnionSchema { schemas, .. }) => {
            for schema in schemas {
                resolve_names(schema, names, enclosing_namespace)?
            }
            Ok(())
        }
        Schema::Enum(EnumSchema { name, .. }) | Schema::Fixed(FixedSchema { name, .. }) => {
            let fully_qualified_name = name.fully_qualified_name(enclosing_namespace);
            if names
                .insert(fully_qualified_name.clone(), schema.clone())
                .is_some()
            {
                Err(Details::AmbiguousSchemaDefinition(fully_qualified_name).into())
            } else {
                Ok(())
            }
        }
        Schema::Record(RecordSchema { name, fields, .. }) => {
            let fully_qualified_name = name.fully_qualified_name(enclosing_namespace);
            if names
                .insert(fully_qualified_name.clone(), schema.clone())
                .is_some()
            {
                Err(Details::AmbiguousSchemaDefinition(fully_qualified_name).into())
            } else {
                let record_namespace = fully_qualified_name.namespace;
                for field in fields {
                    resolve_names(&field.schema, names, &record_namespace)?
                }
                Ok(())
            }
        }
        Schema::Ref { name } => {
            let fully_qualified_name = name.fully_qualified_name(enclosing_namespace);
            if names.contains_key(&fully_qualified_name) || names.contains_key(name) {
                Ok(())
            } else {
                Err(Details::SchemaResolutionError(fully_qualified_name).into())
            }
        }
        _ => Ok(()),
    }
}

/// Follow `Schema::Ref` indirections until a concrete schema is reached.
pub(crate) fn dereference<'s>(
    schema: &'s Schema,
    names: &'s Names,
    enclosing_namespace: &Namespace,
) -> AvroResult<&'s Schema> {
    match schema {
        Schema::Ref { name } => {
            let fully_qualified_name = name.fully_qualified_name(enclosing_namespace);
            names
                .get(&fully_qualified_name)
                .or_else(|| names.get(name))
                .ok_or_else(|| Details::SchemaResolutionError(fully_qualified_name).into())
        }
        _ => Ok(schema),
    }
}
