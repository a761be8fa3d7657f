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
use crate::schema::{Schema, SchemaKind};
use std::collections::BTreeMap;

/// A description of a Union schema
#[derive(Debug, Clone)]
pub struct UnionSchema {
    /// The members that make up this union
    pub(crate) schemas: Vec<Schema>,
    // Used to ensure uniqueness of unnamed member types and to find the
    // member index for a value in constant time. Named members (records,
    // enums, fixeds) are instead distinguished by their fullname.
    variant_index: BTreeMap<SchemaKind, usize>,
}

impl UnionSchema {
    /// Creates a new UnionSchema from a vector of member schemas.
    ///
    /// # Errors
    /// Will return an error if `schemas` contains a union, or two unnamed
    /// members of the same kind, or two named members with the same fullname.
    pub fn new(schemas: Vec<Schema>) -> AvroResult<Self> {
        let mut vindex = BTreeMap::new();
        for (i, schema) in schemas.iter().enumerate() {
            if let Schema::Union(_) = schema {
                return Err(Details::NestedUnion.into());
            }
            if schema.is_named() {
                let fullname = schema
                    .name()
                    .expect("Named schemas always have a name")
                    .fullname(&None);
                let duplicate = schemas[..i].iter().any(|prev| {
                    prev.name()
                        .is_some_and(|name| name.fullname(&None) == fullname)
                });
                if duplicate {
                    return Err(Details::UnionDuplicate.into());
                }
            } else if vindex.insert(SchemaKind::from(schema), i).is_some() {
                return Err(Details::UnionDuplicate.into());
            }
        }
        Ok(UnionSchema {
            schemas,
            variant_index: vindex,
        })
    }

    /// Returns a slice of all members of this union.
    pub fn variants(&self) -> &[Schema] {
        &self.schemas
    }

    /// Returns true if any of the members of this union is `Null`.
    pub fn is_nullable(&self) -> bool {
        self.schemas.iter().any(|x| matches!(x, Schema::Null))
    }

    /// The member index for an unnamed member kind, if present.
    pub(crate) fn find_kind(&self, kind: SchemaKind) -> Option<usize> {
        self.variant_index.get(&kind).copied()
    }
}

// No need to compare variant_index, it is derivative of schemas.
impl PartialEq for UnionSchema {
    fn eq(&self, other: &UnionSchema) -> bool {
        self.schemas.eq(&other.schemas)
    }
}
