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
use crate::util::MapHelper;
use crate::validator::{validate_namespace, validate_schema_name};
use crate::{AvroResult, Error, Schema};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Represents names for `record`, `enum` and `fixed` Avro schemas.
///
/// Each of these `Schema`s has a `fullname` composed of two parts:
///   * a name
///   * a namespace
///
/// `aliases` can also be defined to facilitate schema evolution.
///
/// More information about schema names can be found in the
/// [Avro specification](https://avro.apache.org/docs/++version++/specification/#names)
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Name {
    pub name: String,
    pub namespace: Namespace,
}

/// Represents the aliases for a named schema
pub type Aliases = Option<Vec<Alias>>;
/// Represents schema lookup within a parsed schema environment
pub type Names = HashMap<Name, Schema>;
/// Represents the namespace of a named schema
pub type Namespace = Option<String>;

impl Name {
    /// Create a new `Name`.
    /// Parses the optional `namespace` from the `name` string.
    pub fn new(name: &str) -> AvroResult<Self> {
        let (name, namespace) = Name::get_name_and_namespace(name)?;
        Ok(Self {
            name,
            namespace: namespace.filter(|ns| !ns.is_empty()),
        })
    }

    fn get_name_and_namespace(name: &str) -> AvroResult<(String, Namespace)> {
        let index_of_name = validate_schema_name(name)?;
        if index_of_name == 0 {
            Ok((name.to_string(), None))
        } else {
            let namespace = &name[..index_of_name - 1];
            validate_namespace(namespace)?;
            Ok((name[index_of_name..].to_string(), Some(namespace.to_string())))
        }
    }

    /// Parse a `serde_json::Map` into a `Name`, taking the namespace from the
    /// `namespace` key or, failing that, from the enclosing schema.
    pub(crate) fn parse(
        complex: &Map<String, Value>,
        enclosing_namespace: &Namespace,
    ) -> AvroResult<Self> {
        let (name, namespace_from_name) = complex
            .name()
            .map(|name| Name::get_name_and_namespace(name.as_str()))
            .ok_or(Details::GetNameField)??;

        let namespace = namespace_from_name
            .or_else(|| {
                complex
                    .string("namespace")
                    .or_else(|| enclosing_namespace.clone())
            })
            .filter(|ns| !ns.is_empty());
        if let Some(ref ns) = namespace {
            validate_namespace(ns)?;
        }

        Ok(Self { name, namespace })
    }

    /// Return the `fullname` of this `Name`
    ///
    /// More information about fullnames can be found in the
    /// [Avro specification](https://avro.apache.org/docs/++version++/specification/#names)
    pub fn fullname(&self, default_namespace: &Namespace) -> String {
        if self.name.contains('.') {
            self.name.clone()
        } else {
            let namespace = self.namespace.clone().or_else(|| default_namespace.clone());
            match namespace {
                Some(ref namespace) if !namespace.is_empty() => {
                    format!("{namespace}.{}", self.name)
                }
                _ => self.name.clone(),
            }
        }
    }

    /// Construct the fully qualified name, resolving a missing namespace from
    /// the enclosing one.
    ///
    /// ```
    /// # use avro_projector::{Error, schema::Name};
    /// assert_eq!(
    ///     Name::new("some_name")?.fully_qualified_name(&Some("some_namespace".into())),
    ///     Name::new("some_namespace.some_name")?
    /// );
    /// # Ok::<(), Error>(())
    /// ```
    pub fn fully_qualified_name(&self, enclosing_namespace: &Namespace) -> Name {
        Name {
            name: self.name.clone(),
            namespace: self
                .namespace
                .clone()
                .or_else(|| enclosing_namespace.clone().filter(|ns| !ns.is_empty())),
        }
    }
}

impl TryFrom<&str> for Name {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fullname(&None)[..])
    }
}

/// Newtype of [`Name`] for the alias lists of named schemas. Aliases are
/// serialized as plain strings in the JSON representation.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Alias(Name);

impl Alias {
    pub fn new(name: &str) -> AvroResult<Self> {
        Name::new(name).map(Self)
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn namespace(&self) -> &Namespace {
        &self.0.namespace
    }

    pub fn fullname(&self, default_namespace: &Namespace) -> String {
        self.0.fullname(default_namespace)
    }

    pub fn fully_qualified_name(&self, default_namespace: &Namespace) -> Name {
        self.0.fully_qualified_name(default_namespace)
    }
}

impl TryFrom<&str> for Alias {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Serialize for Alias {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.fullname(&None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Details;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_name_parts() {
        let name = Name::new("some_namespace.some_name").unwrap();
        assert_eq!(name.name, "some_name");
        assert_eq!(name.namespace, Some("some_namespace".to_string()));
        assert_eq!(name.fullname(&None), "some_namespace.some_name");
    }

    #[test]
    fn test_bare_name_takes_default_namespace() {
        let name = Name::new("some_name").unwrap();
        assert_eq!(name.fullname(&Some("space".into())), "space.some_name");
        assert_eq!(name.fullname(&None), "some_name");
    }

    #[test]
    fn test_own_namespace_wins_over_default() {
        let name = Name::new("mine.some_name").unwrap();
        assert_eq!(name.fullname(&Some("space".into())), "mine.some_name");
    }

    #[test]
    fn test_name_with_whitespace_is_invalid() {
        match Name::new(" ").map_err(Error::into_details) {
            Err(Details::InvalidSchemaName(_, _)) => {}
            other => panic!("Expected Details::InvalidSchemaName, got {other:?}"),
        }
    }

    #[test]
    fn test_name_with_no_name_part_is_invalid() {
        match Name::new("space.").map_err(Error::into_details) {
            Err(Details::InvalidSchemaName(_, _)) => {}
            other => panic!("Expected Details::InvalidSchemaName, got {other:?}"),
        }
    }

    /// Names and namespaces may be built entirely of underscores.
    #[test]
    fn test_funny_valid_names_and_namespaces() {
        for funny_name in ["_", "_._", "__._", "_.__", "_._._"] {
            assert!(Name::new(funny_name).is_ok(), "{funny_name} should parse");
        }
    }
}
