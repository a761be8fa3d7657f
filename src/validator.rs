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

//! Validation of schema names, namespaces, record field names and enum
//! symbols, following the rules in the
//! [Avro specification](https://avro.apache.org/docs/++version++/specification/#names).

use crate::AvroResult;
use crate::error::Details;
use regex_lite::Regex;
use std::sync::OnceLock;

const SCHEMA_NAME_PATTERN: &str = r"^((?P<namespace>([A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*)?)\.)?(?P<name>[A-Za-z_][A-Za-z0-9_]*)$";
const NAMESPACE_PATTERN: &str = r"^([A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*)?$";

fn schema_name_regex() -> &'static Regex {
    static SCHEMA_NAME_ONCE: OnceLock<Regex> = OnceLock::new();
    SCHEMA_NAME_ONCE.get_or_init(|| Regex::new(SCHEMA_NAME_PATTERN).unwrap())
}

fn namespace_regex() -> &'static Regex {
    static NAMESPACE_ONCE: OnceLock<Regex> = OnceLock::new();
    NAMESPACE_ONCE.get_or_init(|| Regex::new(NAMESPACE_PATTERN).unwrap())
}

/// Validates a (possibly dotted) schema name and returns the start byte of
/// the name part within the full name.
pub(crate) fn validate_schema_name(schema_name: &str) -> AvroResult<usize> {
    let caps = schema_name_regex()
        .captures(schema_name)
        .ok_or_else(|| Details::InvalidSchemaName(schema_name.to_string(), SCHEMA_NAME_PATTERN))?;
    Ok(caps
        .name("name")
        .expect("Regex has a group named `name`")
        .start())
}

pub(crate) fn validate_namespace(namespace: &str) -> AvroResult<()> {
    if namespace_regex().is_match(namespace) {
        Ok(())
    } else {
        Err(Details::InvalidNamespace(namespace.to_string(), NAMESPACE_PATTERN).into())
    }
}

/// Record field names share the name part of the schema name rules: one
/// identifier, no dots.
pub(crate) fn validate_record_field_name(field_name: &str) -> AvroResult<()> {
    match validate_schema_name(field_name)? {
        0 => Ok(()),
        _ => Err(Details::InvalidSchemaName(field_name.to_string(), SCHEMA_NAME_PATTERN).into()),
    }
}

pub(crate) fn validate_enum_symbol_name(symbol: &str) -> AvroResult<()> {
    static SYMBOL_ONCE: OnceLock<Regex> = OnceLock::new();
    let regex =
        SYMBOL_ONCE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());
    if regex.is_match(symbol) {
        Ok(())
    } else {
        Err(Details::InvalidEnumSymbolName(symbol.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_validate_schema_name() {
        assert_eq!(validate_schema_name("some_name").unwrap(), 0);
        assert_eq!(validate_schema_name("space.some_name").unwrap(), 6);
        assert!(validate_schema_name("9name").is_err());
        assert!(validate_schema_name(" ").is_err());
        assert!(validate_schema_name("space.").is_err());
    }

    #[test]
    fn test_validate_namespace() {
        assert!(validate_namespace("").is_ok());
        assert!(validate_namespace("com.example").is_ok());
        assert!(validate_namespace("com..example").is_err());
    }

    #[test]
    fn test_validate_record_field_name() {
        assert!(validate_record_field_name("a_field").is_ok());
        assert!(validate_record_field_name("dotted.field").is_err());
    }

    #[test]
    fn test_validate_enum_symbol() {
        assert!(validate_enum_symbol_name("SPADES").is_ok());
        assert!(validate_enum_symbol_name("not valid").is_err());
    }
}
