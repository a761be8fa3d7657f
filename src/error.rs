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

use crate::schema::{Name, SchemaKind};
use crate::types::ValueKind;

/// Errors raised while parsing schemas, compiling projectors or decoding data.
///
/// To inspect the precise cause use [`details`](Self::details) or
/// [`into_details`](Self::into_details) to get at the [`Details`] variant.
#[derive(thiserror::Error, Debug)]
#[repr(transparent)]
#[error(transparent)]
pub struct Error {
    details: Box<Details>,
}

impl Error {
    pub fn new(details: Details) -> Self {
        Self {
            details: Box::new(details),
        }
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn into_details(self) -> Details {
        *self.details
    }
}

impl From<Details> for Error {
    fn from(details: Details) -> Self {
        Self::new(details)
    }
}

/// The concrete error cases.
///
/// Boxed inside [`Error`] to keep `Result` payloads a single pointer wide.
#[derive(thiserror::Error, Debug)]
pub enum Details {
    // --- schema parsing -----------------------------------------------------
    #[error("Failed to parse schema from JSON")]
    ParseSchemaJson(#[source] serde_json::Error),

    #[error("Must be a JSON string, object or array")]
    ParseSchemaFromValidJson,

    #[error("Unknown type name: {0}")]
    UnknownTypeName(String),

    #[error("Failed to read schema from file")]
    ReadSchemaFromFile(#[source] std::io::Error),

    #[error("Unions may not directly contain a union")]
    NestedUnion,

    #[error("Unions cannot contain two members of the same type")]
    UnionDuplicate,

    #[error("Union type should not be empty")]
    EmptyUnion,

    #[error("No `name` field")]
    GetNameField,

    #[error("No `name` in record field")]
    GetNameFieldFromRecord,

    #[error("No `type` in record field")]
    GetRecordFieldTypeField,

    #[error("Record fields must be a JSON array")]
    GetRecordFieldsJson,

    #[error("No `symbols` field in enum, or it is not an array of strings")]
    GetEnumSymbolsField,

    #[error("No `items` in array")]
    GetArrayItemsField,

    #[error("No `values` in map")]
    GetMapValuesField,

    #[error("No `size` in fixed")]
    GetFixedSizeField,

    #[error("`size` in fixed must be a non-negative integer: {0:?}")]
    GetFixedSizeFieldPositive(serde_json::Value),

    #[error("No `type` field found for complex schema")]
    GetComplexTypeField,

    #[error("Invalid `type` value in complex schema: {0:?}")]
    GetComplexType(serde_json::Value),

    #[error("Duplicate field name in record: {0}")]
    FieldNameDuplicate(String),

    #[error("Duplicate enum symbol: {0}")]
    EnumSymbolDuplicate(String),

    #[error("Invalid schema name {0}. It must match the regex {1}")]
    InvalidSchemaName(String, &'static str),

    #[error("Invalid namespace {0}. It must match the regex {1}")]
    InvalidNamespace(String, &'static str),

    #[error("Invalid enum symbol name {0}")]
    InvalidEnumSymbolName(String),

    #[error("Default value {value} does not match the {schema} type it is declared for")]
    GetDefaultValue {
        schema: SchemaKind,
        value: serde_json::Value,
    },

    // --- schema references --------------------------------------------------
    #[error("Failed to resolve schema reference: {0}")]
    SchemaResolutionError(Name),

    #[error("Two named schemas with the same fullname: {0}")]
    AmbiguousSchemaDefinition(Name),

    // --- projector compilation ----------------------------------------------
    #[error("Impossible projection from writer {writer} to reader {reader}")]
    IncompatibleProjection {
        writer: SchemaKind,
        reader: SchemaKind,
    },

    #[error("Reader field {record}.{field} has no writer counterpart and no default")]
    MissingField { record: String, field: String },

    #[error("Fixed size mismatch: reader expects {reader} bytes, writer wrote {writer}")]
    FixedSizeMismatch { reader: usize, writer: usize },

    #[error("No member of the writer union can be projected into the reader schema")]
    NoMatchingUnionBranch,

    // --- decoding -----------------------------------------------------------
    #[error("Unexpected end of input while decoding")]
    UnexpectedEof,

    #[error("Variable-length integer does not fit in {0} bytes")]
    IntegerOverflow(usize),

    #[error("Decoded long {0} does not fit in an int")]
    ZagI32(i64),

    #[error("Invalid byte for boolean: {0}")]
    BoolValue(u8),

    #[error("Invalid utf-8 string")]
    ConvertToUtf8(#[source] std::string::FromUtf8Error),

    #[error("Negative length prefix: {0}")]
    NegativeLength(i64),

    #[error("Unable to allocate {desired} bytes (maximum allowed: {maximum})")]
    MemoryAllocation { desired: usize, maximum: usize },

    #[error("Union tag {index} out of bounds for a union of {num_variants} members")]
    UnknownUnionBranch { index: i64, num_variants: usize },

    #[error("Writer enum symbol {0:?} is not among the reader's symbols")]
    UnknownEnumSymbol(String),

    #[error("Enum index {index} out of bounds for {nsymbols} symbols")]
    EnumIndexOutOfRange { index: i64, nsymbols: usize },

    // --- targets and encoding -----------------------------------------------
    #[error("Bad projection target: {0}")]
    BadTarget(String),

    #[error("Value {value:?} cannot be encoded with schema {schema}")]
    EncodeValueWrongType { value: ValueKind, schema: SchemaKind },

    #[error("No member of the union matches the value {0:?}")]
    EncodeUnionBranch(ValueKind),

    #[error("Record value is missing field {0:?} required by its schema")]
    EncodeMissingField(String),

    #[error("Enum value carries no symbol index")]
    EncodeEnumUnset,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn error_is_one_pointer_wide() {
        assert_eq!(std::mem::size_of::<Error>(), std::mem::size_of::<usize>());
    }

    #[test]
    fn details_round_trip() {
        let err = Error::new(Details::UnexpectedEof);
        assert!(matches!(err.details(), Details::UnexpectedEof));
        assert!(matches!(err.into_details(), Details::UnexpectedEof));
    }
}
