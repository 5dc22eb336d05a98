// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Field schema for structured extraction

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Fields of a Japanese real-estate registry certificate (登記簿謄本), in report order
pub const REGISTRY_CERTIFICATE_FIELDS: [&str; 15] = [
    "不動産の表示",
    "所在",
    "地番",
    "地目",
    "地積",
    "所有者の氏名又は名称",
    "住所",
    "持分",
    "登記の目的",
    "受付年月日・受付番号",
    "登記原因",
    "権利者その他の事項",
    "建物の表示",
    "家屋番号",
    "構造",
];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("field schema must contain at least one field")]
    Empty,

    #[error("field name at position {index} is blank")]
    BlankField { index: usize },

    #[error("duplicate field name: {0}")]
    DuplicateField(String),
}

/// Ordered, validated set of field names to extract
///
/// Every extraction result carries exactly these keys, in this order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct FieldSchema {
    fields: Vec<String>,
}

impl FieldSchema {
    pub fn new<I, S>(fields: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(|f| f.into().trim().to_string()).collect();

        if fields.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut seen = HashSet::new();
        for (index, field) in fields.iter().enumerate() {
            if field.is_empty() {
                return Err(SchemaError::BlankField { index });
            }
            if !seen.insert(field.as_str()) {
                return Err(SchemaError::DuplicateField(field.clone()));
            }
        }

        Ok(Self { fields })
    }

    /// The registry certificate schema
    pub fn registry_certificate() -> Self {
        Self {
            fields: REGISTRY_CERTIFICATE_FIELDS
                .iter()
                .map(|f| f.to_string())
                .collect(),
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false for a constructed schema; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self::registry_certificate()
    }
}

impl TryFrom<Vec<String>> for FieldSchema {
    type Error = SchemaError;

    fn try_from(fields: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(fields)
    }
}

impl From<FieldSchema> for Vec<String> {
    fn from(schema: FieldSchema) -> Self {
        schema.fields
    }
}
