//! Resource schemas
//!
//! A [`ResourceSchema`] declares, per resource kind, the set of accepted
//! configuration fields and nested blocks. Schemas are plain data consulted by
//! the codec at every boundary crossing; they are built once at startup and
//! never mutated afterwards.
//!
//! Construction errors (duplicate field names, zero-cardinality blocks) are
//! programmer errors and panic at build time, never at runtime.

pub mod registry;

use crate::error::{MapperError, Result};
use crate::record::FieldMap;
use serde_json::Value;

/// Semantic type of a configuration field.
///
/// The remote API is loosely typed; these types drive coercion on decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Plain text value.
    String,
    /// Boolean carried as `"true"`/`"false"` text, the way the remote API
    /// round-trips flags.
    BoolString,
}

/// Describes one configuration field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
    pub computed: bool,
    /// Changing this field cannot be applied in place; the resource must be
    /// destroyed and recreated.
    pub force_new: bool,
    /// Filled into the payload at encode time when the field is absent.
    /// Never applied on decode.
    pub default: Option<Value>,
    pub description: &'static str,
}

impl FieldSpec {
    pub fn string(name: &'static str) -> Self {
        Self::new(name, FieldType::String)
    }

    pub fn bool_string(name: &'static str) -> Self {
        Self::new(name, FieldType::BoolString)
    }

    fn new(name: &'static str, field_type: FieldType) -> Self {
        FieldSpec {
            name,
            field_type,
            required: false,
            computed: false,
            force_new: false,
            default: None,
            description: "",
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }
}

/// A nested sub-block: a named inner schema with a cardinality bound.
#[derive(Debug, Clone)]
pub struct BlockSpec {
    pub name: &'static str,
    /// Maximum number of entries accepted in configuration (typically 1).
    pub max_items: usize,
    pub fields: Vec<FieldSpec>,
    pub description: &'static str,
}

impl BlockSpec {
    pub fn new(name: &'static str, max_items: usize, fields: Vec<FieldSpec>) -> Self {
        assert!(max_items > 0, "block {name:?} must accept at least one entry");
        let mut seen: Vec<&str> = Vec::new();
        for spec in &fields {
            if seen.contains(&spec.name) {
                panic!("duplicate field {:?} in block {:?}", spec.name, name);
            }
            seen.push(spec.name);
        }
        BlockSpec {
            name,
            max_items,
            fields,
            description: "",
        }
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Declaration-ordered field and block table for one resource kind.
#[derive(Debug, Clone, Default)]
pub struct ResourceSchema {
    fields: Vec<FieldSpec>,
    blocks: Vec<BlockSpec>,
}

impl ResourceSchema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter()
    }

    pub fn block(&self, name: &str) -> Option<&BlockSpec> {
        self.blocks.iter().find(|b| b.name == name)
    }

    pub fn blocks(&self) -> impl Iterator<Item = &BlockSpec> {
        self.blocks.iter()
    }

    /// Validate a configuration field map against this schema.
    ///
    /// Runs before any encode or remote call. Checks, in order: unknown
    /// fields, value shapes, block cardinality, block entry contents, and
    /// required-field presence (inside each present block, and at top level).
    pub fn validate(&self, fields: &FieldMap) -> Result<()> {
        for (name, value) in fields {
            if let Some(block) = self.block(name) {
                validate_block(block, value)?;
            } else if let Some(spec) = self.field(name) {
                validate_scalar(spec, value, None)?;
            } else {
                return Err(MapperError::invalid(format!(
                    "unknown field {name:?}"
                )));
            }
        }

        for spec in &self.fields {
            if spec.required && !fields.contains_key(spec.name) {
                return Err(MapperError::invalid(format!(
                    "required field {:?} is missing",
                    spec.name
                )));
            }
        }

        Ok(())
    }
}

fn validate_block(block: &BlockSpec, value: &Value) -> Result<()> {
    let entries = match value {
        Value::Array(entries) => entries,
        _ => {
            return Err(MapperError::invalid(format!(
                "block {:?} must be a list of entries",
                block.name
            )))
        }
    };

    if entries.len() > block.max_items {
        return Err(MapperError::invalid(format!(
            "block {:?} supports at most {} entry(ies), got {}",
            block.name,
            block.max_items,
            entries.len()
        )));
    }

    for entry in entries {
        let inner = match entry {
            Value::Object(inner) => inner,
            _ => {
                return Err(MapperError::invalid(format!(
                    "entries of block {:?} must be objects",
                    block.name
                )))
            }
        };

        for (name, value) in inner {
            let Some(spec) = block.field(name) else {
                return Err(MapperError::invalid(format!(
                    "unknown field {:?} in block {:?}",
                    name, block.name
                )));
            };
            validate_scalar(spec, value, Some(block.name))?;
        }

        for spec in &block.fields {
            if spec.required && !inner.contains_key(spec.name) {
                return Err(MapperError::invalid(format!(
                    "required field {:?} is missing from block {:?}",
                    spec.name, block.name
                )));
            }
        }
    }

    Ok(())
}

fn validate_scalar(spec: &FieldSpec, value: &Value, block: Option<&str>) -> Result<()> {
    let location = || match block {
        Some(block) => format!("field {:?} in block {:?}", spec.name, block),
        None => format!("field {:?}", spec.name),
    };

    let Some(text) = value.as_str() else {
        return Err(MapperError::invalid(format!(
            "{} must be a string, got {value}",
            location()
        )));
    };

    if spec.field_type == FieldType::BoolString && text != "true" && text != "false" {
        return Err(MapperError::invalid(format!(
            "{} must be \"true\" or \"false\", got {value}",
            location()
        )));
    }

    Ok(())
}

/// Builds a [`ResourceSchema`], rejecting duplicate names at construction.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<FieldSpec>,
    blocks: Vec<BlockSpec>,
}

impl SchemaBuilder {
    pub fn field(mut self, spec: FieldSpec) -> Self {
        if self.taken(spec.name) {
            panic!("duplicate field {:?} in resource schema", spec.name);
        }
        self.fields.push(spec);
        self
    }

    pub fn block(mut self, block: BlockSpec) -> Self {
        if self.taken(block.name) {
            panic!("duplicate block {:?} in resource schema", block.name);
        }
        self.blocks.push(block);
        self
    }

    pub fn build(self) -> ResourceSchema {
        ResourceSchema {
            fields: self.fields,
            blocks: self.blocks,
        }
    }

    fn taken(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name) || self.blocks.iter().any(|b| b.name == name)
    }
}
