//! `fieldmeta decode` - show the typed view of a stored definition.

use std::path::Path;

use fieldmeta_schema::{codec, DecodeWarning, FieldTypeRegistry};

use crate::input::{read_definition, render};

/// Rendered view plus the warnings recovered from while decoding.
#[derive(Debug)]
pub struct DecodeOutput {
    pub rendered: String,
    pub warnings: Vec<DecodeWarning>,
}

pub fn run_decode(
    registry: &FieldTypeRegistry,
    file: &Path,
    yaml: bool,
) -> anyhow::Result<DecodeOutput> {
    let definition = read_definition(file)?;
    let decoded = codec::decode(&definition, registry)?;
    tracing::debug!(
        field_type = decoded.view.type_key,
        warnings = decoded.warnings.len(),
        "definition decoded"
    );
    Ok(DecodeOutput {
        rendered: render(&decoded.view, yaml)?,
        warnings: decoded.warnings,
    })
}
