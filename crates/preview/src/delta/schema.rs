//! Logical schema from the `metaData.schemaString` JSON

use super::log::delta_error;
use crate::error::Result;
use serde_json::Value;

static MISSING: Value = Value::Null;

/// A top-level field of the table schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

/// Parse the top-level fields of a Delta schema string
pub fn parse_fields(schema_string: &str) -> Result<Vec<SchemaField>> {
    let schema: Value = serde_json::from_str(schema_string)
        .map_err(|e| delta_error(format!("invalid schema string: {e}")))?;
    let fields = schema
        .get("fields")
        .and_then(Value::as_array)
        .ok_or_else(|| delta_error("schema string has no fields"))?;

    fields
        .iter()
        .map(|field| -> Result<SchemaField> {
            let name = field
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| delta_error("schema field without a name"))?;
            Ok(SchemaField {
                name: name.to_string(),
                data_type: type_name(field.get("type").unwrap_or(&MISSING)),
                nullable: field
                    .get("nullable")
                    .and_then(Value::as_bool)
                    .unwrap_or(true),
            })
        })
        .collect()
}

/// One `name: type` line per field
pub fn schema_text(fields: &[SchemaField]) -> String {
    fields
        .iter()
        .map(|f| {
            let suffix = if f.nullable { "" } else { " not null" };
            format!("{}: {}{}", f.name, f.data_type, suffix)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Primitive types are plain strings; nested ones are objects
fn type_name(ty: &Value) -> String {
    match ty {
        Value::String(s) => s.clone(),
        Value::Object(obj) => match obj.get("type").and_then(Value::as_str) {
            Some("struct") => {
                let fields = obj
                    .get("fields")
                    .and_then(Value::as_array)
                    .map(|fields| {
                        fields
                            .iter()
                            .map(|f| {
                                let name = f.get("name").and_then(Value::as_str).unwrap_or("?");
                                let ty = type_name(f.get("type").unwrap_or(&MISSING));
                                format!("{name}: {ty}")
                            })
                            .collect::<Vec<_>>()
                            .join(", ")
                    })
                    .unwrap_or_default();
                format!("struct<{fields}>")
            }
            Some("array") => format!(
                "array<{}>",
                type_name(obj.get("elementType").unwrap_or(&MISSING))
            ),
            Some("map") => format!(
                "map<{}, {}>",
                type_name(obj.get("keyType").unwrap_or(&MISSING)),
                type_name(obj.get("valueType").unwrap_or(&MISSING))
            ),
            Some(other) => other.to_string(),
            None => ty.to_string(),
        },
        other => other.to_string(),
    }
}
