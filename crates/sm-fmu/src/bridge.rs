//! Conversion between native values and string-encoded model values.

use crate::description::{ModelDescription, ScalarVariable};
use crate::error::{FmuError, FmuResult};
use crate::slave::Slave;
use crate::status::{CallKind, StatusGovernor};
use crate::types::{NativeType, NativeValue};
use sm_model::DataType;

/// Model-side type of a native scalar kind.
pub fn model_type(native_type: NativeType) -> FmuResult<DataType> {
    match native_type {
        NativeType::Boolean => Ok(DataType::Boolean),
        NativeType::Integer => Ok(DataType::Integer),
        NativeType::Real => Ok(DataType::Double),
        NativeType::String => Ok(DataType::String),
        NativeType::Enumeration => Err(FmuError::UnsupportedType { native_type }),
    }
}

/// `"1"` is true, otherwise only a case-insensitive `"true"` is.
pub fn parse_boolean(raw: &str) -> bool {
    let raw = raw.trim();
    raw == "1" || raw.eq_ignore_ascii_case("true")
}

/// Canonical `"true"`/`"false"` for a boolean read from a backend.
pub fn canonical_boolean(raw: &str) -> &'static str {
    let value = match raw.trim() {
        "" | "0" => false,
        "1" => true,
        other => parse_boolean(other),
    };
    if value {
        "true"
    } else {
        "false"
    }
}

/// Parse a string into the variable's native representation.
pub fn parse_native(variable: &ScalarVariable, raw: &str) -> FmuResult<NativeValue> {
    let invalid = |reason: String| FmuError::InvalidValue {
        name: variable.name.clone(),
        value: raw.to_string(),
        reason,
    };
    match variable.native_type {
        NativeType::Boolean => Ok(NativeValue::Boolean(parse_boolean(raw))),
        NativeType::Integer => {
            let number: f64 = raw.trim().parse().map_err(|e| invalid(format!("{e}")))?;
            if !number.is_finite() {
                return Err(invalid("not a finite number".to_string()));
            }
            // fractional inputs are truncated toward zero
            let truncated = number.trunc();
            if truncated < f64::from(i32::MIN) || truncated > f64::from(i32::MAX) {
                return Err(invalid("out of 32-bit integer range".to_string()));
            }
            Ok(NativeValue::Integer(truncated as i32))
        }
        NativeType::Real => raw
            .trim()
            .parse()
            .map(NativeValue::Real)
            .map_err(|e| invalid(format!("{e}"))),
        NativeType::String => Ok(NativeValue::String(raw.to_string())),
        native_type @ NativeType::Enumeration => Err(FmuError::UnsupportedType { native_type }),
    }
}

/// Read a variable and encode it as a string.
pub fn read_value(
    slave: &mut dyn Slave,
    variable: &ScalarVariable,
    governor: &StatusGovernor,
) -> FmuResult<String> {
    model_type(variable.native_type)?;
    let (value, status) = slave.get(variable.value_reference, variable.native_type);
    governor.check(
        status,
        Some(&mut *slave),
        CallKind::Read,
        &format!("read {}", variable.name),
    )?;
    let rendered = value.to_string();
    Ok(match variable.native_type {
        NativeType::Boolean => canonical_boolean(&rendered).to_string(),
        _ => rendered,
    })
}

/// Write a string-encoded value to the named variable.
///
/// Only inputs and parameters are writable.
pub fn write_value(
    slave: &mut dyn Slave,
    description: &ModelDescription,
    name: &str,
    raw: &str,
    governor: &StatusGovernor,
) -> FmuResult<()> {
    let variable = description.variable(name)?;
    if !variable.causality.is_writable() {
        return Err(FmuError::NotWritable {
            name: name.to_string(),
            causality: variable.causality,
        });
    }
    let value = parse_native(variable, raw)?;
    let status = slave.set(variable.value_reference, value);
    governor.check(
        status,
        Some(&mut *slave),
        CallKind::Write,
        &format!("write {name}"),
    )
}
