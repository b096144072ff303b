//! Variable metadata and native value payloads.

use std::fmt;

/// Handle a backend uses to address one variable.
pub type ValueReference = u32;

/// Role of a variable in the component interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Causality {
    Input,
    Output,
    Parameter,
    /// local, independent, calculatedParameter and anything else
    Other,
}

impl Causality {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("input") => Causality::Input,
            Some("output") => Causality::Output,
            Some("parameter") => Causality::Parameter,
            _ => Causality::Other,
        }
    }

    /// Only inputs and parameters accept writes.
    pub fn is_writable(self) -> bool {
        matches!(self, Causality::Input | Causality::Parameter)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Causality::Input => "input",
            Causality::Output => "output",
            Causality::Parameter => "parameter",
            Causality::Other => "other",
        }
    }
}

impl fmt::Display for Causality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variability {
    Fixed,
    Tunable,
    Other,
}

impl Variability {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("fixed") => Variability::Fixed,
            Some("tunable") => Variability::Tunable,
            _ => Variability::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Variability::Fixed => "fixed",
            Variability::Tunable => "tunable",
            Variability::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeType {
    Boolean,
    Integer,
    Real,
    String,
    Enumeration,
}

impl NativeType {
    pub fn as_str(self) -> &'static str {
        match self {
            NativeType::Boolean => "Boolean",
            NativeType::Integer => "Integer",
            NativeType::Real => "Real",
            NativeType::String => "String",
            NativeType::Enumeration => "Enumeration",
        }
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value as exchanged with a backend.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Boolean(bool),
    Integer(i32),
    Real(f64),
    String(String),
}

impl NativeValue {
    pub fn native_type(&self) -> NativeType {
        match self {
            NativeValue::Boolean(_) => NativeType::Boolean,
            NativeValue::Integer(_) => NativeType::Integer,
            NativeValue::Real(_) => NativeType::Real,
            NativeValue::String(_) => NativeType::String,
        }
    }
}

impl fmt::Display for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeValue::Boolean(b) => write!(f, "{b}"),
            NativeValue::Integer(i) => write!(f, "{i}"),
            NativeValue::Real(x) => write!(f, "{x}"),
            NativeValue::String(s) => f.write_str(s),
        }
    }
}
