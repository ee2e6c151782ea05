//! Option value parsing and range checking.
//!
//! The pure core of validation: convert raw string values to typed values
//! according to an option's declared kind, and test typed values against
//! inclusive ranges. Nothing here touches a schema or a config source; the
//! schema layer composes these pieces into
//! [`OptInfo::validate`](crate::schema::OptInfo::validate), the admission
//! gate used by resolution and normalization.
//!
//! Boolean literals are exactly `"true"` and `"false"`. Enum values are
//! integers; whether an integer carries a human-readable label is a
//! description concern and has no bearing on validity.

use std::fmt;

use crate::error::SchemaError;

/// The declared type of an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptKind {
    Bool,
    Int,
    Float,
    Enum,
}

impl OptKind {
    /// Parse a kind name as advertised by a driver (`"bool"`, `"int"`,
    /// `"float"`, `"enum"`).
    pub fn parse(name: &str) -> Result<Self, SchemaError> {
        match name {
            "bool" => Ok(OptKind::Bool),
            "int" => Ok(OptKind::Int),
            "float" => Ok(OptKind::Float),
            "enum" => Ok(OptKind::Enum),
            other => Err(SchemaError::InvalidKind(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OptKind::Bool => "bool",
            OptKind::Int => "int",
            OptKind::Float => "float",
            OptKind::Enum => "enum",
        }
    }
}

impl fmt::Display for OptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed option value. Enum values are carried as integers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OptValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl OptValue {
    /// Parse a raw config string according to `kind`.
    pub fn parse(raw: &str, kind: OptKind) -> Result<Self, SchemaError> {
        let invalid = || SchemaError::InvalidValue {
            value: raw.to_string(),
            kind: kind.as_str(),
        };
        match kind {
            OptKind::Bool => match raw {
                "true" => Ok(OptValue::Bool(true)),
                "false" => Ok(OptValue::Bool(false)),
                _ => Err(invalid()),
            },
            OptKind::Int | OptKind::Enum => {
                raw.parse::<i64>().map(OptValue::Int).map_err(|_| invalid())
            }
            OptKind::Float => raw
                .parse::<f64>()
                .map(OptValue::Float)
                .map_err(|_| invalid()),
        }
    }

    /// Render the value in the form config sources store: `"true"`/`"false"`
    /// for bools, decimal literals for the numeric kinds.
    pub fn to_config_str(self) -> String {
        match self {
            OptValue::Bool(true) => "true".to_string(),
            OptValue::Bool(false) => "false".to_string(),
            OptValue::Int(i) => i.to_string(),
            OptValue::Float(f) => f.to_string(),
        }
    }
}

/// An inclusive interval of option values. A single legal value is a
/// degenerate interval with `start == end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub start: OptValue,
    pub end: OptValue,
}

impl Range {
    /// Parse one interval in driver range syntax: `"start:end"` or a single
    /// value standing for itself.
    pub fn parse(spec: &str, kind: OptKind) -> Result<Self, SchemaError> {
        let mut parts = spec.split(':');
        let start = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SchemaError::InvalidRange(spec.to_string()))?;
        let start = OptValue::parse(start, kind)?;
        let end = match parts.next() {
            Some(end) => OptValue::parse(end, kind)?,
            None => start,
        };
        if parts.next().is_some() {
            return Err(SchemaError::InvalidRange(spec.to_string()));
        }
        Ok(Range { start, end })
    }

    /// Whether `value` lies in this interval. Values of a different kind than
    /// the interval's endpoints never match.
    pub fn contains(&self, value: OptValue) -> bool {
        match (self.start, self.end, value) {
            (OptValue::Int(s), OptValue::Int(e), OptValue::Int(v)) => s <= v && v <= e,
            (OptValue::Float(s), OptValue::Float(e), OptValue::Float(v)) => s <= v && v <= e,
            _ => false,
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start.to_config_str())
        } else {
            write!(
                f,
                "{}:{}",
                self.start.to_config_str(),
                self.end.to_config_str()
            )
        }
    }
}

/// Parse a driver `valid` attribute: comma-separated intervals, e.g.
/// `"0:10,12"`. Bool options never carry ranges; the schema layer rejects
/// them before this is reached.
pub fn parse_ranges(spec: &str, kind: OptKind) -> Result<Vec<Range>, SchemaError> {
    debug_assert!(kind != OptKind::Bool);
    spec.split(',').map(|part| Range::parse(part, kind)).collect()
}

/// Whether `value` satisfies `ranges`: no declared ranges means any value of
/// the right kind is legal, otherwise at least one interval must contain it.
pub fn value_in_ranges(value: OptValue, ranges: &[Range]) -> bool {
    ranges.is_empty() || ranges.iter().any(|r| r.contains(value))
}
