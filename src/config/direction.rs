//! Iteration direction and the values accepted for it
//!
//! A direction can be given as the enum itself, as an integer sign, as a
//! token string or as a JSON scalar holding either. Anything else is an
//! invalid argument.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::batch::{BatchError, BatchResult};

/// Sort direction of the iteration field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    /// Integer sign used in sort specifications and checkpoint keys
    pub fn sign(&self) -> i8 {
        match self {
            Direction::Ascending => 1,
            Direction::Descending => -1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        }
    }

    /// Operator of the resume condition: strictly past the checkpoint in
    /// iteration order
    pub fn resume_operator(&self) -> &'static str {
        match self {
            Direction::Ascending => "$gt",
            Direction::Descending => "$lt",
        }
    }

    /// Parses an integer sign. Zero has no direction.
    pub fn from_sign(sign: i64) -> BatchResult<Self> {
        match sign {
            s if s > 0 => Ok(Direction::Ascending),
            s if s < 0 => Ok(Direction::Descending),
            s => Err(BatchError::invalid_argument("direction", s)),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = BatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "1" | "+1" => Ok(Direction::Ascending),
            "desc" | "descending" | "-1" => Ok(Direction::Descending),
            _ => Err(BatchError::invalid_argument("direction", s)),
        }
    }
}

/// Conversion into a validated [`Direction`]
pub trait IntoDirection {
    fn into_direction(self) -> BatchResult<Direction>;
}

impl IntoDirection for Direction {
    fn into_direction(self) -> BatchResult<Direction> {
        Ok(self)
    }
}

impl IntoDirection for i32 {
    fn into_direction(self) -> BatchResult<Direction> {
        Direction::from_sign(i64::from(self))
    }
}

impl IntoDirection for i64 {
    fn into_direction(self) -> BatchResult<Direction> {
        Direction::from_sign(self)
    }
}

impl IntoDirection for &str {
    fn into_direction(self) -> BatchResult<Direction> {
        self.parse()
    }
}

impl IntoDirection for String {
    fn into_direction(self) -> BatchResult<Direction> {
        self.parse()
    }
}

impl IntoDirection for &Value {
    fn into_direction(self) -> BatchResult<Direction> {
        match self {
            Value::Number(n) => match n.as_i64() {
                Some(sign) => Direction::from_sign(sign),
                None => Err(BatchError::invalid_argument("direction", n)),
            },
            Value::String(s) => s.parse(),
            other => Err(BatchError::invalid_argument("direction", other)),
        }
    }
}
