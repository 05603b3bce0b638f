use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConversionError, Error};
use crate::value::Value;

/// Represents the supported data types in a table schema.
/// These types define the structure of columns and the expected format of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// A 64-bit signed integer.
    #[serde(rename = "int")]
    Int,
    /// A variable-length UTF-8 character string.
    #[serde(rename = "str")]
    Text,
    /// A boolean value (true or false).
    #[serde(rename = "bool")]
    Bool,
}

impl DataType {
    /// Every column type, in declaration order.
    pub const ALL: [DataType; 3] = [DataType::Int, DataType::Text, DataType::Bool];

    /// The token used for this type in column specs and persisted schemas.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Text => "str",
            Self::Bool => "bool",
        }
    }

    /// Converts raw text into a typed [Value].
    ///
    /// No coercion between types is attempted: `Int` only accepts base-10
    /// integers, `Bool` only accepts `true/1/yes` and `false/0/no` (any case),
    /// and `Text` keeps the input unchanged.
    ///
    /// # Example
    /// ```
    /// # use primdb::{DataType, Value};
    /// assert_eq!(DataType::Int.convert("28").unwrap(), Value::Int(28));
    /// assert_eq!(DataType::Bool.convert("yes").unwrap(), Value::Bool(true));
    /// assert!(DataType::Int.convert("abc").is_err());
    /// ```
    pub fn convert(&self, raw: &str) -> Result<Value, ConversionError> {
        let fail = || ConversionError {
            value: raw.to_string(),
            expected: *self,
        };

        match self {
            Self::Int => raw.parse::<i64>().map(Value::Int).map_err(|_| fail()),
            Self::Text => Ok(Value::Text(raw.into())),
            Self::Bool => match raw.to_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(Value::Bool(true)),
                "false" | "0" | "no" => Ok(Value::Bool(false)),
                _ => Err(fail()),
            },
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "int" | "integer" => Ok(Self::Int),
            "str" | "text" => Ok(Self::Text),
            "bool" | "boolean" => Ok(Self::Bool),
            _ => Err(Error::UnknownType(s.to_string())),
        }
    }
}
