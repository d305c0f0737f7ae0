//! Logical column datatypes and their mapping onto DuckDB column types

use crate::error::{CompareError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Closed set of datatypes a schema can declare
#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    Integer,
    Float,
    String,
    Boolean,
    Date,
    Datetime,
    List(Box<DataType>),
    Struct(Vec<Field>),
}

/// A named member of a struct datatype
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub datatype: DataType,
}

impl Field {
    pub fn new(name: impl Into<String>, datatype: DataType) -> Self {
        Self {
            name: name.into(),
            datatype,
        }
    }
}

impl DataType {
    pub fn list_of(element: DataType) -> Self {
        Self::List(Box::new(element))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Self::String)
    }

    /// Map a DuckDB type name (as printed by DESCRIBE) onto the logical set.
    ///
    /// Returns `None` for engine types with no logical counterpart
    /// (BLOB, INTERVAL, MAP, UNION, the untyped NULL, ...).
    pub fn from_engine_type(text: &str) -> Option<DataType> {
        let text = text.trim();

        if let Some(element) = strip_array_suffix(text) {
            return Self::from_engine_type(element).map(Self::list_of);
        }

        let upper = text.to_ascii_uppercase();

        if upper.starts_with("STRUCT(") && upper.ends_with(')') {
            let body = &text["STRUCT(".len()..text.len() - 1];
            let mut fields = Vec::new();
            for member in split_top_level(body) {
                let (name, type_text) = split_engine_field(member)?;
                fields.push(Field::new(name, Self::from_engine_type(type_text)?));
            }
            if fields.is_empty() {
                return None;
            }
            return Some(Self::Struct(fields));
        }

        if upper.starts_with("DECIMAL") || upper.starts_with("NUMERIC") {
            return Some(Self::Float);
        }
        if upper.starts_with("VARCHAR(") {
            return Some(Self::String);
        }

        match upper.as_str() {
            "TINYINT" | "SMALLINT" | "INTEGER" | "INT" | "BIGINT" | "HUGEINT" | "UTINYINT"
            | "USMALLINT" | "UINTEGER" | "UBIGINT" | "UHUGEINT" => Some(Self::Integer),
            "FLOAT" | "REAL" | "DOUBLE" => Some(Self::Float),
            "VARCHAR" | "TEXT" | "STRING" | "CHAR" | "BPCHAR" => Some(Self::String),
            "BOOLEAN" | "BOOL" => Some(Self::Boolean),
            "DATE" => Some(Self::Date),
            "TIMESTAMP" | "DATETIME" | "TIMESTAMP WITH TIME ZONE" | "TIMESTAMPTZ"
            | "TIMESTAMP_S" | "TIMESTAMP_MS" | "TIMESTAMP_NS" => Some(Self::Datetime),
            _ => None,
        }
    }

    /// DuckDB's type for all-null literal columns; compatible with any declaration
    pub fn is_untyped_null(engine_type: &str) -> bool {
        engine_type.trim().trim_matches('"').eq_ignore_ascii_case("NULL")
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::String => write!(f, "string"),
            Self::Boolean => write!(f, "boolean"),
            Self::Date => write!(f, "date"),
            Self::Datetime => write!(f, "datetime"),
            Self::List(element) => write!(f, "list<{}>", element),
            Self::Struct(fields) => {
                write!(f, "struct<")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if is_plain_identifier(&field.name) {
                        write!(f, "{}: {}", field.name, field.datatype)?;
                    } else {
                        write!(f, "\"{}\": {}", field.name.replace('"', "\"\""), field.datatype)?;
                    }
                }
                write!(f, ">")
            }
        }
    }
}

impl FromStr for DataType {
    type Err = CompareError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parser = TypeParser::new(s);
        let datatype = parser.parse_type()?;
        parser.skip_whitespace();
        if !parser.at_end() {
            return Err(CompareError::config(format!(
                "Unexpected trailing input in datatype '{}'",
                s
            )));
        }
        Ok(datatype)
    }
}

impl Serialize for DataType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DataType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Recursive-descent parser for the configuration type vocabulary
struct TypeParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> TypeParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn identifier(&mut self) -> &'a str {
        self.skip_whitespace();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !(c.is_alphanumeric() || c == '_') {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.input[start..self.pos]
    }

    fn field_name(&mut self) -> Result<String> {
        self.skip_whitespace();
        if self.peek() != Some('"') {
            let name = self.identifier();
            if name.is_empty() {
                return Err(self.error("expected a struct field name"));
            }
            return Ok(name.to_string());
        }

        self.pos += 1;
        let mut name = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated quoted field name")),
                Some('"') => {
                    self.pos += 1;
                    if self.peek() == Some('"') {
                        name.push('"');
                        self.pos += 1;
                    } else {
                        break;
                    }
                }
                Some(c) => {
                    name.push(c);
                    self.pos += c.len_utf8();
                }
            }
        }
        if name.trim().is_empty() {
            return Err(self.error("struct field names cannot be blank"));
        }
        Ok(name)
    }

    fn parse_type(&mut self) -> Result<DataType> {
        let name = self.identifier();
        if name.is_empty() {
            return Err(self.error("expected a datatype name"));
        }

        match name.to_ascii_lowercase().as_str() {
            "list" | "array" => {
                if !self.eat('<') {
                    return Err(CompareError::config(format!(
                        "Composite datatype '{}' must declare its element type, e.g. list<integer>",
                        name
                    )));
                }
                self.skip_whitespace();
                if self.peek() == Some('>') {
                    return Err(self.error("list<> must declare an element type"));
                }
                let element = self.parse_type()?;
                if !self.eat('>') {
                    return Err(self.error("expected '>' to close list type"));
                }
                Ok(DataType::list_of(element))
            }
            "struct" => {
                if !self.eat('<') {
                    return Err(CompareError::config(format!(
                        "Composite datatype '{}' must declare its fields, e.g. struct<a: integer>",
                        name
                    )));
                }
                let mut fields = Vec::new();
                if self.eat('>') {
                    return Err(self.error("struct<> must declare at least one field"));
                }
                loop {
                    let field_name = self.field_name()?;
                    if !self.eat(':') {
                        return Err(self.error("expected ':' after struct field name"));
                    }
                    let datatype = self.parse_type()?;
                    if fields.iter().any(|f: &Field| f.name == field_name) {
                        return Err(self.error(&format!("duplicate struct field '{}'", field_name)));
                    }
                    fields.push(Field::new(field_name, datatype));
                    if self.eat(',') {
                        continue;
                    }
                    if self.eat('>') {
                        break;
                    }
                    return Err(self.error("expected ',' or '>' in struct type"));
                }
                Ok(DataType::Struct(fields))
            }
            "integer" | "int" | "int8" | "int16" | "int32" | "int64" | "bigint" | "long" => {
                Ok(DataType::Integer)
            }
            "float" | "float32" | "float64" | "double" | "decimal" | "numeric" => {
                Ok(DataType::Float)
            }
            "string" | "str" | "utf8" | "varchar" | "text" => Ok(DataType::String),
            "boolean" | "bool" => Ok(DataType::Boolean),
            "date" => Ok(DataType::Date),
            "datetime" | "timestamp" => Ok(DataType::Datetime),
            other => Err(CompareError::config(format!("Unknown datatype '{}'", other))),
        }
    }

    fn error(&self, message: &str) -> CompareError {
        CompareError::config(format!(
            "Invalid datatype '{}': {} at position {}",
            self.input, message, self.pos
        ))
    }
}

fn is_plain_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// `INTEGER[]` / `INTEGER[3]` -> `INTEGER`
fn strip_array_suffix(text: &str) -> Option<&str> {
    if !text.ends_with(']') {
        return None;
    }
    let open = text.rfind('[')?;
    let size = &text[open + 1..text.len() - 1];
    if !size.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(text[..open].trim_end())
}

/// Split on commas that are not nested inside parentheses or quotes
fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut start = 0;

    for (i, c) in body.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '(' if !in_quotes => depth += 1,
            ')' if !in_quotes => depth = depth.saturating_sub(1),
            ',' if !in_quotes && depth == 0 => {
                parts.push(body[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let tail = body[start..].trim();
    if !tail.is_empty() {
        parts.push(tail);
    }
    parts
}

/// `"my field" VARCHAR` -> (`my field`, `VARCHAR`)
fn split_engine_field(member: &str) -> Option<(String, &str)> {
    let member = member.trim();
    if let Some(quoted) = member.strip_prefix('"') {
        let mut name = String::new();
        let mut chars = quoted.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if c == '"' {
                if let Some(&(_, '"')) = chars.peek() {
                    name.push('"');
                    chars.next();
                    continue;
                }
                let type_text = quoted[i + 1..].trim();
                return if type_text.is_empty() {
                    None
                } else {
                    Some((name, type_text))
                };
            }
            name.push(c);
        }
        return None;
    }

    let split = member.find(char::is_whitespace)?;
    let (name, type_text) = member.split_at(split);
    Some((name.to_string(), type_text.trim()))
}
