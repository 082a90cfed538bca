use std::collections::BTreeMap;

use debug_abi::{Channel, ChannelKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Register name to value, as reported by `/registers`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegisterSnapshot {
    values: BTreeMap<String, u64>,
}

impl RegisterSnapshot {
    pub fn get(&self, name: &str) -> Option<u64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

impl FromIterator<(String, u64)> for RegisterSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Full target memory; index is the address.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemorySnapshot {
    bytes: Vec<u8>,
}

impl MemorySnapshot {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A decoded instruction as the target serializes it. `Null` means the slot is
/// empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct InstructionRecord {
    value: Value,
}

impl InstructionRecord {
    pub fn new(value: Value) -> Result<Self, DecodeError> {
        ensure_unsigned_leaves(&value)?;
        Ok(Self { value })
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_null()
    }
}

/// Bitmap rows, most significant bit leftmost.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Option<Vec<u32>>")]
pub struct Sprite {
    rows: Vec<u32>,
}

impl Sprite {
    pub fn new(rows: Vec<u32>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[u32] {
        &self.rows
    }
}

impl From<Option<Vec<u32>>> for Sprite {
    fn from(rows: Option<Vec<u32>>) -> Self {
        Self {
            rows: rows.unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ChannelValue {
    Registers(RegisterSnapshot),
    Memory(MemorySnapshot),
    Instruction(InstructionRecord),
    Sprite(Sprite),
}

#[derive(Debug)]
pub enum DecodeError {
    Json(serde_json::Error),
    NotUnsigned(String),
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Json(err) => write!(f, "malformed body: {err}"),
            DecodeError::NotUnsigned(value) => {
                write!(f, "expected unsigned integer field, got {value}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::Json(err)
    }
}

pub fn decode(channel: Channel, body: &str) -> Result<ChannelValue, DecodeError> {
    let value = match channel.kind() {
        ChannelKind::Registers => ChannelValue::Registers(serde_json::from_str(body)?),
        ChannelKind::Memory => ChannelValue::Memory(serde_json::from_str(body)?),
        ChannelKind::Instruction => {
            ChannelValue::Instruction(InstructionRecord::new(serde_json::from_str(body)?)?)
        }
        ChannelKind::Sprite => ChannelValue::Sprite(serde_json::from_str(body)?),
    };
    Ok(value)
}

fn ensure_unsigned_leaves(value: &Value) -> Result<(), DecodeError> {
    match value {
        Value::Number(number) if number.as_u64().is_none() => {
            Err(DecodeError::NotUnsigned(number.to_string()))
        }
        Value::Array(items) => items.iter().try_for_each(ensure_unsigned_leaves),
        Value::Object(fields) => fields.values().try_for_each(ensure_unsigned_leaves),
        _ => Ok(()),
    }
}

/// Rewrites every integer leaf as a `0x` hex string. Other leaves are kept.
pub fn hexify(value: &Value) -> Value {
    match value {
        Value::Number(number) => {
            if let Some(unsigned) = number.as_u64() {
                Value::String(format!("{unsigned:#x}"))
            } else if let Some(signed) = number.as_i64() {
                Value::String(format!("-{:#x}", signed.unsigned_abs()))
            } else {
                value.clone()
            }
        }
        Value::Array(items) => Value::Array(items.iter().map(hexify).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, field)| (key.clone(), hexify(field)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

pub fn display_hex(value: &Value) -> String {
    serde_json::to_string_pretty(&hexify(value)).unwrap_or_else(|_| value.to_string())
}

pub fn display_registers(registers: &RegisterSnapshot) -> String {
    match serde_json::to_value(registers) {
        Ok(value) => display_hex(&value),
        Err(_) => String::new(),
    }
}
