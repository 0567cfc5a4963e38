//! Typed API responses and the items the producer hands to the buffer.
//!
//! The provisioning API answers every zone operation with a JSON body whose
//! `zone` object carries the new serial. Every field is optional here; the
//! presence checks happen once, in [`BufferedItem::store_entry`], and turn a
//! missing field into [`Error::MalformedPayload`].

use lagwatch_core::{Error, EventKind, Result, Serial, format_key};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of provisioning operation that produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// A zone was created; the acknowledgement time is `created_at`.
    Create,
    /// A zone (or one of its recordsets) changed; the time is `updated_at`.
    Update,
}

impl Operation {
    /// Stream the operation's acknowledgement is recorded on.
    ///
    /// Creates and updates are both acknowledged by the API layer.
    pub fn stream(self) -> EventKind {
        EventKind::Origin
    }

    fn timestamp_field(self) -> &'static str {
        match self {
            Self::Create => "zone.created_at",
            Self::Update => "zone.updated_at",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("create"),
            Self::Update => f.write_str("update"),
        }
    }
}

/// The `zone` object of an API response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZonePayload {
    pub id: Option<String>,
    pub name: Option<String>,
    pub serial: Option<Serial>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub project_id: Option<String>,
}

/// Body of a successful zone operation response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneOperationResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<ZonePayload>,

    /// Present on recordset operations; carried through for diagnostics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recordset: Option<serde_json::Value>,
}

/// A store write derived from a buffered item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    pub key: String,
    pub value: String,
}

/// A pending write owned by the buffer until it is flushed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferedItem {
    pub operation: Operation,
    pub payload: ZoneOperationResult,
}

impl BufferedItem {
    pub fn new(operation: Operation, payload: ZoneOperationResult) -> Self {
        Self { operation, payload }
    }

    /// Build the `(key, value)` pair this item persists as.
    ///
    /// Key: `<stream prefix>-<zone name>-<serial>`, with the zone name as the
    /// API returned it. Value: `created_at` for creates, `updated_at` for
    /// updates, verbatim.
    pub fn store_entry(&self) -> Result<StoreEntry> {
        let zone = self
            .payload
            .zone
            .as_ref()
            .ok_or(Error::MalformedPayload { field: "zone" })?;

        let name = zone
            .name
            .as_deref()
            .filter(|n| !n.is_empty())
            .ok_or(Error::MalformedPayload { field: "zone.name" })?;

        let serial = zone
            .serial
            .ok_or(Error::MalformedPayload { field: "zone.serial" })?;

        let value = match self.operation {
            Operation::Create => zone.created_at.as_deref(),
            Operation::Update => zone.updated_at.as_deref(),
        }
        .ok_or(Error::MalformedPayload {
            field: self.operation.timestamp_field(),
        })?;

        let prefix = self.operation.stream().codec().prefix();

        Ok(StoreEntry {
            key: format_key(prefix, name, serial),
            value: value.to_string(),
        })
    }

    /// JSON rendering of the payload, for failure reports.
    pub fn payload_json(&self) -> String {
        serde_json::to_string(&self.payload).unwrap_or_else(|e| format!("<unserializable: {e}>"))
    }
}
