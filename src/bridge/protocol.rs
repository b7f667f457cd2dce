//! Bridge message types
//!
//! Inbound requests are `{ "type": <kind>, "id"?: <string> }`; outbound
//! events are `{ "type": <kind>, "id"?: <string>, "data"?: <payload> }`.

use crate::encoder::Payload;
use crate::utils::ErrorResponse;
use serde::{Deserialize, Deserializer, Serialize};

/// Request kinds understood by the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestKind {
    StartRecord,
    StopRecord,
    PauseRecord,
    ResumeRecord,
    OpenCamera,
    TakePhoto,
    CloseCamera,
    /// Anything else; ignored by the dispatcher
    #[serde(other)]
    Unknown,
}

impl RequestKind {
    /// Wire name of the request
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::StartRecord => "start-record",
            RequestKind::StopRecord => "stop-record",
            RequestKind::PauseRecord => "pause-record",
            RequestKind::ResumeRecord => "resume-record",
            RequestKind::OpenCamera => "open-camera",
            RequestKind::TakePhoto => "take-photo",
            RequestKind::CloseCamera => "close-camera",
            RequestKind::Unknown => "unknown",
        }
    }
}

/// Message received from web content
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InboundRequest {
    #[serde(rename = "type")]
    pub kind: RequestKind,

    /// Optional correlation id, echoed on every event answering this request
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
}

/// Accept string and numeric ids; anything else counts as no id so the
/// request itself still goes through.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(id)) => Some(id),
        Some(serde_json::Value::Number(id)) => Some(id.to_string()),
        _ => None,
    })
}

impl InboundRequest {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Event kinds sent to web content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "onStartRecord")]
    StartRecord,
    #[serde(rename = "onStopRecord")]
    StopRecord,
    #[serde(rename = "onPauseRecord")]
    PauseRecord,
    #[serde(rename = "onResumeRecord")]
    ResumeRecord,
    #[serde(rename = "onTakePhoto")]
    TakePhoto,
    #[serde(rename = "onError")]
    Error,
}

/// Event data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EventData {
    /// Structured media payload
    Media(Payload),
    /// `data:<mime>;base64,<data>` string
    DataUri(String),
    Failure(ErrorResponse),
}

/// Message sent to web content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<EventData>,
}

impl OutboundEvent {
    /// Event without data
    pub fn signal(kind: EventKind, id: Option<String>) -> Self {
        Self {
            kind,
            id,
            data: None,
        }
    }

    pub fn with_data(kind: EventKind, id: Option<String>, data: EventData) -> Self {
        Self {
            kind,
            id,
            data: Some(data),
        }
    }

    pub fn failure(id: Option<String>, response: ErrorResponse) -> Self {
        Self::with_data(EventKind::Error, id, EventData::Failure(response))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
