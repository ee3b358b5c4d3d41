//! Webhook wire schema (the subset of the platform's JSON this crate models).
//!
//! Field names follow the platform's JSON mapping (lowerCamelCase); proto
//! field names are accepted as aliases when parsing. Anything not modeled
//! here is dropped by serde during deserialization.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::codec::{WireMap, WireValue};

/// Inbound fulfillment request.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    #[serde(default, alias = "detect_intent_response_id", skip_serializing_if = "String::is_empty")]
    pub detect_intent_response_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, alias = "trigger_intent", skip_serializing_if = "Option::is_none")]
    pub trigger_intent: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,

    #[serde(default, alias = "trigger_event", skip_serializing_if = "Option::is_none")]
    pub trigger_event: Option<String>,

    #[serde(default, alias = "language_code", skip_serializing_if = "String::is_empty")]
    pub language_code: String,

    #[serde(default, alias = "fulfillment_info", skip_serializing_if = "Option::is_none")]
    pub fulfillment_info: Option<FulfillmentInfo>,

    #[serde(default, alias = "page_info", skip_serializing_if = "Option::is_none")]
    pub page_info: Option<PageInfo>,

    #[serde(default, alias = "session_info", skip_serializing_if = "Option::is_none")]
    pub session_info: Option<SessionInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<WireMap>,
}

/// Outbound fulfillment reply.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    #[serde(default, alias = "fulfillment_response", skip_serializing_if = "Option::is_none")]
    pub fulfillment_response: Option<FulfillmentResponse>,

    #[serde(default, alias = "page_info", skip_serializing_if = "Option::is_none")]
    pub page_info: Option<PageInfo>,

    #[serde(default, alias = "session_info", skip_serializing_if = "Option::is_none")]
    pub session_info: Option<SessionInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<WireMap>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FulfillmentInfo {
    #[serde(default)]
    pub tag: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default, alias = "current_page", skip_serializing_if = "String::is_empty")]
    pub current_page: String,

    #[serde(default, alias = "display_name", skip_serializing_if = "String::is_empty")]
    pub display_name: String,

    #[serde(default, alias = "form_info", skip_serializing_if = "Option::is_none")]
    pub form_info: Option<FormInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormInfo {
    #[serde(default, alias = "parameter_info", skip_serializing_if = "Vec::is_empty")]
    pub parameter_info: Vec<ParameterInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterInfo {
    #[serde(default, alias = "display_name")]
    pub display_name: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,

    #[serde(default)]
    pub state: FillState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<WireValue>,

    #[serde(default, alias = "just_collected", skip_serializing_if = "std::ops::Not::not")]
    pub just_collected: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SessionInfo {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub session: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<WireMap>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FulfillmentResponse {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<ResponseMessage>,
}

/// One reply message. Serialized as a single-key object naming the variant.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseMessage {
    Text(Text),
    #[serde(alias = "output_audio_text")]
    OutputAudioText(OutputAudioText),
    #[serde(alias = "telephony_transfer_call")]
    TelephonyTransferCall(TelephonyTransferCall),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Text {
    #[serde(default)]
    pub text: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct OutputAudioText {
    #[serde(default)]
    pub ssml: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelephonyTransferCall {
    #[serde(default, alias = "phone_number")]
    pub phone_number: String,
}

/// Fill state of a form parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FillState {
    #[default]
    Unspecified,
    Empty,
    Invalid,
    Filled,
}

impl FillState {
    pub fn as_str(self) -> &'static str {
        match self {
            FillState::Unspecified => "PARAMETER_STATE_UNSPECIFIED",
            FillState::Empty => "EMPTY",
            FillState::Invalid => "INVALID",
            FillState::Filled => "FILLED",
        }
    }

    /// Unknown names map to `Unspecified` so newer platform states parse.
    fn from_name(name: &str) -> Self {
        match name {
            "EMPTY" => FillState::Empty,
            "INVALID" => FillState::Invalid,
            "FILLED" => FillState::Filled,
            _ => FillState::Unspecified,
        }
    }

    fn from_number(n: i64) -> Self {
        match n {
            1 => FillState::Empty,
            2 => FillState::Invalid,
            3 => FillState::Filled,
            _ => FillState::Unspecified,
        }
    }
}

impl fmt::Display for FillState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FillState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FillState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FillStateVisitor;

        impl Visitor<'_> for FillStateVisitor {
            type Value = FillState;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a parameter state name or number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<FillState, E> {
                Ok(FillState::from_name(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<FillState, E> {
                Ok(FillState::from_number(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<FillState, E> {
                Ok(FillState::from_number(i64::try_from(v).unwrap_or(-1)))
            }

            fn visit_unit<E: de::Error>(self) -> Result<FillState, E> {
                Ok(FillState::Unspecified)
            }
        }

        deserializer.deserialize_any(FillStateVisitor)
    }
}
