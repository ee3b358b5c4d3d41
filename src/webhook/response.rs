//! Outbound webhook response builder.

use std::io::Write;

use crate::codec::{decode_map, encode_map, CodecError, DynamicValue, Parameters};
use crate::webhook::request::{form_parameter_map, WebhookRequest};
use crate::webhook::wire;
use crate::webhook::SerializeError;

/// One unit of reply content. Messages are rendered by the platform in order.
#[derive(Debug, Clone, PartialEq)]
pub enum FulfillmentMessage {
    /// Alternative renderings of a single text message.
    Text(Vec<String>),
    /// Synthesized speech as SSML.
    AudioSsml(String),
    /// Transfer the call to a phone number.
    TelephonyTransfer(String),
}

impl From<&FulfillmentMessage> for wire::ResponseMessage {
    fn from(message: &FulfillmentMessage) -> Self {
        match message {
            FulfillmentMessage::Text(text) => wire::ResponseMessage::Text(wire::Text { text: text.clone() }),
            FulfillmentMessage::AudioSsml(ssml) => {
                wire::ResponseMessage::OutputAudioText(wire::OutputAudioText { ssml: ssml.clone() })
            }
            FulfillmentMessage::TelephonyTransfer(phone_number) => {
                wire::ResponseMessage::TelephonyTransferCall(wire::TelephonyTransferCall {
                    phone_number: phone_number.clone(),
                })
            }
        }
    }
}

/// A reply under construction.
///
/// Sections left as `None` are omitted from the wire, which the platform
/// reads as "no change".
#[derive(Debug, Clone, Default)]
pub struct WebhookResponse {
    session_id: String,
    session_parameters: Option<Parameters>,
    page_info: Option<wire::PageInfo>,
    payload: Option<Parameters>,
    messages: Vec<FulfillmentMessage>,
}

impl WebhookResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a reply from a request: session id, plus page/form info and payload
    /// verbatim when the request has them.
    pub fn from_request(req: &WebhookRequest) -> Self {
        let wire = req.wire();
        Self {
            session_id: req.session_id().to_string(),
            session_parameters: None,
            page_info: wire.page_info.clone(),
            payload: wire.payload.as_ref().map(decode_map),
            messages: Vec::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn session_parameters(&self) -> Option<&Parameters> {
        self.session_parameters.as_ref()
    }

    pub fn payload(&self) -> Option<&Parameters> {
        self.payload.as_ref()
    }

    pub fn messages(&self) -> &[FulfillmentMessage] {
        &self.messages
    }

    /// Form parameters carried over from the request page, keyed by display name.
    pub fn form_parameters(&self) -> Parameters {
        let infos = self
            .page_info
            .as_ref()
            .and_then(|p| p.form_info.as_ref())
            .map(|f| f.parameter_info.as_slice())
            .unwrap_or_default();
        form_parameter_map(infos)
    }

    /// Replace the session parameters wholesale.
    pub fn set_session_parameters(&mut self, params: Parameters) {
        self.session_parameters = Some(params);
    }

    /// Merge into the session parameters; colliding keys are overwritten.
    pub fn add_session_parameters(&mut self, params: Parameters) {
        self.session_parameters.get_or_insert_with(Parameters::new).extend(params);
    }

    pub fn add_session_parameter(&mut self, key: impl Into<String>, value: impl Into<DynamicValue>) {
        self.session_parameters
            .get_or_insert_with(Parameters::new)
            .insert(key.into(), value.into());
    }

    /// Append one text message; the strings are alternatives of that message.
    pub fn add_text_message<I, S>(&mut self, texts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let texts = texts.into_iter().map(Into::into).collect();
        self.messages.push(FulfillmentMessage::Text(texts));
    }

    pub fn add_audio_message(&mut self, ssml: impl Into<String>) {
        self.messages.push(FulfillmentMessage::AudioSsml(ssml.into()));
    }

    pub fn add_telephony_transfer(&mut self, phone_number: impl Into<String>) {
        self.messages
            .push(FulfillmentMessage::TelephonyTransfer(phone_number.into()));
    }

    /// Replace the payload wholesale.
    pub fn set_payload(&mut self, payload: Parameters) {
        self.payload = Some(payload);
    }

    /// Merge into the payload; colliding keys are overwritten.
    pub fn add_payload(&mut self, payload: Parameters) {
        self.payload.get_or_insert_with(Parameters::new).extend(payload);
    }

    /// Carry the request's full session parameter map into the reply.
    pub fn copy_session_info(&mut self, req: &WebhookRequest) {
        self.session_id = req.session_id().to_string();
        self.session_parameters = Some(req.session_parameters());
    }

    /// Carry the request's page and form info into the reply.
    pub fn copy_page_info(&mut self, req: &WebhookRequest) {
        if let Some(page_info) = &req.wire().page_info {
            self.page_info = Some(page_info.clone());
        }
    }

    /// Build the wire form. Fails on the first value that cannot be encoded.
    pub(crate) fn to_wire(&self) -> Result<wire::WebhookResponse, CodecError> {
        let parameters = self.session_parameters.as_ref().map(encode_map).transpose()?;
        let payload = self.payload.as_ref().map(encode_map).transpose()?;

        let fulfillment_response = if self.messages.is_empty() {
            None
        } else {
            Some(wire::FulfillmentResponse {
                messages: self.messages.iter().map(Into::into).collect(),
            })
        };

        let session_info = if self.session_id.is_empty() && parameters.is_none() {
            None
        } else {
            Some(wire::SessionInfo {
                session: self.session_id.clone(),
                parameters,
            })
        };

        Ok(wire::WebhookResponse {
            fulfillment_response,
            page_info: self.page_info.clone(),
            session_info,
            payload,
        })
    }

    /// Encode the reply as wire JSON.
    pub fn serialize(&self) -> Result<Vec<u8>, SerializeError> {
        let wire = self.to_wire()?;
        Ok(serde_json::to_vec(&wire)?)
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), SerializeError> {
        writer.write_all(&self.serialize()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn request(body: &str) -> WebhookRequest {
        WebhookRequest::parse(body.as_bytes()).unwrap()
    }

    fn wire_json(res: &WebhookResponse) -> Value {
        serde_json::from_slice(&res.serialize().unwrap()).unwrap()
    }

    fn params(pairs: &[(&str, DynamicValue)]) -> Parameters {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn payload_carries_forward_unchanged() {
        let req = request(r#"{"sessionInfo": {"session": "s1"}, "payload": {"a": 1}}"#);
        let res = WebhookResponse::from_request(&req);
        assert_eq!(wire_json(&res)["payload"], json!({"a": 1}));
        assert_eq!(wire_json(&res)["sessionInfo"], json!({"session": "s1"}));
    }

    #[test]
    fn page_info_carries_forward_unchanged() {
        let req = request(
            r#"{"pageInfo": {"currentPage": "p1", "formInfo": {"parameterInfo": [
                {"displayName": "size", "state": "FILLED", "value": "large"}
            ]}}}"#,
        );
        let res = WebhookResponse::from_request(&req);
        assert_eq!(res.form_parameters()["size"], DynamicValue::from("large"));
        assert_eq!(
            wire_json(&res)["pageInfo"],
            json!({"currentPage": "p1", "formInfo": {"parameterInfo": [
                {"displayName": "size", "state": "FILLED", "value": "large"}
            ]}})
        );
    }

    #[test]
    fn form_parameters_match_request_view() {
        let req = request(
            r#"{"pageInfo": {"formInfo": {"parameterInfo": [
                {"displayName": "size", "state": "FILLED", "value": "small"},
                {"displayName": "color", "state": "EMPTY"},
                {"displayName": "size", "state": "FILLED", "value": "large"}
            ]}}}"#,
        );
        let res = WebhookResponse::from_request(&req);

        let params = res.form_parameters();
        assert_eq!(params, req.form_parameters());
        assert_eq!(params["size"], DynamicValue::from("large"));
        assert_eq!(params["color"], DynamicValue::Null);
        assert!(WebhookResponse::new().form_parameters().is_empty());
    }

    #[test]
    fn session_parameters_replaced_after_handler_edit() {
        let req = request(r#"{"sessionInfo":{"session":"s1","parameters":{"color":"red"}}}"#);
        let mut res = WebhookResponse::from_request(&req);

        let mut session = req.session_parameters();
        assert_eq!(session.remove("color"), Some(DynamicValue::from("red")));
        session.insert("processed".into(), true.into());
        res.set_session_parameters(session);

        assert_eq!(wire_json(&res)["sessionInfo"]["parameters"], json!({"processed": true}));
    }

    #[test]
    fn add_session_parameters_merges_and_keeps_other_keys() {
        let mut res = WebhookResponse::new();
        res.add_session_parameters(params(&[("a", 1.into()), ("b", 2.into())]));
        res.add_session_parameters(params(&[("b", 3.into()), ("c", 4.into())]));

        let merged = res.session_parameters().unwrap();
        assert_eq!(merged.len(), 3);
        assert_eq!(merged["a"], DynamicValue::from(1));
        assert_eq!(merged["b"], DynamicValue::from(3));
        assert_eq!(merged["c"], DynamicValue::from(4));
    }

    #[test]
    fn payload_set_replaces_and_add_merges() {
        let req = request(r#"{"payload": {"keep": true, "old": 1}}"#);
        let mut res = WebhookResponse::from_request(&req);
        res.add_payload(params(&[("old", 2.into())]));
        assert_eq!(wire_json(&res)["payload"], json!({"keep": true, "old": 2}));

        res.set_payload(params(&[("fresh", "yes".into())]));
        assert_eq!(wire_json(&res)["payload"], json!({"fresh": "yes"}));
    }

    #[test]
    fn messages_keep_order_and_group_text_alternatives() {
        let mut res = WebhookResponse::new();
        res.add_text_message(["Hello", " World!"]);
        res.add_audio_message("<speak>Hi</speak>");
        res.add_telephony_transfer("+15550100");
        res.add_text_message(vec![String::from("bye")]);

        assert_eq!(res.messages().len(), 4);
        assert_eq!(
            wire_json(&res)["fulfillmentResponse"]["messages"],
            json!([
                {"text": {"text": ["Hello", " World!"]}},
                {"outputAudioText": {"ssml": "<speak>Hi</speak>"}},
                {"telephonyTransferCall": {"phoneNumber": "+15550100"}},
                {"text": {"text": ["bye"]}}
            ])
        );
    }

    #[test]
    fn unencodable_value_fails_serialize() {
        let mut res = WebhookResponse::new();
        res.add_session_parameter("ratio", f64::NAN);
        match res.serialize() {
            Err(SerializeError::Codec(CodecError::UnsupportedValueType { key, .. })) => {
                assert_eq!(key, "ratio")
            }
            other => panic!("expected codec failure, got {:?}", other),
        }
    }

    #[test]
    fn copy_session_info_carries_all_parameters() {
        let req = request(r#"{"sessionInfo":{"session":"s9","parameters":{"x":"y"}}}"#);
        let mut res = WebhookResponse::new();
        res.copy_session_info(&req);
        res.copy_page_info(&req);
        assert_eq!(res.session_id(), "s9");
        assert_eq!(wire_json(&res)["sessionInfo"]["parameters"], json!({"x": "y"}));
        assert!(wire_json(&res).get("pageInfo").is_none());
    }

    #[test]
    fn empty_response_is_empty_object() {
        assert_eq!(wire_json(&WebhookResponse::new()), json!({}));
    }

    #[test]
    fn write_to_emits_serialized_bytes() {
        let mut res = WebhookResponse::new();
        res.add_text_message(["ok"]);
        let mut out = Vec::new();
        res.write_to(&mut out).unwrap();
        assert_eq!(out, res.serialize().unwrap());
    }
}
