//! Inbound webhook request adapter.

use std::io::{Read, Write};

use crate::codec::{decode, decode_map, DynamicValue, Parameters};
use crate::webhook::context::RequestContext;
use crate::webhook::response::WebhookResponse;
use crate::webhook::wire::{self, FillState};
use crate::webhook::{ParseError, SerializeError};

/// A form (page) parameter with its fill state.
#[derive(Debug, Clone, PartialEq)]
pub struct FormParameter {
    pub display_name: String,
    pub value: DynamicValue,
    pub fill_state: FillState,
    pub required: bool,
    pub just_collected: bool,
}

/// A parsed fulfillment request.
///
/// Immutable after parsing, except for the request context which the server
/// attaches exactly once before any handler runs.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    inner: wire::WebhookRequest,
    context: Option<RequestContext>,
}

impl WebhookRequest {
    /// Parse wire JSON. Unknown fields are discarded; missing sections are fine.
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        let inner: wire::WebhookRequest = serde_json::from_slice(bytes)?;
        Ok(Self::from_wire(inner))
    }

    /// Read the whole reader and parse it.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, ParseError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::parse(&bytes)
    }

    pub(crate) fn from_wire(inner: wire::WebhookRequest) -> Self {
        Self {
            inner,
            context: None,
        }
    }

    /// Bind the request context.
    ///
    /// # Panics
    /// If a context is already attached.
    pub fn attach_context(&mut self, context: RequestContext) {
        assert!(
            self.context.is_none(),
            "request context attached twice (request id {})",
            context.request_id()
        );
        self.context = Some(context);
    }

    /// The context attached by the server.
    ///
    /// # Panics
    /// If called before the server attached one. Use
    /// [`crate::webhook::testing::TestRequestBuilder`] for offline requests.
    pub fn context(&self) -> &RequestContext {
        self.context
            .as_ref()
            .expect("request context read before it was attached")
    }

    pub fn session_id(&self) -> &str {
        self.inner
            .session_info
            .as_ref()
            .map(|s| s.session.as_str())
            .unwrap_or_default()
    }

    /// Session parameters; empty when the request carries none.
    pub fn session_parameters(&self) -> Parameters {
        self.inner
            .session_info
            .as_ref()
            .and_then(|s| s.parameters.as_ref())
            .map(decode_map)
            .unwrap_or_default()
    }

    pub fn session_parameter(&self, key: &str) -> Option<DynamicValue> {
        self.inner
            .session_info
            .as_ref()
            .and_then(|s| s.parameters.as_ref())
            .and_then(|p| p.get(key))
            .map(decode)
    }

    /// Ordered form parameters of the current page.
    pub fn form_parameter_infos(&self) -> Vec<FormParameter> {
        self.parameter_info()
            .iter()
            .map(|info| FormParameter {
                display_name: info.display_name.clone(),
                value: info.value.as_ref().map(decode).unwrap_or_default(),
                fill_state: info.state,
                required: info.required,
                just_collected: info.just_collected,
            })
            .collect()
    }

    /// Form parameters keyed by display name; a later duplicate wins.
    pub fn form_parameters(&self) -> Parameters {
        form_parameter_map(self.parameter_info())
    }

    /// Free-form payload; empty when absent.
    pub fn payload(&self) -> Parameters {
        self.inner.payload.as_ref().map(decode_map).unwrap_or_default()
    }

    pub fn payload_parameter(&self, key: &str) -> Option<DynamicValue> {
        self.inner
            .payload
            .as_ref()
            .and_then(|p| p.get(key))
            .map(decode)
    }

    /// Tag of the fulfillment that called the webhook; empty when absent.
    pub fn fulfillment_tag(&self) -> &str {
        self.inner
            .fulfillment_info
            .as_ref()
            .map(|f| f.tag.as_str())
            .unwrap_or_default()
    }

    pub fn detect_intent_response_id(&self) -> &str {
        &self.inner.detect_intent_response_id
    }

    /// End-user text input, when the turn was text.
    pub fn text(&self) -> Option<&str> {
        self.inner.text.as_deref()
    }

    pub fn language_code(&self) -> &str {
        &self.inner.language_code
    }

    pub fn current_page(&self) -> Option<&str> {
        self.inner.page_info.as_ref().map(|p| p.current_page.as_str())
    }

    pub fn page_display_name(&self) -> Option<&str> {
        self.inner.page_info.as_ref().map(|p| p.display_name.as_str())
    }

    /// Start a reply seeded from this request.
    pub fn initialize_response(&self) -> WebhookResponse {
        WebhookResponse::from_request(self)
    }

    /// Encode the request back to wire JSON.
    pub fn to_json(&self) -> Result<Vec<u8>, SerializeError> {
        Ok(serde_json::to_vec(&self.inner)?)
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), SerializeError> {
        writer.write_all(&self.to_json()?)?;
        Ok(())
    }

    pub(crate) fn wire(&self) -> &wire::WebhookRequest {
        &self.inner
    }

    fn parameter_info(&self) -> &[wire::ParameterInfo] {
        self.inner
            .page_info
            .as_ref()
            .and_then(|p| p.form_info.as_ref())
            .map(|f| f.parameter_info.as_slice())
            .unwrap_or_default()
    }
}

/// Flatten form slots into a map keyed by display name; a later duplicate wins.
pub(super) fn form_parameter_map(infos: &[wire::ParameterInfo]) -> Parameters {
    infos
        .iter()
        .map(|info| {
            let value = info.value.as_ref().map(decode).unwrap_or_default();
            (info.display_name.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "detectIntentResponseId": "e12be281-028f-4a6b-95c6-9850a27542f1",
        "pageInfo": {
            "currentPage": "projects/p/locations/global/agents/a/flows/f/pages/b34f",
            "displayName": "get-national-benchmarks"
        },
        "sessionInfo": {
            "session": "projects/p/locations/global/agents/a/sessions/0591c1",
            "parameters": {
                "cohort-name": "Back surgery (Spinal fusion)",
                "is-medicare": "medicare",
                "measure-name": "30d-Readmission"
            }
        },
        "fulfillmentInfo": {"tag": "nb-cohorts"},
        "text": "65+",
        "languageCode": "en"
    }"#;

    #[test]
    fn parses_platform_sample() {
        let req = WebhookRequest::parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(req.session_id(), "projects/p/locations/global/agents/a/sessions/0591c1");
        assert_eq!(req.fulfillment_tag(), "nb-cohorts");
        assert_eq!(req.text(), Some("65+"));
        assert_eq!(req.language_code(), "en");
        assert_eq!(req.page_display_name(), Some("get-national-benchmarks"));
        assert_eq!(
            req.session_parameter("is-medicare"),
            Some(DynamicValue::from("medicare"))
        );
        assert_eq!(req.session_parameters().len(), 3);
        assert!(req.payload().is_empty());
        assert!(req.form_parameters().is_empty());
    }

    #[test]
    fn unknown_fields_are_discarded() {
        let body = br#"{
            "sessionInfo": {"session": "s1", "futureField": {"x": 1}},
            "intentInfo": {"lastMatchedIntent": "i", "confidence": 0.9},
            "brandNewSection": [1, 2, 3]
        }"#;
        let req = WebhookRequest::parse(body).unwrap();
        assert_eq!(req.session_id(), "s1");
    }

    #[test]
    fn mistyped_modeled_field_is_parse_error() {
        let err = WebhookRequest::parse(br#"{"sessionInfo": {"session": 42}}"#).unwrap_err();
        assert!(matches!(err, ParseError::Json(_)));

        let err = WebhookRequest::parse(br#"{"payload": "not a struct"}"#).unwrap_err();
        assert!(matches!(err, ParseError::Json(_)));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        assert!(WebhookRequest::parse(b"{\"sessionInfo\": ").is_err());
    }

    #[test]
    fn absent_sections_read_as_empty() {
        let req = WebhookRequest::parse(b"{}").unwrap();
        assert!(req.session_parameters().is_empty());
        assert!(req.payload().is_empty());
        assert!(req.form_parameters().is_empty());
        assert_eq!(req.session_parameter("anything"), None);
        assert_eq!(req.session_id(), "");
        assert_eq!(req.fulfillment_tag(), "");
    }

    #[test]
    fn form_parameters_last_duplicate_wins() {
        let body = br#"{"pageInfo": {"formInfo": {"parameterInfo": [
            {"displayName": "size", "state": "FILLED", "value": "small"},
            {"displayName": "color", "state": "EMPTY", "required": true},
            {"displayName": "size", "state": "FILLED", "value": "large", "justCollected": true}
        ]}}}"#;
        let req = WebhookRequest::parse(body).unwrap();

        let params = req.form_parameters();
        assert_eq!(params.len(), 2);
        assert_eq!(params["size"], DynamicValue::from("large"));
        assert_eq!(params["color"], DynamicValue::Null);

        let infos = req.form_parameter_infos();
        assert_eq!(infos.len(), 3);
        assert_eq!(infos[1].fill_state, FillState::Empty);
        assert!(infos[1].required);
        assert!(infos[2].just_collected);
    }

    #[test]
    fn payload_parameter_lookup() {
        let req = WebhookRequest::parse(br#"{"payload": {"callerId": "+14242556256"}}"#).unwrap();
        assert_eq!(
            req.payload_parameter("callerId"),
            Some(DynamicValue::from("+14242556256"))
        );
        assert_eq!(req.payload_parameter("missing"), None);
    }

    #[test]
    fn reads_from_reader_and_writes_back() {
        let req = WebhookRequest::from_reader(SAMPLE.as_bytes()).unwrap();
        let mut out = Vec::new();
        req.write_to(&mut out).unwrap();
        let again = WebhookRequest::parse(&out).unwrap();
        assert_eq!(again.session_parameters(), req.session_parameters());
        assert_eq!(again.fulfillment_tag(), "nb-cohorts");
    }

    #[test]
    #[should_panic(expected = "before it was attached")]
    fn context_before_attachment_panics() {
        let req = WebhookRequest::parse(b"{}").unwrap();
        let _ = req.context();
    }

    #[test]
    #[should_panic(expected = "attached twice")]
    fn context_attached_twice_panics() {
        let mut req = WebhookRequest::parse(b"{}").unwrap();
        req.attach_context(RequestContext::background());
        req.attach_context(RequestContext::background());
    }
}
