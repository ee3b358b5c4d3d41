//! Offline helpers for exercising handlers without a server.

use uuid::Uuid;

use crate::codec::{encode_map, CodecError, DynamicValue, Parameters};
use crate::webhook::context::RequestContext;
use crate::webhook::handler::{BoxError, Handler};
use crate::webhook::request::WebhookRequest;
use crate::webhook::response::WebhookResponse;
use crate::webhook::wire;

/// Builds a [`WebhookRequest`] the way the platform would send it.
///
/// The session id defaults to a random UUID and the request gets a
/// background context, so handlers can call `req.context()`.
#[derive(Debug, Clone)]
pub struct TestRequestBuilder {
    session_id: String,
    session: Option<Parameters>,
    payload: Option<Parameters>,
    form: Option<Vec<(String, DynamicValue)>>,
    tag: Option<String>,
    text: Option<String>,
    language_code: String,
}

impl Default for TestRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRequestBuilder {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            session: None,
            payload: None,
            form: None,
            tag: None,
            text: None,
            language_code: "en".to_string(),
        }
    }

    pub fn session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = id.into();
        self
    }

    pub fn session_parameter(mut self, key: impl Into<String>, value: impl Into<DynamicValue>) -> Self {
        self.session
            .get_or_insert_with(Parameters::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn session_parameters(mut self, params: Parameters) -> Self {
        self.session.get_or_insert_with(Parameters::new).extend(params);
        self
    }

    pub fn payload_parameter(mut self, key: impl Into<String>, value: impl Into<DynamicValue>) -> Self {
        self.payload
            .get_or_insert_with(Parameters::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn payload(mut self, params: Parameters) -> Self {
        self.payload.get_or_insert_with(Parameters::new).extend(params);
        self
    }

    /// Add a filled form parameter to the current page.
    pub fn form_parameter(mut self, name: impl Into<String>, value: impl Into<DynamicValue>) -> Self {
        self.form
            .get_or_insert_with(Vec::new)
            .push((name.into(), value.into()));
        self
    }

    pub fn fulfillment_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn language_code(mut self, code: impl Into<String>) -> Self {
        self.language_code = code.into();
        self
    }

    /// Encode everything into a request. Fails if a value has no wire form.
    pub fn build(self) -> Result<WebhookRequest, CodecError> {
        let parameters = self.session.as_ref().map(encode_map).transpose()?;
        let payload = self.payload.as_ref().map(encode_map).transpose()?;

        let page_info = match self.form {
            Some(form) => {
                let mut parameter_info = Vec::with_capacity(form.len());
                for (name, value) in form {
                    parameter_info.push(wire::ParameterInfo {
                        value: Some(crate::codec::encode(&value)?),
                        display_name: name,
                        state: wire::FillState::Filled,
                        required: false,
                        just_collected: false,
                    });
                }
                Some(wire::PageInfo {
                    form_info: Some(wire::FormInfo { parameter_info }),
                    ..Default::default()
                })
            }
            None => None,
        };

        let inner = wire::WebhookRequest {
            detect_intent_response_id: Uuid::new_v4().to_string(),
            text: self.text,
            language_code: self.language_code,
            fulfillment_info: self.tag.map(|tag| wire::FulfillmentInfo { tag }),
            page_info,
            session_info: Some(wire::SessionInfo {
                session: self.session_id,
                parameters,
            }),
            payload,
            ..Default::default()
        };

        let mut req = WebhookRequest::from_wire(inner);
        req.attach_context(RequestContext::background());
        Ok(req)
    }
}

/// Seed a response from `req`, run `handler`, and return what it built.
pub async fn run_handler<H>(handler: &H, req: &WebhookRequest) -> Result<WebhookResponse, BoxError>
where
    H: Handler + ?Sized,
{
    let mut res = WebhookResponse::from_request(req);
    handler.handle(&mut res, req).await?;
    Ok(res)
}
