//! Demo handlers served by the `cx-webhook` binary.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use cx_webhook::{
    DynamicValue, Handler, HandlerResult, WebhookRequest, WebhookResponse, WebhookServer,
};

/// Order confirmation. Pickup lead time is injected rather than global.
pub struct Confirm {
    pub pickup_days: u32,
    pub cancel_period_days: u32,
}

impl Default for Confirm {
    fn default() -> Self {
        Self {
            pickup_days: 5,
            cancel_period_days: 2,
        }
    }
}

#[async_trait]
impl Handler for Confirm {
    async fn handle(&self, res: &mut WebhookResponse, req: &WebhookRequest) -> HandlerResult {
        let mut params = req.session_parameters();
        let size = params.get("size").map(|v| v.to_string()).unwrap_or_default();
        let color = params.get("color").map(|v| v.to_string()).unwrap_or_default();

        res.add_text_message([format!(
            "You can pick up your order for a {} {} shirt in {} days.",
            size, color, self.pickup_days
        )]);
        params.insert(
            "cancel-period".to_string(),
            self.cancel_period_days.to_string().into(),
        );
        res.add_session_parameters(params);
        Ok(())
    }
}

/// Echo the `color` session parameter and mark it processed.
pub fn hello(res: &mut WebhookResponse, req: &WebhookRequest) -> HandlerResult {
    let mut params = req.session_parameters();
    let Some(color) = params.remove("color") else {
        res.add_text_message(["I couldn't find the provided color."]);
        return Err("missing session parameter: color".into());
    };

    params.insert("color-processed".to_string(), true.into());
    res.set_session_parameters(params);
    res.add_text_message([format!("The provided color was {}", color)]);
    Ok(())
}

/// Strip periods, commas and spaces from every string session parameter.
pub fn trimmer(res: &mut WebhookResponse, req: &WebhookRequest) -> HandlerResult {
    let trimmed = req
        .session_parameters()
        .into_iter()
        .map(|(key, value)| match value {
            DynamicValue::String(s) => {
                let s: String = s.chars().filter(|c| !matches!(c, '.' | ',' | ' ')).collect();
                (key, DynamicValue::String(s))
            }
            other => (key, other),
        })
        .collect();
    res.add_session_parameters(trimmed);
    Ok(())
}

#[derive(Debug, Deserialize)]
struct Joke {
    joke: String,
}

/// Tells a joke fetched from a remote API through an injected client.
pub struct Jokes {
    client: reqwest::Client,
    url: String,
}

impl Jokes {
    pub const DEFAULT_URL: &'static str = "https://icanhazdadjoke.com/";

    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    async fn fetch(&self) -> Result<Joke, reqwest::Error> {
        self.client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(Duration::from_secs(5))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

#[async_trait]
impl Handler for Jokes {
    async fn handle(&self, res: &mut WebhookResponse, req: &WebhookRequest) -> HandlerResult {
        let ctx = req.context();
        let joke = tokio::select! {
            joke = self.fetch() => joke?,
            _ = ctx.cancelled() => return Err("server shutting down".into()),
        };

        tracing::info!(request_id = ctx.request_id(), joke = %joke.joke, "Fetched joke");
        res.add_text_message([joke.joke]);
        Ok(())
    }
}

/// Register every demo route on `server`.
pub fn register(server: &mut WebhookServer, http: reqwest::Client) {
    server.register_handler("/confirm", Confirm::default());
    server.register_handler("/hello", hello);
    server.register_handler("/trimmer", trimmer);
    server.register_handler("/tell-a-joke", Jokes::new(http, Jokes::DEFAULT_URL));
}
