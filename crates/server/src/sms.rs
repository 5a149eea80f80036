use uuid::Uuid;

// --- Environment helpers ---

fn gateway_url() -> Result<String, String> {
    std::env::var("SMS_GATEWAY_URL").map_err(|_| "SMS_GATEWAY_URL is not configured".to_string())
}

fn gateway_api_key() -> Result<String, String> {
    std::env::var("SMS_GATEWAY_API_KEY")
        .map_err(|_| "SMS_GATEWAY_API_KEY is not configured".to_string())
}

fn sender_id() -> String {
    std::env::var("SMS_SENDER_ID").unwrap_or_else(|_| "LGLCMS".to_string())
}

// --- Trait ---

/// Outbound SMS delivery. Returns the provider's message reference.
#[allow(async_fn_in_trait)]
pub trait SmsGateway: Send + Sync {
    async fn send(
        &self,
        to: &str,
        message: &str,
        dlt_template_id: Option<&str>,
    ) -> Result<String, String>;
}

/// Stub gateway: logs the message and returns a synthetic reference.
pub struct LoggingSmsGateway;

impl SmsGateway for LoggingSmsGateway {
    async fn send(
        &self,
        to: &str,
        message: &str,
        _dlt_template_id: Option<&str>,
    ) -> Result<String, String> {
        let reference = format!("stub-{}", Uuid::new_v4());
        tracing::info!(
            to = %crate::services::masking::mask_mobile(to),
            chars = message.chars().count(),
            reference = %reference,
            "SMS logged (stub gateway)"
        );
        Ok(reference)
    }
}

/// Form-encoded HTTP gateway configured through `SMS_GATEWAY_*`.
pub struct HttpSmsGateway {
    client: reqwest::Client,
    url: String,
    api_key: String,
    sender_id: String,
}

impl HttpSmsGateway {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            client: reqwest::Client::new(),
            url: gateway_url()?,
            api_key: gateway_api_key()?,
            sender_id: sender_id(),
        })
    }
}

impl SmsGateway for HttpSmsGateway {
    #[tracing::instrument(skip(self, to, message))]
    async fn send(
        &self,
        to: &str,
        message: &str,
        dlt_template_id: Option<&str>,
    ) -> Result<String, String> {
        let mut form = vec![
            ("sender", self.sender_id.clone()),
            ("to", to.to_string()),
            ("message", message.to_string()),
        ];
        if let Some(id) = dlt_template_id {
            form.push(("template_id", id.to_string()));
        }

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| format!("SMS gateway request failed: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("SMS gateway error ({}): {}", status, body));
        }

        let body: serde_json::Value = response.json().await.unwrap_or_default();
        let reference = body
            .get("message_id")
            .or_else(|| body.get("id"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("http-{}", Uuid::new_v4()));

        tracing::info!(reference = %reference, "SMS accepted by gateway");
        Ok(reference)
    }
}

// --- Backend selection ---

/// The configured SMS backend.
pub enum SmsSender {
    Logging(LoggingSmsGateway),
    Http(HttpSmsGateway),
}

impl SmsSender {
    /// HTTP gateway when `features.sms_gateway` is on, otherwise the stub.
    pub fn from_config() -> Result<Self, String> {
        if crate::config::feature_flags().sms_gateway {
            Ok(Self::Http(HttpSmsGateway::from_env()?))
        } else {
            Ok(Self::Logging(LoggingSmsGateway))
        }
    }
}

impl SmsGateway for SmsSender {
    async fn send(
        &self,
        to: &str,
        message: &str,
        dlt_template_id: Option<&str>,
    ) -> Result<String, String> {
        match self {
            Self::Logging(g) => g.send(to, message, dlt_template_id).await,
            Self::Http(g) => g.send(to, message, dlt_template_id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn logging_gateway_returns_stub_reference() {
        let reference = LoggingSmsGateway
            .send("9876543210", "Hello", None)
            .await
            .unwrap();
        assert!(reference.starts_with("stub-"));
    }
}
