use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

/// Sends an email to a single recipient. Confirmation and reset links go
/// through this; handlers decide whether a failure is fatal.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> anyhow::Result<()>;
}

/// Mail delivery over the Postmark HTTP API.
pub struct PostmarkMailer {
    http_client: Client,
    base_url: String,
    sender: String,
    server_token: String,
}

impl PostmarkMailer {
    pub fn new(base_url: &str, sender: &str, server_token: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.to_owned(),
            sender: sender.to_owned(),
            server_token: server_token.to_owned(),
        }
    }
}

const MESSAGE_STREAM: &str = "outbound";
const POSTMARK_AUTH_HEADER: &str = "X-Postmark-Server-Token";

#[derive(serde::Serialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html_body: &'a str,
    message_stream: &'a str,
}

#[async_trait]
impl Mailer for PostmarkMailer {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> anyhow::Result<()> {
        let base = Url::parse(&self.base_url)?;
        let url = base.join("/email")?;

        let request_body = SendEmailRequest {
            from: &self.sender,
            to: recipient,
            subject,
            html_body,
            message_stream: MESSAGE_STREAM,
        };

        self.http_client
            .post(url)
            .header(POSTMARK_AUTH_HEADER, &self.server_token)
            .json(&request_body)
            .send()
            .await?
            .error_for_status()?;

        debug!(to = %recipient, subject = %subject, "email sent");
        Ok(())
    }
}
