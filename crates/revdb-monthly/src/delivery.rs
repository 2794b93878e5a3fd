//! HTML-to-PDF conversion and SendGrid email delivery.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::Client;
use revdb_core::AppConfig;
use serde_json::{json, Value};

use crate::error::DeliveryError;
use crate::{Mailer, PdfRenderer};

const USER_AGENT: &str = "revdb/0.1 (monthly-review-analysis)";
const SENDGRID_BASE_URL: &str = "https://api.sendgrid.com";

/// Responses shorter than this are not real PDFs.
pub const MIN_PDF_BYTES: usize = 100;

/// Posts HTML to a conversion service and returns the PDF bytes.
pub struct HttpPdfRenderer {
    client: Client,
    url: String,
    api_key: String,
}

impl HttpPdfRenderer {
    /// # Errors
    ///
    /// Returns [`DeliveryError::Http`] if the HTTP client cannot be built.
    pub fn new(url: &str, api_key: &str, timeout_secs: u64) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            url: url.to_owned(),
            api_key: api_key.to_owned(),
        })
    }

    /// `None` when `REVDB_PDF_API_URL` or `REVDB_PDF_API_KEY` is unset.
    ///
    /// # Errors
    ///
    /// Same as [`Self::new`].
    pub fn from_app_config(config: &AppConfig) -> Result<Option<Self>, DeliveryError> {
        match (&config.pdf_api_url, &config.pdf_api_key) {
            (Some(url), Some(key)) => Self::new(url, key, config.pdf_timeout_secs).map(Some),
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl PdfRenderer for HttpPdfRenderer {
    async fn render_pdf(&self, html: &str) -> Result<Vec<u8>, DeliveryError> {
        let response = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "text/html")
            .header(reqwest::header::ACCEPT, "application/pdf")
            .body(html.to_owned())
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::UnexpectedStatus {
                service: "PDF API",
                status: status.as_u16(),
                body: body.chars().take(300).collect(),
            });
        }

        let bytes = response.bytes().await?;
        if bytes.len() < MIN_PDF_BYTES {
            return Err(DeliveryError::PdfTooSmall(bytes.len()));
        }
        Ok(bytes.to_vec())
    }
}

/// Sender identity and template for SendGrid messages.
#[derive(Debug, Clone)]
pub struct SendGridSettings {
    pub api_key: String,
    pub template_id: Option<String>,
    pub from_email: String,
    pub from_name: String,
}

/// SendGrid v3 `mail/send` client.
pub struct SendGridMailer {
    client: Client,
    endpoint: String,
    settings: SendGridSettings,
}

impl SendGridMailer {
    /// # Errors
    ///
    /// Returns [`DeliveryError::Http`] if the HTTP client cannot be built.
    pub fn new(settings: SendGridSettings) -> Result<Self, DeliveryError> {
        Self::with_base_url(SENDGRID_BASE_URL, settings)
    }

    /// Creates a mailer rooted at `base_url` (for wiremock).
    ///
    /// # Errors
    ///
    /// Same as [`Self::new`].
    pub fn with_base_url(base_url: &str, settings: SendGridSettings) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/v3/mail/send", base_url.trim_end_matches('/')),
            settings,
        })
    }

    /// `None` when `REVDB_SENDGRID_API_KEY` is unset.
    ///
    /// # Errors
    ///
    /// Same as [`Self::new`].
    pub fn from_app_config(config: &AppConfig) -> Result<Option<Self>, DeliveryError> {
        let Some(api_key) = config.sendgrid_api_key.clone() else {
            return Ok(None);
        };
        Self::new(SendGridSettings {
            api_key,
            template_id: config.sendgrid_template_id.clone(),
            from_email: config.email_from.clone(),
            from_name: config.email_from_name.clone(),
        })
        .map(Some)
    }

    fn sender(&self) -> Value {
        json!({"email": self.settings.from_email, "name": self.settings.from_name})
    }

    async fn send(&self, message: &Value) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.settings.api_key)
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::UnexpectedStatus {
                service: "SendGrid",
                status: status.as_u16(),
                body: body.chars().take(300).collect(),
            });
        }
        Ok(())
    }
}

/// `<Client>_Monthly_Report_<Month>.pdf` with whitespace replaced by `_`.
#[must_use]
pub fn attachment_filename(client_name: &str, month_label: &str) -> String {
    let underscore = |s: &str| s.split_whitespace().collect::<Vec<_>>().join("_");
    format!(
        "{}_Monthly_Report_{}.pdf",
        underscore(client_name),
        underscore(month_label)
    )
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send_monthly_report(
        &self,
        client_name: &str,
        recipient: &str,
        month_label: &str,
        pdf: &[u8],
    ) -> Result<(), DeliveryError> {
        if recipient.trim().is_empty() {
            return Err(DeliveryError::EmptyInput("email address"));
        }
        if pdf.is_empty() {
            return Err(DeliveryError::EmptyInput("PDF report"));
        }

        let mut message = json!({
            "from": self.sender(),
            "personalizations": [{
                "to": [{"email": recipient, "name": client_name}],
                "dynamic_template_data": {"client_name": client_name, "month": month_label}
            }],
            "attachments": [{
                "content": STANDARD.encode(pdf),
                "type": "application/pdf",
                "filename": attachment_filename(client_name, month_label),
                "disposition": "attachment"
            }]
        });
        if let Some(template_id) = &self.settings.template_id {
            message["template_id"] = json!(template_id);
        }

        self.send(&message).await
    }

    async fn send_plain_text(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), DeliveryError> {
        if recipient.trim().is_empty() {
            return Err(DeliveryError::EmptyInput("recipient email address"));
        }
        if body.is_empty() {
            return Err(DeliveryError::EmptyInput("email content"));
        }

        let message = json!({
            "from": self.sender(),
            "subject": subject,
            "personalizations": [{"to": [{"email": recipient}]}],
            "content": [{"type": "text/plain", "value": body}]
        });
        self.send(&message).await
    }
}
