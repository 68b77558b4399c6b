//! Receipt email delivery.
//!
//! Uses SMTP via lettre with Askama templates. Delivery is fire-and-forget:
//! the checkout response never waits on (or fails because of) the mailer.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;
use crate::services::checkout::ReceiptLine;

/// HTML template for the purchase receipt email.
#[derive(Template)]
#[template(path = "email/receipt.html")]
struct ReceiptEmailHtml<'a> {
    rows: &'a [ReceiptRow],
    order_total: &'a str,
}

/// Plain text template for the purchase receipt email.
#[derive(Template)]
#[template(path = "email/receipt.txt")]
struct ReceiptEmailText<'a> {
    rows: &'a [ReceiptRow],
    order_total: &'a str,
}

/// One pre-formatted receipt row for the templates.
struct ReceiptRow {
    name: String,
    quantity: i32,
    line_total: String,
}

impl From<&ReceiptLine> for ReceiptRow {
    fn from(line: &ReceiptLine) -> Self {
        let line_total = Decimal::from(line.quantity) * line.price;
        Self {
            name: line.name.clone(),
            quantity: line.quantity,
            line_total: format_money(line_total),
        }
    }
}

fn format_money(amount: Decimal) -> String {
    let mut amount = amount.round_dp(2);
    amount.rescale(2);
    format!("${amount}")
}

/// Errors that can occur when sending a receipt.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Sends purchase receipts over SMTP.
#[derive(Clone)]
pub struct ReceiptMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl ReceiptMailer {
    /// Create a mailer from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay address is invalid.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send a receipt listing the purchased lines and the order total.
    ///
    /// # Errors
    ///
    /// Returns error if the email fails to send or a template fails to
    /// render.
    pub async fn send_receipt(
        &self,
        to: &str,
        lines: &[ReceiptLine],
        order_total: Decimal,
    ) -> Result<(), NotifyError> {
        let rows: Vec<ReceiptRow> = lines.iter().map(ReceiptRow::from).collect();
        let total = format_money(order_total);

        let html = ReceiptEmailHtml {
            rows: &rows,
            order_total: &total,
        }
        .render()?;
        let text = ReceiptEmailText {
            rows: &rows,
            order_total: &total,
        }
        .render()?;

        self.send_multipart_email(to, "Your Meridian order receipt", &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| NotifyError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| NotifyError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

/// Dispatch a receipt in the background.
///
/// No-op when the mailer is disabled or nothing was purchased. Failures are
/// logged, never surfaced to the caller.
pub fn spawn_receipt(
    mailer: Option<ReceiptMailer>,
    to: String,
    lines: Vec<ReceiptLine>,
    order_total: Decimal,
) {
    let Some(mailer) = mailer else {
        return;
    };
    if lines.is_empty() {
        return;
    }

    tokio::spawn(async move {
        if let Err(e) = mailer.send_receipt(&to, &lines, order_total).await {
            tracing::warn!(to = %to, error = %e, "Failed to send receipt email");
        }
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn lines() -> Vec<ReceiptLine> {
        vec![
            ReceiptLine {
                name: "Fieldmaster 38".to_string(),
                quantity: 2,
                price: Decimal::from(150),
            },
            ReceiptLine {
                name: "Tidewatch Quartz".to_string(),
                quantity: 1,
                price: Decimal::new(9950, 2),
            },
        ]
    }

    #[test]
    fn test_receipt_templates_render() {
        let rows: Vec<ReceiptRow> = lines().iter().map(ReceiptRow::from).collect();
        let total = format_money(Decimal::new(39950, 2));

        let html = ReceiptEmailHtml {
            rows: &rows,
            order_total: &total,
        }
        .render()
        .unwrap();
        assert!(html.contains("Fieldmaster 38"));
        assert!(html.contains("$300.00"));
        assert!(html.contains("$399.50"));

        let text = ReceiptEmailText {
            rows: &rows,
            order_total: &total,
        }
        .render()
        .unwrap();
        assert!(text.contains("Tidewatch Quartz"));
        assert!(text.contains("$99.50"));
    }

    #[test]
    fn test_format_money_two_decimal_places() {
        assert_eq!(format_money(Decimal::from(300)), "$300.00");
        assert_eq!(format_money(Decimal::new(9950, 2)), "$99.50");
        assert_eq!(format_money(Decimal::new(12345, 3)), "$12.35");
    }
}
