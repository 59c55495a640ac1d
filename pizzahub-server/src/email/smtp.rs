//! SMTP-based email sender for production

use lettre::{
    message::MultiPart, transport::smtp::authentication::Credentials, Message, SmtpTransport,
    Transport,
};

use super::{verification_text, EmailSender};

const GMAIL_HOST: &str = "smtp.gmail.com";

/// Configuration for SMTP email sending
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// SMTP server host
    pub host: String,
    /// 465 uses implicit TLS, anything else STARTTLS
    pub port: u16,
    pub username: String,
    pub password: String,
    /// From email address
    pub from_email: String,
}

impl SmtpConfig {
    /// Create config from environment variables
    ///
    /// Gmail (takes precedence):
    /// - GMAIL_USER
    /// - GMAIL_PASS (an app password)
    ///
    /// Any other relay:
    /// - SMTP_HOST
    /// - SMTP_USER
    /// - SMTP_PASS
    /// - SMTP_PORT (default: 587)
    ///
    /// Optional:
    /// - EMAIL_FROM (default: the SMTP user)
    pub fn from_env() -> Option<Self> {
        // Helper to get non-empty env var
        fn get_env(key: &str) -> Option<String> {
            std::env::var(key).ok().filter(|s| !s.is_empty())
        }

        let from_override = get_env("EMAIL_FROM");

        if let (Some(username), Some(password)) = (get_env("GMAIL_USER"), get_env("GMAIL_PASS")) {
            return Some(Self {
                host: GMAIL_HOST.to_string(),
                port: 465,
                from_email: from_override.unwrap_or_else(|| username.clone()),
                username,
                password,
            });
        }

        let host = get_env("SMTP_HOST")?;
        let username = get_env("SMTP_USER")?;
        let password = get_env("SMTP_PASS")?;

        let port = get_env("SMTP_PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(587);

        Some(Self {
            host,
            port,
            from_email: from_override.unwrap_or_else(|| username.clone()),
            username,
            password,
        })
    }
}

/// SMTP email sender for production use
pub struct SmtpEmailSender {
    transport: SmtpTransport,
    from_email: String,
}

impl SmtpEmailSender {
    /// Create a new SMTP email sender
    pub fn new(config: SmtpConfig) -> Result<Self, String> {
        let creds = Credentials::new(config.username, config.password);

        let builder = if config.port == 465 {
            SmtpTransport::relay(&config.host)
        } else {
            SmtpTransport::starttls_relay(&config.host)
        }
        .map_err(|e| format!("Failed to create SMTP transport: {}", e))?;

        let transport = builder.port(config.port).credentials(creds).build();

        // Test the connection
        transport
            .test_connection()
            .map_err(|e| format!("SMTP connection test failed: {}", e))?;

        tracing::info!(host = %config.host, port = config.port, "SMTP connection established");

        Ok(Self {
            transport,
            from_email: config.from_email,
        })
    }

    fn send_email(
        &self,
        to: &str,
        subject: &str,
        text: String,
        html: String,
    ) -> Result<(), String> {
        let from = format!("PizzaHub <{}>", self.from_email)
            .parse()
            .map_err(|e| format!("Invalid from address: {}", e))?;

        let to_addr = to
            .parse()
            .map_err(|e| format!("Invalid to address: {}", e))?;

        let email = Message::builder()
            .from(from)
            .to(to_addr)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(text, html))
            .map_err(|e| format!("Failed to build email: {}", e))?;

        self.transport
            .send(&email)
            .map_err(|e| format!("Failed to send email: {}", e))?;

        Ok(())
    }
}

/// Escape text for interpolation into an HTML body
fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// The registration name is user input, so both values are escaped
fn verification_html(name: &str, code: &str) -> String {
    format!(
        "<p>Hi {},</p>\
         <p>Your PizzaHub verification code is:</p>\
         <h2 style=\"letter-spacing: 4px\">{}</h2>\
         <p>This code expires in 15 minutes.</p>",
        escape_html(name),
        escape_html(code)
    )
}

impl EmailSender for SmtpEmailSender {
    fn send_verification(&self, email: &str, name: &str, code: &str) -> Result<(), String> {
        self.send_email(
            email,
            "Your PizzaHub verification code",
            verification_text(name, code),
            verification_html(name, code),
        )?;
        tracing::info!(email = %email, "Verification email sent");
        Ok(())
    }
}
