//! Email sending abstractions

pub mod console;
pub mod smtp;

use std::sync::Arc;

pub use console::ConsoleEmailSender;
pub use smtp::{SmtpConfig, SmtpEmailSender};

/// Trait for sending verification emails
pub trait EmailSender: Send + Sync {
    /// Send a verification code to `email`, greeting the user by `name`
    fn send_verification(&self, email: &str, name: &str, code: &str) -> Result<(), String>;
}

/// Allow using Box<dyn EmailSender> as an EmailSender
impl EmailSender for Box<dyn EmailSender> {
    fn send_verification(&self, email: &str, name: &str, code: &str) -> Result<(), String> {
        (**self).send_verification(email, name, code)
    }
}

/// Plain-text body of the verification email
pub(crate) fn verification_text(name: &str, code: &str) -> String {
    format!(
        "Hi {},\n\n\
         Your PizzaHub verification code is: {}\n\n\
         This code expires in 15 minutes.\n\n\
         If you didn't create an account, you can safely ignore this email.",
        name, code
    )
}

/// Fire-and-forget dispatch of emails.
///
/// Sends run on the blocking pool so SMTP round trips never hold up the
/// request. Failures are logged and dropped.
pub struct Notifier<E> {
    sender: Arc<E>,
}

impl<E> Clone for Notifier<E> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl<E: EmailSender + 'static> Notifier<E> {
    pub fn new(sender: E) -> Self {
        Self {
            sender: Arc::new(sender),
        }
    }

    /// The wrapped sender
    pub fn sender(&self) -> &E {
        &self.sender
    }

    /// Queue a verification email and return immediately
    pub fn verification_code(&self, email: &str, name: &str, code: &str) {
        let sender = Arc::clone(&self.sender);
        let (email, name, code) = (email.to_string(), name.to_string(), code.to_string());

        tokio::task::spawn_blocking(move || {
            if let Err(e) = sender.send_verification(&email, &name, &code) {
                tracing::warn!(email = %email, error = %e, "Failed to send verification email");
            }
        });
    }
}
