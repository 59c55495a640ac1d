//! Shared application state

use std::path::PathBuf;

use pizzahub_core::{Lifecycle, TokenService};

use crate::email::{EmailSender, Notifier};
use crate::store::{CatalogStore, OrderStore, UserStore};

/// Where uploaded images go and how they are addressed
#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub dir: PathBuf,
    /// `scheme://host[:port]` prefix for image URLs. Derived from the
    /// request's Host header when `None`.
    pub public_base_url: Option<String>,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("uploads"),
            public_base_url: None,
        }
    }
}

/// Application state shared by every handler
pub struct AppState<U, C, O, E> {
    /// Issues and verifies session tokens
    pub tokens: TokenService,
    /// Rules for admin status changes
    pub lifecycle: Lifecycle,
    pub uploads: UploadSettings,
    pub user_store: U,
    pub catalog_store: C,
    pub order_store: O,
    /// Outbound verification emails, dispatched off the request path
    pub notifier: Notifier<E>,
}

impl<U, C, O, E> AppState<U, C, O, E>
where
    U: UserStore,
    C: CatalogStore,
    O: OrderStore,
    E: EmailSender + 'static,
{
    pub fn new(
        tokens: TokenService,
        user_store: U,
        catalog_store: C,
        order_store: O,
        email_sender: E,
    ) -> Self {
        Self {
            tokens,
            lifecycle: Lifecycle::default(),
            uploads: UploadSettings::default(),
            user_store,
            catalog_store,
            order_store,
            notifier: Notifier::new(email_sender),
        }
    }

    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    pub fn with_uploads(mut self, uploads: UploadSettings) -> Self {
        self.uploads = uploads;
        self
    }
}
