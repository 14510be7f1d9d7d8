//! Bearer token storage shared between the session layer and the HTTP client.

use tokio::sync::{RwLock, watch};

/// Tokens handed over at sign-in. Either one may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Token issued by the backend's own login.
    pub session_token: Option<String>,
    /// Token issued by the federated identity provider.
    pub federated_token: Option<String>,
}

impl Credentials {
    /// Tokens to try in order: the session token first, then the federated one.
    fn ordered(&self) -> Vec<String> {
        let mut tokens: Vec<String> = Vec::with_capacity(2);
        for token in [&self.session_token, &self.federated_token]
            .into_iter()
            .flatten()
        {
            let token = token.trim();
            if !token.is_empty() && !tokens.iter().any(|known| known == token) {
                tokens.push(token.to_string());
            }
        }
        tokens
    }
}

/// Holds the current credentials and broadcasts sign-in state changes.
pub struct TokenStore {
    credentials: RwLock<Credentials>,
    signed_in: watch::Sender<bool>,
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore {
    /// Create an empty store (signed out).
    pub fn new() -> Self {
        let (signed_in, _rx) = watch::channel(false);
        Self {
            credentials: RwLock::new(Credentials::default()),
            signed_in,
        }
    }

    /// Replace the stored credentials and flag the session as signed in when any token is usable.
    pub async fn install(&self, credentials: Credentials) {
        let usable = !credentials.ordered().is_empty();
        {
            let mut guard = self.credentials.write().await;
            *guard = credentials;
        }
        self.update_signed_in(usable);
    }

    /// Forget every token and flag the session as signed out.
    pub async fn clear(&self) {
        {
            let mut guard = self.credentials.write().await;
            *guard = Credentials::default();
        }
        self.update_signed_in(false);
    }

    /// Tokens to attempt for a request, primary first. At most two entries.
    pub async fn candidates(&self) -> Vec<String> {
        self.credentials.read().await.ordered()
    }

    /// Current signed-in flag.
    pub fn is_signed_in(&self) -> bool {
        *self.signed_in.borrow()
    }

    /// Subscribe to sign-in state updates.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.signed_in.subscribe()
    }

    fn update_signed_in(&self, value: bool) {
        self.signed_in.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }
}
