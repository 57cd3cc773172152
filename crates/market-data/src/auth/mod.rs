//! Credential lifecycle: token storage, exchange, and serialized refresh.

pub mod store;
pub mod token_manager;

pub use store::{MemoryTokenStore, StoredToken, TokenStore};
pub use token_manager::{
    AccessToken, CredentialExchange, HttpCredentialExchange, IssuedToken, TokenManager,
    DEFAULT_TOKEN_LIFETIME_SECS, REFRESH_BUFFER_MINUTES, TOKEN_TIMESTAMP_FORMAT,
};
