//! CSRF verification for state-changing requests.
//!
//! Applies to routes without the `@api` marker when the method is `POST`,
//! `PUT`, `PATCH` or `DELETE`. The token is looked up in the JSON body, then
//! the form body, then the configured header, and checked against the
//! [`TokenStore`].

use std::fmt;
use std::sync::Arc;

use switchyard_config::CsrfConfig;
use switchyard_core::{DispatchFailure, RequestContext, TokenStore};
use switchyard_router::{RouteEntry, RouteMethod};

use crate::input::BodyInput;

/// Verifies CSRF tokens.
#[derive(Clone)]
pub struct CsrfGuard {
    store: Arc<dyn TokenStore>,
    enabled: bool,
    token_name: String,
    header_name: String,
}

impl CsrfGuard {
    /// Creates a guard from configuration.
    #[must_use]
    pub fn new(store: Arc<dyn TokenStore>, config: &CsrfConfig) -> Self {
        Self {
            store,
            enabled: config.enabled,
            token_name: config.token_name.clone(),
            header_name: config.header_name.to_ascii_lowercase(),
        }
    }

    /// Returns the body/query field that carries the token.
    #[must_use]
    pub fn token_name(&self) -> &str {
        &self.token_name
    }

    /// Returns true if the request must carry a valid token.
    #[must_use]
    pub fn applies(&self, entry: &RouteEntry, ctx: &RequestContext) -> bool {
        self.enabled
            && !entry.is_api
            && RouteMethod::from_http(ctx.method()).is_some_and(RouteMethod::is_state_changing)
    }

    /// Checks the request's token.
    pub(crate) fn verify(&self, ctx: &RequestContext, body: &BodyInput) -> Result<(), DispatchFailure> {
        let token = body
            .json_str(&self.token_name)
            .or_else(|| body.form_str(&self.token_name))
            .or_else(|| ctx.header(&self.header_name));

        match token {
            None => Err(DispatchFailure::Csrf {
                reason: "token missing".to_string(),
            }),
            Some(token) if self.store.is_valid_token(token) => Ok(()),
            Some(_) => Err(DispatchFailure::Csrf {
                reason: "token mismatch".to_string(),
            }),
        }
    }
}

impl fmt::Debug for CsrfGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsrfGuard")
            .field("enabled", &self.enabled)
            .field("token_name", &self.token_name)
            .field("header_name", &self.header_name)
            .finish_non_exhaustive()
    }
}
