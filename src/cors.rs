//! Cross-origin policy for the public endpoints
//!
//! One table decides the allowed origin per endpoint family. Both preflight
//! answers and regular responses come from the layer built here.

use crate::error::ConfigError;
use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Group of endpoints sharing one consumer origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointFamily {
    /// `/api/products` and `/api/products/verify`
    Storefront,
    /// `/api/update-inventory`
    Checkout,
}

impl EndpointFamily {
    fn methods(self) -> [Method; 2] {
        match self {
            EndpointFamily::Storefront => [Method::GET, Method::OPTIONS],
            EndpointFamily::Checkout => [Method::POST, Method::OPTIONS],
        }
    }
}

/// Allowed origins, production pins one per family
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    production: bool,
    storefront_origin: HeaderValue,
    checkout_origin: HeaderValue,
}

impl CorsPolicy {
    pub fn new(
        production: bool,
        storefront_origin: &str,
        checkout_origin: &str,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            production,
            storefront_origin: parse_origin(storefront_origin)?,
            checkout_origin: parse_origin(checkout_origin)?,
        })
    }

    /// Any origin allowed, used outside production
    pub fn permissive() -> Self {
        Self {
            production: false,
            storefront_origin: HeaderValue::from_static("*"),
            checkout_origin: HeaderValue::from_static("*"),
        }
    }

    pub fn is_production(&self) -> bool {
        self.production
    }

    /// Value sent as `Access-Control-Allow-Origin` for a family
    pub fn allowed_origin(&self, family: EndpointFamily) -> HeaderValue {
        if !self.production {
            return HeaderValue::from_static("*");
        }
        match family {
            EndpointFamily::Storefront => self.storefront_origin.clone(),
            EndpointFamily::Checkout => self.checkout_origin.clone(),
        }
    }

    /// Layer answering preflights and decorating responses for a family
    pub fn layer(&self, family: EndpointFamily) -> CorsLayer {
        let allow_origin = if self.production {
            AllowOrigin::exact(self.allowed_origin(family))
        } else {
            AllowOrigin::any()
        };

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(family.methods())
            .allow_headers([header::CONTENT_TYPE])
    }
}

fn parse_origin(origin: &str) -> Result<HeaderValue, ConfigError> {
    let origin = origin.trim_end_matches('/');
    if !(origin.starts_with("https://") || origin.starts_with("http://")) {
        return Err(ConfigError::InvalidOrigin(
            origin.to_string(),
            "expected an http(s) origin".to_string(),
        ));
    }
    HeaderValue::from_str(origin)
        .map_err(|e| ConfigError::InvalidOrigin(origin.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn production() -> CorsPolicy {
        CorsPolicy::new(
            true,
            "https://shop.example.com/",
            "https://www.example.com",
        )
        .unwrap()
    }

    #[test]
    fn production_pins_origin_per_family() {
        let policy = production();
        assert_eq!(
            policy.allowed_origin(EndpointFamily::Storefront),
            "https://shop.example.com"
        );
        assert_eq!(
            policy.allowed_origin(EndpointFamily::Checkout),
            "https://www.example.com"
        );
    }

    #[test]
    fn non_production_allows_any_origin() {
        let policy = CorsPolicy::new(false, "https://shop.example.com", "https://www.example.com")
            .unwrap();
        assert!(!policy.is_production());
        assert_eq!(policy.allowed_origin(EndpointFamily::Storefront), "*");
        assert_eq!(CorsPolicy::permissive().allowed_origin(EndpointFamily::Checkout), "*");
    }

    #[test]
    fn rejects_non_http_origin() {
        let err = CorsPolicy::new(true, "shop.example.com", "https://www.example.com").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOrigin(..)));
    }

    #[test]
    fn family_methods() {
        assert_eq!(
            EndpointFamily::Checkout.methods(),
            [Method::POST, Method::OPTIONS]
        );
        assert_eq!(
            EndpointFamily::Storefront.methods(),
            [Method::GET, Method::OPTIONS]
        );
    }
}
