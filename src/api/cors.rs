//! CORS layer built from [`CorsConfig`].

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};

use crate::config::{ConfigError, CorsConfig};

fn is_wildcard(values: &[String]) -> bool {
    values.iter().any(|v| v == "*")
}

/// Build the CORS layer.
///
/// Browsers reject `*` on credentialed requests, so wildcards are answered by
/// mirroring the request when credentials are allowed.
pub fn cors_layer(config: &CorsConfig) -> Result<CorsLayer, ConfigError> {
    let mirror = config.allow_credentials;

    let origins = if is_wildcard(&config.origins) {
        if mirror {
            AllowOrigin::mirror_request()
        } else {
            AllowOrigin::from(Any)
        }
    } else {
        let origins = config
            .origins
            .iter()
            .map(|o| {
                HeaderValue::from_str(o).map_err(|e| {
                    ConfigError::InvalidValue("CORS_ORIGINS".to_string(), e.to_string())
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(origins)
    };

    let methods = if is_wildcard(&config.allow_methods) {
        if mirror {
            AllowMethods::mirror_request()
        } else {
            AllowMethods::from(Any)
        }
    } else {
        let methods = config
            .allow_methods
            .iter()
            .map(|m| {
                Method::from_bytes(m.to_uppercase().as_bytes()).map_err(|e| {
                    ConfigError::InvalidValue("CORS_ALLOW_METHODS".to_string(), format!("{}", e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowMethods::list(methods)
    };

    let headers = if is_wildcard(&config.allow_headers) {
        if mirror {
            AllowHeaders::mirror_request()
        } else {
            AllowHeaders::from(Any)
        }
    } else {
        let headers = config
            .allow_headers
            .iter()
            .map(|h| {
                HeaderName::from_bytes(h.to_lowercase().as_bytes()).map_err(|e| {
                    ConfigError::InvalidValue("CORS_ALLOW_HEADERS".to_string(), format!("{}", e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowHeaders::list(headers)
    };

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(config.allow_credentials))
}
