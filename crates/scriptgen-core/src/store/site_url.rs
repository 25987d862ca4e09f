use tracing::debug;
use url::Url;

use crate::error::{Error, InputError, ValidationError};

const DEFAULT_SCHEME: &str = "https://";

/// Canonicalize a user-entered site address.
///
/// Addresses without an `http://` or `https://` prefix get `https://`
/// prepended. Returns `ValidationError::InvalidUrl` when the result does not
/// parse, so callers can ask again.
pub fn normalize_url(raw: &str) -> Result<String, Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InputError::EmptyUrl.into());
    }
    let lowered = trimmed.to_ascii_lowercase();
    let candidate = if lowered.starts_with("http://") || lowered.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("{DEFAULT_SCHEME}{trimmed}")
    };
    match Url::parse(&candidate) {
        Ok(parsed) if parsed.has_host() => Ok(parsed.into()),
        Ok(_) | Err(_) => {
            debug!(url = trimmed, "rejected site URL");
            Err(ValidationError::InvalidUrl {
                raw: trimmed.to_string(),
            }
            .into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepends_secure_scheme() {
        assert_eq!(normalize_url("example.com").unwrap(), "https://example.com/");
        assert_eq!(
            normalize_url("  shop.example.com/checkout ").unwrap(),
            "https://shop.example.com/checkout"
        );
    }

    #[test]
    fn keeps_existing_scheme() {
        assert_eq!(
            normalize_url("http://Example.com/cart").unwrap(),
            "http://example.com/cart"
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_url("example.com").unwrap();
        assert_eq!(normalize_url(&once).unwrap(), once);
    }

    #[test]
    fn rejects_garbage_without_panicking() {
        let err = normalize_url("not a url##").unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::InvalidUrl { ref raw }) if raw == "not a url##"
        ));
    }

    #[test]
    fn empty_url_is_an_input_error() {
        assert!(matches!(
            normalize_url("   "),
            Err(Error::Input(InputError::EmptyUrl))
        ));
    }
}
