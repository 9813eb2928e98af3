// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (bearer JWT). Routing lives in app.rs; the
// protected tier is wrapped by the auth gate there.
pub mod public;
pub mod protected;

use uuid::Uuid;

use crate::error::ApiError;

/// Parses an identifier taken from the path or query string.
/// `kind` names the entity in the 400 message ("Invalid snippet ID").
pub(crate) fn parse_id(raw: &str, kind: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::bad_request(format!("Invalid {} ID", kind)))
}

/// Rejects text that Postgres could not store, so every backend answers alike.
pub(crate) fn reject_nul(field: &str, value: &str) -> Result<(), ApiError> {
    if value.contains('\0') {
        return Err(ApiError::nul_character(field));
    }
    Ok(())
}

/// Method fallback for every route.
pub async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed("Method not allowed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_names_the_entity() {
        let err = parse_id("nope", "snippet").unwrap_err();
        assert_eq!(err.message(), "Invalid snippet ID");

        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "folder").unwrap(), id);
    }

    #[test]
    fn nul_is_rejected_by_field() {
        assert!(reject_nul("title", "plain text").is_ok());
        let err = reject_nul("title", "a\0b").unwrap_err();
        assert_eq!(err.message(), "Title contains a NUL character");
    }
}
