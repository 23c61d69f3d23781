//! ID prefix constants and generation.
//!
//! Activity records carry a prefixed ID of the form `act-<16 hex>`, field
//! audit entries `fau-<16 hex>`, in the same shape for every store backend.

use uuid::Uuid;

/// Prefix for activity record IDs.
pub const PREFIX_ACTIVITY: &str = "act";

/// Prefix for per-field audit entry IDs.
pub const PREFIX_FIELD_AUDIT: &str = "fau";

/// Number of hex characters after the prefix.
const ID_HEX_LEN: usize = 16;

/// Generate a new prefixed ID, e.g. `"act-3f9a0c1d22b87e41"`.
#[must_use]
pub fn generate_id(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &hex[..ID_HEX_LEN])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_id_has_prefix_and_hex() {
        let id = generate_id(PREFIX_ACTIVITY);
        assert!(id.starts_with("act-"), "unexpected id: {id}");
        assert_eq!(id.len(), 4 + ID_HEX_LEN);
        assert!(id[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = generate_id(PREFIX_ACTIVITY);
        let b = generate_id(PREFIX_ACTIVITY);
        assert_ne!(a, b);
    }
}
