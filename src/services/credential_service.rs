//! Customer credential verification.
//!
//! A customer signs in with national ID, card number and internet password.
//! The password is hashed with SHA-256 (hex encoded) and all three values are
//! matched against the `customers` table in one equality lookup.
//!
//! # Known limitations
//!
//! - The digest is unsalted, so identical passwords produce identical hashes.
//!   This matches the stored data and is kept for compatibility.
//! - A store failure is logged and reported as "not found". Callers cannot tell
//!   wrong credentials from an unreachable database.

use sha2::{Digest, Sha256};

use crate::{models::customer::CustomerIdentity, store::BankStore};

/// Hex-encoded SHA-256 digest of a secret.
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());

    hex::encode(hasher.finalize())
}

/// Look up the customer matching all three login values.
///
/// Returns `None` when any value is empty or whitespace only (the store is not
/// queried), when no row matches, or when the store fails.
pub async fn verify_customer(
    store: &dyn BankStore,
    dni: &str,
    card_number: &str,
    secret: &str,
) -> Option<CustomerIdentity> {
    if [dni, card_number, secret]
        .iter()
        .any(|field| field.trim().is_empty())
    {
        return None;
    }

    let secret_hash = hash_secret(secret);

    match store.find_customer(dni, card_number, &secret_hash).await {
        Ok(customer) => customer,
        Err(e) => {
            tracing::error!(error = %e, "Credential lookup failed, treating as not found");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::customer::Customer;
    use crate::store::memory::InMemoryStore;
    use uuid::Uuid;

    const DNI: &str = "45879632";
    const CARD: &str = "4557880011223344";
    const SECRET: &str = "123456";

    fn seeded_store() -> (InMemoryStore, Uuid) {
        let store = InMemoryStore::new();
        let customer_id = Uuid::new_v4();
        store.insert_customer(Customer {
            customer_id,
            dni: DNI.to_string(),
            card_number: CARD.to_string(),
            internet_password_hash: hash_secret(SECRET),
            full_name: "María Quispe".to_string(),
            email: "maria@example.com".to_string(),
        });
        (store, customer_id)
    }

    #[test]
    fn hash_is_lowercase_hex_sha256() {
        assert_eq!(
            hash_secret("123456"),
            "8d969eef6ecad3c29a3a629280e686cf0c3f5d5a86aff3ca12020c923adc6c92"
        );
        assert_eq!(hash_secret("").len(), 64);
    }

    #[test]
    fn identical_secrets_share_a_digest() {
        assert_eq!(hash_secret("654321"), hash_secret("654321"));
    }

    #[tokio::test]
    async fn correct_triple_returns_customer() {
        let (store, customer_id) = seeded_store();

        let customer = verify_customer(&store, DNI, CARD, SECRET).await.unwrap();

        assert_eq!(customer.customer_id, customer_id);
        assert_eq!(customer.full_name, "María Quispe");
    }

    #[tokio::test]
    async fn any_mismatched_field_is_not_found() {
        let (store, _) = seeded_store();

        assert!(verify_customer(&store, "00000000", CARD, SECRET).await.is_none());
        assert!(verify_customer(&store, DNI, "4000000000000000", SECRET).await.is_none());
        assert!(verify_customer(&store, DNI, CARD, "654321").await.is_none());
    }

    #[tokio::test]
    async fn empty_secret_never_reaches_the_store() {
        let (store, _) = seeded_store();
        // Would match if the empty secret were looked up
        store.insert_customer(Customer {
            customer_id: Uuid::new_v4(),
            dni: DNI.to_string(),
            card_number: CARD.to_string(),
            internet_password_hash: hash_secret(""),
            full_name: "Blank".to_string(),
            email: "blank@example.com".to_string(),
        });

        assert!(verify_customer(&store, DNI, CARD, "").await.is_none());
        assert!(verify_customer(&store, " ", CARD, SECRET).await.is_none());
    }

    #[tokio::test]
    async fn whitespace_secret_is_blank() {
        let (store, _) = seeded_store();
        store.insert_customer(Customer {
            customer_id: Uuid::new_v4(),
            dni: DNI.to_string(),
            card_number: CARD.to_string(),
            internet_password_hash: hash_secret("   "),
            full_name: "Spaces".to_string(),
            email: "spaces@example.com".to_string(),
        });

        assert!(verify_customer(&store, DNI, CARD, "   ").await.is_none());
        assert!(verify_customer(&store, DNI, CARD, "\t").await.is_none());
    }

    #[tokio::test]
    async fn store_failure_degrades_to_not_found() {
        let (store, _) = seeded_store();
        store.set_available(false);

        assert!(verify_customer(&store, DNI, CARD, SECRET).await.is_none());
    }

    #[tokio::test]
    async fn duplicate_rows_return_the_first_match() {
        let (store, first_id) = seeded_store();
        store.insert_customer(Customer {
            customer_id: Uuid::new_v4(),
            dni: DNI.to_string(),
            card_number: CARD.to_string(),
            internet_password_hash: hash_secret(SECRET),
            full_name: "Duplicate".to_string(),
            email: "dup@example.com".to_string(),
        });

        let customer = verify_customer(&store, DNI, CARD, SECRET).await.unwrap();

        assert_eq!(customer.customer_id, first_id);
    }
}
