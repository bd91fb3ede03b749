use chrono::Utc;

use crate::config::AdminSeed;
use crate::database::{Store, StoreError};
use crate::models::{User, UserType};
use crate::services::auth_service::hash_password;
use crate::utils::validation::new_id;

/// Creates the back-office account from `ADMIN_EMAIL`/`ADMIN_PASSWORD` if it
/// does not exist yet. An existing account is left untouched.
pub async fn seed_admin(store: &dyn Store, seed: &AdminSeed, bcrypt_cost: u32) {
    let email = seed.email.trim().to_lowercase();

    match store.find_user_by_email(&email).await {
        Ok(Some(existing)) => {
            if existing.user_type != UserType::Admin {
                log::warn!("⚠️  Admin seed: {} exists but is a {} account", email, existing.user_type.as_str());
            } else {
                log::info!("👤 Admin seed: {} already exists, skipping", email);
            }
            return;
        }
        Ok(None) => {}
        Err(e) => {
            log::error!("❌ Admin seed: lookup failed: {}", e);
            return;
        }
    }

    let password_hash = match hash_password(&seed.password, bcrypt_cost) {
        Ok(hash) => hash,
        Err(e) => {
            log::error!("❌ Admin seed: {}", e);
            return;
        }
    };

    let now = Utc::now().timestamp();
    let admin = User {
        id: new_id(),
        email: email.clone(),
        password_hash,
        name: "Administrator".into(),
        user_type: UserType::Admin,
        is_active: true,
        last_login: None,
        created_at: now,
        updated_at: now,
    };

    match store.insert_user(&admin).await {
        Ok(()) => log::info!("✅ Admin seed: created {}", email),
        Err(StoreError::Duplicate(_)) => log::info!("👤 Admin seed: {} created concurrently", email),
        Err(e) => log::error!("❌ Admin seed: insert failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::testing::TEST_BCRYPT_COST;

    #[tokio::test]
    async fn test_seed_admin_once() {
        let store = MemoryStore::new();
        let seed = AdminSeed {
            email: "Admin@EduHire.in".into(),
            password: "super-secret".into(),
        };

        seed_admin(&store, &seed, TEST_BCRYPT_COST).await;
        let first = store.find_user_by_email("admin@eduhire.in").await.unwrap().unwrap();
        assert_eq!(first.user_type, UserType::Admin);

        seed_admin(&store, &seed, TEST_BCRYPT_COST).await;
        let again = store.find_user_by_email("admin@eduhire.in").await.unwrap().unwrap();
        assert_eq!(again.id, first.id);
    }
}
