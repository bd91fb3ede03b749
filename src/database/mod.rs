mod memory;
mod mongo_store;
mod store;

pub use memory::MemoryStore;
pub use store::{Page, Store, StoreError, StoreResult};

use mongodb::bson::{doc, Document};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};

pub const USERS: &str = "users";
pub const TEACHER_PROFILES: &str = "teacher_profiles";
pub const INSTITUTION_PROFILES: &str = "institution_profiles";
pub const JOBS: &str = "jobs";
pub const APPLICATIONS: &str = "applications";
pub const BOOKMARKS: &str = "bookmarks";
pub const NOTIFICATIONS: &str = "notifications";
pub const SUBSCRIPTION_PLANS: &str = "subscription_plans";
pub const SUBSCRIPTIONS: &str = "subscriptions";
pub const REVIEWS: &str = "reviews";

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, StoreError> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        // Connection pool
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        // Database name comes from the URI path, falling back to the default
        let db_name = client_options
            .default_database
            .clone()
            .unwrap_or_else(|| "eduhire".to_string());

        let client = Client::with_options(client_options)?;

        let db = client.database(&db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { db };

        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates the indexes queries rely on, including the unique pairs that
    /// back duplicate detection.
    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        log::info!("🔧 Creating database indexes...");

        let unique = || IndexOptions::builder().unique(true).build();

        let indexes: Vec<(&str, Document, bool)> = vec![
            (USERS, doc! { "email": 1 }, true),
            (TEACHER_PROFILES, doc! { "user_id": 1 }, true),
            (INSTITUTION_PROFILES, doc! { "user_id": 1 }, true),
            (JOBS, doc! { "institution_id": 1, "is_deleted": 1 }, false),
            (JOBS, doc! { "is_active": 1, "expiresAt": 1 }, false),
            (APPLICATIONS, doc! { "job_id": 1, "teacher_id": 1 }, true),
            (APPLICATIONS, doc! { "teacher_id": 1 }, false),
            (BOOKMARKS, doc! { "teacher_id": 1, "job_id": 1 }, true),
            (NOTIFICATIONS, doc! { "user_id": 1, "is_read": 1 }, false),
            (SUBSCRIPTIONS, doc! { "user_id": 1, "status": 1 }, false),
            (REVIEWS, doc! { "author_id": 1, "institution_id": 1 }, true),
        ];

        for (collection, keys, is_unique) in indexes {
            let label = format!("{}({})", collection, keys.keys().cloned().collect::<Vec<_>>().join(", "));
            let mut model = IndexModel::builder().keys(keys).build();
            if is_unique {
                model.options = Some(unique());
            }

            match self.collection::<Document>(collection).create_index(model).await {
                Ok(_) => log::info!("   ✅ Index ready: {}", label),
                // Duplicate detection depends on the unique indexes
                Err(e) if is_unique => {
                    log::error!("   ❌ Unique index {} could not be built: {}", label, e);
                    return Err(StoreError::Unavailable(format!(
                        "unique index {} could not be built: {}",
                        label, e
                    )));
                }
                Err(e) => log::debug!("   ℹ️  Index not created {}: {}", label, e),
            }
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}
