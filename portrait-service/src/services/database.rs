use crate::models::{PersonalizedImage, Photo};
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::{
    bson::doc,
    options::{FindOptions, IndexOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

/// Upper bound on gallery listings.
pub const GALLERY_LIMIT: i64 = 100;

/// Persistence seam for both record types. Handlers only see this trait.
#[async_trait]
pub trait PortraitStore: Send + Sync {
    async fn insert_photo(&self, photo: &Photo) -> Result<(), AppError>;
    async fn find_photo(&self, id: &str) -> Result<Option<Photo>, AppError>;
    async fn insert_personalized(&self, image: &PersonalizedImage) -> Result<(), AppError>;
    async fn find_personalized(&self, id: &str) -> Result<Option<PersonalizedImage>, AppError>;
    /// Most recent first, at most `limit` records.
    async fn recent_personalized(&self, limit: i64) -> Result<Vec<PersonalizedImage>, AppError>;
    async fn health_check(&self) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for portrait-service");

        let recent_index = IndexModel::builder()
            .keys(doc! { "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("created_at_desc".to_string())
                    .build(),
            )
            .build();

        self.personalized_images()
            .create_index(recent_index, None)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to create created_at index on personalized_images collection: {}",
                    e
                );
                AppError::from(e)
            })?;
        tracing::info!("Created index on personalized_images.created_at");

        let source_index = IndexModel::builder()
            .keys(doc! { "original_photo_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("original_photo_lookup".to_string())
                    .build(),
            )
            .build();

        self.personalized_images()
            .create_index(source_index, None)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to create original_photo_id index on personalized_images collection: {}",
                    e
                );
                AppError::from(e)
            })?;
        tracing::info!("Created index on personalized_images.original_photo_id");

        Ok(())
    }

    pub fn photos(&self) -> Collection<Photo> {
        self.db.collection("photos")
    }

    pub fn personalized_images(&self) -> Collection<PersonalizedImage> {
        self.db.collection("personalized_images")
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }

    /// Closes pooled connections. Call once after the server has drained.
    pub async fn shutdown(&self) {
        tracing::info!("Closing MongoDB client");
        self.client.clone().shutdown().await;
    }
}

#[async_trait]
impl PortraitStore for MongoDb {
    async fn insert_photo(&self, photo: &Photo) -> Result<(), AppError> {
        self.photos().insert_one(photo, None).await.map_err(|e| {
            tracing::error!(photo_id = %photo.id, "Failed to insert photo: {}", e);
            AppError::from(e)
        })?;
        Ok(())
    }

    async fn find_photo(&self, id: &str) -> Result<Option<Photo>, AppError> {
        self.photos()
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(AppError::from)
    }

    async fn insert_personalized(&self, image: &PersonalizedImage) -> Result<(), AppError> {
        self.personalized_images()
            .insert_one(image, None)
            .await
            .map_err(|e| {
                tracing::error!(
                    personalized_id = %image.id,
                    "Failed to insert personalized image: {}",
                    e
                );
                AppError::from(e)
            })?;
        Ok(())
    }

    async fn find_personalized(&self, id: &str) -> Result<Option<PersonalizedImage>, AppError> {
        self.personalized_images()
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(AppError::from)
    }

    async fn recent_personalized(&self, limit: i64) -> Result<Vec<PersonalizedImage>, AppError> {
        let find_options = FindOptions::builder()
            .sort(doc! { "created_at": -1 }) // Newest first
            .limit(limit)
            .build();

        let cursor = self
            .personalized_images()
            .find(doc! {}, find_options)
            .await
            .map_err(AppError::from)?;

        cursor.try_collect().await.map_err(AppError::from)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }
}
