use std::{path::Path, sync::Arc};

use log::{error, info};
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::{
    util::random_name, BannerCache, BannerData, Database, DatabaseError, DatabaseResult,
    NewBanner, PrimaryKey,
};

/// Image extensions that may be uploaded alongside a banner
pub const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Publishes banners and keeps the read cache in step with the database
pub struct Banners<Db> {
    db: Arc<Db>,
    cache: BannerCache<Db>,
}

#[derive(Debug, Error)]
pub enum BannerError {
    #[error("Allowed image extensions: png, jpg, jpeg, webp (got {0:?})")]
    UnsupportedImage(String),
    #[error("Invalid banner: {0}")]
    Validation(#[from] ValidationErrors),
    /// The banner could not be stored
    #[error(transparent)]
    Db(DatabaseError),
    /// The banner was stored but the cache still holds the previous banners
    #[error("Banner {id} was stored but the cache could not be refreshed: {source}")]
    Refresh {
        id: PrimaryKey,
        source: DatabaseError,
    },
}

impl<Db> Banners<Db>
where
    Db: Database,
{
    pub fn new(db: &Arc<Db>, page_size: usize) -> Self {
        Self {
            db: db.clone(),
            cache: BannerCache::new(db, page_size),
        }
    }

    pub fn cache(&self) -> &BannerCache<Db> {
        &self.cache
    }

    /// Fails with a conflict if a banner with this title exists.
    ///
    /// This is only a hint, [Banners::create] is what actually enforces uniqueness.
    pub async fn check_title(&self, title: &str) -> Result<(), DatabaseError> {
        let title = title.trim();

        self.db
            .banner_by_title(title)
            .await
            .conflict_or_ok("banner", "title", title)
    }

    /// Stores a banner, then refreshes the cache before returning,
    /// so the banner is visible to the very next read.
    ///
    /// Fails with [BannerError::Refresh] if only the refresh failed, the banner is stored then.
    pub async fn create(&self, new_banner: NewBanner) -> Result<BannerData, BannerError> {
        let new_banner = trimmed(new_banner);
        new_banner.validate()?;

        let banner = self
            .db
            .create_banner(NewBanner {
                url: normalize_url(&new_banner.url),
                ..new_banner
            })
            .await
            .map_err(BannerError::Db)?;

        info!("{} published banner {:?}", banner.author, banner.title);

        self.cache.refresh().await.map_err(|source| {
            let error = BannerError::Refresh {
                id: banner.id,
                source,
            };

            error!("{error}");
            error
        })?;

        Ok(banner)
    }

    pub async fn count(&self) -> Result<u64, DatabaseError> {
        self.db.count_banners().await
    }

    /// Inserts a placeholder banner if there are none yet
    pub async fn seed_example(&self) -> Result<(), DatabaseError> {
        if self.count().await? > 0 {
            return Ok(());
        }

        self.db
            .create_banner(NewBanner {
                title: "Example".to_string(),
                description: String::new(),
                author: "*EXAMPLE*".to_string(),
                url: "https://example.com".to_string(),
                image: None,
            })
            .await?;

        info!("Seeded an example banner");
        Ok(())
    }
}

fn trimmed(new_banner: NewBanner) -> NewBanner {
    NewBanner {
        title: new_banner.title.trim().to_string(),
        description: new_banner.description.trim().to_string(),
        url: new_banner.url.trim().to_string(),
        ..new_banner
    }
}

/// Prepends `https://` to urls that don't start with `http://` or `https://`
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    let lowercase = url.to_ascii_lowercase();

    if lowercase.starts_with("http://") || lowercase.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// Returns a fresh random filename for an uploaded image, keeping its extension.
/// Fails if the extension is not an allowed image type.
pub fn image_name(uploaded_filename: &str) -> Result<String, BannerError> {
    let extension = Path::new(uploaded_filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
        .ok_or_else(|| BannerError::UnsupportedImage(uploaded_filename.to_string()))?;

    Ok(format!("{}.{extension}", random_name(32)))
}
