use std::{io::ErrorKind, path::Path};

use bannerboard_core::image_name;
use log::warn;
use tokio::{fs, io::AsyncWriteExt};

use crate::{errors::ServerResult, schemas::UploadedImage};

const MAX_NAME_ATTEMPTS: usize = 5;

/// Writes an uploaded image into `directory` and returns the name it was stored under.
///
/// Existing files are never overwritten, a new name is generated instead.
pub async fn store_image(directory: &Path, image: &UploadedImage) -> ServerResult<String> {
    fs::create_dir_all(directory).await?;

    let mut name = image.name.clone();

    for _ in 0..MAX_NAME_ATTEMPTS {
        let result = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(directory.join(&name))
            .await;

        match result {
            Ok(mut file) => {
                file.write_all(&image.bytes).await?;
                file.flush().await?;

                return Ok(name);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                name = image_name(&name)?;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(std::io::Error::new(ErrorKind::AlreadyExists, "no free image name").into())
}

/// Removes a stored image, used when the banner it belongs to could not be created
pub async fn remove_image(directory: &Path, name: &str) {
    if let Err(e) = fs::remove_file(directory.join(name)).await {
        warn!("Could not remove orphaned image {name}: {e}");
    }
}
