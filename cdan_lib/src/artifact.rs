//! Artifact retrieval and persistence.

use std::path::{Path, PathBuf};

use cdan_api::Client;

use crate::error::AcquisitionError;
use crate::link::ResultLink;
use crate::targets::Target;

/// A downloaded payload and where it belongs.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

/// Destination for a target: `<dir>/<sanitized name>-<suffix>.<extension>`.
pub fn artifact_path(dir: &Path, target: &Target, suffix: &str, extension: &str) -> PathBuf {
    dir.join(format!("{}-{}.{}", target.file_stem(), suffix, extension))
}

impl Artifact {
    /// Downloads the linked payload. Nothing touches the disk here, so a
    /// failed download leaves no file behind.
    pub async fn fetch(
        client: &Client,
        link: &ResultLink,
        path: PathBuf,
    ) -> Result<Self, AcquisitionError> {
        let bytes = client
            .download(link.as_str())
            .await
            .map_err(AcquisitionError::Download)?;
        Ok(Self { path, bytes })
    }

    /// Writes the payload, replacing any earlier artifact for the target.
    ///
    /// The bytes go to a `.part` sibling first and are renamed into place.
    pub async fn persist(&self) -> Result<(), AcquisitionError> {
        let write_err = |source| AcquisitionError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
        let mut partial = self.path.clone().into_os_string();
        partial.push(".part");
        let partial = PathBuf::from(partial);

        if let Err(source) = tokio::fs::write(&partial, &self.bytes).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(write_err(source));
        }
        if let Err(source) = tokio::fs::rename(&partial, &self.path).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(write_err(source));
        }
        Ok(())
    }
}
