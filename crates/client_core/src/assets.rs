//! Static asset references handed back by the classification service.

use shared::protocol::STATIC_UPLOADS_PREFIX;
use url::Url;

use crate::error::AssetError;

/// Returns `url` with a trailing slash so relative joins append instead of replacing
/// the last path segment.
pub fn normalized_base(url: &Url) -> Url {
    let mut base = url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

/// Resolves the redisplay URL of an uploaded single image.
///
/// `image_file` is treated as one opaque path segment below the static uploads
/// prefix: separators are percent-encoded and dot segments are refused, so the
/// reference can never point outside that prefix.
pub fn uploaded_image_url(server_url: &Url, image_file: &str) -> Result<Url, AssetError> {
    if image_file.is_empty() || image_file == "." || image_file == ".." {
        return Err(AssetError::InvalidReference(image_file.to_string()));
    }

    let mut url = normalized_base(server_url)
        .join(STATIC_UPLOADS_PREFIX)
        .map_err(|_| AssetError::InvalidBase(server_url.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| AssetError::InvalidBase(server_url.to_string()))?
        .pop_if_empty()
        .push(image_file);
    Ok(url)
}
