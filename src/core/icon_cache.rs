/*
 * Manages the icon cache directory next to the settings store. G HUB renders a
 * profile's icon from the BMP file its `posterPath` points at; this module turns a
 * user-selected image into such a file, named after the profile identifier.
 *
 * Changes here take effect on disk immediately and are independent of whether
 * the profile list is later saved or discarded.
 */
use super::models::IconRef;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const ICON_CACHE_DIR_NAME: &str = "icon_cache";
pub const ICON_FILE_EXTENSION: &str = "bmp";
pub const SUPPORTED_SOURCE_EXTENSIONS: [&str; 5] = ["bmp", "ico", "png", "jpg", "jpeg"];

#[derive(Debug)]
pub enum IconError {
    UnsupportedFormat(String),
    AssetWriteFailed(String),
}

impl From<io::Error> for IconError {
    fn from(err: io::Error) -> Self {
        IconError::AssetWriteFailed(err.to_string())
    }
}

impl From<image::ImageError> for IconError {
    fn from(err: image::ImageError) -> Self {
        IconError::AssetWriteFailed(err.to_string())
    }
}

impl std::fmt::Display for IconError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IconError::UnsupportedFormat(source) => write!(
                f,
                "Unsupported image format: {source}. Expected one of {}.",
                SUPPORTED_SOURCE_EXTENSIONS.join(", ")
            ),
            IconError::AssetWriteFailed(reason) => write!(f, "Could not write icon: {reason}"),
        }
    }
}

impl std::error::Error for IconError {}

pub type Result<T> = std::result::Result<T, IconError>;

pub trait IconCacheOperations: Send + Sync {
    fn set_icon(&self, profile_id: &str, source: &Path) -> Result<IconRef>;
    fn clear_icon(&self, profile_id: &str) -> Result<()>;
    fn icon_path(&self, profile_id: &str) -> PathBuf;
}

/*
 * Maps an identifier to a file stem. Identifiers come from the settings document
 * and are not guaranteed to be file-name safe. ASCII letters, digits and `-` are
 * kept; every other byte, `_` included, becomes `_XX` (upper-case hex), so
 * distinct identifiers never share a file.
 */
pub fn icon_file_stem(profile_id: &str) -> String {
    let mut stem = String::with_capacity(profile_id.len());
    for byte in profile_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("_{byte:02X}"));
        }
    }
    stem
}

fn has_supported_extension(source: &Path) -> bool {
    source
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .is_some_and(|ext| SUPPORTED_SOURCE_EXTENSIONS.contains(&ext.as_str()))
}

pub struct CoreIconCache {
    cache_dir: PathBuf,
}

impl CoreIconCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        CoreIconCache {
            cache_dir: cache_dir.into(),
        }
    }

    /// The cache lives in `icon_cache` beside the settings store file.
    pub fn for_store(store_path: &Path) -> Self {
        let base = store_path.parent().unwrap_or_else(|| Path::new("."));
        CoreIconCache::new(base.join(ICON_CACHE_DIR_NAME))
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /*
     * Every source is decoded first, whatever its extension claims. Data that is
     * really BMP is then copied byte for byte; anything else is re-encoded.
     */
    fn write_staged(source: &Path, staged: &mut NamedTempFile) -> Result<()> {
        let reader = ImageReader::open(source)?.with_guessed_format()?;
        let detected = reader.format();
        let decoded = reader.decode()?;

        if detected == Some(ImageFormat::Bmp) {
            let mut original = File::open(source)?;
            io::copy(&mut original, staged.as_file_mut())?;
            return Ok(());
        }

        // BMP output supports 8-bit RGB and RGBA; keep alpha when the source has it.
        let converted = if decoded.color().has_alpha() {
            DynamicImage::ImageRgba8(decoded.to_rgba8())
        } else {
            DynamicImage::ImageRgb8(decoded.to_rgb8())
        };
        let mut writer = BufWriter::new(staged.as_file_mut());
        converted.write_to(&mut writer, ImageFormat::Bmp)?;
        writer.flush()?;
        Ok(())
    }
}

impl IconCacheOperations for CoreIconCache {
    /*
     * Converts `source` to BMP and stores it as the icon of `profile_id`. The
     * result is staged in a temporary file inside the cache directory and then
     * renamed over the target, so a failed conversion never damages an existing
     * icon.
     */
    fn set_icon(&self, profile_id: &str, source: &Path) -> Result<IconRef> {
        log::trace!("CoreIconCache: Setting icon for '{profile_id}' from {source:?}");
        if !has_supported_extension(source) {
            log::debug!("CoreIconCache: Rejected {source:?}, unsupported extension.");
            return Err(IconError::UnsupportedFormat(source.display().to_string()));
        }

        fs::create_dir_all(&self.cache_dir)?;
        let target = self.icon_path(profile_id);
        let mut staged = NamedTempFile::new_in(&self.cache_dir)?;

        if let Err(e) = Self::write_staged(source, &mut staged) {
            log::error!("CoreIconCache: Failed to convert {source:?} for '{profile_id}': {e}");
            return Err(e);
        }
        staged
            .persist(&target)
            .map_err(|e| IconError::AssetWriteFailed(e.error.to_string()))?;

        log::info!("CoreIconCache: Wrote icon {target:?} for '{profile_id}'.");
        Ok(IconRef::new(target.to_string_lossy()))
    }

    fn clear_icon(&self, profile_id: &str) -> Result<()> {
        let target = self.icon_path(profile_id);
        match fs::remove_file(&target) {
            Ok(()) => {
                log::info!("CoreIconCache: Removed icon {target:?} for '{profile_id}'.");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::trace!("CoreIconCache: No icon at {target:?}, nothing to clear.");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn icon_path(&self, profile_id: &str) -> PathBuf {
        self.cache_dir.join(format!(
            "{}.{ICON_FILE_EXTENSION}",
            icon_file_stem(profile_id)
        ))
    }
}
