//! Image loading: decode, crop, or fall back to the placeholder.
//!
//! A load is a blocking function so callers choose where it runs (the app
//! spawns one worker thread per plane).  Every load carries a
//! [`CancelToken`]; a cancelled load never produces a texture.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::item::ImageSource;
use super::texture::{self, Texture, TextureKind, TextureSpec, PLACEHOLDER_CAPTION};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("{path} decoded to an empty image")]
    Empty { path: PathBuf },
    #[error("unsupported image source `{0}`")]
    UnsupportedScheme(String),
    #[error("load cancelled")]
    Cancelled,
}

/// Per-plane load progress.  Both terminal states count as ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Unloaded,
    Loading,
    Loaded,
    PlaceholderShown,
}

impl LoadState {
    pub fn is_ready(self) -> bool {
        matches!(self, LoadState::Loaded | LoadState::PlaceholderShown)
    }
}

/// Shared cancellation flag for one in-flight load.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// True when both handles share one flag.
    pub fn same_as(&self, other: &CancelToken) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Decode `source` and center-crop it to `spec`.
pub fn load_texture(
    source: &ImageSource,
    spec: TextureSpec,
    cancel: &CancelToken,
) -> Result<Texture, LoadError> {
    if cancel.is_cancelled() {
        return Err(LoadError::Cancelled);
    }

    let path = source
        .local_path()
        .ok_or_else(|| LoadError::UnsupportedScheme(source.to_string()))?;

    let reader = image::ImageReader::open(&path)
        .map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?
        .with_guessed_format()
        .map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
    let decoded = reader.decode().map_err(|source| LoadError::Decode {
        path: path.clone(),
        source,
    })?;

    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(LoadError::Empty { path });
    }
    if cancel.is_cancelled() {
        return Err(LoadError::Cancelled);
    }

    let pixels = texture::center_crop(&decoded.to_rgba8(), spec);
    Ok(Texture {
        pixels: Arc::new(pixels),
        kind: TextureKind::Image,
    })
}

/// The stand-in shown when a load fails.
pub fn placeholder_texture(spec: TextureSpec) -> Texture {
    Texture {
        pixels: Arc::new(texture::placeholder(spec)),
        kind: TextureKind::Placeholder {
            caption: PLACEHOLDER_CAPTION,
        },
    }
}

/// Load, substituting the placeholder on any failure except cancellation.
pub fn load_or_placeholder(
    source: &ImageSource,
    spec: TextureSpec,
    cancel: &CancelToken,
) -> Result<Texture, LoadError> {
    match load_texture(source, spec, cancel) {
        Ok(texture) => Ok(texture),
        Err(LoadError::Cancelled) => Err(LoadError::Cancelled),
        Err(e) => {
            tracing::warn!(source = %source, error = %e, "image load failed, using placeholder");
            Ok(placeholder_texture(spec))
        }
    }
}
