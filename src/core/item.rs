//! Gallery items and where they come from.
//!
//! Items are built once, before the gallery starts, from explicit files,
//! directories (walked for anything that sniffs as `image/*`) and optional
//! manifest files of `path | caption` lines.

use std::fmt;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

/// Location of an item's image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Path(PathBuf),
    Uri(String),
}

impl ImageSource {
    /// Interpret a manifest/CLI string: `scheme://…` is a URI, anything
    /// else a filesystem path.
    pub fn parse(s: &str) -> Self {
        match s.split_once("://") {
            Some((scheme, _))
                if !scheme.is_empty()
                    && scheme
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) =>
            {
                ImageSource::Uri(s.to_string())
            }
            _ => ImageSource::Path(PathBuf::from(s)),
        }
    }

    /// Filesystem path for local sources (`file://` URIs included).
    pub fn local_path(&self) -> Option<PathBuf> {
        match self {
            ImageSource::Path(p) => Some(p.clone()),
            ImageSource::Uri(u) => u.strip_prefix("file://").map(PathBuf::from),
        }
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Path(p) => write!(f, "{}", p.display()),
            ImageSource::Uri(u) => f.write_str(u),
        }
    }
}

/// One carousel entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryItem {
    pub image: ImageSource,
    pub text: String,
}

impl GalleryItem {
    pub fn new(image: ImageSource, text: impl Into<String>) -> Self {
        Self {
            image,
            text: text.into(),
        }
    }

    /// Item captioned with the file stem.
    pub fn from_path(path: &Path) -> Self {
        Self::new(ImageSource::Path(path.to_path_buf()), caption_for(path))
    }
}

fn caption_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    #[error("failed to read manifest {path}: {source}")]
    ManifestIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}:{line}: empty image reference")]
    ManifestLine { path: PathBuf, line: usize },
    #[error("{0} does not exist")]
    Missing(PathBuf),
}

/// Directory discovery options.
#[derive(Debug, Clone, Copy)]
pub struct DiscoverOptions {
    pub max_depth: usize,
    pub show_hidden: bool,
    pub respect_gitignore: bool,
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        Self {
            max_depth: 1,
            show_hidden: false,
            respect_gitignore: true,
        }
    }
}

/// Turn CLI paths into items.  Files are taken as-is (the loader decides
/// whether they decode); directories are walked for images, sorted by name.
pub fn collect_items(paths: &[PathBuf], opts: DiscoverOptions) -> Result<Vec<GalleryItem>, ItemError> {
    let mut items = Vec::new();
    for path in paths {
        if path.is_dir() {
            items.extend(discover_images(path, opts).iter().map(|p| GalleryItem::from_path(p)));
        } else if path.exists() {
            items.push(GalleryItem::from_path(path));
        } else {
            return Err(ItemError::Missing(path.clone()));
        }
    }
    Ok(items)
}

/// Every file under `root` whose content sniffs as an image.
pub fn discover_images(root: &Path, opts: DiscoverOptions) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(root)
        .hidden(!opts.show_hidden)
        .git_ignore(opts.respect_gitignore)
        .max_depth(Some(opts.max_depth))
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    walker
        .flatten()
        .filter(|e| e.file_type().is_some_and(|ft| ft.is_file()))
        .map(|e| e.into_path())
        .filter(|p| is_image(p))
        .collect()
}

fn is_image(path: &Path) -> bool {
    // Content sniffing (shared-mime-info magic), not extension matching.
    tree_magic_mini::from_filepath(path).is_some_and(|mime| mime.starts_with("image/"))
}

/// Parse manifest text.  One item per line: `image | caption`, caption
/// optional; blank lines and `#` comments are skipped.  Relative paths
/// resolve against `base`.
pub fn parse_manifest(contents: &str, base: &Path, origin: &Path) -> Result<Vec<GalleryItem>, ItemError> {
    let mut items = Vec::new();
    for (i, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (image, caption) = match line.split_once('|') {
            Some((image, caption)) => (image.trim(), Some(caption.trim())),
            None => (line, None),
        };
        if image.is_empty() {
            return Err(ItemError::ManifestLine {
                path: origin.to_path_buf(),
                line: i + 1,
            });
        }

        let source = match ImageSource::parse(image) {
            ImageSource::Path(p) if p.is_relative() => ImageSource::Path(base.join(p)),
            other => other,
        };
        let text = match caption {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => match &source {
                ImageSource::Path(p) => caption_for(p),
                ImageSource::Uri(u) => u
                    .rsplit('/')
                    .next()
                    .and_then(|name| name.split('.').next())
                    .unwrap_or(u)
                    .to_string(),
            },
        };
        items.push(GalleryItem::new(source, text));
    }
    Ok(items)
}

/// Read and parse a manifest file.
pub fn load_manifest(path: &Path) -> Result<Vec<GalleryItem>, ItemError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ItemError::ManifestIo {
        path: path.to_path_buf(),
        source,
    })?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    parse_manifest(&contents, base, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn parse_distinguishes_uris_from_paths() {
        assert_eq!(
            ImageSource::parse("https://x.io/a.jpg"),
            ImageSource::Uri("https://x.io/a.jpg".into())
        );
        assert_eq!(
            ImageSource::parse("photos/a.jpg"),
            ImageSource::Path("photos/a.jpg".into())
        );
        assert_eq!(
            ImageSource::parse("C:/pics/a.jpg"),
            ImageSource::Path("C:/pics/a.jpg".into())
        );
    }

    #[test]
    fn file_uri_resolves_locally() {
        let src = ImageSource::parse("file:///tmp/a.png");
        assert_eq!(src.local_path(), Some(PathBuf::from("/tmp/a.png")));
        assert_eq!(ImageSource::parse("https://x.io/a.png").local_path(), None);
    }

    #[test]
    fn manifest_lines_with_and_without_captions() {
        let text = "\
# portfolio shots
hero.jpg | Hero shot

team/photo.png
https://cdn.example.com/img/award.webp |
";
        let items = parse_manifest(text, Path::new("/site"), Path::new("/site/m.txt")).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].image, ImageSource::Path("/site/hero.jpg".into()));
        assert_eq!(items[0].text, "Hero shot");
        assert_eq!(items[1].image, ImageSource::Path("/site/team/photo.png".into()));
        assert_eq!(items[1].text, "photo");
        assert_eq!(items[2].text, "award");
    }

    #[test]
    fn manifest_rejects_missing_image() {
        let err = parse_manifest("ok.png\n | caption only", Path::new("."), Path::new("m.txt"))
            .unwrap_err();
        assert!(matches!(err, ItemError::ManifestLine { line: 2, .. }));
    }

    #[test]
    fn discovery_finds_images_in_name_order() {
        // The default `.tmp` prefix would be skipped as hidden.
        let dir = tempfile::Builder::new().prefix("gallery").tempdir().unwrap();
        for name in ["b.png", "a.png"] {
            RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255]))
                .save(dir.path().join(name))
                .unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();

        let items = collect_items(&[dir.path().to_path_buf()], DiscoverOptions::default()).unwrap();
        let names: Vec<_> = items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn missing_path_is_reported() {
        let err = collect_items(&["/no/such/dir".into()], DiscoverOptions::default()).unwrap_err();
        assert!(matches!(err, ItemError::Missing(_)));
    }
}
