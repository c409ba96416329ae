//! Cover image resolution
//!
//! A cover is looked up through a fixed chain, each step tried only when the
//! one before found nothing:
//! 1. the record's own reference, as a file under the covers directory
//! 2. a `<isbn>.<ext>` file under the covers directory
//! 3. the remote cover host, by ISBN (subject to `RemotePolicy`)
//! 4. the configured placeholder image
//!
//! If all of them miss the cover is unavailable and `resolve` returns `None`.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::probe::{HttpProbe, RemoteProbe};

/// Open Library covers, large size
pub const DEFAULT_REMOTE_TEMPLATE: &str = "https://covers.openlibrary.org/b/isbn/{isbn}-L.jpg";

/// Extensions tried, in order, when a cover is named without one
const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "webp", "gif", "bmp"];

/// Something the UI can display as a cover
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageReference {
    /// An image file on disk
    Local(PathBuf),
    /// An image on the remote cover host
    Remote(String),
    /// The generic "no cover" artwork
    Placeholder(PathBuf),
}

/// What to do with the remote lookup step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemotePolicy {
    /// Never use the remote host
    Disabled,
    /// Use the remote URL without checking it
    #[default]
    Trust,
    /// Download the image first and only use it if it is a real cover
    Probe,
}

/// Resolver configuration
#[derive(Debug, Clone)]
pub struct CoverSettings {
    pub covers_dir: Option<PathBuf>,
    /// Relative paths are looked up under `covers_dir` first
    pub placeholder: Option<PathBuf>,
    /// URL with an `{isbn}` token; `None` disables the remote step
    pub remote_template: Option<String>,
    pub remote_policy: RemotePolicy,
    pub probe_timeout: Duration,
    pub probe_min_bytes: u64,
}

impl Default for CoverSettings {
    fn default() -> Self {
        Self {
            covers_dir: None,
            placeholder: None,
            remote_template: Some(DEFAULT_REMOTE_TEMPLATE.to_string()),
            remote_policy: RemotePolicy::Trust,
            probe_timeout: Duration::from_secs(3),
            probe_min_bytes: 1000,
        }
    }
}

/// Resolves record cover references to displayable images
pub struct CoverResolver {
    settings: CoverSettings,
    /// Lowercased file name -> path, for everything under `covers_dir`
    index: HashMap<String, PathBuf>,
    /// The placeholder, if configured and present on disk
    placeholder: Option<PathBuf>,
    probe: Box<dyn RemoteProbe>,
}

impl CoverResolver {
    /// Create a resolver that probes over HTTP when the policy asks for it
    pub fn new(settings: CoverSettings) -> Self {
        let probe = HttpProbe::new(settings.probe_timeout, settings.probe_min_bytes);
        Self::with_probe(settings, Box::new(probe))
    }

    /// Create a resolver with a custom reachability probe
    pub fn with_probe(settings: CoverSettings, probe: Box<dyn RemoteProbe>) -> Self {
        let mut resolver = Self {
            settings,
            index: HashMap::new(),
            placeholder: None,
            probe,
        };
        resolver.rescan();
        resolver
    }

    /// Rebuild the covers directory index and re-check the placeholder
    pub fn rescan(&mut self) {
        self.index = match &self.settings.covers_dir {
            Some(dir) => index_covers(dir),
            None => HashMap::new(),
        };
        self.placeholder = self.find_placeholder();
    }

    fn find_placeholder(&self) -> Option<PathBuf> {
        let configured = self.settings.placeholder.as_ref()?;

        if configured.is_relative() {
            if let Some(dir) = &self.settings.covers_dir {
                let candidate = dir.join(configured);
                if is_image(&candidate) {
                    return Some(candidate);
                }
            }
        }
        if is_image(configured) {
            return Some(configured.clone());
        }

        warn!("Placeholder cover not found or not an image: {}", configured.display());
        None
    }

    /// Resolve a cover reference (filename, path or URL) and ISBN to an image
    ///
    /// Returns `None` when no step of the chain produced anything.
    pub fn resolve(&self, reference: &str, isbn: &str) -> Option<ImageReference> {
        let reference = reference.trim();
        let isbn = isbn.trim();

        // Step 1: the record's own reference
        if !reference.is_empty() {
            if is_url(reference) {
                return Some(ImageReference::Remote(reference.to_string()));
            }
            if let Some(path) = self.find_local(reference) {
                return Some(ImageReference::Local(path));
            }
        }

        if !isbn.is_empty() {
            // Step 2: a file named after the ISBN
            if let Some(path) = self.find_by_stem(isbn) {
                return Some(ImageReference::Local(path));
            }

            // Step 3: the remote cover host
            if let Some(url) = self.remote_url(isbn) {
                match self.settings.remote_policy {
                    RemotePolicy::Disabled => {}
                    RemotePolicy::Trust => return Some(ImageReference::Remote(url)),
                    RemotePolicy::Probe => {
                        if self.probe.is_available(&url) {
                            return Some(ImageReference::Remote(url));
                        }
                        debug!("Remote cover rejected: {}", url);
                    }
                }
            }
        }

        // Step 4: placeholder
        if let Some(placeholder) = &self.placeholder {
            return Some(ImageReference::Placeholder(placeholder.clone()));
        }

        debug!(reference, isbn, "Cover lookup miss");
        None
    }

    /// The remote cover URL for an ISBN, if a template is configured
    pub fn remote_url(&self, isbn: &str) -> Option<String> {
        let template = self.settings.remote_template.as_deref()?;
        let isbn = isbn.trim();
        if isbn.is_empty() || template.is_empty() {
            return None;
        }
        Some(template.replace("{isbn}", isbn))
    }

    fn find_local(&self, reference: &str) -> Option<PathBuf> {
        let path = Path::new(reference);
        if path.is_absolute() {
            return is_image(path).then(|| path.to_path_buf());
        }

        let dir = self.settings.covers_dir.as_ref()?;
        let candidate = dir.join(path);
        if is_image(&candidate) {
            return Some(candidate);
        }

        // Fall back to a case-insensitive match anywhere under the directory
        let name = path.file_name()?.to_string_lossy().to_lowercase();
        if path.extension().is_some() {
            self.index.get(&name).cloned()
        } else {
            self.find_by_stem(&name)
        }
    }

    fn find_by_stem(&self, stem: &str) -> Option<PathBuf> {
        let stem = stem.to_lowercase();
        IMAGE_EXTENSIONS
            .iter()
            .find_map(|ext| self.index.get(&format!("{}.{}", stem, ext)).cloned())
    }
}

impl std::fmt::Debug for CoverResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoverResolver")
            .field("settings", &self.settings)
            .field("indexed_files", &self.index.len())
            .field("placeholder", &self.placeholder)
            .finish()
    }
}

fn is_url(reference: &str) -> bool {
    let lower = reference.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Whether `path` is a file the UI can decode as an image
///
/// Only the header is read, so this is cheap enough to run per file.
fn is_image(path: &Path) -> bool {
    image::ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .ok()
        .and_then(|reader| reader.into_dimensions().ok())
        .is_some()
}

/// Index every image under `dir` by lowercased file name
///
/// Walks in file name order so that duplicates resolve the same way every time.
fn index_covers(dir: &Path) -> HashMap<String, PathBuf> {
    let mut index = HashMap::new();

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if !is_image(path) {
            debug!("Skipping unreadable cover file: {}", path.display());
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_lowercase();
        index.entry(name).or_insert_with(|| path.to_path_buf());
    }

    info!("🖼️ Indexed {} cover files in {}", index.len(), dir.display());
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};
    use std::fs;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    const ISBN: &str = "9780000000000";

    /// Probe with a fixed answer that counts how often it was asked
    struct StubProbe {
        available: bool,
        calls: Arc<AtomicUsize>,
    }

    impl RemoteProbe for StubProbe {
        fn is_available(&self, _url: &str) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.available
        }
    }

    fn resolver(settings: CoverSettings, available: bool) -> (CoverResolver, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let probe = StubProbe {
            available,
            calls: Arc::clone(&calls),
        };
        (CoverResolver::with_probe(settings, Box::new(probe)), calls)
    }

    /// A small but real image; covers are decoded, not just found
    fn png() -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        RgbImage::new(4, 6)
            .write_to(&mut bytes, ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    fn covers_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("dune.jpg"), png()).unwrap();
        fs::create_dir(dir.path().join("scans")).unwrap();
        fs::write(dir.path().join("scans").join("Hyperion-Back.PNG"), png()).unwrap();
        fs::write(dir.path().join("9780441172719.png"), png()).unwrap();
        fs::write(dir.path().join("placeholder.png"), png()).unwrap();
        dir
    }

    fn settings_for(dir: &TempDir) -> CoverSettings {
        CoverSettings {
            covers_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn test_remote_reference_when_no_local_file() {
        let (resolver, _) = resolver(CoverSettings::default(), true);
        assert_eq!(
            resolver.resolve("", ISBN),
            Some(ImageReference::Remote(
                "https://covers.openlibrary.org/b/isbn/9780000000000-L.jpg".to_string()
            ))
        );
    }

    #[test]
    fn test_nothing_available_is_none() {
        let (resolver, _) = resolver(CoverSettings::default(), true);
        assert_eq!(resolver.resolve("", ""), None);
        assert_eq!(resolver.resolve("missing.jpg", ""), None);
    }

    #[test]
    fn test_local_reference_wins() {
        let dir = covers_dir();
        let (resolver, calls) = resolver(settings_for(&dir), true);

        assert_eq!(
            resolver.resolve("dune.jpg", ISBN),
            Some(ImageReference::Local(dir.path().join("dune.jpg")))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_reference_matches_case_insensitively_in_subdirectories() {
        let dir = covers_dir();
        let (resolver, _) = resolver(settings_for(&dir), true);

        let expected = Some(ImageReference::Local(
            dir.path().join("scans").join("Hyperion-Back.PNG"),
        ));
        assert_eq!(resolver.resolve("hyperion-back.png", ""), expected);
        assert_eq!(resolver.resolve("Hyperion-Back", ""), expected);
    }

    #[test]
    fn test_isbn_named_file() {
        let dir = covers_dir();
        let (resolver, _) = resolver(settings_for(&dir), true);

        assert_eq!(
            resolver.resolve("not-there.jpg", "9780441172719"),
            Some(ImageReference::Local(dir.path().join("9780441172719.png")))
        );
    }

    #[test]
    fn test_url_reference_is_used_directly() {
        let (resolver, _) = resolver(CoverSettings::default(), true);
        assert_eq!(
            resolver.resolve("https://example.com/dune.jpg", ""),
            Some(ImageReference::Remote("https://example.com/dune.jpg".to_string()))
        );
    }

    #[test]
    fn test_probe_policy() {
        let settings = CoverSettings {
            remote_policy: RemotePolicy::Probe,
            ..Default::default()
        };

        let (accepting, calls) = resolver(settings.clone(), true);
        assert!(matches!(accepting.resolve("", ISBN), Some(ImageReference::Remote(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let (rejecting, calls) = resolver(settings, false);
        assert_eq!(rejecting.resolve("", ISBN), None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_trust_policy_never_probes() {
        let (resolver, calls) = resolver(CoverSettings::default(), false);
        assert!(resolver.resolve("", ISBN).is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_disabled_remote_falls_through_to_placeholder() {
        let dir = covers_dir();
        let settings = CoverSettings {
            placeholder: Some(PathBuf::from("placeholder.png")),
            remote_policy: RemotePolicy::Disabled,
            ..settings_for(&dir)
        };
        let (resolver, calls) = resolver(settings, true);

        assert_eq!(
            resolver.resolve("", ISBN),
            Some(ImageReference::Placeholder(dir.path().join("placeholder.png")))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_rejected_probe_falls_through_to_placeholder() {
        let dir = covers_dir();
        let settings = CoverSettings {
            placeholder: Some(dir.path().join("placeholder.png")),
            remote_policy: RemotePolicy::Probe,
            ..settings_for(&dir)
        };
        let (resolver, _) = resolver(settings, false);

        assert!(matches!(
            resolver.resolve("", ISBN),
            Some(ImageReference::Placeholder(_))
        ));
    }

    #[test]
    fn test_missing_placeholder_is_ignored() {
        let dir = covers_dir();
        let settings = CoverSettings {
            placeholder: Some(PathBuf::from("nope.png")),
            remote_template: None,
            ..settings_for(&dir)
        };
        let (resolver, _) = resolver(settings, true);
        assert_eq!(resolver.resolve("", ISBN), None);
    }

    #[test]
    fn test_rescan_picks_up_new_files() {
        let dir = covers_dir();
        let settings = CoverSettings {
            remote_template: None,
            ..settings_for(&dir)
        };
        let (mut resolver, _) = resolver(settings, true);
        assert_eq!(resolver.resolve("", "9781234567897"), None);

        fs::write(dir.path().join("9781234567897.JPG"), png()).unwrap();
        resolver.rescan();
        assert_eq!(
            resolver.resolve("", "9781234567897"),
            Some(ImageReference::Local(dir.path().join("9781234567897.JPG")))
        );
    }

    #[test]
    fn test_undecodable_files_are_not_covers() {
        let dir = covers_dir();
        fs::write(dir.path().join("broken.jpg"), b"not an image").unwrap();
        fs::write(dir.path().join("9781111111111.jpg"), b"<html>").unwrap();
        fs::write(dir.path().join("empty.png"), b"").unwrap();
        let settings = CoverSettings {
            placeholder: Some(PathBuf::from("empty.png")),
            remote_template: None,
            ..settings_for(&dir)
        };
        let (resolver, _) = resolver(settings, true);

        assert_eq!(resolver.resolve("broken.jpg", ""), None);
        assert_eq!(resolver.resolve("", "9781111111111"), None);
        let absolute = dir.path().join("broken.jpg");
        assert_eq!(resolver.resolve(&absolute.to_string_lossy(), ""), None);
    }

    #[test]
    fn test_remote_url_template() {
        let settings = CoverSettings {
            remote_template: Some("https://img.example/{isbn}.jpg".to_string()),
            ..Default::default()
        };
        let (resolver, _) = resolver(settings, true);
        assert_eq!(
            resolver.remote_url(" 080442957X "),
            Some("https://img.example/080442957X.jpg".to_string())
        );
        assert_eq!(resolver.remote_url(""), None);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let dir = covers_dir();
        let (resolver, _) = resolver(settings_for(&dir), true);
        let first = resolver.resolve("hyperion-back", ISBN);
        for _ in 0..5 {
            assert_eq!(resolver.resolve("hyperion-back", ISBN), first);
        }
    }
}
