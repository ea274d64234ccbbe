//! # pdfium-cache
//!
//! Resolves the one PDFium release pdf2pptx is tested against.
//!
//! The release is pinned by [`PDFIUM_VERSION`]. Resolution happens in two
//! explicit phases so that nothing is fetched in the middle of a conversion:
//!
//! 1. [`ensure_engine`] (called once by the CLI at start-up) makes sure the
//!    platform library sits in the per-version cache, fetching the archive
//!    from [bblanchon/pdfium-binaries](https://github.com/bblanchon/pdfium-binaries)
//!    only if it is missing.
//! 2. [`bind_engine`] (called by the pipeline) binds to an already present
//!    library and never touches the network.
//!
//! ## Lookup order
//!
//! 1. `PDFIUM_LIB_PATH` — an existing pdfium library.
//! 2. The cache directory, `{cache}/pdf2pptx/pdfium-{VERSION}/`
//!    (override with `PDFIUM_CACHE_DIR`).
//! 3. The system library (`bind_engine` only).

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use pdfium_render::prelude::Pdfium;
use thiserror::Error;
use tracing::{debug, info, warn};

/// The pdfium-binaries release tag.
pub const PDFIUM_VERSION: &str = "7690";

const RELEASE_BASE_URL: &str = "https://github.com/bblanchon/pdfium-binaries/releases/download";

/// Errors returned while locating, fetching or binding the engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("Cache directory error: {0}")]
    CacheDir(#[source] std::io::Error),

    #[error("Fetching PDFium failed: {0}")]
    Fetch(String),

    #[error("Unpacking PDFium failed: {0}")]
    Unpack(String),

    /// The library was found but `pdfium-render` could not load it.
    #[error("Failed to bind PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },

    /// No library in `PDFIUM_LIB_PATH`, the cache, or the system search path.
    #[error("PDFium {version} is not installed (looked in {cache})")]
    NotInstalled { version: &'static str, cache: PathBuf },
}

/// Where the platform library lives inside a release archive.
#[derive(Debug, Clone, Copy)]
struct ReleaseAsset {
    archive: &'static str,
    member: &'static str,
    file_name: &'static str,
}

const LINUX_SO: (&str, &str) = ("lib/libpdfium.so", "libpdfium.so");
const MAC_DYLIB: (&str, &str) = ("lib/libpdfium.dylib", "libpdfium.dylib");
const WIN_DLL: (&str, &str) = ("bin/pdfium.dll", "pdfium.dll");

fn release_asset_for(os: &str, arch: &str) -> Result<ReleaseAsset, EngineError> {
    let (archive, (member, file_name)) = match (os, arch) {
        ("linux", "x86_64") => ("pdfium-linux-x64.tgz", LINUX_SO),
        ("linux", "aarch64") => ("pdfium-linux-arm64.tgz", LINUX_SO),
        ("macos", "x86_64") => ("pdfium-mac-x64.tgz", MAC_DYLIB),
        ("macos", "aarch64") => ("pdfium-mac-arm64.tgz", MAC_DYLIB),
        ("windows", "x86_64") => ("pdfium-win-x64.tgz", WIN_DLL),
        ("windows", "aarch64") => ("pdfium-win-arm64.tgz", WIN_DLL),
        ("windows", "x86") => ("pdfium-win-x86.tgz", WIN_DLL),
        (os, arch) => {
            return Err(EngineError::UnsupportedPlatform {
                os: os.to_string(),
                arch: arch.to_string(),
            })
        }
    };
    Ok(ReleaseAsset {
        archive,
        member,
        file_name,
    })
}

fn current_asset() -> Result<ReleaseAsset, EngineError> {
    release_asset_for(std::env::consts::OS, std::env::consts::ARCH)
}

/// Per-version cache directory for the engine.
///
/// Defaults to `{platform cache dir}/pdf2pptx/pdfium-{VERSION}`; set
/// `PDFIUM_CACHE_DIR` to relocate it.
pub fn engine_cache_dir() -> PathBuf {
    let versioned = format!("pdfium-{PDFIUM_VERSION}");
    if let Ok(dir) = std::env::var("PDFIUM_CACHE_DIR") {
        return PathBuf::from(dir).join(versioned);
    }

    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir)
        .join("pdf2pptx")
        .join(versioned)
}

static RESOLVED: OnceLock<PathBuf> = OnceLock::new();

fn env_override() -> Option<PathBuf> {
    let path = PathBuf::from(std::env::var_os("PDFIUM_LIB_PATH")?);
    if path.exists() {
        Some(path)
    } else {
        warn!("PDFIUM_LIB_PATH '{}' does not exist; ignoring", path.display());
        None
    }
}

/// Path of an already installed engine, without any network access.
pub fn locate_engine() -> Option<PathBuf> {
    if let Some(path) = RESOLVED.get() {
        return Some(path.clone());
    }
    if let Some(path) = env_override() {
        return Some(path);
    }
    let cached = engine_cache_dir().join(current_asset().ok()?.file_name);
    cached.exists().then_some(cached)
}

/// Makes sure the pinned engine is present, fetching it on first use.
///
/// `on_progress` receives `(bytes_fetched, total_bytes)` while the archive
/// downloads.
pub fn ensure_engine(
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<PathBuf, EngineError> {
    if let Some(path) = locate_engine() {
        let _ = RESOLVED.set(path.clone());
        return Ok(path);
    }

    let asset = current_asset()?;
    let cache_dir = engine_cache_dir();
    let target = cache_dir.join(asset.file_name);
    let url = format!(
        "{RELEASE_BASE_URL}/chromium%2F{PDFIUM_VERSION}/{}",
        asset.archive
    );

    info!("Fetching PDFium {} from {}", PDFIUM_VERSION, url);
    std::fs::create_dir_all(&cache_dir).map_err(EngineError::CacheDir)?;
    let archive = fetch(&url, on_progress)?;
    unpack_member(&archive, asset.member, &target)?;
    info!("PDFium installed at {}", target.display());

    let _ = RESOLVED.set(target.clone());
    Ok(target)
}

/// Binds to an installed engine. Never fetches.
///
/// Tries `PDFIUM_LIB_PATH`, then the cache, then the system library.
pub fn bind_engine() -> Result<Pdfium, EngineError> {
    if let Some(path) = locate_engine() {
        return bind_engine_at(&path);
    }

    debug!("No cached PDFium; trying the system library");
    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|_| EngineError::NotInstalled {
            version: PDFIUM_VERSION,
            cache: engine_cache_dir(),
        })
}

/// Binds to the library at `path`.
pub fn bind_engine_at(path: &Path) -> Result<Pdfium, EngineError> {
    debug!("Binding PDFium from {}", path.display());
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| EngineError::Bind {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn fetch(url: &str, on_progress: Option<&dyn Fn(u64, Option<u64>)>) -> Result<Vec<u8>, EngineError> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("pdfium-cache/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| EngineError::Fetch(e.to_string()))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| EngineError::Fetch(format!("GET {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(EngineError::Fetch(format!(
            "HTTP {} for {url}",
            response.status()
        )));
    }

    let total = response.content_length();
    let mut bytes = Vec::with_capacity(total.unwrap_or(32 * 1024 * 1024) as usize);
    let mut chunk = vec![0u8; 64 * 1024];
    let mut fetched: u64 = 0;

    loop {
        match response.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                bytes.extend_from_slice(&chunk[..n]);
                fetched += n as u64;
                if let Some(cb) = on_progress {
                    cb(fetched, total);
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(EngineError::Fetch(format!("read error: {e}"))),
        }
    }

    Ok(bytes)
}

/// Writes the archive entry `member` of a `.tgz` to `dest`.
///
/// The entry is unpacked next to `dest` under a `.part` name and renamed
/// into place, so `dest` never exists half-written.
fn unpack_member(archive: &[u8], member: &str, dest: &Path) -> Result<(), EngineError> {
    use flate2::read::GzDecoder;
    use tar::Archive;

    let mut archive = Archive::new(GzDecoder::new(archive));
    let entries = archive
        .entries()
        .map_err(|e| EngineError::Unpack(e.to_string()))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| EngineError::Unpack(e.to_string()))?;
        let is_member = entry
            .path()
            .map_err(|e| EngineError::Unpack(e.to_string()))?
            .to_string_lossy()
            == member;
        if !is_member {
            continue;
        }

        let part = part_path(dest);
        let written = entry
            .unpack(&part)
            .map_err(|e| EngineError::Unpack(format!("{member}: {e}")))
            .and_then(|_| {
                std::fs::rename(&part, dest).map_err(|e| {
                    EngineError::Unpack(format!("{} → {}: {e}", part.display(), dest.display()))
                })
            });
        if written.is_err() {
            let _ = std::fs::remove_file(&part);
        }
        return written;
    }

    Err(EngineError::Unpack(format!("'{member}' not found in archive")))
}

/// `libpdfium.so` → `libpdfium.so.part`, in the same directory.
fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}
