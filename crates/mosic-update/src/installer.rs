//! Archive installation with signature-based executable detection
//!
//! The packaging format is chosen from the destination's file name:
//!
//! | name ends with       | handling                                            |
//! |----------------------|-----------------------------------------------------|
//! | `.zip`               | written as-is, then every member extracted concurrently |
//! | `.tar.gz`, `.tgz`    | gunzipped and extracted sequentially                |
//! | `.tar`               | extracted sequentially                              |
//! | anything else        | written as-is, accepted only if it is an executable |
//!
//! Everything lands in the destination's parent directory. The executable is
//! found by its magic bytes, never by its name.

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Component, Path, PathBuf};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use zip::ZipArchive;

use crate::error::{Result, UpdateError};
use crate::signature::{self, SIGNATURE_LEN};

/// Result of installing an artifact
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOutcome {
    /// The installed native executable, if one was recognised
    pub executable_path: Option<PathBuf>,
}

impl InstallOutcome {
    /// An installation that produced the given executable
    pub fn found(path: impl Into<PathBuf>) -> Self {
        Self {
            executable_path: Some(path.into()),
        }
    }

    /// An installation that produced no recognisable executable
    pub fn none() -> Self {
        Self::default()
    }
}

/// Packaging format of an update artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    /// Zip archive
    Zip,
    /// Gzip compressed tarball
    TarGz,
    /// Uncompressed tarball
    Tar,
    /// Anything else, expected to be a bare executable
    Raw,
}

impl ArtifactFormat {
    /// Determine the format from a file name, ignoring case
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        if name.ends_with(".zip") {
            Self::Zip
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Self::TarGz
        } else if name.ends_with(".tar") {
            Self::Tar
        } else {
            Self::Raw
        }
    }
}

/// Upper bound for trusting a zip member's declared size when allocating
const MAX_MEMBER_PREALLOC: u64 = 64 * 1024 * 1024;

/// A decoded zip member waiting to be written
struct ZipMember {
    relative_path: PathBuf,
    bytes: Vec<u8>,
    unix_mode: Option<u32>,
}

/// Installs update artifacts next to their destination path
#[derive(Debug, Clone, Default)]
pub struct ArchiveInstaller;

impl ArchiveInstaller {
    /// Create a new installer
    pub fn new() -> Self {
        Self
    }

    /// Install `bytes` as the artifact named by `destination`
    ///
    /// Returns `Ok` with an empty outcome when the artifact was handled but
    /// contained no executable, and `Err` when an archive cannot be read.
    pub async fn install(&self, destination: &Path, bytes: &[u8]) -> Result<InstallOutcome> {
        let destination =
            std::path::absolute(destination).map_err(|e| UpdateError::io(destination, e))?;
        let directory = destination
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| UpdateError::archive(&destination, "destination has no parent directory"))?;

        tokio::fs::create_dir_all(&directory)
            .await
            .map_err(|e| UpdateError::io(&directory, e))?;

        let format = ArtifactFormat::from_path(&destination);
        info!("Installing {:?} as {:?}", destination, format);

        let executable = match format {
            ArtifactFormat::Zip => install_zip(&destination, &directory, bytes).await?,
            ArtifactFormat::TarGz | ArtifactFormat::Tar => {
                let gzip = format == ArtifactFormat::TarGz;
                let archive_path = destination.clone();
                let target_dir = directory.clone();
                let bytes = bytes.to_vec();
                tokio::task::spawn_blocking(move || {
                    let reader = Cursor::new(bytes);
                    if gzip {
                        extract_tar(GzDecoder::new(reader), &target_dir, &archive_path)
                    } else {
                        extract_tar(reader, &target_dir, &archive_path)
                    }
                })
                .await
                .map_err(|e| join_error(&destination, e))??
            }
            ArtifactFormat::Raw => install_raw(&destination, bytes).await?,
        };

        match &executable {
            Some(path) => {
                mark_executable(path).await?;
                info!("Installed executable: {:?}", path);
            }
            None => warn!("No executable found in {:?}", destination),
        }

        Ok(InstallOutcome {
            executable_path: executable,
        })
    }
}

/// Write a bare artifact and accept it only if it carries an executable signature
async fn install_raw(destination: &Path, bytes: &[u8]) -> Result<Option<PathBuf>> {
    write_replacing(destination, bytes).await?;

    if signature::is_executable(bytes) {
        return Ok(Some(destination.to_path_buf()));
    }

    let extension = destination
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();
    error!("Unknown update format: '{}' ({:?})", extension, destination);
    Ok(None)
}

/// Write the zip, decode its members and write them out concurrently
async fn install_zip(destination: &Path, directory: &Path, bytes: &[u8]) -> Result<Option<PathBuf>> {
    tokio::fs::write(destination, bytes)
        .await
        .map_err(|e| UpdateError::io(destination, e))?;

    let archive_path = destination.to_path_buf();
    let (directories, members) = tokio::task::spawn_blocking(move || read_zip(&archive_path))
        .await
        .map_err(|e| join_error(destination, e))??;

    for relative in directories {
        let path = directory.join(relative);
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|e| UpdateError::io(&path, e))?;
    }

    let mut executable: Option<PathBuf> = None;
    let mut writes = JoinSet::new();

    for member in members {
        let target = directory.join(&member.relative_path);

        if signature::is_executable(&member.bytes) {
            record_executable(&mut executable, &target);
        }

        writes.spawn(write_member(target, member.bytes, member.unix_mode));
    }

    while let Some(written) = writes.join_next().await {
        written.map_err(|e| join_error(destination, e))??;
    }

    Ok(executable)
}

/// Decode every zip member into memory
fn read_zip(archive_path: &Path) -> Result<(Vec<PathBuf>, Vec<ZipMember>)> {
    let file = File::open(archive_path).map_err(|e| UpdateError::io(archive_path, e))?;
    let mut archive = ZipArchive::new(file).map_err(|e| UpdateError::archive(archive_path, e))?;

    let mut directories = Vec::new();
    let mut members = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| UpdateError::archive(archive_path, e))?;

        let relative_path = match file.enclosed_name() {
            Some(path) => path.to_owned(),
            None => {
                warn!("Skipping zip entry outside the install directory: {}", file.name());
                continue;
            }
        };

        if file.is_dir() {
            directories.push(relative_path);
            continue;
        }

        let mut bytes = Vec::with_capacity(member_capacity(file.size()));
        io::copy(&mut file, &mut bytes).map_err(|e| UpdateError::archive(archive_path, e))?;

        debug!("Decoded zip member {:?} ({} bytes)", relative_path, bytes.len());
        members.push(ZipMember {
            relative_path,
            bytes,
            unix_mode: file.unix_mode(),
        });
    }

    Ok((directories, members))
}

/// Buffer capacity for a member declaring `size` bytes, which may be forged
fn member_capacity(size: u64) -> usize {
    size.min(MAX_MEMBER_PREALLOC) as usize
}

/// Write one zip member, creating its parent directories
async fn write_member(target: PathBuf, bytes: Vec<u8>, unix_mode: Option<u32>) -> Result<()> {
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| UpdateError::io(parent, e))?;
    }

    write_replacing(&target, &bytes).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Some(mode) = unix_mode.map(|m| m & 0o7777).filter(|m| *m != 0) {
            tokio::fs::set_permissions(&target, std::fs::Permissions::from_mode(mode))
                .await
                .map_err(|e| UpdateError::io(&target, e))?;
        }
    }

    #[cfg(not(unix))]
    let _ = unix_mode;

    Ok(())
}

/// Write a file by renaming a sibling staging file over it
///
/// On Unix this replaces the file of a running executable, which cannot be
/// opened for writing while it runs.
async fn write_replacing(target: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let staging = target.with_file_name(format!(".{}.partial", file_name));

    tokio::fs::write(&staging, bytes)
        .await
        .map_err(|e| UpdateError::io(&staging, e))?;

    if let Err(e) = tokio::fs::rename(&staging, target).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(UpdateError::io(target, e));
    }

    Ok(())
}

/// Stream a tarball into `directory`, one entry at a time
///
/// Zero-length entries (directories, links, empty files) are skipped. The
/// signature of each written file is re-read from disk because the entry
/// stream cannot be rewound.
fn extract_tar<R: Read>(reader: R, directory: &Path, archive_path: &Path) -> Result<Option<PathBuf>> {
    let mut archive = tar::Archive::new(reader);
    archive.set_overwrite(true);
    archive.set_preserve_permissions(true);

    let entries = archive
        .entries()
        .map_err(|e| UpdateError::archive(archive_path, e))?;

    let mut executable: Option<PathBuf> = None;

    for entry in entries {
        let mut entry = entry.map_err(|e| UpdateError::archive(archive_path, e))?;

        if entry.size() == 0 {
            continue;
        }

        let entry_path = entry
            .path()
            .map_err(|e| UpdateError::archive(archive_path, e))?
            .into_owned();
        let relative_path = match enclosed_path(&entry_path) {
            Some(path) => path,
            None => {
                warn!("Skipping tar entry outside the install directory: {:?}", entry_path);
                continue;
            }
        };
        let target = directory.join(&relative_path);

        let unpacked = entry
            .unpack_in(directory)
            .map_err(|e| UpdateError::io(&target, e))?;
        if !unpacked {
            warn!("Skipping tar entry outside the install directory: {:?}", entry_path);
            continue;
        }

        if !target.is_file() {
            continue;
        }

        debug!("Extracted tar member {:?}", relative_path);
        if signature::is_executable(&read_signature(&target)?) {
            record_executable(&mut executable, &target);
        }
    }

    Ok(executable)
}

/// Resolve a tar entry path relative to the install directory
///
/// Mirrors `tar::Entry::unpack_in`: roots, prefixes and `.` are dropped, and
/// any `..` makes the entry unusable. Returns `None` for such entries and for
/// paths with nothing left.
fn enclosed_path(path: &Path) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => continue,
            Component::ParentDir => return None,
            Component::Normal(part) => relative.push(part),
        }
    }
    (!relative.as_os_str().is_empty()).then_some(relative)
}

/// Read the leading bytes of a file
fn read_signature(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path).map_err(|e| UpdateError::io(path, e))?;
    let mut header = Vec::with_capacity(SIGNATURE_LEN);
    file.take(SIGNATURE_LEN as u64)
        .read_to_end(&mut header)
        .map_err(|e| UpdateError::io(path, e))?;
    Ok(header)
}

/// Keep the first executable found, reporting any later ones
fn record_executable(current: &mut Option<PathBuf>, candidate: &Path) {
    match current {
        None => *current = Some(candidate.to_path_buf()),
        Some(first) => warn!(
            "Archive contains more than one executable; keeping {:?}, ignoring {:?}",
            first, candidate
        ),
    }
}

/// Set the executable bits on Unix
async fn mark_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| UpdateError::io(path, e))?;
        let mut perms = metadata.permissions();
        perms.set_mode(perms.mode() | 0o755);
        tokio::fs::set_permissions(path, perms)
            .await
            .map_err(|e| UpdateError::io(path, e))?;
    }

    #[cfg(not(unix))]
    let _ = path;

    Ok(())
}

fn join_error(path: &Path, err: tokio::task::JoinError) -> UpdateError {
    UpdateError::io(path, io::Error::other(err))
}
