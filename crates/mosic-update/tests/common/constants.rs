//! Shared constants for test infrastructure

pub const REPO_OWNER: &str = "Spi3lot";
pub const REPO_NAME: &str = "Mosic";

pub const TAG_V1: &str = "v1.0.0";
pub const TAG_V2: &str = "v2.0.0";
pub const TAG_V3: &str = "v3.0.0";

pub const WINDOWS_ASSET: &str = "Mosic.exe";
pub const LINUX_ASSET: &str = "Mosic.x86_64";
pub const ZIP_ASSET: &str = "Mosic.zip";
pub const TARBALL_ASSET: &str = "Mosic.tar.gz";

pub const WINDOWS_EXTENSION: &str = ".exe";
pub const LINUX_EXTENSION: &str = ".x86_64";

/// A tiny PE image: the `MZ` header is all the signature check needs
pub const PE_BINARY_V1: &[u8] = b"MZ\x90\x00mosic v1 windows build";
pub const PE_BINARY_V2: &[u8] = b"MZ\x90\x00mosic v2 windows build";

/// A tiny ELF image
pub const ELF_BINARY_V1: &[u8] = b"\x7FELF\x02\x01\x01mosic v1 linux build";
pub const ELF_BINARY_V2: &[u8] = b"\x7FELF\x02\x01\x01mosic v2 linux build";

pub const TEXT_CONTENT: &[u8] = b"not an executable";
