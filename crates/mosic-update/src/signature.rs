//! Native executable detection by magic bytes
//!
//! Detection never looks at file names, so an archive whose executable is
//! named differently on a future platform is still handled.

/// Windows portable executable (DOS stub) magic
pub const PE_MAGIC: [u8; 2] = *b"MZ";

/// ELF magic
pub const ELF_MAGIC: [u8; 4] = [0x7F, b'E', b'L', b'F'];

/// Number of leading bytes needed to recognise any supported format
pub const SIGNATURE_LEN: usize = 4;

/// Kind of native executable recognised from its leading bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutableKind {
    /// Windows portable executable
    Pe,
    /// Unix ELF binary
    Elf,
}

/// Identify the executable format of a byte buffer, if any
pub fn detect(bytes: &[u8]) -> Option<ExecutableKind> {
    if bytes.starts_with(&PE_MAGIC) {
        Some(ExecutableKind::Pe)
    } else if bytes.starts_with(&ELF_MAGIC) {
        Some(ExecutableKind::Elf)
    } else {
        None
    }
}

/// Whether the buffer starts with a native executable signature
pub fn is_executable(bytes: &[u8]) -> bool {
    detect(bytes).is_some()
}
