//! In-memory archive construction

use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// One archive member; `None` content marks a directory
pub struct Member<'a> {
    pub path: &'a str,
    pub content: Option<&'a [u8]>,
    pub mode: u32,
}

pub fn file<'a>(path: &'a str, content: &'a [u8]) -> Member<'a> {
    Member {
        path,
        content: Some(content),
        mode: 0o644,
    }
}

pub fn executable<'a>(path: &'a str, content: &'a [u8]) -> Member<'a> {
    Member {
        path,
        content: Some(content),
        mode: 0o755,
    }
}

pub fn directory(path: &str) -> Member<'_> {
    Member {
        path,
        content: None,
        mode: 0o755,
    }
}

/// Build a zip archive
pub fn zip_archive(members: &[Member<'_>]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for member in members {
        let options = SimpleFileOptions::default().unix_permissions(member.mode);
        match member.content {
            Some(content) => {
                writer.start_file(member.path, options).unwrap();
                writer.write_all(content).unwrap();
            }
            None => writer.add_directory(member.path, options).unwrap(),
        }
    }

    writer.finish().unwrap().into_inner()
}

/// Build an uncompressed tarball
pub fn tar_archive(members: &[Member<'_>]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    append_tar_members(&mut builder, members);
    builder.into_inner().unwrap()
}

/// Build a gzip compressed tarball
pub fn tar_gz_archive(members: &[Member<'_>]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    append_tar_members(&mut builder, members);
    builder.into_inner().unwrap().finish().unwrap()
}

fn append_tar_members<W: Write>(builder: &mut tar::Builder<W>, members: &[Member<'_>]) {
    for member in members {
        let mut header = tar::Header::new_gnu();
        header.set_mode(member.mode);

        match member.content {
            Some(content) => {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_size(content.len() as u64);
                builder.append_data(&mut header, member.path, content).unwrap();
            }
            None => {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_size(0);
                builder
                    .append_data(&mut header, member.path, std::io::empty())
                    .unwrap();
            }
        }
    }
}

/// Build a tarball with one regular file whose stored name is used verbatim
///
/// `tar::Builder` refuses absolute and `..` paths, so the name is written
/// straight into the header.
pub fn tar_archive_with_raw_name(name: &str, content: &[u8]) -> Vec<u8> {
    let mut header = tar::Header::new_gnu();
    {
        let field = &mut header.as_gnu_mut().unwrap().name;
        field[..name.len()].copy_from_slice(name.as_bytes());
    }
    header.set_entry_type(tar::EntryType::Regular);
    header.set_mode(0o755);
    header.set_size(content.len() as u64);
    header.set_cksum();

    let mut builder = tar::Builder::new(Vec::new());
    builder.append(&header, content).unwrap();
    builder.into_inner().unwrap()
}
