use camino::{Utf8Path, Utf8PathBuf};
use filetime::{FileTime, set_file_times};
use std::fs::{self, File};
use std::io::{self, Read, Write};

/// Copies `src` to `dest` in `chunk_size` pieces, calling `progress` with the running byte count
/// and the source size after every chunk. Missing parent directories are created.
///
/// The bytes go into a hidden `.<name>.part` file next to `dest`, which is renamed into place
/// once it is complete, so a half-written frame never sits under its real name. Times and
/// permissions are copied across if the filesystem lets us. Returns the number of bytes copied.
pub fn copy_file(
    src: &Utf8Path,
    dest: &Utf8Path,
    chunk_size: usize,
    progress: &mut dyn FnMut(u64, u64),
) -> io::Result<u64> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let partial = partial_path(dest)?;

    match copy_to(src, &partial, dest, chunk_size, progress) {
        Ok(bytes) => Ok(bytes),
        Err(e) => {
            let _ = fs::remove_file(&partial);
            Err(e)
        }
    }
}

/// The name an in-flight copy of `dest` goes under.
///
pub fn partial_path(dest: &Utf8Path) -> io::Result<Utf8PathBuf> {
    match dest.file_name() {
        Some(name) => Ok(dest.with_file_name(format!(".{}.part", name))),
        None => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no file name", dest),
        )),
    }
}

fn copy_to(
    src: &Utf8Path,
    partial: &Utf8Path,
    dest: &Utf8Path,
    chunk_size: usize,
    progress: &mut dyn FnMut(u64, u64),
) -> io::Result<u64> {
    let mut reader = File::open(src)?;
    let total = reader.metadata()?.len();
    let mut writer = File::create(partial)?;
    let mut buffer = vec![0_u8; chunk_size.max(1)];
    let mut copied: u64 = 0;

    loop {
        let count = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(count) => count,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        writer.write_all(&buffer[..count])?;
        copied += count as u64;
        progress(copied, total);
    }

    drop(writer);
    copy_metadata(src, partial)?;
    fs::rename(partial, dest)?;
    Ok(copied)
}

/// Best-effort copy of access/modification times and permission bits. Some filesystems (exFAT
/// camera cards, for one) refuse some or all of this, which is fine: the bytes are what matter.
///
pub fn copy_metadata(src: &Utf8Path, dest: &Utf8Path) -> io::Result<()> {
    match replicate_metadata(src, dest) {
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => Ok(()),
        result => result,
    }
}

fn replicate_metadata(src: &Utf8Path, dest: &Utf8Path) -> io::Result<()> {
    let metadata = fs::metadata(src)?;
    set_file_times(
        dest,
        FileTime::from_last_access_time(&metadata),
        FileTime::from_last_modification_time(&metadata),
    )?;
    fs::set_permissions(dest, metadata.permissions())
}
