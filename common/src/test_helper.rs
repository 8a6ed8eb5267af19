use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Writes a file of exactly `size` bytes, with content that differs from byte to byte so a bad
/// copy can't pass by accident.
pub fn write_file_of_size(dir: &Utf8Path, name: &str, size: usize) -> Utf8PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let content: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
    fs::write(&path, content).unwrap();
    path
}

pub fn file_size(path: &Utf8Path) -> u64 {
    fs::metadata(path).unwrap().len()
}
