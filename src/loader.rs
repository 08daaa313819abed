// loader.rs
//
// Program images: raw little-endian binaries copied to the reset vector.

use crate::error::LoadError;
use crate::riscv::Word;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Built-in program used when no image is given. It stores zero into the
/// data word, loads it back into a0 and stops with a good trap.
pub const DEFAULT_IMAGE: [Word; 5] = [
    0x0000_0297, // auipc t0, 0
    0x0002_8823, // sb    zero, 16(t0)
    0x0102_c503, // lbu   a0, 16(t0)
    0x0010_0073, // ebreak
    0xdead_beef, // data
];

pub fn default_image() -> Vec<u8> {
    DEFAULT_IMAGE.iter().flat_map(|w| w.to_le_bytes()).collect()
}

/// Read a raw image from `path`, checking that it fits in `capacity` bytes.
pub fn load_image(path: &Path, capacity: usize) -> Result<Vec<u8>, LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::Io { path: path.display().to_string(), source })?;
    check_image(&bytes, capacity)?;
    info!("loaded {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}

/// The image at `path`, or the built-in one when no path is given.
pub fn image_or_default(path: Option<&Path>, capacity: usize) -> Result<Vec<u8>, LoadError> {
    match path {
        Some(path) => load_image(path, capacity),
        None => {
            warn!("no image is given, using the built-in image");
            Ok(default_image())
        }
    }
}

fn check_image(bytes: &[u8], capacity: usize) -> Result<(), LoadError> {
    if bytes.is_empty() {
        return Err(LoadError::Empty);
    }
    if bytes.len() > capacity {
        return Err(LoadError::TooLarge { size: bytes.len(), capacity });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_file(name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = env::temp_dir().join(format!("riscmon-{}-{}", std::process::id(), name));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_default_image_layout() {
        let image = default_image();
        assert_eq!(image.len(), 20);
        assert_eq!(&image[..4], &[0x97, 0x02, 0x00, 0x00]);
        assert_eq!(&image[16..], &[0xef, 0xbe, 0xad, 0xde]);
    }

    #[test]
    fn test_load_image() {
        let path = temp_file("ok.bin", &[0x73, 0x00, 0x10, 0x00]);
        assert_eq!(load_image(&path, 16).unwrap(), vec![0x73, 0x00, 0x10, 0x00]);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_rejects_oversized_and_empty() {
        let big = temp_file("big.bin", &[0; 32]);
        assert!(matches!(load_image(&big, 16), Err(LoadError::TooLarge { size: 32, capacity: 16 })));
        fs::remove_file(&big).unwrap();

        let empty = temp_file("empty.bin", &[]);
        assert!(matches!(load_image(&empty, 16), Err(LoadError::Empty)));
        fs::remove_file(&empty).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let path = env::temp_dir().join("riscmon-does-not-exist.bin");
        assert!(matches!(load_image(&path, 16), Err(LoadError::Io { .. })));
    }

    #[test]
    fn test_image_or_default() {
        assert_eq!(image_or_default(None, 16).unwrap(), default_image());
    }
}
