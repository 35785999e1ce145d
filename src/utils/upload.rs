use chrono::Utc;
use rand::Rng;
use std::fs;
use std::io;
use std::path::Path;

/// Where employee photos land on disk, and the root-relative prefix under
/// which `actix-files` serves them back.
pub const UPLOAD_DIR: &str = "public/uploads/employees";
pub const PUBLIC_PREFIX: &str = "/uploads/employees";

/// Accepted photo content types, checked by sniffing the bytes rather
/// than trusting the submitted filename.
pub fn is_supported_image(bytes: &[u8]) -> bool {
    infer::get(bytes)
        .map(|kind| matches!(kind.mime_type(), "image/jpeg" | "image/png" | "image/gif"))
        .unwrap_or(false)
}

/// Stores an uploaded photo under the public upload directory and returns
/// the root-relative URL to persist on the employee row.
pub fn store_photo(original_name: &str, bytes: &[u8]) -> io::Result<String> {
    store_photo_in(Path::new(UPLOAD_DIR), PUBLIC_PREFIX, original_name, bytes)
}

pub fn store_photo_in(
    dir: &Path,
    public_prefix: &str,
    original_name: &str,
    bytes: &[u8],
) -> io::Result<String> {
    fs::create_dir_all(dir)?;
    let file_name = unique_file_name(original_name);
    fs::write(dir.join(&file_name), bytes)?;
    Ok(format!("{}/{}", public_prefix, file_name))
}

/// `<millisecond-timestamp>-<random-base36>` plus the original extension.
/// Collisions are ruled out probabilistically, not by locking.
fn unique_file_name(original_name: &str) -> String {
    let extension = Path::new(original_name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    format!(
        "{}-{}{}",
        Utc::now().timestamp_millis(),
        base36_suffix(),
        extension
    )
}

fn base36_suffix() -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut value: u64 = rand::thread_rng().gen();
    let mut suffix = String::new();
    loop {
        suffix.insert(0, DIGITS[(value % 36) as usize] as char);
        value /= 36;
        if value == 0 {
            break;
        }
    }
    suffix
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // Smallest valid GIF header; enough for `infer` to classify it.
    const GIF_BYTES: &[u8] = b"GIF89a\x01\x00\x01\x00\x00\x00\x00;";

    #[test]
    fn stores_bytes_and_returns_public_path() {
        let dir = TempDir::new().unwrap();
        let path = store_photo_in(dir.path(), "/uploads/employees", "avatar.gif", GIF_BYTES).unwrap();

        let file_name = path.strip_prefix("/uploads/employees/").unwrap();
        let written = std::fs::read(dir.path().join(file_name)).unwrap();
        assert_eq!(written, GIF_BYTES);
    }

    #[test]
    fn creates_missing_directories_recursively() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("public/uploads/employees");
        store_photo_in(&nested, "/uploads/employees", "avatar.png", b"png-bytes").unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn file_name_keeps_extension_and_base36_suffix() {
        let name = unique_file_name("portrait.JPG");
        assert!(name.ends_with(".JPG"));

        let stem = name.strip_suffix(".JPG").unwrap();
        let (timestamp, suffix) = stem.split_once('-').unwrap();
        assert!(timestamp.chars().all(|c| c.is_ascii_digit()));
        assert!(!suffix.is_empty());
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn extension_is_optional() {
        let name = unique_file_name("photo");
        assert!(!name.contains('.'));
    }

    #[test]
    fn sniffs_image_types() {
        assert!(is_supported_image(GIF_BYTES));
        assert!(is_supported_image(&[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 0]));
        assert!(!is_supported_image(b"plain text"));
    }
}
