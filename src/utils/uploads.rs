use std::path::{Path, PathBuf};

pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "jpeg", "jpg", "png", "pdf", "mp4", "mov", "avi", "mkv", "mp3", "doc", "docx", "ppt", "pptx",
];

/// Resolves the upload directory against the working dir and creates it.
pub fn ensure_uploads_dir(dir: &str) -> std::io::Result<PathBuf> {
    let path = Path::new(dir);
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

/// Lowercased extension of `filename` if it is on the allow-list.
pub fn allowed_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// `<unix millis>-<random>.<ext>`
pub fn unique_filename(ext: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let salt: u32 = rand::random_range(0..1_000_000_000);
    format!("{millis}-{salt}.{ext}")
}
