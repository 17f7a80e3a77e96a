use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

const UPLOAD_PREFIX: &str = "excelFile-";

/// An uploaded spreadsheet spooled to disk for the duration of one request.
///
/// The file is removed when the value is dropped, whichever way the request
/// ends.
#[derive(Debug)]
pub struct TempUpload {
    file: NamedTempFile,
    original_name: String,
    size: u64,
}

impl TempUpload {
    pub fn create(dir: &Path, original_name: &str, contents: &[u8]) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;

        let extension = Path::new(original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_lowercase()))
            .unwrap_or_default();

        let mut file = tempfile::Builder::new()
            .prefix(UPLOAD_PREFIX)
            .suffix(&extension)
            .tempfile_in(dir)?;
        file.write_all(contents)?;
        file.flush()?;

        tracing::debug!(
            "Spooled upload {} ({} bytes) to {}",
            original_name,
            contents.len(),
            file.path().display()
        );

        Ok(Self {
            file,
            original_name: original_name.to_string(),
            size: contents.len() as u64,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Name of the spooled file on disk.
    pub fn file_name(&self) -> String {
        self.path()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Deletes the file now, surfacing any error instead of ignoring it on drop.
    pub fn release(self) -> std::io::Result<()> {
        let path = self.path().to_path_buf();
        self.file.close()?;
        tracing::debug!("Released upload {}", path.display());
        Ok(())
    }
}
