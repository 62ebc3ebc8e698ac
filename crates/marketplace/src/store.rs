use std::path::PathBuf;

use tracing::debug;

use crate::{
    error::{Context, Error, Result},
    types::MarketplaceDescriptor,
};

/// Reads and writes one descriptor file.
pub struct DescriptorStore {
    path: PathBuf,
}

impl DescriptorStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the descriptor. Absence is [`Error::MissingInput`]; unparseable
    /// content is [`Error::MalformedInput`].
    pub fn load(&self) -> Result<MarketplaceDescriptor> {
        if !self.exists() {
            return Err(Error::missing_input("marketplace descriptor", vec![
                self.path.clone(),
            ]));
        }
        let data = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let descriptor: MarketplaceDescriptor = serde_json::from_str(&data)
            .map_err(|e| Error::malformed(self.path.display().to_string(), vec![e.to_string()]))?;
        debug!(
            path = %self.path.display(),
            plugins = descriptor.plugins.len(),
            "descriptor loaded"
        );
        Ok(descriptor)
    }

    /// Replace the file atomically via temp file + rename.
    pub fn save(&self, descriptor: &MarketplaceDescriptor) -> Result<()> {
        let data = render(descriptor)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::write_failure(parent, e))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, data).map_err(|e| Error::write_failure(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| Error::write_failure(&self.path, e))?;
        debug!(path = %self.path.display(), "descriptor written");
        Ok(())
    }
}

/// Persisted form: two-space indentation, declaration-order keys, one
/// trailing newline.
pub fn render(descriptor: &MarketplaceDescriptor) -> Result<String> {
    let mut data = serde_json::to_string_pretty(descriptor)?;
    data.push('\n');
    Ok(data)
}
