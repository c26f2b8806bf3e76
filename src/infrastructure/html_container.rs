use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::application::display::{DisplayContainer, PageView};
use crate::domain::errors::{StorefrontError, StorefrontResult};
use crate::infrastructure::page_renderer::PageRenderer;

/// Display container backed by an HTML file.
///
/// Each replace renders a complete document and swaps it in with a rename,
/// so a reader never sees a half-written page.
pub struct HtmlFileContainer {
    path: PathBuf,
    renderer: PageRenderer,
}

impl HtmlFileContainer {
    pub fn new(path: impl Into<PathBuf>, renderer: PageRenderer) -> Self {
        Self {
            path: path.into(),
            renderer,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_atomically(&self, contents: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("html.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)
    }
}

impl DisplayContainer for HtmlFileContainer {
    fn replace(&self, view: &PageView) -> StorefrontResult<()> {
        let html = self.renderer.render_document(view);
        self.write_atomically(&html).map_err(|e| {
            StorefrontError::display(format!("{}: {}", self.path.display(), e))
        })?;
        debug!("Wrote {} bytes to {}", html.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::display::EMPTY_MESSAGE;
    use tempfile::TempDir;

    #[test]
    fn replace_overwrites_whole_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("site").join("index.html");
        let container = HtmlFileContainer::new(&path, PageRenderer::new("Deals"));

        container.replace(&PageView::Loading).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("spinner"));

        container.replace(&PageView::Empty).unwrap();
        let html = fs::read_to_string(&path).unwrap();
        assert!(html.contains(EMPTY_MESSAGE));
        assert!(!html.contains("class=\"spinner\""));
        assert!(!dir.path().join("site").join("index.html.tmp").exists());
    }

    #[test]
    fn unwritable_path_is_display_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let container =
            HtmlFileContainer::new(blocker.join("index.html"), PageRenderer::new("Deals"));

        let err = container.replace(&PageView::Empty).unwrap_err();
        assert!(matches!(err, StorefrontError::Display { .. }));
    }
}
