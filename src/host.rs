//! File-backed [`EditorSurface`]: a pack file read as UTF-8 text and written back
//! with the same bytes when nothing changed.

use crate::session::EditorSurface;
use crate::value::LineEnding;
use anyhow::Context;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// A pack file held in memory, keeping its original bytes so an unmodified file
/// is written back byte for byte.
#[derive(Debug, Clone)]
pub struct TextFile {
    pub source_path: Option<PathBuf>,
    pub line_ending: LineEnding,
    original_bytes: Vec<u8>,
    text: String,
    dirty: bool,
}

impl TextFile {
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            source_path: None,
            line_ending: LineEnding::detect(text.as_bytes()),
            original_bytes: text.as_bytes().to_vec(),
            text,
            dirty: false,
        }
    }

    pub fn load_path(path: &Path) -> anyhow::Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("reading {path:?}"))?;
        let text = String::from_utf8(bytes.clone()).context("pack file is not valid UTF-8")?;
        log::info!("opened {path:?} ({} bytes)", text.len());

        Ok(Self {
            source_path: Some(path.to_path_buf()),
            line_ending: LineEnding::detect(text.as_bytes()),
            original_bytes: bytes,
            text,
            dirty: false,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn save_to_path(&mut self, path: &Path) -> anyhow::Result<()> {
        let bytes = self.to_bytes();
        fs::write(path, &bytes).with_context(|| format!("writing {path:?}"))?;
        log::info!("saved {path:?} ({} bytes)", bytes.len());

        self.source_path = Some(path.to_path_buf());
        self.original_bytes = bytes;
        self.dirty = false;
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        if self.dirty {
            self.text.as_bytes().to_vec()
        } else {
            self.original_bytes.clone()
        }
    }
}

impl EditorSurface for TextFile {
    fn current_text(&self) -> String {
        self.text.clone()
    }

    fn set_current_text(&mut self, text: String) {
        if text != self.text {
            self.text = text;
            self.line_ending = LineEnding::detect(self.text.as_bytes());
            self.dirty = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TextFile;
    use crate::session::EditorSurface;
    use crate::value::LineEnding;

    #[test]
    fn setting_identical_text_keeps_file_clean() {
        let mut file = TextFile::from_text("{\r\n}\r\n");
        assert_eq!(file.line_ending, LineEnding::CrLf);
        file.set_current_text("{\r\n}\r\n".to_string());
        assert!(!file.is_dirty());
        file.set_current_text("{}\n".to_string());
        assert!(file.is_dirty());
        assert_eq!(file.line_ending, LineEnding::Lf);
        assert_eq!(file.to_bytes(), b"{}\n");
    }

    #[test]
    fn load_rejects_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, [0xFF_u8, 0xFE, 0x00]).unwrap();
        assert!(TextFile::load_path(&path).is_err());
    }
}
