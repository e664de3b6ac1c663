//! Prompt-template store.
//!
//! The core never parses or validates instruction content, it only
//! substitutes into it. A missing core template fails closed: a silently
//! different prompt would make results incomparable across sessions.

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::errors::TemplateError;

/// File name of the core instruction template.
pub const CORE_TEMPLATE_FILE: &str = "core_prompt.txt";
/// File name of the user-editable additional-instructions fragment.
pub const ADDITIONAL_TEMPLATE_FILE: &str = "additional_prompt.txt";

/// Read/write access to the two instruction templates.
pub trait TemplateStore {
    /// The core template. Missing/unreadable is an error (fail closed).
    fn core_template(&self) -> Result<String, TemplateError>;

    /// The additional-instructions fragment. Missing means "no additional
    /// instructions", not an error.
    fn additional_instructions(&self) -> Result<String, TemplateError>;

    /// Replaces the additional-instructions fragment.
    fn set_additional_instructions(&self, text: &str) -> Result<(), TemplateError>;
}

/// Filesystem-backed template store rooted at one directory.
#[derive(Debug, Clone)]
pub struct FsTemplateStore {
    dir: PathBuf,
}

impl FsTemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl TemplateStore for FsTemplateStore {
    fn core_template(&self) -> Result<String, TemplateError> {
        let path = self.dir.join(CORE_TEMPLATE_FILE);
        match fs::read_to_string(&path) {
            Ok(s) => Ok(s),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(TemplateError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(TemplateError::Io(e)),
        }
    }

    fn additional_instructions(&self) -> Result<String, TemplateError> {
        let path = self.dir.join(ADDITIONAL_TEMPLATE_FILE);
        match fs::read_to_string(&path) {
            Ok(s) => Ok(s),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(TemplateError::Io(e)),
        }
    }

    fn set_additional_instructions(&self, text: &str) -> Result<(), TemplateError> {
        let path = self.dir.join(ADDITIONAL_TEMPLATE_FILE);
        debug!(path = %path.display(), len = text.len(), "updating additional instructions");
        fs::write(&path, text)?;
        Ok(())
    }
}
