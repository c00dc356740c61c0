//! Clipboard access

use crate::AppError;
use parking_lot::Mutex;

/// Text clipboard used by the copy actions
pub trait Clipboard: Send + Sync {
    fn set_text(&self, text: &str) -> Result<(), AppError>;
}

/// System clipboard via arboard. Opened lazily so headless sessions only
/// fail when something is actually copied.
#[cfg(feature = "clipboard")]
pub struct SystemClipboard {
    inner: Mutex<Option<arboard::Clipboard>>,
}

#[cfg(feature = "clipboard")]
impl SystemClipboard {
    pub fn new() -> Self {
        Self { inner: Mutex::new(None) }
    }
}

#[cfg(feature = "clipboard")]
impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "clipboard")]
impl Clipboard for SystemClipboard {
    fn set_text(&self, text: &str) -> Result<(), AppError> {
        let mut guard = self.inner.lock();
        if guard.is_none() {
            *guard = Some(arboard::Clipboard::new().map_err(|e| AppError::Clipboard(e.to_string()))?);
        }
        if let Some(clipboard) = guard.as_mut() {
            clipboard
                .set_text(text.to_owned())
                .map_err(|e| AppError::Clipboard(e.to_string()))?;
        }

        tracing::debug!("Copied {} bytes to clipboard", text.len());
        Ok(())
    }
}

/// Process-local clipboard, used without the `clipboard` feature and in tests
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn set_text(&self, text: &str) -> Result<(), AppError> {
        *self.contents.lock() = Some(text.to_string());
        Ok(())
    }
}

impl<C: Clipboard + ?Sized> Clipboard for std::sync::Arc<C> {
    fn set_text(&self, text: &str) -> Result<(), AppError> {
        (**self).set_text(text)
    }
}

/// Default clipboard for this build
pub fn default_clipboard() -> Box<dyn Clipboard> {
    #[cfg(feature = "clipboard")]
    {
        Box::new(SystemClipboard::new())
    }
    #[cfg(not(feature = "clipboard"))]
    {
        Box::new(MemoryClipboard::new())
    }
}
