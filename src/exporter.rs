//! Report buffers handed across the C ABI.
//!
//! The pointer returned by an export stays valid until the next export. At
//! that point the buffer is dropped and the new one takes its slot, so at
//! most one buffer is alive at any time.

use crate::model::UsageSnapshot;
use std::ffi::{c_char, CStr, CString};
use std::fmt::{self, Write};
use std::ptr;

/// Owned, NUL-terminated report text.
#[derive(Debug)]
pub struct ExportedBuffer {
    text: CString,
}

/// Counts the bytes a `Display` value renders to without allocating.
struct RenderedLen(usize);

impl Write for RenderedLen {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0 += s.len();
        Ok(())
    }
}

impl ExportedBuffer {
    /// Renders `value` into storage reserved up front (text plus NUL), so
    /// running out of memory is reported here rather than aborting.
    fn try_render(value: &dyn fmt::Display) -> Option<Self> {
        let mut len = RenderedLen(0);
        write!(len, "{value}").ok()?;

        let mut text = String::new();
        text.try_reserve_exact(len.0 + 1).ok()?;
        write!(text, "{value}").ok()?;
        CString::new(text).ok().map(|text| Self { text })
    }

    pub fn as_ptr(&self) -> *const c_char {
        self.text.as_ptr()
    }

    pub fn as_c_str(&self) -> &CStr {
        &self.text
    }
}

#[derive(Debug, Default)]
pub struct SnapshotExporter {
    previous: Option<ExportedBuffer>,
    exported: u64,
    released: u64,
}

impl SnapshotExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn export(&mut self, snapshot: &UsageSnapshot) -> *const c_char {
        self.store(snapshot)
    }

    /// Exports arbitrary text through the same slot as snapshots.
    pub fn publish(&mut self, text: &str) -> *const c_char {
        self.store(&text)
    }

    /// Replaces the previously exported buffer. If the new buffer cannot be
    /// built, the previous one is kept and its pointer returned.
    fn store(&mut self, value: &dyn fmt::Display) -> *const c_char {
        let Some(buffer) = ExportedBuffer::try_render(value) else {
            log::error!("failed to allocate export buffer");
            return self.last_ptr();
        };

        if self.previous.replace(buffer).is_some() {
            self.released += 1;
        }
        self.exported += 1;
        self.last_ptr()
    }

    pub fn last_ptr(&self) -> *const c_char {
        self.previous
            .as_ref()
            .map_or(ptr::null(), ExportedBuffer::as_ptr)
    }

    pub fn last_text(&self) -> Option<&str> {
        self.previous.as_ref().and_then(|b| b.as_c_str().to_str().ok())
    }

    pub fn live_buffers(&self) -> usize {
        usize::from(self.previous.is_some())
    }

    pub fn exported(&self) -> u64 {
        self.exported
    }

    pub fn released(&self) -> u64 {
        self.released
    }
}
