//! File store description.
//!
//! The content service reports no capacity, so every space query answers
//! `u64::MAX`.

use serde::Serialize;
use std::str::FromStr;

use crate::filesystem::Identity;
use crate::types::AttributeView;

/// The single store behind one remote filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStore {
    name: String,
    type_name: String,
}

impl FileStore {
    pub fn new(identity: &Identity) -> Self {
        Self {
            name: identity.to_string(),
            type_name: identity.scheme().to_string(),
        }
    }

    /// `"<scheme>://<host>"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The URI scheme.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn is_read_only(&self) -> bool {
        false
    }

    pub fn total_space(&self) -> u64 {
        u64::MAX
    }

    pub fn usable_space(&self) -> u64 {
        u64::MAX
    }

    pub fn unallocated_space(&self) -> u64 {
        u64::MAX
    }

    pub fn supports_attribute_view(&self, view: AttributeView) -> bool {
        matches!(view, AttributeView::Basic)
    }

    /// Same as [`supports_attribute_view`](Self::supports_attribute_view) for
    /// a view name such as `"basic"`.
    pub fn supports_attribute_view_name(&self, name: &str) -> bool {
        AttributeView::from_str(name).is_ok_and(|view| self.supports_attribute_view(view))
    }
}
