//! Virtual path algebra.
//!
//! [`VfsPath`] is pure data: a list of segments plus an absolute flag, with
//! no backing filesystem. Every operation here is string and segment
//! arithmetic over the separator and never touches the remote service.
//!
//! A few operations deliberately keep simple string semantics:
//!
//! - `starts_with` / `ends_with` are literal prefix/suffix tests on the
//!   rendered strings, not segment-aware containment.
//! - `relativize` takes the character-level difference of the two
//!   normalized strings, so operands that only share a partial segment
//!   split mid-segment.
//! - There is no working directory. Relative paths are made absolute
//!   against the root.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{VfsError, VfsResult};

/// Separator used by every remote namespace.
pub const SEPARATOR: char = '/';

const CURRENT: &str = ".";
const PARENT: &str = "..";

/// Immutable virtual path.
///
/// Equality, ordering and hashing all follow the rendered string form,
/// which is also the key sent to the remote service.
#[derive(Clone)]
pub struct VfsPath {
    segments: Vec<String>,
    absolute: bool,
    separator: char,
    rendered: String,
}

impl VfsPath {
    /// Parse a path string or `scheme://host/path` URI with the `/` separator.
    pub fn parse(s: &str) -> Self {
        Self::parse_with(s, SEPARATOR)
    }

    /// Parse a path string or URI against the given separator.
    ///
    /// Text is a URI only when no separator precedes its `://`. A URI keeps
    /// only its path component, which is always absolute.
    /// Empty segments (`a//b`, trailing separators) are dropped.
    pub fn parse_with(s: &str, separator: char) -> Self {
        if let Some((_, rest)) = s
            .split_once("://")
            .filter(|(scheme, _)| !scheme.contains(separator))
        {
            let path = rest.find(separator).map(|i| &rest[i..]).unwrap_or("");
            return Self::from_parts(split_segments(path, separator), true, separator);
        }
        let absolute = s.starts_with(separator);
        Self::from_parts(split_segments(s, separator), absolute, separator)
    }

    /// The root path for the given separator.
    pub fn root_with(separator: char) -> Self {
        Self::from_parts(Vec::new(), true, separator)
    }

    fn from_parts(segments: Vec<String>, absolute: bool, separator: char) -> Self {
        let mut rendered = String::new();
        if absolute {
            rendered.push(separator);
        }
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                rendered.push(separator);
            }
            rendered.push_str(segment);
        }
        Self {
            segments,
            absolute,
            separator,
            rendered,
        }
    }

    fn sibling(&self, segments: Vec<String>, absolute: bool) -> Self {
        Self::from_parts(segments, absolute, self.separator)
    }

    /// The canonical string form.
    pub fn as_str(&self) -> &str {
        &self.rendered
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// True for the absolute path with no segments.
    pub fn is_root(&self) -> bool {
        self.absolute && self.segments.is_empty()
    }

    /// True for the relative path with no segments.
    pub fn is_empty(&self) -> bool {
        !self.absolute && self.segments.is_empty()
    }

    /// Number of name segments.
    pub fn name_count(&self) -> usize {
        self.segments.len()
    }

    /// Segment strings in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// The namespace root.
    ///
    /// Returned for relative paths too: with no working directory, the root
    /// is the only anchor any path has.
    pub fn root(&self) -> Self {
        Self::root_with(self.separator)
    }

    /// The last segment as a relative path, or `None` for the root and the
    /// empty path.
    pub fn file_name(&self) -> Option<Self> {
        self.segments
            .last()
            .map(|name| self.sibling(vec![name.clone()], false))
    }

    /// Everything but the last segment.
    ///
    /// `None` when fewer than two segments remain, including `/a`.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() < 2 {
            return None;
        }
        let segments = self.segments[..self.segments.len() - 1].to_vec();
        Some(self.sibling(segments, self.absolute))
    }

    /// The name segment at `index` as a relative path.
    pub fn name(&self, index: usize) -> VfsResult<Self> {
        let count = self.name_count();
        if index >= count {
            return Err(VfsError::IndexOutOfRange { index, count });
        }
        Ok(self.sibling(vec![self.segments[index].clone()], false))
    }

    /// Segments `[from, to)` joined as a relative path.
    pub fn subpath(&self, from: usize, to: usize) -> VfsResult<Self> {
        let count = self.name_count();
        if from > count {
            return Err(VfsError::IndexOutOfRange { index: from, count });
        }
        if to > count {
            return Err(VfsError::IndexOutOfRange { index: to, count });
        }
        if from > to {
            return Err(VfsError::invalid_argument(format!(
                "subpath indexes out of order: {from} > {to}"
            )));
        }
        Ok(self.sibling(self.segments[from..to].to_vec(), false))
    }

    /// Literal string-prefix test.
    pub fn starts_with(&self, other: &VfsPath) -> bool {
        self.rendered.starts_with(other.as_str())
    }

    /// Literal string-prefix test.
    pub fn starts_with_str(&self, s: &str) -> bool {
        self.rendered.starts_with(s)
    }

    /// Literal string-suffix test.
    pub fn ends_with(&self, other: &VfsPath) -> bool {
        self.rendered.ends_with(other.as_str())
    }

    /// Literal string-suffix test.
    pub fn ends_with_str(&self, s: &str) -> bool {
        self.rendered.ends_with(s)
    }

    /// Drop `.` segments and let each `..` pop the last output segment.
    ///
    /// A `..` arriving at an empty stack is dropped for absolute paths and
    /// pushed for relative ones, so `../a` stays `../a` while `../..`
    /// collapses to the empty path.
    pub fn normalize(&self) -> Self {
        let mut out: Vec<String> = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match segment.as_str() {
                CURRENT => {}
                PARENT => {
                    if out.pop().is_none() && !self.absolute {
                        out.push(PARENT.to_string());
                    }
                }
                _ => out.push(segment.clone()),
            }
        }
        self.sibling(out, self.absolute)
    }

    /// Resolve `other` against this path.
    ///
    /// An absolute `other` wins outright; otherwise the segments are
    /// appended to ours. The result is always normalized.
    pub fn resolve(&self, other: &VfsPath) -> Self {
        if other.absolute {
            return other.normalize();
        }
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        self.sibling(segments, self.absolute).normalize()
    }

    /// [`resolve`](Self::resolve) a string parsed in this namespace.
    pub fn resolve_str(&self, other: &str) -> Self {
        self.resolve(&Self::parse_with(other, self.separator))
    }

    /// Resolve `other` against this path's parent.
    ///
    /// Falls back to `other` alone when it is absolute or there is no parent.
    pub fn resolve_sibling(&self, other: &VfsPath) -> Self {
        match self.parent() {
            Some(parent) if !other.absolute => parent.resolve(other),
            _ => other.normalize(),
        }
    }

    /// [`resolve_sibling`](Self::resolve_sibling) a string parsed in this namespace.
    pub fn resolve_sibling_str(&self, other: &str) -> Self {
        self.resolve_sibling(&Self::parse_with(other, self.separator))
    }

    /// The relative path by which the longer operand extends the shorter.
    ///
    /// Compares normalized string forms character by character; the result
    /// is whatever follows the first difference, minus a leading separator.
    /// Fails when exactly one operand is absolute.
    pub fn relativize(&self, other: &VfsPath) -> VfsResult<Self> {
        if self.absolute != other.absolute {
            return Err(VfsError::invalid_argument(format!(
                "'{other}' cannot be relativized against '{self}'"
            )));
        }

        let first = self.normalize();
        let second = other.normalize();
        let (shorter, longer) = if second.rendered.len() < first.rendered.len() {
            (second.as_str(), first.as_str())
        } else {
            (first.as_str(), second.as_str())
        };

        let split_at = shorter
            .char_indices()
            .zip(longer.chars())
            .find(|((_, a), b)| a != b)
            .map(|((i, _), _)| i)
            .unwrap_or(shorter.len());

        let rest = &longer[split_at..];
        let rest = rest.strip_prefix(self.separator).unwrap_or(rest);
        Ok(self.sibling(split_segments(rest, self.separator), false))
    }

    /// Anchor a relative path at the root.
    ///
    /// Absolute paths come back unchanged.
    pub fn to_absolute(&self) -> Self {
        if self.absolute {
            return self.clone();
        }
        self.sibling(self.segments.clone(), true).normalize()
    }

    /// Absolute and normalized.
    pub fn to_real_path(&self) -> Self {
        self.to_absolute().normalize()
    }

    /// Iterate over the name segments as single-segment relative paths.
    pub fn iter(&self) -> Names<'_> {
        Names { path: self, pos: 0 }
    }
}

fn split_segments(s: &str, separator: char) -> Vec<String> {
    s.split(separator)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Iterator over a path's names.
#[derive(Debug, Clone)]
pub struct Names<'a> {
    path: &'a VfsPath,
    pos: usize,
}

impl Iterator for Names<'_> {
    type Item = VfsPath;

    fn next(&mut self) -> Option<VfsPath> {
        let segment = self.path.segments.get(self.pos)?;
        self.pos += 1;
        Some(self.path.sibling(vec![segment.clone()], false))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.path.segments.len() - self.pos;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Names<'_> {}

impl<'a> IntoIterator for &'a VfsPath {
    type Item = VfsPath;
    type IntoIter = Names<'a>;

    fn into_iter(self) -> Names<'a> {
        self.iter()
    }
}

impl fmt::Display for VfsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

impl fmt::Debug for VfsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VfsPath").field(&self.rendered).finish()
    }
}

impl PartialEq for VfsPath {
    fn eq(&self, other: &Self) -> bool {
        self.rendered == other.rendered
    }
}

impl Eq for VfsPath {}

impl Hash for VfsPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rendered.hash(state);
    }
}

impl PartialOrd for VfsPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VfsPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rendered.cmp(&other.rendered)
    }
}

impl AsRef<str> for VfsPath {
    fn as_ref(&self) -> &str {
        &self.rendered
    }
}

impl Serialize for VfsPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.rendered)
    }
}

impl<'de> Deserialize<'de> for VfsPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(VfsPath::parse(&s))
    }
}
