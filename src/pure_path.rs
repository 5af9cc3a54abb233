// Copyright 2025 Martin Pool.

// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

//! Immutable path values, with no access to any filesystem.
//!
//! A [PurePath] is a drive (for URIs, the scheme and authority), a root
//! (empty or the separator), and a list of segments. Segments are never
//! empty, never `.`, and never contain the separator; `..` is kept literally
//! until [PurePath::resolve] is called.
//!
//! Equality, hashing, and ordering use the flavour's case folding. Paths of
//! different kinds are never equal and have no relative order.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Div;

use crate::errors::{Error, ErrorKind, Result};
use crate::flavour::{Flavour, Parsed};
use crate::scheme::{self, PathKind};

/// A path of some kind, supporting only lexical operations.
#[derive(Clone)]
pub struct PurePath {
    kind: PathKind,
    drive: String,
    root: String,
    segments: Vec<String>,
    /// The rendered string form.
    text: String,
}

impl PurePath {
    /// Make a path from one or more strings, choosing its kind from the
    /// registered schemes.
    ///
    /// Later arguments that are themselves absolute replace everything before
    /// them.
    pub fn new<S: AsRef<str>>(args: &[S]) -> Result<PurePath> {
        let (kind, parsed) = scheme::dispatch_pure(args)?;
        Ok(PurePath::from_parsed(kind, parsed))
    }

    /// Parse one string, choosing its kind from the registered schemes.
    pub fn parse(s: &str) -> Result<PurePath> {
        PurePath::new(&[s])
    }

    /// Make a path of a specific kind.
    ///
    /// Fails if any argument has a URI scheme that kind doesn't accept.
    pub fn of_kind<S: AsRef<str>>(kind: PathKind, args: &[S]) -> Result<PurePath> {
        let parsed = kind.flavour().parse_parts(args)?;
        Ok(PurePath::from_parsed(kind, parsed))
    }

    pub fn posix(s: &str) -> Result<PurePath> {
        PurePath::of_kind(PathKind::POSIX, &[s])
    }

    pub fn windows(s: &str) -> Result<PurePath> {
        PurePath::of_kind(PathKind::WINDOWS, &[s])
    }

    pub fn http(s: &str) -> Result<PurePath> {
        PurePath::of_kind(PathKind::Http, &[s])
    }

    pub fn uri(s: &str) -> Result<PurePath> {
        PurePath::of_kind(PathKind::Uri, &[s])
    }

    pub fn s3(s: &str) -> Result<PurePath> {
        PurePath::of_kind(PathKind::S3, &[s])
    }

    pub fn gcs(s: &str) -> Result<PurePath> {
        PurePath::of_kind(PathKind::GCS, &[s])
    }

    pub(crate) fn from_parsed(kind: PathKind, parsed: Parsed) -> PurePath {
        let Parsed {
            drive,
            root,
            segments,
        } = parsed;
        let text = render(kind.flavour(), &drive, &root, &segments);
        PurePath {
            kind,
            drive,
            root,
            segments,
            text,
        }
    }

    /// A sibling value of the same kind and anchor with different segments.
    fn with_segments(&self, segments: Vec<String>) -> PurePath {
        PurePath::from_parsed(
            self.kind,
            Parsed {
                drive: self.drive.clone(),
                root: self.root.clone(),
                segments,
            },
        )
    }

    /// Append one already-split segment without re-parsing it, so that names
    /// that look like schemes or drives stay literal.
    pub(crate) fn child(&self, name: &str) -> PurePath {
        let mut segments = self.segments.clone();
        segments.push(name.to_owned());
        self.with_segments(segments)
    }

    pub fn kind(&self) -> PathKind {
        self.kind
    }

    pub fn flavour(&self) -> &'static Flavour {
        self.kind.flavour()
    }

    /// The scheme and authority of a URI, or the drive of a Windows path.
    pub fn drive(&self) -> &str {
        &self.drive
    }

    /// Either empty or the separator.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// The drive and root together.
    pub fn anchor(&self) -> String {
        format!("{}{}", self.drive, self.root)
    }

    /// The segments after the anchor.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The anchor (if any) followed by the segments.
    pub fn parts(&self) -> Vec<String> {
        let mut parts = Vec::with_capacity(self.segments.len() + 1);
        if !self.drive.is_empty() || !self.root.is_empty() {
            parts.push(self.anchor());
        }
        parts.extend(self.segments.iter().cloned());
        parts
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The string form with forward slashes.
    pub fn as_posix(&self) -> String {
        let sep = self.flavour().sep();
        if sep == '/' {
            self.text.clone()
        } else {
            self.text.replace(sep, "/")
        }
    }

    /// The percent-encoded URI form; fails if the path is relative.
    pub fn as_uri(&self) -> Result<String> {
        if !self.is_absolute() {
            return Err(Error::invalid_argument(
                &self.text,
                "relative path can't be expressed as a URI",
            ));
        }
        Ok(self
            .flavour()
            .make_uri(&self.drive, &self.root, &self.segments))
    }

    pub fn is_absolute(&self) -> bool {
        self.flavour().is_absolute(&self.drive, &self.root)
    }

    pub fn is_reserved(&self) -> bool {
        self.flavour().is_reserved(&self.drive, &self.segments)
    }

    /// The final segment, or empty if there are no segments.
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// The final `.`-separated suffix of the name, including the dot.
    ///
    /// Names that start with a dot and have no other dot, like `.hgrc`, have
    /// no suffix.
    pub fn suffix(&self) -> &str {
        let name = self.name();
        match name.rfind('.') {
            Some(i) if 0 < i && i < name.len() - 1 => &name[i..],
            _ => "",
        }
    }

    /// All the suffixes of the name.
    pub fn suffixes(&self) -> Vec<String> {
        let name = self.name();
        if name.ends_with('.') {
            return Vec::new();
        }
        name.trim_start_matches('.')
            .split('.')
            .skip(1)
            .map(|s| format!(".{s}"))
            .collect()
    }

    /// The name without its final suffix.
    pub fn stem(&self) -> &str {
        let name = self.name();
        match name.rfind('.') {
            Some(i) if 0 < i && i < name.len() - 1 => &name[..i],
            _ => name,
        }
    }

    /// The path without its final segment.
    ///
    /// The parent of an anchor alone, or of the empty relative path, is itself.
    pub fn parent(&self) -> PurePath {
        match self.segments.split_last() {
            Some((_, init)) => self.with_segments(init.to_vec()),
            None => self.clone(),
        }
    }

    /// All the ancestors of this path, nearest first.
    pub fn parents(&self) -> Parents {
        Parents {
            path: self.clone(),
            front: 0,
            back: self.segments.len(),
        }
    }

    /// Append more arguments to this path.
    ///
    /// This is the same as making a new path from this path's string form
    /// followed by the arguments, so an absolute argument replaces this path.
    pub fn join<S: AsRef<str>>(&self, args: &[S]) -> Result<PurePath> {
        let mut all: Vec<&str> = Vec::with_capacity(args.len() + 1);
        all.push(&self.text);
        all.extend(args.iter().map(AsRef::as_ref));
        PurePath::of_kind(self.kind, &all)
    }

    /// Replace the final segment.
    pub fn with_name(&self, name: &str) -> Result<PurePath> {
        if self.name().is_empty() {
            return Err(Error::invalid_argument(&self.text, "path has an empty name"));
        }
        let flavour = self.flavour();
        let invalid = || Error::invalid_argument(name, "invalid name");
        if name.is_empty()
            || name.ends_with(flavour.sep())
            || flavour.altsep().is_some_and(|alt| name.ends_with(alt))
        {
            return Err(invalid());
        }
        let parsed = flavour.parse_parts(&[name]).map_err(|_| invalid())?;
        if !parsed.drive.is_empty() || !parsed.root.is_empty() || parsed.segments.len() != 1 {
            return Err(invalid());
        }
        let mut segments = self.segments.clone();
        if let Some(last) = segments.last_mut() {
            *last = name.to_owned();
        }
        Ok(self.with_segments(segments))
    }

    /// Replace the stem, keeping the suffix.
    pub fn with_stem(&self, stem: &str) -> Result<PurePath> {
        self.with_name(&format!("{stem}{}", self.suffix()))
    }

    /// Replace the final suffix, or add one if there is none.
    ///
    /// An empty suffix removes the existing suffix.
    pub fn with_suffix(&self, suffix: &str) -> Result<PurePath> {
        let flavour = self.flavour();
        if suffix.contains(flavour.sep()) || flavour.altsep().is_some_and(|a| suffix.contains(a))
        {
            return Err(Error::invalid_argument(suffix, "invalid suffix"));
        }
        if !suffix.is_empty() && (!suffix.starts_with('.') || suffix == ".") {
            return Err(Error::invalid_argument(suffix, "invalid suffix"));
        }
        let name = self.name();
        if name.is_empty() {
            return Err(Error::invalid_argument(&self.text, "path has an empty name"));
        }
        let old = self.suffix();
        let new_name = format!("{}{suffix}", &name[..name.len() - old.len()]);
        let mut segments = self.segments.clone();
        if let Some(last) = segments.last_mut() {
            *last = new_name;
        }
        Ok(self.with_segments(segments))
    }

    /// True if the path matches a glob pattern.
    ///
    /// Relative patterns match from the right; a pattern with an anchor must
    /// match the whole path. Each segment is matched separately, so `*` never
    /// crosses a separator.
    pub fn matches(&self, pattern: &str) -> Result<bool> {
        let flavour = self.flavour();
        let pat = flavour.parse_parts(&[pattern])?;
        let anchored = !pat.drive.is_empty() || !pat.root.is_empty();
        if !anchored && pat.segments.is_empty() {
            return Err(Error::invalid_argument(pattern, "empty pattern"));
        }
        // An anchored pattern must match the whole anchor.
        if anchored
            && (pat.root != self.root
                || flavour.casefold_drive(&pat.drive) != flavour.casefold_drive(&self.drive))
        {
            return Ok(false);
        }
        if anchored {
            if pat.segments.len() != self.segments.len() {
                return Ok(false);
            }
        } else if pat.segments.len() > self.segments.len() {
            return Ok(false);
        }
        for (segment, pat) in self.segments.iter().rev().zip(pat.segments.iter().rev()) {
            if !flavour.compile_pattern(pat)?.is_match(segment) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// This path expressed relative to `other`.
    ///
    /// Fails unless both have the same anchor and `other`'s segments are a
    /// prefix of this path's.
    pub fn relative_to(&self, other: &str) -> Result<PurePath> {
        let flavour = self.flavour();
        let other = flavour.parse_parts(&[other])?;
        let unrelated = || {
            Error::invalid_argument(
                &self.text,
                format!(
                    "not in the subpath of {:?}",
                    render(flavour, &other.drive, &other.root, &other.segments)
                ),
            )
        };
        if flavour.casefold_drive(&self.drive) != flavour.casefold_drive(&other.drive)
            || self.root != other.root
            || other.segments.len() > self.segments.len()
        {
            return Err(unrelated());
        }
        for (a, b) in self.segments.iter().zip(&other.segments) {
            if flavour.casefold_segment(a) != flavour.casefold_segment(b) {
                return Err(unrelated());
            }
        }
        Ok(PurePath::from_parsed(
            self.kind,
            Parsed {
                drive: String::new(),
                root: String::new(),
                segments: self.segments[other.segments.len()..].to_vec(),
            },
        ))
    }

    pub fn is_relative_to(&self, other: &str) -> bool {
        self.relative_to(other).is_ok()
    }

    /// Lexically remove `..` segments, without consulting any filesystem.
    ///
    /// `..` directly under a root is dropped; in a relative path leading
    /// `..` segments are kept.
    pub fn resolve(&self) -> PurePath {
        let mut out: Vec<String> = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            if segment == ".." {
                if out.last().is_some_and(|last| last != "..") {
                    out.pop();
                } else if self.root.is_empty() {
                    out.push(segment.clone());
                }
            } else {
                out.push(segment.clone());
            }
        }
        self.with_segments(out)
    }

    /// Compare two paths, failing if they are of different kinds.
    pub fn try_cmp(&self, other: &PurePath) -> Result<Ordering> {
        self.partial_cmp(other).ok_or_else(|| Error {
            kind: ErrorKind::KindMismatch,
            path: Some(other.text.clone()),
            source: Some(format!("can't compare {} path with {} path", self.kind, other.kind).into()),
        })
    }

    /// The case-folded form used for comparison.
    fn folded(&self) -> (Cow<'_, str>, &str, Vec<Cow<'_, str>>) {
        let flavour = self.flavour();
        (
            flavour.casefold_drive(&self.drive),
            &self.root,
            self.segments
                .iter()
                .map(|s| flavour.casefold_segment(s))
                .collect(),
        )
    }
}

/// Render parsed components, guarding a relative first segment that would
/// otherwise re-parse as a scheme or drive.
fn render(flavour: &Flavour, drive: &str, root: &str, segments: &[String]) -> String {
    let text = flavour.render(drive, root, segments);
    if drive.is_empty() && root.is_empty() {
        if let Ok(reparsed) = flavour.splitroot(&text) {
            if reparsed.drive.is_empty() && reparsed.root.is_empty() {
                return text;
            }
        }
        return format!(".{}{text}", flavour.sep());
    }
    text
}

impl PartialEq for PurePath {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.folded() == other.folded()
    }
}

impl Eq for PurePath {}

impl Hash for PurePath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.folded().hash(state);
    }
}

impl PartialOrd for PurePath {
    /// Paths are ordered by anchor and then segments; paths of different
    /// kinds are unordered.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.kind != other.kind {
            return None;
        }
        let (a_drive, a_root, a_segments) = self.folded();
        let (b_drive, b_root, b_segments) = other.folded();
        Some(
            (a_drive, a_root)
                .cmp(&(b_drive, b_root))
                .then_with(|| a_segments.cmp(&b_segments)),
        )
    }
}

impl fmt::Display for PurePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl fmt::Debug for PurePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PurePath({}, {:?})", self.kind, self.text)
    }
}

impl AsRef<str> for PurePath {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl<S: AsRef<str>> Div<S> for &PurePath {
    type Output = Result<PurePath>;

    fn div(self, rhs: S) -> Result<PurePath> {
        self.join(&[rhs])
    }
}

/// The ancestors of a path, from nearest to the anchor (or `.`).
#[derive(Clone, Debug)]
pub struct Parents {
    path: PurePath,
    front: usize,
    back: usize,
}

impl Parents {
    /// The ancestor at `index` in the full sequence; negative indexes count
    /// from the far end.
    pub fn get(&self, index: isize) -> Result<PurePath> {
        let len = self.path.segments.len();
        let i = if index < 0 {
            len.checked_sub(index.unsigned_abs())
        } else {
            Some(index.unsigned_abs()).filter(|&i| i < len)
        };
        match i {
            Some(i) => Ok(self.nth_parent(i)),
            None => Err(Error::invalid_argument(
                &self.path.text,
                format!("parent index {index} out of range"),
            )),
        }
    }

    fn nth_parent(&self, i: usize) -> PurePath {
        let len = self.path.segments.len();
        self.path
            .with_segments(self.path.segments[..len - 1 - i].to_vec())
    }
}

impl Iterator for Parents {
    type Item = PurePath;

    fn next(&mut self) -> Option<PurePath> {
        if self.front >= self.back {
            return None;
        }
        let parent = self.nth_parent(self.front);
        self.front += 1;
        Some(parent)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl DoubleEndedIterator for Parents {
    fn next_back(&mut self) -> Option<PurePath> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.nth_parent(self.back))
    }
}

impl ExactSizeIterator for Parents {}
