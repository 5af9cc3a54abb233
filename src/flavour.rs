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

//! Per-scheme rules for parsing and rendering paths.
//!
//! A [Flavour] turns raw strings into a drive (scheme and authority for URIs,
//! a drive letter or UNC share on Windows), a root, and a list of segments;
//! and renders those back into strings and URIs. Flavours are process-wide
//! statics and are never mutated.
//!
//! Parsing never consults any filesystem or network: everything here is
//! purely lexical.

use std::borrow::Cow;

use globset::{GlobBuilder, GlobMatcher};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::errors::{Error, Result};

/// Characters left unescaped in URIs, besides alphanumerics.
const URI_PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~');

/// On Windows, the drive colon also stays unescaped.
const WINDOWS_URI_PATH: &AsciiSet = &URI_PATH.remove(b':');

/// Windows device names that cannot be used as filenames.
const WINDOWS_RESERVED: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Broad family of syntax for a flavour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Syntax {
    /// Local POSIX paths like `/home/me/data`.
    Posix,
    /// Local Windows paths like `C:\data` or `\\server\share\data`.
    Windows,
    /// URIs like `s3://bucket/key` or `https://host/index.html`.
    Uri,
}

/// How paths are compared for equality, hashing, and ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CaseRule {
    /// Byte-for-byte comparison.
    Sensitive,
    /// Everything is compared case-insensitively.
    Insensitive,
    /// The scheme and authority are case-insensitive; segments are not.
    AuthorityInsensitive,
}

/// A set of rules for parsing and rendering one family of paths.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Flavour {
    name: &'static str,
    syntax: Syntax,
    /// URI schemes accepted by this flavour; empty accepts any scheme.
    schemes: &'static [&'static str],
    case: CaseRule,
}

pub static POSIX: Flavour = Flavour {
    name: "posix",
    syntax: Syntax::Posix,
    schemes: &[],
    case: CaseRule::Sensitive,
};

pub static WINDOWS: Flavour = Flavour {
    name: "windows",
    syntax: Syntax::Windows,
    schemes: &[],
    case: CaseRule::Insensitive,
};

pub static URI: Flavour = Flavour::uri("uri", &[]);

pub static HTTP: Flavour = Flavour::uri("http", &["http", "https"]);

pub static S3: Flavour = Flavour::object_store("s3", &["s3"]);

pub static GCS: Flavour = Flavour::object_store("gcs", &["gs"]);

/// The result of splitting the anchor off one string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitRoot {
    pub drive: String,
    pub root: String,
    /// Everything after the root, not yet split into segments.
    pub rest: String,
}

/// A parsed but not yet interned path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Parsed {
    pub drive: String,
    pub root: String,
    pub segments: Vec<String>,
}

impl Flavour {
    /// A URI flavour, comparing the scheme and authority case-insensitively.
    pub const fn uri(name: &'static str, schemes: &'static [&'static str]) -> Flavour {
        Flavour {
            name,
            syntax: Syntax::Uri,
            schemes,
            case: CaseRule::AuthorityInsensitive,
        }
    }

    /// An object store flavour: URI syntax, bucket names and keys compared exactly.
    pub const fn object_store(name: &'static str, schemes: &'static [&'static str]) -> Flavour {
        Flavour {
            name,
            syntax: Syntax::Uri,
            schemes,
            case: CaseRule::Sensitive,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn syntax(&self) -> Syntax {
        self.syntax
    }

    pub fn schemes(&self) -> &'static [&'static str] {
        self.schemes
    }

    pub fn case_rule(&self) -> CaseRule {
        self.case
    }

    pub fn sep(&self) -> char {
        match self.syntax {
            Syntax::Windows => '\\',
            Syntax::Posix | Syntax::Uri => '/',
        }
    }

    pub fn altsep(&self) -> Option<char> {
        match self.syntax {
            Syntax::Windows => Some('/'),
            Syntax::Posix | Syntax::Uri => None,
        }
    }

    /// True if the flavour accepts the given (lowercase) scheme.
    pub fn accepts_scheme(&self, scheme: &str) -> bool {
        self.schemes.is_empty() || self.schemes.contains(&scheme)
    }

    /// Split one string into drive, root, and the remainder.
    ///
    /// Fails if the string has a URI scheme this flavour does not accept.
    pub fn splitroot(&self, raw: &str) -> Result<SplitRoot> {
        match self.syntax {
            Syntax::Posix => Ok(split_posix(raw)),
            Syntax::Windows => Ok(split_windows(&raw.replace('/', "\\"))),
            Syntax::Uri => self.split_uri(raw),
        }
    }

    fn split_uri(&self, raw: &str) -> Result<SplitRoot> {
        let (scheme, rest) = match raw.find(':') {
            Some(i) if is_scheme(&raw[..i]) => (raw[..i].to_ascii_lowercase(), &raw[i + 1..]),
            _ => (String::new(), raw),
        };
        let (mut authority, mut path): (&str, Cow<str>) = match rest.strip_prefix("//") {
            Some(after) => match after.find('/') {
                Some(j) => (&after[..j], Cow::Borrowed(&after[j..])),
                None => (after, Cow::Borrowed("")),
            },
            None => ("", Cow::Borrowed(rest)),
        };
        if scheme.is_empty() && !authority.is_empty() {
            // A protocol-relative `//host/path` is just a rooted path here.
            path = Cow::Owned(
                format!("/{authority}/{path}")
                    .trim_end_matches('/')
                    .to_owned(),
            );
            authority = "";
        }
        if !scheme.is_empty() && !self.accepts_scheme(&scheme) {
            return Err(Error::invalid_argument(
                raw,
                format!(
                    "{} paths accept only {} schemes, not {scheme:?}",
                    self.name,
                    self.schemes.join("/")
                ),
            ));
        }
        let drive = if scheme.is_empty() {
            String::new()
        } else {
            format!("{scheme}://{authority}")
        };
        let stripped = path.trim_start_matches('/');
        let root = if !drive.is_empty() || stripped.len() != path.len() {
            "/"
        } else {
            ""
        };
        Ok(SplitRoot {
            drive,
            root: root.to_owned(),
            rest: stripped.to_owned(),
        })
    }

    /// Parse a sequence of strings into one path.
    ///
    /// Each argument that carries its own root replaces everything before it,
    /// except that a root-only argument keeps the drive accumulated so far,
    /// and a drive-relative argument on the same drive appends.
    /// Empty and `.` segments are dropped; `..` is kept literally.
    pub fn parse_parts<S: AsRef<str>>(&self, args: &[S]) -> Result<Parsed> {
        let mut parsed = Parsed::default();
        let sep = self.sep();
        for arg in args {
            let split = self.splitroot(arg.as_ref())?;
            // `c:b` after `c:/a` continues from `c:/a`.
            let continues_drive = split.root.is_empty()
                && !split.drive.is_empty()
                && self.casefold_drive(&split.drive) == self.casefold_drive(&parsed.drive);
            if !continues_drive && (!split.drive.is_empty() || !split.root.is_empty()) {
                if !split.drive.is_empty() {
                    parsed.drive = split.drive;
                }
                parsed.root = split.root;
                parsed.segments.clear();
            }
            let rest = match self.altsep() {
                Some(alt) => split.rest.replace(alt, &sep.to_string()),
                None => split.rest,
            };
            parsed.segments.extend(
                rest.split(sep)
                    .filter(|s| !s.is_empty() && *s != ".")
                    .map(str::to_owned),
            );
        }
        Ok(parsed)
    }

    /// Fold the drive for comparison.
    pub fn casefold_drive<'a>(&self, drive: &'a str) -> Cow<'a, str> {
        match self.case {
            CaseRule::Sensitive => Cow::Borrowed(drive),
            CaseRule::Insensitive | CaseRule::AuthorityInsensitive => {
                Cow::Owned(drive.to_lowercase())
            }
        }
    }

    /// Fold one segment for comparison.
    pub fn casefold_segment<'a>(&self, segment: &'a str) -> Cow<'a, str> {
        match self.case {
            CaseRule::Insensitive => Cow::Owned(segment.to_lowercase()),
            CaseRule::Sensitive | CaseRule::AuthorityInsensitive => Cow::Borrowed(segment),
        }
    }

    /// Compile a glob pattern for one segment.
    ///
    /// `*`, `?`, and `[...]` have their usual meanings, and never match the
    /// separator.
    pub fn compile_pattern(&self, pattern: &str) -> Result<GlobMatcher> {
        GlobBuilder::new(pattern)
            .case_insensitive(self.case == CaseRule::Insensitive)
            .literal_separator(true)
            .backslash_escape(self.syntax != Syntax::Windows)
            .build()
            .map(|glob| glob.compile_matcher())
            .map_err(|err| Error::invalid_argument(pattern, err.to_string()))
    }

    /// True if a path with this drive and root is absolute.
    pub fn is_absolute(&self, drive: &str, root: &str) -> bool {
        match self.syntax {
            Syntax::Posix => !root.is_empty(),
            Syntax::Windows | Syntax::Uri => !drive.is_empty() && !root.is_empty(),
        }
    }

    /// True if the path names a reserved Windows device.
    pub fn is_reserved(&self, drive: &str, segments: &[String]) -> bool {
        if self.syntax != Syntax::Windows || drive.starts_with("\\\\") {
            return false;
        }
        let Some(last) = segments.last() else {
            return false;
        };
        let base = last.split('.').next().unwrap_or_default();
        let base = base.split(':').next().unwrap_or_default().trim_end_matches(' ');
        WINDOWS_RESERVED.contains(&base.to_uppercase().as_str())
    }

    /// Render parsed components back into a string in this flavour's syntax.
    pub fn render(&self, drive: &str, root: &str, segments: &[String]) -> String {
        let joined = segments.join(&self.sep().to_string());
        if drive.is_empty() && root.is_empty() && joined.is_empty() {
            ".".to_owned()
        } else {
            format!("{drive}{root}{joined}")
        }
    }

    /// Render as a percent-encoded URI. The path must already be known to be absolute.
    pub fn make_uri(&self, drive: &str, root: &str, segments: &[String]) -> String {
        let joined = segments.join("/");
        match self.syntax {
            Syntax::Uri => format!("{drive}{root}{}", utf8_percent_encode(&joined, URI_PATH)),
            Syntax::Posix => format!(
                "file://{}",
                utf8_percent_encode(&format!("{root}{joined}"), URI_PATH)
            ),
            Syntax::Windows => {
                if drive.len() == 2 && drive.ends_with(':') {
                    format!(
                        "file:///{drive}/{}",
                        utf8_percent_encode(&joined, WINDOWS_URI_PATH)
                    )
                } else {
                    let share = drive.replace('\\', "/");
                    format!(
                        "file:{}/{}",
                        utf8_percent_encode(&share, WINDOWS_URI_PATH),
                        utf8_percent_encode(&joined, WINDOWS_URI_PATH)
                    )
                }
            }
        }
    }
}

/// True if `s` can be a URI scheme.
///
/// Single letters are rejected so that Windows drives like `c:/data` are not
/// mistaken for URIs.
fn is_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    s.len() >= 2
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn split_posix(raw: &str) -> SplitRoot {
    let stripped = raw.trim_start_matches('/');
    SplitRoot {
        drive: String::new(),
        root: if stripped.len() != raw.len() { "/" } else { "" }.to_owned(),
        rest: stripped.to_owned(),
    }
}

/// Split a Windows path in which `/` has already been replaced by `\`.
fn split_windows(part: &str) -> SplitRoot {
    let bytes = part.as_bytes();
    if bytes.len() > 2 && bytes[0] == b'\\' && bytes[1] == b'\\' && bytes[2] != b'\\' {
        // UNC path: `\\server\share\rest`.
        if let Some(index) = part[2..].find('\\').map(|i| i + 2) {
            let index2 = part[index + 1..].find('\\').map(|i| i + index + 1);
            if index2 != Some(index + 1) {
                let index2 = index2.unwrap_or(part.len());
                return SplitRoot {
                    drive: part[..index2].to_owned(),
                    root: "\\".to_owned(),
                    rest: part.get(index2 + 1..).unwrap_or_default().to_owned(),
                };
            }
        }
    }
    let (drive, rest) = if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic()
    {
        (&part[..2], &part[2..])
    } else {
        ("", part)
    };
    let stripped = rest.trim_start_matches('\\');
    SplitRoot {
        drive: drive.to_owned(),
        root: if stripped.len() != rest.len() { "\\" } else { "" }.to_owned(),
        rest: stripped.to_owned(),
    }
}
