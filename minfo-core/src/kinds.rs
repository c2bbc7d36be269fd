//! Stream and info kinds understood by the engine.
//!
//! Both enumerations cross the native boundary as their discriminant. The
//! discriminants mirror `MediaInfo_stream_C` and `MediaInfo_info_C` in the
//! engine's C header and are a fixed external contract: never reorder
//! variants, never insert one in the middle, only append after the last
//! value and give it the engine's number explicitly.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::CoreError;

/// Logical track category within a media source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(u32)]
pub enum StreamKind {
    General = 0,
    Video = 1,
    Audio = 2,
    Text = 3,
    Other = 4,
    Image = 5,
    Menu = 6,
}

impl StreamKind {
    /// Every kind, in wire order.
    pub const ALL: [StreamKind; 7] = [
        StreamKind::General,
        StreamKind::Video,
        StreamKind::Audio,
        StreamKind::Text,
        StreamKind::Other,
        StreamKind::Image,
        StreamKind::Menu,
    ];

    /// Value passed to the engine for this kind.
    pub const fn wire(self) -> u32 {
        self as u32
    }

    /// Inverse of [`StreamKind::wire`].
    pub fn from_wire(value: u32) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    /// Name the engine uses for this kind in its reports.
    pub const fn as_str(self) -> &'static str {
        match self {
            StreamKind::General => "General",
            StreamKind::Video => "Video",
            StreamKind::Audio => "Audio",
            StreamKind::Text => "Text",
            StreamKind::Other => "Other",
            StreamKind::Image => "Image",
            StreamKind::Menu => "Menu",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::Config(format!("unknown stream kind '{s}'")))
    }
}

/// Facet of a parameter to retrieve.
///
/// Also used as the search mode of name-based queries, where `Name` means
/// "match the parameter's internal name".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(u32)]
#[allow(non_camel_case_types)]
pub enum InfoKind {
    Name = 0,
    Text = 1,
    Measure = 2,
    Options = 3,
    Name_Text = 4,
    Measure_Text = 5,
    Info = 6,
    HowTo = 7,
    Domain = 8,
}

impl InfoKind {
    /// Every kind, in wire order.
    pub const ALL: [InfoKind; 9] = [
        InfoKind::Name,
        InfoKind::Text,
        InfoKind::Measure,
        InfoKind::Options,
        InfoKind::Name_Text,
        InfoKind::Measure_Text,
        InfoKind::Info,
        InfoKind::HowTo,
        InfoKind::Domain,
    ];

    pub const fn wire(self) -> u32 {
        self as u32
    }

    pub fn from_wire(value: u32) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            InfoKind::Name => "Name",
            InfoKind::Text => "Text",
            InfoKind::Measure => "Measure",
            InfoKind::Options => "Options",
            InfoKind::Name_Text => "Name_Text",
            InfoKind::Measure_Text => "Measure_Text",
            InfoKind::Info => "Info",
            InfoKind::HowTo => "HowTo",
            InfoKind::Domain => "Domain",
        }
    }
}

impl fmt::Display for InfoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InfoKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept "name-text" and "name_text" alike on the command line.
        let normalized = s.replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| CoreError::Config(format!("unknown info kind '{s}'")))
    }
}
