//! Tag-name tables for the external metadata tool.
//!
//! Each semantic field is duplicated across every namespace convention a
//! downstream consumer might read (OS file properties, web crawlers, asset
//! managers). The tables are pure data, independent of the invocation
//! mechanism.

/// Author / credit. IPTC, XMP Dublin Core, TIFF IFD0, and the Windows
/// Explorer XP tag all carry an author notion.
pub const AUTHOR_TAGS: &[&str] = &[
    "IPTC:Creator",
    "IPTC:Credit",
    "XMP-dc:creator",
    "IFD0:Artist",
    "EXIF:XPAuthor",
];

pub const TITLE_TAGS: &[&str] = &["XMP:Title", "IPTC:ObjectName", "EXIF:XPTitle"];

pub const DESCRIPTION_TAGS: &[&str] = &[
    "XMP-dc:description",
    "XMP:Description",
    "IPTC:Caption-Abstract",
    "EXIF:XPComment",
];

pub const ALT_TEXT_TAGS: &[&str] = &["XMP:AltTextAccessibility"];

pub const COPYRIGHT_TAGS: &[&str] = &["IPTC:CopyrightNotice", "XMP-dc:rights", "IFD0:Copyright"];

pub const LICENSE_TAGS: &[&str] = &["XMP-xmpRights:WebStatement", "XMP:UsageTerms"];

/// List-typed keyword tags; each keyword is appended individually (`+=`).
pub const KEYWORD_LIST_TAGS: &[&str] = &["IPTC:Keywords", "XMP-dc:subject"];

/// Single-string keyword tag for viewers that do not support lists.
pub const KEYWORD_JOINED_TAG: &str = "EXIF:XPKeywords";

/// Tag names read back by the inspection dump (`-G1 -a -s`).
pub const INSPECT_FIELDS: &[&str] = &[
    "Artist",
    "XPAuthor",
    "XPTitle",
    "XPComment",
    "XPKeywords",
    "Copyright",
    "Creator",
    "Title",
    "Description",
    "Caption-Abstract",
    "Rights",
    "AltTextAccessibility",
    "GPSLatitude",
    "GPSLongitude",
    "GPSAltitude",
    "XResolution",
    "YResolution",
    "ResolutionUnit",
];

/// Which axis a GPS coordinate lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpsAxis {
    Latitude,
    Longitude,
}

/// Convert a signed decimal coordinate to the EXIF (hemisphere reference,
/// unsigned magnitude) pair: negative latitude is "S", negative longitude
/// is "W", non-negative values are "N"/"E".
pub fn gps_ref(value: f64, axis: GpsAxis) -> (&'static str, f64) {
    let reference = match axis {
        GpsAxis::Latitude => {
            if value >= 0.0 {
                "N"
            } else {
                "S"
            }
        }
        GpsAxis::Longitude => {
            if value >= 0.0 {
                "E"
            } else {
                "W"
            }
        }
    };
    (reference, value.abs())
}

/// Split a comma-separated keyword string into trimmed, non-empty keywords.
pub fn split_keywords(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}
