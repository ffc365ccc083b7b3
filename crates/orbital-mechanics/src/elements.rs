//! Element set catalogs
//!
//! A catalog is a text stream of repeating 3-line groups: a free-form name
//! line followed by the two fixed-format element lines. Ingestion checks the
//! structure of each element line; the orbital content itself is left to the
//! propagator.

use crate::{OrbitalError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

/// Minimum length of an element line (columns 1-69)
const ELEMENT_LINE_LEN: usize = 69;

/// Column of the modulo-10 checksum digit (0-based)
const CHECKSUM_COLUMN: usize = 68;

/// One satellite's two-line element set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSet {
    pub name: String,
    pub line1: String,
    pub line2: String,
}

impl ElementSet {
    pub fn new(
        name: impl Into<String>,
        line1: impl Into<String>,
        line2: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            line1: line1.into(),
            line2: line2.into(),
        }
    }

    /// Catalog number from columns 3-7 of line 1
    pub fn catalog_number(&self) -> Option<&str> {
        self.line1.get(2..7).map(str::trim)
    }
}

/// Modulo-10 checksum over the first 68 columns: digits count their value,
/// minus signs count one, everything else zero.
pub fn checksum(line: &str) -> u8 {
    let sum: u32 = line
        .bytes()
        .take(CHECKSUM_COLUMN)
        .map(|b| match b {
            b'0'..=b'9' => (b - b'0') as u32,
            b'-' => 1,
            _ => 0,
        })
        .sum();
    (sum % 10) as u8
}

fn validate_element_line(line: &str, expected: u8, line_no: usize) -> Result<()> {
    let parse_err = |reason: String| OrbitalError::CatalogParse {
        line: line_no,
        reason,
    };

    if !line.is_ascii() {
        return Err(parse_err("element line contains non-ASCII characters".to_string()));
    }
    let bytes = line.as_bytes();
    if bytes.len() < ELEMENT_LINE_LEN {
        return Err(parse_err(format!(
            "element line {} too short: {} columns, expected {}",
            expected,
            bytes.len(),
            ELEMENT_LINE_LEN
        )));
    }
    if bytes[0] != b'0' + expected || bytes[1] != b' ' {
        return Err(parse_err(format!(
            "expected element line {}, found {:?}",
            expected,
            &line[..2]
        )));
    }

    let declared = bytes[CHECKSUM_COLUMN];
    if !declared.is_ascii_digit() {
        return Err(parse_err(format!(
            "checksum column holds {:?}, not a digit",
            declared as char
        )));
    }
    let computed = checksum(line);
    if declared - b'0' != computed {
        return Err(parse_err(format!(
            "checksum mismatch on element line {}: declared {}, computed {}",
            expected,
            declared as char,
            computed
        )));
    }
    Ok(())
}

/// Parse a catalog from a reader.
///
/// Blank lines between groups are skipped. A group cut short by the end of
/// the stream is an error, never a silently dropped record.
pub fn parse_catalog<R: BufRead>(reader: R) -> Result<Vec<ElementSet>> {
    let mut lines = reader.lines().enumerate().map(|(i, l)| (i + 1, l));
    let mut catalog = Vec::new();

    while let Some((name_no, name)) = lines.next() {
        let name = name?;
        let name = name.trim();
        if name.is_empty() {
            continue;
        }

        let mut next_line = |which: u8| -> Result<String> {
            match lines.next() {
                Some((no, line)) => {
                    let line = line?.trim_end().to_string();
                    validate_element_line(&line, which, no)?;
                    Ok(line)
                }
                None => Err(OrbitalError::CatalogParse {
                    line: name_no + which as usize,
                    reason: format!("truncated element set for {:?}: missing line {}", name, which),
                }),
            }
        };

        let line1 = next_line(1)?;
        let line2 = next_line(2)?;

        if line1[2..7] != line2[2..7] {
            return Err(OrbitalError::CatalogParse {
                line: name_no + 2,
                reason: format!(
                    "catalog number mismatch for {:?}: {} vs {}",
                    name,
                    line1[2..7].trim(),
                    line2[2..7].trim()
                ),
            });
        }

        catalog.push(ElementSet::new(name, line1, line2));
    }

    Ok(catalog)
}

/// Load a catalog from a TLE file
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Vec<ElementSet>> {
    let path = path.as_ref();
    info!("Loading element sets from {:?}", path);

    let file = File::open(path)?;
    let catalog = parse_catalog(BufReader::new(file))?;

    info!("Read {} satellites from TLE file", catalog.len());
    Ok(catalog)
}
