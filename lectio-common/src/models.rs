//! Bible data model shared by the store, the remote client and the API
//!
//! JSON field names follow the remote Bible REST API so that chapter views
//! and search results look the same whichever source produced them.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported text editions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BibleVersion {
    /// Almeida Corrigida Fiel
    Acf,
    /// Nova Versão Internacional
    Nvi,
    /// Almeida Revista e Atualizada
    Ra,
}

impl BibleVersion {
    /// The single edition eligible for full local mirroring
    pub const PRIMARY_OFFLINE: BibleVersion = BibleVersion::Acf;

    /// Identifier used in URLs and in the `verses.version` column
    pub fn as_str(&self) -> &'static str {
        match self {
            BibleVersion::Acf => "acf",
            BibleVersion::Nvi => "nvi",
            BibleVersion::Ra => "ra",
        }
    }

    /// Display label placed in `ChapterView.book.version`
    pub fn label(&self) -> &'static str {
        match self {
            BibleVersion::Acf => "Almeida Corrigida Fiel",
            BibleVersion::Nvi => "Nova Versão Internacional",
            BibleVersion::Ra => "Almeida Revista e Atualizada",
        }
    }

    pub fn supports_offline(&self) -> bool {
        *self == Self::PRIMARY_OFFLINE
    }
}

impl fmt::Display for BibleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BibleVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "acf" => Ok(BibleVersion::Acf),
            "nvi" => Ok(BibleVersion::Nvi),
            "ra" => Ok(BibleVersion::Ra),
            other => Err(Error::InvalidInput(format!("Unknown Bible version: {}", other))),
        }
    }
}

/// One flattened verse as persisted in the `verses` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseRecord {
    /// Surrogate key, `None` until the row is inserted
    pub id: Option<i64>,
    pub version: BibleVersion,
    pub book_abbrev: String,
    pub chapter: u32,
    pub verse: u32,
    pub text: String,
}

impl VerseRecord {
    pub fn new(
        version: BibleVersion,
        book_abbrev: impl Into<String>,
        chapter: u32,
        verse: u32,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            version,
            book_abbrev: book_abbrev.into(),
            chapter,
            verse,
            text: text.into(),
        }
    }
}

/// Book abbreviations (Portuguese primary code, English secondary code)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookAbbrev {
    pub pt: String,
    #[serde(default)]
    pub en: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Testament {
    #[serde(rename = "VT")]
    Old,
    #[serde(rename = "NT")]
    New,
}

impl Testament {
    pub fn as_str(&self) -> &'static str {
        match self {
            Testament::Old => "VT",
            Testament::New => "NT",
        }
    }
}

impl FromStr for Testament {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "VT" | "OLD" => Ok(Testament::Old),
            "NT" | "NEW" => Ok(Testament::New),
            other => Err(Error::InvalidInput(format!("Unknown testament: {}", other))),
        }
    }
}

/// Book metadata from `GET /books`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDescriptor {
    pub abbrev: BookAbbrev,
    pub name: String,
    pub author: String,
    /// Number of chapters in the book
    pub chapters: u32,
    /// Testament group (e.g. "Pentateuco", "Evangelhos")
    pub group: String,
    pub testament: Testament,
}

/// Abbreviation wrapper used inside chapter views and search hits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbbrevRef {
    pub pt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterBook {
    pub abbrev: AbbrevRef,
    pub name: String,
    pub author: String,
    pub group: String,
    /// Edition display label
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterInfo {
    pub number: u32,
    /// Verse count
    pub verses: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterVerse {
    pub number: u32,
    pub text: String,
}

/// A chapter ready for display, assembled the same way from either source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterView {
    pub book: ChapterBook,
    pub chapter: ChapterInfo,
    pub verses: Vec<ChapterVerse>,
}

impl ChapterView {
    /// Join locally stored rows with their book descriptor
    ///
    /// Rows are expected to belong to a single chapter; they are re-sorted
    /// by verse number.
    pub fn from_records(
        book: &BookDescriptor,
        version: BibleVersion,
        chapter: u32,
        records: &[VerseRecord],
    ) -> Self {
        let mut verses: Vec<ChapterVerse> = records
            .iter()
            .map(|r| ChapterVerse {
                number: r.verse,
                text: r.text.clone(),
            })
            .collect();
        verses.sort_by_key(|v| v.number);

        Self {
            book: ChapterBook {
                abbrev: AbbrevRef {
                    pt: book.abbrev.pt.clone(),
                },
                name: book.name.clone(),
                author: book.author.clone(),
                group: book.group.clone(),
                version: version.label().to_string(),
            },
            chapter: ChapterInfo {
                number: chapter,
                verses: verses.len() as u32,
            },
            verses,
        }
    }

    /// Sort verses ascending by number (remote payloads are not trusted to be ordered)
    pub fn normalize_order(&mut self) {
        self.verses.sort_by_key(|v| v.number);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchBook {
    pub abbrev: AbbrevRef,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchVerse {
    pub book: SearchBook,
    pub chapter: u32,
    pub number: u32,
    pub text: String,
}

/// Keyword search outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Total number of matches, not capped
    pub occurrence: u64,
    pub verses: Vec<SearchVerse>,
}

impl SearchResult {
    /// Maximum number of verses returned in one result
    pub const MAX_VERSES: usize = 100;

    pub fn empty() -> Self {
        Self {
            occurrence: 0,
            verses: Vec::new(),
        }
    }
}
