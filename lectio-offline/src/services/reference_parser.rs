//! Verse reference parsing for the search box
//!
//! Recognizes inputs like `João 3:16`, `1 Coríntios 13`, `primeira pedro 2.9`
//! or `sl 23` and turns them into a direct chapter/verse reference. Anything
//! that does not name a known book followed by a chapter number is left to
//! keyword search.
//!
//! Matching runs on a normalized form of the input (NFKC, lowercase,
//! combining marks stripped, whitespace collapsed), so the book table only
//! needs ASCII spellings: `Gênesis`, `GENESIS` and `genesis` are the same key.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// A resolved chapter (and optional verse) reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseReference {
    /// Book abbreviation as used by the API and the verse store
    pub book_abbrev: String,
    pub chapter: u32,
    pub verse: Option<u32>,
}

/// Canonical book abbreviations and their accepted names
///
/// Keys are normalized and have whitespace removed; numbered books use a
/// leading digit (`1samuel`). Spelled-out and roman ordinals are mapped to
/// that digit before lookup.
const BOOK_NAMES: &[(&str, &[&str])] = &[
    ("gn", &["gn", "gen", "genesis"]),
    ("ex", &["ex", "exo", "exodo"]),
    ("lv", &["lv", "lev", "levitico"]),
    ("nm", &["nm", "num", "numeros"]),
    ("dt", &["dt", "deut", "deuteronomio"]),
    ("js", &["js", "josue"]),
    ("jz", &["jz", "juizes"]),
    ("rt", &["rt", "rute"]),
    ("1sm", &["1sm", "1samuel"]),
    ("2sm", &["2sm", "2samuel"]),
    ("1rs", &["1rs", "1reis"]),
    ("2rs", &["2rs", "2reis"]),
    ("1cr", &["1cr", "1cronicas"]),
    ("2cr", &["2cr", "2cronicas"]),
    ("ed", &["ed", "esdras"]),
    ("ne", &["ne", "neemias"]),
    ("et", &["et", "ester"]),
    ("job", &["jo", "job"]),
    ("sl", &["sl", "salmo", "salmos"]),
    ("pv", &["pv", "proverbios"]),
    ("ec", &["ec", "eclesiastes"]),
    ("ct", &["ct", "cantares", "canticos", "canticodoscanticos", "cantaresdesalomao"]),
    ("is", &["is", "isaias"]),
    ("jr", &["jr", "jeremias"]),
    ("lm", &["lm", "lamentacoes", "lamentacoesdejeremias"]),
    ("ez", &["ez", "ezequiel"]),
    ("dn", &["dn", "daniel"]),
    ("os", &["os", "oseias"]),
    ("jl", &["jl", "joel"]),
    ("am", &["am", "amos"]),
    ("ob", &["ob", "obadias"]),
    ("jn", &["jn", "jonas"]),
    ("mq", &["mq", "miqueias"]),
    ("na", &["na", "naum"]),
    ("hc", &["hc", "habacuque"]),
    ("sf", &["sf", "sofonias"]),
    ("ag", &["ag", "ageu"]),
    ("zc", &["zc", "zacarias"]),
    ("ml", &["ml", "malaquias"]),
    ("mt", &["mt", "mateus"]),
    ("mc", &["mc", "marcos"]),
    ("lc", &["lc", "lucas"]),
    ("jo", &["joao"]),
    ("atos", &["at", "atos", "atosdosapostolos"]),
    ("rm", &["rm", "romanos"]),
    ("1co", &["1co", "1corintios"]),
    ("2co", &["2co", "2corintios"]),
    ("gl", &["gl", "galatas"]),
    ("ef", &["ef", "efesios"]),
    ("fp", &["fp", "filipenses"]),
    ("cl", &["cl", "colossenses"]),
    ("1ts", &["1ts", "1tessalonicenses"]),
    ("2ts", &["2ts", "2tessalonicenses"]),
    ("1tm", &["1tm", "1timoteo"]),
    ("2tm", &["2tm", "2timoteo"]),
    ("tt", &["tt", "tito"]),
    ("fm", &["fm", "filemom", "filemon"]),
    ("hb", &["hb", "hebreus"]),
    ("tg", &["tg", "tiago"]),
    ("1pe", &["1pe", "1pedro"]),
    ("2pe", &["2pe", "2pedro"]),
    ("1jo", &["1jo", "1joao"]),
    ("2jo", &["2jo", "2joao"]),
    ("3jo", &["3jo", "3joao"]),
    ("jd", &["jd", "judas"]),
    ("ap", &["ap", "apocalipse"]),
];

/// Ordinal spellings accepted in front of numbered books
const ORDINALS: &[(&str, &str)] = &[
    ("1", "1"),
    ("2", "2"),
    ("3", "3"),
    ("1o", "1"),
    ("1a", "1"),
    ("2o", "2"),
    ("2a", "2"),
    ("3o", "3"),
    ("3a", "3"),
    ("i", "1"),
    ("ii", "2"),
    ("iii", "3"),
    ("primeiro", "1"),
    ("primeira", "1"),
    ("segundo", "2"),
    ("segunda", "2"),
    ("terceiro", "3"),
    ("terceira", "3"),
];

fn book_table() -> &'static HashMap<&'static str, &'static str> {
    static TABLE: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    TABLE.get_or_init(|| {
        BOOK_NAMES
            .iter()
            .flat_map(|(abbrev, names)| names.iter().map(move |name| (*name, *abbrev)))
            .collect()
    })
}

fn reference_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([0-9a-z][0-9a-z ]*?)\s*(\d+)(?:\s*[:.,]\s*(\d+))?$")
            .expect("reference pattern is valid")
    })
}

/// Lowercase, strip accents and collapse whitespace
///
/// `"  1º  Coríntios 13 "` becomes `"1o corintios 13"`.
pub fn normalize(input: &str) -> String {
    let folded = input.nfkc().collect::<String>().to_lowercase();
    let stripped: String = folded.nfd().filter(|c| !is_combining_mark(*c)).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolve a book name or abbreviation to its canonical abbreviation
pub fn resolve_book(name: &str) -> Option<&'static str> {
    let normalized = normalize(name);
    let table = book_table();

    let joined: String = normalized.split_whitespace().collect();
    if let Some(abbrev) = table.get(joined.as_str()) {
        return Some(*abbrev);
    }

    // "primeira pedro", "II Reis", "1ºsamuel", "IIReis"
    ORDINALS.iter().find_map(|(word, digit)| {
        let rest = joined.strip_prefix(*word)?;
        if rest.is_empty() || *word == *digit {
            return None;
        }
        table.get(format!("{}{}", digit, rest).as_str()).copied()
    })
}

/// Parse `[ordinal] book chapter[:verse]`
///
/// Returns `None` when the input is not a reference to a known book.
pub fn parse_reference(input: &str) -> Option<VerseReference> {
    let normalized = normalize(input);
    let captures = reference_regex().captures(&normalized)?;

    let book_abbrev = resolve_book(captures.get(1)?.as_str())?;

    let chapter: u32 = captures.get(2)?.as_str().parse().ok()?;
    if chapter == 0 {
        return None;
    }

    let verse = match captures.get(3) {
        Some(m) => {
            let verse: u32 = m.as_str().parse().ok()?;
            if verse == 0 {
                return None;
            }
            Some(verse)
        }
        None => None,
    };

    Some(VerseReference {
        book_abbrev: book_abbrev.to_string(),
        chapter,
        verse,
    })
}
