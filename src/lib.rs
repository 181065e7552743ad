pub mod error;
pub mod json;
pub mod parser;
pub mod render;
pub mod search;
pub mod tree;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use error::{Result, TnsError, TnsWarning};
use parser::Parser;
use tree::{Entry, EntryMap, SearchIndex};

// ── Core API ───────────────────────────────────────────────────────

/// The outcome of a successful parse.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseReport {
    /// Number of aliases in the table after the parse.
    pub aliases: usize,
    /// Non-fatal conditions, e.g. an empty source.
    pub warnings: Vec<TnsWarning>,
}

/// A parsed `tnsnames.ora`-style table: alias name to entry tree, plus a
/// per-alias index of leaf values for searching.
///
/// Each parse discards whatever the previous one produced. Between parses
/// the table is read-only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TnsNames {
    entries: EntryMap,
    search: SearchIndex,
    sorted: bool,
}

impl TnsNames {
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self) {
        self.entries.clear();
        self.search.clear();
        self.sorted = false;
    }

    /// Parse a file line by line. Blank lines and lines starting with `#`
    /// are skipped; every other line is trimmed and fed to the parser.
    ///
    /// Lines are read as raw bytes and only fed lines are decoded, lossily,
    /// so stray non-UTF-8 bytes never abort the parse.
    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> Result<ParseReport> {
        let path = path.as_ref();
        let io_error = |source| TnsError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(io_error)?;
        tracing::debug!(path = %path.display(), "parsing file");

        self.reset();
        let mut lines = 0usize;
        let mut reader = BufReader::new(file);
        let mut buf = Vec::new();
        let mut parser = Parser::new(&mut self.entries, &mut self.search);
        let fed = loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break Ok(()),
                Ok(_) => {}
                Err(source) => break Err(io_error(source)),
            }
            let line = buf.trim_ascii();
            if line.is_empty() || line[0] == b'#' {
                continue;
            }
            lines += 1;
            if let Err(err) = parser.feed_str(&String::from_utf8_lossy(line)) {
                break Err(err);
            }
        };
        if let Err(err) = fed {
            self.reset();
            return Err(err);
        }

        Ok(self.report(lines == 0, &path.display().to_string()))
    }

    /// Parse a whole string. `#` starts a comment running to the end of the
    /// line.
    pub fn parse_str(&mut self, input: &str) -> Result<ParseReport> {
        self.reset();
        let input = input.trim();
        if input.is_empty() {
            return Ok(self.report(true, "<string>"));
        }
        tracing::debug!(bytes = input.len(), "parsing string");

        let mut parser = Parser::new(&mut self.entries, &mut self.search);
        let mut in_comment = false;
        let fed = input.chars().try_for_each(|ch| {
            if in_comment {
                if ch == '\n' {
                    in_comment = false;
                }
                Ok(())
            } else if ch == '#' {
                in_comment = true;
                Ok(())
            } else {
                parser.feed(ch)
            }
        });
        if let Err(err) = fed {
            self.reset();
            return Err(err);
        }

        Ok(self.report(false, "<string>"))
    }

    /// Parse raw bytes, which must be UTF-8.
    pub fn parse_bytes(&mut self, input: &[u8]) -> Result<ParseReport> {
        let input = std::str::from_utf8(input).map_err(|e| {
            TnsError::InvalidArgument(format!("input is not valid UTF-8: {}", e))
        })?;
        self.parse_str(input)
    }

    fn report(&self, empty: bool, source: &str) -> ParseReport {
        let mut warnings = Vec::new();
        if empty {
            tracing::warn!(source, "input appears to be empty");
            warnings.push(TnsWarning::EmptyInput {
                source: source.to_string(),
            });
        }
        tracing::debug!(aliases = self.entries.len(), "parse finished");
        ParseReport {
            aliases: self.entries.len(),
            warnings,
        }
    }

    // ── Read access ─────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Look up an alias. Unknown names are an error.
    pub fn get(&self, name: &str) -> Result<&Entry> {
        self.entries
            .get(name)
            .ok_or_else(|| TnsError::Lookup(name.to_string()))
    }

    /// Always fails: parsed entries are read-only.
    pub fn set(&mut self, name: &str, _entry: Entry) -> Result<()> {
        Err(TnsError::ImmutableWrite(name.to_string()))
    }

    /// Always fails: parsed entries are read-only.
    pub fn remove(&mut self, name: &str) -> Result<Entry> {
        Err(TnsError::ImmutableWrite(name.to_string()))
    }

    /// The alias table in current order.
    pub fn entries(&self) -> &EntryMap {
        &self.entries
    }

    pub fn search_index(&self) -> &SearchIndex {
        &self.search
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// `(alias, entry)` pairs in insertion order, or alphabetical after
    /// [`sort`](Self::sort).
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Order aliases by name. Sticky until the next parse.
    pub fn sort(&mut self) {
        if self.sorted {
            return;
        }
        self.entries.sort_keys();
        self.search.sort_keys();
        self.sorted = true;
        tracing::debug!(aliases = self.entries.len(), "sorted entries");
    }

    /// Names of aliases matching `term` by name or by any leaf value.
    pub fn search(&self, term: &str, case_sensitive: bool) -> Result<Vec<String>> {
        search::search(&self.search, term, case_sensitive)
    }

    // ── Output ──────────────────────────────────────────────────────

    /// The alias rendered as TNS text, or `None` if it doesn't exist.
    pub fn entry_string(&self, name: &str) -> Option<String> {
        self.entries
            .get(name)
            .map(|entry| render::entry_string(name, entry))
    }

    /// Every alias rendered as TNS text, optionally sorted first.
    pub fn all_entries_string(&mut self, alphabetize: bool) -> String {
        if alphabetize {
            self.sort();
        }
        render::entries_string(&self.entries)
    }

    pub fn to_json(&self) -> Result<String> {
        json::to_json(&self.entries)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        json::to_json_pretty(&self.entries)
    }

    /// Capture entries, search index and sort state for [`restore`](Self::restore).
    pub fn snapshot(&self) -> Result<String> {
        json::snapshot(&self.entries, &self.search, self.sorted)
    }

    pub fn restore(blob: &str) -> Result<Self> {
        let (entries, search, sorted) = json::restore(blob)?;
        tracing::debug!(aliases = entries.len(), "restored snapshot");
        Ok(TnsNames {
            entries,
            search,
            sorted,
        })
    }
}

impl FromStr for TnsNames {
    type Err = TnsError;

    fn from_str(input: &str) -> Result<Self> {
        let mut names = TnsNames::new();
        names.parse_str(input)?;
        Ok(names)
    }
}

impl<'a> IntoIterator for &'a TnsNames {
    type Item = (&'a String, &'a Entry);
    type IntoIter = indexmap::map::Iter<'a, String, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
