//! Parses the system hosts file into a table answering hostname queries

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::ops::Index;
use std::path::{Path, PathBuf};
use std::slice::Iter;
use std::str::FromStr;

use thiserror::Error;

/// Path to the system hosts file on Unix-like systems
pub const HOSTS_PATH: &str = "/etc/hosts";

/// First line of `simple` output
pub const SIMPLE_HEADER: &str = "# simplified to one line per IP";

/// Represents an error in loading, querying or formatting a hosts table.
#[derive(Debug, Error)]
pub enum Error {
    /// A data line holds an address but no hostnames
    #[error("line {line}: address {address:?} has no hostnames")]
    MissingHostnames {
        /// 1-based line number
        line: usize,
        /// The lone token found on the line
        address: String,
    },
    /// Line number below the first line
    #[error("line must be 1 or greater")]
    LineTooSmall,
    /// Line number past the last line
    #[error("line should be {max} or less, got {line}")]
    LineTooLarge {
        /// Requested line number
        line: usize,
        /// Number of lines in the table
        max: usize,
    },
    /// Format mode string not recognized
    #[error("format mode not recognized: {0:?}")]
    UnknownFormat(String),
    /// No known hosts file location for this operating system
    #[error("no hosts file location known for {0}")]
    UnsupportedPlatform(&'static str),
    /// Error reading the hosts file
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Output modes for `Hostfile::format`
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum FormatMode {
    /// Input reproduced byte for byte
    Raw,
    /// One line per non-blank input line, whitespace normalized
    #[default]
    Clean,
    /// One line per unique address, listing every hostname declared for it
    Simple,
}

impl FromStr for FormatMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<FormatMode, Error> {
        match s {
            "raw" | "str" => Ok(FormatMode::Raw),
            "clean" | "" => Ok(FormatMode::Clean),
            "simple" => Ok(FormatMode::Simple),
            _ => Err(Error::UnknownFormat(s.to_owned())),
        }
    }
}

/// Address and hostnames declared on a single data line
#[derive(Clone, Debug)]
struct Entry {
    address: String,
    names: Vec<String>,
}

/// Maps keys to the line numbers they appear on, remembering the order in
/// which keys were first seen.
#[derive(Clone, Debug, Default)]
struct LineIndex {
    entries: Vec<(String, Vec<usize>)>,
    positions: HashMap<String, usize>,
}

impl LineIndex {
    fn insert(&mut self, key: &str, line: usize) {
        match self.positions.get(key) {
            Some(&pos) => self.entries[pos].1.push(line),
            None => {
                self.positions.insert(key.to_owned(), self.entries.len());
                self.entries.push((key.to_owned(), vec![line]));
            }
        }
    }

    fn get(&self, key: &str) -> &[usize] {
        match self.positions.get(key) {
            Some(&pos) => &self.entries[pos].1,
            None => &[],
        }
    }

    fn contains(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// A parsed hosts file.
///
/// Every data line has the shape `<address> <hostname> [<hostname> ...]`.
/// Blank lines and lines whose first non-whitespace character is `#` are
/// kept for output but contribute nothing to the index. Line numbers are
/// 1-based and count every line of the input.
///
/// Addresses and hostnames are taken as written; neither is validated.
#[derive(Clone)]
pub struct Hostfile {
    /// Raw input lines, line endings included
    lines: Vec<String>,
    /// Parsed content of each line; `None` for blanks and comments
    entries: Vec<Option<Entry>>,
    hosts: LineIndex,
    ips: LineIndex,
}

impl Hostfile {
    /// Parses a complete hosts file held in memory.
    pub fn parse(data: &str) -> Result<Hostfile, Error> {
        Hostfile::from_lines(split_lines(data))
    }

    /// Reads and parses a hosts file from a stream.
    ///
    /// The reader is consumed to its end; line endings are preserved so that
    /// `FormatMode::Raw` reproduces the stream exactly.
    pub fn from_reader<R: BufRead>(mut r: R) -> Result<Hostfile, Error> {
        let mut buf = String::new();
        r.read_to_string(&mut buf)?;
        Hostfile::parse(&buf)
    }

    fn from_lines(lines: Vec<String>) -> Result<Hostfile, Error> {
        let mut entries = Vec::with_capacity(lines.len());
        let mut hosts = LineIndex::default();
        let mut ips = LineIndex::default();

        for (idx, line) in lines.iter().enumerate() {
            let n = idx + 1;
            let entry = parse_line(line, n)?;

            if let Some(ref entry) = entry {
                ips.insert(&entry.address, n);
                for name in &entry.names {
                    hosts.insert(name, n);
                }
            }

            entries.push(entry);
        }

        debug!(
            "parsed hosts table: {} lines, {} addresses, {} hostnames",
            lines.len(),
            ips.len(),
            hosts.len()
        );

        Ok(Hostfile {
            lines,
            entries,
            hosts,
            ips,
        })
    }

    /// Returns whether `name` is declared on any line.
    pub fn contains(&self, name: &str) -> bool {
        self.hosts.contains(name)
    }

    /// Returns the lines declaring `name`, in file order.
    ///
    /// An unknown name yields an empty slice; use `contains` to test for
    /// existence.
    pub fn lines_for(&self, name: &str) -> &[usize] {
        self.hosts.get(name)
    }

    /// Returns the address on every line declaring `name`, in file order.
    pub fn ips_for(&self, name: &str) -> Vec<&str> {
        self.lines_for(name)
            .iter()
            .filter_map(|&n| self.entry(n))
            .map(|e| &e.address[..])
            .collect()
    }

    /// Returns the address declared on the given 1-based line.
    ///
    /// Blank and comment lines yield `Ok(None)`. A line number outside
    /// `1..=line_count()` is an error.
    pub fn ip_on_line(&self, line: usize) -> Result<Option<&str>, Error> {
        if line > self.lines.len() {
            return Err(Error::LineTooLarge {
                line,
                max: self.lines.len(),
            });
        }
        if line == 0 {
            return Err(Error::LineTooSmall);
        }

        Ok(self.entry(line).map(|e| &e.address[..]))
    }

    /// Returns an iterator over distinct hostnames in order of first
    /// appearance.
    pub fn hostnames(&self) -> Hostnames {
        Hostnames {
            iter: self.hosts.entries.iter(),
        }
    }

    /// Returns the number of distinct hostnames.
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Returns `true` if no hostnames are declared.
    pub fn is_empty(&self) -> bool {
        self.hosts.len() == 0
    }

    /// Returns the number of lines in the input, blanks and comments included.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns the number of distinct addresses.
    pub fn ip_count(&self) -> usize {
        self.ips.len()
    }

    /// Renders the table in the given mode.
    pub fn format(&self, mode: FormatMode) -> String {
        match mode {
            FormatMode::Raw => self.lines.concat(),
            FormatMode::Clean => self.format_clean(),
            FormatMode::Simple => self.format_simple(),
        }
    }

    /// Renders the table in the mode named by `mode`.
    ///
    /// See `FormatMode::from_str` for recognized names.
    pub fn format_str(&self, mode: &str) -> Result<String, Error> {
        Ok(self.format(mode.parse()?))
    }

    fn entry(&self, line: usize) -> Option<&Entry> {
        self.entries[line - 1].as_ref()
    }

    fn format_clean(&self) -> String {
        let mut out = Vec::new();

        for (line, entry) in self.lines.iter().zip(&self.entries) {
            match *entry {
                Some(ref e) => out.push(format!("{}\t{}", e.address, e.names.join(" "))),
                None => {
                    let line = line.trim();
                    if !line.is_empty() {
                        out.push(line.to_owned());
                    }
                }
            }
        }

        out.join("\n")
    }

    fn format_simple(&self) -> String {
        let mut out = vec![SIMPLE_HEADER.to_owned()];

        for (address, lines) in &self.ips.entries {
            let names = lines
                .iter()
                .filter_map(|&n| self.entry(n))
                .flat_map(|e| e.names.iter().map(|s| &s[..]))
                .collect::<Vec<_>>();

            out.push(format!("{}\t{}", address, names.join(" ")));
        }

        out.join("\n")
    }
}

/// Splits `data` into lines ending in `\n`, `\r\n` or a lone `\r`, each
/// keeping its terminator. A final unterminated line is kept as is.
fn split_lines(data: &str) -> Vec<String> {
    let bytes = data.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let end = match bytes[i] {
            b'\n' => i + 1,
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => i + 2,
            b'\r' => i + 1,
            _ => {
                i += 1;
                continue;
            }
        };

        lines.push(data[start..end].to_owned());
        start = end;
        i = end;
    }

    if start < bytes.len() {
        lines.push(data[start..].to_owned());
    }

    lines
}

/// Parses one line; `n` is its 1-based number, used in errors.
fn parse_line(line: &str, n: usize) -> Result<Option<Entry>, Error> {
    let line = line.trim();

    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    // non-empty after trimming, so there is a first word
    let address = words.next().unwrap_or_default();

    let names = words.map(|s| s.to_owned()).collect::<Vec<_>>();

    if names.is_empty() {
        return Err(Error::MissingHostnames {
            line: n,
            address: address.to_owned(),
        });
    }

    Ok(Some(Entry {
        address: address.to_owned(),
        names,
    }))
}

impl FromStr for Hostfile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Hostfile, Error> {
        Hostfile::parse(s)
    }
}

/// Lines on which a hostname is declared; empty for unknown names.
impl<'a> Index<&'a str> for Hostfile {
    type Output = [usize];

    fn index(&self, name: &'a str) -> &[usize] {
        self.lines_for(name)
    }
}

impl<'a> IntoIterator for &'a Hostfile {
    type Item = &'a str;
    type IntoIter = Hostnames<'a>;

    fn into_iter(self) -> Hostnames<'a> {
        self.hostnames()
    }
}

/// Writes the input unchanged; the alternate flag (`{:#}`) writes the
/// `clean` form instead.
impl fmt::Display for Hostfile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            f.write_str(&self.format_clean())
        } else {
            for line in &self.lines {
                f.write_str(line)?;
            }
            Ok(())
        }
    }
}

impl fmt::Debug for Hostfile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "<Hostfile: {} lines, {} unique IPs, {} unique hosts>",
            self.lines.len(),
            self.ips.len(),
            self.hosts.len()
        )
    }
}

/// Iterator over the distinct hostnames of a `Hostfile`
#[derive(Clone)]
pub struct Hostnames<'a> {
    iter: Iter<'a, (String, Vec<usize>)>,
}

impl<'a> Iterator for Hostnames<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        self.iter.next().map(|&(ref name, _)| &name[..])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<'a> ExactSizeIterator for Hostnames<'a> {}

/// Returns the absolute path to the system hosts file.
pub fn host_file() -> Result<PathBuf, Error> {
    host_file_impl()
}

#[cfg(unix)]
fn host_file_impl() -> Result<PathBuf, Error> {
    Ok(PathBuf::from(HOSTS_PATH))
}

#[cfg(not(unix))]
fn host_file_impl() -> Result<PathBuf, Error> {
    Err(Error::UnsupportedPlatform(std::env::consts::OS))
}

/// Loads a hosts table from the given filename.
///
/// If an error is encountered in opening the file or reading its contents
/// or if the file is malformed, the error is returned.
pub fn load_hostfile(path: &Path) -> Result<Hostfile, Error> {
    info!("loading hosts table from {}", path.display());
    Hostfile::from_reader(BufReader::new(File::open(path)?))
}
