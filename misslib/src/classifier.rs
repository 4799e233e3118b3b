use std::collections::HashSet;
use std::fmt;
use std::io::{BufRead, Lines};
use std::num::NonZeroU64;
use std::str::FromStr;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use crate::error::{ClassifyError, MalformedRecordError};
use crate::variant::VariantKind;

/// One memory reference, together with the level each variant's simulation missed at
///
/// Indicators are whatever the simulator reports. A value that never equals the target miss level
/// (commonly a number past the last level, or a negative number) means that variant didn't miss.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Reference {
    pub address: u64,
    pub capacity: i64,
    pub associative: i64,
    pub real: i64,
}

impl Reference {
    pub fn new(address: u64, capacity: i64, associative: i64, real: i64) -> Self {
        Self { address, capacity, associative, real }
    }

    /// The miss indicator reported by a given variant's simulation
    pub fn indicator(&self, kind: VariantKind) -> i64 {
        match kind {
            VariantKind::Capacity => self.capacity,
            VariantKind::Associative => self.associative,
            VariantKind::Real => self.real,
        }
    }

    /// Parses a record of exactly four whitespace separated integers: the address followed by the
    /// capacity, associative, and real indicators
    ///
    /// `line` is only used to label errors
    pub fn parse_line(line: usize, record: &str) -> Result<Self, MalformedRecordError> {
        let fields: Vec<&str> = record.split_whitespace().collect();
        if fields.len() != 4 {
            return Err(MalformedRecordError::FieldCount { line, found: fields.len() });
        }
        Ok(Self {
            address: field(line, "address", fields[0])?,
            capacity: field(line, "capacity indicator", fields[1])?,
            associative: field(line, "associative indicator", fields[2])?,
            real: field(line, "real indicator", fields[3])?,
        })
    }
}

impl FromStr for Reference {
    type Err = MalformedRecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Reference::parse_line(1, s)
    }
}

fn field<T: FromStr>(line: usize, field: &'static str, value: &str) -> Result<T, MalformedRecordError> {
    value.parse().map_err(|_| MalformedRecordError::NotANumber {
        line,
        field,
        value: value.to_string(),
    })
}

/// The cause assigned to a reference
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MissClass {
    Hit,
    Compulsory,
    Capacity,
    Mapping,
    Replacement,
}

impl MissClass {
    pub fn name(&self) -> &'static str {
        match self {
            MissClass::Hit => "hit",
            MissClass::Compulsory => "compulsory",
            MissClass::Capacity => "capacity",
            MissClass::Mapping => "mapping",
            MissClass::Replacement => "replacement",
        }
    }

    /// The class of miss first exposed by a variant
    fn exposed_by(kind: VariantKind) -> Self {
        match kind {
            VariantKind::Capacity => MissClass::Capacity,
            VariantKind::Associative => MissClass::Mapping,
            VariantKind::Real => MissClass::Replacement,
        }
    }
}

impl fmt::Display for MissClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One line of classifier output: the address of the reference followed by its label
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct LabelLine {
    pub address: u64,
    pub class: MissClass,
}

impl LabelLine {
    pub fn new(reference: &Reference, class: MissClass) -> Self {
        Self {
            address: reference.address,
            class,
        }
    }
}

impl fmt::Display for LabelLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.address, self.class)
    }
}

/// Remembers which blocks have already been referenced during a run
#[derive(Debug)]
pub struct CompulsoryTracker {
    block_size: NonZeroU64,
    seen: HashSet<u64>,
}

impl CompulsoryTracker {
    pub fn new(block_size: NonZeroU64) -> Self {
        Self {
            block_size,
            seen: HashSet::new(),
        }
    }

    /// Records a reference, returning true if this is the first touch of its block
    pub fn first_touch(&mut self, address: u64) -> bool {
        self.seen.insert(address / self.block_size.get())
    }
}

/// Tally of classifications for a run
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct MissCounts {
    pub compulsory: u64,
    pub capacity: u64,
    pub mapping: u64,
    pub replacement: u64,
    pub hits: u64,
}

impl MissCounts {
    pub fn record(&mut self, class: MissClass) {
        let slot = match class {
            MissClass::Hit => &mut self.hits,
            MissClass::Compulsory => &mut self.compulsory,
            MissClass::Capacity => &mut self.capacity,
            MissClass::Mapping => &mut self.mapping,
            MissClass::Replacement => &mut self.replacement,
        };
        *slot += 1;
    }

    pub fn misses(&self) -> u64 {
        self.compulsory + self.capacity + self.mapping + self.replacement
    }

    /// The number of references classified
    pub fn total(&self) -> u64 {
        self.misses() + self.hits
    }
}

impl fmt::Display for MissCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Compulsory: {}", self.compulsory)?;
        writeln!(f, "Capacity: {}", self.capacity)?;
        writeln!(f, "Mapping: {}", self.mapping)?;
        writeln!(f, "Replacement: {}", self.replacement)?;
        write!(f, "Hits: {}", self.hits)
    }
}

/// Classifies references one at a time, in order
///
/// The classifier owns the set of blocks seen so far, so the same reference classified twice
/// gives `Compulsory` the first time and something else afterwards. Start a new run with a new
/// classifier.
#[derive(Debug)]
pub struct Classifier {
    tracker: CompulsoryTracker,
    target_miss_level: i64,
    counts: MissCounts,
}

impl Classifier {
    /// Creates a classifier for a run
    ///
    /// # Arguments
    ///
    /// * `block_size`: Must match the block size the variants were derived with
    /// * `target_miss_level`: The indicator value that counts as a miss
    ///
    /// returns: Classifier
    pub fn new(block_size: NonZeroU64, target_miss_level: i64) -> Self {
        Self {
            tracker: CompulsoryTracker::new(block_size),
            target_miss_level,
            counts: MissCounts::default(),
        }
    }

    /// Assigns a cause to a reference
    ///
    /// The first touch of a block is always compulsory. After that, the variants are checked in
    /// attribution order and the first one that missed at the target level names the cause.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::num::NonZeroU64;
    /// use misslib::classifier::{Classifier, MissClass, Reference};
    /// let mut classifier = Classifier::new(NonZeroU64::new(64).unwrap(), 1);
    /// assert_eq!(classifier.classify(&Reference::new(128, 1, 9, 9)), MissClass::Compulsory);
    /// assert_eq!(classifier.classify(&Reference::new(128, 1, 9, 9)), MissClass::Capacity);
    /// ```
    pub fn classify(&mut self, reference: &Reference) -> MissClass {
        let class = if self.tracker.first_touch(reference.address) {
            MissClass::Compulsory
        } else {
            VariantKind::ALL
                .into_iter()
                .find(|kind| reference.indicator(*kind) == self.target_miss_level)
                .map(MissClass::exposed_by)
                .unwrap_or(MissClass::Hit)
        };
        self.counts.record(class);
        class
    }

    pub fn counts(&self) -> &MissCounts {
        &self.counts
    }
}

/// Lazily classifies a line oriented reference stream
///
/// Every line must be a record, a blank line is malformed like any other. The first malformed
/// record or read failure is yielded as an error, after which the iterator is exhausted.
///
/// # Arguments
///
/// * `reader`: One record per line, see [`Reference::parse_line`]
/// * `block_size`: Must match the block size the variants were derived with
/// * `target_miss_level`: The indicator value that counts as a miss
///
/// returns: Labels<R>
pub fn classify_stream<R: BufRead>(reader: R, block_size: NonZeroU64, target_miss_level: i64) -> Labels<R> {
    Labels {
        lines: reader.lines(),
        line_no: 0,
        classifier: Classifier::new(block_size, target_miss_level),
        done: false,
    }
}

/// Iterator returned by [`classify_stream`]
pub struct Labels<R> {
    lines: Lines<R>,
    line_no: usize,
    classifier: Classifier,
    done: bool,
}

impl<R> Labels<R> {
    /// The tally of everything yielded so far
    pub fn counts(&self) -> &MissCounts {
        self.classifier.counts()
    }
}

impl<R: BufRead> Iterator for Labels<R> {
    type Item = Result<(Reference, MissClass), ClassifyError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let line = match self.lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                self.done = true;
                return Some(Err(e.into()));
            }
            None => {
                self.done = true;
                let counts = self.classifier.counts();
                info!("Classified {} references, {} misses", counts.total(), counts.misses());
                return None;
            }
        };
        self.line_no += 1;
        match Reference::parse_line(self.line_no, &line) {
            Ok(reference) => {
                let class = self.classifier.classify(&reference);
                Some(Ok((reference, class)))
            }
            Err(e) => {
                debug!("Aborting classification: {e}");
                self.done = true;
                Some(Err(e.into()))
            }
        }
    }
}
