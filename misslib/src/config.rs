use std::io::BufRead;
use std::str::FromStr;
use log::debug;
use serde::{Deserialize, Serialize};
use crate::error::{ConfigurationError, MissingField, SpecError, UnrecognizedDirectiveError};

/// A cache hierarchy, as described by the user
///
/// Levels are ordered from nearest to farthest from the processor. The block size and write miss
/// policy apply to the whole hierarchy. The policies are opaque tokens handed through to the
/// simulator untouched.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CacheSpec {
    pub block_size: u64,
    pub write_miss_policy: String,
    pub replacement_policy: String,
    pub levels: Vec<LevelSpec>,
}

/// A single level of the hierarchy
///
/// Associativity is expected to be no larger than the number of blocks, but this is not checked,
/// the simulator gets whatever the user asked for
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct LevelSpec {
    pub num_blocks: u64,
    pub associativity: u64,
    pub write_policy: String,
}

impl LevelSpec {
    pub fn new(num_blocks: u64, associativity: u64, write_policy: impl Into<String>) -> Self {
        Self {
            num_blocks,
            associativity,
            write_policy: write_policy.into(),
        }
    }
}

impl CacheSpec {
    /// Checks every precondition of variant derivation, reporting all failures at once
    ///
    /// Missing pieces (no levels, empty policy tokens, zero block size) are collected into a
    /// single `Underspecified` error, and every zero sized level field gets a `NotPositive`. A
    /// lone violation is returned as is, several are wrapped in `Invalid`.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let mut missing = Vec::new();
        if self.levels.is_empty() {
            missing.push(MissingField::Levels);
        }
        if self.block_size == 0 {
            missing.push(MissingField::BlockSize);
        }
        if self.write_miss_policy.is_empty() {
            missing.push(MissingField::WriteMissPolicy);
        }
        if self.replacement_policy.is_empty() {
            missing.push(MissingField::ReplacementPolicy);
        }
        let mut violations = Vec::new();
        if !missing.is_empty() {
            violations.push(ConfigurationError::Underspecified(missing));
        }
        for (i, level) in self.levels.iter().enumerate() {
            if level.num_blocks == 0 {
                violations.push(ConfigurationError::NotPositive { field: format!("level {} num_blocks", i + 1) });
            }
            if level.associativity == 0 {
                violations.push(ConfigurationError::NotPositive { field: format!("level {} associativity", i + 1) });
            }
        }
        match violations.len() {
            0 => Ok(()),
            1 => Err(violations.remove(0)),
            _ => Err(ConfigurationError::Invalid(violations)),
        }
    }

    /// Parses the line oriented specification format
    ///
    /// ```text
    /// # comment
    /// blocksize 64
    /// write_miss_policy allocate
    /// replacement_policy LRU
    /// level 512 4 write-back
    /// level 8192 8 write-back
    /// ```
    ///
    /// Any error stops the parse immediately, except for missing directives, which are only known
    /// once the whole input has been read and are then reported together
    ///
    /// # Examples
    ///
    /// ```
    /// use misslib::config::CacheSpec;
    /// let spec = CacheSpec::parse("blocksize 64\nwrite_miss_policy allocate\nreplacement_policy LRU\nlevel 100 4 write-back\n").unwrap();
    /// assert_eq!(spec.levels[0].associativity, 4);
    /// ```
    pub fn parse(input: &str) -> Result<Self, SpecError> {
        let mut builder = SpecBuilder::default();
        for (i, line) in input.lines().enumerate() {
            builder.line(i + 1, line)?;
        }
        Ok(builder.build()?)
    }

    /// Reads and parses a specification from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, SpecError> {
        let mut builder = SpecBuilder::default();
        for (i, line) in reader.lines().enumerate() {
            builder.line(i + 1, &line?)?;
        }
        Ok(builder.build()?)
    }
}

impl FromStr for CacheSpec {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CacheSpec::parse(s)
    }
}

/// Accumulates directives until the whole input has been seen
#[derive(Default)]
struct SpecBuilder {
    block_size: Option<u64>,
    write_miss_policy: Option<String>,
    replacement_policy: Option<String>,
    levels: Vec<LevelSpec>,
}

impl SpecBuilder {
    fn line(&mut self, line_no: usize, line: &str) -> Result<(), SpecError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(&keyword) = tokens.first() else {
            return Ok(());
        };
        match keyword {
            "blocksize" => {
                expect_tokens(line_no, "blocksize", &tokens, 2)?;
                let value = number(line_no, "blocksize", tokens[1])?;
                set_once(&mut self.block_size, value, line_no, "blocksize")?;
            }
            "write_miss_policy" => {
                expect_tokens(line_no, "write_miss_policy", &tokens, 2)?;
                set_once(&mut self.write_miss_policy, tokens[1].to_string(), line_no, "write_miss_policy")?;
            }
            "replacement_policy" => {
                expect_tokens(line_no, "replacement_policy", &tokens, 2)?;
                set_once(&mut self.replacement_policy, tokens[1].to_string(), line_no, "replacement_policy")?;
            }
            "level" => {
                expect_tokens(line_no, "level", &tokens, 4)?;
                let num_blocks = number(line_no, "level num_blocks", tokens[1])?;
                let associativity = number(line_no, "level associativity", tokens[2])?;
                self.levels.push(LevelSpec::new(num_blocks, associativity, tokens[3]));
            }
            comment if comment.starts_with('#') => {}
            other => {
                return Err(UnrecognizedDirectiveError {
                    line: line_no,
                    keyword: other.to_string(),
                }
                .into())
            }
        }
        Ok(())
    }

    fn build(self) -> Result<CacheSpec, ConfigurationError> {
        let mut missing = Vec::new();
        if self.levels.is_empty() {
            missing.push(MissingField::Levels);
        }
        if self.block_size.is_none() {
            missing.push(MissingField::BlockSize);
        }
        if self.write_miss_policy.is_none() {
            missing.push(MissingField::WriteMissPolicy);
        }
        if self.replacement_policy.is_none() {
            missing.push(MissingField::ReplacementPolicy);
        }
        match (self.block_size, self.write_miss_policy, self.replacement_policy) {
            (Some(block_size), Some(write_miss_policy), Some(replacement_policy)) if missing.is_empty() => {
                let spec = CacheSpec {
                    block_size,
                    write_miss_policy,
                    replacement_policy,
                    levels: self.levels,
                };
                debug!("Parsed cache specification with {} levels, block size {}", spec.levels.len(), spec.block_size);
                Ok(spec)
            }
            _ => Err(ConfigurationError::Underspecified(missing)),
        }
    }
}

fn expect_tokens(line: usize, directive: &'static str, tokens: &[&str], expected: usize) -> Result<(), ConfigurationError> {
    if tokens.len() == expected {
        Ok(())
    } else {
        Err(ConfigurationError::FieldCount {
            line,
            directive,
            expected,
            found: tokens.len(),
        })
    }
}

fn number(line: usize, field: &'static str, token: &str) -> Result<u64, ConfigurationError> {
    token.parse().map_err(|_| ConfigurationError::NotANumber {
        line,
        field,
        value: token.to_string(),
    })
}

fn set_once<T>(slot: &mut Option<T>, value: T, line: usize, directive: &'static str) -> Result<(), ConfigurationError> {
    if slot.is_some() {
        return Err(ConfigurationError::Duplicate { line, directive });
    }
    *slot = Some(value);
    Ok(())
}
