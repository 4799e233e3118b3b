use std::fmt;
use log::debug;
use serde::{Deserialize, Serialize};
use crate::config::{CacheSpec, LevelSpec};
use crate::error::ConfigurationError;

/// The replacement policy token given to the oracle variants
pub const OPT: &str = "OPT";

/// The three derived configurations
///
/// Each one adds one more source of non-ideal behaviour on top of the previous one, which is what
/// lets a miss be attributed to the first configuration it shows up in:
///
/// * `Capacity`: OPT replacement, every level's associativity forced to 1
/// * `Associative`: OPT replacement, the specified associativity
/// * `Real`: the specified replacement policy and associativity
///
/// Note that `Capacity` uses an associativity of 1 rather than a fully associative cache. This is
/// the behaviour the downstream tooling was built against, so it's kept as is, even though a
/// classic capacity miss oracle would be fully associative.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantKind {
    Capacity,
    Associative,
    Real,
}

impl VariantKind {
    /// All variants, in attribution order
    pub const ALL: [VariantKind; 3] = [VariantKind::Capacity, VariantKind::Associative, VariantKind::Real];

    pub fn name(&self) -> &'static str {
        match self {
            VariantKind::Capacity => "capacity",
            VariantKind::Associative => "associative",
            VariantKind::Real => "real",
        }
    }

    fn replacement_policy<'a>(&self, spec: &'a CacheSpec) -> &'a str {
        match self {
            VariantKind::Capacity | VariantKind::Associative => OPT,
            VariantKind::Real => &spec.replacement_policy,
        }
    }

    fn associativity(&self, level: &LevelSpec) -> u64 {
        match self {
            VariantKind::Capacity => 1,
            VariantKind::Associative | VariantKind::Real => level.associativity,
        }
    }

    /// Applies this variant's transform to a specification. The spec is assumed to be valid, use
    /// [`derive`] to validate and build all three at once.
    pub fn apply(&self, spec: &CacheSpec) -> Variant {
        Variant {
            kind: *self,
            block_size: spec.block_size,
            write_miss_policy: spec.write_miss_policy.clone(),
            replacement_policy: self.replacement_policy(spec).to_string(),
            levels: spec
                .levels
                .iter()
                .map(|level| LevelSpec {
                    num_blocks: level.num_blocks,
                    associativity: self.associativity(level),
                    write_policy: level.write_policy.clone(),
                })
                .collect(),
        }
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A derived cache configuration, ready to hand to a simulator
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub kind: VariantKind,
    pub block_size: u64,
    pub write_miss_policy: String,
    pub replacement_policy: String,
    pub levels: Vec<LevelSpec>,
}

/// The result of derivation, one configuration per variant
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VariantSet {
    pub capacity: Variant,
    pub associative: Variant,
    pub real: Variant,
}

impl VariantSet {
    pub fn get(&self, kind: VariantKind) -> &Variant {
        match kind {
            VariantKind::Capacity => &self.capacity,
            VariantKind::Associative => &self.associative,
            VariantKind::Real => &self.real,
        }
    }

    /// Iterates over the variants in attribution order
    pub fn iter(&self) -> impl Iterator<Item = &Variant> {
        VariantKind::ALL.into_iter().map(move |kind| self.get(kind))
    }
}

/// Derives the capacity, associative, and real configurations from a specification
///
/// Fails before building anything if the specification is invalid
///
/// # Examples
///
/// ```
/// use misslib::config::{CacheSpec, LevelSpec};
/// use misslib::variant::derive;
/// let spec = CacheSpec {
///     block_size: 64,
///     write_miss_policy: "allocate".to_string(),
///     replacement_policy: "LRU".to_string(),
///     levels: vec![LevelSpec::new(100, 4, "write-back")],
/// };
/// let variants = derive(&spec).unwrap();
/// assert_eq!(variants.capacity.levels[0].associativity, 1);
/// assert_eq!(variants.associative.replacement_policy, "OPT");
/// assert_eq!(variants.real.replacement_policy, "LRU");
/// ```
pub fn derive(spec: &CacheSpec) -> Result<VariantSet, ConfigurationError> {
    spec.validate()?;
    debug!("Deriving variants for a {} level hierarchy", spec.levels.len());
    Ok(VariantSet {
        capacity: VariantKind::Capacity.apply(spec),
        associative: VariantKind::Associative.apply(spec),
        real: VariantKind::Real.apply(spec),
    })
}
