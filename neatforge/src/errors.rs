use std::error::Error;
use std::fmt;

/// An error type indicating an invalid construction
/// or use of a [`WeightedDistribution`].
///
/// [`WeightedDistribution`]: crate::WeightedDistribution
#[derive(Debug, Clone, PartialEq)]
pub enum DistributionError {
    /// The distribution was built from no outcomes.
    Empty,
    /// An outcome carried a negative or non-finite value.
    InvalidValue { index: usize, value: f64 },
    /// The outcome to be removed is not part of the distribution.
    UnknownOutcome,
    /// Removing the outcome would leave the distribution empty.
    Exhausted,
}

/// An error type indicating a failure during parent selection.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionError {
    /// A fitness value was NaN or infinite.
    InvalidFitness(f64),
    /// The selection distribution could not be built.
    Distribution(DistributionError),
    /// Fewer candidates than requested could be drawn.
    InsufficientCandidates { requested: usize, selected: usize },
}

/// An error type indicating an invalid configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A probability or proportion outside of `[0, 1]`.
    Probability { parameter: &'static str, value: f64 },
    /// A value that must be strictly positive.
    NonPositive { parameter: &'static str, value: f64 },
    /// A value that must not be negative.
    Negative { parameter: &'static str, value: f64 },
    /// A value that must be finite.
    NonFinite { parameter: &'static str },
    /// A range whose lower bound is not below its upper bound.
    EmptyRange { min: f64, max: f64 },
    /// Proportions that should add up to 1.
    ProportionSum { parameter: &'static str, sum: f64 },
    /// A `[min, max]` band with `min > max`.
    InvertedBand { parameter: &'static str, min: usize, max: usize },
    /// A set of weights in which none is positive.
    AllZero { parameter: &'static str },
}

/// An error type indicating a failure of k-medoids clustering.
#[derive(Debug, Clone, PartialEq)]
pub enum KMedoidsError {
    /// No items were given to cluster.
    NoItems,
    /// The requested cluster count is 0 or exceeds the item count.
    InvalidClusterCount { clusters: usize, items: usize },
    /// The seed clusters are not a partition of the items.
    InvalidSeed { item: usize },
    /// A distance evaluated to NaN.
    InvalidDistance { first: usize, second: usize },
    /// An empty cluster could not be refilled from another cluster.
    NoOutlierAvailable { cluster: usize },
}

/// An error type indicating a failure to speciate a set of members.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeciationError {
    /// There were no members to speciate.
    NoMembers,
    /// A genetic distance evaluated to NaN.
    InvalidDistance,
    /// The underlying clustering failed.
    Clustering(KMedoidsError),
}

/// An error type for the evolution engine.
///
/// Errors are either caused by invalid input at the
/// call boundary, or by a violated engine invariant,
/// which signals that the caller's factories or settings
/// are inconsistent with the engine.
#[derive(Debug)]
pub enum EvolutionError {
    /// An argument was invalid.
    InvalidInput(String),
    /// An engine invariant was violated.
    InvariantViolation(String),
    /// A configuration value was invalid.
    Config(ConfigError),
    /// Parent selection failed.
    Selection(SelectionError),
    /// Speciation failed.
    Speciation(SpeciationError),
    /// A genome factory failed.
    Reproduction(Box<dyn Error + Send + Sync>),
}

impl fmt::Display for DistributionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "weighted distribution built from no outcomes"),
            Self::InvalidValue { index, value } => write!(
                f,
                "outcome {} has invalid value {} (values must be finite and non-negative)",
                index, value
            ),
            Self::UnknownOutcome => write!(f, "attempted removal of an unknown outcome"),
            Self::Exhausted => write!(f, "outcome removal would empty the distribution"),
        }
    }
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFitness(value) => write!(f, "invalid fitness value {}", value),
            Self::Distribution(e) => write!(f, "selection distribution: {}", e),
            Self::InsufficientCandidates {
                requested,
                selected,
            } => write!(
                f,
                "requested {} selections but only {} candidates could be drawn",
                requested, selected
            ),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Probability { parameter, value } => {
                write!(f, "{} must be within [0, 1], got {}", parameter, value)
            }
            Self::NonPositive { parameter, value } => {
                write!(f, "{} must be positive, got {}", parameter, value)
            }
            Self::Negative { parameter, value } => {
                write!(f, "{} must not be negative, got {}", parameter, value)
            }
            Self::NonFinite { parameter } => write!(f, "{} must be finite", parameter),
            Self::EmptyRange { min, max } => {
                write!(f, "value range [{}, {}] is empty", min, max)
            }
            Self::ProportionSum { parameter, sum } => {
                write!(f, "{} must add up to 1, got {}", parameter, sum)
            }
            Self::InvertedBand { parameter, min, max } => {
                write!(f, "{} band [{}, {}] is inverted", parameter, min, max)
            }
            Self::AllZero { parameter } => {
                write!(f, "at least one of {} must be positive", parameter)
            }
        }
    }
}

impl fmt::Display for KMedoidsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoItems => write!(f, "k-medoids clustering of no items"),
            Self::InvalidClusterCount { clusters, items } => write!(
                f,
                "cannot form {} clusters from {} items",
                clusters, items
            ),
            Self::InvalidSeed { item } => write!(
                f,
                "seed clusters are not a partition of the items (item {})",
                item
            ),
            Self::InvalidDistance { first, second } => {
                write!(f, "distance between items {} and {} is NaN", first, second)
            }
            Self::NoOutlierAvailable { cluster } => write!(
                f,
                "empty cluster {} has no outlier available to become its medoid",
                cluster
            ),
        }
    }
}

impl fmt::Display for SpeciationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMembers => write!(f, "speciation of an empty member set"),
            Self::InvalidDistance => write!(f, "genetic distance evaluated to NaN"),
            Self::Clustering(e) => write!(f, "speciation clustering: {}", e),
        }
    }
}

impl fmt::Display for EvolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
            Self::InvariantViolation(msg) => write!(f, "invariant violation: {}", msg),
            Self::Config(e) => write!(f, "invalid configuration: {}", e),
            Self::Selection(e) => write!(f, "{}", e),
            Self::Speciation(e) => write!(f, "{}", e),
            Self::Reproduction(e) => write!(f, "offspring generation: {}", e),
        }
    }
}

impl Error for DistributionError {}
impl Error for SelectionError {}
impl Error for ConfigError {}
impl Error for KMedoidsError {}
impl Error for SpeciationError {}

impl Error for EvolutionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Selection(e) => Some(e),
            Self::Speciation(e) => Some(e),
            Self::Reproduction(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<DistributionError> for SelectionError {
    fn from(e: DistributionError) -> Self {
        Self::Distribution(e)
    }
}

impl From<KMedoidsError> for SpeciationError {
    fn from(e: KMedoidsError) -> Self {
        Self::Clustering(e)
    }
}

impl From<ConfigError> for EvolutionError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<SelectionError> for EvolutionError {
    fn from(e: SelectionError) -> Self {
        Self::Selection(e)
    }
}

impl From<SpeciationError> for EvolutionError {
    fn from(e: SpeciationError) -> Self {
        Self::Speciation(e)
    }
}
