use crate::errors::EvolutionError;

use serde::{Deserialize, Serialize};

/// Species identifier. Specifies
/// the generation in which the species
/// was born, and the count of other species
/// generated in the _same generation_ before
/// the one identified (i.e, if it was the
/// third species born in generation 5, it
/// will be species [5, 2]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpeciesId(pub usize, pub usize);

/// Species are non-empty collections of genetically
/// close members. Membership is decided by a
/// [speciation strategy], usually by measuring
/// the genetic distance to a _representative_,
/// which is always one of the species' members.
///
/// [speciation strategy]: crate::SpeciationStrategy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "SpeciesRecord<M>")]
pub struct Species<M> {
    id: SpeciesId,
    members: Vec<M>,
    representative: usize,
}

/// Serialized form of a [`Species`],
/// checked on deserialization.
#[derive(Deserialize)]
struct SpeciesRecord<M> {
    id: SpeciesId,
    members: Vec<M>,
    representative: usize,
}

impl<M> TryFrom<SpeciesRecord<M>> for Species<M> {
    type Error = EvolutionError;

    fn try_from(record: SpeciesRecord<M>) -> Result<Self, Self::Error> {
        Species::new(record.id, record.members, record.representative)
    }
}

impl<M> Species<M> {
    /// Creates a new species with the specified ID and
    /// members, the `representative`-th of which
    /// represents the species.
    ///
    /// # Errors
    /// Fails if `members` is empty or `representative`
    /// is out of bounds.
    ///
    /// # Examples
    /// ```
    /// use neatforge::{Species, SpeciesId};
    ///
    /// let species = Species::new(SpeciesId(1, 0), vec!["a", "b"], 1).unwrap();
    /// assert_eq!(species.representative(), &"b");
    ///
    /// assert!(Species::<&str>::new(SpeciesId(1, 0), vec![], 0).is_err());
    /// ```
    pub fn new(id: SpeciesId, members: Vec<M>, representative: usize) -> Result<Species<M>, EvolutionError> {
        if members.is_empty() {
            return Err(EvolutionError::InvalidInput(format!(
                "species {:?} has no members",
                id
            )));
        }
        if representative >= members.len() {
            return Err(EvolutionError::InvalidInput(format!(
                "representative {} of species {:?} is out of bounds ({} members)",
                representative,
                id,
                members.len()
            )));
        }
        Ok(Species {
            id,
            members,
            representative,
        })
    }

    /// Builds a species from parts already known to be valid.
    pub(crate) fn from_parts(id: SpeciesId, members: Vec<M>, representative: usize) -> Species<M> {
        debug_assert!(representative < members.len());
        Species {
            id,
            members,
            representative,
        }
    }

    /// Returns the species' ID.
    pub fn id(&self) -> SpeciesId {
        self.id
    }

    /// Returns the species' members.
    pub fn members(&self) -> &[M] {
        &self.members
    }

    /// Returns the species' representative.
    pub fn representative(&self) -> &M {
        &self.members[self.representative]
    }

    /// Returns the index of the representative
    /// among the species' members.
    pub fn representative_index(&self) -> usize {
        self.representative
    }

    /// Returns the number of members. Never 0.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn into_members(self) -> Vec<M> {
        self.members
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialized_species_are_validated() {
        let species = Species::new(SpeciesId(2, 1), vec![7u8, 8], 1).unwrap();
        let json = serde_json::to_string(&species).unwrap();
        let loaded: Species<u8> = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.id(), SpeciesId(2, 1));
        assert_eq!(loaded.representative(), &8);

        let out_of_bounds = json.replace("\"representative\":1", "\"representative\":2");
        assert!(serde_json::from_str::<Species<u8>>(&out_of_bounds).is_err());
        assert!(serde_json::from_str::<Species<u8>>(
            r#"{"id":[0,0],"members":[],"representative":0}"#
        )
        .is_err());
    }
}
