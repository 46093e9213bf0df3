use thiserror::Error;

/// Errors raised when two pets cannot form a match
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PairingError {
    #[error("A pet cannot be matched with itself (pet {0})")]
    SelfMatch(i32),

    #[error("Pet IDs must be positive, got {0}")]
    InvalidPetId(i32),
}

/// Two distinct pets proposed for a match
///
/// Keeps the order the requester gave (`pet1` is their own pet) while
/// comparing and hashing as an unordered pair.
#[derive(Debug, Clone, Copy)]
pub struct MatchPair {
    pet1_id: i32,
    pet2_id: i32,
}

impl MatchPair {
    /// Build a pair, rejecting self-matches and non-positive ids
    pub fn new(pet1_id: i32, pet2_id: i32) -> Result<Self, PairingError> {
        for id in [pet1_id, pet2_id] {
            if id <= 0 {
                return Err(PairingError::InvalidPetId(id));
            }
        }
        if pet1_id == pet2_id {
            return Err(PairingError::SelfMatch(pet1_id));
        }
        Ok(Self { pet1_id, pet2_id })
    }

    pub fn pet1_id(&self) -> i32 {
        self.pet1_id
    }

    pub fn pet2_id(&self) -> i32 {
        self.pet2_id
    }

    /// Order-insensitive key: `(min, max)`
    pub fn key(&self) -> (i32, i32) {
        if self.pet1_id < self.pet2_id {
            (self.pet1_id, self.pet2_id)
        } else {
            (self.pet2_id, self.pet1_id)
        }
    }
}

impl PartialEq for MatchPair {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for MatchPair {}

impl std::hash::Hash for MatchPair {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}
