//! Flip registry — creates and looks up propositions.

use stackflip_types::{
    AccountId, BlockHeight, Flip, FlipError, FlipId, Result, constants,
};

use crate::store::Ledger;

/// Assigns sequential flip ids and stores new flips.
pub struct FlipRegistry<'l> {
    ledger: &'l Ledger,
}

impl<'l> FlipRegistry<'l> {
    #[must_use]
    pub fn new(ledger: &'l Ledger) -> Self {
        Self { ledger }
    }

    /// Register a new flip.
    ///
    /// Id assignment and insertion happen in one ledger transaction, so
    /// concurrent creators never share an id.
    ///
    /// # Errors
    /// - `InvalidQuestion` if the question is blank or too long
    /// - `InvalidDeadline` if `deadline <= now`
    pub fn create_flip(
        &self,
        creator: AccountId,
        question: impl Into<String>,
        deadline: BlockHeight,
        now: BlockHeight,
    ) -> Result<Flip> {
        let question = question.into();
        validate_question(&question)?;
        if deadline <= now {
            return Err(FlipError::InvalidDeadline { deadline, now });
        }

        let flip = self.ledger.transact(|txn| {
            let id = txn.allocate_flip_id()?;
            let flip = Flip::new(id, creator, question, deadline, now);
            txn.put_flip(flip.clone());
            Ok(flip)
        })?;

        tracing::info!(
            flip = %flip.id,
            creator = %flip.creator,
            deadline,
            "Flip created"
        );
        Ok(flip)
    }

    /// # Errors
    /// `NotFound` if no flip has this id.
    pub fn get_flip(&self, flip_id: FlipId) -> Result<Flip> {
        self.ledger
            .read(|s| s.flip(flip_id).cloned())?
            .ok_or(FlipError::NotFound(flip_id))
    }

    /// Number of flips created so far.
    pub fn count(&self) -> Result<u64> {
        self.ledger.read(|s| s.flip_count())
    }

    /// Every flip, oldest first.
    pub fn list(&self) -> Result<Vec<Flip>> {
        self.ledger.read(|s| s.flips().cloned().collect())
    }

    /// Flips created by `creator`, oldest first.
    pub fn by_creator(&self, creator: &AccountId) -> Result<Vec<Flip>> {
        self.ledger.read(|s| {
            s.flips()
                .filter(|f| &f.creator == creator)
                .cloned()
                .collect()
        })
    }
}

fn validate_question(question: &str) -> Result<()> {
    if question.trim().is_empty() {
        return Err(FlipError::InvalidQuestion {
            reason: "question is empty".into(),
        });
    }
    if question.len() > constants::MAX_QUESTION_LEN {
        return Err(FlipError::InvalidQuestion {
            reason: format!(
                "question is {} bytes, limit is {}",
                question.len(),
                constants::MAX_QUESTION_LEN
            ),
        });
    }
    Ok(())
}
