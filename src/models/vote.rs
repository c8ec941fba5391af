use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "vote_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Yes,
    No,
}

impl VoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteType::Yes => "yes",
            VoteType::No => "no",
        }
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid vote type: {0:?}")]
pub struct InvalidVoteType(pub String);

impl FromStr for VoteType {
    type Err = InvalidVoteType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "yes" => Ok(VoteType::Yes),
            "no" => Ok(VoteType::No),
            other => Err(InvalidVoteType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Vote {
    pub id: Uuid,
    pub petition_id: Uuid,
    pub user_id: Uuid,
    pub vote_type: VoteType,
    pub created_at: DateTime<Utc>,
}

/// The effect of one cast on a (petition, user) pair.
///
/// ```text
/// NoVote   --yes--> VotedYes   yes += 1
/// NoVote   --no---> VotedNo    no  += 1
/// VotedYes --no---> VotedNo    yes -= 1, no += 1
/// VotedNo  --yes--> VotedYes   no  -= 1, yes += 1
/// same type again              no change
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VoteTransition {
    Recorded { vote_type: VoteType },
    Changed { from: VoteType, to: VoteType },
    Unchanged { vote_type: VoteType },
}

impl VoteTransition {
    pub fn plan(prior: Option<VoteType>, cast: VoteType) -> Self {
        match prior {
            None => VoteTransition::Recorded { vote_type: cast },
            Some(prior) if prior == cast => VoteTransition::Unchanged { vote_type: cast },
            Some(prior) => VoteTransition::Changed {
                from: prior,
                to: cast,
            },
        }
    }

    /// Counter adjustments as `(yes_delta, no_delta)`.
    pub fn deltas(&self) -> (i32, i32) {
        fn unit(t: VoteType) -> (i32, i32) {
            match t {
                VoteType::Yes => (1, 0),
                VoteType::No => (0, 1),
            }
        }

        match *self {
            VoteTransition::Recorded { vote_type } => unit(vote_type),
            VoteTransition::Unchanged { .. } => (0, 0),
            VoteTransition::Changed { from, to } => {
                let (yes_out, no_out) = unit(from);
                let (yes_in, no_in) = unit(to);
                (yes_in - yes_out, no_in - no_out)
            }
        }
    }

    /// The vote type the pair ends up with.
    pub fn resulting_type(&self) -> VoteType {
        match *self {
            VoteTransition::Recorded { vote_type } | VoteTransition::Unchanged { vote_type } => {
                vote_type
            }
            VoteTransition::Changed { to, .. } => to,
        }
    }
}

impl Vote {
    /// Finds a user's vote on a petition
    pub async fn find_by_petition_and_user<'e, E: PgExecutor<'e>>(
        executor: E,
        petition_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM votes WHERE petition_id = $1 AND user_id = $2")
            .bind(petition_id)
            .bind(user_id)
            .fetch_optional(executor)
            .await
    }

    /// Creates a new vote record
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        petition_id: Uuid,
        user_id: Uuid,
        vote_type: VoteType,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO votes (petition_id, user_id, vote_type)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(petition_id)
        .bind(user_id)
        .bind(vote_type)
        .fetch_one(executor)
        .await
    }

    /// Switches an existing vote to `vote_type`
    pub async fn set_type<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        vote_type: VoteType,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>("UPDATE votes SET vote_type = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(vote_type)
            .fetch_one(executor)
            .await
    }

    /// Counts the vote rows of a petition
    pub async fn count_for_petition<'e, E: PgExecutor<'e>>(
        executor: E,
        petition_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM votes WHERE petition_id = $1")
            .bind(petition_id)
            .fetch_one(executor)
            .await?;

        Ok(count.0)
    }
}
