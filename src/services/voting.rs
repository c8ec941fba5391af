use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::petition::{NewPetition, Petition};
use crate::models::vote::{Vote, VoteTransition, VoteType};
use crate::store::EntityStore;

pub use crate::models::petition::TallyAudit;

/// Column width of `petitions.title`.
pub const MAX_TITLE_LEN: usize = 200;
/// Column width of `petitions.movie_title`.
pub const MAX_MOVIE_TITLE_LEN: usize = 255;

/// Outcome of a cast, with the message shown back to the voter.
#[derive(Debug, Serialize)]
pub struct VoteReceipt {
    pub petition: Petition,
    pub vote: Vote,
    #[serde(flatten)]
    pub transition: VoteTransition,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct PetitionDetail {
    pub petition: Petition,
    pub user_vote: Option<Vote>,
}

fn required(field: &str, value: &str, max_len: Option<usize>) -> Result<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    if let Some(max) = max_len {
        if value.chars().count() > max {
            return Err(AppError::Validation(format!(
                "{} cannot exceed {} characters",
                field, max
            )));
        }
    }

    Ok(value.to_string())
}

fn receipt_message(transition: &VoteTransition) -> String {
    match transition {
        VoteTransition::Recorded { vote_type } => format!("Thank you for voting {}!", vote_type),
        VoteTransition::Changed { to, .. } => format!("Your vote has been updated to {}.", to),
        VoteTransition::Unchanged { vote_type } => format!("You already voted {}.", vote_type),
    }
}

async fn find_petition(store: &dyn EntityStore, petition_id: Uuid) -> Result<Petition> {
    store
        .find_petition(petition_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Petition not found".to_string()))
}

#[tracing::instrument(skip(store, title, description, movie_title))]
pub async fn create_petition(
    store: &dyn EntityStore,
    user_id: Uuid,
    title: &str,
    description: &str,
    movie_title: &str,
) -> Result<Petition> {
    let title = required("Title", title, Some(MAX_TITLE_LEN))?;
    let description = required("Description", description, None)?;
    let movie_title = required("Movie title", movie_title, Some(MAX_MOVIE_TITLE_LEN))?;

    let petition = store
        .insert_petition(NewPetition {
            title,
            description,
            movie_title,
            created_by: user_id,
        })
        .await?;

    tracing::info!(petition_id = %petition.id, movie_title = %petition.movie_title, "Petition created");

    Ok(petition)
}

pub async fn list_petitions(store: &dyn EntityStore) -> Result<Vec<Petition>> {
    Ok(store.list_petitions().await?)
}

pub async fn get_petition(store: &dyn EntityStore, petition_id: Uuid) -> Result<Petition> {
    find_petition(store, petition_id).await
}

pub async fn petition_detail(
    store: &dyn EntityStore,
    petition_id: Uuid,
    viewer: Option<Uuid>,
) -> Result<PetitionDetail> {
    let petition = find_petition(store, petition_id).await?;

    let user_vote = match viewer {
        Some(user_id) => store.find_vote(petition_id, user_id).await?,
        None => None,
    };

    Ok(PetitionDetail {
        petition,
        user_vote,
    })
}

/// Casts or changes `user_id`'s vote.
///
/// `vote_type` must be `"yes"` or `"no"`. Repeating the current vote is not
/// an error; the receipt reports it as unchanged.
#[tracing::instrument(skip(store))]
pub async fn cast_vote(
    store: &dyn EntityStore,
    petition_id: Uuid,
    user_id: Uuid,
    vote_type: &str,
) -> Result<VoteReceipt> {
    let vote_type: VoteType = vote_type
        .parse()
        .map_err(|_| AppError::Validation("Invalid vote type.".to_string()))?;

    let cast = store
        .cast_vote(petition_id, user_id, vote_type)
        .await?
        .ok_or_else(|| AppError::NotFound("Petition not found".to_string()))?;

    tracing::info!(
        outcome = ?cast.transition,
        yes_votes = cast.petition.yes_votes,
        no_votes = cast.petition.no_votes,
        "Vote cast"
    );

    Ok(VoteReceipt {
        message: receipt_message(&cast.transition),
        petition: cast.petition,
        vote: cast.vote,
        transition: cast.transition,
    })
}

/// The user's vote on a petition, if any. Absence is not an error.
pub async fn get_user_vote(
    store: &dyn EntityStore,
    petition_id: Uuid,
    user_id: Uuid,
) -> Result<Option<Vote>> {
    Ok(store.find_vote(petition_id, user_id).await?)
}

/// Deletes a petition and its votes. Only the creator may do this.
#[tracing::instrument(skip(store))]
pub async fn delete_petition(
    store: &dyn EntityStore,
    petition_id: Uuid,
    user_id: Uuid,
) -> Result<()> {
    let petition = find_petition(store, petition_id).await?;

    if petition.created_by != user_id {
        tracing::warn!(creator = %petition.created_by, "Rejected delete of another user's petition");
        return Err(AppError::Authorization(
            "Only the creator can delete this petition".to_string(),
        ));
    }

    if !store.delete_petition(petition_id).await? {
        return Err(AppError::NotFound("Petition not found".to_string()));
    }

    tracing::info!("Petition deleted");

    Ok(())
}

/// Compares a petition's counters with its vote rows.
pub async fn audit_tally(store: &dyn EntityStore, petition_id: Uuid) -> Result<TallyAudit> {
    let audit = store
        .tally(petition_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Petition not found".to_string()))?;

    if !audit.is_consistent() {
        tracing::warn!(
            petition_id = %petition_id,
            yes_votes = audit.yes_votes,
            no_votes = audit.no_votes,
            vote_rows = audit.vote_rows,
            "Petition counters disagree with vote rows"
        );
    }

    Ok(audit)
}
