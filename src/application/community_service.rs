//! Community Service - post feed, votes, likes and profiles
//!
//! Thin use cases over the list, set and hash backed repositories. Input is
//! validated here so that adapters only ever see well-formed requests.

use crate::domain::entities::{Ballot, Post, ProfileUpdate, UserProfile};
use crate::domain::errors::{StoreError, ValidationError};
use crate::domain::ports::{PostRepository, ProfileRepository, VoteRepository};
use crate::domain::value_objects::PageRequest;
use std::sync::Arc;
use thiserror::Error;

/// Candidate whose votes are tracked.
pub const DEFAULT_CANDIDATE: &str = "candidate:1";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommunityError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
}

pub struct CommunityService {
    posts: Arc<dyn PostRepository>,
    votes: Arc<dyn VoteRepository>,
    profiles: Arc<dyn ProfileRepository>,
    candidate: String,
}

impl CommunityService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        votes: Arc<dyn VoteRepository>,
        profiles: Arc<dyn ProfileRepository>,
    ) -> Self {
        Self {
            posts,
            votes,
            profiles,
            candidate: DEFAULT_CANDIDATE.to_string(),
        }
    }

    // ===== Posts =====

    pub async fn list_posts(&self, page: PageRequest) -> Result<Vec<Post>, CommunityError> {
        Ok(self.posts.page(page).await?)
    }

    pub async fn create_post(&self, post: &Post) -> Result<(), CommunityError> {
        self.posts.prepend(post).await?;
        tracing::debug!("created post {}", post.key);
        Ok(())
    }

    /// Delete one matching post. Both fields must match.
    pub async fn delete_post(&self, post: &Post) -> Result<(), CommunityError> {
        let removed = self.posts.remove(post).await?;
        if removed == 0 {
            return Err(CommunityError::NotFound("No posts found to delete"));
        }
        tracing::debug!("deleted post {}", post.key);
        Ok(())
    }

    // ===== Votes =====

    pub async fn count_votes(&self) -> Result<u64, CommunityError> {
        Ok(self.votes.tally(&self.candidate).await?)
    }

    pub async fn cast_vote(&self, ballot: &Ballot) -> Result<(), CommunityError> {
        if ballot.id.is_empty() {
            return Err(ValidationError::MissingField("id").into());
        }
        if !self.votes.cast(&self.candidate, &ballot.id).await? {
            return Err(CommunityError::Conflict("this user already voted"));
        }
        tracing::debug!("vote from {} for {}", ballot.id, self.candidate);
        Ok(())
    }

    // ===== Likes =====

    pub async fn like_count(&self, id: &str) -> Result<i64, CommunityError> {
        if id.is_empty() {
            return Err(ValidationError::MissingField("id").into());
        }
        self.profiles
            .like_count(id)
            .await?
            .ok_or(CommunityError::NotFound("no likes recorded"))
    }

    pub async fn like(&self, id: &str) -> Result<i64, CommunityError> {
        if id.is_empty() {
            return Err(ValidationError::MissingField("id").into());
        }
        Ok(self.profiles.like(id).await?)
    }

    // ===== Profiles =====

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), CommunityError> {
        if update.id.is_empty() {
            return Err(ValidationError::MissingField("User ID").into());
        }
        if update.is_noop() {
            return Ok(());
        }
        self.profiles.apply(update).await?;
        Ok(())
    }

    pub async fn profile(&self, id: &str) -> Result<UserProfile, CommunityError> {
        if id.is_empty() {
            return Err(ValidationError::MissingField("User ID").into());
        }
        self.profiles
            .get(id)
            .await?
            .ok_or(CommunityError::NotFound("user profile not found"))
    }
}
