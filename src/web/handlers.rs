use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderName, HeaderValue, StatusCode},
};
use serde::{Deserialize, Serialize};

use super::Result;
use super::version::{API_VERSION_HEADER, RequestedVersion};
use crate::core::{CatFacts, DogId};
use crate::resilience::AdmissionStats;
use crate::service::{AdoptionOutcome, DogView};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub admission: Vec<AdmissionStats>,
}

#[derive(Debug, Deserialize)]
pub struct AdoptionQuery {
    pub owner: String,
}

pub async fn healthcheck(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        admission: state.admission.stats().await,
    })
}

pub async fn list_dogs(
    State(state): State<AppState>,
    RequestedVersion(version): RequestedVersion,
) -> Result<([(HeaderName, HeaderValue); 1], Json<Vec<DogView>>)> {
    let dogs = state.listing.list(version).await?;
    Ok((
        [(
            HeaderName::from_static(API_VERSION_HEADER),
            HeaderValue::from_static(version.token()),
        )],
        Json(dogs),
    ))
}

/// Adopts a dog. Unknown ids are accepted and ignored.
pub async fn adopt_dog(
    State(state): State<AppState>,
    Path(dog_id): Path<DogId>,
    Query(query): Query<AdoptionQuery>,
) -> Result<StatusCode> {
    match state.adoption.adopt(dog_id, &query.owner).await? {
        AdoptionOutcome::Adopted(_) | AdoptionOutcome::UnknownDog(_) => Ok(StatusCode::OK),
    }
}

pub async fn cat_facts(State(state): State<AppState>) -> Result<Json<CatFacts>> {
    let facts = state.facts.facts().await?;
    Ok(Json(facts))
}
