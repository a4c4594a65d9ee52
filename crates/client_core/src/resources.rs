use serde::{de::DeserializeOwned, Serialize};
use shared::domain::{NewReview, NewSymptom, Review, Symptom};

/// Describes one backend collection: its item and create-payload types and
/// how it is addressed and named.
pub trait Resource: Send + Sync + 'static {
    type Item: Clone + Send + Sync + DeserializeOwned + 'static;
    type Payload: Send + Sync + Serialize + 'static;

    /// Path segment under the API base url, e.g. `reviews`.
    const COLLECTION: &'static str;
    /// Human label for one item, used in notifications.
    const SINGULAR: &'static str;
}

pub struct Reviews;

impl Resource for Reviews {
    type Item = Review;
    type Payload = NewReview;

    const COLLECTION: &'static str = "reviews";
    const SINGULAR: &'static str = "review";
}

pub struct Symptoms;

impl Resource for Symptoms {
    type Item = Symptom;
    type Payload = NewSymptom;

    const COLLECTION: &'static str = "symptoms";
    const SINGULAR: &'static str = "symptom";
}
