use std::collections::BTreeSet;

use tracing::info;

use smting_types::models::{Avatar, Gender, Location, Profile, ProfileUpdate, Tendency};

use crate::clock::Clock;
use crate::discovery::RankedProfile;
use crate::error::{CoreError, StoreError, ValidationError};
use crate::geo;
use crate::matching;
use crate::store::ProfileStore;
use crate::validate;

/// Everything captured by the sign-up form. The id comes from the auth provider.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub id: String,
    pub nickname: String,
    pub age: u8,
    pub gender: Gender,
    pub tendency: Tendency,
    pub intro: String,
    pub interest_tags: BTreeSet<String>,
    pub top_tags: Vec<String>,
    pub avatar: Option<Avatar>,
    pub location: Option<Location>,
}

/// Create the profile for a freshly authenticated user. Balance starts at 0.
pub fn register(
    store: &dyn ProfileStore,
    clock: &dyn Clock,
    new: NewProfile,
) -> Result<Profile, CoreError> {
    let now = clock.now();
    let profile = Profile {
        id: new.id,
        nickname: new.nickname.trim().to_string(),
        age: new.age,
        gender: new.gender,
        tendency: new.tendency,
        intro: new.intro,
        interest_tags: new.interest_tags,
        top_tags: new.top_tags,
        location: new.location,
        last_active_at: Some(now),
        balance: 0,
        avatar: new.avatar.unwrap_or_default(),
        last_reward_on: None,
        created_at: now,
    };
    validate::profile(&profile)?;

    if store.get_profile(&profile.id)?.is_some() {
        return Err(CoreError::AlreadyExists {
            entity: "profile",
            id: profile.id,
        });
    }
    store.insert_profile(&profile)?;

    info!(user = %profile.id, tendency = %profile.tendency, "Profile registered");
    Ok(profile)
}

pub fn get(store: &dyn ProfileStore, id: &str) -> Result<Profile, CoreError> {
    store
        .get_profile(id)?
        .ok_or_else(|| CoreError::ProfileNotFound(id.to_string()))
}

/// Apply an edit. The merged profile is validated by the store against the
/// row it is about to overwrite, so a concurrent edit cannot slip an invalid
/// combination in between.
pub fn update(
    store: &dyn ProfileStore,
    id: &str,
    update: &ProfileUpdate,
) -> Result<Profile, CoreError> {
    if update.is_empty() {
        return get(store, id);
    }

    match store.update_profile(id, update, &validate::profile) {
        Ok(profile) => Ok(profile),
        Err(StoreError::NotFound { .. }) => Err(CoreError::ProfileNotFound(id.to_string())),
        Err(StoreError::Rejected(v)) => Err(CoreError::InvalidInput(v)),
        Err(e) => Err(e.into()),
    }
}

pub fn update_location(
    store: &dyn ProfileStore,
    clock: &dyn Clock,
    id: &str,
    location: Location,
) -> Result<Profile, CoreError> {
    validate::location(&location)?;
    update(
        store,
        id,
        &ProfileUpdate {
            location: Some(location),
            last_active_at: Some(clock.now()),
            ..Default::default()
        },
    )
}

/// Record that the user is active right now.
pub fn touch_activity(
    store: &dyn ProfileStore,
    clock: &dyn Clock,
    id: &str,
) -> Result<Profile, CoreError> {
    update(
        store,
        id,
        &ProfileUpdate {
            last_active_at: Some(clock.now()),
            ..Default::default()
        },
    )
}

/// `target` as seen by `viewer`: compatibility and, when both are located,
/// the distance between them. A viewer without a profile sees a rate of 0.
pub fn view(
    store: &dyn ProfileStore,
    viewer_id: &str,
    target_id: &str,
) -> Result<RankedProfile, CoreError> {
    if viewer_id == target_id {
        return Err(ValidationError::SelfTarget.into());
    }
    let target = get(store, target_id)?;
    let viewer = store.get_profile(viewer_id)?;

    let match_rate = viewer
        .as_ref()
        .map_or(0, |v| matching::profile_match_rate(v, &target));
    let distance_km = viewer
        .and_then(|v| v.location)
        .zip(target.location)
        .map(|(a, b)| geo::distance_between(&a, &b));

    Ok(RankedProfile {
        profile: target,
        match_rate,
        distance_km,
    })
}
