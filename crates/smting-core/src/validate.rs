use std::collections::HashSet;

use smting_types::models::{Location, Profile};

use crate::error::ValidationError;

pub const NICKNAME_MAX_CHARS: usize = 20;
pub const INTRO_MAX_CHARS: usize = 500;
pub const MIN_AGE: u8 = 19;
pub const MAX_AGE: u8 = 99;
pub const MAX_TOP_TAGS: usize = 3;
pub const MESSAGE_MAX_CHARS: usize = 1000;

pub fn location(loc: &Location) -> Result<(), ValidationError> {
    let ok = loc.latitude.is_finite()
        && loc.longitude.is_finite()
        && (-90.0..=90.0).contains(&loc.latitude)
        && (-180.0..=180.0).contains(&loc.longitude);
    if ok {
        Ok(())
    } else {
        Err(ValidationError::Coordinates {
            latitude: loc.latitude,
            longitude: loc.longitude,
        })
    }
}

/// Check every invariant of a profile about to be written.
pub fn profile(p: &Profile) -> Result<(), ValidationError> {
    let nickname_len = p.nickname.trim().chars().count();
    if nickname_len == 0 || nickname_len > NICKNAME_MAX_CHARS {
        return Err(ValidationError::Nickname {
            max: NICKNAME_MAX_CHARS,
        });
    }
    if !(MIN_AGE..=MAX_AGE).contains(&p.age) {
        return Err(ValidationError::Age(p.age));
    }
    if p.intro.chars().count() > INTRO_MAX_CHARS {
        return Err(ValidationError::Intro {
            max: INTRO_MAX_CHARS,
        });
    }
    if p.interest_tags.iter().any(|t| t.trim().is_empty()) {
        return Err(ValidationError::BlankTag);
    }
    if p.top_tags.len() > MAX_TOP_TAGS {
        return Err(ValidationError::TooManyTopTags {
            max: MAX_TOP_TAGS,
            got: p.top_tags.len(),
        });
    }

    let mut seen = HashSet::new();
    for tag in &p.top_tags {
        if !p.interest_tags.contains(tag) {
            return Err(ValidationError::TopTagNotInterest(tag.clone()));
        }
        if !seen.insert(tag) {
            return Err(ValidationError::DuplicateTopTag(tag.clone()));
        }
    }

    if let Some(loc) = &p.location {
        location(loc)?;
    }
    Ok(())
}

pub fn message_content(content: &str) -> Result<(), ValidationError> {
    let len = content.trim().chars().count();
    if len == 0 || content.chars().count() > MESSAGE_MAX_CHARS {
        return Err(ValidationError::MessageContent {
            max: MESSAGE_MAX_CHARS,
        });
    }
    Ok(())
}
