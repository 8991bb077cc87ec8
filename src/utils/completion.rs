//! 资料完成度评分
//!
//! Each condition contributes a fixed weight; the weights sum to 100 so a
//! profile is complete exactly when every condition holds.

use crate::models::user::Profile;

pub const IDENTITY_WEIGHT: u8 = 25;
pub const PHOTO_WEIGHT: u8 = 15;
pub const GENDER_WEIGHT: u8 = 5;
pub const COUNTRY_WEIGHT: u8 = 10;
pub const BIO_WEIGHT: u8 = 15;
pub const LONG_BIO_WEIGHT: u8 = 10;
pub const WEBSITE_WEIGHT: u8 = 8;
pub const SOCIAL_WEIGHT: u8 = 4;

pub const BIO_MIN_CHARS: usize = 20;
pub const LONG_BIO_MIN_CHARS: usize = 50;

fn filled(value: &Option<String>) -> bool {
    value.as_deref().map_or(false, |v| !v.trim().is_empty())
}

fn at_least(value: &Option<String>, min_chars: usize) -> bool {
    value
        .as_deref()
        .map_or(false, |v| v.trim().chars().count() >= min_chars)
}

pub fn score(profile: &Profile) -> u8 {
    let identity = filled(&profile.first_name)
        && filled(&profile.last_name)
        && !profile.email.trim().is_empty()
        && filled(&profile.username);

    let weights = [
        (identity, IDENTITY_WEIGHT),
        (filled(&profile.photo_url), PHOTO_WEIGHT),
        (profile.gender.is_some(), GENDER_WEIGHT),
        (filled(&profile.country), COUNTRY_WEIGHT),
        (at_least(&profile.bio, BIO_MIN_CHARS), BIO_WEIGHT),
        (at_least(&profile.long_bio, LONG_BIO_MIN_CHARS), LONG_BIO_WEIGHT),
        (filled(&profile.website), WEBSITE_WEIGHT),
        (filled(&profile.twitter), SOCIAL_WEIGHT),
        (filled(&profile.linkedin), SOCIAL_WEIGHT),
        (filled(&profile.medium), SOCIAL_WEIGHT),
    ];

    let total: u32 = weights
        .iter()
        .filter(|(met, _)| *met)
        .map(|(_, weight)| u32::from(*weight))
        .sum();

    total.min(100) as u8
}

pub fn is_complete(score: u8) -> bool {
    score == 100
}
