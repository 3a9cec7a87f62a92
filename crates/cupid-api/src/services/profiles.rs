//! Profile editing. Setup is a fixed sequence of required field groups;
//! `profile_complete` is recomputed from them on every save.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use cupid_db::Database;
use cupid_types::api::{ProfileResponse, UpdateProfileRequest};
use cupid_types::models::Profile;

use crate::error::CoreError;
use crate::services::blocking;

pub const MIN_AGE: u8 = 18;
pub const MAX_BIO_CHARS: usize = 150;
pub const MAX_PROMPTS: usize = 3;
pub const MAX_ANSWER_CHARS: usize = 100;
pub const MAX_PHOTOS: usize = 6;

/// Required field groups, in setup order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSection {
    Basics,
    About,
    Interests,
}

impl ProfileSection {
    pub const ALL: [ProfileSection; 3] = [Self::Basics, Self::About, Self::Interests];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basics => "basics",
            Self::About => "about",
            Self::Interests => "interests",
        }
    }

    fn is_filled(self, profile: &Profile) -> bool {
        match self {
            Self::Basics => {
                profile.age.is_some()
                    && profile.course.as_deref().is_some_and(|c| !c.is_empty())
                    && profile.academic_year.as_deref().is_some_and(|y| !y.is_empty())
            }
            Self::About => !profile.bio.is_empty() && !profile.photos.is_empty(),
            Self::Interests => !profile.interests.is_empty(),
        }
    }
}

impl fmt::Display for ProfileSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn missing_sections(profile: &Profile) -> Vec<ProfileSection> {
    ProfileSection::ALL
        .into_iter()
        .filter(|s| !s.is_filled(profile))
        .collect()
}

/// Check a draft and normalize it: strings trimmed, blank optionals
/// dropped, interests de-duplicated case-insensitively in input order.
pub fn validate(draft: UpdateProfileRequest) -> Result<UpdateProfileRequest, CoreError> {
    let invalid =
        |msg: String| -> Result<UpdateProfileRequest, CoreError> { Err(CoreError::InvalidProfile(msg)) };

    if let Some(age) = draft.age {
        if age < MIN_AGE {
            return invalid(format!("age must be at least {MIN_AGE}"));
        }
    }

    let bio = draft.bio.trim().to_string();
    if bio.chars().count() > MAX_BIO_CHARS {
        return invalid(format!("bio exceeds {MAX_BIO_CHARS} characters"));
    }

    if draft.prompts.len() > MAX_PROMPTS {
        return invalid(format!("at most {MAX_PROMPTS} prompts"));
    }
    let mut prompts = Vec::with_capacity(draft.prompts.len());
    for mut prompt in draft.prompts {
        prompt.question = prompt.question.trim().to_string();
        prompt.answer = prompt.answer.trim().to_string();
        if prompt.question.is_empty() {
            return invalid("prompt question is empty".into());
        }
        if prompt.answer.chars().count() > MAX_ANSWER_CHARS {
            return invalid(format!("prompt answer exceeds {MAX_ANSWER_CHARS} characters"));
        }
        prompts.push(prompt);
    }

    if draft.photos.len() > MAX_PHOTOS {
        return invalid(format!("at most {MAX_PHOTOS} photos"));
    }
    if draft.photos.iter().any(|p| p.url.trim().is_empty()) {
        return invalid("photo url is empty".into());
    }
    let primaries = draft.photos.iter().filter(|p| p.is_primary).count();
    if !draft.photos.is_empty() && primaries != 1 {
        return invalid("exactly one photo must be primary".into());
    }

    let mut interests: Vec<String> = Vec::new();
    for interest in draft.interests {
        let interest = interest.trim();
        if interest.is_empty() {
            continue;
        }
        if !interests.iter().any(|i| i.eq_ignore_ascii_case(interest)) {
            interests.push(interest.to_string());
        }
    }

    let non_blank = |s: Option<String>| {
        s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    };

    Ok(UpdateProfileRequest {
        age: draft.age,
        course: non_blank(draft.course),
        academic_year: non_blank(draft.academic_year),
        bio,
        interests,
        prompts,
        photos: draft.photos,
    })
}

pub struct ProfileEditor {
    db: Arc<Database>,
}

impl ProfileEditor {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn get_profile(&self, account_id: Uuid) -> Result<ProfileResponse, CoreError> {
        blocking(&self.db, move |db| {
            let account = db.get_account(account_id)?;
            let profile = db.get_profile(account_id)?;
            Ok(account.zip(profile))
        })
        .await?
        .map(|(account, profile)| response(profile, account.verified))
        .ok_or(CoreError::AccountNotFound)
    }

    /// Replace the whole profile with `draft`. Omitted lists clear the
    /// corresponding section.
    pub async fn update_profile(
        &self,
        account_id: Uuid,
        draft: UpdateProfileRequest,
    ) -> Result<ProfileResponse, CoreError> {
        let draft = validate(draft)?;

        let loaded = blocking(&self.db, move |db| {
            let account = db.get_account(account_id)?;
            Ok(account.map(|a| (a.full_name, a.verified)))
        })
        .await?;
        let Some((full_name, verified)) = loaded else {
            return Err(CoreError::AccountNotFound);
        };

        let profile = Profile {
            account_id,
            full_name,
            age: draft.age,
            course: draft.course,
            academic_year: draft.academic_year,
            bio: draft.bio,
            interests: draft.interests,
            prompts: draft.prompts,
            photos: draft.photos,
        };
        let complete = missing_sections(&profile).is_empty();

        let stored = profile.clone();
        let saved = blocking(&self.db, move |db| {
            db.replace_profile(&stored, complete, Utc::now())
        })
        .await?;
        if !saved {
            return Err(CoreError::AccountNotFound);
        }

        info!("Profile {} updated (complete={})", account_id, complete);
        Ok(response(profile, verified))
    }
}

fn response(profile: Profile, verified: bool) -> ProfileResponse {
    let missing: Vec<String> = missing_sections(&profile)
        .into_iter()
        .map(|s| s.as_str().to_string())
        .collect();
    ProfileResponse {
        profile_complete: missing.is_empty(),
        missing,
        verified,
        profile,
    }
}

#[cfg(test)]
mod tests {
    use cupid_types::models::{Photo, Prompt};

    use super::*;
    use crate::services::testing::{account, db};

    fn full_draft() -> UpdateProfileRequest {
        UpdateProfileRequest {
            age: Some(20),
            course: Some("B.Tech CSE".into()),
            academic_year: Some("2nd".into()),
            bio: "Coffee and compilers".into(),
            interests: vec!["music".into(), "Music".into(), " hiking ".into()],
            prompts: vec![Prompt {
                question: "Ideal weekend?".into(),
                answer: "Trekking".into(),
            }],
            photos: vec![
                Photo {
                    url: "https://img/1.jpg".into(),
                    is_primary: true,
                },
                Photo {
                    url: "https://img/2.jpg".into(),
                    is_primary: false,
                },
            ],
        }
    }

    #[test]
    fn validation_limits() {
        let mut d = full_draft();
        d.age = Some(17);
        assert!(matches!(validate(d), Err(CoreError::InvalidProfile(_))));

        let mut d = full_draft();
        d.bio = "x".repeat(MAX_BIO_CHARS + 1);
        assert!(validate(d).is_err());

        let mut d = full_draft();
        d.prompts = vec![d.prompts[0].clone(); MAX_PROMPTS + 1];
        assert!(validate(d).is_err());

        let mut d = full_draft();
        d.prompts[0].answer = "x".repeat(MAX_ANSWER_CHARS + 1);
        assert!(validate(d).is_err());

        let mut d = full_draft();
        d.photos[1].is_primary = true;
        assert!(validate(d).is_err());

        let mut d = full_draft();
        d.photos.iter_mut().for_each(|p| p.is_primary = false);
        assert!(validate(d).is_err());
    }

    #[test]
    fn validation_normalizes() {
        let d = validate(full_draft()).unwrap();
        assert_eq!(d.interests, vec!["music".to_string(), "hiking".to_string()]);

        let mut blank = full_draft();
        blank.course = Some("   ".into());
        assert_eq!(validate(blank).unwrap().course, None);
    }

    #[test]
    fn sections_report_in_setup_order() {
        let profile = Profile {
            account_id: Uuid::new_v4(),
            full_name: "A".into(),
            age: None,
            course: None,
            academic_year: None,
            bio: String::new(),
            interests: Vec::new(),
            prompts: Vec::new(),
            photos: Vec::new(),
        };
        assert_eq!(missing_sections(&profile), ProfileSection::ALL.to_vec());
    }

    #[tokio::test]
    async fn new_account_starts_incomplete() {
        let db = db();
        let id = account(&db, "a@uni.edu");
        let res = ProfileEditor::new(db).get_profile(id).await.unwrap();
        assert!(!res.profile_complete);
        assert!(!res.verified);
        assert_eq!(res.missing, vec!["basics", "about", "interests"]);
    }

    #[tokio::test]
    async fn complete_draft_flips_flag_and_partial_clears_it() {
        let db = db();
        let id = account(&db, "a@uni.edu");
        let editor = ProfileEditor::new(db.clone());

        let res = editor.update_profile(id, full_draft()).await.unwrap();
        assert!(res.profile_complete);
        assert!(db.get_account(id).unwrap().unwrap().profile_complete);

        let stored = editor.get_profile(id).await.unwrap().profile;
        assert_eq!(stored.photos.len(), 2);
        assert_eq!(stored.primary_photo().unwrap().url, "https://img/1.jpg");
        assert_eq!(stored.prompts, full_draft().prompts);
        assert_eq!(stored.interests.len(), 2);

        let mut partial = full_draft();
        partial.interests.clear();
        let res = editor.update_profile(id, partial).await.unwrap();
        assert!(!res.profile_complete);
        assert_eq!(res.missing, vec!["interests"]);
        assert!(!db.get_account(id).unwrap().unwrap().profile_complete);
    }

    #[tokio::test]
    async fn unknown_account() {
        let editor = ProfileEditor::new(db());
        let err = editor.get_profile(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, CoreError::AccountNotFound));
        let err = editor
            .update_profile(Uuid::new_v4(), full_draft())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::AccountNotFound));
    }
}
