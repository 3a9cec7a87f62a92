use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use uuid::Uuid;

use cupid_types::models::{Photo, Profile, Prompt};

use crate::Database;
use crate::models::{
    AccountRow, MatchRow, MessageRow, ProfileDetails, ProfileRow, encode_ts, get_ts, get_uuid,
    match_from_row,
};

impl Database {
    // -- Accounts --

    /// Insert an account and its empty profile. Returns `false` when the
    /// email is already registered.
    pub fn create_account(
        &self,
        id: Uuid,
        email: &str,
        password_hash: &str,
        full_name: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let now = encode_ts(now);
            let inserted = tx.execute(
                "INSERT INTO accounts (id, email, password, full_name, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(email) DO NOTHING",
                params![id.to_string(), email, password_hash, full_name, now],
            )?;
            if inserted == 0 {
                return Ok(false);
            }
            tx.execute(
                "INSERT INTO profiles (account_id, updated_at) VALUES (?1, ?2)",
                params![id.to_string(), now],
            )?;
            tx.commit()?;
            Ok(true)
        })
    }

    pub fn get_account(&self, id: Uuid) -> Result<Option<AccountRow>> {
        self.with_conn(|conn| {
            query_account(conn, "SELECT id, email, password, full_name, verified, profile_complete, created_at FROM accounts WHERE id = ?1", &id.to_string())
        })
    }

    pub fn get_account_by_email(&self, email: &str) -> Result<Option<AccountRow>> {
        self.with_conn(|conn| {
            query_account(conn, "SELECT id, email, password, full_name, verified, profile_complete, created_at FROM accounts WHERE email = ?1", email)
        })
    }

    /// `Some(true)` when the account is verified with a complete profile,
    /// `None` when it does not exist.
    pub fn is_active(&self, id: Uuid) -> Result<Option<bool>> {
        self.with_conn(|conn| {
            let active = conn
                .query_row(
                    "SELECT verified = 1 AND profile_complete = 1 FROM accounts WHERE id = ?1",
                    [id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(active)
        })
    }

    // -- Profiles --

    pub fn get_profile(&self, account_id: Uuid) -> Result<Option<Profile>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT a.id, a.full_name, p.age, p.course, p.academic_year, p.bio
                     FROM accounts a JOIN profiles p ON p.account_id = a.id
                     WHERE a.id = ?1",
                    [account_id.to_string()],
                    profile_from_row,
                )
                .optional()?;

            let Some(row) = row else {
                return Ok(None);
            };
            let mut details = load_details(conn, &[row.account_id])?;
            let details = details.remove(&row.account_id).unwrap_or_default();
            Ok(Some(assemble(row, details)))
        })
    }

    /// Replace the profile's scalar fields and child rows in one transaction
    /// and store the recomputed completeness flag. Returns `false` if the
    /// account does not exist.
    pub fn replace_profile(
        &self,
        profile: &Profile,
        complete: bool,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let id = profile.account_id.to_string();

            let updated = tx.execute(
                "UPDATE accounts SET profile_complete = ?2 WHERE id = ?1",
                params![id, complete],
            )?;
            if updated == 0 {
                return Ok(false);
            }

            tx.execute(
                "INSERT INTO profiles (account_id, age, course, academic_year, bio, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(account_id) DO UPDATE SET
                    age = excluded.age,
                    course = excluded.course,
                    academic_year = excluded.academic_year,
                    bio = excluded.bio,
                    updated_at = excluded.updated_at",
                params![
                    id,
                    profile.age,
                    profile.course,
                    profile.academic_year,
                    profile.bio,
                    encode_ts(now)
                ],
            )?;

            tx.execute("DELETE FROM profile_interests WHERE account_id = ?1", [&id])?;
            tx.execute("DELETE FROM profile_prompts WHERE account_id = ?1", [&id])?;
            tx.execute("DELETE FROM profile_photos WHERE account_id = ?1", [&id])?;

            for interest in &profile.interests {
                tx.execute(
                    "INSERT OR IGNORE INTO profile_interests (account_id, name) VALUES (?1, ?2)",
                    params![id, interest],
                )?;
            }
            for (position, prompt) in profile.prompts.iter().enumerate() {
                tx.execute(
                    "INSERT INTO profile_prompts (account_id, position, question, answer)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![id, position as i64, prompt.question, prompt.answer],
                )?;
            }
            for (position, photo) in profile.photos.iter().enumerate() {
                tx.execute(
                    "INSERT INTO profile_photos (account_id, position, url, is_primary)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![id, position as i64, photo.url, photo.is_primary],
                )?;
            }

            tx.commit()?;
            Ok(true)
        })
    }

    /// Swipe feed for `viewer`: verified, complete profiles other than the
    /// viewer's that the viewer has not swiped on yet. Ordered by signup
    /// time, then id, so repeated calls return the same sequence.
    pub fn candidates(&self, viewer: Uuid, limit: u32) -> Result<Vec<Profile>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT a.id, a.full_name, p.age, p.course, p.academic_year, p.bio
                 FROM accounts a
                 JOIN profiles p ON p.account_id = a.id
                 WHERE a.verified = 1
                   AND a.profile_complete = 1
                   AND a.id != ?1
                   AND NOT EXISTS (
                       SELECT 1 FROM swipes s
                       WHERE s.swiper_id = ?1 AND s.swiped_id = a.id
                   )
                 ORDER BY a.created_at ASC, a.id ASC
                 LIMIT ?2",
            )?;

            let rows = stmt
                .query_map(params![viewer.to_string(), limit], profile_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let ids: Vec<Uuid> = rows.iter().map(|r| r.account_id).collect();
            let mut details = load_details(conn, &ids)?;

            Ok(rows
                .into_iter()
                .map(|row| {
                    let d = details.remove(&row.account_id).unwrap_or_default();
                    assemble(row, d)
                })
                .collect())
        })
    }

    // -- Matches --

    pub fn get_match(&self, id: Uuid) -> Result<Option<MatchRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, account_a_id, account_b_id, created_at FROM matches WHERE id = ?1",
                    [id.to_string()],
                    match_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Matches the account takes part in, newest first.
    pub fn matches_for(&self, account_id: Uuid) -> Result<Vec<MatchRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, account_a_id, account_b_id, created_at FROM matches
                 WHERE account_a_id = ?1 OR account_b_id = ?1
                 ORDER BY created_at DESC, id ASC",
            )?;
            let rows = stmt
                .query_map([account_id.to_string()], match_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Messages --

    pub fn insert_message(&self, message: &MessageRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, match_id, sender_id, content, created_at, is_read)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    message.id.to_string(),
                    message.match_id.to_string(),
                    message.sender_id.to_string(),
                    message.content,
                    encode_ts(message.created_at),
                    message.is_read
                ],
            )?;
            Ok(())
        })
    }

    /// All messages of a match, oldest first. Ties on `created_at` fall back
    /// to insertion order.
    pub fn messages_for(&self, match_id: Uuid) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, match_id, sender_id, content, created_at, is_read
                 FROM messages
                 WHERE match_id = ?1
                 ORDER BY created_at ASC, rowid ASC",
            )?;
            let rows = stmt
                .query_map([match_id.to_string()], |row| {
                    Ok(MessageRow {
                        id: get_uuid(row, 0)?,
                        match_id: get_uuid(row, 1)?,
                        sender_id: get_uuid(row, 2)?,
                        content: row.get(3)?,
                        created_at: get_ts(row, 4)?,
                        is_read: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Mark every unread message in the match that `reader` did not send.
    pub fn mark_read(&self, match_id: Uuid, reader: Uuid) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE messages SET is_read = 1
                 WHERE match_id = ?1 AND sender_id != ?2 AND is_read = 0",
                params![match_id.to_string(), reader.to_string()],
            )?;
            Ok(n)
        })
    }
}

fn query_account(conn: &Connection, sql: &str, key: &str) -> Result<Option<AccountRow>> {
    let mut stmt = conn.prepare(sql)?;

    let row = stmt
        .query_row([key], |row| {
            Ok(AccountRow {
                id: get_uuid(row, 0)?,
                email: row.get(1)?,
                password: row.get(2)?,
                full_name: row.get(3)?,
                verified: row.get(4)?,
                profile_complete: row.get(5)?,
                created_at: get_ts(row, 6)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn profile_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProfileRow> {
    Ok(ProfileRow {
        account_id: get_uuid(row, 0)?,
        full_name: row.get(1)?,
        age: row.get(2)?,
        course: row.get(3)?,
        academic_year: row.get(4)?,
        bio: row.get(5)?,
    })
}

fn assemble(row: ProfileRow, details: ProfileDetails) -> Profile {
    Profile {
        account_id: row.account_id,
        full_name: row.full_name,
        age: row.age,
        course: row.course,
        academic_year: row.academic_year,
        bio: row.bio,
        interests: details.interests,
        prompts: details.prompts,
        photos: details.photos,
    }
}

/// Batch-fetch interests, prompts and photos for a set of accounts.
fn load_details(conn: &Connection, ids: &[Uuid]) -> Result<HashMap<Uuid, ProfileDetails>> {
    let mut out: HashMap<Uuid, ProfileDetails> = HashMap::new();
    if ids.is_empty() {
        return Ok(out);
    }

    let keys: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    let placeholders: Vec<String> = (1..=keys.len()).map(|i| format!("?{}", i)).collect();
    let in_list = placeholders.join(", ");
    let bind: Vec<&dyn rusqlite::types::ToSql> =
        keys.iter().map(|k| k as &dyn rusqlite::types::ToSql).collect();

    let mut stmt = conn.prepare(&format!(
        "SELECT account_id, name FROM profile_interests
         WHERE account_id IN ({in_list}) ORDER BY account_id, name"
    ))?;
    let interests = stmt
        .query_map(bind.as_slice(), |row| Ok((get_uuid(row, 0)?, row.get::<_, String>(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    for (id, name) in interests {
        out.entry(id).or_default().interests.push(name);
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT account_id, question, answer FROM profile_prompts
         WHERE account_id IN ({in_list}) ORDER BY account_id, position"
    ))?;
    let prompts = stmt
        .query_map(bind.as_slice(), |row| {
            Ok((
                get_uuid(row, 0)?,
                Prompt {
                    question: row.get(1)?,
                    answer: row.get(2)?,
                },
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    for (id, prompt) in prompts {
        out.entry(id).or_default().prompts.push(prompt);
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT account_id, url, is_primary FROM profile_photos
         WHERE account_id IN ({in_list}) ORDER BY account_id, position"
    ))?;
    let photos = stmt
        .query_map(bind.as_slice(), |row| {
            Ok((
                get_uuid(row, 0)?,
                Photo {
                    url: row.get(1)?,
                    is_primary: row.get(2)?,
                },
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    for (id, photo) in photos {
        out.entry(id).or_default().photos.push(photo);
    }

    Ok(out)
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
