use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (accounts, profiles, swipes, matches, messages)");
        conn.execute_batch(
            "
            CREATE TABLE accounts (
                id                TEXT PRIMARY KEY,
                email             TEXT NOT NULL UNIQUE,
                password          TEXT NOT NULL,
                full_name         TEXT NOT NULL,
                verified          INTEGER NOT NULL DEFAULT 0,
                profile_complete  INTEGER NOT NULL DEFAULT 0,
                created_at        TEXT NOT NULL
            );

            -- One slot per account; a new code overwrites the old one.
            CREATE TABLE pending_verifications (
                account_id  TEXT PRIMARY KEY REFERENCES accounts(id),
                otp_code    TEXT NOT NULL,
                attempts    INTEGER NOT NULL DEFAULT 0,
                issued_at   TEXT NOT NULL,
                expires_at  TEXT NOT NULL
            );

            CREATE TABLE profiles (
                account_id     TEXT PRIMARY KEY REFERENCES accounts(id),
                age            INTEGER,
                course         TEXT,
                academic_year  TEXT,
                bio            TEXT NOT NULL DEFAULT '',
                updated_at     TEXT NOT NULL
            );

            CREATE TABLE profile_interests (
                account_id  TEXT NOT NULL REFERENCES accounts(id),
                name        TEXT NOT NULL,
                PRIMARY KEY (account_id, name)
            );

            CREATE TABLE profile_prompts (
                account_id  TEXT NOT NULL REFERENCES accounts(id),
                position    INTEGER NOT NULL,
                question    TEXT NOT NULL,
                answer      TEXT NOT NULL,
                PRIMARY KEY (account_id, position)
            );

            CREATE TABLE profile_photos (
                account_id  TEXT NOT NULL REFERENCES accounts(id),
                position    INTEGER NOT NULL,
                url         TEXT NOT NULL,
                is_primary  INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (account_id, position)
            );

            CREATE TABLE swipes (
                swiper_id   TEXT NOT NULL REFERENCES accounts(id),
                swiped_id   TEXT NOT NULL REFERENCES accounts(id),
                decision    TEXT NOT NULL CHECK (decision IN ('like', 'pass')),
                created_at  TEXT NOT NULL,
                PRIMARY KEY (swiper_id, swiped_id),
                CHECK (swiper_id != swiped_id)
            );

            CREATE INDEX idx_swipes_swiped ON swipes(swiped_id, swiper_id);

            CREATE TABLE matches (
                id            TEXT PRIMARY KEY,
                account_a_id  TEXT NOT NULL REFERENCES accounts(id),
                account_b_id  TEXT NOT NULL REFERENCES accounts(id),
                created_at    TEXT NOT NULL,
                UNIQUE (account_a_id, account_b_id),
                CHECK (account_a_id < account_b_id)
            );

            CREATE INDEX idx_matches_b ON matches(account_b_id);

            CREATE TABLE messages (
                id          TEXT PRIMARY KEY,
                match_id    TEXT NOT NULL REFERENCES matches(id),
                sender_id   TEXT NOT NULL REFERENCES accounts(id),
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                is_read     INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX idx_messages_match ON messages(match_id, created_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
