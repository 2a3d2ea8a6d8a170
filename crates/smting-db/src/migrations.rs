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
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE profiles (
                id                TEXT PRIMARY KEY,
                nickname          TEXT NOT NULL,
                age               INTEGER NOT NULL,
                gender            TEXT NOT NULL,
                tendency          TEXT NOT NULL,
                intro             TEXT NOT NULL DEFAULT '',
                interest_tags     TEXT NOT NULL DEFAULT '[]',
                top_tags          TEXT NOT NULL DEFAULT '[]',
                latitude          REAL,
                longitude         REAL,
                last_active_at    TEXT,
                balance           INTEGER NOT NULL DEFAULT 0 CHECK (balance >= 0),
                avatar_color      TEXT NOT NULL,
                avatar_image_url  TEXT,
                last_reward_on    TEXT,
                created_at        TEXT NOT NULL
            );

            CREATE INDEX idx_profiles_gender_active
                ON profiles(gender, last_active_at);

            CREATE TABLE messages (
                id            TEXT PRIMARY KEY,
                sender_id     TEXT NOT NULL REFERENCES profiles(id),
                recipient_id  TEXT NOT NULL REFERENCES profiles(id),
                content       TEXT NOT NULL,
                created_at    TEXT NOT NULL,
                read_at       TEXT
            );

            CREATE INDEX idx_messages_pair
                ON messages(sender_id, recipient_id, created_at);
            CREATE INDEX idx_messages_unread
                ON messages(recipient_id, read_at);

            CREATE TABLE kane_transactions (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES profiles(id),
                amount      INTEGER NOT NULL,
                reason      TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_kane_transactions_user
                ON kane_transactions(user_id, created_at);

            CREATE TABLE talk_posts (
                id          TEXT PRIMARY KEY,
                author_id   TEXT NOT NULL REFERENCES profiles(id),
                title       TEXT NOT NULL,
                content     TEXT NOT NULL,
                category    TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_talk_posts_category
                ON talk_posts(category, created_at);

            CREATE TABLE reports (
                id           TEXT PRIMARY KEY,
                reporter_id  TEXT NOT NULL,
                reported_id  TEXT NOT NULL REFERENCES profiles(id),
                reason       TEXT NOT NULL,
                created_at   TEXT NOT NULL
            );

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
