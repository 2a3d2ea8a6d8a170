use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, params};
use tracing::debug;
use uuid::Uuid;

use smting_core::{StoreError, ValidationError};
use smting_core::store::{
    MessageStore, PostStore, ProfileStore, ReportStore, StoreResult, TransactionStore,
};
use smting_types::models::{
    CurrencyTransaction, Message, Profile, ProfileUpdate, Report, ReportReason, TalkPost,
    ThreadSummary, TxReason,
};

use crate::Database;
use crate::error::DbError;
use crate::models::{
    MESSAGE_COLUMNS, MessageRow, POST_COLUMNS, PROFILE_COLUMNS, PostRow, ProfileRow, ReportRow,
    TRANSACTION_COLUMNS, TransactionRow, encode_date, encode_time,
};

// -- Profiles --

impl ProfileStore for Database {
    fn get_profile(&self, id: &str) -> StoreResult<Option<Profile>> {
        Ok(self.with_conn(|conn| query_profile(conn, id))?)
    }

    fn list_profiles(&self, exclude_id: &str) -> StoreResult<Vec<Profile>> {
        Ok(self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id != ?1 ORDER BY created_at, rowid"
            ))?;
            let rows = stmt
                .query_map([exclude_id], ProfileRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter().map(ProfileRow::into_profile).collect()
        })?)
    }

    fn insert_profile(&self, profile: &Profile) -> StoreResult<()> {
        let row = ProfileRow::from_profile(profile)?;
        Ok(self.with_conn(|conn| {
            conn.execute(
                &format!(
                    "INSERT INTO profiles ({PROFILE_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
                ),
                params![
                    row.id,
                    row.nickname,
                    row.age,
                    row.gender,
                    row.tendency,
                    row.intro,
                    row.interest_tags,
                    row.top_tags,
                    row.latitude,
                    row.longitude,
                    row.last_active_at,
                    row.balance,
                    row.avatar_color,
                    row.avatar_image_url,
                    row.last_reward_on,
                    row.created_at,
                ],
            )?;
            Ok(())
        })?)
    }

    fn update_profile(
        &self,
        id: &str,
        update: &ProfileUpdate,
        check: &dyn Fn(&Profile) -> Result<(), ValidationError>,
    ) -> StoreResult<Profile> {
        Ok(self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut profile =
                query_profile(&tx, id)?.ok_or_else(|| StoreError::not_found("profile", id))?;
            update.apply_to(&mut profile);
            check(&profile).map_err(StoreError::Rejected)?;
            let row = ProfileRow::from_profile(&profile)?;

            // Balance and reward day belong to the ledger paths; never written here.
            tx.execute(
                "UPDATE profiles SET nickname = ?2, age = ?3, tendency = ?4, intro = ?5,
                     interest_tags = ?6, top_tags = ?7, latitude = ?8, longitude = ?9,
                     last_active_at = ?10, avatar_color = ?11, avatar_image_url = ?12
                 WHERE id = ?1",
                params![
                    row.id,
                    row.nickname,
                    row.age,
                    row.tendency,
                    row.intro,
                    row.interest_tags,
                    row.top_tags,
                    row.latitude,
                    row.longitude,
                    row.last_active_at,
                    row.avatar_color,
                    row.avatar_image_url,
                ],
            )?;
            tx.commit()?;
            Ok(profile)
        })?)
    }

    fn claim_daily_reward(&self, id: &str, date: NaiveDate) -> StoreResult<bool> {
        let day = encode_date(date);
        Ok(self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE profiles SET last_reward_on = ?2
                 WHERE id = ?1 AND (last_reward_on IS NULL OR last_reward_on < ?2)",
                params![id, day],
            )?;
            if changed == 1 {
                return Ok(true);
            }
            if query_profile(conn, id)?.is_none() {
                return Err(StoreError::not_found("profile", id).into());
            }
            Ok(false)
        })?)
    }
}

fn query_profile(conn: &Connection, id: &str) -> Result<Option<Profile>, DbError> {
    let mut stmt = conn.prepare(&format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1"))?;
    stmt.query_row([id], ProfileRow::from_row)
        .optional()?
        .map(ProfileRow::into_profile)
        .transpose()
}

// -- Messages --

impl MessageStore for Database {
    fn list_messages(&self, a: &str, b: &str) -> StoreResult<Vec<Message>> {
        Ok(self.with_conn(|conn| {
            query_messages(
                conn,
                "(sender_id = ?1 AND recipient_id = ?2) OR (sender_id = ?2 AND recipient_id = ?1)",
                params![a, b],
            )
        })?)
    }

    fn has_messages_between(&self, a: &str, b: &str) -> StoreResult<bool> {
        Ok(self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(
                     SELECT 1 FROM messages
                     WHERE (sender_id = ?1 AND recipient_id = ?2)
                        OR (sender_id = ?2 AND recipient_id = ?1))",
                params![a, b],
                |r| r.get(0),
            )?;
            Ok(exists)
        })?)
    }

    fn insert_message(
        &self,
        sender_id: &str,
        recipient_id: &str,
        content: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<Message> {
        let message = Message {
            id: Uuid::new_v4().to_string(),
            sender_id: sender_id.to_string(),
            recipient_id: recipient_id.to_string(),
            content: content.to_string(),
            created_at: at,
            read_at: None,
        };
        Ok(self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, sender_id, recipient_id, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    message.id,
                    message.sender_id,
                    message.recipient_id,
                    message.content,
                    encode_time(at),
                ],
            )?;
            Ok(message)
        })?)
    }

    fn mark_read(
        &self,
        recipient_id: &str,
        sender_id: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<usize> {
        Ok(self.with_conn(|conn| {
            let marked = conn.execute(
                "UPDATE messages SET read_at = ?3
                 WHERE recipient_id = ?1 AND sender_id = ?2 AND read_at IS NULL",
                params![recipient_id, sender_id, encode_time(at)],
            )?;
            Ok(marked)
        })?)
    }

    fn unread_count(&self, recipient_id: &str) -> StoreResult<u64> {
        Ok(self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE recipient_id = ?1 AND read_at IS NULL",
                [recipient_id],
                |r| r.get(0),
            )?;
            Ok(count.max(0) as u64)
        })?)
    }

    fn list_threads(&self, user_id: &str) -> StoreResult<Vec<ThreadSummary>> {
        Ok(self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "WITH mine AS (
                     SELECT *, rowid AS seq,
                            CASE WHEN sender_id = ?1 THEN recipient_id ELSE sender_id END
                                AS counterpart
                     FROM messages
                     WHERE sender_id = ?1 OR recipient_id = ?1
                 ),
                 ranked AS (
                     SELECT *,
                            ROW_NUMBER() OVER (
                                PARTITION BY counterpart ORDER BY created_at DESC, seq DESC
                            ) AS pos,
                            SUM(recipient_id = ?1 AND read_at IS NULL)
                                OVER (PARTITION BY counterpart) AS unread
                     FROM mine
                 )
                 SELECT {MESSAGE_COLUMNS}, counterpart, unread
                 FROM ranked
                 WHERE pos = 1
                 ORDER BY created_at DESC, seq DESC"
            ))?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok((
                        MessageRow::from_row(row)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, i64>(7)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter()
                .map(|(message, counterpart_id, unread)| {
                    message.into_message().map(|last_message| ThreadSummary {
                        counterpart_id,
                        last_message,
                        unread: unread.max(0) as u64,
                    })
                })
                .collect()
        })?)
    }
}

fn query_messages(
    conn: &Connection,
    filter: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<Message>, DbError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages WHERE {filter} ORDER BY created_at, rowid"
    ))?;
    let rows = stmt
        .query_map(params, MessageRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(MessageRow::into_message).collect()
}

// -- Kane ledger --

impl TransactionStore for Database {
    fn insert_transaction(
        &self,
        user_id: &str,
        amount: i64,
        reason: TxReason,
        at: DateTime<Utc>,
    ) -> StoreResult<CurrencyTransaction> {
        Ok(self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let balance: i64 = tx
                .query_row(
                    "SELECT balance FROM profiles WHERE id = ?1",
                    [user_id],
                    |r| r.get(0),
                )
                .optional()?
                .ok_or_else(|| StoreError::not_found("profile", user_id))?;

            let next = balance + amount;
            if next < 0 {
                // Dropping `tx` rolls back; nothing was written yet anyway.
                return Err(StoreError::InsufficientFunds {
                    balance,
                    debit: -amount,
                }
                .into());
            }

            let entry = CurrencyTransaction {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                amount,
                reason,
                created_at: at,
            };

            tx.execute(
                "UPDATE profiles SET balance = ?2 WHERE id = ?1",
                params![user_id, next],
            )?;
            tx.execute(
                &format!(
                    "INSERT INTO kane_transactions ({TRANSACTION_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5)"
                ),
                params![
                    entry.id,
                    entry.user_id,
                    entry.amount,
                    reason.as_str(),
                    encode_time(at),
                ],
            )?;
            tx.commit()?;

            debug!(
                user = user_id,
                amount,
                reason = %reason,
                balance = next,
                "Ledger entry written"
            );
            Ok(entry)
        })?)
    }

    fn list_transactions(
        &self,
        user_id: &str,
        limit: u32,
    ) -> StoreResult<Vec<CurrencyTransaction>> {
        Ok(self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TRANSACTION_COLUMNS} FROM kane_transactions
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?2"
            ))?;
            let rows = stmt
                .query_map(params![user_id, limit], TransactionRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter().map(TransactionRow::into_transaction).collect()
        })?)
    }
}

// -- Talk feed --

impl PostStore for Database {
    fn insert_post(
        &self,
        author_id: &str,
        title: &str,
        content: &str,
        category: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<TalkPost> {
        let post = TalkPost {
            id: Uuid::new_v4().to_string(),
            author_id: author_id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            category: category.to_string(),
            created_at: at,
        };
        Ok(self.with_conn(|conn| {
            conn.execute(
                &format!("INSERT INTO talk_posts ({POST_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
                params![
                    post.id,
                    post.author_id,
                    post.title,
                    post.content,
                    post.category,
                    encode_time(at),
                ],
            )?;
            Ok(post)
        })?)
    }

    fn get_post(&self, id: &str) -> StoreResult<Option<TalkPost>> {
        Ok(self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {POST_COLUMNS} FROM talk_posts WHERE id = ?1"))?;
            stmt.query_row([id], PostRow::from_row)
                .optional()?
                .map(PostRow::into_post)
                .transpose()
        })?)
    }

    fn list_posts(&self, category: Option<&str>, limit: u32) -> StoreResult<Vec<TalkPost>> {
        Ok(self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {POST_COLUMNS} FROM talk_posts
                 WHERE ?1 IS NULL OR category = ?1
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?2"
            ))?;
            let rows = stmt
                .query_map(params![category, limit], PostRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter().map(PostRow::into_post).collect()
        })?)
    }
}

// -- Reports --

impl ReportStore for Database {
    fn insert_report(
        &self,
        reporter_id: &str,
        reported_id: &str,
        reason: ReportReason,
        at: DateTime<Utc>,
    ) -> StoreResult<Report> {
        let row = ReportRow {
            id: Uuid::new_v4().to_string(),
            reporter_id: reporter_id.to_string(),
            reported_id: reported_id.to_string(),
            reason: reason.as_str().to_string(),
            created_at: encode_time(at),
        };
        Ok(self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO reports (id, reporter_id, reported_id, reason, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    row.id,
                    row.reporter_id,
                    row.reported_id,
                    row.reason,
                    row.created_at,
                ],
            )?;
            row.into_report()
        })?)
    }
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, DbError>;
}

impl<T> OptionalExt<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, DbError> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use smting_types::models::{Avatar, Gender, Location, Tendency};
    use std::collections::BTreeSet;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
    }

    fn seed(db: &Database, id: &str, balance: i64) -> Profile {
        let profile = Profile {
            id: id.to_string(),
            nickname: format!("nick-{id}"),
            age: 30,
            gender: Gender::Female,
            tendency: Tendency::Switch,
            intro: String::new(),
            interest_tags: BTreeSet::from(["rope".to_string(), "wine".to_string()]),
            top_tags: vec!["rope".to_string()],
            location: Some(Location {
                latitude: 37.5665,
                longitude: 126.978,
            }),
            last_active_at: Some(t0()),
            balance,
            avatar: Avatar::default(),
            last_reward_on: None,
            created_at: t0(),
        };
        db.insert_profile(&profile).unwrap();
        profile
    }

    #[test]
    fn profile_round_trips_through_sqlite() {
        let db = Database::open_in_memory().unwrap();
        let stored = seed(&db, "a", 12);
        assert_eq!(db.get_profile("a").unwrap(), Some(stored));
        assert_eq!(db.get_profile("missing").unwrap(), None);
    }

    #[test]
    fn update_profile_leaves_balance_alone() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, "a", 40);

        let update = ProfileUpdate {
            nickname: Some("renamed".into()),
            location: Some(Location {
                latitude: 35.1796,
                longitude: 129.0756,
            }),
            ..Default::default()
        };
        let returned = db.update_profile("a", &update, &accept).unwrap();

        let profile = db.get_profile("a").unwrap().unwrap();
        assert_eq!(profile, returned);
        assert_eq!(profile.nickname, "renamed");
        assert_eq!(profile.location.unwrap().latitude, 35.1796);
        assert_eq!(profile.balance, 40);

        let err = db.update_profile("ghost", &update, &accept).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "profile", .. }));
    }

    fn accept(_: &Profile) -> Result<(), ValidationError> {
        Ok(())
    }

    #[test]
    fn rejected_update_checks_the_current_row_and_writes_nothing() {
        let db = Database::open_in_memory().unwrap();
        let before = seed(&db, "a", 0);

        // Another writer narrows the interests after the caller's read.
        db.update_profile(
            "a",
            &ProfileUpdate {
                interest_tags: Some(BTreeSet::from(["rope".to_string()])),
                ..Default::default()
            },
            &accept,
        )
        .unwrap();

        let seen_by_check = std::cell::RefCell::new(None);
        let err = db
            .update_profile(
                "a",
                &ProfileUpdate {
                    nickname: Some("late".into()),
                    top_tags: Some(vec!["wine".into()]),
                    ..Default::default()
                },
                &|merged: &Profile| {
                    *seen_by_check.borrow_mut() = Some(merged.interest_tags.clone());
                    if merged.top_tags.iter().all(|t| merged.interest_tags.contains(t)) {
                        Ok(())
                    } else {
                        Err(ValidationError::TopTagNotInterest("wine".into()))
                    }
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Rejected(ValidationError::TopTagNotInterest(_))
        ));
        assert_eq!(
            seen_by_check.into_inner(),
            Some(BTreeSet::from(["rope".to_string()]))
        );

        let stored = db.get_profile("a").unwrap().unwrap();
        assert_eq!(stored.nickname, before.nickname);
        assert_eq!(stored.top_tags, vec!["rope".to_string()]);
    }

    #[test]
    fn debit_guard_rejects_overdraft_without_writing() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, "a", 2);

        let err = db
            .insert_transaction("a", -3, TxReason::MessageSend, t0())
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::InsufficientFunds {
                balance: 2,
                debit: 3
            }
        ));
        assert_eq!(db.get_profile("a").unwrap().unwrap().balance, 2);
        assert!(db.list_transactions("a", 10).unwrap().is_empty());

        let err = db
            .insert_transaction("ghost", 5, TxReason::Purchase, t0())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn ledger_lists_newest_first() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, "a", 0);

        db.insert_transaction("a", 100, TxReason::Purchase, t0()).unwrap();
        db.insert_transaction("a", -3, TxReason::MessageSend, t0()).unwrap();
        db.insert_transaction("a", 30, TxReason::TalkPost, t0() + Duration::minutes(1))
            .unwrap();

        let amounts: Vec<i64> = db
            .list_transactions("a", 10)
            .unwrap()
            .iter()
            .map(|t| t.amount)
            .collect();
        assert_eq!(amounts, vec![30, -3, 100]);
        assert_eq!(db.list_transactions("a", 1).unwrap().len(), 1);
        assert_eq!(db.get_profile("a").unwrap().unwrap().balance, 127);
    }

    #[test]
    fn daily_reward_claim_is_once_per_day() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, "a", 0);
        let day = t0().date_naive();

        assert!(db.claim_daily_reward("a", day).unwrap());
        assert!(!db.claim_daily_reward("a", day).unwrap());
        assert!(db.claim_daily_reward("a", day.succ_opt().unwrap()).unwrap());
        assert!(db.claim_daily_reward("ghost", day).is_err());
    }

    #[test]
    fn threads_group_by_counterpart() {
        let db = Database::open_in_memory().unwrap();
        for id in ["a", "b", "c"] {
            seed(&db, id, 0);
        }
        db.insert_message("b", "a", "hi", t0()).unwrap();
        db.insert_message("c", "a", "yo", t0() + Duration::seconds(1)).unwrap();
        db.insert_message("a", "b", "hey", t0() + Duration::seconds(2)).unwrap();

        assert!(db.has_messages_between("b", "a").unwrap());
        assert!(!db.has_messages_between("b", "c").unwrap());

        let threads = db.list_threads("a").unwrap();
        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].counterpart_id, "b");
        assert_eq!(threads[0].last_message.content, "hey");
        assert_eq!(threads[0].unread, 1);
        assert_eq!(threads[1].counterpart_id, "c");

        assert_eq!(db.unread_count("a").unwrap(), 2);
        assert_eq!(db.mark_read("a", "c", t0()).unwrap(), 1);
        assert_eq!(db.unread_count("a").unwrap(), 1);
    }

    #[test]
    fn thread_summary_counts_unread_per_counterpart_and_breaks_ties_by_insertion() {
        let db = Database::open_in_memory().unwrap();
        for id in ["a", "b", "c"] {
            seed(&db, id, 0);
        }
        db.insert_message("a", "b", "one", t0()).unwrap();
        db.insert_message("a", "b", "two", t0()).unwrap();
        db.insert_message("a", "b", "three", t0()).unwrap();
        db.insert_message("b", "a", "reply", t0() - Duration::seconds(5)).unwrap();
        db.insert_message("c", "b", "elsewhere", t0() + Duration::seconds(9))
            .unwrap();

        let threads = db.list_threads("b").unwrap();
        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].counterpart_id, "c");
        assert_eq!(threads[0].unread, 1);
        assert_eq!(threads[1].counterpart_id, "a");
        assert_eq!(threads[1].last_message.content, "three");
        assert_eq!(threads[1].unread, 3);

        // Only the reply is addressed to `a`; its own three are not unread for it.
        let threads = db.list_threads("a").unwrap();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].counterpart_id, "b");
        assert_eq!(threads[0].last_message.content, "three");
        assert_eq!(threads[0].unread, 1);
        assert!(db.list_threads("nobody").unwrap().is_empty());
    }

    #[test]
    fn posts_filter_by_category() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, "a", 0);
        let first = db.insert_post("a", "t1", "c1", "all", t0()).unwrap();
        db.insert_post("a", "t2", "c2", "rope", t0() + Duration::seconds(1))
            .unwrap();

        assert_eq!(db.list_posts(None, 10).unwrap().len(), 2);
        let rope = db.list_posts(Some("rope"), 10).unwrap();
        assert_eq!(rope.len(), 1);
        assert_eq!(rope[0].title, "t2");
        assert_eq!(db.get_post(&first.id).unwrap(), Some(first));
        assert_eq!(db.get_post("nope").unwrap(), None);
    }
}
