//! Shared fixtures: small message stores, contact stores and vCard files
//! built inside a temporary directory.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};

use wa_history_merge::config::DatabaseConfig;

pub const MSGSTORE_SCHEMA: &str = "
    CREATE TABLE jid (_id INTEGER PRIMARY KEY, user TEXT, server TEXT, raw_string TEXT);
    CREATE TABLE chat (_id INTEGER PRIMARY KEY, jid_row_id INTEGER, subject TEXT);
    CREATE TABLE message (
        _id INTEGER PRIMARY KEY,
        chat_row_id INTEGER,
        from_me INTEGER,
        timestamp INTEGER,
        text_data TEXT,
        message_type INTEGER
    );
    CREATE TABLE message_media (message_row_id INTEGER, mime_type TEXT);
";

pub const CONTACTS_SCHEMA: &str = "
    CREATE TABLE wa_contacts (_id INTEGER PRIMARY KEY, jid TEXT, display_name TEXT, wa_name TEXT);
";

pub fn db_settings() -> DatabaseConfig {
    DatabaseConfig {
        max_connections: 2,
        connection_timeout_secs: 2,
    }
}

/// Writable handle used to populate a fixture message store
pub struct MsgStoreFixture {
    pub path: PathBuf,
    conn: Connection,
}

impl MsgStoreFixture {
    pub fn create(dir: &Path) -> Self {
        let path = dir.join("msgstore.db");
        let conn = Connection::open(&path).expect("Failed to create message store");
        conn.execute_batch(MSGSTORE_SCHEMA).expect("Failed to create message store schema");
        Self { path, conn }
    }

    pub fn jid(&self, id: i64, raw_string: &str, user: Option<&str>) -> &Self {
        self.conn
            .execute(
                "INSERT INTO jid (_id, raw_string, user) VALUES (?1, ?2, ?3)",
                params![id, raw_string, user],
            )
            .expect("Failed to insert jid");
        self
    }

    pub fn chat(&self, id: i64, jid_row_id: Option<i64>, subject: Option<&str>) -> &Self {
        self.conn
            .execute(
                "INSERT INTO chat (_id, jid_row_id, subject) VALUES (?1, ?2, ?3)",
                params![id, jid_row_id, subject],
            )
            .expect("Failed to insert chat");
        self
    }

    pub fn message(&self, id: i64, chat_row_id: Option<i64>, from_me: bool, timestamp_ms: i64, text: Option<&str>) -> &Self {
        self.conn
            .execute(
                "INSERT INTO message (_id, chat_row_id, from_me, timestamp, text_data, message_type)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0)",
                params![id, chat_row_id, from_me, timestamp_ms, text],
            )
            .expect("Failed to insert message");
        self
    }

    pub fn media(&self, message_row_id: i64, mime_type: &str) -> &Self {
        self.conn
            .execute(
                "INSERT INTO message_media (message_row_id, mime_type) VALUES (?1, ?2)",
                params![message_row_id, mime_type],
            )
            .expect("Failed to insert media");
        self
    }

    pub fn execute(&self, sql: &str) -> &Self {
        self.conn.execute_batch(sql).expect("Failed to run fixture SQL");
        self
    }
}

/// Create a contact store holding `(jid, display_name, wa_name)` rows in order
pub fn create_contacts_db(dir: &Path, rows: &[(&str, Option<&str>, Option<&str>)]) -> PathBuf {
    let path = dir.join("wa.db");
    let conn = Connection::open(&path).expect("Failed to create contact store");
    conn.execute_batch(CONTACTS_SCHEMA).expect("Failed to create contact store schema");
    for (jid, display_name, wa_name) in rows {
        conn.execute(
            "INSERT INTO wa_contacts (jid, display_name, wa_name) VALUES (?1, ?2, ?3)",
            params![jid, display_name, wa_name],
        )
        .expect("Failed to insert contact");
    }
    path
}

/// Write a vCard file
pub fn write_vcf(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("contacts.vcf");
    fs::write(&path, contents).expect("Failed to write address book");
    path
}
