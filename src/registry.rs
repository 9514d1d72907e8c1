//! The user/topic registry: a flat CSV table held in memory and rewritten
//! in full on every mutation.
//!
//! On disk the table keeps the historical layout, header `email,password,topic`
//! with one row per (user, topic) and an empty-topic placeholder row for users
//! with no topics yet. In memory the table is keyed: one [`UserEntry`] per
//! email owning the password hash and an ordered topic list, so all rows of a
//! user share a single hash by construction. A single `RwLock` serializes
//! writers within the process; cross-process exclusivity is the flock in
//! `lock.rs`.

use crate::{auth, errors::AppError};
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::{
    io::ErrorKind,
    sync::{Arc, RwLock},
};

const CSV_HEADERS: [&str; 3] = ["email", "password", "topic"];

/// One persisted row, as exposed by [`UserRegistry::dump`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTopicRow {
    pub email: String,
    pub password: String,
    pub topic: String,
}

#[derive(Debug, Clone)]
struct UserEntry {
    email: String,
    password_hash: String,
    topics: Vec<String>,
}

pub trait UserRegistry: Send + Sync {
    fn register(&self, email: &str, password: &str) -> Result<(), AppError>;
    fn login(&self, email: &str, password: &str) -> Result<String, AppError>;
    fn topics(&self, email: &str) -> Result<Vec<String>, AppError>;
    fn add_topic(&self, email: &str, topic: &str) -> Result<(), AppError>;
    fn delete_topic(&self, email: &str, topic: &str) -> Result<(), AppError>;
    fn dump(&self) -> Result<Vec<UserTopicRow>, AppError>;
}

#[derive(Debug, Clone, Default)]
pub struct RegistryCsv {
    entries: Arc<RwLock<Vec<UserEntry>>>,
    path: String,
}

impl RegistryCsv {
    pub fn load(path: &str) -> Result<Self, AppError> {
        if let Err(err) = std::fs::metadata(path) {
            match err.kind() {
                ErrorKind::NotFound => {
                    log::info!("Creating new user table at {path}");
                    let mut csv_wrt = csv::Writer::from_path(path)?;
                    csv_wrt.write_record(CSV_HEADERS)?;
                    csv_wrt.flush()?;
                }
                _ => Err(err)?,
            }
        }

        let mut csv_reader = csv::Reader::from_path(path)?;

        let mut entries: Vec<UserEntry> = vec![];
        for record in csv_reader.records() {
            let record = record?;
            let email = record
                .get(0)
                .ok_or(anyhow!("couldnt get record email"))?
                .to_string();
            let password = record
                .get(1)
                .ok_or(anyhow!("couldnt get record password"))?
                .to_string();
            let topic = record
                .get(2)
                .ok_or(anyhow!("couldnt get record topic"))?
                .to_string();

            // first-seen row wins the hash; later rows only contribute topics
            let idx = match entries.iter().position(|e| e.email == email) {
                Some(idx) => idx,
                None => {
                    entries.push(UserEntry {
                        email: email.clone(),
                        password_hash: password,
                        topics: vec![],
                    });
                    entries.len() - 1
                }
            };

            if !topic.trim().is_empty() {
                entries[idx].topics.push(topic);
            }
        }

        Ok(RegistryCsv {
            entries: Arc::new(RwLock::new(entries)),
            path: path.to_string(),
        })
    }

    fn save(&self) -> Result<(), AppError> {
        let entries = self.entries.read().expect("registry lock poisoned");

        let temp_path = format!("{}-tmp", &self.path);
        let mut csv_wrt = csv::Writer::from_path(&temp_path)?;
        csv_wrt.write_record(CSV_HEADERS)?;
        for entry in entries.iter() {
            if entry.topics.is_empty() {
                // placeholder row so the user survives the rewrite
                csv_wrt.write_record([entry.email.as_str(), entry.password_hash.as_str(), ""])?;
            }
            for topic in &entry.topics {
                csv_wrt.write_record([
                    entry.email.as_str(),
                    entry.password_hash.as_str(),
                    topic.as_str(),
                ])?;
            }
        }
        csv_wrt.flush()?;
        std::fs::rename(&temp_path, &self.path)?;

        Ok(())
    }
}

impl UserRegistry for RegistryCsv {
    fn register(&self, email: &str, password: &str) -> Result<(), AppError> {
        if !auth::is_valid_email(email) {
            return Err(AppError::InvalidInput(format!(
                "'{email}' is not a valid email address"
            )));
        }

        let mut entries = self.entries.write().expect("registry lock poisoned");
        if entries.iter().any(|e| e.email == email) {
            return Err(AppError::AlreadyExists);
        }

        entries.push(UserEntry {
            email: email.to_string(),
            password_hash: auth::hash_password(password),
            topics: vec![],
        });
        drop(entries);

        self.save()
    }

    fn login(&self, email: &str, password: &str) -> Result<String, AppError> {
        let entries = self.entries.read().expect("registry lock poisoned");
        let entry = entries
            .iter()
            .find(|e| e.email == email)
            .ok_or(AppError::Unauthorized)?;

        if !auth::verify_password(&entry.password_hash, password) {
            return Err(AppError::Unauthorized);
        }

        Ok(entry.email.clone())
    }

    fn topics(&self, email: &str) -> Result<Vec<String>, AppError> {
        let entries = self.entries.read().expect("registry lock poisoned");
        let entry = entries
            .iter()
            .find(|e| e.email == email)
            .ok_or(AppError::UserNotFound)?;

        Ok(entry
            .topics
            .iter()
            .filter(|t| !t.trim().is_empty())
            .cloned()
            .collect())
    }

    fn add_topic(&self, email: &str, topic: &str) -> Result<(), AppError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(AppError::InvalidInput("topic cannot be empty".to_string()));
        }

        let mut entries = self.entries.write().expect("registry lock poisoned");
        let entry = entries
            .iter_mut()
            .find(|e| e.email == email)
            .ok_or(AppError::UserNotFound)?;

        // duplicates are permitted, two adds produce two rows
        entry.topics.push(topic.to_string());
        drop(entries);

        self.save()
    }

    fn delete_topic(&self, email: &str, topic: &str) -> Result<(), AppError> {
        // normalized like add, so a delete matches what add stored
        let topic = topic.trim();

        let mut entries = self.entries.write().expect("registry lock poisoned");
        let entry = entries
            .iter_mut()
            .find(|e| e.email == email)
            .ok_or(AppError::UserNotFound)?;

        let before = entry.topics.len();
        entry.topics.retain(|t| t.as_str() != topic);
        if entry.topics.len() == before {
            return Err(AppError::TopicNotFound);
        }
        drop(entries);

        self.save()
    }

    fn dump(&self) -> Result<Vec<UserTopicRow>, AppError> {
        let entries = self.entries.read().expect("registry lock poisoned");

        let mut rows = vec![];
        for entry in entries.iter() {
            if entry.topics.is_empty() {
                rows.push(UserTopicRow {
                    email: entry.email.clone(),
                    password: entry.password_hash.clone(),
                    topic: String::new(),
                });
            }
            for topic in &entry.topics {
                rows.push(UserTopicRow {
                    email: entry.email.clone(),
                    password: entry.password_hash.clone(),
                    topic: topic.clone(),
                });
            }
        }

        Ok(rows)
    }
}
