use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::contains_ignore_case;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContactStatus {
    #[default]
    New,
    InProgress,
    Replied,
    Closed,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::New => "new",
            ContactStatus::InProgress => "in-progress",
            ContactStatus::Replied => "replied",
            ContactStatus::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactReply {
    pub subject: String,
    pub message: String,
    pub sent_at: DateTime<Utc>,
}

/// Contact-form submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub status: ContactStatus,
    pub replied: bool,
    #[serde(default)]
    pub replies: Vec<ContactReply>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_replied: Option<DateTime<Utc>>,
}

impl Contact {
    /// Mark replied and keep the reply in the history
    pub fn record_reply(&mut self, reply: ContactReply) {
        self.replied = true;
        self.status = ContactStatus::Replied;
        self.last_replied = Some(reply.sent_at);
        self.replies.push(reply);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl NewContact {
    pub fn into_contact(self, id: String, now: DateTime<Utc>) -> Contact {
        Contact {
            id,
            name: self.name,
            email: self.email,
            message: self.message,
            status: ContactStatus::New,
            replied: false,
            replies: Vec::new(),
            created_at: now,
            updated_at: None,
            last_replied: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
    pub status: Option<ContactStatus>,
    pub replied: Option<bool>,
}

impl ContactUpdate {
    pub fn apply(self, contact: &mut Contact, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            contact.name = name;
        }
        if let Some(email) = self.email {
            contact.email = email;
        }
        if let Some(message) = self.message {
            contact.message = message;
        }
        if let Some(status) = self.status {
            contact.status = status;
        }
        if let Some(replied) = self.replied {
            contact.replied = replied;
        }
        contact.updated_at = Some(now);
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContactFilter {
    pub status: Option<ContactStatus>,
    pub replied: Option<bool>,
    /// Matched against name, email and message
    pub search: Option<String>,
}

impl ContactFilter {
    pub fn matches(&self, contact: &Contact) -> bool {
        if let Some(status) = self.status {
            if contact.status != status {
                return false;
            }
        }
        if let Some(replied) = self.replied {
            if contact.replied != replied {
                return false;
            }
        }
        if let Some(search) = &self.search {
            return contains_ignore_case(&contact.name, search)
                || contains_ignore_case(&contact.email, search)
                || contains_ignore_case(&contact.message, search);
        }
        true
    }
}

/// Day/week/month boundaries (UTC) used by the dashboard counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsWindow {
    pub today: DateTime<Utc>,
    pub last_7_days: DateTime<Utc>,
    pub month_start: DateTime<Utc>,
}

impl StatsWindow {
    pub fn at(now: DateTime<Utc>) -> Self {
        let date = now.date_naive();
        let today = date.and_time(NaiveTime::MIN).and_utc();
        let month_start = NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
            .unwrap_or(date)
            .and_time(NaiveTime::MIN)
            .and_utc();

        Self {
            today,
            last_7_days: today - Duration::days(7),
            month_start,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactStats {
    pub total: u64,
    pub new: u64,
    pub replied: u64,
    pub today: u64,
    pub last_7_days: u64,
    pub this_month: u64,
    pub by_status: BTreeMap<String, u64>,
}

impl ContactStats {
    /// Count a set of contacts in memory
    pub fn tally<'a>(contacts: impl IntoIterator<Item = &'a Contact>, window: StatsWindow) -> Self {
        let mut stats = ContactStats::default();
        for contact in contacts {
            stats.total += 1;
            if contact.status == ContactStatus::New {
                stats.new += 1;
            }
            if contact.replied {
                stats.replied += 1;
            }
            if contact.created_at >= window.today {
                stats.today += 1;
            }
            if contact.created_at >= window.last_7_days {
                stats.last_7_days += 1;
            }
            if contact.created_at >= window.month_start {
                stats.this_month += 1;
            }
            *stats
                .by_status
                .entry(contact.status.as_str().to_string())
                .or_insert(0) += 1;
        }
        stats
    }
}
