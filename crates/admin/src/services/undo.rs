//! Delete-with-undo for directory users.
//!
//! Deleting a user stores a copy of the removed row in the session. Within the
//! undo window the copy can be re-inserted with its original id; after that
//! (or after one restore) the ticket is gone.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::{User, session_keys};

/// A deleted user that can still be restored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoTicket {
    pub user: User,
    pub deleted_at: DateTime<Utc>,
}

impl UndoTicket {
    #[must_use]
    pub fn new(user: User, deleted_at: DateTime<Utc>) -> Self {
        Self { user, deleted_at }
    }

    /// Whether the ticket can still be redeemed at `now`.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>, window: Duration) -> bool {
        let age = now - self.deleted_at;
        age >= Duration::zero() && age <= window
    }

    /// Consume the ticket, yielding the user if it is still inside the window.
    #[must_use]
    pub fn take_if_fresh(self, now: DateTime<Utc>, window: Duration) -> Option<User> {
        self.is_fresh(now, window).then_some(self.user)
    }
}

/// Store a ticket for `user`, replacing any previous one.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn remember_deleted(
    session: &Session,
    user: User,
) -> Result<(), tower_sessions::session::Error> {
    session
        .insert(session_keys::UNDO_USER, UndoTicket::new(user, Utc::now()))
        .await
}

/// Remove the ticket from the session and return the user if it is fresh.
///
/// The ticket is removed either way, so a second attempt finds nothing.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn take_deleted(
    session: &Session,
    window: Duration,
) -> Result<Option<User>, tower_sessions::session::Error> {
    let ticket: Option<UndoTicket> = session.remove(session_keys::UNDO_USER).await?;
    Ok(ticket.and_then(|t| t.take_if_fresh(Utc::now(), window)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use backoffice_core::{Email, Gender, UserId};
    use chrono::NaiveDate;
    use tower_sessions::MemoryStore;

    use super::*;

    fn user() -> User {
        User {
            id: UserId::new(7),
            first_name: "Sophia".to_string(),
            last_name: "Brown".to_string(),
            age: 42,
            gender: Gender::Female,
            email: Email::parse("sophia.brown@x.dummyjson.com").unwrap(),
            phone: "+81 210-652-2785".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1982, 11, 6).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_ticket_fresh_inside_window() {
        let deleted_at = Utc::now();
        let ticket = UndoTicket::new(user(), deleted_at);
        let window = Duration::seconds(5);

        assert!(ticket.is_fresh(deleted_at, window));
        assert!(ticket.is_fresh(deleted_at + Duration::seconds(5), window));
        assert!(!ticket.is_fresh(deleted_at + Duration::milliseconds(5001), window));
    }

    #[test]
    fn test_ticket_from_the_future_is_rejected() {
        let deleted_at = Utc::now();
        let ticket = UndoTicket::new(user(), deleted_at);
        assert!(!ticket.is_fresh(deleted_at - Duration::seconds(1), Duration::seconds(5)));
    }

    #[test]
    fn test_take_if_fresh() {
        let deleted_at = Utc::now();
        let ticket = UndoTicket::new(user(), deleted_at);
        let restored = ticket
            .clone()
            .take_if_fresh(deleted_at + Duration::seconds(2), Duration::seconds(5))
            .unwrap();
        assert_eq!(restored.id, UserId::new(7));

        assert!(
            ticket
                .take_if_fresh(deleted_at + Duration::seconds(6), Duration::seconds(5))
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_session_ticket_is_single_use() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        remember_deleted(&session, user()).await.unwrap();

        let window = Duration::seconds(5);
        let first = take_deleted(&session, window).await.unwrap();
        assert_eq!(first.map(|u| u.first_name), Some("Sophia".to_string()));

        let second = take_deleted(&session, window).await.unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_expired_ticket_is_dropped() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let stale = UndoTicket::new(user(), Utc::now() - Duration::seconds(30));
        session.insert(session_keys::UNDO_USER, stale).await.unwrap();

        assert!(take_deleted(&session, Duration::seconds(5)).await.unwrap().is_none());
        let leftover: Option<UndoTicket> = session.get(session_keys::UNDO_USER).await.unwrap();
        assert!(leftover.is_none());
    }
}
