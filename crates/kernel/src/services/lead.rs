//! Lead intake: contact-form submissions.
//!
//! A submission is validated, persisted, and then announced through the
//! notification channel. Persisting is the only part that can fail the
//! request; delivery problems are logged and dropped.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use super::notify::Notifier;
use crate::error::{AppError, AppResult};
use crate::models::{Lead, NewLead};
use crate::storage::{LeadStore, bounded};

/// Longest accepted name or email address.
const MAX_SHORT_FIELD: usize = 200;

/// Longest accepted phone number.
const MAX_PHONE: usize = 100;

/// Longest accepted message.
const MAX_MESSAGE: usize = 5000;

/// Raw contact-form input. Missing fields deserialize as empty and are
/// reported by validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LeadForm {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
}

impl LeadForm {
    /// Trim and check every field, reporting all problems at once.
    pub fn validate(self) -> AppResult<NewLead> {
        let name = self.name.trim().to_string();
        let email = self.email.trim().to_string();
        let phone = self.phone.unwrap_or_default().trim().to_string();
        let message = self.message.trim().to_string();

        let mut errors = Vec::new();
        if name.is_empty() {
            errors.push("name is required".to_string());
        } else if name.chars().count() > MAX_SHORT_FIELD {
            errors.push(format!("name must be at most {MAX_SHORT_FIELD} characters"));
        }
        if email.is_empty() {
            errors.push("email is required".to_string());
        } else if email.chars().count() > MAX_SHORT_FIELD {
            errors.push(format!("email must be at most {MAX_SHORT_FIELD} characters"));
        } else if email.parse::<lettre::Address>().is_err() {
            errors.push("email is not a valid address".to_string());
        }
        if phone.chars().count() > MAX_PHONE {
            errors.push(format!("phone must be at most {MAX_PHONE} characters"));
        }
        if message.is_empty() {
            errors.push("message is required".to_string());
        } else if message.chars().count() > MAX_MESSAGE {
            errors.push(format!("message must be at most {MAX_MESSAGE} characters"));
        }

        if !errors.is_empty() {
            return Err(AppError::Validation(errors.join("; ")));
        }

        Ok(NewLead {
            name,
            email,
            phone,
            message,
        })
    }
}

#[derive(Clone)]
pub struct LeadIntake {
    store: Arc<dyn LeadStore>,
    notifier: Arc<dyn Notifier>,
    recipients: Vec<String>,
    store_timeout: Duration,
    notify_timeout: Duration,
}

impl LeadIntake {
    pub fn new(
        store: Arc<dyn LeadStore>,
        notifier: Arc<dyn Notifier>,
        recipients: Vec<String>,
        store_timeout: Duration,
        notify_timeout: Duration,
    ) -> Self {
        Self {
            store,
            notifier,
            recipients,
            store_timeout,
            notify_timeout,
        }
    }

    /// Validate, persist, then notify.
    pub async fn submit(&self, form: LeadForm) -> AppResult<Lead> {
        let new_lead = form.validate()?;
        let lead = bounded(self.store_timeout, "lead insert", self.store.insert(new_lead)).await?;
        info!(lead = %lead.id, "lead recorded");

        let subject = format!("New lead from {}", lead.name);
        let body = lead_body(&lead);
        match bounded(
            self.notify_timeout,
            "lead notification",
            self.notifier.send(&subject, &body, &self.recipients),
        )
        .await
        {
            Ok(()) => info!(lead = %lead.id, "lead notification sent"),
            Err(e) => warn!(lead = %lead.id, error = %format!("{e:#}"), "lead notification failed"),
        }

        Ok(lead)
    }

    /// All leads, newest first.
    pub async fn list(&self) -> AppResult<Vec<Lead>> {
        let leads = bounded(self.store_timeout, "lead list", self.store.list()).await?;
        Ok(leads)
    }
}

fn lead_body(lead: &Lead) -> String {
    let phone = if lead.phone.is_empty() {
        "-"
    } else {
        lead.phone.as_str()
    };
    format!(
        "A new enquiry was submitted on the website.\n\n\
         Name:     {}\n\
         Email:    {}\n\
         Phone:    {phone}\n\
         Received: {}\n\n\
         {}\n",
        lead.name,
        lead.email,
        lead.created.format("%Y-%m-%d %H:%M UTC"),
        lead.message
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Records every send.
    #[derive(Default)]
    struct Recording {
        sent: Mutex<Vec<(String, String, Vec<String>)>>,
    }

    #[async_trait]
    impl Notifier for Recording {
        async fn send(&self, subject: &str, body: &str, to: &[String]) -> anyhow::Result<()> {
            self.sent
                .lock()
                .push((subject.to_string(), body.to_string(), to.to_vec()));
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl Notifier for Failing {
        async fn send(&self, _: &str, _: &str, _: &[String]) -> anyhow::Result<()> {
            anyhow::bail!("connection refused")
        }
    }

    struct Hanging;

    #[async_trait]
    impl Notifier for Hanging {
        async fn send(&self, _: &str, _: &str, _: &[String]) -> anyhow::Result<()> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    fn intake(notifier: Arc<dyn Notifier>) -> (LeadIntake, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let intake = LeadIntake::new(
            store.clone(),
            notifier,
            vec!["office@example.com".to_string()],
            Duration::from_secs(1),
            Duration::from_millis(50),
        );
        (intake, store)
    }

    fn form() -> LeadForm {
        LeadForm {
            name: " Jo Bloggs ".to_string(),
            email: "jo@example.com".to_string(),
            phone: Some("01234 567890".to_string()),
            message: "Quote for a loft conversion please".to_string(),
        }
    }

    #[tokio::test]
    async fn submit_persists_and_notifies() {
        let notifier = Arc::new(Recording::default());
        let (intake, store) = intake(notifier.clone());

        let lead = intake.submit(form()).await.unwrap();
        assert_eq!(lead.name, "Jo Bloggs");

        let stored = LeadStore::list(store.as_ref()).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, lead.id);

        let sent = notifier.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "New lead from Jo Bloggs");
        assert!(sent[0].1.contains("01234 567890"));
        assert_eq!(sent[0].2, vec!["office@example.com".to_string()]);
    }

    #[tokio::test]
    async fn notification_failure_does_not_fail_submission() {
        let (intake, store) = intake(Arc::new(Failing));
        assert!(intake.submit(form()).await.is_ok());
        assert_eq!(LeadStore::list(store.as_ref()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn notification_timeout_does_not_fail_submission() {
        let (intake, store) = intake(Arc::new(Hanging));
        assert!(intake.submit(form()).await.is_ok());
        assert_eq!(LeadStore::list(store.as_ref()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_lead_is_not_persisted_or_sent() {
        let notifier = Arc::new(Recording::default());
        let (intake, store) = intake(notifier.clone());

        let mut bad = form();
        bad.email = "not-an-email".to_string();
        assert!(matches!(
            intake.submit(bad).await,
            Err(AppError::Validation(_))
        ));
        assert!(LeadStore::list(store.as_ref()).await.unwrap().is_empty());
        assert!(notifier.sent.lock().is_empty());
    }

    #[test]
    fn validate_reports_every_missing_field() {
        let err = LeadForm::default().validate().unwrap_err();
        let AppError::Validation(msg) = err else {
            panic!("expected validation error");
        };
        assert!(msg.contains("name is required"));
        assert!(msg.contains("email is required"));
        assert!(msg.contains("message is required"));
    }

    #[test]
    fn field_caps_match_storage_columns() {
        let accepted = LeadForm {
            phone: Some("1".repeat(100)),
            ..form()
        };
        assert!(accepted.validate().is_ok());

        let long_phone = LeadForm {
            phone: Some("1".repeat(101)),
            ..form()
        };
        let AppError::Validation(msg) = long_phone.validate().unwrap_err() else {
            panic!("expected validation error");
        };
        assert!(msg.contains("phone must be at most 100"));

        let long_email = LeadForm {
            email: format!("{}@example.com", "a".repeat(190)),
            ..form()
        };
        let AppError::Validation(msg) = long_email.validate().unwrap_err() else {
            panic!("expected validation error");
        };
        assert!(msg.contains("email must be at most 200"));
    }

    #[test]
    fn phone_is_optional() {
        let mut input = form();
        input.phone = None;
        assert_eq!(input.validate().unwrap().phone, "");
    }

    #[test]
    fn whitespace_only_message_is_rejected() {
        let mut input = form();
        input.message = "   ".to_string();
        assert!(input.validate().is_err());
    }

    #[test]
    fn body_marks_missing_phone() {
        let mut input = form();
        input.phone = None;
        let lead = input.validate().unwrap().into_lead();
        assert!(lead_body(&lead).contains("Phone:    -"));
    }
}
