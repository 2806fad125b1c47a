//! Localized notification titles and messages.
//!
//! Rendered once, when a notification is composed; stored text is never
//! re-derived.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contract::model::{Notification, NotificationPayload};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Locale {
    #[default]
    En,
    PtBr,
}

pub fn format_date(date: NaiveDate, locale: Locale) -> String {
    match locale {
        Locale::En => date.format("%Y-%m-%d").to_string(),
        Locale::PtBr => date.format("%d/%m/%Y").to_string(),
    }
}

/// `(title, message)` for a payload.
pub fn render(payload: &NotificationPayload, locale: Locale) -> (String, String) {
    use NotificationPayload::*;
    match (payload, locale) {
        (
            PendingApproval {
                owner_name,
                entry_date,
                ..
            },
            Locale::En,
        ) => (
            "Time entry pending approval".to_string(),
            format!(
                "{} submitted a time entry for {} that awaits your approval.",
                owner_name,
                format_date(*entry_date, locale)
            ),
        ),
        (
            PendingApproval {
                owner_name,
                entry_date,
                ..
            },
            Locale::PtBr,
        ) => (
            "Registro de ponto pendente de aprovação".to_string(),
            format!(
                "{} registrou o ponto de {}, aguardando sua aprovação.",
                owner_name,
                format_date(*entry_date, locale)
            ),
        ),
        (Approved { entry_date, .. }, Locale::En) => (
            "Time entry approved".to_string(),
            format!(
                "Your time entry for {} was approved.",
                format_date(*entry_date, locale)
            ),
        ),
        (Approved { entry_date, .. }, Locale::PtBr) => (
            "Registro de ponto aprovado".to_string(),
            format!(
                "Seu registro de ponto de {} foi aprovado.",
                format_date(*entry_date, locale)
            ),
        ),
        (
            Rejected {
                entry_date, reason, ..
            },
            Locale::En,
        ) => {
            let mut message = format!(
                "Your time entry for {} was rejected.",
                format_date(*entry_date, locale)
            );
            if let Some(reason) = reason {
                message.push_str(&format!(" Reason: {}", reason));
            }
            ("Time entry rejected".to_string(), message)
        }
        (
            Rejected {
                entry_date, reason, ..
            },
            Locale::PtBr,
        ) => {
            let mut message = format!(
                "Seu registro de ponto de {} foi rejeitado.",
                format_date(*entry_date, locale)
            );
            if let Some(reason) = reason {
                message.push_str(&format!(" Motivo: {}", reason));
            }
            ("Registro de ponto rejeitado".to_string(), message)
        }
        (Reminder { note }, Locale::En) => ("Reminder".to_string(), note.clone()),
        (Reminder { note }, Locale::PtBr) => ("Lembrete".to_string(), note.clone()),
        (Report { note }, Locale::En) => ("Report available".to_string(), note.clone()),
        (Report { note }, Locale::PtBr) => ("Relatório disponível".to_string(), note.clone()),
        (System { note }, Locale::En) => ("System notice".to_string(), note.clone()),
        (System { note }, Locale::PtBr) => ("Aviso do sistema".to_string(), note.clone()),
    }
}

/// Build an unread notification with rendered text.
pub fn compose(
    recipient_id: Uuid,
    tenant_id: Uuid,
    payload: NotificationPayload,
    locale: Locale,
    now: DateTime<Utc>,
) -> Notification {
    let (title, message) = render(&payload, locale);
    Notification {
        id: Uuid::new_v4(),
        recipient_id,
        tenant_id,
        title,
        message,
        payload,
        read: false,
        read_at: None,
        created_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::model::NotificationKind;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    #[test]
    fn pending_approval_mentions_owner_and_date() {
        let payload = NotificationPayload::PendingApproval {
            entry_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            owner_name: "Ana Souza".into(),
            entry_date: date(),
        };
        let (title, message) = render(&payload, Locale::En);
        assert_eq!(title, "Time entry pending approval");
        assert!(message.contains("Ana Souza"));
        assert!(message.contains("2024-01-10"));

        let (title, message) = render(&payload, Locale::PtBr);
        assert_eq!(title, "Registro de ponto pendente de aprovação");
        assert!(message.contains("10/01/2024"));
    }

    #[test]
    fn rejection_reason_is_optional() {
        let with_reason = NotificationPayload::Rejected {
            entry_id: Uuid::new_v4(),
            entry_date: date(),
            decided_by: Uuid::new_v4(),
            reason: Some("missing exit".into()),
        };
        let (_, message) = render(&with_reason, Locale::En);
        assert!(message.ends_with("Reason: missing exit"));

        let without = NotificationPayload::Rejected {
            entry_id: Uuid::new_v4(),
            entry_date: date(),
            decided_by: Uuid::new_v4(),
            reason: None,
        };
        let (_, message) = render(&without, Locale::PtBr);
        assert_eq!(message, "Seu registro de ponto de 10/01/2024 foi rejeitado.");
    }

    #[test]
    fn compose_derives_kind_and_related_entry() {
        let entry_id = Uuid::new_v4();
        let n = compose(
            Uuid::new_v4(),
            Uuid::new_v4(),
            NotificationPayload::Approved {
                entry_id,
                entry_date: date(),
                decided_by: Uuid::new_v4(),
            },
            Locale::En,
            Utc::now(),
        );
        assert_eq!(n.kind(), NotificationKind::Approved);
        assert_eq!(n.related_entry_id(), Some(entry_id));
        assert!(!n.read);
        assert_eq!(n.title, "Time entry approved");
    }

    #[test]
    fn payload_is_tagged_by_kind() {
        let payload = NotificationPayload::System {
            note: "maintenance at 22:00".into(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "system");
        assert_eq!(json["note"], "maintenance at 22:00");

        let locale: Locale = serde_json::from_str("\"pt-br\"").unwrap();
        assert_eq!(locale, Locale::PtBr);
    }
}
