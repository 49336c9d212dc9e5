use crate::domain::errors::{DomainError, DomainResult};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of event a notification describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    WorkspaceInvite,
    Workspace,
    ProjectAdd,
    ProjectAdded,
    ProjectRemoved,
    ProjectRoleUpdated,
    ProjectArchived,
    ProjectStatus,
    ProjectTitle,
    ProjectDescription,
    TaskAssigned,
    General,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::WorkspaceInvite => "workspace_invite",
            NotificationType::Workspace => "workspace",
            NotificationType::ProjectAdd => "project_add",
            NotificationType::ProjectAdded => "project_added",
            NotificationType::ProjectRemoved => "project_removed",
            NotificationType::ProjectRoleUpdated => "project_role_updated",
            NotificationType::ProjectArchived => "project_archived",
            NotificationType::ProjectStatus => "project_status",
            NotificationType::ProjectTitle => "project_title",
            NotificationType::ProjectDescription => "project_description",
            NotificationType::TaskAssigned => "task_assigned",
            NotificationType::General => "general",
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for NotificationType {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "workspace_invite" => NotificationType::WorkspaceInvite,
            "workspace" => NotificationType::Workspace,
            "project_add" => NotificationType::ProjectAdd,
            "project_added" => NotificationType::ProjectAdded,
            "project_removed" => NotificationType::ProjectRemoved,
            "project_role_updated" => NotificationType::ProjectRoleUpdated,
            "project_archived" => NotificationType::ProjectArchived,
            "project_status" => NotificationType::ProjectStatus,
            "project_title" => NotificationType::ProjectTitle,
            "project_description" => NotificationType::ProjectDescription,
            "task_assigned" => NotificationType::TaskAssigned,
            _ => NotificationType::General,
        }
    }
}

impl From<String> for NotificationType {
    fn from(s: String) -> Self {
        NotificationType::from(s.as_str())
    }
}

/// What a notification points at; decides the frontend link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationTarget {
    WorkspaceInvite { workspace_id: Uuid, token: String },
    Workspace { workspace_id: Uuid },
    Project { workspace_id: Uuid, project_id: Uuid },
    None,
}

impl NotificationTarget {
    pub fn link(&self, frontend_url: &str) -> String {
        let base = frontend_url.trim_end_matches('/');
        match self {
            NotificationTarget::WorkspaceInvite {
                workspace_id,
                token,
            } => format!(
                "{}/workspace/invite-user?workspaceId={}&token={}",
                base, workspace_id, token
            ),
            NotificationTarget::Workspace { workspace_id } => {
                format!("{}/workspaces/{}", base, workspace_id)
            }
            NotificationTarget::Project {
                workspace_id,
                project_id,
            } => format!("{}/workspaces/{}/projects/{}", base, workspace_id, project_id),
            NotificationTarget::None => base.to_string(),
        }
    }
}

/// Input from a mutation handler that wants a user notified
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub notification_type: NotificationType,
    pub message: String,
    pub target: NotificationTarget,
}

impl NewNotification {
    pub fn new(
        user_id: Uuid,
        notification_type: NotificationType,
        message: impl Into<String>,
        target: NotificationTarget,
    ) -> Self {
        Self {
            user_id,
            notification_type,
            message: message.into(),
            target,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.message.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Notification message cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the stored record, resolving the link against the frontend base URL
    pub fn into_record(self, frontend_url: &str) -> Notification {
        let link = self.target.link(frontend_url);
        Notification {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            notification_type: self.notification_type,
            message: self.message,
            link: Some(link),
            is_read: false,
            // Microsecond precision, the same as the stored column
            created_at: Utc::now().trunc_subsecs(6),
        }
    }
}

/// Persisted notification record; also the shape pushed to live connections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub message: String,
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Fixed-width RFC 3339 so stored timestamps sort lexically
    pub fn created_at_rfc3339(&self) -> String {
        self.created_at.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

/// Value pushed over a live connection. Built fresh per publish and not retained.
pub type NotificationEvent = Notification;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_type_round_trips_through_str() {
        for t in [
            NotificationType::WorkspaceInvite,
            NotificationType::ProjectArchived,
            NotificationType::TaskAssigned,
        ] {
            assert_eq!(NotificationType::from(t.as_str()), t);
        }
    }

    #[test]
    fn test_unknown_type_falls_back_to_general() {
        assert_eq!(
            NotificationType::from("something_new".to_string()),
            NotificationType::General
        );
    }

    #[test]
    fn test_links_per_target() {
        let ws = Uuid::new_v4();
        let project = Uuid::new_v4();
        let base = "http://localhost:3000/";

        assert_eq!(
            NotificationTarget::Workspace { workspace_id: ws }.link(base),
            format!("http://localhost:3000/workspaces/{}", ws)
        );
        assert_eq!(
            NotificationTarget::Project {
                workspace_id: ws,
                project_id: project
            }
            .link(base),
            format!("http://localhost:3000/workspaces/{}/projects/{}", ws, project)
        );
        assert_eq!(
            NotificationTarget::WorkspaceInvite {
                workspace_id: ws,
                token: "abc".to_string()
            }
            .link(base),
            format!(
                "http://localhost:3000/workspace/invite-user?workspaceId={}&token=abc",
                ws
            )
        );
        assert_eq!(NotificationTarget::None.link(base), "http://localhost:3000");
    }

    #[test]
    fn test_into_record_starts_unread() {
        let user_id = Uuid::new_v4();
        let record = NewNotification::new(
            user_id,
            NotificationType::TaskAssigned,
            "You were assigned",
            NotificationTarget::None,
        )
        .into_record("http://app");

        assert_eq!(record.user_id, user_id);
        assert!(!record.is_read);
        assert_eq!(record.link.as_deref(), Some("http://app"));
    }

    #[test]
    fn test_created_at_survives_storage_format() {
        let record = NewNotification::new(
            Uuid::new_v4(),
            NotificationType::General,
            "hi",
            NotificationTarget::None,
        )
        .into_record("http://app");

        let stored = DateTime::parse_from_rfc3339(&record.created_at_rfc3339())
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(stored, record.created_at);
        assert_eq!(
            serde_json::to_value(stored).unwrap(),
            serde_json::to_value(record.created_at).unwrap()
        );
    }

    #[test]
    fn test_empty_message_is_rejected() {
        let n = NewNotification::new(
            Uuid::new_v4(),
            NotificationType::General,
            "   ",
            NotificationTarget::None,
        );
        assert!(n.validate().is_err());
    }

    #[test]
    fn test_serialized_shape_uses_type_key() {
        let record = NewNotification::new(
            Uuid::new_v4(),
            NotificationType::TaskAssigned,
            "hi",
            NotificationTarget::None,
        )
        .into_record("http://app");

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "task_assigned");
        assert_eq!(value["is_read"], false);
        for key in ["id", "user_id", "message", "link", "created_at"] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
    }
}
