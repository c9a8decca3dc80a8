//! Session gate: who is logged in, and what they may do.

use crate::error::DashboardError;
use crate::model::{Role, User};
use railview_env::UserId;
use std::fmt;
use tracing::info;

/// Actions a presentation layer can ask about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Change a train's signal state (privileged)
    ChangeSignal,
    ViewTrains,
    ViewTrainDetails,
    MarkNotificationRead,
    DismissNotification,
}

impl Action {
    /// Returns true for actions that need a controller.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Action::ChangeSignal)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::ChangeSignal => "change_signal",
            Action::ViewTrains => "view_trains",
            Action::ViewTrainDetails => "view_train_details",
            Action::MarkNotificationRead => "mark_notification_read",
            Action::DismissNotification => "dismiss_notification",
        };
        f.write_str(name)
    }
}

/// Holds the current user, if any.
#[derive(Debug, Default)]
pub struct Session {
    user: Option<User>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs in with a freshly generated id.
    pub fn login(&mut self, name: &str, role: Option<Role>) -> Result<&User, DashboardError> {
        self.login_as(UserId::new(), name, role)
    }

    /// Logs in with a caller-supplied id.
    ///
    /// The name is trimmed. On failure the previous session is kept.
    pub fn login_as(
        &mut self,
        id: UserId,
        name: &str,
        role: Option<Role>,
    ) -> Result<&User, DashboardError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DashboardError::validation("name must not be empty"));
        }
        let role = role.ok_or_else(|| DashboardError::validation("a role must be selected"))?;

        info!("Login: {} as {} (id={})", name, role, id);
        Ok(&*self.user.insert(User {
            id,
            name: name.to_string(),
            role,
        }))
    }

    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            info!("Logout: {} (id={})", user.name, user.id);
        }
    }

    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Signal changes need a controller; everything else any logged-in user.
    pub fn is_authorized(&self, action: Action) -> bool {
        match (&self.user, action.is_privileged()) {
            (None, _) => false,
            (Some(user), true) => user.role == Role::Controller,
            (Some(_), false) => true,
        }
    }

    pub fn authorize(&self, action: Action) -> Result<(), DashboardError> {
        if self.is_authorized(action) {
            Ok(())
        } else {
            Err(DashboardError::Unauthorized { action })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_trims_and_stores_user() {
        let mut session = Session::new();
        let user = session.login("  Asha Rao ", Some(Role::Controller)).unwrap().clone();

        assert_eq!(user.name, "Asha Rao");
        assert_eq!(user.role, Role::Controller);
        assert_eq!(session.current_user(), Some(&user));
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_login_rejects_blank_name() {
        let mut session = Session::new();
        let err = session.login("   ", Some(Role::Government)).unwrap_err();
        assert!(matches!(err, DashboardError::Validation(_)));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_login_rejects_missing_role() {
        let mut session = Session::new();
        let err = session.login("Asha", None).unwrap_err();
        assert!(matches!(err, DashboardError::Validation(_)));
    }

    #[test]
    fn test_failed_login_keeps_previous_session() {
        let mut session = Session::new();
        session.login("Asha", Some(Role::Controller)).unwrap();
        assert!(session.login("", Some(Role::Government)).is_err());

        assert_eq!(session.current_user().map(|u| u.name.as_str()), Some("Asha"));
    }

    #[test]
    fn test_login_replaces_session() {
        let mut session = Session::new();
        let first = session.login("Asha", Some(Role::Controller)).unwrap().id;
        let second = session.login("Vikram", Some(Role::Government)).unwrap().id;

        assert_ne!(first, second);
        assert_eq!(session.current_user().unwrap().role, Role::Government);
    }

    #[test]
    fn test_logout_clears_unconditionally() {
        let mut session = Session::new();
        session.logout();
        session.login("Asha", Some(Role::Controller)).unwrap();
        session.logout();
        assert!(session.current_user().is_none());
    }

    #[test]
    fn test_signal_change_needs_controller() {
        let mut session = Session::new();
        assert!(!session.is_authorized(Action::ChangeSignal));

        session.login("Vikram", Some(Role::Government)).unwrap();
        assert!(!session.is_authorized(Action::ChangeSignal));
        assert!(session.is_authorized(Action::ViewTrains));
        assert!(matches!(
            session.authorize(Action::ChangeSignal),
            Err(DashboardError::Unauthorized { action: Action::ChangeSignal })
        ));

        session.login("Asha", Some(Role::Controller)).unwrap();
        assert!(session.is_authorized(Action::ChangeSignal));
        assert!(session.authorize(Action::ChangeSignal).is_ok());
    }
}
