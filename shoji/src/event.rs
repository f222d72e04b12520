use std::fmt;

/// What triggered a reconciliation. Used for diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    UserCommand,
    OsNotification(String),
    Startup,
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEvent::UserCommand => write!(f, "userCommand"),
            SessionEvent::OsNotification(name) => write!(f, "osNotification({})", name),
            SessionEvent::Startup => write!(f, "startup"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(SessionEvent::UserCommand.to_string(), "userCommand");
        assert_eq!(
            SessionEvent::OsNotification("AXWindowCreated".to_string()).to_string(),
            "osNotification(AXWindowCreated)"
        );
        assert_eq!(SessionEvent::Startup.to_string(), "startup");
    }
}
