use serde::{Deserialize, Serialize};
use swap_shared::{Masked, Notice};

/// The signed-in user, passed explicitly to whatever needs it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionContext {
    pub user_id: Option<i64>,
    pub full_name: Option<String>,
    pub access_token: Option<Masked<String>>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            access_token: (!token.trim().is_empty()).then(|| Masked::new(token)),
            ..Self::default()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.access_token.as_ref().map(|t| t.expose().as_str())
    }
}

/// Where the front end shows transient notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);

    fn success(&self, message: &str) {
        self.notify(Notice::success(message));
    }

    fn warning(&self, message: &str) {
        self.notify(Notice::warning(message));
    }

    fn error(&self, message: &str) {
        self.notify(Notice::error(message));
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AppRoute {
    Home,
    BookingHistory,
    Station(i64),
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: AppRoute);
}
