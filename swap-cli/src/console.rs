use std::sync::{Mutex, PoisonError};

use swap_core::session::{AppRoute, Navigator, Notifier};
use swap_shared::{Notice, NoticeLevel};
use tracing::{error, info, warn};

/// Notices go to stderr so command output stays pipeable.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        let label = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "ok",
            NoticeLevel::Warning => {
                warn!("{}", notice.message);
                "warning"
            }
            NoticeLevel::Error => {
                error!("{}", notice.message);
                "error"
            }
        };
        eprintln!("[{}] {}", label, notice.message);
    }
}

/// Remembers where the flow asked to go; the command loop follows it.
#[derive(Default)]
pub struct ConsoleNavigator {
    routes: Mutex<Vec<AppRoute>>,
}

impl ConsoleNavigator {
    pub fn last(&self) -> Option<AppRoute> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .copied()
    }
}

impl Navigator for ConsoleNavigator {
    fn navigate(&self, route: AppRoute) {
        info!("Navigating to {:?}", route);
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route);
    }
}
