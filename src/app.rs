//! Page flow of the interactive front end
//!
//! ```text
//! Landing ──connect──▶ Connect ──connected──▶ Dashboard
//!    ▲                   │  ▲                    │
//!    └──────back─────────┘  └──failed (stay)     │
//!    ▲                                           │
//!    └─────────────────disconnect────────────────┘
//! ```

use tracing::{error, info};

use crate::dashboard::Alert;
use crate::error::Error;
use crate::wallet::Session;

const INIT_FAILED: &str = "Failed to initialize Web3 provider. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Landing,
    Connect,
    Dashboard,
}

#[derive(Debug)]
pub struct App {
    page: Page,
    session: Option<Session>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            page: Page::Landing,
            session: None,
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Landing → Connect
    pub fn request_connect(&mut self) {
        if self.page == Page::Landing {
            self.page = Page::Connect;
        }
    }

    /// Connect → Landing
    pub fn back(&mut self) {
        if self.page == Page::Connect {
            self.page = Page::Landing;
        }
    }

    /// Apply the outcome of a connection attempt made from the Connect page
    pub fn on_connect_result(
        &mut self,
        result: std::result::Result<Option<Session>, Error>,
    ) -> Vec<Alert> {
        if self.page != Page::Connect {
            return Vec::new();
        }

        match result {
            Ok(Some(session)) => {
                info!("Opening dashboard for {:?}", session.address);
                self.session = Some(session);
                self.page = Page::Dashboard;
                Vec::new()
            }
            Ok(None) => vec![Alert::new(INIT_FAILED)],
            Err(Error::NoWallet(_)) => vec![Alert::new("No wallet detected"), Alert::new(INIT_FAILED)],
            Err(e) => {
                error!("Wallet connection failed: {}", e);
                vec![Alert::new("Failed to connect wallet. Please try again.")]
            }
        }
    }

    /// Dashboard → Landing, dropping the session
    pub fn disconnect(&mut self) {
        self.session = None;
        self.page = Page::Landing;
    }
}
