//! Who is logged in.
//!
//! One [`Session`] is built at start-up and passed to everything that needs the current user.
//! Its state is published on a watch channel so views can follow login and logout.

use crate::error::{ClientError, Result};
use plaza_common::model::{
    Id,
    user::{Account, UserMarker},
};
use plaza_remote::{ids::IdGenerator, platform::AuthPlatform};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct SessionState {
    pub current_user: Option<Account>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub last_error: Option<String>,
}

impl SessionState {
    fn signed_in(account: Account) -> Self {
        Self {
            current_user: Some(account),
            is_authenticated: true,
            is_loading: false,
            last_error: None,
        }
    }
}

pub struct Session {
    auth: Arc<dyn AuthPlatform>,
    ids: Arc<IdGenerator>,
    state: watch::Sender<SessionState>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Asks the platform for an existing session. Any failure leaves the session anonymous.
    pub async fn init(auth: Arc<dyn AuthPlatform>, ids: Arc<IdGenerator>) -> Self {
        let (state, _) = watch::channel(SessionState {
            is_loading: true,
            ..SessionState::default()
        });
        let session = Self { auth, ids, state };

        let restored = match session.auth.current_account().await {
            Ok(Some(account)) => {
                info!(user = %account.id, "Restored existing session");
                SessionState::signed_in(account)
            }
            Ok(None) => SessionState::default(),
            Err(err) => {
                warn!(%err, "Could not probe existing session, continuing anonymously");
                SessionState::default()
            }
        };
        session.state.send_replace(restored);

        session
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<Account> {
        self.state.borrow().current_user.clone()
    }

    pub fn require_user(&self) -> Result<Account> {
        self.current_user().ok_or(ClientError::NotAuthenticated)
    }

    #[must_use]
    pub fn is_current_user(&self, user: Id<UserMarker>) -> bool {
        self.state
            .borrow()
            .current_user
            .as_ref()
            .is_some_and(|account| account.id == user)
    }

    fn start_loading(&self) {
        self.state.send_modify(|state| {
            state.is_loading = true;
            state.last_error = None;
        });
    }

    fn fail(&self, err: ClientError) -> ClientError {
        self.state.send_modify(|state| {
            state.is_loading = false;
            state.last_error = Some(err.to_string());
        });
        err
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Account> {
        self.auth.create_session(email, password).await?;
        self.auth
            .current_account()
            .await?
            .ok_or(ClientError::NotAuthenticated)
    }

    /// Exchanges the credentials for a session and loads the account behind it.
    pub async fn login(&self, email: &str, password: &str) -> Result<Account> {
        self.start_loading();

        match self.sign_in(email, password).await {
            Ok(account) => {
                info!(user = %account.id, "Logged in");
                self.state.send_replace(SessionState::signed_in(account.clone()));
                Ok(account)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Creates the account and logs into it.
    ///
    /// The profile document is not created here; a failure after this point leaves the user
    /// logged in without one.
    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<Account> {
        self.start_loading();

        let created = self
            .auth
            .create_account(self.ids.generate(), email, password, name)
            .await;
        let account = match created {
            Ok(account) => account,
            Err(err) => return Err(self.fail(err.into())),
        };
        info!(user = %account.id, "Registered account");

        self.login(email, password).await
    }

    /// Ends the session remotely. Local state is only cleared once the platform confirmed it.
    pub async fn logout(&self) -> Result<()> {
        self.start_loading();

        if let Err(err) = self.auth.delete_current_session().await {
            warn!(%err, "Logout failed, keeping local session");
            return Err(self.fail(err.into()));
        }

        info!("Logged out");
        self.state.send_replace(SessionState::default());
        Ok(())
    }
}
