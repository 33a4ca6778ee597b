//! Per-command setup shared by handlers: config, logging and an
//! authorized session.

use std::path::Path;

use tracing::debug;

use super::output::{self, Progress};
use crate::application::SessionService;
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::Config;

/// Load the config at `path` (defaults when missing) and start logging.
///
/// `-v` raises the log level to debug, `-vv` to trace.
pub(crate) fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load_or_default(path)?;
    let mut logging = config.logging.clone();
    match output::verbosity() {
        0 => {}
        1 => logging.level = "debug".into(),
        _ => logging.level = "trace".into(),
    }
    logging.init();
    debug!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

/// Build a session for `path` and authorize it with the configured token.
pub(crate) async fn authorized_session(path: &Path) -> Result<SessionService> {
    let config = load_config(path)?;
    let token = config.require_api_token()?.to_string();
    let session = SessionService::new(bootstrap::build_broker(&config)?);

    let progress = Progress::start("Authorizing...");
    match session.authorize(&token).await {
        Ok(auth) => {
            progress.done(&format!("Authorized as {}", auth.loginid));
            Ok(session)
        }
        Err(e) => {
            progress.failed("Authorization failed");
            session.sign_out().await;
            Err(e)
        }
    }
}
