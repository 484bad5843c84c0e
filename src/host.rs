use crate::errors::IdentityError;
use crate::models::HostIdentity;
use std::path::Path;
use tokio::fs;
use tracing::error;

/// Reads the identity the WebView host wrote for the current user.
pub async fn load_identity(path: &Path) -> Result<HostIdentity, IdentityError> {
    match fs::read(path).await {
        Ok(bytes) => parse_identity(&bytes),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            error!("host identity file missing: {}", path.display());
            Err(IdentityError::Missing(path.to_path_buf()))
        }
        Err(err) => {
            error!("failed to read host identity: {err}");
            Err(IdentityError::Io(err))
        }
    }
}

/// Accepts either the bare user object or the host's `{ "user": { ... } }` wrapper.
pub fn parse_identity(bytes: &[u8]) -> Result<HostIdentity, IdentityError> {
    let mut value: serde_json::Value = serde_json::from_slice(bytes)?;
    if let Some(user) = value.get_mut("user").map(serde_json::Value::take) {
        value = user;
    }
    let identity: HostIdentity = serde_json::from_value(value)?;
    if identity.id <= 0 {
        return Err(IdentityError::NoUserId);
    }
    Ok(identity)
}
