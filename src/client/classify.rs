//! Status classification and ambiguous-status disambiguation
//!
//! The server reuses 503 for both "sealed" and "uninitialized", and some
//! privileged endpoints answer 400 before checking initialization. Neither
//! can be resolved from the response alone, so classification is a two-step
//! decision: map the status, then, if the answer is ambiguous, ask the
//! server about its own state in a fixed order.

use crate::error::{VaultError, VaultResult};
use tracing::debug;

/// Read-only questions the classifier may ask the server
///
/// Implementations must not themselves run disambiguation, or a 503 from a
/// probe would recurse.
pub trait StateProbe {
    /// Whether the server reports itself initialized
    fn probe_initialized(&self) -> VaultResult<bool>;

    /// Whether the server reports itself sealed
    fn probe_sealed(&self) -> VaultResult<bool>;
}

/// First-pass result of looking at a status code
#[derive(Debug)]
pub enum Classification {
    /// The status alone determines the error
    Final(VaultError),
    /// 503: sealed or uninitialized, needs probing
    Unavailable(String),
}

/// Map a failed status and its joined error messages to a classification
pub fn classify_status(status: u16, message: String) -> Classification {
    match status {
        400 => Classification::Final(VaultError::BadRequest(message)),
        403 => Classification::Final(VaultError::Forbidden(message)),
        404 => Classification::Final(VaultError::NotFound(message)),
        500 => Classification::Final(VaultError::InternalServer(message)),
        503 => Classification::Unavailable(message),
        _ => Classification::Final(VaultError::Generic { status, message }),
    }
}

/// Resolve a 503 into Uninitialized, Sealed, or a generic error
///
/// A failing probe is returned as-is.
pub fn disambiguate_unavailable(message: String, probe: &dyn StateProbe) -> VaultError {
    match probe.probe_initialized() {
        Err(e) => return e,
        Ok(false) => {
            debug!("503 resolved to uninitialized");
            return VaultError::Uninitialized(message);
        }
        Ok(true) => {}
    }

    match probe.probe_sealed() {
        Err(e) => e,
        Ok(true) => {
            debug!("503 resolved to sealed");
            VaultError::Sealed(message)
        }
        Ok(false) => {
            debug!("503 from an unsealed, initialized server");
            VaultError::Generic {
                status: 503,
                message,
            }
        }
    }
}

/// Reclassify a BadRequest from a privileged endpoint as Uninitialized when
/// the server says it is not initialized. Other errors pass through.
pub fn reclassify_bad_request(err: VaultError, probe: &dyn StateProbe) -> VaultError {
    let VaultError::BadRequest(message) = err else {
        return err;
    };

    match probe.probe_initialized() {
        Err(e) => e,
        Ok(false) => {
            debug!("400 on privileged endpoint resolved to uninitialized");
            VaultError::Uninitialized(message)
        }
        Ok(true) => VaultError::BadRequest(message),
    }
}
