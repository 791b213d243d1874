//! Flat text form of login and delegated credentials
//!
//! ```text
//! 1c|<enc(value)>                       login
//! 1a|<enc(value)>|<enc(scope)>|...      delegated
//! ```
//!
//! Fields are percent-encoded so neither `|` nor `,` appears inside them,
//! which lets [`dump_all`] join records with `,`. On read a bare `+` is
//! taken as a space, matching blobs written with form-style encoding. OAuth
//! credentials carry a consumer secret and have no blob form.

use crate::authsub::DelegatedCredential;
use crate::credential::Credential;
use crate::encoding::{percent_decode_plus, percent_encode};
use crate::error::{Error, Result};
use crate::login::LoginCredential;

const LOGIN_TAG: &str = "1c";
const DELEGATED_TAG: &str = "1a";
const FIELD_SEPARATOR: char = '|';
const RECORD_SEPARATOR: char = ',';

/// Serialize a single credential.
pub fn to_blob(credential: &Credential) -> Result<String> {
    match credential {
        Credential::Login(cred) => Ok(format!(
            "{LOGIN_TAG}{FIELD_SEPARATOR}{}",
            percent_encode(&cred.value)
        )),
        Credential::Delegated(cred) => {
            let mut blob = format!("{DELEGATED_TAG}{FIELD_SEPARATOR}{}", percent_encode(&cred.value));
            for scope in &cred.scopes {
                blob.push(FIELD_SEPARATOR);
                blob.push_str(&percent_encode(scope));
            }
            Ok(blob)
        }
        Credential::OAuth(_) => Err(Error::UnsupportedCredential(
            "OAuth credentials have no blob form".into(),
        )),
    }
}

/// Parse a single credential.
pub fn from_blob(blob: &str) -> Result<Credential> {
    let mut fields = blob.split(FIELD_SEPARATOR);
    let tag = fields.next().unwrap_or_default();
    let Some(value) = fields.next() else {
        return Err(Error::InvalidBlobFormat(format!("missing value in `{blob}`")));
    };
    match tag {
        LOGIN_TAG => {
            if fields.next().is_some() {
                return Err(Error::InvalidBlobFormat(format!(
                    "unexpected fields in login blob `{blob}`"
                )));
            }
            Ok(LoginCredential::new(percent_decode_plus(value)).into())
        }
        DELEGATED_TAG => {
            let scopes = fields.map(percent_decode_plus).collect();
            Ok(DelegatedCredential::new(percent_decode_plus(value), scopes).into())
        }
        other => Err(Error::InvalidBlobFormat(format!("unknown tag `{other}`"))),
    }
}

/// Serialize several credentials into one `,`-joined string.
///
/// Fails on the first credential without a blob form.
pub fn dump_all<'a>(credentials: impl IntoIterator<Item = &'a Credential>) -> Result<String> {
    let blobs = credentials
        .into_iter()
        .map(to_blob)
        .collect::<Result<Vec<_>>>()?;
    Ok(blobs.join(&RECORD_SEPARATOR.to_string()))
}

/// Parse the output of [`dump_all`]. An empty string holds no credentials.
pub fn load_all(blobs: &str) -> Result<Vec<Credential>> {
    if blobs.is_empty() {
        return Ok(Vec::new());
    }
    blobs.split(RECORD_SEPARATOR).map(from_blob).collect()
}
