// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use std::fmt;

use url::Url;

use crate::utils::error::SendError;

/// Secrets needed to deliver to the remote write endpoint. They are only combined when
/// a request is built, and never printed.
#[derive(Clone)]
pub struct Credentials {
  url: String,
  user: String,
  key: String,
}

impl Credentials {
  /// Create credentials from the remote write URL (host and path, without scheme), user and key.
  pub fn new(url: &str, user: &str, key: &str) -> Self {
    Credentials {
      url: url.to_owned(),
      user: user.to_owned(),
      key: key.to_owned(),
    }
  }

  pub fn get_user(&self) -> &str {
    &self.user
  }

  pub fn get_key(&self) -> &str {
    &self.key
  }

  /// Build `<scheme>://<user>:<key>@<url>`. User and key are percent-encoded.
  pub fn get_target_url(&self, scheme: &str) -> Result<Url, SendError> {
    let mut target = Url::parse(&format!("{}://{}", scheme, self.url)).map_err(|err| {
      SendError::RequestBuild(format!("invalid remote write url: {}", err))
    })?;

    target
      .set_username(&self.user)
      .and_then(|_| target.set_password(Some(&self.key)))
      .map_err(|_| {
        SendError::RequestBuild("remote write url cannot carry credentials".to_owned())
      })?;

    Ok(target)
  }
}

impl fmt::Debug for Credentials {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Credentials")
      .field("url", &"<redacted>")
      .field("user", &"<redacted>")
      .field("key", &"<redacted>")
      .finish()
  }
}
