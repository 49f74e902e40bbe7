// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use std::env;
use std::panic::{self, UnwindSafe};
use std::sync::Mutex;

use lazy_static::lazy_static;

lazy_static! {
  static ref ENV_LOCK: Mutex<()> = Mutex::new(());
}

fn set_or_remove(key: &str, value: Option<&str>) {
  match value {
    Some(value) => env::set_var(key, value),
    None => env::remove_var(key),
  }
}

/// Runs the closure with the given environment variables set (or removed, for `None`).
/// Previous values are restored afterwards, also when the closure panics. Callers are
/// serialized, as the process environment is shared between test threads.
pub fn with_env_vars<F>(kvs: Vec<(&str, Option<&str>)>, closure: F)
where
  F: FnOnce() + UnwindSafe,
{
  let guard = ENV_LOCK
    .lock()
    .unwrap_or_else(|poisoned| poisoned.into_inner());

  let saved: Vec<(String, Option<String>)> = kvs
    .iter()
    .map(|(key, _)| (key.to_string(), env::var(key).ok()))
    .collect();
  for (key, value) in &kvs {
    set_or_remove(key, *value);
  }

  let result = panic::catch_unwind(closure);

  for (key, value) in &saved {
    set_or_remove(key, value.as_deref());
  }
  drop(guard);

  if let Err(err) = result {
    panic::resume_unwind(err);
  }
}
