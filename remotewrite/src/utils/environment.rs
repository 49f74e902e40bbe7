// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use dotenv::dotenv;

/// Load environment variables from ".env" and, for remote write secrets, ".env-creds".
pub fn load_env() {
  dotenv().ok();
  dotenv::from_filename(".env-creds").ok();
}
