// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

pub mod fetcher;
