pub mod auth;
pub mod db;
pub mod error;
pub mod metrics;
pub mod store;
pub mod tracker;

#[cfg(test)]
mod mock;
#[cfg(test)]
mod tests;
