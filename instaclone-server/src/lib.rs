// Library exports for instaclone-server
// The binary, the admin CLI and the integration tests build on these modules

pub mod accounts;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod ledger;
pub mod media;
pub mod mention;
pub mod notifications;
pub mod pagination;
pub mod password;
pub mod posts;
pub mod profiles;
pub mod routes;
pub mod search;
pub mod session;
pub mod state;
