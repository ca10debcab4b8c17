//! # Rukun
//!
//! Authentication backend for neighborhood administration. Residents register
//! with their 16 digit national ID and RT/RW units; administrators register
//! with a username. Both log in to receive a short-lived access token and a
//! long-lived refresh token that is persisted until logout.

pub mod auth;
pub mod cli;
pub mod rukun;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
