//! Map validated CLI matches to the server action.

use crate::auth::TokenConfig;
use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::tokens;
use anyhow::{bail, Context, Result};
use secrecy::ExposeSecret;

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let token_opts = tokens::Options::parse(matches)?;

    if token_opts.access_secret.expose_secret() == token_opts.refresh_secret.expose_secret() {
        bail!(
            "--{} and --{} must differ",
            tokens::ARG_ACCESS_SECRET,
            tokens::ARG_REFRESH_SECRET
        );
    }

    let tokens = TokenConfig::new(token_opts.access_secret, token_opts.refresh_secret)
        .with_access_ttl_seconds(token_opts.access_ttl_seconds)
        .with_refresh_ttl_seconds(token_opts.refresh_ttl_seconds);

    Ok(Action::Server(Args { port, dsn, tokens }))
}
