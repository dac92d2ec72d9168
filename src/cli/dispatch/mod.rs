use crate::cli::actions::Action;
use anyhow::Result;
use std::path::PathBuf;

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    Ok(Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        accounts: matches
            .get_one("accounts")
            .map(|s: &String| PathBuf::from(s))
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --accounts"))?,
        frontend_url: matches
            .get_one("frontend-url")
            .map_or_else(|| "http://localhost:8080".to_string(), |s: &String| s.to_string()),
        session_ttl: matches.get_one::<u64>("session-ttl").copied().unwrap_or(43200),
    })
}
