use std::env;

use tracing::debug;

use crate::errors::{Error, Result};
use crate::schemas::Person;

const DEFAULT_DATABASE: &str = "OpenSplit";
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_PEOPLE: &str = "HL,JY,ML,PY,SH";

#[derive(Clone, Debug)]
pub struct Config {
    pub mongodb_uri: String,
    pub database_name: String,
    pub bind_address: String,
    pub port: u16,
    /// Everyone who can pay or share an expense, in display order.
    pub people: Vec<Person>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let mongodb_uri = env::var("MONGODB_URI")
            .map_err(|_| Error::Config("You need to add the MONGODB_URI to the env".into()))?;
        let database_name = env::var("DATABASE_NAME").unwrap_or_else(|_| DEFAULT_DATABASE.into());
        let bind_address =
            env::var("BIND_ADDRESS").unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.into());
        let port = match env::var("PORT") {
            Ok(port) => port
                .parse()
                .map_err(|e| Error::Config(format!("Invalid PORT {port:?}: {e}")))?,
            Err(_) => DEFAULT_PORT,
        };
        let people = parse_people(&env::var("PEOPLE").unwrap_or_else(|_| DEFAULT_PEOPLE.into()))?;
        debug!(?people, %database_name, "Configuration loaded");

        Ok(Config {
            mongodb_uri,
            database_name,
            bind_address,
            port,
            people,
        })
    }
}

/// Parses a comma separated list of participant codes.
pub fn parse_people(raw: &str) -> Result<Vec<Person>> {
    let mut people: Vec<Person> = Vec::new();
    for person in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if people.iter().any(|known| known == person) {
            return Err(Error::Config(format!("{person} is listed twice in PEOPLE")));
        }
        people.push(person.to_string());
    }
    if people.is_empty() {
        return Err(Error::Config("PEOPLE must name at least one person".into()));
    }
    Ok(people)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_people() {
        assert_eq!(parse_people(DEFAULT_PEOPLE).unwrap(), ["HL", "JY", "ML", "PY", "SH"]);
    }

    #[test]
    fn blanks_are_skipped_and_order_kept() {
        assert_eq!(parse_people(" SH, ,HL ,").unwrap(), ["SH", "HL"]);
    }

    #[test]
    fn duplicates_and_empty_lists_are_rejected() {
        assert!(matches!(parse_people("HL,JY,HL"), Err(Error::Config(_))));
        assert!(matches!(parse_people(" , "), Err(Error::Config(_))));
    }
}
