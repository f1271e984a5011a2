//! Command parsing and execution for the interactive prompt
//!
//! This module turns one line of user input into a [`Command`] and runs it
//! against a [`Session`], which carries the API client, the pagination cursor
//! for the location listing, and the caught-pokemon registry.

use std::io::Write;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::api::{ApiError, PokeApiClient, Pokemon};
use crate::pokedex::Pokedex;

/// Base experience that gives an even catch chance
const CATCH_THRESHOLD: f64 = 50.0;

/// Errors that can occur while parsing or running a command
#[derive(Debug, Error)]
pub enum CommandError {
    /// The first word is not a known command
    #[error("Unknown command: '{0}'. Type 'help' to see the available commands")]
    Unknown(String),

    /// A command that needs an argument was given none
    #[error("Missing argument. Usage: {0}")]
    MissingArgument(&'static str),

    /// Fetching from the API failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A stored pokemon payload could not be decoded
    #[error("Failed to decode stored pokemon: {0}")]
    Decode(#[from] serde_json::Error),

    /// Writing to the output failed
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// A parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Exit,
    /// Show the next page of location areas
    Map,
    /// Show the previous page of location areas
    MapBack,
    Explore(String),
    Catch(String),
    Inspect(String),
    Pokedex,
}

/// Usage line and description of a command, for `help`
struct CommandInfo {
    usage: &'static str,
    description: &'static str,
}

const COMMANDS: &[CommandInfo] = &[
    CommandInfo {
        usage: "catch <pokemon>",
        description: "Throw a Pokeball at a pokemon",
    },
    CommandInfo {
        usage: "exit",
        description: "Exit the Pokedex",
    },
    CommandInfo {
        usage: "explore <area>",
        description: "List the pokemon found in a location area",
    },
    CommandInfo {
        usage: "help",
        description: "Display this help message",
    },
    CommandInfo {
        usage: "inspect <pokemon>",
        description: "Show details about a pokemon you have caught",
    },
    CommandInfo {
        usage: "map",
        description: "Display the next 20 location areas",
    },
    CommandInfo {
        usage: "mapb",
        description: "Display the previous 20 location areas",
    },
    CommandInfo {
        usage: "pokedex",
        description: "List all pokemon you have caught",
    },
];

impl Command {
    /// Parses one line of input.
    ///
    /// The line is split on whitespace and lowercased. The first word names the
    /// command and the second, if any, is its argument; further words are
    /// ignored.
    ///
    /// # Returns
    /// * `Ok(None)` for a blank line
    /// * `Ok(Some(Command))` for a recognized command
    /// * `Err(CommandError)` for an unknown command or a missing argument
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let mut words = line.split_whitespace().map(str::to_lowercase);
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let arg = words.next();
        let require = |usage: &'static str| arg.clone().ok_or(CommandError::MissingArgument(usage));

        let command = match name.as_str() {
            "help" => Command::Help,
            "exit" => Command::Exit,
            "map" => Command::Map,
            "mapb" => Command::MapBack,
            "pokedex" => Command::Pokedex,
            "explore" => Command::Explore(require("explore <area>")?),
            "catch" => Command::Catch(require("catch <pokemon>")?),
            "inspect" => Command::Inspect(require("inspect <pokemon>")?),
            other => return Err(CommandError::Unknown(other.to_string())),
        };

        Ok(Some(command))
    }
}

/// Whether the prompt should keep reading after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Probability of catching a pokemon with the given base experience.
///
/// Falls from 1.0 at zero experience towards 0.0; a pokemon with 50 base
/// experience is caught half the time.
pub fn catch_chance(base_experience: u32) -> f64 {
    CATCH_THRESHOLD / (f64::from(base_experience) + CATCH_THRESHOLD)
}

/// State shared by all commands during one run of the prompt
pub struct Session {
    client: PokeApiClient,
    pokedex: Pokedex,
    /// Next page of the location listing, `None` past the last page
    next_page: Option<String>,
    /// Previous page of the location listing, `None` on the first page
    previous_page: Option<String>,
    rng: StdRng,
}

impl Session {
    /// Creates a session positioned before the first location page
    pub fn new(client: PokeApiClient) -> Self {
        Self::with_rng(client, StdRng::from_entropy())
    }

    /// Creates a session with a fixed random source
    pub fn with_rng(client: PokeApiClient, rng: StdRng) -> Self {
        let next_page = Some(client.first_page_url());
        Self {
            client,
            pokedex: Pokedex::new(),
            next_page,
            previous_page: None,
            rng,
        }
    }

    pub fn client(&self) -> &PokeApiClient {
        &self.client
    }

    pub fn pokedex(&self) -> &Pokedex {
        &self.pokedex
    }

    /// Runs a command, writing its output to `out`
    pub async fn execute<W: Write>(
        &mut self,
        command: Command,
        out: &mut W,
    ) -> Result<Flow, CommandError> {
        match command {
            Command::Help => self.help(out)?,
            Command::Exit => {
                writeln!(out, "Closing the Pokedex... Goodbye!")?;
                return Ok(Flow::Exit);
            }
            Command::Map => match self.next_page.clone() {
                Some(url) => self.show_page(&url, out).await?,
                None => writeln!(out, "You're on the last page")?,
            },
            Command::MapBack => match self.previous_page.clone() {
                Some(url) => self.show_page(&url, out).await?,
                None => writeln!(out, "You're on the first page")?,
            },
            Command::Explore(area) => self.explore(&area, out).await?,
            Command::Catch(name) => self.catch(&name, out).await?,
            Command::Inspect(name) => self.inspect(&name, out)?,
            Command::Pokedex => self.list_caught(out)?,
        }
        Ok(Flow::Continue)
    }

    /// Stops the response cache's reaper
    pub async fn close(self) {
        self.client.close().await;
    }

    fn help<W: Write>(&self, out: &mut W) -> Result<(), CommandError> {
        writeln!(out, "Welcome to the Pokedex!")?;
        writeln!(out, "Usage:")?;
        writeln!(out)?;
        for info in COMMANDS {
            writeln!(out, "{}: {}", info.usage, info.description)?;
        }
        writeln!(out)?;
        Ok(())
    }

    async fn show_page<W: Write>(&mut self, url: &str, out: &mut W) -> Result<(), CommandError> {
        let page = self.client.location_areas(url).await?;
        for area in &page.results {
            writeln!(out, "{}", area.name)?;
        }
        self.next_page = page.next;
        self.previous_page = page.previous;
        Ok(())
    }

    async fn explore<W: Write>(&self, area: &str, out: &mut W) -> Result<(), CommandError> {
        writeln!(out, "Exploring {area}...")?;
        let location = self.client.location_area(area).await?;

        if location.pokemon_encounters.is_empty() {
            writeln!(out, "No pokemon found in {}", location.name)?;
            return Ok(());
        }
        writeln!(out, "Found Pokemon:")?;
        for encounter in &location.pokemon_encounters {
            writeln!(out, " - {}", encounter.pokemon.name)?;
        }
        Ok(())
    }

    async fn catch<W: Write>(&mut self, name: &str, out: &mut W) -> Result<(), CommandError> {
        writeln!(out, "Throwing a Pokeball at {name}...")?;
        let (pokemon, raw) = self.client.pokemon(name).await?;

        let chance = catch_chance(pokemon.base_experience.unwrap_or(0));
        if self.rng.gen_bool(chance) {
            writeln!(out, "{} was caught!", pokemon.name)?;
            writeln!(out, "You may now inspect it with the inspect command.")?;
            self.pokedex.add(pokemon.name, raw);
        } else {
            writeln!(out, "{} escaped!", pokemon.name)?;
        }
        Ok(())
    }

    fn inspect<W: Write>(&self, name: &str, out: &mut W) -> Result<(), CommandError> {
        let Some(raw) = self.pokedex.get(name) else {
            writeln!(out, "You have not caught that pokemon")?;
            return Ok(());
        };
        let pokemon: Pokemon = serde_json::from_slice(raw)?;

        writeln!(out, "Name: {}", pokemon.name)?;
        writeln!(out, "Height: {}", pokemon.height)?;
        writeln!(out, "Weight: {}", pokemon.weight)?;
        writeln!(out, "Stats:")?;
        for stat in &pokemon.stats {
            writeln!(out, "  -{}: {}", stat.stat.name, stat.base_stat)?;
        }
        writeln!(out, "Types:")?;
        for kind in &pokemon.types {
            writeln!(out, "  - {}", kind.kind.name)?;
        }
        Ok(())
    }

    fn list_caught<W: Write>(&self, out: &mut W) -> Result<(), CommandError> {
        if self.pokedex.is_empty() {
            writeln!(out, "Your Pokedex is empty")?;
            return Ok(());
        }
        writeln!(out, "Your Pokedex:")?;
        for name in self.pokedex.names() {
            writeln!(out, " - {name}")?;
        }
        Ok(())
    }
}
