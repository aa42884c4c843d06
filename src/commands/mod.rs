//! Slash command dispatch

use std::sync::Arc;
use tracing::debug;

use crate::clients::{Client, ClientRegistry};
use crate::game::{HotPotato, Participant};

/// A parsed `/name arg arg...` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command<'a> {
    pub name: String,
    pub args: Vec<&'a str>,
}

impl<'a> Command<'a> {
    /// Leading '/' is optional. Returns `None` for a blank line.
    pub fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim();
        let line = line.strip_prefix('/').unwrap_or(line);
        let mut parts = line.split_whitespace();
        let name = parts.next()?.to_lowercase();
        Some(Self {
            name,
            args: parts.collect(),
        })
    }
}

const USAGE: &str = "Commands: /hotpotato, /hotpotato accept, /area <name|number>, /areas";

/// Run one command on behalf of `client`
pub fn dispatch(
    line: &str,
    client: &Client,
    registry: &ClientRegistry,
    hot_potato: &Arc<HotPotato<ClientRegistry>>,
) {
    let Some(command) = Command::parse(line) else {
        client.send_system(USAGE);
        return;
    };

    debug!(player_id = %client.id(), command = %command.name, "Dispatching command");

    match command.name.as_str() {
        "hotpotato" => hot_potato_command(&command.args, client, hot_potato),
        "area" => area_command(&command.args, client, registry),
        "areas" => areas_command(client, registry),
        _ => client.send_system(&format!("Unknown command /{}. {USAGE}", command.name)),
    }
}

fn hot_potato_command(args: &[&str], client: &Client, hot_potato: &Arc<HotPotato<ClientRegistry>>) {
    let result = match args.first() {
        Some(arg) if arg.eq_ignore_ascii_case("accept") => {
            hot_potato.accept_invite(client).map(|_| ())
        }
        Some(_) => {
            client.send_system("Usage: /hotpotato [accept]");
            return;
        }
        None => hot_potato.start_game(client),
    };

    if let Err(e) = result {
        client.send_private(&e.to_string());
    }
}

fn area_command(args: &[&str], client: &Client, registry: &ClientRegistry) {
    if args.is_empty() {
        client.send_system(&format!(
            "You are in {}. Usage: /area <name|number>",
            registry.area_name(client.area())
        ));
        return;
    }

    let query = args.join(" ");
    match registry.find_area(&query) {
        Some(area) if area == client.area() => {
            client.send_system(&format!("You are already in {}.", registry.area_name(area)));
        }
        Some(area) => registry.move_client(client, area),
        None => client.send_system(&format!("No area called '{query}'.")),
    }
}

fn areas_command(client: &Client, registry: &ClientRegistry) {
    let lines: Vec<String> = registry
        .occupancy()
        .into_iter()
        .enumerate()
        .map(|(i, (name, count))| format!("{}. {name} ({count})", i + 1))
        .collect();
    client.send_system(&lines.join("\n"));
}
