use anyhow::Result;
use clap::Subcommand;

use crate::directory::FLOORS_SUBMENU_TITLE;
use crate::service::DoorService;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show connection settings and, with --probe, try a vendor login
    Status {
        #[arg(long, help = "Attempt a login against the vendor")]
        probe: bool,
    },
    /// List the visible doors
    Doors {
        #[arg(long, help = "Include access points without the door marker")]
        all: bool,
    },
    /// List the doors behind the floors submenu
    Floors {
        #[arg(long, help = "Include access points without the door marker")]
        all: bool,
    },
    /// Find a door by its exact display name
    Find {
        #[arg(help = "Display name to look for")]
        name: String,
        #[arg(long, help = "Search the widened directory too")]
        all: bool,
    },
    /// Open a door once and record who asked
    Open {
        #[arg(help = "Door id or exact display name")]
        door: String,
        #[arg(long, help = "Person to attribute the open to")]
        person: Option<String>,
        #[arg(long, help = "Telegram id of the actor")]
        tg_id: Option<i64>,
    },
    /// Dump every access point the vendor reports, as JSON
    Points,
}

pub fn run(command: &Command, svc: &mut DoorService) -> Result<()> {
    match command {
        Command::Status { probe } => status(svc, *probe),
        Command::Doors { all } => doors(svc, *all),
        Command::Floors { all } => floors(svc, *all),
        Command::Find { name, all } => find(svc, name, *all),
        Command::Open {
            door,
            person,
            tg_id,
        } => open(svc, door, person.as_deref(), *tg_id),
        Command::Points => points(svc),
    }
}

fn status(svc: &mut DoorService, probe: bool) -> Result<()> {
    let config = svc.config();
    if svc.is_configured() {
        println!("Trassir: configured");
        println!("  Address: {}", config.address);
        println!("  Username: {}", config.username);
    } else {
        println!("Trassir: not configured");
        println!("  Missing: {}", config.missing().join(", "));
    }
    println!("  Audit log: {}", config.audit_log.display());

    if probe {
        if svc.ensure_session() {
            println!("Login: ok");
        } else {
            anyhow::bail!("trassir login failed");
        }
    }
    Ok(())
}

fn doors(svc: &mut DoorService, all: bool) -> Result<()> {
    let doors = svc.get_doors(all);
    if doors.is_empty() {
        println!("No doors available");
        return Ok(());
    }
    println!("Doors:");
    for (id, name) in &doors {
        println!("  {:>3}  {}", id, name);
    }
    Ok(())
}

fn floors(svc: &mut DoorService, all: bool) -> Result<()> {
    let submenu = svc.floors_submenu_doors(all);
    if submenu.is_empty() {
        println!("No floor doors available");
        return Ok(());
    }
    println!("{}:", FLOORS_SUBMENU_TITLE);
    for (id, name) in &submenu {
        println!("  {:>3}  {}", id, name);
    }
    Ok(())
}

fn find(svc: &mut DoorService, name: &str, all: bool) -> Result<()> {
    match svc.find_door_by_name(name, all) {
        Some(door) => {
            println!("  {:>3}  {}", door.id, door.name);
            Ok(())
        }
        None => anyhow::bail!("no door named '{}'", name),
    }
}

fn open(svc: &mut DoorService, door: &str, person: Option<&str>, tg_id: Option<i64>) -> Result<()> {
    let (id, label) = resolve_door(svc, door)?;
    if svc.open_door(id, person, tg_id) {
        println!("Opened {}", label);
        Ok(())
    } else {
        anyhow::bail!("door {} did not open", label)
    }
}

fn points(svc: &mut DoorService) -> Result<()> {
    let points = svc.all_access_points();
    println!("{}", serde_json::to_string_pretty(&points)?);
    Ok(())
}

/// A door argument is either a numeric id or an exact display name.
/// Names are resolved against the widened directory so non-marker
/// doors can be opened by name too.
fn resolve_door(svc: &mut DoorService, door: &str) -> Result<(u32, String)> {
    if let Some(id) = parse_door_id(door) {
        return Ok((id, format!("door {}", id)));
    }
    match svc.find_door_by_name(door, true) {
        Some(found) => Ok((found.id, format!("{} (door {})", found.name, found.id))),
        None => anyhow::bail!("no door named '{}'", door),
    }
}

fn parse_door_id(door: &str) -> Option<u32> {
    door.parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: Command,
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        TestCli::command().debug_assert();
    }

    #[test]
    fn test_parse_door_id() {
        assert_eq!(parse_door_id("13"), Some(13));
        assert_eq!(parse_door_id("0"), Some(0));
        assert_eq!(parse_door_id("Главный вход"), None);
        assert_eq!(parse_door_id("-5"), None);
        assert_eq!(parse_door_id(""), None);
    }

    #[test]
    fn test_open_arguments_parse() {
        let cli = TestCli::parse_from([
            "trassir-doors",
            "open",
            "Главный вход",
            "--person",
            "Иванов",
            "--tg-id",
            "123456789",
        ]);
        match cli.command {
            Command::Open {
                door,
                person,
                tg_id,
            } => {
                assert_eq!(door, "Главный вход");
                assert_eq!(person.as_deref(), Some("Иванов"));
                assert_eq!(tg_id, Some(123456789));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_doors_all_flag_parses() {
        let cli = TestCli::parse_from(["trassir-doors", "doors", "--all"]);
        match cli.command {
            Command::Doors { all } => assert!(all),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
