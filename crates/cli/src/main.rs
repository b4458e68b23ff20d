mod config;
mod error;

use std::path::Path;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use access::AccessEngine;
use privacy::{PolicyStore, ResourceId};
use relations::{PrincipalId, RelationRegistry};

use config::Config;
use error::Result;

const CONFIG_FILE: &str = "kith.toml";

#[derive(Parser)]
#[command(name = "kith")]
#[command(about = "Relation-based access control over a local database", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mint a fresh principal/resource identifier
    Id,
    /// Define a relation type for an owner
    Define {
        owner: PrincipalId,
        name: String,
    },
    /// Delete a relation type (grants under it stop resolving)
    Undefine {
        owner: PrincipalId,
        name: String,
    },
    /// List an owner's relation types
    Relations { owner: PrincipalId },
    /// Grant a relation to a target principal
    Relate {
        owner: PrincipalId,
        name: String,
        target: PrincipalId,
    },
    /// Revoke a relation from a target principal
    Unrelate {
        owner: PrincipalId,
        name: String,
        target: PrincipalId,
    },
    /// List the principals holding a relation
    Members {
        owner: PrincipalId,
        name: String,
    },
    /// Show the relation names linking an owner to a target
    Between {
        owner: PrincipalId,
        target: PrincipalId,
    },
    /// Manage privacy attributes on resources
    Attr {
        #[command(subcommand)]
        command: AttrCommands,
    },
    /// Check whether a principal may exercise a capability on a resource
    Check {
        /// The principal that owns the resource's relations
        owner: PrincipalId,
        resource: ResourceId,
        principal: PrincipalId,
        capability: String,
    },
    /// Make a resource private behind a self-owned relation
    Protect {
        resource: ResourceId,
        /// Relation name that grants access
        #[arg(long, default_value = "member")]
        relation: String,
        /// Capability to guard (repeatable)
        #[arg(long = "grant", value_name = "CAPABILITY")]
        grants: Vec<String>,
    },
}

#[derive(Subcommand)]
enum AttrCommands {
    /// Create a privacy attribute on a resource
    Create {
        resource: ResourceId,
        name: String,
    },
    /// Add an accepted relation name to an attribute
    Assign {
        resource: ResourceId,
        name: String,
        value: String,
    },
    /// Remove an accepted relation name from an attribute
    Remove {
        resource: ResourceId,
        name: String,
        value: String,
    },
    /// Delete a privacy attribute (the capability becomes unguarded)
    Delete {
        resource: ResourceId,
        name: String,
    },
    /// List a resource's privacy attributes
    List { resource: ResourceId },
    /// Show an attribute's accepted values
    Values {
        resource: ResourceId,
        name: String,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    // Id needs no database.
    if matches!(cli.command, Commands::Id) {
        println!("{}", PrincipalId::new());
        return Ok(());
    }

    let config = load_config()?;
    let (registry, policies) = open_stores(&config)?;

    match cli.command {
        // Handled before the stores are opened.
        Commands::Id => Ok(()),
        Commands::Define { owner, name } => {
            let relation = registry.define(owner, &name)?;
            println!("Defined '{}' for {} ({})", relation.name, owner, relation.id);
            Ok(())
        }
        Commands::Undefine { owner, name } => {
            registry.delete(owner, &name)?;
            println!("Deleted '{name}'");
            Ok(())
        }
        Commands::Relations { owner } => {
            for relation in registry.list_types(owner)? {
                println!("{}  {}", relation.id, relation.name);
            }
            Ok(())
        }
        Commands::Relate {
            owner,
            name,
            target,
        } => {
            registry.relate(owner, &name, target)?;
            println!("Related {target} as '{name}'");
            Ok(())
        }
        Commands::Unrelate {
            owner,
            name,
            target,
        } => {
            registry.unrelate(owner, &name, target)?;
            println!("Unrelated {target} from '{name}'");
            Ok(())
        }
        Commands::Members { owner, name } => {
            for member in registry.list_members(owner, &name)? {
                println!("{member}");
            }
            Ok(())
        }
        Commands::Between { owner, target } => {
            let mut names: Vec<String> = registry.names_between(owner, target)?.into_iter().collect();
            names.sort();
            for name in names {
                println!("{name}");
            }
            Ok(())
        }
        Commands::Attr { command } => run_attr(&policies, command),
        Commands::Check {
            owner,
            resource,
            principal,
            capability,
        } => {
            let engine = AccessEngine::new(&registry, &policies);
            match engine.check_capability(owner, resource, principal, &capability) {
                Ok(()) => {
                    println!("allowed");
                    Ok(())
                }
                Err(access::Error::Forbidden(reason)) => {
                    println!("denied: {reason}");
                    std::process::exit(1);
                }
                Err(e) => Err(e.into()),
            }
        }
        Commands::Protect {
            resource,
            relation,
            grants,
        } => {
            let engine = AccessEngine::new(&registry, &policies);
            let capabilities: Vec<&str> = grants.iter().map(|s| s.as_str()).collect();
            let relation_type = engine.protect(resource, &relation, &capabilities)?;
            println!(
                "Protected {} behind '{}' ({})",
                resource, relation_type.name, relation_type.id
            );
            Ok(())
        }
    }
}

fn run_attr(policies: &PolicyStore, command: AttrCommands) -> Result<()> {
    match command {
        AttrCommands::Create { resource, name } => {
            let attribute = policies.create_attribute(resource, &name)?;
            println!("Created '{}' on {} ({})", attribute.name, resource, attribute.id);
        }
        AttrCommands::Assign {
            resource,
            name,
            value,
        } => {
            policies.assign_value(resource, &name, &value)?;
            println!("'{name}' now accepts '{value}'");
        }
        AttrCommands::Remove {
            resource,
            name,
            value,
        } => {
            policies.remove_value(resource, &name, &value)?;
            println!("'{name}' no longer accepts '{value}'");
        }
        AttrCommands::Delete { resource, name } => {
            policies.delete_attribute(resource, &name)?;
            println!("Deleted '{name}'");
        }
        AttrCommands::List { resource } => {
            for attribute in policies.list_attributes(resource)? {
                println!("{}  {}", attribute.id, attribute.name);
            }
        }
        AttrCommands::Values { resource, name } => {
            let mut values: Vec<String> = policies.accepted_values(resource, &name)?.into_iter().collect();
            values.sort();
            for value in values {
                println!("{value}");
            }
        }
    }
    Ok(())
}

fn load_config() -> Result<Config> {
    if Path::new(CONFIG_FILE).exists() {
        Ok(Config::load(CONFIG_FILE)?)
    } else {
        Ok(Config::default())
    }
}

fn open_stores(config: &Config) -> Result<(RelationRegistry, PolicyStore)> {
    let path = &config.database.path;
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    Ok((RelationRegistry::open(path)?, PolicyStore::open(path)?))
}
