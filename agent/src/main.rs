//! Device Registry Agent
//!
//! Drives the registry server the way the provisioning service and a user's
//! wallet would:
//! 1. Provision a registry for a user and ENS domain
//! 2. Enroll devices with a (mock) uniqueness proof
//! 3. Grant and update per-app permissions

use alloy_primitives::{Address, B256, U256};
use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::Value;

mod client;
mod retry;

use client::{ProofPayload, RegistryClient};
use retry::RetryPolicy;

#[derive(Parser)]
#[command(name = "agent")]
#[command(about = "Device registry provisioning and enrollment agent")]
struct Cli {
    /// Registry server URL
    #[arg(long, default_value = "http://localhost:8080")]
    server: String,

    /// Address the calls are made on behalf of
    #[arg(long, env = "AGENT_CALLER")]
    caller: Option<Address>,

    /// Retries for transport and server errors
    #[arg(long, default_value = "3")]
    retries: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server health
    Health,

    /// Provision a registry (caller must be the authority)
    Create {
        /// User address that will own the registry
        #[arg(long)]
        owner: Address,

        /// ENS domain, e.g. alice.eth
        #[arg(long)]
        domain: String,

        #[arg(long, default_value = "0")]
        owner_nullifier: U256,
    },

    /// Enroll a device under <model>.<domain>
    AddDevice {
        #[arg(long)]
        registry: Address,

        /// Device model, becomes the subdomain label
        #[arg(long)]
        model: String,

        #[arg(long)]
        device_address: Address,

        #[arg(long)]
        device_nullifier: U256,

        /// Pin the proof nullifier instead of drawing a fresh one
        #[arg(long)]
        proof_nullifier: Option<U256>,

        #[arg(long, default_value = "0")]
        root: U256,
    },

    /// Grant an app access to a device (0=none, 1=read, 2=read-write, 3=full)
    Grant {
        #[arg(long)]
        registry: Address,

        #[arg(long)]
        device: B256,

        #[arg(long)]
        app: String,

        #[arg(long)]
        level: u8,
    },

    /// Change an existing grant
    Update {
        #[arg(long)]
        registry: Address,

        #[arg(long)]
        device: B256,

        #[arg(long)]
        app: String,

        #[arg(long)]
        level: u8,
    },

    /// Show a registry by handle, user or domain
    Show {
        #[arg(long, conflicts_with_all = ["user", "domain"])]
        registry: Option<Address>,

        #[arg(long, conflicts_with = "domain")]
        user: Option<Address>,

        #[arg(long)]
        domain: Option<String>,
    },

    /// List devices of a registry, or show one device
    Devices {
        #[arg(long)]
        registry: Address,

        #[arg(long)]
        device: Option<B256>,
    },

    /// List apps granted on a device
    Apps {
        #[arg(long)]
        registry: Address,

        #[arg(long)]
        device: B256,
    },

    /// Print registry events from a cursor
    Events {
        #[arg(long, default_value = "0")]
        since: usize,
    },
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(_) => println!("{}", value),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "device_registry_agent=info".into()),
        )
        .init();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let agent = RegistryClient::new(&cli.server, cli.caller, RetryPolicy::with_retries(cli.retries));

    match cli.command {
        Commands::Health => {
            print_json(&agent.health().await?);
        }

        Commands::Create { owner, domain, owner_nullifier } => {
            println!("Provisioning registry for {} ({})...\n", owner, domain);
            let info = agent.create_registry(owner, &domain, owner_nullifier).await?;

            println!("Registry created:");
            println!("  Handle:  {}", info["handle"].as_str().unwrap_or("?"));
            println!("  Owner:   {}", info["owner"].as_str().unwrap_or("?"));
            println!("  Domain:  {}", info["ens_domain"].as_str().unwrap_or("?"));
        }

        Commands::AddDevice {
            registry,
            model,
            device_address,
            device_nullifier,
            proof_nullifier,
            root,
        } => {
            let info = agent.registry(registry).await?;
            let owner: Address = serde_json::from_value(info["owner"].clone())?;

            println!("[1] Generating uniqueness proof for owner {}", owner);
            let proof = ProofPayload::mock(owner, root, proof_nullifier);
            println!("    Nullifier: {:#x}", proof.nullifier_hash);

            println!("[2] Enrolling {} at {}", model, device_address);
            let added = agent
                .add_device(registry, &model, device_address, device_nullifier, &proof)
                .await?;

            println!("\n[+] Device added");
            println!("    Subdomain:     {}", added["subdomain"].as_str().unwrap_or("?"));
            println!("    Identity hash: {}", added["identity_hash"].as_str().unwrap_or("?"));
        }

        Commands::Grant { registry, device, app, level } => {
            let change = agent.grant(registry, device, &app, level).await?;
            match change["old_level"].as_u64() {
                Some(old) => println!("Updated {}: {} -> {}", app, old, change["new_level"]),
                None => println!("Granted {} level {}", app, change["new_level"]),
            }
        }

        Commands::Update { registry, device, app, level } => {
            let change = agent.update(registry, device, &app, level).await?;
            println!("Updated {}: {} -> {}", app, change["old_level"], change["new_level"]);
        }

        Commands::Show { registry, user, domain } => {
            let info = match (registry, user, domain) {
                (Some(handle), _, _) => agent.registry(handle).await?,
                (_, Some(user), _) => agent.registry_of_user(user).await?,
                (_, _, Some(domain)) => agent.registry_of_domain(&domain).await?,
                _ => anyhow::bail!("Pass one of --registry, --user or --domain"),
            };
            print_json(&info);
        }

        Commands::Devices { registry, device } => match device {
            Some(hash) => print_json(&agent.device(registry, hash).await?),
            None => {
                let list = agent.devices(registry).await?;
                println!("{} device(s)", list["device_count"]);
                for hash in list["device_hashes"].as_array().into_iter().flatten() {
                    println!("  {}", hash.as_str().unwrap_or("?"));
                }
            }
        },

        Commands::Apps { registry, device } => {
            let list = agent.apps(registry, device).await?;
            println!("{} app(s)", list["app_count"]);
            for app in list["app_ids"].as_array().into_iter().flatten() {
                println!("  {}", app.as_str().unwrap_or("?"));
            }
        }

        Commands::Events { since } => {
            let feed = agent.events(since).await?;
            for event in feed["events"].as_array().into_iter().flatten() {
                print_json(event);
            }
            println!("next cursor: {}", feed["next"]);
        }
    }

    Ok(())
}
