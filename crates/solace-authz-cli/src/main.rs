// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Solace authorization operator CLI.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use solace_authz_config::{load_catalog, load_config, load_config_with_file, AuthzConfig};
use solace_authz_core::{Action, ActorId, Resource, TemporaryGrantId};

mod audit;
mod commands;
mod logging;

use commands::{AccountUpdate, CheckRequest, GrantRequest};

/// Inspect the permission catalog and dry-run authorization decisions.
#[derive(Parser, Debug)]
#[command(name = "solace-authz", about = "Solace authorization engine tooling", version)]
struct Args {
	/// Config file (defaults to /etc/solace/authz.toml)
	#[arg(long, global = true, env = "SOLACE_AUTHZ_CONFIG")]
	config: Option<PathBuf>,

	/// Emit JSON instead of text
	#[arg(long, global = true)]
	json: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version information
	Version,

	/// List catalog roles by priority
	Roles,

	/// Show what a role may do
	Effective {
		role: String,
	},

	/// Validate the configuration and catalog
	Validate,

	/// Dry-run a permission check; every account is treated as active unless --database is set
	Check {
		#[arg(long)]
		role: String,
		#[arg(long)]
		resource: Resource,
		#[arg(long)]
		action: Action,
		/// Actor to check as (random when omitted)
		#[arg(long)]
		actor: Option<ActorId>,
		#[arg(long)]
		resource_id: Option<String>,
		/// Owner of the resource instance
		#[arg(long, conflicts_with = "own")]
		owner: Option<ActorId>,
		/// Treat the actor as the owner
		#[arg(long)]
		own: bool,
		/// Predicate input as key=value, repeatable
		#[arg(long = "extra", value_parser = commands::parse_extra)]
		extras: Vec<(String, Value)>,
		/// Use account status and temporary grants from the database
		#[arg(long)]
		database: bool,
	},

	/// Dry-run a role assignment
	ValidateAssignment {
		#[arg(long)]
		assigner_role: String,
		#[arg(long)]
		new_role: String,
		#[arg(long)]
		current_role: Option<String>,
	},

	/// Apply database migrations
	Migrate,

	/// Create a temporary grant
	Grant {
		#[arg(long)]
		grantor: ActorId,
		#[arg(long)]
		grantor_role: String,
		#[arg(long)]
		beneficiary: ActorId,
		#[arg(long)]
		resource: Resource,
		#[arg(long)]
		action: Action,
		#[arg(long, default_value_t = 24)]
		hours: i64,
		#[arg(long)]
		reason: String,
	},

	/// Revoke a temporary grant
	Revoke {
		grant_id: TemporaryGrantId,
		#[arg(long)]
		revoker: ActorId,
		#[arg(long)]
		revoker_role: String,
	},

	/// List an actor's temporary grants
	Grants {
		actor: ActorId,
		/// Include expired and revoked grants
		#[arg(long)]
		all: bool,
	},

	/// Set or remove an actor's account status
	Account {
		actor: ActorId,
		#[arg(long)]
		inactive: bool,
		/// Lock the account for this many minutes
		#[arg(long)]
		lock_minutes: Option<i64>,
		#[arg(long, conflicts_with_all = ["inactive", "lock_minutes"])]
		remove: bool,
	},
}

fn print<T: Serialize>(json: bool, value: &T, text: impl FnOnce(&T) -> String) -> anyhow::Result<()> {
	if json {
		println!("{}", serde_json::to_string_pretty(value)?);
	} else {
		println!("{}", text(value));
	}
	Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
	let args = Args::parse();

	if let Command::Version = args.command {
		println!("solace-authz {}", env!("CARGO_PKG_VERSION"));
		return Ok(ExitCode::SUCCESS);
	}

	let config = match &args.config {
		Some(path) => load_config_with_file(path),
		None => load_config(),
	}
	.context("failed to load configuration")?;

	logging::init(&config.logging);

	let catalog = Arc::new(load_catalog(&config.roles).context("failed to load catalog")?);
	tracing::debug!(roles = catalog.len(), "catalog loaded");

	run(args.command, args.json, &config, catalog).await
}

async fn run(
	command: Command,
	json: bool,
	config: &AuthzConfig,
	catalog: Arc<solace_authz_core::Catalog>,
) -> anyhow::Result<ExitCode> {
	match command {
		Command::Version => {}

		Command::Roles => {
			let roles = commands::roles(&catalog);
			print(json, &roles, |roles| {
				roles.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n")
			})?;
		}

		Command::Effective { role } => {
			let service = commands::dry_run_service(config, catalog)?;
			let permissions = commands::effective(&service, &role)?;
			print(json, &permissions, |p| commands::render_permissions(p))?;
		}

		Command::Validate => {
			let report = commands::validate(config, &catalog);
			print(json, &report, ToString::to_string)?;
			if !report.is_ok() {
				return Ok(ExitCode::FAILURE);
			}
		}

		Command::Check {
			role,
			resource,
			action,
			actor,
			resource_id,
			owner,
			own,
			extras,
			database,
		} => {
			let service = if database {
				let pool = commands::open_database(config).await?;
				commands::database_service(config, catalog, &pool)?
			} else {
				commands::dry_run_service(config, catalog)?
			};
			let report = commands::check(
				&service,
				CheckRequest {
					actor,
					role,
					resource,
					action,
					resource_id,
					owner,
					own,
					extras,
				},
			)
			.await;
			print(json, &report, ToString::to_string)?;
			if !report.verdict.allowed {
				return Ok(ExitCode::FAILURE);
			}
		}

		Command::ValidateAssignment {
			assigner_role,
			new_role,
			current_role,
		} => {
			let service = commands::dry_run_service(config, catalog)?;
			let decision = commands::validate_assignment(
				&service,
				&assigner_role,
				&new_role,
				current_role.as_deref(),
			)
			.await;
			print(json, &decision, commands::render_assignment)?;
			if !decision.valid {
				return Ok(ExitCode::FAILURE);
			}
		}

		Command::Migrate => {
			let pool = solace_authz_db::create_pool(&config.database).await?;
			let applied = solace_authz_db::run_migrations(&pool).await?;
			tracing::info!(applied, database = %config.database.url, "migrations complete");
			println!("{applied} migrations applied");
		}

		Command::Grant {
			grantor,
			grantor_role,
			beneficiary,
			resource,
			action,
			hours,
			reason,
		} => {
			let pool = commands::open_database(config).await?;
			let service = commands::database_service(config, catalog, &pool)?;
			let id = commands::grant(
				&service,
				GrantRequest {
					grantor,
					grantor_role,
					beneficiary,
					resource,
					action,
					hours,
					reason,
				},
			)
			.await?;
			print(json, &id, ToString::to_string)?;
		}

		Command::Revoke {
			grant_id,
			revoker,
			revoker_role,
		} => {
			let pool = commands::open_database(config).await?;
			let service = commands::database_service(config, catalog, &pool)?;
			commands::revoke(&service, revoker, &revoker_role, grant_id).await?;
			println!("revoked {grant_id}");
		}

		Command::Grants { actor, all } => {
			let pool = commands::open_database(config).await?;
			let service = commands::database_service(config, catalog, &pool)?;
			let grants = commands::list_grants(&service, actor, all).await?;
			print(json, &grants, |g| commands::render_grants(g))?;
		}

		Command::Account {
			actor,
			inactive,
			lock_minutes,
			remove,
		} => {
			let pool = commands::open_database(config).await?;
			let update = if remove {
				AccountUpdate::Remove
			} else {
				AccountUpdate::Set {
					active: !inactive,
					locked_until: lock_minutes.map(|m| Utc::now() + Duration::minutes(m)),
				}
			};
			let status = commands::update_account(&pool, actor, update).await?;
			print(json, &status, |s| match s {
				Some(s) => format!("active={} locked_until={:?}", s.is_active, s.locked_until),
				None => "no account record".to_string(),
			})?;
		}
	}

	Ok(ExitCode::SUCCESS)
}
