//! Subcommands

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use sqlx::PgPool;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};

use sortie_authz::{
    decide_identity_action, AccessDecision, CallerContext, CallerResolver, GrantSet,
    IdentityAction, Permission, Predicate, VisibilityFilter,
};
use sortie_core::{CommunityId, GrantStore, UserId};
use sortie_db::{
    create_pool, DatabaseConfig, MissionListQuery, PgGrantStore, PgMembershipStore,
    PgMissionRepository,
};

use crate::config::Settings;

#[derive(Debug, Parser)]
#[command(name = "sortie", version, about = "Evaluate Sortie permission checks and mission visibility filters")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check whether held grants satisfy a required permission
    Check(CheckArgs),
    /// Decide whether an actor may modify or delete a target identity
    Guard(GuardArgs),
    /// Print the mission visibility filter for a caller
    Filter(FilterArgs),
    /// List the missions a caller may see
    List(ListArgs),
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Held grant, repeatable
    #[arg(short, long = "grant")]
    grants: Vec<String>,
    /// Required permission, e.g. admin.user
    required: String,
}

#[derive(Debug, Args)]
pub struct GuardArgs {
    #[arg(long = "actor-grant")]
    actor_grants: Vec<String>,
    #[arg(long = "target-grant")]
    target_grants: Vec<String>,
    #[arg(long, value_enum, default_value_t = ActionArg::Modify)]
    action: ActionArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ActionArg {
    Modify,
    Delete,
}

impl From<ActionArg> for IdentityAction {
    fn from(action: ActionArg) -> Self {
        match action {
            ActionArg::Modify => IdentityAction::Modify,
            ActionArg::Delete => IdentityAction::Delete,
        }
    }
}

#[derive(Debug, Args)]
pub struct CallerArgs {
    /// Caller uid; omit for an anonymous caller
    #[arg(long)]
    uid: Option<UserId>,
    /// Caller community uid
    #[arg(long)]
    community: Option<CommunityId>,
    /// Caller grant, repeatable
    #[arg(short, long = "grant")]
    grants: Vec<String>,
    /// Load grants and community of --uid from the database instead
    #[arg(long)]
    resolve: bool,
}

#[derive(Debug, Args)]
pub struct FilterArgs {
    #[command(flatten)]
    caller: CallerArgs,
    /// Only missions created by this uid
    #[arg(long)]
    creator: Option<UserId>,
    /// Leave out missions that have already ended
    #[arg(long)]
    exclude_ended: bool,
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Caller uid; omit for an anonymous caller
    #[arg(long)]
    uid: Option<UserId>,
    /// Only missions created by this uid
    #[arg(long)]
    creator: Option<UserId>,
    #[arg(long)]
    exclude_ended: bool,
    #[arg(long, default_value_t = 10)]
    limit: i64,
    #[arg(long, default_value_t = 0)]
    offset: i64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    Sql,
}

/// Result of a command, mapped onto the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Allowed,
    Denied,
    Done,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Self::Allowed | Self::Done => ExitCode::SUCCESS,
            Self::Denied => ExitCode::from(1),
        }
    }
}

impl Command {
    pub async fn run(self, settings: &Settings) -> Result<Outcome> {
        match self {
            Self::Check(args) => check(args),
            Self::Guard(args) => guard(args),
            Self::Filter(args) => filter(args, settings).await,
            Self::List(args) => list(args, settings).await,
        }
    }
}

fn grant_set(raw: &[String], whose: &str) -> GrantSet {
    let grants = GrantSet::from_raw(raw.iter().cloned());
    if !grants.rejected().is_empty() {
        warn!(whose, rejected = ?grants.rejected(), "Ignoring malformed grants");
    }
    grants
}

fn check(args: CheckArgs) -> Result<Outcome> {
    let required = Permission::parse(args.required.as_str())
        .context("Invalid required permission")?;
    let grants = grant_set(&args.grants, "caller");

    if grants.satisfies(&required) {
        println!("allowed: {}", required);
        Ok(Outcome::Allowed)
    } else {
        println!("denied: {}", required);
        Ok(Outcome::Denied)
    }
}

fn guard(args: GuardArgs) -> Result<Outcome> {
    let actor = grant_set(&args.actor_grants, "actor");
    let target = grant_set(&args.target_grants, "target");
    let action = IdentityAction::from(args.action);

    let decision = decide_identity_action(&actor, &target, action);
    let label = match decision {
        AccessDecision::Allowed => "allowed",
        AccessDecision::MissingCapability => "denied: actor lacks admin.user",
        AccessDecision::EscalationVeto => "denied: target is an administrator",
    };
    println!("{} {}", action, label);

    Ok(if decision.is_allowed() {
        Outcome::Allowed
    } else {
        Outcome::Denied
    })
}

async fn filter(args: FilterArgs, settings: &Settings) -> Result<Outcome> {
    let caller = if args.caller.resolve {
        let Some(uid) = args.caller.uid else {
            bail!("--resolve requires --uid");
        };
        let pool = connect(settings).await?;
        resolver(&pool).resolve(Some(uid)).await?
    } else {
        CallerContext::from_credentials(
            args.caller.uid.is_some(),
            args.caller.uid,
            args.caller.community,
            grant_set(&args.caller.grants, "caller"),
        )?
    };

    let mut builder = VisibilityFilter::for_caller(&caller).created_by(args.creator);
    if args.exclude_ended {
        builder = builder.ending_after(Utc::now());
    }
    let predicate = builder.build();

    match args.format {
        Format::Text => println!("{}", predicate),
        Format::Json => println!("{}", serde_json::to_string_pretty(&predicate)?),
        Format::Sql => println!("{}", MissionListQuery::new(predicate).select_query().sql()),
    }
    Ok(Outcome::Done)
}

async fn list(args: ListArgs, settings: &Settings) -> Result<Outcome> {
    let pool = connect(settings).await?;
    let caller = resolver(&pool).resolve(args.uid).await?;

    if let Some(creator) = args.creator {
        // an unknown creator is an error rather than an empty listing
        if PgGrantStore::new(pool.clone()).grants_for(creator).await?.is_none() {
            bail!("User {} not found", creator);
        }
    }

    let mut builder = VisibilityFilter::for_caller(&caller).created_by(args.creator);
    if args.exclude_ended {
        builder = builder.ending_after(Utc::now());
    }
    let predicate: Predicate = builder.build();

    let query = MissionListQuery::new(predicate).page(args.limit, args.offset);
    let page = PgMissionRepository::new(pool)
        .list_visible(&query)
        .await
        .context("Failed to list missions")?;

    info!(count = page.count(), total = page.total, "Listed missions");

    let output = json!({
        "limit": page.limit,
        "offset": page.offset,
        "count": page.count(),
        "total": page.total,
        "moreAvailable": page.more_available(),
        "missions": page.items,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(Outcome::Done)
}

async fn connect(settings: &Settings) -> Result<PgPool> {
    let config = DatabaseConfig {
        max_connections: settings.database.max_connections,
        acquire_timeout_secs: settings.database.acquire_timeout_secs,
        ..DatabaseConfig::new(settings.database.url.as_str())
    };
    create_pool(&config)
        .await
        .context("Failed to connect to PostgreSQL")
}

fn resolver(pool: &PgPool) -> CallerResolver {
    CallerResolver::new(
        Arc::new(PgGrantStore::new(pool.clone())),
        Arc::new(PgMembershipStore::new(pool.clone())),
    )
}
