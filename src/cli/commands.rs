use clap::{Parser, Subcommand};
use futures::executor::LocalPool;
use rusqlite::Connection;
use std::collections::HashMap;
use std::io::Read;
use std::rc::Rc;
use anyhow::{Context, Result};
use crate::board::{
    board_columns, Board, CancelReason, ConsoleNotifier, DragController, DropOutcome, Point,
    PointerSensor, SqlitePersistence, StageStore,
};
use crate::cli::error::{
    user_error, validate_color, validate_email, validate_interest_value, validate_non_empty,
};
use crate::cli::import::{import_leads, parse_payload};
use crate::cli::output::{
    format_board, format_lead_details, format_lead_table, format_stage_table, get_terminal_width, is_tty,
};
use crate::config::Config;
use crate::db::DbConnection;
use crate::models::{Lead, Stage};
use crate::repo::{short_id, LeadRepo, StageRepo};

#[derive(Parser)]
#[command(name = "leadboard")]
#[command(about = "Lead pipeline board - move real-estate leads between sales stages")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the pipeline board
    Board {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Move a lead to another stage
    Move {
        /// Lead id, id prefix or name
        lead: String,
        /// Target stage id, id prefix or name
        stage: String,
    },
    /// Show lead details
    Show {
        /// Lead id, id prefix or name
        lead: String,
    },
    /// Lead management commands
    Leads {
        #[command(subcommand)]
        subcommand: LeadCommands,
    },
    /// Stage management commands
    Stages {
        #[command(subcommand)]
        subcommand: StageCommands,
    },
}

#[derive(Subcommand)]
pub enum LeadCommands {
    /// List leads, newest first
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Add a lead
    Add {
        /// Lead name
        name: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// Interest value in BRL
        #[arg(long)]
        value: Option<f64>,
        /// Stage (defaults to the first stage)
        #[arg(long)]
        stage: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Import leads from a webhook-style JSON payload
    Import {
        /// Payload file, or "-" for stdin
        file: String,
    },
}

#[derive(Subcommand)]
pub enum StageCommands {
    /// List stages of the pipeline
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Add a stage
    Add {
        /// Stage name
        name: String,
        /// Color name or #rrggbb
        #[arg(long)]
        color: Option<String>,
        /// Position (defaults to after the last stage)
        #[arg(long)]
        position: Option<i64>,
    },
}

pub fn run() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    let config = Config::load()?;
    handle_command(cli, &config)
}

fn handle_command(cli: Cli, config: &Config) -> Result<()> {
    match cli.command {
        Commands::Board { json } => handle_board(config, json),
        Commands::Move { lead, stage } => handle_move(config, &lead, &stage),
        Commands::Show { lead } => handle_show(config, &lead),
        Commands::Leads { subcommand } => handle_leads(config, subcommand),
        Commands::Stages { subcommand } => handle_stages(config, subcommand),
    }
}

fn connect(config: &Config) -> Result<Connection> {
    DbConnection::connect(config).context("Failed to connect to database")
}

/// Database failures propagate (internal error); anything else is the user's input
fn or_user_error<T>(result: Result<T>) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.chain().any(|c| c.downcast_ref::<rusqlite::Error>().is_some()) => Err(e),
        Err(e) => user_error(&e.to_string()),
    }
}

/// Load the default pipeline and every lead into a fresh board store
fn open_store(conn: &Rc<Connection>) -> Result<StageStore> {
    let stages = StageRepo::list_default(conn).context("Failed to load stages")?;
    let leads = LeadRepo::list(conn).context("Failed to load leads")?;
    let persistence = Rc::new(SqlitePersistence::new(Rc::clone(conn)));
    Ok(StageStore::with_snapshot(persistence, leads, stages))
}

fn handle_board(config: &Config, json: bool) -> Result<()> {
    let conn = Rc::new(connect(config)?);
    let store = open_store(&conn)?;
    let columns = board_columns(&store, &DragController::new());
    let unassigned = store.unassigned();
    let uncategorized = store.uncategorized();

    if json {
        let board = serde_json::json!({
            "columns": columns,
            "unassigned": unassigned,
            "uncategorized": uncategorized,
        });
        println!("{}", serde_json::to_string_pretty(&board)?);
        return Ok(());
    }

    let use_color = config.color.enabled(is_tty());
    print!("{}", format_board(&columns, get_terminal_width(), use_color));

    let hidden = unassigned.len() + uncategorized.len();
    if hidden > 0 {
        println!("\n{} lead(s) without a board stage are not shown.", hidden);
    }
    Ok(())
}

/// Move a lead by replaying a drag gesture through the board: press on the
/// card, travel past the activation distance over the target column, release.
fn handle_move(config: &Config, lead_token: &str, stage_token: &str) -> Result<()> {
    let conn = Rc::new(connect(config)?);
    let lead = or_user_error(LeadRepo::resolve(&conn, lead_token))?;
    let stage = or_user_error(StageRepo::resolve(&conn, stage_token))?;

    let store = Rc::new(open_store(&conn)?);
    let notifier = Rc::new(ConsoleNotifier::new());
    let mut pool = LocalPool::new();
    let mut board = Board::new(store, notifier.clone(), pool.spawner());

    let mut sensor = PointerSensor::new(config.activation_distance);
    let travel = sensor.activation_distance() + 1.0;
    sensor.pointer_down(&lead.id, Point::new(0.0, 0.0));
    sensor.pointer_move(Point::new(travel, 0.0), Some(&stage.id), &mut board);
    sensor.pointer_up(&mut board);

    // Wait for the record store to confirm or reject
    pool.run();

    match board.last_drop() {
        Some(DropOutcome::Commit(_)) if notifier.error_count() > 0 => {
            // The notifier already printed the reason
            std::process::exit(1);
        }
        Some(DropOutcome::Commit(request)) => {
            let from = request
                .from_stage_id
                .as_deref()
                .and_then(|id| board.store().stage(id))
                .map(|s| s.name)
                .unwrap_or_else(|| "(unassigned)".to_string());
            println!("Moved lead '{}' from {} to {}", lead.name, from, stage.name);
        }
        Some(DropOutcome::Cancelled(CancelReason::SameStage)) => {
            println!("Lead '{}' is already in {}", lead.name, stage.name);
        }
        Some(DropOutcome::Cancelled(reason)) => {
            user_error(&format!("Move of lead '{}' cancelled: {:?}", lead.name, reason));
        }
        None => anyhow::bail!("Drag gesture for lead {} did not complete", lead.id),
    }
    Ok(())
}

fn handle_show(config: &Config, lead_token: &str) -> Result<()> {
    let conn = connect(config)?;
    let lead = or_user_error(LeadRepo::resolve(&conn, lead_token))?;
    let stage = match &lead.stage_id {
        Some(id) => StageRepo::get_by_id(&conn, id)?,
        None => None,
    };
    print!("{}", format_lead_details(&lead, stage.as_ref()));
    Ok(())
}

fn handle_leads(config: &Config, cmd: LeadCommands) -> Result<()> {
    let conn = connect(config)?;

    match cmd {
        LeadCommands::List { json } => {
            let leads = LeadRepo::list(&conn).context("Failed to list leads")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&leads)?);
            } else {
                let stages = StageRepo::list_default(&conn)?;
                print!("{}", format_lead_table(&leads, &stages));
            }
            Ok(())
        }
        LeadCommands::Add { name, phone, email, value, stage, notes } => {
            if let Err(e) = validate_non_empty(&name, "Lead name") {
                user_error(&e);
            }
            if let Some(email) = &email {
                if let Err(e) = validate_email(email) {
                    user_error(&e);
                }
            }
            if let Some(value) = value {
                if let Err(e) = validate_interest_value(value) {
                    user_error(&e);
                }
            }

            let stage: Option<Stage> = match stage {
                Some(token) => Some(or_user_error(StageRepo::resolve(&conn, &token))?),
                None => StageRepo::first_stage(&conn)?,
            };

            let mut lead = Lead::new(name.trim());
            lead.phone = phone;
            lead.email = email;
            lead.interest_value = value;
            lead.notes = notes;
            lead.source = Some("manual".to_string());
            lead.stage_id = stage.as_ref().map(|s| s.id.clone());

            let lead = LeadRepo::create(&conn, &lead)?;
            match stage {
                Some(stage) => println!("Created lead {} '{}' in {}", short_id(&lead.id), lead.name, stage.name),
                None => println!("Created lead {} '{}' (unassigned)", short_id(&lead.id), lead.name),
            }
            Ok(())
        }
        LeadCommands::Import { file } => {
            let content = if file == "-" {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("Failed to read payload from stdin")?;
                buf
            } else {
                std::fs::read_to_string(&file)
                    .unwrap_or_else(|e| user_error(&format!("Cannot read '{}': {}", file, e)))
            };

            let entries = or_user_error(parse_payload(&content))?;
            let created = or_user_error(import_leads(&conn, entries))?;
            println!("Imported {} lead(s)", created.len());
            Ok(())
        }
    }
}

fn handle_stages(config: &Config, cmd: StageCommands) -> Result<()> {
    let conn = connect(config)?;

    match cmd {
        StageCommands::List { json } => {
            let stages = StageRepo::list_default(&conn).context("Failed to list stages")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stages)?);
            } else {
                let mut counts: HashMap<String, usize> = HashMap::new();
                for lead in LeadRepo::list(&conn)? {
                    if let Some(stage_id) = lead.stage_id {
                        *counts.entry(stage_id).or_insert(0) += 1;
                    }
                }
                print!("{}", format_stage_table(&stages, &counts));
            }
            Ok(())
        }
        StageCommands::Add { name, color, position } => {
            if let Err(e) = validate_non_empty(&name, "Stage name") {
                user_error(&e);
            }
            if let Some(color) = &color {
                if let Err(e) = validate_color(color) {
                    user_error(&e);
                }
            }

            let stages = StageRepo::list_default(&conn)?;
            if stages.iter().any(|s| s.name.eq_ignore_ascii_case(name.trim())) {
                user_error(&format!("Stage '{}' already exists", name.trim()));
            }

            let Some(pipeline_id) = StageRepo::default_pipeline_id(&conn)? else {
                user_error("No pipeline found");
            };
            let stage = StageRepo::create(&conn, &pipeline_id, name.trim(), position, color.as_deref())?;
            println!("Created stage '{}' at position {} (id: {})", stage.name, stage.position, short_id(&stage.id));
            Ok(())
        }
    }
}
