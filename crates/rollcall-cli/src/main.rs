use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use rollcall_core::Config;
use rollcall_core::app::{App, AppBuilder, SignIn, SignOff};
use rollcall_core::domain::{
    EmployerId, EmployerPatch, EmployerRole, NewEmployer, ReportQuery, Shift, ShiftFilter,
    ShiftId, ShiftPatch,
};
use rollcall_core::ports::{AuditLogRepository, EmployerRepository};
use rollcall_core::store::WriteMode;

#[derive(Parser, Debug)]
#[command(name = "rollcall")]
#[command(version)]
#[command(about = "Employee attendance backed by a single JSON state file")]
#[command(propagate_version = true)]
struct Args {
    /// State file (overrides DATA_FILE_PATH)
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    /// in-place | atomic-rename (overrides ROLLCALL_WRITE_MODE)
    #[arg(long, global = true)]
    write_mode: Option<WriteMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Open a shift for an employer
    SignIn(AttendanceArgs),

    /// Close the employer's open shift
    SignOff(AttendanceArgs),

    /// Show whether an employer is on shift
    Status {
        employer_id: EmployerId,
    },

    /// Shift administration
    Shifts {
        #[command(subcommand)]
        command: ShiftCommands,
    },

    /// Paginated attendance report
    Report {
        #[command(flatten)]
        filter: FilterArgs,

        /// 1-based page number
        #[arg(long, default_value = "1")]
        page: usize,

        #[arg(long, default_value = "50")]
        limit: usize,
    },

    /// Audit log queries
    Audit {
        #[command(subcommand)]
        command: AuditCommands,
    },

    /// Employer accounts
    Employers {
        #[command(subcommand)]
        command: EmployerCommands,
    },

    /// Run the audit worker until Ctrl-C
    Worker {
        /// Poll interval while `audit:jobs` is empty (overrides ROLLCALL_POLL_INTERVAL_MS)
        #[arg(long)]
        poll_ms: Option<u64>,
    },
}

#[derive(clap::Args, Debug)]
struct AttendanceArgs {
    employer_id: EmployerId,

    /// IANA timezone name (defaults to TZ)
    #[arg(long)]
    timezone: Option<String>,

    #[arg(long)]
    notes: Option<String>,
}

#[derive(clap::Args, Debug)]
struct FilterArgs {
    #[arg(long)]
    employer: Option<EmployerId>,

    /// RFC 3339, inclusive
    #[arg(long)]
    from: Option<DateTime<Utc>>,

    /// RFC 3339, inclusive
    #[arg(long)]
    until: Option<DateTime<Utc>>,
}

impl From<FilterArgs> for ShiftFilter {
    fn from(args: FilterArgs) -> Self {
        ShiftFilter {
            employer_id: args.employer,
            started_from: args.from,
            started_until: args.until,
        }
    }
}

#[derive(clap::Subcommand, Debug)]
enum ShiftCommands {
    /// List shifts, newest first
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Overwrite fields of a shift
    Update {
        shift_id: ShiftId,

        #[arg(long)]
        started_at: Option<DateTime<Utc>>,

        #[arg(long)]
        ended_at: Option<DateTime<Utc>>,

        #[arg(long, conflicts_with = "clear_notes")]
        notes: Option<String>,

        /// Remove the notes
        #[arg(long)]
        clear_notes: bool,

        #[arg(long)]
        start_tz: Option<String>,

        #[arg(long)]
        end_tz: Option<String>,
    },
    /// Delete a shift
    Delete { shift_id: ShiftId },
}

#[derive(clap::Subcommand, Debug)]
enum AuditCommands {
    /// List audit logs, newest first
    List {
        #[arg(long)]
        employer: Option<EmployerId>,
    },
}

#[derive(clap::Subcommand, Debug)]
enum EmployerCommands {
    /// Register an employer
    Add {
        #[arg(long)]
        email: String,

        #[arg(long)]
        name: String,

        #[arg(long, default_value = "employee")]
        role: EmployerRole,

        /// Pre-computed credential hash (hashing happens outside rollcall)
        #[arg(long, env = "ROLLCALL_PASSWORD_HASH", default_value = "")]
        password_hash: String,
    },
    /// List employers
    List,
    /// Change name or role
    Update {
        employer_id: EmployerId,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        role: Option<EmployerRole>,
    },
    /// Delete an employer and all of their shifts
    Delete { employer_id: EmployerId },
}

// =============================================================================
// JSON Output Types
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusOutput<'a> {
    employer_id: EmployerId,
    on_shift: bool,
    shift: Option<&'a Shift>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeletedOutput {
    deleted: String,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = Config::from_env()?;
    if let Some(path) = &args.data_file {
        config.data_file_path = path.clone();
    }
    if let Some(mode) = args.write_mode {
        config.write_mode = mode;
    }
    if let Commands::Worker {
        poll_ms: Some(ms), ..
    } = &args.command
    {
        config.poll_interval = Duration::from_millis(*ms);
    }
    Ok(config)
}

async fn run_worker(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        path = %app.config.data_file_path.display(),
        "audit worker started (Ctrl-C to stop)"
    );
    let worker = app.spawn_audit_worker();
    let mut check = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                tracing::info!("shutdown requested");
                break;
            }
            _ = check.tick() => {
                // consumer は致命的エラーでのみ終了する
                if worker.is_finished() {
                    break;
                }
            }
        }
    }
    worker.shutdown_and_join().await?;
    Ok(())
}

async fn run(app: &App, command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    let default_tz = || app.config.default_timezone.clone();

    match command {
        Commands::SignIn(args) => {
            let shift = app
                .attendance
                .sign_in(SignIn {
                    employer_id: args.employer_id,
                    timezone: args.timezone.unwrap_or_else(default_tz),
                    notes: args.notes,
                })
                .await?;
            print_json(&shift)?;
        }
        Commands::SignOff(args) => {
            let shift = app
                .attendance
                .sign_off(SignOff {
                    employer_id: args.employer_id,
                    timezone: args.timezone.unwrap_or_else(default_tz),
                    notes: args.notes,
                })
                .await?;
            print_json(&shift)?;
        }
        Commands::Status { employer_id } => {
            let state = app.attendance.state(employer_id.clone()).await?;
            print_json(&StatusOutput {
                employer_id,
                on_shift: state.is_on_shift(),
                shift: state.open_shift(),
            })?;
        }
        Commands::Shifts { command } => match command {
            ShiftCommands::List { filter } => {
                let shifts = app.attendance.list_shifts(&filter.into()).await?;
                print_json(&shifts)?;
            }
            ShiftCommands::Update {
                shift_id,
                started_at,
                ended_at,
                notes,
                clear_notes,
                start_tz,
                end_tz,
            } => {
                let patch = ShiftPatch {
                    started_at,
                    ended_at,
                    notes: if clear_notes { Some(None) } else { notes.map(Some) },
                    start_tz,
                    end_tz,
                };
                if patch.is_empty() {
                    return Err("nothing to update".into());
                }
                let shift = app.attendance.update_shift(shift_id, patch).await?;
                print_json(&shift)?;
            }
            ShiftCommands::Delete { shift_id } => {
                app.attendance.delete_shift(shift_id.clone()).await?;
                print_json(&DeletedOutput {
                    deleted: shift_id.to_string(),
                })?;
            }
        },
        Commands::Report {
            filter,
            page,
            limit,
        } => {
            let report = app
                .attendance
                .report(&ReportQuery {
                    filter: filter.into(),
                    page,
                    limit,
                })
                .await?;
            print_json(&report)?;
        }
        Commands::Audit { command } => match command {
            AuditCommands::List { employer } => {
                print_json(&app.audit_logs.list(employer).await?)?;
            }
        },
        Commands::Employers { command } => match command {
            EmployerCommands::Add {
                email,
                name,
                role,
                password_hash,
            } => {
                let employer = app
                    .employers
                    .create(NewEmployer {
                        email,
                        name,
                        role,
                        password_hash,
                    })
                    .await?;
                print_json(&employer)?;
            }
            EmployerCommands::List => {
                print_json(&app.employers.list().await?)?;
            }
            EmployerCommands::Update {
                employer_id,
                name,
                role,
            } => {
                let employer = app
                    .employers
                    .update(employer_id, EmployerPatch { name, role })
                    .await?;
                print_json(&employer)?;
            }
            EmployerCommands::Delete { employer_id } => {
                app.employers.delete(employer_id.clone()).await?;
                print_json(&DeletedOutput {
                    deleted: employer_id.to_string(),
                })?;
            }
        },
        Commands::Worker { .. } => run_worker(app).await?,
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let app = AppBuilder::new(config).build();

    run(&app, args.command).await
}
