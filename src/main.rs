mod commands;
mod render;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use grdlhub_core::{Hub, HubConfig};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "grdlhub")]
#[command(about = "Schedule congregation appointments, designations and availability")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage privileges
    Privilege {
        #[command(subcommand)]
        action: PrivilegeAction,
    },
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage the event type catalog
    EventType {
        #[command(subcommand)]
        action: EventTypeAction,
    },
    /// Create an appointment
    New {
        title: String,

        /// Date, or first date of a repeating appointment (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,

        /// Start time (HH:MM)
        #[arg(short, long)]
        time: Option<String>,

        #[arg(short, long)]
        place: Option<String>,

        /// Duration (e.g., "45m", "1h30m")
        #[arg(long)]
        duration: Option<String>,

        /// weekly, biweekly, monthly, quarterly or yearly
        #[arg(short, long)]
        repeat: Option<String>,

        /// Last date of a repeating appointment (YYYY-MM-DD)
        #[arg(long, requires = "repeat")]
        until: Option<String>,

        /// event or task
        #[arg(short, long, default_value = "event")]
        category: String,

        /// Designate a user by email (repeatable)
        #[arg(long = "designate")]
        designate: Vec<String>,

        /// Share a task with every holder of this privilege
        #[arg(short, long)]
        group: Option<String>,
    },
    /// List appointments
    List,
    /// Show one appointment
    Show {
        /// Appointment id or id prefix
        id: String,

        /// Print the stored document
        #[arg(long)]
        json: bool,
    },
    /// Show the occurrences in a date range
    Schedule {
        /// First day (YYYY-MM-DD), defaults to the start of this month
        #[arg(long)]
        from: Option<String>,

        /// Last day (YYYY-MM-DD), defaults to the end of the `from` month
        #[arg(long)]
        to: Option<String>,

        /// Only occurrences this user (by email) takes part in
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Check whether an appointment occurs on a date
    Occurs { id: String, date: String },
    /// Edit one occurrence or the whole appointment
    Edit {
        id: String,

        /// Only change the occurrence on this date
        #[arg(long, conflicts_with = "all")]
        on: Option<String>,

        /// Change every occurrence (drops single-occurrence changes)
        #[arg(long)]
        all: bool,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long)]
        time: Option<String>,

        #[arg(short, long)]
        place: Option<String>,

        #[arg(long)]
        duration: Option<String>,

        /// Replace designations with these users (by email, repeatable)
        #[arg(long = "designate")]
        designate: Vec<String>,

        /// Remove all designations
        #[arg(long, conflicts_with = "designate")]
        clear_designations: bool,

        #[arg(short, long)]
        group: Option<String>,

        /// Refuse to write unless the appointment is still at this revision
        #[arg(long)]
        if_revision: Option<u64>,
    },
    /// Cancel one occurrence of a repeating appointment
    Cancel {
        id: String,
        date: String,
        #[arg(long)]
        if_revision: Option<u64>,
    },
    /// Undo a cancellation or change of one occurrence
    Restore {
        id: String,
        date: String,
        #[arg(long)]
        if_revision: Option<u64>,
    },
    /// Stop a repeating appointment from a date on (history is kept)
    End {
        id: String,
        /// First date that no longer takes place
        cutover: String,
        #[arg(long)]
        if_revision: Option<u64>,
    },
    /// Delete an appointment
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// List users who may be designated to an appointment
    Eligible { id: String },
    /// Record or show availability
    Availability {
        #[command(subcommand)]
        action: AvailabilityAction,
    },
    /// Staffing and availability summary
    Report {
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
    },
}

#[derive(Subcommand)]
enum PrivilegeAction {
    Add { name: String },
    List,
    Activate { name: String },
    Deactivate { name: String },
}

#[derive(Subcommand)]
enum UserAction {
    Add {
        name: String,
        email: String,
        #[arg(long)]
        admin: bool,
    },
    List,
    Grant { email: String, privilege: String },
    Revoke { email: String, privilege: String },
    /// Set status: invited, active or disabled
    Status { email: String, status: String },
}

#[derive(Subcommand)]
enum EventTypeAction {
    Add {
        name: String,

        /// event or task
        #[arg(short, long, default_value = "event")]
        category: String,

        /// How many people may be designated (1 to 3)
        #[arg(short, long, default_value_t = 1)]
        max: usize,

        /// Privilege a designated user must hold
        #[arg(short, long)]
        privilege: Option<String>,
    },
    List,
}

#[derive(Clone, Copy, ValueEnum)]
enum Answer {
    Yes,
    No,
}

#[derive(Subcommand)]
enum AvailabilityAction {
    Set {
        id: String,
        date: String,
        answer: Answer,
        /// Whose availability (email)
        #[arg(short, long)]
        user: String,
    },
    Show { id: String, date: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = HubConfig::load()?;
    init_logging(&config);

    let today = config.today()?;
    let hub = Hub::from_config(&config).await?;
    debug!(data_dir = %config.data_path().display(), %today, "Opened hub");

    match cli.command {
        Commands::Privilege { action } => match action {
            PrivilegeAction::Add { name } => commands::privilege::add(&hub, &name).await,
            PrivilegeAction::List => commands::privilege::list(&hub).await,
            PrivilegeAction::Activate { name } => {
                commands::privilege::set_active(&hub, &name, true).await
            }
            PrivilegeAction::Deactivate { name } => {
                commands::privilege::set_active(&hub, &name, false).await
            }
        },
        Commands::User { action } => match action {
            UserAction::Add { name, email, admin } => {
                commands::user::add(&hub, &name, &email, admin).await
            }
            UserAction::List => commands::user::list(&hub).await,
            UserAction::Grant { email, privilege } => {
                commands::user::grant(&hub, &email, &privilege).await
            }
            UserAction::Revoke { email, privilege } => {
                commands::user::revoke(&hub, &email, &privilege).await
            }
            UserAction::Status { email, status } => {
                commands::user::set_status(&hub, &email, &status).await
            }
        },
        Commands::EventType { action } => match action {
            EventTypeAction::Add {
                name,
                category,
                max,
                privilege,
            } => commands::event_type::add(&hub, name, &category, max, privilege).await,
            EventTypeAction::List => commands::event_type::list(&hub).await,
        },
        Commands::New {
            title,
            date,
            time,
            place,
            duration,
            repeat,
            until,
            category,
            designate,
            group,
        } => {
            let args = commands::appointment::NewArgs {
                title,
                date,
                time,
                place,
                duration,
                repeat,
                until,
                category,
                designate,
                group,
            };
            commands::appointment::new(&hub, args).await
        }
        Commands::List => commands::appointment::list(&hub).await,
        Commands::Show { id, json } => commands::appointment::show(&hub, &id, json).await,
        Commands::Schedule { from, to, user } => {
            commands::schedule::run(&hub, from.as_deref(), to.as_deref(), user.as_deref(), today)
                .await
        }
        Commands::Occurs { id, date } => commands::appointment::occurs(&hub, &id, &date).await,
        Commands::Edit {
            id,
            on,
            all,
            title,
            time,
            place,
            duration,
            designate,
            clear_designations,
            group,
            if_revision,
        } => {
            let args = commands::edit::EditArgs {
                on,
                all,
                title,
                time,
                place,
                duration,
                designate,
                clear_designations,
                group,
                if_revision,
            };
            commands::edit::edit(&hub, &id, args).await
        }
        Commands::Cancel {
            id,
            date,
            if_revision,
        } => commands::edit::cancel(&hub, &id, &date, if_revision).await,
        Commands::Restore {
            id,
            date,
            if_revision,
        } => commands::edit::restore(&hub, &id, &date, if_revision).await,
        Commands::End {
            id,
            cutover,
            if_revision,
        } => commands::edit::end(&hub, &id, &cutover, if_revision).await,
        Commands::Delete { id, yes } => commands::appointment::delete(&hub, &id, yes, today).await,
        Commands::Eligible { id } => commands::schedule::eligible(&hub, &id).await,
        Commands::Availability { action } => match action {
            AvailabilityAction::Set {
                id,
                date,
                answer,
                user,
            } => {
                let available = matches!(answer, Answer::Yes);
                commands::availability::set(&hub, &id, &date, &user, available).await
            }
            AvailabilityAction::Show { id, date } => {
                commands::availability::show(&hub, &id, &date).await
            }
        },
        Commands::Report { from, to } => {
            commands::report::run(&hub, from.as_deref(), to.as_deref(), today).await
        }
    }
}

/// Log to stderr, filtered by RUST_LOG or the configured level.
fn init_logging(config: &HubConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
