use std::{error::Error, path::PathBuf};

use chrono::Utc;
use clap::{Parser, Subcommand};
use klasse::{
    models::{event::EventListener, Database, EventId, UserId},
    session::Session,
};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod render;

use render::{render_event, render_grade, render_summary};

#[derive(Parser, Debug)]
#[command(name = "klasse")]
#[command(about = "Academic year, registration pool and attendee lists from captured event data")]
struct Args {
    /// Directory holding the `db/` snapshot store
    #[arg(long, env = "KLASSE_DB", default_value = ".")]
    db: PathBuf,

    /// Id of the user viewing the events
    #[arg(long, env = "KLASSE_USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Memberships and academic year of the viewer
    Grade,
    /// Upcoming events with their registration window
    Events,
    /// The viewer's pool and the attendee lists of one event
    Show { event: String },
    /// Like `show`, printed again every time an event snapshot is rewritten
    Watch { event: Option<String> },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // a missing .env is fine; it only has to be loaded before clap reads the environment
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let db = Database::new(&args.db)?;

    let mut session = Session::new();
    if let Some(id) = &args.user {
        session.sign_in(db.fetch_user(&UserId::new(id))?);
    }

    match args.command {
        Command::Grade => print!("{}", render_grade(&session, Utc::now())?),
        Command::Events => {
            let now = Utc::now();
            for id in db.upcoming_events(now)? {
                let bundle = db.fetch_event(&id)?;
                println!("{}", render_summary(&bundle, now));
            }
        }
        Command::Show { event } => {
            let bundle = db.fetch_event(&EventId::new(&event))?;
            print!("{}", render_event(&bundle, &session, Utc::now()));
        }
        Command::Watch { event } => {
            let only = event.map(|e| EventId::new(&e));
            let (tx, mut rx) = mpsc::channel(16);
            let listener = tokio::spawn(EventListener::new(tx, &db).start());
            info!("waiting for snapshot updates");

            while let Some(bundle) = rx.recv().await {
                if only.as_ref().map_or(false, |id| *id != bundle.event.id) {
                    continue;
                }
                print!("{}", render_event(&bundle, &session, Utc::now()));
            }
            listener.await??;
        }
    }
    Ok(())
}
