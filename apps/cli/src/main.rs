use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    auth::{CompanyRegistration, WorkerRegistration},
    load_settings, Audience, ClientContext, ClientError, Credentials, Destination,
    NewEvaluation, PhotoUpload, Registration,
};
use serde::Serialize;
use shared::domain::{EvaluationId, UserId};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "indica", about = "Command-line client for the indica.ai marketplace")]
struct Cli {
    /// Backend base URL; overrides indica.toml and APP__API_BASE_URL.
    #[arg(long, env = "INDICA_API_URL")]
    api_url: Option<String>,
    /// File holding the persisted session.
    #[arg(long, env = "INDICA_SESSION_PATH")]
    session_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "INDICA_PASSWORD")]
        password: String,
    },
    RegisterWorker {
        #[arg(long)]
        name: String,
        #[arg(long)]
        cpf: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "INDICA_PASSWORD")]
        password: String,
        #[arg(long)]
        face_photo: PathBuf,
        #[arg(long)]
        document_photo: PathBuf,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        bio: Option<String>,
    },
    RegisterCompany {
        #[arg(long)]
        legal_name: String,
        #[arg(long)]
        trade_name: String,
        #[arg(long)]
        cnpj: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "INDICA_PASSWORD")]
        password: String,
    },
    Logout {
        /// Always return to the account-kind selection.
        #[arg(long)]
        to_selection: bool,
    },
    /// Prints the restored session.
    Whoami,
    /// Prints where the front end should send the user who opens ROUTE.
    Route { route: String },
    Profile,
    Worker { worker_id: String },
    Reviews {
        #[arg(long, value_enum, default_value_t = ListKind::Received)]
        list: ListKind,
        /// Worker whose history to list; implies `--list history`.
        #[arg(long)]
        worker: Option<String>,
    },
    Reply { evaluation_id: String, text: String },
    Evaluate {
        worker_id: String,
        #[arg(long)]
        assiduity: u8,
        #[arg(long)]
        technical: u8,
        #[arg(long)]
        behavioral: u8,
        #[arg(long)]
        comment: String,
    },
    Search { term: String },
    SetBio { bio: String },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ListKind {
    Received,
    Authored,
    History,
}

#[derive(Serialize)]
struct NavigationOutput<'a> {
    destination: Option<&'a str>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_destination(destination: Option<Destination>) -> Result<()> {
    print_json(&NavigationOutput {
        destination: destination.map(|d| d.path()),
    })
}

fn read_photo(path: &Path) -> Result<PhotoUpload> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read photo '{}'", path.display()))?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let mime_type = match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => return Err(anyhow!("unsupported photo format '{}'", path.display())),
    };
    Ok(PhotoUpload {
        mime_type: mime_type.to_string(),
        bytes,
    })
}

fn default_session_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|base| base.join("indica").join("session.json"))
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = load_settings();
    if let Some(url) = cli.api_url {
        settings.api_base_url = url;
    }
    if let Some(path) = cli.session_file {
        settings.session_path = Some(path);
    }
    if settings.session_path.is_none() {
        settings.session_path = default_session_path();
    }
    debug!(api = %settings.api_base_url, session = ?settings.session_path, "cli: settings resolved");

    let context = ClientContext::from_settings(settings)?;
    let session = context.session();

    match cli.command {
        Command::Login { email, password } => {
            context.init("/login").await;
            let destination = session.login(&Credentials { email, password }).await?;
            print_destination(Some(destination))?;
        }
        Command::RegisterWorker {
            name,
            cpf,
            email,
            password,
            face_photo,
            document_photo,
            city,
            bio,
        } => {
            context.init("/register").await;
            let registration = Registration::Worker(WorkerRegistration {
                full_name: name,
                cpf,
                email,
                password,
                face_photo: read_photo(&face_photo)?,
                document_photo: read_photo(&document_photo)?,
                city,
                bio,
            });
            let destination = session.register(&registration).await?;
            print_destination(Some(destination))?;
        }
        Command::RegisterCompany {
            legal_name,
            trade_name,
            cnpj,
            email,
            password,
        } => {
            context.init("/register").await;
            let registration = Registration::Company(CompanyRegistration {
                legal_name,
                trade_name,
                cnpj,
                email,
                password,
            });
            let destination = session.register(&registration).await?;
            print_destination(Some(destination))?;
        }
        Command::Logout { to_selection } => {
            context.init("/").await;
            let destination = if to_selection {
                session.logout_to_selection().await
            } else {
                session.logout().await
            };
            print_destination(Some(destination))?;
        }
        Command::Whoami => {
            context.init("/profile").await;
            match session.user().await {
                Some(user) => print_json(&user)?,
                None => return Err(ClientError::NotAuthenticated.into()),
            }
        }
        Command::Route { route } => {
            let redirect = context.init(&route).await;
            print_destination(redirect)?;
        }
        Command::Profile => {
            context.init("/profile").await;
            let view = context.profile_controller().load().await?;
            print_json(&view)?;
        }
        Command::Worker { worker_id } => {
            context.init("/worker/").await;
            let profile = context
                .profile_controller()
                .load_worker(&UserId::new(worker_id))
                .await?;
            print_json(&profile)?;
        }
        Command::Reviews { list, worker } => {
            context.init("/profile").await;
            let audience = match (list, worker) {
                (_, Some(worker_id)) => Audience::History(UserId::new(worker_id)),
                (ListKind::History, None) => {
                    return Err(anyhow!("--worker is required to list a worker history"))
                }
                (ListKind::Received, None) => Audience::Received,
                (ListKind::Authored, None) => Audience::Authored,
            };
            let board = context.evaluation_board(audience);
            let reviews = board.refresh().await?;
            print_json(&serde_json::json!({
                "summary": board.summary().await,
                "reviews": reviews,
            }))?;
        }
        Command::Reply {
            evaluation_id,
            text,
        } => {
            context.init("/profile").await;
            let board = context.evaluation_board(Audience::Received);
            board.refresh().await?;
            let reviews = board.reply(&EvaluationId::new(evaluation_id), &text).await?;
            print_json(&reviews)?;
        }
        Command::Evaluate {
            worker_id,
            assiduity,
            technical,
            behavioral,
            comment,
        } => {
            context.init("/evaluate").await;
            let worker_id = UserId::new(worker_id);
            let board = context.evaluation_board(Audience::History(worker_id.clone()));
            let reviews = board
                .submit(NewEvaluation {
                    worker_id,
                    assiduity,
                    technical,
                    behavioral,
                    comment,
                })
                .await?;
            print_json(&reviews)?;
        }
        Command::Search { term } => {
            context.init("/search").await;
            let found = context.worker_search().query(&term).await?.unwrap_or_default();
            print_json(&found)?;
        }
        Command::SetBio { bio } => {
            context.init("/profile").await;
            let user = session.update_bio(&bio).await?;
            print_json(&user)?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => Ok(()),
        Err(err) => match err.downcast_ref::<ClientError>() {
            Some(client_err) => {
                eprintln!("{}", client_err.user_message());
                debug!("cli: {err:#}");
                std::process::exit(1);
            }
            None => Err(err),
        },
    }
}
