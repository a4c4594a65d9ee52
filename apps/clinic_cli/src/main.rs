use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    config::{load_settings_from, DEFAULT_SETTINGS_FILE},
    transport::build_http_client,
    HttpResourceApi, HttpSessionApi, NotificationSink, Resource, ResourceController, Reviews,
    SessionCache, SessionController, SessionStore, Symptoms, TracingNotificationSink,
};
use serde::Serialize;
use shared::domain::{NewReview, NewSymptom};
use tracing::info;

#[derive(Parser, Debug)]
#[command(about = "Clinic website data client")]
struct Args {
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    config: PathBuf,
    /// Overrides `api_base_url` from settings.
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    session_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Reviews {
        #[command(subcommand)]
        action: ReviewCommand,
    },
    Symptoms {
        #[command(subcommand)]
        action: SymptomCommand,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Status,
}

#[derive(Subcommand, Debug)]
enum ReviewCommand {
    List,
    Get {
        id: String,
    },
    Create {
        #[arg(long)]
        author: String,
        #[arg(long)]
        rating: u8,
        #[arg(long)]
        comment: String,
    },
}

#[derive(Subcommand, Debug)]
enum SymptomCommand {
    List,
    Get {
        id: String,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        body_area: Option<String>,
    },
}

struct Backend {
    http: reqwest::Client,
    base_url: url::Url,
    session_cache: Arc<SessionCache>,
    sink: Arc<dyn NotificationSink>,
}

impl Backend {
    fn resource<R: Resource>(&self) -> Arc<HttpResourceApi<R>> {
        Arc::new(
            HttpResourceApi::new(self.http.clone(), self.base_url.clone())
                .with_session_cache(self.session_cache.clone()),
        )
    }

    fn session(&self) -> Arc<HttpSessionApi> {
        Arc::new(HttpSessionApi::new(
            self.http.clone(),
            self.base_url.clone(),
            self.session_cache.clone(),
        ))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let mut settings = load_settings_from(&args.config);
    if let Some(api_url) = args.api_url {
        settings.api_base_url = api_url;
    }
    if let Some(session_file) = args.session_file {
        settings.session_file = Some(session_file);
    }

    let session_cache = match &settings.session_file {
        Some(path) => SessionCache::open(path),
        None => SessionCache::in_memory(),
    };
    let http =
        build_http_client(settings.request_timeout()).context("failed to build http client")?;
    let backend = Backend {
        http,
        base_url: settings.api_base_url()?,
        session_cache: Arc::new(session_cache),
        sink: Arc::new(TracingNotificationSink),
    };
    info!("cli: using api base url {}", backend.base_url);

    match args.command {
        Command::Reviews { action } => match action {
            ReviewCommand::List => list::<Reviews>(&backend).await,
            ReviewCommand::Get { id } => get::<Reviews>(&backend, &id).await,
            ReviewCommand::Create {
                author,
                rating,
                comment,
            } => {
                create::<Reviews>(
                    &backend,
                    NewReview {
                        author_name: author,
                        rating,
                        comment,
                    },
                )
                .await
            }
        },
        Command::Symptoms { action } => match action {
            SymptomCommand::List => list::<Symptoms>(&backend).await,
            SymptomCommand::Get { id } => get::<Symptoms>(&backend, &id).await,
            SymptomCommand::Create {
                name,
                description,
                body_area,
            } => {
                create::<Symptoms>(
                    &backend,
                    NewSymptom {
                        name,
                        description,
                        body_area,
                    },
                )
                .await
            }
        },
        Command::Login { email, password } => {
            let controller = SessionController::new(
                backend.session(),
                backend.sink.clone(),
                SessionStore::new(),
            );
            let session = controller.login(&email, &password).await?;
            println!("Logged in as user_id={}", session.id);
            Ok(())
        }
        Command::Logout => {
            let controller = SessionController::new(
                backend.session(),
                backend.sink.clone(),
                SessionStore::new(),
            );
            controller.logout().await;
            println!("Logged out");
            Ok(())
        }
        Command::Status => {
            let controller = SessionController::start(
                backend.session(),
                backend.sink.clone(),
                SessionStore::new(),
            )
            .await;
            let state = controller.state();
            match state.session() {
                Some(session) if state.is_authenticated() => {
                    println!("authenticated user_id={}", session.id)
                }
                _ => println!("not authenticated"),
            }
            Ok(())
        }
    }
}

async fn list<R: Resource>(backend: &Backend) -> Result<()>
where
    R::Item: Serialize,
{
    let controller =
        ResourceController::<R>::start(backend.resource::<R>(), backend.sink.clone()).await;
    let state = controller.state();
    if let Some(error) = state.error {
        bail!("failed to list {}: {error}", R::COLLECTION);
    }
    println!("{}", serde_json::to_string_pretty(&state.items)?);
    Ok(())
}

async fn get<R: Resource>(backend: &Backend, id: &str) -> Result<()>
where
    R::Item: Serialize,
{
    let controller = ResourceController::<R>::new(backend.resource::<R>(), backend.sink.clone());
    let item = controller
        .get_one(id)
        .await
        .with_context(|| format!("failed to fetch {} {id}", R::SINGULAR))?;
    println!("{}", serde_json::to_string_pretty(&item)?);
    Ok(())
}

async fn create<R: Resource>(backend: &Backend, payload: R::Payload) -> Result<()>
where
    R::Item: Serialize,
{
    let controller = ResourceController::<R>::new(backend.resource::<R>(), backend.sink.clone());
    match controller
        .create(payload)
        .await
        .with_context(|| format!("failed to create {}", R::SINGULAR))?
    {
        Some(item) => println!("{}", serde_json::to_string_pretty(&item)?),
        None => println!("{} submitted", R::SINGULAR),
    }
    Ok(())
}
