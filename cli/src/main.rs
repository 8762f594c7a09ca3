use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use komunal::net::types::{ProfileUpdate, SigninRequest, SignupRequest};
use komunal::{ApiClient, AuthEvent, ClientConfig, ClientError, FileStore, Operation, User};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Setup(#[from] ClientError),
    #[error("{0}")]
    Request(String),
    #[error("session expired; please sign in again")]
    SessionExpired,
    #[error("not signed in; run `komunal signin` first")]
    NotSignedIn,
    #[error("already signed in as @{0}; run `komunal signout` first")]
    AlreadySignedIn(String),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl CliError {
    fn from_client(op: Operation, error: ClientError) -> Self {
        Self::Request(error.user_message(op))
    }
}

#[derive(Parser, Debug)]
#[command(name = "komunal", about = "Komunal social feed client")]
struct Cli {
    #[arg(long, env = "KOMUNAL_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "KOMUNAL_SESSION_FILE")]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and sign in.
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "KOMUNAL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign in with email and password.
    Signin {
        #[arg(long)]
        email: String,
        #[arg(long, env = "KOMUNAL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session.
    Signout,
    /// Show the stored session.
    Status,
    Profile(ProfileCommand),
    Post(PostCommand),
    /// Show the public feed.
    Feed,
}

#[derive(Args, Debug)]
struct ProfileCommand {
    #[command(subcommand)]
    command: ProfileSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProfileSubcommand {
    Show,
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
}

#[derive(Args, Debug)]
struct PostCommand {
    #[command(subcommand)]
    command: PostSubcommand,
}

#[derive(Subcommand, Debug)]
enum PostSubcommand {
    Create { content: String },
    List,
    Mine,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.api_url.as_deref() {
        config = config.with_api_url(url)?;
    }
    if let Some(path) = cli.session_file {
        config.session_file = path;
    }

    let client = ApiClient::connect(&config)?;
    let mut events = client.session().events();
    let result = dispatch(&client, cli.command).await;

    if expired(&mut events) {
        return Err(CliError::SessionExpired);
    }
    result
}

async fn dispatch(client: &ApiClient<FileStore>, command: Command) -> Result<(), CliError> {
    match command {
        Command::Signup { name, username, email, password } => {
            require_anonymous(client)?;
            let form = SignupRequest { name, username, email, password };
            let session = client.signup(&form).await.map_err(|e| CliError::from_client(Operation::Signup, e))?;
            print_signed_in(&session.user);
            Ok(())
        }
        Command::Signin { email, password } => {
            require_anonymous(client)?;
            let form = SigninRequest { email, password };
            let session = client.signin(&form).await.map_err(|e| CliError::from_client(Operation::Signin, e))?;
            print_signed_in(&session.user);
            Ok(())
        }
        Command::Signout => {
            client.signout()?;
            println!("signed out");
            Ok(())
        }
        Command::Status => {
            let state = client.session().state();
            print_json(&serde_json::json!({
                "authenticated": state.is_authenticated,
                "user": state.user,
            }))
        }
        Command::Profile(profile) => run_profile(client, profile).await,
        Command::Post(post) => run_post(client, post).await,
        Command::Feed => {
            let posts = client.public_feed().await.map_err(|e| CliError::from_client(Operation::PublicFeed, e))?;
            print_json(&serde_json::to_value(posts)?)
        }
    }
}

async fn run_profile(client: &ApiClient<FileStore>, profile: ProfileCommand) -> Result<(), CliError> {
    require_authenticated(client)?;
    match profile.command {
        ProfileSubcommand::Show => {
            let user = client.get_profile().await.map_err(|e| CliError::from_client(Operation::GetProfile, e))?;
            print_json(&serde_json::to_value(user)?)
        }
        ProfileSubcommand::Update { name, username, email } => {
            let current = client.get_profile().await.map_err(|e| CliError::from_client(Operation::GetProfile, e))?;
            let mut update = ProfileUpdate::from_user(&current);
            if let Some(name) = name {
                update.name = name;
            }
            if let Some(username) = username {
                update.username = username;
            }
            if let Some(email) = email {
                update.email = email;
            }
            let user =
                client.update_profile(&update).await.map_err(|e| CliError::from_client(Operation::UpdateProfile, e))?;
            print_json(&serde_json::to_value(user)?)
        }
    }
}

async fn run_post(client: &ApiClient<FileStore>, post: PostCommand) -> Result<(), CliError> {
    require_authenticated(client)?;
    match post.command {
        PostSubcommand::Create { content } => {
            let created =
                client.create_post(&content).await.map_err(|e| CliError::from_client(Operation::CreatePost, e))?;
            print_json(&serde_json::to_value(created)?)
        }
        PostSubcommand::List => {
            let posts = client.list_posts().await.map_err(|e| CliError::from_client(Operation::ListPosts, e))?;
            print_json(&serde_json::to_value(posts)?)
        }
        PostSubcommand::Mine => {
            let posts =
                client.list_user_posts().await.map_err(|e| CliError::from_client(Operation::ListUserPosts, e))?;
            print_json(&serde_json::to_value(posts)?)
        }
    }
}

fn require_authenticated(client: &ApiClient<FileStore>) -> Result<(), CliError> {
    if client.session().is_authenticated() {
        return Ok(());
    }
    Err(CliError::NotSignedIn)
}

fn require_anonymous(client: &ApiClient<FileStore>) -> Result<(), CliError> {
    match client.session().current_user() {
        Some(user) => Err(CliError::AlreadySignedIn(user.username)),
        None => Ok(()),
    }
}

fn expired(events: &mut broadcast::Receiver<AuthEvent>) -> bool {
    let mut expired = false;
    while let Ok(event) = events.try_recv() {
        tracing::debug!(?event, "auth event");
        expired |= event == AuthEvent::Expired;
    }
    expired
}

fn print_signed_in(user: &User) {
    println!("signed in as {} (@{})", user.name, user.username);
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
