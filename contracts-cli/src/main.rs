mod cli;
mod render;

use anyhow::{Context, bail};
use clap::Parser;
use contracts_client::{
    ClientConfig, ClientError, ContractsGateway, Credentials, EXAMPLE_QUESTIONS, FileHandle,
    FileSessionStorage, HttpGateway, ListingViewModel, SessionStore, UploadSession,
};
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Args, Command, CredentialArgs, ListArgs};

/// Initialize tracing on stderr; `LOG_FORMAT` selects `pretty`, `json` or the default compact output.
fn init_tracing(verbose: u8) {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("contracts_cli={0},contracts_client={0}", default_level).into()
    });

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Everything a command needs: settings, the restored session and a gateway carrying its token.
struct App {
    config: ClientConfig,
    store: SessionStore,
    gateway: HttpGateway,
}

impl App {
    async fn start(args: &Args) -> anyhow::Result<Self> {
        let mut config = ClientConfig::from_env();
        if let Some(api_url) = &args.api_url {
            config = config.with_api_url(api_url.clone());
        }
        if let Some(session_file) = &args.session_file {
            config = config.with_session_file(session_file.clone());
        }
        debug!(
            api_url = %config.api_url,
            session_file = %config.session_file.display(),
            "Configuration loaded"
        );

        let storage = Arc::new(FileSessionStorage::new(config.session_file.clone()));
        let store = SessionStore::restore(storage)
            .await
            .context("Failed to read the stored session")?;
        let gateway =
            HttpGateway::from_config(&config).with_token(store.token().map(String::from));

        Ok(Self {
            config,
            store,
            gateway,
        })
    }

    fn require_login(&self) -> anyhow::Result<()> {
        if !self.store.is_authenticated() {
            bail!("Not logged in. Run `contracts login --username <name>` first.");
        }
        Ok(())
    }
}

fn read_password(credentials: &CredentialArgs) -> anyhow::Result<String> {
    if let Some(password) = &credentials.password {
        return Ok(password.clone());
    }

    eprint!("Password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("Password must not be empty");
    }
    Ok(password)
}

async fn login(app: &mut App, credentials: CredentialArgs, signup: bool) -> anyhow::Result<()> {
    let password = read_password(&credentials)?;
    let credentials = Credentials::new(credentials.username, password);

    let session = if signup {
        app.store.signup(&app.gateway, &credentials).await
    } else {
        app.store.login(&app.gateway, &credentials).await
    }?;
    println!("Logged in as {}", session.user.username);
    Ok(())
}

async fn list(app: &App, args: ListArgs) -> anyhow::Result<()> {
    app.require_login()?;

    let mut view = ListingViewModel::new();
    view.refresh(&app.gateway)
        .await
        .context("Unable to load contracts")?;
    view.set_search(args.search);
    view.set_status_filter(args.status);
    view.set_risk_filter(args.risk);
    if view.go_to_page(args.page) != args.page {
        warn!(
            requested = args.page,
            available = view.total_pages(),
            "Requested page is out of range"
        );
    }

    print!("{}", render::listing(&view));
    Ok(())
}

async fn show(app: &App, id: &str) -> anyhow::Result<()> {
    app.require_login()?;

    match app.gateway.get_contract(id).await {
        Ok(contract) => {
            print!("{}", render::contract_detail(&contract));
            Ok(())
        }
        Err(ClientError::NotFound(_)) => {
            bail!("Contract not found: no contract with id '{}'", id)
        }
        Err(e) => Err(e).context("Unable to load contract"),
    }
}

async fn upload(app: &App, paths: Vec<std::path::PathBuf>) -> anyhow::Result<()> {
    app.require_login()?;

    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        match FileHandle::from_path(path).await {
            Ok(file) => files.push(file),
            Err(e) => eprintln!("Skipping {}: {}", path.display(), e),
        }
    }

    let session = UploadSession::new(Arc::new(app.gateway.clone()));
    session.add_files(files);
    print!("{}", render::candidates(&session.candidates()));

    if !session.can_commit() {
        bail!("Nothing to upload");
    }

    let rejected = session
        .candidates()
        .iter()
        .filter(|candidate| !candidate.has_allowed_extension())
        .count();

    let report = session.commit_batch().await;
    print!("{}", render::batch_report(&report));
    if !report.failed.is_empty() {
        bail!("{} of {} uploads failed", report.failed.len(), report.attempted());
    }
    if rejected > 0 {
        bail!("{} file(s) skipped: only pdf, doc, docx and txt are accepted", rejected);
    }
    Ok(())
}

async fn ask(app: &App, question: Option<String>, examples: bool) -> anyhow::Result<()> {
    if examples {
        for example in EXAMPLE_QUESTIONS {
            println!("{}", example);
        }
        return Ok(());
    }
    app.require_login()?;

    let Some(question) = question else {
        bail!("Provide a question, or use --examples for ideas");
    };
    let response = contracts_client::ask(&app.gateway, &question).await?;
    print!("{}", render::answer(&response));
    Ok(())
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut app = App::start(&args).await?;

    match args.command {
        Command::Login(credentials) => login(&mut app, credentials, false).await,
        Command::Signup(credentials) => login(&mut app, credentials, true).await,
        Command::Logout => {
            app.store.logout().await?;
            println!("Logged out");
            Ok(())
        }
        Command::Whoami => {
            match app.store.current_user() {
                Some(user) => println!("{} ({})", user.username, app.config.api_url),
                None => println!("Not logged in"),
            }
            Ok(())
        }
        Command::List(list_args) => list(&app, list_args).await,
        Command::Show { id } => show(&app, &id).await,
        Command::Upload { files } => upload(&app, files).await,
        Command::Ask { question, examples } => ask(&app, question, examples).await,
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(args).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
