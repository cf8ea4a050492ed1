use clap::{Parser, Subcommand};
use contracts_client::{ContractStatus, RiskLevel};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "contracts", version, about = "Upload, browse and query your contracts")]
pub struct Args {
    /// Backend base URL (overrides CONTRACTS_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Where the login session is kept (overrides CONTRACTS_SESSION_FILE)
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,

    /// Log more (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and remember the session
    Login(CredentialArgs),
    /// Create an account and log in
    Signup(CredentialArgs),
    /// Forget the stored session
    Logout,
    /// Show who is logged in
    Whoami,
    /// List contracts with optional filters
    List(ListArgs),
    /// Show one contract in detail
    Show {
        id: String,
    },
    /// Upload one or more contract files (pdf, doc, docx, txt)
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Ask a question about your contracts
    Ask {
        question: Option<String>,
        /// Print example questions and exit
        #[arg(long)]
        examples: bool,
    },
}

#[derive(clap::Args, Debug)]
pub struct CredentialArgs {
    #[arg(short, long)]
    pub username: String,
    /// Read from stdin when omitted
    #[arg(short, long)]
    pub password: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Case-insensitive match on contract name or parties
    #[arg(short, long, default_value = "")]
    pub search: String,
    /// Active, Expired or "Renewal Due"
    #[arg(long, value_parser = parse_status)]
    pub status: Option<ContractStatus>,
    /// Low, Medium or High
    #[arg(long, value_parser = parse_risk)]
    pub risk: Option<RiskLevel>,
    #[arg(short, long, default_value_t = 1)]
    pub page: usize,
}

fn parse_status(raw: &str) -> Result<ContractStatus, String> {
    raw.parse().map_err(|e: contracts_client::ClientError| e.to_string())
}

fn parse_risk(raw: &str) -> Result<RiskLevel, String> {
    raw.parse().map_err(|e: contracts_client::ClientError| e.to_string())
}
