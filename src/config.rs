//! Configuration (spec §6 "Environment / configuration", §9 explicit
//! constructor/DI note). Layered the way the teacher's `Config::load()`
//! does: CLI flags via `clap`, falling back to environment variables via
//! `#[arg(env = ...)]`, falling back to hardcoded operational defaults.
//! Secret material (Mongo URI, ledger private key, signer PEM paths) has
//! no default: its absence is a [`ConfigError`] and the process exits
//! non-zero before binding a listener (§6 "Exit codes").

use crate::error::ConfigError;
use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

#[derive(Parser, Debug)]
#[command(name = "craftid-anchor", about = "CraftID anchoring pipeline")]
pub struct CliArgs {
    #[arg(long, env = "HOST")]
    host: Option<IpAddr>,
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    #[arg(long, env = "WEB3_RPC_URL")]
    web3_rpc_url: Option<String>,
    #[arg(long, env = "ANCHOR_CONTRACT_ADDRESS")]
    anchor_contract_address: Option<String>,
    #[arg(long, env = "ANCHORER_PRIVATE_KEY")]
    anchorer_private_key: Option<String>,
    #[arg(long, env = "CHAIN_ID")]
    chain_id: Option<u64>,
    #[arg(long, env = "WEB3_GAS_LIMIT")]
    web3_gas_limit: Option<u64>,
    #[arg(long, env = "WEB3_RECEIPT_TIMEOUT")]
    web3_receipt_timeout: Option<u64>,

    #[arg(long, env = "SIGNER_KEY_PATH")]
    signer_key_path: Option<PathBuf>,
    #[arg(long, env = "PLATFORM_PUBKEY_PATH")]
    platform_pubkey_path: Option<PathBuf>,

    #[arg(long, env = "MONGO_URI")]
    mongo_uri: Option<String>,
    #[arg(long, env = "DB_NAME")]
    db_name: Option<String>,
    #[arg(long, env = "ANCHOR_QUEUE_COLL")]
    anchor_queue_coll: Option<String>,

    #[arg(long, env = "VISIBILITY_TIMEOUT_SECONDS")]
    visibility_timeout_seconds: Option<u64>,
    #[arg(long, env = "MAX_RETRIES")]
    max_retries: Option<i32>,
    #[arg(long, env = "BATCH_LIMIT")]
    batch_limit: Option<u32>,
    #[arg(long, env = "ACTIVE_POLL_INTERVAL")]
    active_poll_interval: Option<u64>,
    #[arg(long, env = "IDLE_POLL_INTERVAL")]
    idle_poll_interval: Option<u64>,
    #[arg(long, env = "IDLE_THRESHOLD_MINUTES")]
    idle_threshold_minutes: Option<u64>,

    #[arg(long, env = "DEFAULT_SALT")]
    default_salt: Option<String>,
}

/// Fully resolved configuration, ready to construct every injected
/// dependency (store, ledger client, signer).
pub struct Config {
    pub host: IpAddr,
    pub port: u16,

    pub web3_rpc_url: Url,
    pub anchor_contract_address: Address,
    pub anchorer_signer: PrivateKeySigner,
    pub chain_id: u64,
    pub web3_gas_limit: u64,
    pub web3_receipt_timeout: Duration,

    pub signer_key_path: PathBuf,
    pub platform_pubkey_path: PathBuf,

    pub mongo_uri: String,
    pub db_name: String,
    pub anchor_queue_coll: String,

    pub visibility_timeout: Duration,
    pub max_retries: i32,
    pub batch_limit: u32,
    pub active_poll_interval: Duration,
    pub idle_poll_interval: Duration,
    pub idle_threshold: Duration,

    pub default_salt: Option<String>,
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    value.filter(|v| !v.is_empty()).ok_or(ConfigError::MissingVar(name))
}

impl Config {
    /// Parses CLI args/environment and validates every required field.
    /// Any missing or malformed required value is a [`ConfigError`];
    /// callers should exit non-zero on `Err` before binding a listener.
    pub fn load() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();

        let web3_rpc_url = required(args.web3_rpc_url, "WEB3_RPC_URL")?;
        let web3_rpc_url = Url::from_str(&web3_rpc_url).map_err(|e| ConfigError::InvalidValue {
            name: "WEB3_RPC_URL",
            reason: e.to_string(),
        })?;

        let anchor_contract_address =
            required(args.anchor_contract_address, "ANCHOR_CONTRACT_ADDRESS")?;
        let anchor_contract_address =
            Address::from_str(&anchor_contract_address).map_err(|e| ConfigError::InvalidValue {
                name: "ANCHOR_CONTRACT_ADDRESS",
                reason: e.to_string(),
            })?;

        let anchorer_private_key = required(args.anchorer_private_key, "ANCHORER_PRIVATE_KEY")?;
        let anchorer_signer = load_private_key(&anchorer_private_key)?;

        let signer_key_path = args
            .signer_key_path
            .ok_or(ConfigError::MissingVar("SIGNER_KEY_PATH"))?;
        let platform_pubkey_path = args
            .platform_pubkey_path
            .ok_or(ConfigError::MissingVar("PLATFORM_PUBKEY_PATH"))?;

        let mongo_uri = required(args.mongo_uri, "MONGO_URI")?;
        let db_name = required(args.db_name, "DB_NAME")?;

        Ok(Self {
            host: args.host.unwrap_or_else(default_host),
            port: args.port.unwrap_or_else(default_port),

            web3_rpc_url,
            anchor_contract_address,
            anchorer_signer,
            chain_id: args.chain_id.unwrap_or(1),
            web3_gas_limit: args.web3_gas_limit.unwrap_or(200_000),
            web3_receipt_timeout: Duration::from_secs(args.web3_receipt_timeout.unwrap_or(120)),

            signer_key_path,
            platform_pubkey_path,

            mongo_uri,
            db_name,
            anchor_queue_coll: args
                .anchor_queue_coll
                .unwrap_or_else(|| "anchor_queue".to_string()),

            visibility_timeout: Duration::from_secs(
                args.visibility_timeout_seconds.unwrap_or(300),
            ),
            max_retries: args.max_retries.unwrap_or(5),
            batch_limit: args.batch_limit.unwrap_or(5),
            active_poll_interval: Duration::from_secs(args.active_poll_interval.unwrap_or(10)),
            idle_poll_interval: Duration::from_secs(args.idle_poll_interval.unwrap_or(300)),
            idle_threshold: Duration::from_secs(
                args.idle_threshold_minutes.unwrap_or(30) * 60,
            ),

            default_salt: args.default_salt,
        })
    }
}

/// `ANCHORER_PRIVATE_KEY` may be a `0x`-prefixed hex key directly, or a
/// path to a file containing one — mirrors the teacher's
/// `EvmPrivateKey`/`LiteralOrEnv` flexibility without the literal-or-env
/// ambiguity this spec doesn't have.
fn load_private_key(value: &str) -> Result<PrivateKeySigner, ConfigError> {
    let raw = if value.starts_with("0x") || value.len() == 64 {
        value.to_string()
    } else {
        std::fs::read_to_string(value)
            .map_err(|_| ConfigError::UnreadableKey)?
            .trim()
            .to_string()
    };
    PrivateKeySigner::from_str(&raw).map_err(|_| ConfigError::InvalidValue {
        name: "ANCHORER_PRIVATE_KEY",
        reason: "not a valid secp256k1 private key".to_string(),
    })
}
