mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use trustbridge_client::AppContext;
use trustbridge_contract::{DataSource, DemoBanner, DemoIndicator, Fetched};
use trustbridge_transfer::{
    validate_recipient, HistoryQuery, PaymentCommand, PaymentMethod, RecipientId, TransferRequest,
};
use trustbridge_wallet::{
    supported_wallet, InMemoryWalletBridge, WalletConnectionManager, SUPPORTED_WALLETS,
};

use crate::config::RuntimeConfig;

#[derive(Debug, Parser)]
#[command(author, version, about = "TrustBridge cross-border payment client")]
struct Cli {
    #[arg(long, global = true, default_value = "config/trustbridge.toml")]
    config: PathBuf,
    /// Keep no session on disk.
    #[arg(long, global = true)]
    detached: bool,
    /// Suppress the demo-mode banner.
    #[arg(long, global = true)]
    no_banner: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the forwarding proxy.
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
    Login {
        number: String,
        #[arg(long, default_value = "+62")]
        country_code: String,
    },
    Logout,
    Whoami,
    /// Price a transfer without sending it.
    Quote {
        amount: f64,
        #[arg(long, default_value = "USD")]
        from: String,
        #[arg(long, default_value = "IDR")]
        to: String,
        #[arg(long, default_value = "WALLET")]
        method: String,
    },
    Send {
        amount: f64,
        #[arg(long, default_value = "USD")]
        from: String,
        #[arg(long, default_value = "IDR")]
        to: String,
        #[arg(long, default_value = "WALLET")]
        method: String,
        #[arg(long = "name")]
        recipient_name: String,
        #[arg(long)]
        bank: Option<String>,
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        wallet_address: Option<String>,
    },
    Confirm {
        transfer_id: String,
        tx_hash: String,
    },
    Status {
        transfer_id: String,
    },
    Details {
        transfer_id: String,
    },
    History {
        #[arg(long, default_value_t = 5)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        method: Option<String>,
    },
    Transactions {
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    Stats {
        /// Aggregate the signed-in user's own history instead.
        #[arg(long)]
        mine: bool,
    },
    /// Save the transfer invoice as a PDF.
    Invoice {
        transfer_id: String,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    Rates,
    Tokens,
    BackendInfo,
    Wallet {
        #[command(subcommand)]
        command: WalletCommand,
    },
    /// Chat-style payment, e.g. `pay /pay 25 ADA --to addr_test1...`.
    Pay {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        #[arg(long)]
        to: String,
        #[arg(long, default_value = "IDR")]
        recipient_currency: String,
        #[arg(long)]
        wallet: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum WalletCommand {
    List,
    Connect { provider: String },
    Balance,
    Pay { recipient: String, amount: f64 },
    Disconnect,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = RuntimeConfig::load(&cli.config)?.with_env(|key| std::env::var(key).ok());

    match cli.command {
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.proxy.bind.clone());
            trustbridge_proxy::serve(&bind, config.proxy_config()?).await
        }
        command => {
            let context = AppContext::connect(config.context_settings(cli.detached)?).await?;
            let mut output = Output::new(cli.no_banner);
            let result = run(command, &context, &config, &mut output).await;
            output.finish();
            context.shutdown().await;
            result
        }
    }
}

async fn run(
    command: Command,
    context: &AppContext,
    config: &RuntimeConfig,
    output: &mut Output,
) -> Result<()> {
    let api = context.api();
    match command {
        Command::Serve { .. } => bail!("serve runs without a client context"),
        Command::Login {
            number,
            country_code,
        } => {
            let result = context.auth().login(&number, &country_code).await?;
            output.fetched(&result)
        }
        Command::Logout => {
            context.auth().logout().await?;
            output.json(&serde_json::json!({ "success": true }))
        }
        Command::Whoami => {
            let user = context.auth().current_user().await?;
            output.json(&user)
        }
        Command::Quote {
            amount,
            from,
            to,
            method,
        } => {
            ensure_positive(amount)?;
            let quote = api
                .calculate_transfer(PaymentMethod::from(method.as_str()), &from, amount, &to)
                .await;
            output.fetched(&quote)
        }
        Command::Send {
            amount,
            from,
            to,
            method,
            recipient_name,
            bank,
            account,
            wallet_address,
        } => {
            ensure_positive(amount)?;
            if recipient_name.trim().is_empty() {
                bail!("recipient name is required");
            }
            if let Some(address) = &wallet_address {
                validate_recipient(address)?;
            }
            let request = TransferRequest {
                payment_method: PaymentMethod::from(method.as_str()),
                sender_currency: from,
                sender_amount: amount,
                recipient_name,
                recipient_currency: to,
                recipient_bank: bank,
                recipient_account: account,
                recipient_wallet_address: wallet_address,
                whatsapp_number: signed_in_number(context).await?,
            };
            let initiation = api.initiate_transfer(&request).await;
            output.fetched(&initiation)
        }
        Command::Confirm {
            transfer_id,
            tx_hash,
        } => {
            let confirmation = api.confirm_payment(&transfer_id, &tx_hash).await;
            output.fetched(&confirmation)
        }
        Command::Status { transfer_id } => {
            let report = api.transfer_status(&transfer_id).await;
            output.fetched(&report)
        }
        Command::Details { transfer_id } => {
            let details = api.transfer_details(&transfer_id).await;
            output.fetched(&details)
        }
        Command::History {
            limit,
            offset,
            status,
            method,
        } => {
            let query = HistoryQuery {
                status,
                payment_method: method,
                ..HistoryQuery::page(limit, offset)
            };
            let history = api.transfer_history(&query).await;
            output.fetched(&history)
        }
        Command::Transactions { limit } => {
            let transactions = api.transaction_history(limit).await;
            output.fetched(&transactions)
        }
        Command::Stats { mine } => {
            if mine {
                output.fetched(&api.user_stats().await)
            } else {
                output.fetched(&api.transaction_stats().await)
            }
        }
        Command::Invoice {
            transfer_id,
            out_dir,
        } => {
            let invoice = api.download_invoice(&transfer_id).await;
            output.record(invoice.source());
            let invoice = invoice.into_inner();
            tokio::fs::create_dir_all(&out_dir)
                .await
                .with_context(|| format!("failed to create {}", out_dir.display()))?;
            let path = out_dir.join(&invoice.file_name);
            tokio::fs::write(&path, &invoice.bytes)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), bytes = invoice.bytes.len(), "invoice saved");
            output.json(&serde_json::json!({
                "file": path.display().to_string(),
                "contentType": invoice.content_type,
                "bytes": invoice.bytes.len(),
            }))
        }
        Command::Rates => output.fetched(&api.exchange_rates().await),
        Command::Tokens => output.fetched(&api.cardano_tokens().await),
        Command::BackendInfo => output.fetched(&api.backend_info().await),
        Command::Wallet { command } => run_wallet(command, context, config, output).await,
        Command::Pay {
            text,
            to,
            recipient_currency,
            wallet,
        } => {
            let payment = PaymentCommand::parse(&text.join(" "))?;
            let recipient = validate_recipient(&to)?;

            match recipient {
                RecipientId::CardanoAddress(address) if payment.currency == "ADA" => {
                    let manager = wallet_manager(context, config);
                    ensure_wallet(&manager, wallet.as_deref()).await?;
                    let tx_hash = manager.send_transaction(&address, payment.amount).await?;
                    output.json(&serde_json::json!({
                        "amount": payment.amount,
                        "currency": payment.currency,
                        "recipient": address,
                        "txHash": tx_hash,
                        "balance": manager.balance(),
                    }))
                }
                recipient => {
                    let (wallet_address, whatsapp_number) = match &recipient {
                        RecipientId::CardanoAddress(address) => (Some(address.clone()), None),
                        RecipientId::Phone(number) => (None, Some(number.clone())),
                    };
                    let request = TransferRequest {
                        payment_method: PaymentMethod::Wallet,
                        sender_currency: payment.currency,
                        sender_amount: payment.amount,
                        recipient_name: recipient.as_str().to_string(),
                        recipient_currency,
                        recipient_bank: None,
                        recipient_account: None,
                        recipient_wallet_address: wallet_address,
                        whatsapp_number,
                    };
                    output.fetched(&api.initiate_transfer(&request).await)
                }
            }
        }
    }
}

async fn run_wallet(
    command: WalletCommand,
    context: &AppContext,
    config: &RuntimeConfig,
    output: &mut Output,
) -> Result<()> {
    match command {
        WalletCommand::List => output.json(&SUPPORTED_WALLETS),
        WalletCommand::Connect { provider } => {
            if supported_wallet(&provider).is_none() {
                bail!("unsupported wallet {provider}");
            }
            let manager = wallet_manager(context, config);
            let snapshot = manager.connect(&provider).await?;
            output.json(&snapshot)
        }
        WalletCommand::Balance => {
            let manager = wallet_manager(context, config);
            manager.restore_session().await;
            output.json(&manager.snapshot())
        }
        WalletCommand::Pay { recipient, amount } => {
            let address = match validate_recipient(&recipient)? {
                RecipientId::CardanoAddress(address) => address,
                RecipientId::Phone(number) => {
                    bail!("{number} is a phone number; use `send` for fiat transfers")
                }
            };
            let manager = wallet_manager(context, config);
            ensure_wallet(&manager, None).await?;
            let tx_hash = manager.send_transaction(&address, amount).await?;
            output.json(&serde_json::json!({
                "txHash": tx_hash,
                "balance": manager.balance(),
            }))
        }
        WalletCommand::Disconnect => {
            let manager = wallet_manager(context, config);
            manager.disconnect().await;
            output.json(&manager.snapshot())
        }
    }
}

fn wallet_manager(context: &AppContext, config: &RuntimeConfig) -> WalletConnectionManager {
    WalletConnectionManager::new(
        Arc::new(InMemoryWalletBridge::demo()),
        context.credentials().clone(),
    )
    .with_refresh_interval(config.wallet_refresh_interval())
}

async fn ensure_wallet(manager: &WalletConnectionManager, provider: Option<&str>) -> Result<()> {
    if let Some(provider) = provider {
        manager.connect(provider).await?;
        return Ok(());
    }
    manager
        .restore_session()
        .await
        .map(|_| ())
        .ok_or_else(|| anyhow!("no wallet connected; run `trustbridge wallet connect <provider>`"))
}

async fn signed_in_number(context: &AppContext) -> Result<Option<String>> {
    Ok(context
        .auth()
        .current_user()
        .await?
        .and_then(|user| user.whatsapp_number))
}

fn ensure_positive(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        bail!("amount must be a positive number, got {amount}");
    }
    Ok(())
}

/// Prints results as JSON on stdout and the demo notice on stderr.
struct Output {
    banner: DemoBanner,
    source: Option<DataSource>,
}

impl Output {
    fn new(hide_banner: bool) -> Self {
        let mut banner = DemoBanner::new();
        if hide_banner {
            banner.dismiss();
        }
        Self {
            banner,
            source: None,
        }
    }

    fn record(&mut self, source: DataSource) {
        if self.source != Some(DataSource::Simulated) {
            self.source = Some(source);
        }
    }

    fn fetched<T: Serialize>(&mut self, fetched: &Fetched<T>) -> Result<()> {
        self.record(fetched.source());
        self.json(fetched.get())
    }

    fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
        println!("{rendered}");
        Ok(())
    }

    fn finish(&self) {
        let Some(source) = self.source else {
            return;
        };
        if let Some(text) = self.banner.render(source) {
            eprintln!("{text}");
        }
        eprintln!("[{}]", DemoIndicator::for_source(source).label());
    }
}
