// rsa_chat/chat_app/src/main.rs

mod config;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chat_crypto::{
    CipherParameters, Dispatch, Directory, KeyPair, MessageEntry, MessageRouter, Recipient,
    BROADCAST,
};
use clap::Parser;
use clearscreen::clear;
use inquire::{Select, Text};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::AppConfig;

/// Terminal front end for the textbook RSA chat simulation.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); overrides the config file
    #[arg(long)]
    log_level: Option<String>,
}

const MENU_REGISTER: &str = "1. Register a participant";
const MENU_SWITCH: &str = "2. Switch active identity";
const MENU_SEND: &str = "3. Send encrypted message";
const MENU_KEYS: &str = "4. Show key info";
const MENU_LOG: &str = "5. Show chat log";
const MENU_OPEN: &str = "6. Decrypt last dispatch as its recipients";
const MENU_EXIT: &str = "7. Exit";

struct AppState {
    router: MessageRouter,
    directory: Directory,
    last_dispatch: Option<Dispatch>,
}

fn parse_level(level: &str) -> Result<tracing::Level> {
    level
        .parse()
        .with_context(|| format!("invalid log level '{}'", level))
}

fn init_tracing(level: tracing::Level) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(io::stderr)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stderr_layer).init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    init_tracing(parse_level(&config.log_level)?);
    tracing::info!(
        p = config.cipher.p,
        q = config.cipher.q,
        e = config.cipher.e,
        "starting chat"
    );

    let mut state = AppState {
        router: MessageRouter::with_parameters(config.cipher),
        directory: Directory::new(),
        last_dispatch: None,
    };

    loop {
        clear().unwrap_or_else(|e| eprintln!("Could not clear screen: {}", e));
        match state.router.active_identity() {
            Some(name) => println!("\n--- RSA Chat (active: {}) ---", name),
            None => println!("\n--- RSA Chat (nobody registered yet) ---"),
        }

        let options = vec![
            MENU_REGISTER,
            MENU_SWITCH,
            MENU_SEND,
            MENU_KEYS,
            MENU_LOG,
            MENU_OPEN,
            MENU_EXIT,
        ];
        let choice = match Select::new("What would you like to do?", options).prompt() {
            Ok(choice) => choice,
            Err(e) => {
                eprintln!("Could not read selection: {}. Exiting.", e);
                break;
            }
        };

        match choice {
            MENU_REGISTER => register(&mut state),
            MENU_SWITCH => switch_identity(&mut state),
            MENU_SEND => send(&mut state),
            MENU_KEYS => show_keys(&state),
            MENU_LOG => show_log(&state),
            MENU_OPEN => open_last(&state),
            MENU_EXIT => {
                println!("Bye.");
                break;
            }
            _ => unreachable!("unknown menu option selected"),
        }

        println!("\nPress Enter to continue...");
        io::stdout().flush()?;
        io::stdin().read_line(&mut String::new())?;
    }
    Ok(())
}

fn register(state: &mut AppState) {
    let name = Text::new("Enter your name:").prompt().unwrap_or_default();
    match state.router.register(&name, &mut state.directory) {
        Ok(registration) => {
            println!("✅ Keys generated. {}", describe(&registration.entry));
        }
        Err(e) => eprintln!("❌ {}", e),
    }
}

fn switch_identity(state: &mut AppState) {
    let names: Vec<String> = state
        .router
        .participants()
        .into_iter()
        .map(str::to_string)
        .collect();
    if names.is_empty() {
        println!("Register a participant first (option 1).");
        return;
    }
    let Ok(name) = Select::new("Act as:", names).prompt() else {
        return;
    };
    if let Err(e) = state.router.switch_identity(&name) {
        eprintln!("❌ {}", e);
    }
}

fn send(state: &mut AppState) {
    let Some(sender) = state.router.active_identity().map(str::to_string) else {
        println!("Register a participant first (option 1).");
        return;
    };

    let mut targets = vec![BROADCAST.to_string()];
    targets.extend(
        state
            .directory
            .names()
            .filter(|name| *name != sender)
            .map(str::to_string),
    );
    let Ok(target) = Select::new("Send to:", targets).prompt() else {
        return;
    };
    let recipient: Recipient = match target.parse() {
        Ok(recipient) => recipient,
        Err(never) => match never {},
    };

    let prompt = match &recipient {
        Recipient::Broadcast => "Encrypted message to everyone:".to_string(),
        Recipient::User(name) => format!("Encrypted message to {}:", name),
    };
    let text = Text::new(&prompt).prompt().unwrap_or_default();

    match state
        .router
        .send(&sender, &recipient, &text, &state.directory)
    {
        Ok(dispatch) => {
            println!("🔒 {}", describe(&dispatch.entry));
            for (name, cipher) in &dispatch.ciphertexts {
                println!("   for {}: {:?}", name, cipher.values());
            }
            state.last_dispatch = Some(dispatch);
        }
        Err(e) => eprintln!("❌ {}", e),
    }
}

fn show_keys(state: &AppState) {
    let Some(name) = state.router.active_identity() else {
        println!("No active identity.");
        return;
    };
    let Some(keys) = state.router.key_pair(name) else {
        return;
    };
    print_keys(name, keys, state.router.parameters());
}

fn print_keys(name: &str, keys: &KeyPair, params: &CipherParameters) {
    println!("\n--- Keys of {} ---", name);
    println!("  Parameters: p={}, q={}, e={}", params.p, params.q, params.e);
    let public = keys.public_key();
    let private = keys.private_key();
    println!("  Public  (e, n): (e={}, n={})", public.e, public.n);
    println!("  Private (d, n): (d={}, n={})", private.d, private.n);
    match (keys.export_public(), keys.export_private()) {
        (Ok(public_json), Ok(private_json)) => {
            println!("  Export public:  {}", public_json);
            println!("  Export private: {}", private_json);
        }
        (Err(e), _) | (_, Err(e)) => eprintln!("Could not export keys: {}", e),
    }
}

fn show_log(state: &AppState) {
    println!("\n--- Chat log ---");
    if state.router.log().is_empty() {
        println!("(empty)");
    }
    for entry in state.router.log() {
        println!("{}", describe(entry));
    }
}

fn open_last(state: &AppState) {
    let Some(dispatch) = &state.last_dispatch else {
        println!("Nothing sent yet.");
        return;
    };
    if dispatch.ciphertexts.is_empty() {
        println!("The last message had no recipients.");
    }
    for (name, cipher) in &dispatch.ciphertexts {
        match state.router.open(name, cipher) {
            Ok(plaintext) => println!("🔓 {} reads: {}", name, plaintext),
            Err(e) => eprintln!("❌ {} cannot read it: {}", name, e),
        }
    }
}

fn describe(entry: &MessageEntry) -> String {
    let local = entry.timestamp().with_timezone(&chrono::Local);
    let time = local.format("%H:%M:%S");
    match entry {
        MessageEntry::System { text, .. } => format!("[{}] * {}", time, text),
        MessageEntry::Chat {
            sender,
            plaintext,
            is_encrypted,
            recipient_label,
            ..
        } => {
            let lock = if *is_encrypted { "🔒 " } else { "" };
            format!("[{}] {}{} -> {}: {}", time, lock, sender, recipient_label, plaintext)
        }
    }
}
