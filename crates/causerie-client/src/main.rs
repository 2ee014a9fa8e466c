//! Terminal front end for the Causerie chat client.
//!
//! Plain lines are sent to the assistant; lines starting with `/` are
//! commands (`/help` lists them). Notices and replies are printed as the
//! client emits them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use causerie_client::{
    AutoConfirm, ChatClient, ClientConfig, ClientEvent, Confirm, HistoryFilter,
};
use causerie_net::{AuthClient, WebhookClient};
use causerie_shared::constants::APP_NAME;
use causerie_shared::markup::strip_markup;
use causerie_shared::{ConversationId, Credentials, MessageId, Sender, SignupForm};
use causerie_store::Storage;
use chrono::Utc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

const HELP: &str = "\
Commandes :
  /new                      nouvelle conversation
  /load <id>                ouvrir une conversation
  /clear                    effacer la conversation affichée
  /history [texte] [all|today|week|month]
  /search <texte>           recherche sur le serveur
  /pin <message-id>         épingler / désépingler
  /fav <conversation-id>    favori / retirer des favoris
  /tags <id> <a,b,c>        étiquettes d'une conversation
  /delete <id>              supprimer une conversation
  /attach <fichier>         joindre un fichier (envoyé au prochain message)
  /discard                  retirer la pièce jointe
  /websearch                activer / désactiver la recherche web
  /login <email> <mot-de-passe>
  /signup <nom> <email> <mot-de-passe> <confirmation>
  /verify <jeton>
  /logout
  /export data|settings|conv <id> [dossier]
  /import <fichier>
  /sound on|off   /dark on|off   /font small|medium|large
  /wipe                     effacer toutes les données
  /quit";

type Lines = Arc<Mutex<mpsc::UnboundedReceiver<String>>>;

/// Reads yes/no answers from the same stdin stream as commands.
struct TerminalConfirm {
    lines: Lines,
}

#[async_trait]
impl Confirm for TerminalConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        println!("{prompt} (o/n)");
        match self.lines.lock().await.recv().await {
            Some(answer) => matches!(answer.trim().to_lowercase().as_str(), "o" | "oui" | "y" | "yes"),
            None => false,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    causerie_client::init_tracing();

    let config = ClientConfig::from_env();
    info!(app = APP_NAME, ?config, "Loaded configuration");
    let ephemeral = std::env::args().any(|a| a == "--ephemeral");

    let lines = spawn_stdin_reader();
    let confirm: Arc<dyn Confirm> = if std::env::args().any(|a| a == "--yes") {
        Arc::new(AutoConfirm(true))
    } else {
        Arc::new(TerminalConfirm {
            lines: lines.clone(),
        })
    };

    let client = if ephemeral {
        let chat = WebhookClient::new(&config.webhook_config())?;
        let auth = AuthClient::new(&config.auth_api_url, config.request_timeout)?;
        ChatClient::new(config, Storage::in_memory(), Arc::new(chat), Arc::new(auth), confirm)?
    } else {
        ChatClient::connect(config, confirm)?
    };

    spawn_event_printer(client.clone());

    match client.restore_session().await? {
        Some(user) => println!("Session restaurée pour {}.", user.name),
        None => {
            client.create_new_conversation()?;
            client.initialize_chat(None)?;
            println!("Non connecté. /login pour vous identifier, /help pour l'aide.");
        }
    }

    loop {
        let Some(line) = lines.lock().await.recv().await else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            break;
        }
        // Failures are already reported through notices.
        if let Err(e) = run_line(&client, line).await {
            debug!(error = %e, "command failed");
        }
    }

    client.save_current_conversation()?;
    info!("bye");
    Ok(())
}

fn spawn_stdin_reader() -> Lines {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut buf = String::new();
        loop {
            buf.clear();
            match stdin.read_line(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    if tx.send(buf.clone()).is_err() {
                        break;
                    }
                }
            }
        }
    });
    Arc::new(Mutex::new(rx))
}

fn spawn_event_printer(client: ChatClient) {
    let mut events = client.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ClientEvent::Notice { message, kind, .. } => {
                    println!("[{}] {message}", kind.as_str());
                }
                ClientEvent::PlaySound => print!("\x07"),
                ClientEvent::MessageAdded { id } => print_message(&client, &id),
                ClientEvent::LateReply { conversation_id } => {
                    println!("(réponse reçue dans la conversation {conversation_id})");
                }
                ClientEvent::ConnectionChanged { status } => debug!(status = status.label(), "connection"),
                _ => {}
            }
        }
    });
}

fn print_message(client: &ChatClient, id: &MessageId) {
    let Ok(snapshot) = client.snapshot() else {
        return;
    };
    let Some(message) = snapshot.messages.iter().find(|m| &m.id == id) else {
        return;
    };
    if message.sender != Sender::Bot {
        println!("  {} (pièce jointe prête) [{}]", message.text, message.id);
        return;
    }
    println!("\n{}\n", strip_markup(&message.text));
    for (i, question) in message.suggested_questions.iter().enumerate() {
        println!("  {}. {question}", i + 1);
    }
}

async fn run_line(client: &ChatClient, line: &str) -> anyhow::Result<()> {
    if !line.starts_with('/') {
        client.send_message(line).await?;
        return Ok(());
    }

    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();
    let arg = |i: usize| args.get(i).copied().context("argument manquant, voir /help");

    match command {
        "/help" => println!("{HELP}"),
        "/new" => {
            let id = client.create_new_conversation()?;
            println!("Conversation {id}");
        }
        "/load" => client.load_conversation(&ConversationId::from(arg(0)?))?,
        "/clear" => {
            client.clear_chat().await?;
        }
        "/history" => {
            let (filter, query): (HistoryFilter, Vec<&str>) = match args.last().map(|a| a.parse::<HistoryFilter>()) {
                Some(Ok(filter)) => (filter, args[..args.len() - 1].to_vec()),
                _ => (HistoryFilter::All, args.clone()),
            };
            let now = Utc::now();
            for c in client.search_history(&query.join(" "), filter)? {
                let star = if c.is_favorite { "★" } else { " " };
                println!(
                    "{star} {}  {}  ({})",
                    c.id,
                    c.title,
                    causerie_client::history::relative_time(c.created_at, now)
                );
            }
        }
        "/search" => {
            for summary in client.search_remote(&args.join(" ")).await? {
                println!("  {}  {}", summary.id, summary.title);
            }
        }
        "/pin" => {
            client.toggle_pin_message(&MessageId::from(arg(0)?))?;
        }
        "/fav" => {
            client.toggle_favorite(&ConversationId::from(arg(0)?))?;
        }
        "/tags" => {
            let tags = arg(1)?.split(',').map(str::to_string).collect();
            client
                .set_conversation_tags(&ConversationId::from(arg(0)?), tags)
                .await?;
        }
        "/delete" => {
            client
                .delete_conversation(&ConversationId::from(arg(0)?))
                .await?;
        }
        "/attach" => {
            client.attach_file(Path::new(arg(0)?)).await?;
        }
        "/discard" => {
            client.discard_preview()?;
        }
        "/websearch" => {
            let active = client.toggle_web_search()?;
            println!("Recherche web : {}", if active { "activée" } else { "désactivée" });
        }
        "/login" => {
            client
                .login(&Credentials {
                    email: arg(0)?.to_string(),
                    password: arg(1)?.to_string(),
                })
                .await?;
        }
        "/signup" => {
            client
                .signup(&SignupForm {
                    username: arg(0)?.to_string(),
                    email: arg(1)?.to_string(),
                    password: arg(2)?.to_string(),
                    confirm_password: arg(3)?.to_string(),
                })
                .await?;
        }
        "/verify" => {
            client.verify_email(arg(0)?).await?;
        }
        "/logout" => client.logout().await?,
        "/export" => {
            let path = match arg(0)? {
                "data" => client.export_data(&export_dir(args.get(1)))?,
                "settings" => client.export_settings(&export_dir(args.get(1)))?,
                "conv" => {
                    client
                        .export_conversation(&ConversationId::from(arg(1)?), &export_dir(args.get(2)))
                        .await?
                }
                other => anyhow::bail!("export inconnu : {other}"),
            };
            println!("{}", path.display());
        }
        "/import" => {
            client.import_data(Path::new(arg(0)?)).await?;
        }
        "/sound" => client.set_sound_enabled(arg(0)? == "on")?,
        "/dark" => client.set_dark_mode(arg(0)? == "on")?,
        "/font" => client.set_font_size(arg(0)?.parse().map_err(anyhow::Error::msg)?)?,
        "/wipe" => {
            client.clear_all_data().await?;
        }
        other => println!("Commande inconnue : {other} (voir /help)"),
    }
    Ok(())
}

fn export_dir(arg: Option<&&str>) -> PathBuf {
    arg.map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."))
}
