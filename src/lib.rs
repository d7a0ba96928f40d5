pub mod chat;
pub mod cli;
pub mod content;
pub mod llm;
pub mod models;
pub mod reader;
pub mod render;
pub mod server;
pub mod storage;

use chat::ChatAssistant;
use cli::{ Args, Command };
use content::Library;
use llm::{ AiClient, LlmConfig };
use log::info;
use models::{ Language, Role };
use reader::Reader;
use render::terminal::{ format_nodes, Style };
use server::Server;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Chat Model: {}", args.chat_model);
    info!("Chat Base URL: {}", args.chat_base_url.as_deref().unwrap_or("rllm default"));
    info!("API Key: {}", if args.api_key().is_some() { "set" } else { "unset" });
    info!("Data Dir: {}", args.data_dir);
    info!("Chapters: {}", args.chapters_path.as_deref().unwrap_or("built-in"));
    info!("Max Attachment Bytes: {}", args.max_attachment_bytes);
    info!("-------------------------");

    let library = Arc::new(Library::open(args.chapters_path.as_deref())?);
    let client = Arc::new(
        AiClient::from_config(
            &(LlmConfig {
                api_key: args.api_key(),
                model: Some(args.chat_model.clone()),
                base_url: args.chat_base_url.clone(),
            })
        )
    );
    let storage = storage::open_storage(&args.data_dir);

    match args.command.clone().unwrap_or(Command::Serve) {
        Command::Serve => {
            let reader = Arc::new(Reader::new(library, Arc::clone(&client)));
            let chat = Arc::new(ChatAssistant::new(storage, &client, args.max_attachment_bytes));
            let server = Server::new(args.server_addr.clone(), reader, chat);
            server.run().await?;
        }
        Command::Chapters => {
            for section in library.sections() {
                println!("{:?}", section.category);
                for chapter in section.chapters {
                    println!("  {:<18} {} ({})", chapter.id, chapter.title, chapter.read_time);
                }
            }
        }
        Command::Read { id, lang } => {
            let language: Language = lang.parse()?;
            let reader = Reader::new(library, client);
            let view = reader.open(&id, language).await?;
            let style = Style::detect();
            println!("{}  ·  {:?}  ·  {}\n", view.title, view.category, view.read_time);
            println!("{}", format_nodes(&view.nodes, style));
        }
        Command::Ask { text, attach, lang } => {
            let language: Language = lang.parse()?;
            let chat = ChatAssistant::new(storage, &client, args.max_attachment_bytes);
            let attachment = match attach {
                Some(path) => Some(chat.attach_file(Path::new(&path))?),
                None => None,
            };
            let exchange = chat.send(&text, attachment, language).await?;
            println!("{}", exchange.reply.text);
        }
        Command::History => {
            let chat = ChatAssistant::new(storage, &client, args.max_attachment_bytes);
            for message in chat.messages() {
                let who = match message.role {
                    Role::User => "You",
                    Role::Model => "Assistant",
                };
                println!("[{}] {}: {}", message.timestamp.format("%Y-%m-%d %H:%M"), who, message.text);
            }
        }
        Command::Clear { yes } => {
            let chat = ChatAssistant::new(storage, &client, args.max_attachment_bytes);
            if !chat.clear(yes) {
                return Err("Refusing to clear the chat history without --yes".into());
            }
            println!("Chat history cleared.");
        }
    }

    Ok(())
}
