use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use slide_chatgpt::{ApiLog, ChatCompletionsClient, ChatSettings};
use slide_common::{DeckGenerator, ImageResult, ImageSearch, KeyStore, SearchCursor, Slide};
use slide_core::config::Config;
use slide_core::{render_instructions, DocumentSession, HttpImageFetcher, MemoryHost, OperationLog};

pub mod logging;

#[derive(Parser, Debug)]
#[command(name = "slide")]
#[command(about = "Generate presentation decks and insert them into a document")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,

    /// Config file (TOML or JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override model (e.g., mistral-large-latest, mistral-small-latest)
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Language code for generated text and image search
    #[arg(long, global = true)]
    pub language: Option<String>,
}

/// Which host capabilities the in-memory document offers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum HostKind {
    /// Slide automation available
    Automation,
    /// Text insertion only
    Manual,
    /// No host integration loaded
    Detached,
}

impl HostKind {
    fn build(self) -> MemoryHost {
        match self {
            HostKind::Automation => MemoryHost::new(),
            HostKind::Manual => MemoryHost::new().without_automation(),
            HostKind::Detached => MemoryHost::detached(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KeyName {
    Mistral,
    Unsplash,
    Pexels,
}

impl KeyName {
    fn store_name(self) -> &'static str {
        match self {
            KeyName::Mistral => KeyStore::MISTRAL_KEY,
            KeyName::Unsplash => KeyStore::UNSPLASH_KEY,
            KeyName::Pexels => KeyStore::PEXELS_KEY,
        }
    }

    fn for_provider(provider: &str) -> Self {
        if provider.eq_ignore_ascii_case("pexels") {
            KeyName::Pexels
        } else {
            KeyName::Unsplash
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a deck and insert it into a document
    Generate {
        /// Slide generation prompt
        #[arg(required_unless_present = "deck")]
        prompt: Option<String>,
        /// Insert a deck read from a JSON file instead of calling the model
        #[arg(long, conflicts_with = "prompt")]
        deck: Option<PathBuf>,
        /// Attach the first stock photo found for every slide
        #[arg(long)]
        images: bool,
        #[arg(long, value_enum, default_value_t = HostKind::Automation)]
        host: HostKind,
        /// Write the deck as JSON before inserting it
        #[arg(long)]
        save_deck: Option<PathBuf>,
        /// Print the operation log as JSON
        #[arg(long)]
        log_json: bool,
        /// Print the model API request/response log as JSON
        #[arg(long)]
        api_log_json: bool,
    },
    /// Suggest image search keywords for a piece of slide text
    Keywords {
        text: String,
        /// Print the model API request/response log as JSON
        #[arg(long)]
        api_log_json: bool,
    },
    /// Search stock photos
    Images {
        keywords: String,
        /// unsplash or pexels
        #[arg(long)]
        provider: Option<String>,
        /// Results per page (defaults to the provider's own page size)
        #[arg(long)]
        page_size: Option<u32>,
        /// Number of pages to walk through
        #[arg(long, default_value = "1")]
        pages: u32,
    },
    /// Insert a deck, then replace the image on one of its slides
    AttachImage {
        /// Deck JSON file
        deck: PathBuf,
        /// Slide number, starting at 1
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        slide: u32,
        #[arg(long)]
        url: String,
        #[arg(long)]
        log_json: bool,
    },
    /// Print the effective configuration, API keys left out
    Config {
        /// Write it to this file (.toml or .json) instead of printing it
        #[arg(long)]
        write: Option<PathBuf>,
    },
    /// Manage stored API keys
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum KeyAction {
    Save { name: KeyName, value: String },
    Show { name: KeyName },
    Remove { name: KeyName },
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.debug)?;
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Generate {
            prompt,
            deck,
            images,
            host,
            save_deck,
            log_json,
            api_log_json,
        } => {
            let generator = if prompt.is_some() || images {
                Some(chat_client(&config).await?)
            } else {
                None
            };
            let prepared = prepare_deck(&config, generator.as_ref(), prompt, deck, images).await;
            if let (true, Some(client)) = (api_log_json, &generator) {
                print_api_log(client.log())?;
            }
            let slides = prepared?;
            if let Some(path) = save_deck {
                tokio::fs::write(&path, serde_json::to_string_pretty(&slides)?).await?;
                println!("Deck saved to: {}", path.display());
            }
            insert(&config, host, &slides, log_json).await?;
        }
        Commands::Keywords { text, api_log_json } => {
            let client = chat_client(&config).await?;
            let keywords = client.keywords_for_image(&text).await;
            if api_log_json {
                print_api_log(client.log())?;
            }
            println!("{}", keywords?);
        }
        Commands::Images {
            keywords,
            provider,
            page_size,
            pages,
        } => {
            let search = image_search(&config, provider.as_deref()).await?;
            let page_size = page_size_for(page_size, config.images.page_size, search.as_ref());
            let (results, mut cursor) = search.search(&keywords, page_size).await?;
            print_results(search.provider(), &cursor, &results);
            for _ in 1..pages {
                let results = search.next_page(&mut cursor).await?;
                print_results(search.provider(), &cursor, &results);
            }
        }
        Commands::AttachImage {
            deck,
            slide,
            url,
            log_json,
        } => {
            let slides = load_deck(&deck).await?;
            let host = MemoryHost::new();
            let session = open_session(&host, &config)?;
            session.insert_deck(&slides).await?;

            let outcome = session.update_slide_image(slide as usize - 1, &url).await;
            if log_json {
                print_log(session.log())?;
            }
            let report = outcome?;
            println!(
                "Slide {slide}: removed {} image(s), image at ({:.0}, {:.0}) {:.0}x{:.0}, content now {:.0} wide",
                report.removed_images,
                report.image.left,
                report.image.top,
                report.image.width,
                report.image.height,
                report.content.width
            );
            print_document(&host);
        }
        Commands::Config { write } => {
            let shareable = without_secrets(&config);
            match write {
                Some(path) => {
                    shareable.save_to_file(&path)?;
                    println!("Configuration written to {}", path.display());
                }
                None => println!("{}", serde_json::to_string_pretty(&shareable)?),
            }
        }
        Commands::Key { action } => manage_key(action).await?,
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load_with_fallback(),
    };
    config.apply_env();
    if let Some(model) = &cli.model {
        config.llm.model = model.clone();
    }
    if let Some(language) = &cli.language {
        config.llm.language = language.clone();
    }
    Ok(config)
}

fn chat_settings(config: &Config) -> ChatSettings {
    ChatSettings {
        base_url: config.llm.base_url.clone(),
        model: config.llm.model.clone(),
        language: config.llm.language.clone(),
        deck_temperature: config.llm.deck_temperature,
        keyword_temperature: config.llm.keyword_temperature,
        timeout: Duration::from_millis(config.llm.timeout_ms),
    }
}

/// Configured value first, then the key store.
async fn resolve_key(configured: Option<&str>, name: KeyName) -> Result<String> {
    if let Some(key) = configured {
        return Ok(key.to_string());
    }
    let store_name = name.store_name();
    KeyStore::default_location()?
        .load(store_name)
        .await?
        .ok_or_else(|| anyhow!("No {store_name} configured; set it in the environment or run `slide key save`"))
}

async fn chat_client(config: &Config) -> Result<ChatCompletionsClient> {
    let key = resolve_key(config.llm.api_key.as_deref(), KeyName::Mistral).await?;
    Ok(ChatCompletionsClient::new(key, chat_settings(config))?)
}

async fn image_search(config: &Config, provider: Option<&str>) -> Result<Box<dyn ImageSearch>> {
    let mut images = config.images.clone();
    if let Some(provider) = provider {
        images.provider = provider.to_string();
    }
    let key = resolve_key(images.api_key(), KeyName::for_provider(&images.provider)).await?;
    let timeout = Duration::from_millis(images.timeout_ms);
    Ok(slide_image_search::provider_by_name(
        &images.provider,
        key,
        &config.llm.language,
        timeout,
    )?)
}

/// `--page-size` first, then the config file, then the provider's default.
fn page_size_for(flag: Option<u32>, configured: Option<u32>, search: &dyn ImageSearch) -> u32 {
    flag.or(configured).unwrap_or_else(|| search.default_page_size())
}

/// Reads or generates the deck, then optionally attaches stock photos.
async fn prepare_deck(
    config: &Config,
    generator: Option<&ChatCompletionsClient>,
    prompt: Option<String>,
    deck: Option<PathBuf>,
    images: bool,
) -> Result<Vec<Slide>> {
    let mut slides = match (prompt, deck, generator) {
        (_, Some(path), _) => load_deck(&path).await?,
        (Some(prompt), None, Some(generator)) => generator.generate(&prompt).await?,
        _ => bail!("Provide a prompt or --deck"),
    };
    if let (true, Some(generator)) = (images, generator) {
        let search = image_search(config, None).await?;
        let attached = attach_first_images(generator, search.as_ref(), &mut slides).await;
        println!("Attached images to {attached} of {} slides", slides.len());
    }
    Ok(slides)
}

async fn load_deck(path: &Path) -> Result<Vec<Slide>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read deck {}", path.display()))?;
    let slides: Vec<Slide> = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a JSON array of slides", path.display()))?;
    Ok(slides)
}

/// Picks the first search hit for every slide. Slides whose keywords or
/// search fail are left without an image.
async fn attach_first_images(
    generator: &dyn DeckGenerator,
    search: &dyn ImageSearch,
    slides: &mut [Slide],
) -> usize {
    let mut attached = 0;
    for (index, slide) in slides.iter_mut().enumerate() {
        let keywords = match generator.keywords_for_image(&slide.search_text()).await {
            Ok(keywords) => keywords,
            Err(e) => {
                tracing::warn!("No keywords for slide {}: {e}", index + 1);
                continue;
            }
        };
        match search.search(&keywords, 1).await {
            Ok((results, _)) => {
                if let Some(first) = results.into_iter().next() {
                    slide.set_image_url(first.full_url);
                    attached += 1;
                }
            }
            Err(e) => tracing::warn!("Image search for slide {} failed: {e}", index + 1),
        }
    }
    attached
}

fn open_session(host: &MemoryHost, config: &Config) -> Result<DocumentSession> {
    let fetcher = HttpImageFetcher::new(config.insertion.fetch_timeout())?;
    Ok(DocumentSession::new(
        Arc::new(host.clone()),
        config.insertion.clone(),
        Arc::new(fetcher),
    ))
}

async fn insert(config: &Config, kind: HostKind, slides: &[Slide], log_json: bool) -> Result<()> {
    let host = kind.build();
    let session = open_session(&host, config)?;

    let outcome = session.insert_deck(slides).await;
    match &outcome {
        Ok(report) => {
            if let Some((method, success)) = report.winner() {
                println!(
                    "Inserted {} of {} slides via {method} into {}",
                    success.slides_written,
                    slides.len(),
                    report.host
                );
            }
            print_document(&host);
        }
        Err(e) => {
            eprintln!("Insertion failed: {e}");
            println!("{}", render_instructions(slides));
        }
    }
    if log_json {
        print_log(session.log())?;
    }
    outcome?;
    Ok(())
}

fn print_document(host: &MemoryHost) {
    for (index, slide) in host.slides().iter().enumerate() {
        let title = slide
            .shape_named("Title")
            .and_then(|s| s.text.as_deref())
            .unwrap_or("");
        println!("{:>3}. [{}] {title}", index + 1, slide.layout);
        for picture in slide.pictures() {
            let b = picture.bounds;
            println!(
                "       picture at ({:.0}, {:.0}) {:.0}x{:.0}",
                b.left, b.top, b.width, b.height
            );
        }
    }
    for text in host.inserted_text() {
        println!("{text}");
    }
}

fn print_log(log: &OperationLog) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&log.entries())?);
    Ok(())
}

fn render_api_log(log: &ApiLog) -> Result<String> {
    Ok(serde_json::to_string_pretty(&log.entries())?)
}

fn print_api_log(log: &ApiLog) -> Result<()> {
    println!("{}", render_api_log(log)?);
    Ok(())
}

fn without_secrets(config: &Config) -> Config {
    let mut config = config.clone();
    config.llm.api_key = None;
    config.images.unsplash_access_key = None;
    config.images.pexels_api_key = None;
    config
}

fn print_results(provider: &str, cursor: &SearchCursor, results: &[ImageResult]) {
    println!(
        "{provider}: \"{}\" page {}/{}",
        cursor.keywords, cursor.page, cursor.total_pages
    );
    for result in results {
        let alt = result.alt_text.as_deref().unwrap_or("");
        println!("  {}  {}  {alt}", result.id, result.full_url);
    }
}

fn mask(value: &str) -> String {
    let visible: String = value.chars().take(4).collect();
    format!("{visible}{}", "*".repeat(value.chars().count().saturating_sub(4).min(16)))
}

async fn manage_key(action: KeyAction) -> Result<()> {
    let store = KeyStore::default_location()?;
    match action {
        KeyAction::Save { name, value } => {
            store.save(name.store_name(), value.trim()).await?;
            println!("Saved {} to {}", name.store_name(), store.path().display());
        }
        KeyAction::Show { name } => match store.load(name.store_name()).await? {
            Some(value) => println!("{}: {}", name.store_name(), mask(&value)),
            None => println!("{}: not set", name.store_name()),
        },
        KeyAction::Remove { name } => {
            if store.remove(name.store_name()).await? {
                println!("Removed {}", name.store_name());
            } else {
                println!("{} was not set", name.store_name());
            }
        }
    }
    Ok(())
}
