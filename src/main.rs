use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info, warn};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, LevelFilter, WriteLogger};

use gallerysync::app::{App, run_app_with_event_source};
use gallerysync::assets::ThreadedLoader;
use gallerysync::catalog::Catalog;
use gallerysync::controller::GalleryController;
use gallerysync::document::{DocumentSync, InlineViewer};
use gallerysync::event_source::KeyboardEventSource;
use gallerysync::pages::PageMap;
use gallerysync::panic_handler::initialize_panic_handler;
use gallerysync::preferences::{FilePreferences, MemoryPreferences, PreferenceStore};
use gallerysync::settings::{self, Settings};

#[derive(Parser, Debug)]
#[command(
    name = "gallerysync",
    version,
    about = "Browse per-chapter artwork next to the companion document"
)]
struct Cli {
    /// Chapter image index (JSON)
    #[arg(long, short)]
    metadata: Option<PathBuf>,

    /// Chapter start pages (JSON or YAML)
    #[arg(long, short)]
    pages: Option<PathBuf>,

    /// Directory image sources are relative to
    #[arg(long, short)]
    artwork_dir: Option<PathBuf>,

    /// Companion document reference
    #[arg(long, short)]
    document: Option<String>,

    /// Artwork decoding threads
    #[arg(long)]
    workers: Option<usize>,

    #[arg(long, default_value = "gallerysync.log")]
    log_file: PathBuf,

    /// Print the chapter overview and initial view instead of starting the UI
    #[arg(long)]
    headless: bool,
}

impl Cli {
    fn apply(self, mut settings: Settings) -> Settings {
        if let Some(metadata) = self.metadata {
            settings.metadata = metadata;
        }
        if let Some(pages) = self.pages {
            settings.pages = Some(pages);
        }
        if let Some(dir) = self.artwork_dir {
            settings.artwork_dir = dir;
        }
        if let Some(document) = self.document {
            settings.document = document;
        }
        if let Some(workers) = self.workers {
            settings.loader_workers = workers;
        }
        settings
    }
}

type Controller = GalleryController<ThreadedLoader, Box<dyn PreferenceStore>, InlineViewer>;

fn build_controller(settings: &Settings) -> Controller {
    let catalog = Catalog::load(&settings.metadata).unwrap_or_else(|e| {
        error!("{e:#}");
        Catalog::default()
    });

    let pages = match &settings.pages {
        Some(path) => PageMap::load(path).unwrap_or_else(|e| {
            warn!("{e:#}; using built-in chapter pages");
            PageMap::companion_default()
        }),
        None => PageMap::companion_default(),
    };

    let store: Box<dyn PreferenceStore> = match FilePreferences::in_config_dir() {
        Some(store) => Box::new(store),
        None => {
            warn!("No config directory, theme preference will not persist");
            Box::new(MemoryPreferences::new())
        }
    };

    GalleryController::new(
        catalog,
        pages,
        ThreadedLoader::new(settings.artwork_dir.clone(), settings.loader_workers),
        store,
        InlineViewer::new(),
        DocumentSync::new(settings.document.clone()),
    )
}

fn print_overview(controller: &Controller) {
    let catalog = controller.catalog();
    for (chapter, records) in catalog.chapters() {
        let ranks: Vec<String> = records.iter().map(|r| r.rank.to_string()).collect();
        println!("Chapter {chapter}: {} image(s) [{}]", records.len(), ranks.join(", "));
    }
    let view = controller.view();
    if let Some(fatal) = &view.fatal {
        println!("{fatal}");
        return;
    }
    println!("Showing {} ({:?})", view.title, view.artwork);
    println!("Document: {}", view.document);
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    WriteLogger::init(level, Config::default(), File::create(&cli.log_file)?)?;
    info!("Starting gallerysync");

    let headless = cli.headless;
    let settings = cli.apply(settings::load_settings());
    let controller = build_controller(&settings);

    if headless {
        print_overview(&controller);
        return Ok(());
    }

    initialize_panic_handler();
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let mut app = App::new(controller);
    let res = run_app_with_event_source(&mut terminal, &mut app, &mut KeyboardEventSource);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("Application error: {err:?}");
        println!("{err:?}");
    }

    info!("Shutting down gallerysync");
    Ok(())
}
