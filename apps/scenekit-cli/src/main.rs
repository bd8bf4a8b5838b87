use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use scenekit_common::EcsConfig;
use scenekit_scene::{DrawListSystem, LightingSystem, Scene};
use scenekit_tools::SceneInspector;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scenekit-cli", about = "Headless scenekit runner and inspector")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and registered component types
    Info,
    /// Build the default scene and run frames
    Run {
        /// Number of frames to run
        #[arg(short, long, default_value = "60")]
        frames: u64,
        /// JSON file with entity-set options
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the default scene's outline and entity details
    Outline {
        /// Also list every entity, hidden ones included
        #[arg(short, long)]
        all: bool,
    },
}

fn build_scene(config: EcsConfig) -> anyhow::Result<Scene> {
    let mut scene = Scene::with_config(config);
    scene
        .setup_editor_base_scene()
        .context("failed to set up the editor base scene")?;
    scene
        .setup_default_entities()
        .context("failed to set up the default entities")?;
    Ok(scene)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("scenekit-cli v{}", env!("CARGO_PKG_VERSION"));
            let scene = Scene::new();
            println!("{}", SceneInspector::summary(&scene));
            for info in scene.entities.registry().iter() {
                let unique = if info.is_unique() { " (unique)" } else { "" };
                let storage = scene
                    .entities
                    .registry()
                    .name_of(info.storage())
                    .unwrap_or("?");
                println!("  {} [{}] storage={storage}{unique}", info.name(), info.id());
            }
        }
        Commands::Run { frames, config } => {
            let config = match config {
                Some(path) => EcsConfig::load(&path)
                    .with_context(|| format!("failed to load config {}", path.display()))?,
                None => EcsConfig::default(),
            };
            tracing::info!(?config, frames, "running default scene");

            let mut scene = build_scene(config)?;
            let mut hooks = 0;
            for _ in 0..frames {
                hooks += scene.update();
                scene.with_system::<LightingSystem, _>(|lighting, entities| {
                    lighting.update_lights(entities)
                });
                scene.with_system::<DrawListSystem, _>(|draw, entities| {
                    draw.collect(entities).len()
                });
            }

            println!("Ran {frames} frames, {hooks} component updates");
            println!(
                "Lights: {}, draw items: {}",
                scene.system::<LightingSystem>().lights().len(),
                scene.system::<DrawListSystem>().items().len()
            );
            println!("{}", SceneInspector::summary(&scene));
        }
        Commands::Outline { all } => {
            let scene = build_scene(EcsConfig::default())?;
            println!("Scene Root");
            for row in SceneInspector::outline(&scene.entities) {
                println!("  {row}");
            }
            if all {
                println!();
                for id in SceneInspector::list_entities(&scene.entities) {
                    if let Some(info) = SceneInspector::inspect_entity(&scene.entities, id) {
                        println!("{info}");
                    }
                }
            }
        }
    }

    Ok(())
}
