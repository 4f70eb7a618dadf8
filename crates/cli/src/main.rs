use bricks_core::assets::{require_assets, require_to_html, AssetConfig, AssetRegistry};
use bricks_core::html::parse::parse_html;
use clap::{Parser, Subcommand};
use env_logger::{Builder, Env};

#[derive(Parser)]
#[command(name = "bricks", about = "Resolve front-end assets and inspect component HTML")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the assets needed for the given names, in load order
    Resolve {
        /// Asset names to require
        #[arg(required = true)]
        names: Vec<String>,

        /// Output as a JSON array of names
        #[arg(long)]
        json: bool,
    },
    /// Print the <head> and end-of-<body> tags for the given names
    Render {
        /// Asset names to require
        #[arg(required = true)]
        names: Vec<String>,

        /// Prefix for static asset paths
        #[arg(long, default_value = "static/")]
        static_url: String,
    },
    /// Parse an HTML file and output its component tree as JSON
    Parse {
        /// The HTML file to parse (use - for stdin)
        file: String,
    },
    /// Run the RPC server
    #[cfg(feature = "serve")]
    Serve {
        /// Port to listen on
        #[arg(long, default_value_t = 3847)]
        port: u16,

        /// Attach error details to wrapped function errors
        #[arg(long)]
        debug: bool,

        /// Allow cross-origin requests
        #[arg(long)]
        cors: bool,
    },
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    Builder::from_env(Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Resolve { names, json } => resolve(names, json),
        Commands::Render { names, static_url } => render(names, static_url),
        Commands::Parse { file } => parse(&file),
        #[cfg(feature = "serve")]
        Commands::Serve { port, debug, cors } => serve(port, debug, cors),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn resolve(names: Vec<String>, json: bool) -> CliResult {
    let registry = AssetRegistry::with_library();
    let assets = require_assets(&registry, names)?;
    if json {
        let names: Vec<&str> = assets.iter().map(|a| a.name()).collect();
        println!("{}", serde_json::to_string_pretty(&names)?);
    } else {
        for asset in &assets {
            match asset.context() {
                Some(context) => println!("{}\t{}", asset.name(), context),
                None => println!("{}", asset.name()),
            }
        }
    }
    Ok(())
}

fn render(names: Vec<String>, static_url: String) -> CliResult {
    let registry = AssetRegistry::with_library();
    let (head, foot) = require_to_html(&registry, names, AssetConfig { static_url })?;
    println!("<!-- head -->");
    println!("{head}");
    println!("<!-- foot -->");
    println!("{foot}");
    Ok(())
}

fn parse(file: &str) -> CliResult {
    let html = if file == "-" {
        use std::io::Read;
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(file)?
    };

    let root = parse_html(&html)?;
    println!("{}", serde_json::to_string_pretty(&root.to_json())?);
    Ok(())
}

#[cfg(feature = "serve")]
fn serve(port: u16, debug: bool, cors: bool) -> CliResult {
    use std::sync::Arc;

    use bricks_server::{build_router, AppState, ServerConfig};

    let config = ServerConfig {
        port,
        debug,
        cors,
        ..Default::default()
    };
    let app = build_router(Arc::new(AppState::new(config)));

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async move {
            let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
            log::info!("bricks server listening on http://localhost:{port}");
            axum::serve(listener, app).await?;
            Ok::<(), Box<dyn std::error::Error>>(())
        })?;
    Ok(())
}
