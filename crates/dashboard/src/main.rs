use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use application::monitor::{PollConfig, PollLoop};
use application::{CommandHandlers, DeviceForm};
use domain::device::{ActuatorAction, DeviceKind};
use domain::DomainError;
use fleet_dashboard::{api, build_monitor, build_store, setup_app_state, terminal};
use infrastructure::DashboardConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to config directory
    #[arg(long, global = true, default_value = "config")]
    config_dir: String,

    /// Override the device collection URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Use a seeded in-memory fleet instead of the remote collection
    #[arg(long, global = true)]
    simulate: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the fleet and redraw the dashboard in the terminal
    Watch,
    /// Poll the fleet and serve the dashboard over HTTP
    Serve {
        /// Override the API port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the registered devices
    List,
    /// Register a device
    Create {
        /// Device kind (puerta, actuador, presencia, ...)
        #[arg(long)]
        kind: String,
        #[arg(long)]
        location: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Delete a device record by id
    Delete { id: String },
    /// Open or close the actuator at a location (abrir | cerrar)
    Toggle { location: String, action: String },
}

async fn run() -> Result<()> {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,fleet_dashboard=debug,application=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // 0. Parse Args
    let args = Args::parse();

    // 1. Load Configuration
    info!(config_dir = %args.config_dir, "Loading configuration...");
    let mut config = DashboardConfig::load(&args.config_dir)?;

    if let Some(base_url) = args.base_url {
        config.store.base_url = base_url;
    }
    if let Command::Serve { port: Some(port) } = &args.command {
        config.server.port = *port;
    }
    config.validate()?;

    // 2. Connect the store
    let store = build_store(&config, args.simulate)?;
    if args.simulate {
        info!("🧪 Using simulated in-memory fleet");
    } else {
        info!(base_url = %config.store.base_url, "✅ Using remote device collection");
    }

    let poll_config = PollConfig {
        interval: config.poll.interval(),
        overlap: config.poll.overlap,
    };

    // 3. Dispatch
    match args.command {
        Command::Watch => {
            let sink = Arc::new(terminal::TerminalSink::new(true));
            let monitor = build_monitor(store, &config, sink)?;
            let poll_loop = PollLoop::new(monitor, poll_config);
            poll_loop.start()?;

            wait_for_shutdown().await;
            poll_loop.stop().await;
        }
        Command::Serve { .. } => {
            let (state, monitor) = setup_app_state(store, &config)?;
            let poll_loop = PollLoop::new(monitor, poll_config);
            poll_loop.start()?;

            let app = api::create_router(state);
            let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.server.port));
            info!("🚀 API Listening on http://{}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app)
                .with_graceful_shutdown(wait_for_shutdown())
                .await?;

            poll_loop.stop().await;
        }
        Command::List => {
            let commands = CommandHandlers::new(store, config.commands.write_mode);
            let items = commands.list_devices().await?;
            println!("{}", terminal::render_device_list(&items));
        }
        Command::Create {
            kind,
            location,
            name,
        } => {
            let commands = CommandHandlers::new(store, config.commands.write_mode);
            let form = DeviceForm {
                kind: DeviceKind::from(kind),
                location,
                name,
            };
            let record = commands.create_device(form).await?;
            println!(
                "Created {} ({}) at {} with id {}",
                record.display_name(),
                record.kind,
                record.location,
                record.id.as_deref().unwrap_or("-")
            );
        }
        Command::Delete { id } => {
            let commands = CommandHandlers::new(store, config.commands.write_mode);
            commands.delete_device(&id).await?;
            println!("Deleted device {}", id);
        }
        Command::Toggle { location, action } => {
            let action: ActuatorAction = action.parse()?;
            let commands = CommandHandlers::new(store, config.commands.write_mode);
            match commands.toggle_actuator(&location, action).await {
                Ok(written) => println!(
                    "{} at {}: actuator and door sensor now '{}'",
                    action, location, written.door.state
                ),
                Err(DomainError::NotFound(message)) => println!("{}", message),
                Err(e) => return Err(e.into()),
            }
        }
    }

    info!("👋 Good bye!");
    Ok(())
}

async fn wait_for_shutdown() {
    fleet_dashboard::shutdown_on(tokio::signal::ctrl_c()).await
}

fn main() {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("❌ CRITICAL ERROR: failed to start runtime: {:?}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(run()) {
        eprintln!("\n❌ CRITICAL ERROR: {:?}", e);
        std::process::exit(1);
    }
}
