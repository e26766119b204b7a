use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use precinct_map::{
  MapEvent,
  app::{App, AppEvent},
  config::Config,
  datasource::data_source_for,
  map::scene::Scene,
  remote,
  selection::{MapData, PrecinctMap},
};
use tokio::sync::{mpsc::Sender, oneshot};
use tracing_subscriber::EnvFilter;

#[derive(clap::Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
  /// Port of the http surface. Overrides the configured port.
  #[arg(short, long)]
  port: Option<u16>,

  /// Base URL or directory of the datasets. Overrides the configured location.
  #[arg(short, long)]
  data: Option<String>,

  /// Plain log lines without http spans.
  #[arg(long, default_value_t = false)]
  plain_log: bool,
}

async fn shutdown_signal(sender: Sender<AppEvent>) {
  let ctrl_c = async {
    tokio::signal::ctrl_c()
      .await
      .expect("failed to install Ctrl+C handler");
  };

  #[cfg(unix)]
  let terminate = async {
    tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
      .expect("failed to install signal handler")
      .recv()
      .await;
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
      () = ctrl_c => {},
      () = terminate => {},
  }

  let _ = sender.send(AppEvent::Map(MapEvent::Shutdown)).await;
}

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  if args.plain_log {
    env_logger::init();
  } else {
    tracing_subscriber::fmt()
      .with_target(false)
      .with_env_filter(EnvFilter::from_default_env())
      .compact()
      .init();
  }

  let mut config = Config::new();
  if let Some(data) = args.data {
    config.data_base = Some(data);
  }
  let port = args.port.unwrap_or(config.listen_port);
  let data_base = config
    .data_base
    .clone()
    .context("No dataset location configured. Set PRECINCT_MAP_DATA_URL or use --data.")?;

  info!("Loading datasets from {data_base}");
  let source = data_source_for(&data_base);
  let data = MapData::load(source.as_ref(), &config.datasets).await;

  let scene = Scene::new(config.initial_view.center, config.initial_view.zoom);
  let map = PrecinctMap::new(scene, &config, data);
  let (app, handle) = App::new(map, config.geocoder.build());

  // The server stops on a signal or when a shutdown event stopped the app.
  let (stopped, app_stopped) = oneshot::channel::<()>();
  let sender = handle.sender();
  let shutdown = async move {
    tokio::select! {
        () = shutdown_signal(sender) => {},
        _ = app_stopped => {},
    }
  };
  let server = tokio::spawn(remote::serve(handle, port, shutdown));
  app.run().await;
  let _ = stopped.send(());

  server
    .await
    .context("Http surface panicked")?
    .with_context(|| format!("Could not serve on port {port}"))
}
