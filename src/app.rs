use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::{
  sync::{
    mpsc::{Receiver, Sender, WeakSender},
    watch,
  },
  task::JoinHandle,
};

use crate::{
  geocoding::{
    AddressComponents, CoordinateParser, GeocodeError, GeocodeRequest, Geocoder, SearchResult,
    search_location,
  },
  map::{map_event::MapEvent, scene::Scene},
  panel::Panel,
  selection::{Command, PrecinctMap, Selection},
};

const EVENT_QUEUE_SIZE: usize = 32;

/// Everything that re-enters the map: interactions and finished lookups.
#[derive(Debug)]
pub enum AppEvent {
  Map(MapEvent),
  GeocodeCompleted {
    request: GeocodeRequest,
    outcome: Result<AddressComponents, GeocodeError>,
  },
  SearchCompleted {
    generation: u64,
    outcome: Result<Option<SearchResult>, GeocodeError>,
  },
}

/// What a client needs to draw the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSnapshot {
  pub selection: Selection,
  pub panel: Panel,
  pub scene: Scene,
}

impl MapSnapshot {
  fn of(map: &PrecinctMap<Scene>) -> Self {
    Self {
      selection: map.selection().clone(),
      panel: map.panel().clone(),
      scene: map.surface().clone(),
    }
  }
}

/// Cloneable access to a running `App`.
#[derive(Clone)]
pub struct AppHandle {
  events: Sender<AppEvent>,
  snapshot: watch::Receiver<MapSnapshot>,
}

impl AppHandle {
  /// Queues `event`. Returns `false` once the app has shut down.
  pub async fn send(&self, event: MapEvent) -> bool {
    self.events.send(AppEvent::Map(event)).await.is_ok()
  }

  #[must_use]
  pub fn snapshot(&self) -> MapSnapshot {
    self.snapshot.borrow().clone()
  }

  /// Waits until the next transition has been published.
  pub async fn changed(&mut self) -> bool {
    self.snapshot.changed().await.is_ok()
  }

  #[must_use]
  pub fn sender(&self) -> Sender<AppEvent> {
    self.events.clone()
  }
}

/// Owns the map and is the only consumer of its events, so transitions never interleave.
/// Lookups run as tasks whose results come back through the same queue. The app only holds a
/// weak sender: once every `AppHandle` is gone the queue closes and `run` returns.
pub struct App {
  map: PrecinctMap<Scene>,
  geocoder: Option<Arc<dyn Geocoder>>,
  parser: Arc<CoordinateParser>,
  sender: WeakSender<AppEvent>,
  receiver: Receiver<AppEvent>,
  snapshot: watch::Sender<MapSnapshot>,
  geocode_task: Option<JoinHandle<()>>,
  search_task: Option<JoinHandle<()>>,
}

impl App {
  #[must_use]
  pub fn new(map: PrecinctMap<Scene>, geocoder: Option<Arc<dyn Geocoder>>) -> (Self, AppHandle) {
    let (sender, receiver) = tokio::sync::mpsc::channel(EVENT_QUEUE_SIZE);
    let (snapshot, snapshot_receiver) = watch::channel(MapSnapshot::of(&map));
    let weak_sender = sender.downgrade();
    let handle = AppHandle {
      events: sender,
      snapshot: snapshot_receiver,
    };
    let app = Self {
      map,
      geocoder,
      parser: Arc::new(CoordinateParser::new()),
      sender: weak_sender,
      receiver,
      snapshot,
      geocode_task: None,
      search_task: None,
    };
    (app, handle)
  }

  /// Handles events until a shutdown event arrives or every handle has been dropped.
  pub async fn run(mut self) {
    info!("Event loop started");
    while let Some(event) = self.receiver.recv().await {
      let commands = match event {
        AppEvent::Map(event) => self.map.handle_event(event),
        AppEvent::GeocodeCompleted { request, outcome } => {
          self.map.on_geocode_completed(&request, outcome);
          Vec::new()
        }
        AppEvent::SearchCompleted {
          generation,
          outcome,
        } => self.map.on_search_completed(generation, outcome),
      };

      let mut shutdown = false;
      for command in commands {
        match command {
          Command::ReverseGeocode(request) => self.reverse_geocode(request),
          Command::Search { generation, query } => self.search(generation, query),
          Command::Shutdown => shutdown = true,
        }
      }
      self.snapshot.send_replace(MapSnapshot::of(&self.map));
      if shutdown {
        break;
      }
    }
    self.abort_lookups();
    info!("Event loop stopped");
  }

  /// Replaces the lookup in flight. The map discards a superseded result anyway, aborting only
  /// saves the request.
  fn reverse_geocode(&mut self, request: GeocodeRequest) {
    if let Some(task) = self.geocode_task.take() {
      task.abort();
    }
    let sender = self.sender.clone();
    let geocoder = self.geocoder.clone();
    self.geocode_task = Some(tokio::spawn(async move {
      let outcome = match geocoder {
        Some(geocoder) => geocoder.reverse(request.coordinate).await,
        None => Ok(AddressComponents::default()),
      };
      if let Some(sender) = sender.upgrade() {
        let _ = sender
          .send(AppEvent::GeocodeCompleted { request, outcome })
          .await;
      }
    }));
  }

  fn search(&mut self, generation: u64, query: String) {
    if let Some(task) = self.search_task.take() {
      task.abort();
    }
    debug!("Searching '{query}' (generation {generation})");
    let sender = self.sender.clone();
    let geocoder = self.geocoder.clone();
    let parser = self.parser.clone();
    self.search_task = Some(tokio::spawn(async move {
      let outcome = search_location(&parser, geocoder.as_deref(), &query).await;
      if let Some(sender) = sender.upgrade() {
        let _ = sender
          .send(AppEvent::SearchCompleted {
            generation,
            outcome,
          })
          .await;
      }
    }));
  }

  fn abort_lookups(&mut self) {
    for task in [self.geocode_task.take(), self.search_task.take()]
      .into_iter()
      .flatten()
    {
      task.abort();
    }
  }
}
