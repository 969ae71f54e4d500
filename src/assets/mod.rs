//! # Assets Module
//!
//! Loads OBJ models and their textures off the render thread.
//!
//! Each request runs on its own worker thread. Completions are posted on an
//! unbounded channel and drained once per frame with [`AssetLoader::poll`],
//! so every scene mutation happens back on the event-loop thread. Requests
//! are never cancelled and never time out.

pub mod catalog;
pub mod obj;
pub mod texture;

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    thread,
};

use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use thiserror::Error;

use crate::gfx::scene::{NodeId, Transform};

pub use catalog::ModelPreset;
pub use obj::{load_model, ModelData};
pub use texture::{load_texture, TextureData, TextureHandle, TextureId};

/// A model or texture that could not be loaded.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to load model {path}: {source}")]
    Obj {
        path: String,
        #[source]
        source: tobj::LoadError,
    },
    #[error("failed to load texture {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("model {path} contains no faces")]
    EmptyModel { path: String },
}

/// A preset to load and where to put it once loaded.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub ticket: u64,
    pub preset: ModelPreset,
    pub transform: Transform,
}

/// Geometry plus every texture the preset asked for, keyed by path.
#[derive(Debug)]
pub struct LoadedModel {
    pub model: ModelData,
    pub textures: HashMap<&'static str, TextureHandle>,
}

/// Where a fetched texture is meant to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureTarget {
    Part(NodeId),
    Surface,
    Background,
}

#[derive(Debug, Clone)]
pub struct TextureRequest {
    pub ticket: u64,
    /// Display name from the texture table
    pub name: &'static str,
    pub path: &'static str,
    pub target: TextureTarget,
}

#[derive(Debug)]
pub enum LoadEvent {
    Model {
        request: ModelRequest,
        result: Result<LoadedModel, AssetError>,
    },
    Texture {
        request: TextureRequest,
        result: Result<TextureHandle, AssetError>,
    },
}

/// Loads a preset's OBJ and maps. Any missing piece fails the whole model.
pub fn load_preset(root: &Path, preset: &ModelPreset) -> Result<LoadedModel, AssetError> {
    let model = load_model(root, &preset.model_path())?;
    let textures = preset
        .texture_paths()
        .map(|path| load_texture(root, path).map(|texture| (path, texture)))
        .collect::<Result<HashMap<_, _>, _>>()?;
    Ok(LoadedModel { model, textures })
}

/// Fire-and-forget background loader.
pub struct AssetLoader {
    root: PathBuf,
    sender: UnboundedSender<LoadEvent>,
    receiver: UnboundedReceiver<LoadEvent>,
    next_ticket: u64,
    in_flight: usize,
}

impl AssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            root: root.into(),
            sender,
            receiver,
            next_ticket: 0,
            in_flight: 0,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Hands out request tickets; callers keep them to spot stale completions.
    pub fn next_ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }

    /// Requests issued but not yet returned by [`poll`](Self::poll)
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn request_model(&mut self, request: ModelRequest) {
        log::info!("Loading model {}", request.preset.model_path());
        let root = self.root.clone();
        self.spawn(move || {
            let result = load_preset(&root, &request.preset);
            LoadEvent::Model { request, result }
        });
    }

    pub fn request_texture(&mut self, request: TextureRequest) {
        log::debug!("Fetching texture {} ({})", request.name, request.path);
        let root = self.root.clone();
        self.spawn(move || {
            let result = load_texture(&root, request.path);
            LoadEvent::Texture { request, result }
        });
    }

    fn spawn<F>(&mut self, job: F)
    where
        F: FnOnce() -> LoadEvent + Send + 'static,
    {
        self.in_flight += 1;
        let sender = self.sender.clone();
        thread::spawn(move || {
            // The receiver only goes away with the loader itself.
            let _ = sender.unbounded_send(job());
        });
    }

    /// Drains every completion that has arrived, without blocking.
    pub fn poll(&mut self) -> Vec<LoadEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        self.in_flight = self.in_flight.saturating_sub(events.len());
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn wait_for_events(loader: &mut AssetLoader, count: usize) -> Vec<LoadEvent> {
        let mut events = Vec::new();
        for _ in 0..500 {
            events.extend(loader.poll());
            if events.len() >= count {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        events
    }

    fn write_duck(root: &Path, with_texture: bool) {
        std::fs::create_dir_all(root.join("models")).unwrap();
        std::fs::create_dir_all(root.join("textures")).unwrap();
        std::fs::write(
            root.join("models/duck.obj"),
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n",
        )
        .unwrap();
        if with_texture {
            image::RgbImage::from_pixel(2, 2, image::Rgb([200, 180, 0]))
                .save(root.join("textures/duck_diffuse.jpg"))
                .unwrap();
        }
    }

    #[test]
    fn test_model_request_completes_with_textures() {
        let dir = tempfile::tempdir().unwrap();
        write_duck(dir.path(), true);

        let mut loader = AssetLoader::new(dir.path());
        let ticket = loader.next_ticket();
        loader.request_model(ModelRequest {
            ticket,
            preset: catalog::DUCK,
            transform: Transform::default(),
        });
        assert_eq!(loader.in_flight(), 1);

        let events = wait_for_events(&mut loader, 1);
        assert_eq!(loader.in_flight(), 0);
        match &events[..] {
            [LoadEvent::Model { request, result: Ok(loaded) }] => {
                assert_eq!(request.ticket, ticket);
                assert_eq!(loaded.model.parts.len(), 1);
                assert!(loaded.textures.contains_key("textures/duck_diffuse.jpg"));
            }
            other => panic!("unexpected events: {:?}", other),
        }
    }

    #[test]
    fn test_missing_map_fails_the_whole_model() {
        let dir = tempfile::tempdir().unwrap();
        write_duck(dir.path(), false);
        let err = load_preset(dir.path(), &catalog::DUCK).unwrap_err();
        assert!(matches!(err, AssetError::Image { .. }));
    }

    #[test]
    fn test_texture_failure_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = AssetLoader::new(dir.path());
        let ticket = loader.next_ticket();
        loader.request_texture(TextureRequest {
            ticket,
            name: "Bricks",
            path: "textures/extra/bricks.jpg",
            target: TextureTarget::Surface,
        });

        let events = wait_for_events(&mut loader, 1);
        assert!(matches!(
            &events[..],
            [LoadEvent::Texture { result: Err(AssetError::Image { .. }), .. }]
        ));
    }

    #[test]
    fn test_poll_drains_every_arrived_completion() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = AssetLoader::new(dir.path());
        for _ in 0..3 {
            let ticket = loader.next_ticket();
            loader.request_texture(TextureRequest {
                ticket,
                name: "Bricks",
                path: "textures/extra/bricks.jpg",
                target: TextureTarget::Surface,
            });
        }

        let events = wait_for_events(&mut loader, 3);
        assert_eq!(events.len(), 3);
        assert_eq!(loader.in_flight(), 0);
        assert!(loader.poll().is_empty());
    }

    #[test]
    fn test_poll_without_requests_is_empty() {
        let mut loader = AssetLoader::new("assets");
        assert!(loader.poll().is_empty());
    }
}
